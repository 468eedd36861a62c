//! Directory-backed media library.
//!
//! Maps a local folder tree onto the album model: each immediate
//! subdirectory of the root is an album, image files inside it are the
//! album's assets. Backs the demo app and the integration tests.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

use super::{ImageRequest, LibraryError, MediaLibrary};
use crate::image_loader;
use crate::models::{Album, AlbumId, Asset, Thumbnail};

pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Opens the user's Pictures directory as the library root.
    pub fn open_default() -> Result<Self> {
        let user_dirs =
            directories::UserDirs::new().context("Failed to determine user directories")?;
        let root = user_dirs
            .picture_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| user_dirs.home_dir().to_path_buf());
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif"
            )
        })
        .unwrap_or(false)
}

fn is_hidden_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

impl MediaLibrary for DirectoryLibrary {
    fn fetch_albums(&self) -> Result<Vec<Album>, LibraryError> {
        let entries = std::fs::read_dir(&self.root)
            .map_err(|e| LibraryError::AlbumEnumeration(format!("{:?}: {}", self.root, e)))?;

        let mut albums = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() || is_hidden_name(&path) {
                continue;
            }
            let title = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("no title")
                .to_string();
            albums.push(Album::new(AlbumId::new(path.to_string_lossy()), title));
        }

        albums.sort_by(|a, b| a.title.cmp(&b.title));
        debug!(root = ?self.root, count = albums.len(), "Enumerated albums");
        Ok(albums)
    }

    fn fetch_assets(&self, album: &AlbumId, limit: usize) -> Result<Vec<Asset>, LibraryError> {
        let dir = PathBuf::from(album.as_str());
        if !dir.is_dir() {
            return Err(LibraryError::AssetEnumeration {
                album: album.clone(),
                reason: "not a directory".to_string(),
            });
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(&dir)
            .follow_links(false)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_image_path(path) && !is_hidden_name(path))
            .collect();

        paths.sort();
        paths.truncate(limit);
        Ok(paths.into_iter().map(Asset::new).collect())
    }

    fn request_image(&self, asset: &Asset, target: ImageRequest) -> Option<Thumbnail> {
        match image_loader::render_fit(&asset.path, target.width, target.height) {
            Ok(thumb) => Some(thumb),
            Err(err) => {
                debug!(path = ?asset.path, error = ?err, "Asset yielded no image");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use tempfile::tempdir;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_pixel(width, height, Rgba([10u8, 120, 240, 255]));
        img.save(path).unwrap();
    }

    fn setup_root() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let hiking = dir.path().join("hiking");
        let food = dir.path().join("food");
        std::fs::create_dir(&hiking).unwrap();
        std::fs::create_dir(&food).unwrap();
        std::fs::create_dir(dir.path().join(".hidden")).unwrap();

        write_png(&hiking.join("a.png"), 40, 20);
        write_png(&hiking.join("b.png"), 20, 40);
        write_png(&hiking.join("c.png"), 30, 30);
        write_png(&hiking.join("d.png"), 30, 30);
        std::fs::write(hiking.join("notes.txt"), "not an image").unwrap();

        std::fs::write(food.join("broken.jpg"), b"not really a jpeg").unwrap();
        dir
    }

    #[test]
    fn test_fetch_albums_skips_hidden_and_sorts() {
        let root = setup_root();
        let lib = DirectoryLibrary::new(root.path());

        let albums = lib.fetch_albums().unwrap();
        let titles: Vec<&str> = albums.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["food", "hiking"]);
    }

    #[test]
    fn test_fetch_assets_limit_and_order() {
        let root = setup_root();
        let lib = DirectoryLibrary::new(root.path());
        let albums = lib.fetch_albums().unwrap();
        let hiking = &albums[1];

        let assets = lib.fetch_assets(&hiking.id, 3).unwrap();
        assert_eq!(assets.len(), 3);
        let names: Vec<&str> = assets
            .iter()
            .map(|a| a.path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_fetch_assets_missing_album() {
        let root = setup_root();
        let lib = DirectoryLibrary::new(root.path());
        let gone = AlbumId::new(root.path().join("gone").to_string_lossy());
        assert!(lib.fetch_assets(&gone, 3).is_err());
    }

    #[test]
    fn test_request_image_fit_and_failure() {
        let root = setup_root();
        let lib = DirectoryLibrary::new(root.path());
        let albums = lib.fetch_albums().unwrap();

        let hiking_assets = lib.fetch_assets(&albums[1].id, 1).unwrap();
        let thumb = lib
            .request_image(&hiking_assets[0], ImageRequest::new(500, 500))
            .unwrap();
        // 40x20 source stays un-upscaled
        assert_eq!((thumb.width, thumb.height), (40, 20));

        // Undecodable bytes are dropped, not surfaced
        let food_assets = lib.fetch_assets(&albums[0].id, 3).unwrap();
        assert_eq!(food_assets.len(), 1);
        assert!(lib
            .request_image(&food_assets[0], ImageRequest::new(500, 500))
            .is_none());
    }
}
