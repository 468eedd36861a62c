//! Media-library collaborator boundary.
//!
//! The picker consumes two capabilities: enumerate album collections, and
//! for a given album enumerate assets and render a bitmap per asset at a
//! target size. It never writes to the library.

pub mod directory;

use thiserror::Error;

use crate::models::{Album, AlbumId, Asset, Thumbnail};

pub use directory::DirectoryLibrary;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to enumerate albums: {0}")]
    AlbumEnumeration(String),

    #[error("failed to enumerate assets of album {album}: {reason}")]
    AssetEnumeration { album: AlbumId, reason: String },
}

/// Target size for a rendered image, aspect-fit within the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRequest {
    pub width: u32,
    pub height: u32,
}

impl ImageRequest {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The external media library the picker is bound to.
///
/// Implementations are shared with worker threads, so all methods take
/// `&self` and the trait requires `Send + Sync`.
pub trait MediaLibrary: Send + Sync + 'static {
    /// Enumerates all album collections.
    fn fetch_albums(&self) -> Result<Vec<Album>, LibraryError>;

    /// Enumerates up to `limit` assets of one album, in library order.
    fn fetch_assets(&self, album: &AlbumId, limit: usize) -> Result<Vec<Asset>, LibraryError>;

    /// Renders a bitmap for one asset, aspect-fit within the target size.
    ///
    /// `None` means the asset yielded no image; callers drop it without
    /// retrying.
    fn request_image(&self, asset: &Asset, target: ImageRequest) -> Option<Thumbnail>;
}
