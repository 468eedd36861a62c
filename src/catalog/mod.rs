//! Album catalog loader.
//!
//! One enumerator pass fetches all albums from the media library; each
//! album then gets an independent worker job that fetches its first few
//! assets and renders a preview bitmap per asset. Results are delivered as
//! `CatalogEvent`s over an async channel so the UI thread is the only
//! place catalog state is mutated.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, Sender};
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::library::{ImageRequest, MediaLibrary};
use crate::models::{Album, AlbumId, Thumbnail};

/// Number of preview images fetched per album.
pub const THUMBS_PER_ALBUM: usize = 3;

/// Target size for preview rendering, aspect-fit.
pub const THUMB_TARGET: ImageRequest = ImageRequest {
    width: 500,
    height: 500,
};

/// Number of preview worker threads.
const PREVIEW_WORKERS: usize = 2;

/// Maximum number of queued preview jobs.
const MAX_QUEUE_SIZE: usize = 256;

/// A catalog change, delivered to the UI thread.
#[derive(Debug, Clone)]
pub enum CatalogEvent {
    /// An album arrived from the enumeration pass.
    AlbumFound(Album),
    /// An album's preview set completed. `thumbs` may be empty when every
    /// asset yielded no image; the album then renders as a placeholder.
    ThumbnailsReady {
        album: AlbumId,
        thumbs: Vec<Thumbnail>,
    },
}

/// UI-thread view of the catalog.
///
/// Albums are kept in arrival order; previews are keyed by album identity
/// and updated atomically per album, so thumbnail completions may
/// interleave arbitrarily with album arrivals.
#[derive(Debug, Default)]
pub struct CatalogState {
    albums: Vec<Album>,
    thumbs: HashMap<AlbumId, Vec<Thumbnail>>,
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event. Returns the album whose cell needs re-rendering.
    pub fn apply(&mut self, event: CatalogEvent) -> AlbumId {
        match event {
            CatalogEvent::AlbumFound(album) => {
                let id = album.id.clone();
                if !self.albums.iter().any(|a| a.id == id) {
                    self.albums.push(album);
                }
                id
            }
            CatalogEvent::ThumbnailsReady { album, thumbs } => {
                self.thumbs.insert(album.clone(), thumbs);
                album
            }
        }
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn album(&self, id: &AlbumId) -> Option<&Album> {
        self.albums.iter().find(|a| &a.id == id)
    }

    /// Previews for one album. `None` until the album's preview set has
    /// completed; an empty slice afterwards means "no renderable images".
    pub fn thumbs_for(&self, id: &AlbumId) -> Option<&[Thumbnail]> {
        self.thumbs.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }
}

#[derive(Debug, Clone)]
struct PreviewJob {
    album: AlbumId,
}

/// Loads the album catalog in the background.
///
/// Owns the enumerator thread and the preview worker pool; dropping the
/// loader signals shutdown and joins all threads.
pub struct CatalogLoader {
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    pending: Arc<RwLock<HashSet<AlbumId>>>,
}

impl CatalogLoader {
    /// Starts the enumeration pass and the preview workers.
    ///
    /// Every discovered album and completed preview set is sent through
    /// `events`; the receiving side is expected to live on the UI thread.
    pub fn spawn(
        library: Arc<dyn MediaLibrary>,
        events: async_channel::Sender<CatalogEvent>,
    ) -> Self {
        let (job_tx, job_rx) = flume::bounded::<PreviewJob>(MAX_QUEUE_SIZE);
        let shutdown = Arc::new(AtomicBool::new(false));
        let pending = Arc::new(RwLock::new(HashSet::new()));

        let mut workers = Vec::with_capacity(PREVIEW_WORKERS + 1);

        for worker_id in 0..PREVIEW_WORKERS {
            let rx = job_rx.clone();
            let tx = events.clone();
            let library = Arc::clone(&library);
            let shutdown = Arc::clone(&shutdown);
            let pending = Arc::clone(&pending);

            let handle = thread::Builder::new()
                .name(format!("preview-worker-{}", worker_id))
                .spawn(move || {
                    worker_loop(worker_id, rx, tx, library, shutdown, pending);
                })
                .expect("Failed to spawn preview worker");
            workers.push(handle);
        }

        let enumerator = {
            let library = Arc::clone(&library);
            let shutdown = Arc::clone(&shutdown);
            let pending = Arc::clone(&pending);

            thread::Builder::new()
                .name("album-enumerator".to_string())
                .spawn(move || {
                    enumerate_albums(library, events, job_tx, shutdown, pending);
                })
                .expect("Failed to spawn album enumerator")
        };
        workers.push(enumerator);

        debug!(workers = PREVIEW_WORKERS, "Started catalog loader");

        Self {
            workers,
            shutdown,
            pending,
        }
    }

    /// True while preview jobs are queued or in flight.
    pub fn is_busy(&self) -> bool {
        !self.pending.read().is_empty()
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        debug!("Catalog loader shut down");
    }
}

impl Drop for CatalogLoader {
    fn drop(&mut self) {
        if !self.shutdown.load(Ordering::Relaxed) {
            self.shutdown();
        }
    }
}

/// Enumeration pass: report each album, then queue its preview job.
fn enumerate_albums(
    library: Arc<dyn MediaLibrary>,
    events: async_channel::Sender<CatalogEvent>,
    job_tx: Sender<PreviewJob>,
    shutdown: Arc<AtomicBool>,
    pending: Arc<RwLock<HashSet<AlbumId>>>,
) {
    let albums = match library.fetch_albums() {
        Ok(albums) => albums,
        Err(err) => {
            warn!(error = %err, "Album enumeration failed");
            return;
        }
    };
    debug!(count = albums.len(), "Album enumeration complete");

    for album in albums {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }

        let id = album.id.clone();
        if !pending.write().insert(id.clone()) {
            trace!(album = %id, "Preview job already pending");
            continue;
        }

        if events.send_blocking(CatalogEvent::AlbumFound(album)).is_err() {
            // Receiver is gone; the picker was dropped.
            return;
        }
        if job_tx.send(PreviewJob { album: id }).is_err() {
            return;
        }
    }
}

/// Preview worker: fetch up to `THUMBS_PER_ALBUM` assets and render each.
/// Assets that yield no image are dropped without retry.
fn worker_loop(
    worker_id: usize,
    rx: Receiver<PreviewJob>,
    tx: async_channel::Sender<CatalogEvent>,
    library: Arc<dyn MediaLibrary>,
    shutdown: Arc<AtomicBool>,
    pending: Arc<RwLock<HashSet<AlbumId>>>,
) {
    debug!(worker_id, "Preview worker started");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(job) => {
                let thumbs = fetch_previews(library.as_ref(), &job.album);
                pending.write().remove(&job.album);

                if tx
                    .send_blocking(CatalogEvent::ThumbnailsReady {
                        album: job.album,
                        thumbs,
                    })
                    .is_err()
                {
                    break;
                }
            }
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(worker_id, "Preview worker stopped");
}

fn fetch_previews(library: &dyn MediaLibrary, album: &AlbumId) -> Vec<Thumbnail> {
    let assets = match library.fetch_assets(album, THUMBS_PER_ALBUM) {
        Ok(assets) => assets,
        Err(err) => {
            warn!(album = %album, error = %err, "Asset enumeration failed");
            return Vec::new();
        }
    };

    // Enumeration order is preserved: assets are rendered in a single
    // synchronous loop before the completion event fires.
    assets
        .iter()
        .filter_map(|asset| library.request_image(asset, THUMB_TARGET))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryError;
    use crate::models::Asset;
    use std::path::PathBuf;

    struct FakeLibrary {
        albums: Vec<Album>,
        /// album id -> (asset name, renderable) pairs
        assets: HashMap<AlbumId, Vec<(&'static str, bool)>>,
    }

    impl FakeLibrary {
        fn new() -> Self {
            let mk = |name: &str| Album::new(AlbumId::new(name), name);
            let mut assets = HashMap::new();
            assets.insert(
                AlbumId::new("hiking"),
                vec![("a.jpg", true), ("b.jpg", true), ("c.jpg", true)],
            );
            assets.insert(
                AlbumId::new("food"),
                vec![("x.jpg", true), ("y.jpg", false), ("z.jpg", true)],
            );
            assets.insert(AlbumId::new("empty"), vec![("bad.jpg", false)]);
            Self {
                albums: vec![mk("hiking"), mk("food"), mk("empty")],
                assets,
            }
        }
    }

    impl MediaLibrary for FakeLibrary {
        fn fetch_albums(&self) -> Result<Vec<Album>, LibraryError> {
            Ok(self.albums.clone())
        }

        fn fetch_assets(&self, album: &AlbumId, limit: usize) -> Result<Vec<Asset>, LibraryError> {
            let assets = self.assets.get(album).cloned().unwrap_or_default();
            Ok(assets
                .into_iter()
                .take(limit)
                .map(|(name, renderable)| {
                    // Encode renderability in the path for request_image.
                    let prefix = if renderable { "ok" } else { "broken" };
                    Asset::new(PathBuf::from(format!("{}/{}/{}", prefix, album, name)))
                })
                .collect())
        }

        fn request_image(&self, asset: &Asset, target: ImageRequest) -> Option<Thumbnail> {
            if asset.path.starts_with("broken") {
                return None;
            }
            Some(Thumbnail::new(
                vec![0; (target.width * target.height * 4) as usize],
                target.width,
                target.height,
            ))
        }
    }

    fn run_catalog(library: FakeLibrary) -> (CatalogState, Vec<CatalogEvent>) {
        let (tx, rx) = async_channel::unbounded();
        let loader = CatalogLoader::spawn(Arc::new(library), tx);

        let mut events = Vec::new();
        // 3 albums -> 3 AlbumFound + 3 ThumbnailsReady
        while events.len() < 6 {
            events.push(rx.recv_blocking().unwrap());
        }
        // Every job is unpended before its completion event is sent.
        assert!(!loader.is_busy());
        drop(loader);

        let mut state = CatalogState::new();
        for event in &events {
            state.apply(event.clone());
        }
        (state, events)
    }

    #[test]
    fn test_albums_arrive_in_enumeration_order() {
        let (state, _) = run_catalog(FakeLibrary::new());
        let titles: Vec<&str> = state.albums().iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["hiking", "food", "empty"]);
    }

    #[test]
    fn test_each_album_completes_exactly_once() {
        let (_, events) = run_catalog(FakeLibrary::new());
        let completions: Vec<&AlbumId> = events
            .iter()
            .filter_map(|e| match e {
                CatalogEvent::ThumbnailsReady { album, .. } => Some(album),
                _ => None,
            })
            .collect();
        assert_eq!(completions.len(), 3);
        let unique: HashSet<&&AlbumId> = completions.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_failed_renders_are_dropped() {
        let (state, _) = run_catalog(FakeLibrary::new());
        assert_eq!(state.thumbs_for(&AlbumId::new("hiking")).unwrap().len(), 3);
        // One of three assets fails to render
        assert_eq!(state.thumbs_for(&AlbumId::new("food")).unwrap().len(), 2);
        // All assets fail: empty preview set, still reported
        assert!(state.thumbs_for(&AlbumId::new("empty")).unwrap().is_empty());
    }

    #[test]
    fn test_thumbs_pending_before_completion() {
        let mut state = CatalogState::new();
        let album = Album::new(AlbumId::new("hiking"), "hiking");
        state.apply(CatalogEvent::AlbumFound(album.clone()));

        assert_eq!(state.len(), 1);
        assert!(!state.is_empty());
        assert!(state.album(&album.id).is_some());
        assert!(state.thumbs_for(&album.id).is_none());

        state.apply(CatalogEvent::ThumbnailsReady {
            album: album.id.clone(),
            thumbs: Vec::new(),
        });
        assert!(state.thumbs_for(&album.id).unwrap().is_empty());
    }

    #[test]
    fn test_completion_before_album_arrival() {
        // Nothing enforces event ordering across threads; the state must
        // tolerate a preview set landing before its album.
        let mut state = CatalogState::new();
        let id = AlbumId::new("hiking");
        state.apply(CatalogEvent::ThumbnailsReady {
            album: id.clone(),
            thumbs: Vec::new(),
        });
        state.apply(CatalogEvent::AlbumFound(Album::new(id.clone(), "hiking")));

        assert_eq!(state.len(), 1);
        assert!(state.thumbs_for(&id).is_some());
    }

    #[test]
    fn test_duplicate_album_found_is_ignored() {
        let mut state = CatalogState::new();
        let album = Album::new(AlbumId::new("hiking"), "hiking");
        state.apply(CatalogEvent::AlbumFound(album.clone()));
        state.apply(CatalogEvent::AlbumFound(album));
        assert_eq!(state.len(), 1);
    }
}
