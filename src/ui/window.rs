// Host window for the album picker
// GTK4 ApplicationWindow embedding the picker over a directory-backed
// library, with the embedded fallback stylesheet.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use gdk4::Display;
use gtk4::prelude::*;
use gtk4::{
    glib, Application, ApplicationWindow, CssProvider, STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use tracing::{info, warn};

use super::picker::AlbumPicker;
use crate::library::{DirectoryLibrary, MediaLibrary};
use crate::models::Album;

const WINDOW_WIDTH: i32 = 720;
const WINDOW_HEIGHT: i32 = 640;

/// Maximum number of albums selectable at once; 0 means unbounded.
const SELECTION_LIMIT: usize = 3;

/// CSS for the picker - embedded as fallback
const FALLBACK_CSS: &str = r#"
window {
    background-color: #101010;
    color: #e0e0e0;
}

.picker-header {
    background-color: rgba(128, 128, 128, 0.5);
    padding: 12px;
}

.picker-title {
    font-weight: bold;
}

.album-cell {
    padding: 8px;
}

.album-title {
    font-size: 12px;
}

.selection-dim {
    background-color: rgba(128, 128, 128, 0.4);
}

.selection-check {
    color: #00c060;
}
"#;

/// Load and apply the picker stylesheet
fn load_css() {
    let provider = CssProvider::new();

    let css_path = concat!(env!("CARGO_MANIFEST_DIR"), "/src/style.css");
    if Path::new(css_path).exists() {
        provider.load_from_path(css_path);
        info!("Loaded CSS from: {}", css_path);
    } else {
        provider.load_from_string(FALLBACK_CSS);
        info!("Loaded fallback embedded CSS");
    }

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

/// Host window presenting the album picker.
///
/// Owns the selection list the picker mutates in place, so the current
/// selection is readable here at any time, not only on dismissal.
pub struct PickerWindow {
    window: ApplicationWindow,
    picker: Rc<AlbumPicker>,
}

impl PickerWindow {
    pub fn new(app: &Application, root: Option<&Path>) -> Rc<Self> {
        load_css();

        let library: Arc<dyn MediaLibrary> = match root {
            Some(path) => Arc::new(DirectoryLibrary::new(path)),
            None => match DirectoryLibrary::open_default() {
                Ok(library) => Arc::new(library),
                Err(err) => {
                    warn!(error = ?err, "Falling back to current directory");
                    Arc::new(DirectoryLibrary::new("."))
                }
            },
        };

        let selected: Rc<RefCell<Vec<Album>>> = Rc::new(RefCell::new(Vec::new()));
        let picker = AlbumPicker::new(library, Rc::clone(&selected), SELECTION_LIMIT);

        let window = ApplicationWindow::builder()
            .application(app)
            .title("Photo Albums")
            .default_width(WINDOW_WIDTH)
            .default_height(WINDOW_HEIGHT)
            .child(picker.widget())
            .build();

        let window_weak = window.downgrade();
        picker.connect_dismissed(move |_selection| {
            // Read back through the shared list the picker mutated.
            for album in selected.borrow().iter() {
                info!(album = %album.id, title = %album.title, "Selected album");
            }
            if let Some(window) = window_weak.upgrade() {
                window.close();
            }
        });

        // Closing the window counts as dismissal too.
        let presented = picker.presented_flag();
        let picker_weak = Rc::downgrade(&picker);
        window.connect_close_request(move |_| {
            if presented.get() {
                if let Some(picker) = picker_weak.upgrade() {
                    picker.dismiss();
                }
            }
            glib::Propagation::Proceed
        });

        Rc::new(Self { window, picker })
    }

    pub fn present(&self) {
        self.window.present();
        self.picker.present();
    }
}
