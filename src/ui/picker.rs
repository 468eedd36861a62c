// Album grid picker
// Header bar plus a 3-column grid of (stacked preview, title) cells.
// Tapping a cell toggles selection; Done flips the presented flag back.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use gdk4::Texture;
use gtk4::pango::EllipsizeMode;
use gtk4::prelude::*;
use gtk4::{
    glib, Align, Box as GtkBox, Button, FlowBox, GestureClick, Label, Orientation, PolicyType,
    ScrolledWindow, SelectionMode,
};
use tracing::debug;

use super::stacked_preview::{texture_from_thumbnail, StackedPreview};
use crate::catalog::{CatalogEvent, CatalogLoader, CatalogState};
use crate::library::MediaLibrary;
use crate::models::{Album, AlbumId};
use crate::selection::{SelectionModel, ToggleOutcome};

const GRID_COLUMNS: u32 = 3;
const GRID_SPACING: u32 = 12;

struct AlbumCell {
    album: Album,
    preview: StackedPreview,
}

/// The album picker widget.
///
/// Holds the host-shared presented flag and selection list; the catalog
/// load starts on the first [`present`](Self::present) call and populates
/// the grid incrementally as albums and preview sets arrive.
pub struct AlbumPicker {
    self_weak: RefCell<Weak<AlbumPicker>>,
    root: GtkBox,
    flow: FlowBox,
    presented: Rc<Cell<bool>>,
    selection: SelectionModel,
    state: RefCell<CatalogState>,
    cells: RefCell<HashMap<AlbumId, AlbumCell>>,
    library: Arc<dyn MediaLibrary>,
    loader: RefCell<Option<CatalogLoader>>,
    load_started: Cell<bool>,
    on_dismiss: RefCell<Option<Box<dyn Fn(&[Album])>>>,
}

impl AlbumPicker {
    /// Creates the picker bound to a host-owned selection list.
    ///
    /// `limit` caps the number of concurrently selected albums; 0 means
    /// unbounded. A pre-existing selection at or over the limit is
    /// truncated immediately.
    pub fn new(
        library: Arc<dyn MediaLibrary>,
        selected: Rc<RefCell<Vec<Album>>>,
        limit: usize,
    ) -> Rc<Self> {
        let selection = SelectionModel::new(selected, limit);

        let title = Label::new(Some("All Photo Albums"));
        title.add_css_class("picker-title");
        title.set_hexpand(true);

        let done_button = Button::with_label("Done");
        done_button.set_halign(Align::End);

        let header = GtkBox::new(Orientation::Horizontal, 0);
        header.add_css_class("picker-header");
        header.append(&title);
        header.append(&done_button);

        let flow = FlowBox::new();
        flow.set_selection_mode(SelectionMode::None);
        flow.set_min_children_per_line(GRID_COLUMNS);
        flow.set_max_children_per_line(GRID_COLUMNS);
        flow.set_row_spacing(GRID_SPACING);
        flow.set_column_spacing(GRID_SPACING);
        flow.set_homogeneous(true);
        flow.set_valign(Align::Start);

        let scroller = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Never)
            .vscrollbar_policy(PolicyType::Automatic)
            .child(&flow)
            .vexpand(true)
            .build();

        let root = GtkBox::new(Orientation::Vertical, 0);
        root.append(&header);
        root.append(&scroller);

        let picker = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            root,
            flow,
            presented: Rc::new(Cell::new(false)),
            selection,
            state: RefCell::new(CatalogState::new()),
            cells: RefCell::new(HashMap::new()),
            library,
            loader: RefCell::new(None),
            load_started: Cell::new(false),
            on_dismiss: RefCell::new(None),
        });
        *picker.self_weak.borrow_mut() = Rc::downgrade(&picker);

        let picker_weak = picker.downgrade();
        done_button.connect_clicked(move |_| {
            if let Some(picker) = picker_weak.upgrade() {
                picker.dismiss();
            }
        });

        picker
    }

    fn downgrade(&self) -> Weak<AlbumPicker> {
        self.self_weak.borrow().clone()
    }

    /// Root widget to embed in the host window.
    pub fn widget(&self) -> &GtkBox {
        &self.root
    }

    /// Host-shared presented flag; the picker flips it to false on Done.
    pub fn presented_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.presented)
    }

    /// Registers the dismiss callback, invoked with the final selection.
    pub fn connect_dismissed<F>(&self, callback: F)
    where
        F: Fn(&[Album]) + 'static,
    {
        *self.on_dismiss.borrow_mut() = Some(Box::new(callback));
    }

    /// Marks the picker presented and starts the catalog load.
    ///
    /// The load runs once per picker; presenting again re-uses the already
    /// populated catalog.
    pub fn present(&self) {
        self.presented.set(true);
        if self.load_started.replace(true) {
            if let Some(loader) = self.loader.borrow().as_ref() {
                debug!(busy = loader.is_busy(), "Catalog load already started");
            }
            return;
        }

        let (events_tx, events_rx) = async_channel::unbounded::<CatalogEvent>();
        let loader = CatalogLoader::spawn(Arc::clone(&self.library), events_tx);
        *self.loader.borrow_mut() = Some(loader);

        // All catalog mutation happens here, on the main thread.
        let picker_weak = self.downgrade();
        glib::spawn_future_local(async move {
            while let Ok(event) = events_rx.recv().await {
                match picker_weak.upgrade() {
                    Some(picker) => picker.handle_catalog_event(event),
                    None => break,
                }
            }
        });
    }

    fn handle_catalog_event(&self, event: CatalogEvent) {
        match event {
            CatalogEvent::AlbumFound(album) => {
                self.state
                    .borrow_mut()
                    .apply(CatalogEvent::AlbumFound(album.clone()));
                self.insert_cell(album);
            }
            CatalogEvent::ThumbnailsReady { album, thumbs } => {
                self.state.borrow_mut().apply(CatalogEvent::ThumbnailsReady {
                    album: album.clone(),
                    thumbs,
                });
                let state = self.state.borrow();
                let thumbs = state.thumbs_for(&album).unwrap_or_default();
                let textures: Vec<Texture> =
                    thumbs.iter().filter_map(texture_from_thumbnail).collect();
                if let Some(cell) = self.cells.borrow().get(&album) {
                    cell.preview.set_textures(&textures);
                }
            }
        }
    }

    fn insert_cell(&self, album: Album) {
        if self.cells.borrow().contains_key(&album.id) {
            return;
        }

        let preview = StackedPreview::new();
        preview.set_selected(self.selection.is_selected(&album));

        let title = Label::new(Some(&album.title));
        title.set_ellipsize(EllipsizeMode::End);
        title.set_halign(Align::Center);
        title.add_css_class("album-title");

        let container = GtkBox::new(Orientation::Vertical, 4);
        container.add_css_class("album-cell");
        container.append(preview.widget());
        container.append(&title);

        let picker_weak = self.downgrade();
        let tapped_album = album.clone();
        let click = GestureClick::new();
        click.connect_released(move |_, _n, _x, _y| {
            if let Some(picker) = picker_weak.upgrade() {
                picker.on_cell_tapped(&tapped_album);
            }
        });
        container.add_controller(click);

        self.flow.insert(&container, -1);
        self.cells
            .borrow_mut()
            .insert(album.id.clone(), AlbumCell { album, preview });
    }

    fn on_cell_tapped(&self, album: &Album) {
        match self.selection.toggle(album) {
            ToggleOutcome::Deselected => self.refresh_selection(),
            ToggleOutcome::Selected => {
                self.refresh_selection();
                // Limit enforcement is deferred to the next main-loop
                // iteration, mirroring the reactive adjustment pass.
                let picker_weak = self.downgrade();
                glib::idle_add_local_once(move || {
                    if let Some(picker) = picker_weak.upgrade() {
                        picker.selection.adjust();
                        picker.refresh_selection();
                    }
                });
            }
        }
    }

    fn refresh_selection(&self) {
        let cells = self.cells.borrow();
        for cell in cells.values() {
            cell.preview
                .set_selected(self.selection.is_selected(&cell.album));
        }
    }

    /// Flips the presented flag to false and fires the dismiss callback.
    pub fn dismiss(&self) {
        self.presented.set(false);
        let selection = self.selection.snapshot();
        debug!(selected = selection.len(), "Picker dismissed");
        if let Some(ref callback) = *self.on_dismiss.borrow() {
            callback(&selection);
        }
    }
}
