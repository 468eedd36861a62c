pub mod picker;
pub mod stacked_preview;
pub mod window;

pub use picker::AlbumPicker;
pub use window::PickerWindow;
