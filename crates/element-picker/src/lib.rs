//! Interactive single-shot element picker.

pub mod errors;
pub mod overlay;
pub mod picker;

pub use errors::PickerError;
pub use overlay::PickerOverlay;
pub use picker::{ElementPicker, PickerResponse, PickerState, SelectionCallback};
