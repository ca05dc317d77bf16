//! Visual editing sessions.
//!
//! A [`VisualEditor`] lets the user select page elements and edit them
//! through an action menu. Every edit mutates the page immediately, is
//! recorded in the session's [`ChangeTracker`] under the `(selector, type)`
//! merge rule, and is propagated to the host through a callback. Undo
//! reverts both the list and the page using an [`InverseOp`] captured when
//! the edit was made.

pub mod actions;
pub mod chrome;
pub mod editor;
pub mod errors;
pub mod inverse;
pub mod menu;
pub mod tracker;

pub use actions::{EditorAction, InsertBlock, MenuCommand, ToolbarAction};
pub use chrome::EditorChrome;
pub use editor::{ChangesCallback, EditorResponse, EditorState, VisualEditor};
pub use errors::EditorError;
pub use inverse::InverseOp;
pub use menu::ActionMenu;
pub use tracker::ChangeTracker;
