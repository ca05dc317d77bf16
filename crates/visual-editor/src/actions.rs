//! Editor actions: the action menu and the toolbar.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use variant_core_types::InsertPosition;

/// Block created by the insert action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertBlock {
    pub position: InsertPosition,
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Inner HTML of the new element.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

fn default_tag() -> String {
    "div".to_string()
}

impl InsertBlock {
    pub fn new(position: InsertPosition, tag: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            position,
            tag: tag.into(),
            content: content.into(),
            classes: Vec::new(),
            id: None,
        }
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Action applied to the selected element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "args", rename_all = "camelCase")]
pub enum EditorAction {
    EditText(String),
    EditHtml(String),
    MoveUp,
    MoveDown,
    CopyElement,
    CopySelector,
    Insert(InsertBlock),
    Hide,
    /// Recorded as `delete`; the preview hides the element.
    Delete,
    /// Recorded as `delete`, but the element really leaves the page.
    Remove,
    Duplicate,
    SetStyle(BTreeMap<String, String>),
    SetAttribute(String, String),
    AddClass(String),
    RemoveClass(String),
    SelectParent,
}

impl EditorAction {
    pub fn name(&self) -> &'static str {
        match self {
            EditorAction::EditText(_) => "edit-text",
            EditorAction::EditHtml(_) => "edit-html",
            EditorAction::MoveUp => "move-up",
            EditorAction::MoveDown => "move-down",
            EditorAction::CopyElement => "copy-element",
            EditorAction::CopySelector => "copy-selector",
            EditorAction::Insert(_) => "insert",
            EditorAction::Hide => "hide",
            EditorAction::Delete => "delete",
            EditorAction::Remove => "remove",
            EditorAction::Duplicate => "duplicate",
            EditorAction::SetStyle(_) => "set-style",
            EditorAction::SetAttribute(_, _) => "set-attribute",
            EditorAction::AddClass(_) => "add-class",
            EditorAction::RemoveClass(_) => "remove-class",
            EditorAction::SelectParent => "select-parent",
        }
    }

    /// Whether the action records a change (and so mutates the page).
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            EditorAction::CopyElement | EditorAction::CopySelector | EditorAction::SelectParent
        )
    }
}

/// Entry of the floating action menu. Entries that need input from the user
/// are handed back to the host instead of running directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuCommand {
    EditText,
    EditHtml,
    MoveUp,
    MoveDown,
    CopyElement,
    CopySelector,
    Insert,
    Hide,
    Delete,
    Remove,
    Duplicate,
    SelectParent,
}

impl MenuCommand {
    pub const ALL: [MenuCommand; 12] = [
        MenuCommand::EditText,
        MenuCommand::EditHtml,
        MenuCommand::MoveUp,
        MenuCommand::MoveDown,
        MenuCommand::CopyElement,
        MenuCommand::CopySelector,
        MenuCommand::Insert,
        MenuCommand::Hide,
        MenuCommand::Delete,
        MenuCommand::Remove,
        MenuCommand::Duplicate,
        MenuCommand::SelectParent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MenuCommand::EditText => "edit-text",
            MenuCommand::EditHtml => "edit-html",
            MenuCommand::MoveUp => "move-up",
            MenuCommand::MoveDown => "move-down",
            MenuCommand::CopyElement => "copy-element",
            MenuCommand::CopySelector => "copy-selector",
            MenuCommand::Insert => "insert",
            MenuCommand::Hide => "hide",
            MenuCommand::Delete => "delete",
            MenuCommand::Remove => "remove",
            MenuCommand::Duplicate => "duplicate",
            MenuCommand::SelectParent => "select-parent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuCommand::EditText => "Edit text",
            MenuCommand::EditHtml => "Edit HTML",
            MenuCommand::MoveUp => "Move up",
            MenuCommand::MoveDown => "Move down",
            MenuCommand::CopyElement => "Copy element",
            MenuCommand::CopySelector => "Copy selector",
            MenuCommand::Insert => "Insert block",
            MenuCommand::Hide => "Hide",
            MenuCommand::Delete => "Delete",
            MenuCommand::Remove => "Remove",
            MenuCommand::Duplicate => "Duplicate",
            MenuCommand::SelectParent => "Select parent",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|cmd| cmd.name() == name)
    }

    /// The action to run right away, or `None` when the host must collect
    /// input first.
    pub fn immediate_action(&self) -> Option<EditorAction> {
        match self {
            MenuCommand::MoveUp => Some(EditorAction::MoveUp),
            MenuCommand::MoveDown => Some(EditorAction::MoveDown),
            MenuCommand::CopyElement => Some(EditorAction::CopyElement),
            MenuCommand::CopySelector => Some(EditorAction::CopySelector),
            MenuCommand::Hide => Some(EditorAction::Hide),
            MenuCommand::Delete => Some(EditorAction::Delete),
            MenuCommand::Remove => Some(EditorAction::Remove),
            MenuCommand::Duplicate => Some(EditorAction::Duplicate),
            MenuCommand::SelectParent => Some(EditorAction::SelectParent),
            MenuCommand::EditText | MenuCommand::EditHtml | MenuCommand::Insert => None,
        }
    }
}

/// Toolbar buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolbarAction {
    Undo,
    Clear,
    Save,
    Exit,
}

impl ToolbarAction {
    pub const ALL: [ToolbarAction; 4] = [
        ToolbarAction::Undo,
        ToolbarAction::Clear,
        ToolbarAction::Save,
        ToolbarAction::Exit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolbarAction::Undo => "undo",
            ToolbarAction::Clear => "clear",
            ToolbarAction::Save => "save",
            ToolbarAction::Exit => "exit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ToolbarAction::Undo => "Undo",
            ToolbarAction::Clear => "Clear all",
            ToolbarAction::Save => "Save",
            ToolbarAction::Exit => "Exit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|action| action.name() == name)
    }
}
