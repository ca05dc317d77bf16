//! The declarative `DomChange` record and its wire form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Kind of mutation a change performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Text,
    Html,
    Style,
    Class,
    Attribute,
    Move,
    Insert,
    Delete,
    Duplicate,
}

impl ChangeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChangeKind::Text => "text",
            ChangeKind::Html => "html",
            ChangeKind::Style => "style",
            ChangeKind::Class => "class",
            ChangeKind::Attribute => "attribute",
            ChangeKind::Move => "move",
            ChangeKind::Insert => "insert",
            ChangeKind::Delete => "delete",
            ChangeKind::Duplicate => "duplicate",
        }
    }

    /// Kinds whose value is a property map rather than a string.
    pub fn takes_properties(&self) -> bool {
        matches!(self, ChangeKind::Style | ChangeKind::Attribute)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Placement of inserted or moved content relative to a reference element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Before,
    After,
    Prepend,
    Append,
}

impl InsertPosition {
    pub fn name(&self) -> &'static str {
        match self {
            InsertPosition::Before => "before",
            InsertPosition::After => "after",
            InsertPosition::Prepend => "prepend",
            InsertPosition::Append => "append",
        }
    }
}

/// Type-dependent payload of a change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeValue {
    #[default]
    Empty,
    Text(String),
    Properties(#[serde(deserialize_with = "scalar_properties")] BTreeMap<String, String>),
}

/// Property values may arrive as JSON numbers or booleans (`{"opacity": 0.5}`);
/// they are stored as their JSON text.
fn scalar_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(serde_json::Number),
        Flag(bool),
    }

    let raw = BTreeMap::<String, Scalar>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                Scalar::Text(text) => text,
                Scalar::Number(number) => number.to_string(),
                Scalar::Flag(flag) => flag.to_string(),
            };
            (name, value)
        })
        .collect())
}

impl ChangeValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, ChangeValue::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ChangeValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_properties(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ChangeValue::Properties(map) => Some(map),
            _ => None,
        }
    }
}

/// Direction of a `class` change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassOp {
    Add,
    Remove,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChangeError {
    #[error("change has an empty selector")]
    EmptySelector,

    #[error("{kind} change expects {expected}")]
    ValueShape {
        kind: ChangeKind,
        expected: &'static str,
    },

    #[error("{kind} change is missing `{field}`")]
    MissingField {
        kind: ChangeKind,
        field: &'static str,
    },

    #[error("unknown class operation: {0}")]
    UnknownClassOp(String),
}

fn default_enabled() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// One declarative mutation of a page element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomChange {
    pub selector: String,

    #[serde(rename = "type")]
    pub kind: ChangeKind,

    #[serde(default, skip_serializing_if = "ChangeValue::is_empty")]
    pub value: ChangeValue,

    #[serde(default = "default_enabled", skip_serializing_if = "is_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_selector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<InsertPosition>,
}

impl DomChange {
    fn base(selector: impl Into<String>, kind: ChangeKind, value: ChangeValue) -> Self {
        Self {
            selector: selector.into(),
            kind,
            value,
            enabled: true,
            class_name: None,
            target_selector: None,
            position: None,
        }
    }

    pub fn text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self::base(selector, ChangeKind::Text, ChangeValue::Text(text.into()))
    }

    pub fn html(selector: impl Into<String>, html: impl Into<String>) -> Self {
        Self::base(selector, ChangeKind::Html, ChangeValue::Text(html.into()))
    }

    pub fn style<I, K, V>(selector: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::base(selector, ChangeKind::Style, ChangeValue::Properties(map))
    }

    pub fn attribute(
        selector: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let mut map = BTreeMap::new();
        map.insert(name.into(), value.into());
        Self::base(selector, ChangeKind::Attribute, ChangeValue::Properties(map))
    }

    pub fn class(selector: impl Into<String>, class_name: impl Into<String>, op: ClassOp) -> Self {
        let op = match op {
            ClassOp::Add => "add",
            ClassOp::Remove => "remove",
        };
        let mut change = Self::base(selector, ChangeKind::Class, ChangeValue::Text(op.into()));
        change.class_name = Some(class_name.into());
        change
    }

    pub fn moved(
        selector: impl Into<String>,
        target_selector: impl Into<String>,
        position: InsertPosition,
    ) -> Self {
        let mut change = Self::base(selector, ChangeKind::Move, ChangeValue::Empty);
        change.target_selector = Some(target_selector.into());
        change.position = Some(position);
        change
    }

    pub fn insert(
        selector: impl Into<String>,
        html: impl Into<String>,
        position: InsertPosition,
    ) -> Self {
        let mut change = Self::base(selector, ChangeKind::Insert, ChangeValue::Text(html.into()));
        change.position = Some(position);
        change
    }

    pub fn delete(selector: impl Into<String>) -> Self {
        Self::base(selector, ChangeKind::Delete, ChangeValue::Empty)
    }

    pub fn duplicate(selector: impl Into<String>) -> Self {
        Self::base(selector, ChangeKind::Duplicate, ChangeValue::Empty)
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The merge key: at most one record exists per `(selector, kind)`.
    pub fn key(&self) -> (&str, ChangeKind) {
        (self.selector.as_str(), self.kind)
    }

    pub fn same_key(&self, other: &DomChange) -> bool {
        self.key() == other.key()
    }

    /// Fold a newer record for the same key into this one. Style maps merge
    /// shallowly with the newer property winning; every other kind is replaced.
    pub fn merge_from(&mut self, newer: DomChange) {
        debug_assert!(self.same_key(&newer));
        if self.kind == ChangeKind::Style {
            if let (ChangeValue::Properties(current), ChangeValue::Properties(incoming)) =
                (&mut self.value, &newer.value)
            {
                current.extend(incoming.iter().map(|(k, v)| (k.clone(), v.clone())));
                self.enabled = newer.enabled;
                return;
            }
        }
        *self = newer;
    }

    pub fn class_op(&self) -> Result<ClassOp, ChangeError> {
        match self.value.as_text().unwrap_or("add") {
            "add" => Ok(ClassOp::Add),
            "remove" => Ok(ClassOp::Remove),
            other => Err(ChangeError::UnknownClassOp(other.to_string())),
        }
    }

    /// Check that the value shape and auxiliary fields match the kind.
    pub fn validate(&self) -> Result<(), ChangeError> {
        if self.selector.trim().is_empty() {
            return Err(ChangeError::EmptySelector);
        }
        match self.kind {
            ChangeKind::Text | ChangeKind::Html => {
                if self.value.as_text().is_none() {
                    return Err(ChangeError::ValueShape {
                        kind: self.kind,
                        expected: "a string value",
                    });
                }
            }
            ChangeKind::Style | ChangeKind::Attribute => {
                if self.value.as_properties().is_none() {
                    return Err(ChangeError::ValueShape {
                        kind: self.kind,
                        expected: "an object of properties",
                    });
                }
            }
            ChangeKind::Class => {
                if self.class_name.as_deref().map_or(true, str::is_empty) {
                    return Err(ChangeError::MissingField {
                        kind: self.kind,
                        field: "className",
                    });
                }
                self.class_op()?;
            }
            ChangeKind::Move => {
                if self.target_selector.is_none() {
                    return Err(ChangeError::MissingField {
                        kind: self.kind,
                        field: "targetSelector",
                    });
                }
            }
            ChangeKind::Insert => {
                if self.value.as_text().is_none() {
                    return Err(ChangeError::ValueShape {
                        kind: self.kind,
                        expected: "an html string",
                    });
                }
            }
            ChangeKind::Delete | ChangeKind::Duplicate => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn style_changes_merge_shallowly() {
        let mut first = DomChange::style("#cta", [("color", "red")]);
        first.merge_from(DomChange::style("#cta", [("background", "blue")]));
        let expected: BTreeMap<String, String> = [
            ("color".to_string(), "red".to_string()),
            ("background".to_string(), "blue".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(first.value, ChangeValue::Properties(expected));
    }

    #[test]
    fn later_style_property_wins() {
        let mut first = DomChange::style("#cta", [("color", "red")]);
        first.merge_from(DomChange::style("#cta", [("color", "green")]));
        assert_eq!(
            first.value.as_properties().and_then(|m| m.get("color")).map(String::as_str),
            Some("green")
        );
    }

    #[test]
    fn non_style_changes_are_replaced() {
        let mut first = DomChange::text("#cta", "Buy");
        first.merge_from(DomChange::text("#cta", "Buy Now"));
        assert_eq!(first.value.as_text(), Some("Buy Now"));
    }

    #[test]
    fn wire_form_uses_camel_case_and_type() {
        let change = DomChange::class(".box", "highlight", ClassOp::Add);
        let value = serde_json::to_value(&change).unwrap();
        assert_eq!(
            value,
            json!({"selector": ".box", "type": "class", "value": "add", "className": "highlight"})
        );
    }

    #[test]
    fn enabled_defaults_to_true() {
        let change: DomChange =
            serde_json::from_value(json!({"selector": "#a", "type": "delete"})).unwrap();
        assert!(change.enabled);
        assert!(change.value.is_empty());

        let change: DomChange = serde_json::from_value(
            json!({"selector": "#a", "type": "style", "value": {"color": "red"}, "enabled": false}),
        )
        .unwrap();
        assert!(!change.enabled);
        assert!(change.value.as_properties().is_some());
    }

    #[test]
    fn numeric_and_boolean_properties_are_stringified() {
        let change: DomChange = serde_json::from_value(json!({
            "selector": "#cta",
            "type": "style",
            "value": {"opacity": 0.5, "z-index": 10, "color": "red"}
        }))
        .unwrap();
        let properties = change.value.as_properties().unwrap();
        assert_eq!(properties["opacity"], "0.5");
        assert_eq!(properties["z-index"], "10");
        assert_eq!(properties["color"], "red");

        let change: DomChange = serde_json::from_value(json!({
            "selector": "input",
            "type": "attribute",
            "value": {"aria-hidden": true}
        }))
        .unwrap();
        assert_eq!(change.value.as_properties().unwrap()["aria-hidden"], "true");

        let nested: Result<DomChange, _> = serde_json::from_value(json!({
            "selector": "#cta",
            "type": "style",
            "value": {"color": {"r": 1}}
        }));
        assert!(nested.is_err());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let parsed: Result<DomChange, _> =
            serde_json::from_value(json!({"selector": "#a", "type": "javascript", "value": "x"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn validate_checks_value_shape() {
        let mut bad = DomChange::text("#a", "x");
        bad.value = ChangeValue::Empty;
        assert!(matches!(bad.validate(), Err(ChangeError::ValueShape { .. })));

        let mut mv = DomChange::moved("#a", "#b", InsertPosition::After);
        assert!(mv.validate().is_ok());
        mv.target_selector = None;
        assert!(matches!(mv.validate(), Err(ChangeError::MissingField { .. })));

        assert_eq!(DomChange::delete(" ").validate(), Err(ChangeError::EmptySelector));
    }
}
