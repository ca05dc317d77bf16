//! Inline `style` attribute handling.

use crate::errors::DomResult;
use crate::node::{Document, NodeId};

/// Split a `style` attribute into ordered `(property, value)` pairs. Later
/// duplicates overwrite earlier ones in place.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let bytes = style.as_bytes();
    let mut start = 0usize;
    let mut depth = 0isize;
    let mut quote: Option<u8> = None;
    let mut i = 0usize;

    while i < bytes.len() {
        let ch = bytes[i];
        match quote {
            Some(_) if ch == b'\\' => {
                i += 2;
                continue;
            }
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                b'\'' | b'"' => quote = Some(ch),
                b'(' => depth += 1,
                b')' => depth = (depth - 1).max(0),
                b';' if depth == 0 => {
                    push_declaration(&style[start..i], &mut out);
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }
    if start < style.len() {
        push_declaration(&style[start..], &mut out);
    }
    out
}

fn push_declaration(raw: &str, out: &mut Vec<(String, String)>) {
    let Some((name, value)) = raw.split_once(':') else {
        return;
    };
    let name = name.trim().to_ascii_lowercase();
    let value = value.trim();
    if name.is_empty() {
        return;
    }
    match out.iter_mut().find(|(existing, _)| *existing == name) {
        Some(slot) => slot.1 = value.to_string(),
        None => out.push((name, value.to_string())),
    }
}

pub fn serialize_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Document {
    pub fn style_declarations(&self, id: NodeId) -> Vec<(String, String)> {
        self.attr(id, "style").map(parse_declarations).unwrap_or_default()
    }

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        let property = property.to_ascii_lowercase();
        self.style_declarations(id)
            .into_iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value)
    }

    /// Set one inline property, keeping the others. An empty value removes it.
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) -> DomResult<()> {
        let property = property.trim().to_ascii_lowercase();
        let mut decls = self.style_declarations(id);
        if value.trim().is_empty() {
            decls.retain(|(name, _)| *name != property);
        } else {
            match decls.iter_mut().find(|(name, _)| *name == property) {
                Some(slot) => slot.1 = value.trim().to_string(),
                None => decls.push((property, value.trim().to_string())),
            }
        }
        self.write_declarations(id, &decls)
    }

    pub fn remove_style_property(&mut self, id: NodeId, property: &str) -> DomResult<()> {
        self.set_style_property(id, property, "")
    }

    fn write_declarations(&mut self, id: NodeId, decls: &[(String, String)]) -> DomResult<()> {
        if decls.is_empty() {
            self.remove_attr(id, "style")?;
            Ok(())
        } else {
            self.set_attr(id, "style", &serialize_declarations(decls))
        }
    }

    /// Whether the element or one of its ancestors is hidden with an inline
    /// `display: none`.
    pub fn is_display_none(&self, id: NodeId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .any(|node| self.style_property(node, "display").as_deref() == Some("none"))
    }

    /// Effective inline `pointer-events` (inherited from ancestors).
    pub fn pointer_events_disabled(&self, id: NodeId) -> bool {
        for node in std::iter::once(id).chain(self.ancestors(id)) {
            if let Some(value) = self.style_property(node, "pointer-events") {
                return value == "none";
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_overwrites() {
        let decls = parse_declarations("color: red; background: url('a;b.png'); COLOR: blue");
        assert_eq!(
            decls,
            vec![
                ("color".to_string(), "blue".to_string()),
                ("background".to_string(), "url('a;b.png')".to_string()),
            ]
        );
    }

    #[test]
    fn set_and_remove_property() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        doc.set_style_property(body, "color", "red").unwrap();
        doc.set_style_property(body, "margin", "0").unwrap();
        assert_eq!(doc.attr(body, "style"), Some("color: red; margin: 0;"));
        doc.remove_style_property(body, "color").unwrap();
        doc.remove_style_property(body, "margin").unwrap();
        assert_eq!(doc.attr(body, "style"), None);
    }

    #[test]
    fn display_none_is_inherited() {
        let mut doc = Document::parse("<div id=o style=\"display:none\"><p id=i>x</p></div>");
        let inner = doc.query_one("#i").unwrap().unwrap();
        assert!(doc.is_display_none(inner));
        let outer = doc.query_one("#o").unwrap().unwrap();
        doc.remove_style_property(outer, "display").unwrap();
        assert!(!doc.is_display_none(inner));
    }
}
