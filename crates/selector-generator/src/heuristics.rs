//! Detection of auto-generated class names and attribute values.
//!
//! Build tools emit tokens that change on every deploy (CSS modules,
//! CSS-in-JS, styled-jsx). Selectors built on them break silently, so the
//! robust tier never uses them.

use once_cell::sync::Lazy;
use regex::Regex;

/// CSS modules: `[name]__[local]___[hash]`
static CSS_MODULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][\w-]*__[\w-]+_{2,3}[A-Za-z0-9-]{5,}$").unwrap());

/// CSS-in-JS runtimes: `css-1x2y3z`, `sc-bdVaJa`, `emotion-0`, `makeStyles-root-12`
static CSS_IN_JS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:css|sc|emotion|jss)-[A-Za-z0-9]{4,}$|^makeStyles-[\w-]+-\d+$|^emotion-\d+$")
        .unwrap()
});

/// styled-jsx scoping classes
static JSX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^jsx-\d+$").unwrap());

static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4,}").unwrap());

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

/// Whether a class token looks machine-generated.
pub fn is_generated_token(token: &str) -> bool {
    CSS_MODULE_RE.is_match(token)
        || CSS_IN_JS_RE.is_match(token)
        || JSX_RE.is_match(token)
        || DIGIT_RUN_RE.is_match(token)
        || has_hash_segment(token)
}

/// Whether an attribute value looks machine-generated.
pub fn is_generated_value(value: &str) -> bool {
    value.len() > 64
        || UUID_RE.is_match(value)
        || DIGIT_RUN_RE.is_match(value)
        || has_hash_segment(value)
}

/// A `-`/`_` separated segment of six or more characters mixing letters and
/// digits (`a1b2c3`, `x7Fq9Z`). Plain words and numbers (`grid-12`) pass.
fn has_hash_segment(token: &str) -> bool {
    token.split(['-', '_']).any(|segment| {
        segment.len() >= 6
            && segment.chars().all(|c| c.is_ascii_alphanumeric())
            && segment.chars().any(|c| c.is_ascii_digit())
            && segment.chars().any(|c| c.is_ascii_alphabetic())
    })
}

/// A class usable by the robust tier.
pub fn is_stable_class(class_name: &str, reserved_prefix: &str) -> bool {
    !class_name.starts_with(reserved_prefix) && !is_generated_token(class_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_generated_classes() {
        for token in [
            "Button__root___1x2Yz",
            "css-1x2y3z",
            "sc-bdVaJa",
            "jsx-2812871",
            "makeStyles-root-12",
            "item-20231104",
            "a1b2c3",
        ] {
            assert!(is_generated_token(token), "{token} should be flagged");
        }
    }

    #[test]
    fn keeps_readable_classes() {
        for token in ["btn", "btn-primary", "card__title", "grid-12", "col-md-6", "hero", "h1"] {
            assert!(!is_generated_token(token), "{token} should be kept");
        }
    }

    #[test]
    fn flags_generated_values() {
        assert!(is_generated_value("3f2504e0-4f89-11d3-9a0c-0305e82c3301"));
        assert!(is_generated_value("row-884213"));
        assert!(!is_generated_value("checkout-button"));
    }

    #[test]
    fn reserved_classes_are_unstable() {
        assert!(!is_stable_class("vstudio-overlay", "vstudio-"));
        assert!(is_stable_class("cta", "vstudio-"));
    }
}
