//! Inbound parameter bags and invocation classification.
//!
//! Slack delivers both slash commands and interactive button clicks as
//! `application/x-www-form-urlencoded` bodies. Values are kept array-wrapped
//! (`text[0]`, `payload[0]`, ...) so repeated keys survive decoding.

use std::collections::HashMap;

/// Key carrying the JSON document of a confirmation click.
pub const PAYLOAD_KEY: &str = "payload";

/// A form-decoded parameter bag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamBag(HashMap<String, Vec<String>>);

impl ParamBag {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a form-encoded request body.
    #[must_use]
    pub fn from_form(body: &str) -> Self {
        let mut bag = Self::new();
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            bag.insert(key.into_owned(), value.into_owned());
        }
        bag
    }

    /// Append a value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Whether `key` is present, regardless of its values.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The first value under `key` (the `key[0]` convention).
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    /// All values under `key`.
    #[must_use]
    pub fn all(&self, key: &str) -> &[String] {
        self.0.get(key).map_or(&[], Vec::as_slice)
    }
}

impl<K, V> FromIterator<(K, V)> for ParamBag
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (key, value) in iter {
            bag.insert(key, value);
        }
        bag
    }
}

/// Returns `true` iff the bag is a confirmation callback.
#[must_use]
pub fn classify(bag: &ParamBag) -> bool {
    bag.contains(PAYLOAD_KEY)
}

/// The two kinds of inbound invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    /// A fresh slash command typed by a user.
    Standard,
    /// A button click on a previous prompt.
    Confirmation,
}

impl InvocationKind {
    /// Classify a parameter bag.
    #[must_use]
    pub fn of(bag: &ParamBag) -> Self {
        if classify(bag) {
            Self::Confirmation
        } else {
            Self::Standard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_empty_bag() {
        assert!(!classify(&ParamBag::new()));
        assert_eq!(InvocationKind::of(&ParamBag::new()), InvocationKind::Standard);
    }

    #[test]
    fn test_classify_payload() {
        let bag = ParamBag::new().with("payload", "{}");
        assert!(classify(&bag));
        assert_eq!(InvocationKind::of(&bag), InvocationKind::Confirmation);
    }

    #[test]
    fn test_classify_standard_bag() {
        let bag = ParamBag::new()
            .with("text", "props list")
            .with("user_id", "U123");
        assert!(!classify(&bag));
    }

    #[test]
    fn test_from_form_decodes_values() {
        let bag = ParamBag::from_form("text=props+set+%22a+b%22&user_name=jane&text=second");
        assert_eq!(bag.first("text"), Some("props set \"a b\""));
        assert_eq!(bag.all("text").len(), 2);
        assert_eq!(bag.first("user_name"), Some("jane"));
        assert_eq!(bag.first("missing"), None);
    }

    #[test]
    fn test_from_iter() {
        let bag: ParamBag = [("user_id", "U1"), ("user_id", "U2")].into_iter().collect();
        assert_eq!(bag.all("user_id"), ["U1".to_string(), "U2".to_string()]);
    }
}
