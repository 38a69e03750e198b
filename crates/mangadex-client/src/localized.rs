//! Locale-keyed text.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Locale used when a caller does not configure one.
pub const DEFAULT_LOCALE: &str = "en";

/// A map of locale code to text, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedString {
    entries: Vec<(String, String)>,
}

impl LocalizedString {
    /// Read a `{locale: text}` object. Non-string values are skipped; anything
    /// that is not an object gives an empty string set.
    pub fn from_value(value: &Value) -> Self {
        let entries = value
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(locale, text)| Some((locale.clone(), text.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        Self { entries }
    }

    /// Text for exactly this locale.
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == locale)
            .map(|(_, text)| text.as_str())
    }

    /// Text for `locale`, else English, else whatever comes first.
    ///
    /// Only an empty map yields `None`.
    pub fn local_string(&self, locale: &str) -> Option<&str> {
        self.get(locale)
            .or_else(|| self.get(DEFAULT_LOCALE))
            .or_else(|| self.entries.first().map(|(_, text)| text.as_str()))
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<L: Into<String>, T: Into<String>> FromIterator<(L, T)> for LocalizedString {
    fn from_iter<I: IntoIterator<Item = (L, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(l, t)| (l.into(), t.into())).collect(),
        }
    }
}

impl Serialize for LocalizedString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(l, t)| (l, t)))
    }
}

impl<'de> Deserialize<'de> for LocalizedString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}
