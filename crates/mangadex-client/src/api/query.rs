//! Query parameter set and its wire encoding.
//!
//! The API expects lists as repeated `key[]=value` pairs and maps as
//! `key[sub]=value`, e.g. `includedTags[]=…&order[createdAt]=desc`.

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Scalar(String),
    List(Vec<String>),
    Map(Vec<(String, String)>),
}

/// Logical number of records a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Count(u64),
    /// Keep paging until the collection is exhausted.
    Unbounded,
}

impl From<u64> for Limit {
    fn from(n: u64) -> Self {
        Limit::Count(n)
    }
}

/// Ordered query parameters plus the logical `limit`/`offset` window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
    pub limit: Option<Limit>,
    pub offset: u64,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, QueryValue::Scalar(value.to_string()));
        self
    }

    pub fn with_list<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(key, QueryValue::List(values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_map<I, K, V>(mut self, key: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.set(
            key,
            QueryValue::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        );
        self
    }

    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Insert or replace a parameter, keeping its original position on replace.
    pub fn set(&mut self, key: impl Into<String>, value: QueryValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.limit.is_none() && self.offset == 0
    }

    /// Flatten into `(key, value)` pairs ready for the query string.
    ///
    /// An `Unbounded` limit is never sent; the caster replaces it with page sizes.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.entries {
            match value {
                QueryValue::Scalar(v) => pairs.push((key.clone(), v.clone())),
                QueryValue::List(items) => {
                    pairs.extend(items.iter().map(|v| (format!("{key}[]"), v.clone())))
                }
                QueryValue::Map(items) => {
                    pairs.extend(items.iter().map(|(k, v)| (format!("{key}[{k}]"), v.clone())))
                }
            }
        }
        if let Some(Limit::Count(n)) = self.limit {
            pairs.push(("limit".into(), n.to_string()));
        }
        if self.offset > 0 || matches!(self.limit, Some(Limit::Count(_))) {
            pairs.push(("offset".into(), self.offset.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encoding_conventions() {
        let params = QueryParams::new()
            .with("title", "One Piece")
            .with_list("includedTags", ["t1", "t2"])
            .with_map("order", [("createdAt", "desc")])
            .with("year", 1997);

        assert_eq!(
            params.to_pairs(),
            owned(&[
                ("title", "One Piece"),
                ("includedTags[]", "t1"),
                ("includedTags[]", "t2"),
                ("order[createdAt]", "desc"),
                ("year", "1997"),
            ])
        );
    }

    #[test]
    fn test_window_is_appended() {
        let params = QueryParams::new().with("title", "x").limit(Limit::Count(20)).offset(40);
        assert_eq!(
            params.to_pairs(),
            owned(&[("title", "x"), ("limit", "20"), ("offset", "40")])
        );

        let unbounded = QueryParams::new().limit(Limit::Unbounded);
        assert!(unbounded.to_pairs().is_empty());
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut params = QueryParams::new().with("a", 1).with("b", 2);
        params.set("a", QueryValue::Scalar("3".into()));
        assert_eq!(params.to_pairs(), owned(&[("a", "3"), ("b", "2")]));
        assert_eq!(params.get("b"), Some(&QueryValue::Scalar("2".into())));
        assert!(!params.is_empty());
        assert!(QueryParams::new().is_empty());
    }
}
