//! Response envelope conventions.
//!
//! A single-entity response looks like
//! `{"result": "ok", "data": {"id", "type", "attributes"}, "relationships": [...]}`;
//! a collection is either `{"results": [envelope, ...]}` or `{"data": [resource, ...]}`.
//! Entity parsers read through `Value` indexing, which yields `Null` for any
//! missing path, so partial payloads degrade to `None` fields instead of failing.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::relationship::EntityType;

/// The `result` field, if present.
pub fn response_status(raw: &Value) -> Option<&str> {
    raw.get("result").and_then(Value::as_str)
}

/// Human-readable failure text from an error envelope.
pub fn response_message(raw: &Value) -> String {
    let details: Vec<&str> = raw
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| {
                    e.get("detail")
                        .and_then(Value::as_str)
                        .or_else(|| e.get("title").and_then(Value::as_str))
                })
                .collect()
        })
        .unwrap_or_default();

    if !details.is_empty() {
        return details.join("\n");
    }
    raw.get("message")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| raw.to_string())
}

/// A response without a `result` field counts as success.
pub fn is_ok(raw: &Value) -> bool {
    response_status(raw).map_or(true, |status| status == "ok")
}

pub fn ensure_ok(raw: &Value, context: &str) -> Result<()> {
    if is_ok(raw) {
        Ok(())
    } else {
        Err(Error::Semantic(format!(
            "{context}:\n{}",
            response_message(raw)
        )))
    }
}

/// Like [`ensure_ok`], but an error envelope carrying status 404 becomes `NotFound`.
pub fn ensure_found(raw: &Value, kind: EntityType, id: &str) -> Result<()> {
    if is_ok(raw) {
        return Ok(());
    }
    let missing = raw
        .get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| errors.iter().any(|e| e.get("status").and_then(Value::as_u64) == Some(404)));
    if missing {
        return Err(Error::NotFound {
            kind,
            id: id.to_string(),
        });
    }
    ensure_ok(raw, &format!("Failed to fetch {kind} {id}"))
}

/// The relationships array of an envelope, from the top level or from `data`.
pub fn relationships(raw: &Value) -> Option<&Value> {
    raw.get("relationships")
        .filter(|r| r.is_array())
        .or_else(|| raw["data"].get("relationships").filter(|r| r.is_array()))
}

/// Split a collection response into per-item envelopes.
pub fn page_items(raw: &Value) -> Result<Vec<Value>> {
    if let Some(results) = raw.get("results").and_then(Value::as_array) {
        return Ok(results.clone());
    }
    if let Some(data) = raw.get("data").and_then(Value::as_array) {
        return Ok(data
            .iter()
            .map(|resource| {
                json!({
                    "result": "ok",
                    "data": resource,
                    "relationships": resource.get("relationships").cloned().unwrap_or(Value::Null),
                })
            })
            .collect());
    }
    Err(Error::Semantic(format!(
        "expected a collection response, got:\n{raw}"
    )))
}

/// A single-entity reply must at least carry `data` with a non-empty `id`.
///
/// Everything below `data.id` is still read leniently.
pub fn ensure_data(raw: &Value) -> Result<&Value> {
    let data = raw
        .get("data")
        .filter(|d| d.is_object())
        .ok_or_else(|| Error::Semantic(format!("expected an entity envelope, got:\n{raw}")))?;
    match data.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(data),
        _ => Err(Error::Semantic("envelope `data.id` is missing or empty".into())),
    }
}

/// Strict check of the envelope shape that entity parsers tolerate silently.
pub fn validate_envelope(raw: &Value) -> Result<()> {
    ensure_ok(raw, "Envelope reports failure")?;
    let data = ensure_data(raw)?;
    if !data.get("attributes").is_some_and(Value::is_object) {
        return Err(Error::Semantic("envelope `data.attributes` is not an object".into()));
    }
    if let Some(rels) = raw.get("relationships") {
        if !rels.is_array() {
            return Err(Error::Semantic("envelope `relationships` is not an array".into()));
        }
    }
    Ok(())
}

pub fn string(value: &Value) -> Option<String> {
    value.as_str().map(String::from)
}

/// Numbers and numeric strings parse; `null`, blanks and anything else give `None`.
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

/// Whole numbers only; `"1999"` and `1999` parse, `"1999.5"` does not.
pub fn integer(value: &Value) -> Option<i64> {
    number(value)
        .filter(|n| n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64)
        .map(|n| n as i64)
}

/// RFC 3339 timestamps, or offset-less ones taken as UTC.
pub fn date(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_parsing_is_defensive() {
        assert_eq!(integer(&json!("2020")), Some(2020));
        assert_eq!(integer(&json!(1999)), Some(1999));
        assert_eq!(integer(&Value::Null), None);
        assert_eq!(integer(&json!("soon")), None);
        assert_eq!(integer(&json!("")), None);
        assert_eq!(integer(&json!({})), None);
        assert_eq!(number(&json!("12.5")), Some(12.5));
        assert_eq!(number(&json!(" 7 ")), Some(7.0));
        assert_eq!(number(&json!("NaN")), None);
    }

    #[test]
    fn test_dates() {
        let dt = date(&json!("2021-04-19T21:59:45+00:00")).unwrap();
        assert_eq!(dt.to_rfc3339(), "2021-04-19T21:59:45+00:00");
        assert!(date(&json!("2021-04-19T21:59:45")).is_some());
        assert!(date(&json!("yesterday")).is_none());
        assert!(date(&Value::Null).is_none());
    }

    #[test]
    fn test_status_and_message() {
        let err = json!({
            "result": "error",
            "errors": [
                { "status": 400, "title": "Bad request", "detail": "limit must be <= 100" },
                { "status": 400, "title": "Also bad" }
            ]
        });
        assert!(!is_ok(&err));
        assert_eq!(response_message(&err), "limit must be <= 100\nAlso bad");

        let failure = ensure_ok(&err, "Manga search returned error").unwrap_err();
        assert!(failure.is_semantic());
        assert!(failure.to_string().contains("limit must be <= 100"));

        assert!(is_ok(&json!({ "results": [] })));
        assert_eq!(response_message(&json!({ "result": "ko", "message": "nope" })), "nope");
    }

    #[test]
    fn test_ensure_found() {
        let missing = json!({ "result": "error", "errors": [{ "status": 404, "title": "Not found" }] });
        assert!(matches!(
            ensure_found(&missing, EntityType::Chapter, "c1"),
            Err(Error::NotFound { kind: EntityType::Chapter, .. })
        ));
        let other = json!({ "result": "error", "errors": [{ "status": 403, "detail": "Forbidden" }] });
        assert!(matches!(ensure_found(&other, EntityType::Chapter, "c1"), Err(Error::Semantic(_))));
    }

    #[test]
    fn test_page_items_accepts_both_shapes() {
        let legacy = json!({ "results": [{ "data": { "id": "1" } }, { "data": { "id": "2" } }] });
        assert_eq!(page_items(&legacy).unwrap().len(), 2);

        let modern = json!({
            "result": "ok",
            "data": [{ "id": "1", "attributes": {}, "relationships": [{ "type": "author", "id": "a" }] }]
        });
        let items = page_items(&modern).unwrap();
        assert_eq!(items[0]["data"]["id"], "1");
        assert_eq!(items[0]["relationships"][0]["id"], "a");

        let err = page_items(&json!({ "data": { "id": "1" } })).unwrap_err();
        assert!(err.is_semantic());
    }

    #[test]
    fn test_relationships_fallback() {
        let top = json!({ "data": {}, "relationships": [{ "type": "manga", "id": "m" }] });
        assert_eq!(relationships(&top).unwrap()[0]["id"], "m");
        let nested = json!({ "data": { "relationships": [{ "type": "user", "id": "u" }] } });
        assert_eq!(relationships(&nested).unwrap()[0]["id"], "u");
        assert!(relationships(&json!({})).is_none());
    }

    #[test]
    fn test_validate_envelope() {
        let good = json!({ "result": "ok", "data": { "id": "x", "attributes": {} }, "relationships": [] });
        assert!(validate_envelope(&good).is_ok());

        for bad in [
            json!({}),
            json!({ "data": { "attributes": {} } }),
            json!({ "data": { "id": "", "attributes": {} } }),
            json!({ "data": { "id": "x" } }),
            json!({ "data": { "id": "x", "attributes": {} }, "relationships": {} }),
            json!({ "result": "error", "data": { "id": "x", "attributes": {} } }),
        ] {
            assert!(validate_envelope(&bad).unwrap_err().is_semantic(), "{bad}");
        }
    }
}
