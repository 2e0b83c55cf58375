//! Content classification for assistant replies.
//!
//! Turns the opaque `content` of a `response` frame into a [`Content`]
//! value. Classification never fails: anything that cannot be decoded is
//! shown as text.

use scout_types::{CompanyRecord, Content, JobListing, Profile, ResultItem};
use serde_json::{Map, Value};
use tracing::trace;

/// Classify raw response content.
///
/// Strings starting with `[` or `{` (after leading whitespace) are decoded
/// as JSON; a single record becomes a one-element item list. Decode failures
/// and all other strings stay text, byte for byte.
pub fn classify(raw: Value) -> Content {
    match raw {
        Value::String(text) => classify_text(text),
        Value::Array(items) => Content::Items(items.into_iter().map(classify_item).collect()),
        record @ Value::Object(_) => Content::Items(vec![classify_item(record)]),
        Value::Null => Content::Text(String::new()),
        scalar => Content::Text(scalar.to_string()),
    }
}

fn classify_text(text: String) -> Content {
    let trimmed = text.trim();
    if !(trimmed.starts_with('[') || trimmed.starts_with('{')) {
        return Content::Text(text);
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(decoded @ (Value::Array(_) | Value::Object(_))) => classify(decoded),
        Ok(_) => Content::Text(text),
        Err(e) => {
            trace!(target: "scout::timeline", "Response looked like JSON but did not decode: {}", e);
            Content::Text(text)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Job,
    Profile,
    Company,
    Generic,
}

/// First match wins: records often carry overlapping fields (a company with
/// a `name`, a job with a `company`), so the order is fixed.
fn item_kind(record: &Map<String, Value>) -> ItemKind {
    if truthy(record, "job_id") || truthy(record, "title") {
        ItemKind::Job
    } else if truthy(record, "profile_url") || truthy(record, "name") {
        ItemKind::Profile
    } else if truthy(record, "company_url") || truthy(record, "company_name") {
        ItemKind::Company
    } else {
        ItemKind::Generic
    }
}

/// Classify a single record from a result list.
pub fn classify_item(item: Value) -> ResultItem {
    let kind = match &item {
        Value::Object(record) => item_kind(record),
        _ => ItemKind::Generic,
    };

    match kind {
        ItemKind::Job => ResultItem::Job(job_listing(item)),
        ItemKind::Profile => ResultItem::Profile(profile(item)),
        ItemKind::Company => ResultItem::Company(company(item)),
        ItemKind::Generic => ResultItem::Generic { data: item },
    }
}

fn job_listing(raw: Value) -> JobListing {
    JobListing {
        job_id: field(&raw, &["job_id"]),
        title: field(&raw, &["title"]),
        company: field(&raw, &["company", "companyName", "company_name"]),
        location: field(&raw, &["location"]),
        url: field(&raw, &["job_url", "url"]),
        posted_at: field(&raw, &["posted_at"]),
        description: field(&raw, &["description"]),
        raw,
    }
}

fn profile(raw: Value) -> Profile {
    let name = field(&raw, &["name"]).or_else(|| full_name(&raw));
    Profile {
        name,
        headline: field(&raw, &["headline"]),
        location: field(&raw, &["location"]),
        url: field(&raw, &["profile_url", "url"]),
        raw,
    }
}

fn company(raw: Value) -> CompanyRecord {
    CompanyRecord {
        name: field(&raw, &["company_name", "name"]),
        industry: field(&raw, &["industry"]),
        description: field(&raw, &["description"]),
        url: field(&raw, &["company_url", "website"]),
        raw,
    }
}

fn full_name(raw: &Value) -> Option<String> {
    let first = field(raw, &["first_name"]).unwrap_or_default();
    let last = field(raw, &["last_name"]).unwrap_or_default();
    let joined = format!("{} {}", first, last).trim().to_string();
    (!joined.is_empty()).then_some(joined)
}

/// Present and not null, false, zero, or empty.
fn truthy(record: &Map<String, Value>, key: &str) -> bool {
    match record.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// First displayable value among `keys`.
fn field(raw: &Value, keys: &[&str]) -> Option<String> {
    let record = raw.as_object()?;
    keys.iter()
        .copied()
        .filter(|key| truthy(record, key))
        .find_map(|key| record.get(key).and_then(display_value))
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(values) => {
            let parts: Vec<String> = values.iter().filter_map(display_value).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        // Nested records such as `"company": {"name": "Acme"}`
        Value::Object(record) => record.get("name").and_then(display_value),
        Value::Null | Value::Bool(_) => None,
    }
}
