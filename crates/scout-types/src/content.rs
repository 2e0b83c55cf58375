//! Classified assistant content.
//!
//! Content is resolved once when an entry is created, so presentation code
//! matches on a closed set of variants instead of re-inspecting raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a timeline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Content {
    /// Free text, displayed verbatim.
    Text(String),
    /// Structured results, in the order the backend sent them.
    Items(Vec<ResultItem>),
}

impl Content {
    pub fn text(s: impl Into<String>) -> Self {
        Content::Text(s.into())
    }

    /// Text body, if this is plain text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            Content::Items(_) => None,
        }
    }

    /// Result items, if this is structured content.
    pub fn items(&self) -> Option<&[ResultItem]> {
        match self {
            Content::Text(_) => None,
            Content::Items(items) => Some(items),
        }
    }
}

/// One structured record from a response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultItem {
    Job(JobListing),
    Profile(Profile),
    Company(CompanyRecord),
    /// Record that matched no known shape; kept verbatim.
    Generic { data: Value },
}

impl ResultItem {
    /// Variant name, for logging and display.
    pub fn kind(&self) -> &'static str {
        match self {
            ResultItem::Job(_) => "job",
            ResultItem::Profile(_) => "profile",
            ResultItem::Company(_) => "company",
            ResultItem::Generic { .. } => "generic",
        }
    }

    /// The record exactly as the backend sent it.
    pub fn raw(&self) -> &Value {
        match self {
            ResultItem::Job(job) => &job.raw,
            ResultItem::Profile(profile) => &profile.raw,
            ResultItem::Company(company) => &company.raw,
            ResultItem::Generic { data } => data,
        }
    }
}

/// A job posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Link to the posting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub raw: Value,
}

/// A person's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Link to the profile page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub raw: Value,
}

/// A company summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Link to the company page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub raw: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_accessors() {
        let text = Content::text("hello");
        assert_eq!(text.as_text(), Some("hello"));
        assert!(text.items().is_none());

        let items = Content::Items(vec![ResultItem::Generic { data: json!({"a": 1}) }]);
        assert!(items.as_text().is_none());
        assert_eq!(items.items().map(|i| i.len()), Some(1));
    }

    #[test]
    fn test_result_item_serializes_with_kind_tag() {
        let item = ResultItem::Job(JobListing {
            title: Some("SWE".to_string()),
            company: Some("Acme".to_string()),
            raw: json!({"title": "SWE", "company": "Acme"}),
            ..Default::default()
        });
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains(r#""kind":"job""#));
        assert!(json.contains(r#""title":"SWE""#));
        assert!(!json.contains("posted_at"));
    }

    #[test]
    fn test_raw_returns_original_record() {
        let data = json!({"foo": [1, 2, 3]});
        let item = ResultItem::Generic { data: data.clone() };
        assert_eq!(item.raw(), &data);
        assert_eq!(item.kind(), "generic");
    }
}
