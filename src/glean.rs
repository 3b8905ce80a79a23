//! Glean search integration.
//!
//! Searches a Glean tenant for recent Slack messages that look like action
//! items. Credentials live in the settings table; the raw API token is
//! write-only from the client's perspective and only ever surfaced in
//! masked form.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings key for the Glean tenant instance name.
pub const SETTING_INSTANCE: &str = "glean_instance";
/// Settings key for the user's display name, used for query targeting and
/// self-authored filtering.
pub const SETTING_USER_NAME: &str = "glean_user_name";
/// Settings key for the Glean API token. Never returned to a caller.
pub const SETTING_API_TOKEN: &str = "glean_api_token";

/// Settings keys the generic settings endpoints refuse to serve.
pub const SENSITIVE_KEYS: &[&str] = &[SETTING_API_TOKEN];

/// Default lookback window for the search, in days.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 3;

/// Phrases that suggest a message needs a reply or action.
const ACTION_PHRASES: &str = "reply needed OR action required OR please respond \
OR waiting on you OR can you OR please review OR let me know OR lmk \
OR what do you think OR blocked OR following up OR any update OR thoughts OR feedback";

const PAGE_SIZE: i32 = 50;

/// Errors from the Glean integration.
#[derive(Debug, Error)]
pub enum GleanError {
    /// Instance or token missing from settings. No outbound call is made.
    #[error("Glean is not configured")]
    NotConfigured,

    /// Transport failure reaching the Glean API.
    #[error("Failed to reach Glean API")]
    Unreachable(#[source] reqwest::Error),

    /// Glean answered with a non-2xx status.
    #[error("Glean API error: {status}")]
    UpstreamStatus { status: u16, body: String },
}

/// One search hit, shaped for the client. The `id` is generated per call
/// and is not stable across searches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GleanResult {
    pub id: String,
    pub title: String,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Masked rendering of a stored token: first 4 + stars + last 4 when longer
/// than 8 characters, all stars otherwise, `None` when absent.
pub fn mask_token(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        Some(format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail))
    } else {
        Some("*".repeat(chars.len()))
    }
}

/// Build the free-text query: the user's name (when known) OR-ed with the
/// fixed action-phrase disjunction.
pub fn build_query(user_name: Option<&str>) -> String {
    match user_name {
        Some(name) => format!("@{} OR {} OR {}", name, name, ACTION_PHRASES),
        None => ACTION_PHRASES.to_string(),
    }
}

/// `YYYY-MM-DD` cutoff for the last_updated_at facet filter.
fn cutoff_date(days: i64) -> String {
    (Utc::now() - Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    query: String,
    page_size: i32,
    request_options: RequestOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestOptions {
    facet_filters: Vec<FacetFilter>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FacetFilter {
    field_name: String,
    values: Vec<FacetValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FacetValue {
    value: String,
    relation_type: String,
}

// Response shapes. Everything Glean sends back is treated as optional and
// defaulted, since nested fields are frequently absent.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SearchResponse {
    results: Vec<RawResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawResult {
    title: Option<String>,
    url: Option<String>,
    full_text_list: Vec<String>,
    related_results: Vec<RelatedResults>,
    document: Option<RawDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RelatedResults {
    results: Vec<SnippetHolder>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SnippetHolder {
    snippets: Vec<RawSnippet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSnippet {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDocument {
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawMetadata {
    author: Option<RawAuthor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawAuthor {
    name: Option<String>,
}

impl RawResult {
    fn author(&self) -> Option<&str> {
        self.document
            .as_ref()?
            .metadata
            .as_ref()?
            .author
            .as_ref()?
            .name
            .as_deref()
    }

    /// Best available short excerpt: first related-result snippet, else the
    /// first 200 characters of the full text, else empty.
    fn snippet(&self) -> String {
        self.related_results
            .first()
            .and_then(|r| r.results.first())
            .and_then(|s| s.snippets.first())
            .and_then(|s| s.text.clone())
            .or_else(|| self.full_text_list.first().map(|t| truncate_chars(t, 200)))
            .unwrap_or_default()
    }
}

/// Truncate to at most `max` characters without splitting a code point.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Drop results authored by the configured user and map the rest to
/// client-facing results with transient ids.
fn map_results(results: Vec<RawResult>, user_name: Option<&str>) -> Vec<GleanResult> {
    let now = Utc::now().timestamp_millis();
    results
        .into_iter()
        .filter(|r| match (user_name, r.author()) {
            (Some(user), Some(author)) => author != user,
            _ => true,
        })
        .enumerate()
        .map(|(i, r)| GleanResult {
            id: format!("glean-{}-{}", i, now),
            title: r.title.clone().unwrap_or_default(),
            snippet: r.snippet(),
            url: r.url.clone(),
            author: r.author().map(String::from),
        })
        .collect()
}

/// HTTP client for the Glean search API.
#[derive(Clone)]
pub struct GleanClient {
    http: reqwest::Client,
    /// Full endpoint URL override, used by tests to point at a mock server.
    endpoint_override: Option<String>,
}

impl GleanClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint_override: None,
        }
    }

    /// Point the client at an explicit endpoint instead of the per-tenant
    /// Glean host.
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint_override = Some(url.into());
        self
    }

    fn search_url(&self, instance: &str) -> String {
        match &self.endpoint_override {
            Some(url) => url.clone(),
            None => format!("https://{}-be.glean.com/rest/api/v1/search", instance),
        }
    }

    /// Search the tenant for recent Slack messages that look like action
    /// items. A single synchronous outbound request; no retry.
    pub async fn search(
        &self,
        instance: &str,
        token: &str,
        user_name: Option<&str>,
        days: i64,
    ) -> Result<Vec<GleanResult>, GleanError> {
        let request = SearchRequest {
            query: build_query(user_name),
            page_size: PAGE_SIZE,
            request_options: RequestOptions {
                facet_filters: vec![
                    FacetFilter {
                        field_name: "app".into(),
                        values: vec![FacetValue {
                            value: "slack".into(),
                            relation_type: "EQUALS".into(),
                        }],
                    },
                    FacetFilter {
                        field_name: "last_updated_at".into(),
                        values: vec![FacetValue {
                            value: cutoff_date(days),
                            relation_type: "GT".into(),
                        }],
                    },
                ],
            },
        };

        tracing::debug!(instance, days, "sending Glean search request");

        let response = self
            .http
            .post(self.search_url(instance))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(GleanError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GleanError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(GleanError::Unreachable)?;

        Ok(map_results(parsed.results, user_name))
    }
}

impl Default for GleanClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mask_token_long_keeps_edges() {
        assert_eq!(
            mask_token(Some("abcd1234efgh")).as_deref(),
            Some("abcd****efgh")
        );
    }

    #[test]
    fn mask_token_short_is_all_stars() {
        assert_eq!(mask_token(Some("abcd1234")).as_deref(), Some("********"));
        assert_eq!(mask_token(Some("ab")).as_deref(), Some("**"));
    }

    #[test]
    fn mask_token_absent_is_none() {
        assert_eq!(mask_token(None), None);
    }

    #[test]
    fn query_includes_user_name_when_known() {
        let q = build_query(Some("Ada Lovelace"));
        assert!(q.starts_with("@Ada Lovelace OR Ada Lovelace OR "));
        assert!(q.contains("reply needed"));

        assert_eq!(build_query(None), ACTION_PHRASES);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 200), "short");
    }

    fn raw(value: serde_json::Value) -> RawResult {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn self_authored_results_are_dropped() {
        let results = vec![
            raw(json!({
                "title": "From me",
                "document": { "metadata": { "author": { "name": "Ada" } } }
            })),
            raw(json!({
                "title": "From someone else",
                "document": { "metadata": { "author": { "name": "Grace" } } }
            })),
            raw(json!({ "title": "No author" })),
        ];

        let mapped = map_results(results, Some("Ada"));
        let titles: Vec<_> = mapped.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["From someone else", "No author"]);
    }

    #[test]
    fn snippet_prefers_related_result_text() {
        let result = raw(json!({
            "fullTextList": ["the full message body"],
            "relatedResults": [
                { "results": [ { "snippets": [ { "text": "short excerpt" } ] } ] }
            ]
        }));
        assert_eq!(result.snippet(), "short excerpt");
    }

    #[test]
    fn snippet_falls_back_to_truncated_full_text() {
        let long_text = "x".repeat(300);
        let result = raw(json!({ "fullTextList": [long_text] }));
        assert_eq!(result.snippet().chars().count(), 200);

        let empty = raw(json!({}));
        assert_eq!(empty.snippet(), "");
    }

    #[test]
    fn mapped_results_carry_transient_ids() {
        let results = vec![raw(json!({ "title": "A" })), raw(json!({ "title": "B" }))];
        let mapped = map_results(results, None);
        assert!(mapped[0].id.starts_with("glean-0-"));
        assert!(mapped[1].id.starts_with("glean-1-"));
    }

    #[test]
    fn response_parsing_defaults_missing_fields() {
        let parsed: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.results.is_empty());

        let parsed: SearchResponse =
            serde_json::from_value(json!({ "results": [{}] })).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert!(parsed.results[0].title.is_none());
    }
}
