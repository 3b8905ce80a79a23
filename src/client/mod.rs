//! Typed REST client for the daylist API.
//!
//! Covers every server endpoint plus the Glean import flow (select search
//! results by their transient ids and create one todo per selection).

pub mod cache;

use crate::glean::GleanResult;
use crate::types::{Todo, TodoStatus, TodoWithChildren};
use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// Day-grouped list response.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoGroups {
    pub groups: BTreeMap<String, Vec<TodoWithChildren>>,
}

/// Partial update payload for PATCH /api/todos/{id}.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
}

/// Masked Glean configuration as returned by GET /api/glean/config.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GleanConfig {
    pub instance: Option<String>,
    pub user_name: Option<String>,
    pub masked_token: Option<String>,
}

/// HTTP client for one daylist server.
#[derive(Clone)]
pub struct TodoClient {
    http: reqwest::Client,
    base_url: String,
}

impl TodoClient {
    /// Create a client for the given base URL, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read the response body as `T`, or surface the server's `error` field.
    async fn expect_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .get("error")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("request failed");
            bail!("{}: {}", status.as_u16(), message);
        }
        response
            .json()
            .await
            .map_err(|e| anyhow!("malformed response body: {}", e))
    }

    pub async fn list_todos(&self, status: Option<TodoStatus>) -> Result<TodoGroups> {
        let mut request = self.http.get(self.url("/api/todos"));
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        Self::expect_json(request.send().await?).await
    }

    pub async fn create_todo(&self, title: &str) -> Result<Todo> {
        let response = self
            .http
            .post(self.url("/api/todos"))
            .json(&json!({ "title": title }))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn update_todo(&self, id: &str, patch: &TodoPatch) -> Result<Todo> {
        let response = self
            .http
            .patch(self.url(&format!("/api/todos/{}", id)))
            .json(patch)
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn delete_todo(&self, id: &str) -> Result<Todo> {
        let response = self
            .http
            .delete(self.url(&format!("/api/todos/{}", id)))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn add_child(&self, parent_id: &str, title: &str) -> Result<Todo> {
        let response = self
            .http
            .post(self.url(&format!("/api/todos/{}/children", parent_id)))
            .json(&json!({ "title": title }))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(self.url(&format!("/api/settings/{}", key)))
            .send()
            .await?;
        let body: serde_json::Value = Self::expect_json(response).await?;
        Ok(body
            .get("value")
            .and_then(serde_json::Value::as_str)
            .map(String::from))
    }

    pub async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        let response = self
            .http
            .put(self.url(&format!("/api/settings/{}", key)))
            .json(&json!({ "value": value }))
            .send()
            .await?;
        Self::expect_json::<serde_json::Value>(response).await?;
        Ok(())
    }

    pub async fn glean_config(&self) -> Result<GleanConfig> {
        let response = self.http.get(self.url("/api/glean/config")).send().await?;
        Self::expect_json(response).await
    }

    pub async fn put_glean_config(
        &self,
        instance: &str,
        token: Option<&str>,
        user_name: Option<&str>,
    ) -> Result<()> {
        let response = self
            .http
            .post(self.url("/api/glean/config"))
            .json(&json!({
                "instance": instance,
                "token": token,
                "userName": user_name,
            }))
            .send()
            .await?;
        Self::expect_json::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Search recent Slack messages for action items.
    pub async fn search_action_items(&self, days: Option<i64>) -> Result<Vec<GleanResult>> {
        let body = match days {
            Some(days) => json!({ "days": days }),
            None => json!({}),
        };
        let response = self
            .http
            .post(self.url("/api/glean/search"))
            .json(&body)
            .send()
            .await?;
        Self::expect_json(response).await
    }

    /// Import selected search results as new top-level todos, one per
    /// selected transient id. The snippet becomes the title, falling back
    /// to the result title when the snippet is empty.
    pub async fn import_action_items(
        &self,
        results: &[GleanResult],
        selected_ids: &[String],
    ) -> Result<Vec<Todo>> {
        let mut imported = Vec::new();
        for result in results {
            if !selected_ids.contains(&result.id) {
                continue;
            }
            let title = if result.snippet.is_empty() {
                &result.title
            } else {
                &result.snippet
            };
            imported.push(self.create_todo(title).await?);
        }
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = TodoClient::new("http://localhost:3000/");
        assert_eq!(client.url("/api/todos"), "http://localhost:3000/api/todos");
    }

    #[test]
    fn patch_skips_unset_fields() {
        let patch = TodoPatch {
            status: Some(TodoStatus::Done),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "status": "done" }));
    }
}
