//! Destination document-store adapter: exact-title lookup, page creation,
//! property overwrite, and content append. The store has no delete or
//! replace-children operation, so append is the only way to write content
//! to an existing page.

use serde_json::{json, Value};
use tracing::info;

use crate::error::{PipelineError, Result};

use super::{error_for_status, PageRef, ReportStore, DOCSTORE_VERSION};

/// The store rejects children batches larger than this.
const MAX_CHILDREN_PER_APPEND: usize = 100;

pub struct DocStoreClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    database_id: String,
}

impl DocStoreClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        database_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            database_id: database_id.into(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", DOCSTORE_VERSION)
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        body: &Value,
    ) -> Result<Value> {
        let response = builder
            .json(body)
            .send()
            .await
            .map_err(|e| PipelineError::api("docstore", e))?;
        error_for_status("docstore", response)
            .await?
            .json()
            .await
            .map_err(|e| PipelineError::api("docstore", format!("malformed response: {e}")))
    }
}

#[async_trait::async_trait]
impl ReportStore for DocStoreClient {
    async fn find_report(&self, title: &str) -> Result<Option<String>> {
        let body = json!({
            "filter": { "property": "Report", "title": { "equals": title } }
        });
        let path = format!("/databases/{}/query", self.database_id);
        let page = self
            .send(self.request(reqwest::Method::POST, &path), &body)
            .await?;
        Ok(page["results"][0]["id"].as_str().map(str::to_string))
    }

    async fn create_report(&self, properties: Value, blocks: Vec<Value>) -> Result<PageRef> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": properties,
            "children": blocks,
        });
        let page = self
            .send(self.request(reqwest::Method::POST, "/pages"), &body)
            .await?;
        let id = page["id"]
            .as_str()
            .ok_or_else(|| PipelineError::api("docstore", "create response missing page id"))?
            .to_string();
        let url = page["url"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| page_url(&id));
        info!(page_id = %id, "report page created");
        Ok(PageRef { id, url })
    }

    async fn update_properties(&self, page_id: &str, properties: Value) -> Result<()> {
        let body = json!({ "properties": properties });
        let path = format!("/pages/{page_id}");
        self.send(self.request(reqwest::Method::PATCH, &path), &body)
            .await?;
        Ok(())
    }

    async fn append_blocks(&self, page_id: &str, blocks: Vec<Value>) -> Result<()> {
        let path = format!("/blocks/{page_id}/children");
        for chunk in blocks.chunks(MAX_CHILDREN_PER_APPEND) {
            let body = json!({ "children": chunk });
            self.send(self.request(reqwest::Method::PATCH, &path), &body)
                .await?;
        }
        Ok(())
    }
}

/// Canonical page URL derived from the id, for the update branch where the
/// store's lookup response carries no URL.
pub fn page_url(page_id: &str) -> String {
    format!("https://www.notion.so/{}", page_id.replace('-', ""))
}
