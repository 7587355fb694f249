use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::auth::TokenSource;
use super::model::{NamedStyle, Paragraph, Request};
use super::DocumentStore;
use crate::error::{ArchiveError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://docs.googleapis.com";

// ── documents.get response ──

#[derive(Debug, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub body: Body,
}

#[derive(Debug, Default, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    #[serde(default = "first_body_index")]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
    pub paragraph: Option<ParagraphElement>,
}

fn first_body_index() -> usize {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    #[serde(default)]
    pub elements: Vec<InlineElement>,
    pub paragraph_style: Option<WireParagraphStyle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireParagraphStyle {
    pub named_style_type: Option<NamedStyle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineElement {
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
    pub text_style: Option<WireTextStyle>,
}

#[derive(Debug, Deserialize)]
pub struct WireTextStyle {
    pub link: Option<WireLink>,
}

/// Links may also target bookmarks or headings, which carry no URL.
#[derive(Debug, Deserialize)]
pub struct WireLink {
    pub url: Option<String>,
}

/// Flatten top-level paragraphs; tables, section breaks and the like are skipped.
pub fn paragraphs_from_document(document: Document) -> Vec<Paragraph> {
    document
        .body
        .content
        .into_iter()
        .filter_map(|element| {
            let paragraph = element.paragraph?;
            let style = paragraph
                .paragraph_style
                .and_then(|s| s.named_style_type)
                .unwrap_or(NamedStyle::NormalText);
            let runs: Vec<TextRun> = paragraph
                .elements
                .into_iter()
                .filter_map(|e| e.text_run)
                .collect();
            let text = runs.iter().map(|r| r.content.as_str()).collect::<String>();
            let links = runs
                .into_iter()
                .filter_map(|r| r.text_style?.link?.url)
                .collect();
            Some(Paragraph {
                start: element.start_index,
                end: element.end_index,
                text,
                style,
                links,
            })
        })
        .collect()
}

// ── Client ──

#[derive(Serialize)]
struct BatchUpdate<'a> {
    requests: &'a [Request],
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Turn a non-success response into a readable failure, preferring the API's own message.
fn check(response: Response, action: &'static str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);
    Err(ArchiveError::document(action, format!("HTTP {}: {}", status, detail.trim())))
}

pub struct GoogleDocsClient {
    http: Client,
    endpoint: String,
    document_id: String,
    tokens: TokenSource,
}

impl GoogleDocsClient {
    pub fn new(
        endpoint: &str,
        document_id: &str,
        tokens: TokenSource,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            document_id: document_id.to_string(),
            tokens,
        })
    }

    fn document_url(&self) -> String {
        format!("{}/v1/documents/{}", self.endpoint, self.document_id)
    }
}

impl DocumentStore for GoogleDocsClient {
    fn fetch_paragraphs(&mut self) -> Result<Vec<Paragraph>> {
        let token = self.tokens.bearer(&self.http)?;
        let response = self
            .http
            .get(self.document_url())
            .bearer_auth(token)
            .send()
            .map_err(|e| ArchiveError::document("fetch", e))?;
        let document: Document = check(response, "fetch")?
            .json()
            .map_err(|e| ArchiveError::document("fetch", e))?;

        let paragraphs = paragraphs_from_document(document);
        debug!(document = %self.document_id, paragraphs = paragraphs.len(), "Fetched document");
        Ok(paragraphs)
    }

    fn batch_update(&mut self, requests: &[Request]) -> Result<()> {
        if requests.is_empty() {
            return Ok(());
        }
        let token = self.tokens.bearer(&self.http)?;
        let response = self
            .http
            .post(format!("{}:batchUpdate", self.document_url()))
            .bearer_auth(token)
            .json(&BatchUpdate { requests })
            .send()
            .map_err(|e| ArchiveError::document("update", e))?;
        check(response, "update")?;
        info!(document = %self.document_id, requests = requests.len(), "Batch update applied");
        Ok(())
    }
}
