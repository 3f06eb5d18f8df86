//! Web search through the DuckDuckGo HTML endpoint (no API key needed).

use std::{sync::OnceLock, time::Duration};

use regex::Regex;
use reqwest::Client;
use tracing::{debug, instrument};

use super::{Tool, ToolBuilder, ToolBuilderError, ToolExecutionError};

pub const WEB_SEARCH_TOOL_NAME: &str = "Web Search";
pub const WEB_SEARCH_TOOL_DESCRIPTION: &str = "A wrapper around DuckDuckGo Search. \
Useful for when you need to answer questions about current events. \
Input should be a search query.";
pub const NO_RESULTS: &str = "No good DuckDuckGo Search Result was found";

const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

#[derive(Debug, Clone)]
pub struct WebSearchConfig {
    pub endpoint: String,
    pub max_results: usize,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            max_results: 5,
            user_agent: "Mozilla/5.0 (compatible; react-labs/0.1)".into(),
            timeout: Duration::from_secs(20),
        }
    }
}

pub fn web_search_tool() -> Result<Tool, ToolBuilderError> {
    web_search_tool_with(WebSearchConfig::default())
}

/// The HTTP client is built once here and shared by every query.
pub fn web_search_tool_with(config: WebSearchConfig) -> Result<Tool, ToolBuilderError> {
    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .build()
        .map_err(|e| ToolBuilderError::Setup(e.to_string()))?;

    ToolBuilder::new()
        .name(WEB_SEARCH_TOOL_NAME)
        .description(WEB_SEARCH_TOOL_DESCRIPTION)
        .executor_fn(move |query| {
            let client = client.clone();
            let config = config.clone();
            async move { search(&client, &config, &query).await }
        })
        .build()
}

/// Run one query and join the result snippets with spaces.
#[instrument(target = "tool", skip(client, config), fields(endpoint = %config.endpoint))]
pub async fn search(
    client: &Client,
    config: &WebSearchConfig,
    query: &str,
) -> Result<String, ToolExecutionError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ToolExecutionError::InvalidInput("empty search query".into()));
    }

    let url = format!("{}?q={}", config.endpoint, urlencoding::encode(query));
    let response = client.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ToolExecutionError::ExecutionFailed(format!(
            "search endpoint answered HTTP {status}"
        )));
    }
    let html = response.text().await?;

    let snippets = extract_snippets(&html, config.max_results);
    debug!(target: "tool", results = snippets.len(), "search finished");

    if snippets.is_empty() {
        Ok(NO_RESULTS.to_string())
    } else {
        Ok(snippets.join(" "))
    }
}

fn snippet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|td|div)>"#)
            .unwrap_or_else(|e| panic!("snippet regex: {e}"))
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap_or_else(|e| panic!("tag regex: {e}")))
}

/// Pull the result snippets out of a DuckDuckGo HTML results page.
pub fn extract_snippets(html: &str, max_results: usize) -> Vec<String> {
    snippet_re()
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|m| html_decode(&tag_re().replace_all(m.as_str(), "")))
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
        .take(max_results)
        .collect()
}

fn html_decode(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
