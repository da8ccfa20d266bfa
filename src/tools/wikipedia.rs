//! Wikipedia-backed tools: search, summary, extract and on-this-day.

use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use reqwest::Url;
use serde::Deserialize;
use strum::{Display, EnumString};

use super::arguments::ToolArguments;
use super::tool::{AgentTool, Tool};
use super::types::AgentToolParameters;
use crate::error::{EchoError, Result};

/// Longest body `extract` returns, in characters.
const EXTRACT_MAX_CHARS: usize = 3000;
const SEARCH_LIMIT: &str = "5";
const ON_THIS_DAY_LIMIT: usize = 5;

/// Wikipedia language edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum WikiLang {
    Ko,
    En,
}

impl WikiLang {
    pub const VALUES: [&'static str; 2] = ["ko", "en"];

    /// Read `lang` from tool arguments, defaulting when absent.
    fn from_args(args: &ToolArguments, default: WikiLang) -> Result<Self> {
        match args.get_str_opt("lang") {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| {
                EchoError::InvalidArgument(format!("lang must be one of ko, en; got {raw:?}"))
            }),
        }
    }
}

/// Summary of a single page from the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSummary {
    pub title: String,
    #[serde(default)]
    pub extract: String,
    #[serde(default)]
    pub content_urls: Option<ContentUrls>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentUrls {
    pub desktop: PageUrl,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageUrl {
    pub page: String,
}

/// A historical event from the on-this-day feed.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalEvent {
    pub year: i64,
    pub text: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Deserialize)]
struct ExtractQuery {
    pages: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct ExtractPage {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

#[derive(Deserialize)]
struct OnThisDayResponse {
    #[serde(default)]
    events: Vec<HistoricalEvent>,
}

/// Thin client over the Wikipedia action and REST APIs.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    http: reqwest::Client,
    base_url: String,
}

impl WikipediaClient {
    /// Create a client. `base_url` may contain a `{lang}` placeholder.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("mcp-echo/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self, lang: WikiLang, segments: &[&str]) -> Result<Url> {
        let base = self.base_url.replace("{lang}", &lang.to_string());
        let mut url = Url::parse(&base)
            .map_err(|e| EchoError::Configuration(format!("invalid Wikipedia URL {base:?}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| EchoError::Configuration(format!("Wikipedia URL cannot be a base: {base}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Titles of the top search hits for `keyword`.
    pub async fn search(&self, keyword: &str, lang: WikiLang) -> Result<Vec<String>> {
        let url = self.endpoint(lang, &["w", "api.php"])?;
        let response: SearchResponse = self
            .http
            .get(url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", keyword),
                ("format", "json"),
                ("origin", "*"),
                ("srlimit", SEARCH_LIMIT),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.query.search.into_iter().map(|hit| hit.title).collect())
    }

    /// Page summary, or `None` when the page does not exist.
    pub async fn page_summary(&self, title: &str, lang: WikiLang) -> Result<Option<PageSummary>> {
        let url = self.endpoint(lang, &["api", "rest_v1", "page", "summary", title.trim()])?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            tracing::debug!(title, status = %response.status(), "Wikipedia summary unavailable");
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    /// Full plain-text body of a page, or `None` when it has none.
    pub async fn page_extract(&self, title: &str, lang: WikiLang) -> Result<Option<(String, String)>> {
        let url = self.endpoint(lang, &["w", "api.php"])?;
        let response: ExtractResponse = self
            .http
            .get(url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "false"),
                ("titles", title.trim()),
                ("format", "json"),
                ("origin", "*"),
                ("explaintext", "true"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(page) = response.query.pages.into_iter().next().map(|(_, page)| page) else {
            return Ok(None);
        };
        let page: ExtractPage = serde_json::from_value(page)?;
        Ok(page
            .extract
            .filter(|text| !text.is_empty())
            .map(|text| (page.title, text)))
    }

    /// Events recorded for `date`'s month and day, or `None` on a failed fetch.
    pub async fn on_this_day(
        &self,
        date: NaiveDate,
        lang: WikiLang,
    ) -> Result<Option<Vec<HistoricalEvent>>> {
        let month = date.month().to_string();
        let day = date.day().to_string();
        let url = self.endpoint(
            lang,
            &["api", "rest_v1", "feed", "onthisday", "events", &month, &day],
        )?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let feed: OnThisDayResponse = response.json().await?;
        Ok(Some(feed.events))
    }
}

/// Render search hits as a numbered list. No hits render as empty text.
pub fn format_search(titles: &[String]) -> String {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {title}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a page summary with its source link.
pub fn format_summary(summary: &PageSummary) -> String {
    match &summary.content_urls {
        Some(urls) => format!(
            "# {}\n\n{}\n\nSource: {}",
            summary.title, summary.extract, urls.desktop.page
        ),
        None => format!("# {}\n\n{}", summary.title, summary.extract),
    }
}

/// Render a page body, truncated to [`EXTRACT_MAX_CHARS`].
pub fn format_extract(title: &str, body: &str) -> String {
    if body.chars().count() > EXTRACT_MAX_CHARS {
        let head: String = body.chars().take(EXTRACT_MAX_CHARS).collect();
        format!("# {title}\n\n{head}\n\n...(truncated)")
    } else {
        format!("# {title}\n\n{body}")
    }
}

/// Render the first few historical events for `date`.
pub fn format_events(date: NaiveDate, events: &[HistoricalEvent]) -> String {
    let lines = events
        .iter()
        .take(ON_THIS_DAY_LIMIT)
        .map(|event| format!("- **{}**: {}", event.year, event.text))
        .collect::<Vec<_>>()
        .join("\n");
    format!("## Historical events on {}/{}\n\n{lines}", date.month(), date.day())
}

/// Build the Wikipedia tool set backed by `client`.
pub fn wikipedia_tools(client: WikipediaClient) -> Vec<Box<dyn Tool>> {
    let lang_param = "Language (ko or en)";

    let search_client = client.clone();
    let search = AgentTool::new(
        "search",
        "Search Wikipedia for articles matching a keyword",
        AgentToolParameters::object()
            .string("keyword", "Keyword to search for", true)
            .string_enum("lang", lang_param, &WikiLang::VALUES, "ko")
            .build(),
        move |args: ToolArguments| {
            let client = search_client.clone();
            async move {
                let keyword = args.get_str("keyword")?;
                let lang = WikiLang::from_args(&args, WikiLang::Ko)?;
                let titles = client.search(keyword, lang).await?;
                Ok::<_, EchoError>(format_search(&titles))
            }
        },
    );

    let summary_client = client.clone();
    let summary = AgentTool::new(
        "summary",
        "Fetch the summary (lead paragraph) of a Wikipedia article",
        AgentToolParameters::object()
            .string("title", "Wikipedia article title", true)
            .string_enum("lang", lang_param, &WikiLang::VALUES, "ko")
            .build(),
        move |args: ToolArguments| {
            let client = summary_client.clone();
            async move {
                let title = args.get_str("title")?;
                let lang = WikiLang::from_args(&args, WikiLang::Ko)?;
                let text = match client.page_summary(title, lang).await? {
                    Some(summary) => format_summary(&summary),
                    None => format!("Document not found: {title}"),
                };
                Ok::<_, EchoError>(text)
            }
        },
    );

    let extract_client = client.clone();
    let extract = AgentTool::new(
        "extract",
        "Fetch the full plain-text body of a Wikipedia article",
        AgentToolParameters::object()
            .string("title", "Wikipedia article title", true)
            .string_enum("lang", lang_param, &WikiLang::VALUES, "ko")
            .build(),
        move |args: ToolArguments| {
            let client = extract_client.clone();
            async move {
                let title = args.get_str("title")?;
                let lang = WikiLang::from_args(&args, WikiLang::Ko)?;
                let text = match client.page_extract(title, lang).await? {
                    Some((page_title, body)) => format_extract(&page_title, &body),
                    None => format!("No body text found: {title}"),
                };
                Ok::<_, EchoError>(text)
            }
        },
    );

    let on_this_day = AgentTool::new(
        "on_this_day",
        "List historical events that happened on today's date",
        AgentToolParameters::object()
            .string_enum(
                "lang",
                "Language (ko or en; en has more entries)",
                &WikiLang::VALUES,
                "en",
            )
            .build(),
        move |args: ToolArguments| {
            let client = client.clone();
            async move {
                let lang = WikiLang::from_args(&args, WikiLang::En)?;
                let today = chrono::Local::now().date_naive();
                let text = match client.on_this_day(today, lang).await? {
                    Some(events) => format_events(today, &events),
                    None => "Could not fetch today's events.".to_string(),
                };
                Ok::<_, EchoError>(text)
            }
        },
    );

    vec![
        Box::new(search),
        Box::new(summary),
        Box::new(extract),
        Box::new(on_this_day),
    ]
}
