//! The tools, resources and prompts every session's engine serves.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::protocol::INVALID_PARAMS;
use crate::error::{EchoError, Result};
use crate::tools::{wikipedia_tools, ToolRegistry, WikiLang, WikipediaClient};

pub const SERVER_NAME: &str = "wikipedia-server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const RESOURCE_SCHEME: &str = "wiki://";
const RESOURCE_TEMPLATE: &str = "wiki://{lang}/{title}";

/// Argument accepted by a prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptArgument {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// A prompt as advertised by `prompts/list`.
#[derive(Debug, Clone, Serialize)]
pub struct PromptDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<PromptArgument>,
}

/// Shared, immutable catalog. One per server, behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ServerCatalog {
    tools: ToolRegistry,
    wiki: WikipediaClient,
}

impl ServerCatalog {
    /// Catalog serving the Wikipedia tool set.
    pub fn wikipedia(wiki: WikipediaClient) -> Self {
        let tools = ToolRegistry::new().with_tools(wikipedia_tools(wiki.clone()));
        Self { tools, wiki }
    }

    /// Catalog with a custom tool registry.
    pub fn with_tools(tools: ToolRegistry, wiki: WikipediaClient) -> Self {
        Self { tools, wiki }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn resource_templates(&self) -> Value {
        json!([{
            "uriTemplate": RESOURCE_TEMPLATE,
            "name": "wikipedia-page",
            "description": "Wikipedia page summary, addressed as wiki://en/Seoul",
            "mimeType": "text/plain",
        }])
    }

    /// Read a `wiki://{lang}/{title}` resource.
    pub async fn read_resource(&self, uri: &str) -> Result<Value> {
        let (lang, title) = parse_resource_uri(uri)?;
        let text = match self.wiki.page_summary(&title, lang).await? {
            Some(summary) => format!("# {}\n\n{}", summary.title, summary.extract),
            None => format!("Document not found: {title}"),
        };
        Ok(json!({
            "contents": [{ "uri": uri, "mimeType": "text/plain", "text": text }]
        }))
    }

    pub fn prompts(&self) -> Vec<PromptDescriptor> {
        vec![
            PromptDescriptor {
                name: "explain-simple",
                description: "Look a topic up on Wikipedia and explain it so a child could follow",
                arguments: vec![PromptArgument {
                    name: "topic",
                    description: "Topic to explain",
                    required: true,
                }],
            },
            PromptDescriptor {
                name: "compare",
                description: "Look two topics up on Wikipedia and compare them",
                arguments: vec![
                    PromptArgument {
                        name: "topic1",
                        description: "First topic",
                        required: true,
                    },
                    PromptArgument {
                        name: "topic2",
                        description: "Second topic",
                        required: true,
                    },
                ],
            },
        ]
    }

    /// Render a prompt into its `prompts/get` result.
    pub fn render_prompt(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value> {
        let (description, text) = match name {
            "explain-simple" => {
                let topic = prompt_arg(arguments, "topic")?;
                (
                    "Explain a topic simply",
                    format!(
                        "Find \"{topic}\" on Wikipedia and explain it simply enough for an \
                         elementary school student. Unpack any difficult terms and give \
                         everyday examples."
                    ),
                )
            }
            "compare" => {
                let first = prompt_arg(arguments, "topic1")?;
                let second = prompt_arg(arguments, "topic2")?;
                (
                    "Compare two topics",
                    format!(
                        "Find \"{first}\" and \"{second}\" on Wikipedia and summarize their \
                         similarities and differences in a table."
                    ),
                )
            }
            other => {
                return Err(EchoError::protocol(
                    INVALID_PARAMS,
                    format!("Prompt {other} not found"),
                ))
            }
        };

        Ok(json!({
            "description": description,
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": text }
            }]
        }))
    }
}

fn prompt_arg<'a>(arguments: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    arguments.get(key).and_then(Value::as_str).ok_or_else(|| {
        EchoError::protocol(INVALID_PARAMS, format!("Missing required argument: {key}"))
    })
}

/// Split `wiki://{lang}/{title}` into its parts, percent-decoding the title.
fn parse_resource_uri(uri: &str) -> Result<(WikiLang, Cow<'_, str>)> {
    let invalid = || EchoError::protocol(INVALID_PARAMS, format!("Invalid resource URI: {uri}"));

    let rest = uri.strip_prefix(RESOURCE_SCHEME).ok_or_else(invalid)?;
    let (lang, title) = rest.split_once('/').ok_or_else(invalid)?;
    if title.is_empty() {
        return Err(invalid());
    }
    let lang = lang.parse::<WikiLang>().map_err(|_| invalid())?;
    let title = urlencoding::decode(title).map_err(|_| invalid())?;
    Ok((lang, title))
}
