use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tool results
// ---------------------------------------------------------------------------

/// One unit of a tool result. Only text is ever produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text { text: String },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            ContentItem::Text { text } => text,
        }
    }
}

/// Body of a `tools/call` result. Always non-empty; failures are in-band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ContentItem>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
            is_error: true,
        }
    }

    /// Text of the first content item.
    pub fn first_text(&self) -> &str {
        self.content.first().map(ContentItem::as_text).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// HTTP endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub pymol_connected: bool,
    pub server: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDescriptions {
    #[serde(rename = "/sse")]
    pub sse: String,
    #[serde(rename = "/messages/")]
    pub messages: String,
    #[serde(rename = "/health")]
    pub health: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSummary {
    pub name: String,
    pub version: String,
    pub endpoints: EndpointDescriptions,
    pub transport: String,
    pub pymol_connected: bool,
}
