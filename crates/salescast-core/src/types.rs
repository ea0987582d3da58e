//! Domain types shared across Salescast crates.
//!
//! Everything here is generation-scoped data: the analysis bundle produced
//! by one report generation, the four context fields the assistant needs,
//! and the conversation transcript.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bundle key of the parsed custom-range forecast table.
pub const CUSTOM_FORECAST_TABLE_KEY: &str = "custom_forecast_data";

/// Bundle key of the raw custom-range forecast text, kept for verbatim download.
pub const CUSTOM_FORECAST_TEXT_KEY: &str = "custom_forecast_csv_text";

/// URL scheme prefix of image view handles.
pub const VIEW_URL_PREFIX: &str = "salescast://image/";

// =============================================================================
// Tables
// =============================================================================

/// One table row: column name to cell value, iterated in header order.
pub type Row = IndexMap<String, String>;

// =============================================================================
// Artifacts
// =============================================================================

/// Opaque handle to one decoded image.
///
/// The bytes are shared; cloning a handle never copies the image. The
/// handle's view URL is only resolvable while the generation that created
/// it is current (see `SessionStore::resolve_view_url`).
#[derive(Debug, Clone, Serialize)]
pub struct ImageHandle {
    id: Uuid,
    name: String,
    content_type: String,
    #[serde(skip)]
    data: Arc<[u8]>,
}

impl ImageHandle {
    /// Create a handle for an archive entry's image bytes.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name).to_string();
        Self {
            id: Uuid::new_v4(),
            name,
            content_type,
            data: Arc::from(data),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Archive entry name the image came from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Revocable view URL for this handle.
    pub fn view_url(&self) -> String {
        format!("{}{}", VIEW_URL_PREFIX, self.id)
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Guess an image content type from its file extension.
fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// One classified piece of an analysis bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Artifact {
    Image(ImageHandle),
    Table(Vec<Row>),
    Text(String),
}

impl Artifact {
    /// Short name of the artifact kind, for logs and listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Image(_) => "image",
            Artifact::Table(_) => "table",
            Artifact::Text(_) => "text",
        }
    }
}

/// All artifacts produced by one report generation.
///
/// Keys are derived from archive entry names. A bundle is replaced as a
/// whole on regeneration and never merged with a previous one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisBundle {
    artifacts: BTreeMap<String, Artifact>,
    #[serde(skip)]
    archive: Option<Arc<[u8]>>,
}

impl AnalysisBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an artifact, returning the artifact previously stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, artifact: Artifact) -> Option<Artifact> {
        self.artifacts.insert(key.into(), artifact)
    }

    pub fn get(&self, key: &str) -> Option<&Artifact> {
        self.artifacts.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.artifacts.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Artifact)> {
        self.artifacts.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// All image artifacts with their keys.
    pub fn images(&self) -> impl Iterator<Item = (&str, &ImageHandle)> {
        self.artifacts.iter().filter_map(|(k, v)| match v {
            Artifact::Image(handle) => Some((k.as_str(), handle)),
            _ => None,
        })
    }

    pub fn image(&self, key: &str) -> Option<&ImageHandle> {
        match self.artifacts.get(key) {
            Some(Artifact::Image(handle)) => Some(handle),
            _ => None,
        }
    }

    pub fn table(&self, key: &str) -> Option<&[Row]> {
        match self.artifacts.get(key) {
            Some(Artifact::Table(rows)) => Some(rows),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.artifacts.get(key) {
            Some(Artifact::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Attach the raw archive bytes the bundle was built from.
    pub fn set_archive(&mut self, bytes: Vec<u8>) {
        self.archive = Some(Arc::from(bytes));
    }

    /// Raw archive bytes, for a verbatim download of the whole report.
    pub fn archive(&self) -> Option<&[u8]> {
        self.archive.as_deref()
    }
}

// =============================================================================
// Session context
// =============================================================================

/// One of the four text fields a conversational query needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextField {
    HistoricalSummary,
    ForecastSummary,
    ForecastData,
    HistoricalData,
}

impl ContextField {
    pub const ALL: [ContextField; 4] = [
        ContextField::HistoricalSummary,
        ContextField::ForecastSummary,
        ContextField::ForecastData,
        ContextField::HistoricalData,
    ];
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextField::HistoricalSummary => write!(f, "historical summary"),
            ContextField::ForecastSummary => write!(f, "forecast summary"),
            ContextField::ForecastData => write!(f, "forecast data"),
            ContextField::HistoricalData => write!(f, "historical data"),
        }
    }
}

/// The four context fields required before the assistant may be asked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub historical_summary: String,
    pub forecast_summary: String,
    pub forecast_data_text: String,
    pub historical_data_text: String,
}

impl SessionContext {
    pub fn get(&self, field: ContextField) -> &str {
        match field {
            ContextField::HistoricalSummary => &self.historical_summary,
            ContextField::ForecastSummary => &self.forecast_summary,
            ContextField::ForecastData => &self.forecast_data_text,
            ContextField::HistoricalData => &self.historical_data_text,
        }
    }

    pub fn set(&mut self, field: ContextField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ContextField::HistoricalSummary => self.historical_summary = value,
            ContextField::ForecastSummary => self.forecast_summary = value,
            ContextField::ForecastData => self.forecast_data_text = value,
            ContextField::HistoricalData => self.historical_data_text = value,
        }
    }

    /// True iff all four fields are non-empty.
    pub fn ready(&self) -> bool {
        ContextField::ALL.iter().all(|f| !self.get(*f).is_empty())
    }

    /// Fields that are still empty.
    pub fn missing(&self) -> Vec<ContextField> {
        ContextField::ALL
            .iter()
            .copied()
            .filter(|f| self.get(*f).is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        ContextField::ALL.iter().all(|f| self.get(*f).is_empty())
    }
}

// =============================================================================
// Conversation
// =============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

/// An immutable transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    sender: Sender,
    text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered, append-only conversation history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// =============================================================================
// Dates
// =============================================================================

/// Optional date range selected for a report section.
///
/// A range is only sent to the service when both endpoints are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Both endpoints, or `None` if either is missing.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some((from, to)),
            _ => None,
        }
    }

    /// True if both endpoints are set and `from` is after `to`.
    pub fn is_inverted(&self) -> bool {
        matches!(self.bounds(), Some((from, to)) if from > to)
    }
}

/// Earliest and latest dates with historical data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableDates {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

/// Format a date the way the service expects it (`YYYY-MM-DD`).
pub fn format_api_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a date for display, e.g. `January 5, 2024`.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
