//! Forecast service endpoints.
//!
//! `ForecastApi` abstracts over how the service is reached so the report
//! and chat crates can run against `MockForecastApi` in tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use salescast_core::config::ApiConfig;
use salescast_core::types::{format_api_date, AvailableDates, DateRange, SessionContext};

use crate::dispatcher::RequestDispatcher;
use crate::error::ApiError;

pub const PRODUCTS_PATH: &str = "/products/";
pub const AVAILABLE_DATES_PATH: &str = "/available-dates/";
pub const FORECAST_PATH: &str = "/forecast/";
pub const ASK_AI_PATH: &str = "/ask-ai/";

// =============================================================================
// Requests
// =============================================================================

/// Payload of one report generation.
///
/// Ranges are kept only when both endpoints are set; a half-open range is
/// never sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub product_name: String,
    pub summary_range: Option<(NaiveDate, NaiveDate)>,
    pub forecast_range: Option<(NaiveDate, NaiveDate)>,
}

impl ReportRequest {
    pub fn new(product_name: impl Into<String>, summary: DateRange, forecast: DateRange) -> Self {
        Self {
            product_name: product_name.into(),
            summary_range: summary.bounds(),
            forecast_range: forecast.bounds(),
        }
    }

    /// Form fields in the order the service documents them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("product_name", self.product_name.clone())];
        if let Some((from, to)) = self.summary_range {
            fields.push(("from_date", format_api_date(from)));
            fields.push(("to_date", format_api_date(to)));
        }
        if let Some((from, to)) = self.forecast_range {
            fields.push(("forecast_from_date", format_api_date(from)));
            fields.push(("forecast_to_date", format_api_date(to)));
        }
        fields
    }
}

/// Payload of one conversational query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    pub user_prompt: String,
    pub context: SessionContext,
}

impl AskRequest {
    pub fn new(user_prompt: impl Into<String>, context: SessionContext) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            context,
        }
    }

    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("user_prompt", self.user_prompt.clone()),
            ("historical_summary", self.context.historical_summary.clone()),
            ("forecast_summary", self.context.forecast_summary.clone()),
            ("forecast_data_csv", self.context.forecast_data_text.clone()),
            ("historical_data_csv", self.context.historical_data_text.clone()),
        ]
    }
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Deserialize)]
struct AvailableDatesBody {
    min_available_date: String,
    max_available_date: String,
}

#[derive(Debug, Deserialize)]
struct AskBody {
    gemini_answer: String,
}

/// Parse a service date, accepting a trailing time component.
fn parse_service_date(value: &str) -> Result<NaiveDate, ApiError> {
    let date_part = value.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| ApiError::Decode(format!("invalid date '{}': {}", value, e)))
}

// =============================================================================
// ForecastApi
// =============================================================================

/// Client trait for the forecast service.
#[async_trait]
pub trait ForecastApi: Send + Sync {
    /// List product identifiers.
    async fn products(&self) -> Result<Vec<String>, ApiError>;

    /// Earliest and latest dates with historical data.
    async fn available_dates(&self) -> Result<AvailableDates, ApiError>;

    /// Generate a report; returns the raw archive bytes.
    async fn generate_report(&self, request: &ReportRequest) -> Result<Vec<u8>, ApiError>;

    /// Ask the assistant a question; returns the answer text.
    async fn ask(&self, request: &AskRequest) -> Result<String, ApiError>;
}

/// `ForecastApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpForecastApi {
    dispatcher: RequestDispatcher,
}

impl HttpForecastApi {
    pub fn new(dispatcher: RequestDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self::new(RequestDispatcher::new(config)?))
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }
}

#[async_trait]
impl ForecastApi for HttpForecastApi {
    async fn products(&self) -> Result<Vec<String>, ApiError> {
        self.dispatcher.get_json(PRODUCTS_PATH).await
    }

    async fn available_dates(&self) -> Result<AvailableDates, ApiError> {
        let body: AvailableDatesBody = self.dispatcher.get_json(AVAILABLE_DATES_PATH).await?;
        Ok(AvailableDates {
            min: parse_service_date(&body.min_available_date)?,
            max: parse_service_date(&body.max_available_date)?,
        })
    }

    async fn generate_report(&self, request: &ReportRequest) -> Result<Vec<u8>, ApiError> {
        let fields = request.form_fields();
        info!(
            product = %request.product_name,
            summary_range = request.summary_range.is_some(),
            forecast_range = request.forecast_range.is_some(),
            "Requesting report"
        );
        let bytes = self.dispatcher.post_form_bytes(FORECAST_PATH, &fields).await?;
        info!(bytes = bytes.len(), "Report archive received");
        Ok(bytes)
    }

    async fn ask(&self, request: &AskRequest) -> Result<String, ApiError> {
        let fields = request.form_fields();
        let body: AskBody = self.dispatcher.post_form_json(ASK_AI_PATH, &fields).await?;
        Ok(body.gemini_answer)
    }
}
