//! Scripted `ForecastApi` for tests.
//!
//! Report archives and answers are queued and consumed in call order; each
//! scripted reply can carry a delay so tests can overlap calls. Every call
//! is counted and its request recorded.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use salescast_core::types::AvailableDates;

use crate::api::{AskRequest, ForecastApi, ReportRequest};
use crate::error::ApiError;

struct Scripted<T> {
    result: Result<T, ApiError>,
    delay: Option<Duration>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn exhausted(endpoint: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        detail: format!("no scripted response for {}", endpoint),
    }
}

/// Mock client that returns preconfigured responses.
#[derive(Default)]
pub struct MockForecastApi {
    products: Option<Result<Vec<String>, ApiError>>,
    dates: Option<Result<AvailableDates, ApiError>>,
    reports: Mutex<VecDeque<Scripted<Vec<u8>>>>,
    answers: Mutex<VecDeque<Scripted<String>>>,
    report_calls: AtomicUsize,
    ask_calls: AtomicUsize,
    report_requests: Mutex<Vec<ReportRequest>>,
    ask_requests: Mutex<Vec<AskRequest>>,
}

impl MockForecastApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products<I, S>(mut self, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.products = Some(Ok(products.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_products_error(mut self, error: ApiError) -> Self {
        self.products = Some(Err(error));
        self
    }

    pub fn with_dates(mut self, dates: AvailableDates) -> Self {
        self.dates = Some(Ok(dates));
        self
    }

    /// Queue a report archive.
    pub fn with_report(self, archive: Vec<u8>) -> Self {
        self.push_report(Ok(archive), None)
    }

    /// Queue a report archive that arrives after `delay`.
    pub fn with_report_delayed(self, archive: Vec<u8>, delay: Duration) -> Self {
        self.push_report(Ok(archive), Some(delay))
    }

    /// Queue a failed report generation.
    pub fn with_report_error(self, error: ApiError) -> Self {
        self.push_report(Err(error), None)
    }

    /// Queue an assistant answer.
    pub fn with_answer(self, answer: impl Into<String>) -> Self {
        self.push_answer(Ok(answer.into()), None)
    }

    /// Queue an assistant answer that arrives after `delay`.
    pub fn with_answer_delayed(self, answer: impl Into<String>, delay: Duration) -> Self {
        self.push_answer(Ok(answer.into()), Some(delay))
    }

    /// Queue a failed conversational query.
    pub fn with_answer_error(self, error: ApiError) -> Self {
        self.push_answer(Err(error), None)
    }

    fn push_report(self, result: Result<Vec<u8>, ApiError>, delay: Option<Duration>) -> Self {
        lock(&self.reports).push_back(Scripted { result, delay });
        self
    }

    fn push_answer(self, result: Result<String, ApiError>, delay: Option<Duration>) -> Self {
        lock(&self.answers).push_back(Scripted { result, delay });
        self
    }

    pub fn report_calls(&self) -> usize {
        self.report_calls.load(Ordering::SeqCst)
    }

    pub fn ask_calls(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst)
    }

    pub fn report_requests(&self) -> Vec<ReportRequest> {
        lock(&self.report_requests).clone()
    }

    pub fn ask_requests(&self) -> Vec<AskRequest> {
        lock(&self.ask_requests).clone()
    }
}

#[async_trait]
impl ForecastApi for MockForecastApi {
    async fn products(&self) -> Result<Vec<String>, ApiError> {
        self.products
            .clone()
            .unwrap_or_else(|| Err(exhausted("products")))
    }

    async fn available_dates(&self) -> Result<AvailableDates, ApiError> {
        self.dates
            .clone()
            .unwrap_or_else(|| Err(exhausted("available dates")))
    }

    async fn generate_report(&self, request: &ReportRequest) -> Result<Vec<u8>, ApiError> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.report_requests).push(request.clone());
        // Take the reply before awaiting so overlapping calls consume the
        // queue in call order.
        let scripted = lock(&self.reports).pop_front();
        let Some(scripted) = scripted else {
            return Err(exhausted("report"));
        };
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.result
    }

    async fn ask(&self, request: &AskRequest) -> Result<String, ApiError> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.ask_requests).push(request.clone());
        let scripted = lock(&self.answers).pop_front();
        let Some(scripted) = scripted else {
            return Err(exhausted("ask"));
        };
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.result
    }
}
