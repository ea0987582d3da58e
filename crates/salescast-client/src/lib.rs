//! HTTP client for the remote forecast service.
//!
//! All endpoints share `RequestDispatcher`, which normalizes every failed
//! call into `ApiError`.

pub mod api;
pub mod dispatcher;
pub mod error;
pub mod mock;

pub use api::{AskRequest, ForecastApi, HttpForecastApi, ReportRequest};
pub use dispatcher::RequestDispatcher;
pub use error::ApiError;
pub use mock::MockForecastApi;
