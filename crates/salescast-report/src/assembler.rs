//! Report generation.
//!
//! `ReportAssembler::generate` resets the session, requests an archive for
//! one product, extracts it and publishes the result. Every generation runs
//! under its own `GenerationToken`; a generation overtaken by a newer one
//! publishes nothing.

use std::sync::Arc;

use tracing::{info, warn};

use salescast_archive::ArchiveExtractor;
use salescast_client::{ForecastApi, ReportRequest};
use salescast_core::session::{GenerationToken, SessionStore};
use salescast_core::types::{AnalysisBundle, DateRange};

use crate::catalog::Catalog;
use crate::error::ReportError;

pub const SELECT_PRODUCT: &str = "Please select a product.";

/// Drives report generation against the forecast service.
#[derive(Clone)]
pub struct ReportAssembler {
    api: Arc<dyn ForecastApi>,
    store: Arc<SessionStore>,
    extractor: ArchiveExtractor,
}

impl ReportAssembler {
    pub fn new(
        api: Arc<dyn ForecastApi>,
        store: Arc<SessionStore>,
        extractor: ArchiveExtractor,
    ) -> Self {
        Self {
            api,
            store,
            extractor,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Fetch the product list and the available data span.
    ///
    /// A failure is shown on the banner and returned.
    pub async fn bootstrap(&self) -> Result<Catalog, ReportError> {
        self.store.clear_banner();
        let result = async {
            let products = self.api.products().await?;
            let dates = self.api.available_dates().await?;
            Ok::<_, ReportError>(Catalog { products, dates })
        }
        .await;

        match result {
            Ok(catalog) => {
                info!(
                    products = catalog.products.len(),
                    min = %catalog.dates.min,
                    max = %catalog.dates.max,
                    "Catalog loaded"
                );
                Ok(catalog)
            }
            Err(err) => {
                warn!(error = %err, "Catalog could not be loaded");
                self.store.set_banner(err.to_string());
                Err(err)
            }
        }
    }

    /// Generate the report for `product_name`.
    ///
    /// Ranges with only one endpoint are not sent. On success the
    /// published bundle is returned; on failure the session stays empty
    /// and the banner describes the error.
    pub async fn generate(
        &self,
        product_name: &str,
        summary: DateRange,
        forecast: DateRange,
    ) -> Result<Arc<AnalysisBundle>, ReportError> {
        self.store.clear_banner();
        if let Err(err) = validate(product_name, &summary, &forecast) {
            return Err(self.report_failure(None, err));
        }

        let token = self.store.begin_generation();
        info!(generation = %token, product = %product_name, "Generating report");

        match self.run(token, product_name, summary, forecast).await {
            Ok(bundle) => {
                info!(
                    generation = %token,
                    artifacts = bundle.len(),
                    "Report published"
                );
                Ok(bundle)
            }
            Err(err) => Err(self.report_failure(Some(token), err)),
        }
    }

    async fn run(
        &self,
        token: GenerationToken,
        product_name: &str,
        summary: DateRange,
        forecast: DateRange,
    ) -> Result<Arc<AnalysisBundle>, ReportError> {
        let request = ReportRequest::new(product_name, summary, forecast);
        let archive = self.api.generate_report(&request).await?;

        if !self.store.is_current(token) {
            return Err(ReportError::Superseded(token.value()));
        }

        let extraction = self.extractor.extract(&archive).await?;
        if !extraction.failures.is_empty() {
            warn!(
                generation = %token,
                failed = extraction.failures.len(),
                "Some archive entries were skipped"
            );
        }

        let mut bundle = extraction.bundle;
        bundle.set_archive(archive);
        self.store
            .commit(token, bundle, extraction.context)
            .ok_or(ReportError::Superseded(token.value()))
    }

    /// Put a failure on the banner unless a newer generation owns the session.
    fn report_failure(&self, token: Option<GenerationToken>, err: ReportError) -> ReportError {
        let err = match token {
            Some(token) if !self.store.is_current(token) => {
                ReportError::Superseded(token.value())
            }
            _ => err,
        };
        match err.banner_message() {
            Some(message) => {
                warn!(error = %err, "Report generation failed");
                self.store.set_banner(message);
            }
            None => info!(error = %err, "Report generation discarded"),
        }
        err
    }
}

fn validate(
    product_name: &str,
    summary: &DateRange,
    forecast: &DateRange,
) -> Result<(), ReportError> {
    if product_name.trim().is_empty() {
        return Err(ReportError::Validation(SELECT_PRODUCT.to_string()));
    }
    if summary.is_inverted() {
        return Err(ReportError::Validation(
            "The summary start date must not be after its end date.".to_string(),
        ));
    }
    if forecast.is_inverted() {
        return Err(ReportError::Validation(
            "The forecast start date must not be after its end date.".to_string(),
        ));
    }
    Ok(())
}
