//! Product catalog and data bounds fetched at start-up.

use salescast_core::types::{format_display_date, AvailableDates};

use crate::error::ReportError;

/// What the service offers: products and the span of historical data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub products: Vec<String>,
    pub dates: AvailableDates,
}

impl Catalog {
    /// The product selected by default: the first one the service lists.
    pub fn default_product(&self) -> Option<&str> {
        self.products.first().map(String::as_str)
    }

    pub fn contains(&self, product: &str) -> bool {
        self.products.iter().any(|p| p == product)
    }

    /// Pick the product to report on: the requested one if the service
    /// lists it, otherwise the default.
    pub fn select(&self, requested: Option<&str>) -> Result<String, ReportError> {
        match requested {
            Some(product) if self.contains(product) => Ok(product.to_string()),
            Some(product) => Err(ReportError::Validation(format!(
                "Unknown product: {}",
                product
            ))),
            None => Ok(self.default_product().unwrap_or_default().to_string()),
        }
    }

    /// Human-readable data span, e.g. `Data available from January 2, 2014 to October 8, 2019`.
    pub fn availability(&self) -> String {
        format!(
            "Data available from {} to {}",
            format_display_date(self.dates.min),
            format_display_date(self.dates.max)
        )
    }
}
