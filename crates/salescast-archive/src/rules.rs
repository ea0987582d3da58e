//! Ordered name-based classification of archive entries.
//!
//! Rules are checked in a fixed priority order and the first match wins,
//! so an entry such as `forecast_summary_report.png` is always an image.

use regex::Regex;

use salescast_core::config::ArchiveConfig;
use salescast_core::types::ContextField;

use crate::error::ArchiveError;

/// What an entry decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Binary image artifact keyed by the name without its extension.
    Image,
    /// Custom-range forecast table, kept both parsed and as raw text.
    CustomForecast,
    /// One of the four text fields of the session context.
    Context(ContextField),
}

/// A single compiled pattern linked to an entry kind.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub regex: Regex,
    pub kind: EntryKind,
}

/// All classification rules, in priority order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ClassificationRule>,
}

fn alternation(extensions: &[String]) -> Option<String> {
    let escaped: Vec<String> = extensions
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        None
    } else {
        Some(escaped.join("|"))
    }
}

fn compile(pattern: &str) -> Result<Regex, ArchiveError> {
    Regex::new(pattern).map_err(|e| ArchiveError::Rule(format!("{}: {}", pattern, e)))
}

impl RuleSet {
    /// Compile the rules described by the archive configuration.
    ///
    /// Empty markers and empty extension lists produce no rule.
    pub fn from_config(config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        let mut rules = Vec::new();

        if let Some(images) = alternation(&config.image_extensions) {
            rules.push(ClassificationRule {
                regex: compile(&format!(r"(?i)\.(?:{})$", images))?,
                kind: EntryKind::Image,
            });
        }

        let custom = config.custom_forecast_marker.trim();
        if let (false, Some(tables)) = (custom.is_empty(), alternation(&config.table_extensions)) {
            rules.push(ClassificationRule {
                regex: compile(&format!(
                    r"(?i){}.*\.(?:{})$",
                    regex::escape(custom),
                    tables
                ))?,
                kind: EntryKind::CustomForecast,
            });
        }

        let context_markers = [
            (&config.historical_summary_marker, ContextField::HistoricalSummary),
            (&config.forecast_summary_marker, ContextField::ForecastSummary),
            (&config.forecast_data_marker, ContextField::ForecastData),
            (&config.historical_data_marker, ContextField::HistoricalData),
        ];
        for (marker, field) in context_markers {
            let marker = marker.trim();
            if marker.is_empty() {
                continue;
            }
            rules.push(ClassificationRule {
                regex: compile(&format!("(?i){}", regex::escape(marker)))?,
                kind: EntryKind::Context(field),
            });
        }

        Ok(Self { rules })
    }

    /// Kind of the first rule matching `name`, or `None` if the entry is ignored.
    pub fn classify(&self, name: &str) -> Option<EntryKind> {
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(name))
            .map(|rule| rule.kind)
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }
}

/// Artifact key of an image entry: its name with the extension stripped.
pub fn image_key(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::from_config(&ArchiveConfig::default()).unwrap()
    }

    #[test]
    fn test_default_rule_order() {
        let kinds: Vec<EntryKind> = rules().rules().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::Image,
                EntryKind::CustomForecast,
                EntryKind::Context(ContextField::HistoricalSummary),
                EntryKind::Context(ContextField::ForecastSummary),
                EntryKind::Context(ContextField::ForecastData),
                EntryKind::Context(ContextField::HistoricalData),
            ]
        );
    }

    #[test]
    fn test_classify_known_names() {
        let rules = rules();
        assert_eq!(rules.classify("sales_trend.png"), Some(EntryKind::Image));
        assert_eq!(rules.classify("charts/Seasonality.JPG"), Some(EntryKind::Image));
        assert_eq!(
            rules.classify("M01AB_forecast_custom_date_2026.csv"),
            Some(EntryKind::CustomForecast)
        );
        assert_eq!(
            rules.classify("detailed_summary_report.txt"),
            Some(EntryKind::Context(ContextField::HistoricalSummary))
        );
        assert_eq!(
            rules.classify("M01AB_forecast_summary_report.md"),
            Some(EntryKind::Context(ContextField::ForecastSummary))
        );
        assert_eq!(
            rules.classify("full_forecast_data.csv"),
            Some(EntryKind::Context(ContextField::ForecastData))
        );
        assert_eq!(
            rules.classify("HISTORICAL_RAW_DATA.csv"),
            Some(EntryKind::Context(ContextField::HistoricalData))
        );
    }

    #[test]
    fn test_unmatched_names_are_ignored() {
        let rules = rules();
        assert_eq!(rules.classify("unknown.bin"), None);
        assert_eq!(rules.classify("readme.txt"), None);
        assert_eq!(rules.classify("png"), None);
    }

    #[test]
    fn test_priority_resolves_ambiguous_names() {
        let rules = rules();
        // Image extension beats every text marker.
        assert_eq!(
            rules.classify("forecast_summary_report.png"),
            Some(EntryKind::Image)
        );
        // Custom forecast beats the full forecast marker.
        assert_eq!(
            rules.classify("forecast_custom_date_full_forecast_data.csv"),
            Some(EntryKind::CustomForecast)
        );
        // Custom marker without a tabular extension falls through.
        assert_eq!(rules.classify("forecast_custom_date.txt"), None);
    }

    #[test]
    fn test_empty_markers_produce_no_rule() {
        let config = ArchiveConfig {
            image_extensions: vec![],
            custom_forecast_marker: String::new(),
            historical_data_marker: "  ".to_string(),
            ..ArchiveConfig::default()
        };
        let rules = RuleSet::from_config(&config).unwrap();
        assert_eq!(rules.rules().len(), 3);
        assert_eq!(rules.classify("chart.png"), None);
        assert_eq!(rules.classify("historical_raw_data.csv"), None);
    }

    #[test]
    fn test_markers_are_matched_literally() {
        let config = ArchiveConfig {
            forecast_data_marker: "data(v2)".to_string(),
            ..ArchiveConfig::default()
        };
        let rules = RuleSet::from_config(&config).unwrap();
        assert_eq!(
            rules.classify("data(v2).csv"),
            Some(EntryKind::Context(ContextField::ForecastData))
        );
        assert_eq!(rules.classify("datav2.csv"), None);
    }

    #[test]
    fn test_image_key() {
        assert_eq!(image_key("sales_trend.png"), "sales_trend");
        assert_eq!(image_key("charts/monthly.v2.jpeg"), "charts/monthly.v2");
        assert_eq!(image_key("noextension"), "noextension");
        assert_eq!(image_key(".png"), ".png");
    }
}
