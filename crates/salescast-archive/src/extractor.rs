//! Concurrent extraction of a report archive.
//!
//! The container is opened and read synchronously into named entries.
//! Every classified entry is then decoded as its own task; all tasks are
//! awaited together and their tagged results folded, in archive order, into
//! one `AnalysisBundle` and one `SessionContext`. A failing entry is
//! recorded and never affects its siblings.

use std::io::{Cursor, Read};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use salescast_core::config::{ArchiveConfig, DEFAULT_MAX_ENTRY_BYTES};
use salescast_core::tabular;
use salescast_core::types::{
    AnalysisBundle, Artifact, ContextField, ImageHandle, SessionContext,
    CUSTOM_FORECAST_TABLE_KEY, CUSTOM_FORECAST_TEXT_KEY,
};

use crate::decoder::{EntryDecoder, Utf8Decoder};
use crate::error::{ArchiveError, EntryError};
use crate::rules::{image_key, EntryKind, RuleSet};

/// One file of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// A single write produced by decoding one entry.
#[derive(Debug, Clone)]
pub enum SlotWrite {
    Artifact { key: String, artifact: Artifact },
    Context { field: ContextField, text: String },
}

/// Tagged result of one entry's decode task.
#[derive(Debug, Clone)]
pub struct DecodedEntry {
    pub name: String,
    pub writes: Vec<SlotWrite>,
}

/// Everything recovered from one archive.
#[derive(Debug, Default)]
pub struct Extraction {
    pub bundle: AnalysisBundle,
    pub context: SessionContext,
    pub failures: Vec<EntryError>,
    pub ignored: Vec<String>,
}

/// Unpacks report archives into bundles and context.
#[derive(Clone)]
pub struct ArchiveExtractor {
    rules: RuleSet,
    decoder: Arc<dyn EntryDecoder>,
    max_entry_bytes: u64,
}

impl ArchiveExtractor {
    pub fn new(rules: RuleSet) -> Self {
        Self::with_decoder(rules, Arc::new(Utf8Decoder))
    }

    pub fn with_decoder(rules: RuleSet, decoder: Arc<dyn EntryDecoder>) -> Self {
        Self {
            rules,
            decoder,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        Ok(Self::new(RuleSet::from_config(config)?).with_entry_limit(config.max_entry_bytes))
    }

    /// Set the largest uncompressed size read from one entry.
    pub fn with_entry_limit(mut self, max_entry_bytes: u64) -> Self {
        self.max_entry_bytes = max_entry_bytes;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Extract a ZIP archive.
    ///
    /// Fails only if the container itself cannot be opened.
    pub async fn extract(&self, bytes: &[u8]) -> Result<Extraction, ArchiveError> {
        let (entries, mut failures) = unpack(bytes, self.max_entry_bytes)?;
        let mut extraction = self.extract_entries(entries).await;
        failures.append(&mut extraction.failures);
        extraction.failures = failures;
        Ok(extraction)
    }

    /// Classify, decode and fold already unpacked entries.
    pub async fn extract_entries(&self, entries: Vec<ArchiveEntry>) -> Extraction {
        let total = entries.len();
        let mut ignored = Vec::new();
        let mut tasks = Vec::new();

        for entry in entries {
            match self.rules.classify(&entry.name) {
                Some(kind) => tasks.push(self.decode_entry(entry, kind)),
                None => {
                    debug!(entry = %entry.name, "Ignoring unclassified entry");
                    ignored.push(entry.name);
                }
            }
        }

        // join_all yields results in task order, which is archive order.
        let results = join_all(tasks).await;

        let mut extraction = Extraction {
            ignored,
            ..Extraction::default()
        };
        for result in results {
            match result {
                Ok(decoded) => apply(&mut extraction, decoded),
                Err(err) => {
                    warn!(entry = %err.name(), error = %err, "Entry could not be decoded");
                    extraction.failures.push(err);
                }
            }
        }

        info!(
            entries = total,
            artifacts = extraction.bundle.len(),
            context_ready = extraction.context.ready(),
            ignored = extraction.ignored.len(),
            failed = extraction.failures.len(),
            "Archive extracted"
        );
        extraction
    }

    async fn decode_entry(
        &self,
        entry: ArchiveEntry,
        kind: EntryKind,
    ) -> Result<DecodedEntry, EntryError> {
        let ArchiveEntry { name, data } = entry;
        let writes = match kind {
            EntryKind::Image => {
                let data = self.decoder.decode_image(&name, data).await?;
                vec![SlotWrite::Artifact {
                    key: image_key(&name).to_string(),
                    artifact: Artifact::Image(ImageHandle::new(name.as_str(), data)),
                }]
            }
            EntryKind::CustomForecast => {
                let text = self.decoder.decode_text(&name, data).await?;
                let rows = tabular::parse(&text);
                vec![
                    SlotWrite::Artifact {
                        key: CUSTOM_FORECAST_TABLE_KEY.to_string(),
                        artifact: Artifact::Table(rows),
                    },
                    SlotWrite::Artifact {
                        key: CUSTOM_FORECAST_TEXT_KEY.to_string(),
                        artifact: Artifact::Text(text),
                    },
                ]
            }
            EntryKind::Context(field) => {
                let text = self.decoder.decode_text(&name, data).await?;
                vec![SlotWrite::Context { field, text }]
            }
        };
        Ok(DecodedEntry { name, writes })
    }
}

fn apply(extraction: &mut Extraction, decoded: DecodedEntry) {
    for write in decoded.writes {
        match write {
            SlotWrite::Artifact { key, artifact } => {
                if extraction.bundle.insert(key.as_str(), artifact).is_some() {
                    debug!(entry = %decoded.name, key = %key, "Artifact replaced by later entry");
                }
            }
            SlotWrite::Context { field, text } => {
                if !extraction.context.get(field).is_empty() {
                    debug!(entry = %decoded.name, field = %field, "Context field replaced by later entry");
                }
                extraction.context.set(field, text);
            }
        }
    }
}

/// Read every file entry of a ZIP archive.
///
/// Returns the readable entries in archive order together with the
/// entries that could not be read. An entry that declares or yields more
/// than `max_entry_bytes` is recorded as unreadable.
pub fn unpack(
    bytes: &[u8],
    max_entry_bytes: u64,
) -> Result<(Vec<ArchiveEntry>, Vec<EntryError>), ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());
    let mut failures = Vec::new();

    for index in 0..archive.len() {
        let mut file = match archive.by_index(index) {
            Ok(file) => file,
            Err(e) => {
                failures.push(EntryError::Read {
                    name: format!("#{}", index),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let declared = file.size();
        match read_entry(&mut file, declared, max_entry_bytes) {
            Ok(data) => entries.push(ArchiveEntry { name, data }),
            Err(reason) => {
                warn!(entry = %name, reason = %reason, "Entry could not be read");
                failures.push(EntryError::Read { name, reason });
            }
        }
    }

    debug!(entries = entries.len(), unreadable = failures.len(), "Archive unpacked");
    Ok((entries, failures))
}

// The declared size is untrusted: it only rejects early, never sizes a buffer.
fn read_entry(file: &mut impl Read, declared: u64, limit: u64) -> Result<Vec<u8>, String> {
    if declared > limit {
        return Err(format!("declared size {} exceeds limit of {} bytes", declared, limit));
    }
    let mut data = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut data)
        .map_err(|e| e.to_string())?;
    if data.len() as u64 > limit {
        return Err(format!("entry exceeds limit of {} bytes", limit));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;

    fn zip_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn extractor() -> ArchiveExtractor {
        ArchiveExtractor::from_config(&ArchiveConfig::default()).unwrap()
    }

    fn full_report() -> Vec<u8> {
        zip_archive(&[
            ("sales_trend.png", &[0x89, b'P', b'N', b'G']),
            ("charts/seasonality.svg", b"<svg/>"),
            (
                "M01AB_forecast_custom_date.csv",
                b"ds,yhat\n2026-01-01,10.5\n2026-01-02,11.0\n",
            ),
            ("detailed_summary_report.txt", b"**Total sales:** 1200"),
            ("forecast_summary_report.txt", b"Growth expected"),
            ("full_forecast_data.csv", b"ds,yhat\n2026-01-01,10.5"),
            ("historical_raw_data.csv", b"date,sales\n2019-01-01,9"),
        ])
    }

    /// Delays selected entries and records completion order.
    struct RecordingDecoder {
        slow: Vec<String>,
        fail: Vec<String>,
        delay: Duration,
        completed: Mutex<Vec<String>>,
    }

    impl RecordingDecoder {
        fn new(slow: &[&str], fail: &[&str], delay: Duration) -> Self {
            Self {
                slow: slow.iter().map(|s| s.to_string()).collect(),
                fail: fail.iter().map(|s| s.to_string()).collect(),
                delay,
                completed: Mutex::new(Vec::new()),
            }
        }

        async fn settle(&self, name: &str) -> Result<(), EntryError> {
            if self.slow.iter().any(|s| s == name) {
                tokio::time::sleep(self.delay).await;
            }
            self.completed.lock().unwrap().push(name.to_string());
            if self.fail.iter().any(|s| s == name) {
                return Err(EntryError::Decode {
                    name: name.to_string(),
                    reason: "injected failure".to_string(),
                });
            }
            Ok(())
        }

        fn completed(&self) -> Vec<String> {
            self.completed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EntryDecoder for RecordingDecoder {
        async fn decode_text(&self, name: &str, data: Vec<u8>) -> Result<String, EntryError> {
            self.settle(name).await?;
            Utf8Decoder.decode_text(name, data).await
        }

        async fn decode_image(&self, name: &str, data: Vec<u8>) -> Result<Vec<u8>, EntryError> {
            self.settle(name).await?;
            Ok(data)
        }
    }

    #[tokio::test]
    async fn test_classification_completeness() {
        let archive = zip_archive(&[
            ("x.png", &[1, 2, 3]),
            ("detailed_summary_report.txt", b"summary"),
            ("unknown.bin", &[0]),
        ]);
        let out = extractor().extract(&archive).await.unwrap();

        assert_eq!(out.bundle.len(), 1);
        assert_eq!(out.bundle.image("x").unwrap().data(), &[1, 2, 3]);
        assert_eq!(out.context.historical_summary, "summary");
        assert_eq!(out.context.forecast_summary, "");
        assert_eq!(out.context.forecast_data_text, "");
        assert_eq!(out.context.historical_data_text, "");
        assert_eq!(out.ignored, vec!["unknown.bin"]);
        assert!(out.failures.is_empty());
    }

    #[tokio::test]
    async fn test_full_report_fills_bundle_and_context() {
        let out = extractor().extract(&full_report()).await.unwrap();

        assert!(out.context.ready());
        assert_eq!(out.context.forecast_summary, "Growth expected");
        assert!(out.bundle.image("sales_trend").is_some());
        assert_eq!(
            out.bundle.image("charts/seasonality").unwrap().name(),
            "charts/seasonality.svg"
        );

        let table = out.bundle.table(CUSTOM_FORECAST_TABLE_KEY).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[1]["yhat"], "11.0");
        assert_eq!(
            out.bundle.text(CUSTOM_FORECAST_TEXT_KEY).unwrap(),
            "ds,yhat\n2026-01-01,10.5\n2026-01-02,11.0\n"
        );
        assert!(out.failures.is_empty());
        assert!(out.ignored.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_archive_fails_as_a_whole() {
        let err = extractor()
            .extract(b"this is not a zip archive")
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Open(_)));
    }

    #[tokio::test]
    async fn test_empty_archive_yields_empty_defaults() {
        let out = extractor().extract(&zip_archive(&[])).await.unwrap();
        assert!(out.bundle.is_empty());
        assert!(out.context.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_text_does_not_fail_siblings() {
        let archive = zip_archive(&[
            ("forecast_summary_report.txt", &[0xff, 0xfe, 0xfd]),
            ("detailed_summary_report.txt", b"ok"),
            ("a.png", &[7]),
        ]);
        let out = extractor().extract(&archive).await.unwrap();

        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].name(), "forecast_summary_report.txt");
        assert_eq!(out.context.forecast_summary, "");
        assert_eq!(out.context.historical_summary, "ok");
        assert!(out.bundle.image("a").is_some());
    }

    #[tokio::test]
    async fn test_directories_are_skipped() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.add_directory("charts/", options).unwrap();
        writer.start_file("charts/trend.png", options).unwrap();
        writer.write_all(&[1]).unwrap();
        let archive = writer.finish().unwrap().into_inner();

        let (entries, failures) = unpack(&archive, DEFAULT_MAX_ENTRY_BYTES).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "charts/trend.png");
        assert!(failures.is_empty());
    }

    /// Overwrite the uncompressed size the first central directory record
    /// declares, through its zip64 field when the record carries one.
    fn forge_declared_size(mut archive: Vec<u8>, size: u64) -> Vec<u8> {
        let u16_at = |a: &[u8], i: usize| u16::from_le_bytes([a[i], a[i + 1]]) as usize;
        let cd = archive.windows(4).position(|w| w == b"PK\x01\x02").unwrap();
        let name_len = u16_at(&archive, cd + 28);
        let extra_len = u16_at(&archive, cd + 30);
        let declared = u32::from_le_bytes(archive[cd + 24..cd + 28].try_into().unwrap());

        if declared == u32::MAX {
            let mut at = cd + 46 + name_len;
            let end = at + extra_len;
            while at + 4 <= end {
                let id = u16_at(&archive, at);
                let len = u16_at(&archive, at + 2);
                if id == 0x0001 {
                    archive[at + 4..at + 12].copy_from_slice(&size.to_le_bytes());
                    return archive;
                }
                at += 4 + len;
            }
            panic!("zip64 record without extended information field");
        }

        let narrow = size.min(u64::from(u32::MAX - 1)) as u32;
        archive[cd + 24..cd + 28].copy_from_slice(&narrow.to_le_bytes());
        archive
    }

    #[tokio::test]
    async fn test_forged_huge_size_is_a_per_entry_failure() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .large_file(true);
        writer.start_file("sales_trend.png", stored).unwrap();
        writer.write_all(b"hello").unwrap();
        writer
            .start_file("detailed_summary_report.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"summary").unwrap();
        let archive = forge_declared_size(writer.finish().unwrap().into_inner(), 1 << 46);

        let (entries, failures) = unpack(&archive, DEFAULT_MAX_ENTRY_BYTES).unwrap();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], EntryError::Read { .. }));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "detailed_summary_report.txt");

        let out = extractor().extract(&archive).await.unwrap();
        assert!(out.bundle.image("sales_trend").is_none());
        assert_eq!(out.context.historical_summary, "summary");
        assert_eq!(out.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_entry_over_limit_does_not_fail_siblings() {
        let archive = zip_archive(&[
            ("forecast_summary_report.txt", b"far too long for the limit"),
            ("detailed_summary_report.txt", b"ok"),
        ]);
        let extractor = extractor().with_entry_limit(8);
        let out = extractor.extract(&archive).await.unwrap();

        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].name(), "forecast_summary_report.txt");
        assert_eq!(out.context.forecast_summary, "");
        assert_eq!(out.context.historical_summary, "ok");
    }

    #[tokio::test]
    async fn test_decodes_run_concurrently_and_all_settle() {
        let delay = Duration::from_millis(150);
        let decoder = Arc::new(RecordingDecoder::new(
            &["detailed_summary_report.txt"],
            &[],
            delay,
        ));
        let extractor = ArchiveExtractor::with_decoder(
            RuleSet::from_config(&ArchiveConfig::default()).unwrap(),
            decoder.clone(),
        );

        let started = Instant::now();
        let out = extractor.extract(&full_report()).await.unwrap();

        // The slow entry comes third in the archive but settles last, and the
        // extraction waits for it.
        assert!(started.elapsed() >= delay);
        let completed = decoder.completed();
        assert_eq!(completed.len(), 7);
        assert_eq!(completed.last().unwrap(), "detailed_summary_report.txt");
        assert!(out.context.ready());
    }

    #[tokio::test]
    async fn test_failing_decode_does_not_cancel_slow_sibling() {
        let decoder = Arc::new(RecordingDecoder::new(
            &["historical_raw_data.csv"],
            &["sales_trend.png"],
            Duration::from_millis(50),
        ));
        let extractor = ArchiveExtractor::with_decoder(
            RuleSet::from_config(&ArchiveConfig::default()).unwrap(),
            decoder,
        );

        let out = extractor.extract(&full_report()).await.unwrap();

        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].name(), "sales_trend.png");
        assert!(out.bundle.image("sales_trend").is_none());
        assert_eq!(out.context.historical_data_text, "date,sales\n2019-01-01,9");
        assert!(out.context.ready());
    }

    #[tokio::test]
    async fn test_later_entry_wins_same_slot() {
        let entries = vec![
            ArchiveEntry {
                name: "v1_forecast_summary_report.txt".to_string(),
                data: b"first".to_vec(),
            },
            ArchiveEntry {
                name: "v2_forecast_summary_report.txt".to_string(),
                data: b"second".to_vec(),
            },
        ];
        let out = extractor().extract_entries(entries).await;
        assert_eq!(out.context.forecast_summary, "second");
    }
}
