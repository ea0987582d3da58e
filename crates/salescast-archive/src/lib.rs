//! Report archive extraction.
//!
//! Classifies the entries of a report archive by name and decodes them
//! concurrently into an `AnalysisBundle` and a `SessionContext`.

pub mod decoder;
pub mod error;
pub mod extractor;
pub mod rules;

pub use decoder::{EntryDecoder, Utf8Decoder};
pub use error::{ArchiveError, EntryError};
pub use extractor::{unpack, ArchiveEntry, ArchiveExtractor, DecodedEntry, Extraction, SlotWrite};
pub use rules::{ClassificationRule, EntryKind, RuleSet};
