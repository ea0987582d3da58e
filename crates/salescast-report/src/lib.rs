//! Report generation for Salescast.

pub mod assembler;
pub mod catalog;
pub mod error;

pub use assembler::ReportAssembler;
pub use catalog::Catalog;
pub use error::ReportError;
