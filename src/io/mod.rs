// CSV and JSON import/export

pub mod export;
pub mod import;

pub use export::{BackupSnapshot, ExportKind, Exporter};
pub use import::{ImportOptions, ImportResult, Importer, RestoreSummary};
