pub mod types;
pub mod store;
pub mod metrics;
pub mod export;

pub use types::*;
pub use store::*;
pub use export::{export_file_name, write_export, ExportFormat, ExportedObservation, StructuredExport};
