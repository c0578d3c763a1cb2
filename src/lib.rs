pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod fetch;
pub mod process;
pub mod snapshot;

pub use aggregate::{aggregate, Summary};
pub use config::Config;
pub use process::{ingest, IngestError, IngestWarning, Ingestion};
