pub mod cancel;
pub mod catalog;
pub mod config;
pub mod cursor;
pub mod db_scan;
pub mod error;
pub mod export;
pub mod template;
pub mod track;

pub use cancel::CancellationToken;
pub use catalog::MediaCatalog;
pub use config::DeviceConfig;
pub use db_scan::DbScanner;
pub use error::Error;
pub use export::{run_export, spawn_export, ExportHandle, ExportJob, ExportResult};
pub use track::{TrackKind, TrackRecord};

/// Read the configured device database into a fresh catalog.
pub fn load_catalog(config: &DeviceConfig) -> Result<MediaCatalog, Error> {
    DbScanner::new(config.clone()).read_catalog()
}
