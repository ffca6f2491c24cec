use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by database loading and export.
#[derive(Debug, Error)]
pub enum Error {
    /// The database file or a selected source file could not be reached.
    #[error("cannot open {}: ensure the device is connected", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The export base directory does not exist.
    #[error("base directory {} does not exist", .0.display())]
    DestinationMissing(PathBuf),

    #[error("failed to create directory {}", path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single file copy failed; earlier copies are left in place.
    #[error("an error occurred while saving file {} to path {}", src.display(), dest.display())]
    CopyFailed {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The stream ended in the middle of a track or field container.
    #[error("track database ended unexpectedly at byte {offset}")]
    MalformedContainer { offset: u64 },

    /// A track selected for export carries no location field.
    #[error("track {track_id} has no location in the database")]
    MissingLocation { track_id: u32 },

    /// The device configuration file could not be parsed.
    #[error("invalid configuration file {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("export cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] io::Error),
}
