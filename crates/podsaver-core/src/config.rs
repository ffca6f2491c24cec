use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Where the device is mounted and where its track database lives.
///
/// Preference changes are applied by constructing a new scanner with a fresh
/// `DeviceConfig`, never by mutating a shared one in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Path of the track database file on the mounted device.
    pub db_path: PathBuf,
    /// Mount point of the device, prepended to decoded track locations.
    pub mount_root: PathBuf,
}

impl DeviceConfig {
    pub fn new(db_path: PathBuf, mount_root: PathBuf) -> Self {
        Self { db_path, mount_root }
    }

    /// Load a saved configuration from a JSON preference file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write the configuration to a JSON preference file.
    pub fn write_file(&self, path: &Path) -> Result<(), Error> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Rewrite a device-relative location (`:iPod_Control:Music:...`) into a
    /// host path under the mount root. The device uses `:` as its path
    /// separator.
    pub fn resolve_device_path(&self, location: &str) -> PathBuf {
        let rel = location.replace(':', MAIN_SEPARATOR_STR);
        PathBuf::from(format!("{}{}", self.mount_root.display(), rel))
    }
}
