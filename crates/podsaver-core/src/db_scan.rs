//! Resynchronizing scan of the track database.
//!
//! The format carries no reliable top-level index, so track containers are
//! found by a linear byte scan for the `mhit` tag. A failed probe rewinds to
//! the byte after the candidate `m`, so a legitimate tag directly following
//! a false positive is never skipped.

use std::fs::File;
use std::io::{BufReader, Read, Seek};

use tracing::debug;

use crate::catalog::MediaCatalog;
use crate::config::DeviceConfig;
use crate::cursor::ByteCursor;
use crate::error::Error;
use crate::track::{TrackKind, TrackRecord};

/// Four-byte tag opening a track container.
const TRACK_TAG: &[u8; 4] = b"mhit";

/// Type codes of the nested field containers the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    Title,
    Location,
    Album,
    Artist,
    Genre,
}

impl FieldType {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Title),
            2 => Some(Self::Location),
            3 => Some(Self::Album),
            4 => Some(Self::Artist),
            5 => Some(Self::Genre),
            _ => None,
        }
    }
}

/// Reads a device's track database into a [`MediaCatalog`].
pub struct DbScanner {
    config: DeviceConfig,
}

impl DbScanner {
    /// A scanner bound to one device configuration. Preference changes are
    /// applied by constructing a new scanner.
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }

    /// Open the configured database file and scan it to completion.
    pub fn read_catalog(&self) -> Result<MediaCatalog, Error> {
        let file = File::open(&self.config.db_path).map_err(|e| Error::SourceUnavailable {
            path: self.config.db_path.clone(),
            source: e,
        })?;
        let mut cursor = ByteCursor::new(BufReader::new(file));
        let mut catalog = MediaCatalog::new();
        self.scan(&mut cursor, &mut catalog)?;
        Ok(catalog)
    }

    /// Scan a byte stream for track containers, appending decoded audio
    /// records to `catalog`. Runs synchronously to end-of-stream.
    pub fn scan<R: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<R>,
        catalog: &mut MediaCatalog,
    ) -> Result<(), Error> {
        while let Some(byte) = cursor.read_byte()? {
            if byte != TRACK_TAG[0] {
                continue;
            }
            let probe_pos = cursor.position();
            let mut probe = [0u8; 3];
            let n = cursor.read_up_to(&mut probe)?;
            if n == probe.len() && probe[..] == TRACK_TAG[1..] {
                debug!(offset = probe_pos - 1, "track container");
                self.parse_track(cursor, catalog)?;
            } else {
                // Not a tag (or the stream ended inside the probe): rewind to
                // just after the `m` and keep scanning.
                cursor.seek_to(probe_pos)?;
            }
        }
        Ok(())
    }

    /// Decode the fixed-offset track header and its nested field containers.
    /// The cursor sits immediately after the confirmed tag on entry.
    fn parse_track<R: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<R>,
        catalog: &mut MediaCatalog,
    ) -> Result<(), Error> {
        let anchor = cursor.position();
        let header_len = cursor.read_u32_le()?;
        let _container_len = cursor.read_u32_le()?; // consumed to keep offsets aligned
        let field_count = cursor.read_u32_le()?;
        cursor.skip(28)?;
        let track_number = cursor.read_u32_le()?;
        cursor.skip(4)?;
        let year = cursor.read_u32_le()? as i32;
        cursor.skip(152)?;
        let type_code = cursor.read_u32_le()?;

        let mut track = TrackRecord::new(TrackKind::from_code(type_code), track_number);
        track.year = year;
        debug!(track_number, year, field_count, "track header");

        // header_len is the distance from the anchor to the first nested
        // field container.
        cursor.seek_to(anchor + u64::from(header_len))?;
        for _ in 0..field_count {
            decode_field(cursor, &self.config, &mut track)?;
        }
        catalog.add(track);
        Ok(())
    }
}

/// Decode one nested field container, mutating `track`, and leave the cursor
/// at the start of the next sibling no matter what was read.
fn decode_field<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    config: &DeviceConfig,
    track: &mut TrackRecord,
) -> Result<(), Error> {
    let start = cursor.position();
    cursor.skip(8)?;
    let total_len = cursor.read_u32_le()?;
    let type_code = cursor.read_u32_le()?;

    if let Some(field) = FieldType::from_code(type_code) {
        cursor.skip(12)?;
        let string_len = cursor.read_u32_le()?;
        cursor.skip(8)?;
        let mut payload = vec![0u8; string_len as usize];
        cursor.read_exact(&mut payload)?;
        let text = decode_utf16(&payload);
        debug!(?field, len = string_len, "field");
        match field {
            FieldType::Title => track.title = Some(text),
            FieldType::Album => track.album = Some(text),
            FieldType::Artist => track.artist = Some(text),
            FieldType::Genre => track.genre = Some(text),
            FieldType::Location => {
                track.source_path = Some(config.resolve_device_path(&text));
            }
        }
    }
    // The sibling's position comes from this container's declared length, so
    // unrecognized types and internal padding are both stepped over.
    cursor.seek_to(start + u64::from(total_len))?;
    Ok(())
}

/// Field payloads are UTF-16LE, two bytes per code unit.
fn decode_utf16(bytes: &[u8]) -> String {
    let (text, _, _) = encoding_rs::UTF_16LE.decode(bytes);
    text.into_owned()
}
