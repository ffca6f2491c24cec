use crate::track::{TrackKind, TrackRecord};

/// Insertion-ordered collection of audio tracks decoded from one database
/// load. Catalog order follows container order in the source stream; records
/// are never merged or deduplicated.
#[derive(Debug, Default)]
pub struct MediaCatalog {
    tracks: Vec<TrackRecord>,
}

impl MediaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep an audio record. Every other kind is parsed to keep the scan
    /// cursor correct but never retained.
    pub fn add(&mut self, track: TrackRecord) {
        if track.kind == TrackKind::Audio {
            self.tracks.push(track);
        }
    }

    /// Read-only view in scan order.
    pub fn tracks(&self) -> &[TrackRecord] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Drop all records ahead of a reload.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}
