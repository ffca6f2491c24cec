use std::path::PathBuf;

/// One decoded entry from the track database.
///
/// Only the kind and track number are known when the fixed header is read;
/// the text fields arrive one nested container at a time, so everything else
/// starts unset.
#[derive(Debug, Clone)]
pub struct TrackRecord {
    /// Track number within the container.
    pub track_id: u32,
    pub kind: TrackKind,
    /// Release year as stored on the device.
    pub year: i32,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    /// Host path of the audio file, resolved under the mount root.
    pub source_path: Option<PathBuf>,
}

impl TrackRecord {
    pub fn new(kind: TrackKind, track_id: u32) -> Self {
        Self {
            track_id,
            kind,
            year: 0,
            title: None,
            artist: None,
            album: None,
            genre: None,
            source_path: None,
        }
    }
}

/// Raw type codes from the database, closed over the kinds the format knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
    MusicVideo,
    Unknown,
}

impl TrackKind {
    /// Total over all possible codes; anything unrecognized is `Unknown`.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Audio,
            2 => Self::Video,
            32 => Self::MusicVideo,
            _ => Self::Unknown,
        }
    }
}
