//! Sequential export of catalog tracks to a destination tree.
//!
//! Copies run strictly in input order on a single thread, so progress
//! percentages are monotonically non-decreasing and deterministic. A worker
//! wrapper runs the same pipeline off-thread and hands progress back over a
//! channel.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::cancel::CancellationToken;
use crate::error::Error;
use crate::template;
use crate::track::TrackRecord;

/// One export run: the selected records, the naming template, and the
/// directory to save into. Exists only for the duration of the run.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub tracks: Vec<TrackRecord>,
    pub template: String,
    pub dest_root: PathBuf,
}

/// Summary of a finished export.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub files_copied: u64,
}

/// Copy every track in the job, in input order, reporting an integer
/// percentage through `progress` after each file.
///
/// The first track's source is probed before any directory is created, which
/// cheaply detects a disconnected device without partial side effects. A
/// copy failure aborts the remaining queue; files already copied are left in
/// place. The cancellation token is checked between items.
///
/// An empty selection succeeds, copies nothing, and reports nothing.
pub fn run_export(
    job: &ExportJob,
    token: &CancellationToken,
    mut progress: impl FnMut(u8),
) -> Result<ExportResult, Error> {
    if !job.dest_root.is_dir() {
        return Err(Error::DestinationMissing(job.dest_root.clone()));
    }
    let Some(first) = job.tracks.first() else {
        return Ok(ExportResult { files_copied: 0 });
    };
    let probe = source_of(first)?;
    if !probe.exists() {
        return Err(Error::SourceUnavailable {
            path: probe.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
        });
    }

    let total = job.tracks.len() as u64;
    let mut completed = 0u64;
    for track in &job.tracks {
        token.check()?;
        let src = source_of(track)?;
        let dest = dest_path(&job.dest_root, &job.template, track, src)?;
        copy_file(src, &dest)?;
        completed += 1;
        progress((completed * 100 / total) as u8);
    }
    Ok(ExportResult { files_copied: completed })
}

fn source_of(track: &TrackRecord) -> Result<&Path, Error> {
    track.source_path.as_deref().ok_or(Error::MissingLocation {
        track_id: track.track_id,
    })
}

/// Render the destination path, keep the source file's extension, and create
/// any missing intermediate directories.
fn dest_path(
    dest_root: &Path,
    tpl: &str,
    track: &TrackRecord,
    src: &Path,
) -> Result<PathBuf, Error> {
    let rendered = template::render(tpl, track);
    let src_str = src.to_string_lossy();
    let extension = src_str.rfind('.').map(|i| &src_str[i..]).unwrap_or("");
    let dest = dest_root.join(format!("{rendered}{extension}"));
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::DirectoryCreateFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    Ok(dest)
}

/// Copy bytes to a fresh destination file. An existing destination is a
/// failure, never an overwrite.
fn copy_file(src: &Path, dest: &Path) -> Result<(), Error> {
    let copy = || -> io::Result<()> {
        let mut input = File::open(src)?;
        let mut output = File::options().write(true).create_new(true).open(dest)?;
        io::copy(&mut input, &mut output)?;
        Ok(())
    };
    copy().map_err(|e| Error::CopyFailed {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source: e,
    })?;
    debug!(src = %src.display(), dest = %dest.display(), "copied");
    Ok(())
}

/// A running export worker: a progress receiver plus a joinable outcome.
pub struct ExportHandle {
    events: Receiver<u8>,
    worker: JoinHandle<Result<ExportResult, Error>>,
}

impl ExportHandle {
    /// Percent events, one per copied file, in input order. The channel
    /// closes when the worker finishes.
    pub fn events(&self) -> &Receiver<u8> {
        &self.events
    }

    /// Wait for the worker and return its outcome.
    pub fn join(self) -> Result<ExportResult, Error> {
        self.worker.join().expect("export worker panicked")
    }
}

/// Run the pipeline on a dedicated thread so the caller stays responsive
/// while consuming progress events.
pub fn spawn_export(job: ExportJob, token: CancellationToken) -> ExportHandle {
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        run_export(&job, &token, |percent| {
            // A consumer that went away is not the export's problem.
            let _ = tx.send(percent);
        })
    });
    ExportHandle { events: rx, worker }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackKind;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    /// A track whose source file exists on disk with known contents.
    fn track_with_source(dir: &TempDir, n: u32, title: &str) -> TrackRecord {
        let src = dir.path().join(format!("src{n}.mp3"));
        fs::write(&src, format!("audio-{n}")).unwrap();
        let mut t = TrackRecord::new(TrackKind::Audio, n);
        t.title = Some(title.to_string());
        t.artist = Some("Band".to_string());
        t.album = Some("Album".to_string());
        t.source_path = Some(src);
        t
    }

    fn job(tracks: Vec<TrackRecord>, template: &str, dest: &Path) -> ExportJob {
        ExportJob {
            tracks,
            template: template.to_string(),
            dest_root: dest.to_path_buf(),
        }
    }

    fn run(job: &ExportJob) -> (Result<ExportResult, Error>, Vec<u8>) {
        let mut reports = Vec::new();
        let result = run_export(job, &CancellationToken::new(), |p| reports.push(p));
        (result, reports)
    }

    #[test]
    fn test_missing_destination_fails_before_touching_anything() {
        let src_dir = tempdir().unwrap();
        let tracks = vec![track_with_source(&src_dir, 1, "Song")];
        let job = job(tracks, "%t", Path::new("/nonexistent/dest"));
        let (result, reports) = run(&job);
        assert!(matches!(result, Err(Error::DestinationMissing(_))));
        assert!(reports.is_empty());
    }

    #[test]
    fn test_unreachable_source_fails_fast_without_side_effects() {
        let dest = tempdir().unwrap();
        let mut t = TrackRecord::new(TrackKind::Audio, 1);
        t.title = Some("Song".to_string());
        t.source_path = Some(PathBuf::from("/nonexistent/src.mp3"));
        let job = job(vec![t], "sub/%t", dest.path());
        let (result, reports) = run(&job);
        assert!(matches!(result, Err(Error::SourceUnavailable { .. })));
        assert!(reports.is_empty());
        // the template's subdirectory must not have been created
        assert!(fs::read_dir(dest.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_missing_location_is_a_typed_error() {
        let dest = tempdir().unwrap();
        let t = TrackRecord::new(TrackKind::Audio, 9);
        let job = job(vec![t], "%t", dest.path());
        let (result, _) = run(&job);
        assert!(matches!(result, Err(Error::MissingLocation { track_id: 9 })));
    }

    #[test]
    fn test_empty_selection_succeeds_with_no_reports() {
        let dest = tempdir().unwrap();
        let job = job(Vec::new(), "%t", dest.path());
        let (result, reports) = run(&job);
        assert_eq!(result.unwrap().files_copied, 0);
        assert!(reports.is_empty());
        assert!(fs::read_dir(dest.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_progress_is_monotone_and_ends_at_100() {
        for n in [1u32, 2, 5] {
            let src_dir = tempdir().unwrap();
            let dest = tempdir().unwrap();
            let tracks: Vec<_> = (1..=n)
                .map(|i| track_with_source(&src_dir, i, &format!("Song {i}")))
                .collect();
            let job = job(tracks, "%n - %t", dest.path());
            let (result, reports) = run(&job);
            assert_eq!(result.unwrap().files_copied, u64::from(n));
            assert_eq!(reports.len(), n as usize);
            assert!(reports.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(*reports.last().unwrap(), 100);
        }
    }

    #[test]
    fn test_copy_keeps_source_extension_and_bytes() {
        let src_dir = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let tracks = vec![track_with_source(&src_dir, 1, "Song")];
        let job = job(tracks, "%t", dest.path());
        run(&job).0.unwrap();
        let copied = dest.path().join("Song.mp3");
        assert_eq!(fs::read_to_string(copied).unwrap(), "audio-1");
    }

    #[test]
    fn test_template_separators_create_subdirectories() {
        let src_dir = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let tracks = vec![track_with_source(&src_dir, 4, "Song")];
        let job = job(tracks, "%a/%A/%N - %t", dest.path());
        run(&job).0.unwrap();
        let copied = dest.path().join("Band").join("Album").join("04 - Song.mp3");
        assert!(copied.is_file());
    }

    #[test]
    fn test_existing_destination_is_copy_failed() {
        let src_dir = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let tracks = vec![track_with_source(&src_dir, 1, "Song")];
        fs::write(dest.path().join("Song.mp3"), "already here").unwrap();
        let job = job(tracks, "%t", dest.path());
        let (result, _) = run(&job);
        assert!(matches!(result, Err(Error::CopyFailed { .. })));
        // the existing file is untouched
        assert_eq!(
            fs::read_to_string(dest.path().join("Song.mp3")).unwrap(),
            "already here"
        );
    }

    #[test]
    fn test_cancelled_token_aborts_between_items() {
        let src_dir = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let tracks = vec![
            track_with_source(&src_dir, 1, "One"),
            track_with_source(&src_dir, 2, "Two"),
        ];
        let token = CancellationToken::new();
        token.cancel();
        let job = job(tracks, "%t", dest.path());
        let result = run_export(&job, &token, |_| {});
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(fs::read_dir(dest.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_spawned_worker_reports_over_the_channel() {
        let src_dir = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let tracks = vec![
            track_with_source(&src_dir, 1, "One"),
            track_with_source(&src_dir, 2, "Two"),
        ];
        let handle = spawn_export(job(tracks, "%t", dest.path()), CancellationToken::new());
        let reports: Vec<u8> = handle.events().iter().collect();
        let result = handle.join().unwrap();
        assert_eq!(result.files_copied, 2);
        assert_eq!(reports, vec![50, 100]);
    }
}
