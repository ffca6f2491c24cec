use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podsaver_core::{
    spawn_export, CancellationToken, DeviceConfig, ExportJob, MediaCatalog, TrackRecord,
};

#[derive(Parser)]
#[command(name = "podsaver", version, about = "Save tracks from an iPod's database to local disk")]
struct Cli {
    /// JSON device configuration file (database path + mount root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Track database file (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Device mount point (overrides the config file)
    #[arg(long, global = true)]
    mount: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every audio track in the database
    List {
        /// Case-insensitive substring match over title/artist/album
        #[arg(long)]
        filter: Option<String>,
    },
    /// Copy tracks to a local directory using a filename template
    Export {
        /// Base directory to save into (must exist)
        #[arg(short, long)]
        dest: PathBuf,

        /// Filename template: %a artist, %A album, %t title, %y year,
        /// %n track number, %N zero-padded track number, %g genre
        #[arg(short, long, default_value = "%a/%A/%N - %t")]
        template: String,

        /// Case-insensitive substring match over title/artist/album
        #[arg(long)]
        filter: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = device_config(&cli)?;
    let catalog = podsaver_core::load_catalog(&config)
        .with_context(|| format!("reading track database {}", config.db_path.display()))?;

    match cli.command {
        Command::List { filter } => list_tracks(&catalog, filter.as_deref()),
        Command::Export {
            dest,
            template,
            filter,
        } => export_tracks(&catalog, dest, template, filter.as_deref()),
    }
}

/// Merge the optional config file with command-line overrides.
fn device_config(cli: &Cli) -> anyhow::Result<DeviceConfig> {
    let mut config = match &cli.config {
        Some(path) => DeviceConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => DeviceConfig::new(PathBuf::new(), PathBuf::new()),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(mount) = &cli.mount {
        config.mount_root = mount.clone();
    }
    if config.db_path.as_os_str().is_empty() {
        bail!("no track database given: pass --db or a --config file");
    }
    Ok(config)
}

fn matches_filter(track: &TrackRecord, filter: &str) -> bool {
    let needle = filter.to_lowercase();
    [&track.title, &track.artist, &track.album]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(&needle))
}

fn select(catalog: &MediaCatalog, filter: Option<&str>) -> Vec<TrackRecord> {
    catalog
        .tracks()
        .iter()
        .filter(|t| filter.map_or(true, |f| matches_filter(t, f)))
        .cloned()
        .collect()
}

fn list_tracks(catalog: &MediaCatalog, filter: Option<&str>) -> anyhow::Result<()> {
    let tracks = select(catalog, filter);
    for t in &tracks {
        println!(
            "{:>4}  {} - {}  [{}, {}] {}  {}",
            t.track_id,
            t.title.as_deref().unwrap_or("<untitled>"),
            t.artist.as_deref().unwrap_or("<unknown artist>"),
            t.album.as_deref().unwrap_or("<unknown album>"),
            t.year,
            t.genre.as_deref().unwrap_or(""),
            t.source_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );
    }
    eprintln!("{} track(s)", tracks.len());
    Ok(())
}

fn export_tracks(
    catalog: &MediaCatalog,
    dest: PathBuf,
    template: String,
    filter: Option<&str>,
) -> anyhow::Result<()> {
    validate_template(&template)?;
    let tracks = select(catalog, filter);
    if tracks.is_empty() {
        eprintln!("Nothing to export.");
        return Ok(());
    }
    let total = tracks.len();
    let dest_display = dest.display().to_string();

    let token = CancellationToken::new();
    let ctrlc_token = token.clone();
    ctrlc::set_handler(move || ctrlc_token.cancel())
        .context("installing Ctrl-C handler")?;

    let job = ExportJob {
        tracks,
        template,
        dest_root: dest,
    };
    let handle = spawn_export(job, token);

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}% saving files")
            .unwrap(),
    );
    for percent in handle.events().iter() {
        pb.set_position(u64::from(percent));
    }
    pb.finish_and_clear();

    match handle.join() {
        Ok(result) => {
            eprintln!(
                "Saving complete! {} of {} file(s) written to {}",
                result.files_copied, total, dest_display
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Saving failed!");
            Err(e.into())
        }
    }
}

/// Reject masks that cannot produce a filename before any work starts.
fn validate_template(template: &str) -> anyhow::Result<()> {
    if template.is_empty() {
        bail!("no file mask specified");
    }
    if template.ends_with(std::path::MAIN_SEPARATOR) {
        bail!("invalid file mask: must not end with a path separator");
    }
    Ok(())
}
