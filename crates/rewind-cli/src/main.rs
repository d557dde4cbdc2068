//! `rewind`: build a replay history database from a recorded event log.
//!
//! ```text
//! trace.log --> rewind --> trace.sqlite --> debugger sessions
//! ```
//!
//! The output path defaults to the log path with its extension replaced by
//! `.sqlite`. Any existing store at that path is removed first, so a rerun
//! always starts from an empty history. On a fatal error the partially
//! built store is left on disk.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use rewind_core::{ReplayConfig, replay_file};
use rewind_db::HistoryDb;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Build a replay history database from a recorded event log.
#[derive(Parser, Debug)]
#[command(name = "rewind", version, about, long_about = None)]
struct Args {
    /// The event log to replay.
    log: PathBuf,

    /// YAML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Lines between batched commits (overrides config and environment).
    #[arg(long)]
    commit_interval: Option<usize>,

    /// Output database path (default: the log path with a `.sqlite` extension).
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl Args {
    /// Load configuration and apply command-line overrides.
    fn load_config(&self) -> anyhow::Result<ReplayConfig> {
        let mut config = match &self.config {
            Some(path) => ReplayConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ReplayConfig::from_env(),
        };
        if let Some(n) = self.commit_interval {
            config.replay.commit_interval = n;
        }
        Ok(config)
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output(&self.log))
    }
}

/// The log path with its extension replaced by `sqlite`.
fn default_output(log: &Path) -> PathBuf {
    log.with_extension("sqlite")
}

/// Remove a previous store and its `SQLite` side files.
fn remove_previous(output: &Path) -> anyhow::Result<()> {
    let mut paths = vec![output.to_path_buf()];
    for suffix in ["-wal", "-shm", "-journal"] {
        let mut side = output.as_os_str().to_owned();
        side.push(suffix);
        paths.push(PathBuf::from(side));
    }
    for path in paths {
        match std::fs::remove_file(&path) {
            Ok(()) => info!(path = %path.display(), "Removed previous history store"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("removing {}", path.display()));
            }
        }
    }
    Ok(())
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error (and a non-zero exit status) if configuration, the
/// store, or the replay itself fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;
    init_tracing(&config.logging.level);

    let output = args.output_path();
    info!(
        log = %args.log.display(),
        output = %output.display(),
        commit_interval = config.replay.commit_interval,
        "rewind starting"
    );

    remove_previous(&output)?;
    let db = HistoryDb::open_file(&output, &config.database.sqlite())
        .await
        .with_context(|| format!("opening {}", output.display()))?;

    let result = replay_file(&args.log, &db, &config).await;
    db.close().await;
    let summary = result.with_context(|| format!("replaying {}", args.log.display()))?;

    info!(
        lines = summary.lines,
        clock = summary.final_clock.into_inner(),
        snapshots = summary.snapshots,
        flushes = summary.flushes,
        "history written"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn output_replaces_extension() {
        assert_eq!(
            default_output(Path::new("/tmp/run/trace.log")),
            PathBuf::from("/tmp/run/trace.sqlite")
        );
        assert_eq!(default_output(Path::new("trace")), PathBuf::from("trace.sqlite"));
    }

    #[test]
    fn flags_parse_and_override() {
        let args = Args::try_parse_from([
            "rewind",
            "trace.log",
            "--commit-interval",
            "10",
            "-o",
            "out.db",
        ])
        .unwrap();
        assert_eq!(args.output_path(), PathBuf::from("out.db"));
        let config = args.load_config().unwrap();
        assert_eq!(config.replay.commit_interval, 10);
    }

    #[test]
    fn log_path_is_required() {
        assert!(Args::try_parse_from(["rewind"]).is_err());
    }

    #[test]
    fn remove_previous_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("trace.sqlite");
        remove_previous(&output).unwrap();

        std::fs::write(&output, b"stale").unwrap();
        remove_previous(&output).unwrap();
        assert!(!output.exists());
    }
}
