//! The ingestion driver: read, tokenize, decode, apply, flush.
//!
//! ```text
//! log line --> parse_line --> Event::decode --> ReplayState::apply
//!                                                    |
//!                          every N lines: HistoryBatch::flush (1 txn)
//! ```
//!
//! Processing is strictly sequential. The only awaits are line reads and
//! batch commits. A fatal error stops ingestion immediately; batches
//! committed before it remain in the store.

use std::path::Path;

use chrono::Utc;
use rewind_db::{HistoryDb, ReplayRun, RunStore};
use rewind_log::{Decoded, Event, parse_line};
use rewind_types::Clock;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::config::ReplayConfig;
use crate::error::ReplayError;
use crate::state::ReplayState;

/// Counters describing a completed replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaySummary {
    /// Lines read, including blanks and comments.
    pub lines: u64,
    /// Events applied.
    pub events: u64,
    /// Events skipped because their command was not recognised.
    pub unknown_events: u64,
    /// The last clock value consumed.
    pub final_clock: Clock,
    /// Snapshots recorded.
    pub snapshots: u64,
    /// Batches committed.
    pub flushes: u64,
}

/// Replay an event log from `reader` into `db`.
///
/// The database must already have its schema applied.
///
/// # Errors
///
/// Returns [`ReplayError::AtLine`] wrapping the first fatal format,
/// consistency, or persistence error, or [`ReplayError::Io`] if the log
/// cannot be read.
pub async fn replay<R>(
    reader: R,
    db: &HistoryDb,
    config: &ReplayConfig,
) -> Result<ReplaySummary, ReplayError>
where
    R: AsyncBufRead + Unpin,
{
    let interval = config.replay.commit_interval.max(1);
    let mut state = ReplayState::new(config.replay.clone());
    let mut summary = ReplaySummary::default();
    let mut since_flush = 0_usize;
    let mut line_no = 0_usize;
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        line_no = line_no.saturating_add(1);
        summary.lines = summary.lines.saturating_add(1);

        match process_line(&mut state, &line, line_no) {
            Ok(Some(true)) => summary.events = summary.events.saturating_add(1),
            Ok(Some(false)) => summary.unknown_events = summary.unknown_events.saturating_add(1),
            Ok(None) => {}
            Err(e) => return Err(ReplayError::at_line(line_no, &line, e)),
        }

        since_flush = since_flush.saturating_add(1);
        if since_flush >= interval {
            state
                .take_pending()
                .flush(db)
                .await
                .map_err(|e| ReplayError::at_line(line_no, &line, e))?;
            summary.flushes = summary.flushes.saturating_add(1);
            since_flush = 0;
        }
    }

    let mut last = state.take_pending();
    if !last.is_empty() {
        last.flush(db).await?;
        summary.flushes = summary.flushes.saturating_add(1);
    }

    summary.final_clock = state.clock();
    summary.snapshots = state.snapshot_count();

    tracing::info!(
        lines = summary.lines,
        events = summary.events,
        unknown_events = summary.unknown_events,
        clock = summary.final_clock.0,
        snapshots = summary.snapshots,
        "Replay complete"
    );

    Ok(summary)
}

/// Handle one line. `Some(true)` if an event was applied, `Some(false)` if
/// an unknown event was skipped, `None` for blanks and comments.
fn process_line(
    state: &mut ReplayState,
    line: &str,
    line_no: usize,
) -> Result<Option<bool>, ReplayError> {
    let Some(raw) = parse_line(line, line_no)? else {
        return Ok(None);
    };
    match Event::decode(raw)? {
        Decoded::Event(event) => {
            state.apply(event)?;
            Ok(Some(true))
        }
        Decoded::Unknown(name) => {
            tracing::warn!(line_no, event = name.as_str(), "Unknown event skipped");
            Ok(Some(false))
        }
    }
}

/// Replay the log file at `log_path` into `db`, applying the schema first
/// and recording the run in `replay_runs` when it succeeds.
///
/// # Errors
///
/// Returns [`ReplayError`] if the log cannot be opened or replay fails.
pub async fn replay_file(
    log_path: &Path,
    db: &HistoryDb,
    config: &ReplayConfig,
) -> Result<ReplaySummary, ReplayError> {
    let started_at = Utc::now();
    db.run_migrations().await?;

    let file = tokio::fs::File::open(log_path).await?;
    tracing::info!(log = %log_path.display(), "Replaying event log");
    let summary = replay(BufReader::new(file), db, config).await?;

    RunStore::new(db.pool())
        .insert(&ReplayRun {
            log_path: log_path.display().to_string(),
            started_at,
            finished_at: Utc::now(),
            lines: summary.lines,
            final_clock: summary.final_clock,
        })
        .await?;

    Ok(summary)
}
