//! End-to-end replay tests against an in-memory history database.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::arithmetic_side_effects
)]

use proptest::prelude::*;
use rewind_core::{ConsistencyError, ReplayConfig, ReplayError, ReplayState, replay, replay_file};
use rewind_db::{HistoryDb, HistoryReader};
use rewind_log::{Event, Mutation, PushFrame};
use rewind_types::{Clock, FrameId, ObjectId, SlotId, Value};

// =============================================================================
// Helpers
// =============================================================================

fn config() -> ReplayConfig {
    let mut config = ReplayConfig::default();
    config.replay.read_sources = false;
    config
}

async fn run(log: &str) -> (HistoryDb, Result<rewind_core::ReplaySummary, ReplayError>) {
    let db = HistoryDb::in_memory().await.expect("in-memory SQLite");
    let result = replay(log.as_bytes(), &db, &config()).await;
    (db, result)
}

async fn data_as_of(db: &HistoryDb, slot: u64, clock: u64) -> Option<String> {
    HistoryReader::new(db)
        .read_data_as_of(SlotId(slot), Clock(clock))
        .await
        .unwrap()
}

const MODULE: &str = r#"PUSH_FRAME("prog.py", "<module>", *1000, *1000, 0, 0)"#;

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn list_history_is_versioned_per_mutation() {
    let log = format!("{MODULE}\nNEW_LIST(10, 1)\nLIST_APPEND(10, 2)\nVISIT(5)\n");
    let (db, result) = run(&log).await;
    let summary = result.unwrap();
    assert_eq!(summary.final_clock, Clock(3));

    let reader = HistoryReader::new(&db);
    let versions = reader.heap_versions(SlotId(10)).await.unwrap();
    let clocks: Vec<u64> = versions.iter().map(|v| v.clock.0).collect();
    assert_eq!(clocks, vec![2, 3]);

    let snapshots = reader.snapshots().await.unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].clock, Clock(3));
    assert_eq!(snapshots[0].line_no, 5);

    assert_eq!(data_as_of(&db, 10, 2).await.as_deref(), Some("[1]"));
    assert_eq!(data_as_of(&db, 10, 3).await.as_deref(), Some("[1, 2]"));
    assert_eq!(data_as_of(&db, 10, 1).await, None);
}

#[tokio::test]
async fn list_history_without_module_frame() {
    // The bare three-line log: clocks 1 and 2, and no snapshot because the
    // module frame was never entered.
    let (db, result) = run("NEW_LIST(10,1)\nLIST_APPEND(10,2)\nVISIT(5)\n").await;
    result.unwrap();
    assert_eq!(data_as_of(&db, 10, 1).await.as_deref(), Some("[1]"));
    assert_eq!(data_as_of(&db, 10, 2).await.as_deref(), Some("[1, 2]"));
    assert!(HistoryReader::new(&db).snapshots().await.unwrap().is_empty());
}

#[tokio::test]
async fn mismatched_pop_is_fatal_and_records_nothing() {
    let log = format!(
        "{MODULE}\n{}\nPOP_FRAME(\"prog.py\", \"wrong_name\")\nVISIT(3)\n",
        r#"PUSH_FRAME("prog.py", "f", *1000, *2000, 0, 0)"#
    );
    let (db, result) = run(&log).await;
    let err = result.unwrap_err();

    let ReplayError::AtLine { line_no, .. } = &err else {
        panic!("expected line context, got {err:?}");
    };
    assert_eq!(*line_no, 3);
    assert!(matches!(
        err.root(),
        ReplayError::Consistency(ConsistencyError::FrameMismatch { .. })
    ));
    assert!(HistoryReader::new(&db).snapshots().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_dicts_share_the_canonical_object() {
    let (db, result) = run("NEW_DICT(7, )\nNEW_DICT(8, )\n").await;
    result.unwrap();
    let reader = HistoryReader::new(&db);
    let a = reader.read_as_of(SlotId(7), Clock(1)).await.unwrap();
    let b = reader.read_as_of(SlotId(8), Clock(2)).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a, Some(ObjectId(2)));
    assert_eq!(reader.object_count().await.unwrap(), 3);
}

#[tokio::test]
async fn dict_versions_are_copy_on_write() {
    let (db, result) = run("DICT_STORE_SUBSCRIPT(20,\"a\",1)\nDICT_STORE_SUBSCRIPT(20,\"b\",2)\n").await;
    result.unwrap();
    assert_eq!(data_as_of(&db, 20, 1).await.as_deref(), Some(r#"{"a": 1}"#));
    assert_eq!(
        data_as_of(&db, 20, 2).await.as_deref(),
        Some(r#"{"a": 1, "b": 2}"#)
    );

    let reader = HistoryReader::new(&db);
    let first = reader.read_as_of(SlotId(20), Clock(1)).await.unwrap().unwrap();
    assert_eq!(
        reader.object_data(first).await.unwrap().as_deref(),
        Some(r#"{"a": 1}"#)
    );
}

#[tokio::test]
async fn comment_lines_advance_nothing() {
    let (_db, result) = run("-- NEW_LIST(10, 1)\n").await;
    let summary = result.unwrap();
    assert_eq!(summary.lines, 1);
    assert_eq!(summary.events, 0);
    assert_eq!(summary.final_clock, Clock::ZERO);
}

#[tokio::test]
async fn resumed_generator_records_under_one_frame() {
    let log = format!(
        "{MODULE}\n{generator}\nYIELD_VALUE(0, 2)\nPOP_FRAME(\"prog.py\", \"gen\")\nVISIT(4)\n\
         {generator}\nSTORE_FAST(0, 1)\nYIELD_VALUE(1, 2)\nPOP_FRAME(\"prog.py\", \"gen\")\n",
        generator = r#"PUSH_FRAME("prog.py", "gen", *1000, *3000, 1, "i", 1, 0)"#
    );
    let (db, result) = run(&log).await;
    assert_eq!(result.unwrap().snapshots, 3);

    let reader = HistoryReader::new(&db);
    let snapshots = reader.snapshots().await.unwrap();
    let yields: Vec<FrameId> = snapshots
        .iter()
        .filter(|s| s.line_no == 2)
        .map(|s| s.frame)
        .collect();
    assert_eq!(yields, vec![FrameId(2), FrameId(2)]);
    assert!(reader.fun_call(FrameId(3)).await.unwrap().is_none());

    let last = snapshots.last().unwrap();
    assert_eq!(
        data_as_of(&db, 3000, last.clock.0).await.as_deref(),
        Some(r#"{"i": 1, "return value": 1}"#)
    );
}

#[tokio::test]
async fn numeric_members_match_across_types() {
    let log = "NEW_LIST(10, 1, 2)\nLIST_REMOVE(10, True)\nNEW_DICT(11, 1, \"a\", 1.0, \"b\")\n\
               NEW_SET(12, 1, True, 1.0)\n";
    let (db, result) = run(log).await;
    let clock = result.unwrap().final_clock.0;
    assert_eq!(data_as_of(&db, 10, clock).await.as_deref(), Some("[2]"));
    assert_eq!(data_as_of(&db, 11, clock).await.as_deref(), Some(r#"{1: "b"}"#));
    assert_eq!(data_as_of(&db, 12, clock).await.as_deref(), Some("[1]"));
}

// =============================================================================
// Properties
// =============================================================================

const PROGRAM: &str = r#"-- recorded trace
PUSH_FRAME("prog.py", "<module>", *1000, *1000, 0, 0)
VISIT(1)
NEW_LIST(10, 3, 1, 2)
STORE_NAME("xs", *10)
VISIT(2)
LIST_SORT(10, 1, 2, 3)
PUSH_FRAME("prog.py", "total", *1000, *2000, 2, "items", "acc", 1, *10)
VISIT(5)
STORE_FAST(1, 0)
STORE_FAST(1, 6)
RETURN_VALUE(6, 7)
POP_FRAME("prog.py", "total")
STORE_NAME("t", 6)
NEW_OBJECT(30, *40)
STORE_ATTR(30, "label", "sum")
NEW_SET(31, 1, 1, 2)
SET_DISCARD(31, 1)
EXCEPTION(9, "ValueError: nope")
JUMP_FORWARD(2)
VISIT(10)
POP_FRAME("prog.py", "<module>")
"#;

#[tokio::test]
async fn full_program_replays_cleanly() {
    let (db, result) = run(PROGRAM).await;
    let summary = result.unwrap();
    assert_eq!(summary.unknown_events, 1);
    assert_eq!(summary.snapshots, 6);

    let reader = HistoryReader::new(&db);

    // Gap-free clock: every value 1..=k used exactly once.
    let versions = reader.all_heap_versions().await.unwrap();
    let clocks: Vec<u64> = versions.iter().map(|v| v.clock.0).collect();
    let expected: Vec<u64> = (1..=summary.final_clock.0).collect();
    assert_eq!(clocks, expected);

    // The return value is visible in the callee's locals at the return snapshot.
    let snapshots = reader.snapshots().await.unwrap();
    let ret = snapshots.iter().find(|s| s.line_no == 7).unwrap();
    let locals = data_as_of(&db, 2000, ret.clock.0).await.unwrap();
    assert_eq!(locals, r#"{"items": *10, "acc": 6, "return value": 6}"#);

    // Stack reconstruction from the callee's snapshot.
    let stack = reader.call_stack(ret.frame).await.unwrap();
    let names: Vec<&str> = stack.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["total", "<module>"]);

    // The exception snapshot links its message.
    let failing = snapshots.iter().find(|s| s.error.is_some()).unwrap();
    let error = reader.error(failing.error.unwrap()).await.unwrap().unwrap();
    assert_eq!(error.message, "ValueError: nope");

    // Instances persist their attribute bag as a nested object.
    let instance = data_as_of(&db, 30, summary.final_clock.0).await.unwrap();
    assert!(instance.starts_with(r#"{"__type__": *40, "__dict__": ^"#));
    assert_eq!(data_as_of(&db, 31, summary.final_clock.0).await.as_deref(), Some("[2]"));
}

#[tokio::test]
async fn replay_is_deterministic() {
    let (db_a, a) = run(PROGRAM).await;
    let (db_b, b) = run(PROGRAM).await;
    assert_eq!(a.unwrap(), b.unwrap());

    let ra = HistoryReader::new(&db_a);
    let rb = HistoryReader::new(&db_b);
    assert_eq!(
        ra.all_heap_versions().await.unwrap(),
        rb.all_heap_versions().await.unwrap()
    );
    let count = ra.object_count().await.unwrap();
    assert_eq!(count, rb.object_count().await.unwrap());
    for id in 1..=count {
        assert_eq!(
            ra.object_data(ObjectId(id)).await.unwrap(),
            rb.object_data(ObjectId(id)).await.unwrap()
        );
    }
}

#[tokio::test]
async fn small_commit_interval_gives_same_history() {
    let db = HistoryDb::in_memory().await.unwrap();
    let mut cfg = config();
    cfg.replay.commit_interval = 2;
    let summary = replay(PROGRAM.as_bytes(), &db, &cfg).await.unwrap();
    assert!(summary.flushes >= 10);

    let (reference, _) = run(PROGRAM).await;
    assert_eq!(
        HistoryReader::new(&db).all_heap_versions().await.unwrap(),
        HistoryReader::new(&reference).all_heap_versions().await.unwrap()
    );
}

#[tokio::test]
async fn committed_batches_survive_a_later_failure() {
    let db = HistoryDb::in_memory().await.unwrap();
    let mut cfg = config();
    cfg.replay.commit_interval = 1;
    let log = "NEW_LIST(10, 1)\nLIST_REMOVE(10, 5)\n";
    let err = replay(log.as_bytes(), &db, &cfg).await.unwrap_err();
    assert!(matches!(
        err.root(),
        ReplayError::Consistency(ConsistencyError::AbsentMember { .. })
    ));
    assert_eq!(data_as_of(&db, 10, 1).await.as_deref(), Some("[1]"));
}

#[tokio::test]
async fn format_errors_carry_line_context() {
    let (_db, result) = run("NEW_LIST(10, 1)\nNEW_LIST(11, ?)\n").await;
    let err = result.unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("line 2:"), "{message}");
    assert!(matches!(err.root(), ReplayError::Format(_)));
}

#[tokio::test]
async fn replay_file_records_run() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("trace.log");
    std::fs::write(&log, PROGRAM).unwrap();

    let db = HistoryDb::connect_url("sqlite::memory:", &rewind_db::SqliteConfig::default())
        .await
        .unwrap();
    let summary = replay_file(&log, &db, &config()).await.unwrap();

    let run = HistoryReader::new(&db).latest_run().await.unwrap().unwrap();
    assert_eq!(run.lines, summary.lines);
    assert_eq!(run.final_clock, summary.final_clock);
    assert!(run.finished_at >= run.started_at);
}

// =============================================================================
// Property-based MVCC check
// =============================================================================

fn apply(state: &mut ReplayState, slot: u64, value: i64) {
    state
        .apply(Event::Mutation(Mutation::ListAppend {
            slot: SlotId(slot),
            value: Value::Integer(value),
        }))
        .unwrap();
}

proptest! {
    #[test]
    fn read_as_of_matches_last_write(writes in prop::collection::vec((0_u64..4, -50_i64..50), 1..40)) {
        let mut state = ReplayState::new(config().replay);
        // Model: every (slot, clock, object) version row, in commit order.
        let mut written: Vec<(u64, u64, ObjectId)> = Vec::new();
        for (i, (slot, value)) in writes.iter().enumerate() {
            apply(&mut state, *slot, *value);
            let clock = u64::try_from(i).unwrap() + 1;
            prop_assert_eq!(state.clock(), Clock(clock));
            let rows = state.take_pending().heap_versions;
            prop_assert_eq!(rows.len(), 1);
            let row = &rows[0];
            prop_assert_eq!((row.slot, row.clock), (SlotId(*slot), Clock(clock)));
            written.push((*slot, clock, row.object));
        }
        let final_clock = state.clock().0;
        for slot in 0_u64..4 {
            for v in 0..=final_clock {
                let expected = written
                    .iter()
                    .filter(|(s, c, _)| *s == slot && *c <= v)
                    .max_by_key(|(_, c, _)| *c)
                    .map(|(_, _, object)| *object);
                prop_assert_eq!(state.read_as_of(SlotId(slot), Clock(v)), expected);
            }
        }
    }
}

#[test]
fn frame_ids_are_sequential() {
    let mut state = ReplayState::new(config().replay);
    for (n, name) in ["<module>", "f", "g"].into_iter().enumerate() {
        let id = state
            .push_frame(PushFrame {
                file: "prog.py".to_owned(),
                name: name.to_owned(),
                globals: SlotId(1),
                locals: SlotId(100),
                local_names: Vec::new(),
                local_values: Vec::new(),
                cell_vars: Vec::new(),
                free_vars: Vec::new(),
            })
            .unwrap();
        assert_eq!(id, FrameId(u64::try_from(n).unwrap() + 1));
    }
    assert_eq!(state.frame_count(), 3);
}
