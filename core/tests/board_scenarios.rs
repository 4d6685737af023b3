//! End-to-end board behaviour against the in-memory store

use std::sync::Arc;
use std::time::Duration;

use board_core::drag::{DropEvent, DropOutcome};
use board_core::store::{InMemoryTaskStore, StoreCall};
use board_core::sync::SyncOutcome;
use board_core::task::{Task, TaskId, TaskStatus};
use board_core::{BoardConfig, BoardEvent, Lane, Notice, TaskBoard};
use tokio::sync::broadcast;
use tokio::time::sleep;

async fn open(store: Arc<InMemoryTaskStore>) -> TaskBoard {
    let board = TaskBoard::new(store, BoardConfig::default()).unwrap();
    board.reload().await.unwrap();
    board
}

fn drain(rx: &mut broadcast::Receiver<BoardEvent>) -> Vec<BoardEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn countdown_of(events: &[BoardEvent], id: &TaskId) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            BoardEvent::Countdown { task_id, remaining } if task_id == id => Some(*remaining),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_drop_between_cards_moves_and_syncs() {
    let store = Arc::new(
        InMemoryTaskStore::with_tasks([
            Task::new(1u64, "A"),
            Task::new(2u64, "B").with_status(TaskStatus::InProgress),
            Task::new(3u64, "C").with_status(TaskStatus::InProgress),
        ])
        .with_latency(Duration::from_millis(100)),
    );
    let board = open(store.clone()).await;
    let a = TaskId::new("1");

    board.start_drag(Some("1")).await.unwrap();
    board.drag_over("in-progress", 100.0).await;
    assert!(board.view().await.lane(Lane::InProgress).has_placeholder());

    let dropping = {
        let board = board.clone();
        let event = DropEvent::new(Lane::InProgress, 100.0, &a);
        tokio::spawn(async move { board.drop_card(event).await })
    };
    sleep(Duration::from_millis(50)).await;

    // Optimistic placement while the update is in flight.
    assert_eq!(
        board.view().await.lane(Lane::InProgress).card_ids(),
        vec![TaskId::new("2"), a.clone(), TaskId::new("3")]
    );

    let outcome = dropping.await.unwrap();
    board.end_drag().await;

    assert_eq!(outcome, DropOutcome::Synced(SyncOutcome::Confirmed));
    assert_eq!(
        store.status_calls().await,
        vec![(a.clone(), TaskStatus::InProgress)]
    );
    let view = board.view().await;
    assert_eq!(view.lane_of(&a), Some(Lane::InProgress));
    assert!(!view.has_drag_residue());
    assert_eq!(board.state().await.get(&a).unwrap().status, TaskStatus::InProgress);
}

#[tokio::test]
async fn test_cancelled_drag_leaves_no_residue() {
    let store = Arc::new(InMemoryTaskStore::with_tasks([
        Task::new(1u64, "A"),
        Task::new(2u64, "B").with_status(TaskStatus::Completed),
    ]));
    let board = open(store.clone()).await;

    board.start_drag(Some("1")).await.unwrap();
    board.drag_over("in-progress", 10.0).await;
    board.drag_over("completed", 10.0).await;
    board.drag_leave("completed", false).await;
    board.end_drag().await;
    board.end_drag().await;

    let view = board.view().await;
    assert!(!view.has_drag_residue());
    assert!(view.lane(Lane::InProgress).empty_state_visible());
    assert!(store.status_calls().await.is_empty());
    assert!(board.drag_session().await.is_none());
}

#[tokio::test]
async fn test_drop_onto_unknown_lane_targets_backlog() {
    let store = Arc::new(InMemoryTaskStore::with_tasks([
        Task::new(1u64, "A").with_status(TaskStatus::Completed),
    ]));
    let board = open(store.clone()).await;

    board.start_drag(Some("1")).await.unwrap();
    let outcome = board
        .drop_card(DropEvent {
            lane_id: "sidebar".into(),
            pointer_y: 0.0,
            transfer_id: Some("1".into()),
        })
        .await;
    board.end_drag().await;

    assert_eq!(outcome, DropOutcome::Synced(SyncOutcome::Confirmed));
    assert_eq!(
        store.status_calls().await,
        vec![(TaskId::new("1"), TaskStatus::Pending)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_undo_within_grace_sends_no_delete() {
    let store = Arc::new(InMemoryTaskStore::with_tasks([
        Task::new(1u64, "X"),
        Task::new(2u64, "Y"),
    ]));
    let board = open(store.clone()).await;
    let mut rx = board.subscribe();
    let x = TaskId::new("1");

    board.delete_task(&x).await.unwrap();
    sleep(Duration::from_millis(2500)).await;
    assert!(board.view().await.card(&x).is_none());

    assert!(board.undo_delete(&x).await.unwrap());
    sleep(Duration::from_secs(10)).await;

    assert_eq!(store.delete_calls(&x).await, 0);
    assert!(store.get(&x).await.is_some());
    assert_eq!(board.view().await.lane_of(&x), Some(Lane::Backlog));
    assert!(board.pending_deletions().await.is_empty());

    let events = drain(&mut rx);
    assert_eq!(countdown_of(&events, &x), vec![5, 4, 3]);
    assert!(events.contains(&BoardEvent::Notice(Notice::success("Task restored!"))));
    assert!(!events
        .iter()
        .any(|e| matches!(e, BoardEvent::DeletionCommitted { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_deletion_commits_once_at_expiry() {
    let store = Arc::new(InMemoryTaskStore::with_tasks([Task::new(1u64, "X")]));
    let board = open(store.clone()).await;
    let mut rx = board.subscribe();
    let x = TaskId::new("1");

    board.delete_task(&x).await.unwrap();
    sleep(Duration::from_millis(4900)).await;
    assert_eq!(store.delete_calls(&x).await, 0);
    assert_eq!(board.pending_deletions().await[0].remaining, 1);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(store.delete_calls(&x).await, 1);
    assert!(!board.undo_delete(&x).await.unwrap());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(store.delete_calls(&x).await, 1);
    assert!(board.state().await.get(&x).is_none());

    let events = drain(&mut rx);
    assert_eq!(countdown_of(&events, &x), vec![5, 4, 3, 2, 1, 0]);
    assert!(events.contains(&BoardEvent::UndoHidden { task_id: x.clone() }));
    assert!(events.contains(&BoardEvent::DeletionCommitted { task_id: x }));
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_deletions_are_independent() {
    let store = Arc::new(InMemoryTaskStore::with_tasks([
        Task::new(1u64, "X"),
        Task::new(2u64, "Y"),
        Task::new(3u64, "Z"),
    ]));
    let board = open(store.clone()).await;

    board.delete_task(&TaskId::new("1")).await.unwrap();
    sleep(Duration::from_secs(1)).await;
    board.delete_task(&TaskId::new("2")).await.unwrap();
    assert_eq!(board.pending_deletions().await.len(), 2);

    board.undo_delete(&TaskId::new("1")).await.unwrap();
    sleep(Duration::from_secs(6)).await;

    assert_eq!(store.delete_calls(&TaskId::new("1")).await, 0);
    assert_eq!(store.delete_calls(&TaskId::new("2")).await, 1);
    assert_eq!(
        board.view().await.lane(Lane::Backlog).card_ids(),
        vec![TaskId::new("1"), TaskId::new("3")]
    );
}

#[tokio::test]
async fn test_archive_round_trip() {
    let store = Arc::new(InMemoryTaskStore::with_tasks([
        Task::new(1u64, "Done").with_status(TaskStatus::Completed),
        Task::new(2u64, "Open"),
    ]));
    let board = open(store.clone()).await;
    let done = TaskId::new("1");

    board.archive_task(&done).await.unwrap();
    assert!(board.view().await.card(&done).is_none());
    let archived = board.load_archived().await.unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id, done);

    board.unarchive_task(&done).await.unwrap();
    assert_eq!(board.view().await.lane_of(&done), Some(Lane::Completed));
    assert!(board.archived().await.is_empty());
    assert!(store
        .calls()
        .await
        .iter()
        .any(|c| matches!(c, StoreCall::Unarchive(id) if id == &done)));
}

#[tokio::test(start_paused = true)]
async fn test_stale_reload_during_drag_keeps_marker() {
    let store = Arc::new(InMemoryTaskStore::with_tasks([Task::new(1u64, "A")]));
    let board = open(store.clone()).await;

    board.start_drag(Some("1")).await.unwrap();
    board.reload().await.unwrap();
    assert!(board.view().await.card(&TaskId::new("1")).unwrap().dragging);

    // Another collaborator moved the task mid-gesture.
    store.set_status(&TaskId::new("1"), TaskStatus::Completed).await;
    board.reload().await.unwrap();
    board.end_drag().await;
    assert!(!board.view().await.has_drag_residue());
}
