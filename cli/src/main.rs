//! Terminal front end for the task board
//!
//! Each invocation loads the board, performs one interaction through the
//! same engine a graphical host would drive, and prints the notices the
//! board raised along the way.

mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use board_core::board::{Layout, StackLayout};
use board_core::drag::{DropEvent, DropOutcome};
use board_core::store::{HttpTaskStore, InMemoryTaskStore, TaskStore};
use board_core::task::{CollabListId, Task, TaskId, TaskPriority, TaskStatus};
use board_core::{BoardConfig, BoardEvent, Lane, TaskBoard};

#[derive(Parser, Debug)]
#[command(name = "taskboard", about = "Kanban board client for a remote task store")]
struct Cli {
    /// Base URL of the task store
    #[arg(long, env = "TASKBOARD_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Shared list to work in (personal list when omitted)
    #[arg(long, global = true)]
    list: Option<CollabListId>,

    /// Use a built-in demo store instead of the network
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the three lanes
    Show,
    /// Add a task to the backlog
    Add {
        /// Task title
        title: String,
        /// Priority (low, medium, high)
        #[arg(short, long, default_value = "medium", value_parser = parse_priority)]
        priority: TaskPriority,
        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<NaiveDate>,
    },
    /// Drag a task into a lane
    Move {
        /// Task ID
        task_id: String,
        /// Target lane (backlog, in-progress, completed)
        lane: String,
        /// Slot to drop into; appends when omitted
        #[arg(short, long)]
        position: Option<usize>,
    },
    /// Delete a task after the undo grace period
    Delete {
        /// Task ID
        task_id: String,
        /// Undo after this many seconds instead of letting the delete go through
        #[arg(long)]
        undo_after: Option<u64>,
    },
    /// Archive a completed task
    Archive {
        /// Task ID
        task_id: String,
    },
    /// Return an archived task to the board
    Unarchive {
        /// Task ID
        task_id: String,
    },
    /// List archived tasks
    Archived,
}

fn parse_priority(value: &str) -> Result<TaskPriority, String> {
    TaskPriority::parse(value).ok_or_else(|| format!("unknown priority '{value}'"))
}

fn demo_tasks() -> Vec<Task> {
    vec![
        Task::new(1u64, "Sketch the board layout").with_priority(TaskPriority::High),
        Task::new(2u64, "Wire up the task store"),
        Task::new(3u64, "Drag and drop").with_status(TaskStatus::InProgress),
        Task::new(4u64, "Project setup")
            .with_status(TaskStatus::Completed)
            .with_priority(TaskPriority::Low),
    ]
}

/// Print whatever the board has said since the last call
fn flush_events(rx: &mut broadcast::Receiver<BoardEvent>) {
    while let Ok(event) = rx.try_recv() {
        if let Some(line) = render::event(&event) {
            println!("{line}");
        }
    }
}

/// Pointer position that drops into `position` within `lane`
fn drop_point(layout: &dyn Layout, lane: Lane, position: Option<usize>) -> f64 {
    match position {
        Some(slot) => layout.bounds(lane, slot).top,
        None => f64::MAX,
    }
}

async fn move_task(
    board: &TaskBoard,
    layout: &StackLayout,
    task_id: &str,
    lane_id: &str,
    position: Option<usize>,
) -> anyhow::Result<()> {
    let Some(lane) = Lane::from_id(lane_id) else {
        bail!("unknown lane '{lane_id}' (expected backlog, in-progress or completed)");
    };
    let pointer_y = drop_point(layout, lane, position);

    board
        .start_drag(Some(task_id))
        .await
        .with_context(|| format!("cannot drag task {task_id}"))?;
    board.drag_over(lane.id(), pointer_y).await;
    let outcome = board
        .drop_card(DropEvent::new(lane, pointer_y, &TaskId::new(task_id)))
        .await;
    board.end_drag().await;

    match outcome {
        DropOutcome::Aborted(reason) => bail!("drop aborted: {reason:?}"),
        DropOutcome::Repositioned => println!("Task reordered within {}", lane.title()),
        DropOutcome::Synced(_) => {}
    }
    Ok(())
}

async fn delete_task(
    board: &TaskBoard,
    rx: &mut broadcast::Receiver<BoardEvent>,
    task_id: &str,
    undo_after: Option<u64>,
) -> anyhow::Result<()> {
    let id = TaskId::new(task_id);
    board.delete_task(&id).await?;

    if let Some(secs) = undo_after {
        sleep(Duration::from_secs(secs)).await;
        flush_events(rx);
        if !board.undo_delete(&id).await? {
            println!("Too late to undo task {id}");
        }
        return Ok(());
    }

    // Stay alive until the deletion is sent, or has failed.
    let wait = board.config().undo_grace() + board.config().request_timeout();
    let settled = timeout(wait, async {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(line) = render::event(&event) {
                        println!("{line}");
                    }
                    match event {
                        BoardEvent::DeletionCommitted { task_id } if task_id == id => break,
                        BoardEvent::Notice(notice) if notice.is_error() => break,
                        _ => {}
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
    .await;
    if settled.is_err() {
        bail!("deletion of task {id} did not settle in time");
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = BoardConfig::from_env().context("invalid TASKBOARD_* configuration")?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }

    let store: Arc<dyn TaskStore> = if cli.offline {
        tracing::info!("Using in-memory demo store");
        Arc::new(InMemoryTaskStore::with_tasks(demo_tasks()))
    } else {
        tracing::info!("Using task store at {}", config.base_url);
        Arc::new(HttpTaskStore::new(
            config.base_url.clone(),
            config.request_timeout(),
        )?)
    };

    let layout = config.layout.clone();
    let board = TaskBoard::new(store, config)?;
    let mut rx = board.subscribe();

    let loaded = match cli.list {
        Some(list) => board.set_scope(Some(list)).await,
        None => board.reload().await,
    };
    if loaded.is_err() {
        flush_events(&mut rx);
        bail!("could not load tasks");
    }

    let result = match cli.command.unwrap_or(Command::Show) {
        Command::Show => {
            print!("{}", render::board(&board.view().await));
            Ok(())
        }
        Command::Add {
            title,
            priority,
            due,
        } => board
            .add_task(&title, priority, due)
            .await
            .map_err(anyhow::Error::from),
        Command::Move {
            task_id,
            lane,
            position,
        } => move_task(&board, &layout, &task_id, &lane, position).await,
        Command::Delete {
            task_id,
            undo_after,
        } => delete_task(&board, &mut rx, &task_id, undo_after).await,
        Command::Archive { task_id } => board
            .archive_task(&TaskId::new(task_id))
            .await
            .map_err(anyhow::Error::from),
        Command::Unarchive { task_id } => board
            .unarchive_task(&TaskId::new(task_id))
            .await
            .map_err(anyhow::Error::from),
        Command::Archived => match board.load_archived().await {
            Ok(tasks) => {
                print!("{}", render::archived(&tasks));
                Ok(())
            }
            Err(err) => Err(err.into()),
        },
    };

    flush_events(&mut rx);
    let pending = board.pending_deletions().await;
    if !pending.is_empty() {
        print!("{}", render::pending(&pending));
    }
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "board_cli=info,board_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_move() {
        let cli = Cli::parse_from(["taskboard", "--list", "3", "move", "7", "completed", "-p", "1"]);
        assert_eq!(cli.list, Some(3));
        match cli.command {
            Some(Command::Move {
                task_id,
                lane,
                position,
            }) => {
                assert_eq!(task_id, "7");
                assert_eq!(lane, "completed");
                assert_eq!(position, Some(1));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_priority_and_due() {
        let cli = Cli::parse_from(["taskboard", "add", "Plan", "-p", "HIGH", "-d", "2025-03-01"]);
        match cli.command {
            Some(Command::Add { priority, due, .. }) => {
                assert_eq!(priority, TaskPriority::High);
                assert_eq!(due, NaiveDate::from_ymd_opt(2025, 3, 1));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["taskboard", "add", "x", "-p", "urgent"]).is_err());
    }

    #[test]
    fn test_drop_point_targets_slot_top() {
        let layout = StackLayout::default();
        assert_eq!(drop_point(&layout, Lane::Backlog, Some(0)), 0.0);
        assert_eq!(drop_point(&layout, Lane::Backlog, Some(2)), 176.0);
        assert_eq!(drop_point(&layout, Lane::Backlog, None), f64::MAX);
    }

    #[tokio::test]
    async fn test_offline_move_reorders_demo_board() {
        let store = Arc::new(InMemoryTaskStore::with_tasks(demo_tasks()));
        let board = TaskBoard::new(store, BoardConfig::default()).unwrap();
        board.reload().await.unwrap();

        move_task(&board, &StackLayout::default(), "2", "backlog", Some(0))
            .await
            .unwrap();
        assert_eq!(
            board.view().await.lane(Lane::Backlog).card_ids(),
            vec![TaskId::new("2"), TaskId::new("1")]
        );
    }
}
