//! Board session
//!
//! [`TaskBoard`] owns the cached state and the rendered view behind one
//! lock, and drives every interaction against the remote store. Handlers
//! never hold the lock across a remote call; after each call they re-read
//! whatever they need, because a reload may have rebuilt the view meanwhile.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::event::{BoardEvent, Notice};
use super::state::BoardState;
use super::view::{BoardView, Layout};
use crate::config::BoardConfig;
use crate::deletion::{DeletionScheduler, PendingDeletionInfo};
use crate::drag::{
    apply_drop, plan_drop, resolve_lane, AbortReason, DragController, DragSession, DropEvent,
    DropOutcome,
};
use crate::error::Error;
use crate::store::{ListQuery, TaskStore};
use crate::sync::SyncReconciler;
use crate::task::{CollabListId, NewTask, Task, TaskId, TaskPriority, TaskStatus};
use crate::Result;

struct BoardInner {
    state: BoardState,
    view: BoardView,
    drag: DragController,
    deletions: DeletionScheduler,
    scope: Option<CollabListId>,
    loading: u32,
}

impl BoardInner {
    /// Rebuild the view from the cache, keeping pending deletions hidden
    fn render(&mut self) -> u64 {
        let hidden = self.deletions.hidden_ids();
        let generation = self.view.render(&self.state, &hidden);
        self.drag.reapply(&mut self.view);
        generation
    }

    /// Cached task, unless it is waiting out a deletion
    fn live_task(&self, id: &TaskId) -> Option<&Task> {
        if self.deletions.contains(id) {
            return None;
        }
        self.state.get(id)
    }
}

/// A live board bound to a remote task store
#[derive(Clone)]
pub struct TaskBoard {
    inner: Arc<Mutex<BoardInner>>,
    store: Arc<dyn TaskStore>,
    reconciler: SyncReconciler,
    layout: Arc<dyn Layout>,
    config: Arc<BoardConfig>,
    events: broadcast::Sender<BoardEvent>,
}

impl TaskBoard {
    /// Create a board; nothing is loaded until [`reload`](Self::reload)
    pub fn new(store: Arc<dyn TaskStore>, config: BoardConfig) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(256);
        let layout: Arc<dyn Layout> = Arc::new(config.layout.clone());

        Ok(Self {
            inner: Arc::new(Mutex::new(BoardInner {
                state: BoardState::new(),
                view: BoardView::new(),
                drag: DragController::new(),
                deletions: DeletionScheduler::new(config.max_pending_deletions),
                scope: None,
                loading: 0,
            })),
            reconciler: SyncReconciler::new(Arc::clone(&store)),
            store,
            layout,
            config: Arc::new(config),
            events,
        })
    }

    /// Replace the geometry used for drop resolution
    pub fn with_layout(mut self, layout: Arc<dyn Layout>) -> Self {
        self.layout = layout;
        self
    }

    /// Subscribe to board events
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    fn emit(&self, event: BoardEvent) {
        let _ = self.events.send(event);
    }

    fn notify(&self, notice: Notice) {
        debug!(level = ?notice.level, message = %notice.message, "notice");
        self.emit(BoardEvent::Notice(notice));
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Current rendered view
    pub async fn view(&self) -> BoardView {
        self.inner.lock().await.view.clone()
    }

    /// Current cached state
    pub async fn state(&self) -> BoardState {
        self.inner.lock().await.state.clone()
    }

    pub async fn scope(&self) -> Option<CollabListId> {
        self.inner.lock().await.scope
    }

    /// True while any reload is in flight
    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.loading > 0
    }

    pub async fn drag_session(&self) -> Option<DragSession> {
        self.inner.lock().await.drag.session().cloned()
    }

    pub async fn pending_deletions(&self) -> Vec<PendingDeletionInfo> {
        self.inner.lock().await.deletions.snapshot()
    }

    /// Last archived listing, minus tasks awaiting deletion
    pub async fn archived(&self) -> Vec<Task> {
        let inner = self.inner.lock().await;
        inner
            .state
            .archived()
            .iter()
            .filter(|t| !inner.deletions.contains(&t.id))
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Replace the board with a fresh listing from the store.
    ///
    /// Returns the new render generation. On failure the previous state is
    /// kept and an error notice is shown.
    pub async fn reload(&self) -> Result<u64> {
        let scope = {
            let mut inner = self.inner.lock().await;
            inner.loading += 1;
            inner.scope
        };

        let listed = self.store.list_tasks(ListQuery::scoped(scope)).await;

        let mut inner = self.inner.lock().await;
        inner.loading = inner.loading.saturating_sub(1);
        match listed {
            Ok(tasks) => {
                if inner.scope != scope {
                    debug!("list scope changed during reload, discarding listing");
                    return Ok(inner.view.generation());
                }
                inner.state.replace(tasks);
                let generation = inner.render();
                drop(inner);
                debug!(generation, "board reloaded");
                self.emit(BoardEvent::Reloaded { generation });
                Ok(generation)
            }
            Err(err) => {
                drop(inner);
                warn!(error = %err, "failed to load tasks");
                self.notify(Notice::error("Failed to load tasks"));
                Err(err)
            }
        }
    }

    /// Reload and swallow the error; the failure notice is already out
    async fn resync(&self) {
        if let Err(err) = self.reload().await {
            debug!(error = %err, "resync failed, keeping previous board");
        }
    }

    /// Switch between the personal list (`None`) and a shared list
    pub async fn set_scope(&self, scope: Option<CollabListId>) -> Result<u64> {
        self.inner.lock().await.scope = scope;
        info!(?scope, "list scope changed");
        self.reload().await
    }

    /// Fetch the archived listing for the current scope
    pub async fn load_archived(&self) -> Result<Vec<Task>> {
        let scope = self.inner.lock().await.scope;
        match self.store.list_tasks(ListQuery::archived(scope)).await {
            Ok(tasks) => {
                {
                    let mut inner = self.inner.lock().await;
                    if inner.scope == scope {
                        inner.state.replace_archived(tasks);
                    }
                }
                let archived = self.archived().await;
                self.emit(BoardEvent::ArchivedLoaded {
                    count: archived.len(),
                });
                Ok(archived)
            }
            Err(err) => {
                warn!(error = %err, "failed to load archived tasks");
                self.notify(Notice::error("Failed to load archived tasks"));
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    /// Begin dragging the card for `task_id`
    pub async fn start_drag(&self, task_id: Option<&str>) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        if let Some(id) = task_id.map(TaskId::new) {
            if inner.deletions.contains(&id) {
                warn!(task_id = %id, "drag source is pending deletion, gesture suppressed");
                return Err(Error::TaskNotFound(id.to_string()));
            }
        }
        inner
            .drag
            .start(task_id, &inner.state, &mut inner.view)
            .map(|_| ())
    }

    /// Pointer is over a lane
    pub async fn drag_over(&self, lane_id: &str, pointer_y: f64) {
        let lane = resolve_lane(lane_id);
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        inner
            .drag
            .over(lane, pointer_y, &mut inner.view, self.layout.as_ref());
    }

    /// Pointer left a lane
    pub async fn drag_leave(&self, lane_id: &str, left_bounds: bool) {
        let lane = resolve_lane(lane_id);
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        inner.drag.leave(lane, left_bounds, &mut inner.view);
    }

    /// Gesture over, dropped or cancelled
    pub async fn end_drag(&self) {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        inner.drag.end(&mut inner.view);
    }

    /// Handle a drop: move the card, then sync a status change if any
    pub async fn drop_card(&self, event: DropEvent) -> DropOutcome {
        let plan = {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;

            let lane_view = inner.view.lane_mut(resolve_lane(&event.lane_id));
            lane_view.drag_over = false;
            lane_view.remove_placeholders();

            match plan_drop(
                &event,
                inner.drag.session(),
                &inner.state,
                &inner.view,
                self.layout.as_ref(),
            ) {
                Ok(plan) if inner.deletions.contains(&plan.task_id) => {
                    warn!(task_id = %plan.task_id, "dropped task is pending deletion, drop aborted");
                    return DropOutcome::Aborted(AbortReason::StaleCard(plan.task_id));
                }
                Ok(plan) => {
                    apply_drop(&plan, &mut inner.view);
                    plan
                }
                Err(reason) => {
                    warn!(?reason, lane_id = %event.lane_id, "drop aborted");
                    return DropOutcome::Aborted(reason);
                }
            }
        };

        if plan.is_reposition() {
            debug!(task_id = %plan.task_id, lane = %plan.target, "card repositioned");
            return DropOutcome::Repositioned;
        }

        info!(
            task_id = %plan.task_id,
            from = %plan.origin,
            to = %plan.target.status(),
            "task dropped into another lane"
        );
        let outcome = self
            .reconciler
            .commit_status(&plan.task_id, plan.target.status())
            .await;
        self.notify(outcome.notice(plan.target));
        self.resync().await;
        DropOutcome::Synced(outcome)
    }

    // ------------------------------------------------------------------
    // Task operations
    // ------------------------------------------------------------------

    /// Create a pending task in the current scope
    pub async fn add_task(
        &self,
        title: &str,
        priority: TaskPriority,
        due_date: Option<NaiveDate>,
    ) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            self.notify(Notice::error("Please enter a task title"));
            return Err(Error::InvalidInput("task title is empty".into()));
        }

        let new_task = NewTask {
            title: title.to_string(),
            priority,
            due_date,
            status: TaskStatus::Pending,
            collab_list_id: self.scope().await,
        };

        match self.store.create_task(new_task).await {
            Ok(_) => {
                self.notify(Notice::success("Task added!"));
                self.resync().await;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to add task");
                self.notify(Notice::error(
                    err.user_message("Failed to add task", "Error adding task"),
                ));
                Err(err)
            }
        }
    }

    /// Move a completed task to the archive
    pub async fn archive_task(&self, id: &TaskId) -> Result<()> {
        let status = self.inner.lock().await.live_task(id).map(|t| t.status);
        let Some(status) = status else {
            warn!(task_id = %id, "archive requested for unknown task");
            self.notify(Notice::error("Task not found"));
            return Err(Error::TaskNotFound(id.to_string()));
        };
        if status != TaskStatus::Completed {
            self.notify(Notice::error("Only completed tasks can be archived"));
            return Err(Error::InvalidInput(format!(
                "task {} is {}, not completed",
                id, status
            )));
        }

        match self.store.archive_task(id).await {
            Ok(()) => {
                if let Some(card) = self.inner.lock().await.view.card_mut(id) {
                    card.fading = true;
                }
                self.spawn_fade(id.clone());
                self.notify(Notice::success("Task archived!"));
                self.resync().await;
                Ok(())
            }
            Err(err) => {
                warn!(task_id = %id, error = %err, "failed to archive task");
                self.notify(Notice::error(
                    err.user_message("Failed to archive task", "Error archiving task"),
                ));
                Err(err)
            }
        }
    }

    /// Return an archived task to its lane
    pub async fn unarchive_task(&self, id: &TaskId) -> Result<()> {
        match self.store.unarchive_task(id).await {
            Ok(()) => {
                self.notify(Notice::success("Task unarchived!"));
                self.resync().await;
                if let Err(err) = self.load_archived().await {
                    debug!(error = %err, "archived listing not refreshed");
                }
                Ok(())
            }
            Err(err) => {
                warn!(task_id = %id, error = %err, "failed to unarchive task");
                self.notify(Notice::error(
                    err.user_message("Failed to unarchive task", "Error unarchiving task"),
                ));
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Deletion with undo
    // ------------------------------------------------------------------

    /// Hide a task now and delete it remotely once the grace period ends
    pub async fn delete_task(&self, id: &TaskId) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let backup = inner
            .state
            .get(id)
            .or_else(|| inner.state.get_archived(id))
            .cloned();
        let Some(backup) = backup else {
            drop(guard);
            warn!(task_id = %id, "delete requested for unknown task");
            self.notify(Notice::error("Task not found"));
            return Err(Error::TaskNotFound(id.to_string()));
        };

        let countdown = self.config.countdown_start();
        let ticket = match inner.deletions.schedule(backup, countdown) {
            Ok(Some(ticket)) => ticket,
            Ok(None) => return Ok(()),
            Err(err) => {
                drop(guard);
                self.notify(Notice::error(err.user_message("", "")));
                return Err(err);
            }
        };

        if let Some(card) = inner.view.card_mut(id) {
            card.fading = true;
        }
        let timers = vec![
            self.spawn_commit_timer(id.clone(), ticket),
            self.spawn_countdown(id.clone(), ticket, countdown),
        ];
        inner.deletions.attach_timers(id, ticket, timers);
        drop(guard);

        self.spawn_fade(id.clone());
        self.emit(BoardEvent::Countdown {
            task_id: id.clone(),
            remaining: countdown,
        });
        info!(task_id = %id, %ticket, "task hidden, deletion pending");
        Ok(())
    }

    /// Cancel a pending deletion. Returns false if none was pending.
    pub async fn undo_delete(&self, id: &TaskId) -> Result<bool> {
        let restored = self.inner.lock().await.deletions.take_for_undo(id);
        let Some(backup) = restored else {
            debug!(task_id = %id, "nothing to undo");
            return Ok(false);
        };
        self.emit(BoardEvent::UndoHidden {
            task_id: id.clone(),
        });

        // The store never saw a delete, so a reload brings the task back.
        if let Err(err) = self.reload().await {
            debug!(error = %err, "reload after undo failed, restoring from cache");
            self.inner.lock().await.render();
        }
        self.notify(Notice::success("Task restored!"));
        info!(task_id = %id, title = %backup.title, "deletion undone");
        Ok(true)
    }

    /// Undo the most recent pending deletion
    pub async fn undo_latest(&self) -> Result<bool> {
        let latest = self.inner.lock().await.deletions.latest();
        match latest {
            Some(id) => self.undo_delete(&id).await,
            None => Ok(false),
        }
    }

    async fn commit_deletion(&self, id: &TaskId, ticket: Uuid) {
        let claimed = {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;
            let claimed = inner.deletions.take_for_commit(id, ticket);
            if claimed.is_some() {
                inner.state.remove(id);
                inner.view.remove_card(id);
            }
            claimed
        };
        let Some(backup) = claimed else {
            debug!(task_id = %id, %ticket, "deletion no longer pending");
            return;
        };

        match self.store.delete_task(id).await {
            Ok(()) => {
                info!(task_id = %id, title = %backup.title, "deletion committed");
                self.emit(BoardEvent::DeletionCommitted {
                    task_id: id.clone(),
                });
            }
            Err(err) => {
                warn!(task_id = %id, error = %err, "delete call failed");
                let message = if err.is_transport() {
                    "Error deleting task"
                } else {
                    "Delete failed"
                };
                self.notify(Notice::error(message));
            }
        }
    }

    fn spawn_commit_timer(&self, id: TaskId, ticket: Uuid) -> JoinHandle<()> {
        let board = self.clone();
        let grace = self.config.undo_grace();
        tokio::spawn(async move {
            sleep(grace).await;
            board.commit_deletion(&id, ticket).await;
        })
    }

    fn spawn_countdown(&self, id: TaskId, ticket: Uuid, start: u32) -> JoinHandle<()> {
        let board = self.clone();
        let tick = self.config.countdown_tick();
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + tick, tick);
            let mut remaining = start;
            while remaining > 0 {
                ticks.tick().await;
                remaining -= 1;
                board
                    .inner
                    .lock()
                    .await
                    .deletions
                    .record_tick(&id, ticket, remaining);
                board.emit(BoardEvent::Countdown {
                    task_id: id.clone(),
                    remaining,
                });
            }
            board.emit(BoardEvent::UndoHidden { task_id: id });
        })
    }

    /// Physically drop a fading card once its transition has run
    fn spawn_fade(&self, id: TaskId) {
        let board = self.clone();
        let fade = self.config.fade();
        tokio::spawn(async move {
            sleep(fade).await;
            let mut inner = board.inner.lock().await;
            if inner.view.card(&id).is_some_and(|c| c.fading) {
                inner.view.remove_card(&id);
            }
        });
    }
}
