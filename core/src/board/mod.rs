//! Kanban board
//!
//! This module holds the board's cached state, its rendered view, the
//! events it broadcasts, and [`TaskBoard`], the session that ties the drag,
//! sync and deletion machinery to a remote store.

mod event;
mod state;
mod task_board;
mod view;

pub use event::*;
pub use state::*;
pub use task_board::*;
pub use view::*;
