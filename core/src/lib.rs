//! Core library for the task board
//!
//! This crate contains the board's client-side logic, including:
//! - Task records and the remote task store
//! - Drag and drop with optimistic moves
//! - Status sync against the store
//! - Deletion with an undo grace period

pub mod board;
pub mod config;
pub mod deletion;
pub mod drag;
pub mod error;
pub mod store;
pub mod sync;
pub mod task;

pub use board::{BoardEvent, BoardView, Lane, Notice, NoticeLevel, TaskBoard};
pub use config::BoardConfig;
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
