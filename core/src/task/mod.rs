//! Task module
//!
//! This module contains the task record and its wire-level value types.

mod model;

pub use model::*;
