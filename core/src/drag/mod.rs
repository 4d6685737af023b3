//! Drag and drop
//!
//! The controller owns the gesture and its visual affordances; the resolver
//! decides what a drop means and performs the optimistic move.

mod controller;
mod resolver;

pub use controller::*;
pub use resolver::*;
