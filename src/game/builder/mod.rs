//! Builder Module
//!
//! Player-facing build cursor on top of the placement engine.

pub mod cursor;

pub use cursor::{BuildAction, BuildCursor};
