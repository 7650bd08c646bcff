//! The editing side of the split view.
//!
//! [`EditorBuffer`] is a rope-backed text buffer with a single cursor. Every
//! mutation bumps its revision, and [`EditorBuffer::edit_signal`] turns the
//! current revision into an [`EditSignal`](crate::sync::EditSignal) for the
//! preview synchronizer.

mod buffer;

pub use buffer::{Cursor, Direction, EditorBuffer};
