//! Interaction controller: pointer positions become a rotation target.
//!
//! # Invariants
//! - Input only writes the target; it never rotates the globe directly.
//! - Malformed pointer events are dropped, never errors.

pub mod controller;
pub mod pointer;

pub use controller::InteractionController;
pub use pointer::{PointerSample, normalize};
