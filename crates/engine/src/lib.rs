//! Resource lifecycle for the globe engine.
//!
//! [`GlobeEngine`] owns everything built for one mounted container: the
//! scene, its assets, the render surface, the camera, the listeners it
//! registered with the [`Host`], and the animation scheduler.
//!
//! # Invariants
//! - Initialization fails before any listener or frame callback is
//!   registered, so a failed engine leaves nothing behind.
//! - Teardown order is fixed: listeners, scheduler, surface detach, resource
//!   release.
//! - After disposal every event, frame and resize is a silent no-op.

mod host;
mod lifecycle;

pub use host::{EngineError, Host, HostEvent, ListenerKind};
pub use lifecycle::{EnginePhase, GlobeEngine};
