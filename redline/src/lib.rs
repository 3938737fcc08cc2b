//! redline — suggestion-anchored review orchestration.
//!
//! Async layer over [`redline_core`]: the recalculation service that keeps
//! suggestion anchors correct across edits, the Edit ↔ Review transition
//! sequencer with debounce/single-flight/progress reporting, the editor
//! session owning cursor timing, and the trait boundary behind which the
//! host application supplies auth and the analysis backend.
//!
//! One `ModeTransitionManager` + `EditorSession` pair is constructed per
//! open document — there is no process-wide shared state, so multiple
//! documents (and tests) never interfere.

pub mod cancel;
pub mod config;
pub mod event;
pub mod remote;
pub mod retry;
pub mod service;
pub mod session;
pub mod transition;
