/// Interactive reordering of the photo grid.
///
/// This module handles manual drag-and-drop of grid items:
/// - The drag state machine and order commit (engine.rs)
/// - The injected rendering surface abstraction (surface.rs)
///
/// The host forwards unified pointer/touch coordinates; mouse and touch
/// input are indistinguishable from here on.

pub mod engine;
pub mod surface;
