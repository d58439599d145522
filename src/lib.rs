//! Client-side interaction core for the photo board.
//!
//! Two independent subsystems share the same "optimistic local mutation,
//! eventual server reconciliation" pattern:
//! - `reorder`: manual drag-to-reorder of grid photos (state machine,
//!   spatial hit-testing, placeholder reflow, order commit)
//! - `pipeline`: pre-upload image preparation (thumbnail derivation and
//!   size-bounded re-encoding, run concurrently)
//!
//! Both talk to the host view runtime only through the `events` bridge:
//! fire-and-forget named events out, server-confirmed identifiers in.

pub mod events;
pub mod geometry;
pub mod pipeline;
pub mod reorder;

pub use events::HostBridge;
pub use pipeline::upload::{UploadFile, UploadPreparer};
pub use reorder::engine::ReorderEngine;
pub use reorder::surface::GridSurface;
