/// Client-side image preparation before upload.
///
/// This module handles everything that happens between the user picking a
/// file and the bytes leaving for the server:
/// - Raster helpers: the deterministic fit-within resize rule, thumbnail
///   derivation and size-bounded re-encoding (raster.rs)
/// - The per-input upload coordinator: concurrent derivation, the
///   strictly-smaller substitution rule, and the thumbnail confirmation
///   handshake (upload.rs)

pub mod raster;
pub mod upload;
