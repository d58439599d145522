/// Bridge between this crate and the host view runtime.
///
/// The host (a server-driven live view) supplies two primitives: pushing a
/// named event with a JSON payload to the server, and subscribing to named
/// events coming back from it. This crate only ever uses the first directly;
/// the subscribe side is wired by the host forwarding payloads into
/// [`crate::UploadPreparer::handle_host_event`].
use serde::{Deserialize, Serialize};

/// Order-commit event, emitted once per completed drag.
pub const REORDER: &str = "reorder";

/// Thumbnail-association event, emitted once per confirmed upload.
pub const SET_THUMBNAIL: &str = "set-thumbnail";

/// Inbound event carrying the server-assigned identifier of a durably
/// accepted upload.
pub const UPLOAD_CONFIRMED: &str = "upload-confirmed";

/// Outgoing channel to the host view runtime. Fire-and-forget: events are
/// pushed at most once per logical action and no reply is awaited.
pub trait HostBridge {
    fn emit(&self, event: &str, payload: serde_json::Value);
}

impl<B: HostBridge + ?Sized> HostBridge for &B {
    fn emit(&self, event: &str, payload: serde_json::Value) {
        (**self).emit(event, payload)
    }
}

impl<B: HostBridge + ?Sized> HostBridge for std::rc::Rc<B> {
    fn emit(&self, event: &str, payload: serde_json::Value) {
        (**self).emit(event, payload)
    }
}

/// Payload of the [`REORDER`] event: item identifiers in final visual order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderPayload {
    pub order: Vec<String>,
}

/// Payload of the [`SET_THUMBNAIL`] event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetThumbnailPayload {
    pub upload_id: String,
    /// Base64 JPEG data URL.
    pub thumbnail: String,
}

/// Payload of the inbound [`UPLOAD_CONFIRMED`] event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfirmedPayload {
    pub upload_id: String,
}

/// Serialize and push a typed payload. A payload that fails to serialize is
/// dropped with a warning; the bridge is fire-and-forget and has no error
/// path back to the interaction that produced the event.
pub fn emit<B: HostBridge + ?Sized, T: Serialize>(bridge: &B, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => bridge.emit(event, value),
        Err(e) => log::warn!("dropped '{}' event, payload failed to serialize: {}", event, e),
    }
}

#[cfg(test)]
pub(crate) struct RecordingBridge {
    pub events: std::cell::RefCell<Vec<(String, serde_json::Value)>>,
}

#[cfg(test)]
impl RecordingBridge {
    pub fn new() -> Self {
        Self {
            events: std::cell::RefCell::new(Vec::new()),
        }
    }

    pub fn named(&self, event: &str) -> Vec<serde_json::Value> {
        self.events
            .borrow()
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

#[cfg(test)]
impl HostBridge for RecordingBridge {
    fn emit(&self, event: &str, payload: serde_json::Value) {
        self.events
            .borrow_mut()
            .push((event.to_string(), payload));
    }
}
