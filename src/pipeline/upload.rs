/// The per-input upload coordinator.
///
/// When the user picks a file, the thumbnail and the size-bounded re-encode
/// are derived concurrently; once both settle, the re-encoded bytes replace
/// the original only if strictly smaller (re-encoding is a best-effort
/// optimization, never a correctness requirement). The thumbnail is then
/// retained until the host reports the server-assigned upload identifier,
/// at which point one thumbnail-association event goes out and the retained
/// thumbnail is cleared.
///
/// Selecting another file before that confirmation discards the earlier
/// thumbnail: last selection wins, nothing queues. An in-flight derivation
/// is never cancelled; a superseded one finishes and its result is dropped
/// on arrival.
use std::cell::RefCell;
use std::sync::Arc;

use tokio::task::spawn_blocking;

use super::raster::{self, RasterError, Thumbnail};
use crate::events::{self, HostBridge, SetThumbnailPayload, UploadConfirmedPayload};

/// Longer-side bound for thumbnails, matching the server's preview column.
pub const DEFAULT_THUMBNAIL_MAX_DIM: u32 = 600;

/// Longer-side bound for the uploaded image itself.
pub const DEFAULT_UPLOAD_MAX_DIM: u32 = 1200;

/// A file as handed over by the host's file input.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    /// Declared MIME type (e.g. "image/png").
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// What we know about the one selection currently awaiting server
/// confirmation. Superseded, not destroyed, by the next selection.
#[derive(Debug)]
struct PendingUpload {
    original: UploadFile,
    /// Consumed exactly once, on upload confirmation.
    thumbnail: Option<Thumbnail>,
    /// Present only when the re-encode came out strictly smaller.
    optimized: Option<UploadFile>,
}

impl PendingUpload {
    fn file(&self) -> &UploadFile {
        self.optimized.as_ref().unwrap_or(&self.original)
    }
}

struct PreparerState {
    generation: u64,
    pending: Option<PendingUpload>,
}

/// One preparer per active file input.
///
/// Interior mutability keeps `select_file` callable through `&self`, so a
/// second selection can start while an earlier derivation is still awaiting
/// its raster tasks; the generation counter decides whose result is still
/// current when it lands.
pub struct UploadPreparer<B: HostBridge> {
    bridge: B,
    thumbnail_max: u32,
    upload_max: u32,
    state: RefCell<PreparerState>,
}

impl<B: HostBridge> UploadPreparer<B> {
    pub fn new(bridge: B) -> Self {
        Self::with_limits(bridge, DEFAULT_THUMBNAIL_MAX_DIM, DEFAULT_UPLOAD_MAX_DIM)
    }

    pub fn with_limits(bridge: B, thumbnail_max: u32, upload_max: u32) -> Self {
        Self {
            bridge,
            thumbnail_max,
            upload_max,
            state: RefCell::new(PreparerState {
                generation: 0,
                pending: None,
            }),
        }
    }

    /// Prepare a freshly selected file and return what should actually be
    /// uploaded: the re-encoded bytes when strictly smaller, otherwise the
    /// original unchanged. Non-raster and GIF input passes through
    /// untouched with no thumbnail. Never fails.
    pub async fn select_file(&self, file: UploadFile) -> UploadFile {
        let generation = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            // last selection wins: any thumbnail still awaiting
            // confirmation is discarded right away
            state.pending = None;
            state.generation
        };

        let bytes: Arc<[u8]> = Arc::from(file.bytes.as_slice());
        let content_type = file.content_type.clone();
        let thumbnail_task = spawn_blocking({
            let bytes = bytes.clone();
            let content_type = content_type.clone();
            let max_dim = self.thumbnail_max;
            move || raster::derive_thumbnail(&content_type, &bytes, max_dim)
        });
        let reencode_task = spawn_blocking({
            let max_dim = self.upload_max;
            move || raster::reencode_for_upload(&content_type, &bytes, max_dim)
        });
        let (thumbnail, reencoded) = tokio::join!(thumbnail_task, reencode_task);
        let thumbnail = settle("thumbnail", &file.name, thumbnail);
        let reencoded = settle("re-encode", &file.name, reencoded);

        let optimized = match reencoded {
            Some(bytes) if bytes.len() < file.bytes.len() => {
                log::debug!(
                    "re-encoded '{}': {}KB -> {}KB",
                    file.name,
                    file.bytes.len() / 1024,
                    bytes.len() / 1024
                );
                Some(UploadFile {
                    name: file.name.clone(),
                    content_type: "image/jpeg".to_string(),
                    bytes,
                })
            }
            Some(_) => {
                log::debug!("re-encode of '{}' came out no smaller, keeping original", file.name);
                None
            }
            None => None,
        };
        let prepared = optimized.clone().unwrap_or_else(|| file.clone());

        let mut state = self.state.borrow_mut();
        if state.generation == generation {
            state.pending = Some(PendingUpload {
                original: file,
                thumbnail,
                optimized,
            });
        } else {
            log::debug!("discarding superseded preparation of '{}'", file.name);
        }
        prepared
    }

    /// The server confirmed the current upload and assigned it an
    /// identifier: emit the retained thumbnail, once. A no-op when nothing
    /// is retained (non-raster selection, already confirmed, or superseded).
    pub fn confirm_upload(&self, upload_id: &str) {
        let thumbnail = self
            .state
            .borrow_mut()
            .pending
            .as_mut()
            .and_then(|pending| pending.thumbnail.take());
        let Some(thumbnail) = thumbnail else {
            return;
        };
        events::emit(
            &self.bridge,
            events::SET_THUMBNAIL,
            &SetThumbnailPayload {
                upload_id: upload_id.to_string(),
                thumbnail: thumbnail.data_url,
            },
        );
    }

    /// Entry point for the host's subscribe wiring: forwards
    /// `upload-confirmed` payloads into [`Self::confirm_upload`]. Unknown
    /// events and malformed payloads are ignored.
    pub fn handle_host_event(&self, event: &str, payload: &serde_json::Value) {
        if event != events::UPLOAD_CONFIRMED {
            return;
        }
        match serde_json::from_value::<UploadConfirmedPayload>(payload.clone()) {
            Ok(confirmed) => self.confirm_upload(&confirmed.upload_id),
            Err(e) => log::warn!("ignoring malformed '{}' payload: {}", event, e),
        }
    }

    /// The file the current pending upload would send, if any.
    pub fn pending_file(&self) -> Option<UploadFile> {
        self.state
            .borrow()
            .pending
            .as_ref()
            .map(|pending| pending.file().clone())
    }

    /// Whether a thumbnail is retained, waiting for confirmation.
    pub fn has_pending_thumbnail(&self) -> bool {
        self.state
            .borrow()
            .pending
            .as_ref()
            .is_some_and(|pending| pending.thumbnail.is_some())
    }
}

/// Collapse a joined raster task into an optional result; both the
/// deliberate skips and real failures degrade to "use the unmodified
/// input".
fn settle<T>(
    what: &str,
    name: &str,
    joined: Result<Result<T, RasterError>, tokio::task::JoinError>,
) -> Option<T> {
    match joined {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            log::debug!("{} skipped for '{}': {}", what, name, e);
            None
        }
        Err(e) => {
            log::warn!("{} task for '{}' failed: {}", what, name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{RecordingBridge, SET_THUMBNAIL, UPLOAD_CONFIRMED};
    use crate::pipeline::raster::sample_image;
    use image::ImageFormat;
    use serde_json::json;
    use std::rc::Rc;

    fn preparer() -> (UploadPreparer<Rc<RecordingBridge>>, Rc<RecordingBridge>) {
        let bridge = Rc::new(RecordingBridge::new());
        (UploadPreparer::new(bridge.clone()), bridge)
    }

    /// Uncompressed BMP: large on the wire, so the JPEG re-encode of a
    /// flat-colored image is reliably smaller.
    fn bmp_file(name: &str, width: u32, height: u32) -> UploadFile {
        UploadFile {
            name: name.to_string(),
            content_type: "image/bmp".to_string(),
            bytes: sample_image(width, height, ImageFormat::Bmp),
        }
    }

    #[tokio::test]
    async fn test_substitution_uses_smaller_reencode() {
        let (preparer, _) = preparer();
        let file = bmp_file("photo.bmp", 64, 64);
        let original_len = file.bytes.len();

        let prepared = preparer.select_file(file).await;

        assert_eq!(prepared.content_type, "image/jpeg");
        assert_eq!(prepared.name, "photo.bmp");
        assert!(prepared.bytes.len() < original_len);
        assert_eq!(preparer.pending_file(), Some(prepared));
    }

    #[tokio::test]
    async fn test_substitution_keeps_smaller_original() {
        let (preparer, _) = preparer();
        // a 2x2 PNG is a handful of bytes; its JPEG re-encode is bigger
        let file = UploadFile {
            name: "tiny.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: sample_image(2, 2, ImageFormat::Png),
        };

        let prepared = preparer.select_file(file.clone()).await;

        assert_eq!(prepared, file);
        // the thumbnail is still derived and retained
        assert!(preparer.has_pending_thumbnail());
    }

    #[tokio::test]
    async fn test_non_raster_passes_through() {
        let (preparer, bridge) = preparer();
        let file = UploadFile {
            name: "notes.txt".to_string(),
            content_type: "text/plain".to_string(),
            bytes: b"not an image".to_vec(),
        };

        let prepared = preparer.select_file(file.clone()).await;

        assert_eq!(prepared, file);
        assert!(!preparer.has_pending_thumbnail());
        preparer.confirm_upload("p1");
        assert!(bridge.events.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_gif_passes_through_unchanged() {
        let (preparer, _) = preparer();
        let file = UploadFile {
            name: "anim.gif".to_string(),
            content_type: "image/gif".to_string(),
            bytes: b"GIF89a such animation".to_vec(),
        };

        let prepared = preparer.select_file(file.clone()).await;

        assert_eq!(prepared, file);
        assert!(!preparer.has_pending_thumbnail());
    }

    #[tokio::test]
    async fn test_confirm_emits_thumbnail_exactly_once() {
        let (preparer, bridge) = preparer();
        preparer.select_file(bmp_file("photo.bmp", 16, 16)).await;

        preparer.confirm_upload("photo-42");
        preparer.confirm_upload("photo-42");

        let emitted = bridge.named(SET_THUMBNAIL);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0]["upload_id"], "photo-42");
        assert!(emitted[0]["thumbnail"]
            .as_str()
            .expect("thumbnail is a string")
            .starts_with("data:image/jpeg;base64,"));
        assert!(!preparer.has_pending_thumbnail());
    }

    #[tokio::test]
    async fn test_last_selection_wins_between_selections() {
        let (preparer, bridge) = preparer();
        let first = bmp_file("first.bmp", 64, 64);
        let second = bmp_file("second.bmp", 32, 16);
        let first_thumb = raster::derive_thumbnail(
            &first.content_type,
            &first.bytes,
            DEFAULT_THUMBNAIL_MAX_DIM,
        )
        .expect("first derives");
        let second_thumb = raster::derive_thumbnail(
            &second.content_type,
            &second.bytes,
            DEFAULT_THUMBNAIL_MAX_DIM,
        )
        .expect("second derives");

        preparer.select_file(first).await;
        preparer.select_file(second).await;
        preparer.confirm_upload("p7");

        let emitted = bridge.named(SET_THUMBNAIL);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0]["thumbnail"], second_thumb.data_url);
        assert_ne!(emitted[0]["thumbnail"], first_thumb.data_url);
    }

    #[tokio::test]
    async fn test_last_selection_wins_while_in_flight() {
        let (preparer, bridge) = preparer();
        let first = bmp_file("first.bmp", 64, 64);
        let second = bmp_file("second.bmp", 32, 16);
        let second_thumb = raster::derive_thumbnail(
            &second.content_type,
            &second.bytes,
            DEFAULT_THUMBNAIL_MAX_DIM,
        )
        .expect("second derives");

        // the second selection starts before the first finishes; the
        // first derivation still completes but its result is discarded
        tokio::join!(
            preparer.select_file(first),
            preparer.select_file(second),
        );
        preparer.confirm_upload("p8");

        let emitted = bridge.named(SET_THUMBNAIL);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0]["thumbnail"], second_thumb.data_url);
    }

    #[tokio::test]
    async fn test_handle_host_event_confirms_upload() {
        let (preparer, bridge) = preparer();
        preparer.select_file(bmp_file("photo.bmp", 16, 16)).await;

        preparer.handle_host_event("unrelated", &json!({"upload_id": "x"}));
        assert!(bridge.named(SET_THUMBNAIL).is_empty());

        preparer.handle_host_event(UPLOAD_CONFIRMED, &json!({"nope": true}));
        assert!(bridge.named(SET_THUMBNAIL).is_empty());

        preparer.handle_host_event(UPLOAD_CONFIRMED, &json!({"upload_id": "p9"}));
        let emitted = bridge.named(SET_THUMBNAIL);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0]["upload_id"], "p9");
    }
}
