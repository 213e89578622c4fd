use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{BuilderError, EntryId, Image, ImageMetadata, ImageSlots, ImageTarget};
use crate::api::ApiError;

/// Local transaction id of one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TicketId(Uuid);

impl TicketId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Queued,
    Uploading,
    Done,
    Error,
}

impl UploadStatus {
    pub fn is_pending(self) -> bool {
        matches!(self, UploadStatus::Queued | UploadStatus::Uploading)
    }
}

/// A file picked by the user, not yet uploaded.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("upload"));
        let content_type = content_type_for(path);
        Ok(Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// What the image endpoint returns for a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    #[serde(default)]
    pub key: String,
}

pub trait Uploader: Send + Sync {
    fn upload(&self, file: &PendingFile) -> Result<UploadedFile, ApiError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadTicket {
    pub local_id: TicketId,
    #[serde(skip)]
    pub target: ImageTarget,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub status: UploadStatus,
    pub progress: u8,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum UploadEvent {
    Started(TicketId),
    Progress(TicketId, u8),
    Finished(TicketId, Result<UploadedFile, String>),
}

impl UploadEvent {
    pub fn ticket(&self) -> TicketId {
        match self {
            UploadEvent::Started(id) | UploadEvent::Progress(id, _) | UploadEvent::Finished(id, _) => *id,
        }
    }
}

/// How a ticket ended. Yielded once per ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    Uploaded {
        ticket: TicketId,
        target: ImageTarget,
        file: UploadedFile,
        file_name: String,
        content_type: String,
        size: u64,
    },
    Failed {
        ticket: TicketId,
        target: ImageTarget,
        file_name: String,
        message: String,
    },
}

/// Tracks in-flight uploads of one form and gates saving on them.
#[derive(Debug, Default)]
pub struct UploadCoordinator {
    tickets: Vec<UploadTicket>,
}

impl UploadCoordinator {
    /// Creates a `Queued` ticket for `file`.
    pub fn enqueue(&mut self, target: ImageTarget, file: &PendingFile) -> TicketId {
        let local_id = TicketId::new();
        self.tickets.push(UploadTicket {
            local_id,
            target,
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            size: file.bytes.len() as u64,
            status: UploadStatus::Queued,
            progress: 0,
            error: None,
        });
        debug!(ticket = %local_id, file = %file.file_name, "upload queued");
        local_id
    }

    pub fn tickets(&self) -> &[UploadTicket] {
        &self.tickets
    }

    pub fn ticket(&self, id: TicketId) -> Option<&UploadTicket> {
        self.tickets.iter().find(|t| t.local_id == id)
    }

    /// True while any upload is queued or running. Saving waits on this.
    pub fn is_busy(&self) -> bool {
        self.tickets.iter().any(|t| t.status.is_pending())
    }

    pub fn pending_count(&self) -> usize {
        self.tickets.iter().filter(|t| t.status.is_pending()).count()
    }

    /// Drops finished and failed tickets.
    pub fn clear_finished(&mut self) {
        self.tickets.retain(|t| t.status.is_pending());
    }

    pub fn apply(&mut self, event: UploadEvent) -> Result<Option<Settled>, BuilderError> {
        let id = event.ticket();
        let ticket = self
            .tickets
            .iter_mut()
            .find(|t| t.local_id == id)
            .ok_or(BuilderError::UnknownTicket(id))?;

        if !ticket.status.is_pending() {
            debug!(ticket = %id, "ignoring event for a settled upload");
            return Ok(None);
        }

        match event {
            UploadEvent::Started(_) => {
                ticket.status = UploadStatus::Uploading;
                Ok(None)
            }
            UploadEvent::Progress(_, progress) => {
                ticket.status = UploadStatus::Uploading;
                ticket.progress = progress.min(100);
                Ok(None)
            }
            UploadEvent::Finished(_, Ok(file)) => {
                ticket.status = UploadStatus::Done;
                ticket.progress = 100;
                debug!(ticket = %id, url = %file.url, "upload done");
                Ok(Some(Settled::Uploaded {
                    ticket: id,
                    target: ticket.target.clone(),
                    file,
                    file_name: ticket.file_name.clone(),
                    content_type: ticket.content_type.clone(),
                    size: ticket.size,
                }))
            }
            UploadEvent::Finished(_, Err(message)) => {
                ticket.status = UploadStatus::Error;
                ticket.error = Some(message.clone());
                warn!(ticket = %id, file = %ticket.file_name, %message, "upload failed");
                Ok(Some(Settled::Failed {
                    ticket: id,
                    target: ticket.target.clone(),
                    file_name: ticket.file_name.clone(),
                    message,
                }))
            }
        }
    }
}

/// Runs one upload on its own thread, reporting through `events`.
///
/// Nothing is retried. If the receiving form is gone the events are dropped.
pub fn spawn_upload(
    uploader: Arc<dyn Uploader>,
    ticket: TicketId,
    file: PendingFile,
    events: Sender<UploadEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        if events.send(UploadEvent::Started(ticket)).is_err() {
            return;
        }
        let result = uploader.upload(&file).map_err(|e| e.to_string());
        let _ = events.send(UploadEvent::Finished(ticket, result));
    })
}

/// Turns a finished upload into an image on `form`. A target removed while
/// the upload ran drops the image.
pub(crate) fn attach_settled<F: ImageSlots>(form: &mut F, settled: &Settled) {
    let Settled::Uploaded {
        target,
        file,
        file_name,
        content_type,
        size,
        ..
    } = settled
    else {
        return;
    };

    let image = Image {
        id: EntryId::default(),
        url: file.url.clone(),
        label: String::new(),
        alt_text: file_name.clone(),
        metadata: ImageMetadata {
            key: file.key.clone(),
            size: *size,
            content_type: content_type.clone(),
        },
    };
    if let Err(err) = form.attach_image(target, image) {
        warn!(image_target = %target, %err, "upload finished after its target was removed, image dropped");
    }
}
