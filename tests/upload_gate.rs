use std::sync::mpsc;
use std::sync::{Arc, Barrier};

use qbank::api::ApiError;
use qbank::builder::{
    BuilderError, IdAssigner, ImageTarget, McqForm, PendingFile, Selection, Settled, UploadStatus, UploadedFile,
    Uploader, ValidationError,
};

/// Serves uploads from memory. Files named `broken*` fail with a 413.
struct MemoryUploader {
    gate: Option<Arc<Barrier>>,
}

impl Uploader for MemoryUploader {
    fn upload(&self, file: &PendingFile) -> Result<UploadedFile, ApiError> {
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        if file.file_name.starts_with("broken") {
            return Err(ApiError::Server {
                status: 413,
                message: "image is too large".into(),
            });
        }
        Ok(UploadedFile {
            url: format!("https://cdn.example.edu/{}", file.file_name),
            key: format!("uploads/{}", file.file_name),
        })
    }
}

fn png(name: &str) -> PendingFile {
    PendingFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
}

fn ready_form() -> McqForm {
    let mut form = McqForm::with_ids(IdAssigner::sequential("o"));
    form.fields.question = "Which graph is bipartite?".into();
    form.fields.topic = "Data Structures".into();
    form.set_option(0, "left").unwrap();
    form.set_option(1, "right").unwrap();
    form.set_selection(Selection::Single);
    form.mark_correct(&"o1".into()).unwrap();
    form
}

#[test]
fn save_waits_for_every_upload() {
    let gate = Arc::new(Barrier::new(2));
    let uploader: Arc<dyn Uploader> = Arc::new(MemoryUploader {
        gate: Some(Arc::clone(&gate)),
    });
    let (tx, rx) = mpsc::channel();

    let mut form = ready_form();
    form.start_upload(uploader, ImageTarget::Entry("o2".into()), png("graph.png"), tx)
        .unwrap();

    assert!(form.uploads().is_busy());
    assert_eq!(form.to_payload(), Err(ValidationError::UploadsPending));

    gate.wait();
    for event in rx {
        form.apply_upload(event).unwrap();
        if !form.uploads().is_busy() {
            break;
        }
    }

    let payload = form.to_payload().unwrap();
    let image = &payload.options[1].images[0];
    assert_eq!(image.url, "https://cdn.example.edu/graph.png");
    assert_eq!(image.metadata.key, "uploads/graph.png");
    assert_eq!(image.metadata.size, 4);
    assert_eq!(image.alt_text, "graph.png");
}

#[test]
fn failed_upload_unblocks_without_an_image() {
    let uploader: Arc<dyn Uploader> = Arc::new(MemoryUploader { gate: None });
    let (tx, rx) = mpsc::channel();

    let mut form = ready_form();
    let ticket = form
        .start_upload(uploader, ImageTarget::Question, png("broken.png"), tx)
        .unwrap();

    let mut failure = None;
    for event in rx {
        if let Some(settled) = form.apply_upload(event).unwrap() {
            failure = Some(settled);
        }
    }

    match failure {
        Some(Settled::Failed { message, .. }) => assert_eq!(message, "image is too large"),
        other => panic!("expected a failed upload, got {:?}", other),
    }
    let record = form.uploads().ticket(ticket).unwrap();
    assert_eq!(record.status, UploadStatus::Error);
    assert!(form.fields.question_images.is_empty());
    assert!(form.validate().is_ok());
}

#[test]
fn upload_for_a_deleted_option_is_dropped() {
    let uploader: Arc<dyn Uploader> = Arc::new(MemoryUploader { gate: None });
    let (tx, rx) = mpsc::channel();

    let mut form = ready_form();
    form.add_option("extra");
    form.start_upload(uploader, ImageTarget::Entry("o3".into()), png("late.png"), tx)
        .unwrap();
    form.remove_option(2).unwrap();

    for event in rx {
        form.apply_upload(event).unwrap();
    }

    assert!(!form.uploads().is_busy());
    assert!(form.options().entries().iter().all(|e| e.images.is_empty()));
}

#[test]
fn uploads_need_a_real_target() {
    let mut form = ready_form();
    assert_eq!(
        form.queue_upload(ImageTarget::Entry("o9".into()), &png("a.png"))
            .unwrap_err(),
        BuilderError::UnknownEntry {
            kind: qbank::builder::EntryKind::Choice,
            id: "o9".into()
        }
    );
    assert_eq!(form.uploads().pending_count(), 0);
}
