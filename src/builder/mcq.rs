use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::debug;

use super::payload::{check_choices, check_entries, common_payload, option_payloads};
use super::record::resolve_answers;
use super::upload::attach_settled;
use super::{
    BuilderError, Entry, EntryId, EntryKind, EntryList, IdAssigner, Image, ImageSlots, ImageTarget,
    McqPayload, McqRecord, PendingFile, QuestionFields, QuestionForm, Selection, Settled, TicketId,
    UploadCoordinator, UploadEvent, Uploader, ValidationError,
};
use super::fields::Scores;

/// Editable state of one multiple-choice question.
#[derive(Debug)]
pub struct McqForm {
    remote_id: Option<EntryId>,
    pub fields: QuestionFields,
    selection: Selection,
    options: EntryList,
    uploads: UploadCoordinator,
}

impl Default for McqForm {
    fn default() -> Self {
        Self::new()
    }
}

impl McqForm {
    pub fn new() -> Self {
        Self::with_ids(IdAssigner::default())
    }

    /// A blank form with two empty options.
    pub fn with_ids(ids: IdAssigner) -> Self {
        let mut options = EntryList::new(EntryKind::Choice, ids);
        options.reset(EntryKind::Choice.min_len());
        Self {
            remote_id: None,
            fields: QuestionFields::default(),
            selection: Selection::Single,
            options,
            uploads: UploadCoordinator::default(),
        }
    }

    pub fn from_record(record: McqRecord, mut ids: IdAssigner) -> Self {
        let (remote_id, fields) = record.common.into_fields(&mut ids);
        let mut options = EntryList::from_raw(EntryKind::Choice, ids, record.options);
        let correct = resolve_answers(&options, record.correct_answers);
        options.set_correct(correct);

        let mut form = Self {
            remote_id,
            fields,
            selection: Selection::Multiple,
            options,
            uploads: UploadCoordinator::default(),
        };
        form.set_selection(record.question_type);
        form
    }

    /// Backend id when editing an existing question.
    pub fn remote_id(&self) -> Option<&EntryId> {
        self.remote_id.as_ref()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Switching to single selection keeps only the first correct answer.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        if selection == Selection::Single && self.options.correct().len() > 1 {
            let keep = self.options.correct()[0].clone();
            debug!(%keep, "single selection keeps the first correct option");
            self.options.set_correct([keep]);
        }
    }

    pub fn options(&self) -> &EntryList {
        &self.options
    }

    pub fn add_option(&mut self, value: impl Into<String>) -> EntryId {
        self.options.push(value)
    }

    pub fn remove_option(&mut self, index: usize) -> Result<Entry, BuilderError> {
        self.options.remove(index)
    }

    pub fn move_option(&mut self, from: usize, to: usize) -> Result<(), BuilderError> {
        self.options.move_entry(from, to)
    }

    pub fn set_option(&mut self, index: usize, value: impl Into<String>) -> Result<(), BuilderError> {
        self.options.set_value(index, value)
    }

    pub fn mark_correct(&mut self, id: &EntryId) -> Result<(), BuilderError> {
        self.options.mark_correct(id, self.selection)
    }

    pub fn unmark_correct(&mut self, id: &EntryId) -> Result<(), BuilderError> {
        self.options.unmark_correct(id)
    }

    pub fn toggle_correct(&mut self, id: &EntryId) -> Result<bool, BuilderError> {
        self.options.toggle_correct(id, self.selection)
    }

    /// Correct option ids in display order.
    pub fn correct_answers(&self) -> Vec<EntryId> {
        self.options
            .entries()
            .iter()
            .filter(|entry| self.options.is_correct(&entry.id))
            .map(|entry| entry.id.clone())
            .collect()
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }

    /// Queues an upload without starting it.
    pub fn queue_upload(&mut self, target: ImageTarget, file: &PendingFile) -> Result<TicketId, BuilderError> {
        self.image_slot(&target)?;
        Ok(self.uploads.enqueue(target, file))
    }

    /// Queues `file` and starts uploading it in the background. Feed the
    /// events that arrive on `events` back through [`McqForm::apply_upload`].
    pub fn start_upload(
        &mut self,
        uploader: Arc<dyn Uploader>,
        target: ImageTarget,
        file: PendingFile,
        events: Sender<UploadEvent>,
    ) -> Result<TicketId, BuilderError> {
        let ticket = self.queue_upload(target, &file)?;
        super::spawn_upload(uploader, ticket, file, events);
        Ok(ticket)
    }

    pub fn apply_upload(&mut self, event: UploadEvent) -> Result<Option<Settled>, BuilderError> {
        let settled = self.uploads.apply(event)?;
        if let Some(settled) = &settled {
            attach_settled(self, settled);
        }
        Ok(settled)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.checked().map(|_| ())
    }

    pub fn to_payload(&self) -> Result<McqPayload, ValidationError> {
        let scores = self.checked()?;
        Ok(McqPayload {
            common: common_payload(&self.fields, scores),
            question_type: self.selection,
            options: option_payloads(&self.options),
            correct_answers: self.correct_answers(),
        })
    }

    /// Back to a blank form. Ids issued so far are not reused.
    pub fn reset(&mut self) {
        self.remote_id = None;
        self.fields = QuestionFields::default();
        self.selection = Selection::Single;
        self.options.reset(EntryKind::Choice.min_len());
        self.uploads = UploadCoordinator::default();
    }

    fn checked(&self) -> Result<Scores, ValidationError> {
        self.fields.check_text()?;
        check_entries(&self.options)?;
        check_choices(&self.options, self.selection)?;
        let scores = self.fields.check_scores()?;
        if self.uploads.is_busy() {
            return Err(ValidationError::UploadsPending);
        }
        Ok(scores)
    }
}

impl ImageSlots for McqForm {
    fn image_slot(&mut self, target: &ImageTarget) -> Result<&mut Vec<Image>, BuilderError> {
        match target {
            ImageTarget::Question => Ok(&mut self.fields.question_images),
            ImageTarget::Explanation => Ok(&mut self.fields.explanation_images),
            ImageTarget::Entry(id) => self
                .options
                .entry_mut(id)
                .map(|entry| &mut entry.images)
                .ok_or_else(|| BuilderError::UnknownEntry {
                    kind: EntryKind::Choice,
                    id: id.clone(),
                }),
        }
    }

    fn fresh_image_id(&mut self) -> EntryId {
        self.options.fresh_id()
    }
}

impl QuestionForm for McqForm {
    type Payload = McqPayload;

    fn validate(&self) -> Result<(), ValidationError> {
        McqForm::validate(self)
    }

    fn to_payload(&self) -> Result<McqPayload, ValidationError> {
        McqForm::to_payload(self)
    }

    fn reset(&mut self) {
        McqForm::reset(self)
    }

    fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }
}
