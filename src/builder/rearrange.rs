use std::sync::mpsc::Sender;
use std::sync::Arc;

use super::fields::Scores;
use super::payload::{check_entries, check_order, common_payload, item_payloads};
use super::record::resolve_answers;
use super::upload::attach_settled;
use super::{
    BuilderError, Entry, EntryId, EntryKind, EntryList, IdAssigner, Image, ImageSlots, ImageTarget,
    PendingFile, QuestionFields, QuestionForm, RearrangePayload, RearrangeRecord, Selection, Settled,
    TicketId, UploadCoordinator, UploadEvent, Uploader, ValidationError,
};

/// Editable state of one rearrange (put-in-order) question.
///
/// Items are shown in display order; the correct order is a separate list of
/// item ids. New items join the end of the correct order, removed items leave
/// it, and moving an item on screen leaves it untouched.
#[derive(Debug)]
pub struct RearrangeForm {
    remote_id: Option<EntryId>,
    pub fields: QuestionFields,
    pub drag_and_drop: bool,
    items: EntryList,
    uploads: UploadCoordinator,
}

impl Default for RearrangeForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RearrangeForm {
    pub fn new() -> Self {
        Self::with_ids(IdAssigner::default())
    }

    pub fn with_ids(ids: IdAssigner) -> Self {
        let mut form = Self {
            remote_id: None,
            fields: QuestionFields::default(),
            drag_and_drop: true,
            items: EntryList::new(EntryKind::Item, ids),
            uploads: UploadCoordinator::default(),
        };
        form.add_item("");
        form
    }

    /// Records without a stored correct order are taken to list their items
    /// in correct order.
    pub fn from_record(record: RearrangeRecord, mut ids: IdAssigner) -> Self {
        let (remote_id, fields) = record.common.into_fields(&mut ids);
        let mut items = EntryList::from_raw(EntryKind::Item, ids, record.items);

        let order = if record.correct_order.is_empty() {
            items.entries().iter().map(|e| e.id.clone()).collect()
        } else {
            resolve_answers(&items, record.correct_order)
        };
        items.set_correct(order);

        Self {
            remote_id,
            fields,
            drag_and_drop: record.is_drag_and_drop,
            items,
            uploads: UploadCoordinator::default(),
        }
    }

    pub fn remote_id(&self) -> Option<&EntryId> {
        self.remote_id.as_ref()
    }

    pub fn items(&self) -> &EntryList {
        &self.items
    }

    pub fn correct_order(&self) -> &[EntryId] {
        self.items.correct()
    }

    pub fn add_item(&mut self, value: impl Into<String>) -> EntryId {
        let id = self.items.push(value);
        // a fresh id always names an existing item
        let _ = self.items.mark_correct(&id, Selection::Multiple);
        id
    }

    pub fn remove_item(&mut self, index: usize) -> Result<Entry, BuilderError> {
        self.items.remove(index)
    }

    /// Moves an item on screen only.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), BuilderError> {
        self.items.move_entry(from, to)
    }

    /// Moves an item within the correct order only.
    pub fn move_in_order(&mut self, from: usize, to: usize) -> Result<(), BuilderError> {
        self.items.move_correct(from, to)
    }

    /// Replaces the correct order with the current display order.
    pub fn use_display_order(&mut self) {
        let order: Vec<EntryId> = self.items.entries().iter().map(|e| e.id.clone()).collect();
        self.items.set_correct(order);
    }

    pub fn set_item(&mut self, index: usize, value: impl Into<String>) -> Result<(), BuilderError> {
        self.items.set_value(index, value)
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }

    pub fn queue_upload(&mut self, target: ImageTarget, file: &PendingFile) -> Result<TicketId, BuilderError> {
        self.image_slot(&target)?;
        Ok(self.uploads.enqueue(target, file))
    }

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

    pub fn to_payload(&self) -> Result<RearrangePayload, ValidationError> {
        let scores = self.checked()?;
        Ok(RearrangePayload {
            common: common_payload(&self.fields, scores),
            is_drag_and_drop: self.drag_and_drop,
            items: item_payloads(&self.items),
            correct_order: self.items.correct().to_vec(),
        })
    }

    pub fn reset(&mut self) {
        self.remote_id = None;
        self.fields = QuestionFields::default();
        self.drag_and_drop = true;
        self.items.reset(0);
        self.add_item("");
        self.uploads = UploadCoordinator::default();
    }

    fn checked(&self) -> Result<Scores, ValidationError> {
        self.fields.check_text()?;
        check_entries(&self.items)?;
        check_order(&self.items)?;
        let scores = self.fields.check_scores()?;
        if self.uploads.is_busy() {
            return Err(ValidationError::UploadsPending);
        }
        Ok(scores)
    }
}

impl ImageSlots for RearrangeForm {
    fn image_slot(&mut self, target: &ImageTarget) -> Result<&mut Vec<Image>, BuilderError> {
        match target {
            ImageTarget::Question => Ok(&mut self.fields.question_images),
            ImageTarget::Explanation => Ok(&mut self.fields.explanation_images),
            ImageTarget::Entry(id) => self
                .items
                .entry_mut(id)
                .map(|entry| &mut entry.images)
                .ok_or_else(|| BuilderError::UnknownEntry {
                    kind: EntryKind::Item,
                    id: id.clone(),
                }),
        }
    }

    fn fresh_image_id(&mut self) -> EntryId {
        self.items.fresh_id()
    }
}

impl QuestionForm for RearrangeForm {
    type Payload = RearrangePayload;

    fn validate(&self) -> Result<(), ValidationError> {
        RearrangeForm::validate(self)
    }

    fn to_payload(&self) -> Result<RearrangePayload, ValidationError> {
        RearrangeForm::to_payload(self)
    }

    fn reset(&mut self) {
        RearrangeForm::reset(self)
    }

    fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }
}
