mod entries;
mod error;
mod fields;
mod ids;
mod image;
mod mcq;
mod payload;
mod rearrange;
mod record;
mod session;
mod upload;

pub use entries::{remap_after_move, remap_after_remove, Entry, EntryKind, EntryList, Selection};
pub use error::{BuilderError, ValidationError};
pub use fields::{parse_tags, LooseNumber, QuestionFields, TimeUnit};
pub use ids::{EntryId, IdAssigner, IdSource, RawEntry, SequentialSource, UuidSource};
pub use image::{Image, ImageMetadata, ImageSlots, ImageTarget};
pub use mcq::McqForm;
pub use payload::{CommonPayload, ItemPayload, McqPayload, OptionPayload, RearrangePayload};
pub use rearrange::RearrangeForm;
pub use record::{AnswerRef, CommonRecord, McqRecord, RearrangeRecord, TagsField};
pub use session::{BuilderPhase, BuilderSession, Mode, QuestionForm};
pub use upload::{
    spawn_upload, PendingFile, Settled, TicketId, UploadCoordinator, UploadEvent, UploadStatus,
    UploadTicket, UploadedFile, Uploader,
};
