use thiserror::Error;

use super::{EntryId, EntryKind, TicketId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    #[error("a question needs at least {min} {kind}s")]
    TooFewEntries { kind: EntryKind, min: usize },

    #[error("{kind} {index} does not exist")]
    IndexOutOfRange { kind: EntryKind, index: usize },

    #[error("no {kind} with id '{id}'")]
    UnknownEntry { kind: EntryKind, id: EntryId },

    #[error("no image with id '{id}'")]
    UnknownImage { id: EntryId },

    #[error("upload {0} is not tracked by this form")]
    UnknownTicket(TicketId),

    #[error("the form cannot be changed while {0}")]
    Busy(&'static str),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("save failed: {0}")]
    SaveFailed(String),
}

/// Pre-submission check failures. `Display` is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("question text is required")]
    MissingQuestion,

    #[error("topic is required")]
    MissingTopic,

    #[error("subtopic '{subtopic}' does not belong to topic '{topic}'")]
    UnknownSubtopic { topic: String, subtopic: String },

    #[error("add at least {min} {kind}s")]
    TooFewEntries { kind: EntryKind, min: usize },

    #[error("{kind} {position} needs text or an image")]
    EmptyEntry { kind: EntryKind, position: usize },

    #[error("select at least one correct answer")]
    NoCorrectAnswer,

    #[error("a single-answer question needs exactly one correct answer")]
    MultipleCorrectAnswers,

    #[error("the correct order must include every item")]
    IncompleteOrder,

    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    #[error("{field} cannot be negative")]
    Negative { field: &'static str },

    #[error("time limit must be greater than zero")]
    NonPositiveTime,

    #[error("wait for image uploads to finish before saving")]
    UploadsPending,
}
