//! Wire shapes the question endpoints accept, and the checks that run
//! before a form is flattened into them.

use serde::Serialize;

use super::fields::Scores;
use super::{EntryId, EntryList, Image, QuestionFields, Selection, ValidationError};
use crate::catalog::DifficultyLevel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommonPayload {
    pub question: String,
    pub explanation: String,
    pub question_images: Vec<Image>,
    pub explanation_images: Vec<Image>,
    pub marks: f64,
    pub negative_marks: f64,
    /// seconds
    pub time_limit: u64,
    pub difficulty_level: DifficultyLevel,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionPayload {
    pub option_id: EntryId,
    pub value: String,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPayload {
    pub item_id: EntryId,
    pub value: String,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McqPayload {
    #[serde(flatten)]
    pub common: CommonPayload,
    pub question_type: Selection,
    pub options: Vec<OptionPayload>,
    pub correct_answers: Vec<EntryId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RearrangePayload {
    #[serde(flatten)]
    pub common: CommonPayload,
    pub is_drag_and_drop: bool,
    pub items: Vec<ItemPayload>,
    pub correct_order: Vec<EntryId>,
}

pub(crate) fn common_payload(fields: &QuestionFields, scores: Scores) -> CommonPayload {
    let subtopic = fields.subtopic.trim();
    CommonPayload {
        question: fields.question.trim().to_string(),
        explanation: fields.explanation.trim().to_string(),
        question_images: fields.question_images.clone(),
        explanation_images: fields.explanation_images.clone(),
        marks: scores.marks,
        negative_marks: scores.negative_marks,
        time_limit: scores.time_limit,
        difficulty_level: fields.difficulty_level,
        topic: fields.topic.trim().to_string(),
        subtopic: (!subtopic.is_empty()).then(|| subtopic.to_string()),
        tags: fields.tag_list(),
    }
}

/// Entry count and content checks shared by both builders.
pub(crate) fn check_entries(list: &EntryList) -> Result<(), ValidationError> {
    if list.len() < list.min_len() {
        return Err(ValidationError::TooFewEntries {
            kind: list.kind(),
            min: list.min_len(),
        });
    }
    if let Some(position) = list.entries().iter().position(|entry| entry.is_blank()) {
        return Err(ValidationError::EmptyEntry {
            kind: list.kind(),
            position: position + 1,
        });
    }
    Ok(())
}

pub(crate) fn check_choices(list: &EntryList, selection: Selection) -> Result<(), ValidationError> {
    match (selection, list.correct().len()) {
        (_, 0) => Err(ValidationError::NoCorrectAnswer),
        (Selection::Single, n) if n > 1 => Err(ValidationError::MultipleCorrectAnswers),
        _ => Ok(()),
    }
}

/// The correct order must name every item exactly once. Ids are unique and
/// always name existing items, so comparing lengths is enough.
pub(crate) fn check_order(list: &EntryList) -> Result<(), ValidationError> {
    if list.correct().len() != list.len() {
        return Err(ValidationError::IncompleteOrder);
    }
    Ok(())
}

pub(crate) fn option_payloads(list: &EntryList) -> Vec<OptionPayload> {
    list.entries()
        .iter()
        .map(|entry| OptionPayload {
            option_id: entry.id.clone(),
            value: entry.value.trim().to_string(),
            images: entry.images.clone(),
        })
        .collect()
}

pub(crate) fn item_payloads(list: &EntryList) -> Vec<ItemPayload> {
    list.entries()
        .iter()
        .map(|entry| ItemPayload {
            item_id: entry.id.clone(),
            value: entry.value.trim().to_string(),
            images: entry.images.clone(),
        })
        .collect()
}
