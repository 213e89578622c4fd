use serde::Deserialize;
use tracing::warn;

use super::{EntryId, EntryList, IdAssigner, Image, LooseNumber, QuestionFields, RawEntry, Selection};
use crate::catalog::DifficultyLevel;

/// Tags as an array (backend) or one comma separated string (drafts).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagsField {
    List(Vec<String>),
    Text(String),
}

impl Default for TagsField {
    fn default() -> Self {
        TagsField::List(Vec::new())
    }
}

impl TagsField {
    pub fn to_list(&self) -> Vec<String> {
        match self {
            TagsField::List(tags) => tags
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            TagsField::Text(text) => super::parse_tags(text),
        }
    }

    fn into_text(self) -> String {
        match self {
            TagsField::List(tags) => tags
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            TagsField::Text(text) => text,
        }
    }
}

/// A correct answer as stored: an entry id, or a position in legacy records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AnswerRef {
    Position(usize),
    Id(EntryId),
}

/// Fields shared by MCQ and rearrange documents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommonRecord {
    #[serde(default, alias = "_id")]
    pub id: Option<EntryId>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub question_images: Vec<Image>,
    #[serde(default)]
    pub explanation_images: Vec<Image>,
    #[serde(default)]
    pub marks: Option<LooseNumber>,
    #[serde(default)]
    pub negative_marks: Option<LooseNumber>,
    /// seconds
    #[serde(default)]
    pub time_limit: Option<LooseNumber>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub subtopic: Option<String>,
    #[serde(default)]
    pub tags: TagsField,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct McqRecord {
    #[serde(flatten)]
    pub common: CommonRecord,
    #[serde(default)]
    pub question_type: Selection,
    #[serde(default)]
    pub options: Vec<RawEntry>,
    #[serde(default, alias = "correct_options")]
    pub correct_answers: Vec<AnswerRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RearrangeRecord {
    #[serde(flatten)]
    pub common: CommonRecord,
    #[serde(default, alias = "drag_and_drop")]
    pub is_drag_and_drop: bool,
    #[serde(default)]
    pub items: Vec<RawEntry>,
    #[serde(default)]
    pub correct_order: Vec<AnswerRef>,
}

impl CommonRecord {
    pub(crate) fn into_fields(self, ids: &mut IdAssigner) -> (Option<EntryId>, QuestionFields) {
        let defaults = QuestionFields::default();

        let difficulty_level = match self.difficulty_level.as_deref() {
            Some(level) => level.parse::<DifficultyLevel>().unwrap_or_else(|err| {
                warn!(%err, "falling back to the default difficulty");
                DifficultyLevel::default()
            }),
            None => DifficultyLevel::default(),
        };

        let mut fields = QuestionFields {
            question: self.question,
            explanation: self.explanation,
            question_images: ids.normalize_images(self.question_images),
            explanation_images: ids.normalize_images(self.explanation_images),
            marks: self
                .marks
                .map_or_else(|| defaults.marks.clone(), |m| m.to_string()),
            negative_marks: self
                .negative_marks
                .map_or_else(|| defaults.negative_marks.clone(), |m| m.to_string()),
            difficulty_level,
            topic: self.topic,
            subtopic: self.subtopic.unwrap_or_default(),
            tags: self.tags.into_text(),
            ..defaults
        };

        if let Some(limit) = self.time_limit {
            match limit.as_f64() {
                Some(seconds) if seconds >= 0.0 && seconds.fract() == 0.0 => {
                    fields.set_time_limit_seconds(seconds as u64)
                }
                _ => {
                    fields.time_limit = limit.to_string();
                    fields.time_unit = super::TimeUnit::Seconds;
                }
            }
        }

        let id = self.id.filter(|id| !id.is_empty());
        (id, fields)
    }
}

/// Maps stored correct answers to entry ids.
///
/// A number is taken as an entry id when some entry carries it as its id,
/// otherwise as a position. Answers that resolve to nothing are dropped.
pub(crate) fn resolve_answers(list: &EntryList, answers: Vec<AnswerRef>) -> Vec<EntryId> {
    answers
        .into_iter()
        .filter_map(|answer| match answer {
            AnswerRef::Id(id) => Some(id),
            AnswerRef::Position(index) => {
                let as_id = EntryId::new(index.to_string());
                if list.contains(&as_id) {
                    Some(as_id)
                } else {
                    let id = list.get(index).map(|e| e.id.clone());
                    if id.is_none() {
                        warn!(index, "correct answer position is out of range");
                    }
                    id
                }
            }
        })
        .collect()
}
