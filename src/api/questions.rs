use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::client::{decode, unwrap_data};
use super::{ApiClient, ApiError};
use crate::builder::{EntryId, LooseNumber, McqPayload, McqRecord, RearrangePayload, RearrangeRecord, TagsField};
use crate::pagination::{ListQuery, Paginated};

/// Which question bank CRUD calls go to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    College,
    Course,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::College => "college",
            Scope::Course => "course",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "college" => Ok(Scope::College),
            "course" => Ok(Scope::Course),
            other => Err(format!("unknown scope '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Mcq,
    Rearrange,
    Coding,
}

impl QuestionKind {
    /// Path segment of the shared listing endpoint.
    pub fn listing(self) -> &'static str {
        match self {
            QuestionKind::Mcq => "mcqs",
            QuestionKind::Rearrange => "rearranges",
            QuestionKind::Coding => "coding",
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mcq" | "mcqs" => Ok(QuestionKind::Mcq),
            "rearrange" | "rearranges" => Ok(QuestionKind::Rearrange),
            "coding" => Ok(QuestionKind::Coding),
            other => Err(format!("unknown question kind '{}'", other)),
        }
    }
}

/// One row of a question listing.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionSummary {
    #[serde(alias = "_id")]
    pub id: EntryId,
    #[serde(default, alias = "title")]
    pub question: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub subtopic: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub tags: TagsField,
    #[serde(default)]
    pub marks: Option<LooseNumber>,
}

impl QuestionSummary {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags.to_list()
    }
}

fn collection(scope: Scope, kind: &str) -> String {
    format!("/{}-{}", scope, kind)
}

fn item(scope: Scope, kind: &str, id: &str) -> String {
    format!("/{}-{}/{}", scope, kind, id)
}

impl ApiClient {
    pub fn get_mcq(&self, scope: Scope, id: &str) -> Result<McqRecord, ApiError> {
        decode(self.get_value(&item(scope, "mcqs", id), &[])?)
    }

    /// Creates an MCQ and returns the stored record as the backend echoes it.
    pub fn create_mcq(&self, scope: Scope, payload: &McqPayload) -> Result<Value, ApiError> {
        self.send_value("POST", &collection(scope, "mcqs"), payload)
            .map(unwrap_data)
    }

    pub fn update_mcq(&self, scope: Scope, id: &str, payload: &McqPayload) -> Result<Value, ApiError> {
        self.send_value("PUT", &item(scope, "mcqs", id), payload)
            .map(unwrap_data)
    }

    pub fn delete_mcq(&self, scope: Scope, id: &str) -> Result<(), ApiError> {
        self.delete(&item(scope, "mcqs", id))
    }

    pub fn get_rearrange(&self, scope: Scope, id: &str) -> Result<RearrangeRecord, ApiError> {
        decode(self.get_value(&item(scope, "rearranges", id), &[])?)
    }

    pub fn create_rearrange(&self, scope: Scope, payload: &RearrangePayload) -> Result<Value, ApiError> {
        self.send_value("POST", &collection(scope, "rearranges"), payload)
            .map(unwrap_data)
    }

    pub fn update_rearrange(
        &self,
        scope: Scope,
        id: &str,
        payload: &RearrangePayload,
    ) -> Result<Value, ApiError> {
        self.send_value("PUT", &item(scope, "rearranges", id), payload)
            .map(unwrap_data)
    }

    pub fn delete_rearrange(&self, scope: Scope, id: &str) -> Result<(), ApiError> {
        self.delete(&item(scope, "rearranges", id))
    }

    pub fn list_questions(
        &self,
        kind: QuestionKind,
        query: &ListQuery,
    ) -> Result<Paginated<QuestionSummary>, ApiError> {
        let body = self.get_value(
            &format!("/test/questions/{}/", kind.listing()),
            &query.to_pairs(),
        )?;
        Ok(Paginated::from_body(body, query.page, query.per_page)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paths_follow_scope() {
        assert_eq!(collection(Scope::College, "mcqs"), "/college-mcqs");
        assert_eq!(item(Scope::Course, "rearranges", "42"), "/course-rearranges/42");
    }

    #[test]
    fn kinds_parse_both_spellings() {
        assert_eq!("MCQs".parse::<QuestionKind>(), Ok(QuestionKind::Mcq));
        assert_eq!("rearrange".parse::<QuestionKind>(), Ok(QuestionKind::Rearrange));
        assert!("essay".parse::<QuestionKind>().is_err());
        assert_eq!(QuestionKind::Coding.listing(), "coding");
    }

    #[test]
    fn summaries_accept_backend_spellings() {
        let page: Paginated<QuestionSummary> = Paginated::from_body(
            json!({
                "results": [
                    { "_id": 9, "title": "Reverse a list", "topic": "Algorithms", "tags": "lists, easy" },
                    { "id": "a1", "question": "2 + 2?", "marks": "2" }
                ]
            }),
            1,
            10,
        )
        .unwrap();
        assert_eq!(page.items[0].id.as_str(), "9");
        assert_eq!(page.items[0].question, "Reverse a list");
        assert_eq!(page.items[0].tag_list(), vec!["lists", "easy"]);
        assert_eq!(page.items[1].marks.as_ref().and_then(LooseNumber::as_f64), Some(2.0));
    }
}
