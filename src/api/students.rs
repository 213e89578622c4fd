use serde::{Deserialize, Serialize};
use tracing::info;

use super::client::decode;
use super::{ApiClient, ApiError};
use crate::builder::EntryId;
use crate::pagination::{push_filter, Paginated, DEFAULT_PER_PAGE};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Student {
    #[serde(alias = "_id", alias = "student_id")]
    pub id: EntryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "roll_no")]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentQuery {
    pub page: usize,
    pub per_page: usize,
    pub search: Option<String>,
    pub department: Option<String>,
    pub batch: Option<String>,
    pub section: Option<String>,
}

impl Default for StudentQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: None,
            department: None,
            batch: None,
            section: None,
        }
    }
}

impl StudentQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.max(1).to_string()),
            ("per_page", self.per_page.max(1).to_string()),
        ];
        push_filter(&mut pairs, "search", self.search.as_deref());
        push_filter(&mut pairs, "department", self.department.as_deref());
        push_filter(&mut pairs, "batch", self.batch.as_deref());
        push_filter(&mut pairs, "section", self.section.as_deref());
        pairs
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl ApiClient {
    pub fn list_students(&self, query: &StudentQuery) -> Result<Paginated<Student>, ApiError> {
        let body = self.get_value("/students/list", &query.to_pairs())?;
        Ok(Paginated::from_body(body, query.page, query.per_page)?)
    }

    pub fn add_student(&self, student: &NewStudent) -> Result<Student, ApiError> {
        let created: Student = decode(self.send_value("POST", "/students/add", student)?)?;
        info!(id = %created.id, email = %created.email, "student added");
        Ok(created)
    }
}
