use serde::Deserialize;
use serde_json::Value;

use super::client::{decode, unwrap_data};
use super::students::Student;
use super::{ApiClient, ApiError};
use crate::builder::EntryId;
use crate::pagination::{push_filter, Paginated, DEFAULT_PER_PAGE};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Violation {
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default, alias = "timestamp")]
    pub at: Option<String>,
}

/// Proctoring violations: a bare count or the logged events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Violations {
    Count(u32),
    List(Vec<Violation>),
}

impl Default for Violations {
    fn default() -> Self {
        Violations::Count(0)
    }
}

impl Violations {
    pub fn count(&self) -> usize {
        match self {
            Violations::Count(n) => *n as usize,
            Violations::List(events) => events.len(),
        }
    }
}

/// Proctoring signals recorded for one attempt.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Telemetry {
    #[serde(default)]
    pub tab_switch_count: u32,
    /// `Some(false)` when the student left full screen
    #[serde(default)]
    pub full_screen: Option<bool>,
    #[serde(default)]
    pub violations: Violations,
}

impl Telemetry {
    pub fn flagged(&self) -> bool {
        self.tab_switch_count > 0 || self.full_screen == Some(false) || self.violations.count() > 0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultSummary {
    pub student_id: EntryId,
    #[serde(default, alias = "name")]
    pub student_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "test_title")]
    pub test_name: String,
    #[serde(default, alias = "obtained_marks")]
    pub score: f64,
    #[serde(default, alias = "total_marks")]
    pub max_score: f64,
    #[serde(flatten)]
    pub telemetry: Telemetry,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

impl ResultSummary {
    pub fn percentage(&self) -> Option<f64> {
        (self.max_score > 0.0).then(|| self.score / self.max_score * 100.0)
    }

    pub fn flagged(&self) -> bool {
        self.telemetry.flagged()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnsweredQuestion {
    pub question_id: EntryId,
    #[serde(default, alias = "question_type")]
    pub kind: String,
    /// the question as the student saw it
    #[serde(default)]
    pub snapshot: Option<Value>,
    #[serde(default)]
    pub response: Value,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub marks_awarded: f64,
}

impl AnsweredQuestion {
    pub fn question_text(&self) -> Option<&str> {
        self.snapshot.as_ref()?.get("question")?.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttemptDetail {
    #[serde(default)]
    pub test_id: Option<EntryId>,
    #[serde(default, alias = "test_title")]
    pub test_name: String,
    #[serde(default, alias = "obtained_marks")]
    pub score: f64,
    #[serde(default, alias = "total_marks")]
    pub max_score: f64,
    #[serde(flatten)]
    pub telemetry: Telemetry,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default, alias = "questions")]
    pub answers: Vec<AnsweredQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StudentResults {
    #[serde(default)]
    pub student: Option<Student>,
    #[serde(default, alias = "results")]
    pub attempts: Vec<AttemptDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsQuery {
    pub test_id: Option<String>,
    pub page: usize,
    pub per_page: usize,
    pub search: Option<String>,
}

impl Default for ResultsQuery {
    fn default() -> Self {
        Self {
            test_id: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: None,
        }
    }
}

impl ResultsQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.max(1).to_string()),
            ("per_page", self.per_page.max(1).to_string()),
        ];
        push_filter(&mut pairs, "test_id", self.test_id.as_deref());
        push_filter(&mut pairs, "search", self.search.as_deref());
        pairs
    }
}

/// Aggregate figures over one page of results.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResultsOverview {
    pub attempts: usize,
    pub average_percentage: Option<f64>,
    pub highest: Option<f64>,
    pub lowest: Option<f64>,
    pub flagged: usize,
}

impl ResultsOverview {
    pub fn from_results(results: &[ResultSummary]) -> Self {
        let percentages: Vec<f64> = results.iter().filter_map(ResultSummary::percentage).collect();
        let average_percentage = (!percentages.is_empty())
            .then(|| percentages.iter().sum::<f64>() / percentages.len() as f64);
        Self {
            attempts: results.len(),
            average_percentage,
            highest: percentages.iter().copied().reduce(f64::max),
            lowest: percentages.iter().copied().reduce(f64::min),
            flagged: results.iter().filter(|r| r.flagged()).count(),
        }
    }
}

const RESULTS_ROOT: &str = "/api/faculty/test/results";

impl ApiClient {
    pub fn list_results(&self, query: &ResultsQuery) -> Result<Paginated<ResultSummary>, ApiError> {
        let body = self.get_value(&format!("{}/results", RESULTS_ROOT), &query.to_pairs())?;
        Ok(Paginated::from_body(body, query.page, query.per_page)?)
    }

    pub fn student_results(&self, student_id: &str) -> Result<StudentResults, ApiError> {
        let body = self.get_value(&format!("{}/{}/results", RESULTS_ROOT, student_id), &[])?;
        student_results_from(body)
    }
}

fn student_results_from(body: Value) -> Result<StudentResults, ApiError> {
    match unwrap_data(body) {
        Value::Array(attempts) => Ok(StudentResults {
            student: None,
            attempts: serde_json::from_value(Value::Array(attempts))?,
        }),
        other => decode(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(score: f64, max: f64, tabs: u32) -> ResultSummary {
        serde_json::from_value(json!({
            "student_id": "s1",
            "score": score,
            "max_score": max,
            "tab_switch_count": tabs
        }))
        .unwrap()
    }

    #[test]
    fn violations_in_either_shape() {
        let counted: Telemetry = serde_json::from_value(json!({ "violations": 2 })).unwrap();
        assert_eq!(counted.violations.count(), 2);
        let listed: Telemetry = serde_json::from_value(json!({
            "violations": [{ "type": "copy", "timestamp": "2024-03-01T10:00:00Z" }]
        }))
        .unwrap();
        assert_eq!(listed.violations.count(), 1);
        assert!(listed.flagged());
        assert!(!Telemetry::default().flagged());
    }

    #[test]
    fn leaving_full_screen_flags() {
        let telemetry: Telemetry = serde_json::from_value(json!({ "full_screen": false })).unwrap();
        assert!(telemetry.flagged());
    }

    #[test]
    fn overview_figures() {
        let results = vec![summary(8.0, 10.0, 0), summary(5.0, 10.0, 3), summary(0.0, 0.0, 0)];
        let overview = ResultsOverview::from_results(&results);
        assert_eq!(overview.attempts, 3);
        assert_eq!(overview.average_percentage, Some(65.0));
        assert_eq!(overview.highest, Some(80.0));
        assert_eq!(overview.lowest, Some(50.0));
        assert_eq!(overview.flagged, 1);
        assert_eq!(ResultsOverview::from_results(&[]).average_percentage, None);
    }

    #[test]
    fn student_results_accept_bare_arrays() {
        let results = student_results_from(json!([
            {
                "test_title": "Midterm",
                "obtained_marks": 4,
                "total_marks": 5,
                "questions": [{ "question_id": 1, "snapshot": { "question": "2 + 2?" }, "response": [1] }]
            }
        ]))
        .unwrap();
        assert!(results.student.is_none());
        assert_eq!(results.attempts[0].test_name, "Midterm");
        assert_eq!(results.attempts[0].answers[0].question_text(), Some("2 + 2?"));

        let wrapped = student_results_from(json!({
            "data": { "student": { "id": "s9", "name": "Asha" }, "results": [] }
        }))
        .unwrap();
        assert_eq!(wrapped.student.map(|s| s.name), Some("Asha".to_string()));
    }
}
