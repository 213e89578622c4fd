use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::decode;
use super::{ApiClient, ApiError};
use crate::builder::EntryId;
use crate::pagination::Paginated;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub input: String,
    #[serde(default, alias = "output")]
    pub expected_output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodingQuestion {
    #[serde(alias = "_id")]
    pub id: EntryId,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "problem_statement")]
    pub description: String,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default, alias = "supported_languages")]
    pub languages: Vec<String>,
    #[serde(default, alias = "sample_test_cases")]
    pub examples: Vec<TestCase>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    pub language: String,
    pub source_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_input: Option<String>,
}

impl RunRequest {
    pub fn new(language: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            source_code: source_code.into(),
            custom_input: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaseResult {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default, alias = "output")]
    pub actual_output: String,
    #[serde(default)]
    pub passed: bool,
    /// hidden cases come back without their input and expected output
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunOutcome {
    #[serde(default, alias = "test_results")]
    pub results: Vec<CaseResult>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default, alias = "compile_output")]
    pub compile_error: Option<String>,
}

impl RunOutcome {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        self.compile_error.as_deref().map_or(true, |e| e.trim().is_empty())
            && !self.results.is_empty()
            && self.passed_count() == self.results.len()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    #[serde(default, alias = "_id")]
    pub id: Option<EntryId>,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "passed_count")]
    pub passed: u32,
    #[serde(default, alias = "total_count")]
    pub total: u32,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

fn question_path(collection: &str, id: &str) -> String {
    format!("/coding/questions/{}/{}", collection, id)
}

impl ApiClient {
    pub fn get_coding_question(&self, collection: &str, id: &str) -> Result<CodingQuestion, ApiError> {
        decode(self.get_value(&question_path(collection, id), &[])?)
    }

    /// Runs code against the sample cases without recording a submission.
    pub fn run_code(&self, collection: &str, id: &str, request: &RunRequest) -> Result<RunOutcome, ApiError> {
        let path = format!("{}/run-code", question_path(collection, id));
        let outcome: RunOutcome = decode(self.send_value("POST", &path, request)?)?;
        debug!(passed = outcome.passed_count(), total = outcome.results.len(), "code run finished");
        Ok(outcome)
    }

    /// Runs code against every case, hidden ones included.
    pub fn mock_submit(&self, collection: &str, id: &str, request: &RunRequest) -> Result<RunOutcome, ApiError> {
        let path = format!("{}/mock-submit", question_path(collection, id));
        decode(self.send_value("POST", &path, request)?)
    }

    pub fn my_submissions(&self, collection: &str, id: &str) -> Result<Vec<Submission>, ApiError> {
        let path = format!("{}/my-submissions", question_path(collection, id));
        let body = self.get_value(&path, &[])?;
        Ok(Paginated::from_body(body, 1, usize::MAX)?.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_counts_passes() {
        let outcome: RunOutcome = serde_json::from_value(json!({
            "test_results": [
                { "input": "1", "expected_output": "1", "output": "1", "passed": true },
                { "hidden": true, "passed": false }
            ]
        }))
        .unwrap();
        assert_eq!(outcome.passed_count(), 1);
        assert!(!outcome.all_passed());
    }

    #[test]
    fn compile_errors_fail_the_run() {
        let outcome: RunOutcome = serde_json::from_value(json!({
            "results": [{ "passed": true }],
            "compile_output": "main.c:1: error"
        }))
        .unwrap();
        assert!(!outcome.all_passed());
        assert!(!RunOutcome::default().all_passed());
    }

    #[test]
    fn run_request_skips_missing_input() {
        let body = serde_json::to_value(RunRequest::new("python", "print(1)")).unwrap();
        assert_eq!(body, json!({ "language": "python", "source_code": "print(1)" }));
    }

    #[test]
    fn submissions_from_either_shape() {
        let list: Vec<Submission> = Paginated::from_body(
            json!({ "submissions": [{ "_id": 3, "status": "accepted", "passed_count": 4, "total": 4 }] }),
            1,
            usize::MAX,
        )
        .unwrap()
        .items;
        assert_eq!(list[0].passed, 4);
        let bare: Paginated<Submission> = Paginated::from_body(json!([{ "language": "rust" }]), 1, usize::MAX).unwrap();
        assert_eq!(bare.items[0].language, "rust");
    }
}
