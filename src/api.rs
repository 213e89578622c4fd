mod client;
mod coding;
mod error;
mod images;
mod questions;
mod results;
mod students;

pub use client::ApiClient;
pub use coding::{CaseResult, CodingQuestion, RunOutcome, RunRequest, Submission, TestCase};
pub use error::{extract_error_message, ApiError};
pub use images::{ImageUploader, MCQ_IMAGES, REARRANGE_IMAGES};
pub use questions::{QuestionKind, QuestionSummary, Scope};
pub use results::{
    AnsweredQuestion, AttemptDetail, ResultSummary, ResultsOverview, ResultsQuery, StudentResults, Telemetry,
    Violation, Violations,
};
pub use students::{NewStudent, Student, StudentQuery};
