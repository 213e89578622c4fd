use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Image, ValidationError};
use crate::catalog::{self, DifficultyLevel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    #[default]
    Minutes,
    Hours,
}

impl TimeUnit {
    pub fn factor(self) -> u64 {
        match self {
            TimeUnit::Seconds => 1,
            TimeUnit::Minutes => 60,
            TimeUnit::Hours => 3600,
        }
    }

    pub fn to_seconds(self, amount: f64) -> f64 {
        amount * self.factor() as f64
    }

    /// Largest unit that expresses `seconds` exactly.
    pub fn for_seconds(seconds: u64) -> Self {
        if seconds > 0 && seconds % 3600 == 0 {
            TimeUnit::Hours
        } else if seconds > 0 && seconds % 60 == 0 {
            TimeUnit::Minutes
        } else {
            TimeUnit::Seconds
        }
    }
}

/// A number as stored by the backend or typed into a draft: `5`, `"5"`, `2.5`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl fmt::Display for LooseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LooseNumber::Number(n) => write!(f, "{}", n),
            LooseNumber::Text(s) => f.write_str(s.trim()),
        }
    }
}

impl LooseNumber {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LooseNumber::Number(n) => Some(*n),
            LooseNumber::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Scalar fields every question builder edits, held as the user typed them.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionFields {
    pub question: String,
    pub explanation: String,
    pub question_images: Vec<Image>,
    pub explanation_images: Vec<Image>,
    pub marks: String,
    pub negative_marks: String,
    pub time_limit: String,
    pub time_unit: TimeUnit,
    pub difficulty_level: DifficultyLevel,
    pub topic: String,
    pub subtopic: String,
    /// comma separated
    pub tags: String,
}

impl Default for QuestionFields {
    fn default() -> Self {
        Self {
            question: String::new(),
            explanation: String::new(),
            question_images: Vec::new(),
            explanation_images: Vec::new(),
            marks: String::from("1"),
            negative_marks: String::from("0"),
            time_limit: String::from("1"),
            time_unit: TimeUnit::Minutes,
            difficulty_level: DifficultyLevel::Easy,
            topic: String::new(),
            subtopic: String::new(),
            tags: String::new(),
        }
    }
}

/// Numeric fields after coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Scores {
    pub marks: f64,
    pub negative_marks: f64,
    pub time_limit: u64,
}

impl QuestionFields {
    /// Sets the time limit from a number of seconds, picking a display unit.
    pub fn set_time_limit_seconds(&mut self, seconds: u64) {
        let unit = TimeUnit::for_seconds(seconds);
        self.time_unit = unit;
        self.time_limit = (seconds / unit.factor()).to_string();
    }

    pub fn tag_list(&self) -> Vec<String> {
        parse_tags(&self.tags)
    }

    pub(crate) fn check_text(&self) -> Result<(), ValidationError> {
        if self.question.trim().is_empty() {
            return Err(ValidationError::MissingQuestion);
        }
        if self.topic.trim().is_empty() {
            return Err(ValidationError::MissingTopic);
        }
        let subtopic = self.subtopic.trim();
        if !subtopic.is_empty() && !catalog::is_known_subtopic(&self.topic, subtopic) {
            return Err(ValidationError::UnknownSubtopic {
                topic: self.topic.trim().to_string(),
                subtopic: subtopic.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_scores(&self) -> Result<Scores, ValidationError> {
        let marks = non_negative(&self.marks, "marks")?;
        let negative_marks = non_negative(&self.negative_marks, "negative marks")?;

        let amount = number(&self.time_limit, "time limit")?;
        let seconds = self.time_unit.to_seconds(amount).round();
        if seconds < 1.0 {
            return Err(ValidationError::NonPositiveTime);
        }

        Ok(Scores {
            marks,
            negative_marks,
            time_limit: seconds as u64,
        })
    }
}

fn number(text: &str, field: &'static str) -> Result<f64, ValidationError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(ValidationError::NotANumber { field })
}

fn non_negative(text: &str, field: &'static str) -> Result<f64, ValidationError> {
    let n = number(text, field)?;
    if n < 0.0 {
        return Err(ValidationError::Negative { field });
    }
    Ok(n)
}

/// Splits comma separated tags into trimmed, non-empty strings.
pub fn parse_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> QuestionFields {
        QuestionFields {
            question: "What is 2 + 2?".into(),
            topic: "Aptitude".into(),
            ..QuestionFields::default()
        }
    }

    #[test]
    fn tags_are_trimmed_and_filtered() {
        assert_eq!(parse_tags(" arrays, ,sorting ,,"), vec!["arrays", "sorting"]);
        assert!(parse_tags("  ").is_empty());
    }

    #[test]
    fn time_is_converted_to_seconds() {
        let mut f = fields();
        f.time_limit = "1.5".into();
        f.time_unit = TimeUnit::Hours;
        assert_eq!(f.check_scores().unwrap().time_limit, 5400);

        f.time_limit = "0".into();
        assert_eq!(f.check_scores(), Err(ValidationError::NonPositiveTime));
    }

    #[test]
    fn marks_must_be_non_negative_numbers() {
        let mut f = fields();
        f.marks = "two".into();
        assert_eq!(
            f.check_scores(),
            Err(ValidationError::NotANumber { field: "marks" })
        );
        f.marks = "2".into();
        f.negative_marks = "-1".into();
        assert_eq!(
            f.check_scores(),
            Err(ValidationError::Negative {
                field: "negative marks"
            })
        );
    }

    #[test]
    fn subtopic_must_fit_topic() {
        let mut f = fields();
        f.subtopic = "Graphs".into();
        assert!(matches!(
            f.check_text(),
            Err(ValidationError::UnknownSubtopic { .. })
        ));
        f.subtopic = "Quantitative".into();
        assert_eq!(f.check_text(), Ok(()));
    }

    #[test]
    fn display_unit_follows_seconds() {
        let mut f = fields();
        f.set_time_limit_seconds(7200);
        assert_eq!((f.time_limit.as_str(), f.time_unit), ("2", TimeUnit::Hours));
        f.set_time_limit_seconds(90);
        assert_eq!((f.time_limit.as_str(), f.time_unit), ("90", TimeUnit::Seconds));
    }
}
