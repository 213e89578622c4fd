//! Topic, subtopic and difficulty tables used by every question screen.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const TOPICS: &[(&str, &[&str])] = &[
    (
        "Aptitude",
        &["Quantitative", "Logical Reasoning", "Verbal Ability", "Data Interpretation"],
    ),
    ("Programming", &["C", "C++", "Java", "Python", "JavaScript"]),
    (
        "Data Structures",
        &["Arrays", "Strings", "Linked Lists", "Stacks and Queues", "Trees", "Graphs", "Hashing"],
    ),
    (
        "Algorithms",
        &["Sorting", "Searching", "Recursion", "Greedy", "Dynamic Programming"],
    ),
    (
        "Databases",
        &["SQL", "Normalization", "Transactions", "Indexing"],
    ),
    (
        "Operating Systems",
        &["Processes", "Scheduling", "Memory Management", "File Systems", "Concurrency"],
    ),
    (
        "Computer Networks",
        &["OSI Model", "TCP/IP", "Routing", "Application Layer"],
    ),
];

pub fn topics() -> impl Iterator<Item = &'static str> {
    TOPICS.iter().map(|(topic, _)| *topic)
}

/// Subtopics of `topic`, matched case-insensitively. `None` for topics
/// outside the table.
pub fn subtopics(topic: &str) -> Option<&'static [&'static str]> {
    let topic = topic.trim();
    TOPICS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(topic))
        .map(|(_, subs)| *subs)
}

/// Whether `subtopic` may be used with `topic`. Topics outside the table are
/// custom and accept any subtopic.
pub fn is_known_subtopic(topic: &str, subtopic: &str) -> bool {
    let subtopic = subtopic.trim();
    match subtopics(topic) {
        Some(subs) => subs.iter().any(|s| s.eq_ignore_ascii_case(subtopic)),
        None => true,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [DifficultyLevel::Easy, DifficultyLevel::Medium, DifficultyLevel::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Medium => "medium",
            DifficultyLevel::Hard => "hard",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DifficultyLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown difficulty level '{}'", s))
    }
}
