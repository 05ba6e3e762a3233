//! Built-in question bank used when the external question source fails.

use crate::state::room::{Difficulty, Question};

/// Per-difficulty fallback bank.
///
/// The bank is the deterministic safety net behind the external question
/// source: given any non-empty difficulty bucket it produces exactly the
/// requested number of questions by cycling the bucket, so a failed
/// generation never leaves a room with a short quiz.
#[derive(Debug, Clone)]
pub struct FallbackBank {
    easy: Vec<Question>,
    medium: Vec<Question>,
    hard: Vec<Question>,
}

impl FallbackBank {
    /// Build a bank from explicit per-difficulty buckets.
    pub fn new(easy: Vec<Question>, medium: Vec<Question>, hard: Vec<Question>) -> Self {
        Self { easy, medium, hard }
    }

    /// The bucket backing a difficulty level.
    pub fn bucket(&self, difficulty: Difficulty) -> &[Question] {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    /// Produce exactly `count` questions by cycling the difficulty's bucket.
    ///
    /// Deterministic: the same inputs always yield the same list. Returns an
    /// empty list only when the bucket itself is empty, which callers treat
    /// as an unrecoverable generation failure.
    pub fn questions(&self, difficulty: Difficulty, count: u8) -> Vec<Question> {
        let bucket = self.bucket(difficulty);
        if bucket.is_empty() {
            return Vec::new();
        }

        bucket
            .iter()
            .cycle()
            .take(usize::from(count))
            .cloned()
            .collect()
    }
}

impl Default for FallbackBank {
    fn default() -> Self {
        Self {
            easy: built_in(&[
                (
                    "What is the capital of France?",
                    &["London", "Berlin", "Paris", "Madrid"],
                    "Paris",
                ),
                (
                    "Which planet is known as the Red Planet?",
                    &["Venus", "Mars", "Jupiter", "Saturn"],
                    "Mars",
                ),
                ("What is 2 + 2?", &["3", "4", "5", "6"], "4"),
                (
                    "What is the largest ocean on Earth?",
                    &["Atlantic", "Indian", "Arctic", "Pacific"],
                    "Pacific",
                ),
                (
                    "How many days are in a leap year?",
                    &["365", "366", "367", "364"],
                    "366",
                ),
            ]),
            medium: built_in(&[
                (
                    "Which element has the chemical symbol 'O'?",
                    &["Gold", "Oxygen", "Silver", "Iron"],
                    "Oxygen",
                ),
                (
                    "In which year did World War II end?",
                    &["1944", "1945", "1946", "1947"],
                    "1945",
                ),
                ("What is the square root of 64?", &["6", "7", "8", "9"], "8"),
                (
                    "Which organ in the human body produces insulin?",
                    &["Liver", "Kidney", "Pancreas", "Heart"],
                    "Pancreas",
                ),
                (
                    "What is the currency of Japan?",
                    &["Yuan", "Won", "Yen", "Rupee"],
                    "Yen",
                ),
            ]),
            hard: built_in(&[
                (
                    "What is the smallest prime number?",
                    &["0", "1", "2", "3"],
                    "2",
                ),
                (
                    "Which scientist developed the theory of relativity?",
                    &["Newton", "Einstein", "Galileo", "Darwin"],
                    "Einstein",
                ),
                (
                    "What is the chemical formula for water?",
                    &["H2O", "CO2", "NaCl", "CH4"],
                    "H2O",
                ),
                (
                    "In which continent is the Sahara Desert located?",
                    &["Asia", "Australia", "Africa", "South America"],
                    "Africa",
                ),
                (
                    "What is the hardest natural substance on Earth?",
                    &["Gold", "Iron", "Diamond", "Platinum"],
                    "Diamond",
                ),
            ]),
        }
    }
}

fn built_in(entries: &[(&str, &[&str], &str)]) -> Vec<Question> {
    entries
        .iter()
        .map(|(text, options, correct)| Question {
            text: (*text).to_owned(),
            options: options.iter().map(|option| (*option).to_owned()).collect(),
            correct_option: (*correct).to_owned(),
        })
        .collect()
}
