//! Trivia questions
//!
//! Questions arrive from an external source that has already been fetched.
//! They are checked once when they are built or decoded, so the session
//! controller only ever sees well-formed records.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised for malformed question data
#[derive(Error, Debug)]
pub enum Error {
    /// A field is outside of its allowed bounds
    #[error("invalid question: {0}")]
    Invalid(#[from] garde::Report),
    /// The record carries no correct answer at all
    #[error("question has no correct answer")]
    MissingCorrectAnswer,
    /// The correct answer is also listed as an incorrect one
    #[error("answer {0:?} is listed as both correct and incorrect")]
    AmbiguousAnswer(String),
    /// The payload is not valid JSON for a list of questions
    #[error("malformed question payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single multiple-choice question
///
/// The wire shape follows the trivia API: the prompt is nested under
/// `question.text` and the answers use camelCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(try_from = "RawQuestion", into = "RawQuestion")]
pub struct Question {
    /// The question prompt
    #[garde(length(max = crate::constants::question::MAX_TEXT_LENGTH))]
    text: String,
    /// The only answer that scores
    #[garde(length(min = 1, max = crate::constants::question::MAX_ANSWER_LENGTH))]
    correct_answer: String,
    /// The distractors, in source order
    #[garde(
        length(max = crate::constants::question::MAX_INCORRECT_ANSWER_COUNT),
        inner(length(min = 1, max = crate::constants::question::MAX_ANSWER_LENGTH))
    )]
    incorrect_answers: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct Prompt {
    text: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    question: Prompt,
    correct_answer: Option<String>,
    #[serde(default)]
    incorrect_answers: Vec<String>,
}

impl TryFrom<RawQuestion> for Question {
    type Error = Error;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        Self::new(
            raw.question.text,
            raw.correct_answer.ok_or(Error::MissingCorrectAnswer)?,
            raw.incorrect_answers,
        )
    }
}

impl From<Question> for RawQuestion {
    fn from(question: Question) -> Self {
        Self {
            question: Prompt {
                text: question.text,
            },
            correct_answer: Some(question.correct_answer),
            incorrect_answers: question.incorrect_answers,
        }
    }
}

impl Question {
    /// Builds a question, rejecting malformed data
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalid`] when a field is empty or too long, and
    /// [`Error::AmbiguousAnswer`] when the correct answer is repeated among
    /// the incorrect ones, which would make answers indistinguishable by value.
    pub fn new(
        text: impl Into<String>,
        correct_answer: impl Into<String>,
        incorrect_answers: Vec<String>,
    ) -> Result<Self, Error> {
        let question = Self {
            text: text.into(),
            correct_answer: correct_answer.into(),
            incorrect_answers,
        };

        question.validate()?;

        if question.incorrect_answers.contains(&question.correct_answer) {
            return Err(Error::AmbiguousAnswer(question.correct_answer));
        }

        Ok(question)
    }

    /// The question prompt
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The correct answer
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// The incorrect answers in source order
    pub fn incorrect_answers(&self) -> &[String] {
        &self.incorrect_answers
    }

    /// Whether `answer` is the correct one
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

/// Decodes an already-fetched trivia API payload into questions
///
/// # Errors
///
/// Returns [`Error::Json`] if the payload is not a JSON list of questions,
/// otherwise the first validation error among its entries.
pub fn parse_questions(payload: &str) -> Result<Vec<Question>, Error> {
    let raw: Vec<RawQuestion> = serde_json::from_str(payload)?;
    raw.into_iter().map(Question::try_from).collect()
}
