//! Answer presentation order
//!
//! Every time the active question changes, its correct answer and its
//! incorrect answers are merged and put into a random order so the position
//! of the correct answer gives nothing away.

use std::iter;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The answers of a question in the order they are shown to the user
///
/// Always a permutation of the question's incorrect answers plus its
/// correct answer.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Deref,
)]
pub struct PresentedAnswers(Vec<String>);

impl PresentedAnswers {
    /// Whether `value` is one of the presented answers
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|answer| answer == value)
    }

    /// Consumes the set, returning the answers in presentation order
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Shuffles a question's answers using a freshly seeded generator
///
/// # Arguments
///
/// * `correct` - The correct answer of the question
/// * `incorrect` - The incorrect answers of the question, possibly empty
///
/// # Returns
///
/// The answers in a uniformly random order
pub fn shuffle(correct: &str, incorrect: &[String]) -> PresentedAnswers {
    shuffle_with(&mut fastrand::Rng::new(), correct, incorrect)
}

/// Shuffles a question's answers with the given generator
///
/// Builds `[...incorrect, correct]` and applies a Fisher–Yates pass from the
/// back, so every permutation is equally likely.
pub fn shuffle_with(
    rng: &mut fastrand::Rng,
    correct: &str,
    incorrect: &[String],
) -> PresentedAnswers {
    let mut answers = incorrect
        .iter()
        .cloned()
        .chain(iter::once(correct.to_owned()))
        .collect_vec();

    for i in (1..answers.len()).rev() {
        let j = rng.usize(..=i);
        answers.swap(i, j);
    }

    PresentedAnswers(answers)
}
