//! Quiz session controller
//!
//! This module owns the lifecycle of a single-player timed trivia run: which
//! question is active, the order its answers are shown in, the user's
//! selection, the score, the answer history and the countdown that ends the
//! run when time is up. Everything the presentation layer needs is pushed
//! through a [`Tunnel`] after each change.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use web_time::Duration;

use crate::{
    AlarmMessage, SyncMessage,
    config::Options,
    constants::{question::MAX_QUESTION_COUNT, session::PASS_RATIO},
    question::{self, Question},
    shuffle::{self, PresentedAnswers},
    timer::{self, CountdownListener, CountdownTimer},
    tunnel::Tunnel,
};

/// Lifecycle status of a session
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
pub enum Status {
    /// No session is running
    #[default]
    NotStarted,
    /// Questions are being answered
    InProgress,
    /// Every question was answered or time ran out
    Completed,
}

/// Errors returned by session operations
///
/// A failed operation never changes the session state.
#[derive(Error, Debug)]
pub enum Error {
    /// A session needs at least one question
    #[error("cannot start a session without questions")]
    EmptyQuestionSet,
    /// A session accepts a bounded number of questions
    #[error("{count} questions exceed the maximum of {max}")]
    TooManyQuestions {
        /// Number of questions supplied
        count: usize,
        /// Maximum number of questions accepted
        max: usize,
    },
    /// The operation is not valid in the current status
    #[error("cannot {operation} while {status}")]
    InvalidState {
        /// The rejected operation
        operation: &'static str,
        /// Status at the time of the call
        status: Status,
    },
    /// Advancing requires a selected answer
    #[error("no answer selected")]
    NoAnswerSelected,
    /// The selected value is not one of the presented answers
    #[error("{0:?} is not one of the presented answers")]
    UnknownAnswer(String),
    /// Question data was malformed
    #[error(transparent)]
    QuestionData(#[from] question::Error),
    /// The countdown was misused
    #[error(transparent)]
    Countdown(#[from] timer::Error),
    /// Session options are out of bounds
    #[error("invalid options: {0}")]
    Options(#[from] garde::Report),
}

/// The recorded outcome of one answered question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// The question prompt
    pub question: String,
    /// The answer the user picked
    pub user_answer: String,
    /// The answer that would have scored
    pub correct_answer: String,
}

impl Response {
    /// Whether the user picked the correct answer
    pub fn is_correct(&self) -> bool {
        self.user_answer == self.correct_answer
    }
}

/// Score of a completed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    /// Number of correct answers
    pub score: usize,
    /// Number of questions in the session
    pub total: usize,
}

impl FinalScore {
    /// Whether at least half of the questions were answered correctly
    pub fn passed(&self) -> bool {
        self.total > 0 && self.score as f64 / self.total as f64 >= PASS_RATIO
    }
}

/// Session events surfaced to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub enum UpdateMessage {
    /// The session reached `Completed`
    Completed {
        /// Number of correct answers
        score: usize,
        /// Number of questions
        total: usize,
        /// Whether the pass ratio was reached
        passed: bool,
        /// Whether completion was forced by the countdown
        timed_out: bool,
    },
}

/// The complete mutable state of a session
///
/// Exposed read-only; only [`QuizSession`] operations change it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    status: Status,
    questions: Vec<Question>,
    current_index: usize,
    current_answers: PresentedAnswers,
    selected_answer: Option<String>,
    score: usize,
    time_remaining: u64,
    time_warning_raised: bool,
    responses: Vec<Response>,
}

impl SessionState {
    /// Lifecycle status
    pub fn status(&self) -> Status {
        self.status
    }

    /// The questions of the session
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Index of the active question
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The active question, if any
    pub fn current_question(&self) -> Option<&Question> {
        match self.status {
            Status::InProgress => self.questions.get(self.current_index),
            Status::NotStarted | Status::Completed => None,
        }
    }

    /// Answers of the active question in presentation order
    pub fn current_answers(&self) -> &PresentedAnswers {
        &self.current_answers
    }

    /// The answer currently selected, if any
    pub fn selected_answer(&self) -> Option<&str> {
        self.selected_answer.as_deref()
    }

    /// Number of correct answers so far
    pub fn score(&self) -> usize {
        self.score
    }

    /// Seconds left on the countdown
    pub fn time_remaining(&self) -> u64 {
        self.time_remaining
    }

    /// Whether the low-time warning has been raised
    pub fn time_warning_raised(&self) -> bool {
        self.time_warning_raised
    }

    /// Answer history in question order
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// Share of the questions answered so far, between 0 and 1
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            0.
        } else {
            self.responses.len() as f64 / self.questions.len() as f64
        }
    }

    fn final_score(&self) -> FinalScore {
        FinalScore {
            score: self.score,
            total: self.questions.len(),
        }
    }

    fn complete(&mut self) {
        self.status = Status::Completed;
        self.selected_answer = None;
        self.current_answers = PresentedAnswers::default();
    }
}

/// Forwards countdown callbacks into the session state and the tunnel
struct CountdownRelay<'a, T: Tunnel> {
    state: &'a mut SessionState,
    tunnel: &'a T,
}

impl<T: Tunnel> CountdownListener for CountdownRelay<'_, T> {
    fn on_tick(&mut self, remaining: u64) {
        self.state.time_remaining = remaining;
        self.tunnel
            .send_message(&timer::UpdateMessage::Tick { remaining }.into());
    }

    fn on_warning(&mut self, remaining: u64) {
        self.state.time_warning_raised = true;
        debug!(remaining, "low time warning");
        self.tunnel
            .send_message(&timer::UpdateMessage::Warning { remaining }.into());
    }

    fn on_expire(&mut self) {
        self.tunnel.send_message(&timer::UpdateMessage::Expired.into());

        if self.state.status == Status::InProgress {
            self.state.complete();
            let final_score = self.state.final_score();
            info!(
                score = final_score.score,
                total = final_score.total,
                answered = self.state.responses.len(),
                "session timed out"
            );
            self.tunnel.send_message(
                &UpdateMessage::Completed {
                    score: final_score.score,
                    total: final_score.total,
                    passed: final_score.passed(),
                    timed_out: true,
                }
                .into(),
            );
        }
    }
}

/// Controller for a single-player timed trivia session
#[derive(Debug, Clone)]
pub struct QuizSession {
    options: Options,
    state: SessionState,
    timer: CountdownTimer,
    rng: fastrand::Rng,
}

impl QuizSession {
    /// Creates a session controller with the given options
    ///
    /// # Errors
    ///
    /// Returns [`Error::Options`] if the options are out of bounds.
    pub fn new(options: Options) -> Result<Self, Error> {
        Self::with_rng(options, fastrand::Rng::new())
    }

    /// Creates a session controller whose answer order follows `seed`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Options`] if the options are out of bounds.
    pub fn with_seed(options: Options, seed: u64) -> Result<Self, Error> {
        Self::with_rng(options, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(options: Options, rng: fastrand::Rng) -> Result<Self, Error> {
        options.validate()?;

        Ok(Self {
            options,
            state: SessionState::default(),
            timer: CountdownTimer::new(options.warning_threshold()),
            rng,
        })
    }

    /// Read-only view of the session state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The options this controller was created with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Full snapshot for a presentation layer that connects mid-session
    pub fn sync_message(&self) -> SyncMessage {
        SyncMessage::Session(self.state.clone())
    }

    /// Starts a session over `questions`
    ///
    /// The first question becomes active with freshly shuffled answers, the
    /// score and history are cleared, and the countdown starts with the full
    /// budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyQuestionSet`] if `questions` is empty,
    /// [`Error::TooManyQuestions`] if it holds more than
    /// [`MAX_QUESTION_COUNT`] questions, and
    /// [`Error::InvalidState`] if a session is already in progress.
    pub fn start<S: FnMut(AlarmMessage, Duration), T: Tunnel>(
        &mut self,
        questions: Vec<Question>,
        schedule_message: S,
        tunnel: &T,
    ) -> Result<(), Error> {
        self.ensure_not(Status::InProgress, "start")?;
        if questions.is_empty() {
            return Err(Error::EmptyQuestionSet);
        }
        if questions.len() > MAX_QUESTION_COUNT {
            return Err(Error::TooManyQuestions {
                count: questions.len(),
                max: MAX_QUESTION_COUNT,
            });
        }

        self.begin(questions, schedule_message, tunnel)
    }

    /// Decodes a trivia API payload and starts a session over it
    ///
    /// # Errors
    ///
    /// Returns [`Error::QuestionData`] if the payload is malformed, otherwise
    /// the same errors as [`QuizSession::start`].
    pub fn start_from_json<S: FnMut(AlarmMessage, Duration), T: Tunnel>(
        &mut self,
        payload: &str,
        schedule_message: S,
        tunnel: &T,
    ) -> Result<(), Error> {
        let questions = question::parse_questions(payload)?;
        self.start(questions, schedule_message, tunnel)
    }

    /// Selects one of the presented answers for the active question
    ///
    /// Selecting again replaces the previous selection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless a session is in progress and
    /// [`Error::UnknownAnswer`] if `value` was not presented.
    pub fn select_answer<T: Tunnel>(&mut self, value: &str, tunnel: &T) -> Result<(), Error> {
        self.ensure(Status::InProgress, "select an answer")?;
        if !self.state.current_answers.contains(value) {
            return Err(Error::UnknownAnswer(value.to_owned()));
        }

        debug!(index = self.state.current_index, answer = value, "answer selected");
        self.state.selected_answer = Some(value.to_owned());
        self.sync(tunnel);

        Ok(())
    }

    /// Records the selected answer and moves to the next question
    ///
    /// After the last question the session completes and the countdown is
    /// cancelled before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless a session is in progress and
    /// [`Error::NoAnswerSelected`] if nothing is selected.
    pub fn advance<T: Tunnel>(&mut self, tunnel: &T) -> Result<(), Error> {
        self.ensure(Status::InProgress, "advance")?;
        let Some(selected) = self.state.selected_answer.take() else {
            return Err(Error::NoAnswerSelected);
        };

        let question = &self.state.questions[self.state.current_index];
        let correct = question.is_correct(&selected);
        let response = Response {
            question: question.text().to_owned(),
            user_answer: selected,
            correct_answer: question.correct_answer().to_owned(),
        };

        debug!(index = self.state.current_index, correct, "question answered");

        self.state.responses.push(response);
        if correct {
            self.state.score += 1;
        }

        if self.state.current_index + 1 < self.state.questions.len() {
            self.state.current_index += 1;
            self.shuffle_current();
            self.sync(tunnel);
        } else {
            self.timer.cancel();
            self.state.complete();
            self.announce_completion(tunnel);
        }

        Ok(())
    }

    /// Restarts the session over the same questions
    ///
    /// Valid from any status once questions have been loaded. A running
    /// countdown is cancelled and a new one starts with the full budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if no questions were ever loaded or the
    /// session was exited.
    pub fn retry<S: FnMut(AlarmMessage, Duration), T: Tunnel>(
        &mut self,
        schedule_message: S,
        tunnel: &T,
    ) -> Result<(), Error> {
        if self.state.questions.is_empty() {
            return Err(Error::InvalidState {
                operation: "retry",
                status: self.state.status,
            });
        }

        self.timer.cancel();
        let questions = self.state.questions.clone();
        self.begin(questions, schedule_message, tunnel)
    }

    /// Abandons the session and returns to `NotStarted`
    ///
    /// The countdown is cancelled before this returns, so no tick scheduled
    /// earlier changes the state afterwards. Calling it repeatedly is safe.
    pub fn exit<T: Tunnel>(&mut self, tunnel: &T) {
        self.timer.cancel();
        if self.state != SessionState::default() {
            debug!(status = %self.state.status, "session exited");
        }
        self.state = SessionState::default();
        self.sync(tunnel);
    }

    /// Score of the completed session
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the session is completed.
    pub fn final_score(&self) -> Result<FinalScore, Error> {
        self.ensure(Status::Completed, "read the final score")?;
        Ok(self.state.final_score())
    }

    /// Handles an alarm delivered by the driver
    ///
    /// Countdown ticks update the remaining time, may raise the low-time
    /// warning, and complete the session on expiry. Alarms from a cancelled
    /// or earlier countdown are ignored.
    pub fn receive_alarm<S: FnMut(AlarmMessage, Duration), T: Tunnel>(
        &mut self,
        message: &AlarmMessage,
        schedule_message: S,
        tunnel: &T,
    ) {
        match message {
            AlarmMessage::Countdown(message) => {
                let mut relay = CountdownRelay {
                    state: &mut self.state,
                    tunnel,
                };
                if self.timer.receive_alarm(message, schedule_message, &mut relay) {
                    self.sync(tunnel);
                }
            }
        }
    }

    fn begin<S: FnMut(AlarmMessage, Duration), T: Tunnel>(
        &mut self,
        questions: Vec<Question>,
        schedule_message: S,
        tunnel: &T,
    ) -> Result<(), Error> {
        self.timer
            .start(self.options.duration(), schedule_message)?;

        self.state = SessionState {
            status: Status::InProgress,
            questions,
            time_remaining: self.options.duration(),
            ..SessionState::default()
        };
        self.shuffle_current();

        info!(
            questions = self.state.questions.len(),
            duration = self.options.duration(),
            "session started"
        );

        self.sync(tunnel);

        Ok(())
    }

    fn shuffle_current(&mut self) {
        let question = &self.state.questions[self.state.current_index];
        self.state.current_answers = shuffle::shuffle_with(
            &mut self.rng,
            question.correct_answer(),
            question.incorrect_answers(),
        );
    }

    fn announce_completion<T: Tunnel>(&self, tunnel: &T) {
        let final_score = self.state.final_score();
        info!(
            score = final_score.score,
            total = final_score.total,
            "session completed"
        );
        tunnel.send_message(
            &UpdateMessage::Completed {
                score: final_score.score,
                total: final_score.total,
                passed: final_score.passed(),
                timed_out: false,
            }
            .into(),
        );
        self.sync(tunnel);
    }

    fn sync<T: Tunnel>(&self, tunnel: &T) {
        tunnel.send_state(&self.sync_message());
    }

    fn ensure(&self, status: Status, operation: &'static str) -> Result<(), Error> {
        if self.state.status == status {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                status: self.state.status,
            })
        }
    }

    fn ensure_not(&self, status: Status, operation: &'static str) -> Result<(), Error> {
        if self.state.status == status {
            Err(Error::InvalidState {
                operation,
                status: self.state.status,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{UpdateMessage as Update, timer::TimerState};

    #[derive(Default)]
    struct MockTunnel {
        messages: RefCell<Vec<Update>>,
        states: RefCell<Vec<SyncMessage>>,
    }

    impl Tunnel for MockTunnel {
        fn send_message(&self, message: &Update) {
            self.messages.borrow_mut().push(message.clone());
        }

        fn send_state(&self, state: &SyncMessage) {
            self.states.borrow_mut().push(state.clone());
        }
    }

    impl MockTunnel {
        fn completions(&self) -> Vec<(usize, usize, bool, bool)> {
            self.messages
                .borrow()
                .iter()
                .filter_map(|message| match message {
                    Update::Session(UpdateMessage::Completed {
                        score,
                        total,
                        passed,
                        timed_out,
                    }) => Some((*score, *total, *passed, *timed_out)),
                    Update::Countdown(_) => None,
                })
                .collect()
        }

        fn warnings(&self) -> usize {
            self.messages
                .borrow()
                .iter()
                .filter(|message| {
                    matches!(message, Update::Countdown(timer::UpdateMessage::Warning { .. }))
                })
                .count()
        }
    }

    type Alarms = Rc<RefCell<Vec<AlarmMessage>>>;

    fn mock_schedule_message(alarms: &Alarms) -> impl FnMut(AlarmMessage, Duration) + use<> {
        let sink = Rc::clone(alarms);
        move |message, _| sink.borrow_mut().push(message)
    }

    /// Delivers the most recently scheduled alarm, if any
    fn tick(session: &mut QuizSession, alarms: &Alarms, tunnel: &MockTunnel) -> bool {
        let Some(alarm) = alarms.borrow_mut().pop() else {
            return false;
        };
        session.receive_alarm(&alarm, mock_schedule_message(alarms), tunnel);
        true
    }

    fn question(text: &str, correct: &str, incorrect: &[&str]) -> Question {
        Question::new(
            text,
            correct,
            incorrect.iter().map(ToString::to_string).collect(),
        )
        .unwrap()
    }

    fn two_questions() -> Vec<Question> {
        vec![
            question("Capital of Germany?", "Berlin", &["Paris", "Rome", "Madrid"]),
            question("2 + 2?", "4", &["3", "5"]),
        ]
    }

    fn started_session(
        options: Options,
        questions: Vec<Question>,
    ) -> (QuizSession, Alarms, MockTunnel) {
        let mut session = QuizSession::with_seed(options, 1).unwrap();
        let alarms = Alarms::default();
        let tunnel = MockTunnel::default();
        session
            .start(questions, mock_schedule_message(&alarms), &tunnel)
            .unwrap();
        (session, alarms, tunnel)
    }

    fn assert_permutation_of(answers: &PresentedAnswers, question: &Question) {
        let mut expected = question.incorrect_answers().to_vec();
        expected.push(question.correct_answer().to_owned());
        expected.sort();
        let mut actual = answers.to_vec();
        actual.sort();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_new_rejects_invalid_options() {
        let result = QuizSession::new(Options::new(1, 0));
        assert!(matches!(result, Err(Error::Options(_))));
    }

    #[test]
    fn test_new_session_is_not_started() {
        let session = QuizSession::new(Options::default()).unwrap();

        assert_eq!(session.state().status(), Status::NotStarted);
        assert!(session.state().current_question().is_none());
        assert_eq!(session.state().progress(), 0.);
    }

    #[test]
    fn test_start_empty_question_set() {
        let mut session = QuizSession::new(Options::default()).unwrap();
        let alarms = Alarms::default();
        let tunnel = MockTunnel::default();

        let result = session.start(Vec::new(), mock_schedule_message(&alarms), &tunnel);

        assert!(matches!(result, Err(Error::EmptyQuestionSet)));
        assert_eq!(session.state().status(), Status::NotStarted);
        assert!(alarms.borrow().is_empty());
        assert!(tunnel.states.borrow().is_empty());
    }

    #[test]
    fn test_start_too_many_questions() {
        let mut session = QuizSession::new(Options::default()).unwrap();
        let alarms = Alarms::default();
        let tunnel = MockTunnel::default();
        let questions = (0..=MAX_QUESTION_COUNT)
            .map(|i| question(&format!("Question {i}"), "right", &["wrong"]))
            .collect();

        let result = session.start(questions, mock_schedule_message(&alarms), &tunnel);

        assert!(matches!(
            result,
            Err(Error::TooManyQuestions { count, max })
                if count == MAX_QUESTION_COUNT + 1 && max == MAX_QUESTION_COUNT
        ));
        assert_eq!(session.state(), &SessionState::default());
        assert!(alarms.borrow().is_empty());
        assert!(tunnel.states.borrow().is_empty());
    }

    #[test]
    fn test_start_at_question_limit() {
        let questions = (0..MAX_QUESTION_COUNT)
            .map(|i| question(&format!("Question {i}"), "right", &["wrong"]))
            .collect();

        let (session, _alarms, _tunnel) = started_session(Options::default(), questions);

        assert_eq!(session.state().questions().len(), MAX_QUESTION_COUNT);
    }

    #[test]
    fn test_start_initializes_state() {
        let (session, alarms, tunnel) = started_session(Options::default(), two_questions());
        let state = session.state();

        assert_eq!(state.status(), Status::InProgress);
        assert_eq!(state.current_index(), 0);
        assert_eq!(state.score(), 0);
        assert_eq!(state.time_remaining(), 600);
        assert!(!state.time_warning_raised());
        assert!(state.selected_answer().is_none());
        assert!(state.responses().is_empty());
        assert_permutation_of(state.current_answers(), &two_questions()[0]);
        assert_eq!(
            state.current_question().map(Question::text),
            Some("Capital of Germany?")
        );
        assert_eq!(alarms.borrow().len(), 1);
        assert_eq!(tunnel.states.borrow().len(), 1);
    }

    #[test]
    fn test_start_while_in_progress() {
        let (mut session, alarms, tunnel) = started_session(Options::default(), two_questions());

        let result = session.start(two_questions(), mock_schedule_message(&alarms), &tunnel);

        assert!(matches!(
            result,
            Err(Error::InvalidState {
                status: Status::InProgress,
                ..
            })
        ));
    }

    #[test]
    fn test_start_from_json() {
        let mut session = QuizSession::new(Options::default()).unwrap();
        let alarms = Alarms::default();
        let tunnel = MockTunnel::default();
        let payload = r#"[{
            "question": { "text": "Largest planet?" },
            "correctAnswer": "Jupiter",
            "incorrectAnswers": ["Mars", "Venus", "Saturn"]
        }]"#;

        session
            .start_from_json(payload, mock_schedule_message(&alarms), &tunnel)
            .unwrap();

        assert_eq!(session.state().status(), Status::InProgress);
        assert_eq!(session.state().questions().len(), 1);
    }

    #[test]
    fn test_start_from_malformed_json() {
        let mut session = QuizSession::new(Options::default()).unwrap();
        let alarms = Alarms::default();
        let tunnel = MockTunnel::default();
        let payload = r#"[{ "question": { "text": "Q" }, "incorrectAnswers": ["a"] }]"#;

        let result = session.start_from_json(payload, mock_schedule_message(&alarms), &tunnel);

        assert!(matches!(result, Err(Error::QuestionData(_))));
        assert_eq!(session.state().status(), Status::NotStarted);
    }

    #[test]
    fn test_select_answer_before_start() {
        let mut session = QuizSession::new(Options::default()).unwrap();
        let tunnel = MockTunnel::default();

        let result = session.select_answer("Berlin", &tunnel);

        assert!(matches!(
            result,
            Err(Error::InvalidState {
                status: Status::NotStarted,
                ..
            })
        ));
    }

    #[test]
    fn test_select_unknown_answer() {
        let (mut session, _alarms, tunnel) = started_session(Options::default(), two_questions());

        let result = session.select_answer("London", &tunnel);

        assert!(matches!(result, Err(Error::UnknownAnswer(value)) if value == "London"));
        assert!(session.state().selected_answer().is_none());
    }

    #[test]
    fn test_select_answer_replaces_selection() {
        let (mut session, _alarms, tunnel) = started_session(Options::default(), two_questions());

        session.select_answer("Paris", &tunnel).unwrap();
        session.select_answer("Berlin", &tunnel).unwrap();

        assert_eq!(session.state().selected_answer(), Some("Berlin"));
    }

    #[test]
    fn test_advance_without_selection() {
        let (mut session, _alarms, tunnel) = started_session(Options::default(), two_questions());
        let before = session.state().clone();

        let result = session.advance(&tunnel);

        assert!(matches!(result, Err(Error::NoAnswerSelected)));
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_advance_moves_to_next_question() {
        let (mut session, _alarms, tunnel) = started_session(Options::default(), two_questions());

        session.select_answer("Berlin", &tunnel).unwrap();
        session.advance(&tunnel).unwrap();
        let state = session.state();

        assert_eq!(state.status(), Status::InProgress);
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.score(), 1);
        assert!(state.selected_answer().is_none());
        assert_eq!(state.responses().len(), 1);
        assert_eq!(state.progress(), 0.5);
        assert_permutation_of(state.current_answers(), &two_questions()[1]);
    }

    #[test]
    fn test_full_session() {
        let (mut session, alarms, tunnel) = started_session(Options::default(), two_questions());

        session.select_answer("Berlin", &tunnel).unwrap();
        session.advance(&tunnel).unwrap();
        session.select_answer("5", &tunnel).unwrap();
        session.advance(&tunnel).unwrap();
        let state = session.state();

        assert_eq!(state.status(), Status::Completed);
        assert_eq!(state.score(), 1);
        assert_eq!(
            state.responses(),
            &[
                Response {
                    question: "Capital of Germany?".to_string(),
                    user_answer: "Berlin".to_string(),
                    correct_answer: "Berlin".to_string(),
                },
                Response {
                    question: "2 + 2?".to_string(),
                    user_answer: "5".to_string(),
                    correct_answer: "4".to_string(),
                },
            ]
        );
        assert!(state.responses()[0].is_correct());
        assert!(!state.responses()[1].is_correct());
        assert_eq!(state.progress(), 1.);
        assert!(state.current_question().is_none());

        let final_score = session.final_score().unwrap();
        assert_eq!(final_score, FinalScore { score: 1, total: 2 });
        assert!(final_score.passed());
        assert_eq!(tunnel.completions(), vec![(1, 2, true, false)]);

        // the countdown was cancelled, so its pending tick is dropped
        let remaining = session.state().time_remaining();
        assert!(tick(&mut session, &alarms, &tunnel));
        assert_eq!(session.state().time_remaining(), remaining);
        assert!(alarms.borrow().is_empty());
    }

    #[test]
    fn test_advance_after_completion() {
        let (mut session, _alarms, tunnel) =
            started_session(Options::default(), vec![question("Q", "a", &["b"])]);

        session.select_answer("a", &tunnel).unwrap();
        session.advance(&tunnel).unwrap();

        assert!(matches!(
            session.advance(&tunnel),
            Err(Error::InvalidState {
                status: Status::Completed,
                ..
            })
        ));
        assert!(matches!(
            session.select_answer("a", &tunnel),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn test_final_score_while_in_progress() {
        let (session, _alarms, _tunnel) = started_session(Options::default(), two_questions());

        assert!(matches!(
            session.final_score(),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn test_final_score_pass_threshold() {
        assert!(FinalScore { score: 1, total: 2 }.passed());
        assert!(FinalScore { score: 5, total: 5 }.passed());
        assert!(!FinalScore { score: 1, total: 3 }.passed());
        assert!(!FinalScore { score: 0, total: 0 }.passed());
    }

    #[test]
    fn test_ticks_update_remaining_time() {
        let (mut session, alarms, tunnel) = started_session(Options::default(), two_questions());

        for _ in 0..3 {
            assert!(tick(&mut session, &alarms, &tunnel));
        }

        assert_eq!(session.state().time_remaining(), 597);
        assert_eq!(alarms.borrow().len(), 1);
        assert_eq!(session.state().status(), Status::InProgress);
    }

    #[test]
    fn test_warning_raised_once() {
        let (mut session, alarms, tunnel) = started_session(Options::new(63, 60), two_questions());

        for _ in 0..2 {
            tick(&mut session, &alarms, &tunnel);
        }
        assert!(!session.state().time_warning_raised());

        tick(&mut session, &alarms, &tunnel);
        assert!(session.state().time_warning_raised());
        assert_eq!(session.state().time_remaining(), 60);

        for _ in 0..5 {
            tick(&mut session, &alarms, &tunnel);
        }
        assert_eq!(tunnel.warnings(), 1);
    }

    #[test]
    fn test_expiry_completes_session() {
        let (mut session, alarms, tunnel) = started_session(Options::new(5, 2), two_questions());

        session.select_answer("Berlin", &tunnel).unwrap();
        session.advance(&tunnel).unwrap();
        session.select_answer("4", &tunnel).unwrap();

        let mut delivered = 0;
        while tick(&mut session, &alarms, &tunnel) {
            delivered += 1;
        }
        let state = session.state();

        assert_eq!(delivered, 5);
        assert_eq!(state.status(), Status::Completed);
        assert_eq!(state.time_remaining(), 0);
        assert_eq!(state.score(), 1);
        assert_eq!(state.responses().len(), 1);
        assert!(state.selected_answer().is_none());
        assert_eq!(session.final_score().unwrap(), FinalScore { score: 1, total: 2 });
        assert_eq!(tunnel.completions(), vec![(1, 2, true, true)]);
    }

    #[test]
    fn test_retry_after_completion() {
        let (mut session, alarms, tunnel) = started_session(Options::new(5, 2), two_questions());

        session.select_answer("Berlin", &tunnel).unwrap();
        session.advance(&tunnel).unwrap();
        while tick(&mut session, &alarms, &tunnel) {}
        assert_eq!(session.state().status(), Status::Completed);

        session
            .retry(mock_schedule_message(&alarms), &tunnel)
            .unwrap();
        let state = session.state();

        assert_eq!(state.status(), Status::InProgress);
        assert_eq!(state.current_index(), 0);
        assert_eq!(state.score(), 0);
        assert!(state.responses().is_empty());
        assert!(state.selected_answer().is_none());
        assert!(!state.time_warning_raised());
        assert_eq!(state.time_remaining(), 5);
        assert_eq!(state.questions(), two_questions().as_slice());
        assert_eq!(session.timer.state(), TimerState::Running);
        assert_eq!(alarms.borrow().len(), 1);
    }

    #[test]
    fn test_retry_mid_session_drops_old_ticks() {
        let (mut session, alarms, tunnel) = started_session(Options::default(), two_questions());
        tick(&mut session, &alarms, &tunnel);
        let stale = alarms.borrow_mut().pop().unwrap();

        session
            .retry(mock_schedule_message(&alarms), &tunnel)
            .unwrap();
        session.receive_alarm(&stale, mock_schedule_message(&alarms), &tunnel);

        assert_eq!(session.state().time_remaining(), 600);
        assert_eq!(alarms.borrow().len(), 1);
    }

    #[test]
    fn test_retry_without_questions() {
        let mut session = QuizSession::new(Options::default()).unwrap();
        let alarms = Alarms::default();
        let tunnel = MockTunnel::default();

        let result = session.retry(mock_schedule_message(&alarms), &tunnel);

        assert!(matches!(result, Err(Error::InvalidState { .. })));
    }

    #[test]
    fn test_exit_mid_session() {
        let (mut session, alarms, tunnel) = started_session(Options::default(), two_questions());
        session.select_answer("Berlin", &tunnel).unwrap();

        session.exit(&tunnel);
        assert_eq!(session.state(), &SessionState::default());

        // the pending tick no longer belongs to a running countdown
        assert!(tick(&mut session, &alarms, &tunnel));
        assert_eq!(session.state(), &SessionState::default());
        assert!(alarms.borrow().is_empty());

        session.exit(&tunnel);
        assert_eq!(session.state(), &SessionState::default());
        assert_eq!(session.timer.state(), TimerState::Cancelled);
    }

    #[test]
    fn test_exit_then_start_again() {
        let (mut session, alarms, tunnel) = started_session(Options::default(), two_questions());

        session.exit(&tunnel);
        session
            .start(two_questions(), mock_schedule_message(&alarms), &tunnel)
            .unwrap();

        assert_eq!(session.state().status(), Status::InProgress);
        assert_eq!(session.state().time_remaining(), 600);
    }

    #[test]
    fn test_every_mutation_sends_snapshot() {
        let (mut session, alarms, tunnel) = started_session(Options::default(), two_questions());

        session.select_answer("Berlin", &tunnel).unwrap();
        session.advance(&tunnel).unwrap();
        tick(&mut session, &alarms, &tunnel);
        session.exit(&tunnel);

        let states = tunnel.states.borrow();
        assert_eq!(states.len(), 5);
        let SyncMessage::Session(last) = states.last().unwrap();
        assert_eq!(last.status(), Status::NotStarted);
    }

    #[test]
    fn test_seeded_sessions_present_same_order() {
        let (first, _, _) = started_session(Options::default(), two_questions());
        let (second, _, _) = started_session(Options::default(), two_questions());

        assert_eq!(first.state().current_answers(), second.state().current_answers());
    }
}
