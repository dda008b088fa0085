//! Practice session state machine.
//!
//! A session turns an entry's text into a question, collects a free-text
//! answer and shows the model's judgement of it. Every network round trip is
//! split into a begin half (which moves into a loading state and returns what
//! to send) and a complete half (which consumes the service result), so the
//! caller can drop any lock while the request is in flight.

use crate::ai::PracticeService;
use crate::error::PracticeError;
use crate::models::{EvaluationResult, PracticeChallenge};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PracticeState {
    #[default]
    Idle,
    LoadingChallenge,
    Active {
        challenge: PracticeChallenge,
    },
    Evaluating {
        challenge: PracticeChallenge,
    },
    Result {
        challenge: PracticeChallenge,
        evaluation: EvaluationResult,
    },
}

impl PracticeState {
    pub fn name(&self) -> &'static str {
        match self {
            PracticeState::Idle => "idle",
            PracticeState::LoadingChallenge => "loading a challenge",
            PracticeState::Active { .. } => "answering",
            PracticeState::Evaluating { .. } => "evaluating",
            PracticeState::Result { .. } => "showing a result",
        }
    }
}

/// What `submit` hands to the evaluation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub context: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default)]
pub struct PracticeSession {
    state: PracticeState,
    answer: String,
    context: String,
}

impl PracticeSession {
    /// `context` is the entry text challenges are generated from.
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            state: PracticeState::Idle,
            answer: String::new(),
            context: context.into(),
        }
    }

    pub fn state(&self) -> &PracticeState {
        &self.state
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn challenge(&self) -> Option<&PracticeChallenge> {
        match &self.state {
            PracticeState::Active { challenge }
            | PracticeState::Evaluating { challenge }
            | PracticeState::Result { challenge, .. } => Some(challenge),
            PracticeState::Idle | PracticeState::LoadingChallenge => None,
        }
    }

    pub fn evaluation(&self) -> Option<&EvaluationResult> {
        match &self.state {
            PracticeState::Result { evaluation, .. } => Some(evaluation),
            _ => None,
        }
    }

    pub fn is_answer_editable(&self) -> bool {
        matches!(self.state, PracticeState::Active { .. })
    }

    /// Begin loading a challenge. Allowed from `Idle` and `Result`; clears any
    /// previous answer and evaluation. Returns the context to send.
    pub fn start(&mut self) -> Result<String, PracticeError> {
        match self.state {
            PracticeState::Idle | PracticeState::Result { .. } => {
                self.answer.clear();
                self.state = PracticeState::LoadingChallenge;
                Ok(self.context.clone())
            }
            _ => Err(self.invalid("start a challenge")),
        }
    }

    /// Discard the current challenge and evaluation and load a new one.
    pub fn retry(&mut self) -> Result<String, PracticeError> {
        match self.state {
            PracticeState::Result { .. } => self.start(),
            _ => Err(self.invalid("retry")),
        }
    }

    /// Complete `start`. A failed request returns the session to `Idle`.
    pub fn challenge_loaded<E>(
        &mut self,
        result: Result<PracticeChallenge, E>,
    ) -> Result<(), PracticeError>
    where
        E: std::fmt::Display,
    {
        if self.state != PracticeState::LoadingChallenge {
            return Err(self.invalid("receive a challenge"));
        }
        self.state = match result {
            Ok(challenge) => PracticeState::Active { challenge },
            Err(e) => {
                tracing::warn!(error = %e, "challenge generation failed");
                PracticeState::Idle
            }
        };
        Ok(())
    }

    /// Update the draft answer. Only possible while a challenge is active.
    pub fn set_answer(&mut self, answer: impl Into<String>) -> Result<(), PracticeError> {
        if !self.is_answer_editable() {
            return Err(self.invalid("edit the answer"));
        }
        self.answer = answer.into();
        Ok(())
    }

    /// Begin evaluating `answer`. Rejects blank answers and anything outside
    /// `Active`, which also makes a second submit while evaluating a no-op.
    pub fn submit(&mut self, answer: impl Into<String>) -> Result<EvaluationRequest, PracticeError> {
        let PracticeState::Active { challenge } = &self.state else {
            return Err(self.invalid("submit"));
        };
        let answer = answer.into();
        if answer.trim().is_empty() {
            return Err(PracticeError::BlankAnswer);
        }

        let challenge = challenge.clone();
        let request = EvaluationRequest {
            context: self.context.clone(),
            question: challenge.question.clone(),
            answer: answer.clone(),
        };
        self.answer = answer;
        self.state = PracticeState::Evaluating { challenge };
        Ok(request)
    }

    /// Complete `submit`. A failed evaluation returns to `Active` with the
    /// typed answer kept.
    pub fn evaluation_finished<E>(
        &mut self,
        result: Result<EvaluationResult, E>,
    ) -> Result<(), PracticeError>
    where
        E: std::fmt::Display,
    {
        let PracticeState::Evaluating { challenge } = &self.state else {
            return Err(self.invalid("receive an evaluation"));
        };
        let challenge = challenge.clone();
        self.state = match result {
            Ok(evaluation) => PracticeState::Result {
                challenge,
                evaluation,
            },
            Err(e) => {
                tracing::warn!(error = %e, "answer evaluation failed");
                PracticeState::Active { challenge }
            }
        };
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> PracticeError {
        PracticeError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}

// ============================================================================
// Drivers
// ============================================================================

/// Run `start` to completion against `service`.
pub async fn run_start<S>(session: &mut PracticeSession, service: &S) -> Result<(), PracticeError>
where
    S: PracticeService + ?Sized,
{
    let context = session.start()?;
    let result = service.generate_challenge(&context).await;
    session.challenge_loaded(result)
}

/// Run `submit` to completion against `service`.
pub async fn run_submit<S>(
    session: &mut PracticeSession,
    service: &S,
    answer: &str,
) -> Result<(), PracticeError>
where
    S: PracticeService + ?Sized,
{
    let request = session.submit(answer)?;
    let result = service
        .evaluate(&request.context, &request.question, &request.answer)
        .await;
    session.evaluation_finished(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AiError;
    use crate::models::ContextType;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn challenge() -> PracticeChallenge {
        PracticeChallenge {
            question: "How do you undo the last commit but keep the changes?".to_string(),
            context_type: ContextType::Code,
        }
    }

    fn evaluation() -> EvaluationResult {
        EvaluationResult {
            is_correct: false,
            score: 60,
            feedback: "Close, but --hard discards changes.".to_string(),
            correct_solution: "git reset --soft HEAD~1".to_string(),
        }
    }

    struct ScriptedService {
        fail_evaluation: bool,
        seen: Mutex<Vec<EvaluationRequest>>,
    }

    impl ScriptedService {
        fn new(fail_evaluation: bool) -> Self {
            Self {
                fail_evaluation,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PracticeService for ScriptedService {
        async fn generate_challenge(&self, _context: &str) -> Result<PracticeChallenge, AiError> {
            Ok(challenge())
        }

        async fn evaluate(
            &self,
            context: &str,
            question: &str,
            answer: &str,
        ) -> Result<EvaluationResult, AiError> {
            self.seen.lock().unwrap().push(EvaluationRequest {
                context: context.to_string(),
                question: question.to_string(),
                answer: answer.to_string(),
            });
            if self.fail_evaluation {
                return Err(AiError::EmptyResponse);
            }
            Ok(evaluation())
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut session = PracticeSession::new("Use a soft reset.\ngit reset --soft HEAD~1");
        assert_eq!(session.state(), &PracticeState::Idle);

        let context = session.start().unwrap();
        assert_eq!(context, "Use a soft reset.\ngit reset --soft HEAD~1");
        assert_eq!(session.state(), &PracticeState::LoadingChallenge);

        session.challenge_loaded(Ok::<_, AiError>(challenge())).unwrap();
        assert!(session.is_answer_editable());

        let request = session.submit("git reset --hard HEAD~1").unwrap();
        assert_eq!(request.question, challenge().question);
        assert_eq!(request.answer, "git reset --hard HEAD~1");
        assert!(matches!(session.state(), PracticeState::Evaluating { .. }));
        assert!(!session.is_answer_editable());

        session.evaluation_finished(Ok::<_, AiError>(evaluation())).unwrap();
        assert_eq!(session.evaluation(), Some(&evaluation()));
        assert!(!session.is_answer_editable());
        assert_eq!(
            session.set_answer("changed"),
            Err(PracticeError::InvalidTransition {
                action: "edit the answer",
                state: "showing a result",
            })
        );
        assert_eq!(session.answer(), "git reset --hard HEAD~1");
    }

    #[tokio::test]
    async fn test_evaluation_failure_keeps_answer() {
        let service = ScriptedService::new(true);
        let mut session = PracticeSession::new("ctx");
        run_start(&mut session, &service).await.unwrap();
        run_submit(&mut session, &service, "my answer").await.unwrap();

        assert_eq!(
            session.state(),
            &PracticeState::Active {
                challenge: challenge()
            }
        );
        assert_eq!(session.answer(), "my answer");
        assert!(session.is_answer_editable());
        assert_eq!(service.seen.lock().unwrap()[0].context, "ctx");
    }

    #[tokio::test]
    async fn test_drivers_reach_result() {
        let service = ScriptedService::new(false);
        let mut session = PracticeSession::new("ctx");
        run_start(&mut session, &service).await.unwrap();
        run_submit(&mut session, &service, "git reset --soft HEAD~1")
            .await
            .unwrap();
        let eval = session.evaluation().unwrap();
        assert!(!eval.is_correct);
        assert_eq!(eval.score, 60);
    }

    #[test]
    fn test_challenge_failure_returns_to_idle() {
        let mut session = PracticeSession::new("ctx");
        session.start().unwrap();
        session
            .challenge_loaded(Err::<PracticeChallenge, _>(AiError::MissingApiKey))
            .unwrap();
        assert_eq!(session.state(), &PracticeState::Idle);
    }

    #[test]
    fn test_blank_answer_rejected() {
        let mut session = PracticeSession::new("ctx");
        session.start().unwrap();
        session.challenge_loaded(Ok::<_, AiError>(challenge())).unwrap();
        assert_eq!(session.submit("   \n"), Err(PracticeError::BlankAnswer));
        assert!(session.is_answer_editable());
    }

    #[test]
    fn test_second_submit_while_evaluating_is_rejected() {
        let mut session = PracticeSession::new("ctx");
        session.start().unwrap();
        session.challenge_loaded(Ok::<_, AiError>(challenge())).unwrap();
        session.submit("first").unwrap();

        let before = session.state().clone();
        assert!(matches!(
            session.submit("second"),
            Err(PracticeError::InvalidTransition { action: "submit", .. })
        ));
        assert_eq!(session.state(), &before);
        assert_eq!(session.answer(), "first");
    }

    #[test]
    fn test_retry_clears_previous_round() {
        let mut session = PracticeSession::new("ctx");
        assert!(session.retry().is_err());

        session.start().unwrap();
        session.challenge_loaded(Ok::<_, AiError>(challenge())).unwrap();
        session.submit("answer").unwrap();
        session.evaluation_finished(Ok::<_, AiError>(evaluation())).unwrap();

        session.retry().unwrap();
        assert_eq!(session.state(), &PracticeState::LoadingChallenge);
        assert_eq!(session.answer(), "");
        assert!(session.evaluation().is_none());
        assert!(session.challenge().is_none());
    }

    #[test]
    fn test_start_rejected_while_loading() {
        let mut session = PracticeSession::new("ctx");
        session.start().unwrap();
        assert!(session.start().is_err());
        assert_eq!(session.state(), &PracticeState::LoadingChallenge);
    }
}
