//! Consumer-side intake state machine
//!
//! A UI-free model of the intake journey: describe a scenario, answer the
//! clarifying questions (when the planner produced any), pass the submission
//! gate, watch the analysis stream, land on the result. Embedding clients
//! drive this machine and render each state however they like.
//!
//! The gate enforces two rules the service itself never sees: a plausible
//! contact email and a rate-limit window between analysis requests, measured
//! on the consumer's own clock.

use std::time::{Duration, Instant};

/// Minimum scenario length accepted by the intake form.
pub const MIN_SCENARIO_CHARS: usize = 30;

/// Default spacing between analysis requests.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// Collecting the scenario description.
    Scenario,
    /// Collecting answers to the planner's clarifying questions.
    Clarify { questions: Vec<String> },
    /// Ready to submit, pending email and rate-limit checks.
    Gate,
    /// Analysis stream in progress.
    Streaming,
    /// Analysis complete.
    Result,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("scenario must be at least {MIN_SCENARIO_CHARS} characters")]
    ScenarioTooShort,

    #[error("a valid email address is required")]
    InvalidEmail,

    #[error("please wait {} seconds between requests", .0.as_secs())]
    RateLimited(Duration),

    #[error("operation not valid in the current state")]
    InvalidTransition,
}

/// One intake journey. Holds the accumulated inputs alongside the state so a
/// restart can clear them together.
pub struct IntakeFlow {
    state: FlowState,
    scenario: String,
    answers: Vec<(String, String)>,
    rate_limit: Duration,
    last_request: Option<Instant>,
}

impl IntakeFlow {
    pub fn new() -> Self {
        Self::with_rate_limit(DEFAULT_RATE_LIMIT)
    }

    pub fn with_rate_limit(rate_limit: Duration) -> Self {
        Self {
            state: FlowState::Scenario,
            scenario: String::new(),
            answers: Vec::new(),
            rate_limit,
            last_request: None,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Accept the scenario plus the planner's questions for it. Moves to
    /// `Clarify` when there are questions to answer, straight to `Gate`
    /// otherwise.
    pub fn submit_scenario(
        &mut self,
        scenario: &str,
        questions: Vec<String>,
    ) -> Result<(), FlowError> {
        if self.state != FlowState::Scenario {
            return Err(FlowError::InvalidTransition);
        }
        let scenario = scenario.trim();
        if scenario.chars().count() < MIN_SCENARIO_CHARS {
            return Err(FlowError::ScenarioTooShort);
        }

        self.scenario = scenario.to_string();
        self.state = if questions.is_empty() {
            FlowState::Gate
        } else {
            FlowState::Clarify { questions }
        };
        Ok(())
    }

    /// Record one answer per pending question, in order. Unanswered questions
    /// are allowed and simply dropped.
    pub fn submit_answers(&mut self, answers: Vec<String>) -> Result<(), FlowError> {
        let questions = match &self.state {
            FlowState::Clarify { questions } => questions.clone(),
            _ => return Err(FlowError::InvalidTransition),
        };

        self.answers = questions
            .into_iter()
            .zip(answers)
            .filter(|(_, answer)| !answer.trim().is_empty())
            .collect();
        self.state = FlowState::Gate;
        Ok(())
    }

    /// Pass the submission gate and begin streaming. `now` is the consumer's
    /// clock reading, compared against the previous request time.
    pub fn start_analysis(&mut self, email: &str, now: Instant) -> Result<(), FlowError> {
        if self.state != FlowState::Gate {
            return Err(FlowError::InvalidTransition);
        }
        if !plausible_email(email) {
            return Err(FlowError::InvalidEmail);
        }
        if let Some(last) = self.last_request {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.rate_limit {
                return Err(FlowError::RateLimited(self.rate_limit - elapsed));
            }
        }

        self.last_request = Some(now);
        self.state = FlowState::Streaming;
        Ok(())
    }

    /// The stream finished cleanly.
    pub fn finish(&mut self) -> Result<(), FlowError> {
        if self.state != FlowState::Streaming {
            return Err(FlowError::InvalidTransition);
        }
        self.state = FlowState::Result;
        Ok(())
    }

    /// The stream failed; return to the gate so the consumer can retry.
    pub fn fail(&mut self) -> Result<(), FlowError> {
        if self.state != FlowState::Streaming {
            return Err(FlowError::InvalidTransition);
        }
        self.state = FlowState::Gate;
        Ok(())
    }

    /// Start over from any state. Inputs are cleared; the rate-limit clock is
    /// kept so a restart cannot bypass the window.
    pub fn restart(&mut self) {
        self.state = FlowState::Scenario;
        self.scenario.clear();
        self.answers.clear();
    }

    /// The recorded question/answer pairs formatted for the analysis request.
    pub fn clarifications(&self) -> Option<String> {
        if self.answers.is_empty() {
            return None;
        }
        let text = self
            .answers
            .iter()
            .map(|(question, answer)| format!("Q: {question}\nA: {answer}"))
            .collect::<Vec<_>>()
            .join("\n");
        Some(text)
    }
}

impl Default for IntakeFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal plausibility check, not RFC validation: one `@`, a non-empty local
/// part, and a domain with an interior dot.
fn plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.len() < 3 {
        return false;
    }
    let Some(dot) = domain.find('.') else {
        return false;
    };
    dot > 0 && dot < domain.len() - 1
}
