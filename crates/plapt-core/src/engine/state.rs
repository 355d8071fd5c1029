use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use std::fmt;
use tracing::{error, info};

/// Stages of a prediction run, in the only order they may occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    ParsingInputs,
    Reconciling,
    Predicting,
    Formatting,
    Writing,
    Done,
    /// Terminal failure, recording the stage it happened in and the error message.
    Failed { stage: &'static str, error: String },
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            RunState::ParsingInputs => "Parsing inputs",
            RunState::Reconciling => "Reconciling",
            RunState::Predicting => "Predicting",
            RunState::Formatting => "Formatting",
            RunState::Writing => "Writing",
            RunState::Done => "Done",
            RunState::Failed { .. } => "Failed",
        }
    }

    fn successor(&self) -> Option<RunState> {
        match self {
            RunState::ParsingInputs => Some(RunState::Reconciling),
            RunState::Reconciling => Some(RunState::Predicting),
            RunState::Predicting => Some(RunState::Formatting),
            RunState::Formatting => Some(RunState::Writing),
            RunState::Writing => Some(RunState::Done),
            RunState::Done | RunState::Failed { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed { .. })
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drives [`RunState`] transitions, logging each one and mirroring it as progress events.
pub struct StateTracker<'r, 'a> {
    state: RunState,
    reporter: &'r ProgressReporter<'a>,
}

impl<'r, 'a> StateTracker<'r, 'a> {
    /// Starts in [`RunState::ParsingInputs`].
    pub fn start(reporter: &'r ProgressReporter<'a>) -> Self {
        let state = RunState::ParsingInputs;
        info!(state = %state, "Run started");
        reporter.report(Progress::PhaseStart { name: state.name() });
        Self { state, reporter }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn reporter(&self) -> &'r ProgressReporter<'a> {
        self.reporter
    }

    /// Moves to the next stage.
    pub fn advance(&mut self) -> Result<&RunState, EngineError> {
        let next = self.state.successor().ok_or_else(|| {
            EngineError::Internal(format!("no transition out of state '{}'", self.state))
        })?;
        self.reporter.report(Progress::PhaseFinish);
        info!(from = %self.state, to = %next, "State transition");
        if !next.is_terminal() {
            self.reporter.report(Progress::PhaseStart { name: next.name() });
        }
        self.state = next;
        Ok(&self.state)
    }

    /// Records a failure in the current stage and hands the error back.
    pub fn fail(&mut self, err: EngineError) -> EngineError {
        let stage = self.state.name();
        error!(stage, error = %err, "Run failed");
        self.reporter.report(Progress::PhaseFinish);
        self.state = RunState::Failed {
            stage,
            error: err.to_string(),
        };
        err
    }
}
