//! Step orchestration: runs an ordered list of named steps, stopping at the first failure.
//!
//! A `Sequencer` knows nothing about what a step does. It hands each step the
//! shared context `C`, observes the integer exit code and halts on anything
//! other than zero. Workflows are plain functions that return a step list.

pub mod executor;
pub mod state;

use std::sync::Arc;

pub use executor::{run_command, CommandRunner, ProcessExecutor};
pub use state::SequenceState;

use crate::error::{SequenceError, StepError};
use crate::log_collector::{LogCollector, PARSED_TARGET};
use crate::models::EXIT_SUCCESS;

/// Exit code of a step, or a fatal error that aborts the sequence.
pub type StepResult = Result<i32, StepError>;

type StepAction<C> = Box<dyn FnMut(&mut C) -> StepResult>;

/// A named unit of work.
pub struct Step<C> {
    name: String,
    action: StepAction<C>,
}

impl<C> Step<C> {
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: FnMut(&mut C) -> StepResult + 'static,
    {
        Step {
            name: name.into(),
            action: Box::new(action),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<C> std::fmt::Debug for Step<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

/// Summary of a fully successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReport {
    /// Names of the executed steps, in execution order
    pub completed_steps: Vec<String>,
}

/// Linear, fail-fast step runner.
pub struct Sequencer<C> {
    steps: Vec<Step<C>>,
    state: SequenceState,
    log_collector: Option<Arc<LogCollector>>,
}

impl<C> Sequencer<C> {
    pub fn new(steps: Vec<Step<C>>) -> Self {
        Sequencer {
            steps,
            state: SequenceState::NotStarted,
            log_collector: None,
        }
    }

    /// Attach the diagnostic sink used for milestone records.
    pub fn with_log_collector(mut self, log_collector: Option<Arc<LogCollector>>) -> Self {
        self.log_collector = log_collector;
        self
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(Step::name).collect()
    }

    /// Execute every step in order on the calling thread.
    ///
    /// # Errors
    /// * `SequenceError::NoSteps` - the step list is empty (construction bug)
    /// * `SequenceError::StepFailed` - a step returned a non-zero exit code
    /// * `SequenceError::StepAborted` - a step raised a fatal `StepError`
    /// * `SequenceError::InvalidTransition` - the sequencer already ran
    pub fn run(&mut self, ctx: &mut C) -> Result<SequenceReport, SequenceError> {
        if self.steps.is_empty() {
            return Err(SequenceError::NoSteps);
        }

        let mut completed_steps = Vec::with_capacity(self.steps.len());

        for index in 0..self.steps.len() {
            self.transition_to(SequenceState::Running(index))?;

            let name = self.steps[index].name.clone();
            log::info!("Running step {} {}", index, name);
            self.milestone(format!("STEP START: {} {}", index, name));

            let outcome = (self.steps[index].action)(ctx);

            match outcome {
                Ok(EXIT_SUCCESS) => {
                    self.milestone(format!("STEP DONE: {} {}", index, name));
                    completed_steps.push(name);
                }
                Ok(exit_code) => {
                    self.transition_to(SequenceState::FailedAt(index))?;
                    let err = SequenceError::StepFailed {
                        index,
                        name,
                        exit_code,
                    };
                    log::error!("{}", err);
                    self.milestone(format!("SEQUENCE FAILED: {}", err));
                    return Err(err);
                }
                Err(source) => {
                    self.transition_to(SequenceState::FailedAt(index))?;
                    let err = SequenceError::StepAborted {
                        index,
                        name,
                        source,
                    };
                    log::error!("{}", err);
                    self.milestone(format!("SEQUENCE ABORTED: {}", err));
                    return Err(err);
                }
            }
        }

        self.transition_to(SequenceState::Succeeded)?;
        log::info!(target: PARSED_TARGET, "Congrats! The tool finalized correctly :)");
        self.milestone("SEQUENCE SUCCEEDED");

        Ok(SequenceReport { completed_steps })
    }

    fn transition_to(&mut self, next: SequenceState) -> Result<(), SequenceError> {
        if !self.state.can_transition_to(next) {
            return Err(SequenceError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    fn milestone(&self, message: impl Into<String>) {
        if let Some(ref collector) = self.log_collector {
            collector.log_parsed(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Trace {
        executed: Vec<usize>,
    }

    fn recording_steps(count: usize, failing: Option<(usize, i32)>) -> Vec<Step<Trace>> {
        (0..count)
            .map(|i| {
                Step::new(format!("step_{}", i), move |trace: &mut Trace| {
                    trace.executed.push(i);
                    match failing {
                        Some((k, code)) if k == i => Ok(code),
                        _ => Ok(0),
                    }
                })
            })
            .collect()
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let mut sequencer: Sequencer<Trace> = Sequencer::new(Vec::new());
        let result = sequencer.run(&mut Trace::default());
        assert!(matches!(result, Err(SequenceError::NoSteps)));
        assert_eq!(sequencer.state(), SequenceState::NotStarted);
    }

    #[test]
    fn test_all_steps_run_once_in_order() {
        let mut sequencer = Sequencer::new(recording_steps(4, None));
        let mut trace = Trace::default();

        let report = sequencer.run(&mut trace).unwrap();

        assert_eq!(trace.executed, vec![0, 1, 2, 3]);
        assert_eq!(
            report.completed_steps,
            vec!["step_0", "step_1", "step_2", "step_3"]
        );
        assert_eq!(sequencer.state(), SequenceState::Succeeded);
    }

    #[test]
    fn test_failure_halts_sequence_and_reports_step() {
        let mut sequencer = Sequencer::new(recording_steps(5, Some((2, 7))));
        let mut trace = Trace::default();

        let err = sequencer.run(&mut trace).unwrap_err();

        assert_eq!(trace.executed, vec![0, 1, 2]);
        match err {
            SequenceError::StepFailed {
                index,
                ref name,
                exit_code,
            } => {
                assert_eq!(index, 2);
                assert_eq!(name, "step_2");
                assert_eq!(exit_code, 7);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(sequencer.state(), SequenceState::FailedAt(2));
    }

    #[test]
    fn test_fatal_step_error_aborts() {
        let mut steps = recording_steps(1, None);
        steps.push(Step::new("needs_project", |_: &mut Trace| {
            Err(StepError::ProjectNameUnset)
        }));
        steps.extend(recording_steps(1, None));
        let mut sequencer = Sequencer::new(steps);
        let mut trace = Trace::default();

        let err = sequencer.run(&mut trace).unwrap_err();

        assert!(matches!(
            err,
            SequenceError::StepAborted {
                index: 1,
                source: StepError::ProjectNameUnset,
                ..
            }
        ));
        assert_eq!(trace.executed, vec![0]);
    }

    #[test]
    fn test_sequencer_runs_only_once() {
        let mut sequencer = Sequencer::new(recording_steps(2, None));
        let mut trace = Trace::default();
        sequencer.run(&mut trace).unwrap();

        let again = sequencer.run(&mut trace);
        assert!(matches!(again, Err(SequenceError::InvalidTransition { .. })));
        assert_eq!(trace.executed, vec![0, 1]);
    }

    #[test]
    fn test_step_names_are_exposed() {
        let sequencer = Sequencer::new(recording_steps(2, None));
        assert_eq!(sequencer.step_names(), vec!["step_0", "step_1"]);
    }

    proptest! {
        #[test]
        fn prop_fail_fast_stops_at_first_non_zero(
            count in 1usize..24,
            pick in any::<usize>(),
            code in prop_oneof![1i32..=255, -255i32..=-1],
        ) {
            let k = pick % count;
            let mut sequencer = Sequencer::new(recording_steps(count, Some((k, code))));
            let mut trace = Trace::default();

            let err = sequencer.run(&mut trace).unwrap_err();

            prop_assert_eq!(err.failed_index(), Some(k));
            prop_assert_eq!(err.exit_code(), code);
            prop_assert_eq!(trace.executed, (0..=k).collect::<Vec<_>>());
        }
    }
}
