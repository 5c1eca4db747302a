//! Wires the learner, the uniformizer and the eliminator together.
//!
//! Every stage can be watched through an [`Observer`], which receives a [`Snapshot`] of the
//! automaton after the stage is done. Taking a snapshot copies the automaton, so it only
//! happens for observers that are enabled.

use std::fmt::Display;

use tracing::debug;

use crate::{
    alphabet::Label,
    automaton::{Automaton, Snapshot, StateIndex},
    elimination::{Eliminator, Extraction},
    learning::{FiniteSample, ZeroReversibleLearner},
    simplify::Simplification,
    uniform::uniformize,
    Result, Show,
};

/// The points in the pipeline at which the automaton can be observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The prefix tree of the sample was built.
    PrefixTree,
    /// All accepting states were merged into one.
    AcceptingMerged,
    /// All clashes were resolved, the automaton is 0-reversible.
    ZeroReversible,
    /// The automaton was brought into uniform shape.
    Uniform,
    /// An interior state was eliminated.
    Eliminated {
        /// The eliminated state.
        state: StateIndex,
        /// How many interior states are left.
        remaining: usize,
    },
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::PrefixTree => write!(f, "prefix-tree"),
            Stage::AcceptingMerged => write!(f, "accepting-merged"),
            Stage::ZeroReversible => write!(f, "zero-reversible"),
            Stage::Uniform => write!(f, "uniform"),
            Stage::Eliminated { state, .. } => write!(f, "eliminated-q{state}"),
        }
    }
}

/// Receives snapshots of the automaton as the pipeline progresses.
pub trait Observer {
    /// Called once the given stage is completed.
    fn observe(&mut self, stage: Stage, snapshot: &Snapshot);

    /// If this returns false, no snapshots are taken and [`Observer::observe`] is never called.
    fn is_enabled(&self) -> bool {
        true
    }
}

impl<F: FnMut(Stage, &Snapshot)> Observer for F {
    fn observe(&mut self, stage: Stage, snapshot: &Snapshot) {
        self(stage, snapshot)
    }
}

/// Observes nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Observer for Silent {
    fn observe(&mut self, _stage: Stage, _snapshot: &Snapshot) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Logs the transition table of every snapshot on the debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTables;

impl Observer for LogTables {
    fn observe(&mut self, stage: Stage, snapshot: &Snapshot) {
        debug!("after stage {stage}\n{snapshot}");
    }

    fn is_enabled(&self) -> bool {
        tracing::enabled!(tracing::Level::DEBUG)
    }
}

pub(crate) fn notify<O: Observer, L: Label>(
    observer: &mut O,
    stage: Stage,
    automaton: &Automaton<L>,
) {
    if observer.is_enabled() {
        observer.observe(stage, &automaton.snapshot());
    }
}

/// Settings of a [`Pipeline`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// The policy used to build expressions during elimination.
    pub simplification: Simplification,
    /// Whether [`Pipeline::infer`] logs a table of the automaton after every stage.
    pub observe: bool,
}

impl Options {
    /// Sets the simplification policy.
    pub fn with_simplification(self, simplification: Simplification) -> Self {
        Self {
            simplification,
            ..self
        }
    }

    /// Enables or disables logging of the intermediate automata.
    pub fn with_observe(self, observe: bool) -> Self {
        Self { observe, ..self }
    }
}

/// Infers a regular expression from a sample: learn the 0-reversible automaton, bring it into
/// uniform shape and eliminate its interior states.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pipeline {
    options: Options,
}

impl Pipeline {
    /// Creates a pipeline with the given options.
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Runs all stages on `sample`.
    pub fn infer(&self, sample: &FiniteSample) -> Result<Extraction> {
        if self.options.observe {
            self.infer_observed(sample, &mut LogTables)
        } else {
            self.infer_observed(sample, &mut Silent)
        }
    }

    /// Runs all stages on `sample` and reports every stage to `observer`.
    pub fn infer_observed<O: Observer>(
        &self,
        sample: &FiniteSample,
        observer: &mut O,
    ) -> Result<Extraction> {
        let automaton = ZeroReversibleLearner::new(sample).learn_observed(observer)?;

        let uniform = uniformize(automaton)?;
        debug!(
            "uniform automaton has {} interior states, pruned {}",
            uniform.interior().len(),
            uniform.pruned().show()
        );
        notify(observer, Stage::Uniform, uniform.automaton());

        let mut eliminator = Eliminator::new(uniform, self.options.simplification)?;
        while let Some(state) = eliminator.step()? {
            let stage = Stage::Eliminated {
                state,
                remaining: eliminator.interior_count(),
            };
            notify(observer, stage, eliminator.automaton());
        }
        eliminator.run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn all_stages_are_reported() {
        let sample = FiniteSample::new(["b", "ab", "aab", "aaaab"]).unwrap();
        let mut stages = vec![];
        let extraction = Pipeline::default()
            .infer_observed(&sample, &mut |stage: Stage, _: &Snapshot| stages.push(stage))
            .unwrap();
        assert_eq!(extraction.to_string(), "a*b");
        assert_eq!(
            stages,
            vec![
                Stage::PrefixTree,
                Stage::AcceptingMerged,
                Stage::ZeroReversible,
                Stage::Uniform,
                Stage::Eliminated {
                    state: 0,
                    remaining: 0
                }
            ]
        );
    }

    #[test]
    fn last_snapshot_has_source_and_sink() {
        let sample = FiniteSample::new(["abc", "abd", "ac", "c"]).unwrap();
        let mut last = None;
        Pipeline::default()
            .infer_observed(&sample, &mut |_: Stage, snapshot: &Snapshot| {
                last = Some(snapshot.clone())
            })
            .unwrap();
        let last = last.unwrap();
        assert_eq!(last.states.len(), 2);
        assert_eq!(last.transitions.len(), 1);
        assert_eq!(last.accepting.len(), 1);
    }

    #[test]
    fn silent_is_disabled() {
        assert!(!Silent.is_enabled());
        let options = Options::default()
            .with_simplification(Simplification::Closures)
            .with_observe(true);
        let sample = FiniteSample::new(["", "a"]).unwrap();
        let extraction = Pipeline::new(options).infer(&sample).unwrap();
        assert!(extraction.matches("aaa"));
        assert!(extraction.matches(""));
    }

    #[test]
    fn stages_have_file_friendly_names() {
        assert_eq!(Stage::ZeroReversible.to_string(), "zero-reversible");
        assert_eq!(
            Stage::Eliminated {
                state: 3,
                remaining: 1
            }
            .to_string(),
            "eliminated-q3"
        );
    }
}
