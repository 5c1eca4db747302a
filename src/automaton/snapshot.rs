use itertools::Itertools;

use super::StateIndex;

/// A read-only copy of an automaton taken at some point of the pipeline. Labels are already
/// rendered to text, so snapshots of automata with different label types look the same.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Snapshot {
    /// All states in creation order.
    pub states: Vec<StateIndex>,
    /// The designated initial state.
    pub initial: StateIndex,
    /// The accepting states in creation order.
    pub accepting: Vec<StateIndex>,
    /// All transitions as `(source, label, target)`.
    pub transitions: Vec<(StateIndex, String, StateIndex)>,
}

impl Snapshot {
    /// Returns true if `state` is accepting in the snapshot.
    pub fn is_accepting(&self, state: StateIndex) -> bool {
        self.accepting.contains(&state)
    }

    /// Builds a table listing every transition, which is what gets logged.
    pub fn transition_table(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(["Source", "Label", "Target"]);
        for (source, label, target) in &self.transitions {
            builder.push_record([
                self.decorate(*source),
                label.clone(),
                self.decorate(*target),
            ]);
        }
        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }

    fn decorate(&self, state: StateIndex) -> String {
        let mut name = format!("q{state}");
        if state == self.initial {
            name = format!("→{name}");
        }
        if self.is_accepting(state) {
            name = format!("{name}*");
        }
        name
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "initial q{}, accepting {{{}}}, {} states, {} transitions",
            self.initial,
            self.accepting.iter().map(|q| format!("q{q}")).join(", "),
            self.states.len(),
            self.transitions.len()
        )?;
        write!(f, "{}", self.transition_table())
    }
}
