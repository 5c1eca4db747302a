use bit_set::BitSet;
use itertools::Itertools;
use owo_colors::OwoColorize;
use tracing::{debug, trace};

use crate::{
    alphabet::{Label, Letter, Symbol},
    math::{Map, OrderedMap, Set},
    Error, Result, Show,
};

/// Renders snapshots as graphviz DOT and, with the `graphviz` feature, as PNG images.
pub mod dot;

mod snapshot;
pub use snapshot::Snapshot;

/// States are identified by small integers, which are handed out in increasing order and are
/// never reused, even after the state they belonged to was merged away or removed.
pub type StateIndex = u32;

/// A single state: whether it accepts and the list of its outgoing edges in insertion order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct State<L> {
    id: StateIndex,
    accepting: bool,
    edges: Vec<(L, StateIndex)>,
}

impl<L: Label> State<L> {
    fn new(id: StateIndex, accepting: bool) -> Self {
        Self {
            id,
            accepting,
            edges: vec![],
        }
    }

    /// Returns the index of the state.
    pub fn id(&self) -> StateIndex {
        self.id
    }

    /// Returns true if the state is accepting.
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    fn has_edge(&self, label: &L, target: StateIndex) -> bool {
        self.edges
            .iter()
            .any(|(l, q)| *q == target && l == label)
    }

    /// Drops edges that became identical, keeping the first occurrence of each.
    fn dedup_edges(&mut self) {
        let mut seen = Set::default();
        self.edges.retain(|edge| seen.insert(edge.clone()));
    }
}

/// An owned transition, i.e. the ordered triple `(source, label, target)`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Transition<L> {
    /// The state in which the transition starts.
    pub source: StateIndex,
    /// The label which is read.
    pub label: L,
    /// The state that is reached.
    pub target: StateIndex,
}

impl<L> Transition<L> {
    /// Creates a new transition from its components.
    pub fn new(source: StateIndex, label: L, target: StateIndex) -> Self {
        Self {
            source,
            label,
            target,
        }
    }

    /// Returns true if the transition starts and ends in the same state.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl<L: Show> Show for Transition<L> {
    fn show(&self) -> String {
        format!("(q{}, {}, q{})", self.source, self.label.show(), self.target)
    }
}

/// A borrowed view on a transition stored in an [`Automaton`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EdgeRef<'a, L> {
    /// The state in which the edge starts.
    pub source: StateIndex,
    /// The label of the edge.
    pub label: &'a L,
    /// The state the edge leads to.
    pub target: StateIndex,
}

impl<'a, L: Clone> EdgeRef<'a, L> {
    /// Clones the label and produces an owned [`Transition`].
    pub fn to_transition(&self) -> Transition<L> {
        Transition::new(self.source, self.label.clone(), self.target)
    }
}

/// A finite automaton with a single initial state whose transitions are labeled with values of
/// type `L`. The states live in an arena indexed by [`StateIndex`], which keeps them in the order
/// of their creation. This order determines the order in which [`Automaton::outgoing`] and
/// [`Automaton::incoming`] yield transitions, so everything computed on an automaton is
/// reproducible.
///
/// Non-determinism is allowed, the only structural restriction is that no transition
/// `(p, a, q)` may exist twice.
#[derive(Clone, PartialEq, Eq)]
pub struct Automaton<L: Label = Letter> {
    states: OrderedMap<StateIndex, State<L>>,
    initial: StateIndex,
    next_id: StateIndex,
    merged_into: Map<StateIndex, StateIndex>,
}

impl<L: Label> Automaton<L> {
    /// Creates an automaton consisting only of an initial state, which is accepting iff
    /// `initial_accepting` is true.
    pub fn new(initial_accepting: bool) -> Self {
        let mut states = OrderedMap::default();
        states.insert(0, State::new(0, initial_accepting));
        Self {
            states,
            initial: 0,
            next_id: 1,
            merged_into: Map::default(),
        }
    }

    /// Adds a new state and returns its index.
    pub fn add_state(&mut self, accepting: bool) -> StateIndex {
        let id = self.next_id;
        self.next_id += 1;
        self.states.insert(id, State::new(id, accepting));
        trace!("added state q{id} (accepting: {accepting})");
        id
    }

    /// Adds the transition `(from, label, to)`. Fails with [`Error::DuplicateTransition`] if
    /// precisely this transition already exists and with [`Error::UnknownState`] if one of the
    /// endpoints does not exist.
    pub fn add_transition(&mut self, from: StateIndex, label: L, to: StateIndex) -> Result<()> {
        if !self.contains_state(to) {
            return Err(Error::UnknownState(to));
        }
        let state = self.states.get_mut(&from).ok_or(Error::UnknownState(from))?;
        if state.has_edge(&label, to) {
            return Err(Error::DuplicateTransition {
                from,
                label: label.show(),
                to,
            });
        }
        trace!("adding transition (q{from}, {}, q{to})", label.show());
        state.edges.push((label, to));
        Ok(())
    }

    /// Removes the transition `(from, label, to)` and returns it, if it exists.
    pub fn remove_transition(
        &mut self,
        from: StateIndex,
        label: &L,
        to: StateIndex,
    ) -> Option<Transition<L>> {
        let state = self.states.get_mut(&from)?;
        let position = state
            .edges
            .iter()
            .position(|(l, q)| *q == to && l == label)?;
        let (label, target) = state.edges.remove(position);
        Some(Transition::new(from, label, target))
    }

    /// Detaches and returns all transitions leaving `state`, self-loops included.
    pub fn remove_edges_from(&mut self, state: StateIndex) -> Vec<Transition<L>> {
        match self.states.get_mut(&state) {
            Some(s) => std::mem::take(&mut s.edges)
                .into_iter()
                .map(|(label, target)| Transition::new(state, label, target))
                .collect(),
            None => vec![],
        }
    }

    /// Detaches and returns all transitions entering `state`, self-loops included.
    pub fn remove_edges_to(&mut self, state: StateIndex) -> Vec<Transition<L>> {
        let mut removed = vec![];
        for (source, s) in self.states.iter_mut() {
            let (entering, kept): (Vec<_>, Vec<_>) =
                std::mem::take(&mut s.edges).into_iter().partition(|(_, q)| *q == state);
            s.edges = kept;
            removed.extend(
                entering
                    .into_iter()
                    .map(|(label, target)| Transition::new(*source, label, target)),
            );
        }
        removed
    }

    /// Removes `state` from the automaton and returns whether it was accepting. The state must
    /// no longer have any incident transitions, otherwise [`Error::StateHasTransitions`] is
    /// returned. The initial state can not be removed.
    pub fn remove_state(&mut self, state: StateIndex) -> Result<bool> {
        if !self.contains_state(state) {
            return Err(Error::UnknownState(state));
        }
        if state == self.initial {
            return Err(Error::RemovesInitialState(state));
        }
        let outgoing = self.outgoing(state).count();
        let incoming = self.incoming(state).count();
        if outgoing + incoming > 0 {
            return Err(Error::StateHasTransitions {
                state,
                incoming,
                outgoing,
            });
        }
        let removed = self
            .states
            .shift_remove(&state)
            .ok_or(Error::UnknownState(state))?;
        trace!("removed state q{state}");
        Ok(removed.accepting)
    }

    /// Unifies the states `a` and `b`. All transitions that touched either of them afterwards
    /// touch the surviving state, which is the smaller of the two indices, and the survivor is
    /// accepting iff one of the two was. Transitions that become identical are collapsed.
    ///
    /// Indices of states that were merged away before are resolved to the state they were
    /// merged into, hence merging two states that already are in the same class does nothing
    /// and simply returns their representative.
    pub fn merge(&mut self, a: StateIndex, b: StateIndex) -> Result<StateIndex> {
        let a = self.resolve(a).ok_or(Error::UnknownState(a))?;
        let b = self.resolve(b).ok_or(Error::UnknownState(b))?;
        if a == b {
            return Ok(a);
        }
        let (survivor, victim) = if a < b { (a, b) } else { (b, a) };

        let removed = self
            .states
            .shift_remove(&victim)
            .ok_or(Error::UnknownState(victim))?;
        let rename = |q: StateIndex| if q == victim { survivor } else { q };

        for state in self.states.values_mut() {
            if state.edges.iter().any(|(_, q)| *q == victim) {
                for (_, q) in state.edges.iter_mut() {
                    *q = rename(*q);
                }
                state.dedup_edges();
            }
        }
        let kept = self
            .states
            .get_mut(&survivor)
            .ok_or(Error::UnknownState(survivor))?;
        kept.accepting |= removed.accepting;
        kept.edges.extend(
            removed
                .edges
                .into_iter()
                .map(|(label, target)| (label, rename(target))),
        );
        kept.dedup_edges();

        if self.initial == victim {
            self.initial = survivor;
        }
        self.merged_into.insert(victim, survivor);
        debug!("merged q{victim} into q{survivor}");
        Ok(survivor)
    }

    /// Follows the merges that `state` took part in and returns the index of the state that
    /// currently represents it. Returns `None` if that state has been removed.
    pub fn resolve(&self, mut state: StateIndex) -> Option<StateIndex> {
        while let Some(&next) = self.merged_into.get(&state) {
            state = next;
        }
        self.contains_state(state).then_some(state)
    }

    /// Returns an iterator over the transitions leaving `state` in insertion order.
    pub fn outgoing(&self, state: StateIndex) -> impl Iterator<Item = EdgeRef<'_, L>> + '_ {
        self.states
            .get(&state)
            .into_iter()
            .flat_map(move |s| {
                s.edges.iter().map(move |(label, target)| EdgeRef {
                    source: state,
                    label,
                    target: *target,
                })
            })
    }

    /// Returns an iterator over the transitions entering `state`. They are ordered by their
    /// source state and then by insertion order.
    pub fn incoming(&self, state: StateIndex) -> impl Iterator<Item = EdgeRef<'_, L>> + '_ {
        self.edges().filter(move |e| e.target == state)
    }

    /// Returns an iterator over all transitions of the automaton.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'_, L>> + '_ {
        self.states.keys().flat_map(move |q| self.outgoing(*q))
    }

    /// Returns all transitions from `from` to `to`.
    pub fn transitions_between(
        &self,
        from: StateIndex,
        to: StateIndex,
    ) -> impl Iterator<Item = EdgeRef<'_, L>> + '_ {
        self.outgoing(from).filter(move |e| e.target == to)
    }

    /// Gives the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Gives the number of transitions.
    pub fn transition_count(&self) -> usize {
        self.states.values().map(|s| s.edges.len()).sum()
    }

    /// Returns the indices of all states in creation order.
    pub fn state_indices(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.states.keys().copied()
    }

    /// Checks whether a state with the given index exists.
    pub fn contains_state(&self, state: StateIndex) -> bool {
        self.states.contains_key(&state)
    }

    /// Returns the index of the initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Makes `state` the initial state.
    pub fn set_initial(&mut self, state: StateIndex) -> Result<()> {
        if !self.contains_state(state) {
            return Err(Error::UnknownState(state));
        }
        self.initial = state;
        Ok(())
    }

    /// Returns true if `state` exists and is accepting.
    pub fn is_accepting(&self, state: StateIndex) -> bool {
        self.states.get(&state).is_some_and(|s| s.accepting)
    }

    /// Marks `state` as accepting or not.
    pub fn set_accepting(&mut self, state: StateIndex, accepting: bool) -> Result<()> {
        let s = self.states.get_mut(&state).ok_or(Error::UnknownState(state))?;
        s.accepting = accepting;
        Ok(())
    }

    /// Returns the accepting states in creation order.
    pub fn accepting_states(&self) -> Vec<StateIndex> {
        self.states
            .values()
            .filter(|s| s.accepting)
            .map(|s| s.id)
            .collect()
    }

    /// Performs a depth-first search along the transitions from `origin`.
    pub fn reachable_from(&self, origin: StateIndex) -> BitSet {
        self.search(origin, |q| {
            self.outgoing(q).map(|e| e.target).collect::<Vec<_>>()
        })
    }

    /// All states reachable from the initial state.
    pub fn reachable_from_initial(&self) -> BitSet {
        self.reachable_from(self.initial)
    }

    /// Performs a depth-first search along reversed transitions from `target`, i.e. collects all
    /// states from which `target` can be reached.
    pub fn co_reachable_to(&self, target: StateIndex) -> BitSet {
        self.search(target, |q| {
            self.incoming(q).map(|e| e.source).collect::<Vec<_>>()
        })
    }

    fn search<F>(&self, origin: StateIndex, successors: F) -> BitSet
    where
        F: Fn(StateIndex) -> Vec<StateIndex>,
    {
        let mut seen = BitSet::new();
        if !self.contains_state(origin) {
            return seen;
        }
        let mut stack = vec![origin];
        seen.insert(origin as usize);
        while let Some(q) = stack.pop() {
            for p in successors(q) {
                if seen.insert(p as usize) {
                    stack.push(p);
                }
            }
        }
        seen
    }

    /// Returns true if no state has two outgoing transitions with the same label.
    pub fn is_deterministic(&self) -> bool {
        self.state_indices()
            .all(|q| self.outgoing(q).map(|e| e.label).all_unique())
    }

    /// Returns true if no state has two incoming transitions with the same label.
    pub fn is_reverse_deterministic(&self) -> bool {
        self.state_indices()
            .all(|q| self.incoming(q).map(|e| e.label).all_unique())
    }

    /// An automaton is 0-reversible if it is deterministic and reverse-deterministic.
    pub fn is_zero_reversible(&self) -> bool {
        self.is_deterministic() && self.is_reverse_deterministic()
    }

    /// Relabels every transition through `f`. Transitions that end up identical are collapsed.
    pub fn map_labels<M: Label, F: FnMut(L) -> M>(self, mut f: F) -> Automaton<M> {
        let states = self
            .states
            .into_iter()
            .map(|(id, state)| {
                let mut mapped = State {
                    id,
                    accepting: state.accepting,
                    edges: state
                        .edges
                        .into_iter()
                        .map(|(label, target)| (f(label), target))
                        .collect(),
                };
                mapped.dedup_edges();
                (id, mapped)
            })
            .collect();
        Automaton {
            states,
            initial: self.initial,
            next_id: self.next_id,
            merged_into: self.merged_into,
        }
    }

    /// Produces a read-only copy of the automaton, whose labels are rendered to text.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            states: self.state_indices().collect(),
            initial: self.initial,
            accepting: self.accepting_states(),
            transitions: self
                .edges()
                .map(|e| (e.source, e.label.show(), e.target))
                .collect(),
        }
    }
}

impl Automaton<Letter> {
    /// Builds an automaton from a list of transitions over symbols, where state `0` is initial.
    /// States that do not appear in `accepting` are rejecting.
    pub fn from_transitions<I, J>(transitions: I, accepting: J) -> Result<Self>
    where
        I: IntoIterator<Item = (StateIndex, Symbol, StateIndex)>,
        J: IntoIterator<Item = StateIndex>,
    {
        let transitions = transitions.into_iter().collect_vec();
        let accepting: Set<StateIndex> = accepting.into_iter().collect();
        let max = transitions
            .iter()
            .flat_map(|(p, _, q)| [*p, *q])
            .chain(accepting.iter().copied())
            .max()
            .unwrap_or(0);
        let mut aut = Automaton::new(accepting.contains(&0));
        for q in 1..=max {
            aut.add_state(accepting.contains(&q));
        }
        for (p, sym, q) in transitions {
            aut.add_transition(p, Letter::Symbol(sym), q)?;
        }
        Ok(aut)
    }

    /// Decides whether the automaton accepts the given word, treating it as a nondeterministic
    /// automaton in which [`Letter::Epsilon`] transitions can be taken without reading input.
    pub fn accepts<W: AsRef<str>>(&self, word: W) -> bool {
        let mut current = self.epsilon_closure([self.initial]);
        for sym in word.as_ref().chars() {
            let successors = current
                .iter()
                .flat_map(|q| {
                    self.outgoing(*q)
                        .filter(|e| *e.label == Letter::Symbol(sym))
                        .map(|e| e.target)
                })
                .collect_vec();
            current = self.epsilon_closure(successors);
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|q| self.is_accepting(*q))
    }

    fn epsilon_closure<I: IntoIterator<Item = StateIndex>>(&self, states: I) -> Set<StateIndex> {
        let mut closure: Set<StateIndex> = Set::default();
        let mut stack = states.into_iter().collect_vec();
        while let Some(q) = stack.pop() {
            if closure.insert(q) {
                stack.extend(
                    self.outgoing(q)
                        .filter(|e| e.label.is_epsilon())
                        .map(|e| e.target),
                );
            }
        }
        closure
    }
}

impl<L: Label> std::fmt::Debug for Automaton<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(["State", "Transitions"]);
        for state in self.states.values() {
            let mut name = format!("q{}", state.id);
            if state.id == self.initial {
                name = format!("→{name}");
            }
            if state.accepting {
                name = name.bold().to_string();
            }
            let edges = state
                .edges
                .iter()
                .map(|(label, target)| format!("{} → q{target}", label.show()))
                .join(", ");
            builder.push_record([name, edges]);
        }
        write!(
            f,
            "{}",
            builder
                .build()
                .with(tabled::settings::Style::rounded())
                .to_string()
        )
    }
}
