//! Deduplicated experience memory.
//!
//! Unlike a ring buffer that evicts by age, this memory keeps at most one
//! transition per `(state index, action, next state index)` key and never
//! evicts: re-observing a known key only refreshes the stored reward. The
//! state space is finite after discretization, so the memory is bounded by
//! the number of distinct keys rather than by a capacity parameter.

use std::collections::HashMap;

use ndarray::Array1;

/// One observed step: the raw states on both sides, their discretized
/// indices, the action taken and the reward received.
///
/// Only `reward` is ever rewritten after a transition is stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array1<f32>,
    pub state_index: i64,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub next_state_index: i64,
}

impl Transition {
    pub fn key(&self) -> TransitionKey {
        TransitionKey {
            state_index: self.state_index,
            action: self.action,
            next_state_index: self.next_state_index,
        }
    }
}

/// Composite dedup key. A struct key hashes directly and cannot collide the
/// way delimiter-joined strings can.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransitionKey {
    pub state_index: i64,
    pub action: usize,
    pub next_state_index: i64,
}

/// What `record` did with a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Appended as a new entry.
    Recorded,
    /// Key already present; only the stored reward was refreshed.
    Updated,
    /// Dropped: the transition had no valid prior state.
    Skipped,
}

/// Append-only ordered log of transitions plus a key-to-position index.
#[derive(Clone, Debug, Default)]
pub struct ExperienceMemory {
    transitions: Vec<Transition>,
    index: HashMap<TransitionKey, usize>,
}

impl ExperienceMemory {
    pub fn new() -> Self {
        ExperienceMemory::default()
    }

    /// Store a transition, deduplicating on its key.
    ///
    /// A `state_index` of -1 marks the step before any prior state existed
    /// (the agent's very first tick) and is skipped. On a key hit the stored
    /// reward is overwritten in place; the stored state contents are not
    /// compared against the incoming ones, so two raw states that discretize
    /// to the same key silently share one entry.
    pub fn record(&mut self, transition: Transition) -> RecordOutcome {
        if transition.state_index == -1 {
            return RecordOutcome::Skipped;
        }
        let key = transition.key();
        match self.index.get(&key) {
            Some(&pos) => {
                self.transitions[pos].reward = transition.reward;
                RecordOutcome::Updated
            }
            None => {
                self.index.insert(key, self.transitions.len());
                self.transitions.push(transition);
                RecordOutcome::Recorded
            }
        }
    }

    pub fn get(&self, key: &TransitionKey) -> Option<&Transition> {
        self.index.get(key).map(|&pos| &self.transitions[pos])
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
