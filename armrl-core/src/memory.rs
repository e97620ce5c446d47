use crate::error::{Error, Result};
use bincode::{Decode, Encode};
use rand::Rng;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One environment step. `action` is the raw continuous action before
/// clipping/discretization, `mask` is 1.0 while the episode is still going.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Transition {
    pub state: Vec<f32>,
    pub action: Vec<f32>,
    pub mask: f32,
    pub next_state: Vec<f32>,
    pub reward: f32,
}

/// Fixed-capacity ring buffer of transitions with uniform random sampling.
///
/// Once full, a push overwrites the oldest slot. The write cursor is part of
/// the serialized state so a restored buffer keeps evicting in the same
/// order.
#[derive(Debug, Clone, Encode, Decode)]
pub struct ReplayMemory {
    transitions: Vec<Transition>,
    capacity: usize,
    position: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay capacity must be nonzero");
        Self {
            transitions: Vec::new(),
            capacity,
            position: 0,
        }
    }

    pub fn push(&mut self, transition: Transition) {
        if self.transitions.len() < self.capacity {
            self.transitions.push(transition);
        } else {
            self.transitions[self.position] = transition;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Draws `n` distinct transitions uniformly at random. Distinct within a
    /// call, with replacement across calls.
    pub fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        if self.transitions.len() < n {
            return Err(Error::InsufficientData {
                needed: n,
                available: self.transitions.len(),
            });
        }
        let indices = rand::seq::index::sample(rng, self.transitions.len(), n);
        Ok(indices.into_iter().map(|i| &self.transitions[i]).collect())
    }

    /// Samples `n` transitions and reassembles them into parallel arrays.
    pub fn sample_batch<R: Rng>(&self, n: usize, rng: &mut R) -> Result<TransitionBatch> {
        let transitions = self.sample(n, rng)?;
        Ok(TransitionBatch::from_transitions(transitions))
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::encode_into_std_write(self, &mut writer, bincode::config::standard())?;
        Ok(())
    }

    /// Loads a full snapshot, contents and write cursor included. The caller
    /// replaces its buffer with the returned one.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let memory = bincode::decode_from_std_read(&mut reader, bincode::config::standard())?;
        Ok(memory)
    }
}

/// A sampled batch transposed into parallel arrays, the shape
/// [`Agent::update_parameters`](crate::agents::Agent) consumes.
#[derive(Debug, Clone, Default)]
pub struct TransitionBatch {
    pub states: Vec<Vec<f32>>,
    pub actions: Vec<Vec<f32>>,
    pub masks: Vec<f32>,
    pub next_states: Vec<Vec<f32>>,
    pub rewards: Vec<f32>,
}

impl TransitionBatch {
    pub fn from_transitions<'a, I>(transitions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transition>,
    {
        let mut batch = Self::default();
        for transition in transitions {
            batch.states.push(transition.state.clone());
            batch.actions.push(transition.action.clone());
            batch.masks.push(transition.mask);
            batch.next_states.push(transition.next_state.clone());
            batch.rewards.push(transition.reward);
        }
        batch
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}
