use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub enum Space {
    Discrete(usize),
    Continuous {
        min: Option<Vec<f32>>,
        max: Option<Vec<f32>>,
        size: usize,
    },
}

impl Space {
    pub fn size(&self) -> usize {
        match self {
            Self::Discrete(size) => *size,
            Self::Continuous { size, .. } => *size,
        }
    }
}

/// Shape of the environment as the loop sees it: one observation space and
/// one discrete space per controllable action dimension.
#[derive(Debug, Clone)]
pub struct EnvironmentDescription {
    pub observation_space: Space,
    pub action_space: Vec<Space>,
}

impl EnvironmentDescription {
    pub fn new(observation_space: Space, action_space: Vec<Space>) -> Self {
        Self {
            observation_space,
            action_space,
        }
    }

    pub fn n_actions(&self) -> usize {
        self.action_space.len()
    }

    pub fn n_observations(&self) -> usize {
        self.observation_space.size()
    }

    /// Per-dimension discrete choice counts. The controller maps the clipped
    /// continuous action onto these, so every dimension has to be discrete.
    pub fn discrete_choices(&self) -> Result<Vec<usize>> {
        self.action_space
            .iter()
            .enumerate()
            .map(|(dim, space)| match space {
                Space::Discrete(n) => Ok(*n),
                Space::Continuous { .. } => Err(Error::Env(format!(
                    "action dimension {dim} is continuous, expected discrete"
                ))),
            })
            .collect()
    }
}

/// What a single environment step returns.
#[derive(Debug, Clone)]
pub struct SnapShot {
    pub state: Vec<f32>,
    pub reward: f32,
    pub done: bool,
}

/// The arm environment as consumed by the loop. `state` returning
/// `Ok(None)` means the vision side produced no usable detection and the
/// cycle is skipped with no side effects.
pub trait Env {
    fn state(&mut self) -> Result<Option<Vec<f32>>>;
    fn step(&mut self, action: &[usize]) -> Result<SnapShot>;
    fn env_description(&self) -> EnvironmentDescription;
}
