use armrl_core::{
    agents::{Agent, Losses},
    env::{Env, EnvironmentDescription, SnapShot, Space},
    error::Result,
    memory::TransitionBatch,
    noise::OuNoise,
};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Scriptable stand-in for the arm environment. Detections can be queued
/// up front (including `None` cycles for "target not found"); once the
/// script runs out it keeps detecting a fixed bounding box. Every received
/// discrete action is recorded for inspection.
pub struct DummyArmEnv {
    t: u64,
    choices: Vec<usize>,
    detections: VecDeque<Option<Vec<f32>>>,
    returned_rewards: [f32; 4],
    pub received: Vec<Vec<usize>>,
}

impl DummyArmEnv {
    pub fn new(choices: Vec<usize>) -> Self {
        Self {
            t: 0,
            choices,
            detections: VecDeque::new(),
            returned_rewards: [0., 1., 2., 3.],
            received: Vec::new(),
        }
    }

    pub fn with_detections(choices: Vec<usize>, detections: Vec<Option<Vec<f32>>>) -> Self {
        let mut env = Self::new(choices);
        env.detections = detections.into();
        env
    }

    fn bounding_box(&self) -> Vec<f32> {
        let drift = (self.t % 10) as f32 * 0.01;
        vec![0.1 + drift, 0.2, 0.6 + drift, 0.7]
    }
}

impl Env for DummyArmEnv {
    fn state(&mut self) -> Result<Option<Vec<f32>>> {
        match self.detections.pop_front() {
            Some(scripted) => Ok(scripted),
            None => Ok(Some(self.bounding_box())),
        }
    }

    fn step(&mut self, action: &[usize]) -> Result<SnapShot> {
        self.received.push(action.to_vec());
        self.t += 1;
        let reward = self.returned_rewards[(self.t % 4) as usize];
        let done = self.t % 5 == 0;
        Ok(SnapShot {
            state: self.bounding_box(),
            reward,
            done,
        })
    }

    fn env_description(&self) -> EnvironmentDescription {
        EnvironmentDescription::new(
            Space::Continuous {
                min: None,
                max: None,
                size: 4,
            },
            self.choices.iter().map(|n| Space::Discrete(*n)).collect(),
        )
    }
}

/// Deterministic affine policy standing in for the DDPG networks. Given the
/// same weights and state it always returns the same raw action, which makes
/// checkpoint round-trips bit-comparable. Updates nudge the weights so tests
/// can observe that save/load really moves parameters around.
pub struct LinearAgent {
    n_obs: usize,
    n_actions: usize,
    actor: Vec<f32>,
    critic: Vec<f32>,
    pub updates: usize,
}

impl LinearAgent {
    pub fn new(n_obs: usize, n_actions: usize) -> Self {
        let actor = (0..n_actions * (n_obs + 1))
            .map(|i| (i as f32 * 0.37).sin() * 0.5)
            .collect();
        let critic = (0..n_obs + n_actions + 1)
            .map(|i| (i as f32 * 0.53).cos() * 0.5)
            .collect();
        Self {
            n_obs,
            n_actions,
            actor,
            critic,
            updates: 0,
        }
    }

    pub fn actor_weights(&self) -> &[f32] {
        &self.actor
    }
}

impl Agent for LinearAgent {
    fn select_action(&mut self, state: &[f32], noise: Option<&mut OuNoise>) -> Result<Vec<f32>> {
        let mut action = Vec::with_capacity(self.n_actions);
        for a in 0..self.n_actions {
            let row = &self.actor[a * (self.n_obs + 1)..(a + 1) * (self.n_obs + 1)];
            let mut z = row[self.n_obs];
            for (w, s) in row.iter().zip(state) {
                z += w * s;
            }
            action.push(z.tanh());
        }
        if let Some(noise) = noise {
            for (x, n) in action.iter_mut().zip(noise.next()) {
                *x += n;
            }
        }
        Ok(action)
    }

    fn update_parameters(&mut self, batch: &TransitionBatch) -> Result<Losses> {
        debug_assert!(!batch.is_empty());
        self.updates += 1;
        for w in self.actor.iter_mut() {
            *w *= 0.999;
        }
        Ok(Losses {
            value: 1.0 / self.updates as f32,
            policy: -0.5 / self.updates as f32,
        })
    }

    fn save_model(&self, actor_path: &Path, critic_path: &Path) -> Result<()> {
        let config = bincode::config::standard();
        let mut writer = BufWriter::new(File::create(actor_path)?);
        bincode::encode_into_std_write(&self.actor, &mut writer, config)?;
        let mut writer = BufWriter::new(File::create(critic_path)?);
        bincode::encode_into_std_write(&self.critic, &mut writer, config)?;
        Ok(())
    }

    fn load_model(&mut self, actor_path: &Path, critic_path: &Path) -> Result<()> {
        let config = bincode::config::standard();
        let mut reader = BufReader::new(File::open(actor_path)?);
        self.actor = bincode::decode_from_std_read(&mut reader, config)?;
        let mut reader = BufReader::new(File::open(critic_path)?);
        self.critic = bincode::decode_from_std_read(&mut reader, config)?;
        Ok(())
    }
}
