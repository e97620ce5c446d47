use crate::{
    Algorithm,
    agents::Agent,
    checkpoint::{self, CheckpointPaths},
    config::DdpgConfig,
    env::{Env, SnapShot},
    error::{Error, Result},
    memory::{ReplayMemory, Transition},
    metrics::{ScalarSink, SinkKind},
    noise::OuNoise,
};
use rand::{SeedableRng, rngs::StdRng};
use tracing::error;

macro_rules! break_on_hook_res {
    ($hook_res:expr) => {
        if $hook_res {
            break;
        }
    };
}

#[derive(Debug, Clone, Copy)]
pub enum LearningSchedule {
    /// Stop after this many interaction cycles (skipped ones included, so a
    /// blind environment cannot spin the loop forever).
    StepBound {
        total_steps: usize,
        current_step: usize,
    },
    /// Stop after this many parameter updates.
    UpdateBound {
        total_updates: usize,
        current_update: usize,
    },
}

impl LearningSchedule {
    pub fn step_bound(total_steps: usize) -> Self {
        Self::StepBound {
            total_steps,
            current_step: 0,
        }
    }

    pub fn update_bound(total_updates: usize) -> Self {
        Self::UpdateBound {
            total_updates,
            current_update: 0,
        }
    }
}

/// What one `execute` cycle did.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// No usable observation; nothing was recorded, no noise was consumed.
    Skipped,
    Stepped {
        raw_action: Vec<f32>,
        action: Vec<usize>,
        reward: f32,
        done: bool,
    },
}

pub trait OffPolicyAlgorithmHooks {
    fn init_hook(&mut self) -> bool;

    fn post_step_hook(&mut self, exec_timer: usize, outcome: &StepOutcome) -> bool;

    fn post_update_hook(&mut self, train_timer: usize) -> bool;

    fn shutdown_hook(&mut self) -> Result<()>;
}

pub struct DefaultOffPolicyAlgorithmHooks {
    learning_schedule: LearningSchedule,
    total_reward: f32,
}

impl DefaultOffPolicyAlgorithmHooks {
    pub fn new(learning_schedule: LearningSchedule) -> Self {
        Self {
            learning_schedule,
            total_reward: 0.,
        }
    }
}

impl OffPolicyAlgorithmHooks for DefaultOffPolicyAlgorithmHooks {
    fn init_hook(&mut self) -> bool {
        false
    }

    fn post_step_hook(&mut self, exec_timer: usize, outcome: &StepOutcome) -> bool {
        if let StepOutcome::Stepped {
            raw_action,
            action,
            reward,
            ..
        } = outcome
        {
            self.total_reward += reward;
            println!(
                "Timer {exec_timer} -- raw: {raw_action:?} -> act: {action:?} | reward: {reward:.3} (total {:.2})",
                self.total_reward
            );
        }
        match &mut self.learning_schedule {
            LearningSchedule::StepBound {
                total_steps,
                current_step,
            } => {
                *current_step += 1;
                current_step >= total_steps
            }
            LearningSchedule::UpdateBound { .. } => false,
        }
    }

    fn post_update_hook(&mut self, train_timer: usize) -> bool {
        match &mut self.learning_schedule {
            LearningSchedule::StepBound { .. } => false,
            LearningSchedule::UpdateBound { total_updates, .. } => train_timer >= *total_updates,
        }
    }

    fn shutdown_hook(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Clips a raw continuous action into `[-1, 1]` per dimension.
pub fn clip_action(raw: &[f32]) -> Vec<f32> {
    raw.iter().map(|x| x.clamp(-1., 1.)).collect()
}

/// Maps each clipped dimension onto its discrete choice index via
/// `(x + 1) / 2 * n`. An input of exactly `1.0` lands on `n` and is clamped
/// back to `n - 1`.
pub fn discretize(clipped: &[f32], choices: &[usize]) -> Vec<usize> {
    clipped
        .iter()
        .zip(choices)
        .map(|(x, n)| (((x + 1.) / 2. * *n as f32) as usize).min(n - 1))
        .collect()
}

/// The DDPG training loop controller: one `execute` reads the environment,
/// perturbs the agent's action, steps, and records the transition; one
/// `train` runs a fixed number of batched off-policy updates and
/// periodically checkpoints. Single-threaded by design, driven externally.
pub struct OffPolicyAlgorithm<E: Env, A: Agent, H: OffPolicyAlgorithmHooks> {
    env: E,
    agent: A,
    memory: ReplayMemory,
    noise: OuNoise,
    sink: SinkKind,
    pub hooks: H,
    config: DdpgConfig,
    paths: CheckpointPaths,
    choices: Vec<usize>,
    exec_timer: usize,
    train_timer: usize,
    rng: StdRng,
}

impl<E: Env, A: Agent, H: OffPolicyAlgorithmHooks> OffPolicyAlgorithm<E, A, H> {
    pub fn new(
        env: E,
        agent: A,
        memory: ReplayMemory,
        noise: OuNoise,
        sink: SinkKind,
        hooks: H,
        config: DdpgConfig,
    ) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(Error::Config("batch_size must be nonzero".into()));
        }
        if config.checkpoint_every == 0 {
            return Err(Error::Config("checkpoint_every must be nonzero".into()));
        }
        let description = env.env_description();
        let choices = description.discrete_choices()?;
        if choices.iter().any(|&n| n == 0) {
            return Err(Error::Env("discrete action dimension with zero choices".into()));
        }
        if noise.dim() != choices.len() {
            return Err(Error::Config(format!(
                "noise has {} dims, env has {} action dims",
                noise.dim(),
                choices.len()
            )));
        }
        let paths = CheckpointPaths::new(
            config.checkpoint_dir.clone(),
            config.env_name.clone(),
            config.suffix,
        );
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            env,
            agent,
            memory,
            noise,
            sink,
            hooks,
            config,
            paths,
            choices,
            exec_timer: 0,
            train_timer: 0,
            rng,
        })
    }

    /// One interaction cycle. The timer counts attempts, so it advances
    /// even when the cycle is skipped for lack of an observation.
    pub fn execute(&mut self) -> Result<StepOutcome> {
        self.exec_timer += 1;

        let Some(state) = self.env.state()? else {
            return Ok(StepOutcome::Skipped);
        };

        let sigma = self.config.sigma_schedule.sigma_at(self.train_timer);
        self.noise.set_sigma(sigma);
        let raw_action = self.agent.select_action(&state, Some(&mut self.noise))?;

        let clipped = clip_action(&raw_action);
        let action = discretize(&clipped, &self.choices);

        let SnapShot {
            state: next_state,
            reward,
            done,
        } = self.env.step(&action)?;

        // The raw pre-clip action goes into the buffer, not the discretized
        // one: the critic learns over the continuous action space.
        self.memory.push(Transition {
            state,
            action: raw_action.clone(),
            mask: if done { 0. } else { 1. },
            next_state,
            reward,
        });
        self.sink
            .record_scalar("ddpg_reward/reward", reward, self.exec_timer);

        Ok(StepOutcome::Stepped {
            raw_action,
            action,
            reward,
            done,
        })
    }

    /// One learning phase: `updates_per_step` rounds of sample + update.
    /// No-ops quietly while the buffer is below the warm-up threshold.
    pub fn train(&mut self) -> Result<()> {
        if self.memory.len() <= self.config.warmup_batches * self.config.batch_size {
            return Ok(());
        }
        for _ in 0..self.config.updates_per_step {
            let batch = self
                .memory
                .sample_batch(self.config.batch_size, &mut self.rng)?;
            let losses = self.agent.update_parameters(&batch)?;
            self.sink
                .record_scalar("ddpg_loss/value", losses.value, self.train_timer);
            self.sink
                .record_scalar("ddpg_loss/policy", losses.policy, self.train_timer);
            self.train_timer += 1;

            if self.train_timer % self.config.checkpoint_every == self.config.checkpoint_every - 1 {
                // A failed save must not kill the loop, but it has to be loud.
                if let Err(err) = self.save_state() {
                    error!("checkpoint save failed: {err}");
                }
            }
        }
        Ok(())
    }

    /// Writes the full model + memory checkpoint for this run's slot.
    pub fn save_state(&self) -> Result<()> {
        checkpoint::save_state(&self.paths, &self.agent, &self.memory)
    }

    pub fn exec_timer(&self) -> usize {
        self.exec_timer
    }

    pub fn train_timer(&self) -> usize {
        self.train_timer
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn noise(&self) -> &OuNoise {
        &self.noise
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn sink(&self) -> &SinkKind {
        &self.sink
    }

    pub fn config(&self) -> &DdpgConfig {
        &self.config
    }
}

impl<E: Env, A: Agent, H: OffPolicyAlgorithmHooks> Algorithm for OffPolicyAlgorithm<E, A, H> {
    fn run(&mut self) -> Result<()> {
        if self.hooks.init_hook() {
            return Ok(());
        }
        loop {
            // interaction phase
            let outcome = self.execute()?;
            break_on_hook_res!(self.hooks.post_step_hook(self.exec_timer, &outcome));

            // learning phase
            self.train()?;
            break_on_hook_res!(self.hooks.post_update_hook(self.train_timer));
        }
        self.hooks.shutdown_hook()
    }
}

#[cfg(test)]
mod test {
    use super::{clip_action, discretize};

    #[test]
    fn clip_bounds_every_dimension() {
        let clipped = clip_action(&[-3.2, -1.0, 0.4, 1.0, 7.5]);
        assert_eq!(clipped, vec![-1.0, -1.0, 0.4, 1.0, 1.0]);
        for x in clipped {
            assert!((-1.0..=1.0).contains(&x));
        }
    }

    #[test]
    fn discretize_is_total_over_the_closed_range() {
        let choices = [10usize];
        let mut x = -1.0f32;
        while x <= 1.0 {
            let idx = discretize(&[x], &choices)[0];
            assert!(idx < 10, "x = {x} mapped to {idx}");
            x += 1e-3;
        }
    }

    #[test]
    fn discretize_clamps_the_upper_edge() {
        assert_eq!(discretize(&[1.0], &[10]), vec![9]);
        assert_eq!(discretize(&[-1.0], &[10]), vec![0]);
        assert_eq!(discretize(&[0.0], &[10]), vec![5]);
    }

    #[test]
    fn discretize_handles_mixed_dimensions() {
        assert_eq!(discretize(&[1.0, -1.0, 0.99], &[10, 3, 4]), vec![9, 0, 3]);
    }
}
