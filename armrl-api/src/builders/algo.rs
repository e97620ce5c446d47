use anyhow::Result;
use armrl_core::{
    agents::Agent,
    checkpoint::{self, CheckpointPaths},
    config::DdpgConfig,
    env::Env,
    memory::ReplayMemory,
    metrics::SinkKind,
    noise::OuNoise,
    off_policy_algorithm::{
        DefaultOffPolicyAlgorithmHooks, LearningSchedule, OffPolicyAlgorithm,
        OffPolicyAlgorithmHooks,
    },
};
use tracing::{info, warn};

/// Assembles a ready-to-run [`OffPolicyAlgorithm`] from a config plus the
/// two collaborators the core treats as opaque. With `load_state` set, the
/// builder restores the checkpoint slot named by the config; model and
/// memory load independently and either failing just means that side starts
/// fresh.
pub struct DdpgBuilder {
    pub config: DdpgConfig,
    pub load_state: bool,
    pub sink: SinkKind,
    pub noise: Option<OuNoise>,
    pub learning_schedule: LearningSchedule,
}

impl DdpgBuilder {
    pub fn new(config: DdpgConfig) -> Self {
        Self {
            config,
            load_state: true,
            sink: SinkKind::default(),
            noise: None,
            learning_schedule: LearningSchedule::step_bound(0),
        }
    }

    pub fn set_learning_schedule(&mut self, learning_schedule: LearningSchedule) {
        self.learning_schedule = learning_schedule;
    }

    pub fn build<E: Env, A: Agent>(
        self,
        env: E,
        agent: A,
    ) -> Result<OffPolicyAlgorithm<E, A, DefaultOffPolicyAlgorithmHooks>> {
        let hooks = DefaultOffPolicyAlgorithmHooks::new(self.learning_schedule);
        self.build_with_hooks(env, agent, hooks)
    }

    pub fn build_with_hooks<E: Env, A: Agent, H: OffPolicyAlgorithmHooks>(
        self,
        env: E,
        mut agent: A,
        hooks: H,
    ) -> Result<OffPolicyAlgorithm<E, A, H>> {
        let paths = CheckpointPaths::new(
            self.config.checkpoint_dir.clone(),
            self.config.env_name.clone(),
            self.config.suffix,
        );
        let mut memory = ReplayMemory::new(self.config.replay_size);
        if self.load_state {
            match checkpoint::load_memory(&paths) {
                Ok(restored) => {
                    info!("restored replay snapshot with {} transitions", restored.len());
                    memory = restored;
                }
                Err(err) => warn!("starting with an empty replay buffer: {err}"),
            }
            match checkpoint::load_model(&paths, &mut agent) {
                Ok(()) => info!("restored model checkpoint"),
                Err(err) => warn!("starting from fresh model parameters: {err}"),
            }
        }
        let noise = match self.noise {
            Some(noise) => noise,
            None => OuNoise::new(env.env_description().n_actions()),
        };
        let algo =
            OffPolicyAlgorithm::new(env, agent, memory, noise, self.sink, hooks, self.config)?;
        Ok(algo)
    }
}
