use crate::noise::SigmaSchedule;
use std::path::PathBuf;

/// Hyperparameters and persistence knobs for one training run. Passed into
/// the controller explicitly so runs can coexist and be tested in
/// isolation.
///
/// `gamma` and `tau` belong to the agent's update rule; they live here so a
/// run is described by a single struct, and whoever constructs the agent
/// reads them from the same place.
#[derive(Debug, Clone)]
pub struct DdpgConfig {
    pub env_name: String,
    pub gamma: f32,
    pub tau: f32,
    pub batch_size: usize,
    pub replay_size: usize,
    pub updates_per_step: usize,
    /// `train` only proceeds once the buffer holds more than
    /// `warmup_batches * batch_size` transitions.
    pub warmup_batches: usize,
    /// A full checkpoint every this many updates.
    pub checkpoint_every: usize,
    pub sigma_schedule: SigmaSchedule,
    /// Checkpoint slot selector, `-1` is the default slot.
    pub suffix: i64,
    pub checkpoint_dir: PathBuf,
    /// Seeds batch sampling when set; noise carries its own seed.
    pub seed: Option<u64>,
}

impl Default for DdpgConfig {
    fn default() -> Self {
        Self {
            env_name: "arm".to_string(),
            gamma: 0.9,
            tau: 1e-3,
            batch_size: 64,
            replay_size: 100_000,
            updates_per_step: 5,
            warmup_batches: 3,
            checkpoint_every: 100,
            sigma_schedule: SigmaSchedule::default(),
            suffix: -1,
            checkpoint_dir: PathBuf::from("checkpoints"),
            seed: None,
        }
    }
}
