use crate::error::Result;
use crate::memory::TransitionBatch;
use crate::noise::OuNoise;
use std::path::Path;

/// Losses reported by one parameter update round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Losses {
    pub value: f32,
    pub policy: f32,
}

/// The DDPG actor/critic pair as an opaque capability. The loop never looks
/// at network internals: it asks for actions, feeds batches back in, and
/// tells the agent where to persist itself.
///
/// `select_action` folds the exploration noise into the returned raw action
/// when a process is handed over; the result may lie outside `[-1, 1]` and
/// the caller clips it.
pub trait Agent {
    fn select_action(&mut self, state: &[f32], noise: Option<&mut OuNoise>) -> Result<Vec<f32>>;

    /// One gradient round over a sampled batch. Updates the actor, the
    /// critic and their Polyak-averaged target copies.
    fn update_parameters(&mut self, batch: &TransitionBatch) -> Result<Losses>;

    fn save_model(&self, actor_path: &Path, critic_path: &Path) -> Result<()>;

    fn load_model(&mut self, actor_path: &Path, critic_path: &Path) -> Result<()>;
}
