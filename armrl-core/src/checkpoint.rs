use crate::agents::Agent;
use crate::error::Result;
use crate::memory::ReplayMemory;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Deterministic on-disk layout for one `(env_name, suffix)` checkpoint
/// slot: actor and critic weights under `models/`, the replay snapshot
/// under `mem/`. A suffix of `-1` is the default slot the loop keeps
/// overwriting.
#[derive(Debug, Clone)]
pub struct CheckpointPaths {
    dir: PathBuf,
    env_name: String,
    suffix: i64,
}

impl CheckpointPaths {
    pub fn new(dir: impl Into<PathBuf>, env_name: impl Into<String>, suffix: i64) -> Self {
        Self {
            dir: dir.into(),
            env_name: env_name.into(),
            suffix,
        }
    }

    pub fn actor_path(&self) -> PathBuf {
        self.dir
            .join("models")
            .join(format!("ddpg_actor_{}_{}.bin", self.env_name, self.suffix))
    }

    pub fn critic_path(&self) -> PathBuf {
        self.dir
            .join("models")
            .join(format!("ddpg_critic_{}_{}.bin", self.env_name, self.suffix))
    }

    pub fn memory_path(&self) -> PathBuf {
        self.dir
            .join("mem")
            .join(format!("mem_{}_{}.bin", self.env_name, self.suffix))
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes model and memory as one checkpoint. Every artifact is written to
/// a `.tmp` sibling first and the renames happen only after all three
/// writes succeeded, so a crash mid-save leaves the previous pair intact
/// rather than a half-written one.
pub fn save_state<A: Agent>(
    paths: &CheckpointPaths,
    agent: &A,
    memory: &ReplayMemory,
) -> Result<()> {
    let actor = paths.actor_path();
    let critic = paths.critic_path();
    let mem = paths.memory_path();
    for target in [&actor, &critic, &mem] {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
    }

    let actor_tmp = tmp_sibling(&actor);
    let critic_tmp = tmp_sibling(&critic);
    let mem_tmp = tmp_sibling(&mem);
    agent.save_model(&actor_tmp, &critic_tmp)?;
    memory.save(&mem_tmp)?;

    fs::rename(&actor_tmp, &actor)?;
    fs::rename(&critic_tmp, &critic)?;
    fs::rename(&mem_tmp, &mem)?;
    info!(
        "checkpoint written: {} ({} transitions)",
        actor.display(),
        memory.len()
    );
    Ok(())
}

/// Loads the model side of a checkpoint into `agent`. Independent of
/// [`load_memory`]: either side may succeed while the other is missing.
pub fn load_model<A: Agent>(paths: &CheckpointPaths, agent: &mut A) -> Result<()> {
    agent.load_model(&paths.actor_path(), &paths.critic_path())
}

/// Loads the replay snapshot of a checkpoint.
pub fn load_memory(paths: &CheckpointPaths) -> Result<ReplayMemory> {
    ReplayMemory::load(&paths.memory_path())
}

#[cfg(test)]
mod test {
    use super::{CheckpointPaths, tmp_sibling};
    use std::path::Path;

    #[test]
    fn paths_follow_the_component_env_suffix_pattern() {
        let paths = CheckpointPaths::new("checkpoints", "arm", -1);
        assert_eq!(
            paths.actor_path(),
            Path::new("checkpoints/models/ddpg_actor_arm_-1.bin")
        );
        assert_eq!(
            paths.critic_path(),
            Path::new("checkpoints/models/ddpg_critic_arm_-1.bin")
        );
        assert_eq!(paths.memory_path(), Path::new("checkpoints/mem/mem_arm_-1.bin"));
    }

    #[test]
    fn tmp_sibling_stays_in_the_same_directory() {
        let tmp = tmp_sibling(Path::new("checkpoints/mem/mem_arm_-1.bin"));
        assert_eq!(tmp, Path::new("checkpoints/mem/mem_arm_-1.bin.tmp"));
    }
}
