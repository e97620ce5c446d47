use anyhow::Result;
use armrl_api::builders::algo::DdpgBuilder;
use armrl_api::test_utils::{DummyArmEnv, LinearAgent};
use armrl_core::{
    Algorithm,
    config::DdpgConfig,
    env::Env,
    metrics::{MemorySink, SinkKind},
    noise::{OuNoise, SigmaSchedule},
    off_policy_algorithm::{LearningSchedule, OffPolicyAlgorithm, StepOutcome},
};
use std::path::Path;

fn test_config(dir: &Path) -> DdpgConfig {
    DdpgConfig {
        batch_size: 4,
        replay_size: 64,
        updates_per_step: 5,
        checkpoint_dir: dir.to_path_buf(),
        seed: Some(11),
        ..DdpgConfig::default()
    }
}

fn build_algo(
    env: DummyArmEnv,
    config: DdpgConfig,
) -> Result<
    OffPolicyAlgorithm<
        DummyArmEnv,
        LinearAgent,
        armrl_core::off_policy_algorithm::DefaultOffPolicyAlgorithmHooks,
    >,
> {
    let n_actions = env.env_description().n_actions();
    let mut builder = DdpgBuilder::new(config);
    builder.load_state = false;
    builder.sink = SinkKind::Memory(MemorySink::default());
    builder.noise = Some(OuNoise::seeded(n_actions, 7));
    builder.set_learning_schedule(LearningSchedule::step_bound(20));
    let agent = LinearAgent::new(4, n_actions);
    builder.build(env, agent)
}

#[test]
fn train_is_a_noop_below_the_warmup_threshold() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let env = DummyArmEnv::new(vec![10, 10, 3]);
    let mut algo = build_algo(env, test_config(dir.path()))?;

    // warmup threshold is 3 * 4 = 12 transitions
    for _ in 0..12 {
        algo.execute()?;
        algo.train()?;
        assert_eq!(algo.train_timer(), 0);
    }
    assert_eq!(algo.memory().len(), 12);

    algo.execute()?;
    algo.train()?;
    assert_eq!(algo.train_timer(), 5);
    Ok(())
}

#[test]
fn missed_detections_skip_the_cycle_without_side_effects() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let env = DummyArmEnv::with_detections(vec![10, 10, 3], vec![None, None, None]);
    let mut algo = build_algo(env, test_config(dir.path()))?;

    let noise_state_before = algo.noise().state().to_vec();
    for _ in 0..3 {
        let outcome = algo.execute()?;
        assert!(matches!(outcome, StepOutcome::Skipped));
    }
    assert_eq!(algo.exec_timer(), 3);
    assert!(algo.memory().is_empty());
    assert_eq!(algo.noise().state(), noise_state_before.as_slice());
    assert!(algo.env().received.is_empty());

    // the script is exhausted, detections resume
    let outcome = algo.execute()?;
    assert!(matches!(outcome, StepOutcome::Stepped { .. }));
    assert_eq!(algo.exec_timer(), 4);
    assert_eq!(algo.memory().len(), 1);
    Ok(())
}

#[test]
fn raw_action_is_stored_and_discrete_action_is_delivered() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let env = DummyArmEnv::new(vec![10, 10, 3]);
    let mut algo = build_algo(env, test_config(dir.path()))?;

    for _ in 0..6 {
        let outcome = algo.execute()?;
        let StepOutcome::Stepped {
            raw_action, action, ..
        } = outcome
        else {
            panic!("dummy env always detects");
        };
        // delivered indices are always in range
        for (idx, n) in action.iter().zip([10usize, 10, 3]) {
            assert!(*idx < n);
        }
        // the buffer holds the raw pre-clip action
        let stored = algo.memory().iter().last().unwrap();
        assert_eq!(stored.action, raw_action);
    }
    assert_eq!(algo.env().received.len(), 6);

    // episode end at the fifth step is recorded through the mask
    let masks: Vec<f32> = algo.memory().iter().map(|t| t.mask).collect();
    assert_eq!(masks[4], 0.0);
    assert_eq!(masks[3], 1.0);
    Ok(())
}

#[test]
fn losses_and_rewards_flow_into_the_scalar_sink() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let env = DummyArmEnv::new(vec![10, 10, 3]);
    let mut algo = build_algo(env, test_config(dir.path()))?;

    for _ in 0..13 {
        algo.execute()?;
    }
    algo.train()?;

    let SinkKind::Memory(sink) = algo.sink() else {
        panic!("test sink is the memory sink");
    };
    let rewards: Vec<_> = sink
        .iter()
        .filter(|r| r.series == "ddpg_reward/reward")
        .collect();
    assert_eq!(rewards.len(), 13);
    assert_eq!(rewards[0].step, 1);

    let value_losses: Vec<_> = sink
        .iter()
        .filter(|r| r.series == "ddpg_loss/value")
        .collect();
    let policy_losses: Vec<_> = sink
        .iter()
        .filter(|r| r.series == "ddpg_loss/policy")
        .collect();
    assert_eq!(value_losses.len(), 5);
    assert_eq!(policy_losses.len(), 5);
    // losses are keyed by the update counter, starting where it stood
    assert_eq!(value_losses[0].step, 0);
    assert_eq!(value_losses[4].step, 4);
    Ok(())
}

#[test]
fn decaying_sigma_reaches_its_floor() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let env = DummyArmEnv::new(vec![10, 10, 3]);
    let mut config = test_config(dir.path());
    config.sigma_schedule = SigmaSchedule::LinearDecay {
        max: 0.6,
        floor: 0.2,
        decay_steps: 10.0,
    };
    let mut algo = build_algo(env, config)?;

    algo.execute()?;
    assert!((algo.noise().sigma() - 0.6).abs() < 1e-6);

    for _ in 0..13 {
        algo.execute()?;
    }
    algo.train()?; // 5 updates
    algo.execute()?;
    assert!((algo.noise().sigma() - 0.2).abs() < 1e-6, "sigma decayed past the floor");
    Ok(())
}

#[test]
fn run_drives_cycles_until_the_step_bound() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let env = DummyArmEnv::new(vec![10, 10, 3]);
    let mut algo = build_algo(env, test_config(dir.path()))?;
    algo.run()?;
    assert_eq!(algo.exec_timer(), 20);
    assert!(algo.train_timer() > 0, "the loop got past warmup and learned");
    Ok(())
}

#[test]
fn run_stops_at_the_update_bound() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let env = DummyArmEnv::new(vec![10, 10, 3]);
    let n_actions = env.env_description().n_actions();
    let mut builder = DdpgBuilder::new(test_config(dir.path()));
    builder.load_state = false;
    builder.noise = Some(OuNoise::seeded(n_actions, 7));
    builder.set_learning_schedule(LearningSchedule::update_bound(10));
    let mut algo = builder.build(env, LinearAgent::new(4, n_actions))?;
    algo.run()?;
    assert_eq!(algo.train_timer(), 10);
    Ok(())
}
