use anyhow::Result;
use tempdir::TempDir;
use vecroll_core::{
    dummy::{DummyOracle, DummyVecEnv},
    record::BufferedRecorder,
    Algorithm, NullCheckpointer, RolloutConfig, Trainer, TrainerConfig,
};

fn init() {
    env_logger::try_init().unwrap_or(());
}

fn rollout_config() -> RolloutConfig {
    RolloutConfig::default()
        .num_steps(4)
        .num_envs(4)
        .obs_dim(3)
        .state_dim(2)
        .act_dim(1)
}

fn run(config: TrainerConfig) -> Result<(Trainer, BufferedRecorder)> {
    let mut trainer = Trainer::build(config, rollout_config())?;
    let mut oracle = DummyOracle::new(1);
    let mut env = DummyVecEnv::new(4, 3, 6);
    let mut recorder = BufferedRecorder::new();
    trainer.train(&mut oracle, &mut env, &mut recorder, &mut NullCheckpointer)?;
    Ok((trainer, recorder))
}

#[test]
fn a2c_training_emits_records_and_tracks_best_return() -> Result<()> {
    init();
    let config = TrainerConfig::default()
        .num_updates(5)
        .log_interval(1)
        .use_gae(true);
    let (trainer, recorder) = run(config)?;

    assert_eq!(recorder.len(), 5);
    let mut previous_steps = 0.;
    for record in recorder.iter() {
        assert!(record.get_scalar("loss_value")?.is_finite());
        assert!(record.get_scalar("loss_policy")?.is_finite());
        let steps = record.get_scalar("env_steps")?;
        assert!(steps > previous_steps);
        previous_steps = steps;
        assert_eq!(record.get_array1("episode_return")?.len(), 4);
    }
    // Every episode pays 6 reward; once one completes the best sticks.
    assert_eq!(trainer.best_return(), 6.0);
    Ok(())
}

#[test]
fn ppo_training_with_recurrent_minibatches() -> Result<()> {
    init();
    let config = TrainerConfig::default()
        .algorithm(Algorithm::Ppo)
        .recurrent(true)
        .num_mini_batch(2)
        .ppo_epochs(2)
        .num_updates(3)
        .log_interval(0);
    let (_, recorder) = run(config)?;
    assert_eq!(recorder.len(), 3);
    Ok(())
}

#[test]
fn acktr_training_runs_to_completion() -> Result<()> {
    init();
    let config = TrainerConfig::default()
        .algorithm(Algorithm::Acktr)
        .fisher_interval(2)
        .num_updates(4)
        .log_interval(0);
    let (_, recorder) = run(config)?;
    assert_eq!(recorder.len(), 4);
    Ok(())
}

#[test]
fn configs_round_trip_through_yaml() -> Result<()> {
    let dir = TempDir::new("vecroll_config")?;

    let trainer_path = dir.path().join("trainer.yaml");
    let trainer_config = TrainerConfig::default()
        .algorithm(Algorithm::Ppo)
        .num_mini_batch(8)
        .clip_param(0.1)
        .use_gae(true);
    trainer_config.save(&trainer_path)?;
    assert_eq!(TrainerConfig::load(&trainer_path)?, trainer_config);

    let rollout_path = dir.path().join("rollout.yaml");
    let rollout_config = rollout_config().seed(7);
    rollout_config.save(&rollout_path)?;
    assert_eq!(RolloutConfig::load(&rollout_path)?, rollout_config);
    Ok(())
}
