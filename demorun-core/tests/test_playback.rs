mod common;
use anyhow::Result;
use common::{dataset, init_logger};
use demorun_core::{
    dataset::{DatasetStore, MemoryStore},
    dummy::{DummyEnv, DummyEnvConfig, MemorySink},
    episode::{EpisodeController, Termination},
    error::DemorunError,
    frame::FrameMultiplexer,
    record::{BufferedRecorder, NullRecorder},
    runner::{EpisodeStatus, Frames, Playback, RunConfig, RunSummary},
    video::VideoSink,
};
use ndarray::{Array1, Array2};

fn frames(config: &RunConfig, sink: &MemorySink) -> Result<Frames> {
    let sink: Box<dyn VideoSink> = Box::new(sink.clone());
    FrameMultiplexer::new(config.frame_config(), sink)
}

fn playback(store: &MemoryStore, config: RunConfig, env: DummyEnvConfig) -> Result<RunSummary> {
    let mut ctrl = EpisodeController::new(DummyEnv::new(env), config.horizon);
    Playback::new(store, config)?.run(&mut ctrl, None, &mut NullRecorder::new())
}

#[test]
fn test_replay_is_deterministic() -> Result<()> {
    init_logger();
    let store = dataset(&[15, 9], 3);
    let env = DummyEnvConfig::default().action_dim(3);
    let s1 = playback(&store, RunConfig::default(), env.clone())?;
    let s2 = playback(&store, RunConfig::default(), env)?;

    assert_eq!(s1.completed, 2);
    assert_eq!(s1.episodes, s2.episodes);
    assert_eq!(s1.mean_return, s2.mean_return);
    assert_eq!(s1.episodes[0].stats.unwrap().horizon, 15);
    assert_eq!(s1.episodes[1].termination, Some(Termination::Exhausted));
    Ok(())
}

#[test]
fn test_frames_every_interval() -> Result<()> {
    let store = dataset(&[23], 3);
    let config = RunConfig::default().render_interval(5).frame_size(32, 48);
    let sink = MemorySink::new();
    let mut ctrl = EpisodeController::new(
        DummyEnv::new(DummyEnvConfig::default().action_dim(3)),
        config.horizon,
    );
    let mut recorder = BufferedRecorder::new();
    let summary = Playback::new(&store, config.clone())?.run(
        &mut ctrl,
        Some(frames(&config, &sink)?),
        &mut recorder,
    )?;

    assert_eq!(summary.frames, 5);
    assert_eq!(summary.render_errors, 0);
    assert_eq!(sink.n_frames(), 5);
    assert_eq!(sink.dimensions()[0], (48, 32));
    assert!(sink.is_closed());
    // 23 step records and one episode record
    assert_eq!(recorder.len(), 24);
    Ok(())
}

#[test]
fn test_success_terminates_playback() -> Result<()> {
    let store = dataset(&[20], 2);
    let env = DummyEnvConfig::default().action_dim(2).success_at(4);
    let summary = playback(&store, RunConfig::default(), env)?;
    let episode = &summary.episodes[0];
    assert_eq!(episode.termination, Some(Termination::Success));
    assert_eq!(episode.stats.unwrap().horizon, 4);
    assert_eq!(summary.success_rate, 1.0);
    Ok(())
}

#[test]
fn test_horizon_cuts_long_demo() -> Result<()> {
    let store = dataset(&[30], 2);
    let config = RunConfig::default().horizon(10);
    let summary = playback(&store, config, DummyEnvConfig::default().action_dim(2))?;
    assert_eq!(summary.episodes[0].termination, Some(Termination::Horizon));
    assert_eq!(summary.mean_horizon, 10.0);
    Ok(())
}

#[test]
fn test_invalid_demo_is_skipped() -> Result<()> {
    let mut store = dataset(&[5, 6, 7], 2);
    store.insert("data/demo_1/rewards", Array1::<f64>::zeros(7).into_dyn());
    let env = DummyEnvConfig::default().action_dim(2);

    let summary = playback(&store, RunConfig::default(), env.clone())?;
    assert_eq!(
        (summary.completed, summary.skipped, summary.failed),
        (2, 1, 0)
    );
    assert_eq!(summary.episodes[1].id, "demo_1");
    assert_eq!(summary.episodes[1].status, EpisodeStatus::Skipped);

    let summary = playback(&store, RunConfig::default().skip_invalid(false), env)?;
    assert_eq!(summary.completed, 3);
    Ok(())
}

#[test]
fn test_demo_without_actions_is_skipped() -> Result<()> {
    let mut store = dataset(&[5, 6], 2);
    store.remove("data/demo_0/actions");
    let summary = playback(&store, RunConfig::default(), DummyEnvConfig::default().action_dim(2))?;
    assert_eq!((summary.completed, summary.skipped), (1, 1));
    Ok(())
}

#[test]
fn test_env_error_fails_episode_and_run_continues() -> Result<()> {
    let store = dataset(&[5, 2], 2);
    let env = DummyEnvConfig::default().action_dim(2).fail_step_at(3);
    let summary = playback(&store, RunConfig::default(), env)?;
    assert_eq!((summary.completed, summary.failed), (1, 1));
    assert_eq!(summary.episodes[0].status, EpisodeStatus::Failed);
    assert_eq!(summary.episodes[1].status, EpisodeStatus::Completed);
    Ok(())
}

#[test]
fn test_max_demos() -> Result<()> {
    let store = dataset(&[3, 3, 3], 2);
    let config = RunConfig::default().max_demos(2);
    let summary = playback(&store, config, DummyEnvConfig::default().action_dim(2))?;
    assert_eq!(summary.episodes.len(), 2);
    Ok(())
}

#[test]
fn test_sink_is_closed_when_run_aborts() -> Result<()> {
    let store = MemoryStore::new();
    let config = RunConfig::default().frame_size(8, 8);
    let sink = MemorySink::new();
    let mut ctrl = EpisodeController::new(DummyEnv::new(DummyEnvConfig::default()), 10);

    let err = Playback::new(&store, config.clone())?
        .run(&mut ctrl, Some(frames(&config, &sink)?), &mut NullRecorder::new())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DemorunError>(),
        Some(DemorunError::MissingKey(_))
    ));
    assert!(sink.is_closed());
    Ok(())
}

#[test]
fn test_snapshot_wider_than_actions() -> Result<()> {
    // Lift: 32-dim physics state, 7-dim actions
    let mut store = dataset(&[6, 4], 7);
    for id in ["demo_0", "demo_1"].iter() {
        let n = store.read_f64(&format!("data/{}/actions", id))?.shape()[0];
        store.insert(
            &format!("data/{}/states", id),
            Array2::<f64>::zeros((n, 32)).into_dyn(),
        );
    }

    let summary = playback(&store, RunConfig::default(), DummyEnvConfig::default())?;
    assert_eq!(
        (summary.completed, summary.skipped, summary.failed),
        (2, 0, 0)
    );
    assert_eq!(summary.episodes[0].stats.unwrap().horizon, 6);
    Ok(())
}
