use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use demorun::util::url::{download, LIFT_PH_LOW_DIM_URL};
use demorun_core::{
    dataset::{demo_path, DatasetInfo, DatasetStore},
    dummy::{DummyEnv, DummyEnvConfig, DummyPolicy},
    episode::EpisodeController,
    frame::FrameMultiplexer,
    record::LogRecorder,
    runner::{Frames, Playback, PolicyRollout, RunConfig, RunSummary},
    validator::{Tolerance, Validator},
    video::{open_video_sink, VideoSink},
    Env,
};
use demorun_robomimic::{Hdf5Dataset, ImageioSink, RobomimicEnv, RobomimicEnvConfig};
use log::info;
use std::{fs, path::PathBuf};

/// Inspect, validate, play back and roll out robot-manipulation demonstrations
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Downloads a dataset or a checkpoint.
    Download {
        /// URL of the file. Defaults to the Lift proficient-human low-dim dataset.
        #[arg(long, default_value = LIFT_PH_LOW_DIM_URL)]
        url: String,

        /// Download directory. Defaults to `~/.demorun/downloads`.
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Prints the structure of a dataset as JSON.
    Inspect {
        /// Path of the dataset.
        dataset: PathBuf,

        /// The number of timesteps of the first demonstration to print.
        #[arg(long, default_value_t = 5)]
        n_timesteps: usize,
    },

    /// Checks the consistency of all demonstrations in a dataset.
    Validate {
        /// Path of the dataset.
        dataset: PathBuf,

        /// Dimensionality of the action space.
        #[arg(long)]
        action_dim: Option<usize>,

        /// Absolute tolerance of the alignment check.
        #[arg(long, default_value_t = 1e-6)]
        atol: f32,

        /// Relative tolerance of the alignment check.
        #[arg(long, default_value_t = 1e-5)]
        rtol: f32,
    },

    /// Replays the recorded actions of a dataset in the simulator.
    Playback {
        #[command(flatten)]
        run: RunArgs,

        /// Replays on a dummy environment instead of the simulator.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Runs a policy restored from a checkpoint.
    Rollout {
        #[command(flatten)]
        run: RunArgs,

        /// Path of the checkpoint.
        #[arg(long)]
        checkpoint: Option<PathBuf>,

        /// Runs a constant zero policy on a dummy environment instead.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Prints the default run configuration as YAML.
    ShowConfig,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Run configuration in YAML. Options below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path of the dataset.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Output directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// File name of the video: `.mp4` is written with imageio, `.gif` as an
    /// animated GIF, anything else as a directory of PNG frames.
    #[arg(long)]
    video_name: Option<String>,

    /// Disables video.
    #[arg(long, default_value_t = false)]
    no_video: bool,

    /// Cameras concatenated into a video frame.
    #[arg(long = "camera")]
    cameras: Vec<String>,

    /// The maximum number of steps of an episode.
    #[arg(long)]
    horizon: Option<usize>,

    /// The number of demonstrations to play back.
    #[arg(long)]
    max_demos: Option<usize>,

    /// The number of rollout episodes.
    #[arg(long)]
    n_episodes: Option<usize>,
}

impl RunArgs {
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => RunConfig::load(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => RunConfig::default(),
        };
        if let Some(v) = self.dataset.as_ref() {
            config = config.dataset(v);
        }
        if let Some(v) = self.output_dir.as_ref() {
            config = config.output_dir(v);
        }
        if let Some(v) = self.video_name.as_ref() {
            config = config.video_name(Some(v.clone()));
        }
        if self.no_video {
            config = config.video_name(None);
        }
        if !self.cameras.is_empty() {
            config = config.camera_names(self.cameras.clone());
        }
        if let Some(v) = self.horizon {
            config = config.horizon(v);
        }
        if let Some(v) = self.max_demos {
            config = config.max_demos(v);
        }
        if let Some(v) = self.n_episodes {
            config = config.n_episodes(v);
        }
        config.validate()?;
        Ok(config)
    }
}

fn open_frames(config: &RunConfig) -> Result<Option<Frames>> {
    let path = match config.video_path() {
        Some(path) => path,
        None => return Ok(None),
    };
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let sink: Box<dyn VideoSink> = match ext.as_deref() {
        Some("mp4") | Some("avi") | Some("mov") => Box::new(ImageioSink::create(&path, config.fps)?),
        _ => open_video_sink(&path, config.fps)?,
    };
    info!("Video is written to {:?}", path);
    Ok(Some(FrameMultiplexer::new(config.frame_config(), sink)?))
}

fn write_summary(config: &RunConfig, summary: &RunSummary) -> Result<()> {
    let path = config.output_dir.join("summary.json");
    fs::write(&path, summary.to_json_pretty()?)?;
    info!(
        "Return = {}, Horizon = {}, SuccessRate = {}",
        summary.mean_return, summary.mean_horizon, summary.success_rate
    );
    info!("Summary is written to {:?}", path);
    Ok(())
}

fn open_dataset(config: &RunConfig) -> Result<Hdf5Dataset> {
    let path = config.dataset.as_ref().context("Dataset is not given")?;
    Hdf5Dataset::open(path)
}

/// Dimensionality of the recorded actions, from the first demonstration.
fn recorded_action_dim<S: DatasetStore>(store: &S) -> Result<usize> {
    let ids = store.demo_ids()?;
    let id = ids.first().context("Dataset has no demonstration")?;
    let actions = store.read_f32(&format!("{}/actions", demo_path(id)))?;
    actions
        .shape()
        .get(1)
        .cloned()
        .context("Actions must be 2-dimensional")
}

fn playback<E: Env>(env: E, store: &Hdf5Dataset, config: &RunConfig) -> Result<RunSummary> {
    let mut ctrl = EpisodeController::new(env, config.horizon);
    let frames = open_frames(config)?;
    Playback::new(store, config.clone())?.run(&mut ctrl, frames, &mut LogRecorder::default())
}

fn cmd_inspect(dataset: PathBuf, n_timesteps: usize) -> Result<()> {
    let store = Hdf5Dataset::open(dataset)?;
    let info = DatasetInfo::collect(&store, n_timesteps)?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn cmd_validate(dataset: PathBuf, action_dim: Option<usize>, tolerance: Tolerance) -> Result<()> {
    let store = Hdf5Dataset::open(dataset)?;
    let mut validator = Validator::new().tolerance(tolerance);
    if let Some(d) = action_dim {
        validator = validator.action_dim(d);
    }

    let validation = validator.validate_dataset(&store)?;
    if !validation.is_ok() {
        bail!(
            "{} of {} demonstrations are invalid",
            validation.n_invalid(),
            validation.n_demos()
        );
    }
    info!("All {} demonstrations are valid", validation.n_demos());
    Ok(())
}

fn cmd_playback(run: RunArgs, dry_run: bool) -> Result<()> {
    let config = run.run_config()?;
    config.prepare_output_dir()?;
    let store = open_dataset(&config)?;

    let summary = if dry_run {
        let env_config = DummyEnvConfig::default().action_dim(recorded_action_dim(&store)?);
        playback(DummyEnv::new(env_config), &store, &config)?
    } else {
        let env = RobomimicEnv::build(&store.env_meta()?, &RobomimicEnvConfig::default())?;
        playback(env, &store, &config)?
    };
    write_summary(&config, &summary)
}

fn cmd_rollout(run: RunArgs, checkpoint: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let config = run.run_config()?;
    config.prepare_output_dir()?;
    let rollout = PolicyRollout::new(config.clone())?;
    let mut recorder = LogRecorder::default();

    let summary = if dry_run {
        let env = DummyEnv::new(DummyEnvConfig::default());
        let policy = DummyPolicy::constant(vec![0.0; env.action_dim()]);
        let mut ctrl = EpisodeController::new(env, config.horizon);
        rollout
            .run(&mut ctrl, policy, open_frames(&config)?, &mut recorder)?
            .0
    } else {
        let checkpoint = checkpoint.context("Checkpoint is not given")?;
        let (env, policy) =
            RobomimicEnv::from_checkpoint(checkpoint, &RobomimicEnvConfig::default())?;
        let mut ctrl = EpisodeController::new(env, config.horizon);
        rollout
            .run(&mut ctrl, policy, open_frames(&config)?, &mut recorder)?
            .0
    };
    write_summary(&config, &summary)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Download { url, dir } => {
            let path = download(url.as_str(), dir)?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Inspect {
            dataset,
            n_timesteps,
        } => cmd_inspect(dataset, n_timesteps),
        Command::Validate {
            dataset,
            action_dim,
            atol,
            rtol,
        } => cmd_validate(dataset, action_dim, Tolerance { atol, rtol }),
        Command::Playback { run, dry_run } => cmd_playback(run, dry_run),
        Command::Rollout {
            run,
            checkpoint,
            dry_run,
        } => cmd_rollout(run, checkpoint, dry_run),
        Command::ShowConfig => {
            print!("{}", serde_yaml::to_string(&RunConfig::default())?);
            Ok(())
        }
    }
}
