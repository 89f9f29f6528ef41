//! Configuration of a run.
use crate::{error::DemorunError, frame::FrameConfig, validator::Tolerance};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Configuration of [`Playback`](super::Playback) and [`PolicyRollout`](super::PolicyRollout).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct RunConfig {
    /// Path of the dataset.
    pub dataset: Option<PathBuf>,

    /// Directory where the video and the summary are written.
    pub output_dir: PathBuf,

    /// File name of the video in `output_dir`. No video is written if `None`.
    pub video_name: Option<String>,

    /// Frames per second of the video.
    pub fps: u32,

    /// The maximum number of steps of an episode.
    pub horizon: usize,

    /// Frames are captured every `render_interval` steps.
    pub render_interval: usize,

    /// Cameras concatenated into a video frame.
    pub camera_names: Vec<String>,

    /// Height of each camera image.
    pub frame_height: u32,

    /// Width of each camera image.
    pub frame_width: u32,

    /// Only the first `max_demos` demonstrations are played back.
    pub max_demos: Option<usize>,

    /// The number of episodes of a policy rollout.
    pub n_episodes: usize,

    /// Demonstrations failing validation are skipped if `true`, and played
    /// back anyway otherwise.
    pub skip_invalid: bool,

    /// Tolerance of the alignment check.
    pub tolerance: Tolerance,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            output_dir: PathBuf::from("output"),
            video_name: Some("playback.gif".to_string()),
            fps: 20,
            horizon: 400,
            render_interval: 5,
            camera_names: vec!["agentview".to_string()],
            frame_height: 512,
            frame_width: 512,
            max_demos: None,
            n_episodes: 1,
            skip_invalid: true,
            tolerance: Tolerance::default(),
        }
    }
}

impl RunConfig {
    /// Sets the path of the dataset.
    pub fn dataset(mut self, v: impl AsRef<Path>) -> Self {
        self.dataset = Some(v.as_ref().to_path_buf());
        self
    }

    /// Sets the output directory.
    pub fn output_dir(mut self, v: impl AsRef<Path>) -> Self {
        self.output_dir = v.as_ref().to_path_buf();
        self
    }

    /// Sets the file name of the video, `None` to disable video.
    pub fn video_name(mut self, v: Option<String>) -> Self {
        self.video_name = v;
        self
    }

    /// Sets frames per second.
    pub fn fps(mut self, v: u32) -> Self {
        self.fps = v;
        self
    }

    /// Sets the horizon.
    pub fn horizon(mut self, v: usize) -> Self {
        self.horizon = v;
        self
    }

    /// Sets the render interval in steps.
    pub fn render_interval(mut self, v: usize) -> Self {
        self.render_interval = v;
        self
    }

    /// Sets the cameras.
    pub fn camera_names<T: Into<String>>(mut self, v: Vec<T>) -> Self {
        self.camera_names = v.into_iter().map(|c| c.into()).collect();
        self
    }

    /// Sets the size of each camera image.
    pub fn frame_size(mut self, height: u32, width: u32) -> Self {
        self.frame_height = height;
        self.frame_width = width;
        self
    }

    /// Sets the maximum number of demonstrations.
    pub fn max_demos(mut self, v: usize) -> Self {
        self.max_demos = Some(v);
        self
    }

    /// Sets the number of rollout episodes.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }

    /// Sets whether invalid demonstrations are skipped.
    pub fn skip_invalid(mut self, v: bool) -> Self {
        self.skip_invalid = v;
        self
    }

    /// Sets the tolerance of the alignment check.
    pub fn tolerance(mut self, v: Tolerance) -> Self {
        self.tolerance = v;
        self
    }

    /// Checks the values.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| -> Result<()> {
            Err(DemorunError::InvalidConfig(msg.to_string()).into())
        };
        if self.horizon == 0 {
            return invalid("horizon must be > 0");
        }
        if self.render_interval == 0 {
            return invalid("render_interval must be > 0");
        }
        if self.video_name.is_some() {
            if self.fps == 0 {
                return invalid("fps must be > 0");
            }
            if self.camera_names.is_empty() {
                return invalid("camera_names must not be empty");
            }
            if self.frame_height == 0 || self.frame_width == 0 {
                return invalid("frame size must be > 0");
            }
        }
        Ok(())
    }

    /// Configuration of the frame multiplexer.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig::default()
            .interval(self.render_interval)
            .cameras(self.camera_names.clone())
            .size(self.frame_height, self.frame_width)
    }

    /// Path of the video, if enabled.
    pub fn video_path(&self) -> Option<PathBuf> {
        self.video_name.as_ref().map(|name| self.output_dir.join(name))
    }

    /// Creates the output directory if it does not exist.
    pub fn prepare_output_dir(&self) -> Result<&Path> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create {:?}", self.output_dir))?;
        Ok(&self.output_dir)
    }

    /// Constructs [`RunConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RunConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_run_config() -> Result<()> {
        let config = RunConfig::default()
            .dataset("datasets/lift/ph/low_dim.hdf5")
            .horizon(200)
            .camera_names(vec!["front", "side"])
            .max_demos(3)
            .tolerance(Tolerance {
                atol: 1e-4,
                rtol: 0.0,
            });

        let dir = TempDir::new("run_config")?;
        let path = dir.path().join("run_config.yaml");
        config.save(&path)?;
        let config_ = RunConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_partial_yaml_uses_defaults() -> Result<()> {
        let config: RunConfig = serde_yaml::from_str("horizon: 50\nvideo_name: ~\n")?;
        assert_eq!(config.horizon, 50);
        assert_eq!(config.video_name, None);
        assert_eq!(config.render_interval, 5);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(RunConfig::default().validate().is_ok());
        assert!(RunConfig::default().horizon(0).validate().is_err());
        assert!(RunConfig::default().render_interval(0).validate().is_err());
        assert!(RunConfig::default()
            .camera_names(Vec::<String>::new())
            .validate()
            .is_err());
        assert!(RunConfig::default()
            .video_name(None)
            .camera_names(Vec::<String>::new())
            .validate()
            .is_ok());
    }

    #[test]
    fn test_prepare_output_dir() -> Result<()> {
        let tmp = TempDir::new("run_config")?;
        let config = RunConfig::default().output_dir(tmp.path().join("a").join("b"));
        assert!(config.prepare_output_dir()?.is_dir());
        assert_eq!(config.video_path(), Some(tmp.path().join("a/b/playback.gif")));
        Ok(())
    }
}
