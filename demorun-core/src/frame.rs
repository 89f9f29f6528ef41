//! Frame Multiplexer.
//!
//! Renders the requested cameras every `interval` steps, concatenates the
//! images side by side and appends the composite frame to a [`VideoSink`].
use crate::{error::DemorunError, video::VideoSink, Env, RenderRequest};
use anyhow::{bail, Result};
use image::{GenericImage, RgbImage};
use log::{trace, warn};
use serde::{Deserialize, Serialize};

/// Configuration of [`FrameMultiplexer`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FrameConfig {
    /// Frames are captured at steps `0, interval, 2 * interval, ...`.
    pub interval: usize,

    /// Cameras, concatenated from left to right in this order.
    pub cameras: Vec<String>,

    /// Height of each camera image.
    pub height: u32,

    /// Width of each camera image.
    pub width: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            interval: 5,
            cameras: vec!["agentview".to_string()],
            height: 512,
            width: 512,
        }
    }
}

impl FrameConfig {
    /// Sets the capture interval.
    pub fn interval(mut self, interval: usize) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the cameras.
    pub fn cameras<T: Into<String>>(mut self, cameras: Vec<T>) -> Self {
        self.cameras = cameras.into_iter().map(|c| c.into()).collect();
        self
    }

    /// Sets the size of each camera image.
    pub fn size(mut self, height: u32, width: u32) -> Self {
        self.height = height;
        self.width = width;
        self
    }
}

/// The numbers of frames written and render failures.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FrameStats {
    /// The number of composite frames appended to the sink.
    pub frames: usize,

    /// The number of steps where rendering failed.
    pub render_errors: usize,
}

/// Captures frames from an environment.
///
/// This is the interface [`EpisodeController`](crate::episode::EpisodeController)
/// calls after every step.
pub trait FrameCapture<E: Env> {
    /// Captures a frame at step `step_ix` if due.
    ///
    /// Returns `true` if a frame was appended.
    fn capture(&mut self, env: &mut E, step_ix: usize) -> Result<bool>;
}

/// Concatenates images of the same height from left to right.
pub fn hconcat(images: &[RgbImage]) -> Result<RgbImage> {
    let height = match images.first() {
        Some(img) => img.height(),
        None => bail!("No image to concatenate"),
    };
    if let Some(img) = images.iter().find(|img| img.height() != height) {
        bail!(
            "Images to concatenate differ in height: {} and {}",
            height,
            img.height()
        );
    }

    let width = images.iter().map(|img| img.width()).sum();
    let mut out = RgbImage::new(width, height);
    let mut x = 0;
    for img in images.iter() {
        out.copy_from(img, x, 0)?;
        x += img.width();
    }
    Ok(out)
}

/// Owns the video sink of a run and writes composite frames to it.
///
/// The sink is closed by [`FrameMultiplexer::finish`], or when the multiplexer
/// is dropped, so that the video is flushed on every exit path.
pub struct FrameMultiplexer<S: VideoSink> {
    config: FrameConfig,
    sink: S,
    stats: FrameStats,
}

impl<S: VideoSink> FrameMultiplexer<S> {
    /// Constructs a multiplexer writing to an opened sink.
    pub fn new(config: FrameConfig, sink: S) -> Result<Self> {
        if config.interval == 0 {
            return Err(DemorunError::InvalidConfig("render interval must be > 0".into()).into());
        }
        if config.cameras.is_empty() {
            return Err(DemorunError::InvalidConfig("no camera to render".into()).into());
        }
        Ok(Self {
            config,
            sink,
            stats: FrameStats::default(),
        })
    }

    /// Configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Statistics so far.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Returns a reference to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Closes the sink.
    pub fn finish(mut self) -> Result<FrameStats> {
        self.sink.close()?;
        Ok(self.stats)
    }

    fn render<E: Env>(&self, env: &mut E, step_ix: usize) -> Result<Vec<RgbImage>, DemorunError> {
        let (height, width) = (self.config.height, self.config.width);
        self.config
            .cameras
            .iter()
            .map(|camera| {
                let request = RenderRequest::new(camera.clone(), height, width);
                let img = env.render(&request).map_err(|e| DemorunError::Render {
                    camera: camera.clone(),
                    step: step_ix,
                    msg: format!("{:#}", e),
                })?;
                if img.dimensions() != (width, height) {
                    return Err(DemorunError::Render {
                        camera: camera.clone(),
                        step: step_ix,
                        msg: format!(
                            "expected {}x{}, got {}x{}",
                            width,
                            height,
                            img.width(),
                            img.height()
                        ),
                    });
                }
                Ok(img)
            })
            .collect()
    }
}

impl<E: Env, S: VideoSink> FrameCapture<E> for FrameMultiplexer<S> {
    fn capture(&mut self, env: &mut E, step_ix: usize) -> Result<bool> {
        if step_ix % self.config.interval != 0 {
            return Ok(false);
        }

        let images = match self.render(env, step_ix) {
            Ok(images) => images,
            Err(e) => {
                warn!("{}", e);
                self.stats.render_errors += 1;
                return Ok(false);
            }
        };

        let frame = hconcat(&images)?;
        self.sink.append(&frame)?;
        self.stats.frames += 1;
        trace!("Frame {} at step {}", self.stats.frames, step_ix);
        Ok(true)
    }
}

impl<S: VideoSink> Drop for FrameMultiplexer<S> {
    fn drop(&mut self) {
        if let Err(e) = self.sink.close() {
            warn!("Failed to close video sink: {:#}", e);
        }
    }
}
