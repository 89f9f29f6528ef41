//! Video sinks.
//!
//! A [`VideoSink`] receives composite frames one by one. Frames are written
//! as they arrive and never retained by the caller.
mod frame_dir;
mod gif;
use anyhow::Result;
pub use frame_dir::FrameDirSink;
pub use gif::GifSink;
use image::RgbImage;
use log::info;
use std::path::Path;

/// Destination of rendered frames.
pub trait VideoSink {
    /// Appends a frame.
    fn append(&mut self, frame: &RgbImage) -> Result<()>;

    /// Flushes and closes the sink.
    ///
    /// Calling this more than once has no effect.
    fn close(&mut self) -> Result<()>;
}

impl<S: VideoSink + ?Sized> VideoSink for Box<S> {
    fn append(&mut self, frame: &RgbImage) -> Result<()> {
        (**self).append(frame)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Opens a sink by the extension of `path`.
///
/// `.gif` is written as an animated GIF. Any other path is taken as a
/// directory of numbered PNG frames.
pub fn open_video_sink<P: AsRef<Path>>(path: P, fps: u32) -> Result<Box<dyn VideoSink>> {
    let path = path.as_ref();
    let is_gif = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gif"))
        .unwrap_or(false);

    info!("Open video sink: {:?}", path);
    if is_gif {
        Ok(Box::new(GifSink::create(path, fps)?))
    } else {
        Ok(Box::new(FrameDirSink::create(path)?))
    }
}
