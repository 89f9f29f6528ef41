use super::VideoSink;
use anyhow::{Context, Result};
use image::RgbImage;
use log::debug;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Writes frames as numbered PNG files into a directory.
///
/// Useful when no video encoder is available; frames can be assembled
/// afterwards, e.g. with `ffmpeg -i frame_%06d.png`.
pub struct FrameDirSink {
    dir: PathBuf,
    n_frames: usize,
    closed: bool,
}

impl FrameDirSink {
    /// Creates the directory if it does not exist.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;
        Ok(Self {
            dir,
            n_frames: 0,
            closed: false,
        })
    }

    /// Path of the `ix`-th frame.
    pub fn frame_path(&self, ix: usize) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", ix))
    }

    /// The number of frames written.
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }
}

impl VideoSink for FrameDirSink {
    fn append(&mut self, frame: &RgbImage) -> Result<()> {
        if self.closed {
            anyhow::bail!("{:?} is already closed", self.dir);
        }
        let path = self.frame_path(self.n_frames);
        frame
            .save(&path)
            .with_context(|| format!("Failed to write {:?}", path))?;
        self.n_frames += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            debug!("Closed {:?} ({} frames)", self.dir, self.n_frames);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_frames_are_numbered() -> Result<()> {
        let tmp = TempDir::new("frame_dir")?;
        let mut sink = FrameDirSink::create(tmp.path().join("video"))?;
        let frame = RgbImage::new(4, 2);
        sink.append(&frame)?;
        sink.append(&frame)?;
        sink.close()?;
        sink.close()?;

        assert_eq!(sink.n_frames(), 2);
        assert!(sink.frame_path(1).exists());
        assert!(sink.append(&frame).is_err());
        Ok(())
    }
}
