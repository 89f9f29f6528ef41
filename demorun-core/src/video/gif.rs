use super::VideoSink;
use crate::error::DemorunError;
use anyhow::{bail, Context, Result};
use image::{codecs::gif::GifEncoder, Delay, Frame, RgbImage, RgbaImage};
use log::{debug, warn};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

/// Writes frames into an animated GIF.
pub struct GifSink {
    path: PathBuf,
    encoder: Option<GifEncoder<BufWriter<File>>>,
    delay: Delay,
    n_frames: usize,
}

impl GifSink {
    /// Creates the file. Frames are shown `1000 / fps` milliseconds each.
    pub fn create<P: AsRef<Path>>(path: P, fps: u32) -> Result<Self> {
        if fps == 0 {
            return Err(DemorunError::InvalidConfig("fps must be > 0".into()).into());
        }
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
        Ok(Self {
            path,
            encoder: Some(GifEncoder::new(BufWriter::new(file))),
            delay: Delay::from_numer_denom_ms(1000, fps),
            n_frames: 0,
        })
    }

    /// The number of frames written.
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }
}

impl VideoSink for GifSink {
    fn append(&mut self, frame: &RgbImage) -> Result<()> {
        let encoder = match self.encoder.as_mut() {
            Some(encoder) => encoder,
            None => bail!("{:?} is already closed", self.path),
        };
        let rgba = RgbaImage::from_fn(frame.width(), frame.height(), |x, y| {
            let p = frame.get_pixel(x, y).0;
            image::Rgba([p[0], p[1], p[2], 255])
        });
        encoder.encode_frame(Frame::from_parts(rgba, 0, 0, self.delay))?;
        self.n_frames += 1;
        Ok(())
    }

    /// Fails if no frame was written: the file is then empty and is removed.
    fn close(&mut self) -> Result<()> {
        // The trailer is written when the encoder is dropped
        let encoder = match self.encoder.take() {
            Some(encoder) => encoder,
            None => return Ok(()),
        };
        drop(encoder);

        if self.n_frames == 0 {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {:?}", self.path))?;
            bail!("No frame was written to {:?}", self.path);
        }
        debug!("Closed {:?} ({} frames)", self.path, self.n_frames);
        Ok(())
    }
}

impl Drop for GifSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("{:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempdir::TempDir;

    #[test]
    fn test_gif_frames() -> Result<()> {
        let dir = TempDir::new("gif")?;
        let path = dir.path().join("video.gif");
        let mut sink = GifSink::create(&path, 10)?;
        sink.append(&RgbImage::from_pixel(8, 4, Rgb([10, 20, 30])))?;
        sink.append(&RgbImage::from_pixel(8, 4, Rgb([30, 20, 10])))?;
        sink.close()?;
        sink.close()?;
        assert_eq!(sink.n_frames(), 2);
        assert!(sink.append(&RgbImage::new(8, 4)).is_err());
        assert!(fs::read(&path)?.starts_with(b"GIF"));
        Ok(())
    }

    #[test]
    fn test_empty_gif_is_an_error() -> Result<()> {
        let dir = TempDir::new("gif")?;
        let path = dir.path().join("empty.gif");
        let mut sink = GifSink::create(&path, 10)?;
        assert!(sink.close().is_err());
        assert!(!path.exists());
        sink.close()?;
        Ok(())
    }
}
