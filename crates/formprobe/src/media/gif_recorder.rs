//! Step-by-step GIF recording.
//!
//! One frame is captured after every scenario step. Frames are decoded from
//! the driver's PNG screenshots, scaled to the configured size and encoded
//! only when the attempt fails and the recording is kept.

use crate::result::{ProbeError, ProbeResult};
use gif::{Encoder, Frame, Repeat};
use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Configuration for GIF recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifConfig {
    /// Playback speed in frames per second
    pub fps: u8,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Palette quality (1-100)
    pub quality: u8,
    /// Frames kept per recording; later frames are dropped
    pub max_frames: usize,
}

impl Default for GifConfig {
    fn default() -> Self {
        Self {
            fps: 2,
            width: 640,
            height: 360,
            quality: 60,
            max_frames: 64,
        }
    }
}

impl GifConfig {
    /// Output size, other settings default
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.clamp(1, u32::from(u16::MAX)),
            height: height.clamp(1, u32::from(u16::MAX)),
            ..Default::default()
        }
    }

    /// Set frames per second
    #[must_use]
    pub fn with_fps(mut self, fps: u8) -> Self {
        self.fps = fps.clamp(1, 50);
        self
    }

    /// Set quality (1-100)
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Set the frame cap
    #[must_use]
    pub const fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Frame delay in centiseconds
    #[must_use]
    pub fn frame_delay_cs(&self) -> u16 {
        (100 / u16::from(self.fps.max(1))).max(1)
    }

    /// Encoder speed (1 best, 30 fastest)
    fn speed(&self) -> i32 {
        let normalized = i32::from(100 - self.quality.min(100));
        (normalized * 29 / 100 + 1).clamp(1, 30)
    }
}

/// One captured frame
#[derive(Debug, Clone)]
pub struct GifFrame {
    /// Step that produced the frame
    pub label: String,
    /// RGBA pixels at the configured size
    pub rgba: Vec<u8>,
    /// Milliseconds since the recorder was created
    pub offset_ms: u64,
}

/// Records screenshots taken between steps
#[derive(Debug)]
pub struct GifRecorder {
    config: GifConfig,
    frames: Vec<GifFrame>,
    dropped: usize,
    started: Instant,
}

impl GifRecorder {
    /// New, empty recording
    #[must_use]
    pub fn new(config: GifConfig) -> Self {
        Self {
            config,
            frames: Vec::new(),
            dropped: 0,
            started: Instant::now(),
        }
    }

    /// Current configuration
    #[must_use]
    pub const fn config(&self) -> &GifConfig {
        &self.config
    }

    /// Frames captured so far
    #[must_use]
    pub fn frames(&self) -> &[GifFrame] {
        &self.frames
    }

    /// Frames discarded after the cap was reached
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    /// Whether anything was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Decode a PNG screenshot and append it as the frame for `label`.
    ///
    /// # Errors
    ///
    /// [`ProbeError::ImageProcessing`] if the bytes are not a PNG.
    pub fn capture_png(&mut self, label: &str, png: &[u8]) -> ProbeResult<()> {
        if self.frames.len() >= self.config.max_frames {
            self.dropped += 1;
            return Ok(());
        }
        let img = image::load_from_memory_with_format(png, ImageFormat::Png).map_err(|e| {
            ProbeError::ImageProcessing {
                message: format!("Failed to decode screenshot for {label}: {e}"),
            }
        })?;
        let rgba = self.fit(&img);
        let offset_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.frames.push(GifFrame {
            label: label.to_string(),
            rgba,
            offset_ms,
        });
        Ok(())
    }

    /// Encode every frame as a looping GIF.
    ///
    /// # Errors
    ///
    /// [`ProbeError::ImageProcessing`] if there are no frames or encoding
    /// fails.
    pub fn encode(&self) -> ProbeResult<Vec<u8>> {
        if self.frames.is_empty() {
            return Err(ProbeError::ImageProcessing {
                message: "No frames captured".to_string(),
            });
        }

        let (width, height) = self.dimensions();
        let mut output = Vec::new();
        {
            let mut encoder =
                Encoder::new(&mut output, width, height, &[]).map_err(encode_error)?;
            encoder.set_repeat(Repeat::Infinite).map_err(encode_error)?;

            let delay = self.config.frame_delay_cs();
            let speed = self.config.speed();
            for captured in &self.frames {
                let mut pixels = captured.rgba.clone();
                let mut frame = Frame::from_rgba_speed(width, height, &mut pixels, speed);
                frame.delay = delay;
                encoder.write_frame(&frame).map_err(encode_error)?;
            }
        }
        Ok(output)
    }

    fn dimensions(&self) -> (u16, u16) {
        (
            u16::try_from(self.config.width).unwrap_or(u16::MAX),
            u16::try_from(self.config.height).unwrap_or(u16::MAX),
        )
    }

    fn fit(&self, img: &DynamicImage) -> Vec<u8> {
        let (width, height) = self.dimensions();
        let (width, height) = (u32::from(width), u32::from(height));
        if img.dimensions() == (width, height) {
            return img.to_rgba8().into_raw();
        }
        img.resize_exact(width, height, image::imageops::FilterType::Triangle)
            .to_rgba8()
            .into_raw()
    }
}

fn encode_error(e: gif::EncodingError) -> ProbeError {
    ProbeError::ImageProcessing {
        message: format!("GIF encoding failed: {e}"),
    }
}
