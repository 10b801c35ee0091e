//! Frame capture and episode video export
//!
//! Environments created with [`RenderMode::RgbArrayList`] keep one
//! [`RgbFrame`] per reset/step. [`save_video`] encodes such a list as an
//! animated GIF.

use std::{fs::File, io::BufWriter, path::{Path, PathBuf}};

use anyhow::{anyhow, Context, Result};
use gif::{Encoder, Frame, Repeat};

/// How an environment renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Record every frame into a list returned by `render()`
    RgbArrayList,
}

/// A single RGB frame, row-major, 3 bytes per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    /// Frame width in pixels
    pub width: u16,

    /// Frame height in pixels
    pub height: u16,

    /// Pixel data, `width * height * 3` bytes
    pub data: Vec<u8>,
}

impl RgbFrame {
    /// Create a frame filled with a single colour
    pub fn filled(width: u16, height: u16, color: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&color);
        }
        Self { width, height, data }
    }

    /// Set a pixel; coordinates outside the frame are ignored
    ///
    /// `y` grows downwards.
    pub fn put_pixel(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data[idx..idx + 3].copy_from_slice(&color);
    }

    /// Read a pixel
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width as usize || y >= self.height as usize {
            return None;
        }
        let idx = (y * self.width as usize + x) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Fill the axis-aligned rectangle `[x0, x1) x [y0, y1)`
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: [u8; 3]) {
        for y in y0.max(0)..y1.min(self.height as i64) {
            for x in x0.max(0)..x1.min(self.width as i64) {
                self.put_pixel(x, y, color);
            }
        }
    }

    /// Draw a segment of the given thickness between two points
    pub fn draw_segment(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: [u8; 3],
    ) {
        let half = thickness / 2.0;
        let (min_x, max_x) = (from.0.min(to.0) - half, from.0.max(to.0) + half);
        let (min_y, max_y) = (from.1.min(to.1) - half, from.1.max(to.1) + half);

        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len_sq = dx * dx + dy * dy;

        for y in min_y.floor() as i64..=max_y.ceil() as i64 {
            for x in min_x.floor() as i64..=max_x.ceil() as i64 {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let t = if len_sq > 0.0 {
                    (((px - from.0) * dx + (py - from.1) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (cx, cy) = (from.0 + t * dx, from.1 + t * dy);
                if (px - cx).powi(2) + (py - cy).powi(2) <= half * half {
                    self.put_pixel(x, y, color);
                }
            }
        }
    }

    /// Fill a circle
    pub fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: [u8; 3]) {
        self.draw_segment(center, center, radius * 2.0, color);
    }
}

/// Save a recorded episode as `<video_folder>/rl-video-episode-<n>.gif`
///
/// Frames before `step_starting_index` are skipped. Returns the path of the
/// written file.
pub fn save_video<P: AsRef<Path>>(
    frames: &[RgbFrame],
    video_folder: P,
    fps: u32,
    step_starting_index: usize,
    episode_index: usize,
) -> Result<PathBuf> {
    let frames = frames.get(step_starting_index..).unwrap_or(&[]);
    let first = frames.first().ok_or_else(|| anyhow!("no frames to save"))?;
    let (width, height) = (first.width, first.height);

    let folder = video_folder.as_ref();
    std::fs::create_dir_all(folder)
        .with_context(|| format!("failed to create video folder {}", folder.display()))?;
    let path = folder.join(format!("rl-video-episode-{}.gif", episode_index));

    let file = File::create(&path)
        .with_context(|| format!("failed to create video file {}", path.display()))?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height, &[])?;
    encoder.set_repeat(Repeat::Infinite)?;

    // GIF delays are in centiseconds
    let delay = (100 / fps.max(1)).max(1) as u16;

    for (idx, frame) in frames.iter().enumerate() {
        if frame.width != width || frame.height != height {
            return Err(anyhow!(
                "frame {} is {}x{}, expected {}x{}",
                idx,
                frame.width,
                frame.height,
                width,
                height
            ));
        }
        let expected = width as usize * height as usize * 3;
        if frame.data.len() != expected {
            return Err(anyhow!(
                "frame {} holds {} bytes, expected {} for {}x{} RGB",
                idx,
                frame.data.len(),
                expected,
                width,
                height
            ));
        }
        let mut gif_frame = Frame::from_rgb_speed(width, height, &frame.data, 10);
        gif_frame.delay = delay;
        encoder.write_frame(&gif_frame)?;
    }

    tracing::info!("Saved {} frames to {}", frames.len(), path.display());
    Ok(path)
}
