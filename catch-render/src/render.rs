use anyhow::{Result, anyhow};
use catch_core::Feedback;
use catch_timing::{HighPrecisionTimer, Timer};
use std::time::Duration;
use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Transform,
};

/// Unscaled bone sprite size in pixels.
pub const BONE_WIDTH: u32 = 240;
pub const BONE_HEIGHT: u32 = 96;

const BONE_COLOR: [u8; 4] = [238, 228, 205, 255];
const BAR_TRACK: [u8; 4] = [60, 60, 60, 255];
const BAR_FILL: [u8; 4] = [200, 40, 40, 255];
const PROGRESS_FILL: [u8; 4] = [120, 120, 120, 255];

const BAR_HEIGHT: f32 = 18.0;
const BAR_MARGIN: f32 = 24.0;
const FEEDBACK_BAND_HEIGHT: f32 = 12.0;
const PROGRESS_HEIGHT: f32 = 4.0;

/// Everything the renderer needs to know about the session for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    /// 0.0 hides the bone.
    pub stimulus_scale: f32,
    pub score: u32,
    /// Score at which the score bar is full.
    pub score_max: u32,
    pub feedback: Option<Feedback>,
    /// (1-based current trial, total trials)
    pub progress: (usize, usize),
}

pub struct FrameStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub dirty_count: usize,
}

/// Draws the bone, score bar, feedback band and progress strip into an
/// offscreen canvas and copies only the regions that changed.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    center: (f32, f32),

    bone: Pixmap,

    canvas: Pixmap,
    dirty_regions: Vec<Rect>,
    first_frame: bool,
    clear_buffer: Vec<u8>,
}

fn paint_for(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    paint
}

/// Rasterizes the bone: a shaft with two knobs at each end.
pub fn render_bone_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    let mut pixmap =
        Pixmap::new(width, height).ok_or_else(|| anyhow!("invalid bone size {width}x{height}"))?;
    let (w, h) = (width as f32, height as f32);
    let knob = h * 0.25;
    let shaft = Rect::from_xywh(knob, h * 0.3, w - 2.0 * knob, h * 0.4)
        .ok_or_else(|| anyhow!("bone too small"))?;

    let mut pb = PathBuilder::new();
    pb.push_rect(shaft);
    for (cx, cy) in [
        (knob, knob),
        (knob, h - knob),
        (w - knob, knob),
        (w - knob, h - knob),
    ] {
        pb.push_circle(cx, cy, knob);
    }
    let path = pb.finish().ok_or_else(|| anyhow!("empty bone path"))?;

    let mut paint = paint_for(BONE_COLOR);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    Ok(pixmap)
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut canvas =
            Pixmap::new(width, height).ok_or_else(|| anyhow!("invalid canvas {width}x{height}"))?;
        // Opaque black so canvas rows can be copied to the frame as-is.
        canvas.fill(Color::from_rgba8(0, 0, 0, 255));

        Ok(SkiaRenderer {
            width,
            height,
            center: (width as f32 / 2.0, height as f32 / 2.0),
            bone: render_bone_pixmap(BONE_WIDTH, BONE_HEIGHT)?,
            canvas,
            dirty_regions: Vec::with_capacity(8),
            first_frame: true,
            clear_buffer: Self::black_buffer(width, height),
        })
    }

    fn black_buffer(width: u32, height: u32) -> Vec<u8> {
        [0u8, 0, 0, 255]
            .into_iter()
            .cycle()
            .take((width * height * 4) as usize)
            .collect()
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.canvas = Pixmap::new(new_width, new_height)
            .ok_or_else(|| anyhow!("invalid canvas {new_width}x{new_height}"))?;
        self.canvas.fill(Color::from_rgba8(0, 0, 0, 255));
        self.width = new_width;
        self.height = new_height;
        self.center = (new_width as f32 / 2.0, new_height as f32 / 2.0);
        self.clear_buffer = Self::black_buffer(new_width, new_height);
        self.dirty_regions.clear();
        self.first_frame = true;
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    /// Pixel bounds of `rect` clipped to the canvas, as (x0, y0, x1, y1).
    fn clip(&self, rect: &Rect) -> Option<(usize, usize, usize, usize)> {
        let x0 = rect.x().floor().max(0.0).min(self.width as f32) as usize;
        let y0 = rect.y().floor().max(0.0).min(self.height as f32) as usize;
        let x1 = (rect.x() + rect.width()).ceil().min(self.width as f32) as usize;
        let y1 = (rect.y() + rect.height()).ceil().min(self.height as f32) as usize;
        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some((x0, y0, x1, y1))
        }
    }

    fn clear_dirty(&mut self, dirty: &[Rect]) {
        let stride = self.width as usize * 4;
        for rect in dirty {
            let Some((x0, y0, x1, y1)) = self.clip(rect) else {
                continue;
            };
            let row_len = (x1 - x0) * 4;
            let canvas_data = self.canvas.data_mut();
            for y in y0..y1 {
                let off = y * stride + x0 * 4;
                canvas_data[off..off + row_len]
                    .copy_from_slice(&self.clear_buffer[off..off + row_len]);
            }
        }
    }

    fn copy_dirty_region(&self, dirty: &Rect, frame_buffer: &mut [u8]) {
        let Some((x0, y0, x1, y1)) = self.clip(dirty) else {
            return;
        };
        let bytes = (x1 - x0) * 4;
        let row_bytes = self.width as usize * 4;
        let canvas_data = self.canvas.data();
        for row in y0..y1 {
            let off = row * row_bytes + x0 * 4;
            frame_buffer[off..off + bytes].copy_from_slice(&canvas_data[off..off + bytes]);
        }
    }

    fn fill(&mut self, rect: Rect, color: [u8; 4]) {
        self.canvas
            .fill_rect(rect, &paint_for(color), Transform::identity(), None);
        self.dirty_regions.push(rect);
    }

    fn draw_bone(&mut self, scale: f32) {
        if scale <= 0.0 {
            return;
        }
        let w = self.bone.width() as f32 * scale;
        let h = self.bone.height() as f32 * scale;
        let x = self.center.0 - w * 0.5;
        let y = self.center.1 - h * 0.5;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.canvas.draw_pixmap(
            0,
            0,
            self.bone.as_ref(),
            &paint,
            Transform::from_scale(scale, scale).post_translate(x, y),
            None,
        );
        if let Some(r) = Rect::from_xywh(x - 1.0, y - 1.0, w + 2.0, h + 2.0) {
            self.dirty_regions.push(r);
        }
    }

    fn draw_score_bar(&mut self, score: u32, score_max: u32) {
        let track_w = self.width as f32 - 2.0 * BAR_MARGIN;
        let Some(track) = Rect::from_xywh(BAR_MARGIN, BAR_MARGIN, track_w, BAR_HEIGHT) else {
            return;
        };
        self.fill(track, BAR_TRACK);
        let ratio = if score_max == 0 {
            0.0
        } else {
            (score.min(score_max) as f32) / score_max as f32
        };
        if let Some(fill) = Rect::from_xywh(BAR_MARGIN, BAR_MARGIN, track_w * ratio, BAR_HEIGHT) {
            self.fill(fill, BAR_FILL);
        }
    }

    fn draw_feedback(&mut self, feedback: Feedback) {
        let w = BONE_WIDTH as f32;
        let y = self.center.1 + BONE_HEIGHT as f32;
        if let Some(band) = Rect::from_xywh(self.center.0 - w * 0.5, y, w, FEEDBACK_BAND_HEIGHT) {
            self.fill(band, feedback.color());
        }
    }

    fn draw_progress(&mut self, (current, total): (usize, usize)) {
        if total == 0 {
            return;
        }
        let ratio = (current.min(total) as f32) / total as f32;
        let y = self.height as f32 - PROGRESS_HEIGHT;
        if let Some(strip) = Rect::from_xywh(0.0, y, self.width as f32 * ratio, PROGRESS_HEIGHT) {
            self.fill(strip, PROGRESS_FILL);
        }
    }

    fn draw(&mut self, view: &FrameView) {
        self.draw_score_bar(view.score, view.score_max);
        self.draw_bone(view.stimulus_scale);
        if let Some(feedback) = view.feedback {
            self.draw_feedback(feedback);
        }
        self.draw_progress(view.progress);
    }

    pub fn render_frame(
        &mut self,
        view: &FrameView,
        frame_buffer: &mut [u8],
        timer: &mut HighPrecisionTimer,
    ) -> Result<FrameStats> {
        let expected = (self.width * self.height * 4) as usize;
        if frame_buffer.len() != expected {
            return Err(anyhow!(
                "frame buffer is {} bytes, expected {}",
                frame_buffer.len(),
                expected
            ));
        }

        if self.first_frame {
            self.first_frame = false;
            self.canvas.fill(Color::from_rgba8(0, 0, 0, 255));
            frame_buffer.copy_from_slice(&self.clear_buffer);
            self.dirty_regions.clear();
        }

        // 1) Clear what the previous frame drew
        let old_dirty = std::mem::take(&mut self.dirty_regions);
        let t_clear = {
            let t = timer.now();
            self.clear_dirty(&old_dirty);
            timer.elapsed(t)
        };

        // 2) Draw new content
        let t_draw = {
            let t = timer.now();
            self.draw(view);
            timer.elapsed(t)
        };

        // 3) Present old and new regions
        let mut present_rects = old_dirty;
        present_rects.extend_from_slice(&self.dirty_regions);
        let t_copy = {
            let t = timer.now();
            for rect in &present_rects {
                self.copy_dirty_region(rect, frame_buffer);
            }
            timer.elapsed(t)
        };

        let total = t_clear + t_draw + t_copy;
        timer.record_frame(total);

        Ok(FrameStats {
            clear: t_clear,
            draw: t_draw,
            copy: t_copy,
            total,
            dirty_count: self.dirty_regions.len(),
        })
    }
}
