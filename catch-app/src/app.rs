use anyhow::{Context, Result, anyhow};
use catch_core::{SessionData, SessionEvent};
use catch_experiment::{SessionConfig, TrialStateMachine};
use catch_render::{FrameView, SkiaRenderer, render_bone_pixmap};
use catch_timing::{HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Icon, Window, WindowId},
};

use crate::results;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    session: TrialStateMachine<HighPrecisionTimer>,
    renderer: Option<SkiaRenderer>,
    frame_timer: HighPrecisionTimer,
    results_dir: PathBuf,
    experiment_id: String,
    refresh_rate: Option<f64>,

    /// Space pressed since the last tick. Several presses in one frame count once.
    input_pending: bool,
    finished: Option<SessionData>,
    should_exit: bool,
}

impl App {
    pub fn new(config: SessionConfig, results_dir: PathBuf, experiment_id: String) -> Result<Self> {
        let session = TrialStateMachine::new(config, HighPrecisionTimer::new())
            .context("invalid session configuration")?;

        Ok(Self {
            window: None,
            pixels: None,
            session,
            renderer: None,
            frame_timer: HighPrecisionTimer::new(),
            results_dir,
            experiment_id,
            refresh_rate: None,
            input_pending: false,
            finished: None,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        println!("=== CATCH THE BONE ===");
        println!("Platform: {}", std::env::consts::OS);
        println!("Architecture: {}", std::env::consts::ARCH);
        println!("Press SPACE when the bone appears. ESC to quit.\n");

        event_loop.run_app(&mut self)?;

        match self.finished.take() {
            Some(data) => {
                let path = results::write_session(&self.results_dir, &self.experiment_id, &data)?;
                println!("Final score: {}", data.final_score());
                println!("Results saved to {}", path.display());
            }
            None => log::warn!("Session closed before completion, nothing saved"),
        }
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Catch the Bone")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor.clone()))))
            .with_resizable(false)
            .with_window_icon(Self::bone_icon().ok());

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        let scale_factor = window.scale_factor();

        log::info!(
            "Display: {}×{} @ scale {:.2}, refresh {}",
            physical_size.width,
            physical_size.height,
            scale_factor,
            self.refresh_rate
                .map_or_else(|| "unknown".to_string(), |hz| format!("{hz:.1} Hz")),
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);
        self.renderer = Some(SkiaRenderer::new(
            physical_size.width,
            physical_size.height,
        )?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    fn frame_view(&self) -> FrameView {
        let (_, total) = self.session.trial_progress();
        FrameView {
            stimulus_scale: self.session.stimulus_scale(),
            score: self.session.score(),
            score_max: score_max(self.session.scoring().on_time_bonus, total),
            feedback: self.session.feedback(),
            progress: self.session.trial_progress(),
        }
    }

    fn render(&mut self) -> Result<()> {
        let view = self.frame_view();
        let (Some(pix), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let stats = renderer.render_frame(&view, pix.frame_mut(), &mut self.frame_timer)?;
        let now = self.frame_timer.now();
        pix.render()?;
        let present = self.frame_timer.elapsed(now);

        log::trace!(
            "present {:.3}ms, clear {:.3}ms, draw {:.3}ms, copy {:.3}ms, total {:.3}ms, dirty {}",
            present.as_secs_f64() * 1e3,
            stats.clear.as_secs_f64() * 1e3,
            stats.draw.as_secs_f64() * 1e3,
            stats.copy.as_secs_f64() * 1e3,
            stats.total.as_secs_f64() * 1e3,
            stats.dirty_count,
        );
        Ok(())
    }

    fn update(&mut self, event_loop: &ActiveEventLoop) {
        let input = std::mem::take(&mut self.input_pending);
        match self.session.tick(input) {
            SessionEvent::NoChange => {}
            SessionEvent::TrialCompleted {
                record, feedback, ..
            } => {
                println!(
                    "{} {} (trial {}, score {})",
                    feedback.headline(),
                    feedback.detail(),
                    record.trial_n + 1,
                    record.score
                );
            }
            SessionEvent::EarlyPenalty { new_score } => {
                let fb = catch_core::Feedback::TooEarly;
                println!("{} {} (score {})", fb.headline(), fb.detail(), new_score);
            }
            SessionEvent::SessionComplete { data, .. } => {
                self.finished = Some(data);
                self.cleanup_and_exit(event_loop);
            }
            other => log::debug!("{other:?}"),
        }
    }

    fn handle_input(&mut self, key: winit::keyboard::PhysicalKey, event_loop: &ActiveEventLoop) {
        use winit::keyboard::{KeyCode, PhysicalKey};
        if let PhysicalKey::Code(k) = key {
            match k {
                KeyCode::Space => self.input_pending = true,
                KeyCode::Escape => self.cleanup_and_exit(event_loop),
                _ => {}
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                log::error!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                log::error!("Failed to resize buffer: {}", e);
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                log::error!("Failed to resize renderer: {}", e);
            }
        }
        log::info!("Display resized to: {}×{}", new_size.width, new_size.height);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }

        let stats = self.frame_timer.frame_stats();
        log::info!(
            "Frame timing: {:.3} ms/frame, jitter {:.3} ms, {:.1} fps",
            stats.average_frame_time_ns / 1e6,
            stats.jitter_ns / 1e6,
            stats.effective_fps,
        );

        self.should_exit = true;
        event_loop.exit();
    }

    fn bone_icon() -> Result<Icon> {
        let pixmap = render_bone_pixmap(64, 32)?;
        let (width, height) = (pixmap.width(), pixmap.height());
        // Straight alpha for the window system.
        let rgba: Vec<u8> = pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        Ok(Icon::from_rgba(rgba, width, height)?)
    }
}

/// Full-scale value of the score bar: every trial caught on time.
fn score_max(on_time_bonus: i32, total_trials: usize) -> u32 {
    let per_trial = on_time_bonus.max(1).unsigned_abs();
    per_trial.saturating_mul(u32::try_from(total_trials).unwrap_or(u32::MAX))
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                log::error!("Failed to create window and surface: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                self.update(event_loop);
                if let Err(e) = self.render() {
                    log::error!("Render failed: {:#}", e);
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && !event.repeat =>
            {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("Scale factor changed to {:.2}", scale_factor);
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
