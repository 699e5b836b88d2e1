//! Frame scheduling for native hosts.
//!
//! The browser host drives frames from `requestAnimationFrame`; everything
//! else goes through [`FrameLoop`], which asks a [`FrameScheduler`] for the
//! next tick, applies the newest pending resize and renders one frame.
//! Everything runs on the calling thread and a frame is never interrupted:
//! cancellation and resizes take effect between frames.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};
use serde::Serialize;

use lava_lamp_core::{Engine, EngineError, Surface};

/// Source of frame ticks.
pub trait FrameScheduler {
    /// Blocks until the next frame is due. Returns `false` once no more
    /// frames will come.
    fn next_frame(&mut self) -> bool;
}

/// Ticks at a fixed refresh rate, sleeping between frames.
///
/// A frame that overruns its slot is not made up for; the next deadline is
/// measured from when the late frame started.
#[derive(Debug, Clone)]
pub struct FixedRate {
    interval: Duration,
    deadline: Option<Instant>,
}

impl FixedRate {
    pub fn new(fps: f64) -> Result<Self, EngineError> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "frame rate must be finite and positive, got {fps}"
            )));
        }
        Ok(Self {
            interval: Duration::from_secs_f64(1.0 / fps),
            deadline: None,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameScheduler for FixedRate {
    fn next_frame(&mut self) -> bool {
        let now = Instant::now();
        let start = match self.deadline {
            Some(deadline) if deadline > now => {
                thread::sleep(deadline - now);
                deadline
            }
            _ => now,
        };
        self.deadline = Some(start + self.interval);
        true
    }
}

/// Exactly `n` frames, as fast as possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBudget {
    remaining: u64,
}

impl FrameBudget {
    pub fn new(frames: u64) -> Self {
        Self { remaining: frames }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl FrameScheduler for FrameBudget {
    fn next_frame(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Stops a [`FrameLoop`] before its next frame. Clones share one flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Rc<Cell<bool>>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// New drawable size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEvent {
    pub width: f64,
    pub height: f64,
}

/// What a finished [`FrameLoop::run`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    pub frames: u64,
    pub resizes: u64,
}

pub struct FrameLoop<S> {
    scheduler: S,
    cancel: CancelHandle,
    resizes: Option<Receiver<ResizeEvent>>,
}

impl<S: FrameScheduler> FrameLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            cancel: CancelHandle::default(),
            resizes: None,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Opens the resize channel and returns its sending end. Calling this
    /// again replaces the channel.
    pub fn resize_sender(&mut self) -> Sender<ResizeEvent> {
        let (tx, rx) = mpsc::channel();
        self.resizes = Some(rx);
        tx
    }

    /// Newest queued resize, discarding older ones.
    fn pending_resize(&self) -> Option<ResizeEvent> {
        self.resizes.as_ref()?.try_iter().last()
    }

    /// Renders frames until the scheduler runs dry or the loop is
    /// cancelled. `after_frame` sees the engine's frame count and the
    /// surface right after each frame.
    pub fn run<E, T>(
        &mut self,
        engine: &mut E,
        surface: &mut T,
        mut after_frame: impl FnMut(u64, &mut T),
    ) -> LoopStats
    where
        E: Engine + ?Sized,
        T: Surface,
    {
        info!("frame loop started");
        let mut stats = LoopStats::default();
        while !self.cancel.is_cancelled() && self.scheduler.next_frame() {
            if let Some(ResizeEvent { width, height }) = self.pending_resize() {
                match engine.resize(width, height) {
                    Ok(()) => {
                        surface.resize(width, height);
                        stats.resizes += 1;
                    }
                    Err(e) => warn!("ignoring resize to {width}x{height}: {e}"),
                }
            }
            engine.render_frame(surface);
            stats.frames += 1;
            after_frame(engine.frame(), &mut *surface);
        }
        info!(
            "frame loop stopped after {} frames, {} resizes",
            stats.frames, stats.resizes
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lamp::Lamp;
    use lava_lamp_core::{DrawCommand, LampConfig, LayerConfig, RecordingSurface};

    fn lamp() -> Lamp {
        let config = LampConfig {
            width: 160,
            height: 120,
            layers: LayerConfig::presets().into_iter().take(2).collect(),
            ..LampConfig::default()
        };
        Lamp::new(config).unwrap()
    }

    fn resize_to(width: f64, height: f64) -> ResizeEvent {
        ResizeEvent { width, height }
    }

    #[test]
    fn budget_counts_down_to_zero() {
        let mut budget = FrameBudget::new(2);
        assert!(budget.next_frame());
        assert!(budget.next_frame());
        assert!(!budget.next_frame());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn fixed_rate_rejects_bad_fps() {
        assert!(FixedRate::new(0.0).is_err());
        assert!(FixedRate::new(f64::NAN).is_err());
        let rate = FixedRate::new(50.0).unwrap();
        assert!((rate.interval().as_secs_f64() - 0.02).abs() < 1e-9);
    }

    #[test]
    fn fixed_rate_spaces_frames() {
        let mut rate = FixedRate::new(200.0).unwrap();
        let start = Instant::now();
        for _ in 0..4 {
            assert!(rate.next_frame());
        }
        // Three full intervals separate four ticks.
        assert!(start.elapsed() >= Duration::from_millis(14));
    }

    #[test]
    fn run_renders_budgeted_frames() {
        let mut lamp = lamp();
        let mut surface = RecordingSurface::new(160.0, 120.0);
        let mut seen = Vec::new();
        let mut frame_loop = FrameLoop::new(FrameBudget::new(5));
        let stats = frame_loop.run(&mut lamp, &mut surface, |frame, _| seen.push(frame));
        assert_eq!(
            stats,
            LoopStats {
                frames: 5,
                resizes: 0
            }
        );
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(lamp.frame(), 5);
    }

    #[test]
    fn cancel_stops_before_next_frame() {
        let mut lamp = lamp();
        let mut surface = RecordingSurface::new(160.0, 120.0);
        let mut frame_loop = FrameLoop::new(FrameBudget::new(100));
        let cancel = frame_loop.cancel_handle();
        let stats = frame_loop.run(&mut lamp, &mut surface, |frame, _| {
            if frame == 3 {
                cancel.cancel();
            }
        });
        assert_eq!(stats.frames, 3);
        assert_eq!(lamp.frame(), 3);
    }

    #[test]
    fn only_latest_pending_resize_is_applied() {
        let mut lamp = lamp();
        let mut surface = RecordingSurface::new(160.0, 120.0);
        let mut frame_loop = FrameLoop::new(FrameBudget::new(2));
        let tx = frame_loop.resize_sender();
        tx.send(resize_to(100.0, 100.0)).unwrap();
        tx.send(resize_to(80.0, 60.0)).unwrap();
        let stats = frame_loop.run(&mut lamp, &mut surface, |_, _| {});
        assert_eq!(stats.resizes, 1);
        assert_eq!(lamp.size(), (80.0, 60.0));
        let resizes: Vec<&DrawCommand> = surface
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Resize(..)))
            .collect();
        assert_eq!(resizes, vec![&DrawCommand::Resize(80.0, 60.0)]);
        // The surface is resized before the frame that follows.
        assert_eq!(surface.commands()[0], DrawCommand::Resize(80.0, 60.0));
    }

    #[test]
    fn resize_sent_between_frames_applies_to_next_frame() {
        let mut lamp = lamp();
        let mut surface = RecordingSurface::new(160.0, 120.0);
        let mut frame_loop = FrameLoop::new(FrameBudget::new(3));
        let tx = frame_loop.resize_sender();
        let mut sizes = Vec::new();
        frame_loop.run(&mut lamp, &mut surface, |frame, s| {
            sizes.push((s.width(), s.height()));
            if frame == 1 {
                tx.send(resize_to(64.0, 48.0)).unwrap();
            }
        });
        assert_eq!(sizes, vec![(160.0, 120.0), (64.0, 48.0), (64.0, 48.0)]);
    }

    #[test]
    fn invalid_resize_is_logged_and_skipped() {
        let mut lamp = lamp();
        let mut surface = RecordingSurface::new(160.0, 120.0);
        let mut frame_loop = FrameLoop::new(FrameBudget::new(1));
        let tx = frame_loop.resize_sender();
        tx.send(resize_to(0.0, 10.0)).unwrap();
        let stats = frame_loop.run(&mut lamp, &mut surface, |_, _| {});
        assert_eq!(
            stats,
            LoopStats {
                frames: 1,
                resizes: 0
            }
        );
        assert_eq!(lamp.size(), (160.0, 120.0));
        assert_eq!(surface.width(), 160.0);
    }

    #[test]
    fn runs_a_boxed_engine() {
        let mut engine: Box<dyn Engine> = Box::new(lamp());
        let mut surface = RecordingSurface::new(160.0, 120.0);
        let mut frame_loop = FrameLoop::new(FrameBudget::new(2));
        let stats = frame_loop.run(engine.as_mut(), &mut surface, |_, _| {});
        assert_eq!(stats.frames, 2);
        assert_eq!(engine.frame(), 2);
    }
}
