//! Start/stop control of the per-frame callback.
//!
//! The loop never owns a timer. While running it asks its [`FrameSource`] for
//! the next frame after every frame it runs; once stopped it stops asking and
//! ignores frames that were already in flight.

use crate::host::FrameSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
}

#[derive(Debug, Default)]
pub struct AnimationLoop {
    state: LoopState,
    frames: u64,
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Number of frames run since creation.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Starts the loop and requests the first frame. Returns `false` and
    /// does nothing when already running, so only one frame chain exists.
    pub fn play(&mut self, source: &dyn FrameSource) -> bool {
        if self.is_running() {
            log::debug!("animation loop already running");
            return false;
        }
        self.state = LoopState::Running;
        log::debug!("animation loop started");
        source.request_frame();
        true
    }

    /// Stops the loop. Returns `false` when it was not running.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = LoopState::Stopped;
        log::debug!("animation loop stopped after {} frames", self.frames);
        true
    }

    /// Runs `frame` if the loop is running and schedules the next frame.
    /// Returns whether `frame` ran.
    pub fn on_frame(&mut self, source: &dyn FrameSource, frame: impl FnOnce()) -> bool {
        if !self.is_running() {
            return false;
        }
        frame();
        self.frames += 1;
        // `frame` may not stop the loop, but check anyway before rescheduling
        if self.is_running() {
            source.request_frame();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Default)]
    struct Counter(Cell<usize>);

    impl FrameSource for Counter {
        fn request_frame(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn play_is_idempotent() {
        let source = Counter::default();
        let mut animation = AnimationLoop::new();
        assert!(animation.play(&source));
        assert!(!animation.play(&source));
        assert_eq!(source.0.get(), 1);
        assert_eq!(animation.state(), LoopState::Running);
    }

    #[test]
    fn stop_twice_is_harmless() {
        let source = Counter::default();
        let mut animation = AnimationLoop::new();
        animation.play(&source);
        assert!(animation.stop());
        assert!(!animation.stop());
        assert_eq!(animation.state(), LoopState::Stopped);
    }

    #[test]
    fn frames_only_run_while_running() {
        let source = Counter::default();
        let mut animation = AnimationLoop::new();
        let runs = Cell::new(0);

        assert!(!animation.on_frame(&source, || runs.set(runs.get() + 1)));
        animation.play(&source);
        assert!(animation.on_frame(&source, || runs.set(runs.get() + 1)));
        assert!(animation.on_frame(&source, || runs.set(runs.get() + 1)));
        animation.stop();
        assert!(!animation.on_frame(&source, || runs.set(runs.get() + 1)));

        assert_eq!(runs.get(), 2);
        assert_eq!(animation.frames(), 2);
        // the first request from play plus one per frame run
        assert_eq!(source.0.get(), 3);
    }
}
