//! Auto-rotation state machine.
//!
//! Governs the `Rotating` / `Paused` / `Stopped` lifecycle shared by drag
//! handling, marker hover, and the manual toggle. `Stopped` is sticky: it is
//! only ever exited by the toggle. Resume timers are plain countdown data so
//! the pause/resume races are deterministic and testable.

use bevy::prelude::*;

/// Delay before auto-rotation resumes after a drag or hover ends.
pub const RESUME_COOLDOWN_SECS: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RotationState {
    #[default]
    Rotating,
    Paused,
    Stopped,
}

#[derive(Resource, Debug, Default)]
pub struct RotationMachine {
    state: RotationState,
    /// Seconds left until a scheduled return to `Rotating`.
    pending_resume: Option<f32>,
}

impl RotationMachine {
    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn is_rotating(&self) -> bool {
        self.state == RotationState::Rotating
    }

    /// Enter `Paused` (drag start or marker hover). Cancels any pending
    /// resume so a stale timer cannot fight the fresh pause. No-op when
    /// stopped.
    pub fn pause(&mut self) {
        if self.state == RotationState::Stopped {
            return;
        }
        self.pending_resume = None;
        self.state = RotationState::Paused;
    }

    /// Schedule a return to `Rotating` after `delay` seconds. Only meaningful
    /// from `Paused`; replaces any previously scheduled resume.
    pub fn schedule_resume(&mut self, delay: f32) {
        if self.state != RotationState::Paused {
            return;
        }
        self.pending_resume = Some(delay.max(0.0));
    }

    pub fn cancel_pending_resume(&mut self) {
        self.pending_resume = None;
    }

    /// Manual stop. Never auto-exited.
    pub fn stop(&mut self) {
        self.pending_resume = None;
        self.state = RotationState::Stopped;
    }

    /// The control button: rotating or paused goes to stopped, stopped goes
    /// back to rotating.
    pub fn toggle(&mut self) {
        self.pending_resume = None;
        self.state = match self.state {
            RotationState::Rotating | RotationState::Paused => RotationState::Stopped,
            RotationState::Stopped => RotationState::Rotating,
        };
    }

    /// Advance the resume countdown by one frame.
    pub fn tick(&mut self, dt: f32) {
        let Some(remaining) = self.pending_resume else {
            return;
        };
        let remaining = remaining - dt;
        if remaining <= 0.0 {
            self.pending_resume = None;
            if self.state == RotationState::Paused {
                self.state = RotationState::Rotating;
            }
        } else {
            self.pending_resume = Some(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_pause_then_resume_after_cooldown() {
        let mut machine = RotationMachine::default();
        assert_eq!(machine.state(), RotationState::Rotating);

        machine.pause();
        assert_eq!(machine.state(), RotationState::Paused);

        machine.schedule_resume(1.0);
        assert_eq!(machine.state(), RotationState::Paused);

        machine.tick(0.5);
        assert_eq!(machine.state(), RotationState::Paused);

        machine.tick(0.6);
        assert_eq!(machine.state(), RotationState::Rotating);
    }

    #[test]
    fn test_new_pause_cancels_pending_resume() {
        let mut machine = RotationMachine::default();
        machine.pause();
        machine.schedule_resume(0.5);

        // Re-hover / new drag before the timer fires.
        machine.pause();
        machine.tick(10.0);
        assert_eq!(machine.state(), RotationState::Paused);
    }

    #[test]
    fn test_stopped_is_sticky() {
        let mut machine = RotationMachine::default();
        machine.stop();

        machine.pause();
        assert_eq!(machine.state(), RotationState::Stopped);

        machine.schedule_resume(0.1);
        machine.tick(1.0);
        assert_eq!(machine.state(), RotationState::Stopped);
    }

    #[test]
    fn test_toggle_cycle() {
        let mut machine = RotationMachine::default();
        machine.toggle();
        assert_eq!(machine.state(), RotationState::Stopped);
        machine.toggle();
        assert_eq!(machine.state(), RotationState::Rotating);

        // Pausing then toggling converts the pause into a stop.
        machine.pause();
        machine.toggle();
        assert_eq!(machine.state(), RotationState::Stopped);
    }

    #[test]
    fn test_cancel_pending_resume_keeps_pause() {
        let mut machine = RotationMachine::default();
        machine.pause();
        machine.schedule_resume(0.2);
        machine.cancel_pending_resume();
        machine.tick(5.0);
        assert_eq!(machine.state(), RotationState::Paused);
    }

    #[test]
    fn test_tick_without_pending_is_noop() {
        let mut machine = RotationMachine::default();
        machine.tick(100.0);
        assert_eq!(machine.state(), RotationState::Rotating);
    }
}
