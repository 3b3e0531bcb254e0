use crate::astro_math::{Degrees, Hours};
use crate::enums::{MotionState, PierSide};

/// Where the mount points in the sky. Two live instances exist: the current
/// position refreshed on every poll, and the slew target.
#[derive(Debug, Copy, Clone)]
pub struct EquatorialPosition {
    /// Hours, [0, 24)
    pub right_ascension: Hours,
    /// Degrees, [-90, 90]
    pub declination: Degrees,
    /// Hours, [-12, 12)
    pub hour_angle: Hours,
    pub pier_side: PierSide,
}

impl EquatorialPosition {
    /// Startup attitude: pointing at the celestial pole, pier unknown.
    pub fn at_pole() -> Self {
        Self {
            right_ascension: 0.,
            declination: 90.,
            hour_angle: 0.,
            pier_side: PierSide::Unknown,
        }
    }
}

/// Raw step counts as the hardware reports them. Signed; wraps modulo the
/// axis steps-per-revolution.
#[derive(Debug, Default, Eq, PartialEq, Copy, Clone)]
pub struct EncoderPosition {
    pub ra_steps: i32,
    pub de_steps: i32,
}

/// What the mount should do once a slew or jog completes, captured from the
/// state it was in beforehand.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum RestoreState {
    ResumeTracking,
    StayIdle,
}

impl RestoreState {
    pub fn capture(state: MotionState) -> Self {
        if state == MotionState::Tracking {
            RestoreState::ResumeTracking
        } else {
            RestoreState::StayIdle
        }
    }
}
