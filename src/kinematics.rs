//! Pure transforms between equatorial coordinates, hour angle and encoder
//! step counts. No I/O; everything is a function of the arguments and the
//! axis geometry.
//!
//! Two distinct pier-side rules live here and must not be conflated:
//! [`pier_side_for_target`] picks the side a slew target should use, while
//! [`declination_from_steps`] infers the side the mount is actually on from
//! the encoder reading. They disagree near the boundaries by design.

use crate::astro_math::{modulo, Degrees, Hours};
use crate::config::AxisGeometry;
use crate::enums::PierSide;

/// Wraps into [0, 24).
pub fn reduce24(hours: Hours) -> Hours {
    modulo(hours, 24.)
}

/// Wraps into [-12, 12).
pub fn reduce_hour_angle(hours: Hours) -> Hours {
    modulo(hours + 12., 24.) - 12.
}

/// Wraps into [0, 360).
pub fn reduce360(degrees: Degrees) -> Degrees {
    modulo(degrees, 360.)
}

/// Wraps into the declination-axis window (-90, 270]: reduce to [0, 360),
/// then fold values over 270 negative.
pub fn reduce_declination(degrees: Degrees) -> Degrees {
    let r = reduce360(degrees);
    if r > 270. {
        r - 360.
    } else {
        r
    }
}

/// Maps an hour angle to an absolute step count on the RA/HA axis.
///
/// The +6h shift puts the zero-crossing on the meridian; shifted values
/// below the 12h midpoint rotate clockwise from zero, the rest
/// counter-clockwise (wrapped back from a full revolution).
pub fn steps_from_hour_angle(hour_angle: Hours, axis: &AxisGeometry) -> i32 {
    let spr = axis.steps_per_rev as f64;
    let shifted = reduce24(hour_angle + 6.);
    let steps = if shifted < 12. {
        spr * shifted / 24.
    } else {
        -(spr * (24. - shifted) / 24.)
    };
    steps.round() as i32 * axis.sign()
}

/// Inverse of [`steps_from_hour_angle`]. Negative counts are wrapped-around
/// positions and are offset by a full revolution before scaling. Output is
/// in [-12, 12).
pub fn hour_angle_from_steps(steps: i32, axis: &AxisGeometry) -> Hours {
    let spr = axis.steps_per_rev as f64;
    let steps = (steps * axis.sign()) as f64;
    let shifted = if steps >= 0. {
        steps / spr * 24.
    } else {
        (spr + steps) / spr * 24.
    };
    reduce_hour_angle(shifted - 6.)
}

/// Maps a declination to an absolute step count on the DE axis.
///
/// On the East pier the tube rides upside-down relative to the West-side
/// orientation, so the declination is reflected through the pole first.
/// An Unknown pier side maps like West.
pub fn steps_from_declination(
    declination: Degrees,
    pier_side: PierSide,
    axis: &AxisGeometry,
) -> i32 {
    let spr = axis.steps_per_rev as f64;
    let reflected = match pier_side {
        PierSide::East => 180. - declination,
        PierSide::West | PierSide::Unknown => declination,
    };
    let folded = reduce_declination(reflected);
    (spr * folded / 360.).round() as i32 * axis.sign()
}

/// Inverse of [`steps_from_declination`]. The pier side is inferred, not
/// assumed: an unreflected angle in (90, 270] means the tube is on the East
/// pier.
pub fn declination_from_steps(steps: i32, axis: &AxisGeometry) -> (Degrees, PierSide) {
    let spr = axis.steps_per_rev as f64;
    let degrees = (steps * axis.sign()) as f64 / spr * 360.;
    let raw = reduce_declination(degrees);
    if raw > 90. {
        (180. - raw, PierSide::East)
    } else {
        (raw, PierSide::West)
    }
}

pub fn right_ascension_from_hour_angle(hour_angle: Hours, lst: Hours) -> Hours {
    reduce24(lst - hour_angle)
}

pub fn hour_angle_from_right_ascension(right_ascension: Hours, lst: Hours) -> Hours {
    reduce_hour_angle(lst - right_ascension)
}

/// Pier side a slew target should use: targets at or west of -6h of the
/// meridian go on the West pier. Distinct from the inference rule in
/// [`declination_from_steps`].
pub fn pier_side_for_target(target_hour_angle: Hours) -> PierSide {
    if target_hour_angle >= -6. {
        PierSide::West
    } else {
        PierSide::East
    }
}
