//! Motion-control core for a DIY equatorial GOTO telescope mount.
//!
//! Three layers, composed bottom-up: the kinematics engine (pure
//! coordinate/step transforms), the command transport (framed serial
//! request/response), and the motion controller that owns the state machine
//! and ties the two together behind the [`MountDevice`] trait.

pub mod astro_math;
pub mod config;
pub mod enums;
pub mod errors;
pub mod kinematics;
pub mod mount;
pub mod protocol;
pub mod transport;

pub use config::Config;
pub use errors::{MountError, Result};
pub use mount::{EncoderPosition, EquatorialPosition, Mount, MountDevice, ParkPosition};
