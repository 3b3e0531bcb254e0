mod axis;
mod motion_command;
mod motion_state;
mod pier_side;
mod rotation_direction;
mod slew_rate;

pub use axis::Axis;
pub use motion_command::MotionCommand;
pub use motion_state::MotionState;
pub use pier_side::PierSide;
pub use rotation_direction::RotationDirection;
pub use slew_rate::SlewRate;
