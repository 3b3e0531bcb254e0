//! The motion controller: owns the position state and the motion state
//! machine, translates targets through the kinematics engine, and drives the
//! motor controller over the command transport.
//!
//! Single-threaded by contract: every operation takes `&mut self`, so the
//! host scheduler can never have two commands in flight.

mod park;
mod state;

pub use park::{ParkPosition, ParkStore};
pub use state::{EncoderPosition, EquatorialPosition, RestoreState};

use crate::astro_math::{self, fmt_sexa, hours_to_deg, Degrees, Hours};
use crate::config::{Config, MountGeometry, ObservingLocation};
use crate::enums::{Axis, MotionCommand, MotionState, RotationDirection, SlewRate};
use crate::errors::{MountError, Result};
use crate::kinematics::{
    declination_from_steps, hour_angle_from_right_ascension, hour_angle_from_steps,
    pier_side_for_target, reduce24, reduce_hour_angle, right_ascension_from_hour_angle,
    steps_from_declination, steps_from_hour_angle,
};
use crate::protocol::{Command, Opcode};
use crate::transport::{Channel, ReadMode, SerialTransport};
use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Capability contract a host framework adapter consumes. Implemented by
/// [`Mount`]; lets the adapter stay ignorant of the transport and geometry.
pub trait MountDevice {
    fn handshake(&mut self) -> Result<()>;
    fn read_status(&mut self) -> Result<EquatorialPosition>;
    fn goto(&mut self, right_ascension: Hours, declination: Degrees) -> Result<()>;
    fn abort(&mut self) -> Result<()>;
    fn park(&mut self) -> Result<()>;
    fn unpark(&mut self) -> Result<()>;
    fn move_axis(
        &mut self,
        axis: Axis,
        direction: RotationDirection,
        motion: MotionCommand,
    ) -> Result<()>;
}

pub struct Mount<C: Channel> {
    transport: SerialTransport<C>,
    geometry: MountGeometry,
    location: ObservingLocation,
    state: MotionState,
    current: EquatorialPosition,
    current_encoder: EncoderPosition,
    target: Option<EquatorialPosition>,
    target_encoder: Option<EncoderPosition>,
    /// Captured when a goto is accepted; consumed on arrival.
    restore: RestoreState,
    /// Captured when a jog starts; consumed when it stops.
    pre_jog: Option<RestoreState>,
    jog_preset: SlewRate,
    park: ParkStore,
    last_poll: Option<Instant>,
}

impl Mount<Box<dyn serialport::SerialPort>> {
    /// Opens the configured serial port and builds the controller around it.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let path = match &config.com_settings.path {
            Some(p) => p.clone(),
            None => serialport::available_ports()
                .ok()
                .and_then(|ports| ports.into_iter().next())
                .map(|p| p.port_name)
                .ok_or_else(|| {
                    MountError::Configuration("no serial port found".into())
                })?,
        };
        let port = serialport::new(path.as_str(), config.com_settings.baud_rate)
            .timeout(Duration::from_millis(config.com_settings.timeout_millis as u64))
            .open()
            .map_err(|e| {
                MountError::Configuration(format!("cannot open serial port {}: {}", path, e))
            })?;
        Self::with_channel(config, port)
    }
}

impl<C: Channel> Mount<C> {
    /// Builds the controller over an already-open channel. Used directly by
    /// tests; [`Mount::open`] goes through here.
    pub fn with_channel(config: &Config, channel: C) -> Result<Self> {
        config.validate()?;
        let park = ParkStore::load(config.com_settings.park_file.clone())?;
        Ok(Self {
            transport: SerialTransport::new(channel, config.com_settings.protocol),
            geometry: config.geometry,
            location: config.observing_location,
            state: MotionState::Idle,
            current: EquatorialPosition::at_pole(),
            current_encoder: EncoderPosition::default(),
            target: None,
            target_encoder: None,
            restore: RestoreState::StayIdle,
            pre_jog: None,
            jog_preset: SlewRate::Centering,
            park,
            last_poll: None,
        })
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn current_position(&self) -> EquatorialPosition {
        self.current
    }

    pub fn current_encoder(&self) -> EncoderPosition {
        self.current_encoder
    }

    pub fn target_position(&self) -> Option<EquatorialPosition> {
        self.target
    }

    pub fn target_encoder(&self) -> Option<EncoderPosition> {
        self.target_encoder
    }

    pub fn park_position(&self) -> ParkPosition {
        self.park.get()
    }

    pub fn set_jog_preset(&mut self, preset: SlewRate) {
        self.jog_preset = preset;
    }

    fn lst_now(&self) -> Hours {
        astro_math::local_sidereal_time(
            astro_math::julian_date(Utc::now()),
            self.location.longitude,
        )
    }

    fn command(&mut self, command: Command) -> Result<()> {
        self.transport
            .send_and_receive(&command, ReadMode::UntilStop)?;
        Ok(())
    }

    fn read_axis(&mut self, axis: Axis) -> Result<i32> {
        let reply = self.transport.send_and_receive(
            &Command::new(Opcode::GetAxisStatus).arg(u8::from(axis)),
            ReadMode::UntilStop,
        )?;
        reply.int_arg(0)
    }

    /// Liveness probe; must succeed before the host treats the link as up.
    pub fn handshake(&mut self) -> Result<()> {
        self.command(Command::new(Opcode::Handshake))
    }

    /// Commands a slew to the given coordinates. Rejected while slewing,
    /// parking or parked; otherwise the target is translated to encoder
    /// steps using the target pier side and handed to the motors.
    pub fn goto(&mut self, right_ascension: Hours, declination: Degrees) -> Result<()> {
        if self.state.blocks_goto() {
            return Err(MountError::StateConflict {
                operation: "goto",
                state: self.state,
            });
        }

        let lst = self.lst_now();
        let hour_angle = hour_angle_from_right_ascension(right_ascension, lst);
        let pier_side = pier_side_for_target(hour_angle);
        let ra_steps = steps_from_hour_angle(hour_angle, &self.geometry.ra_axis);
        let de_steps = steps_from_declination(declination, pier_side, &self.geometry.de_axis);

        self.command(Command::new(Opcode::Goto).arg(ra_steps).arg(de_steps))?;

        self.restore = RestoreState::capture(self.state);
        self.target = Some(EquatorialPosition {
            right_ascension: reduce24(right_ascension),
            declination,
            hour_angle,
            pier_side,
        });
        self.target_encoder = Some(EncoderPosition { ra_steps, de_steps });
        self.state = MotionState::Slewing;

        info!(
            "Slewing to RA: {} - DEC: {}",
            fmt_sexa(right_ascension),
            fmt_sexa(declination)
        );
        Ok(())
    }

    /// No-motion alignment: accepts the given coordinates as the mount's
    /// actual pointing position. Rejected in the same states as a slew.
    pub fn sync(&mut self, right_ascension: Hours, declination: Degrees) -> Result<()> {
        if self.state.blocks_goto() {
            return Err(MountError::StateConflict {
                operation: "sync",
                state: self.state,
            });
        }

        let lst = self.lst_now();
        let hour_angle = hour_angle_from_right_ascension(right_ascension, lst);
        let pier_side = pier_side_for_target(hour_angle);
        self.current = EquatorialPosition {
            right_ascension: reduce24(right_ascension),
            declination,
            hour_angle,
            pier_side,
        };
        self.current_encoder = EncoderPosition {
            ra_steps: steps_from_hour_angle(hour_angle, &self.geometry.ra_axis),
            de_steps: steps_from_declination(declination, pier_side, &self.geometry.de_axis),
        };
        info!(
            "Synced to RA: {} - DEC: {}",
            fmt_sexa(right_ascension),
            fmt_sexa(declination)
        );
        Ok(())
    }

    /// Periodic update: reads the encoders, refreshes the current position
    /// and lets the state machine evaluate arrival. The host scheduler calls
    /// this on its own cadence, typically every 500 ms.
    pub fn poll(&mut self) -> Result<EquatorialPosition> {
        // elapsed time since last poll; don't presume the scheduler cadence
        let now = Instant::now();
        let dt = self
            .last_poll
            .map(|t| now.duration_since(t).as_secs_f64())
            .unwrap_or(0.);
        self.last_poll = Some(now);

        let ra_steps = self.read_axis(Axis::Primary)?;
        let de_steps = self.read_axis(Axis::Secondary)?;
        self.current_encoder = EncoderPosition { ra_steps, de_steps };

        let lst = self.lst_now();
        let hour_angle = hour_angle_from_steps(ra_steps, &self.geometry.ra_axis);
        let (declination, pier_side) = declination_from_steps(de_steps, &self.geometry.de_axis);
        self.current = EquatorialPosition {
            right_ascension: right_ascension_from_hour_angle(hour_angle, lst),
            declination,
            hour_angle,
            pier_side,
        };

        match self.state {
            MotionState::Slewing => self.check_slew_arrival(dt)?,
            MotionState::Parking => {
                if self.current_encoder
                    == (EncoderPosition {
                        ra_steps: self.park.get().ra_steps,
                        de_steps: self.park.get().de_steps,
                    })
                {
                    self.state = MotionState::Parked;
                    self.target = None;
                    self.target_encoder = None;
                    info!("Telescope parked");
                }
            }
            _ => {}
        }

        debug!(
            "Current RA: {} Current DEC: {}",
            fmt_sexa(self.current.right_ascension),
            fmt_sexa(self.current.declination)
        );
        Ok(self.current)
    }

    fn check_slew_arrival(&mut self, dt: f64) -> Result<()> {
        let target = match self.target {
            Some(t) => t,
            None => return Ok(()),
        };

        // How far each axis can have moved since the last poll. An axis is
        // locked when it sits within that window of the target.
        let window = self.geometry.slew_rates.max * dt;
        let ra_diff = hours_to_deg(reduce_hour_angle(
            target.right_ascension - self.current.right_ascension,
        ));
        let de_diff = target.declination - self.current.declination;
        let ra_locked = ra_diff.abs() <= window;
        let de_locked = de_diff.abs() <= window;

        if ra_locked && de_locked {
            self.current = target;
            self.target = None;
            self.target_encoder = None;
            match self.restore {
                RestoreState::ResumeTracking => {
                    // Motion has stopped either way; losing the track
                    // command leaves the mount idle.
                    if let Err(e) = self.command(Command::new(Opcode::Track)) {
                        self.state = MotionState::Idle;
                        return Err(e);
                    }
                    self.state = MotionState::Tracking;
                    info!("Telescope slew is complete. Tracking...");
                }
                RestoreState::StayIdle => {
                    self.state = MotionState::Idle;
                    info!("Telescope slew is complete.");
                }
            }
        }
        Ok(())
    }

    /// Halts all motion. On acknowledgement the target is dropped and an
    /// in-flight slew or park falls back to idle.
    pub fn abort(&mut self) -> Result<()> {
        self.command(Command::new(Opcode::Abort))?;
        self.target = None;
        self.target_encoder = None;
        self.pre_jog = None;
        if matches!(self.state, MotionState::Slewing | MotionState::Parking) {
            self.state = MotionState::Idle;
        }
        info!("Motion aborted");
        Ok(())
    }

    /// Slews to the persisted park position. Rejected while slewing.
    pub fn park(&mut self) -> Result<()> {
        if self.state == MotionState::Slewing {
            return Err(MountError::StateConflict {
                operation: "park",
                state: self.state,
            });
        }
        self.command(Command::new(Opcode::Park))?;
        let park = self.park.get();
        self.target = None;
        self.target_encoder = Some(EncoderPosition {
            ra_steps: park.ra_steps,
            de_steps: park.de_steps,
        });
        self.state = MotionState::Parking;
        info!("Parking telescope");
        Ok(())
    }

    /// Clears the parked condition. No motor command is issued; the next
    /// poll or goto drives the state from there.
    pub fn unpark(&mut self) -> Result<()> {
        if self.state == MotionState::Parked {
            self.state = MotionState::Idle;
            self.target_encoder = None;
            info!("Telescope unparked");
        }
        Ok(())
    }

    /// Persists the current encoder position as the park position.
    pub fn set_current_park(&mut self) -> Result<()> {
        self.command(Command::new(Opcode::SetParkPos))?;
        self.park.set(ParkPosition {
            ra_steps: self.current_encoder.ra_steps,
            de_steps: self.current_encoder.de_steps,
        })?;
        info!(
            "Park position set to RA {} / DE {} steps",
            self.current_encoder.ra_steps, self.current_encoder.de_steps
        );
        Ok(())
    }

    /// Manual jog. Start is rejected while slewing, parking or parked; stop
    /// restores tracking if the mount was tracking before the jog.
    pub fn move_axis(
        &mut self,
        axis: Axis,
        direction: RotationDirection,
        motion: MotionCommand,
    ) -> Result<()> {
        match motion {
            MotionCommand::Start => {
                if self.state.blocks_goto() {
                    return Err(MountError::StateConflict {
                        operation: "move axis",
                        state: self.state,
                    });
                }
                let axis_geometry = self.geometry.axis(axis);
                let rate_dps = self.geometry.slew_rates.degrees_per_sec(self.jog_preset);
                let mut sign = direction.sign();
                if axis_geometry.invert_motion {
                    sign = -sign;
                }
                let steps_per_sec =
                    (rate_dps / axis_geometry.degrees_per_step).round() as i32 * sign;
                self.command(
                    Command::new(Opcode::Move)
                        .arg(u8::from(axis))
                        .arg(steps_per_sec),
                )?;
                self.pre_jog = Some(RestoreState::capture(self.state));
                self.state = MotionState::Slewing;
                Ok(())
            }
            MotionCommand::Stop => {
                self.command(Command::new(Opcode::Stop).arg(u8::from(axis)))?;
                match self.pre_jog.take() {
                    Some(RestoreState::ResumeTracking) => {
                        self.command(Command::new(Opcode::Track))?;
                        self.state = MotionState::Tracking;
                    }
                    _ => self.state = MotionState::Idle,
                }
                Ok(())
            }
        }
    }

    /// Enables or disables sidereal tracking. State only changes once the
    /// controller has acknowledged the command.
    pub fn set_tracking(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            self.command(Command::new(Opcode::Track))?;
            self.state = MotionState::Tracking;
        } else {
            self.command(Command::new(Opcode::SetIdle))?;
            self.state = MotionState::Idle;
        }
        Ok(())
    }

    /// Sets custom tracking rates, arcseconds per second per axis. Does not
    /// change the motion state.
    pub fn set_track_rate(&mut self, ra_rate: f64, de_rate: f64) -> Result<()> {
        let ra_steps = (ra_rate / 3600.) / self.geometry.ra_axis.degrees_per_step;
        let de_steps = (de_rate / 3600.) / self.geometry.de_axis.degrees_per_step;
        self.command(
            Command::new(Opcode::SetTrackRate)
                .arg(format!("{:.4}", ra_steps))
                .arg(format!("{:.4}", de_steps)),
        )
    }
}

impl<C: Channel> MountDevice for Mount<C> {
    fn handshake(&mut self) -> Result<()> {
        Mount::handshake(self)
    }

    fn read_status(&mut self) -> Result<EquatorialPosition> {
        self.poll()
    }

    fn goto(&mut self, right_ascension: Hours, declination: Degrees) -> Result<()> {
        Mount::goto(self, right_ascension, declination)
    }

    fn abort(&mut self) -> Result<()> {
        Mount::abort(self)
    }

    fn park(&mut self) -> Result<()> {
        Mount::park(self)
    }

    fn unpark(&mut self) -> Result<()> {
        Mount::unpark(self)
    }

    fn move_axis(
        &mut self,
        axis: Axis,
        direction: RotationDirection,
        motion: MotionCommand,
    ) -> Result<()> {
        Mount::move_axis(self, axis, direction, motion)
    }
}
