use crate::astro_math::Degrees;
use crate::enums::{Axis, RotationDirection, SlewRate};
use crate::errors::{MountError, Result};
use crate::protocol::ProtocolVariant;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/* Config */
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub com_settings: ComSettings,
    pub observing_location: ObservingLocation,
    pub geometry: MountGeometry,
}

impl Config {
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self> {
        let config: Config = confy::load_path(path)
            .map_err(|e| MountError::Configuration(format!("cannot load config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Fatal at startup; nothing here is recoverable at runtime.
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if self.com_settings.timeout_millis == 0 {
            return Err(MountError::Configuration("timeout must be non-zero".into()));
        }
        if !(-90. ..=90.).contains(&self.observing_location.latitude) {
            return Err(MountError::Configuration(format!(
                "latitude {} out of range",
                self.observing_location.latitude
            )));
        }
        if !(-180. ..=180.).contains(&self.observing_location.longitude) {
            return Err(MountError::Configuration(format!(
                "longitude {} out of range",
                self.observing_location.longitude
            )));
        }
        Ok(())
    }
}

/* Serial Port Settings */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComSettings {
    pub path: Option<String>, // None for automatic
    pub baud_rate: u32,
    pub timeout_millis: u32,
    pub protocol: ProtocolVariant,
    /// Where the park position is persisted. None keeps it in memory only.
    pub park_file: Option<PathBuf>,
}

impl Default for ComSettings {
    fn default() -> Self {
        Self {
            path: None,
            baud_rate: 115_200,
            timeout_millis: 10_000,
            protocol: ProtocolVariant::default(),
            park_file: None,
        }
    }
}

/* Location */
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct ObservingLocation {
    pub latitude: Degrees,
    pub longitude: Degrees,
    pub elevation: f64,
}

impl Default for ObservingLocation {
    fn default() -> Self {
        Self {
            latitude: 51.47,
            longitude: 0.0,
            elevation: 15.0,
        }
    }
}

/* Mount Geometry */
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct MountGeometry {
    pub ra_axis: AxisGeometry,
    pub de_axis: AxisGeometry,
    pub slew_rates: SlewRates,
    /// Sidereal tracking rate, degrees per second.
    pub sidereal_rate: Degrees,
}

impl MountGeometry {
    pub fn axis(&self, axis: Axis) -> &AxisGeometry {
        match axis {
            Axis::Primary => &self.ra_axis,
            Axis::Secondary => &self.de_axis,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.ra_axis.validate("RA")?;
        self.de_axis.validate("DE")?;
        let r = &self.slew_rates;
        if [r.guide, r.centering, r.find, r.max, self.sidereal_rate]
            .iter()
            .any(|&rate| rate <= 0.)
        {
            return Err(MountError::Configuration(
                "slew and tracking rates must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MountGeometry {
    // EQ3-2 gear train: 200-step motors, 60/20 pulley, 130:1 (RA) and
    // 65:1 (DE) worm gears.
    fn default() -> Self {
        Self {
            ra_axis: AxisGeometry {
                steps_per_rev: 78_000,
                degrees_per_step: 1.8 / 390.,
                positive_rotation: RotationDirection::Clockwise,
                invert_motion: false,
            },
            de_axis: AxisGeometry {
                steps_per_rev: 39_000,
                degrees_per_step: 1.8 / 195.,
                positive_rotation: RotationDirection::Clockwise,
                invert_motion: false,
            },
            slew_rates: SlewRates::default(),
            sidereal_rate: 0.004178074,
        }
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct AxisGeometry {
    pub steps_per_rev: u32,
    pub degrees_per_step: f64,
    /// Which rotation sense counts steps up on this axis.
    pub positive_rotation: RotationDirection,
    /// Reverses manual-jog directions for mounts wired the other way round.
    pub invert_motion: bool,
}

impl AxisGeometry {
    pub fn sign(&self) -> i32 {
        self.positive_rotation.sign()
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.steps_per_rev == 0 {
            return Err(MountError::Configuration(format!(
                "{} axis has zero steps per revolution",
                name
            )));
        }
        if self.degrees_per_step <= 0. {
            return Err(MountError::Configuration(format!(
                "{} axis step size must be positive",
                name
            )));
        }
        Ok(())
    }
}

/* Slew Rate Presets */
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct SlewRates {
    pub guide: Degrees,
    pub centering: Degrees,
    pub find: Degrees,
    /// Also the goto angular rate used for the arrival window.
    pub max: Degrees,
}

impl SlewRates {
    pub fn degrees_per_sec(&self, preset: SlewRate) -> Degrees {
        match preset {
            SlewRate::Guide => self.guide,
            SlewRate::Centering => self.centering,
            SlewRate::Find => self.find,
            SlewRate::Max => self.max,
        }
    }
}

impl Default for SlewRates {
    fn default() -> Self {
        Self {
            guide: 0.1,
            centering: 0.5,
            find: 1.0,
            max: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn zero_steps_per_rev_is_fatal() {
        let mut config = Config::default();
        config.geometry.ra_axis.steps_per_rev = 0;
        assert!(matches!(
            config.validate(),
            Err(MountError::Configuration(_))
        ));
    }

    #[test]
    fn zero_timeout_is_fatal() {
        let mut config = Config::default();
        config.com_settings.timeout_millis = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_latitude_is_fatal() {
        let mut config = Config::default();
        config.observing_location.latitude = 91.;
        assert!(config.validate().is_err());
    }
}
