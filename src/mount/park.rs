use crate::errors::{MountError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Encoder position the mount returns to when parked. Persisted so it
/// survives restarts.
#[derive(Default, Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct ParkPosition {
    pub ra_steps: i32,
    pub de_steps: i32,
}

/// Loads the park position at startup and writes it back whenever the user
/// sets a new one. Without a backing file the position lives in memory only.
pub struct ParkStore {
    path: Option<PathBuf>,
    position: ParkPosition,
}

impl ParkStore {
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let position = match &path {
            Some(p) => confy::load_path(p)
                .map_err(|e| MountError::Configuration(format!("cannot read park file: {}", e)))?,
            None => ParkPosition::default(),
        };
        Ok(Self { path, position })
    }

    pub fn get(&self) -> ParkPosition {
        self.position
    }

    pub fn set(&mut self, position: ParkPosition) -> Result<()> {
        if let Some(p) = &self.path {
            confy::store_path(p, position)
                .map_err(|e| MountError::Configuration(format!("cannot write park file: {}", e)))?;
        }
        self.position = position;
        Ok(())
    }
}
