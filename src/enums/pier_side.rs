use serde::{Deserialize, Serialize};

/// Which side of the mechanical pier the optical tube sits on. Affects the
/// sign of the declination-to-steps mapping.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum PierSide {
    East,
    West,
    Unknown,
}

impl PierSide {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn opposite(self) -> Self {
        match self {
            PierSide::Unknown => self,
            PierSide::East => PierSide::West,
            PierSide::West => PierSide::East,
        }
    }

    pub fn flip(&mut self) {
        *self = self.opposite();
    }
}
