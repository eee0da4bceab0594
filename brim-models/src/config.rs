//! Options of the configurable models.

use std::{fmt, str::FromStr};

use brim_core::BrimError;
use brim_mechanics::{ReferenceFrame, Vector};

/// Flags selecting the loads and constraints of an in-contact tire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct TireConfig {
    /// Register the normal force as a noncontributing force.
    pub compute_normal_force: bool,
    /// Constrain the contact point to roll without longitudinal slip.
    pub no_longitudinal_slip: bool,
    /// Constrain the contact point to roll without lateral slip.
    pub no_lateral_slip: bool,
}

impl TireConfig {
    /// Pure rolling without slip, ignoring the normal force.
    pub const NON_HOLONOMIC: TireConfig = TireConfig {
        compute_normal_force: false,
        no_longitudinal_slip: true,
        no_lateral_slip: true,
    };
}

impl Default for TireConfig {
    fn default() -> Self {
        Self {
            compute_normal_force: true,
            no_longitudinal_slip: false,
            no_lateral_slip: false,
        }
    }
}

/// Direction of the normal of a flat ground, pointing out of the ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum GroundNormal {
    #[cfg_attr(feature = "serde-derive", serde(rename = "+x"))]
    PosX,
    #[cfg_attr(feature = "serde-derive", serde(rename = "-x"))]
    NegX,
    #[cfg_attr(feature = "serde-derive", serde(rename = "+y"))]
    PosY,
    #[cfg_attr(feature = "serde-derive", serde(rename = "-y"))]
    NegY,
    #[cfg_attr(feature = "serde-derive", serde(rename = "+z"))]
    PosZ,
    #[default]
    #[cfg_attr(feature = "serde-derive", serde(rename = "-z"))]
    NegZ,
}

impl GroundNormal {
    /// The normal as a unit vector of `frame`.
    pub fn vector(self, frame: &ReferenceFrame) -> Vector {
        match self {
            GroundNormal::PosX => frame.x(),
            GroundNormal::NegX => -frame.x(),
            GroundNormal::PosY => frame.y(),
            GroundNormal::NegY => -frame.y(),
            GroundNormal::PosZ => frame.z(),
            GroundNormal::NegZ => -frame.z(),
        }
    }

    /// The two unit vectors of `frame` spanning the ground plane.
    pub fn tangent_vectors(self, frame: &ReferenceFrame) -> [Vector; 2] {
        match self {
            GroundNormal::PosX | GroundNormal::NegX => [frame.y(), frame.z()],
            GroundNormal::PosY | GroundNormal::NegY => [frame.x(), frame.z()],
            GroundNormal::PosZ | GroundNormal::NegZ => [frame.x(), frame.y()],
        }
    }
}

impl fmt::Display for GroundNormal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroundNormal::PosX => "+x",
            GroundNormal::NegX => "-x",
            GroundNormal::PosY => "+y",
            GroundNormal::NegY => "-y",
            GroundNormal::PosZ => "+z",
            GroundNormal::NegZ => "-z",
        };
        f.write_str(name)
    }
}

impl FromStr for GroundNormal {
    type Err = BrimError;

    /// Parses `"x"`, `"+x"`, `"-x"` and so on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, axis) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        match (axis, negative) {
            ("x", false) => Ok(GroundNormal::PosX),
            ("x", true) => Ok(GroundNormal::NegX),
            ("y", false) => Ok(GroundNormal::PosY),
            ("y", true) => Ok(GroundNormal::NegY),
            ("z", false) => Ok(GroundNormal::PosZ),
            ("z", true) => Ok(GroundNormal::NegZ),
            _ => Err(BrimError::InvalidAxis(s.to_string())),
        }
    }
}
