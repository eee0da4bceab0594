//! Symbolic multibody mechanics.
//!
//! This crate provides the substrate on which BRiM models are built:
//! canonical symbolic expressions ([`Expr`]), reference frames, vectors,
//! points, rigid bodies, loads, pin joints, a [`System`] container and
//! Kane's method for forming equations of motion.

mod body;
mod error;
mod expr;
mod frame;
mod joint;
mod kane;
mod link;
mod loads;
mod point;
mod symbols;
mod system;
pub mod utilities;
mod vector;

pub use body::{Body, Inertia, Particle, RigidBody};
pub use error::MechanicsError;
pub use expr::{Expr, Function, Values, View};
pub use frame::{Matrix3, ReferenceFrame};
pub use joint::{PinJoint, PinJointGeometry};
pub use kane::EquationsOfMotion;
pub use loads::{Load, TorqueActuator};
pub use point::Point;
pub use symbols::{dynamicsymbols, expand_names, symbols};
pub use system::System;
pub use utilities::check_zero;
pub use vector::Vector;
