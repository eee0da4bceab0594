//! Bicycle models for BRiM.
//!
//! The components here fill the slots of one another: a
//! [`WhippleBicycleMoore`] holds a ground, two rigid frames, two wheels
//! and a tire per wheel, and [`SteerTorque`] drives it. A
//! [`RollingDisc`] is the smallest composite, a single wheel on the
//! ground. A [`Rider`] is assembled from body segments in the same way, and
//! a [`BicycleRider`] seats it on a bicycle. [`default_registry`] knows
//! about every type.

mod bicycle;
mod bicycle_rider;
mod body;
mod catalog;
mod config;
mod rider;
mod rolling_disc;

pub use bicycle::{
    FlatGround, FrontFrame, Ground, InContactTire, KnifeEdgeWheel, NonHolonomicTire, RearFrame,
    RigidFrontFrameMoore, RigidRearFrameMoore, SteerTorque, Tire, ToroidalWheel, Wheel,
    WhippleBicycle, WhippleBicycleMoore,
};
pub use bicycle_rider::{
    BicycleRider, FixedSeat, HandGrips, HolonomicHandGrips, Seat, SideLeanSeat, SideLeanSeatTorque,
};
pub use catalog::default_registry;
pub use config::{GroundNormal, TireConfig};
pub use rider::{
    Arm, FixedSacrum, LeftArm, LeftHip, LeftLeg, LeftShoulder, Leg, Pelvis, PinElbowStickArmTorque,
    PinElbowStickLeftArm, PinElbowStickRightArm, PinLeftHip, PinRightHip, PlanarPelvis, PlanarTorso,
    RightArm, RightHip, RightLeg, RightShoulder, Rider, RiderLean, RiderLeanConnection, Sacrum,
    SphericalLeftHip, SphericalLeftShoulder, SphericalRightHip, SphericalRightShoulder, Torso,
    TwoPinLegTorque, TwoPinStickLeftLeg, TwoPinStickRightLeg,
};
pub use rolling_disc::{DriveTorque, RollingDisc, rolling_disc_manual};
