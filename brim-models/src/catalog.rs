//! Registry of every model, connection and load group in this crate.

use brim_core::{BrimError, Registry};

use crate::{
    Arm, BicycleRider, DriveTorque, FixedSacrum, FixedSeat, FlatGround, FrontFrame, Ground,
    HandGrips, HolonomicHandGrips, InContactTire, KnifeEdgeWheel, LeftArm, LeftHip, LeftLeg,
    LeftShoulder, Leg, NonHolonomicTire, Pelvis, PinElbowStickArmTorque, PinElbowStickLeftArm,
    PinElbowStickRightArm, PinLeftHip, PinRightHip, PlanarPelvis, PlanarTorso, RearFrame, RightArm,
    RightHip, RightLeg, RightShoulder, Rider, RiderLean, RiderLeanConnection, RigidFrontFrameMoore,
    RigidRearFrameMoore, RollingDisc, Sacrum, Seat, SideLeanSeat, SideLeanSeatTorque,
    SphericalLeftHip, SphericalLeftShoulder, SphericalRightHip, SphericalRightShoulder,
    SteerTorque, Tire, Torso, ToroidalWheel, TwoPinLegTorque, TwoPinStickLeftLeg,
    TwoPinStickRightLeg, Wheel, WhippleBicycle, WhippleBicycleMoore,
};

/// Builds a registry with all components of this crate.
///
/// Every type is registered under the roles it fulfils. The Whipple
/// bicycle and its frames default to the `"moore"` convention.
///
/// # Errors
///
/// Fails only if a type is registered twice, which indicates a bug.
pub fn default_registry() -> Result<Registry, BrimError> {
    let mut registry = Registry::new();

    registry.register::<FlatGround>()?.provides::<dyn Ground>(|x| x);
    registry.register::<KnifeEdgeWheel>()?.provides::<dyn Wheel>(|x| x);
    registry.register::<ToroidalWheel>()?.provides::<dyn Wheel>(|x| x);
    registry
        .register::<RigidRearFrameMoore>()?
        .provides::<dyn RearFrame>(|x| x);
    registry
        .register::<RigidFrontFrameMoore>()?
        .provides::<dyn FrontFrame>(|x| x);
    registry
        .register::<WhippleBicycleMoore>()?
        .provides::<dyn WhippleBicycle>(|x| x);
    registry.register::<RollingDisc>()?;

    registry.register::<PlanarPelvis>()?.provides::<dyn Pelvis>(|x| x);
    registry.register::<PlanarTorso>()?.provides::<dyn Torso>(|x| x);
    registry
        .register::<PinElbowStickLeftArm>()?
        .provides::<dyn Arm>(|x| x)
        .provides::<dyn LeftArm>(|x| x);
    registry
        .register::<PinElbowStickRightArm>()?
        .provides::<dyn Arm>(|x| x)
        .provides::<dyn RightArm>(|x| x);
    registry
        .register::<TwoPinStickLeftLeg>()?
        .provides::<dyn Leg>(|x| x)
        .provides::<dyn LeftLeg>(|x| x);
    registry
        .register::<TwoPinStickRightLeg>()?
        .provides::<dyn Leg>(|x| x)
        .provides::<dyn RightLeg>(|x| x);
    registry.register::<RiderLean>()?;
    registry.register::<Rider>()?;
    registry.register::<BicycleRider>()?;

    registry.register::<InContactTire>()?.provides::<dyn Tire>(|x| x);
    registry
        .register::<NonHolonomicTire>()?
        .provides::<dyn Tire>(|x| x);
    registry.register::<FixedSacrum>()?.provides::<dyn Sacrum>(|x| x);
    registry
        .register::<SphericalLeftShoulder>()?
        .provides::<dyn LeftShoulder>(|x| x);
    registry
        .register::<SphericalRightShoulder>()?
        .provides::<dyn RightShoulder>(|x| x);
    registry.register::<PinLeftHip>()?.provides::<dyn LeftHip>(|x| x);
    registry.register::<PinRightHip>()?.provides::<dyn RightHip>(|x| x);
    registry
        .register::<SphericalLeftHip>()?
        .provides::<dyn LeftHip>(|x| x);
    registry
        .register::<SphericalRightHip>()?
        .provides::<dyn RightHip>(|x| x);
    registry.register::<RiderLeanConnection>()?;
    registry.register::<FixedSeat>()?.provides::<dyn Seat>(|x| x);
    registry.register::<SideLeanSeat>()?.provides::<dyn Seat>(|x| x);
    registry
        .register::<HolonomicHandGrips>()?
        .provides::<dyn HandGrips>(|x| x);

    registry.register::<SteerTorque>()?;
    registry.register::<DriveTorque>()?;
    registry.register::<PinElbowStickArmTorque>()?;
    registry.register::<TwoPinLegTorque>()?;
    registry.register::<SideLeanSeatTorque>()?;

    registry.set_default_convention::<dyn WhippleBicycle>("moore");
    registry.set_default_convention::<dyn RearFrame>("moore");
    registry.set_default_convention::<dyn FrontFrame>("moore");
    Ok(registry)
}
