//! Assemblies shared by the integration tests.

use brim_core::{
    AnyNode, BrimError, Connection, ConnectionHandle, LoadGroupHandle, Model, ModelHandle,
    RegistryEntry, Shared, shared,
};
use brim_models::{
    BicycleRider, DriveTorque, FixedSacrum, FixedSeat, FlatGround, HolonomicHandGrips,
    InContactTire, KnifeEdgeWheel, LeftHip, LeftShoulder, NonHolonomicTire, PinElbowStickArmTorque,
    PinElbowStickLeftArm, PinElbowStickRightArm, PinLeftHip, PinRightHip, PlanarPelvis,
    PlanarTorso, RightHip, RightShoulder, Rider, RiderLean, RiderLeanConnection,
    RigidFrontFrameMoore, RigidRearFrameMoore, RollingDisc, Seat, SideLeanSeat,
    SideLeanSeatTorque, SphericalLeftHip, SphericalLeftShoulder, SphericalRightHip,
    SphericalRightShoulder, SteerTorque, Tire, TwoPinLegTorque, TwoPinStickLeftLeg,
    TwoPinStickRightLeg, WhippleBicycleMoore,
};

/// A Whipple bicycle with knife-edge wheels and nonholonomic tires.
///
/// # Errors
///
/// Fails if `name` is not a valid identifier.
pub fn whipple_bicycle(name: &str) -> Result<Shared<WhippleBicycleMoore>, BrimError> {
    let mut bicycle = WhippleBicycleMoore::new(name)?;
    bicycle.set_ground(shared(FlatGround::new("ground")?));
    bicycle.set_rear_frame(shared(RigidRearFrameMoore::new("rear_frame")?));
    bicycle.set_front_frame(shared(RigidFrontFrameMoore::new("front_frame")?));
    bicycle.set_rear_wheel(shared(KnifeEdgeWheel::new("rear_wheel")?));
    bicycle.set_front_wheel(shared(KnifeEdgeWheel::new("front_wheel")?));
    bicycle.set_rear_tire(shared(NonHolonomicTire::new("rear_tire")?));
    bicycle.set_front_tire(shared(NonHolonomicTire::new("front_tire")?));
    Ok(shared(bicycle))
}

/// A knife-edge disc on a flat ground with a nonholonomic tire.
///
/// # Errors
///
/// Fails if `name` is not a valid identifier.
pub fn rolling_disc(name: &str) -> Result<Shared<RollingDisc>, BrimError> {
    let mut model = RollingDisc::new(name)?;
    model.set_ground(shared(FlatGround::new("ground")?));
    model.set_disc(shared(KnifeEdgeWheel::new("disc")?));
    model.set_tire(shared(NonHolonomicTire::new("tire")?));
    Ok(shared(model))
}

/// A rider with every segment, a fixed sacrum, spherical shoulders and
/// pin hips.
///
/// # Errors
///
/// Fails if `name` is not a valid identifier.
pub fn rider(name: &str) -> Result<Shared<Rider>, BrimError> {
    let mut rider = Rider::new(name)?;
    rider.set_pelvis(shared(PlanarPelvis::new("pelvis")?));
    rider.set_torso(shared(PlanarTorso::new("torso")?));
    rider.set_left_arm(shared(PinElbowStickLeftArm::new("left_arm")?));
    rider.set_right_arm(shared(PinElbowStickRightArm::new("right_arm")?));
    rider.set_left_leg(shared(TwoPinStickLeftLeg::new("left_leg")?));
    rider.set_right_leg(shared(TwoPinStickRightLeg::new("right_leg")?));
    rider.set_sacrum(shared(FixedSacrum::new("sacrum")?));
    rider.set_left_shoulder(shared(SphericalLeftShoulder::new("left_shoulder")?));
    rider.set_right_shoulder(shared(SphericalRightShoulder::new("right_shoulder")?));
    rider.set_left_hip(shared(PinLeftHip::new("left_hip")?));
    rider.set_right_hip(shared(PinRightHip::new("right_hip")?));
    Ok(shared(rider))
}

/// The [`whipple_bicycle`] with a [`rider`] on a fixed seat, holding the
/// hand grips.
///
/// # Errors
///
/// Fails if `name` is not a valid identifier.
pub fn bicycle_rider(name: &str) -> Result<Shared<BicycleRider>, BrimError> {
    let mut model = BicycleRider::new(name)?;
    model.set_bicycle(whipple_bicycle("bicycle")?);
    model.set_rider(rider("rider")?);
    model.set_seat(shared(FixedSeat::new("seat")?));
    model.set_hand_grips(shared(HolonomicHandGrips::new("hand_grips")?));
    Ok(shared(model))
}

fn connection_node<C: Connection + 'static>(connection: C) -> AnyNode {
    AnyNode::Connection(ConnectionHandle::new(shared(connection)))
}

fn seated<S: Seat + 'static>(mut seat: S) -> Result<S, BrimError> {
    seat.set_rear_frame(shared(RigidRearFrameMoore::new("rear_frame")?));
    seat.set_pelvis(shared(PlanarPelvis::new("pelvis")?));
    Ok(seat)
}

fn left_hip<H: LeftHip + 'static>(mut hip: H) -> Result<AnyNode, BrimError> {
    hip.set_pelvis(shared(PlanarPelvis::new("pelvis")?));
    hip.set_leg(shared(TwoPinStickLeftLeg::new("left_leg")?));
    Ok(connection_node(hip))
}

fn right_hip<H: RightHip + 'static>(mut hip: H) -> Result<AnyNode, BrimError> {
    hip.set_pelvis(shared(PlanarPelvis::new("pelvis")?));
    hip.set_leg(shared(TwoPinStickRightLeg::new("right_leg")?));
    Ok(connection_node(hip))
}

fn tire_on_flat_ground<T: Tire + 'static>(mut tire: T) -> Result<AnyNode, BrimError> {
    tire.set_ground(shared(FlatGround::new("ground")?));
    tire.set_wheel(shared(KnifeEdgeWheel::new("wheel")?));
    Ok(AnyNode::Connection(ConnectionHandle::new(shared(tire))))
}

/// Attaches `group` to `parent` and defines the objects of the parent, so
/// the group owns its symbols.
fn attached<M: Model + 'static>(
    parent: Shared<M>,
    group: LoadGroupHandle,
) -> Result<AnyNode, BrimError> {
    let mut parent = parent.borrow_mut();
    parent.add_load_groups(&[group.clone()])?;
    parent.define_connections()?;
    parent.define_objects()?;
    Ok(AnyNode::LoadGroup(group))
}

/// Instantiates the type of `entry` with every required slot filled.
///
/// Leaf models come straight from the registry. Composite models and
/// connections get the simplest components that fit their slots, and
/// load groups are attached to a defined parent.
///
/// # Errors
///
/// Fails if assembling or defining the parent fails.
pub fn assembled(entry: &RegistryEntry) -> Result<AnyNode, BrimError> {
    match entry.type_name() {
        "WhippleBicycleMoore" => Ok(AnyNode::Model(ModelHandle::new(whipple_bicycle(
            "bicycle",
        )?))),
        "RollingDisc" => Ok(AnyNode::Model(ModelHandle::new(rolling_disc("rolling_disc")?))),
        "InContactTire" => tire_on_flat_ground(InContactTire::new("tire")?),
        "NonHolonomicTire" => tire_on_flat_ground(NonHolonomicTire::new("tire")?),
        "SteerTorque" => attached(
            whipple_bicycle("bicycle")?,
            LoadGroupHandle::new(shared(SteerTorque::new("steer_torque")?)),
        ),
        "DriveTorque" => attached(
            rolling_disc("rolling_disc")?,
            LoadGroupHandle::new(shared(DriveTorque::new("drive_torque")?)),
        ),
        "Rider" => Ok(AnyNode::Model(ModelHandle::new(rider("rider")?))),
        "BicycleRider" => Ok(AnyNode::Model(ModelHandle::new(bicycle_rider(
            "bicycle_rider",
        )?))),
        "FixedSacrum" => {
            let mut sacrum = FixedSacrum::new("sacrum")?;
            sacrum.set_pelvis(shared(PlanarPelvis::new("pelvis")?));
            sacrum.set_torso(shared(PlanarTorso::new("torso")?));
            Ok(connection_node(sacrum))
        }
        "SphericalLeftShoulder" => {
            let mut shoulder = SphericalLeftShoulder::new("left_shoulder")?;
            LeftShoulder::set_torso(&mut shoulder, shared(PlanarTorso::new("torso")?));
            LeftShoulder::set_arm(&mut shoulder, shared(PinElbowStickLeftArm::new("left_arm")?));
            Ok(connection_node(shoulder))
        }
        "SphericalRightShoulder" => {
            let mut shoulder = SphericalRightShoulder::new("right_shoulder")?;
            RightShoulder::set_torso(&mut shoulder, shared(PlanarTorso::new("torso")?));
            RightShoulder::set_arm(
                &mut shoulder,
                shared(PinElbowStickRightArm::new("right_arm")?),
            );
            Ok(connection_node(shoulder))
        }
        "PinLeftHip" => left_hip(PinLeftHip::new("left_hip")?),
        "SphericalLeftHip" => left_hip(SphericalLeftHip::new("left_hip")?),
        "PinRightHip" => right_hip(PinRightHip::new("right_hip")?),
        "SphericalRightHip" => right_hip(SphericalRightHip::new("right_hip")?),
        "RiderLeanConnection" => {
            let mut lean = RiderLeanConnection::new("rider_lean")?;
            lean.set_rider(shared(RiderLean::new("rider")?));
            lean.set_rear_frame(shared(RigidRearFrameMoore::new("rear_frame")?));
            Ok(connection_node(lean))
        }
        "FixedSeat" => Ok(connection_node(seated(FixedSeat::new("seat")?)?)),
        "SideLeanSeat" => Ok(connection_node(seated(SideLeanSeat::new("seat")?)?)),
        "HolonomicHandGrips" => {
            let mut grips = HolonomicHandGrips::new("hand_grips")?;
            grips.set_front_frame(shared(RigidFrontFrameMoore::new("front_frame")?));
            grips.set_left_arm(shared(PinElbowStickLeftArm::new("left_arm")?));
            grips.set_right_arm(shared(PinElbowStickRightArm::new("right_arm")?));
            Ok(connection_node(grips))
        }
        "PinElbowStickArmTorque" => attached(
            shared(PinElbowStickLeftArm::new("left_arm")?),
            LoadGroupHandle::new(shared(PinElbowStickArmTorque::new("elbow_torque")?)),
        ),
        "TwoPinLegTorque" => attached(
            shared(TwoPinStickRightLeg::new("right_leg")?),
            LoadGroupHandle::new(shared(TwoPinLegTorque::new("leg_torque")?)),
        ),
        "SideLeanSeatTorque" => {
            let seat = seated(SideLeanSeat::new("seat")?)?;
            for submodel in seat.submodels() {
                let mut submodel = submodel.borrow_mut();
                submodel.define_connections()?;
                submodel.define_objects()?;
            }
            let group = LoadGroupHandle::new(shared(SideLeanSeatTorque::new("lean_torque")?));
            let seat = shared(seat);
            let mut seat = seat.borrow_mut();
            seat.add_load_groups(&[group.clone()])?;
            seat.define_objects()?;
            Ok(AnyNode::LoadGroup(group))
        }
        type_name => entry.instantiate(&type_name.to_lowercase()),
    }
}
