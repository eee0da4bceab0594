use brim_core::{BrimError, Descriptions, Model, ModelBase, Node, Slot};
use brim_mechanics::System;
use tracing::debug;

use super::{
    LeftArm, LeftHip, LeftLeg, LeftShoulder, Pelvis, RightArm, RightHip, RightLeg, RightShoulder,
    Sacrum, Torso,
};

/// A rider assembled from body segments.
///
/// Only the pelvis is required. Each connection joins the segments it names,
/// so a torso without a sacrum stays a free body of its own system.
#[derive(Debug, brim_core::Model)]
pub struct Rider {
    #[brim(base)]
    base: ModelBase,
    #[brim(submodel(description = "Pelvis of the rider."))]
    pelvis: Slot<dyn Pelvis>,
    #[brim(submodel(description = "Torso of the rider.", optional))]
    torso: Slot<dyn Torso>,
    #[brim(submodel(description = "Left arm of the rider.", optional))]
    left_arm: Slot<dyn LeftArm>,
    #[brim(submodel(description = "Right arm of the rider.", optional))]
    right_arm: Slot<dyn RightArm>,
    #[brim(submodel(description = "Left leg of the rider.", optional))]
    left_leg: Slot<dyn LeftLeg>,
    #[brim(submodel(description = "Right leg of the rider.", optional))]
    right_leg: Slot<dyn RightLeg>,
    #[brim(connection(description = "Connection between the pelvis and the torso.", optional))]
    sacrum: Slot<dyn Sacrum>,
    #[brim(connection(description = "Connection between the torso and the left arm.", optional))]
    left_shoulder: Slot<dyn LeftShoulder>,
    #[brim(connection(description = "Connection between the torso and the right arm.", optional))]
    right_shoulder: Slot<dyn RightShoulder>,
    #[brim(connection(description = "Connection between the pelvis and the left leg.", optional))]
    left_hip: Slot<dyn LeftHip>,
    #[brim(connection(description = "Connection between the pelvis and the right leg.", optional))]
    right_hip: Slot<dyn RightHip>,
}

impl Model for Rider {
    fn descriptions(&self) -> Descriptions {
        Descriptions::new()
    }

    fn define_connections_hook(&mut self) -> Result<(), BrimError> {
        let pelvis = self.require_pelvis()?;
        if let Some(sacrum) = self.sacrum() {
            let mut sacrum = sacrum.borrow_mut();
            sacrum.set_pelvis(pelvis.clone());
            sacrum.set_torso(self.require_torso()?);
        }
        if let Some(shoulder) = self.left_shoulder() {
            let mut shoulder = shoulder.borrow_mut();
            shoulder.set_torso(self.require_torso()?);
            shoulder.set_arm(self.require_left_arm()?);
        }
        if let Some(shoulder) = self.right_shoulder() {
            let mut shoulder = shoulder.borrow_mut();
            shoulder.set_torso(self.require_torso()?);
            shoulder.set_arm(self.require_right_arm()?);
        }
        if let Some(hip) = self.left_hip() {
            let mut hip = hip.borrow_mut();
            hip.set_pelvis(pelvis.clone());
            hip.set_leg(self.require_left_leg()?);
        }
        if let Some(hip) = self.right_hip() {
            let mut hip = hip.borrow_mut();
            hip.set_pelvis(pelvis);
            hip.set_leg(self.require_right_leg()?);
        }
        Ok(())
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let pelvis = self.require_pelvis()?.borrow().body()?;
        self.base.node.set_system(System::from_newtonian(&pelvis));
        for connection in self.connections() {
            connection.borrow_mut().define_objects()?;
        }
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        for connection in self.connections() {
            connection.borrow_mut().define_kinematics()?;
        }
        debug!(
            rider = self.name(),
            connections = self.connections().len(),
            "joined rider segments"
        );
        Ok(())
    }

    fn define_loads_hook(&mut self) -> Result<(), BrimError> {
        for connection in self.connections() {
            connection.borrow_mut().define_loads()?;
        }
        Ok(())
    }

    fn define_constraints_hook(&mut self) -> Result<(), BrimError> {
        for connection in self.connections() {
            connection.borrow_mut().define_constraints()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use brim_core::{AnyNode, ModelHandle, Shared, shared, testing::check_descriptions};

    use super::*;
    use crate::{
        FixedSacrum, PinLeftHip, PinElbowStickLeftArm, PinElbowStickRightArm, PlanarPelvis,
        PlanarTorso, SphericalLeftShoulder, SphericalRightHip, SphericalRightShoulder,
        TwoPinStickLeftLeg, TwoPinStickRightLeg,
    };

    fn full_rider() -> Shared<Rider> {
        let mut rider = Rider::new("rider").unwrap();
        rider.set_pelvis(shared(PlanarPelvis::new("pelvis").unwrap()));
        rider.set_torso(shared(PlanarTorso::new("torso").unwrap()));
        rider.set_left_arm(shared(PinElbowStickLeftArm::new("left_arm").unwrap()));
        rider.set_right_arm(shared(PinElbowStickRightArm::new("right_arm").unwrap()));
        rider.set_left_leg(shared(TwoPinStickLeftLeg::new("left_leg").unwrap()));
        rider.set_right_leg(shared(TwoPinStickRightLeg::new("right_leg").unwrap()));
        rider.set_sacrum(shared(FixedSacrum::new("sacrum").unwrap()));
        rider.set_left_shoulder(shared(SphericalLeftShoulder::new("left_shoulder").unwrap()));
        rider.set_right_shoulder(shared(SphericalRightShoulder::new("right_shoulder").unwrap()));
        rider.set_left_hip(shared(PinLeftHip::new("left_hip").unwrap()));
        rider.set_right_hip(shared(SphericalRightHip::new("right_hip").unwrap()));
        shared(rider)
    }

    #[test]
    fn full_rider_joins_every_segment() {
        let rider = full_rider();
        rider.borrow_mut().define_all().unwrap();
        let system = rider.borrow().to_system().unwrap();
        // Elbows, knees and ankles, two spherical shoulders, a pin hip and
        // a spherical hip.
        assert_eq!(system.q().len(), 2 + 4 + 6 + 1 + 3);
        assert_eq!(system.u().len(), system.q().len());
        // Pelvis, torso, two segments per arm and three per leg.
        assert_eq!(system.bodies().len(), 2 + 4 + 6);
    }

    #[test]
    fn only_the_pelvis_is_required() {
        let rider = Rider::new("rider").unwrap();
        assert_eq!(rider.get_unspecified_paths(false), ["pelvis"]);
        assert_eq!(rider.get_unspecified_paths(true).len(), 11);
    }

    #[test]
    fn shoulder_without_torso_is_reported() {
        let mut rider = Rider::new("rider").unwrap();
        rider.set_pelvis(shared(PlanarPelvis::new("pelvis").unwrap()));
        rider.set_left_arm(shared(PinElbowStickLeftArm::new("left_arm").unwrap()));
        rider.set_left_shoulder(shared(SphericalLeftShoulder::new("left_shoulder").unwrap()));
        assert!(matches!(
            rider.define_connections(),
            Err(BrimError::Unspecified { requirement: "Torso", .. })
        ));
    }

    #[test]
    fn every_parameter_is_described() {
        let node = AnyNode::Model(ModelHandle::new(full_rider()));
        assert!(check_descriptions(&node).unwrap().is_empty());
    }
}
