use brim_core::{BrimError, Connection, ConnectionBase, Descriptions, Node, Shared, Slot};
use brim_mechanics::System;

use super::{
    LeftArm, RightArm, SphericalGeometry, Torso, define_spherical_objects, spherical_descriptions,
    spherical_joint,
};

/// A connection between the torso and the left arm.
pub trait LeftShoulder: Connection {
    fn set_torso(&mut self, torso: Shared<dyn Torso>);
    fn set_arm(&mut self, arm: Shared<dyn LeftArm>);
}

/// A connection between the torso and the right arm.
pub trait RightShoulder: Connection {
    fn set_torso(&mut self, torso: Shared<dyn Torso>);
    fn set_arm(&mut self, arm: Shared<dyn RightArm>);
}

/// Implements [`Connection`] and the shoulder role for a spherical
/// shoulder.
macro_rules! spherical_shoulder {
    ($shoulder:ident, $role:ident, $arm:ident, $point:ident, $frame:ident, $left:expr) => {
        impl Connection for $shoulder {
            fn descriptions(&self) -> Descriptions {
                spherical_descriptions(self.node(), "shoulder")
            }

            fn define_objects_hook(&mut self) -> Result<(), BrimError> {
                let torso = self.require_torso()?.borrow().body()?;
                let node = &mut self.base.node;
                define_spherical_objects(node);
                node.set_system(System::from_newtonian(&torso));
                Ok(())
            }

            fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
                let torso = self.require_torso()?;
                let arm = self.require_arm()?;
                let (torso, arm) = (torso.borrow(), arm.borrow());
                let geometry = SphericalGeometry {
                    parent_frame: &torso.$frame()?,
                    child_frame: &arm.shoulder_interframe()?,
                    parent_point: &torso.$point()?,
                    child_point: &arm.shoulder_interpoint()?,
                };
                spherical_joint(self.node(), geometry, $left)
            }
        }

        impl $role for $shoulder {
            fn set_torso(&mut self, torso: Shared<dyn Torso>) {
                self.torso.set(torso);
            }

            fn set_arm(&mut self, arm: Shared<dyn $arm>) {
                self.arm.set(arm);
            }
        }
    };
}

/// Spherical joint between the torso and the left arm.
#[derive(Debug, brim_core::Connection)]
pub struct SphericalLeftShoulder {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Torso model."))]
    torso: Slot<dyn Torso>,
    #[brim(submodel(description = "Left arm model."))]
    arm: Slot<dyn LeftArm>,
}

spherical_shoulder!(
    SphericalLeftShoulder,
    LeftShoulder,
    LeftArm,
    left_shoulder_point,
    left_shoulder_frame,
    true
);

/// Spherical joint between the torso and the right arm.
#[derive(Debug, brim_core::Connection)]
pub struct SphericalRightShoulder {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Torso model."))]
    torso: Slot<dyn Torso>,
    #[brim(submodel(description = "Right arm model."))]
    arm: Slot<dyn RightArm>,
}

spherical_shoulder!(
    SphericalRightShoulder,
    RightShoulder,
    RightArm,
    right_shoulder_point,
    right_shoulder_frame,
    false
);

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use brim_core::{AnyNode, ConnectionHandle, Model, shared, testing::check_descriptions};
    use brim_mechanics::{Expr, Vector, check_zero};

    use super::*;
    use crate::{Arm, PinElbowStickLeftArm, PinElbowStickRightArm, PlanarTorso};

    /// Lateral component of the upper arm axis for a pure adduction.
    fn sideways(arm: &dyn Arm, q: &[Expr], angle: &Expr, lateral: &Vector) -> Expr {
        let only_adduction: HashMap<Expr, Expr> = [
            (q[0].clone(), Expr::zero()),
            (q[1].clone(), angle.clone()),
            (q[2].clone(), Expr::zero()),
        ]
        .into_iter()
        .collect();
        arm.shoulder()
            .unwrap()
            .z()
            .dot(lateral)
            .unwrap()
            .subs(&only_adduction)
    }

    #[test]
    fn adduction_is_mirrored() {
        let torso = shared(PlanarTorso::new("torso").unwrap());
        let left_arm = shared(PinElbowStickLeftArm::new("left_arm").unwrap());
        let right_arm = shared(PinElbowStickRightArm::new("right_arm").unwrap());
        torso.borrow_mut().define_all().unwrap();
        left_arm.borrow_mut().define_all().unwrap();
        right_arm.borrow_mut().define_all().unwrap();

        let mut left = SphericalLeftShoulder::new("left_shoulder").unwrap();
        LeftShoulder::set_torso(&mut left, torso.clone());
        LeftShoulder::set_arm(&mut left, left_arm.clone());
        left.define_objects().unwrap();
        left.define_kinematics().unwrap();
        let mut right = SphericalRightShoulder::new("right_shoulder").unwrap();
        RightShoulder::set_torso(&mut right, torso.clone());
        RightShoulder::set_arm(&mut right, right_arm.clone());
        right.define_objects().unwrap();
        right.define_kinematics().unwrap();
        assert_eq!(left.node().system().unwrap().q().len(), 3);

        // Only adduction, by the same angle on both sides.
        let angle = Expr::symbol("a");
        let torso_y = torso.borrow().frame().unwrap().y();
        let left_y = sideways(&*left_arm.borrow(), &left.node().q, &angle, &torso_y);
        let right_y = sideways(&*right_arm.borrow(), &right.node().q, &angle, &torso_y);
        assert!(!check_zero(&right_y));
        assert!(check_zero(&(left_y + right_y)));

        assert!(
            right_arm
                .borrow()
                .shoulder_interpoint()
                .unwrap()
                .pos_from(&torso.borrow().right_shoulder_point().unwrap())
                .unwrap()
                .is_zero()
        );
    }

    #[test]
    fn every_parameter_is_described() {
        let mut shoulder = SphericalRightShoulder::new("right_shoulder").unwrap();
        RightShoulder::set_torso(&mut shoulder, shared(PlanarTorso::new("torso").unwrap()));
        RightShoulder::set_arm(
            &mut shoulder,
            shared(PinElbowStickRightArm::new("right_arm").unwrap()),
        );
        let shoulder = shared(shoulder);
        let node = AnyNode::Connection(ConnectionHandle::new(shoulder.clone()));
        assert!(check_descriptions(&node).unwrap().is_empty());
        assert_eq!(shoulder.borrow().descriptions().len(), 6);
    }
}
