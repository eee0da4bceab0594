use brim_core::{BrimError, Connection, ConnectionBase, Descriptions, Node, Shared, Slot};
use brim_mechanics::{PinJoint, PinJointGeometry, System};

use super::{
    LeftLeg, Pelvis, RightLeg, SphericalGeometry, define_spherical_objects, spherical_descriptions,
    spherical_joint,
};

/// A connection between the pelvis and the left leg.
pub trait LeftHip: Connection {
    fn set_pelvis(&mut self, pelvis: Shared<dyn Pelvis>);
    fn set_leg(&mut self, leg: Shared<dyn LeftLeg>);
}

/// A connection between the pelvis and the right leg.
pub trait RightHip: Connection {
    fn set_pelvis(&mut self, pelvis: Shared<dyn Pelvis>);
    fn set_leg(&mut self, leg: Shared<dyn RightLeg>);
}

macro_rules! hip_role {
    ($hip:ident, $role:ident, $leg:ident) => {
        impl $role for $hip {
            fn set_pelvis(&mut self, pelvis: Shared<dyn Pelvis>) {
                self.pelvis.set(pelvis);
            }

            fn set_leg(&mut self, leg: Shared<dyn $leg>) {
                self.leg.set(leg);
            }
        }
    };
}

macro_rules! spherical_hip {
    ($hip:ident, $role:ident, $leg:ident, $point:ident, $left:expr) => {
        impl Connection for $hip {
            fn descriptions(&self) -> Descriptions {
                spherical_descriptions(self.node(), "hip")
            }

            fn define_objects_hook(&mut self) -> Result<(), BrimError> {
                let pelvis = self.require_pelvis()?.borrow().body()?;
                let node = &mut self.base.node;
                define_spherical_objects(node);
                node.set_system(System::from_newtonian(&pelvis));
                Ok(())
            }

            fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
                let pelvis = self.require_pelvis()?;
                let leg = self.require_leg()?;
                let (pelvis, leg) = (pelvis.borrow(), leg.borrow());
                let geometry = SphericalGeometry {
                    parent_frame: &pelvis.frame()?,
                    child_frame: &leg.hip_interframe()?,
                    parent_point: &pelvis.$point()?,
                    child_point: &leg.hip_interpoint()?,
                };
                spherical_joint(self.node(), geometry, $left)
            }
        }

        hip_role!($hip, $role, $leg);
    };
}

macro_rules! pin_hip {
    ($hip:ident, $role:ident, $leg:ident, $point:ident) => {
        impl Connection for $hip {
            fn descriptions(&self) -> Descriptions {
                let node = self.node();
                let mut descriptions = Descriptions::new();
                if let (Some(q), Some(u)) = (node.q.first(), node.u.first()) {
                    descriptions.insert(q.clone(), "Flexion angle of the hip.".to_string());
                    descriptions.insert(
                        u.clone(),
                        "Flexion angular velocity of the hip.".to_string(),
                    );
                }
                descriptions
            }

            fn define_objects_hook(&mut self) -> Result<(), BrimError> {
                let pelvis = self.require_pelvis()?.borrow().body()?;
                let node = &mut self.base.node;
                node.q = node.prefixed_dynamicsymbols("q_flexion");
                node.u = node.prefixed_dynamicsymbols("u_flexion");
                node.set_system(System::from_newtonian(&pelvis));
                Ok(())
            }

            fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
                let pelvis = self.require_pelvis()?;
                let leg = self.require_leg()?;
                let (pelvis, leg) = (pelvis.borrow(), leg.borrow());
                let (parent, child) = (pelvis.body()?, leg.hip()?);
                let node = self.node();
                let joint = PinJoint::new(
                    &format!("{}_joint", node.name()),
                    &parent,
                    &child,
                    node.q[0].clone(),
                    node.u[0].clone(),
                    PinJointGeometry {
                        parent_point: &pelvis.$point()?,
                        child_point: &leg.hip_interpoint()?,
                        parent_axis: &parent.y(),
                        child_axis: &child.y(),
                    },
                )?;
                node.system_mut()?.add_joints(&[joint])?;
                Ok(())
            }
        }

        hip_role!($hip, $role, $leg);
    };
}

/// Spherical joint between the pelvis and the left leg.
#[derive(Debug, brim_core::Connection)]
pub struct SphericalLeftHip {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Pelvis model."))]
    pelvis: Slot<dyn Pelvis>,
    #[brim(submodel(description = "Left leg model."))]
    leg: Slot<dyn LeftLeg>,
}

spherical_hip!(SphericalLeftHip, LeftHip, LeftLeg, left_hip_point, true);

/// Spherical joint between the pelvis and the right leg.
#[derive(Debug, brim_core::Connection)]
pub struct SphericalRightHip {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Pelvis model."))]
    pelvis: Slot<dyn Pelvis>,
    #[brim(submodel(description = "Right leg model."))]
    leg: Slot<dyn RightLeg>,
}

spherical_hip!(SphericalRightHip, RightHip, RightLeg, right_hip_point, false);

/// Pin joint between the pelvis and the left leg, flexing about the lateral
/// axis of the pelvis.
#[derive(Debug, brim_core::Connection)]
pub struct PinLeftHip {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Pelvis model."))]
    pelvis: Slot<dyn Pelvis>,
    #[brim(submodel(description = "Left leg model."))]
    leg: Slot<dyn LeftLeg>,
}

pin_hip!(PinLeftHip, LeftHip, LeftLeg, left_hip_point);

/// Pin joint between the pelvis and the right leg, flexing about the
/// lateral axis of the pelvis.
#[derive(Debug, brim_core::Connection)]
pub struct PinRightHip {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Pelvis model."))]
    pelvis: Slot<dyn Pelvis>,
    #[brim(submodel(description = "Right leg model."))]
    leg: Slot<dyn RightLeg>,
}

pin_hip!(PinRightHip, RightHip, RightLeg, right_hip_point);

#[cfg(test)]
mod tests {
    use brim_core::{AnyNode, ConnectionHandle, Model, shared, testing::check_descriptions};

    use super::*;
    use crate::{Leg, PlanarPelvis, TwoPinStickLeftLeg, TwoPinStickRightLeg};

    #[test]
    fn pin_hip_flexes_about_the_pelvis_y_axis() {
        let pelvis = shared(PlanarPelvis::new("pelvis").unwrap());
        let leg = shared(TwoPinStickRightLeg::new("right_leg").unwrap());
        pelvis.borrow_mut().define_all().unwrap();
        leg.borrow_mut().define_all().unwrap();

        let mut hip = PinRightHip::new("right_hip").unwrap();
        RightHip::set_pelvis(&mut hip, pelvis.clone());
        RightHip::set_leg(&mut hip, leg.clone());
        hip.define_objects().unwrap();
        hip.define_kinematics().unwrap();

        let system = hip.node().system().unwrap();
        assert_eq!(system.q(), hip.node().q);
        assert_eq!(system.joints().len(), 1);
        let thigh = leg.borrow().hip().unwrap();
        let pelvis_body = pelvis.borrow().body().unwrap();
        assert_eq!(
            thigh.frame().ang_vel_in(pelvis_body.frame()).unwrap(),
            pelvis_body.y() * hip.node().u[0].clone()
        );
        assert!(
            leg.borrow()
                .hip_interpoint()
                .unwrap()
                .pos_from(&pelvis.borrow().right_hip_point().unwrap())
                .unwrap()
                .is_zero()
        );
    }

    #[test]
    fn spherical_hip_adds_three_coordinates() {
        let pelvis = shared(PlanarPelvis::new("pelvis").unwrap());
        let leg = shared(TwoPinStickLeftLeg::new("left_leg").unwrap());
        pelvis.borrow_mut().define_all().unwrap();
        leg.borrow_mut().define_all().unwrap();

        let mut hip = SphericalLeftHip::new("left_hip").unwrap();
        LeftHip::set_pelvis(&mut hip, pelvis);
        LeftHip::set_leg(&mut hip, leg);
        hip.define_objects().unwrap();
        hip.define_kinematics().unwrap();

        let system = hip.node().system().unwrap();
        assert_eq!(system.q().len(), 3);
        assert_eq!(system.kdes().len(), 3);
    }

    #[test]
    fn every_parameter_is_described() {
        let mut hip = PinLeftHip::new("left_hip").unwrap();
        LeftHip::set_pelvis(&mut hip, shared(PlanarPelvis::new("pelvis").unwrap()));
        LeftHip::set_leg(&mut hip, shared(TwoPinStickLeftLeg::new("left_leg").unwrap()));
        let hip = shared(hip);
        let node = AnyNode::Connection(ConnectionHandle::new(hip.clone()));
        assert!(check_descriptions(&node).unwrap().is_empty());
        assert_eq!(hip.borrow().descriptions().len(), 2);
    }
}
