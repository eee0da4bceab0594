//! Joints between rigid bodies.

use std::{fmt, rc::Rc};

use crate::{Expr, MechanicsError, Point, RigidBody, Vector};

struct PinJointData {
    name: String,
    parent: RigidBody,
    child: RigidBody,
    coordinate: Expr,
    speed: Expr,
    kdes: Vec<Expr>,
}

/// A revolute joint with one rotational coordinate.
///
/// Cloning produces another handle to the same joint.
#[derive(Clone)]
pub struct PinJoint(Rc<PinJointData>);

/// Geometry of a pin joint.
pub struct PinJointGeometry<'a> {
    pub parent_point: &'a Point,
    pub child_point: &'a Point,
    /// Rotation axis expressed with the parent's frame.
    pub parent_axis: &'a Vector,
    /// Rotation axis expressed with the child's frame.
    pub child_axis: &'a Vector,
}

impl PinJoint {
    /// Creates the joint and defines the child's orientation, angular
    /// velocity and joint point kinematics.
    ///
    /// The child axis must have the same components in the child frame as
    /// the parent axis has in the parent frame.
    ///
    /// # Errors
    ///
    /// Fails if the axes do not align or the axis is zero.
    pub fn new(
        name: &str,
        parent: &RigidBody,
        child: &RigidBody,
        coordinate: Expr,
        speed: Expr,
        geometry: PinJointGeometry<'_>,
    ) -> Result<Self, MechanicsError> {
        let parent_frame = parent.frame();
        let child_frame = child.frame();
        let axis = geometry.parent_axis.to_matrix(parent_frame)?;
        let child_axis = geometry.child_axis.to_matrix(child_frame)?;
        if axis != child_axis {
            return Err(MechanicsError::InvalidJoint {
                joint: name.to_string(),
                reason: "the child axis must coincide with the parent axis".to_string(),
            });
        }

        child_frame.orient_axis(parent_frame, geometry.parent_axis, coordinate.clone())?;
        let unit = geometry.parent_axis.normalize()?;
        child_frame.set_ang_vel(parent_frame, &(&unit * &speed))?;

        geometry.child_point.set_pos(geometry.parent_point, Vector::zero());
        geometry.parent_point.set_vel(parent_frame, Vector::zero());
        geometry.child_point.set_vel(child_frame, Vector::zero());

        let kdes = vec![coordinate.dt() - &speed];
        Ok(Self(Rc::new(PinJointData {
            name: name.to_string(),
            parent: parent.clone(),
            child: child.clone(),
            coordinate,
            speed,
            kdes,
        })))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> &RigidBody {
        &self.0.parent
    }

    pub fn child(&self) -> &RigidBody {
        &self.0.child
    }

    pub fn coordinate(&self) -> &Expr {
        &self.0.coordinate
    }

    pub fn speed(&self) -> &Expr {
        &self.0.speed
    }

    /// Kinematic differential equations of the form `q' - u`.
    pub fn kdes(&self) -> &[Expr] {
        &self.0.kdes
    }
}

impl PartialEq for PinJoint {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PinJoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinJoint({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_joint_defines_rotation_and_kinematics() {
        let parent = RigidBody::new("parent");
        let child = RigidBody::new("child");
        let (q, u) = (Expr::dynamic("q"), Expr::dynamic("u"));
        let joint = PinJoint::new(
            "hinge",
            &parent,
            &child,
            q.clone(),
            u.clone(),
            PinJointGeometry {
                parent_point: parent.masscenter(),
                child_point: child.masscenter(),
                parent_axis: &parent.y(),
                child_axis: &child.y(),
            },
        )
        .unwrap();

        assert_eq!(joint.kdes(), &[q.dt() - &u]);
        assert_eq!(
            child.frame().ang_vel_in(parent.frame()).unwrap(),
            parent.y() * u
        );
        assert_eq!(child.frame().dcm(parent.frame()).unwrap()[0][2], -q.sin());
    }

    #[test]
    fn misaligned_axes_are_rejected() {
        let parent = RigidBody::new("parent");
        let child = RigidBody::new("child");
        let result = PinJoint::new(
            "hinge",
            &parent,
            &child,
            Expr::dynamic("q"),
            Expr::dynamic("u"),
            PinJointGeometry {
                parent_point: parent.masscenter(),
                child_point: child.masscenter(),
                parent_axis: &parent.y(),
                child_axis: &child.z(),
            },
        );
        assert!(matches!(result, Err(MechanicsError::InvalidJoint { .. })));
    }
}
