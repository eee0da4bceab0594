//! Arms of a rider.
//!
//! An arm is attached to the torso at its shoulder interpoint and may hold
//! the handlebar at its hand interpoint.

use brim_core::{
    BrimError, Descriptions, LoadGroup, LoadGroupBase, Model, ModelBase, Node, NodeBase,
    downcast_parent,
};
use brim_mechanics::{
    Expr, PinJoint, PinJointGeometry, Point, ReferenceFrame, RigidBody, System, TorqueActuator,
    Vector,
};

use crate::body::{InertiaLayout, define_part, part_descriptions};

/// An arm of a rider.
pub trait Arm: Model {
    /// Segment attached to the torso.
    ///
    /// # Errors
    ///
    /// Fails before `define_objects`.
    fn shoulder(&self) -> Result<RigidBody, BrimError>;

    /// Point where the shoulder is attached to the torso.
    fn shoulder_interpoint(&self) -> Result<Point, BrimError>;

    fn shoulder_interframe(&self) -> Result<ReferenceFrame, BrimError> {
        Ok(self.shoulder()?.frame().clone())
    }

    /// Segment holding the handlebar.
    fn hand(&self) -> Result<RigidBody, BrimError>;

    /// Point where the hand is attached to the handlebar.
    fn hand_interpoint(&self) -> Result<Point, BrimError>;

    fn hand_interframe(&self) -> Result<ReferenceFrame, BrimError> {
        Ok(self.hand()?.frame().clone())
    }
}

pub trait LeftArm: Arm {}

pub trait RightArm: Arm {}

const LENGTHS: [(&str, &str); 4] = [
    ("l_upper_arm", "Upper arm length."),
    (
        "l_upper_arm_com",
        "Upper arm center of mass position from the shoulder.",
    ),
    ("l_forearm", "Forearm length."),
    ("l_forearm_com", "Forearm center of mass position from the elbow."),
];

#[derive(Debug, Clone)]
struct Segments {
    upper_arm: RigidBody,
    forearm: RigidBody,
    shoulder_interpoint: Point,
    hand_interpoint: Point,
}

/// Upper arm and forearm as sticks along their z axes, joined by a pin
/// elbow about the y axis of the upper arm.
#[derive(Debug, Default)]
struct PinElbowStick {
    segments: Option<Segments>,
}

impl PinElbowStick {
    fn segments(&self, node: &NodeBase) -> Result<&Segments, BrimError> {
        self.segments.as_ref().ok_or_else(|| BrimError::StageOrder {
            node: node.name().to_string(),
            stage: "define_objects",
        })
    }

    fn descriptions(node: &NodeBase) -> Descriptions {
        let mut descriptions = Descriptions::new();
        part_descriptions(node, "upper_arm", &mut descriptions);
        part_descriptions(node, "forearm", &mut descriptions);
        for (key, text) in LENGTHS {
            if let Ok(symbol) = node.symbol(key) {
                descriptions.insert(symbol, text.to_string());
            }
        }
        if let (Some(q), Some(u)) = (node.q.first(), node.u.first()) {
            descriptions.insert(q.clone(), "Elbow flexion angle.".to_string());
            descriptions.insert(u.clone(), "Elbow flexion angular velocity.".to_string());
        }
        descriptions
    }

    fn define_objects(&mut self, node: &mut NodeBase) {
        let upper_arm = define_part(node, "upper_arm", InertiaLayout::StickZ);
        let forearm = define_part(node, "forearm", InertiaLayout::StickZ);
        for (key, _) in LENGTHS {
            node.set_symbol(key, node.prefixed_symbol(key));
        }
        node.q = node.prefixed_dynamicsymbols("q_elbow_flexion");
        node.u = node.prefixed_dynamicsymbols("u_elbow_flexion");
        node.set_system(System::from_newtonian(&upper_arm));
        self.segments = Some(Segments {
            shoulder_interpoint: Point::new(&format!("{}_SP", node.name())),
            hand_interpoint: Point::new(&format!("{}_HP", node.name())),
            upper_arm,
            forearm,
        });
    }

    fn define_kinematics(&self, node: &NodeBase) -> Result<(), BrimError> {
        let symbol = |key: &str| node.symbol(key);
        let (l_u, l_uc) = (symbol("l_upper_arm")?, symbol("l_upper_arm_com")?);
        let (l_f, l_fc) = (symbol("l_forearm")?, symbol("l_forearm_com")?);
        let segments = self.segments(node)?;
        let (upper, fore) = (&segments.upper_arm, &segments.forearm);

        upper
            .masscenter()
            .set_pos(&segments.shoulder_interpoint, upper.z() * l_uc.clone());
        fore.masscenter()
            .set_pos(&segments.hand_interpoint, fore.z() * (&l_fc - &l_f));
        segments
            .shoulder_interpoint
            .set_vel(upper.frame(), Vector::zero());
        segments.hand_interpoint.set_vel(fore.frame(), Vector::zero());

        let elbow_upper = upper
            .masscenter()
            .locatenew(&format!("{}_elbow_upper", node.name()), upper.z() * (l_u - l_uc));
        let elbow_fore = fore
            .masscenter()
            .locatenew(&format!("{}_elbow_fore", node.name()), fore.z() * -l_fc);
        let elbow = PinJoint::new(
            &format!("{}_elbow", node.name()),
            upper,
            fore,
            node.q[0].clone(),
            node.u[0].clone(),
            PinJointGeometry {
                parent_point: &elbow_upper,
                child_point: &elbow_fore,
                parent_axis: &upper.y(),
                child_axis: &fore.y(),
            },
        )?;
        node.system_mut()?.add_joints(&[elbow])?;
        Ok(())
    }
}

/// Implements [`Model`], [`Arm`] and the side role for an arm type with a
/// `stick` field.
macro_rules! pin_elbow_stick_arm {
    ($arm:ident, $side:ident) => {
        impl $arm {
            /// # Errors
            ///
            /// Fails before `define_objects`.
            pub fn upper_arm(&self) -> Result<RigidBody, BrimError> {
                Ok(self.stick.segments(self.node())?.upper_arm.clone())
            }

            /// # Errors
            ///
            /// Fails before `define_objects`.
            pub fn forearm(&self) -> Result<RigidBody, BrimError> {
                Ok(self.stick.segments(self.node())?.forearm.clone())
            }
        }

        impl Model for $arm {
            fn descriptions(&self) -> Descriptions {
                PinElbowStick::descriptions(self.node())
            }

            fn define_objects_hook(&mut self) -> Result<(), BrimError> {
                self.stick.define_objects(&mut self.base.node);
                Ok(())
            }

            fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
                self.stick.define_kinematics(self.node())
            }
        }

        impl Arm for $arm {
            fn shoulder(&self) -> Result<RigidBody, BrimError> {
                self.upper_arm()
            }

            fn shoulder_interpoint(&self) -> Result<Point, BrimError> {
                Ok(self.stick.segments(self.node())?.shoulder_interpoint.clone())
            }

            fn hand(&self) -> Result<RigidBody, BrimError> {
                self.forearm()
            }

            fn hand_interpoint(&self) -> Result<Point, BrimError> {
                Ok(self.stick.segments(self.node())?.hand_interpoint.clone())
            }
        }

        impl $side for $arm {}
    };
}

/// Left arm with a pin elbow joint.
#[derive(Debug, brim_core::Model)]
pub struct PinElbowStickLeftArm {
    #[brim(base)]
    base: ModelBase,
    stick: PinElbowStick,
}

pin_elbow_stick_arm!(PinElbowStickLeftArm, LeftArm);

/// Right arm with a pin elbow joint.
#[derive(Debug, brim_core::Model)]
pub struct PinElbowStickRightArm {
    #[brim(base)]
    base: ModelBase,
    stick: PinElbowStick,
}

pin_elbow_stick_arm!(PinElbowStickRightArm, RightArm);

/// Torque about the elbow, applied to the forearm and reacted on the upper
/// arm.
#[derive(Debug, brim_core::LoadGroup)]
#[brim(parent(PinElbowStickLeftArm, PinElbowStickRightArm))]
pub struct PinElbowStickArmTorque {
    #[brim(base)]
    base: LoadGroupBase,
}

impl LoadGroup for PinElbowStickArmTorque {
    fn descriptions(&self) -> Descriptions {
        let mut descriptions = Descriptions::new();
        if let (Ok(torque), Some(parent)) = (self.node().symbol("T_elbow"), self.parent_name()) {
            descriptions.insert(torque, format!("Elbow torque of {parent}."));
        }
        descriptions
    }

    fn define_objects_hook(&mut self, _parent: &dyn Node) -> Result<(), BrimError> {
        let node = &mut self.base.node;
        node.set_symbol("T_elbow", Expr::dynamic(&format!("{}_T_elbow", node.name())));
        Ok(())
    }

    fn define_loads_hook(&mut self, parent: &dyn Node) -> Result<(), BrimError> {
        let (upper_arm, forearm) = match downcast_parent::<PinElbowStickLeftArm>(&*self, parent) {
            Ok(arm) => (arm.upper_arm()?, arm.forearm()?),
            Err(_) => {
                let arm = downcast_parent::<PinElbowStickRightArm>(&*self, parent)?;
                (arm.upper_arm()?, arm.forearm()?)
            }
        };
        let actuator = TorqueActuator::new(
            self.node().symbol("T_elbow")?,
            upper_arm.y(),
            forearm.frame(),
            Some(upper_arm.frame()),
        );
        self.node().system_mut()?.add_actuators(&[actuator])?;
        Ok(())
    }
}
