//! Legs of a rider.

use brim_core::{
    BrimError, Descriptions, LoadGroup, LoadGroupBase, Model, ModelBase, Node, NodeBase,
    downcast_parent,
};
use brim_mechanics::{
    Expr, PinJoint, PinJointGeometry, Point, ReferenceFrame, RigidBody, System, TorqueActuator,
    Vector,
};

use crate::body::{InertiaLayout, define_part, part_descriptions};

/// A leg of a rider.
pub trait Leg: Model {
    /// Segment attached to the pelvis.
    ///
    /// # Errors
    ///
    /// Fails before `define_objects`.
    fn hip(&self) -> Result<RigidBody, BrimError>;

    /// Point where the leg is attached to the pelvis.
    fn hip_interpoint(&self) -> Result<Point, BrimError>;

    fn hip_interframe(&self) -> Result<ReferenceFrame, BrimError> {
        Ok(self.hip()?.frame().clone())
    }

    fn foot(&self) -> Result<RigidBody, BrimError>;

    /// Point where the foot is attached to a pedal.
    fn foot_interpoint(&self) -> Result<Point, BrimError>;

    fn foot_interframe(&self) -> Result<ReferenceFrame, BrimError> {
        Ok(self.foot()?.frame().clone())
    }
}

pub trait LeftLeg: Leg {}

pub trait RightLeg: Leg {}

const LENGTHS: [(&str, &str); 6] = [
    ("l_thigh", "Length of the thigh."),
    (
        "l_thigh_com",
        "Distance from the hip joint to the center of mass of the thigh.",
    ),
    ("l_shank", "Length of the shank."),
    (
        "l_shank_com",
        "Distance from the knee joint to the center of mass of the shank.",
    ),
    ("l_foot", "Length of the foot."),
    (
        "l_foot_com",
        "Distance from the ankle joint to the center of mass of the foot.",
    ),
];

#[derive(Debug, Clone)]
struct Segments {
    thigh: RigidBody,
    shank: RigidBody,
    foot: RigidBody,
    hip_interpoint: Point,
    foot_interpoint: Point,
}

/// Thigh and shank as sticks along their z axes and the foot along its x
/// axis, joined by a pin knee and a pin ankle.
#[derive(Debug, Default)]
struct TwoPinStick {
    segments: Option<Segments>,
}

impl TwoPinStick {
    fn segments(&self, node: &NodeBase) -> Result<&Segments, BrimError> {
        self.segments.as_ref().ok_or_else(|| BrimError::StageOrder {
            node: node.name().to_string(),
            stage: "define_objects",
        })
    }

    fn descriptions(node: &NodeBase) -> Descriptions {
        let mut descriptions = Descriptions::new();
        for part in ["thigh", "shank", "foot"] {
            part_descriptions(node, part, &mut descriptions);
        }
        for (key, text) in LENGTHS {
            if let Ok(symbol) = node.symbol(key) {
                descriptions.insert(symbol, text.to_string());
            }
        }
        for (i, joint) in ["knee", "ankle"].into_iter().enumerate() {
            if let (Some(q), Some(u)) = (node.q.get(i), node.u.get(i)) {
                descriptions.insert(q.clone(), format!("Flexion angle of the {joint}."));
                descriptions.insert(
                    u.clone(),
                    format!("Flexion angular velocity of the {joint}."),
                );
            }
        }
        descriptions
    }

    fn define_objects(&mut self, node: &mut NodeBase) {
        let thigh = define_part(node, "thigh", InertiaLayout::StickZ);
        let shank = define_part(node, "shank", InertiaLayout::StickZ);
        let foot = define_part(node, "foot", InertiaLayout::StickX);
        for (key, _) in LENGTHS {
            node.set_symbol(key, node.prefixed_symbol(key));
        }
        node.q = node.prefixed_dynamicsymbols("q_knee_flexion, q_ankle_flexion");
        node.u = node.prefixed_dynamicsymbols("u_knee_flexion, u_ankle_flexion");
        node.set_system(System::from_newtonian(&thigh));
        self.segments = Some(Segments {
            hip_interpoint: Point::new(&format!("{}_HP", node.name())),
            foot_interpoint: Point::new(&format!("{}_FP", node.name())),
            thigh,
            shank,
            foot,
        });
    }

    fn define_kinematics(&self, node: &NodeBase) -> Result<(), BrimError> {
        let symbol = |key: &str| node.symbol(key);
        let (l_t, l_tc) = (symbol("l_thigh")?, symbol("l_thigh_com")?);
        let (l_s, l_sc) = (symbol("l_shank")?, symbol("l_shank_com")?);
        let (l_f, l_fc) = (symbol("l_foot")?, symbol("l_foot_com")?);
        let s = self.segments(node)?;

        s.thigh
            .masscenter()
            .set_pos(&s.hip_interpoint, s.thigh.z() * l_tc.clone());
        s.foot
            .masscenter()
            .set_pos(&s.foot_interpoint, s.foot.x() * (&l_fc - &l_f));
        s.hip_interpoint.set_vel(s.thigh.frame(), Vector::zero());
        s.foot_interpoint.set_vel(s.foot.frame(), Vector::zero());

        let point = |body: &RigidBody, suffix: &str, offset: Vector| {
            body.masscenter()
                .locatenew(&format!("{}_{suffix}", node.name()), offset)
        };
        let knee_thigh = point(&s.thigh, "knee_thigh", s.thigh.z() * (l_t - l_tc));
        let knee_shank = point(&s.shank, "knee_shank", s.shank.z() * -l_sc.clone());
        let ankle_shank = point(&s.shank, "ankle_shank", s.shank.z() * (l_s - l_sc));
        let ankle_foot = point(&s.foot, "ankle_foot", s.foot.x() * -l_fc);

        let knee = PinJoint::new(
            &format!("{}_knee", node.name()),
            &s.thigh,
            &s.shank,
            node.q[0].clone(),
            node.u[0].clone(),
            PinJointGeometry {
                parent_point: &knee_thigh,
                child_point: &knee_shank,
                parent_axis: &-s.thigh.y(),
                child_axis: &-s.shank.y(),
            },
        )?;
        let ankle = PinJoint::new(
            &format!("{}_ankle", node.name()),
            &s.shank,
            &s.foot,
            node.q[1].clone(),
            node.u[1].clone(),
            PinJointGeometry {
                parent_point: &ankle_shank,
                child_point: &ankle_foot,
                parent_axis: &-s.shank.y(),
                child_axis: &-s.foot.y(),
            },
        )?;
        node.system_mut()?.add_joints(&[knee, ankle])?;
        Ok(())
    }
}

/// Implements [`Model`], [`Leg`] and the side role for a leg type with a
/// `stick` field.
macro_rules! two_pin_stick_leg {
    ($leg:ident, $side:ident) => {
        impl $leg {
            /// # Errors
            ///
            /// Fails before `define_objects`.
            pub fn thigh(&self) -> Result<RigidBody, BrimError> {
                Ok(self.stick.segments(self.node())?.thigh.clone())
            }

            /// # Errors
            ///
            /// Fails before `define_objects`.
            pub fn shank(&self) -> Result<RigidBody, BrimError> {
                Ok(self.stick.segments(self.node())?.shank.clone())
            }
        }

        impl Model for $leg {
            fn descriptions(&self) -> Descriptions {
                TwoPinStick::descriptions(self.node())
            }

            fn define_objects_hook(&mut self) -> Result<(), BrimError> {
                self.stick.define_objects(&mut self.base.node);
                Ok(())
            }

            fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
                self.stick.define_kinematics(self.node())
            }
        }

        impl Leg for $leg {
            fn hip(&self) -> Result<RigidBody, BrimError> {
                self.thigh()
            }

            fn hip_interpoint(&self) -> Result<Point, BrimError> {
                Ok(self.stick.segments(self.node())?.hip_interpoint.clone())
            }

            fn foot(&self) -> Result<RigidBody, BrimError> {
                Ok(self.stick.segments(self.node())?.foot.clone())
            }

            fn foot_interpoint(&self) -> Result<Point, BrimError> {
                Ok(self.stick.segments(self.node())?.foot_interpoint.clone())
            }
        }

        impl $side for $leg {}
    };
}

/// Left leg with a pin knee and a pin ankle.
#[derive(Debug, brim_core::Model)]
pub struct TwoPinStickLeftLeg {
    #[brim(base)]
    base: ModelBase,
    stick: TwoPinStick,
}

two_pin_stick_leg!(TwoPinStickLeftLeg, LeftLeg);

/// Right leg with a pin knee and a pin ankle.
#[derive(Debug, brim_core::Model)]
pub struct TwoPinStickRightLeg {
    #[brim(base)]
    base: ModelBase,
    stick: TwoPinStick,
}

two_pin_stick_leg!(TwoPinStickRightLeg, RightLeg);

/// Torques about the knee and the ankle of a two pin leg.
#[derive(Debug, brim_core::LoadGroup)]
#[brim(parent(TwoPinStickLeftLeg, TwoPinStickRightLeg))]
pub struct TwoPinLegTorque {
    #[brim(base)]
    base: LoadGroupBase,
}

impl LoadGroup for TwoPinLegTorque {
    fn descriptions(&self) -> Descriptions {
        let mut descriptions = Descriptions::new();
        let parent = self.parent_name().unwrap_or("the leg");
        for (key, joint) in [("T_knee", "Knee"), ("T_ankle", "Ankle")] {
            if let Ok(torque) = self.node().symbol(key) {
                descriptions.insert(torque, format!("{joint} torque of {parent}."));
            }
        }
        descriptions
    }

    fn define_objects_hook(&mut self, _parent: &dyn Node) -> Result<(), BrimError> {
        let node = &mut self.base.node;
        for key in ["T_knee", "T_ankle"] {
            node.set_symbol(key, Expr::dynamic(&format!("{}_{key}", node.name())));
        }
        Ok(())
    }

    fn define_loads_hook(&mut self, parent: &dyn Node) -> Result<(), BrimError> {
        let [thigh, shank, foot] = match downcast_parent::<TwoPinStickLeftLeg>(&*self, parent) {
            Ok(leg) => [leg.thigh()?, leg.shank()?, leg.foot()?],
            Err(_) => {
                let leg = downcast_parent::<TwoPinStickRightLeg>(&*self, parent)?;
                [leg.thigh()?, leg.shank()?, leg.foot()?]
            }
        };
        let actuators = [
            TorqueActuator::new(
                self.node().symbol("T_knee")?,
                -thigh.y(),
                shank.frame(),
                Some(thigh.frame()),
            ),
            TorqueActuator::new(
                self.node().symbol("T_ankle")?,
                -shank.y(),
                foot.frame(),
                Some(shank.frame()),
            ),
        ];
        self.node().system_mut()?.add_actuators(&actuators)?;
        Ok(())
    }
}
