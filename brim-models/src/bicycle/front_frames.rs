use brim_core::{Attachment, BrimError, Descriptions, Hub, Model, ModelBase, Node};
use brim_mechanics::{Point, ReferenceFrame, RigidBody, System, Vector};

use crate::body::{InertiaLayout, body_descriptions, define_body};

/// The front frame of a bicycle: fork and handlebars.
pub trait FrontFrame: Model {
    /// # Errors
    ///
    /// Fails before `define_objects`.
    fn body(&self) -> Result<RigidBody, BrimError>;

    fn frame(&self) -> Result<ReferenceFrame, BrimError> {
        Ok(self.body()?.frame().clone())
    }

    /// Attachment to the rear frame, rotating about the steer axis.
    fn steer_hub(&self) -> Result<Hub, BrimError>;

    /// Attachment of the front wheel, rotating about the wheel axle.
    fn wheel_hub(&self) -> Result<Hub, BrimError>;

    fn left_hand_grip(&self) -> Result<Attachment, BrimError>;

    fn right_hand_grip(&self) -> Result<Attachment, BrimError>;
}

const LENGTHS: [(&str, &str); 7] = [
    ("d2", "Distance between wheels along the steer axis."),
    (
        "d3",
        "Perpendicular distance from the steer axis to the center of the front wheel \
         (fork offset).",
    ),
    (
        "l3",
        "Distance in the front frame x direction from the front wheel center to the \
         center of mass of the front frame.",
    ),
    (
        "l4",
        "Distance in the front frame z direction from the front wheel center to the \
         center of mass of the front frame.",
    ),
    (
        "d6",
        "Distance in the front frame x direction from the steer hub to the hand grips.",
    ),
    (
        "d7",
        "Half of the distance between the hand grips along the front frame y direction.",
    ),
    (
        "d8",
        "Distance in the front frame z direction from the steer hub to the hand grips.",
    ),
];

#[derive(Debug, Clone)]
struct Parts {
    body: RigidBody,
    steer_hub: Hub,
    wheel_hub: Hub,
    left_hand_grip: Attachment,
    right_hand_grip: Attachment,
}

/// Rigid front frame in Moore's parametrization.
#[derive(Debug, brim_core::Model)]
#[brim(convention = "moore")]
pub struct RigidFrontFrameMoore {
    #[brim(base)]
    base: ModelBase,
    parts: Option<Parts>,
}

impl RigidFrontFrameMoore {
    fn parts(&self) -> Result<&Parts, BrimError> {
        self.parts.as_ref().ok_or_else(|| BrimError::StageOrder {
            node: self.name().to_string(),
            stage: "define_objects",
        })
    }
}

impl Model for RigidFrontFrameMoore {
    fn descriptions(&self) -> Descriptions {
        let node = self.node();
        let mut descriptions = Descriptions::new();
        body_descriptions(node, &mut descriptions);
        for (key, text) in LENGTHS {
            if let Ok(symbol) = node.symbol(key) {
                descriptions.insert(symbol, text.to_string());
            }
        }
        descriptions
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let node = &mut self.base.node;
        let body = define_body(node, InertiaLayout::Sagittal);
        for (key, _) in LENGTHS {
            node.set_symbol(key, node.prefixed_symbol(key));
        }

        let frame = body.frame().clone();
        let point = |suffix: &str| Point::new(&format!("{}_{suffix}", body.name()));
        let parts = Parts {
            steer_hub: Hub::new(frame.clone(), point("steer_hub"), "z")?,
            wheel_hub: Hub::new(frame.clone(), point("wheel_hub"), "y")?,
            left_hand_grip: Attachment::new(frame.clone(), point("left_hand_grip")),
            right_hand_grip: Attachment::new(frame, point("right_hand_grip")),
            body: body.clone(),
        };
        node.set_system(System::from_newtonian(&body));
        self.parts = Some(parts);
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let symbol = |key: &str| self.node().symbol(key);
        let parts = self.parts()?;
        let frame = parts.body.frame();
        let (x, y, z) = (frame.x(), frame.y(), frame.z());
        let steer = parts.steer_hub.point();
        let center = parts.wheel_hub.point();

        center.set_pos(steer, x.clone() * symbol("d3")? + z.clone() * symbol("d2")?);
        let masscenter = parts.body.masscenter();
        masscenter.set_pos(center, x.clone() * symbol("l3")? + z.clone() * symbol("l4")?);
        masscenter.set_vel(frame, Vector::zero());

        let forward = x * symbol("d6")? + z * symbol("d8")?;
        let half_width = y * symbol("d7")?;
        parts
            .left_hand_grip
            .point()
            .set_pos(steer, forward.clone() - half_width.clone());
        parts
            .right_hand_grip
            .point()
            .set_pos(steer, forward + half_width);
        Ok(())
    }
}

impl FrontFrame for RigidFrontFrameMoore {
    fn body(&self) -> Result<RigidBody, BrimError> {
        Ok(self.parts()?.body.clone())
    }

    fn steer_hub(&self) -> Result<Hub, BrimError> {
        Ok(self.parts()?.steer_hub.clone())
    }

    fn wheel_hub(&self) -> Result<Hub, BrimError> {
        Ok(self.parts()?.wheel_hub.clone())
    }

    fn left_hand_grip(&self) -> Result<Attachment, BrimError> {
        Ok(self.parts()?.left_hand_grip.clone())
    }

    fn right_hand_grip(&self) -> Result<Attachment, BrimError> {
        Ok(self.parts()?.right_hand_grip.clone())
    }
}
