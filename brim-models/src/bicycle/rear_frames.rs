use brim_core::{Attachment, BrimError, Descriptions, Hub, Model, ModelBase, Node};
use brim_mechanics::{Point, ReferenceFrame, RigidBody, System, Vector};

use crate::body::{InertiaLayout, body_descriptions, define_body};

/// The rear frame of a bicycle, holding the rear wheel and the steer axis.
pub trait RearFrame: Model {
    /// # Errors
    ///
    /// Fails before `define_objects`.
    fn body(&self) -> Result<RigidBody, BrimError>;

    fn frame(&self) -> Result<ReferenceFrame, BrimError> {
        Ok(self.body()?.frame().clone())
    }

    /// Attachment of the front frame, rotating about the steer axis.
    fn steer_hub(&self) -> Result<Hub, BrimError>;

    /// Attachment of the rear wheel, rotating about the wheel axle.
    fn wheel_hub(&self) -> Result<Hub, BrimError>;

    fn saddle(&self) -> Result<Attachment, BrimError>;

    fn bottom_bracket(&self) -> Result<Point, BrimError>;
}

const LENGTHS: [(&str, &str); 7] = [
    (
        "d1",
        "Perpendicular distance from the steer axis to the center of the rear wheel \
         (rear offset).",
    ),
    (
        "l1",
        "Distance in the rear frame x direction from the rear wheel center to the center \
         of mass of the rear frame.",
    ),
    (
        "l2",
        "Distance in the rear frame z direction from the rear wheel center to the center \
         of mass of the rear frame.",
    ),
    (
        "d4",
        "Distance in the rear frame x direction from the rear wheel center to the saddle.",
    ),
    (
        "d5",
        "Distance in the rear frame z direction from the rear wheel center to the saddle.",
    ),
    (
        "l_bbx",
        "Distance in the rear frame x direction from the rear wheel center to the bottom \
         bracket.",
    ),
    (
        "l_bbz",
        "Distance in the rear frame z direction from the rear wheel center to the bottom \
         bracket.",
    ),
];

#[derive(Debug, Clone)]
struct Parts {
    body: RigidBody,
    steer_hub: Hub,
    wheel_hub: Hub,
    saddle: Attachment,
    bottom_bracket: Point,
}

/// Rigid rear frame in Moore's parametrization.
///
/// The steer hub lies on the steer axis, at the foot of the perpendicular
/// through the rear wheel center. All other points are located from the
/// rear wheel center within the xz plane of the frame.
#[derive(Debug, brim_core::Model)]
#[brim(convention = "moore")]
pub struct RigidRearFrameMoore {
    #[brim(base)]
    base: ModelBase,
    parts: Option<Parts>,
}

impl RigidRearFrameMoore {
    fn parts(&self) -> Result<&Parts, BrimError> {
        self.parts.as_ref().ok_or_else(|| BrimError::StageOrder {
            node: self.name().to_string(),
            stage: "define_objects",
        })
    }
}

impl Model for RigidRearFrameMoore {
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
            saddle: Attachment::new(frame, point("saddle")),
            bottom_bracket: point("bottom_bracket"),
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
        let (x, z) = (frame.x(), frame.z());
        let center = parts.wheel_hub.point();

        parts
            .steer_hub
            .point()
            .set_pos(center, x.clone() * symbol("d1")?);
        let masscenter = parts.body.masscenter();
        masscenter.set_pos(center, x.clone() * symbol("l1")? + z.clone() * symbol("l2")?);
        masscenter.set_vel(frame, Vector::zero());
        parts
            .saddle
            .point()
            .set_pos(center, x.clone() * symbol("d4")? + z.clone() * symbol("d5")?);
        parts
            .bottom_bracket
            .set_pos(center, x * symbol("l_bbx")? + z * symbol("l_bbz")?);
        parts.bottom_bracket.set_vel(frame, Vector::zero());
        Ok(())
    }
}

impl RearFrame for RigidRearFrameMoore {
    fn body(&self) -> Result<RigidBody, BrimError> {
        Ok(self.parts()?.body.clone())
    }

    fn steer_hub(&self) -> Result<Hub, BrimError> {
        Ok(self.parts()?.steer_hub.clone())
    }

    fn wheel_hub(&self) -> Result<Hub, BrimError> {
        Ok(self.parts()?.wheel_hub.clone())
    }

    fn saddle(&self) -> Result<Attachment, BrimError> {
        Ok(self.parts()?.saddle.clone())
    }

    fn bottom_bracket(&self) -> Result<Point, BrimError> {
        Ok(self.parts()?.bottom_bracket.clone())
    }
}

#[cfg(test)]
mod tests {
    use brim_core::{AnyNode, ModelHandle, shared, testing::check_descriptions};
    use brim_mechanics::Expr;

    use super::*;

    #[test]
    fn hubs_are_fixed_in_the_rear_frame() {
        let mut frame = RigidRearFrameMoore::new("rear_frame").unwrap();
        assert!(frame.steer_hub().is_err());
        frame.define_all().unwrap();

        let body = frame.body().unwrap();
        let steer = frame.steer_hub().unwrap();
        let wheel = frame.wheel_hub().unwrap();
        assert_eq!(steer.axis(), &body.z());
        assert_eq!(wheel.axis(), &body.y());
        assert_eq!(
            steer.point().pos_from(wheel.point()).unwrap(),
            body.x() * Expr::symbol("rear_frame_d1")
        );
        for point in [steer.point(), wheel.point(), body.masscenter()] {
            assert!(point.vel(body.frame()).unwrap().is_zero());
        }
        let saddle = frame.saddle().unwrap();
        assert_eq!(saddle.frame(), body.frame());
        assert_eq!(
            saddle.point().pos_from(wheel.point()).unwrap(),
            body.x() * Expr::symbol("rear_frame_d4") + body.z() * Expr::symbol("rear_frame_d5")
        );
    }

    #[test]
    fn every_parameter_is_described() {
        let frame = shared(RigidRearFrameMoore::new("rear_frame").unwrap());
        let node = AnyNode::Model(ModelHandle::new(frame.clone()));
        assert!(check_descriptions(&node).unwrap().is_empty());
        assert_eq!(frame.borrow().descriptions().len(), 12);
    }
}
