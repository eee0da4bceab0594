use brim_core::{BrimError, Descriptions, Model, ModelBase, Node};
use brim_mechanics::{Point, ReferenceFrame, RigidBody, System};

use crate::body::{InertiaLayout, body_descriptions, define_body};

/// The torso of a rider, holding the shoulder joints.
pub trait Torso: Model {
    /// # Errors
    ///
    /// Fails before `define_objects`.
    fn body(&self) -> Result<RigidBody, BrimError>;

    fn frame(&self) -> Result<ReferenceFrame, BrimError> {
        Ok(self.body()?.frame().clone())
    }

    fn left_shoulder_point(&self) -> Result<Point, BrimError>;

    fn right_shoulder_point(&self) -> Result<Point, BrimError>;

    /// Frame in which the left shoulder joint is defined.
    fn left_shoulder_frame(&self) -> Result<ReferenceFrame, BrimError> {
        self.frame()
    }

    /// Frame in which the right shoulder joint is defined.
    fn right_shoulder_frame(&self) -> Result<ReferenceFrame, BrimError> {
        self.frame()
    }
}

const LENGTHS: [(&str, &str); 2] = [
    (
        "shoulder_width",
        "Distance between the left and right shoulder points.",
    ),
    (
        "shoulder_height",
        "Distance along the torso z axis from the shoulder points to the center of mass \
         of the torso.",
    ),
];

#[derive(Debug, Clone)]
struct Parts {
    body: RigidBody,
    left_shoulder_point: Point,
    right_shoulder_point: Point,
}

/// Rigid torso with the shoulders a shoulder width apart, above the center
/// of mass.
///
/// The z axis of the torso points downward, from the shoulders to the
/// pelvis.
#[derive(Debug, brim_core::Model)]
pub struct PlanarTorso {
    #[brim(base)]
    base: ModelBase,
    parts: Option<Parts>,
}

impl PlanarTorso {
    fn parts(&self) -> Result<&Parts, BrimError> {
        self.parts.as_ref().ok_or_else(|| BrimError::StageOrder {
            node: self.name().to_string(),
            stage: "define_objects",
        })
    }
}

impl Model for PlanarTorso {
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
        node.set_system(System::from_newtonian(&body));
        self.parts = Some(Parts {
            left_shoulder_point: Point::new(&format!("{}_LSP", node.name())),
            right_shoulder_point: Point::new(&format!("{}_RSP", node.name())),
            body,
        });
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let half_width = self.node().symbol("shoulder_width")? / 2.0;
        let height = self.node().symbol("shoulder_height")?;
        let parts = self.parts()?;
        let (y, z) = (parts.body.y(), parts.body.z());
        let masscenter = parts.body.masscenter();
        let up = -z * height;
        parts
            .left_shoulder_point
            .set_pos(masscenter, -&y * half_width.clone() + up.clone());
        parts
            .right_shoulder_point
            .set_pos(masscenter, y * half_width + up);
        Ok(())
    }
}

impl Torso for PlanarTorso {
    fn body(&self) -> Result<RigidBody, BrimError> {
        Ok(self.parts()?.body.clone())
    }

    fn left_shoulder_point(&self) -> Result<Point, BrimError> {
        Ok(self.parts()?.left_shoulder_point.clone())
    }

    fn right_shoulder_point(&self) -> Result<Point, BrimError> {
        Ok(self.parts()?.right_shoulder_point.clone())
    }
}

#[cfg(test)]
mod tests {
    use brim_core::{AnyNode, ModelHandle, shared, testing::check_descriptions};
    use brim_mechanics::Expr;

    use super::*;

    #[test]
    fn shoulders_are_above_the_center_of_mass() {
        let mut torso = PlanarTorso::new("torso").unwrap();
        torso.define_all().unwrap();
        let body = torso.body().unwrap();
        let left = torso.left_shoulder_point().unwrap();
        let right = torso.right_shoulder_point().unwrap();

        let height = Expr::symbol("torso_shoulder_height");
        for point in [&left, &right] {
            let position = point.pos_from(body.masscenter()).unwrap();
            assert_eq!(position.dot(&body.z()).unwrap(), -&height);
        }
        assert_eq!(
            right.pos_from(&left).unwrap(),
            body.y() * Expr::symbol("torso_shoulder_width")
        );
        assert_eq!(torso.left_shoulder_frame().unwrap(), *body.frame());
    }

    #[test]
    fn every_parameter_is_described() {
        let torso = shared(PlanarTorso::new("torso").unwrap());
        let node = AnyNode::Model(ModelHandle::new(torso.clone()));
        assert!(check_descriptions(&node).unwrap().is_empty());
        assert_eq!(torso.borrow().descriptions().len(), 7);
    }
}
