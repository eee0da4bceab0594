use brim_core::{BrimError, Descriptions, Model, ModelBase, Node};
use brim_mechanics::{Point, ReferenceFrame, RigidBody, System};

use crate::body::{InertiaLayout, body_descriptions, define_body};

/// The pelvis of a rider, holding the hip joints.
pub trait Pelvis: Model {
    /// # Errors
    ///
    /// Fails before `define_objects`.
    fn body(&self) -> Result<RigidBody, BrimError>;

    fn frame(&self) -> Result<ReferenceFrame, BrimError> {
        Ok(self.body()?.frame().clone())
    }

    /// Point where the left hip joint is located.
    fn left_hip_point(&self) -> Result<Point, BrimError>;

    /// Point where the right hip joint is located.
    fn right_hip_point(&self) -> Result<Point, BrimError>;
}

#[derive(Debug, Clone)]
struct Parts {
    body: RigidBody,
    left_hip_point: Point,
    right_hip_point: Point,
}

/// Rigid pelvis with the hip joints a hip width apart along the pelvis y
/// axis and the center of mass halfway.
#[derive(Debug, brim_core::Model)]
pub struct PlanarPelvis {
    #[brim(base)]
    base: ModelBase,
    parts: Option<Parts>,
}

impl PlanarPelvis {
    fn parts(&self) -> Result<&Parts, BrimError> {
        self.parts.as_ref().ok_or_else(|| BrimError::StageOrder {
            node: self.name().to_string(),
            stage: "define_objects",
        })
    }
}

impl Model for PlanarPelvis {
    fn descriptions(&self) -> Descriptions {
        let node = self.node();
        let mut descriptions = Descriptions::new();
        body_descriptions(node, &mut descriptions);
        if let Ok(width) = node.symbol("hip_width") {
            descriptions.insert(
                width,
                "Distance between the left and right hip points.".to_string(),
            );
        }
        descriptions
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let node = &mut self.base.node;
        let body = define_body(node, InertiaLayout::Sagittal);
        node.set_symbol("hip_width", node.prefixed_symbol("hip_width"));
        node.set_system(System::from_newtonian(&body));
        self.parts = Some(Parts {
            left_hip_point: Point::new(&format!("{}_LHP", node.name())),
            right_hip_point: Point::new(&format!("{}_RHP", node.name())),
            body,
        });
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let half_width = self.node().symbol("hip_width")? / 2.0;
        let parts = self.parts()?;
        let y = parts.body.y();
        let masscenter = parts.body.masscenter();
        parts
            .left_hip_point
            .set_pos(masscenter, -&y * half_width.clone());
        parts.right_hip_point.set_pos(masscenter, y * half_width);
        Ok(())
    }
}

impl Pelvis for PlanarPelvis {
    fn body(&self) -> Result<RigidBody, BrimError> {
        Ok(self.parts()?.body.clone())
    }

    fn left_hip_point(&self) -> Result<Point, BrimError> {
        Ok(self.parts()?.left_hip_point.clone())
    }

    fn right_hip_point(&self) -> Result<Point, BrimError> {
        Ok(self.parts()?.right_hip_point.clone())
    }
}

#[cfg(test)]
mod tests {
    use brim_core::{AnyNode, ModelHandle, shared, testing::check_descriptions};
    use brim_mechanics::Expr;

    use super::*;

    #[test]
    fn hip_points_are_mirrored() {
        let mut pelvis = PlanarPelvis::new("pelvis").unwrap();
        assert!(pelvis.left_hip_point().is_err());
        pelvis.define_all().unwrap();

        let body = pelvis.body().unwrap();
        let left = pelvis.left_hip_point().unwrap();
        let right = pelvis.right_hip_point().unwrap();
        assert_eq!(
            right.pos_from(&left).unwrap(),
            body.y() * Expr::symbol("pelvis_hip_width")
        );
        let midpoint = left.pos_from(body.masscenter()).unwrap()
            + right.pos_from(body.masscenter()).unwrap();
        assert!(midpoint.is_zero());
    }

    #[test]
    fn every_parameter_is_described() {
        let pelvis = shared(PlanarPelvis::new("pelvis").unwrap());
        let node = AnyNode::Model(ModelHandle::new(pelvis.clone()));
        assert!(check_descriptions(&node).unwrap().is_empty());
        assert_eq!(pelvis.borrow().descriptions().len(), 6);
    }
}
