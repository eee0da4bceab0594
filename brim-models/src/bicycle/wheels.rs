use brim_core::{BrimError, Descriptions, Model, ModelBase, Node};
use brim_mechanics::{Expr, Point, ReferenceFrame, RigidBody, System, Vector};

use crate::body::{InertiaLayout, body_descriptions, define_body};

/// A rigid wheel rotating about the y axis of its body.
pub trait Wheel: Model {
    /// # Errors
    ///
    /// Fails before `define_objects`.
    fn body(&self) -> Result<RigidBody, BrimError>;

    fn frame(&self) -> Result<ReferenceFrame, BrimError> {
        Ok(self.body()?.frame().clone())
    }

    /// Center of the wheel, which is also its center of mass.
    fn center(&self) -> Result<Point, BrimError> {
        Ok(self.body()?.masscenter().clone())
    }

    fn rotation_axis(&self) -> Result<Vector, BrimError> {
        Ok(self.body()?.y())
    }

    fn radius(&self) -> Result<Expr, BrimError> {
        self.node().symbol("r")
    }
}

fn not_defined(node: &dyn Node) -> BrimError {
    BrimError::StageOrder {
        node: node.name().to_string(),
        stage: "define_objects",
    }
}

/// Defines the body and radius shared by the wheel models.
fn define_wheel(model: &mut ModelBase) -> RigidBody {
    let node = &mut model.node;
    let body = define_body(node, InertiaLayout::Axisymmetric);
    node.set_symbol("r", node.prefixed_symbol("r"));
    node.set_system(System::from_newtonian(&body));
    body
}

fn wheel_descriptions(node: &brim_core::NodeBase) -> Descriptions {
    let mut descriptions = Descriptions::new();
    body_descriptions(node, &mut descriptions);
    if let Ok(radius) = node.symbol("r") {
        descriptions.insert(radius, "Radius of the wheel.".to_string());
    }
    descriptions
}

/// A wheel with an infinitely thin tire.
#[derive(Debug, brim_core::Model)]
pub struct KnifeEdgeWheel {
    #[brim(base)]
    base: ModelBase,
    body: Option<RigidBody>,
}

impl Model for KnifeEdgeWheel {
    fn descriptions(&self) -> Descriptions {
        wheel_descriptions(self.node())
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        self.body = Some(define_wheel(&mut self.base));
        Ok(())
    }
}

impl Wheel for KnifeEdgeWheel {
    fn body(&self) -> Result<RigidBody, BrimError> {
        self.body.clone().ok_or_else(|| not_defined(self))
    }
}

/// A wheel with a toroidal tire.
///
/// The crown of the tire is a circle of radius `tr` swept around the
/// center of the wheel at distance `r - tr`, so `r` remains the radius
/// measured to the outside of the tire.
#[derive(Debug, brim_core::Model)]
pub struct ToroidalWheel {
    #[brim(base)]
    base: ModelBase,
    body: Option<RigidBody>,
}

impl ToroidalWheel {
    /// # Errors
    ///
    /// Fails before `define_objects`.
    pub fn transverse_radius(&self) -> Result<Expr, BrimError> {
        self.node().symbol("tr")
    }
}

impl Model for ToroidalWheel {
    fn descriptions(&self) -> Descriptions {
        let mut descriptions = wheel_descriptions(self.node());
        if let Ok(tr) = self.transverse_radius() {
            descriptions.insert(
                tr,
                "Transverse radius of curvature of the crown of the wheel.".to_string(),
            );
        }
        descriptions
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        self.body = Some(define_wheel(&mut self.base));
        let node = &mut self.base.node;
        node.set_symbol("tr", node.prefixed_symbol("tr"));
        Ok(())
    }
}

impl Wheel for ToroidalWheel {
    fn body(&self) -> Result<RigidBody, BrimError> {
        self.body.clone().ok_or_else(|| not_defined(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knife_edge_wheel_rotates_about_its_y_axis() {
        let mut wheel = KnifeEdgeWheel::new("wheel").unwrap();
        assert!(wheel.radius().is_err());
        wheel.define_objects().unwrap();

        let body = wheel.body().unwrap();
        assert_eq!(wheel.rotation_axis().unwrap(), body.frame().y());
        assert_eq!(wheel.center().unwrap().name(), "wheel_masscenter");
        assert_eq!(wheel.radius().unwrap(), Expr::symbol("wheel_r"));
        let keys: Vec<_> = wheel.node().symbols().map(|(k, _)| k).collect();
        assert_eq!(keys, ["mass", "ixx", "iyy", "r"]);
        assert_eq!(wheel.descriptions().len(), 4);
    }

    #[test]
    fn toroidal_wheel_adds_a_transverse_radius() {
        let mut wheel = ToroidalWheel::new("front_wheel").unwrap();
        wheel.define_objects().unwrap();
        assert_eq!(
            wheel.transverse_radius().unwrap(),
            Expr::symbol("front_wheel_tr")
        );
        assert_eq!(
            wheel.get_description(&Expr::symbol("front_wheel_tr")).as_deref(),
            Some("Transverse radius of curvature of the crown of the wheel.")
        );
        assert_eq!(wheel.descriptions().len(), 5);
    }
}
