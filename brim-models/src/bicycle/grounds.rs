use brim_core::{BrimError, Model, ModelBase, Node};
use brim_mechanics::{Expr, Inertia, Point, ReferenceFrame, RigidBody, System, Vector};

use crate::GroundNormal;

/// A surface the wheels of a vehicle roll on.
///
/// The ground body is the Newtonian body of the systems it takes part in.
pub trait Ground: Model {
    /// # Errors
    ///
    /// Fails before `define_objects`.
    fn body(&self) -> Result<RigidBody, BrimError>;

    /// Frame fixed to the ground.
    fn frame(&self) -> Result<ReferenceFrame, BrimError> {
        Ok(self.body()?.frame().clone())
    }

    /// Point fixed in the ground, with zero velocity in its frame.
    fn origin(&self) -> Result<Point, BrimError> {
        Ok(self.body()?.masscenter().clone())
    }

    /// Unit normal of the surface at `point`, pointing out of the ground.
    fn get_normal(&self, point: &Point) -> Result<Vector, BrimError>;

    /// Two unit vectors spanning the tangent plane at `point`.
    fn get_tangent_vectors(&self, point: &Point) -> Result<[Vector; 2], BrimError>;

    /// Positions `point` on the surface using two coordinates along the
    /// tangent vectors.
    fn set_pos_point(&self, point: &Point, position: [Expr; 2]) -> Result<(), BrimError>;
}

fn not_defined(node: &dyn Node) -> BrimError {
    BrimError::StageOrder {
        node: node.name().to_string(),
        stage: "define_objects",
    }
}

/// A flat ground whose normal is one of the axes of its frame.
#[derive(Debug, brim_core::Model)]
pub struct FlatGround {
    #[brim(base)]
    base: ModelBase,
    normal: GroundNormal,
    body: Option<RigidBody>,
}

impl FlatGround {
    /// Creates a ground with the given normal.
    ///
    /// # Errors
    ///
    /// Fails if `name` is not a valid identifier.
    pub fn with_normal(name: &str, normal: GroundNormal) -> Result<Self, BrimError> {
        let mut ground = Self::new(name)?;
        ground.normal = normal;
        Ok(ground)
    }

    pub fn normal(&self) -> GroundNormal {
        self.normal
    }

    pub fn set_normal(&mut self, normal: GroundNormal) {
        self.normal = normal;
    }
}

impl Model for FlatGround {
    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let name = self.name().to_string();
        let frame = ReferenceFrame::new(&format!("{name}_frame"));
        let origin = Point::new(&format!("{name}_origin"));
        // The ground never moves, so its mass and inertia do not matter.
        let inertia = Inertia::new(&frame, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let body = RigidBody::with_parts(&name, origin, frame, Expr::zero(), inertia);
        self.base.node.set_system(System::from_newtonian(&body));
        self.body = Some(body);
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let body = self.body()?;
        body.masscenter().set_vel(body.frame(), Vector::zero());
        Ok(())
    }
}

impl Ground for FlatGround {
    fn body(&self) -> Result<RigidBody, BrimError> {
        self.body.clone().ok_or_else(|| not_defined(self))
    }

    fn get_normal(&self, _point: &Point) -> Result<Vector, BrimError> {
        Ok(self.normal.vector(&self.frame()?))
    }

    fn get_tangent_vectors(&self, _point: &Point) -> Result<[Vector; 2], BrimError> {
        Ok(self.normal.tangent_vectors(&self.frame()?))
    }

    fn set_pos_point(&self, point: &Point, position: [Expr; 2]) -> Result<(), BrimError> {
        let [t0, t1] = self.get_tangent_vectors(point)?;
        let [p0, p1] = position;
        point.set_pos(&self.origin()?, t0 * p0 + t1 * p1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use brim_mechanics::dynamicsymbols;

    use super::*;

    #[test]
    fn ground_needs_its_objects() {
        let ground = FlatGround::new("ground").unwrap();
        assert_eq!(
            ground.origin().unwrap_err(),
            BrimError::StageOrder {
                node: "ground".to_string(),
                stage: "define_objects",
            }
        );
    }

    #[test]
    fn points_are_placed_in_the_ground_plane() {
        let mut ground = FlatGround::with_normal("ground", GroundNormal::PosY).unwrap();
        ground.define_objects().unwrap();
        let frame = ground.frame().unwrap();
        let origin = ground.origin().unwrap();
        assert_eq!(origin.name(), "ground_origin");

        let q = dynamicsymbols("q1:3");
        let point = Point::new("contact");
        ground
            .set_pos_point(&point, [q[0].clone(), q[1].clone()])
            .unwrap();
        let position = point.pos_from(&origin).unwrap();
        assert_eq!(position, frame.x() * q[0].clone() + frame.z() * q[1].clone());
        let normal = ground.get_normal(&point).unwrap();
        assert!(position.dot(&normal).unwrap().is_zero());
        assert_eq!(normal, frame.y());
    }

    #[test]
    fn origin_is_fixed_in_the_ground() {
        let mut ground = FlatGround::new("ground").unwrap();
        ground.define_all().unwrap();
        let body = ground.body().unwrap();
        assert!(body.masscenter().vel(body.frame()).unwrap().is_zero());
        assert_eq!(ground.normal(), GroundNormal::NegZ);
        let system = ground.to_system().unwrap();
        assert_eq!(system.frame(), body.frame());
        assert_eq!(system.bodies().len(), 1);
    }
}
