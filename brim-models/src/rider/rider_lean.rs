use brim_core::{
    BrimError, Connection, ConnectionBase, Descriptions, Model, ModelBase, Node, Slot,
};
use brim_mechanics::{PinJoint, PinJointGeometry, Point, ReferenceFrame, RigidBody, System, Vector};

use crate::RearFrame;
use crate::body::{InertiaLayout, body_descriptions, define_body};

fn invalid_lean_axis(owner: &str, frame: &ReferenceFrame) -> BrimError {
    BrimError::InvalidGeometry {
        owner: owner.to_string(),
        property: "lean axis",
        reason: format!("it cannot be expressed in the frame {}", frame.name()),
    }
}

#[derive(Debug, Clone)]
struct Parts {
    body: RigidBody,
    lean_point: Point,
    lean_axis: Vector,
}

/// A rider reduced to one rigid body leaning about an axis through the
/// lean point.
#[derive(Debug, brim_core::Model)]
pub struct RiderLean {
    #[brim(base)]
    base: ModelBase,
    parts: Option<Parts>,
}

impl RiderLean {
    fn parts(&self) -> Result<&Parts, BrimError> {
        self.parts.as_ref().ok_or_else(|| BrimError::StageOrder {
            node: self.name().to_string(),
            stage: "define_objects",
        })
    }

    /// # Errors
    ///
    /// Fails before `define_objects`.
    pub fn body(&self) -> Result<RigidBody, BrimError> {
        Ok(self.parts()?.body.clone())
    }

    /// Point about which the rider leans, fixed in the rider.
    pub fn lean_point(&self) -> Result<Point, BrimError> {
        Ok(self.parts()?.lean_point.clone())
    }

    /// Lean axis expressed in the rider frame, the rider x axis by default.
    pub fn lean_axis(&self) -> Result<Vector, BrimError> {
        Ok(self.parts()?.lean_axis.clone())
    }

    /// # Errors
    ///
    /// Fails before `define_objects` or if `axis` cannot be expressed in
    /// the rider frame.
    pub fn set_lean_axis(&mut self, axis: Vector) -> Result<(), BrimError> {
        let name = self.name().to_string();
        let parts = self.parts.as_mut().ok_or_else(|| BrimError::StageOrder {
            node: name.clone(),
            stage: "define_objects",
        })?;
        let frame = parts.body.frame();
        axis.to_matrix(frame)
            .map_err(|_| invalid_lean_axis(&name, frame))?;
        parts.lean_axis = axis;
        Ok(())
    }
}

impl Model for RiderLean {
    fn descriptions(&self) -> Descriptions {
        let node = self.node();
        let mut descriptions = Descriptions::new();
        body_descriptions(node, &mut descriptions);
        if let Ok(distance) = node.symbol("d_lp") {
            descriptions.insert(
                distance,
                "Distance of the lean point from the center of mass along the rider z axis."
                    .to_string(),
            );
        }
        descriptions
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let node = &mut self.base.node;
        let body = define_body(node, InertiaLayout::Sagittal);
        node.set_symbol("d_lp", node.prefixed_symbol("d_lp"));
        node.set_system(System::from_newtonian(&body));
        self.parts = Some(Parts {
            lean_point: Point::new(&format!("{}_lean_point", node.name())),
            lean_axis: body.x(),
            body,
        });
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let distance = self.node().symbol("d_lp")?;
        let parts = self.parts()?;
        parts
            .lean_point
            .set_pos(parts.body.masscenter(), parts.body.z() * distance);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct LeanSupport {
    lean_point: Point,
    lean_axis: Vector,
}

/// Pin joint between the rear frame and a [`RiderLean`], rotating about the
/// lean axis through a point fixed in the rear frame.
#[derive(Debug, brim_core::Connection)]
pub struct RiderLeanConnection {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Leaning rider model."))]
    rider: Slot<RiderLean>,
    #[brim(submodel(description = "Rear frame model."))]
    rear_frame: Slot<dyn RearFrame>,
    support: Option<LeanSupport>,
}

impl RiderLeanConnection {
    fn support(&self) -> Result<&LeanSupport, BrimError> {
        self.support.as_ref().ok_or_else(|| BrimError::StageOrder {
            node: self.name().to_string(),
            stage: "define_objects",
        })
    }

    /// Point about which the rider leans, fixed in the rear frame.
    pub fn lean_point(&self) -> Result<Point, BrimError> {
        Ok(self.support()?.lean_point.clone())
    }

    /// Lean axis expressed in the rear frame, the rear frame x axis by
    /// default.
    pub fn lean_axis(&self) -> Result<Vector, BrimError> {
        Ok(self.support()?.lean_axis.clone())
    }

    /// # Errors
    ///
    /// Fails before `define_objects` or if `axis` cannot be expressed in
    /// the rear frame.
    pub fn set_lean_axis(&mut self, axis: Vector) -> Result<(), BrimError> {
        let frame = self.require_rear_frame()?.borrow().frame()?;
        axis.to_matrix(&frame)
            .map_err(|_| invalid_lean_axis(self.name(), &frame))?;
        let name = self.name().to_string();
        let support = self.support.as_mut().ok_or(BrimError::StageOrder {
            node: name,
            stage: "define_objects",
        })?;
        support.lean_axis = axis;
        Ok(())
    }
}

impl Connection for RiderLeanConnection {
    fn descriptions(&self) -> Descriptions {
        let node = self.node();
        let mut descriptions = Descriptions::new();
        for (key, axis) in [("d_lp_x", "x"), ("d_lp_z", "z")] {
            if let Ok(distance) = node.symbol(key) {
                descriptions.insert(
                    distance,
                    format!(
                        "Distance of the lean point from the rear frame center of mass along \
                         the rear frame {axis} axis."
                    ),
                );
            }
        }
        if let (Some(q), Some(u)) = (node.q.first(), node.u.first()) {
            descriptions.insert(
                q.clone(),
                "Rider lean angle in the roll direction of the rear frame.".to_string(),
            );
            descriptions.insert(u.clone(), "Rider lean angular velocity.".to_string());
        }
        descriptions
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let rear = self.require_rear_frame()?.borrow().body()?;
        let node = &mut self.base.node;
        for key in ["d_lp_x", "d_lp_z"] {
            node.set_symbol(key, node.prefixed_symbol(key));
        }
        node.q = node.prefixed_dynamicsymbols("q_rl");
        node.u = node.prefixed_dynamicsymbols("u_rl");
        node.set_system(System::from_newtonian(&rear));
        self.support = Some(LeanSupport {
            lean_point: Point::new(&format!("{}_lean_point", node.name())),
            lean_axis: rear.x(),
        });
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let rear = self.require_rear_frame()?.borrow().body()?;
        let rider = self.require_rider()?;
        let rider = rider.borrow();
        let node = self.node();
        let support = self.support()?;
        support.lean_point.set_pos(
            rear.masscenter(),
            rear.x() * node.symbol("d_lp_x")? + rear.z() * node.symbol("d_lp_z")?,
        );
        let joint = PinJoint::new(
            &format!("{}_joint", node.name()),
            &rear,
            &rider.body()?,
            node.q[0].clone(),
            node.u[0].clone(),
            PinJointGeometry {
                parent_point: &support.lean_point,
                child_point: &rider.lean_point()?,
                parent_axis: &support.lean_axis,
                child_axis: &rider.lean_axis()?,
            },
        )?;
        node.system_mut()?.add_joints(&[joint])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use brim_core::{AnyNode, ConnectionHandle, merge_systems, shared, testing::check_descriptions};
    use brim_mechanics::{Expr, Values};

    use super::*;
    use crate::RigidRearFrameMoore;

    #[test]
    fn lean_axis_must_be_expressible_in_the_rider_frame() {
        let mut rider = RiderLean::new("rider").unwrap();
        assert!(rider.set_lean_axis(Vector::zero()).is_err());
        rider.define_all().unwrap();
        let body = rider.body().unwrap();
        assert_eq!(rider.lean_axis().unwrap(), body.x());

        let unrelated = ReferenceFrame::new("unrelated");
        assert!(matches!(
            rider.set_lean_axis(unrelated.x()),
            Err(BrimError::InvalidGeometry { property: "lean axis", .. })
        ));
        rider.set_lean_axis(body.z()).unwrap();
        assert_eq!(rider.lean_axis().unwrap(), body.z());
    }

    #[test]
    fn rider_falls_over_like_an_inverted_pendulum() {
        let rear = shared(RigidRearFrameMoore::new("rear_frame").unwrap());
        let rider = shared(RiderLean::new("rider").unwrap());
        rear.borrow_mut().define_all().unwrap();
        rider.borrow_mut().define_all().unwrap();

        let mut lean = RiderLeanConnection::new("rider_lean").unwrap();
        lean.set_rider(rider.clone());
        lean.set_rear_frame(rear.clone());
        lean.define_objects().unwrap();
        lean.define_kinematics().unwrap();

        let systems = [
            rear.borrow().to_system().unwrap(),
            rider.borrow().to_system().unwrap(),
            lean.node().system().unwrap().clone(),
        ];
        let mut system = merge_systems(&systems).unwrap();
        let rear_body = rear.borrow().body().unwrap();
        system
            .apply_uniform_gravity(&(rear_body.z() * Expr::symbol("g")))
            .unwrap();
        let eoms = system.form_eoms().unwrap();

        let (q, d, m, ixx, g) = (0.3, 0.5, 70.0, 10.0, 9.81);
        let mut values: Values = rear
            .borrow()
            .get_all_symbols()
            .into_iter()
            .chain(rider.borrow().get_all_symbols())
            .map(|symbol| (symbol, 1.0))
            .collect();
        values.extend([
            (lean.node().q[0].clone(), q),
            (lean.node().u[0].clone(), 0.0),
            (Expr::symbol("rider_lean_d_lp_x"), 0.2),
            (Expr::symbol("rider_lean_d_lp_z"), -0.4),
            (Expr::symbol("rider_d_lp"), d),
            (Expr::symbol("rider_mass"), m),
            (Expr::symbol("rider_ixx"), ixx),
            (Expr::symbol("g"), g),
        ]);

        let mass = eoms.mass_matrix_full(&values).unwrap();
        assert_relative_eq!(mass[(1, 1)], m * d * d + ixx, epsilon = 1e-9);
        let forcing = eoms.forcing_full(&values).unwrap();
        assert_relative_eq!(forcing[1], g * d * m * q.sin(), epsilon = 1e-9);
    }

    #[test]
    fn every_parameter_is_described() {
        let mut lean = RiderLeanConnection::new("rider_lean").unwrap();
        lean.set_rider(shared(RiderLean::new("rider").unwrap()));
        lean.set_rear_frame(shared(RigidRearFrameMoore::new("rear_frame").unwrap()));
        let lean = shared(lean);
        let node = AnyNode::Connection(ConnectionHandle::new(lean.clone()));
        assert!(check_descriptions(&node).unwrap().is_empty());
        assert_eq!(lean.borrow().descriptions().len(), 4);
    }
}
