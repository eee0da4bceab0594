use brim_core::{
    BrimError, Connection, ConnectionBase, Descriptions, LoadGroup, LoadGroupBase, Node, Shared,
    Slot, downcast_parent,
};
use brim_mechanics::{Expr, PinJoint, PinJointGeometry, Point, System, TorqueActuator, Vector};

use crate::{Pelvis, RearFrame};

/// A connection between the saddle of the rear frame and the pelvis.
pub trait Seat: Connection {
    fn set_rear_frame(&mut self, rear_frame: Shared<dyn RearFrame>);
    fn set_pelvis(&mut self, pelvis: Shared<dyn Pelvis>);
}

macro_rules! seat_role {
    ($seat:ident) => {
        impl Seat for $seat {
            fn set_rear_frame(&mut self, rear_frame: Shared<dyn RearFrame>) {
                self.rear_frame.set(rear_frame);
            }

            fn set_pelvis(&mut self, pelvis: Shared<dyn Pelvis>) {
                self.pelvis.set(pelvis);
            }
        }
    };
}

/// Places `{owner}_pelvis_interpoint` halfway between the hip points, the
/// point of the pelvis that sits on the saddle.
fn pelvis_interpoint(owner: &str, pelvis: &dyn Pelvis) -> Result<Point, BrimError> {
    let masscenter = pelvis.body()?.masscenter().clone();
    let offset = pelvis.left_hip_point()?.pos_from(&masscenter)?
        + pelvis.right_hip_point()?.pos_from(&masscenter)?;
    Ok(masscenter.locatenew(&format!("{owner}_pelvis_interpoint"), offset * 0.5))
}

/// Welds the pelvis to the saddle with a constant yaw, pitch and roll.
#[derive(Debug, brim_core::Connection)]
pub struct FixedSeat {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Rear frame model."))]
    rear_frame: Slot<dyn RearFrame>,
    #[brim(submodel(description = "Pelvis model."))]
    pelvis: Slot<dyn Pelvis>,
}

impl Connection for FixedSeat {
    fn descriptions(&self) -> Descriptions {
        let mut descriptions = Descriptions::new();
        for angle in ["yaw", "pitch", "roll"] {
            if let Ok(symbol) = self.node().symbol(angle) {
                descriptions.insert(
                    symbol,
                    format!("{} angle of the pelvis w.r.t. the rear frame.", capitalize(angle)),
                );
            }
        }
        descriptions
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let rear = self.require_rear_frame()?.borrow().body()?;
        let node = &mut self.base.node;
        for angle in ["yaw", "pitch", "roll"] {
            node.set_symbol(angle, node.prefixed_symbol(angle));
        }
        node.set_system(System::from_newtonian(&rear));
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let saddle = self.require_rear_frame()?.borrow().saddle()?;
        let pelvis = self.require_pelvis()?;
        let pelvis = pelvis.borrow();
        let node = self.node();
        let angles = [node.symbol("yaw")?, node.symbol("pitch")?, node.symbol("roll")?];
        pelvis.frame()?.orient_body_fixed(saddle.frame(), angles, "zyx")?;
        let interpoint = pelvis_interpoint(node.name(), &*pelvis)?;
        interpoint.set_pos(saddle.point(), Vector::zero());
        interpoint.set_vel(&pelvis.frame()?, Vector::zero());
        node.system_mut()?.add_bodies(&[pelvis.body()?.into()])?;
        Ok(())
    }
}

seat_role!(FixedSeat);

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
struct LeanAxis(Vector);

/// Lets the pelvis lean sideways about an axis through the saddle.
///
/// The lean axis lies in the sagittal plane of the rear frame, tilted by
/// `alpha` from its x axis towards its upward direction. At zero lean the
/// pelvis is aligned with the rear frame.
#[derive(Debug, brim_core::Connection)]
pub struct SideLeanSeat {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Rear frame model."))]
    rear_frame: Slot<dyn RearFrame>,
    #[brim(submodel(description = "Pelvis model."))]
    pelvis: Slot<dyn Pelvis>,
    lean_axis: Option<LeanAxis>,
}

impl SideLeanSeat {
    /// Lean axis expressed in the rear frame.
    ///
    /// # Errors
    ///
    /// Fails before `define_objects`.
    pub fn lean_axis(&self) -> Result<Vector, BrimError> {
        self.lean_axis
            .as_ref()
            .map(|axis| axis.0.clone())
            .ok_or_else(|| BrimError::StageOrder {
                node: self.name().to_string(),
                stage: "define_objects",
            })
    }
}

impl Connection for SideLeanSeat {
    fn descriptions(&self) -> Descriptions {
        let node = self.node();
        let mut descriptions = Descriptions::new();
        if let (Some(q), Some(u)) = (node.q.first(), node.u.first()) {
            descriptions.insert(q.clone(), "Lean angle.".to_string());
            descriptions.insert(u.clone(), "Angular lean velocity.".to_string());
        }
        if let Ok(alpha) = node.symbol("alpha") {
            descriptions.insert(alpha, "Angle of the rider lean axis.".to_string());
        }
        descriptions
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let rear = self.require_rear_frame()?.borrow().body()?;
        let node = &mut self.base.node;
        node.q = node.prefixed_dynamicsymbols("q");
        node.u = node.prefixed_dynamicsymbols("u");
        let alpha = node.prefixed_symbol("alpha");
        node.set_symbol("alpha", alpha.clone());
        node.set_system(System::from_newtonian(&rear));
        self.lean_axis = Some(LeanAxis(rear.x() * alpha.cos() - rear.z() * alpha.sin()));
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let rear_frame = self.require_rear_frame()?;
        let rear_frame = rear_frame.borrow();
        let (rear, saddle) = (rear_frame.body()?, rear_frame.saddle()?);
        let pelvis = self.require_pelvis()?;
        let pelvis = pelvis.borrow();
        let pelvis_body = pelvis.body()?;
        let node = self.node();

        let frame_axis = self.lean_axis()?;
        let components = frame_axis.to_matrix(rear.frame())?;
        let pelvis_axis = pelvis_body.x() * components[0].clone()
            + pelvis_body.y() * components[1].clone()
            + pelvis_body.z() * components[2].clone();
        let joint = PinJoint::new(
            &format!("{}_lean_joint", node.name()),
            &rear,
            &pelvis_body,
            node.q[0].clone(),
            node.u[0].clone(),
            PinJointGeometry {
                parent_point: saddle.point(),
                child_point: &pelvis_interpoint(node.name(), &*pelvis)?,
                parent_axis: &frame_axis,
                child_axis: &pelvis_axis,
            },
        )?;
        node.system_mut()?.add_joints(&[joint])?;
        Ok(())
    }
}

seat_role!(SideLeanSeat);

/// Torque about the lean axis of a [`SideLeanSeat`], acting on the pelvis
/// and reacting on the rear frame.
#[derive(Debug, brim_core::LoadGroup)]
#[brim(parent(SideLeanSeat))]
pub struct SideLeanSeatTorque {
    #[brim(base)]
    base: LoadGroupBase,
}

impl LoadGroup for SideLeanSeatTorque {
    fn descriptions(&self) -> Descriptions {
        let mut descriptions = Descriptions::new();
        if let (Ok(torque), Some(parent)) = (self.node().symbol("T"), self.parent_name()) {
            descriptions.insert(torque, format!("Side lean torque of {parent}."));
        }
        descriptions
    }

    fn define_objects_hook(&mut self, _parent: &dyn Node) -> Result<(), BrimError> {
        let node = &mut self.base.node;
        node.set_symbol("T", Expr::dynamic(&format!("{}_T", node.name())));
        Ok(())
    }

    fn define_loads_hook(&mut self, parent: &dyn Node) -> Result<(), BrimError> {
        let seat = downcast_parent::<SideLeanSeat>(&*self, parent)?;
        let pelvis = seat.require_pelvis()?.borrow().frame()?;
        let rear = seat.require_rear_frame()?.borrow().frame()?;
        let actuator = TorqueActuator::new(
            self.node().symbol("T")?,
            seat.lean_axis()?,
            &pelvis,
            Some(&rear),
        );
        self.node().system_mut()?.add_actuators(&[actuator])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use brim_core::{AnyNode, ConnectionHandle, LoadGroupHandle, Model, shared, testing::check_descriptions};
    use brim_mechanics::{Load, check_zero};

    use super::*;
    use crate::{PlanarPelvis, RigidRearFrameMoore};

    fn defined_parts() -> (Shared<RigidRearFrameMoore>, Shared<PlanarPelvis>) {
        let rear = shared(RigidRearFrameMoore::new("rear_frame").unwrap());
        let pelvis = shared(PlanarPelvis::new("pelvis").unwrap());
        rear.borrow_mut().define_all().unwrap();
        pelvis.borrow_mut().define_all().unwrap();
        (rear, pelvis)
    }

    #[test]
    fn fixed_seat_puts_the_hips_on_the_saddle() {
        let (rear, pelvis) = defined_parts();
        let mut seat = FixedSeat::new("seat").unwrap();
        Seat::set_rear_frame(&mut seat, rear.clone());
        Seat::set_pelvis(&mut seat, pelvis.clone());
        seat.define_objects().unwrap();
        seat.define_kinematics().unwrap();

        let saddle = rear.borrow().saddle().unwrap();
        let pelvis = pelvis.borrow();
        let body = pelvis.body().unwrap();
        assert!(body.frame().ang_vel_in(saddle.frame()).unwrap().is_zero());
        // The hip midpoint sits on the saddle point.
        let midpoint = pelvis.left_hip_point().unwrap().pos_from(saddle.point()).unwrap()
            + pelvis.right_hip_point().unwrap().pos_from(saddle.point()).unwrap();
        assert!(midpoint.is_zero());
        assert_eq!(seat.node().system().unwrap().bodies().len(), 2);
    }

    #[test]
    fn side_lean_seat_rotates_about_the_tilted_axis() {
        let (rear, pelvis) = defined_parts();
        let mut seat = SideLeanSeat::new("seat").unwrap();
        assert!(seat.lean_axis().is_err());
        Seat::set_rear_frame(&mut seat, rear.clone());
        Seat::set_pelvis(&mut seat, pelvis.clone());
        seat.define_objects().unwrap();
        seat.define_kinematics().unwrap();

        let rear_frame = rear.borrow().frame().unwrap();
        let pelvis_frame = pelvis.borrow().frame().unwrap();
        let alpha = Expr::symbol("seat_alpha");
        let axis = rear_frame.x() * alpha.cos() - rear_frame.z() * alpha.sin();
        assert_eq!(seat.lean_axis().unwrap(), axis);
        let omega = pelvis_frame.ang_vel_in(&rear_frame).unwrap();
        let expected = axis * seat.node().u[0].clone();
        assert!(
            (omega - expected)
                .to_matrix(&rear_frame)
                .unwrap()
                .iter()
                .all(check_zero)
        );
    }

    #[test]
    fn side_lean_torque_acts_on_the_pelvis() {
        let (rear, pelvis) = defined_parts();
        let seat = shared(SideLeanSeat::new("seat").unwrap());
        {
            let mut seat = seat.borrow_mut();
            Seat::set_rear_frame(&mut *seat, rear);
            Seat::set_pelvis(&mut *seat, pelvis.clone());
        }
        let torque = shared(SideLeanSeatTorque::new("lean_torque").unwrap());
        seat.borrow_mut()
            .add_load_groups(&[LoadGroupHandle::new(torque.clone())])
            .unwrap();
        let mut seat = seat.borrow_mut();
        seat.define_objects().unwrap();
        seat.define_kinematics().unwrap();
        seat.define_loads().unwrap();

        let system = torque.borrow().node().system().unwrap().clone();
        assert_eq!(system.actuators().len(), 1);
        let loads = system.actuators()[0].to_loads();
        let pelvis_frame = pelvis.borrow().frame().unwrap();
        assert!(matches!(&loads[0], Load::Torque { frame, .. } if *frame == pelvis_frame));
        assert_eq!(
            torque.borrow().descriptions()[&Expr::dynamic("lean_torque_T")],
            "Side lean torque of seat."
        );
    }

    #[test]
    fn every_parameter_is_described() {
        let mut seat = SideLeanSeat::new("seat").unwrap();
        Seat::set_rear_frame(&mut seat, shared(RigidRearFrameMoore::new("rear_frame").unwrap()));
        Seat::set_pelvis(&mut seat, shared(PlanarPelvis::new("pelvis").unwrap()));
        let node = AnyNode::Connection(ConnectionHandle::new(shared(seat)));
        assert!(check_descriptions(&node).unwrap().is_empty());

        let mut seat = FixedSeat::new("seat").unwrap();
        Seat::set_rear_frame(&mut seat, shared(RigidRearFrameMoore::new("rear_frame").unwrap()));
        Seat::set_pelvis(&mut seat, shared(PlanarPelvis::new("pelvis").unwrap()));
        let node = AnyNode::Connection(ConnectionHandle::new(shared(seat)));
        assert!(check_descriptions(&node).unwrap().is_empty());
    }
}
