//! A disc rolling on the ground, the smallest model exercising a tire.

use std::collections::HashMap;

use brim_core::{
    BrimError, Connection, Descriptions, LoadGroup, LoadGroupBase, Model, ModelBase, Node, Slot,
    downcast_parent,
};
use brim_mechanics::{
    Expr, Inertia, Load, MechanicsError, Point, ReferenceFrame, RigidBody, System,
    TorqueActuator, Vector, dynamicsymbols,
};

use crate::{Ground, Tire, Wheel};

/// A wheel rolling on the ground without a frame attached to it.
///
/// The coordinates are the position of the contact point along the tangent
/// vectors of the ground (`q1`, `q2`) and the yaw, roll and pitch of the
/// disc (`q3`, `q4`, `q5`, body-fixed `zxy`).
#[derive(Debug, brim_core::Model)]
pub struct RollingDisc {
    #[brim(base)]
    base: ModelBase,
    #[brim(submodel(description = "Ground model."))]
    ground: Slot<dyn Ground>,
    #[brim(submodel(description = "Disc model."))]
    disc: Slot<dyn Wheel>,
    #[brim(connection(description = "Tire model."))]
    tire: Slot<dyn Tire>,
}

const COORDINATES: [&str; 5] = [
    "Perpendicular distance along ground.x to the contact point in the ground plane.",
    "Perpendicular distance along ground.y to the contact point in the ground plane.",
    "Yaw angle of the disc.",
    "Roll angle of the disc.",
    "Pitch angle of the disc.",
];

impl Model for RollingDisc {
    fn descriptions(&self) -> Descriptions {
        let node = self.node();
        let mut descriptions = Descriptions::new();
        for (i, text) in COORDINATES.into_iter().enumerate() {
            if let Some(q) = node.q.get(i) {
                descriptions.insert(q.clone(), text.to_string());
            }
            if let Some(u) = node.u.get(i) {
                descriptions.insert(
                    u.clone(),
                    format!("Generalized speed of the {}", text.to_lowercase()),
                );
            }
        }
        descriptions
    }

    fn define_connections_hook(&mut self) -> Result<(), BrimError> {
        let tire = self.require_tire()?;
        let mut tire = tire.borrow_mut();
        tire.set_ground(self.require_ground()?);
        tire.set_wheel(self.require_disc()?);
        Ok(())
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let ground = self.require_ground()?.borrow().body()?;
        let node = &mut self.base.node;
        node.q = node.prefixed_dynamicsymbols("q1:6");
        node.u = node.prefixed_dynamicsymbols("u1:6");
        node.set_system(System::from_newtonian(&ground));
        self.require_tire()?.borrow_mut().define_objects()
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let tire = self.require_tire()?;
        {
            let ground = self.require_ground()?;
            let disc = self.require_disc()?;
            let (ground, disc) = (ground.borrow(), disc.borrow());
            let node = self.node();
            let (q, u) = (&node.q, &node.u);
            let frame = ground.frame()?;

            let disc_frame = disc.frame()?;
            disc_frame.orient_body_fixed(&frame, [q[2].clone(), q[3].clone(), q[4].clone()], "zxy")?;
            let rates: HashMap<Expr, Expr> =
                q.iter().zip(u).map(|(qi, ui)| (qi.dt(), ui.clone())).collect();
            disc_frame.set_ang_vel(&frame, &disc_frame.ang_vel_in(&frame)?.subs(&rates))?;

            let contact = tire.borrow().contact_point()?;
            ground.set_pos_point(&contact, [q[0].clone(), q[1].clone()])?;
            let [t0, t1] = ground.get_tangent_vectors(&contact)?;
            contact.set_vel(&frame, t0 * u[0].clone() + t1 * u[1].clone());

            let kdes: Vec<Expr> = q.iter().zip(u).map(|(qi, ui)| qi.dt() - ui).collect();
            let mut system = node.system_mut()?;
            system.add_coordinates(q, true)?;
            system.add_speeds(u, true)?;
            system.add_kdes(&kdes)?;
        }
        tire.borrow_mut().define_kinematics()
    }

    fn define_loads_hook(&mut self) -> Result<(), BrimError> {
        self.require_tire()?.borrow_mut().define_loads()
    }

    fn define_constraints_hook(&mut self) -> Result<(), BrimError> {
        self.require_tire()?.borrow_mut().define_constraints()
    }
}

/// Torque driving the disc about its rotation axis, reacted on the ground.
#[derive(Debug, brim_core::LoadGroup)]
#[brim(parent(RollingDisc))]
pub struct DriveTorque {
    #[brim(base)]
    base: LoadGroupBase,
}

impl LoadGroup for DriveTorque {
    fn descriptions(&self) -> Descriptions {
        let mut descriptions = Descriptions::new();
        if let Ok(torque) = self.node().symbol("T") {
            descriptions.insert(
                torque,
                "Drive torque about the rotation axis of the disc.".to_string(),
            );
        }
        descriptions
    }

    fn define_objects_hook(&mut self, _parent: &dyn Node) -> Result<(), BrimError> {
        let node = &mut self.base.node;
        node.set_symbol("T", Expr::dynamic(&format!("{}_T", node.name())));
        Ok(())
    }

    fn define_loads_hook(&mut self, parent: &dyn Node) -> Result<(), BrimError> {
        let rolling_disc = downcast_parent::<RollingDisc>(&*self, parent)?;
        let ground = rolling_disc.require_ground()?;
        let disc = rolling_disc.require_disc()?;
        let (ground, disc) = (ground.borrow(), disc.borrow());
        let actuator = TorqueActuator::new(
            self.node().symbol("T")?,
            disc.rotation_axis()?,
            &disc.frame()?,
            Some(&ground.frame()?),
        );
        self.node().system_mut()?.add_actuators(&[actuator])?;
        Ok(())
    }
}

/// Builds the rolling disc directly on the mechanics layer.
///
/// The disc has mass `m`, radius `r` and inertia `ixx, iyy, ixx`; gravity
/// `g` acts along the z axis of the ground, which is the downward
/// direction. It uses the same coordinates as [`RollingDisc`], without a
/// prefix, with `u1` and `u2` dependent.
///
/// # Errors
///
/// Fails only if the kinematics cannot be formed, which indicates a bug.
pub fn rolling_disc_manual() -> Result<System, MechanicsError> {
    let q = dynamicsymbols("q1:6");
    let u = dynamicsymbols("u1:6");
    let rates: HashMap<Expr, Expr> = q
        .iter()
        .zip(&u)
        .map(|(qi, ui)| (qi.dt(), ui.clone()))
        .collect();

    let ground_frame = ReferenceFrame::new("ground_frame");
    let ground = RigidBody::with_parts(
        "ground",
        Point::new("ground_masscenter"),
        ground_frame.clone(),
        Expr::zero(),
        Inertia::new(&ground_frame, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
    );
    let disc_frame = ReferenceFrame::new("disc_frame");
    let (ixx, iyy) = (Expr::symbol("ixx"), Expr::symbol("iyy"));
    let disc = RigidBody::with_parts(
        "disc",
        Point::new("disc_masscenter"),
        disc_frame.clone(),
        Expr::symbol("m"),
        Inertia::new(&disc_frame, ixx.clone(), iyy, ixx, 0.0, 0.0, 0.0),
    );
    ground.masscenter().set_vel(&ground_frame, Vector::zero());
    disc.masscenter().set_vel(&disc_frame, Vector::zero());

    // Lean and heading first, then the spin about the axle.
    let int_frame = ReferenceFrame::new("int_frame");
    int_frame.orient_body_fixed(&ground_frame, [q[2].clone(), q[3].clone(), Expr::zero()], "zxy")?;
    disc_frame.orient_axis(&int_frame, &int_frame.y(), q[4].clone())?;
    int_frame.set_ang_vel(&ground_frame, &int_frame.ang_vel_in(&ground_frame)?.subs(&rates))?;
    disc_frame.set_ang_vel(&int_frame, &disc_frame.ang_vel_in(&int_frame)?.subs(&rates))?;

    let (x, y) = (ground_frame.x(), ground_frame.y());
    let contact = ground.masscenter().locatenew(
        "contact_point",
        x.clone() * q[0].clone() + y.clone() * q[1].clone(),
    );
    contact.set_vel(&ground_frame, x.clone() * u[0].clone() + y.clone() * u[1].clone());
    disc.masscenter()
        .set_pos(&contact, int_frame.z() * -Expr::symbol("r"));

    let kdes: Vec<Expr> = q.iter().zip(&u).map(|(qi, ui)| qi.dt() - ui).collect();
    let omega = disc_frame.ang_vel_in(&ground_frame)?;
    let v0 = disc.masscenter().vel(&ground_frame)?
        + omega.cross(&contact.pos_from(disc.masscenter())?)?;
    let nonholonomic = [v0.dot(&x)?, v0.dot(&y)?];

    let mut system = System::from_newtonian(&ground);
    system.add_coordinates(&q, true)?;
    system.add_speeds(&u[2..], true)?;
    system.add_speeds(&u[..2], false)?;
    system.add_kdes(&kdes)?;
    system.add_nonholonomic_constraints(&nonholonomic)?;
    system.add_bodies(&[disc.clone().into()])?;
    let weight = disc.mass() * Expr::symbol("g");
    system.add_loads(&[Load::force(disc.masscenter(), ground_frame.z() * weight)])?;
    Ok(system)
}
