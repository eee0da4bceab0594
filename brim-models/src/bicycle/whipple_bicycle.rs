use std::collections::HashMap;

use brim_core::{BrimError, Connection, Descriptions, Model, ModelBase, Node, Shared, Slot};
use brim_mechanics::{Expr, PinJoint, PinJointGeometry, Point, System};
use tracing::debug;

use crate::{FrontFrame, Ground, RearFrame, Tire, Wheel};

/// A bicycle of two rigid frames and two wheels, rolling on the ground.
pub trait WhippleBicycle: Model {
    /// Generalized coordinates, empty before `define_objects`.
    fn coordinates(&self) -> &[Expr] {
        &self.node().q
    }

    /// Generalized speeds, empty before `define_objects`.
    fn speeds(&self) -> &[Expr] {
        &self.node().u
    }

    /// # Errors
    ///
    /// Fails if the rear tire is missing or its objects are not defined.
    fn rear_contact_point(&self) -> Result<Point, BrimError>;

    /// # Errors
    ///
    /// Fails if the front tire is missing or its objects are not defined.
    fn front_contact_point(&self) -> Result<Point, BrimError>;

    /// # Errors
    ///
    /// Fails if the rear frame has not been set.
    fn rear_frame_submodel(&self) -> Result<Shared<dyn RearFrame>, BrimError>;

    /// # Errors
    ///
    /// Fails if the front frame has not been set.
    fn front_frame_submodel(&self) -> Result<Shared<dyn FrontFrame>, BrimError>;
}

/// Whipple bicycle in Moore's parametrization.
///
/// The coordinates are the position of the rear contact point along the
/// tangent vectors of the ground (`q1`, `q2`), the yaw, roll and pitch of
/// the rear frame (`q3`, `q4`, `q5`, body-fixed `zxy`), the rear wheel
/// angle (`q6`), the steer angle (`q7`) and the front wheel angle (`q8`).
/// The rear contact point is on the ground by construction; the front
/// contact point is kept there by a holonomic constraint added by the
/// front tire.
#[derive(Debug, brim_core::Model)]
#[brim(convention = "moore")]
pub struct WhippleBicycleMoore {
    #[brim(base)]
    base: ModelBase,
    #[brim(submodel(description = "Submodel of the ground."))]
    ground: Slot<dyn Ground>,
    #[brim(submodel(description = "Submodel of the rear frame."))]
    rear_frame: Slot<dyn RearFrame>,
    #[brim(submodel(description = "Submodel of the front frame."))]
    front_frame: Slot<dyn FrontFrame>,
    #[brim(submodel(description = "Submodel of the rear wheel."))]
    rear_wheel: Slot<dyn Wheel>,
    #[brim(submodel(description = "Submodel of the front wheel."))]
    front_wheel: Slot<dyn Wheel>,
    #[brim(connection(description = "Tire model for the rear wheel."))]
    rear_tire: Slot<dyn Tire>,
    #[brim(connection(description = "Tire model for the front wheel."))]
    front_tire: Slot<dyn Tire>,
}

impl WhippleBicycleMoore {
    fn coordinate_descriptions(&self) -> [String; 8] {
        let name = self.name();
        [
            format!(
                "Perpendicular distance along ground.x to the rear contact point in the \
                 ground plane of {name}."
            ),
            format!(
                "Perpendicular distance along ground.y to the rear contact point in the \
                 ground plane of {name}."
            ),
            format!("Yaw angle of the rear frame of {name}."),
            format!("Roll angle of the rear frame of {name}."),
            format!("Pitch angle of the rear frame of {name}."),
            format!("Rear wheel rotation angle of {name}."),
            format!("Steering rotation angle of {name}."),
            format!("Front wheel rotation angle of {name}."),
        ]
    }

    fn tires(&self) -> Result<[Shared<dyn Tire>; 2], BrimError> {
        Ok([self.require_rear_tire()?, self.require_front_tire()?])
    }
}

impl Model for WhippleBicycleMoore {
    fn descriptions(&self) -> Descriptions {
        let node = self.node();
        let mut descriptions = Descriptions::new();
        for (i, text) in self.coordinate_descriptions().into_iter().enumerate() {
            if let Some(u) = node.u.get(i) {
                descriptions.insert(
                    u.clone(),
                    format!("Generalized speed of the {}", text.to_lowercase()),
                );
            }
            if let Some(q) = node.q.get(i) {
                descriptions.insert(q.clone(), text);
            }
        }
        descriptions
    }

    fn define_connections_hook(&mut self) -> Result<(), BrimError> {
        let ground = self.require_ground()?;
        let wheels = [self.require_rear_wheel()?, self.require_front_wheel()?];
        for (tire, wheel) in self.tires()?.into_iter().zip(wheels) {
            let mut tire = tire.borrow_mut();
            tire.set_ground(ground.clone());
            tire.set_wheel(wheel);
        }
        Ok(())
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let ground = self.require_ground()?.borrow().body()?;
        let node = &mut self.base.node;
        node.q = node.prefixed_dynamicsymbols("q1:9");
        node.u = node.prefixed_dynamicsymbols("u1:9");
        node.set_system(System::from_newtonian(&ground));

        let [rear_tire, front_tire] = self.tires()?;
        rear_tire.borrow_mut().define_objects()?;
        rear_tire.borrow_mut().set_on_ground(true);
        front_tire.borrow_mut().define_objects()?;
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        let [rear_tire, front_tire] = self.tires()?;
        {
            let ground = self.require_ground()?;
            let rear_frame = self.require_rear_frame()?;
            let front_frame = self.require_front_frame()?;
            let rear_wheel = self.require_rear_wheel()?;
            let front_wheel = self.require_front_wheel()?;
            let ground = ground.borrow();
            let (rear_frame, front_frame) = (rear_frame.borrow(), front_frame.borrow());
            let (rear_wheel, front_wheel) = (rear_wheel.borrow(), front_wheel.borrow());

            let node = self.node();
            let (q, u) = (&node.q, &node.u);
            let frame = ground.frame()?;

            // Rear contact point in the ground plane.
            let contact = rear_tire.borrow().contact_point()?;
            ground.set_pos_point(&contact, [q[0].clone(), q[1].clone()])?;
            let [t0, t1] = ground.get_tangent_vectors(&contact)?;
            contact.set_vel(&frame, t0 * u[0].clone() + t1 * u[1].clone());

            let rear = rear_frame.frame()?;
            rear.orient_body_fixed(&frame, [q[2].clone(), q[3].clone(), q[4].clone()], "zxy")?;
            let rates: HashMap<Expr, Expr> =
                q.iter().zip(u).map(|(qi, ui)| (qi.dt(), ui.clone())).collect();
            rear.set_ang_vel(&frame, &rear.ang_vel_in(&frame)?.subs(&rates))?;

            let rear_wheel_hub = rear_frame.wheel_hub()?;
            let rear_steer_hub = rear_frame.steer_hub()?;
            let front_steer_hub = front_frame.steer_hub()?;
            let front_wheel_hub = front_frame.wheel_hub()?;
            let joints = [
                PinJoint::new(
                    &format!("{}_rear_wheel_joint", node.name()),
                    &rear_frame.body()?,
                    &rear_wheel.body()?,
                    q[5].clone(),
                    u[5].clone(),
                    PinJointGeometry {
                        parent_point: rear_wheel_hub.point(),
                        child_point: &rear_wheel.center()?,
                        parent_axis: rear_wheel_hub.axis(),
                        child_axis: &rear_wheel.rotation_axis()?,
                    },
                )?,
                PinJoint::new(
                    &format!("{}_steer_joint", node.name()),
                    &rear_frame.body()?,
                    &front_frame.body()?,
                    q[6].clone(),
                    u[6].clone(),
                    PinJointGeometry {
                        parent_point: rear_steer_hub.point(),
                        child_point: front_steer_hub.point(),
                        parent_axis: rear_steer_hub.axis(),
                        child_axis: front_steer_hub.axis(),
                    },
                )?,
                PinJoint::new(
                    &format!("{}_front_wheel_joint", node.name()),
                    &front_frame.body()?,
                    &front_wheel.body()?,
                    q[7].clone(),
                    u[7].clone(),
                    PinJointGeometry {
                        parent_point: front_wheel_hub.point(),
                        child_point: &front_wheel.center()?,
                        parent_axis: front_wheel_hub.axis(),
                        child_axis: &front_wheel.rotation_axis()?,
                    },
                )?,
            ];

            let kdes: Vec<Expr> = q[..5]
                .iter()
                .zip(&u[..5])
                .map(|(qi, ui)| qi.dt() - ui)
                .collect();
            let mut system = node.system_mut()?;
            system.add_coordinates(&q[..5], true)?;
            system.add_speeds(&u[..5], true)?;
            system.add_kdes(&kdes)?;
            system.add_joints(&joints)?;
            debug!(bicycle = node.name(), "defined frame orientations and joints");
        }
        rear_tire.borrow_mut().define_kinematics()?;
        front_tire.borrow_mut().define_kinematics()?;
        Ok(())
    }

    fn define_loads_hook(&mut self) -> Result<(), BrimError> {
        for tire in self.tires()? {
            tire.borrow_mut().define_loads()?;
        }
        Ok(())
    }

    fn define_constraints_hook(&mut self) -> Result<(), BrimError> {
        for tire in self.tires()? {
            tire.borrow_mut().define_constraints()?;
        }
        Ok(())
    }
}

impl WhippleBicycle for WhippleBicycleMoore {
    fn rear_contact_point(&self) -> Result<Point, BrimError> {
        self.require_rear_tire()?.borrow().contact_point()
    }

    fn front_contact_point(&self) -> Result<Point, BrimError> {
        self.require_front_tire()?.borrow().contact_point()
    }

    fn rear_frame_submodel(&self) -> Result<Shared<dyn RearFrame>, BrimError> {
        self.require_rear_frame()
    }

    fn front_frame_submodel(&self) -> Result<Shared<dyn FrontFrame>, BrimError> {
        self.require_front_frame()
    }
}
