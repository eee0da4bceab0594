//! Connections between a wheel and the ground.
//!
//! A tire owns the contact point of its wheel. It places the wheel center
//! relative to that point, applies the tire forces and moments, and adds
//! the no-slip and contact constraints selected by its [`TireConfig`].

use brim_core::{
    BrimError, Connection, ConnectionBase, Descriptions, Node, NodeBase, Shared, Slot,
};
use brim_mechanics::{Expr, Load, Point, System, Vector, check_zero};
use tracing::debug;

use crate::{FlatGround, Ground, KnifeEdgeWheel, ToroidalWheel, TireConfig, Wheel};

/// A connection describing the contact of a wheel with the ground.
pub trait Tire: Connection {
    fn set_ground(&mut self, ground: Shared<dyn Ground>);
    fn set_wheel(&mut self, wheel: Shared<dyn Wheel>);

    /// # Errors
    ///
    /// Fails before `define_objects`.
    fn contact_point(&self) -> Result<Point, BrimError>;

    /// Whether the contact point lies on the ground by construction.
    ///
    /// Unless set explicitly, this is computed from the position of the
    /// contact point relative to the ground origin, and is `false` if that
    /// position is unknown.
    fn on_ground(&self) -> bool;
    fn set_on_ground(&mut self, on_ground: bool);
}

const TIRE_LOADS: [&str; 5] = ["Fx", "Fy", "Fz", "Mx", "Mz"];

/// Contact state shared by the tire models.
#[derive(Debug, Default)]
struct ContactModel {
    contact_point: Option<Point>,
    on_ground: Option<bool>,
    upward_radial_axis: Option<Vector>,
    longitudinal_axis: Option<Vector>,
    lateral_axis: Option<Vector>,
}

fn invalid_axis(owner: &str, property: &'static str, reason: &str) -> BrimError {
    BrimError::InvalidGeometry {
        owner: owner.to_string(),
        property,
        reason: reason.to_string(),
    }
}

fn require_zero(
    value: Expr,
    owner: &str,
    property: &'static str,
    reason: &str,
) -> Result<(), BrimError> {
    if check_zero(&value) {
        Ok(())
    } else {
        Err(invalid_axis(owner, property, reason))
    }
}

impl ContactModel {
    fn contact_point(&self, node: &NodeBase) -> Result<Point, BrimError> {
        self.contact_point.clone().ok_or_else(|| BrimError::StageOrder {
            node: node.name().to_string(),
            stage: "define_objects",
        })
    }

    fn normal(&self, node: &NodeBase, ground: &dyn Ground) -> Result<Vector, BrimError> {
        ground.get_normal(&self.contact_point(node)?)
    }

    fn upward_radial_axis(
        &self,
        node: &NodeBase,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
    ) -> Result<Vector, BrimError> {
        if let Some(axis) = &self.upward_radial_axis {
            return Ok(axis.clone());
        }
        let normal = self.normal(node, ground)?;
        let rotation = wheel.rotation_axis()?;
        Ok(rotation.cross(&normal.cross(&rotation)?)?.normalize()?)
    }

    fn longitudinal_axis(
        &self,
        node: &NodeBase,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
    ) -> Result<Vector, BrimError> {
        if let Some(axis) = &self.longitudinal_axis {
            return Ok(axis.clone());
        }
        let normal = self.normal(node, ground)?;
        Ok(normal.cross(&wheel.rotation_axis()?)?.normalize()?)
    }

    fn lateral_axis(
        &self,
        node: &NodeBase,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
    ) -> Result<Vector, BrimError> {
        if let Some(axis) = &self.lateral_axis {
            return Ok(axis.clone());
        }
        let normal = self.normal(node, ground)?;
        let longitudinal = normal.cross(&wheel.rotation_axis()?)?;
        Ok(longitudinal.cross(&normal)?.normalize()?)
    }

    fn set_upward_radial_axis(
        &mut self,
        node: &NodeBase,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
        axis: Vector,
    ) -> Result<(), BrimError> {
        const PROPERTY: &str = "upward radial axis";
        let rotation = wheel.rotation_axis()?;
        let longitudinal = self.normal(node, ground)?.cross(&rotation)?;
        require_zero(axis.magnitude()? - 1.0, node.name(), PROPERTY, "it should be normalized")?;
        require_zero(
            axis.dot(&rotation)?,
            node.name(),
            PROPERTY,
            "it should be perpendicular to the rotation axis",
        )?;
        require_zero(
            axis.dot(&longitudinal)?,
            node.name(),
            PROPERTY,
            "it should be perpendicular to the longitudinal axis",
        )?;
        self.upward_radial_axis = Some(axis);
        Ok(())
    }

    fn set_longitudinal_axis(
        &mut self,
        node: &NodeBase,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
        axis: Vector,
    ) -> Result<(), BrimError> {
        const PROPERTY: &str = "longitudinal axis";
        require_zero(axis.magnitude()? - 1.0, node.name(), PROPERTY, "it should be normalized")?;
        require_zero(
            axis.dot(&wheel.rotation_axis()?)?,
            node.name(),
            PROPERTY,
            "it should be perpendicular to the rotation axis",
        )?;
        require_zero(
            axis.dot(&self.normal(node, ground)?)?,
            node.name(),
            PROPERTY,
            "it should be perpendicular to the normal vector",
        )?;
        self.longitudinal_axis = Some(axis);
        Ok(())
    }

    fn set_lateral_axis(
        &mut self,
        node: &NodeBase,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
        axis: Vector,
    ) -> Result<(), BrimError> {
        const PROPERTY: &str = "lateral axis";
        require_zero(axis.magnitude()? - 1.0, node.name(), PROPERTY, "it should be normalized")?;
        require_zero(
            axis.dot(&self.longitudinal_axis(node, ground, wheel)?)?,
            node.name(),
            PROPERTY,
            "it should be perpendicular to the longitudinal axis",
        )?;
        require_zero(
            axis.dot(&self.normal(node, ground)?)?,
            node.name(),
            PROPERTY,
            "it should be perpendicular to the normal vector",
        )?;
        self.lateral_axis = Some(axis);
        Ok(())
    }

    fn on_ground(&self, node: &NodeBase, ground: Option<&dyn Ground>) -> bool {
        if let Some(on_ground) = self.on_ground {
            return on_ground;
        }
        let Some(ground) = ground else {
            return false;
        };
        let distance = || -> Result<Expr, BrimError> {
            let point = self.contact_point(node)?;
            let normal = ground.get_normal(&point)?;
            Ok(point.pos_from(&ground.origin()?)?.dot(&normal)?)
        };
        distance().is_ok_and(|d| check_zero(&d))
    }

    fn camber_angle(
        &self,
        node: &NodeBase,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
    ) -> Result<Expr, BrimError> {
        let upward = self.upward_radial_axis(node, ground, wheel)?;
        let lateral = self.lateral_axis(node, ground, wheel)?;
        let normal = self.normal(node, ground)?;
        Ok(Expr::atan2(&upward.dot(&lateral)?, &upward.dot(&normal)?))
    }

    fn slip_angle(
        &self,
        node: &NodeBase,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
    ) -> Result<Expr, BrimError> {
        let velocity = self.contact_point(node)?.vel(&ground.frame()?)?;
        let lateral = self.lateral_axis(node, ground, wheel)?;
        let longitudinal = self.longitudinal_axis(node, ground, wheel)?;
        Ok(Expr::atan2(
            &velocity.dot(&lateral)?,
            &velocity.dot(&longitudinal)?,
        ))
    }

    fn descriptions(&self, node: &NodeBase, config: TireConfig) -> Descriptions {
        let name = node.name();
        let mut descriptions = Descriptions::new();
        if config.compute_normal_force {
            if let Some(uaux) = node.u_aux.first() {
                descriptions.insert(
                    uaux.clone(),
                    format!("Auxiliary generalized speed to determine the normal force of '{name}'."),
                );
            }
        }
        for key in TIRE_LOADS {
            let Ok(symbol) = node.symbol(key) else {
                continue;
            };
            let text = match key {
                "Fx" => format!("Longitudinal force of tire model '{name}'."),
                "Fy" => format!("Lateral force of tire model '{name}'."),
                "Fz" => format!("Normal force of tire model '{name}'."),
                "Mx" => format!("Rolling resistance moment of tire model '{name}'."),
                _ => format!("Self aligning moment of tire model '{name}'."),
            };
            descriptions.insert(symbol, text);
        }
        descriptions
    }

    fn define_objects(
        &mut self,
        node: &mut NodeBase,
        config: TireConfig,
        ground: &dyn Ground,
    ) -> Result<(), BrimError> {
        node.set_system(System::from_newtonian(&ground.body()?));
        self.contact_point = Some(Point::new(&format!("{}_contact_point", node.name())));
        self.upward_radial_axis = None;
        self.longitudinal_axis = None;
        self.lateral_axis = None;

        let keep = |key: &str| match key {
            "Fx" => !config.no_longitudinal_slip,
            "Fy" | "Mz" => !config.no_lateral_slip,
            "Fz" => config.compute_normal_force,
            _ => !(config.no_longitudinal_slip && config.no_lateral_slip),
        };
        for key in TIRE_LOADS {
            node.remove_symbol(key);
            if keep(key) {
                let symbol = Expr::dynamic(&format!("{}_{key}", node.name()));
                node.set_symbol(key, symbol);
            }
        }
        node.u_aux = if config.compute_normal_force {
            node.prefixed_dynamicsymbols("uaux_z")
        } else {
            Vec::new()
        };
        Ok(())
    }

    /// Places the wheel center relative to the contact point.
    fn set_pos_contact_point(
        &self,
        node: &NodeBase,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
    ) -> Result<(), BrimError> {
        let point = self.contact_point(node)?;
        let flat = ground.as_any().is::<FlatGround>();
        let offset = if flat && wheel.as_any().is::<KnifeEdgeWheel>() {
            self.upward_radial_axis(node, ground, wheel)? * wheel.radius()?
        } else if let (true, Some(toroidal)) =
            (flat, wheel.as_any().downcast_ref::<ToroidalWheel>())
        {
            self.upward_radial_axis(node, ground, wheel)? * wheel.radius()?
                + ground.get_normal(&point)? * toroidal.transverse_radius()?
        } else {
            return Err(BrimError::Unsupported(format!(
                "Computation of the contact point has not been implemented for the \
                 combination of {} and {}.",
                ground.type_name(),
                wheel.type_name()
            )));
        };
        wheel.center()?.set_pos(&point, offset);
        Ok(())
    }

    fn define_kinematics(
        &self,
        node: &NodeBase,
        config: TireConfig,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
    ) -> Result<(), BrimError> {
        self.set_pos_contact_point(node, ground, wheel)?;
        let point = self.contact_point(node)?;
        let frame = ground.frame()?;
        let origin = ground.origin()?;

        if config.no_longitudinal_slip
            && config.no_lateral_slip
            && point.position_neighbors().contains(&origin)
        {
            let center = wheel.center()?;
            let omega = wheel.frame()?.ang_vel_in(&frame)?;
            point.set_vel(&frame, Vector::zero());
            center.set_vel(&frame, -center.pos_from(&point)?.cross(&omega)?);
            debug!(tire = node.name(), "contact point fixed in the ground");
        }

        if config.compute_normal_force {
            let normal = self.normal(node, ground)?;
            let direction = if self.on_ground(node, Some(ground)) {
                normal
            } else {
                -normal
            };
            let speed = node.u_aux.first().cloned().ok_or_else(|| BrimError::StageOrder {
                node: node.name().to_string(),
                stage: "define_objects",
            })?;
            node.require_auxiliary_handler()?
                .borrow_mut()
                .add_noncontributing_force(&point, direction, speed, node.symbol("Fz")?)?;
        }
        Ok(())
    }

    fn define_loads(
        &self,
        node: &NodeBase,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
    ) -> Result<(), BrimError> {
        let symbol = |key: &str| node.symbol(key).ok();
        let mut loads = Vec::new();

        let mut force = Vector::zero();
        if let Some(fx) = symbol("Fx") {
            force = force + self.longitudinal_axis(node, ground, wheel)? * fx;
        }
        if let Some(fy) = symbol("Fy") {
            force = force + self.lateral_axis(node, ground, wheel)? * fy;
        }
        if !force.is_zero() {
            loads.push(Load::force(&self.contact_point(node)?, force));
        }

        let mut torque = Vector::zero();
        if let Some(mx) = symbol("Mx") {
            torque = torque + self.longitudinal_axis(node, ground, wheel)? * mx;
        }
        if let Some(mz) = symbol("Mz") {
            torque = torque - self.normal(node, ground)? * mz;
        }
        if !torque.is_zero() {
            loads.push(Load::torque(&wheel.frame()?, torque));
        }

        if !loads.is_empty() {
            node.system_mut()?.add_loads(&loads)?;
        }
        Ok(())
    }

    fn define_constraints(
        &self,
        node: &NodeBase,
        config: TireConfig,
        ground: &dyn Ground,
        wheel: &dyn Wheel,
    ) -> Result<(), BrimError> {
        let point = self.contact_point(node)?;
        let frame = ground.frame()?;
        let origin = ground.origin()?;
        let handler = node.require_auxiliary_handler()?;
        let handler = handler.borrow();
        let aux_point = handler.get_auxiliary_velocity(&point)?;

        if config.no_longitudinal_slip || config.no_lateral_slip {
            let directions = match (config.no_longitudinal_slip, config.no_lateral_slip) {
                (true, true) => ground.get_tangent_vectors(&point)?.to_vec(),
                (true, false) => vec![self.longitudinal_axis(node, ground, wheel)?],
                _ => vec![self.lateral_axis(node, ground, wheel)?],
            };
            let center = wheel.center()?;
            let omega = wheel.frame()?.ang_vel_in(&frame)?;
            let velocity = center.pos_from(&origin)?.dt(&frame)?
                + omega.cross(&point.pos_from(&center)?)?;
            let aux_velocity = handler.get_auxiliary_velocity(&center)?
                - handler.get_auxiliary_velocity(&origin)?
                + aux_point.clone();
            let constraints = directions
                .iter()
                .map(|d| -> Result<Expr, BrimError> {
                    Ok(velocity.dot(d)? + aux_velocity.dot(d)?)
                })
                .collect::<Result<Vec<_>, _>>()?;
            node.system_mut()?.add_nonholonomic_constraints(&constraints)?;
        }

        if !self.on_ground(node, Some(ground)) {
            let normal = self.normal(node, ground)?;
            let distance = point.pos_from(&origin)?.dot(&normal)?;
            let mut system = node.system_mut()?;
            system.add_holonomic_constraints(&[distance.clone()])?;
            let mut velocity_constraints = vec![distance.dt() + aux_point.dot(&normal)?];
            velocity_constraints.extend(system.nonholonomic_constraints().iter().cloned());
            system.set_velocity_constraints(velocity_constraints);
            debug!(tire = node.name(), "added holonomic contact constraint");
        }
        Ok(())
    }
}

/// Implements [`Connection`], [`Tire`] and the contact queries for a tire
/// type with `ground`, `wheel` and `contact` fields and a `config()` method.
macro_rules! contact_tire {
    ($tire:ident) => {
        impl $tire {
            /// Runs `f` with the ground and wheel of this tire.
            fn with_models<T>(
                &self,
                f: impl FnOnce(&dyn Ground, &dyn Wheel) -> Result<T, BrimError>,
            ) -> Result<T, BrimError> {
                let ground = self.require_ground()?;
                let wheel = self.require_wheel()?;
                let (ground, wheel) = (ground.borrow(), wheel.borrow());
                f(&*ground, &*wheel)
            }

            /// Wheel radial axis pointing from the contact point to the
            /// wheel center.
            ///
            /// # Errors
            ///
            /// Fails before `define_objects`.
            pub fn upward_radial_axis(&self) -> Result<Vector, BrimError> {
                self.with_models(|g, w| self.contact.upward_radial_axis(self.node(), g, w))
            }

            /// # Errors
            ///
            /// Fails before `define_objects`.
            pub fn longitudinal_axis(&self) -> Result<Vector, BrimError> {
                self.with_models(|g, w| self.contact.longitudinal_axis(self.node(), g, w))
            }

            /// # Errors
            ///
            /// Fails before `define_objects`.
            pub fn lateral_axis(&self) -> Result<Vector, BrimError> {
                self.with_models(|g, w| self.contact.lateral_axis(self.node(), g, w))
            }

            /// Overrides the upward radial axis, e.g. with a simpler but
            /// equivalent expression.
            ///
            /// # Errors
            ///
            /// Fails if `axis` is not a unit vector perpendicular to the
            /// rotation and longitudinal axes.
            pub fn set_upward_radial_axis(&mut self, axis: Vector) -> Result<(), BrimError> {
                let ground = self.require_ground()?;
                let wheel = self.require_wheel()?;
                let (ground, wheel) = (ground.borrow(), wheel.borrow());
                self.contact
                    .set_upward_radial_axis(&self.base.node, &*ground, &*wheel, axis)
            }

            /// # Errors
            ///
            /// Fails if `axis` is not a unit vector perpendicular to the
            /// rotation axis and the normal.
            pub fn set_longitudinal_axis(&mut self, axis: Vector) -> Result<(), BrimError> {
                let ground = self.require_ground()?;
                let wheel = self.require_wheel()?;
                let (ground, wheel) = (ground.borrow(), wheel.borrow());
                self.contact
                    .set_longitudinal_axis(&self.base.node, &*ground, &*wheel, axis)
            }

            /// # Errors
            ///
            /// Fails if `axis` is not a unit vector perpendicular to the
            /// longitudinal axis and the normal.
            pub fn set_lateral_axis(&mut self, axis: Vector) -> Result<(), BrimError> {
                let ground = self.require_ground()?;
                let wheel = self.require_wheel()?;
                let (ground, wheel) = (ground.borrow(), wheel.borrow());
                self.contact
                    .set_lateral_axis(&self.base.node, &*ground, &*wheel, axis)
            }

            /// Signed angle between the wheel plane and the normal.
            ///
            /// # Errors
            ///
            /// Fails before `define_objects`.
            pub fn camber_angle(&self) -> Result<Expr, BrimError> {
                self.with_models(|g, w| self.contact.camber_angle(self.node(), g, w))
            }

            /// Signed angle between the velocity of the contact point and
            /// the longitudinal axis.
            ///
            /// # Errors
            ///
            /// Fails before `define_kinematics`.
            pub fn slip_angle(&self) -> Result<Expr, BrimError> {
                self.with_models(|g, w| self.contact.slip_angle(self.node(), g, w))
            }
        }

        impl Connection for $tire {
            fn descriptions(&self) -> Descriptions {
                self.contact.descriptions(self.node(), self.config())
            }

            fn define_objects_hook(&mut self) -> Result<(), BrimError> {
                let config = self.config();
                let ground = self.require_ground()?;
                let ground = ground.borrow();
                self.contact
                    .define_objects(&mut self.base.node, config, &*ground)
            }

            fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
                let config = self.config();
                self.with_models(|g, w| {
                    self.contact.define_kinematics(self.node(), config, g, w)
                })
            }

            fn define_loads_hook(&mut self) -> Result<(), BrimError> {
                self.with_models(|g, w| self.contact.define_loads(self.node(), g, w))
            }

            fn define_constraints_hook(&mut self) -> Result<(), BrimError> {
                let config = self.config();
                self.with_models(|g, w| {
                    self.contact.define_constraints(self.node(), config, g, w)
                })
            }
        }

        impl Tire for $tire {
            fn set_ground(&mut self, ground: Shared<dyn Ground>) {
                self.ground.set(ground);
            }

            fn set_wheel(&mut self, wheel: Shared<dyn Wheel>) {
                self.wheel.set(wheel);
            }

            fn contact_point(&self) -> Result<Point, BrimError> {
                self.contact.contact_point(self.node())
            }

            fn on_ground(&self) -> bool {
                let ground = self.ground();
                let ground = ground.as_ref().map(|g| g.borrow());
                self.contact.on_ground(self.node(), ground.as_deref())
            }

            fn set_on_ground(&mut self, on_ground: bool) {
                self.contact.on_ground = Some(on_ground);
            }
        }
    };
}

/// A tire in permanent contact with a flat ground.
///
/// By default the normal force is computed as a noncontributing force and
/// the tire may slip in both directions, with symbolic tire forces and
/// moments. See [`TireConfig`] for the options.
#[derive(Debug, brim_core::Connection)]
pub struct InContactTire {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Submodel of the ground."))]
    ground: Slot<dyn Ground>,
    #[brim(submodel(description = "Submodel of the wheel."))]
    wheel: Slot<dyn Wheel>,
    config: TireConfig,
    contact: ContactModel,
}

impl InContactTire {
    /// # Errors
    ///
    /// Fails if `name` is not a valid identifier.
    pub fn with_config(name: &str, config: TireConfig) -> Result<Self, BrimError> {
        let mut tire = Self::new(name)?;
        tire.config = config;
        Ok(tire)
    }

    pub fn config(&self) -> TireConfig {
        self.config
    }

    /// Takes effect at the next `define_objects`.
    pub fn set_config(&mut self, config: TireConfig) {
        self.config = config;
    }
}

contact_tire!(InContactTire);

/// A tire rolling without slip, modeled with two nonholonomic constraints.
#[derive(Debug, brim_core::Connection)]
pub struct NonHolonomicTire {
    #[brim(base)]
    base: ConnectionBase,
    #[brim(submodel(description = "Submodel of the ground."))]
    ground: Slot<dyn Ground>,
    #[brim(submodel(description = "Submodel of the wheel."))]
    wheel: Slot<dyn Wheel>,
    contact: ContactModel,
}

impl NonHolonomicTire {
    pub fn config(&self) -> TireConfig {
        TireConfig::NON_HOLONOMIC
    }
}

contact_tire!(NonHolonomicTire);

#[cfg(test)]
mod tests {
    use brim_core::{ConnectionHandle, Model, ModelBase, shared, testing::ConnectionHarness};
    use brim_mechanics::{RigidBody, dynamicsymbols};

    use super::*;

    struct Fixture {
        ground: Shared<FlatGround>,
        wheel: Shared<KnifeEdgeWheel>,
    }

    fn fixture() -> Fixture {
        Fixture {
            ground: shared(FlatGround::new("ground").unwrap()),
            wheel: shared(KnifeEdgeWheel::new("wheel").unwrap()),
        }
    }

    /// Orients the wheel with yaw, roll and pitch and places its contact
    /// point in the ground plane.
    fn orient_wheel(f: &Fixture, contact_point: &Point) -> Vec<Expr> {
        let q = dynamicsymbols("q1:6");
        let ground = f.ground.borrow();
        let wheel = f.wheel.borrow();
        wheel
            .frame()
            .unwrap()
            .orient_body_fixed(
                &ground.frame().unwrap(),
                [q[2].clone(), q[3].clone(), q[4].clone()],
                "zxy",
            )
            .unwrap();
        ground
            .set_pos_point(contact_point, [q[0].clone(), q[1].clone()])
            .unwrap();
        q
    }

    #[test]
    fn symbols_follow_the_configuration() {
        let f = fixture();
        let mut tire = InContactTire::new("tire").unwrap();
        tire.set_ground(f.ground.clone());
        tire.set_wheel(f.wheel.clone());
        f.ground.borrow_mut().define_objects().unwrap();
        tire.define_objects().unwrap();
        let keys: Vec<_> = tire.node().symbols().map(|(k, _)| k).collect();
        assert_eq!(keys, ["Fx", "Fy", "Fz", "Mx", "Mz"]);
        assert_eq!(tire.node().u_aux, [Expr::dynamic("tire_uaux_z")]);
        assert_eq!(tire.descriptions().len(), 6);

        tire.set_config(TireConfig {
            compute_normal_force: false,
            no_longitudinal_slip: false,
            no_lateral_slip: true,
        });
        tire.define_objects().unwrap();
        let keys: Vec<_> = tire.node().symbols().map(|(k, _)| k).collect();
        assert_eq!(keys, ["Fx", "Mx"]);
        assert!(tire.node().u_aux.is_empty());

        let mut tire = NonHolonomicTire::new("nh").unwrap();
        tire.set_ground(f.ground.clone());
        tire.define_objects().unwrap();
        assert_eq!(tire.node().symbols().count(), 0);
        assert!(tire.descriptions().is_empty());
    }

    #[test]
    fn axes_follow_the_wheel_orientation() {
        let f = fixture();
        let mut tire = InContactTire::new("tire").unwrap();
        tire.set_ground(f.ground.clone());
        tire.set_wheel(f.wheel.clone());
        f.ground.borrow_mut().define_objects().unwrap();
        f.wheel.borrow_mut().define_objects().unwrap();
        tire.define_objects().unwrap();
        orient_wheel(&f, &tire.contact_point().unwrap());

        let normal = -f.ground.borrow().frame().unwrap().z();
        let rotation = f.wheel.borrow().rotation_axis().unwrap();
        let longitudinal = tire.longitudinal_axis().unwrap();
        let lateral = tire.lateral_axis().unwrap();
        let upward = tire.upward_radial_axis().unwrap();
        for value in [
            longitudinal.dot(&normal).unwrap(),
            longitudinal.dot(&rotation).unwrap(),
            lateral.dot(&normal).unwrap(),
            lateral.dot(&longitudinal).unwrap(),
            upward.dot(&rotation).unwrap(),
            upward.magnitude().unwrap() - 1.0,
        ] {
            assert!(check_zero(&value), "{value} is not zero");
        }
        let camber = tire.camber_angle().unwrap() - dynamicsymbols("q4")[0].clone();
        assert!(check_zero(&camber));
    }

    #[test]
    fn axis_setters_validate_the_geometry() {
        let f = fixture();
        let mut tire = InContactTire::new("tire").unwrap();
        tire.set_ground(f.ground.clone());
        tire.set_wheel(f.wheel.clone());
        f.ground.borrow_mut().define_objects().unwrap();
        f.wheel.borrow_mut().define_objects().unwrap();
        tire.define_objects().unwrap();
        orient_wheel(&f, &tire.contact_point().unwrap());

        let rotation = f.wheel.borrow().rotation_axis().unwrap();
        assert_eq!(
            tire.set_longitudinal_axis(rotation.clone()).unwrap_err(),
            BrimError::InvalidGeometry {
                owner: "tire".to_string(),
                property: "longitudinal axis",
                reason: "it should be perpendicular to the rotation axis".to_string(),
            }
        );
        let doubled = tire.longitudinal_axis().unwrap() * 2.0;
        assert!(matches!(
            tire.set_longitudinal_axis(doubled),
            Err(BrimError::InvalidGeometry { .. })
        ));

        let upward = tire.upward_radial_axis().unwrap();
        assert!(tire.set_upward_radial_axis(upward.clone()).is_ok());
        assert!(tire.set_lateral_axis(upward).is_err());
    }

    #[derive(Debug, brim_core::Model)]
    struct Slope {
        #[brim(base)]
        base: ModelBase,
        body: Option<RigidBody>,
    }

    impl Model for Slope {
        fn define_objects_hook(&mut self) -> Result<(), BrimError> {
            let body = RigidBody::new(self.name());
            self.base.node.set_system(System::from_newtonian(&body));
            self.body = Some(body);
            Ok(())
        }
    }

    impl Ground for Slope {
        fn body(&self) -> Result<RigidBody, BrimError> {
            self.body.clone().ok_or_else(|| BrimError::StageOrder {
                node: self.name().to_string(),
                stage: "define_objects",
            })
        }

        fn get_normal(&self, _point: &Point) -> Result<Vector, BrimError> {
            let frame = self.frame()?;
            Ok((frame.x() - frame.z()).normalize()?)
        }

        fn get_tangent_vectors(&self, _point: &Point) -> Result<[Vector; 2], BrimError> {
            let frame = self.frame()?;
            Ok([(frame.x() + frame.z()).normalize()?, frame.y()])
        }

        fn set_pos_point(&self, point: &Point, position: [Expr; 2]) -> Result<(), BrimError> {
            let [t0, t1] = self.get_tangent_vectors(point)?;
            let [p0, p1] = position;
            point.set_pos(&self.origin()?, t0 * p0 + t1 * p1);
            Ok(())
        }
    }

    #[test]
    fn unsupported_grounds_are_rejected() {
        let slope = shared(Slope::new("slope").unwrap());
        let wheel = shared(KnifeEdgeWheel::new("wheel").unwrap());
        let mut tire = NonHolonomicTire::new("tire").unwrap();
        tire.set_ground(slope.clone());
        tire.set_wheel(wheel.clone());
        let tire = shared(tire);
        let harness = shared(
            ConnectionHarness::new("harness", ConnectionHandle::new(tire)).unwrap(),
        );
        harness.borrow_mut().define_connections().unwrap();
        harness.borrow_mut().define_objects().unwrap();
        assert_eq!(
            harness.borrow_mut().define_kinematics().unwrap_err(),
            BrimError::Unsupported(
                "Computation of the contact point has not been implemented for the \
                 combination of Slope and KnifeEdgeWheel."
                    .to_string()
            )
        );
    }

    #[test]
    fn contact_point_on_the_ground_plane_is_on_ground() {
        let f = fixture();
        let mut tire = NonHolonomicTire::new("tire").unwrap();
        assert!(!tire.on_ground());
        tire.set_ground(f.ground.clone());
        tire.set_wheel(f.wheel.clone());
        f.ground.borrow_mut().define_objects().unwrap();
        tire.define_objects().unwrap();
        assert!(!tire.on_ground());

        let point = tire.contact_point().unwrap();
        let frame = f.ground.borrow().frame().unwrap();
        point.set_pos(&f.ground.borrow().origin().unwrap(), frame.z() * Expr::symbol("h"));
        assert!(!tire.on_ground());
        f.ground
            .borrow()
            .set_pos_point(&point, [Expr::symbol("x"), Expr::symbol("y")])
            .unwrap();
        assert!(tire.on_ground());
        tire.set_on_ground(false);
        assert!(!tire.on_ground());
    }
}
