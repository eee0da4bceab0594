//! A container for everything needed to form equations of motion.

use tracing::debug;

use crate::{
    Body, EquationsOfMotion, Expr, Load, MechanicsError, PinJoint, Point, ReferenceFrame,
    RigidBody, TorqueActuator, Vector, kane,
};

/// Coordinates, speeds, bodies, joints, loads and constraints of a
/// multibody system, defined relative to an inertial frame and a fixed point.
#[derive(Clone, Debug)]
pub struct System {
    frame: ReferenceFrame,
    fixed_point: Point,
    q_ind: Vec<Expr>,
    q_dep: Vec<Expr>,
    u_ind: Vec<Expr>,
    u_dep: Vec<Expr>,
    u_aux: Vec<Expr>,
    kdes: Vec<Expr>,
    bodies: Vec<Body>,
    joints: Vec<PinJoint>,
    loads: Vec<Load>,
    actuators: Vec<TorqueActuator>,
    holonomic: Vec<Expr>,
    nonholonomic: Vec<Expr>,
    velocity_constraints: Option<Vec<Expr>>,
}

fn check_new<T: PartialEq>(
    existing: &[T],
    new: &[T],
    kind: &'static str,
    name: impl Fn(&T) -> String,
) -> Result<(), MechanicsError> {
    for (i, item) in new.iter().enumerate() {
        if existing.contains(item) || new[..i].contains(item) {
            return Err(MechanicsError::Duplicate {
                kind,
                name: name(item),
            });
        }
    }
    Ok(())
}

impl System {
    /// Creates an empty system; the fixed point gets zero velocity in the
    /// inertial frame.
    pub fn new(frame: &ReferenceFrame, fixed_point: &Point) -> Self {
        fixed_point.set_vel(frame, Vector::zero());
        Self {
            frame: frame.clone(),
            fixed_point: fixed_point.clone(),
            q_ind: Vec::new(),
            q_dep: Vec::new(),
            u_ind: Vec::new(),
            u_dep: Vec::new(),
            u_aux: Vec::new(),
            kdes: Vec::new(),
            bodies: Vec::new(),
            joints: Vec::new(),
            loads: Vec::new(),
            actuators: Vec::new(),
            holonomic: Vec::new(),
            nonholonomic: Vec::new(),
            velocity_constraints: None,
        }
    }

    /// Creates a system whose inertial frame and fixed point are those of a
    /// Newtonian body, which is added to the system.
    pub fn from_newtonian(newtonian: &RigidBody) -> Self {
        let mut system = Self::new(newtonian.frame(), newtonian.masscenter());
        system.bodies.push(Body::Rigid(newtonian.clone()));
        system
    }

    pub fn frame(&self) -> &ReferenceFrame {
        &self.frame
    }

    pub fn fixed_point(&self) -> &Point {
        &self.fixed_point
    }

    pub fn q_ind(&self) -> &[Expr] {
        &self.q_ind
    }

    pub fn q_dep(&self) -> &[Expr] {
        &self.q_dep
    }

    /// Independent followed by dependent generalized coordinates.
    pub fn q(&self) -> Vec<Expr> {
        self.q_ind.iter().chain(&self.q_dep).cloned().collect()
    }

    pub fn u_ind(&self) -> &[Expr] {
        &self.u_ind
    }

    pub fn u_dep(&self) -> &[Expr] {
        &self.u_dep
    }

    /// Independent followed by dependent generalized speeds.
    pub fn u(&self) -> Vec<Expr> {
        self.u_ind.iter().chain(&self.u_dep).cloned().collect()
    }

    pub fn u_aux(&self) -> &[Expr] {
        &self.u_aux
    }

    pub fn kdes(&self) -> &[Expr] {
        &self.kdes
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Looks up a body by name.
    pub fn get_body(&self, name: &str) -> Option<&Body> {
        self.bodies.iter().find(|body| body.name() == name)
    }

    pub fn joints(&self) -> &[PinJoint] {
        &self.joints
    }

    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    pub fn actuators(&self) -> &[TorqueActuator] {
        &self.actuators
    }

    pub fn holonomic_constraints(&self) -> &[Expr] {
        &self.holonomic
    }

    pub fn nonholonomic_constraints(&self) -> &[Expr] {
        &self.nonholonomic
    }

    /// Velocity constraints, either set explicitly or derived as the time
    /// derivative of the holonomic constraints followed by the nonholonomic
    /// constraints.
    pub fn velocity_constraints(&self) -> Vec<Expr> {
        match &self.velocity_constraints {
            Some(constraints) => constraints.clone(),
            None => self
                .holonomic
                .iter()
                .map(Expr::dt)
                .chain(self.nonholonomic.iter().cloned())
                .collect(),
        }
    }

    /// Whether velocity constraints have been set explicitly.
    pub fn has_explicit_velocity_constraints(&self) -> bool {
        self.velocity_constraints.is_some()
    }

    pub fn set_velocity_constraints(&mut self, constraints: Vec<Expr>) {
        self.velocity_constraints = Some(constraints);
    }

    /// # Errors
    ///
    /// Fails if a coordinate is already present.
    pub fn add_coordinates(&mut self, coordinates: &[Expr], independent: bool) -> Result<(), MechanicsError> {
        check_new(&self.q(), coordinates, "coordinate", Expr::to_string)?;
        let target = if independent { &mut self.q_ind } else { &mut self.q_dep };
        target.extend_from_slice(coordinates);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if a speed is already present.
    pub fn add_speeds(&mut self, speeds: &[Expr], independent: bool) -> Result<(), MechanicsError> {
        let mut existing = self.u();
        existing.extend_from_slice(&self.u_aux);
        check_new(&existing, speeds, "speed", Expr::to_string)?;
        let target = if independent { &mut self.u_ind } else { &mut self.u_dep };
        target.extend_from_slice(speeds);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if an auxiliary speed is already present.
    pub fn add_auxiliary_speeds(&mut self, speeds: &[Expr]) -> Result<(), MechanicsError> {
        let mut existing = self.u();
        existing.extend_from_slice(&self.u_aux);
        check_new(&existing, speeds, "auxiliary speed", Expr::to_string)?;
        self.u_aux.extend_from_slice(speeds);
        Ok(())
    }

    /// Replaces the independent speeds.
    pub fn set_u_ind(&mut self, speeds: Vec<Expr>) {
        self.u_ind = speeds;
    }

    /// Replaces the dependent speeds.
    pub fn set_u_dep(&mut self, speeds: Vec<Expr>) {
        self.u_dep = speeds;
    }

    /// # Errors
    ///
    /// Fails if an equation, or its negation, is already present.
    pub fn add_kdes(&mut self, kdes: &[Expr]) -> Result<(), MechanicsError> {
        let mut existing = self.kdes.clone();
        existing.extend(self.kdes.iter().map(|k| -k));
        check_new(&existing, kdes, "kinematic differential equation", Expr::to_string)?;
        self.kdes.extend_from_slice(kdes);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if a body is already present.
    pub fn add_bodies(&mut self, bodies: &[Body]) -> Result<(), MechanicsError> {
        check_new(&self.bodies, bodies, "body", |b| b.name().to_string())?;
        self.bodies.extend_from_slice(bodies);
        Ok(())
    }

    /// Adds joints together with their coordinates, speeds, kinematic
    /// differential equations and bodies that are not yet present.
    ///
    /// # Errors
    ///
    /// Fails if a joint is already present.
    pub fn add_joints(&mut self, joints: &[PinJoint]) -> Result<(), MechanicsError> {
        check_new(&self.joints, joints, "joint", |j| j.name().to_string())?;
        self.joints.extend_from_slice(joints);
        for joint in joints {
            let q = joint.coordinate().clone();
            if !self.q().contains(&q) {
                self.q_ind.push(q);
            }
            let u = joint.speed().clone();
            if !self.u().contains(&u) {
                self.u_ind.push(u);
            }
            for kde in joint.kdes() {
                if !self.kdes.contains(kde) && !self.kdes.contains(&-kde) && !kde.is_zero() {
                    self.kdes.push(kde.clone());
                }
            }
            for body in [joint.parent(), joint.child()] {
                let body = Body::Rigid(body.clone());
                if !self.bodies.contains(&body) {
                    self.bodies.push(body);
                }
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if a load is already present.
    pub fn add_loads(&mut self, loads: &[Load]) -> Result<(), MechanicsError> {
        check_new(&self.loads, loads, "load", |l| format!("{l:?}"))?;
        self.loads.extend_from_slice(loads);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if an actuator is already present.
    pub fn add_actuators(&mut self, actuators: &[TorqueActuator]) -> Result<(), MechanicsError> {
        check_new(&self.actuators, actuators, "actuator", |a| a.torque().to_string())?;
        self.actuators.extend_from_slice(actuators);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if a constraint is already present.
    pub fn add_holonomic_constraints(&mut self, constraints: &[Expr]) -> Result<(), MechanicsError> {
        check_new(&self.holonomic, constraints, "holonomic constraint", Expr::to_string)?;
        self.holonomic.extend_from_slice(constraints);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if a constraint is already present.
    pub fn add_nonholonomic_constraints(&mut self, constraints: &[Expr]) -> Result<(), MechanicsError> {
        check_new(&self.nonholonomic, constraints, "nonholonomic constraint", Expr::to_string)?;
        self.nonholonomic.extend_from_slice(constraints);
        Ok(())
    }

    /// Adds the weight of every body for a uniform gravitational field.
    ///
    /// # Errors
    ///
    /// Fails if an identical load is already present.
    pub fn apply_uniform_gravity(&mut self, acceleration: &Vector) -> Result<(), MechanicsError> {
        let loads: Vec<Load> = self
            .bodies
            .iter()
            .map(|body| Load::force(body.masscenter(), acceleration * &body.mass()))
            .collect();
        self.add_loads(&loads)
    }

    /// Every applied load, including those produced by actuators.
    pub fn all_loads(&self) -> Vec<Load> {
        let mut loads = self.loads.clone();
        for actuator in &self.actuators {
            loads.extend(actuator.to_loads());
        }
        loads
    }

    /// Forms the equations of motion with Kane's method.
    ///
    /// # Errors
    ///
    /// Fails if the kinematic differential equations or the velocity
    /// constraints are malformed, or if velocities cannot be determined.
    pub fn form_eoms(&self) -> Result<EquationsOfMotion, MechanicsError> {
        debug!(
            coordinates = self.q_ind.len() + self.q_dep.len(),
            speeds = self.u_ind.len() + self.u_dep.len(),
            auxiliary = self.u_aux.len(),
            bodies = self.bodies.len(),
            "forming equations of motion"
        );
        kane::form(self)
    }
}
