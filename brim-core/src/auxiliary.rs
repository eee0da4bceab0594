//! Noncontributing loads computed with auxiliary speeds.
//!
//! A noncontributing force, such as the normal force of a rolling wheel,
//! does no work and therefore does not appear in Kane's equations. Adding an
//! auxiliary speed along the force direction at its point of application,
//! and at every point positioned relative to it, makes the force show up in
//! the equations of the auxiliary speed without changing the true degrees
//! of freedom.

use std::collections::HashMap;

use brim_mechanics::{Expr, Load, Point, ReferenceFrame, System, Vector};
use tracing::debug;

use crate::{
    BrimError,
    tree::{Tree, extract_tree, get_children_from_tree},
};

/// Where a noncontributing load acts.
#[derive(Clone, Debug)]
pub enum AuxiliaryLocation {
    Point(Point),
    /// Torques are not supported.
    Frame(ReferenceFrame),
}

impl From<&Point> for AuxiliaryLocation {
    fn from(point: &Point) -> Self {
        AuxiliaryLocation::Point(point.clone())
    }
}

impl From<&ReferenceFrame> for AuxiliaryLocation {
    fn from(frame: &ReferenceFrame) -> Self {
        AuxiliaryLocation::Frame(frame.clone())
    }
}

/// A noncontributing force registered with the handler.
#[derive(Clone, Debug)]
pub struct AuxiliaryData {
    location: Point,
    direction: Vector,
    speed_symbol: Expr,
    load_symbol: Expr,
}

impl AuxiliaryData {
    /// # Errors
    ///
    /// Fails for frame locations, as noncontributing torques are not
    /// supported.
    pub fn new(
        location: impl Into<AuxiliaryLocation>,
        direction: Vector,
        speed_symbol: Expr,
        load_symbol: Expr,
    ) -> Result<Self, BrimError> {
        match location.into() {
            AuxiliaryLocation::Point(location) => Ok(Self {
                location,
                direction,
                speed_symbol,
                load_symbol,
            }),
            AuxiliaryLocation::Frame(_) => Err(BrimError::Unsupported(
                "Noncontributing torques have not been implemented.".to_string(),
            )),
        }
    }

    pub fn location(&self) -> &Point {
        &self.location
    }

    /// Unit vector along the load.
    pub fn direction(&self) -> &Vector {
        &self.direction
    }

    pub fn speed_symbol(&self) -> &Expr {
        &self.speed_symbol
    }

    pub fn load_symbol(&self) -> &Expr {
        &self.load_symbol
    }

    pub fn auxiliary_velocity(&self) -> Vector {
        &self.direction * &self.speed_symbol
    }

    /// The load as a force on a fresh point `{location}_aux` whose velocity in
    /// `inertial_frame` is only the auxiliary velocity.
    pub fn get_load(&self, inertial_frame: &ReferenceFrame) -> Load {
        let point = Point::new(&format!("{}_aux", self.location.name()));
        point.set_vel(inertial_frame, self.auxiliary_velocity());
        Load::force(&point, &self.direction * &self.load_symbol)
    }
}

/// Collects noncontributing loads of a model tree and injects their
/// auxiliary velocities into the point velocities.
#[derive(Debug)]
pub struct AuxiliaryDataHandler {
    inertial_frame: ReferenceFrame,
    inertial_point: Point,
    data: Vec<AuxiliaryData>,
    position_tree: Option<Tree<Point>>,
    auxiliary_velocities: Option<HashMap<Point, Vector>>,
}

impl AuxiliaryDataHandler {
    pub fn new(inertial_frame: &ReferenceFrame, inertial_point: &Point) -> Self {
        Self {
            inertial_frame: inertial_frame.clone(),
            inertial_point: inertial_point.clone(),
            data: Vec::new(),
            position_tree: None,
            auxiliary_velocities: None,
        }
    }

    pub fn from_system(system: &System) -> Self {
        Self::new(system.frame(), system.fixed_point())
    }

    pub fn inertial_frame(&self) -> &ReferenceFrame {
        &self.inertial_frame
    }

    pub fn inertial_point(&self) -> &Point {
        &self.inertial_point
    }

    pub fn auxiliary_data(&self) -> &[AuxiliaryData] {
        &self.data
    }

    pub fn auxiliary_speeds(&self) -> Vec<Expr> {
        self.data.iter().map(|d| d.speed_symbol.clone()).collect()
    }

    /// Tree of points positioned relative to the inertial point, available
    /// once speeds have been applied.
    pub fn position_tree(&self) -> Option<&Tree<Point>> {
        self.position_tree.as_ref()
    }

    /// Registers a noncontributing force of magnitude `load_symbol` acting
    /// at `point` along `direction`.
    ///
    /// # Errors
    ///
    /// Fails if speeds have already been applied.
    pub fn add_noncontributing_force(
        &mut self,
        point: &Point,
        direction: Vector,
        speed_symbol: Expr,
        load_symbol: Expr,
    ) -> Result<AuxiliaryData, BrimError> {
        if self.auxiliary_velocities.is_some() {
            return Err(BrimError::AuxiliaryAlreadyApplied);
        }
        let data = AuxiliaryData::new(point, direction, speed_symbol, load_symbol)?;
        self.data.push(data.clone());
        Ok(data)
    }

    /// Adds the auxiliary velocities to the velocities of the points.
    ///
    /// The velocity of every point in the position tree is first fixed in
    /// the inertial frame, walking down from the inertial point. Afterwards,
    /// each registered force adds its auxiliary velocity to its point of
    /// application and to all points below it.
    ///
    /// # Errors
    ///
    /// Fails if called twice, if the position graph is not a tree, if a
    /// registered point is not connected to the inertial point, or if a
    /// velocity cannot be determined.
    pub fn apply_speeds(&mut self) -> Result<(), BrimError> {
        if self.auxiliary_velocities.is_some() {
            return Err(BrimError::AuxiliaryAlreadyApplied);
        }
        let tree = extract_tree(self.inertial_point.clone(), Point::position_neighbors, true)?;
        let points = get_children_from_tree(&tree, &self.inertial_point, true);

        let mut accumulated: HashMap<Point, Vector> = points
            .iter()
            .map(|p| (p.clone(), Vector::zero()))
            .collect();
        for data in &self.data {
            if !tree.contains(&data.location) {
                return Err(BrimError::NotConnected {
                    point: data.location.name().to_string(),
                    root: self.inertial_point.name().to_string(),
                });
            }
            for point in get_children_from_tree(&tree, &data.location, true) {
                if let Some(velocity) = accumulated.get_mut(&point) {
                    *velocity = velocity.clone() + data.auxiliary_velocity();
                }
            }
        }

        let frame = &self.inertial_frame;
        for point in &points {
            let velocity = match tree.parent(point) {
                Some(parent) if !point.has_vel(frame) => {
                    parent.vel(frame)? + point.pos_from(&parent)?.dt(frame)?
                }
                _ => point.vel(frame)?,
            };
            point.set_vel(frame, velocity);
        }
        for point in &points {
            if let Some(auxiliary) = accumulated.get(point).filter(|v| !v.is_zero()) {
                point.set_vel(frame, point.vel(frame)? + auxiliary.clone());
            }
        }

        debug!(
            points = points.len(),
            forces = self.data.len(),
            "applied auxiliary speeds"
        );
        self.position_tree = Some(tree);
        self.auxiliary_velocities = Some(accumulated);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if speeds have not been applied or `point` is not part of the
    /// position tree.
    pub fn get_auxiliary_velocity(&self, point: &Point) -> Result<Vector, BrimError> {
        let velocities = self
            .auxiliary_velocities
            .as_ref()
            .ok_or(BrimError::AuxiliaryNotComputed)?;
        velocities
            .get(point)
            .cloned()
            .ok_or_else(|| BrimError::AuxiliaryUnknownPoint(point.name().to_string()))
    }

    /// One force per registered noncontributing load.
    pub fn create_loads(&self) -> Vec<Load> {
        self.data
            .iter()
            .map(|d| d.get_load(&self.inertial_frame))
            .collect()
    }
}
