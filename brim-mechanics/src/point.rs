//! Points, their relative positions and their velocities.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet, VecDeque},
    fmt,
    rc::Rc,
};

use tracing::warn;

use crate::{
    MechanicsError, ReferenceFrame, Vector,
    link::{Link, next_id},
};

/// A point in space.
///
/// Cloning produces another handle to the same point.
#[derive(Clone)]
pub struct Point(Rc<PointData>);

struct PointData {
    id: usize,
    name: String,
    positions: RefCell<Vec<Position>>,
    velocities: RefCell<Vec<(ReferenceFrame, Vector)>>,
    accelerations: RefCell<Vec<(ReferenceFrame, Vector)>>,
}

struct Position {
    other: Link<PointData>,
    other_id: usize,
    /// Position of this point relative to the other point.
    vector: Vector,
}

fn upsert(list: &RefCell<Vec<(ReferenceFrame, Vector)>>, frame: &ReferenceFrame, value: Vector) {
    let mut list = list.borrow_mut();
    match list.iter_mut().find(|(f, _)| f == frame) {
        Some(entry) => entry.1 = value,
        None => list.push((frame.clone(), value)),
    }
}

impl Point {
    pub fn new(name: &str) -> Self {
        Self(Rc::new(PointData {
            id: next_id(),
            name: name.to_string(),
            positions: RefCell::new(Vec::new()),
            velocities: RefCell::new(Vec::new()),
            accelerations: RefCell::new(Vec::new()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    fn id(&self) -> usize {
        self.0.id
    }

    /// Sets the position of this point relative to `other`.
    ///
    /// This point keeps `other` alive; `other` only observes this point.
    pub fn set_pos(&self, other: &Point, value: Vector) {
        Self::store_position(self, Link::Strong(Rc::clone(&other.0)), other.id(), value.clone());
        Self::store_position(other, Link::Weak(Rc::downgrade(&self.0)), self.id(), -value);
    }

    fn store_position(point: &Point, other: Link<PointData>, other_id: usize, vector: Vector) {
        let mut positions = point.0.positions.borrow_mut();
        positions.retain(|p| p.other_id != other_id);
        positions.push(Position {
            other,
            other_id,
            vector,
        });
    }

    /// Creates a new point at `value` relative to this one.
    pub fn locatenew(&self, name: &str, value: Vector) -> Point {
        let point = Point::new(name);
        point.set_pos(self, value);
        point
    }

    /// Points whose position has been defined relative to this point, or the
    /// other way around.
    pub fn position_neighbors(&self) -> Vec<Point> {
        self.0
            .positions
            .borrow()
            .iter()
            .filter_map(|p| p.other.upgrade().map(Point))
            .collect()
    }

    fn find_path(&self, target: &Point) -> Option<Vec<Point>> {
        let mut parents: HashMap<usize, Point> = HashMap::new();
        let mut visited = HashSet::from([self.id()]);
        let mut queue = VecDeque::from([self.clone()]);
        while let Some(point) = queue.pop_front() {
            if point == *target {
                let mut path = vec![point.clone()];
                let mut current = point;
                while let Some(previous) = parents.get(&current.id()) {
                    path.push(previous.clone());
                    current = previous.clone();
                }
                path.reverse();
                return Some(path);
            }
            for next in point.position_neighbors() {
                if visited.insert(next.id()) {
                    parents.insert(next.id(), point.clone());
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Position of this point relative to `other`.
    ///
    /// # Errors
    ///
    /// Fails if no chain of positions links the two points.
    pub fn pos_from(&self, other: &Point) -> Result<Vector, MechanicsError> {
        let path = self
            .find_path(other)
            .ok_or_else(|| MechanicsError::PointsNotConnected {
                from: self.name().to_string(),
                to: other.name().to_string(),
            })?;
        let mut result = Vector::zero();
        for pair in path.windows(2) {
            let positions = pair[0].0.positions.borrow();
            if let Some(p) = positions.iter().find(|p| p.other_id == pair[1].id()) {
                result = result + p.vector.clone();
            }
        }
        Ok(result)
    }

    pub fn set_vel(&self, frame: &ReferenceFrame, value: Vector) {
        upsert(&self.0.velocities, frame, value);
    }

    pub fn set_acc(&self, frame: &ReferenceFrame, value: Vector) {
        upsert(&self.0.accelerations, frame, value);
    }

    /// Whether a velocity has been set or computed in `frame`.
    pub fn has_vel(&self, frame: &ReferenceFrame) -> bool {
        self.0.velocities.borrow().iter().any(|(f, _)| f == frame)
    }

    /// Velocity of this point in `frame`.
    ///
    /// If no velocity is stored, it is derived from the nearest point with a
    /// known velocity in `frame` by differentiating the relative position,
    /// and the result is stored.
    ///
    /// # Errors
    ///
    /// Fails if no connected point has a velocity in `frame`.
    pub fn vel(&self, frame: &ReferenceFrame) -> Result<Vector, MechanicsError> {
        if let Some((_, v)) = self.0.velocities.borrow().iter().find(|(f, _)| f == frame) {
            return Ok(v.clone());
        }

        let mut visited = HashSet::from([self.id()]);
        let mut queue = VecDeque::from([self.clone()]);
        let mut candidate: Option<Point> = None;
        while let Some(point) = queue.pop_front() {
            for next in point.position_neighbors() {
                if !visited.insert(next.id()) {
                    continue;
                }
                if next.has_vel(frame) {
                    match &candidate {
                        Some(first) => warn!(
                            point = self.name(),
                            first = first.name(),
                            second = next.name(),
                            "velocity is ambiguous, using the first neighbor found"
                        ),
                        None => candidate = Some(next.clone()),
                    }
                }
                queue.push_back(next);
            }
            if candidate.is_some() {
                break;
            }
        }

        let Some(neighbor) = candidate else {
            return Err(MechanicsError::VelocityUndefined {
                point: self.name().to_string(),
                frame: frame.name().to_string(),
            });
        };
        let velocity = neighbor.vel(frame)? + self.pos_from(&neighbor)?.dt(frame)?;
        self.set_vel(frame, velocity.clone());
        Ok(velocity)
    }

    /// Acceleration of this point in `frame`.
    ///
    /// # Errors
    ///
    /// Fails if the velocity cannot be determined.
    pub fn acc(&self, frame: &ReferenceFrame) -> Result<Vector, MechanicsError> {
        if let Some((_, a)) = self
            .0
            .accelerations
            .borrow()
            .iter()
            .find(|(f, _)| f == frame)
        {
            return Ok(a.clone());
        }
        self.vel(frame)?.dt(frame)
    }

    /// Sets the velocity of this point, fixed in `fixed_frame`, using the
    /// velocity of `other` which is also fixed in `fixed_frame`.
    ///
    /// # Errors
    ///
    /// Fails if positions, velocities or orientations are missing.
    pub fn v2pt_theory(
        &self,
        other: &Point,
        out_frame: &ReferenceFrame,
        fixed_frame: &ReferenceFrame,
    ) -> Result<Vector, MechanicsError> {
        let distance = self.pos_from(other)?;
        let omega = fixed_frame.ang_vel_in(out_frame)?;
        let velocity = other.vel(out_frame)? + omega.cross(&distance)?;
        self.set_vel(out_frame, velocity.clone());
        Ok(velocity)
    }

    /// Sets the velocity of this point, which moves in `inter_frame`, using
    /// the velocity of `other` which is fixed in `inter_frame`.
    ///
    /// # Errors
    ///
    /// Fails if positions, velocities or orientations are missing.
    pub fn v1pt_theory(
        &self,
        other: &Point,
        out_frame: &ReferenceFrame,
        inter_frame: &ReferenceFrame,
    ) -> Result<Vector, MechanicsError> {
        let distance = self.pos_from(other)?;
        let omega = inter_frame.ang_vel_in(out_frame)?;
        let velocity =
            self.vel(inter_frame)? + other.vel(out_frame)? + omega.cross(&distance)?;
        self.set_vel(out_frame, velocity.clone());
        Ok(velocity)
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Point {}

impl std::hash::Hash for Point {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({})", self.name())
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
