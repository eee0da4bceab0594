//! Reference frames and their relative orientations.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet, VecDeque},
    fmt,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    Expr, MechanicsError, Vector,
    link::{Link, next_id},
};

/// A 3x3 matrix of expressions, indexed `[row][column]`.
pub type Matrix3 = [[Expr; 3]; 3];

/// Incremented whenever any orientation changes; invalidates cached DCMs.
static ORIENTATION_EPOCH: AtomicU64 = AtomicU64::new(0);

/// A reference frame with three orthonormal basis vectors.
///
/// Cloning produces another handle to the same frame.
#[derive(Clone)]
pub struct ReferenceFrame(pub(crate) Rc<FrameData>);

pub(crate) struct FrameData {
    id: usize,
    name: String,
    links: RefCell<Vec<Orientation>>,
    cache: RefCell<HashMap<usize, (u64, Matrix3)>>,
}

#[derive(Clone, Copy)]
enum Basis {
    Own,
    Other,
}

struct Orientation {
    other: Link<FrameData>,
    other_id: usize,
    /// Maps components in the other frame to components in this frame.
    dcm: Matrix3,
    /// Angular velocity of this frame in the other frame.
    ang_vel: [Expr; 3],
    basis: Basis,
}

pub(crate) fn identity() -> Matrix3 {
    std::array::from_fn(|i| std::array::from_fn(|j| Expr::number(if i == j { 1.0 } else { 0.0 })))
}

pub(crate) fn transpose(m: &Matrix3) -> Matrix3 {
    std::array::from_fn(|i| std::array::from_fn(|j| m[j][i].clone()))
}

pub(crate) fn mat_mul(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    std::array::from_fn(|i| {
        std::array::from_fn(|j| Expr::add_all((0..3).map(|k| &a[i][k] * &b[k][j])))
    })
}

pub(crate) fn mat_vec(m: &Matrix3, v: &[Expr; 3]) -> [Expr; 3] {
    std::array::from_fn(|i| Expr::add_all((0..3).map(|k| &m[i][k] * &v[k])))
}

/// Passive rotation about a single basis axis, `0`, `1` or `2`.
fn elementary(axis: usize, angle: &Expr) -> Matrix3 {
    let (c, s) = (angle.cos(), angle.sin());
    let mut m = identity();
    let (a, b) = match axis {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    m[a][a] = c.clone();
    m[a][b] = s.clone();
    m[b][a] = -s;
    m[b][b] = c;
    m
}

fn parse_rotation_order(order: &str) -> Result<[usize; 3], MechanicsError> {
    let invalid = || MechanicsError::InvalidRotationOrder(order.to_string());
    let axes: Vec<usize> = order
        .chars()
        .map(|c| match c.to_ascii_lowercase() {
            'x' | '1' => Ok(0),
            'y' | '2' => Ok(1),
            'z' | '3' => Ok(2),
            _ => Err(invalid()),
        })
        .collect::<Result<_, _>>()?;
    match axes.as_slice() {
        [a, b, c] if a != b && b != c => Ok([*a, *b, *c]),
        _ => Err(invalid()),
    }
}

impl ReferenceFrame {
    pub fn new(name: &str) -> Self {
        Self(Rc::new(FrameData {
            id: next_id(),
            name: name.to_string(),
            links: RefCell::new(Vec::new()),
            cache: RefCell::new(HashMap::new()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub(crate) fn id(&self) -> usize {
        self.0.id
    }

    pub fn x(&self) -> Vector {
        self.unit(0)
    }

    pub fn y(&self) -> Vector {
        self.unit(1)
    }

    pub fn z(&self) -> Vector {
        self.unit(2)
    }

    fn unit(&self, axis: usize) -> Vector {
        let mut components = [Expr::zero(), Expr::zero(), Expr::zero()];
        components[axis] = Expr::one();
        Vector::new(self, components)
    }

    /// Orients this frame by a simple rotation of `angle` about `axis`.
    ///
    /// The axis is normalized. The angular velocity relative to the parent
    /// becomes the time derivative of the angle times the axis.
    ///
    /// # Errors
    ///
    /// Fails if the axis cannot be expressed in the parent frame or is zero.
    pub fn orient_axis(
        &self,
        parent: &ReferenceFrame,
        axis: &Vector,
        angle: impl Into<Expr>,
    ) -> Result<(), MechanicsError> {
        let angle = angle.into();
        let a = axis.normalize()?.to_matrix(parent)?;
        let (c, s) = (angle.cos(), angle.sin());
        // Rodrigues' formula gives parent.dcm(self); store its transpose.
        let parent_dcm: Matrix3 = std::array::from_fn(|i| {
            std::array::from_fn(|j| {
                let outer = &a[i] * &a[j];
                let delta = if i == j { Expr::one() } else { Expr::zero() };
                let skew = match (i, j) {
                    (0, 1) => -&a[2],
                    (0, 2) => a[1].clone(),
                    (1, 0) => a[2].clone(),
                    (1, 2) => -&a[0],
                    (2, 0) => -&a[1],
                    (2, 1) => a[0].clone(),
                    _ => Expr::zero(),
                };
                (delta - &outer) * &c + skew * &s + outer
            })
        });
        let rate = angle.dt();
        // The axis has the same components in both frames.
        let ang_vel = a.map(|component| component * &rate);
        self.set_orientation(parent, transpose(&parent_dcm), ang_vel);
        Ok(())
    }

    /// Orients this frame by three successive body-fixed rotations.
    ///
    /// `order` names the rotation axes, e.g. `"zxy"` or `"312"`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid rotation order.
    pub fn orient_body_fixed(
        &self,
        parent: &ReferenceFrame,
        angles: [Expr; 3],
        order: &str,
    ) -> Result<(), MechanicsError> {
        let [i, j, k] = parse_rotation_order(order)?;
        let ri = elementary(i, &angles[0]);
        let rj = elementary(j, &angles[1]);
        let rk = elementary(k, &angles[2]);
        let rkj = mat_mul(&rk, &rj);
        let dcm = mat_mul(&rkj, &ri);

        let column = |m: &Matrix3, axis: usize| -> [Expr; 3] { std::array::from_fn(|r| m[r][axis].clone()) };
        let rates = angles.map(|angle| angle.dt());
        let wi = column(&rkj, i);
        let wj = column(&rk, j);
        let ang_vel: [Expr; 3] = std::array::from_fn(|r| {
            let wk = if r == k { Expr::one() } else { Expr::zero() };
            &rates[0] * &wi[r] + &rates[1] * &wj[r] + &rates[2] * wk
        });

        self.set_orientation(parent, dcm, ang_vel);
        Ok(())
    }

    /// Orients this frame with an explicit direction cosine matrix that maps
    /// components in `parent` to components in this frame.
    pub fn orient_explicit(&self, parent: &ReferenceFrame, dcm: Matrix3) {
        let rate = dcm.clone().map(|row| row.map(|e| e.dt()));
        let skew = |i: usize, j: usize| -> Expr {
            -Expr::add_all((0..3).map(|k| &rate[i][k] * &dcm[j][k]))
        };
        let ang_vel = [skew(2, 1), skew(0, 2), skew(1, 0)];
        self.set_orientation(parent, dcm, ang_vel);
    }

    fn set_orientation(&self, parent: &ReferenceFrame, dcm: Matrix3, ang_vel: [Expr; 3]) {
        if self.find_path(parent).is_some() {
            self.detach();
        }
        let reverse_dcm = transpose(&dcm);
        let reverse_vel = ang_vel.clone().map(|e| -e);
        self.0.links.borrow_mut().push(Orientation {
            other: Link::Strong(Rc::clone(&parent.0)),
            other_id: parent.id(),
            dcm,
            ang_vel,
            basis: Basis::Own,
        });
        parent.0.links.borrow_mut().push(Orientation {
            other: Link::Weak(Rc::downgrade(&self.0)),
            other_id: self.id(),
            dcm: reverse_dcm,
            ang_vel: reverse_vel,
            basis: Basis::Other,
        });
        ORIENTATION_EPOCH.fetch_add(1, Ordering::Relaxed);
    }

    /// Removes every orientation of this frame.
    fn detach(&self) {
        let links = std::mem::take(&mut *self.0.links.borrow_mut());
        for link in links {
            if let Some(other) = link.other.upgrade() {
                other.links.borrow_mut().retain(|l| l.other_id != self.id());
            }
        }
    }

    /// Sets the angular velocity of this frame in a directly related frame.
    ///
    /// # Errors
    ///
    /// Fails if the frames have no direct orientation or the vector cannot
    /// be expressed in this frame.
    pub fn set_ang_vel(&self, other: &ReferenceFrame, value: &Vector) -> Result<(), MechanicsError> {
        let components = value.to_matrix(self)?;
        let not_oriented = || MechanicsError::NotOriented {
            frame: self.name().to_string(),
            other: other.name().to_string(),
        };

        let mut links = self.0.links.borrow_mut();
        let link = links
            .iter_mut()
            .find(|l| l.other_id == other.id())
            .ok_or_else(not_oriented)?;
        link.ang_vel = components.clone();
        link.basis = Basis::Own;
        drop(links);

        let mut links = other.0.links.borrow_mut();
        let link = links
            .iter_mut()
            .find(|l| l.other_id == self.id())
            .ok_or_else(not_oriented)?;
        link.ang_vel = components.map(|e| -e);
        link.basis = Basis::Other;
        Ok(())
    }

    /// Breadth-first search for the chain of frames leading to `target`.
    fn find_path(&self, target: &ReferenceFrame) -> Option<Vec<Rc<FrameData>>> {
        let mut parents: HashMap<usize, Rc<FrameData>> = HashMap::new();
        let mut visited = HashSet::from([self.id()]);
        let mut queue = VecDeque::from([Rc::clone(&self.0)]);
        while let Some(frame) = queue.pop_front() {
            if frame.id == target.id() {
                let mut path = vec![Rc::clone(&frame)];
                let mut current = frame;
                while let Some(previous) = parents.get(&current.id) {
                    path.push(Rc::clone(previous));
                    current = Rc::clone(previous);
                }
                path.reverse();
                return Some(path);
            }
            for link in frame.links.borrow().iter() {
                if let Some(next) = link.other.upgrade() {
                    if visited.insert(next.id) {
                        parents.insert(next.id, Rc::clone(&frame));
                        queue.push_back(next);
                    }
                }
            }
        }
        None
    }

    fn connection_error(&self, other: &ReferenceFrame) -> MechanicsError {
        MechanicsError::FramesNotConnected {
            from: self.name().to_string(),
            to: other.name().to_string(),
        }
    }

    /// Direction cosine matrix that maps components expressed in `other` to
    /// components expressed in this frame.
    ///
    /// # Errors
    ///
    /// Fails if the frames are not connected through orientations.
    pub fn dcm(&self, other: &ReferenceFrame) -> Result<Matrix3, MechanicsError> {
        if self == other {
            return Ok(identity());
        }
        let epoch = ORIENTATION_EPOCH.load(Ordering::Relaxed);
        if let Some((cached_epoch, dcm)) = self.0.cache.borrow().get(&other.id()) {
            if *cached_epoch == epoch {
                return Ok(dcm.clone());
            }
        }

        let path = self.find_path(other).ok_or_else(|| self.connection_error(other))?;
        let mut result = identity();
        for pair in path.windows(2) {
            let links = pair[0].links.borrow();
            let link = links
                .iter()
                .find(|l| l.other_id == pair[1].id)
                .ok_or_else(|| self.connection_error(other))?;
            result = mat_mul(&result, &link.dcm);
        }

        self.0
            .cache
            .borrow_mut()
            .insert(other.id(), (epoch, result.clone()));
        Ok(result)
    }

    /// Angular velocity of this frame in `other`.
    ///
    /// # Errors
    ///
    /// Fails if the frames are not connected through orientations.
    pub fn ang_vel_in(&self, other: &ReferenceFrame) -> Result<Vector, MechanicsError> {
        if self == other {
            return Ok(Vector::zero());
        }
        let path = self.find_path(other).ok_or_else(|| self.connection_error(other))?;
        let mut result = Vector::zero();
        for pair in path.windows(2) {
            let links = pair[0].links.borrow();
            let link = links
                .iter()
                .find(|l| l.other_id == pair[1].id)
                .ok_or_else(|| self.connection_error(other))?;
            let basis = match link.basis {
                Basis::Own => ReferenceFrame(Rc::clone(&pair[0])),
                Basis::Other => ReferenceFrame(Rc::clone(&pair[1])),
            };
            result = result + Vector::new(&basis, link.ang_vel.clone());
        }
        Ok(result)
    }

    /// Angular acceleration of this frame in `other`.
    ///
    /// # Errors
    ///
    /// Fails if the frames are not connected through orientations.
    pub fn ang_acc_in(&self, other: &ReferenceFrame) -> Result<Vector, MechanicsError> {
        self.ang_vel_in(other)?.dt(other)
    }

    /// Creates a new frame oriented relative to this one by a simple rotation.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`ReferenceFrame::orient_axis`].
    pub fn orientnew_axis(
        &self,
        name: &str,
        axis: &Vector,
        angle: impl Into<Expr>,
    ) -> Result<ReferenceFrame, MechanicsError> {
        let frame = ReferenceFrame::new(name);
        frame.orient_axis(self, axis, angle)?;
        Ok(frame)
    }
}

impl PartialEq for ReferenceFrame {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ReferenceFrame {}

impl std::hash::Hash for ReferenceFrame {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReferenceFrame({})", self.name())
    }
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::expr::Values;

    fn eval(m: &Matrix3, values: &Values) -> [[f64; 3]; 3] {
        std::array::from_fn(|i| std::array::from_fn(|j| m[i][j].evaluate(values).unwrap()))
    }

    #[test]
    fn simple_rotation_dcm() {
        let n = ReferenceFrame::new("N");
        let a = ReferenceFrame::new("A");
        let q = Expr::dynamic("q");
        a.orient_axis(&n, &n.z(), q.clone()).unwrap();

        let dcm = a.dcm(&n).unwrap();
        assert_eq!(dcm[0][1], q.sin());
        assert_eq!(dcm[1][0], -q.sin());
        assert_eq!(n.dcm(&a).unwrap()[0][1], -q.sin());
        assert_eq!(a.ang_vel_in(&n).unwrap().to_matrix(&n).unwrap()[2], q.dt());
        assert_eq!(n.ang_vel_in(&a).unwrap().to_matrix(&a).unwrap()[2], -q.dt());
    }

    #[test]
    fn chained_orientations_compose() {
        let n = ReferenceFrame::new("N");
        let a = ReferenceFrame::new("A");
        let b = ReferenceFrame::new("B");
        let (q1, q2) = (Expr::dynamic("q1"), Expr::dynamic("q2"));
        a.orient_axis(&n, &n.z(), q1.clone()).unwrap();
        b.orient_axis(&a, &a.z(), q2.clone()).unwrap();

        let values: Values = [(q1.clone(), 0.3), (q2.clone(), 0.4)].into_iter().collect();
        let composed = eval(&b.dcm(&n).unwrap(), &values);
        let c = ReferenceFrame::new("C");
        c.orient_axis(&n, &n.z(), Expr::number(0.7)).unwrap();
        let direct = eval(&c.dcm(&n).unwrap(), &values);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(composed[i][j], direct[i][j], epsilon = 1e-12);
            }
        }
        let w = b.ang_vel_in(&n).unwrap().to_matrix(&n).unwrap();
        assert_eq!(w[2], q1.dt() + q2.dt());
    }

    #[test]
    fn body_fixed_matches_successive_simple_rotations() {
        let n = ReferenceFrame::new("N");
        let (a1, a2, a3) = (Expr::dynamic("a1"), Expr::dynamic("a2"), Expr::dynamic("a3"));
        let body = ReferenceFrame::new("B");
        body.orient_body_fixed(&n, [a1.clone(), a2.clone(), a3.clone()], "zxy")
            .unwrap();

        let f1 = n.orientnew_axis("F1", &n.z(), a1.clone()).unwrap();
        let f2 = f1.orientnew_axis("F2", &f1.x(), a2.clone()).unwrap();
        let f3 = f2.orientnew_axis("F3", &f2.y(), a3.clone()).unwrap();

        let values: Values = [
            (a1.clone(), 0.2),
            (a2.clone(), -0.5),
            (a3.clone(), 1.1),
            (a1.dt(), 0.7),
            (a2.dt(), -0.3),
            (a3.dt(), 0.9),
        ]
        .into_iter()
        .collect();
        let lhs = eval(&body.dcm(&n).unwrap(), &values);
        let rhs = eval(&f3.dcm(&n).unwrap(), &values);
        let w_lhs = body.ang_vel_in(&n).unwrap().to_matrix(&n).unwrap();
        let w_rhs = f3.ang_vel_in(&n).unwrap().to_matrix(&n).unwrap();
        for i in 0..3 {
            assert_relative_eq!(
                w_lhs[i].evaluate(&values).unwrap(),
                w_rhs[i].evaluate(&values).unwrap(),
                epsilon = 1e-12
            );
            for j in 0..3 {
                assert_relative_eq!(lhs[i][j], rhs[i][j], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn reorienting_replaces_previous_orientation() {
        let n = ReferenceFrame::new("N");
        let a = ReferenceFrame::new("A");
        a.orient_axis(&n, &n.x(), Expr::symbol("alpha")).unwrap();
        a.orient_axis(&n, &n.z(), Expr::symbol("beta")).unwrap();
        assert_eq!(a.dcm(&n).unwrap()[0][1], Expr::symbol("beta").sin());
    }

    #[test]
    fn unconnected_frames_fail() {
        let n = ReferenceFrame::new("N");
        let a = ReferenceFrame::new("A");
        assert!(matches!(
            a.dcm(&n),
            Err(MechanicsError::FramesNotConnected { .. })
        ));
    }
}
