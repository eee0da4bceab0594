//! Rigid bodies, particles and inertia.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    Expr, MechanicsError, Point, ReferenceFrame,
    frame::Matrix3,
    vector::Vector,
};

/// A central inertia tensor expressed in a reference frame.
#[derive(Clone, Debug)]
pub struct Inertia {
    frame: ReferenceFrame,
    matrix: Matrix3,
}

impl Inertia {
    /// Builds a symmetric inertia tensor from its six independent entries.
    pub fn new(
        frame: &ReferenceFrame,
        ixx: impl Into<Expr>,
        iyy: impl Into<Expr>,
        izz: impl Into<Expr>,
        ixy: impl Into<Expr>,
        iyz: impl Into<Expr>,
        izx: impl Into<Expr>,
    ) -> Self {
        let (ixx, iyy, izz) = (ixx.into(), iyy.into(), izz.into());
        let (ixy, iyz, izx) = (ixy.into(), iyz.into(), izx.into());
        Self {
            frame: frame.clone(),
            matrix: [
                [ixx, ixy.clone(), izx.clone()],
                [ixy, iyy, iyz.clone()],
                [izx, iyz, izz],
            ],
        }
    }

    pub fn frame(&self) -> &ReferenceFrame {
        &self.frame
    }

    /// Tensor components in `frame`.
    ///
    /// # Errors
    ///
    /// Fails if `frame` is not connected to the frame of the tensor.
    pub fn to_matrix(&self, frame: &ReferenceFrame) -> Result<Matrix3, MechanicsError> {
        Vector::rotate_matrix(&self.matrix, &self.frame, frame)
    }

    /// Applies the tensor to a vector, producing a vector in the tensor's
    /// frame.
    ///
    /// # Errors
    ///
    /// Fails if the vector cannot be expressed in the tensor's frame.
    pub fn dot(&self, vector: &Vector) -> Result<Vector, MechanicsError> {
        let v = vector.to_matrix(&self.frame)?;
        let product = crate::frame::mat_vec(&self.matrix, &v);
        Ok(Vector::new(&self.frame, product))
    }

    /// Entry `(row, column)` in the tensor's own frame.
    pub fn component(&self, row: usize, column: usize) -> &Expr {
        &self.matrix[row][column]
    }
}

struct RigidBodyData {
    name: String,
    masscenter: Point,
    frame: ReferenceFrame,
    mass: RefCell<Expr>,
    central_inertia: RefCell<Inertia>,
}

/// A rigid body with a mass center, a body-fixed frame, a mass and a central
/// inertia.
///
/// Cloning produces another handle to the same body.
#[derive(Clone)]
pub struct RigidBody(Rc<RigidBodyData>);

impl RigidBody {
    /// Creates a body with symbolic mass `{name}_mass` and symbolic inertia
    /// entries `{name}_ixx` and so on.
    pub fn new(name: &str) -> Self {
        let frame = ReferenceFrame::new(&format!("{name}_frame"));
        let masscenter = Point::new(&format!("{name}_masscenter"));
        let s = |suffix: &str| Expr::symbol(&format!("{name}_{suffix}"));
        let inertia = Inertia::new(&frame, s("ixx"), s("iyy"), s("izz"), s("ixy"), s("iyz"), s("izx"));
        Self::with_parts(name, masscenter, frame, s("mass"), inertia)
    }

    pub fn with_parts(
        name: &str,
        masscenter: Point,
        frame: ReferenceFrame,
        mass: Expr,
        central_inertia: Inertia,
    ) -> Self {
        Self(Rc::new(RigidBodyData {
            name: name.to_string(),
            masscenter,
            frame,
            mass: RefCell::new(mass),
            central_inertia: RefCell::new(central_inertia),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn masscenter(&self) -> &Point {
        &self.0.masscenter
    }

    pub fn frame(&self) -> &ReferenceFrame {
        &self.0.frame
    }

    pub fn mass(&self) -> Expr {
        self.0.mass.borrow().clone()
    }

    pub fn set_mass(&self, mass: impl Into<Expr>) {
        *self.0.mass.borrow_mut() = mass.into();
    }

    pub fn central_inertia(&self) -> Inertia {
        self.0.central_inertia.borrow().clone()
    }

    pub fn set_central_inertia(&self, inertia: Inertia) {
        *self.0.central_inertia.borrow_mut() = inertia;
    }

    pub fn x(&self) -> Vector {
        self.frame().x()
    }

    pub fn y(&self) -> Vector {
        self.frame().y()
    }

    pub fn z(&self) -> Vector {
        self.frame().z()
    }
}

impl PartialEq for RigidBody {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RigidBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RigidBody({})", self.name())
    }
}

struct ParticleData {
    name: String,
    point: Point,
    mass: RefCell<Expr>,
}

/// A point mass.
#[derive(Clone)]
pub struct Particle(Rc<ParticleData>);

impl Particle {
    pub fn new(name: &str, point: Point, mass: impl Into<Expr>) -> Self {
        Self(Rc::new(ParticleData {
            name: name.to_string(),
            point,
            mass: RefCell::new(mass.into()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn point(&self) -> &Point {
        &self.0.point
    }

    pub fn mass(&self) -> Expr {
        self.0.mass.borrow().clone()
    }
}

impl PartialEq for Particle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Particle({})", self.name())
    }
}

/// Any body that contributes inertia to a system.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Rigid(RigidBody),
    Particle(Particle),
}

impl Body {
    pub fn name(&self) -> &str {
        match self {
            Body::Rigid(body) => body.name(),
            Body::Particle(particle) => particle.name(),
        }
    }

    pub fn masscenter(&self) -> &Point {
        match self {
            Body::Rigid(body) => body.masscenter(),
            Body::Particle(particle) => particle.point(),
        }
    }

    pub fn mass(&self) -> Expr {
        match self {
            Body::Rigid(body) => body.mass(),
            Body::Particle(particle) => particle.mass(),
        }
    }
}

impl From<RigidBody> for Body {
    fn from(body: RigidBody) -> Self {
        Body::Rigid(body)
    }
}

impl From<&RigidBody> for Body {
    fn from(body: &RigidBody) -> Self {
        Body::Rigid(body.clone())
    }
}

impl From<Particle> for Body {
    fn from(particle: Particle) -> Self {
        Body::Particle(particle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_body_has_symbolic_parameters() {
        let body = RigidBody::new("disc");
        assert_eq!(body.mass(), Expr::symbol("disc_mass"));
        assert_eq!(body.frame().name(), "disc_frame");
        assert_eq!(body.masscenter().name(), "disc_masscenter");
        assert_eq!(
            *body.central_inertia().component(2, 0),
            Expr::symbol("disc_izx")
        );
    }

    #[test]
    fn inertia_rotates_between_frames() {
        let n = ReferenceFrame::new("N");
        let b = ReferenceFrame::new("B");
        b.orient_axis(&n, &n.z(), Expr::number(std::f64::consts::FRAC_PI_2))
            .unwrap();
        let inertia = Inertia::new(&b, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0);
        let in_n = inertia.to_matrix(&n).unwrap();
        let value = |e: &Expr| e.as_number().unwrap();
        approx::assert_relative_eq!(value(&in_n[0][0]), 2.0, epsilon = 1e-12);
        approx::assert_relative_eq!(value(&in_n[1][1]), 1.0, epsilon = 1e-12);
        approx::assert_relative_eq!(value(&in_n[2][2]), 3.0, epsilon = 1e-12);
    }
}
