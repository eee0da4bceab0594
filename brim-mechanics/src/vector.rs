//! Vectors expressed as sums of components in reference frames.

use std::{
    collections::HashMap,
    fmt,
    ops::{Add, Mul, Neg, Sub},
};

use crate::{
    Expr, MechanicsError, ReferenceFrame,
    frame::{mat_vec, transpose},
};

/// A vector with components attached to one or more reference frames.
///
/// Parts in the same frame are merged and parts whose components are all
/// zero are dropped, so the zero vector has no parts.
#[derive(Clone, Default)]
pub struct Vector {
    parts: Vec<(ReferenceFrame, [Expr; 3])>,
}

fn dot3(a: &[Expr; 3], b: &[Expr; 3]) -> Expr {
    Expr::add_all((0..3).map(|i| &a[i] * &b[i]))
}

fn cross3(a: &[Expr; 3], b: &[Expr; 3]) -> [Expr; 3] {
    [
        &a[1] * &b[2] - &a[2] * &b[1],
        &a[2] * &b[0] - &a[0] * &b[2],
        &a[0] * &b[1] - &a[1] * &b[0],
    ]
}

impl Vector {
    pub fn new(frame: &ReferenceFrame, components: [Expr; 3]) -> Self {
        let mut vector = Self::zero();
        vector.push(frame, components);
        vector
    }

    pub fn zero() -> Self {
        Self { parts: Vec::new() }
    }

    pub fn is_zero(&self) -> bool {
        self.parts.is_empty()
    }

    /// The frames and components making up this vector.
    pub fn parts(&self) -> &[(ReferenceFrame, [Expr; 3])] {
        &self.parts
    }

    fn push(&mut self, frame: &ReferenceFrame, components: [Expr; 3]) {
        if let Some(index) = self.parts.iter().position(|(f, _)| f == frame) {
            let (_, existing) = &self.parts[index];
            let merged: [Expr; 3] = std::array::from_fn(|i| &existing[i] + &components[i]);
            if merged.iter().all(Expr::is_zero) {
                self.parts.remove(index);
            } else {
                self.parts[index].1 = merged;
            }
        } else if !components.iter().all(Expr::is_zero) {
            self.parts.push((frame.clone(), components));
        }
    }

    fn map_components(&self, f: impl Fn(&Expr) -> Expr) -> Self {
        let mut result = Self::zero();
        for (frame, components) in &self.parts {
            result.push(frame, std::array::from_fn(|i| f(&components[i])));
        }
        result
    }

    /// Components of this vector in `frame`.
    ///
    /// # Errors
    ///
    /// Fails if a part's frame is not connected to `frame`.
    pub fn to_matrix(&self, frame: &ReferenceFrame) -> Result<[Expr; 3], MechanicsError> {
        let mut total = [Expr::zero(), Expr::zero(), Expr::zero()];
        for (part_frame, components) in &self.parts {
            let expressed = if part_frame == frame {
                components.clone()
            } else {
                mat_vec(&frame.dcm(part_frame)?, components)
            };
            total = std::array::from_fn(|i| &total[i] + &expressed[i]);
        }
        Ok(total)
    }

    /// Re-expresses this vector in a single frame.
    ///
    /// # Errors
    ///
    /// Fails if a part's frame is not connected to `frame`.
    pub fn express(&self, frame: &ReferenceFrame) -> Result<Vector, MechanicsError> {
        Ok(Vector::new(frame, self.to_matrix(frame)?))
    }

    /// # Errors
    ///
    /// Fails if the frames of the two vectors are not connected.
    pub fn dot(&self, other: &Vector) -> Result<Expr, MechanicsError> {
        let mut terms = Vec::new();
        for (frame, components) in &self.parts {
            terms.push(dot3(components, &other.to_matrix(frame)?));
        }
        Ok(Expr::add_all(terms))
    }

    /// # Errors
    ///
    /// Fails if the frames of the two vectors are not connected.
    pub fn cross(&self, other: &Vector) -> Result<Vector, MechanicsError> {
        let mut result = Vector::zero();
        for (frame, components) in &self.parts {
            result.push(frame, cross3(components, &other.to_matrix(frame)?));
        }
        Ok(result)
    }

    /// # Errors
    ///
    /// Fails if the frames of this vector are not connected.
    pub fn magnitude(&self) -> Result<Expr, MechanicsError> {
        Ok(self.dot(self)?.sqrt())
    }

    /// # Errors
    ///
    /// Fails for the zero vector or if the frames are not connected.
    pub fn normalize(&self) -> Result<Vector, MechanicsError> {
        let magnitude = self.magnitude()?;
        if magnitude.is_zero() {
            return Err(MechanicsError::ZeroVector);
        }
        let inverse = magnitude.pow(-1);
        Ok(self.map_components(|c| c * &inverse))
    }

    /// Time derivative of this vector as seen from `frame`.
    ///
    /// # Errors
    ///
    /// Fails if a part's frame is not connected to `frame`.
    pub fn dt(&self, frame: &ReferenceFrame) -> Result<Vector, MechanicsError> {
        let mut result = Vector::zero();
        for (part_frame, components) in &self.parts {
            result.push(part_frame, components.clone().map(|c| c.dt()));
            if part_frame != frame {
                let omega = part_frame.ang_vel_in(frame)?;
                let local = Vector::new(part_frame, components.clone());
                result = result + omega.cross(&local)?;
            }
        }
        Ok(result)
    }

    /// Partial derivative with respect to `var` as seen from `frame`.
    ///
    /// Parts whose orientation relative to `frame` depends on `var` are first
    /// expressed in `frame`.
    ///
    /// # Errors
    ///
    /// Fails if a part's frame is not connected to `frame`.
    pub fn diff(&self, var: &Expr, frame: &ReferenceFrame) -> Result<Vector, MechanicsError> {
        let mut result = Vector::zero();
        for (part_frame, components) in &self.parts {
            let depends = part_frame != frame
                && frame
                    .dcm(part_frame)?
                    .iter()
                    .flatten()
                    .any(|entry| entry.has(var));
            if depends {
                let expressed = mat_vec(&frame.dcm(part_frame)?, components);
                result.push(frame, expressed.map(|c| c.diff(var)));
            } else {
                result.push(part_frame, components.clone().map(|c| c.diff(var)));
            }
        }
        Ok(result)
    }

    /// Substitutes atoms in every component.
    pub fn subs(&self, map: &HashMap<Expr, Expr>) -> Vector {
        self.map_components(|c| c.subs(map))
    }

    /// Distinct atoms appearing in the components.
    pub fn free_atoms(&self) -> Vec<Expr> {
        let mut atoms = Vec::new();
        for (_, components) in &self.parts {
            for component in components {
                for atom in component.free_atoms() {
                    if !atoms.contains(&atom) {
                        atoms.push(atom);
                    }
                }
            }
        }
        atoms
    }

    /// Components in `frame` evaluated numerically.
    ///
    /// # Errors
    ///
    /// Fails if frames are not connected or a value is missing.
    pub fn evaluate(
        &self,
        frame: &ReferenceFrame,
        values: &crate::Values,
    ) -> Result<[f64; 3], MechanicsError> {
        let [x, y, z] = self.to_matrix(frame)?;
        Ok([x.evaluate(values)?, y.evaluate(values)?, z.evaluate(values)?])
    }

    /// Expresses a matrix of components given in `from` in the frame `to`.
    pub(crate) fn rotate_matrix(
        matrix: &crate::frame::Matrix3,
        from: &ReferenceFrame,
        to: &ReferenceFrame,
    ) -> Result<crate::frame::Matrix3, MechanicsError> {
        if from == to {
            return Ok(matrix.clone());
        }
        let c = to.dcm(from)?;
        Ok(crate::frame::mat_mul(
            &crate::frame::mat_mul(&c, matrix),
            &transpose(&c),
        ))
    }
}

impl PartialEq for Vector {
    /// Structural equality after expressing the difference in one frame.
    fn eq(&self, other: &Self) -> bool {
        let difference = self - other;
        match difference.parts.first() {
            None => true,
            Some((frame, _)) => difference
                .to_matrix(frame)
                .is_ok_and(|components| components.iter().all(Expr::is_zero)),
        }
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(mut self, rhs: Vector) -> Vector {
        for (frame, components) in rhs.parts {
            self.push(&frame, components);
        }
        self
    }
}

impl Add<&Vector> for &Vector {
    type Output = Vector;
    fn add(self, rhs: &Vector) -> Vector {
        self.clone() + rhs.clone()
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        self.map_components(|c| -c)
    }
}

impl Neg for &Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        self.map_components(|c| -c)
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector {
        self + (-rhs)
    }
}

impl Sub<&Vector> for &Vector {
    type Output = Vector;
    fn sub(self, rhs: &Vector) -> Vector {
        self.clone() + (-rhs)
    }
}

impl Mul<Expr> for Vector {
    type Output = Vector;
    fn mul(self, rhs: Expr) -> Vector {
        self.map_components(|c| c * &rhs)
    }
}

impl Mul<&Expr> for &Vector {
    type Output = Vector;
    fn mul(self, rhs: &Expr) -> Vector {
        self.map_components(|c| c * rhs)
    }
}

impl Mul<Vector> for Expr {
    type Output = Vector;
    fn mul(self, rhs: Vector) -> Vector {
        rhs * self
    }
}

impl Mul<&Vector> for &Expr {
    type Output = Vector;
    fn mul(self, rhs: &Vector) -> Vector {
        rhs * self
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, rhs: f64) -> Vector {
        self * Expr::number(rhs)
    }
}

impl Mul<Vector> for f64 {
    type Output = Vector;
    fn mul(self, rhs: Vector) -> Vector {
        rhs * Expr::number(self)
    }
}

impl std::iter::Sum for Vector {
    fn sum<I: Iterator<Item = Vector>>(iter: I) -> Vector {
        iter.fold(Vector::zero(), |acc, v| acc + v)
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parts.is_empty() {
            return f.write_str("0");
        }
        let mut first = true;
        for (frame, components) in &self.parts {
            for (component, axis) in components.iter().zip(["x", "y", "z"]) {
                if component.is_zero() {
                    continue;
                }
                if !first {
                    f.write_str(" + ")?;
                }
                first = false;
                write!(f, "({component})*{frame}.{axis}")?;
            }
        }
        Ok(())
    }
}
