//! Kane's method.
//!
//! The generalized active and inertia forces are formed symbolically for all
//! generalized speeds, including auxiliary ones. Elimination of dependent
//! speeds happens numerically when the equations are evaluated, which keeps
//! the symbolic expressions small.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use tracing::trace;

use crate::{Body, Expr, Load, MechanicsError, System, Values, Vector};

/// Equations of motion in first-order form.
#[derive(Clone, Debug)]
pub struct EquationsOfMotion {
    q: Vec<Expr>,
    u: Vec<Expr>,
    n_ind: usize,
    u_aux: Vec<Expr>,
    /// For every kinematic differential equation, the index of its
    /// coordinate rate, the rate's coefficient and the remainder.
    kinematics: Vec<(usize, Expr, Expr)>,
    qdot_map: HashMap<Expr, Expr>,
    /// Rows for the speeds followed by the auxiliary speeds; one column per
    /// speed derivative.
    mass: Vec<Vec<Expr>>,
    forcing: Vec<Expr>,
    /// Coefficients of all speeds, including auxiliary ones.
    constraint: Vec<Vec<Expr>>,
    constraint_rate: Vec<Vec<Expr>>,
    constraint_rate_rest: Vec<Expr>,
}

fn zero_map(atoms: impl IntoIterator<Item = Expr>) -> HashMap<Expr, Expr> {
    atoms.into_iter().map(|a| (a, Expr::zero())).collect()
}

fn partials(vector: &Vector, speeds: &[Expr], system: &System) -> Result<Vec<Vector>, MechanicsError> {
    speeds.iter().map(|s| vector.diff(s, system.frame())).collect()
}

/// Extracts the coordinate rate solved for by each kinematic equation.
fn parse_kinematics(
    q: &[Expr],
    kdes: &[Expr],
) -> Result<(Vec<(usize, Expr, Expr)>, HashMap<Expr, Expr>), MechanicsError> {
    let invalid = |kde: &Expr, reason| MechanicsError::InvalidKinematics {
        equation: kde.to_string(),
        reason,
    };
    if kdes.len() != q.len() {
        return Err(MechanicsError::InvalidKinematics {
            equation: format!("{} equations", kdes.len()),
            reason: "the number of equations must equal the number of coordinates",
        });
    }

    let rates: Vec<Expr> = q.iter().map(Expr::dt).collect();
    let mut used = vec![false; q.len()];
    let mut kinematics = Vec::with_capacity(kdes.len());
    let mut qdot_map = HashMap::new();
    for kde in kdes {
        let mut found = None;
        for (i, rate) in rates.iter().enumerate() {
            let coefficient = kde.diff(rate);
            if coefficient.is_zero() {
                continue;
            }
            if found.is_some() {
                return Err(invalid(kde, "each equation must contain a single coordinate rate"));
            }
            found = Some((i, coefficient));
        }
        let (i, coefficient) = found.ok_or_else(|| invalid(kde, "no coordinate rate found"))?;
        if used[i] {
            return Err(invalid(kde, "coordinate rate appears in multiple equations"));
        }
        used[i] = true;
        let rest = kde.subs(&zero_map([rates[i].clone()]));
        qdot_map.insert(rates[i].clone(), -(&rest / &coefficient));
        kinematics.push((i, coefficient, rest));
    }
    Ok((kinematics, qdot_map))
}

pub(crate) fn form(system: &System) -> Result<EquationsOfMotion, MechanicsError> {
    let frame = system.frame();
    let q = system.q();
    let u = system.u();
    let u_aux = system.u_aux().to_vec();
    let speeds: Vec<Expr> = u.iter().chain(&u_aux).cloned().collect();
    let rates: Vec<Expr> = u.iter().map(Expr::dt).collect();

    let (kinematics, qdot_map) = parse_kinematics(&q, system.kdes())?;
    let aux_zero = zero_map(u_aux.iter().cloned().chain(u_aux.iter().map(Expr::dt)));
    let rates_zero = zero_map(rates.iter().cloned());

    // Velocity constraints.
    let constraints: Vec<Expr> = system
        .velocity_constraints()
        .iter()
        .map(|c| c.subs(&qdot_map))
        .collect();
    if constraints.len() != system.u_dep().len() {
        return Err(MechanicsError::ConstraintMismatch {
            constraints: constraints.len(),
            dependent: system.u_dep().len(),
        });
    }
    let constraint: Vec<Vec<Expr>> = constraints
        .iter()
        .map(|c| speeds.iter().map(|s| c.diff(s)).collect())
        .collect();
    let mut constraint_rate = Vec::with_capacity(constraints.len());
    let mut constraint_rate_rest = Vec::with_capacity(constraints.len());
    for c in &constraints {
        let derivative = c.dt().subs(&qdot_map).subs(&aux_zero);
        constraint_rate.push(rates.iter().map(|r| derivative.diff(r)).collect::<Vec<_>>());
        constraint_rate_rest.push(derivative.subs(&rates_zero));
    }

    // Generalized inertia forces.
    let mut fr_star = vec![Expr::zero(); speeds.len()];
    for body in system.bodies() {
        let velocity = body.masscenter().vel(frame)?.subs(&qdot_map);
        let partial_v = partials(&velocity, &speeds, system)?;
        let acceleration = velocity.subs(&aux_zero).dt(frame)?.subs(&qdot_map);
        let inertia_force = &acceleration * &(-body.mass());

        let rotational = match body {
            Body::Rigid(rigid) => {
                let omega = rigid.frame().ang_vel_in(frame)?.subs(&qdot_map);
                let partial_w = partials(&omega, &speeds, system)?;
                let omega = omega.subs(&aux_zero);
                let alpha = omega.dt(frame)?.subs(&qdot_map);
                let inertia = rigid.central_inertia();
                let torque = -(inertia.dot(&alpha)? + omega.cross(&inertia.dot(&omega)?)?);
                Some((partial_w, torque))
            }
            Body::Particle(_) => None,
        };

        for r in 0..speeds.len() {
            let mut term = partial_v[r].dot(&inertia_force)?;
            if let Some((partial_w, torque)) = &rotational {
                term = term + partial_w[r].dot(torque)?;
            }
            fr_star[r] = &fr_star[r] + term;
        }
        trace!(body = body.name(), "added generalized inertia forces");
    }

    // Generalized active forces.
    let mut fr = vec![Expr::zero(); speeds.len()];
    for load in system.all_loads() {
        let (velocity, vector) = match &load {
            Load::Force { point, vector } => (point.vel(frame)?, vector),
            Load::Torque { frame: body_frame, vector } => (body_frame.ang_vel_in(frame)?, vector),
        };
        let velocity = velocity.subs(&qdot_map);
        let vector = vector.subs(&qdot_map).subs(&aux_zero);
        for (r, partial) in partials(&velocity, &speeds, system)?.iter().enumerate() {
            fr[r] = &fr[r] + partial.dot(&vector)?;
        }
    }

    let mass = fr_star
        .iter()
        .map(|f| rates.iter().map(|rate| -f.diff(rate)).collect())
        .collect();
    let forcing = fr
        .iter()
        .zip(&fr_star)
        .map(|(f, f_star)| f + f_star.subs(&rates_zero))
        .collect();

    Ok(EquationsOfMotion {
        q,
        u,
        n_ind: system.u_ind().len(),
        u_aux,
        kinematics,
        qdot_map,
        mass,
        forcing,
        constraint,
        constraint_rate,
        constraint_rate_rest,
    })
}

fn evaluate_matrix(rows: &[Vec<Expr>], columns: usize, values: &Values) -> Result<DMatrix<f64>, MechanicsError> {
    let mut data = Vec::with_capacity(rows.len() * columns);
    for row in rows {
        for entry in row.iter().take(columns) {
            data.push(entry.evaluate(values)?);
        }
    }
    Ok(DMatrix::from_row_slice(rows.len(), columns, &data))
}

fn evaluate_vector(entries: &[Expr], values: &Values) -> Result<DVector<f64>, MechanicsError> {
    let data = entries
        .iter()
        .map(|e| e.evaluate(values))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DVector::from_vec(data))
}

/// Numerically evaluated equations.
struct Numeric {
    mass_full: DMatrix<f64>,
    forcing_full: DVector<f64>,
    /// Maps independent speeds to dependent speeds.
    a_ind: DMatrix<f64>,
    /// Maps auxiliary speeds to dependent speeds.
    a_aux: DMatrix<f64>,
    mass: DMatrix<f64>,
    forcing: DVector<f64>,
}

impl EquationsOfMotion {
    pub fn q(&self) -> &[Expr] {
        &self.q
    }

    /// Independent followed by dependent speeds.
    pub fn u(&self) -> &[Expr] {
        &self.u
    }

    pub fn u_aux(&self) -> &[Expr] {
        &self.u_aux
    }

    /// Maps every coordinate rate to its expression in speeds and coordinates.
    pub fn kindiffdict(&self) -> &HashMap<Expr, Expr> {
        &self.qdot_map
    }

    /// Symbolic rows `-d(Fr*)/du'` for the speeds followed by the auxiliary
    /// speeds, before elimination of dependent speeds.
    pub fn mass_rows(&self) -> &[Vec<Expr>] {
        &self.mass
    }

    /// Symbolic rows `Fr + Fr*|u'=0` matching [`EquationsOfMotion::mass_rows`].
    pub fn forcing_rows(&self) -> &[Expr] {
        &self.forcing
    }

    fn numeric(&self, values: &Values) -> Result<Numeric, MechanicsError> {
        let n = self.u.len();
        let p = self.n_ind;
        let m = n - p;
        let a = self.u_aux.len();
        let nq = self.q.len();

        let mass = evaluate_matrix(&self.mass, n, values)?;
        let forcing = evaluate_vector(&self.forcing, values)?;

        let (a_ind, a_aux) = if m == 0 {
            (DMatrix::zeros(0, p), DMatrix::zeros(0, a))
        } else {
            let b = evaluate_matrix(&self.constraint, n + a, values)?;
            let lu = b.columns(p, m).into_owned().lu();
            let a_ind = lu
                .solve(&(-b.columns(0, p).into_owned()))
                .ok_or(MechanicsError::Singular("eliminating dependent speeds"))?;
            let a_aux = lu
                .solve(&(-b.columns(n, a).into_owned()))
                .ok_or(MechanicsError::Singular("eliminating dependent speeds"))?;
            (a_ind, a_aux)
        };

        let mut dynamic_mass = DMatrix::zeros(n, n);
        let mut dynamic_forcing = DVector::zeros(n);
        let reduced_mass = mass.rows(0, p) + a_ind.transpose() * mass.rows(p, m);
        let reduced_forcing = forcing.rows(0, p) + a_ind.transpose() * forcing.rows(p, m);
        dynamic_mass.rows_mut(0, p).copy_from(&reduced_mass);
        dynamic_forcing.rows_mut(0, p).copy_from(&reduced_forcing);
        if m > 0 {
            let rate = evaluate_matrix(&self.constraint_rate, n, values)?;
            let rest = evaluate_vector(&self.constraint_rate_rest, values)?;
            dynamic_mass.rows_mut(p, m).copy_from(&rate);
            dynamic_forcing.rows_mut(p, m).copy_from(&(-rest));
        }

        let mut mass_full = DMatrix::zeros(nq + n, nq + n);
        let mut forcing_full = DVector::zeros(nq + n);
        for (row, (column, coefficient, rest)) in self.kinematics.iter().enumerate() {
            mass_full[(row, *column)] = coefficient.evaluate(values)?;
            forcing_full[row] = -rest.evaluate(values)?;
        }
        mass_full.view_mut((nq, nq), (n, n)).copy_from(&dynamic_mass);
        forcing_full.rows_mut(nq, n).copy_from(&dynamic_forcing);

        Ok(Numeric {
            mass_full,
            forcing_full,
            a_ind,
            a_aux,
            mass,
            forcing,
        })
    }

    /// Mass matrix of the full first-order system `[q'; u']`.
    ///
    /// # Errors
    ///
    /// Fails if a value is missing or the constraints are singular.
    pub fn mass_matrix_full(&self, values: &Values) -> Result<DMatrix<f64>, MechanicsError> {
        Ok(self.numeric(values)?.mass_full)
    }

    /// Forcing vector of the full first-order system `[q'; u']`.
    ///
    /// # Errors
    ///
    /// Fails if a value is missing or the constraints are singular.
    pub fn forcing_full(&self, values: &Values) -> Result<DVector<f64>, MechanicsError> {
        Ok(self.numeric(values)?.forcing_full)
    }

    /// Solves for the state derivative `[q'; u']`.
    ///
    /// # Errors
    ///
    /// Fails if a value is missing or the mass matrix is singular.
    pub fn solve(&self, values: &Values) -> Result<DVector<f64>, MechanicsError> {
        let numeric = self.numeric(values)?;
        numeric
            .mass_full
            .lu()
            .solve(&numeric.forcing_full)
            .ok_or(MechanicsError::Singular("solving for the state derivative"))
    }

    /// Residuals of the auxiliary equations for given speed derivatives.
    ///
    /// The residuals vanish when the noncontributing loads take their actual
    /// values.
    ///
    /// # Errors
    ///
    /// Fails if a value is missing or the constraints are singular.
    pub fn auxiliary_equations(&self, values: &Values, u_dot: &DVector<f64>) -> Result<DVector<f64>, MechanicsError> {
        let numeric = self.numeric(values)?;
        let n = self.u.len();
        let p = self.n_ind;
        let a = self.u_aux.len();
        let generalized = &numeric.forcing - &numeric.mass * u_dot;
        let aux = generalized.rows(n, a).into_owned();
        let dependent = generalized.rows(p, n - p).into_owned();
        Ok(aux + numeric.a_aux.transpose() * dependent)
    }

    /// Solves the auxiliary equations for noncontributing load magnitudes.
    ///
    /// The auxiliary equations are linear in these magnitudes, so they are
    /// recovered by probing each unknown with a unit value.
    ///
    /// # Errors
    ///
    /// Fails if a value is missing, the unknown count does not match the
    /// number of auxiliary speeds, or the system is singular.
    pub fn solve_auxiliary(&self, values: &Values, unknowns: &[Expr]) -> Result<Vec<f64>, MechanicsError> {
        if unknowns.len() != self.u_aux.len() {
            return Err(MechanicsError::ConstraintMismatch {
                constraints: self.u_aux.len(),
                dependent: unknowns.len(),
            });
        }
        let mut probe = values.clone();
        for unknown in unknowns {
            probe.insert(unknown.clone(), 0.0);
        }
        let nq = self.q.len();
        let u_dot = self.solve(&probe)?.rows(nq, self.u.len()).into_owned();
        let base = self.auxiliary_equations(&probe, &u_dot)?;

        let mut jacobian = DMatrix::zeros(unknowns.len(), unknowns.len());
        for (k, unknown) in unknowns.iter().enumerate() {
            probe.insert(unknown.clone(), 1.0);
            let column = self.auxiliary_equations(&probe, &u_dot)? - &base;
            jacobian.set_column(k, &column);
            probe.insert(unknown.clone(), 0.0);
        }
        let solution = jacobian
            .lu()
            .solve(&(-base))
            .ok_or(MechanicsError::Singular("solving the auxiliary equations"))?;
        Ok(solution.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{Particle, Point, ReferenceFrame, RigidBody};

    #[test]
    fn simple_pendulum() {
        let n = ReferenceFrame::new("N");
        let b = ReferenceFrame::new("B");
        let o = Point::new("O");
        o.set_vel(&n, Vector::zero());
        let (q, u) = (Expr::dynamic("q"), Expr::dynamic("u"));
        let (m, l, g) = (Expr::symbol("m"), Expr::symbol("l"), Expr::symbol("g"));
        b.orient_axis(&n, &n.z(), q.clone()).unwrap();
        b.set_ang_vel(&n, &(n.z() * u.clone())).unwrap();
        let bob = o.locatenew("P", b.x() * l.clone());
        bob.v2pt_theory(&o, &n, &b).unwrap();

        let mut system = System::new(&n, &o);
        system.add_coordinates(&[q.clone()], true).unwrap();
        system.add_speeds(&[u.clone()], true).unwrap();
        system.add_kdes(&[q.dt() - &u]).unwrap();
        system
            .add_bodies(&[Particle::new("bob", bob.clone(), m.clone()).into()])
            .unwrap();
        system
            .add_loads(&[Load::force(&bob, n.x() * (&m * &g))])
            .unwrap();

        let eoms = system.form_eoms().unwrap();
        let values: Values = [(q, 0.4), (u, 0.3), (m, 2.0), (l, 1.5), (g, 9.81)]
            .into_iter()
            .collect();

        let mass = eoms.mass_matrix_full(&values).unwrap();
        assert_relative_eq!(mass[(0, 0)], 1.0);
        assert_relative_eq!(mass[(1, 1)], 2.0 * 1.5 * 1.5, epsilon = 1e-12);
        let forcing = eoms.forcing_full(&values).unwrap();
        assert_relative_eq!(forcing[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(forcing[1], -2.0 * 9.81 * 1.5 * 0.4_f64.sin(), epsilon = 1e-12);

        let x_dot = eoms.solve(&values).unwrap();
        assert_relative_eq!(x_dot[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(x_dot[1], -9.81 / 1.5 * 0.4_f64.sin(), epsilon = 1e-12);
    }

    #[test]
    fn spinning_body_has_no_rotational_acceleration_without_torque() {
        let ground = RigidBody::new("ground");
        let n = ground.frame();
        let body = RigidBody::new("body");
        let (q, u) = (Expr::dynamic("q"), Expr::dynamic("u"));
        body.frame().orient_axis(n, &n.z(), q.clone()).unwrap();
        body.masscenter().set_pos(ground.masscenter(), Vector::zero());
        body.masscenter().set_vel(n, Vector::zero());

        let mut system = System::from_newtonian(&ground);
        system.add_coordinates(&[q.clone()], true).unwrap();
        system.add_speeds(&[u.clone()], true).unwrap();
        system.add_kdes(&[u.clone() - q.dt()]).unwrap();
        system.add_bodies(&[body.clone().into()]).unwrap();
        system
            .add_loads(&[Load::torque(body.frame(), n.z() * Expr::symbol("T"))])
            .unwrap();

        let eoms = system.form_eoms().unwrap();
        assert_eq!(eoms.kindiffdict()[&q.dt()], u);
        let values: Values = [
            (q, 0.0),
            (u, 3.0),
            (Expr::symbol("T"), 0.5),
            (Expr::symbol("body_izz"), 0.25),
        ]
        .into_iter()
        .collect();
        let x_dot = eoms.solve(&values).unwrap();
        assert_relative_eq!(x_dot[0], 3.0);
        assert_relative_eq!(x_dot[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_constraints_are_rejected() {
        let ground = RigidBody::new("ground");
        let mut system = System::from_newtonian(&ground);
        let u = Expr::dynamic("u");
        system.add_nonholonomic_constraints(&[u]).unwrap();
        assert!(matches!(
            system.form_eoms(),
            Err(MechanicsError::ConstraintMismatch { .. })
        ));
    }
}
