//! The rolling disc assembled from components against the same disc built
//! by hand on the mechanics layer.

use approx::assert_relative_eq;
use brim_core::{LoadGroupHandle, Model, Node, ParameterSet, shared};
use brim_mechanics::{Expr, System, Values, dynamicsymbols};
use brim_models::{DriveTorque, Ground, rolling_disc_manual};
use integration_tests::rolling_disc;

const M: f64 = 1.23;
const R: f64 = 0.45;
const G: f64 = 9.81;
const Q: [f64; 5] = [0.1, 0.3, 0.8, -0.4, 2.5];
const U: [f64; 5] = [-0.3135180192062244, -0.3228102409047853, 0.4, 0.9, 1.0];

fn state(q: &[Expr], u: &[Expr]) -> Values {
    let mut values = Values::new();
    values.extend(q.iter().cloned().zip(Q));
    values.extend(u.iter().cloned().zip(U));
    values.insert(Expr::symbol("g"), G);
    values
}

fn manual() -> (System, Values) {
    let system = rolling_disc_manual().unwrap();
    let mut values = state(&system.q(), &dynamicsymbols("u1:6"));
    values.insert(Expr::symbol("m"), M);
    values.insert(Expr::symbol("r"), R);
    values.insert(Expr::symbol("ixx"), M * R * R / 4.0);
    values.insert(Expr::symbol("iyy"), M * R * R / 2.0);
    (system, values)
}

fn composed(drive: Option<f64>) -> (System, Values) {
    let model = rolling_disc("rolling_disc").unwrap();
    if drive.is_some() {
        let group = DriveTorque::new("drive").unwrap();
        model
            .borrow_mut()
            .add_load_groups(&[LoadGroupHandle::new(shared(group))])
            .unwrap();
    }
    model.borrow_mut().define_all().unwrap();
    let model = model.borrow();

    let mut system = model.to_system().unwrap();
    let ground = model.require_ground().unwrap();
    let normal = {
        let ground = ground.borrow();
        ground.get_normal(&ground.origin().unwrap()).unwrap()
    };
    system
        .apply_uniform_gravity(&(normal * -Expr::symbol("g")))
        .unwrap();
    let u = model.node().u.clone();
    system.set_u_ind(u[2..].to_vec());
    system.set_u_dep(u[..2].to_vec());

    let params: ParameterSet = [
        ("disc_mass", M),
        ("disc_r", R),
        ("disc_ixx", M * R * R / 4.0),
        ("disc_iyy", M * R * R / 2.0),
    ]
    .into_iter()
    .collect();
    let mut values = state(&model.node().q, &u);
    values.extend(model.get_param_values(&params));
    if let Some(torque) = drive {
        values.insert(Expr::dynamic("drive_T"), torque);
    }
    (system, values)
}

fn nonholonomic_residuals(system: &System, values: &Values) -> Vec<f64> {
    let eoms = system.form_eoms().unwrap();
    system
        .nonholonomic_constraints()
        .iter()
        .map(|c| c.subs(eoms.kindiffdict()).evaluate(values).unwrap())
        .collect()
}

#[test]
fn composed_disc_matches_the_manual_disc() {
    let (manual, manual_values) = manual();
    let (composed, composed_values) = composed(None);

    let expected = manual.form_eoms().unwrap().solve(&manual_values).unwrap();
    let actual = composed
        .form_eoms()
        .unwrap()
        .solve(&composed_values)
        .unwrap();
    assert_eq!(actual.len(), 10);
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert_relative_eq!(*a, *e, epsilon = 1e-8);
    }
}

#[test]
fn the_state_satisfies_the_no_slip_constraints() {
    let (manual, manual_values) = manual();
    let (composed, composed_values) = composed(None);

    for (system, values) in [(manual, manual_values), (composed, composed_values)] {
        let residuals = nonholonomic_residuals(&system, &values);
        assert_eq!(residuals.len(), 2);
        for residual in residuals {
            assert_relative_eq!(residual, 0.0, epsilon = 1e-8);
        }
    }
}

#[test]
fn zero_drive_torque_changes_nothing() {
    let (free, free_values) = composed(None);
    let (driven, driven_values) = composed(Some(0.0));
    assert_eq!(driven.actuators().len(), 1);

    let free = free.form_eoms().unwrap().solve(&free_values).unwrap();
    let driven = driven.form_eoms().unwrap().solve(&driven_values).unwrap();
    for (a, b) in free.iter().zip(driven.iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn drive_torque_accelerates_the_spin() {
    let (system, mut values) = composed(Some(0.0));
    let eoms = system.form_eoms().unwrap();
    let at_rest = eoms.solve(&values).unwrap();
    values.insert(Expr::dynamic("drive_T"), 0.5);
    let driven = eoms.solve(&values).unwrap();

    // [q'; u3' u4' u5' u1' u2']
    let spin = 7;
    assert!((driven[spin] - at_rest[spin]).abs() > 1e-3);
    for i in 0..5 {
        assert_relative_eq!(driven[i], at_rest[i], epsilon = 1e-12);
    }
}
