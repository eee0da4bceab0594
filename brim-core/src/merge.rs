use brim_mechanics::{Expr, System};

use crate::BrimError;

fn missing<T: PartialEq + Clone>(existing: &[T], items: &[T]) -> Vec<T> {
    let mut new: Vec<T> = Vec::new();
    for item in items {
        if !existing.contains(item) && !new.contains(item) {
            new.push(item.clone());
        }
    }
    new
}

/// Combines system fragments into one system.
///
/// The inertial frame and fixed point are those of the first system. Every
/// category is concatenated in first-seen order, skipping items that are
/// already present. If any fragment sets its velocity constraints
/// explicitly, the merged system gets the concatenation of the effective
/// velocity constraints of all fragments.
///
/// # Errors
///
/// Fails if `systems` is empty.
pub fn merge_systems(systems: &[System]) -> Result<System, BrimError> {
    let first = systems.first().ok_or(BrimError::NoSystems)?;
    let mut merged = System::new(first.frame(), first.fixed_point());
    let mut velocity_constraints: Vec<Expr> = Vec::new();

    for system in systems {
        let q = merged.q();
        merged.add_coordinates(&missing(&q, system.q_ind()), true)?;
        let q = merged.q();
        merged.add_coordinates(&missing(&q, system.q_dep()), false)?;

        let all_speeds = |s: &System| [s.u(), s.u_aux().to_vec()].concat();
        let u = all_speeds(&merged);
        merged.add_speeds(&missing(&u, system.u_ind()), true)?;
        let u = all_speeds(&merged);
        merged.add_speeds(&missing(&u, system.u_dep()), false)?;
        let u = all_speeds(&merged);
        merged.add_auxiliary_speeds(&missing(&u, system.u_aux()))?;

        merged.add_bodies(&missing(merged.bodies(), system.bodies()))?;
        merged.add_joints(&missing(merged.joints(), system.joints()))?;
        merged.add_loads(&missing(merged.loads(), system.loads()))?;
        merged.add_actuators(&missing(merged.actuators(), system.actuators()))?;

        let kdes: Vec<Expr> = merged
            .kdes()
            .iter()
            .flat_map(|k| [k.clone(), -k])
            .collect();
        merged.add_kdes(&missing(&kdes, system.kdes()))?;
        merged.add_holonomic_constraints(&missing(
            merged.holonomic_constraints(),
            system.holonomic_constraints(),
        ))?;
        merged.add_nonholonomic_constraints(&missing(
            merged.nonholonomic_constraints(),
            system.nonholonomic_constraints(),
        ))?;

        for constraint in system.velocity_constraints() {
            if !velocity_constraints.contains(&constraint) {
                velocity_constraints.push(constraint);
            }
        }
    }

    if systems.iter().any(System::has_explicit_velocity_constraints) {
        merged.set_velocity_constraints(velocity_constraints);
    }
    Ok(merged)
}
