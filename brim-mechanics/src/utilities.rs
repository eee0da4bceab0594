//! Numerical checks on symbolic expressions.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{Expr, Values};

const CHECK_ZERO_SEED: u64 = 0x6272_696d;

/// Evaluates an expression with every atom drawn uniformly from `[0, 1)`.
///
/// Returns `NaN` if the expression cannot be evaluated at the drawn values.
pub fn random_eval<R: Rng>(expr: &Expr, rng: &mut R) -> f64 {
    let values: Values = expr
        .free_atoms()
        .into_iter()
        .map(|atom| (atom, rng.r#gen::<f64>()))
        .collect();
    expr.evaluate(&values).unwrap_or(f64::NAN)
}

/// Checks whether an expression is zero by evaluating it ten times at random
/// values with an absolute tolerance of `1e-8`.
///
/// False positives are unlikely but possible, e.g. for expressions that are
/// nonzero only on a tiny part of the domain.
pub fn check_zero(expr: &Expr) -> bool {
    let mut rng = StdRng::seed_from_u64(CHECK_ZERO_SEED);
    check_zero_with(expr, 10, 1e-8, &mut rng)
}

/// [`check_zero`] with an explicit number of evaluations, tolerance and
/// random number generator.
pub fn check_zero_with<R: Rng>(expr: &Expr, evaluations: usize, atol: f64, rng: &mut R) -> bool {
    if let Some(value) = expr.as_number() {
        return value.abs() <= atol;
    }
    (0..evaluations).all(|_| random_eval(expr, rng).abs() <= atol)
}
