use std::collections::HashMap;

use super::{Expr, Function, Kind};
use crate::MechanicsError;

/// Numeric values assigned to symbols and time-dependent symbols.
pub type Values = HashMap<Expr, f64>;

impl Expr {
    /// Evaluates the expression numerically.
    ///
    /// # Errors
    ///
    /// Returns [`MechanicsError::MissingValue`] if an atom has no value.
    pub fn evaluate(&self, values: &Values) -> Result<f64, MechanicsError> {
        let mut memo = HashMap::new();
        self.evaluate_inner(values, &mut memo)
    }

    fn evaluate_inner(
        &self,
        values: &Values,
        memo: &mut HashMap<*const (), f64>,
    ) -> Result<f64, MechanicsError> {
        if let Some(v) = memo.get(&self.node_id()) {
            return Ok(*v);
        }
        let value = match &self.0.kind {
            Kind::Number(v) => *v,
            Kind::Symbol(_) | Kind::Dynamic(..) => {
                *values
                    .get(self)
                    .ok_or_else(|| MechanicsError::MissingValue {
                        symbol: self.to_string(),
                    })?
            }
            Kind::Add(args) => {
                let mut total = 0.0;
                for arg in args {
                    total += arg.evaluate_inner(values, memo)?;
                }
                total
            }
            Kind::Mul(args) => {
                let mut total = 1.0;
                for arg in args {
                    total *= arg.evaluate_inner(values, memo)?;
                }
                total
            }
            Kind::Pow(base, exp) => {
                let base = base.evaluate_inner(values, memo)?;
                let exp = exp.evaluate_inner(values, memo)?;
                if exp == 0.5 {
                    base.sqrt()
                } else if exp.fract() == 0.0 && exp.abs() < f64::from(i32::MAX) {
                    base.powi(exp as i32)
                } else {
                    base.powf(exp)
                }
            }
            Kind::Call(function, args) => {
                let x = args[0].evaluate_inner(values, memo)?;
                match function {
                    Function::Sin => x.sin(),
                    Function::Cos => x.cos(),
                    Function::Tan => x.tan(),
                    Function::Abs => x.abs(),
                    Function::Log => x.ln(),
                    Function::Atan2 => x.atan2(args[1].evaluate_inner(values, memo)?),
                }
            }
        };
        memo.insert(self.node_id(), value);
        Ok(value)
    }
}
