//! Differentiation and substitution.

use std::collections::HashMap;

use super::{Expr, Function, Kind};

/// The independent variable of a differentiation.
enum Variable<'a> {
    Atom(&'a Expr),
    Time,
}

impl Variable<'_> {
    fn is_relevant(&self, expr: &Expr) -> bool {
        match self {
            Variable::Atom(atom) => expr.0.atoms & atom.0.atoms != 0,
            Variable::Time => expr.0.dynamic,
        }
    }
}

type Memo = HashMap<*const (), Expr>;

impl Expr {
    /// Partial derivative with respect to a symbol or time-dependent symbol.
    ///
    /// Differentiating with respect to anything other than an atom returns
    /// zero, since no subtree can be matched against it.
    pub fn diff(&self, atom: &Expr) -> Expr {
        if !atom.is_atom() {
            return Expr::zero();
        }
        self.derive(&Variable::Atom(atom), &mut Memo::new())
    }

    /// Total derivative with respect to time.
    pub fn dt(&self) -> Expr {
        self.derive(&Variable::Time, &mut Memo::new())
    }

    fn derive(&self, var: &Variable<'_>, memo: &mut Memo) -> Expr {
        if !var.is_relevant(self) {
            return Expr::zero();
        }
        if let Some(done) = memo.get(&self.node_id()) {
            return done.clone();
        }

        let result = match &self.0.kind {
            Kind::Number(_) => Expr::zero(),
            Kind::Symbol(_) => match var {
                Variable::Atom(atom) if *atom == self => Expr::one(),
                _ => Expr::zero(),
            },
            Kind::Dynamic(name, order) => match var {
                Variable::Atom(atom) if *atom == self => Expr::one(),
                Variable::Atom(_) => Expr::zero(),
                Variable::Time => Expr::dynamic_of_order(name, order + 1),
            },
            Kind::Add(args) => Expr::add_all(args.iter().map(|arg| arg.derive(var, memo))),
            Kind::Mul(args) => {
                let mut terms = Vec::with_capacity(args.len());
                for (i, arg) in args.iter().enumerate() {
                    let d = arg.derive(var, memo);
                    if d.is_zero() {
                        continue;
                    }
                    let mut factors = args.clone();
                    factors[i] = d;
                    terms.push(Expr::mul_all(factors));
                }
                Expr::add_all(terms)
            }
            Kind::Pow(base, exp) => {
                let db = base.derive(var, memo);
                let de = exp.derive(var, memo);
                if de.is_zero() {
                    exp * base.pow(exp - 1.0) * db
                } else {
                    self * (de * base.ln() + exp * db / base)
                }
            }
            Kind::Call(function, args) => {
                let x = &args[0];
                let dx = x.derive(var, memo);
                match function {
                    Function::Sin => x.cos() * dx,
                    Function::Cos => -(x.sin() * dx),
                    Function::Tan => (1.0 + x.tan().pow(2)) * dx,
                    Function::Abs => x / self * dx,
                    Function::Log => dx / x,
                    Function::Atan2 => {
                        let (y, x) = (&args[0], &args[1]);
                        let dy = dx;
                        let dx = x.derive(var, memo);
                        (x * dy - y * dx) / (x.pow(2) + y.pow(2))
                    }
                }
            }
        };

        memo.insert(self.node_id(), result.clone());
        result
    }

    /// Replaces atoms according to `map`.
    ///
    /// Keys must be symbols or time-dependent symbols; the rebuilt tree is
    /// put back into canonical form.
    pub fn subs(&self, map: &HashMap<Expr, Expr>) -> Expr {
        if map.is_empty() {
            return self.clone();
        }
        let bloom = map.keys().fold(0, |bloom, key| bloom | key.0.atoms);
        self.subs_inner(map, bloom, &mut Memo::new())
    }

    fn subs_inner(&self, map: &HashMap<Expr, Expr>, bloom: u64, memo: &mut Memo) -> Expr {
        if self.0.atoms & bloom == 0 {
            return self.clone();
        }
        if self.is_atom() {
            return map.get(self).cloned().unwrap_or_else(|| self.clone());
        }
        if let Some(done) = memo.get(&self.node_id()) {
            return done.clone();
        }

        let args = self.args();
        let replaced: Vec<Expr> = args
            .iter()
            .map(|arg| arg.subs_inner(map, bloom, memo))
            .collect();
        let unchanged = args
            .iter()
            .zip(&replaced)
            .all(|(old, new)| std::rc::Rc::ptr_eq(&old.0, &new.0));
        let result = if unchanged {
            self.clone()
        } else {
            self.rebuild(replaced)
        };

        memo.insert(self.node_id(), result.clone());
        result
    }

    /// Coefficient of `atom` in an expression that is linear in it.
    pub fn linear_coefficient(&self, atom: &Expr) -> Expr {
        self.diff(atom)
    }
}
