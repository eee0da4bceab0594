//! Canonical symbolic expressions.
//!
//! An [`Expr`] is an immutable, reference-counted expression tree.
//! Constructors canonicalize eagerly: sums and products are flattened,
//! numeric parts are folded, like terms are combined and operands are
//! sorted, so structurally equal inputs produce structurally equal trees.
//! Every node caches a structural hash which makes equality checks and
//! hash-map lookups cheap.

mod calculus;
mod eval;
mod ops;

use std::{
    cmp::Ordering,
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

pub use eval::Values;

/// Elementary functions that may appear in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Atan2,
    Abs,
    Log,
}

impl Function {
    fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Atan2 => "atan2",
            Function::Abs => "Abs",
            Function::Log => "log",
        }
    }
}

/// A symbolic scalar expression.
#[derive(Clone)]
pub struct Expr(Rc<Node>);

struct Node {
    kind: Kind,
    hash: u64,
    /// Bloom filter over the names of the atoms in this subtree.
    atoms: u64,
    /// Whether a time-dependent symbol occurs in this subtree.
    dynamic: bool,
}

enum Kind {
    Number(f64),
    Symbol(Rc<str>),
    Dynamic(Rc<str>, u32),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Expr, Expr),
    Call(Function, Vec<Expr>),
}

/// Borrowed view of an expression's top-level structure.
#[derive(Debug, Clone, Copy)]
pub enum View<'a> {
    Number(f64),
    Symbol(&'a str),
    /// A function of time with its derivative order.
    Dynamic(&'a str, u32),
    Add(&'a [Expr]),
    Mul(&'a [Expr]),
    Pow(&'a Expr, &'a Expr),
    Call(Function, &'a [Expr]),
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn hash_bytes(seed: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(seed, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

fn combine(seed: u64, value: u64) -> u64 {
    seed ^ value
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

fn name_bit(name: &str) -> u64 {
    1u64 << (hash_bytes(FNV_OFFSET, name.as_bytes()) % 64)
}

impl Expr {
    fn from_kind(kind: Kind) -> Self {
        let (hash, atoms, dynamic) = match &kind {
            Kind::Number(v) => (hash_bytes(combine(FNV_OFFSET, 1), &v.to_bits().to_le_bytes()), 0, false),
            Kind::Symbol(name) => (
                hash_bytes(combine(FNV_OFFSET, 2), name.as_bytes()),
                name_bit(name),
                false,
            ),
            Kind::Dynamic(name, order) => (
                combine(hash_bytes(combine(FNV_OFFSET, 3), name.as_bytes()), u64::from(*order)),
                name_bit(name),
                true,
            ),
            Kind::Add(args) => Self::summarize(4, args),
            Kind::Mul(args) => Self::summarize(5, args),
            Kind::Pow(base, exp) => {
                let (hash, atoms, dynamic) = Self::summarize(6, &[base.clone(), exp.clone()]);
                (hash, atoms, dynamic)
            }
            Kind::Call(function, args) => Self::summarize(16 + *function as u64, args),
        };
        Expr(Rc::new(Node {
            kind,
            hash,
            atoms,
            dynamic,
        }))
    }

    fn summarize(tag: u64, args: &[Expr]) -> (u64, u64, bool) {
        args.iter().fold((combine(FNV_OFFSET, tag), 0, false), |(h, a, d), arg| {
            (combine(h, arg.0.hash), a | arg.0.atoms, d || arg.0.dynamic)
        })
    }

    /// Creates a numeric constant.
    pub fn number(value: f64) -> Self {
        // Normalize negative zero so that it hashes like zero.
        let value = if value == 0.0 { 0.0 } else { value };
        Self::from_kind(Kind::Number(value))
    }

    pub fn zero() -> Self {
        Self::number(0.0)
    }

    pub fn one() -> Self {
        Self::number(1.0)
    }

    /// Creates a constant symbol.
    pub fn symbol(name: &str) -> Self {
        Self::from_kind(Kind::Symbol(Rc::from(name)))
    }

    /// Creates a function of time, the analogue of a dynamic symbol.
    pub fn dynamic(name: &str) -> Self {
        Self::from_kind(Kind::Dynamic(Rc::from(name), 0))
    }

    pub(crate) fn dynamic_of_order(name: &Rc<str>, order: u32) -> Self {
        Self::from_kind(Kind::Dynamic(Rc::clone(name), order))
    }

    pub fn view(&self) -> View<'_> {
        match &self.0.kind {
            Kind::Number(v) => View::Number(*v),
            Kind::Symbol(name) => View::Symbol(name),
            Kind::Dynamic(name, order) => View::Dynamic(name, *order),
            Kind::Add(args) => View::Add(args),
            Kind::Mul(args) => View::Mul(args),
            Kind::Pow(base, exp) => View::Pow(base, exp),
            Kind::Call(function, args) => View::Call(*function, args),
        }
    }

    /// Returns the value if this expression is a numeric constant.
    pub fn as_number(&self) -> Option<f64> {
        match self.0.kind {
            Kind::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_number() == Some(0.0)
    }

    pub fn is_one(&self) -> bool {
        self.as_number() == Some(1.0)
    }

    /// Whether this is a symbol or a time-dependent symbol of any order.
    pub fn is_atom(&self) -> bool {
        matches!(self.0.kind, Kind::Symbol(_) | Kind::Dynamic(..))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.0.kind, Kind::Dynamic(..))
    }

    /// The name of a symbol or time-dependent symbol.
    pub fn name(&self) -> Option<&str> {
        match &self.0.kind {
            Kind::Symbol(name) | Kind::Dynamic(name, _) => Some(name),
            _ => None,
        }
    }

    /// Whether the expression depends on time.
    pub fn depends_on_time(&self) -> bool {
        self.0.dynamic
    }

    /// Whether `atom` occurs in this expression.
    pub fn has(&self, atom: &Expr) -> bool {
        if self.0.atoms & atom.0.atoms == 0 {
            return false;
        }
        if self == atom {
            return true;
        }
        self.args().iter().any(|arg| arg.has(atom))
    }

    fn args(&self) -> Vec<Expr> {
        match &self.0.kind {
            Kind::Number(_) | Kind::Symbol(_) | Kind::Dynamic(..) => Vec::new(),
            Kind::Add(args) | Kind::Mul(args) | Kind::Call(_, args) => args.clone(),
            Kind::Pow(base, exp) => vec![base.clone(), exp.clone()],
        }
    }

    /// Collects the distinct symbols and time-dependent symbols, in order of
    /// first occurrence.
    pub fn free_atoms(&self) -> Vec<Expr> {
        let mut seen = std::collections::HashSet::new();
        let mut atoms = Vec::new();
        self.collect_atoms(&mut seen, &mut atoms);
        atoms
    }

    /// Time-dependent symbols in this expression, including the underlying
    /// function of every derivative that occurs.
    pub fn dynamic_symbols(&self) -> Vec<Expr> {
        let mut result: Vec<Expr> = Vec::new();
        for atom in self.free_atoms() {
            if let Kind::Dynamic(name, order) = &atom.0.kind {
                if *order > 0 {
                    let base = Self::dynamic_of_order(name, 0);
                    if !result.contains(&base) {
                        result.push(base);
                    }
                }
                if !result.contains(&atom) {
                    result.push(atom);
                }
            }
        }
        result
    }

    fn collect_atoms(&self, seen: &mut std::collections::HashSet<Expr>, out: &mut Vec<Expr>) {
        if self.is_atom() {
            if seen.insert(self.clone()) {
                out.push(self.clone());
            }
            return;
        }
        for arg in self.args() {
            arg.collect_atoms(seen, out);
        }
    }

    /// Sum of terms in canonical form.
    pub fn add_all<I: IntoIterator<Item = Expr>>(terms: I) -> Self {
        let mut constant = 0.0;
        let mut order: Vec<Expr> = Vec::new();
        let mut coefficients: HashMap<Expr, f64> = HashMap::new();

        let mut accumulate = |term: &Expr| {
            if let Kind::Number(v) = term.0.kind {
                constant += v;
                return;
            }
            let (coefficient, rest) = term.split_coefficient();
            match coefficients.get_mut(&rest) {
                Some(total) => *total += coefficient,
                None => {
                    coefficients.insert(rest.clone(), coefficient);
                    order.push(rest);
                }
            }
        };

        for term in terms {
            match &term.0.kind {
                Kind::Add(inner) => inner.iter().for_each(&mut accumulate),
                _ => accumulate(&term),
            }
        }

        let mut args: Vec<Expr> = order
            .into_iter()
            .filter_map(|rest| {
                let coefficient = coefficients[&rest];
                if coefficient == 0.0 {
                    None
                } else if coefficient == 1.0 {
                    Some(rest)
                } else {
                    Some(Self::mul_all([Self::number(coefficient), rest]))
                }
            })
            .collect();
        args.sort();
        if constant != 0.0 {
            args.insert(0, Self::number(constant));
        }

        match args.len() {
            0 => Self::zero(),
            1 => args.remove(0),
            _ => Self::from_kind(Kind::Add(args)),
        }
    }

    /// Product of factors in canonical form.
    pub fn mul_all<I: IntoIterator<Item = Expr>>(factors: I) -> Self {
        let mut coefficient = 1.0;
        let mut order: Vec<Expr> = Vec::new();
        let mut exponents: HashMap<Expr, Vec<Expr>> = HashMap::new();

        let mut accumulate = |factor: &Expr| {
            let (base, exp) = match &factor.0.kind {
                Kind::Number(v) => {
                    coefficient *= v;
                    return;
                }
                Kind::Pow(base, exp) => (base.clone(), exp.clone()),
                _ => (factor.clone(), Self::one()),
            };
            match exponents.get_mut(&base) {
                Some(list) => list.push(exp),
                None => {
                    exponents.insert(base.clone(), vec![exp]);
                    order.push(base);
                }
            }
        };

        for factor in factors {
            match &factor.0.kind {
                Kind::Mul(inner) => inner.iter().for_each(&mut accumulate),
                _ => accumulate(&factor),
            }
        }

        if coefficient == 0.0 {
            return Self::zero();
        }

        let mut powered = Vec::with_capacity(order.len());
        let mut needs_refold = false;
        for base in order {
            let list = exponents.remove(&base).unwrap_or_default();
            let factor = if list.len() == 1 && list[0].is_one() {
                base
            } else {
                base.pow(Self::add_all(list))
            };
            match factor.0.kind {
                Kind::Number(_) | Kind::Mul(_) => needs_refold = true,
                _ => {}
            }
            powered.push(factor);
        }

        if needs_refold {
            powered.insert(0, Self::number(coefficient));
            return Self::mul_all(powered);
        }

        // A scaled sum is stored expanded so that like terms can cancel.
        if coefficient != 1.0 && powered.len() == 1 {
            if let Kind::Add(terms) = &powered[0].0.kind {
                return Self::add_all(
                    terms
                        .iter()
                        .map(|term| Self::mul_all([Self::number(coefficient), term.clone()])),
                );
            }
        }

        powered.sort();
        if coefficient != 1.0 {
            powered.insert(0, Self::number(coefficient));
        }

        match powered.len() {
            0 => Self::number(coefficient),
            1 => powered.remove(0),
            _ => Self::from_kind(Kind::Mul(powered)),
        }
    }

    /// Splits a term into its numeric coefficient and the remaining factors.
    fn split_coefficient(&self) -> (f64, Expr) {
        if let Kind::Mul(args) = &self.0.kind {
            if let Some(c) = args[0].as_number() {
                let rest = &args[1..];
                return if rest.len() == 1 {
                    (c, rest[0].clone())
                } else {
                    (c, Self::from_kind(Kind::Mul(rest.to_vec())))
                };
            }
        }
        (1.0, self.clone())
    }

    /// Whether the term carries a negative numeric coefficient.
    pub(crate) fn is_negative_term(&self) -> bool {
        match &self.0.kind {
            Kind::Number(v) => *v < 0.0,
            Kind::Mul(args) => args[0].as_number().is_some_and(|c| c < 0.0),
            _ => false,
        }
    }

    pub fn pow(&self, exponent: impl Into<Expr>) -> Self {
        let exponent = exponent.into();
        if exponent.is_zero() {
            return Self::one();
        }
        if exponent.is_one() {
            return self.clone();
        }
        let integer_exponent = exponent.as_number().filter(|e| e.fract() == 0.0);
        match (&self.0.kind, exponent.as_number()) {
            (Kind::Number(b), Some(e)) => {
                let value = b.powf(e);
                if value.is_finite() && (*b >= 0.0 || e.fract() == 0.0) {
                    return Self::number(value);
                }
            }
            (Kind::Pow(base, inner), _) if integer_exponent.is_some() => {
                return base.pow(Self::mul_all([inner.clone(), exponent]));
            }
            (Kind::Mul(args), _) if integer_exponent.is_some() => {
                return Self::mul_all(args.iter().map(|arg| arg.pow(exponent.clone())));
            }
            _ => {}
        }
        Self::from_kind(Kind::Pow(self.clone(), exponent))
    }

    pub fn sqrt(&self) -> Self {
        self.pow(0.5)
    }

    pub fn sin(&self) -> Self {
        if let Some(v) = self.as_number() {
            return Self::number(v.sin());
        }
        if self.is_negative_term() {
            return -Self::call(Function::Sin, vec![-self]);
        }
        Self::call(Function::Sin, vec![self.clone()])
    }

    pub fn cos(&self) -> Self {
        if let Some(v) = self.as_number() {
            return Self::number(v.cos());
        }
        if self.is_negative_term() {
            return Self::call(Function::Cos, vec![-self]);
        }
        Self::call(Function::Cos, vec![self.clone()])
    }

    pub fn tan(&self) -> Self {
        if let Some(v) = self.as_number() {
            return Self::number(v.tan());
        }
        if self.is_negative_term() {
            return -Self::call(Function::Tan, vec![-self]);
        }
        Self::call(Function::Tan, vec![self.clone()])
    }

    pub fn abs(&self) -> Self {
        if let Some(v) = self.as_number() {
            return Self::number(v.abs());
        }
        if self.is_negative_term() {
            return Self::call(Function::Abs, vec![-self]);
        }
        Self::call(Function::Abs, vec![self.clone()])
    }

    pub fn ln(&self) -> Self {
        match self.as_number() {
            Some(v) if v > 0.0 => Self::number(v.ln()),
            _ => Self::call(Function::Log, vec![self.clone()]),
        }
    }

    /// Four-quadrant inverse tangent of `y / x`.
    pub fn atan2(y: &Expr, x: &Expr) -> Self {
        if let (Some(y), Some(x)) = (y.as_number(), x.as_number()) {
            return Self::number(y.atan2(x));
        }
        Self::call(Function::Atan2, vec![y.clone(), x.clone()])
    }

    fn call(function: Function, args: Vec<Expr>) -> Self {
        Self::from_kind(Kind::Call(function, args))
    }

    /// Rebuilds this node with new arguments through the canonical
    /// constructors.
    fn rebuild(&self, args: Vec<Expr>) -> Self {
        match &self.0.kind {
            Kind::Number(_) | Kind::Symbol(_) | Kind::Dynamic(..) => self.clone(),
            Kind::Add(_) => Self::add_all(args),
            Kind::Mul(_) => Self::mul_all(args),
            Kind::Pow(..) => args[0].pow(args[1].clone()),
            Kind::Call(function, _) => match function {
                Function::Sin => args[0].sin(),
                Function::Cos => args[0].cos(),
                Function::Tan => args[0].tan(),
                Function::Abs => args[0].abs(),
                Function::Log => args[0].ln(),
                Function::Atan2 => Self::atan2(&args[0], &args[1]),
            },
        }
    }

    fn node_id(&self) -> *const () {
        Rc::as_ptr(&self.0).cast()
    }

    fn rank(&self) -> u8 {
        match self.0.kind {
            Kind::Number(_) => 0,
            Kind::Symbol(_) => 1,
            Kind::Dynamic(..) => 2,
            Kind::Pow(..) => 3,
            Kind::Call(..) => 4,
            Kind::Mul(_) => 5,
            Kind::Add(_) => 6,
        }
    }

    fn structural_cmp(&self, other: &Expr) -> Ordering {
        match (&self.0.kind, &other.0.kind) {
            (Kind::Number(a), Kind::Number(b)) => a.total_cmp(b),
            (Kind::Symbol(a), Kind::Symbol(b)) => a.cmp(b),
            (Kind::Dynamic(a, i), Kind::Dynamic(b, j)) => a.cmp(b).then(i.cmp(j)),
            (Kind::Add(a), Kind::Add(b)) | (Kind::Mul(a), Kind::Mul(b)) => a.cmp(b),
            (Kind::Pow(a, x), Kind::Pow(b, y)) => a.cmp(b).then_with(|| x.cmp(y)),
            (Kind::Call(f, a), Kind::Call(g, b)) => f.cmp(g).then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
            || (self.0.hash == other.0.hash && self.structural_cmp(other) == Ordering::Equal)
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl PartialOrd for Expr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expr {
    fn cmp(&self, other: &Self) -> Ordering {
        if Rc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        self.rank()
            .cmp(&other.rank())
            .then(self.0.hash.cmp(&other.0.hash))
            .then_with(|| self.structural_cmp(other))
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::number(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::number(f64::from(value))
    }
}

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Self {
        value.clone()
    }
}

fn fmt_number(v: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        write!(f, "{}", v as i64)
    } else {
        write!(f, "{v}")
    }
}

fn fmt_factor(expr: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match expr.0.kind {
        Kind::Add(_) | Kind::Mul(_) => write!(f, "({expr})"),
        Kind::Number(v) if v < 0.0 => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            Kind::Number(v) => fmt_number(*v, f),
            Kind::Symbol(name) => write!(f, "{name}"),
            Kind::Dynamic(name, order) => {
                write!(f, "{name}")?;
                (0..*order).try_for_each(|_| write!(f, "'"))
            }
            Kind::Add(args) => {
                for (i, term) in args.iter().enumerate() {
                    if i == 0 {
                        write!(f, "{term}")?;
                    } else if term.is_negative_term() {
                        let negated = -term;
                        match negated.0.kind {
                            Kind::Add(_) => write!(f, " - ({negated})")?,
                            _ => write!(f, " - {negated}")?,
                        }
                    } else {
                        write!(f, " + {term}")?;
                    }
                }
                Ok(())
            }
            Kind::Mul(args) => {
                let mut rest = &args[..];
                if let Some(c) = args[0].as_number() {
                    rest = &args[1..];
                    if c == -1.0 {
                        write!(f, "-")?;
                    } else {
                        fmt_number(c, f)?;
                        write!(f, "*")?;
                    }
                }
                for (i, factor) in rest.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    fmt_factor(factor, f)?;
                }
                Ok(())
            }
            Kind::Pow(base, exp) => {
                if exp.as_number() == Some(0.5) {
                    return write!(f, "sqrt({base})");
                }
                fmt_factor(base, f)?;
                write!(f, "**")?;
                match exp.0.kind {
                    Kind::Number(v) if v >= 0.0 => write!(f, "{exp}"),
                    Kind::Symbol(_) | Kind::Dynamic(..) => write!(f, "{exp}"),
                    _ => write!(f, "({exp})"),
                }
            }
            Kind::Call(function, args) => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::symbol("x")
    }

    fn y() -> Expr {
        Expr::symbol("y")
    }

    #[test]
    fn like_terms_are_combined() {
        let e = x() + y() + 2.0 * x() - y();
        assert_eq!(e, 3.0 * x());
        assert!((x() - x()).is_zero());
    }

    #[test]
    fn sums_are_order_independent() {
        let a = x() * y() + x().sin() + 1.0;
        let b = 1.0 + x().sin() + y() * x();
        assert_eq!(a, b);
    }

    #[test]
    fn powers_fold_into_products() {
        assert_eq!(x() * x(), x().pow(2));
        assert_eq!(x() * x().pow(-1), Expr::one());
        assert_eq!((x() * y()).pow(2) / y().pow(2), x().pow(2));
        assert_eq!(Expr::number(4.0).sqrt(), Expr::number(2.0));
    }

    #[test]
    fn odd_and_even_functions_normalize_sign() {
        assert_eq!((-x()).sin(), -x().sin());
        assert_eq!((-x()).cos(), x().cos());
        assert_eq!(x().sin() + (-x()).sin(), Expr::zero());
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(Expr::symbol("m").to_string(), "m");
        assert!((x() - y()).to_string().contains(" - "));
        assert_eq!(Expr::dynamic("q").dt().to_string(), "q'");
    }

    #[test]
    fn negated_sums_are_distributed() {
        let sum = x() + y();
        assert!((&sum - &sum).is_zero());
        assert_eq!(-&sum, -x() - y());
        assert_eq!(2.0 * &sum - x(), x() + 2.0 * y());
        assert_eq!((-(x() + 1.0)).to_string(), "-1 - x");
    }

    #[test]
    fn sums_inside_products_keep_parentheses() {
        let e = x() * (y() + 1.0);
        assert_eq!(e.to_string(), "x*(1 + y)");
        assert_eq!((-&e).to_string(), "-x*(1 + y)");
        assert_eq!((y() - 2.0 * &e).to_string().matches('(').count(), 1);
        assert!((&e - x() * (1.0 + y())).is_zero());
    }

    #[test]
    fn atom_queries() {
        let q = Expr::dynamic("q");
        let e = q.cos() * x() + y();
        assert!(e.has(&q));
        assert!(!e.has(&Expr::symbol("z")));
        assert!(e.depends_on_time());
        assert_eq!(e.free_atoms().len(), 3);
    }
}
