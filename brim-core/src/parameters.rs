use std::collections::BTreeMap;

use brim_mechanics::Values;

use crate::NodeBase;

/// A source of named numeric parameter values.
pub trait ParameterSource {
    fn get(&self, name: &str) -> Option<f64>;
}

/// Parameter values keyed by symbol name.
///
/// With the `serde-derive` feature it deserializes from a plain map, e.g.
/// `{"wheel_r": 0.3}`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ParameterSet {
    values: BTreeMap<String, f64>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(name.into(), value)
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl ParameterSource for ParameterSet {
    fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Looks up every constant symbol of a node by its name.
pub(crate) fn lookup_symbols(node: &NodeBase, source: &dyn ParameterSource) -> Values {
    node.symbols()
        .filter(|(_, value)| value.is_atom() && !value.is_dynamic())
        .filter_map(|(_, value)| {
            let name = value.name()?;
            source.get(name).map(|v| (value.clone(), v))
        })
        .collect()
}
