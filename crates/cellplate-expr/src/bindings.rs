//! Variable binding tables

use ahash::AHashMap;

use crate::value::Value;

/// Name to value table with case-insensitive names
///
/// Rebinding a name replaces its value; the most recent spelling of the
/// name is kept for iteration.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: AHashMap<String, (String, Value)>,
}

impl Bindings {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, returning the value it replaced
    pub fn insert<N: Into<String>, V: Into<Value>>(&mut self, name: N, value: V) -> Option<Value> {
        let name = name.into();
        self.entries
            .insert(name.to_lowercase(), (name, value.into()))
            .map(|(_, old)| old)
    }

    /// Look up a name, ignoring case
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(&name.to_lowercase()).map(|(_, value)| value)
    }

    /// Check whether a name is bound
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    /// Unbind a name, returning its value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries
            .remove(&name.to_lowercase())
            .map(|(_, value)| value)
    }

    /// Number of bound names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .values()
            .map(|(name, value)| (name.as_str(), value))
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (name, value) in iter {
            bindings.insert(name, value);
        }
        bindings
    }
}

impl<N: Into<String>, V: Into<Value>> Extend<(N, V)> for Bindings {
    fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

/// Layered lookup over several binding tables
///
/// The root table comes first; tables added with [`Scope::with`] shadow
/// it, the most recently added one winning. A range engine uses this to put
/// the current item's bindings over the template's own.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    layers: Vec<&'a Bindings>,
}

impl<'a> Scope<'a> {
    /// Scope over a single table
    pub fn new(root: &'a Bindings) -> Self {
        Self { layers: vec![root] }
    }

    /// Add an inner layer that shadows the existing ones
    pub fn with(mut self, inner: &'a Bindings) -> Self {
        self.layers.push(inner);
        self
    }

    /// Look a name up, innermost layer first
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.layers.iter().rev().find_map(|layer| layer.get(name))
    }

    /// Check whether any layer binds `name`
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_case_insensitive_overwrite() {
        let mut bindings = Bindings::new();
        assert_eq!(bindings.insert("Name", "john"), None);
        assert_eq!(bindings.get("NAME"), Some(&Value::from("john")));

        assert_eq!(bindings.insert("name", "jane"), Some(Value::from("john")));
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.iter().next(), Some(("name", &Value::from("jane"))));

        assert_eq!(bindings.remove("NaMe"), Some(Value::from("jane")));
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_scope_shadowing() {
        let root: Bindings = [("Name", "root"), ("Title", "report")].into_iter().collect();
        let item: Bindings = [("name", "item")].into_iter().collect();

        let scope = Scope::new(&root).with(&item);
        assert_eq!(scope.get("Name"), Some(&Value::from("item")));
        assert_eq!(scope.get("title"), Some(&Value::from("report")));
        assert!(!scope.contains("missing"));

        let scope = Scope::new(&root);
        assert_eq!(scope.get("name"), Some(&Value::from("root")));
    }
}
