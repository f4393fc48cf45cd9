//! Trait Property Container
//!
//! `TraitsData` maps trait identifiers to sets of typed properties. A trait
//! may be present without any properties, in which case it acts purely as a
//! classification tag.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Set of trait identifiers
pub type TraitSet = BTreeSet<String>;

/// Ordered list of trait sets, one per batch element
pub type TraitSets = Vec<TraitSet>;

/// Build a [`TraitSet`] from string slices
pub fn trait_set<I, S>(ids: I) -> TraitSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(Into::into).collect()
}

/// The closed set of property value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Name of the contained type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Str(_) => "str",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(value) => write!(f, "{}", value),
            PropertyValue::Int(value) => write!(f, "{}", value),
            PropertyValue::Float(value) => write!(f, "{}", value),
            PropertyValue::Str(value) => write!(f, "{}", value),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(value.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Str(value)
    }
}

/// Key/value dictionary used for `info()`, `settings()` and `initialize()`
pub type InfoDictionary = BTreeMap<String, PropertyValue>;

/// Trait identifier -> (property key -> value)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitsData {
    traits: BTreeMap<String, BTreeMap<String, PropertyValue>>,
}

impl TraitsData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an instance holding the given traits, with no properties
    pub fn with_traits(traits: &TraitSet) -> Self {
        let mut data = Self::new();
        data.add_traits(traits);
        data
    }

    /// All trait identifiers present
    pub fn trait_set(&self) -> TraitSet {
        self.traits.keys().cloned().collect()
    }

    pub fn has_trait(&self, trait_id: &str) -> bool {
        self.traits.contains_key(trait_id)
    }

    /// Check that every trait of `traits` is present
    pub fn has_traits(&self, traits: &TraitSet) -> bool {
        traits.iter().all(|t| self.has_trait(t))
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    /// Add a trait. Existing properties of the trait are preserved.
    pub fn add_trait(&mut self, trait_id: &str) {
        self.traits.entry(trait_id.to_string()).or_default();
    }

    pub fn add_traits(&mut self, traits: &TraitSet) {
        for trait_id in traits {
            self.add_trait(trait_id);
        }
    }

    /// Remove a trait and all of its properties
    pub fn remove_trait(&mut self, trait_id: &str) -> bool {
        self.traits.remove(trait_id).is_some()
    }

    pub fn remove_traits(&mut self, traits: &TraitSet) {
        for trait_id in traits {
            self.traits.remove(trait_id);
        }
    }

    /// Set a property, adding the trait if it is not yet present
    pub fn set_trait_property<V: Into<PropertyValue>>(&mut self, trait_id: &str, key: &str, value: V) {
        self.traits
            .entry(trait_id.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Look up a property.
    ///
    /// Returns `Ok(None)` when the trait is present but the property is not
    /// set, and an `InputValidation` error when the trait is absent.
    pub fn get_trait_property(&self, trait_id: &str, key: &str) -> Result<Option<&PropertyValue>> {
        let properties = self.properties(trait_id)?;
        Ok(properties.get(key))
    }

    /// Keys of the properties set for a trait
    pub fn trait_property_keys(&self, trait_id: &str) -> Result<BTreeSet<String>> {
        Ok(self.properties(trait_id)?.keys().cloned().collect())
    }

    /// Check if a trait carries at least one property
    pub fn has_properties(&self, trait_id: &str) -> bool {
        self.traits.get(trait_id).map(|p| !p.is_empty()).unwrap_or(false)
    }

    /// Merge `other` into this container. Properties from `other` win on
    /// key collision.
    pub fn update(&mut self, other: &TraitsData) {
        for (trait_id, properties) in &other.traits {
            let entry = self.traits.entry(trait_id.clone()).or_default();
            for (key, value) in properties {
                entry.insert(key.clone(), value.clone());
            }
        }
    }

    /// Copy of this container restricted to the given traits
    pub fn filtered(&self, traits: &TraitSet) -> TraitsData {
        TraitsData {
            traits: self
                .traits
                .iter()
                .filter(|(id, _)| traits.contains(*id))
                .map(|(id, props)| (id.clone(), props.clone()))
                .collect(),
        }
    }

    /// Iterate over traits and their properties
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, PropertyValue>)> {
        self.traits.iter()
    }

    fn properties(&self, trait_id: &str) -> Result<&BTreeMap<String, PropertyValue>> {
        self.traits
            .get(trait_id)
            .ok_or_else(|| Error::input_validation(format!("Trait '{}' not present", trait_id)))
    }
}

impl fmt::Display for TraitsData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (trait_id, properties)) in self.traits.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}': {{", trait_id)?;
            for (j, (key, value)) in properties.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "'{}': {}", key, value)?;
            }
            write!(f, "}}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_round_trip() {
        let mut data = TraitsData::new();
        data.set_trait_property("locatable", "location", "file:///tmp/a.exr");

        let value = data.get_trait_property("locatable", "location").unwrap();
        assert_eq!(value, Some(&PropertyValue::from("file:///tmp/a.exr")));
    }

    #[test]
    fn test_unset_property_on_present_trait() {
        let mut data = TraitsData::new();
        data.add_trait("entity");
        assert_eq!(data.get_trait_property("entity", "missing").unwrap(), None);
    }

    #[test]
    fn test_absent_trait_is_an_error() {
        let data = TraitsData::new();
        let result = data.get_trait_property("entity", "name");
        assert!(matches!(result, Err(Error::InputValidation { .. })));
        assert!(data.trait_property_keys("entity").is_err());
    }

    #[test]
    fn test_add_trait_keeps_properties() {
        let mut data = TraitsData::new();
        data.set_trait_property("versioned", "version", 3i64);
        data.add_trait("versioned");
        assert_eq!(
            data.get_trait_property("versioned", "version").unwrap(),
            Some(&PropertyValue::Int(3))
        );
    }

    #[test]
    fn test_equality_is_by_value() {
        let mut a = TraitsData::new();
        a.add_trait("b");
        a.set_trait_property("a", "x", 1.5);
        let mut b = TraitsData::new();
        b.set_trait_property("a", "x", 1.5);
        b.add_trait("b");
        assert_eq!(a, b);

        b.set_trait_property("a", "x", 2.5);
        assert_ne!(a, b);
    }

    #[test]
    fn test_update_and_filter() {
        let mut a = TraitsData::new();
        a.set_trait_property("a", "x", 1i64);
        a.set_trait_property("a", "y", true);
        let mut b = TraitsData::new();
        b.set_trait_property("a", "x", 2i64);
        b.add_trait("c");
        a.update(&b);

        assert_eq!(a.get_trait_property("a", "x").unwrap(), Some(&PropertyValue::Int(2)));
        assert_eq!(a.get_trait_property("a", "y").unwrap(), Some(&PropertyValue::Bool(true)));
        assert!(a.has_trait("c"));

        let filtered = a.filtered(&trait_set(["c"]));
        assert_eq!(filtered.trait_set(), trait_set(["c"]));
    }

    #[test]
    fn test_json_representation() {
        let json = r#"{"entity": {}, "locatable": {"location": "file:///a", "frames": 24, "scale": 0.5, "hidden": false}}"#;
        let data: TraitsData = serde_json::from_str(json).unwrap();
        assert!(data.has_trait("entity"));
        assert!(!data.has_properties("entity"));
        assert_eq!(data.get_trait_property("locatable", "frames").unwrap(), Some(&PropertyValue::Int(24)));
        assert_eq!(data.get_trait_property("locatable", "scale").unwrap(), Some(&PropertyValue::Float(0.5)));
        assert_eq!(data.get_trait_property("locatable", "hidden").unwrap(), Some(&PropertyValue::Bool(false)));
    }
}
