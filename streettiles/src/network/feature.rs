//! Geographic features and feature collections.

use geo_types::Geometry;
use serde_json::{Map, Value};

/// A single geographic feature: a geometry in lon/lat degrees plus
/// free-form properties that end up as vector tile tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Creates a feature with no properties.
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            properties: Map::new(),
        }
    }

    /// Adds a property, replacing any previous value for `key`.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Looks up a property by key.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// An ordered list of features belonging to one layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{line_string, point};

    #[test]
    fn test_feature_properties() {
        let feature = Feature::new(point!(x: 13.4, y: 52.5))
            .with_property("kind", "crossing")
            .with_property("degree", 3);

        assert_eq!(feature.property("kind"), Some(&Value::from("crossing")));
        assert_eq!(feature.property("degree"), Some(&Value::from(3)));
        assert!(feature.property("missing").is_none());
    }

    #[test]
    fn test_collection_from_iterator() {
        let collection: FeatureCollection = (0..3)
            .map(|i| Feature::new(line_string![(x: 0.0, y: 0.0), (x: i as f64, y: 1.0)]))
            .collect();

        assert_eq!(collection.len(), 3);
        assert!(!collection.is_empty());
        assert_eq!((&collection).into_iter().count(), 3);
    }
}
