//! Named loss components.

use std::collections::BTreeMap;

use burn::prelude::*;
use burn::tensor::ElementConversion;

/// Named scalar loss tensors for one batch.
#[derive(Debug, Clone)]
pub struct LossRecord<B: Backend> {
    components: BTreeMap<String, Tensor<B, 1>>,
}

impl<B: Backend> Default for LossRecord<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> LossRecord<B> {
    /// Key of the value that is backpropagated.
    pub const TOTAL: &'static str = "total";

    /// Create an empty record.
    pub fn new() -> Self {
        Self {
            components: BTreeMap::new(),
        }
    }

    /// Insert or replace a component.
    pub fn insert(&mut self, name: impl Into<String>, value: Tensor<B, 1>) {
        self.components.insert(name.into(), value);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: Tensor<B, 1>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a component.
    pub fn get(&self, name: &str) -> Option<&Tensor<B, 1>> {
        self.components.get(name)
    }

    /// The `total` component, if present.
    pub fn total(&self) -> Option<&Tensor<B, 1>> {
        self.get(Self::TOTAL)
    }

    /// Component names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the record has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Read every component back to the host.
    pub fn scalars(&self) -> Vec<(String, f32)> {
        self.components
            .iter()
            .map(|(name, value)| (name.clone(), value.clone().into_scalar().elem::<f32>()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_record_components() {
        let device = Default::default();
        let record = LossRecord::<TestBackend>::new()
            .with("mse", Tensor::from_floats([0.5], &device))
            .with(LossRecord::<TestBackend>::TOTAL, Tensor::from_floats([0.25], &device));

        assert_eq!(record.len(), 2);
        assert!(record.total().is_some());
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["mse", "total"]);
        assert_eq!(
            record.scalars(),
            vec![("mse".to_string(), 0.5), ("total".to_string(), 0.25)]
        );
    }
}
