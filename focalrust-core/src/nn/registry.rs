// src/nn/registry.rs

//! Layer registry: maps a layer type name to the factory building it, so a
//! host engine can instantiate layers from parameter records.

use crate::config::{LayerParameter, FOCAL_LOSS_TYPE};
use crate::error::FocalRustError;
use crate::nn::layer::Layer;
use crate::nn::layers::FocalLossLayer;
use crate::ops::traits::FocalNumeric;
use log::debug;
use std::collections::HashMap;

/// Builds a layer from its parameter record.
pub type LayerFactory<T> = fn(&LayerParameter) -> Result<Box<dyn Layer<T>>, FocalRustError>;

fn create_focal_loss<T: FocalNumeric>(param: &LayerParameter) -> Result<Box<dyn Layer<T>>, FocalRustError> {
    Ok(Box::new(FocalLossLayer::<T>::new(param)?))
}

/// Registry of layer factories keyed by type name.
pub struct LayerRegistry<T: FocalNumeric> {
    factories: HashMap<String, LayerFactory<T>>,
}

impl<T: FocalNumeric> LayerRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        LayerRegistry {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry holding the layers of this crate (`"FocalLoss"`).
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .factories
            .insert(FOCAL_LOSS_TYPE.to_string(), create_focal_loss::<T> as LayerFactory<T>);
        registry
    }

    /// Registers a factory under `layer_type`.
    ///
    /// # Errors
    /// `DuplicateLayerType` if the name is already taken.
    pub fn register(&mut self, layer_type: &str, factory: LayerFactory<T>) -> Result<(), FocalRustError> {
        if self.factories.contains_key(layer_type) {
            return Err(FocalRustError::DuplicateLayerType(layer_type.to_string()));
        }
        debug!("LayerRegistry: registered layer type {}", layer_type);
        self.factories.insert(layer_type.to_string(), factory);
        Ok(())
    }

    /// Instantiates the layer named by `param.layer_type`.
    ///
    /// # Errors
    /// `UnknownLayerType` if nothing is registered under that name, or any
    /// error of the factory itself.
    pub fn create(&self, param: &LayerParameter) -> Result<Box<dyn Layer<T>>, FocalRustError> {
        let factory = self
            .factories
            .get(&param.layer_type)
            .ok_or_else(|| FocalRustError::UnknownLayerType(param.layer_type.clone()))?;
        debug!("LayerRegistry: creating {} ({})", param.name, param.layer_type);
        factory(param)
    }

    /// Registered type names, sorted.
    pub fn layer_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl<T: FocalNumeric> std::fmt::Debug for LayerRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerRegistry")
            .field("layer_types", &self.layer_types())
            .finish()
    }
}

impl<T: FocalNumeric> Default for LayerRegistry<T> {
    fn default() -> Self {
        Self::with_builtin()
    }
}
