// src/config.rs

//! Configuration records handed to layers by the host engine.
//!
//! Values are stored in single precision, the way the host's parameter
//! records carry them, and converted to the kernel precision at setup time.
//! Validation happens in [`FocalLoss::configure`](crate::nn::losses::FocalLoss::configure).

/// Registered type name of the focal loss layer.
pub const FOCAL_LOSS_TYPE: &str = "FocalLoss";

/// Parameters of a focal loss layer.
///
/// # Fields
/// * `alpha`: Per-class weights, index = class id. Empty means every class
///   weighs 1.0.
/// * `gamma`: Focusing exponent. `0.0` recovers weighted cross-entropy.
#[derive(Debug, Clone, PartialEq)]
pub struct FocalLossParameter {
    pub alpha: Vec<f32>,
    pub gamma: f32,
}

impl FocalLossParameter {
    pub fn new(alpha: Vec<f32>, gamma: f32) -> Self {
        FocalLossParameter { alpha, gamma }
    }

    pub fn with_alpha(mut self, alpha: Vec<f32>) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }
}

impl Default for FocalLossParameter {
    fn default() -> Self {
        FocalLossParameter {
            alpha: Vec::new(),
            gamma: 2.0,
        }
    }
}

/// The record a host engine passes to [`LayerRegistry::create`](crate::nn::registry::LayerRegistry::create).
#[derive(Debug, Clone, PartialEq)]
pub struct LayerParameter {
    /// Instance name, used in log lines.
    pub name: String,
    /// Registered type identifier, e.g. `"FocalLoss"`.
    pub layer_type: String,
    pub focal_loss_param: FocalLossParameter,
}

impl LayerParameter {
    /// Builds a `"FocalLoss"` layer record.
    pub fn focal_loss(name: &str, param: FocalLossParameter) -> Self {
        LayerParameter {
            name: name.to_string(),
            layer_type: FOCAL_LOSS_TYPE.to_string(),
            focal_loss_param: param,
        }
    }
}
