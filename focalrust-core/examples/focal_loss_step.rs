//! # Focal loss step through the layer registry
//!
//! Builds a `FocalLoss` layer from a parameter record, runs one forward and
//! backward pass on a random batch, and compares per-example weights with
//! plain cross-entropy (`gamma = 0`).
//!
//! ## Running
//! `RUST_LOG=debug cargo run --example focal_loss_step`

use focalrust_core::tensor::{random_probabilities, zeros};
use focalrust_core::{FocalLoss, FocalLossParameter, FocalRustError, Layer, LayerParameter, LayerRegistry, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BATCH_SIZE: usize = 6;
const CLASS_COUNT: usize = 4;

fn main() -> Result<(), FocalRustError> {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(42);
    let probabilities = random_probabilities::<f32, _>(BATCH_SIZE, CLASS_COUNT, 0.5, &mut rng)?;
    let labels: Vec<f32> = (0..BATCH_SIZE).map(|_| rng.gen_range(0..CLASS_COUNT) as f32).collect();
    let labels = Tensor::new(labels, vec![BATCH_SIZE])?;

    let param = FocalLossParameter::new(vec![0.25, 1.0, 1.0, 2.0], 2.0);
    let registry = LayerRegistry::<f32>::with_builtin();
    let mut layer = registry.create(&LayerParameter::focal_loss("loss", param.clone()))?;

    let mut bottom = vec![probabilities, labels];
    let mut top = vec![zeros::<f32>(&[0])];
    layer.setup(&bottom, &mut top)?;
    layer.reshape(&bottom, &mut top)?;
    layer.forward(&bottom, &mut top)?;
    top[0].set_grad(vec![1.0])?;
    layer.backward(&top, &[true, false], &mut bottom)?;

    println!("focal loss = {:.6}", top[0].data()[0]);

    // Same weights as the layer; the `ce` column only drops the focusing term.
    let focal = FocalLoss::<f32>::from_parameter(&param, CLASS_COUNT)?;
    let cross_entropy = FocalLoss::<f32>::from_parameter(&param.with_gamma(0.0), CLASS_COUNT)?;
    let grad = bottom[0].grad().unwrap_or(&[]);
    println!("{:>4} {:>5} {:>8} {:>10} {:>10} {:>12}", "row", "label", "p_true", "focal", "ce", "d loss/d p");
    for (row, &label) in bottom[1].data().iter().enumerate() {
        let class = label as usize;
        let idx = row * CLASS_COUNT + class;
        let p = bottom[0].data()[idx];
        println!(
            "{:>4} {:>5} {:>8.4} {:>10.6} {:>10.6} {:>12.6}",
            row,
            class,
            p,
            focal.loss_term(p, class),
            cross_entropy.loss_term(p, class),
            grad.get(idx).copied().unwrap_or(0.0)
        );
    }
    Ok(())
}
