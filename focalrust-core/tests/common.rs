use focalrust_core::tensor::random_probabilities;
use focalrust_core::{FocalNumeric, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Shared by several integration test crates; not every helper is used by each.
#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A random classification batch: probabilities, float labels, and the labels as indices.
#[allow(dead_code)]
pub struct Batch<T: FocalNumeric> {
    pub probabilities: Tensor<T>,
    pub labels: Tensor<T>,
    pub label_ids: Vec<usize>,
}

#[allow(dead_code)]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[allow(dead_code)]
pub fn random_batch<T: FocalNumeric>(
    rng: &mut StdRng,
    batch_size: usize,
    class_count: usize,
    concentration: f64,
) -> Batch<T> {
    let probabilities = random_probabilities::<T, _>(batch_size, class_count, concentration, rng)
        .expect("random probabilities");
    let label_ids: Vec<usize> = (0..batch_size).map(|_| rng.gen_range(0..class_count)).collect();
    let labels = Tensor::new(
        label_ids.iter().map(|&l| T::from_f64(l as f64)).collect(),
        vec![batch_size],
    )
    .expect("labels");
    Batch {
        probabilities,
        labels,
        label_ids,
    }
}
