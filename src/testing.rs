use rand::Rng;
use rand::SeedableRng;
use rand::distr::StandardUniform;
use rand::rngs::StdRng;

use crate::geometry::Vec3;
use crate::utils::lattice;

/// Fixed random seed to support repeatable testing
const SEED: [u8; 32] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6,
    5, 4, 3, 2, 1,
];

/// Get a random number generator with a const seed for repeatable testing
pub fn rng_fixed_seed() -> StdRng {
    StdRng::from_seed(SEED)
}

/// Generate `n` random numbers using provided generator
pub fn randn<T>(rng: &mut StdRng, n: usize) -> Vec<T>
where
    StandardUniform: rand::distr::Distribution<T>,
{
    std::iter::repeat_with(|| rng.random::<T>())
        .take(n)
        .collect()
}

/// `n` points drawn uniformly from the unit cube
pub fn random_points(rng: &mut StdRng, n: usize) -> Vec<Vec3> {
    std::iter::repeat_with(|| [rng.random(), rng.random(), rng.random()])
        .take(n)
        .collect()
}

/// `n^3` points on a uniform lattice spanning `[lo, hi]` on each axis,
/// with the first axis varying fastest
pub fn lattice_points(n: usize, lo: f64, hi: f64) -> Vec<Vec3> {
    let [x1, x2, x3] = lattice(n, lo, hi);
    (0..x1.len()).map(|i| [x1[i], x2[i], x3[i]]).collect()
}

/// Route `log` output through the test harness; safe to call from every test
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
