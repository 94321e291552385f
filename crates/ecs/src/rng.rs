use serde::{Deserialize, Serialize};

/// Deterministic scene RNG: a splitmix64 stream. Given the same seed, target
/// selection and spawn placement repeat exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneRng {
    state: u64,
}

impl SceneRng {
    pub fn with_seed(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn state(&self) -> u64 {
        self.state
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }

    /// Uniform integer in `lo..hi`, returned as f32 (spawn grids are integral).
    /// An empty or inverted range yields `lo`.
    pub fn range(&mut self, lo: i32, hi: i32) -> f32 {
        let span = (i64::from(hi) - i64::from(lo)).max(1) as u64;
        (i64::from(lo) + (self.next_u64() % span) as i64) as f32
    }

    /// Uniform integer in `-extent..extent`.
    pub fn symmetric(&mut self, extent: i32) -> f32 {
        let extent = i64::from(extent).abs();
        let span = (2 * extent).max(1) as u64;
        (-extent + (self.next_u64() % span) as i64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SceneRng::with_seed(42);
        let mut b = SceneRng::with_seed(42);
        for _ in 0..32 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SceneRng::with_seed(1);
        let mut b = SceneRng::with_seed(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn range_stays_in_bounds() {
        let mut rng = SceneRng::with_seed(7);
        for _ in 0..1000 {
            let v = rng.range(-50, 50);
            assert!((-50.0..50.0).contains(&v));
        }
    }

    #[test]
    fn extreme_extents_do_not_overflow() {
        let mut rng = SceneRng::with_seed(11);
        for _ in 0..100 {
            let v = rng.range(i32::MIN, i32::MAX);
            assert!(v >= i32::MIN as f32 && v <= i32::MAX as f32);
            let w = rng.symmetric(i32::MIN);
            assert!(w.abs() <= 2.0f32.powi(31));
            let x = rng.symmetric(i32::MAX);
            assert!(x.abs() <= 2.0f32.powi(31));
        }
        assert_eq!(rng.range(5, 5), 5.0);
        assert_eq!(rng.range(5, -5), 5.0);
        assert_eq!(rng.symmetric(0), 0.0);
    }

    #[test]
    fn symmetric_stays_in_bounds() {
        let mut rng = SceneRng::with_seed(3);
        for _ in 0..1000 {
            let v = rng.symmetric(50);
            assert!((-50.0..50.0).contains(&v));
        }
    }

    #[test]
    fn index_stays_in_bounds() {
        let mut rng = SceneRng::with_seed(9);
        for _ in 0..100 {
            assert!(rng.index(3) < 3);
        }
    }
}
