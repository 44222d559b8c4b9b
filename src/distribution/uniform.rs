//! Uniform sector distribution
//!
//! Every sector in the range is equally likely. Uses xoshiro256++, which is
//! cheap enough to call once per read.
//!
//! Workers seed from OS entropy, so two workers launched in the same instant
//! still draw unrelated offset sequences. Tests seed explicitly.

use super::SectorDistribution;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Uniform random distribution over sector numbers
pub struct UniformDistribution {
    rng: Xoshiro256PlusPlus,
}

impl UniformDistribution {
    /// Create a distribution seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
        }
    }

    /// Create a distribution with a fixed seed (reproducible sequences)
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl Default for UniformDistribution {
    fn default() -> Self {
        Self::new()
    }
}

impl SectorDistribution for UniformDistribution {
    #[inline(always)]
    fn next_sector(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_bound() {
        let mut dist = UniformDistribution::new();
        assert_eq!(dist.next_sector(0), 0);
    }

    #[test]
    fn test_bound_of_one_always_zero() {
        let mut dist = UniformDistribution::with_seed(3);
        for _ in 0..100 {
            assert_eq!(dist.next_sector(1), 0);
        }
    }

    #[test]
    fn test_seeded_sequences_repeat() {
        let mut a = UniformDistribution::with_seed(12345);
        let mut b = UniformDistribution::with_seed(12345);
        for _ in 0..10 {
            assert_eq!(a.next_sector(1 << 30), b.next_sector(1 << 30));
        }
    }

    #[test]
    fn test_entropy_seeds_differ() {
        let mut a = UniformDistribution::new();
        let mut b = UniformDistribution::new();
        let sa: Vec<u64> = (0..8).map(|_| a.next_sector(u64::MAX)).collect();
        let sb: Vec<u64> = (0..8).map(|_| b.next_sector(u64::MAX)).collect();
        assert_ne!(sa, sb);
    }

    #[test]
    fn test_coverage() {
        let mut dist = UniformDistribution::with_seed(42);
        let bound = 100u64;
        let mut buckets = [0u32; 10];

        for _ in 0..10_000 {
            let sector = dist.next_sector(bound);
            buckets[(sector * 10 / bound) as usize] += 1;
        }

        // Roughly 1000 per bucket, 20% slack
        for count in buckets {
            assert!(count > 800 && count < 1200, "bucket count {} out of range", count);
        }
    }

    proptest! {
        #[test]
        fn prop_offsets_stay_below_last_sector(seed in any::<u64>(), extent in 2u64..1_000_000_000) {
            let mut dist = UniformDistribution::with_seed(seed);
            for _ in 0..256 {
                let sector = dist.next_sector(extent - 1);
                prop_assert!(sector < extent - 1);
            }
        }
    }
}
