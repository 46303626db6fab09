//! Randomized universal hash parameters.
//!
//! Bucket placement is `((a * k + b) mod p) mod m` over the field defined by
//! the Mersenne prime `p = 2^31 - 1`, with `(a, b)` drawn uniformly at random
//! per table. Picking the function at random from this family bounds the
//! expected chain length for any fixed key set, so no key sequence chosen in
//! advance can reliably pile every entry into one chain.

use rand::Rng;

/// The prime defining the universal hashing field, `2^31 - 1`.
pub const FIELD_PRIME: u64 = (1 << 31) - 1;

/// Folds a full 64-bit hash into the field domain `[0, 2^31)`.
///
/// This is the seam between an arbitrary `Hasher` output and the universal
/// family: the multiplier/offset arithmetic operates on 31-bit inputs so the
/// intermediate `a * k + b` never overflows a `u64`.
///
/// # Examples
///
/// ```rust
/// # use chain_hash::universal::field_element;
/// assert_eq!(field_element(0), 0);
/// assert_eq!(field_element(u64::MAX), 0x7FFF_FFFF);
/// ```
#[inline(always)]
pub fn field_element(hash: u64) -> u32 {
    (hash & 0x7FFF_FFFF) as u32
}

/// The `(a, b)` pair selecting one function from the universal family.
///
/// Parameters are drawn uniformly with `a` in `[1, p - 1]` and `b` in
/// `[0, p - 1]`, and are re-drawn on every capacity change so a resize never
/// replays the collision pattern that preceded it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniversalParams {
    a: u64,
    b: u64,
}

impl UniversalParams {
    /// Draws a fresh `(a, b)` pair from the given random source.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::universal::UniversalParams;
    /// # use rand::SeedableRng;
    /// # use rand::rngs::SmallRng;
    /// let mut rng = SmallRng::seed_from_u64(7);
    /// let params = UniversalParams::generate(&mut rng);
    /// let again = UniversalParams::generate(&mut SmallRng::seed_from_u64(7));
    /// assert_eq!(params, again);
    /// ```
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self {
            a: rng.random_range(1..FIELD_PRIME),
            b: rng.random_range(0..FIELD_PRIME),
        }
    }

    /// The multiplier `a`, in `[1, p - 1]`.
    pub fn a(&self) -> u64 {
        self.a
    }

    /// The offset `b`, in `[0, p - 1]`.
    pub fn b(&self) -> u64 {
        self.b
    }

    /// Computes the bucket index for a mapped key in a table of
    /// `bucket_count` buckets.
    ///
    /// `bucket_count` must be a power of two; the final reduction uses a mask
    /// instead of a modulo, which is equivalent for power-of-two sizes and
    /// measurably cheaper.
    #[inline(always)]
    pub fn bucket_index(&self, element: u32, bucket_count: usize) -> usize {
        debug_assert!(bucket_count.is_power_of_two());
        // a <= p - 1 < 2^31 and element < 2^31, so a * element + b < 2^62 + 2^31.
        ((self.a * u64::from(element) + self.b) % FIELD_PRIME) as usize & (bucket_count - 1)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn params_within_field_bounds() {
        let mut rng = SmallRng::seed_from_u64(0xDEAD_BEEF);
        for _ in 0..1000 {
            let params = UniversalParams::generate(&mut rng);
            assert!((1..FIELD_PRIME).contains(&params.a()));
            assert!((0..FIELD_PRIME).contains(&params.b()));
        }
    }

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let first = UniversalParams::generate(&mut SmallRng::seed_from_u64(42));
        let second = UniversalParams::generate(&mut SmallRng::seed_from_u64(42));
        assert_eq!(first, second);

        let other = UniversalParams::generate(&mut SmallRng::seed_from_u64(43));
        assert_ne!(first, other);
    }

    #[test]
    fn index_stays_in_range() {
        let mut rng = SmallRng::seed_from_u64(99);
        let params = UniversalParams::generate(&mut rng);
        for m in [1usize, 2, 8, 64, 4096] {
            for element in [0u32, 1, 1000, 0x7FFF_FFFF] {
                assert!(params.bucket_index(element, m) < m);
            }
        }
    }

    #[test]
    fn index_is_stable_for_fixed_params() {
        let params = UniversalParams::generate(&mut SmallRng::seed_from_u64(5));
        let first = params.bucket_index(123_456, 64);
        for _ in 0..10 {
            assert_eq!(params.bucket_index(123_456, 64), first);
        }
    }

    #[test]
    fn single_bucket_maps_everything_to_zero() {
        let params = UniversalParams::generate(&mut SmallRng::seed_from_u64(1));
        for element in [0u32, 7, 0x7FFF_FFFF] {
            assert_eq!(params.bucket_index(element, 1), 0);
        }
    }

    #[test]
    fn field_element_masks_to_31_bits() {
        assert_eq!(field_element(0x8000_0000), 0);
        assert_eq!(field_element(0xFFFF_FFFF_0000_0001), 1);
        assert!(u64::from(field_element(u64::MAX)) < (1 << 31));
    }
}
