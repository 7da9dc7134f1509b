//! Alea pseudorandom generator.
//!
//! Johannes Baagøe's Alea, seeded from a string through the Mash hash. The
//! output sequence matches the widely deployed JavaScript implementation bit
//! for bit, so a seed string always yields the same draws.
//!
//! The generator is a plain value: [`Alea::next`] consumes the current state
//! and returns the draw together with the successor state. Streams never
//! share hidden state, which keeps schedule computation reproducible.

/// 2^-32
const NORM_32: f64 = 2.328_306_436_538_696_3e-10;
/// 2^32
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Immutable Alea generator state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Alea {
    s0: f64,
    s1: f64,
    s2: f64,
    c: f64,
}

impl Alea {
    /// Seeds a generator from a string.
    pub fn from_seed(seed: &str) -> Self {
        let mut mash = Mash::new();
        let mut s0 = mash.hash(" ");
        let mut s1 = mash.hash(" ");
        let mut s2 = mash.hash(" ");

        s0 -= mash.hash(seed);
        if s0 < 0.0 {
            s0 += 1.0;
        }
        s1 -= mash.hash(seed);
        if s1 < 0.0 {
            s1 += 1.0;
        }
        s2 -= mash.hash(seed);
        if s2 < 0.0 {
            s2 += 1.0;
        }

        Self { s0, s1, s2, c: 1.0 }
    }

    /// Returns a uniform draw in `[0, 1)` and the advanced generator.
    #[must_use]
    pub fn next(self) -> (f64, Self) {
        let t = 2_091_639.0 * self.s0 + self.c * NORM_32;
        // t is always within (0, 2_091_640), so truncation equals floor.
        let c = t.trunc();
        let value = t - c;
        let next = Self {
            s0: self.s1,
            s1: self.s2,
            s2: value,
            c,
        };
        (value, next)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    #[must_use]
    pub fn next_index(self, len: usize) -> (usize, Self) {
        let (value, next) = self.next();
        let index = ((value * len as f64).floor() as usize).min(len.saturating_sub(1));
        (index, next)
    }
}

/// Mash string hash used to seed [`Alea`].
struct Mash {
    n: f64,
}

impl Mash {
    fn new() -> Self {
        Self {
            n: 4_022_871_197.0, // 0xefc8249d
        }
    }

    fn hash(&mut self, data: &str) -> f64 {
        for unit in data.encode_utf16() {
            self.n += f64::from(unit);
            let mut h = 0.025_196_032_824_169_38 * self.n;
            self.n = to_uint32(h);
            h -= self.n;
            h *= self.n;
            self.n = to_uint32(h);
            h -= self.n;
            self.n += h * TWO_POW_32;
        }
        to_uint32(self.n) * NORM_32
    }
}

/// ECMAScript `ToUint32` for finite, non-negative inputs.
fn to_uint32(value: f64) -> f64 {
    value.trunc().rem_euclid(TWO_POW_32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws(seed: &str, count: usize) -> Vec<f64> {
        let mut rng = Alea::from_seed(seed);
        (0..count)
            .map(|_| {
                let (value, next) = rng.next();
                rng = next;
                value
            })
            .collect()
    }

    #[test]
    fn same_seed_same_sequence() {
        assert_eq!(draws("12345", 32), draws("12345", 32));
    }

    #[test]
    fn different_seeds_diverge() {
        assert_ne!(draws("12345", 8), draws("12346", 8));
    }

    #[test]
    fn draws_stay_in_unit_interval() {
        for value in draws("ORrando", 10_000) {
            assert!((0.0..1.0).contains(&value), "out of range: {value}");
        }
    }

    #[test]
    fn state_is_a_value() {
        let rng = Alea::from_seed("seed");
        let (first, _) = rng.next();
        let (again, _) = rng.next();
        assert_eq!(first, again);
    }

    #[test]
    fn index_draws_are_roughly_uniform() {
        let mut rng = Alea::from_seed("uniform");
        let mut buckets = [0usize; 4];
        for _ in 0..40_000 {
            let (index, next) = rng.next_index(4);
            buckets[index] += 1;
            rng = next;
        }
        for count in buckets {
            assert!((9_000..11_000).contains(&count), "bucket count {count}");
        }
    }
}
