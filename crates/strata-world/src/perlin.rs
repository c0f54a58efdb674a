//! Seeded 2-D gradient noise.
//!
//! Classic permutation-table Perlin noise over the XZ plane. The table is a
//! Fisher-Yates shuffle of `0..256` duplicated to 512 entries so that lattice
//! lookups never need a modulo.

use noise::NoiseFn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata_core::{Error, Result};

use crate::WorldSeed;

/// Number of distinct lattice hashes.
pub const PERMUTATION_SIZE: usize = 256;

/// Permutation-table gradient noise.
///
/// Constructing the value is the initialization step; there is no way to
/// sample an uninitialized table.
#[derive(Clone)]
pub struct PermutationNoise {
    perm: [u8; PERMUTATION_SIZE * 2],
}

impl PermutationNoise {
    /// Build the permutation from a world seed.
    pub fn new(seed: WorldSeed) -> Self {
        Self::from_rng(&mut ChaCha8Rng::seed_from_u64(seed))
    }

    /// Build the permutation by shuffling `0..256` with the given RNG.
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut p: [u8; PERMUTATION_SIZE] = std::array::from_fn(|i| i as u8);
        for i in (1..PERMUTATION_SIZE).rev() {
            let j = rng.gen_range(0..=i);
            p.swap(i, j);
        }
        Self::duplicate(&p)
    }

    /// Use an explicit permutation of `0..256`.
    pub fn from_permutation(p: [u8; PERMUTATION_SIZE]) -> Result<Self> {
        let mut seen = [false; PERMUTATION_SIZE];
        for &v in &p {
            if std::mem::replace(&mut seen[v as usize], true) {
                return Err(Error::InvalidConfig(format!(
                    "permutation repeats value {v}"
                )));
            }
        }
        Ok(Self::duplicate(&p))
    }

    fn duplicate(p: &[u8; PERMUTATION_SIZE]) -> Self {
        Self {
            perm: std::array::from_fn(|i| p[i & (PERMUTATION_SIZE - 1)]),
        }
    }

    /// The 256-entry permutation.
    pub fn permutation(&self) -> &[u8] {
        &self.perm[..PERMUTATION_SIZE]
    }

    #[inline]
    fn hash(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    /// Sample the noise field, result in `[-1, 1]`.
    ///
    /// Values at integer lattice points are always zero.
    pub fn perlin(&self, x: f64, z: f64) -> f64 {
        let xf = x.floor();
        let zf = z.floor();
        let xi = (xf as i64 & 255) as usize;
        let zi = (zf as i64 & 255) as usize;

        let x = x - xf;
        let z = z - zf;

        let u = fade(x);
        let v = fade(z);

        let aa = self.hash(xi + self.hash(zi));
        let ab = self.hash(xi + self.hash(zi + 1));
        let ba = self.hash(xi + 1 + self.hash(zi));
        let bb = self.hash(xi + 1 + self.hash(zi + 1));

        let res = lerp(
            lerp(grad(aa, x, z), grad(ba, x - 1.0, z), u),
            lerp(grad(ab, x, z - 1.0), grad(bb, x - 1.0, z - 1.0), u),
            v,
        );

        // The 8-direction gradient set overshoots the unit range near cell centres.
        res.clamp(-1.0, 1.0)
    }
}

impl NoiseFn<f64, 2> for PermutationNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.perlin(point[0], point[1])
    }
}

impl std::fmt::Debug for PermutationNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermutationNoise")
            .field("perm", &&self.perm[..8])
            .finish_non_exhaustive()
    }
}

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Gradient from the low 3 bits of the lattice hash.
#[inline]
fn grad(hash: usize, x: f64, z: f64) -> f64 {
    let h = hash & 7;
    let (u, v) = if h < 4 { (x, z) } else { (z, x) };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { 2.0 * v } else { -2.0 * v };
    u + v
}

/// Hermite smoothstep between two edges.
#[inline]
pub(crate) fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn permutation_is_a_shuffle() {
        let noise = PermutationNoise::new(7);
        let mut values = noise.permutation().to_vec();
        values.sort_unstable();
        let expected: Vec<u8> = (0..=255).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn table_is_duplicated() {
        let noise = PermutationNoise::new(7);
        for i in 0..PERMUTATION_SIZE {
            assert_eq!(noise.perm[i], noise.perm[i + PERMUTATION_SIZE]);
        }
    }

    #[test]
    fn same_seed_same_field() {
        let a = PermutationNoise::new(12345);
        let b = PermutationNoise::new(12345);
        for i in 0..200_i32 {
            let x = f64::from(i) * 0.37 - 20.0;
            let z = f64::from(i) * -0.53 + 11.0;
            assert_eq!(a.perlin(x, z).to_bits(), b.perlin(x, z).to_bits());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = PermutationNoise::new(1);
        let b = PermutationNoise::new(2);
        let differences = (0..100_i32)
            .filter(|&i| {
                let x = f64::from(i) * 0.71 + 0.3;
                (a.perlin(x, x * 0.5) - b.perlin(x, x * 0.5)).abs() > 1e-9
            })
            .count();
        assert!(differences > 50, "Seeds should produce different noise");
    }

    #[test]
    fn zero_on_lattice_points() {
        let noise = PermutationNoise::new(99);
        for x in -5..5_i32 {
            for z in -5..5_i32 {
                assert_abs_diff_eq!(noise.perlin(f64::from(x), f64::from(z)), 0.0);
            }
        }
    }

    #[test]
    fn output_stays_in_unit_range() {
        let noise = PermutationNoise::new(3);
        for i in 0..5_000_i32 {
            let x = f64::from(i) * 0.173 - 400.0;
            let z = f64::from(i % 97) * 0.291 + 13.7;
            let n = noise.perlin(x, z);
            assert!((-1.0..=1.0).contains(&n), "perlin({x}, {z}) = {n}");
        }
    }

    #[test]
    fn field_is_continuous() {
        let noise = PermutationNoise::new(5);
        let step = 1e-4;
        for i in 0..500_i32 {
            let x = f64::from(i) * 0.113 + 0.05;
            let z = f64::from(i) * 0.071 + 0.05;
            let d = (noise.perlin(x, z) - noise.perlin(x + step, z)).abs();
            assert!(d < 0.01, "jump of {d} at ({x}, {z})");
        }
    }

    #[test]
    fn noise_fn_matches_perlin() {
        let noise = PermutationNoise::new(11);
        assert_abs_diff_eq!(noise.get([4.25, -9.5]), noise.perlin(4.25, -9.5));
    }

    #[test]
    fn rejects_non_permutation() {
        let mut p: [u8; PERMUTATION_SIZE] = std::array::from_fn(|i| i as u8);
        assert!(PermutationNoise::from_permutation(p).is_ok());
        p[10] = 11;
        assert!(PermutationNoise::from_permutation(p).is_err());
    }

    #[test]
    fn smoothstep_edges() {
        assert_abs_diff_eq!(smoothstep(0.62, 0.70, 0.5), 0.0);
        assert_abs_diff_eq!(smoothstep(0.62, 0.70, 0.9), 1.0);
        assert_abs_diff_eq!(smoothstep(0.62, 0.70, 0.66), 0.5, epsilon = 1e-12);
    }
}
