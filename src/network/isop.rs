// SPDX-License-Identifier: Apache-2.0

//! Irredundant sum-of-products covers for LUT functions of up to six inputs.
//!
//! Covers are derived with the Minato-Morreale recursion on 64-bit truth
//! patterns. Patterns are expected in the replicated layout produced by
//! `TruthTable::to_u64`, so that "constant one" is always `u64::MAX`.

use serde::{Deserialize, Serialize};

pub const MAX_COVER_VARS: usize = 6;

const VAR_MASKS64: [u64; 6] = [
    0xAAAA_AAAA_AAAA_AAAA,
    0xCCCC_CCCC_CCCC_CCCC,
    0xF0F0_F0F0_F0F0_F0F0,
    0xFF00_FF00_FF00_FF00,
    0xFFFF_0000_FFFF_0000,
    0xFFFF_FFFF_0000_0000,
];

/// Replicates the low `2^num_vars` bits of `truth` over all 64 bits.
pub fn replicate_u64(truth: u64, num_vars: usize) -> u64 {
    assert!(num_vars <= MAX_COVER_VARS);
    if num_vars == MAX_COVER_VARS {
        return truth;
    }
    let period = 1u32 << num_vars;
    let low = truth & ((1u64 << period) - 1);
    let mut out = 0u64;
    let mut shift = 0;
    while shift < 64 {
        out |= low << shift;
        shift += period;
    }
    out
}

/// A product term: variable `v` appears iff bit `v` of `mask` is set, and is
/// then required to equal bit `v` of `polarity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cube {
    pub mask: u8,
    pub polarity: u8,
}

impl Cube {
    pub const UNIVERSE: Cube = Cube {
        mask: 0,
        polarity: 0,
    };

    pub fn literal_count(&self) -> usize {
        self.mask.count_ones() as usize
    }

    pub fn contains(&self, minterm: usize) -> bool {
        let m = minterm as u8;
        (m ^ self.polarity) & self.mask == 0
    }

    fn to_truth(self) -> u64 {
        let mut t = u64::MAX;
        for v in 0..MAX_COVER_VARS {
            if self.mask & (1 << v) == 0 {
                continue;
            }
            if self.polarity & (1 << v) != 0 {
                t &= VAR_MASKS64[v];
            } else {
                t &= !VAR_MASKS64[v];
            }
        }
        t
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cover {
    pub num_vars: usize,
    pub cubes: Vec<Cube>,
}

impl Cover {
    pub fn eval(&self, minterm: usize) -> bool {
        self.cubes.iter().any(|c| c.contains(minterm))
    }

    /// Returns the replicated 64-bit truth pattern of the cover.
    pub fn to_truth(&self) -> u64 {
        self.cubes.iter().fold(0u64, |acc, c| acc | c.to_truth())
    }

    pub fn literal_count(&self) -> usize {
        self.cubes.iter().map(Cube::literal_count).sum()
    }
}

#[inline]
fn cofactor0(t: u64, v: usize) -> u64 {
    let lo = t & !VAR_MASKS64[v];
    lo | (lo << (1 << v))
}

#[inline]
fn cofactor1(t: u64, v: usize) -> u64 {
    let hi = t & VAR_MASKS64[v];
    hi | (hi >> (1 << v))
}

#[inline]
fn depends_on(t: u64, v: usize) -> bool {
    cofactor0(t, v) != cofactor1(t, v)
}

/// Computes an irredundant cover of the function `truth` over `num_vars`
/// inputs.
pub fn isop(truth: u64, num_vars: usize) -> Cover {
    let t = replicate_u64(truth, num_vars);
    let mut cubes = Vec::new();
    let covered = isop_rec(t, t, num_vars, &mut cubes);
    debug_assert_eq!(covered, t);
    Cover { num_vars, cubes }
}

/// Finds a cover `c` with `on <= c <= on_dc`, appending its cubes to `cubes`.
fn isop_rec(on: u64, on_dc: u64, num_vars: usize, cubes: &mut Vec<Cube>) -> u64 {
    if on == 0 {
        return 0;
    }
    if on_dc == u64::MAX {
        cubes.push(Cube::UNIVERSE);
        return u64::MAX;
    }
    let Some(v) = (0..num_vars)
        .rev()
        .find(|v| depends_on(on, *v) || depends_on(on_dc, *v))
    else {
        // Neither bound depends on any variable and `on` is non-zero, so both
        // are constant one and the previous check already returned.
        unreachable!("isop: non-constant bounds without support");
    };
    let (on0, on1) = (cofactor0(on, v), cofactor1(on, v));
    let (dc0, dc1) = (cofactor0(on_dc, v), cofactor1(on_dc, v));

    let start0 = cubes.len();
    let r0 = isop_rec(on0 & !dc1, dc0, num_vars, cubes);
    for c in &mut cubes[start0..] {
        c.mask |= 1 << v;
    }
    let start1 = cubes.len();
    let r1 = isop_rec(on1 & !dc0, dc1, num_vars, cubes);
    for c in &mut cubes[start1..] {
        c.mask |= 1 << v;
        c.polarity |= 1 << v;
    }
    let r2 = isop_rec((on0 & !r0) | (on1 & !r1), dc0 & dc1, num_vars, cubes);

    (r0 & !VAR_MASKS64[v]) | (r1 & VAR_MASKS64[v]) | r2
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;
    use test_case::test_case;

    #[test]
    fn test_isop_of_constants() {
        assert!(isop(0, 4).cubes.is_empty());
        let one = isop(u64::MAX, 4);
        assert_eq!(one.cubes, vec![Cube::UNIVERSE]);
    }

    #[test]
    fn test_isop_and2_is_single_cube() {
        let cover = isop(0b1000, 2);
        assert_eq!(cover.cubes.len(), 1);
        assert_eq!(cover.cubes[0].mask, 0b11);
        assert_eq!(cover.cubes[0].polarity, 0b11);
    }

    #[test]
    fn test_isop_xor2_has_two_cubes() {
        let cover = isop(0b0110, 2);
        assert_eq!(cover.cubes.len(), 2);
        assert_eq!(cover.literal_count(), 4);
        assert_eq!(cover.to_truth(), replicate_u64(0b0110, 2));
    }

    #[test_case(3)]
    #[test_case(4)]
    #[test_case(6)]
    fn test_isop_matches_random_functions(num_vars: usize) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x150b);
        for _ in 0..200 {
            let truth = replicate_u64(rng.r#gen::<u64>(), num_vars);
            let cover = isop(truth, num_vars);
            assert_eq!(cover.to_truth(), truth, "cover mismatch for {:#x}", truth);
            for m in 0..(1usize << num_vars) {
                assert_eq!(cover.eval(m), (truth >> m) & 1 != 0);
            }
        }
    }
}
