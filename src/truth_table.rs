// SPDX-License-Identifier: Apache-2.0

//! Bit-packed truth tables over up to `MAX_VARS` variables.
//!
//! We represent a Boolean function `f(x0, .., x{n-1})` as `2^n` bits packed
//! into 32-bit words, where bit `i` holds the output value on the input
//! assignment encoded by `i`:
//! - `x0 = (i >> 0) & 1`
//! - `x1 = (i >> 1) & 1`
//! - ...
//!
//! That is, `x0` is the least-significant selector bit and toggles fastest.
//!
//! Functions over fewer than five variables occupy a single word and are
//! stored replicated across it (a 2-variable table `0b1000` is stored as
//! `0x8888_8888`). Every operation here preserves that invariant, which is what
//! lets whole-word comparisons and complements stay exact.

/// Largest variable count a table may be defined over.
pub const MAX_VARS: usize = 15;

/// Elementary patterns for the variables that live inside a single word.
const VAR_MASKS: [u32; 5] = [
    0xAAAA_AAAA,
    0xCCCC_CCCC,
    0xF0F0_F0F0,
    0xFF00_FF00,
    0xFFFF_0000,
];

/// Returns the number of 32-bit words needed for a table over `num_vars`.
#[inline]
pub const fn word_count(num_vars: usize) -> usize {
    if num_vars <= 5 {
        1
    } else {
        1 << (num_vars - 5)
    }
}

/// Returns the number of variables set in `mask`.
#[inline]
pub fn count_ones(mask: u32) -> usize {
    mask.count_ones() as usize
}

/// Returns a mask with the low `num_vars` bits set.
#[inline]
pub const fn full_mask(num_vars: usize) -> u32 {
    if num_vars >= 32 {
        u32::MAX
    } else {
        (1u32 << num_vars) - 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TruthTable {
    num_vars: usize,
    words: Vec<u32>,
}

impl TruthTable {
    /// Returns the constant-zero function over `num_vars`.
    pub fn const0(num_vars: usize) -> Self {
        assert!(
            num_vars <= MAX_VARS,
            "TruthTable: {} variables exceeds the maximum of {}",
            num_vars,
            MAX_VARS
        );
        Self {
            num_vars,
            words: vec![0; word_count(num_vars)],
        }
    }

    pub fn const1(num_vars: usize) -> Self {
        let mut t = Self::const0(num_vars);
        t.fill();
        t
    }

    /// Returns an empty table whose storage can hold up to `max_vars`
    /// variables without reallocating. Useful for scratch buffers that are
    /// resized as the variable count of the current problem changes.
    pub fn with_capacity(max_vars: usize) -> Self {
        assert!(max_vars <= MAX_VARS);
        let mut words = Vec::with_capacity(word_count(max_vars));
        words.push(0);
        Self { num_vars: 0, words }
    }

    /// Returns the elementary function of variable `var` over `num_vars`.
    pub fn var(num_vars: usize, var: usize) -> Self {
        let mut t = Self::with_capacity(num_vars);
        t.set_var(num_vars, var);
        t
    }

    /// Builds a table over at most six variables from a 64-bit pattern, using
    /// the low `2^num_vars` bits.
    pub fn from_u64(num_vars: usize, bits: u64) -> Self {
        assert!(num_vars <= 6, "from_u64: {} variables do not fit in a u64", num_vars);
        let mut t = Self::const0(num_vars);
        if num_vars == 6 {
            t.words[0] = bits as u32;
            t.words[1] = (bits >> 32) as u32;
        } else {
            t.words[0] = bits as u32;
            t.replicate();
        }
        t
    }

    /// Returns the function as a 64-bit pattern, replicated across all 64
    /// bits when defined over fewer than six variables.
    pub fn to_u64(&self) -> u64 {
        assert!(
            self.num_vars <= 6,
            "to_u64: {} variables do not fit in a u64",
            self.num_vars
        );
        if self.num_vars == 6 {
            (self.words[0] as u64) | ((self.words[1] as u64) << 32)
        } else {
            (self.words[0] as u64) | ((self.words[0] as u64) << 32)
        }
    }

    #[inline]
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    #[inline]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Changes the variable count and sets the table to constant zero.
    pub fn reset(&mut self, num_vars: usize) {
        assert!(num_vars <= MAX_VARS);
        self.num_vars = num_vars;
        self.words.clear();
        self.words.resize(word_count(num_vars), 0);
    }

    /// Overwrites `self` with the elementary function of `var` over
    /// `num_vars`.
    pub fn set_var(&mut self, num_vars: usize, var: usize) {
        assert!(
            var < num_vars,
            "set_var: variable {} out of range for {} variables",
            var,
            num_vars
        );
        self.reset(num_vars);
        if var < 5 {
            self.words.fill(VAR_MASKS[var]);
        } else {
            let bit = 1usize << (var - 5);
            for (k, w) in self.words.iter_mut().enumerate() {
                *w = if k & bit != 0 { u32::MAX } else { 0 };
            }
        }
    }

    pub fn copy_from(&mut self, src: &TruthTable) {
        self.num_vars = src.num_vars;
        self.words.clear();
        self.words.extend_from_slice(&src.words);
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn fill(&mut self) {
        self.words.fill(u32::MAX);
    }

    pub fn is_const0(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn is_const1(&self) -> bool {
        self.words.iter().all(|w| *w == u32::MAX)
    }

    #[inline]
    fn assert_same_vars(&self, other: &TruthTable, op: &str) {
        assert_eq!(
            self.num_vars, other.num_vars,
            "{}: mismatched variable counts ({} vs {})",
            op, self.num_vars, other.num_vars
        );
    }

    pub fn and_assign(&mut self, other: &TruthTable) {
        self.assert_same_vars(other, "and");
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w &= *o;
        }
    }

    pub fn or_assign(&mut self, other: &TruthTable) {
        self.assert_same_vars(other, "or");
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w |= *o;
        }
    }

    /// `self = self & !other`.
    pub fn sharp_assign(&mut self, other: &TruthTable) {
        self.assert_same_vars(other, "sharp");
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w &= !*o;
        }
    }

    pub fn not_assign(&mut self) {
        for w in self.words.iter_mut() {
            *w = !*w;
        }
    }

    #[must_use]
    pub fn and(&self, other: &TruthTable) -> TruthTable {
        let mut t = self.clone();
        t.and_assign(other);
        t
    }

    #[must_use]
    pub fn or(&self, other: &TruthTable) -> TruthTable {
        let mut t = self.clone();
        t.or_assign(other);
        t
    }

    #[must_use]
    pub fn sharp(&self, other: &TruthTable) -> TruthTable {
        let mut t = self.clone();
        t.sharp_assign(other);
        t
    }

    #[must_use]
    pub fn not(&self) -> TruthTable {
        let mut t = self.clone();
        t.not_assign();
        t
    }

    /// Exact equality of two functions over the same variable count.
    pub fn is_equal(&self, other: &TruthTable) -> bool {
        self.assert_same_vars(other, "is_equal");
        self.words == other.words
    }

    #[inline]
    pub fn get_bit(&self, minterm: usize) -> bool {
        debug_assert!(minterm < (1usize << self.num_vars));
        (self.words[minterm >> 5] >> (minterm & 31)) & 1 != 0
    }

    /// Sets the value on `minterm`, keeping single-word tables replicated.
    pub fn set_bit(&mut self, minterm: usize, value: bool) {
        debug_assert!(minterm < (1usize << self.num_vars));
        if self.num_vars >= 5 {
            let mask = 1u32 << (minterm & 31);
            if value {
                self.words[minterm >> 5] |= mask;
            } else {
                self.words[minterm >> 5] &= !mask;
            }
            return;
        }
        let period = 1usize << self.num_vars;
        let mut bit = minterm;
        while bit < 32 {
            if value {
                self.words[0] |= 1 << bit;
            } else {
                self.words[0] &= !(1 << bit);
            }
            bit += period;
        }
    }

    /// Copies the low `2^num_vars` bits of the first word over the rest of
    /// it. No-op for tables of five or more variables.
    fn replicate(&mut self) {
        if self.num_vars >= 5 {
            return;
        }
        let period = 1u32 << self.num_vars;
        let low = self.words[0] & ((1u32 << period) - 1);
        let mut w = 0u32;
        let mut shift = 0;
        while shift < 32 {
            w |= low << shift;
            shift += period;
        }
        self.words[0] = w;
    }

    /// Returns true if the function depends on variable `var`.
    pub fn var_in_support(&self, var: usize) -> bool {
        assert!(
            var < self.num_vars,
            "var_in_support: variable {} out of range for {} variables",
            var,
            self.num_vars
        );
        if var < 5 {
            let mask = VAR_MASKS[var];
            let shift = 1u32 << var;
            return self
                .words
                .iter()
                .any(|w| (w & !mask) != ((w & mask) >> shift));
        }
        let step = 1usize << (var - 5);
        self.words
            .chunks(2 * step)
            .any(|block| block[..step] != block[step..])
    }

    /// Returns the bitmask of variables the function depends on.
    pub fn support(&self) -> u32 {
        (0..self.num_vars)
            .filter(|v| self.var_in_support(*v))
            .fold(0u32, |acc, v| acc | (1 << v))
    }

    pub fn support_size(&self) -> usize {
        count_ones(self.support())
    }

    /// Replaces the function by its negative cofactor with respect to `var`.
    /// The variable count is unchanged; the result no longer depends on `var`.
    pub fn cofactor0(&mut self, var: usize) {
        assert!(var < self.num_vars);
        if var < 5 {
            let mask = !VAR_MASKS[var];
            let shift = 1u32 << var;
            for w in self.words.iter_mut() {
                *w = (*w & mask) | ((*w & mask) << shift);
            }
            return;
        }
        let step = 1usize << (var - 5);
        for block in self.words.chunks_mut(2 * step) {
            let (lo, hi) = block.split_at_mut(step);
            hi.copy_from_slice(lo);
        }
    }

    /// Replaces the function by its positive cofactor with respect to `var`.
    pub fn cofactor1(&mut self, var: usize) {
        assert!(var < self.num_vars);
        if var < 5 {
            let mask = VAR_MASKS[var];
            let shift = 1u32 << var;
            for w in self.words.iter_mut() {
                *w = (*w & mask) | ((*w & mask) >> shift);
            }
            return;
        }
        let step = 1usize << (var - 5);
        for block in self.words.chunks_mut(2 * step) {
            let (lo, hi) = block.split_at_mut(step);
            lo.copy_from_slice(hi);
        }
    }

    /// Projects `src` onto the variables in `keep_mask`, renumbering them
    /// densely in their original order, and stores the result in `self`.
    ///
    /// Variables outside `keep_mask` must not be in the support of `src`;
    /// they are evaluated at zero.
    pub fn shrink_from(&mut self, src: &TruthTable, keep_mask: u32) {
        assert_eq!(
            keep_mask & !full_mask(src.num_vars),
            0,
            "shrink: keep mask {:#x} names variables beyond {}",
            keep_mask,
            src.num_vars
        );
        let mut kept = [0usize; MAX_VARS];
        let mut num_vars_after = 0;
        for v in 0..src.num_vars {
            if keep_mask & (1 << v) != 0 {
                kept[num_vars_after] = v;
                num_vars_after += 1;
            }
        }
        self.reset(num_vars_after);
        for minterm in 0..(1usize << num_vars_after) {
            let mut src_minterm = 0usize;
            for (j, v) in kept[..num_vars_after].iter().enumerate() {
                if (minterm >> j) & 1 != 0 {
                    src_minterm |= 1 << v;
                }
            }
            if src.get_bit(src_minterm) {
                self.words[minterm >> 5] |= 1 << (minterm & 31);
            }
        }
        self.replicate();
    }

    /// Embeds `src` into a table over `num_vars_after` variables, where
    /// variable `i` of `src` becomes variable `positions[i]` of the result.
    pub fn stretch_from(&mut self, src: &TruthTable, num_vars_after: usize, positions: &[usize]) {
        assert_eq!(positions.len(), src.num_vars);
        debug_assert!(positions.iter().all(|p| *p < num_vars_after));
        self.reset(num_vars_after);
        for minterm in 0..(1usize << num_vars_after) {
            let mut src_minterm = 0usize;
            for (i, p) in positions.iter().enumerate() {
                if (minterm >> p) & 1 != 0 {
                    src_minterm |= 1 << i;
                }
            }
            if src.get_bit(src_minterm) {
                self.words[minterm >> 5] |= 1 << (minterm & 31);
            }
        }
        self.replicate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    /// Reference evaluation: builds a table bit by bit from a closure.
    fn from_fn(num_vars: usize, f: impl Fn(usize) -> bool) -> TruthTable {
        let mut t = TruthTable::const0(num_vars);
        for m in 0..(1usize << num_vars) {
            t.set_bit(m, f(m));
        }
        t
    }

    #[test_case(1)]
    #[test_case(3)]
    #[test_case(5)]
    #[test_case(7)]
    #[test_case(10)]
    fn test_elementary_vars_match_assignment_bits(num_vars: usize) {
        for v in 0..num_vars {
            let t = TruthTable::var(num_vars, v);
            for m in 0..(1usize << num_vars) {
                assert_eq!(t.get_bit(m), (m >> v) & 1 != 0, "var {} minterm {}", v, m);
            }
        }
    }

    #[test]
    fn test_small_tables_are_replicated() {
        let a = TruthTable::var(2, 0);
        let b = TruthTable::var(2, 1);
        let ab = a.and(&b);
        assert_eq!(ab.words(), &[0x8888_8888]);
        assert_eq!(ab.not().words(), &[0x7777_7777]);
        assert_eq!(ab.to_u64(), 0x8888_8888_8888_8888);
    }

    #[test]
    fn test_and_or_sharp_not() {
        let n = 7;
        let a = TruthTable::var(n, 1);
        let b = TruthTable::var(n, 6);
        let want_and = from_fn(n, |m| (m >> 1) & 1 != 0 && (m >> 6) & 1 != 0);
        let want_or = from_fn(n, |m| (m >> 1) & 1 != 0 || (m >> 6) & 1 != 0);
        let want_sharp = from_fn(n, |m| (m >> 1) & 1 != 0 && (m >> 6) & 1 == 0);
        assert!(a.and(&b).is_equal(&want_and));
        assert!(a.or(&b).is_equal(&want_or));
        assert!(a.sharp(&b).is_equal(&want_sharp));
        assert!(a.not().not().is_equal(&a));
        assert!(a.or(&a.not()).is_const1());
        assert!(a.and(&a.not()).is_const0());
    }

    #[test]
    #[should_panic(expected = "mismatched variable counts")]
    fn test_mismatched_var_counts_panic() {
        let mut a = TruthTable::var(4, 0);
        let b = TruthTable::var(5, 0);
        a.and_assign(&b);
    }

    #[test]
    fn test_support_detects_used_vars_only() {
        let n = 8;
        // f = x0 & !x3 | x7
        let f = from_fn(n, |m| ((m & 1 != 0) && (m >> 3) & 1 == 0) || (m >> 7) & 1 != 0);
        assert_eq!(f.support(), 0b1000_1001);
        assert_eq!(f.support_size(), 3);
        assert!(f.var_in_support(7));
        assert!(!f.var_in_support(5));
        assert_eq!(TruthTable::const1(n).support(), 0);
    }

    #[test_case(4, 2)]
    #[test_case(6, 4)]
    #[test_case(6, 5)]
    #[test_case(9, 7)]
    fn test_cofactors_fix_variable(num_vars: usize, var: usize) {
        // f = parity of all variables: every cofactor is the (complemented)
        // parity of the others.
        let f = from_fn(num_vars, |m| m.count_ones() % 2 == 1);
        let mut c0 = f.clone();
        c0.cofactor0(var);
        let mut c1 = f.clone();
        c1.cofactor1(var);
        assert!(!c0.var_in_support(var));
        assert!(!c1.var_in_support(var));
        for m in 0..(1usize << num_vars) {
            assert_eq!(c0.get_bit(m), f.get_bit(m & !(1 << var)));
            assert_eq!(c1.get_bit(m), f.get_bit(m | (1 << var)));
        }
    }

    #[test]
    fn test_shrink_drops_unused_vars_and_renumbers() {
        // f(x0..x5) = x1 & x4, shrunk onto {x1, x4} becomes y0 & y1.
        let f = from_fn(6, |m| (m >> 1) & 1 != 0 && (m >> 4) & 1 != 0);
        let mut g = TruthTable::with_capacity(6);
        g.shrink_from(&f, f.support());
        assert_eq!(g.num_vars(), 2);
        assert!(g.is_equal(&TruthTable::var(2, 0).and(&TruthTable::var(2, 1))));
    }

    #[test]
    fn test_shrink_large_table() {
        // f over 12 vars depends on x2, x9, x11 only: majority of the three.
        let f = from_fn(12, |m| {
            let bits = [(m >> 2) & 1, (m >> 9) & 1, (m >> 11) & 1];
            bits.iter().sum::<usize>() >= 2
        });
        let mut g = TruthTable::with_capacity(12);
        g.shrink_from(&f, f.support());
        assert_eq!(g.num_vars(), 3);
        assert_eq!(g.to_u64() & 0xFF, 0b1110_1000);
    }

    #[test]
    fn test_stretch_places_vars() {
        // g(y0, y1) = y0 & !y1, embedded with y0 -> x3, y1 -> x0.
        let g = TruthTable::var(2, 0).sharp(&TruthTable::var(2, 1));
        let mut f = TruthTable::with_capacity(4);
        f.stretch_from(&g, 4, &[3, 0]);
        let want = TruthTable::var(4, 3).sharp(&TruthTable::var(4, 0));
        assert!(f.is_equal(&want));
    }

    #[test]
    fn test_u64_round_trip_for_six_vars() {
        let bits = 0x0123_4567_89AB_CDEFu64;
        assert_eq!(TruthTable::from_u64(6, bits).to_u64(), bits);
        assert_eq!(TruthTable::from_u64(3, 0b1001_0110).to_u64(), 0x9696_9696_9696_9696);
    }

    #[test]
    fn test_count_ones_and_full_mask() {
        assert_eq!(count_ones(0b1011), 3);
        assert_eq!(full_mask(0), 0);
        assert_eq!(full_mask(15), 0x7FFF);
        assert_eq!(word_count(4), 1);
        assert_eq!(word_count(15), 1024);
    }
}
