// SPDX-License-Identifier: Apache-2.0

/// Fills `bound_set` with the positions of the `k` smallest entries of
/// `levels`, extracted one minimum at a time so the result is ordered by
/// non-decreasing level. Among equal levels the lower position wins.
pub fn select_bound_set(levels: &[u32], k: usize, bound_set: &mut Vec<usize>) {
    assert!(
        k <= levels.len(),
        "select_bound_set: cannot pick {} of {} leaves",
        k,
        levels.len()
    );
    assert!(levels.len() <= 32);
    bound_set.clear();
    let mut taken = 0u32;
    for _ in 0..k {
        let mut best: Option<usize> = None;
        for (pos, level) in levels.iter().enumerate() {
            if taken & (1 << pos) != 0 {
                continue;
            }
            if best.is_none_or(|b| *level < levels[b]) {
                best = Some(pos);
            }
        }
        let Some(pos) = best else {
            unreachable!("select_bound_set: ran out of candidates");
        };
        taken |= 1 << pos;
        bound_set.push(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(&[0, 0, 0, 0, 0], 4, &[0, 1, 2, 3]; "all equal picks leading positions")]
    #[test_case(&[3, 1, 2, 0, 5, 1], 3, &[3, 1, 5]; "ties keep position order")]
    #[test_case(&[2, 2, 1, 1, 0, 7], 4, &[4, 2, 3, 0]; "ordered by level")]
    fn test_select_bound_set(levels: &[u32], k: usize, want: &[usize]) {
        let mut got = Vec::new();
        select_bound_set(levels, k, &mut got);
        assert_eq!(got, want);
    }

    #[test]
    fn test_levels_are_non_decreasing() {
        let levels = [9, 4, 4, 7, 1, 3, 8, 2];
        let mut got = Vec::new();
        select_bound_set(&levels, 5, &mut got);
        assert!(got.windows(2).all(|w| levels[w[0]] <= levels[w[1]]));
    }
}
