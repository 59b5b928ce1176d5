//! Order-preserving alignment of two sequences under a match predicate.
//!
//! Both inputs are stably sorted by a key, then aligned with a longest common
//! subsequence table in which "equal" means "the predicate accepts the pair".
//! The result maximizes the number of matched pairs while preserving the
//! relative order of both sequences. Ties during backtracking are broken the
//! same way every time, so a given input always produces the same alignment.
//!
//! # Example
//!
//! ```
//! use layered_iaa::SequenceDiff;
//!
//! let gold = [1, 3, 5, 7];
//! let predicted = [3, 4, 7];
//! let diff = SequenceDiff::new(&gold, &predicted, |a, b| a == b, |x| *x);
//!
//! assert_eq!(diff.matching_pairs(&gold, &predicted), vec![(&3, &3), (&7, &7)]);
//! assert_eq!(diff.a_only_elements(&gold), vec![&1, &5]);
//! assert_eq!(diff.b_only_elements(&predicted), vec![&4]);
//! ```

/// Alignment result, expressed as indices into the two input slices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceDiff {
    pairs: Vec<(usize, usize)>,
    a_only: Vec<usize>,
    b_only: Vec<usize>,
}

/// Diff operation produced while backtracking.
#[derive(Debug, Clone, Copy)]
enum DiffOp {
    Match(usize, usize),
    AOnly(usize),
    BOnly(usize),
}

impl SequenceDiff {
    /// Align `a` with `b`.
    ///
    /// Time complexity: O(N*M) predicate calls.
    pub fn new<T, K, M, S>(a: &[T], b: &[T], matches: M, sort_key: S) -> Self
    where
        K: Ord,
        M: Fn(&T, &T) -> bool,
        S: Fn(&T) -> K,
    {
        let mut a_order: Vec<usize> = (0..a.len()).collect();
        a_order.sort_by_key(|&i| sort_key(&a[i]));
        let mut b_order: Vec<usize> = (0..b.len()).collect();
        b_order.sort_by_key(|&i| sort_key(&b[i]));

        let n = a_order.len();
        let m = b_order.len();
        let matched = |i: usize, j: usize| matches(&a[a_order[i]], &b[b_order[j]]);

        // dp[i][j] = number of matched pairs aligning a[0..i] with b[0..j]
        let mut dp = vec![vec![0usize; m + 1]; n + 1];
        for i in 1..=n {
            for j in 1..=m {
                dp[i][j] = if matched(i - 1, j - 1) {
                    dp[i - 1][j - 1] + 1
                } else {
                    dp[i - 1][j].max(dp[i][j - 1])
                };
            }
        }

        let mut ops = Vec::with_capacity(n + m);
        let mut i = n;
        let mut j = m;
        while i > 0 || j > 0 {
            if i > 0 && j > 0 && matched(i - 1, j - 1) {
                ops.push(DiffOp::Match(i - 1, j - 1));
                i -= 1;
                j -= 1;
            } else if j > 0 && (i == 0 || dp[i][j - 1] >= dp[i - 1][j]) {
                ops.push(DiffOp::BOnly(j - 1));
                j -= 1;
            } else {
                ops.push(DiffOp::AOnly(i - 1));
                i -= 1;
            }
        }
        ops.reverse();

        let mut diff = SequenceDiff::default();
        for op in ops {
            match op {
                DiffOp::Match(i, j) => diff.pairs.push((a_order[i], b_order[j])),
                DiffOp::AOnly(i) => diff.a_only.push(a_order[i]),
                DiffOp::BOnly(j) => diff.b_only.push(b_order[j]),
            }
        }
        diff
    }

    /// Matched `(a_index, b_index)` pairs in sorted order.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Indices of `a` elements left unmatched, in sorted order.
    pub fn a_only(&self) -> &[usize] {
        &self.a_only
    }

    /// Indices of `b` elements left unmatched, in sorted order.
    pub fn b_only(&self) -> &[usize] {
        &self.b_only
    }

    pub fn matching_pairs<'a, T>(&self, a: &'a [T], b: &'a [T]) -> Vec<(&'a T, &'a T)> {
        self.pairs.iter().map(|&(i, j)| (&a[i], &b[j])).collect()
    }

    pub fn a_only_elements<'a, T>(&self, a: &'a [T]) -> Vec<&'a T> {
        self.a_only.iter().map(|&i| &a[i]).collect()
    }

    pub fn b_only_elements<'a, T>(&self, b: &'a [T]) -> Vec<&'a T> {
        self.b_only.iter().map(|&j| &b[j]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs() {
        let empty: [u32; 0] = [];
        let diff = SequenceDiff::new(&empty, &empty, |a, b| a == b, |x| *x);
        assert!(diff.pairs().is_empty());
        assert!(diff.a_only().is_empty());
        assert!(diff.b_only().is_empty());

        let diff = SequenceDiff::new(&[1, 2], &empty, |a, b| a == b, |x| *x);
        assert_eq!(diff.a_only(), &[0, 1]);
    }

    #[test]
    fn test_sorts_before_aligning() {
        let a = [(5, 'x'), (1, 'y')];
        let b = [(1, 'y'), (5, 'x')];
        let diff = SequenceDiff::new(&a, &b, |p, q| p.1 == q.1, |p| p.0);
        // indices refer to the unsorted inputs
        assert_eq!(diff.pairs(), &[(1, 0), (0, 1)]);
    }

    #[test]
    fn test_order_preserving() {
        // a crossing match cannot be taken alongside the in-order one
        let a = ['a', 'b'];
        let b = ['b', 'a'];
        let diff = SequenceDiff::new(&a, &b, |x, y| x == y, |_| 0);
        assert_eq!(diff.pairs().len(), 1);
        assert_eq!(diff.a_only().len(), 1);
        assert_eq!(diff.b_only().len(), 1);
    }

    #[test]
    fn test_deterministic_with_loose_predicate() {
        let a = [1, 2, 3];
        let b = [10, 20];
        let always = |_: &i32, _: &i32| true;
        let first = SequenceDiff::new(&a, &b, always, |x| *x);
        let second = SequenceDiff::new(&a, &b, always, |x| *x);
        assert_eq!(first, second);
        assert_eq!(first.pairs(), &[(1, 0), (2, 1)]);
        assert_eq!(first.a_only(), &[0]);
    }

    #[test]
    fn test_maximizes_matches() {
        let a = [1, 2, 3, 4, 5];
        let b = [2, 9, 4, 5, 8];
        let diff = SequenceDiff::new(&a, &b, |x, y| x == y, |_| 0);
        assert_eq!(diff.matching_pairs(&a, &b), vec![(&2, &2), (&4, &4), (&5, &5)]);
        assert_eq!(diff.a_only_elements(&a), vec![&1, &3]);
        assert_eq!(diff.b_only_elements(&b), vec![&9, &8]);
    }
}
