//! Span matching: exact boundary equality or fractional overlap.
//!
//! Offsets are compared token by token. Tokens of one span never overlap each
//! other (checked by [`Span::new`]), so every unit of shared coverage is counted
//! at most once when overlaps are summed pairwise.

use crate::annotation::Span;

/// Decides whether two spans refer to the same annotated material.
pub trait SpanMatcher: std::fmt::Debug {
    fn matches(&self, a: &Span, b: &Span) -> bool;

    /// Short name used in logs and report headers.
    fn name(&self) -> &'static str;
}

/// Matches only spans with identical token offsets in identical order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl SpanMatcher for ExactMatcher {
    fn matches(&self, a: &Span, b: &Span) -> bool {
        a.offsets().eq(b.offsets())
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

/// Matches spans whose shared coverage exceeds a fraction of the larger span.
#[derive(Debug, Clone, Copy)]
pub struct PartialOverlapMatcher {
    min_overlap_fraction: f64,
}

impl PartialOverlapMatcher {
    pub fn new(min_overlap_fraction: f64) -> Self {
        Self {
            min_overlap_fraction,
        }
    }

    pub fn min_overlap_fraction(&self) -> f64 {
        self.min_overlap_fraction
    }
}

impl SpanMatcher for PartialOverlapMatcher {
    fn matches(&self, a: &Span, b: &Span) -> bool {
        // Identical spans always match, even when the threshold is 1.0.
        if ExactMatcher.matches(a, b) {
            return true;
        }
        overlap_fraction(a, b) > self.min_overlap_fraction
    }

    fn name(&self) -> &'static str {
        "partial"
    }
}

/// The two matching strategies, chosen once per comparison.
#[derive(Debug, Clone, Copy)]
pub enum MatchStrategy {
    Exact(ExactMatcher),
    Partial(PartialOverlapMatcher),
}

impl MatchStrategy {
    /// Exact matching when `allow_partial` is false; the fraction is then ignored.
    pub fn new(allow_partial: bool, min_overlap_fraction: f64) -> Self {
        if allow_partial {
            MatchStrategy::Partial(PartialOverlapMatcher::new(min_overlap_fraction))
        } else {
            MatchStrategy::Exact(ExactMatcher)
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, MatchStrategy::Partial(_))
    }

    pub fn matcher(&self) -> &dyn SpanMatcher {
        match self {
            MatchStrategy::Exact(m) => m,
            MatchStrategy::Partial(m) => m,
        }
    }
}

/// Fraction of the larger span covered by the smaller one.
///
/// The larger span is the one with more covered characters; on a tie the first
/// argument is treated as larger. Returns exactly 1.0 for identical offsets and
/// 0.0 when the larger span covers no characters.
pub fn overlap_fraction(a: &Span, b: &Span) -> f64 {
    if ExactMatcher.matches(a, b) {
        return 1.0;
    }

    let (larger, smaller) = if a.covered_len() >= b.covered_len() {
        (a, b)
    } else {
        (b, a)
    };
    let larger_length = larger.covered_len() as f64;
    if larger_length == 0.0 {
        return 0.0;
    }

    let mut fraction = 0.0;
    for (l_start, l_end) in larger.offsets() {
        for (s_start, s_end) in smaller.offsets() {
            let overlap_start = l_start.max(s_start);
            let overlap_end = l_end.min(s_end);
            if overlap_end > overlap_start {
                fraction += (overlap_end - overlap_start) as f64 / larger_length;
            }
        }
    }
    fraction
}

/// Match two spans under the given mode.
///
/// With `allow_partial` false the threshold is forced to 1.0 and only exact
/// offsets match. Otherwise the overlap fraction must be strictly greater than
/// `min_overlap_fraction`.
pub fn matches(a: &Span, b: &Span, allow_partial: bool, min_overlap_fraction: f64) -> bool {
    MatchStrategy::new(allow_partial, min_overlap_fraction)
        .matcher()
        .matches(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Token;

    fn span(offsets: &[(usize, usize)]) -> Span {
        Span::new(
            offsets
                .iter()
                .enumerate()
                .map(|(i, &(s, e))| Token::new(i + 1, s, e, "w"))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_identical_offsets_overlap_fully() {
        let a = span(&[(0, 4), (10, 15)]);
        let b = span(&[(0, 4), (10, 15)]);
        assert_eq!(overlap_fraction(&a, &b), 1.0);
        assert!(matches(&a, &b, false, 0.5));
        assert!(matches(&a, &b, true, 0.5));
        assert!(matches(&a, &b, true, 1.0));
    }

    #[test]
    fn test_exact_mode_rejects_partial_overlap() {
        let a = span(&[(0, 4), (5, 10)]);
        let b = span(&[(0, 4)]);
        assert!(!matches(&a, &b, false, 0.1));
    }

    #[test]
    fn test_fraction_uses_larger_span() {
        // larger covers 10 chars, smaller shares 6 of them
        let larger = span(&[(0, 4), (6, 12)]);
        let smaller = span(&[(6, 12)]);
        let fraction = overlap_fraction(&larger, &smaller);
        assert!((fraction - 0.6).abs() < 1e-9);
        assert!((overlap_fraction(&smaller, &larger) - 0.6).abs() < 1e-9);
        assert!(matches(&larger, &smaller, true, 0.5));
        assert!(!matches(&larger, &smaller, true, 0.6));
    }

    #[test]
    fn test_threshold_is_strict() {
        let a = span(&[(0, 5), (6, 11)]);
        let b = span(&[(0, 5)]);
        assert_eq!(overlap_fraction(&a, &b), 0.5);
        assert!(!matches(&a, &b, true, 0.5));
        assert!(matches(&a, &b, true, 0.49));
    }

    #[test]
    fn test_disjoint_spans() {
        let a = span(&[(0, 5)]);
        let b = span(&[(5, 9)]);
        assert_eq!(overlap_fraction(&a, &b), 0.0);
        assert!(!matches(&a, &b, true, 0.01));
    }

    #[test]
    fn test_strategy_selection() {
        assert!(!MatchStrategy::new(false, 0.3).is_partial());
        assert!(MatchStrategy::new(true, 0.3).is_partial());
        assert_eq!(MatchStrategy::new(true, 0.3).matcher().name(), "partial");
    }
}
