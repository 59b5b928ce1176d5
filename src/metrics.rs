//! Classification metrics and the two ways of combining them.
//!
//! Merging (`+`) sums raw counts and is exact: the merged metrics describe the
//! union of the underlying observations. Averaging computes each input's
//! precision, recall and F1 first and then takes the mean of each rate. The two
//! give different answers whenever inputs differ in size, so they are kept as
//! separate operations with separate result types.

use std::ops::Add;

use serde::Serialize;

use crate::errors::{IaaError, IaaResult};

/// Anything that can report precision, recall and F1.
///
/// A rate is `None` when it is undefined (a zero denominator).
pub trait Rates {
    fn precision(&self) -> Option<f64>;
    fn recall(&self) -> Option<f64>;
    fn f1(&self) -> Option<f64>;
}

/// Raw true positive / false positive / false negative counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClassificationMetrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ClassificationMetrics {
    pub fn new(true_positives: usize, false_positives: usize, false_negatives: usize) -> Self {
        Self {
            true_positives,
            false_positives,
            false_negatives,
        }
    }

    /// Elementwise sum of counts.
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            true_positives: self.true_positives + other.true_positives,
            false_positives: self.false_positives + other.false_positives,
            false_negatives: self.false_negatives + other.false_negatives,
        }
    }

    /// Number of observations counted at all.
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives
    }
}

impl Rates for ClassificationMetrics {
    fn precision(&self) -> Option<f64> {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    fn recall(&self) -> Option<f64> {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    fn f1(&self) -> Option<f64> {
        ratio(
            2 * self.true_positives,
            2 * self.true_positives + self.false_positives + self.false_negatives,
        )
    }
}

impl Add for ClassificationMetrics {
    type Output = ClassificationMetrics;

    fn add(self, other: Self) -> Self::Output {
        self.merged(&other)
    }
}

impl std::iter::Sum for ClassificationMetrics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, m| acc.merged(&m))
    }
}

/// Mean of per-input rates.
///
/// Inputs whose rate is undefined are skipped for that rate rather than
/// counted as zero; a rate that is undefined for every input stays `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AveragedMetrics {
    precision: Option<f64>,
    recall: Option<f64>,
    f1: Option<f64>,
    /// How many inputs were averaged, defined or not.
    pub instances: usize,
}

impl AveragedMetrics {
    pub fn average<'a, R, I>(metrics: I) -> Self
    where
        R: Rates + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let mut precision = MeanScore::default();
        let mut recall = MeanScore::default();
        let mut f1 = MeanScore::default();
        let mut instances = 0;
        for m in metrics {
            instances += 1;
            precision.record_opt(m.precision());
            recall.record_opt(m.recall());
            f1.record_opt(m.f1());
        }
        Self {
            precision: precision.mean(),
            recall: recall.mean(),
            f1: f1.mean(),
            instances,
        }
    }
}

impl Rates for AveragedMetrics {
    fn precision(&self) -> Option<f64> {
        self.precision
    }

    fn recall(&self) -> Option<f64> {
        self.recall
    }

    fn f1(&self) -> Option<f64> {
        self.f1
    }
}

/// Metrics as stored in a report: raw counts from a single comparison, or
/// averaged rates after aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgreementMetrics {
    Counts(ClassificationMetrics),
    Averaged(AveragedMetrics),
}

impl AgreementMetrics {
    /// Raw counts, if these metrics have not been averaged.
    pub fn counts(&self) -> Option<&ClassificationMetrics> {
        match self {
            AgreementMetrics::Counts(counts) => Some(counts),
            AgreementMetrics::Averaged(_) => None,
        }
    }

    /// Sum two sets of counts. Averaged rates have no counts to sum.
    pub fn merged(&self, other: &Self) -> IaaResult<Self> {
        match (self, other) {
            (AgreementMetrics::Counts(a), AgreementMetrics::Counts(b)) => {
                Ok(AgreementMetrics::Counts(a.merged(b)))
            }
            _ => Err(IaaError::invalid_input(
                "averaged metrics cannot be merged by summing counts",
            )),
        }
    }

    /// Average the rates of every input, counted or already averaged.
    pub fn average<'a, I>(metrics: I) -> Self
    where
        I: IntoIterator<Item = &'a AgreementMetrics>,
    {
        AgreementMetrics::Averaged(AveragedMetrics::average(metrics))
    }
}

impl From<ClassificationMetrics> for AgreementMetrics {
    fn from(counts: ClassificationMetrics) -> Self {
        AgreementMetrics::Counts(counts)
    }
}

impl Rates for AgreementMetrics {
    fn precision(&self) -> Option<f64> {
        match self {
            AgreementMetrics::Counts(m) => m.precision(),
            AgreementMetrics::Averaged(m) => m.precision(),
        }
    }

    fn recall(&self) -> Option<f64> {
        match self {
            AgreementMetrics::Counts(m) => m.recall(),
            AgreementMetrics::Averaged(m) => m.recall(),
        }
    }

    fn f1(&self) -> Option<f64> {
        match self {
            AgreementMetrics::Counts(m) => m.f1(),
            AgreementMetrics::Averaged(m) => m.f1(),
        }
    }
}

/// Running sum and count of scores; mergeable without loss.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MeanScore {
    pub total: f64,
    pub count: usize,
}

impl MeanScore {
    pub fn record(&mut self, score: f64) {
        self.total += score;
        self.count += 1;
    }

    pub fn record_opt(&mut self, score: Option<f64>) {
        if let Some(score) = score {
            self.record(score);
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total / self.count as f64)
        }
    }

    pub fn merged(&self, other: &Self) -> Self {
        Self {
            total: self.total + other.total,
            count: self.count + other.count,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let m = ClassificationMetrics::new(4, 2, 3);
        assert_eq!(m.precision(), Some(4.0 / 6.0));
        assert_eq!(m.recall(), Some(4.0 / 7.0));
        assert_eq!(m.f1(), Some(8.0 / 13.0));
    }

    #[test]
    fn test_undefined_rates() {
        let empty = ClassificationMetrics::default();
        assert_eq!(empty.precision(), None);
        assert_eq!(empty.recall(), None);
        assert_eq!(empty.f1(), None);

        let missed = ClassificationMetrics::new(0, 0, 3);
        assert_eq!(missed.precision(), None);
        assert_eq!(missed.recall(), Some(0.0));
        assert_eq!(missed.f1(), Some(0.0));
    }

    #[test]
    fn test_merge_sums_counts() {
        let a = ClassificationMetrics::new(1, 2, 3);
        let b = ClassificationMetrics::new(10, 20, 30);
        assert_eq!(a + b, ClassificationMetrics::new(11, 22, 33));
        let total: ClassificationMetrics = vec![a, b, a].into_iter().sum();
        assert_eq!(total, ClassificationMetrics::new(12, 24, 36));
    }

    #[test]
    fn test_average_is_mean_of_rates_not_of_counts() {
        let small = ClassificationMetrics::new(1, 0, 0);
        let large = ClassificationMetrics::new(1, 9, 0);
        let averaged = AveragedMetrics::average(&[small, large]);
        assert_eq!(averaged.precision(), Some((1.0 + 0.1) / 2.0));
        assert_eq!(averaged.instances, 2);
        // summed counts would give 2 / 11
        assert_ne!(averaged.precision(), (small + large).precision());
    }

    #[test]
    fn test_average_skips_undefined() {
        let defined = ClassificationMetrics::new(3, 1, 0);
        let empty = ClassificationMetrics::default();
        let averaged = AveragedMetrics::average(&[defined, empty]);
        assert_eq!(averaged.precision(), Some(0.75));
        assert_eq!(averaged.recall(), Some(1.0));

        let none = AveragedMetrics::average(&[empty, empty]);
        assert_eq!(none.precision(), None);
    }

    #[test]
    fn test_agreement_metrics_merge_rules() {
        let counts = AgreementMetrics::from(ClassificationMetrics::new(2, 0, 1));
        let merged = counts.merged(&counts).unwrap();
        assert_eq!(merged.counts(), Some(&ClassificationMetrics::new(4, 0, 2)));

        let averaged = AgreementMetrics::average(vec![&counts, &merged]);
        assert!(averaged.counts().is_none());
        assert!(matches!(
            averaged.merged(&counts),
            Err(IaaError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_mean_score() {
        let mut a = MeanScore::default();
        assert_eq!(a.mean(), None);
        a.record(1.0);
        a.record_opt(None);
        a.record(0.5);
        let b = MeanScore { total: 0.0, count: 1 };
        assert_eq!(a.mean(), Some(0.75));
        assert_eq!(a.merged(&b).mean(), Some(0.5));
    }
}
