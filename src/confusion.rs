//! Confusion matrices over fixed categorical label sets.

use std::marker::PhantomData;
use std::ops::Add;

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// A fixed, finite set of categorical labels.
///
/// `ALL` lists every label in display order and `index` returns the position
/// of a label within `ALL`.
pub trait Label: Copy + Eq + std::fmt::Debug + 'static {
    const ALL: &'static [Self];

    fn index(self) -> usize;

    fn name(self) -> &'static str;
}

/// Counts of `(gold, predicted)` label pairs.
///
/// Rows are gold labels, columns are predicted labels, both in `L::ALL` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix<L: Label> {
    counts: Vec<Vec<usize>>,
    labels: PhantomData<L>,
}

impl<L: Label> Default for ConfusionMatrix<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Label> ConfusionMatrix<L> {
    /// Create an empty matrix.
    pub fn new() -> Self {
        let size = L::ALL.len();
        Self {
            counts: vec![vec![0; size]; size],
            labels: PhantomData,
        }
    }

    /// Build a matrix from parallel label observations.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, L)>,
    {
        let mut matrix = Self::new();
        for (gold, predicted) in pairs {
            matrix.record(gold, predicted);
        }
        matrix
    }

    /// Record one `(gold, predicted)` observation.
    pub fn record(&mut self, gold: L, predicted: L) {
        self.counts[gold.index()][predicted.index()] += 1;
    }

    pub fn get(&self, gold: L, predicted: L) -> usize {
        self.counts[gold.index()][predicted.index()]
    }

    pub fn labels(&self) -> &'static [L] {
        L::ALL
    }

    /// Total number of observations.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Observations whose gold and predicted labels agree.
    pub fn agreements(&self) -> usize {
        (0..self.counts.len()).map(|i| self.counts[i][i]).sum()
    }

    /// True when every observation lies on the diagonal.
    pub fn is_diagonal(&self) -> bool {
        self.agreements() == self.total()
    }

    pub fn gold_total(&self, label: L) -> usize {
        self.counts[label.index()].iter().sum()
    }

    pub fn predicted_total(&self, label: L) -> usize {
        self.counts.iter().map(|row| row[label.index()]).sum()
    }

    /// Fraction of `label` predictions that gold agrees with.
    pub fn precision(&self, label: L) -> Option<f64> {
        ratio(self.get(label, label), self.predicted_total(label))
    }

    /// Fraction of gold `label` observations that were predicted as `label`.
    pub fn recall(&self, label: L) -> Option<f64> {
        ratio(self.get(label, label), self.gold_total(label))
    }

    /// Observed agreement over all observations.
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.agreements(), self.total())
    }

    /// Cohen's kappa: agreement corrected for chance.
    ///
    /// `None` for an empty matrix, and when chance agreement is already 1.0
    /// (every observation uses the same single label on both sides).
    pub fn kappa(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let total = total as f64;
        let observed = self.agreements() as f64 / total;
        let expected: f64 = L::ALL
            .iter()
            .map(|&label| {
                let gold = self.gold_total(label) as f64 / total;
                let predicted = self.predicted_total(label) as f64 / total;
                gold * predicted
            })
            .sum();
        if (1.0 - expected).abs() < f64::EPSILON {
            return None;
        }
        Some((observed - expected) / (1.0 - expected))
    }

    /// Most frequent off-diagonal `(gold, predicted, count)` cells, largest first.
    pub fn most_confused(&self, top_n: usize) -> Vec<(L, L, usize)> {
        let mut confusions = Vec::new();
        for &gold in L::ALL {
            for &predicted in L::ALL {
                let count = self.get(gold, predicted);
                if gold != predicted && count > 0 {
                    confusions.push((gold, predicted, count));
                }
            }
        }
        // stable sort keeps label order among equal counts
        confusions.sort_by(|a, b| b.2.cmp(&a.2));
        confusions.truncate(top_n);
        confusions
    }

    /// Elementwise sum of two matrices.
    pub fn merged(&self, other: &Self) -> Self {
        let counts = self
            .counts
            .iter()
            .zip(&other.counts)
            .map(|(row, other_row)| row.iter().zip(other_row).map(|(a, b)| a + b).collect())
            .collect();
        Self {
            counts,
            labels: PhantomData,
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

impl<L: Label> Add for ConfusionMatrix<L> {
    type Output = ConfusionMatrix<L>;

    fn add(self, other: Self) -> Self::Output {
        self.merged(&other)
    }
}

impl<'a, L: Label> Add<&'a ConfusionMatrix<L>> for &'a ConfusionMatrix<L> {
    type Output = ConfusionMatrix<L>;

    fn add(self, other: &'a ConfusionMatrix<L>) -> Self::Output {
        self.merged(other)
    }
}

impl<L: Label> std::iter::Sum for ConfusionMatrix<L> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::new(), |acc, m| acc.merged(&m))
    }
}

impl<L: Label> Serialize for ConfusionMatrix<L> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let labels: Vec<&'static str> = L::ALL.iter().map(|l| l.name()).collect();
        let mut state = serializer.serialize_struct("ConfusionMatrix", 4)?;
        state.serialize_field("labels", &labels)?;
        state.serialize_field("counts", &self.counts)?;
        state.serialize_field("accuracy", &self.accuracy())?;
        state.serialize_field("kappa", &self.kappa())?;
        state.end()
    }
}
