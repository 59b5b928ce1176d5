//! Agreement on categorical properties (degree, causation type) of matched
//! instances.

use crate::annotation::{CausationInstance, CausationType, Degree};
use crate::confusion::{ConfusionMatrix, Label};
use crate::connective::MatchedPair;
use crate::display::truncated;

/// Names a categorical property and how to read it from an instance.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDescriptor<L: Label> {
    pub name: &'static str,
    pub accessor: fn(&CausationInstance) -> Option<L>,
}

fn degree_of(instance: &CausationInstance) -> Option<Degree> {
    instance.degree
}

fn causation_type_of(instance: &CausationInstance) -> Option<CausationType> {
    instance.causation_type
}

pub const DEGREE: PropertyDescriptor<Degree> = PropertyDescriptor {
    name: "Degree",
    accessor: degree_of,
};

pub const CAUSATION_TYPE: PropertyDescriptor<CausationType> = PropertyDescriptor {
    name: "Causation type",
    accessor: causation_type_of,
};

/// A matched pair whose property values differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueDifference<L> {
    /// Index into the compared pairs.
    pub pair_index: usize,
    pub gold: L,
    pub predicted: L,
}

/// Property agreement over a set of matched pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAgreement<L: Label> {
    pub matrix: ConfusionMatrix<L>,
    /// Pairs left out because a value was unset on either side.
    pub skipped: usize,
    pub differences: Vec<ValueDifference<L>>,
}

/// Compare one property across every matched pair.
///
/// A pair with an unset value on either side is skipped and logged; it does
/// not count toward the matrix.
pub fn compare_property<L: Label>(
    descriptor: &PropertyDescriptor<L>,
    pairs: &[MatchedPair<'_>],
) -> PropertyAgreement<L> {
    let mut matrix = ConfusionMatrix::new();
    let mut skipped = 0;
    let mut differences = Vec::new();

    for (pair_index, pair) in pairs.iter().enumerate() {
        let gold = (descriptor.accessor)(pair.gold);
        let predicted = (descriptor.accessor)(pair.predicted);
        match (gold, predicted) {
            (Some(gold), Some(predicted)) => {
                matrix.record(gold, predicted);
                if gold != predicted {
                    differences.push(ValueDifference {
                        pair_index,
                        gold,
                        predicted,
                    });
                }
            }
            _ => {
                skipped += 1;
                let annotation = if gold.is_none() { 1 } else { 2 };
                log::warn!(
                    "{} property not set in annotation {}; not including in analysis (sentence: \"{}\")",
                    descriptor.name,
                    annotation,
                    truncated(&pair.sentence.original_text, 60)
                );
            }
        }
    }

    PropertyAgreement {
        matrix,
        skipped,
        differences,
    }
}
