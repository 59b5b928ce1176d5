//! Agreement reports: construction, merging and aggregation.
//!
//! A report is built from one pair of parallel sentence sequences. Reports are
//! combined in two ways:
//!
//! - [`AgreementReport::merged`] (also `&a + &b`) treats both reports as parts
//!   of one larger comparison. Counts and matrices are summed and diagnostics
//!   are concatenated.
//! - [`AgreementReport::aggregate`] treats each report as an independent
//!   comparison (one per document, say). Classification metrics are averaged
//!   per report, matrices are summed and diagnostics are dropped.
//!
//! Neither operation modifies its operands.

use std::collections::HashMap;
use std::ops::Add;

use serde::Serialize;
use serde_json::Value;

use crate::annotation::{CausationInstance, CausationType, Degree, Sentence};
use crate::argument::{ArgumentAgreement, ArgumentMatcher, ArgumentRole, RoleAgreement};
use crate::config::IaaConfig;
use crate::confusion::{ConfusionMatrix, Label};
use crate::connective::{ConnectiveAlignment, ConnectiveMatcher, LocatedInstance, MatchedPair};
use crate::errors::{IaaError, IaaResult};
use crate::metrics::{AgreementMetrics, MeanScore};
use crate::property::{compare_property, PropertyAgreement, CAUSATION_TYPE, DEGREE};

/// The settings two reports must share to be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComparisonSettings {
    pub allow_partial_overlap: bool,
    pub compare_degrees: bool,
    pub compare_types: bool,
}

impl From<&IaaConfig> for ComparisonSettings {
    fn from(config: &IaaConfig) -> Self {
        Self {
            allow_partial_overlap: config.allow_partial_overlap,
            compare_degrees: config.compare_degrees,
            compare_types: config.compare_types,
        }
    }
}

/// An instance copied out of its sentence for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceRecord {
    /// Source file name without its directory.
    pub file_name: String,
    /// 1-based position among the sentences of the same file.
    pub sentence_number: usize,
    pub sentence_text: String,
    pub instance: CausationInstance,
}

/// Which property a [`PropertyDifference`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyKind {
    Degree,
    CausationType,
    /// A gold argument matched a predicted argument of the other role.
    ArgumentLabel,
}

impl PropertyKind {
    pub fn name(self) -> &'static str {
        match self {
            PropertyKind::Degree => "Degree",
            PropertyKind::CausationType => "Causation type",
            PropertyKind::ArgumentLabel => "Argument label",
        }
    }
}

/// A matched pair that disagrees on a categorical property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDifference {
    pub property: PropertyKind,
    pub gold_value: &'static str,
    pub predicted_value: &'static str,
    pub gold: InstanceRecord,
    pub predicted: CausationInstance,
}

/// A matched pair whose two predicted arguments were not both matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentDifference {
    pub gold: InstanceRecord,
    pub predicted: CausationInstance,
}

/// Per-instance disagreements, kept only when requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub gold_only: Vec<InstanceRecord>,
    pub predicted_only: Vec<InstanceRecord>,
    pub property_differences: Vec<PropertyDifference>,
    pub argument_differences: Vec<ArgumentDifference>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.gold_only.is_empty()
            && self.predicted_only.is_empty()
            && self.property_differences.is_empty()
            && self.argument_differences.is_empty()
    }

    pub fn property_differences_of(
        &self,
        kind: PropertyKind,
    ) -> impl Iterator<Item = &PropertyDifference> {
        self.property_differences.iter().filter(move |d| d.property == kind)
    }

    fn merged(&self, other: &Self) -> Self {
        let concat =
            |a: &[InstanceRecord], b: &[InstanceRecord]| a.iter().chain(b).cloned().collect();
        Self {
            gold_only: concat(&self.gold_only, &other.gold_only),
            predicted_only: concat(&self.predicted_only, &other.predicted_only),
            property_differences: self
                .property_differences
                .iter()
                .chain(&other.property_differences)
                .cloned()
                .collect(),
            argument_differences: self
                .argument_differences
                .iter()
                .chain(&other.argument_differences)
                .cloned()
                .collect(),
        }
    }
}

/// Agreement on one argument role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoleSummary {
    pub metrics: AgreementMetrics,
    pub jaccard: MeanScore,
}

impl RoleSummary {
    /// Mean token Jaccard index, if any pair was scored.
    pub fn mean_jaccard(&self) -> Option<f64> {
        self.jaccard.mean()
    }

    fn merged(&self, other: &Self) -> IaaResult<Self> {
        Ok(Self {
            metrics: self.metrics.merged(&other.metrics)?,
            jaccard: self.jaccard.merged(&other.jaccard),
        })
    }
}

impl From<RoleAgreement> for RoleSummary {
    fn from(agreement: RoleAgreement) -> Self {
        Self {
            metrics: agreement.metrics.into(),
            jaccard: agreement.jaccard,
        }
    }
}

/// Inter-annotator agreement between two annotation sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementReport {
    settings: ComparisonSettings,
    /// How many single comparisons this report combines.
    comparisons: usize,
    connective_metrics: Option<AgreementMetrics>,
    degree_matrix: Option<ConfusionMatrix<Degree>>,
    causation_type_matrix: Option<ConfusionMatrix<CausationType>>,
    argument_metrics: AgreementMetrics,
    argument_label_matrix: ConfusionMatrix<ArgumentRole>,
    null_arguments: usize,
    cause: RoleSummary,
    effect: RoleSummary,
    diagnostics: Option<Diagnostics>,
}

impl AgreementReport {
    /// Compare two parallel sentence sequences.
    ///
    /// Fails if the configuration is invalid, the sequences differ in length,
    /// any sentence pair differs in text, or (in given-only mode) not every
    /// given connective was matched.
    pub fn new(gold: &[Sentence], predicted: &[Sentence], config: &IaaConfig) -> IaaResult<Self> {
        config.validate()?;
        let strategy = config.match_strategy();
        log::debug!(
            "comparing {} sentence pairs with {} matching",
            gold.len(),
            strategy.matcher().name()
        );
        let connectives = ConnectiveMatcher::new(strategy, &config.identifiers);
        let alignment = connectives.match_sentences(gold, predicted)?;
        let connective_metrics = connectives.classification(&alignment)?;

        let degrees = config
            .compare_degrees
            .then(|| compare_property(&DEGREE, &alignment.pairs));
        let types = config
            .compare_types
            .then(|| compare_property(&CAUSATION_TYPE, &alignment.pairs));
        let arguments = ArgumentMatcher::new(strategy.matcher()).compare(&alignment.pairs);

        let diagnostics = if config.save_differences {
            Some(collect_diagnostics(
                gold,
                predicted,
                &alignment,
                degrees.as_ref(),
                types.as_ref(),
                &arguments,
            ))
        } else {
            None
        };

        Ok(Self {
            settings: ComparisonSettings::from(config),
            comparisons: 1,
            connective_metrics: connective_metrics.map(AgreementMetrics::from),
            degree_matrix: degrees.map(|d| d.matrix),
            causation_type_matrix: types.map(|t| t.matrix),
            argument_metrics: arguments.metrics.into(),
            argument_label_matrix: arguments.label_matrix,
            null_arguments: arguments.null_arguments,
            cause: arguments.cause.into(),
            effect: arguments.effect.into(),
            diagnostics,
        })
    }

    pub fn settings(&self) -> ComparisonSettings {
        self.settings
    }

    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    /// Connective agreement; `None` when the identifier filter guarantees a
    /// perfect match and the numbers would carry no information.
    pub fn connective_metrics(&self) -> Option<&AgreementMetrics> {
        self.connective_metrics.as_ref()
    }

    pub fn degree_matrix(&self) -> Option<&ConfusionMatrix<Degree>> {
        self.degree_matrix.as_ref()
    }

    pub fn causation_type_matrix(&self) -> Option<&ConfusionMatrix<CausationType>> {
        self.causation_type_matrix.as_ref()
    }

    /// Argument agreement across both roles.
    pub fn argument_metrics(&self) -> &AgreementMetrics {
        &self.argument_metrics
    }

    /// Which gold role each matched argument was paired with.
    pub fn argument_label_matrix(&self) -> &ConfusionMatrix<ArgumentRole> {
        &self.argument_label_matrix
    }

    /// Absent arguments across all matched pairs, on both sides.
    pub fn null_arguments(&self) -> usize {
        self.null_arguments
    }

    pub fn role(&self, role: ArgumentRole) -> &RoleSummary {
        match role {
            ArgumentRole::Cause => &self.cause,
            ArgumentRole::Effect => &self.effect,
        }
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }

    fn check_settings(&self, other: &Self) -> IaaResult<()> {
        if self.settings != other.settings {
            return Err(IaaError::configuration_mismatch(format!(
                "cannot combine reports with different comparison criteria ({:?} vs {:?})",
                self.settings, other.settings
            )));
        }
        Ok(())
    }

    /// Combine two parts of one comparison into a new report.
    pub fn merged(&self, other: &Self) -> IaaResult<Self> {
        self.check_settings(other)?;

        let connective_metrics = match (&self.connective_metrics, &other.connective_metrics) {
            (None, None) => None,
            (Some(a), Some(b)) => Some(a.merged(b)?),
            _ => {
                return Err(IaaError::configuration_mismatch(
                    "connective metrics are applicable in only one of the reports",
                ))
            }
        };
        let diagnostics = match (&self.diagnostics, &other.diagnostics) {
            (None, None) => None,
            (Some(d), None) | (None, Some(d)) => Some(d.clone()),
            (Some(a), Some(b)) => Some(a.merged(b)),
        };

        log::debug!(
            "merging reports of {} and {} comparisons",
            self.comparisons,
            other.comparisons
        );
        Ok(Self {
            settings: self.settings,
            comparisons: self.comparisons + other.comparisons,
            connective_metrics,
            degree_matrix: merge_matrices(&self.degree_matrix, &other.degree_matrix),
            causation_type_matrix: merge_matrices(
                &self.causation_type_matrix,
                &other.causation_type_matrix,
            ),
            argument_metrics: self.argument_metrics.merged(&other.argument_metrics)?,
            argument_label_matrix: &self.argument_label_matrix + &other.argument_label_matrix,
            null_arguments: self.null_arguments + other.null_arguments,
            cause: self.cause.merged(&other.cause)?,
            effect: self.effect.merged(&other.effect)?,
            diagnostics,
        })
    }

    /// Combine independent comparisons.
    ///
    /// Connective, argument and per-role metrics are averaged per report
    /// (reports without applicable connective metrics are skipped); confusion
    /// matrices are summed; Jaccard scores are pooled; diagnostics are dropped.
    pub fn aggregate(reports: &[AgreementReport]) -> IaaResult<Self> {
        let first = reports
            .first()
            .ok_or_else(|| IaaError::invalid_input("cannot aggregate an empty list of reports"))?;
        for report in &reports[1..] {
            first.check_settings(report)?;
        }

        let connective: Vec<&AgreementMetrics> = reports
            .iter()
            .filter_map(|r| r.connective_metrics.as_ref())
            .collect();
        let connective_metrics = if connective.is_empty() {
            None
        } else {
            Some(AgreementMetrics::average(connective))
        };

        let summarize = |role: ArgumentRole| RoleSummary {
            metrics: AgreementMetrics::average(reports.iter().map(|r| &r.role(role).metrics)),
            jaccard: reports
                .iter()
                .fold(MeanScore::default(), |acc, r| acc.merged(&r.role(role).jaccard)),
        };

        log::debug!("aggregating {} reports", reports.len());
        Ok(Self {
            settings: first.settings,
            comparisons: reports.iter().map(|r| r.comparisons).sum(),
            connective_metrics,
            degree_matrix: sum_matrices(reports.iter().map(|r| r.degree_matrix.as_ref())),
            causation_type_matrix: sum_matrices(
                reports.iter().map(|r| r.causation_type_matrix.as_ref()),
            ),
            argument_metrics: AgreementMetrics::average(
                reports.iter().map(|r| &r.argument_metrics),
            ),
            argument_label_matrix: reports
                .iter()
                .fold(ConfusionMatrix::new(), |acc, r| acc.merged(&r.argument_label_matrix)),
            null_arguments: reports.iter().map(|r| r.null_arguments).sum(),
            cause: summarize(ArgumentRole::Cause),
            effect: summarize(ArgumentRole::Effect),
            diagnostics: None,
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<'a> Add<&'a AgreementReport> for &'a AgreementReport {
    type Output = IaaResult<AgreementReport>;

    fn add(self, other: &'a AgreementReport) -> Self::Output {
        self.merged(other)
    }
}

/// Settings are checked before merging, so both sides are present or absent.
fn merge_matrices<L: Label>(
    a: &Option<ConfusionMatrix<L>>,
    b: &Option<ConfusionMatrix<L>>,
) -> Option<ConfusionMatrix<L>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        _ => None,
    }
}

/// Sum every matrix, or `None` if any report lacks one.
fn sum_matrices<'a, L, I>(matrices: I) -> Option<ConfusionMatrix<L>>
where
    L: Label,
    I: Iterator<Item = Option<&'a ConfusionMatrix<L>>>,
{
    matrices
        .collect::<Option<Vec<_>>>()
        .map(|all| all.into_iter().fold(ConfusionMatrix::new(), |acc, m| acc.merged(m)))
}

/// 1-based position of each sentence among the sentences of its file.
fn sentence_numbers(sentences: &[Sentence]) -> Vec<usize> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    sentences
        .iter()
        .map(|sentence| {
            let count = seen.entry(sentence.file_name()).or_insert(0);
            *count += 1;
            *count
        })
        .collect()
}

fn record(
    numbers: &[usize],
    sentence_index: usize,
    sentence: &Sentence,
    instance: &CausationInstance,
) -> InstanceRecord {
    InstanceRecord {
        file_name: sentence.file_name(),
        sentence_number: numbers[sentence_index],
        sentence_text: sentence.original_text.clone(),
        instance: instance.clone(),
    }
}

fn located_record(numbers: &[usize], located: &LocatedInstance<'_>) -> InstanceRecord {
    record(numbers, located.sentence_index, located.sentence, located.instance)
}

fn gold_record(numbers: &[usize], pair: &MatchedPair<'_>) -> InstanceRecord {
    record(numbers, pair.sentence_index, pair.sentence, pair.gold)
}

fn collect_diagnostics(
    gold: &[Sentence],
    predicted: &[Sentence],
    alignment: &ConnectiveAlignment<'_>,
    degrees: Option<&PropertyAgreement<Degree>>,
    types: Option<&PropertyAgreement<CausationType>>,
    arguments: &ArgumentAgreement,
) -> Diagnostics {
    let gold_numbers = sentence_numbers(gold);
    let predicted_numbers = sentence_numbers(predicted);

    let mut diagnostics = Diagnostics {
        gold_only: alignment.gold_only.iter().map(|l| located_record(&gold_numbers, l)).collect(),
        predicted_only: alignment
            .predicted_only
            .iter()
            .map(|l| located_record(&predicted_numbers, l))
            .collect(),
        ..Diagnostics::default()
    };

    let mut difference = |property: PropertyKind,
                          pair_index: usize,
                          gold_value: &'static str,
                          predicted_value: &'static str| {
        let pair = &alignment.pairs[pair_index];
        diagnostics.property_differences.push(PropertyDifference {
            property,
            gold_value,
            predicted_value,
            gold: gold_record(&gold_numbers, pair),
            predicted: pair.predicted.clone(),
        });
    };
    if let Some(degrees) = degrees {
        for d in &degrees.differences {
            difference(PropertyKind::Degree, d.pair_index, d.gold.name(), d.predicted.name());
        }
    }
    if let Some(types) = types {
        for d in &types.differences {
            difference(
                PropertyKind::CausationType,
                d.pair_index,
                d.gold.name(),
                d.predicted.name(),
            );
        }
    }
    for (pair_index, pair_arguments) in arguments.per_pair.iter().enumerate() {
        for &(gold_role, predicted_role) in &pair_arguments.matches {
            if gold_role != predicted_role {
                difference(
                    PropertyKind::ArgumentLabel,
                    pair_index,
                    gold_role.name(),
                    predicted_role.name(),
                );
            }
        }
    }

    for (pair, pair_arguments) in alignment.pairs.iter().zip(&arguments.per_pair) {
        if !pair_arguments.predicted_fully_matched() {
            diagnostics.argument_differences.push(ArgumentDifference {
                gold: gold_record(&gold_numbers, pair),
                predicted: pair.predicted.clone(),
            });
        }
    }
    diagnostics
}
