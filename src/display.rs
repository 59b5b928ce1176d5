//! Plain-text rendering of metrics, confusion matrices and reports.

use std::fmt::{self, Display, Write};

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::annotation::CausationInstance;
use crate::argument::ArgumentRole;
use crate::confusion::{ConfusionMatrix, Label};
use crate::metrics::{AgreementMetrics, AveragedMetrics, ClassificationMetrics, Rates};
use crate::report::{AgreementReport, InstanceRecord, RoleSummary};

const SENTENCE_WIDTH: usize = 60;

/// Shorten `text` to at most `max_width` display columns, ending in `...` when
/// anything was cut. Never splits a grapheme cluster.
pub fn truncated(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    const ELLIPSIS: &str = "...";
    let budget = max_width.saturating_sub(ELLIPSIS.len());
    let mut result = String::new();
    let mut width = 0;
    for grapheme in text.graphemes(true) {
        let grapheme_width = UnicodeWidthStr::width(grapheme);
        if width + grapheme_width > budget {
            break;
        }
        width += grapheme_width;
        result.push_str(grapheme);
    }
    result.push_str(ELLIPSIS);
    result
}

struct Rate(Option<f64>);

impl Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(rate) => write!(f, "{:.3}", rate),
            None => f.write_str("n/a"),
        }
    }
}

fn write_rates<R: Rates>(f: &mut fmt::Formatter<'_>, rates: &R) -> fmt::Result {
    write!(
        f,
        "precision {}, recall {}, F1 {}",
        Rate(rates.precision()),
        Rate(rates.recall()),
        Rate(rates.f1())
    )
}

impl Display for ClassificationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matched, {} predicted only, {} gold only; ",
            self.true_positives, self.false_positives, self.false_negatives
        )?;
        write_rates(f, self)
    }
}

impl Display for AveragedMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_rates(f, self)?;
        write!(f, " (mean of {})", self.instances)
    }
}

impl Display for AgreementMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgreementMetrics::Counts(m) => m.fmt(f),
            AgreementMetrics::Averaged(m) => m.fmt(f),
        }
    }
}

fn pad(f: &mut fmt::Formatter<'_>, count: usize) -> fmt::Result {
    for _ in 0..count {
        f.write_char(' ')?;
    }
    Ok(())
}

fn cell_text<L: Label>(gold: L, predicted: L, count: usize) -> String {
    if gold == predicted {
        format!("[{}]", count)
    } else if count == 0 {
        ".".to_string()
    } else {
        count.to_string()
    }
}

// Gold\Pred   Facilitate  Inhibit
// Facilitate         [2]        1
// Inhibit              .      [1]
impl<L: Label> Display for ConfusionMatrix<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const CORNER: &str = "Gold\\Pred";
        const COLUMN_GAP: usize = 2;
        let labels = self.labels();

        let cells: Vec<Vec<String>> = labels
            .iter()
            .map(|&gold| {
                labels
                    .iter()
                    .map(|&predicted| cell_text(gold, predicted, self.get(gold, predicted)))
                    .collect()
            })
            .collect();

        let first_width = labels
            .iter()
            .map(|label| UnicodeWidthStr::width(label.name()))
            .fold(UnicodeWidthStr::width(CORNER), usize::max);
        let column_widths: Vec<usize> = labels
            .iter()
            .enumerate()
            .map(|(column, label)| {
                cells
                    .iter()
                    .map(|row| UnicodeWidthStr::width(row[column].as_str()))
                    .fold(UnicodeWidthStr::width(label.name()), usize::max)
            })
            .collect();

        f.write_str(CORNER)?;
        pad(f, first_width - UnicodeWidthStr::width(CORNER))?;
        for (label, &width) in labels.iter().zip(&column_widths) {
            pad(f, COLUMN_GAP + width - UnicodeWidthStr::width(label.name()))?;
            f.write_str(label.name())?;
        }

        for (label, row) in labels.iter().zip(&cells) {
            f.write_char('\n')?;
            f.write_str(label.name())?;
            pad(f, first_width - UnicodeWidthStr::width(label.name()))?;
            for (cell, &width) in row.iter().zip(&column_widths) {
                pad(f, COLUMN_GAP + width - UnicodeWidthStr::width(cell.as_str()))?;
                f.write_str(cell)?;
            }
        }
        Ok(())
    }
}

/// Which optional sections a rendered report includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFormat {
    /// Confusion matrix tables.
    pub confusion: bool,
    /// Per-label precision/recall and the most confused label pairs.
    pub stats: bool,
    /// One line per gold-only, predicted-only and differing instance.
    pub differences: bool,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self {
            confusion: true,
            stats: false,
            differences: false,
        }
    }
}

impl ReportFormat {
    /// Metric lines only.
    pub fn summary() -> Self {
        Self {
            confusion: false,
            stats: false,
            differences: false,
        }
    }

    pub fn full() -> Self {
        Self {
            confusion: true,
            stats: true,
            differences: true,
        }
    }
}

pub struct ReportDisplay<'a> {
    report: &'a AgreementReport,
    format: ReportFormat,
}

impl AgreementReport {
    pub fn display(&self, format: ReportFormat) -> ReportDisplay<'_> {
        ReportDisplay { report: self, format }
    }
}

impl Display for AgreementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display(ReportFormat::default()).fmt(f)
    }
}

impl<'a> ReportDisplay<'a> {
    fn write_matrix<L: Label>(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        matrix: &ConfusionMatrix<L>,
    ) -> fmt::Result {
        write!(
            f,
            "\n\n{}: {} pairs, agreement {}, kappa {}",
            title,
            matrix.total(),
            Rate(matrix.accuracy()),
            Rate(matrix.kappa())
        )?;
        if self.format.confusion {
            write!(f, "\n{}", matrix)?;
        }
        if self.format.stats {
            for &label in matrix.labels() {
                write!(
                    f,
                    "\n  {}: precision {}, recall {}",
                    label.name(),
                    Rate(matrix.precision(label)),
                    Rate(matrix.recall(label))
                )?;
            }
            for (gold, predicted, count) in matrix.most_confused(3) {
                write!(f, "\n  confused {} as {}: {}", gold.name(), predicted.name(), count)?;
            }
        }
        Ok(())
    }

    fn write_role(
        &self,
        f: &mut fmt::Formatter<'_>,
        role: ArgumentRole,
        summary: &RoleSummary,
    ) -> fmt::Result {
        write!(
            f,
            "\n  {}: {}; Jaccard {}",
            role.name(),
            summary.metrics,
            Rate(summary.mean_jaccard())
        )
    }

    fn write_differences(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let diagnostics = match self.report.diagnostics() {
            Some(diagnostics) => diagnostics,
            None => return Ok(()),
        };
        f.write_str("\n\nDifferences:")?;
        if diagnostics.is_empty() {
            return f.write_str(" none");
        }
        for record in &diagnostics.gold_only {
            write!(f, "\n  gold only: {}", RecordLine(record))?;
        }
        for record in &diagnostics.predicted_only {
            write!(f, "\n  predicted only: {}", RecordLine(record))?;
        }
        for difference in &diagnostics.property_differences {
            write!(
                f,
                "\n  {}: {} vs {}: {}",
                difference.property.name(),
                difference.gold_value,
                difference.predicted_value,
                RecordLine(&difference.gold)
            )?;
        }
        for difference in &diagnostics.argument_differences {
            write!(
                f,
                "\n  arguments: {} (predicted {})",
                RecordLine(&difference.gold),
                ArgumentsLine(&difference.predicted)
            )?;
        }
        Ok(())
    }
}

impl<'a> Display for ReportDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        match report.connective_metrics() {
            Some(metrics) => write!(f, "Connectives: {}", metrics)?,
            None => f.write_str("Connectives: not applicable for given identifiers")?,
        }
        if let Some(matrix) = report.degree_matrix() {
            self.write_matrix(f, "Degrees", matrix)?;
        }
        if let Some(matrix) = report.causation_type_matrix() {
            self.write_matrix(f, "Causation types", matrix)?;
        }

        write!(f, "\n\nArguments: {}", report.argument_metrics())?;
        write!(f, "\n  null arguments: {}", report.null_arguments())?;
        for role in ArgumentRole::BOTH {
            self.write_role(f, role, report.role(role))?;
        }
        self.write_matrix(f, "Argument labels", report.argument_label_matrix())?;

        if self.format.differences {
            self.write_differences(f)?;
        }
        Ok(())
    }
}

struct RecordLine<'a>(&'a InstanceRecord);

impl<'a> Display for RecordLine<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;
        write!(
            f,
            "{} #{} {} \"{}\" in \"{}\"",
            record.file_name,
            record.sentence_number,
            record.instance.id,
            record.instance.connective.text(),
            truncated(&record.sentence_text, SENTENCE_WIDTH)
        )
    }
}

struct ArgumentsLine<'a>(&'a CausationInstance);

impl<'a> Display for ArgumentsLine<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for role in ArgumentRole::BOTH {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            match role.of(self.0) {
                Some(span) => write!(f, "{} \"{}\"", role.name(), span.text())?,
                None => write!(f, "{} absent", role.name())?,
            }
        }
        Ok(())
    }
}
