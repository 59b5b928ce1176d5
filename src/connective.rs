//! Two-phase connective alignment between parallel sentences.
//!
//! With partial matching enabled, exact matches are found first and removed
//! from both sides, so a partial overlap can never take the place of an exact
//! match. The remaining instances are then aligned with the configured
//! matcher.

use std::collections::BTreeSet;

use crate::annotation::{CausationInstance, Sentence};
use crate::config::{IdentifierFilter, IdentifierInclusion};
use crate::errors::{IaaError, IaaResult};
use crate::metrics::ClassificationMetrics;
use crate::overlap::{ExactMatcher, MatchStrategy, SpanMatcher};
use crate::sequence_diff::SequenceDiff;

/// An instance together with where it came from.
#[derive(Debug, Clone, Copy)]
pub struct LocatedInstance<'s> {
    /// Position of the sentence in the compared sequence.
    pub sentence_index: usize,
    pub sentence: &'s Sentence,
    pub instance: &'s CausationInstance,
}

/// A gold instance aligned with a predicted one.
#[derive(Debug, Clone, Copy)]
pub struct MatchedPair<'s> {
    pub sentence_index: usize,
    /// The gold sentence; its text equals the predicted sentence's text.
    pub sentence: &'s Sentence,
    pub gold: &'s CausationInstance,
    pub predicted: &'s CausationInstance,
}

impl<'s> MatchedPair<'s> {
    /// True when the connectives have identical offsets.
    pub fn is_exact(&self) -> bool {
        ExactMatcher.matches(&self.gold.connective, &self.predicted.connective)
    }
}

/// Outcome of aligning connectives across a sentence sequence.
#[derive(Debug, Clone, Default)]
pub struct ConnectiveAlignment<'s> {
    pub pairs: Vec<MatchedPair<'s>>,
    pub gold_only: Vec<LocatedInstance<'s>>,
    pub predicted_only: Vec<LocatedInstance<'s>>,
}

impl<'s> ConnectiveAlignment<'s> {
    fn extend(&mut self, other: ConnectiveAlignment<'s>) {
        self.pairs.extend(other.pairs);
        self.gold_only.extend(other.gold_only);
        self.predicted_only.extend(other.predicted_only);
    }
}

/// Aligns causal instances by their connective spans.
#[derive(Debug, Clone, Copy)]
pub struct ConnectiveMatcher<'c> {
    strategy: MatchStrategy,
    filter: &'c IdentifierFilter,
}

impl<'c> ConnectiveMatcher<'c> {
    pub fn new(strategy: MatchStrategy, filter: &'c IdentifierFilter) -> Self {
        Self { strategy, filter }
    }

    /// Align every sentence pair of two parallel sequences.
    ///
    /// Fails if the sequences differ in length or any sentence pair differs in
    /// text.
    pub fn match_sentences<'s>(
        &self,
        gold: &'s [Sentence],
        predicted: &'s [Sentence],
    ) -> IaaResult<ConnectiveAlignment<'s>> {
        check_parallel(gold, predicted)?;

        let mut alignment = ConnectiveAlignment::default();
        for (idx, (gold_sentence, predicted_sentence)) in gold.iter().zip(predicted).enumerate() {
            alignment.extend(self.match_sentence(idx, gold_sentence, predicted_sentence));
        }
        Ok(alignment)
    }

    /// Align the instances of one sentence pair.
    pub fn match_sentence<'s>(
        &self,
        sentence_index: usize,
        gold: &'s Sentence,
        predicted: &'s Sentence,
    ) -> ConnectiveAlignment<'s> {
        let mut gold_instances = self.comparable(gold);
        let mut predicted_instances = self.comparable(predicted);
        let mut alignment = ConnectiveAlignment::default();

        let pair = |g: &'s CausationInstance, p: &'s CausationInstance| MatchedPair {
            sentence_index,
            sentence: gold,
            gold: g,
            predicted: p,
        };

        if self.strategy.is_partial() {
            let exact = align(&gold_instances, &predicted_instances, &ExactMatcher);
            alignment.pairs.extend(
                exact
                    .pairs()
                    .iter()
                    .map(|&(g, p)| pair(gold_instances[g], predicted_instances[p])),
            );
            let matched_gold: BTreeSet<usize> = exact.pairs().iter().map(|&(g, _)| g).collect();
            let matched_predicted: BTreeSet<usize> =
                exact.pairs().iter().map(|&(_, p)| p).collect();
            gold_instances = remove_indices(gold_instances, &matched_gold);
            predicted_instances = remove_indices(predicted_instances, &matched_predicted);
        }

        let diff = align(&gold_instances, &predicted_instances, self.strategy.matcher());
        alignment.pairs.extend(
            diff.pairs()
                .iter()
                .map(|&(g, p)| pair(gold_instances[g], predicted_instances[p])),
        );
        alignment.gold_only.extend(diff.a_only().iter().map(|&g| LocatedInstance {
            sentence_index,
            sentence: gold,
            instance: gold_instances[g],
        }));
        alignment.predicted_only.extend(diff.b_only().iter().map(|&p| LocatedInstance {
            sentence_index,
            sentence: predicted,
            instance: predicted_instances[p],
        }));

        let exact_count = alignment.pairs.iter().filter(|p| p.is_exact()).count();
        log::debug!(
            "sentence {}: {} exact, {} partial, {} gold-only, {} predicted-only connectives",
            sentence_index,
            exact_count,
            alignment.pairs.len() - exact_count,
            alignment.gold_only.len(),
            alignment.predicted_only.len()
        );
        alignment
    }

    /// Connective-level counts, or `None` when the identifier filter makes
    /// them meaningless.
    ///
    /// In given-only mode every given connective must have been matched;
    /// anything else means the annotation sets disagree on identifiers.
    pub fn classification(
        &self,
        alignment: &ConnectiveAlignment<'_>,
    ) -> IaaResult<Option<ClassificationMetrics>> {
        if self.filter.mode == IdentifierInclusion::GivenOnly
            && alignment.pairs.len() != self.filter.given_ids.len()
        {
            return Err(IaaError::invalid_input(format!(
                "matched {} given connectives but {} were given; were spans re-annotated with different ids?",
                alignment.pairs.len(),
                self.filter.given_ids.len()
            )));
        }
        if !self.filter.connective_metrics_applicable() {
            return Ok(None);
        }
        Ok(Some(ClassificationMetrics::new(
            alignment.pairs.len(),
            alignment.predicted_only.len(),
            alignment.gold_only.len(),
        )))
    }

    fn comparable<'s>(&self, sentence: &'s Sentence) -> Vec<&'s CausationInstance> {
        sentence
            .causation_instances
            .iter()
            .filter(|instance| self.filter.includes(&instance.id))
            .collect()
    }
}

/// Both sequences must have the same length and identical text pairwise.
pub fn check_parallel(gold: &[Sentence], predicted: &[Sentence]) -> IaaResult<()> {
    if gold.len() != predicted.len() {
        return Err(IaaError::invalid_input(format!(
            "cannot compare {} gold sentences with {} predicted sentences",
            gold.len(),
            predicted.len()
        )));
    }
    if let Some(idx) = gold
        .iter()
        .zip(predicted)
        .position(|(g, p)| !g.same_text(p))
    {
        return Err(IaaError::invalid_input(format!(
            "sentence {} differs in text between the annotation sets",
            idx + 1
        )));
    }
    Ok(())
}

fn align(
    gold: &[&CausationInstance],
    predicted: &[&CausationInstance],
    matcher: &dyn SpanMatcher,
) -> SequenceDiff {
    SequenceDiff::new(
        gold,
        predicted,
        |g, p| matcher.matches(&g.connective, &p.connective),
        |instance| instance.connective.start_offset(),
    )
}

fn remove_indices<T>(items: Vec<T>, removed: &BTreeSet<usize>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !removed.contains(idx))
        .map(|(_, item)| item)
        .collect()
}
