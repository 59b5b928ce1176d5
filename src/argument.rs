//! Cause/effect argument agreement within matched connective pairs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::annotation::{CausationInstance, Span};
use crate::confusion::{ConfusionMatrix, Label};
use crate::connective::MatchedPair;
use crate::metrics::{ClassificationMetrics, MeanScore};
use crate::overlap::SpanMatcher;

/// The two argument roles of a causal relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArgumentRole {
    Cause,
    Effect,
}

impl ArgumentRole {
    pub const BOTH: [ArgumentRole; 2] = [ArgumentRole::Cause, ArgumentRole::Effect];

    /// The span filling this role, if the annotator marked one.
    pub fn of(self, instance: &CausationInstance) -> Option<&Span> {
        match self {
            ArgumentRole::Cause => instance.cause.as_ref(),
            ArgumentRole::Effect => instance.effect.as_ref(),
        }
    }
}

impl Label for ArgumentRole {
    const ALL: &'static [Self] = &ArgumentRole::BOTH;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            ArgumentRole::Cause => "Cause",
            ArgumentRole::Effect => "Effect",
        }
    }
}

/// How the arguments of one matched connective pair lined up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairArguments {
    /// `(gold_role, predicted_role)` for every matched argument.
    pub matches: Vec<(ArgumentRole, ArgumentRole)>,
    pub absent_gold: usize,
    pub absent_predicted: usize,
    /// Present arguments, on either side, that found no partner.
    pub unmatched_present: usize,
}

impl PairArguments {
    /// A gold argument matched a predicted argument of the other role.
    pub fn has_role_swap(&self) -> bool {
        self.matches.iter().any(|(gold, predicted)| gold != predicted)
    }

    /// Both predicted roles found a gold partner. An absent role is unmatched.
    pub fn predicted_fully_matched(&self) -> bool {
        ArgumentRole::BOTH
            .iter()
            .all(|role| self.matches.iter().any(|(_, predicted)| predicted == role))
    }
}

/// Agreement on a single role across matched pairs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RoleAgreement {
    /// TP: both present and matching. FP: predicted present but not matching.
    /// FN: gold present but not matching.
    pub metrics: ClassificationMetrics,
    /// Token Jaccard index between gold and predicted spans of this role.
    pub jaccard: MeanScore,
}

impl RoleAgreement {
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            metrics: self.metrics.merged(&other.metrics),
            jaccard: self.jaccard.merged(&other.jaccard),
        }
    }
}

/// Argument agreement over a set of matched connective pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentAgreement {
    /// (role matches, predicted-only arguments, gold-only arguments)
    pub metrics: ClassificationMetrics,
    pub label_matrix: ConfusionMatrix<ArgumentRole>,
    /// Absent arguments, excluded from every denominator.
    pub null_arguments: usize,
    pub cause: RoleAgreement,
    pub effect: RoleAgreement,
    /// Per input pair, in order.
    pub per_pair: Vec<PairArguments>,
}

/// Matches argument spans with the same matcher used for connectives.
pub struct ArgumentMatcher<'m> {
    matcher: &'m dyn SpanMatcher,
}

impl<'m> ArgumentMatcher<'m> {
    pub fn new(matcher: &'m dyn SpanMatcher) -> Self {
        Self { matcher }
    }

    /// Pair up the arguments of one gold and one predicted instance.
    ///
    /// Gold roles are tried in order (cause, then effect). Each takes the first
    /// present, not yet matched predicted role that the span matcher accepts,
    /// trying predicted cause before predicted effect.
    pub fn match_pair(
        &self,
        gold: &CausationInstance,
        predicted: &CausationInstance,
    ) -> PairArguments {
        let mut result = PairArguments::default();
        let mut predicted_matched = [false; 2];
        let mut gold_matched = [false; 2];

        for gold_role in ArgumentRole::BOTH {
            let gold_span = match gold_role.of(gold) {
                Some(span) => span,
                None => continue,
            };
            for predicted_role in ArgumentRole::BOTH {
                if predicted_matched[predicted_role.index()] {
                    continue;
                }
                let predicted_span = match predicted_role.of(predicted) {
                    Some(span) => span,
                    None => continue,
                };
                if self.matcher.matches(gold_span, predicted_span) {
                    result.matches.push((gold_role, predicted_role));
                    predicted_matched[predicted_role.index()] = true;
                    gold_matched[gold_role.index()] = true;
                    break;
                }
            }
        }

        for role in ArgumentRole::BOTH {
            match role.of(gold) {
                None => result.absent_gold += 1,
                Some(_) if !gold_matched[role.index()] => result.unmatched_present += 1,
                Some(_) => {}
            }
            match role.of(predicted) {
                None => result.absent_predicted += 1,
                Some(_) if !predicted_matched[role.index()] => result.unmatched_present += 1,
                Some(_) => {}
            }
        }
        result
    }

    /// Score the arguments of every matched connective pair.
    pub fn compare(&self, pairs: &[MatchedPair<'_>]) -> ArgumentAgreement {
        // Every argument starts out unmatched; matches and absences are
        // subtracted as they are found.
        let mut gold_only = 2 * pairs.len();
        let mut predicted_only = 2 * pairs.len();
        let mut null_arguments = 0;
        let mut label_matrix = ConfusionMatrix::new();
        let mut cause = RoleAgreement::default();
        let mut effect = RoleAgreement::default();
        let mut per_pair = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let arguments = self.match_pair(pair.gold, pair.predicted);
            gold_only -= arguments.absent_gold + arguments.matches.len();
            predicted_only -= arguments.absent_predicted + arguments.matches.len();
            null_arguments += arguments.absent_gold + arguments.absent_predicted;
            for &(gold_role, predicted_role) in &arguments.matches {
                label_matrix.record(gold_role, predicted_role);
            }

            self.score_role(ArgumentRole::Cause, pair, &mut cause);
            self.score_role(ArgumentRole::Effect, pair, &mut effect);
            per_pair.push(arguments);
        }

        let total_matches = label_matrix.total();
        ArgumentAgreement {
            metrics: ClassificationMetrics::new(total_matches, predicted_only, gold_only),
            label_matrix,
            null_arguments,
            cause,
            effect,
            per_pair,
        }
    }

    fn score_role(
        &self,
        role: ArgumentRole,
        pair: &MatchedPair<'_>,
        agreement: &mut RoleAgreement,
    ) {
        let gold = role.of(pair.gold);
        let predicted = role.of(pair.predicted);
        match (gold, predicted) {
            (None, None) => return,
            (Some(g), Some(p)) if self.matcher.matches(g, p) => {
                agreement.metrics.true_positives += 1;
            }
            _ => {
                if predicted.is_some() {
                    agreement.metrics.false_positives += 1;
                }
                if gold.is_some() {
                    agreement.metrics.false_negatives += 1;
                }
            }
        }
        agreement.jaccard.record(token_jaccard(gold, predicted));
    }
}

/// Jaccard index of the token offsets covered by two optional spans.
///
/// An absent span covers nothing; two absent spans are identical.
pub fn token_jaccard(a: Option<&Span>, b: Option<&Span>) -> f64 {
    let a: BTreeSet<(usize, usize)> = a.map(|s| s.offsets().collect()).unwrap_or_default();
    let b: BTreeSet<(usize, usize)> = b.map(|s| s.offsets().collect()).unwrap_or_default();
    let union = a.union(&b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Sentence, Token};
    use crate::overlap::{ExactMatcher, PartialOverlapMatcher};

    fn sentence() -> Sentence {
        // "Rain fell so the game was cancelled today"
        let words = ["Rain", "fell", "so", "the", "game", "was", "cancelled", "today"];
        let mut offset = 0;
        let tokens = words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let token = Token::new(i + 1, offset, offset + w.len(), *w);
                offset += w.len() + 1;
                token
            })
            .collect();
        Sentence::new(words.join(" "), "args.ann", tokens)
    }

    // an empty index list leaves the argument absent
    fn instance(s: &Sentence, cause: &[usize], effect: &[usize]) -> CausationInstance {
        let mut instance = CausationInstance::new("T1", s.span(&[3]).unwrap());
        if !cause.is_empty() {
            instance.cause = Some(s.span(cause).unwrap());
        }
        if !effect.is_empty() {
            instance.effect = Some(s.span(effect).unwrap());
        }
        instance
    }

    fn pair<'s>(
        s: &'s Sentence,
        gold: &'s CausationInstance,
        predicted: &'s CausationInstance,
    ) -> MatchedPair<'s> {
        MatchedPair {
            sentence_index: 0,
            sentence: s,
            gold,
            predicted,
        }
    }

    #[test]
    fn test_identical_arguments() {
        let s = sentence();
        let gold = instance(&s, &[1, 2], &[4, 5, 6, 7]);
        let agreement = ArgumentMatcher::new(&ExactMatcher).compare(&[pair(&s, &gold, &gold)]);
        assert_eq!(agreement.metrics, ClassificationMetrics::new(2, 0, 0));
        assert!(agreement.label_matrix.is_diagonal());
        assert_eq!(agreement.null_arguments, 0);
        assert_eq!(agreement.cause.metrics, ClassificationMetrics::new(1, 0, 0));
        assert_eq!(agreement.effect.jaccard.mean(), Some(1.0));
    }

    #[test]
    fn test_absent_arguments_are_not_errors() {
        let s = sentence();
        let gold = instance(&s, &[], &[4, 5]);
        let predicted = instance(&s, &[], &[4, 5]);
        let agreement = ArgumentMatcher::new(&ExactMatcher).compare(&[pair(&s, &gold, &predicted)]);
        assert_eq!(agreement.metrics, ClassificationMetrics::new(1, 0, 0));
        assert_eq!(agreement.null_arguments, 2);
        // both causes absent: nothing scored for that role
        assert_eq!(agreement.cause.metrics.total(), 0);
        assert_eq!(agreement.cause.jaccard.mean(), None);
        assert!(!agreement.per_pair[0].predicted_fully_matched());
    }

    #[test]
    fn test_one_sided_absence_counts_present_side() {
        let s = sentence();
        let gold = instance(&s, &[1], &[4, 5]);
        let predicted = instance(&s, &[], &[4, 5]);
        let agreement = ArgumentMatcher::new(&ExactMatcher).compare(&[pair(&s, &gold, &predicted)]);
        assert_eq!(agreement.metrics, ClassificationMetrics::new(1, 0, 1));
        assert_eq!(agreement.null_arguments, 1);
        assert_eq!(agreement.cause.metrics, ClassificationMetrics::new(0, 0, 1));
        assert_eq!(agreement.cause.jaccard.mean(), Some(0.0));
        assert_eq!(agreement.per_pair[0].unmatched_present, 1);
    }

    #[test]
    fn test_swapped_roles_match_across() {
        let s = sentence();
        let gold = instance(&s, &[1, 2], &[4, 5]);
        let predicted = gold.with_swapped_arguments();
        let agreement = ArgumentMatcher::new(&ExactMatcher).compare(&[pair(&s, &gold, &predicted)]);
        assert_eq!(agreement.metrics, ClassificationMetrics::new(2, 0, 0));
        assert_eq!(agreement.label_matrix.get(ArgumentRole::Cause, ArgumentRole::Effect), 1);
        assert_eq!(agreement.label_matrix.get(ArgumentRole::Effect, ArgumentRole::Cause), 1);
        assert!(agreement.per_pair[0].has_role_swap());
        assert!(agreement.per_pair[0].predicted_fully_matched());
        // same-role comparison sees two disagreements
        assert_eq!(agreement.cause.metrics, ClassificationMetrics::new(0, 1, 1));
    }

    #[test]
    fn test_partial_argument_overlap() {
        let s = sentence();
        let gold = instance(&s, &[1, 2], &[4, 5, 6, 7]);
        let predicted = instance(&s, &[1, 2], &[5, 6, 7]);
        let exact = ArgumentMatcher::new(&ExactMatcher).compare(&[pair(&s, &gold, &predicted)]);
        assert_eq!(exact.metrics, ClassificationMetrics::new(1, 1, 1));

        let partial_matcher = PartialOverlapMatcher::new(0.5);
        let partial =
            ArgumentMatcher::new(&partial_matcher).compare(&[pair(&s, &gold, &predicted)]);
        assert_eq!(partial.metrics, ClassificationMetrics::new(2, 0, 0));
        assert_eq!(partial.effect.jaccard.mean(), Some(0.75));
    }

    #[test]
    fn test_token_jaccard() {
        let s = sentence();
        let a = s.span(&[1, 2, 3]).unwrap();
        let b = s.span(&[2, 3, 4]).unwrap();
        assert_eq!(token_jaccard(Some(&a), Some(&b)), 0.5);
        assert_eq!(token_jaccard(Some(&a), None), 0.0);
        assert_eq!(token_jaccard(None, None), 1.0);
    }
}
