#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Inter-annotator agreement for causal relation annotations.
//!
//! Two annotators mark the same sentences with causal relations: a connective
//! span ("because"), optional cause and effect spans, and optional degree and
//! causation-type labels. This crate measures how well the two annotation sets
//! agree.
//!
//! ## Matching
//!
//! - [`ExactMatcher`] / [`PartialOverlapMatcher`] - Decide whether two spans
//!   denote the same thing
//! - [`SequenceDiff`] - Order-preserving alignment of two sequences under a
//!   custom equality
//! - [`ConnectiveMatcher`] - Aligns causal instances by connective, exact
//!   matches first
//! - [`ArgumentMatcher`] - Pairs up cause/effect arguments of matched instances
//!
//! ## Results
//!
//! - [`ClassificationMetrics`] - Matched / predicted-only / gold-only counts
//! - [`ConfusionMatrix`] - Label agreement for degrees, causation types and
//!   argument roles
//! - [`AgreementReport`] - Everything above for one comparison, with pure
//!   merge and aggregate operations
//!
//! ## Example
//!
//! ```ignore
//! use layered_iaa::{AgreementReport, IaaConfig};
//!
//! let report = AgreementReport::new(&gold, &predicted, &IaaConfig::partial(0.5))?;
//! println!("{}", report);
//! ```

mod annotation;
mod argument;
mod config;
mod confusion;
mod connective;
mod display;
mod errors;
mod metrics;
mod overlap;
mod property;
mod report;
mod sequence_diff;

pub use annotation::{
    whitespace_tokens, CausationInstance, CausationType, Degree, Fragment, Sentence, Span, Token,
};
pub use argument::{
    token_jaccard, ArgumentAgreement, ArgumentMatcher, ArgumentRole, PairArguments, RoleAgreement,
};
pub use config::{
    IaaConfig, IdentifierFilter, IdentifierInclusion, DEFAULT_MIN_PARTIAL_OVERLAP_FRACTION,
};
pub use confusion::{ConfusionMatrix, Label};
pub use connective::{
    check_parallel, ConnectiveAlignment, ConnectiveMatcher, LocatedInstance, MatchedPair,
};
pub use display::{truncated, ReportDisplay, ReportFormat};
pub use errors::{IaaError, IaaResult};
pub use metrics::{AgreementMetrics, AveragedMetrics, ClassificationMetrics, MeanScore, Rates};
pub use overlap::{
    matches, overlap_fraction, ExactMatcher, MatchStrategy, PartialOverlapMatcher, SpanMatcher,
};
pub use property::{
    compare_property, PropertyAgreement, PropertyDescriptor, ValueDifference, CAUSATION_TYPE,
    DEGREE,
};
pub use report::{
    AgreementReport, ArgumentDifference, ComparisonSettings, Diagnostics, InstanceRecord,
    PropertyDifference, PropertyKind, RoleSummary,
};
pub use sequence_diff::SequenceDiff;
