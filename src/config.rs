//! Comparison configuration.
//!
//! ```
//! use layered_iaa::{IaaConfig, IdentifierInclusion};
//!
//! let config = IaaConfig::from_toml_str(
//!     r#"
//!     allow_partial_overlap = true
//!     min_partial_overlap_fraction = 0.6
//!
//!     [identifiers]
//!     mode = "NonGivenOnly"
//!     given_ids = ["T3", "T7"]
//!     "#,
//! )
//! .unwrap();
//! assert!(config.allow_partial_overlap);
//! assert_eq!(config.identifiers.mode, IdentifierInclusion::NonGivenOnly);
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{IaaError, IaaResult};
use crate::overlap::MatchStrategy;

pub const DEFAULT_MIN_PARTIAL_OVERLAP_FRACTION: f64 = 0.5;

/// Which instances take part in a comparison, by identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierInclusion {
    /// Only instances whose id is in the given set.
    GivenOnly,
    /// Only instances whose id is not in the given set.
    NonGivenOnly,
    /// Every instance.
    Both,
}

impl Default for IdentifierInclusion {
    fn default() -> Self {
        IdentifierInclusion::Both
    }
}

/// Identifier filter: an inclusion mode plus the set of "given" identifiers.
///
/// Given identifiers name connectives that both annotators received
/// pre-annotated, which are scored separately from those annotated freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierFilter {
    pub mode: IdentifierInclusion,
    pub given_ids: BTreeSet<String>,
}

impl IdentifierFilter {
    pub fn new<I, S>(mode: IdentifierInclusion, given_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode,
            given_ids: given_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_given(&self, id: &str) -> bool {
        self.given_ids.contains(id)
    }

    /// Whether an instance with this id takes part in the comparison.
    pub fn includes(&self, id: &str) -> bool {
        match self.mode {
            IdentifierInclusion::Both => true,
            IdentifierInclusion::GivenOnly => self.is_given(id),
            IdentifierInclusion::NonGivenOnly => !self.is_given(id),
        }
    }

    /// Connective metrics carry no information when every compared connective
    /// was given to both annotators.
    pub fn connective_metrics_applicable(&self) -> bool {
        match self.mode {
            IdentifierInclusion::GivenOnly => false,
            IdentifierInclusion::Both => self.given_ids.is_empty(),
            IdentifierInclusion::NonGivenOnly => true,
        }
    }
}

/// Settings for one agreement comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IaaConfig {
    /// Run the exact-then-partial two-phase connective matching.
    pub allow_partial_overlap: bool,
    /// Overlap fraction a partial match must exceed. Used only with
    /// `allow_partial_overlap`.
    pub min_partial_overlap_fraction: f64,
    pub identifiers: IdentifierFilter,
    pub compare_degrees: bool,
    pub compare_types: bool,
    /// Keep gold-only/predicted-only instances and differences in the report.
    pub save_differences: bool,
}

impl Default for IaaConfig {
    fn default() -> Self {
        Self::exact()
    }
}

impl IaaConfig {
    /// Exact boundary matching with every property compared.
    pub fn exact() -> Self {
        Self {
            allow_partial_overlap: false,
            min_partial_overlap_fraction: DEFAULT_MIN_PARTIAL_OVERLAP_FRACTION,
            identifiers: IdentifierFilter::default(),
            compare_degrees: true,
            compare_types: true,
            save_differences: false,
        }
    }

    /// Two-phase matching accepting overlaps above `min_fraction`.
    pub fn partial(min_fraction: f64) -> Self {
        Self {
            allow_partial_overlap: true,
            min_partial_overlap_fraction: min_fraction,
            ..Self::exact()
        }
    }

    pub fn with_identifiers(mut self, identifiers: IdentifierFilter) -> Self {
        self.identifiers = identifiers;
        self
    }

    pub fn with_degrees(mut self, compare_degrees: bool) -> Self {
        self.compare_degrees = compare_degrees;
        self
    }

    pub fn with_types(mut self, compare_types: bool) -> Self {
        self.compare_types = compare_types;
        self
    }

    pub fn with_differences(mut self, save_differences: bool) -> Self {
        self.save_differences = save_differences;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> IaaResult<()> {
        let fraction = self.min_partial_overlap_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(IaaError::config(format!(
                "min_partial_overlap_fraction must be in (0, 1], got {}",
                fraction
            )));
        }
        Ok(())
    }

    /// The span matching strategy selected by these settings.
    pub fn match_strategy(&self) -> MatchStrategy {
        MatchStrategy::new(self.allow_partial_overlap, self.min_partial_overlap_fraction)
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> IaaResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| IaaError::config(format!("failed to parse: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> IaaResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            IaaError::Config { message } => {
                IaaError::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = IaaConfig::default();
        assert!(!config.allow_partial_overlap);
        assert_eq!(config.min_partial_overlap_fraction, 0.5);
        assert_eq!(config.identifiers.mode, IdentifierInclusion::Both);
        assert!(config.compare_degrees && config.compare_types);
        assert!(!config.save_differences);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = IaaConfig::from_toml_str("").unwrap();
        assert_eq!(config, IaaConfig::default());
    }

    #[test]
    fn test_fraction_range_validated() {
        assert!(IaaConfig::partial(1.0).validate().is_ok());
        assert!(matches!(
            IaaConfig::partial(0.0).validate(),
            Err(IaaError::Config { .. })
        ));
        assert!(IaaConfig::partial(1.5).validate().is_err());
        assert!(IaaConfig::partial(f64::NAN).validate().is_err());
        assert!(IaaConfig::from_toml_str("min_partial_overlap_fraction = 2.0").is_err());
    }

    #[test]
    fn test_identifier_filter() {
        let given = IdentifierFilter::new(IdentifierInclusion::GivenOnly, vec!["T1"]);
        assert!(given.includes("T1"));
        assert!(!given.includes("T2"));
        assert!(!given.connective_metrics_applicable());

        let non_given = IdentifierFilter::new(IdentifierInclusion::NonGivenOnly, vec!["T1"]);
        assert!(!non_given.includes("T1"));
        assert!(non_given.includes("T2"));
        assert!(non_given.connective_metrics_applicable());

        let both = IdentifierFilter::new(IdentifierInclusion::Both, vec!["T1"]);
        assert!(both.includes("T1") && both.includes("T2"));
        assert!(!both.connective_metrics_applicable());
        assert!(IdentifierFilter::default().connective_metrics_applicable());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "allow_partial_overlap = true").unwrap();
        writeln!(file, "compare_types = false").unwrap();
        writeln!(file, "[identifiers]").unwrap();
        writeln!(file, "mode = \"GivenOnly\"").unwrap();
        writeln!(file, "given_ids = [\"T4\"]").unwrap();

        let config = IaaConfig::load(file.path()).unwrap();
        assert!(config.allow_partial_overlap);
        assert!(!config.compare_types);
        assert!(config.compare_degrees);
        assert!(config.identifiers.is_given("T4"));
        assert!(config.match_strategy().is_partial());
    }

    #[test]
    fn test_load_missing_file() {
        let result = IaaConfig::load(Path::new("/nonexistent/iaa.toml"));
        assert!(matches!(result, Err(IaaError::Io(_))));
    }
}
