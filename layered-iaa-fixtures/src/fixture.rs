//! Fixture data types.
//!
//! A fixture describes one annotated document:
//!
//! ```text
//! (
//!     file_name: "rain.ann",
//!     sentences: [
//!         (
//!             text: "The game was cancelled because it rained",
//!             instances: [
//!                 (
//!                     id: "T1",
//!                     connective: [5],
//!                     cause: Some([6, 7]),
//!                     effect: Some([1, 2, 3, 4]),
//!                     degree: Some(Facilitate),
//!                     causation_type: Some(Consequence),
//!                 ),
//!             ],
//!         ),
//!     ],
//! )
//! ```
//!
//! Token indices are 1-based positions of whitespace-separated words.

use layered_iaa::{CausationInstance, CausationType, Degree, Sentence};
use serde::{Deserialize, Serialize};

use crate::errors::FixtureResult;

/// One annotated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationFixture {
    /// Name recorded as every sentence's source file.
    pub file_name: String,
    pub sentences: Vec<SentenceFixture>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceFixture {
    pub text: String,
    #[serde(default)]
    pub instances: Vec<InstanceFixture>,
}

/// A causal relation given by token indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceFixture {
    pub id: String,
    pub connective: Vec<usize>,
    #[serde(default)]
    pub cause: Option<Vec<usize>>,
    #[serde(default)]
    pub effect: Option<Vec<usize>>,
    #[serde(default)]
    pub degree: Option<Degree>,
    #[serde(default)]
    pub causation_type: Option<CausationType>,
}

impl AnnotationFixture {
    /// Total number of causal instances across all sentences.
    pub fn instance_count(&self) -> usize {
        self.sentences.iter().map(|s| s.instances.len()).sum()
    }

    /// Tokenize every sentence and resolve the instances' token indices.
    pub fn to_sentences(&self) -> FixtureResult<Vec<Sentence>> {
        self.sentences
            .iter()
            .map(|sentence| sentence.to_sentence(&self.file_name))
            .collect()
    }
}

impl SentenceFixture {
    pub fn to_sentence(&self, file_name: &str) -> FixtureResult<Sentence> {
        let mut sentence = Sentence::from_text(self.text.as_str(), file_name);
        for instance in &self.instances {
            let resolved = instance.resolve(&sentence)?;
            sentence.add_instance(resolved);
        }
        Ok(sentence)
    }
}

impl InstanceFixture {
    fn resolve(&self, sentence: &Sentence) -> FixtureResult<CausationInstance> {
        let mut instance =
            CausationInstance::new(self.id.as_str(), sentence.span(&self.connective)?);
        if let Some(cause) = &self.cause {
            instance.cause = Some(sentence.span(cause)?);
        }
        if let Some(effect) = &self.effect {
            instance.effect = Some(sentence.span(effect)?);
        }
        instance.degree = self.degree;
        instance.causation_type = self.causation_type;
        Ok(instance)
    }
}
