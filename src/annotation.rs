//! Annotated sentences and the causal relation instances attached to them.
//!
//! These are the minimal attributes the agreement engine reads. Values are
//! built once by an annotation reader (or a fixture) and never mutated by the
//! engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::confusion::Label;
use crate::errors::{IaaError, IaaResult};

/// A single token of a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Position in the sentence. Index 0 is the synthetic root.
    pub index: usize,
    /// Character position where the token starts (inclusive).
    pub start_offset: usize,
    /// Character position where the token ends (exclusive).
    pub end_offset: usize,
    /// Surface text as it appears in the source.
    pub text: String,
    pub part_of_speech: String,
    pub lemma: String,
}

impl Token {
    pub const ROOT_TEXT: &'static str = "ROOT";

    pub fn new(
        index: usize,
        start_offset: usize,
        end_offset: usize,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        Self {
            index,
            start_offset,
            end_offset,
            lemma: text.to_lowercase(),
            text,
            part_of_speech: String::new(),
        }
    }

    /// The synthetic root token occupying index 0 of every sentence.
    pub fn root() -> Self {
        Self {
            index: 0,
            start_offset: 0,
            end_offset: 0,
            text: Self::ROOT_TEXT.to_string(),
            part_of_speech: Self::ROOT_TEXT.to_string(),
            lemma: Self::ROOT_TEXT.to_lowercase(),
        }
    }

    pub fn with_part_of_speech(mut self, part_of_speech: impl Into<String>) -> Self {
        self.part_of_speech = part_of_speech.into();
        self
    }

    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = lemma.into();
        self
    }

    pub fn is_root(&self) -> bool {
        self.index == 0
    }

    /// Number of characters covered by this token, zero if the offsets are reversed.
    pub fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One contiguous run of tokens within a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub start_offset: usize,
    pub end_offset: usize,
    /// Index of the first token in the run.
    pub first_token: usize,
    /// Index of the last token in the run (inclusive).
    pub last_token: usize,
}

/// A possibly discontiguous annotated span.
///
/// Tokens are kept sorted by start offset and never overlap each other; both
/// properties are checked on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    tokens: Vec<Token>,
}

impl Span {
    /// Build a span from its tokens.
    ///
    /// Fails on an empty token list, on a token whose end precedes its start,
    /// and on tokens that overlap one another.
    pub fn new(mut tokens: Vec<Token>) -> IaaResult<Self> {
        if tokens.is_empty() {
            return Err(IaaError::invalid_input("span must contain at least one token"));
        }
        if let Some(token) = tokens.iter().find(|t| t.end_offset < t.start_offset) {
            return Err(IaaError::invalid_input(format!(
                "token {} ends at {} before it starts at {}",
                token.index, token.end_offset, token.start_offset
            )));
        }

        tokens.sort_by_key(|t| (t.start_offset, t.end_offset));
        for pair in tokens.windows(2) {
            if pair[1].start_offset < pair[0].end_offset {
                return Err(IaaError::invalid_input(format!(
                    "span tokens {} ({}..{}) and {} ({}..{}) overlap",
                    pair[0].index,
                    pair[0].start_offset,
                    pair[0].end_offset,
                    pair[1].index,
                    pair[1].start_offset,
                    pair[1].end_offset
                )));
            }
        }

        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// `(start_offset, end_offset)` of every token, in order.
    pub fn offsets(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.tokens.iter().map(|t| (t.start_offset, t.end_offset))
    }

    /// Start offset of the first token; the sort key used for alignment.
    pub fn start_offset(&self) -> usize {
        self.tokens[0].start_offset
    }

    /// Total number of characters covered, excluding gaps.
    pub fn covered_len(&self) -> usize {
        self.tokens.iter().map(Token::len).sum()
    }

    pub fn contains(&self, token_index: usize) -> bool {
        self.tokens.iter().any(|t| t.index == token_index)
    }

    /// Group tokens into runs of consecutive token indices.
    pub fn fragments(&self) -> Vec<Fragment> {
        let mut fragments: Vec<Fragment> = Vec::new();
        for token in &self.tokens {
            match fragments.last_mut() {
                Some(last) if last.last_token + 1 == token.index => {
                    last.last_token = token.index;
                    last.end_offset = token.end_offset;
                }
                _ => fragments.push(Fragment {
                    start_offset: token.start_offset,
                    end_offset: token.end_offset,
                    first_token: token.index,
                    last_token: token.index,
                }),
            }
        }
        fragments
    }

    /// Token text joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Degree of a causal relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Degree {
    Facilitate,
    Inhibit,
}

impl Label for Degree {
    const ALL: &'static [Self] = &[Degree::Facilitate, Degree::Inhibit];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Degree::Facilitate => "Facilitate",
            Degree::Inhibit => "Inhibit",
        }
    }
}

/// Type of a causal relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CausationType {
    Consequence,
    Motivation,
    Purpose,
    Inference,
}

impl Label for CausationType {
    const ALL: &'static [Self] = &[
        CausationType::Consequence,
        CausationType::Motivation,
        CausationType::Purpose,
        CausationType::Inference,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            CausationType::Consequence => "Consequence",
            CausationType::Motivation => "Motivation",
            CausationType::Purpose => "Purpose",
            CausationType::Inference => "Inference",
        }
    }
}

/// One causal relation annotation.
///
/// `degree` and `causation_type` are `None` when the annotator left them unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CausationInstance {
    /// Identifier assigned by the annotation tool.
    pub id: String,
    pub connective: Span,
    pub cause: Option<Span>,
    pub effect: Option<Span>,
    pub degree: Option<Degree>,
    pub causation_type: Option<CausationType>,
}

impl CausationInstance {
    pub fn new(id: impl Into<String>, connective: Span) -> Self {
        Self {
            id: id.into(),
            connective,
            cause: None,
            effect: None,
            degree: None,
            causation_type: None,
        }
    }

    pub fn with_cause(mut self, cause: Span) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_effect(mut self, effect: Span) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn with_degree(mut self, degree: Degree) -> Self {
        self.degree = Some(degree);
        self
    }

    pub fn with_causation_type(mut self, causation_type: CausationType) -> Self {
        self.causation_type = Some(causation_type);
        self
    }

    /// A copy of this instance with cause and effect exchanged.
    pub fn with_swapped_arguments(&self) -> Self {
        let mut swapped = self.clone();
        std::mem::swap(&mut swapped.cause, &mut swapped.effect);
        swapped
    }
}

/// An annotated sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sentence {
    /// All tokens, with the synthetic root at index 0.
    pub tokens: Vec<Token>,
    pub causation_instances: Vec<CausationInstance>,
    /// Source text exactly as it appeared in the document.
    pub original_text: String,
    pub source_file_path: PathBuf,
}

impl Sentence {
    /// Create a sentence from its word tokens; the root token is prepended.
    pub fn new(
        original_text: impl Into<String>,
        source_file_path: impl Into<PathBuf>,
        words: Vec<Token>,
    ) -> Self {
        let mut tokens = Vec::with_capacity(words.len() + 1);
        tokens.push(Token::root());
        tokens.extend(words);
        Self {
            tokens,
            causation_instances: Vec::new(),
            original_text: original_text.into(),
            source_file_path: source_file_path.into(),
        }
    }

    /// Create a sentence by splitting `text` on whitespace.
    pub fn from_text(text: impl Into<String>, source_file_path: impl Into<PathBuf>) -> Self {
        let text = text.into();
        let words = whitespace_tokens(&text);
        Self::new(text, source_file_path, words)
    }

    pub fn add_instance(&mut self, instance: CausationInstance) {
        self.causation_instances.push(instance);
    }

    /// Tokens excluding the synthetic root.
    pub fn words(&self) -> &[Token] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    /// Build a span from 1-based token indices of this sentence.
    pub fn span(&self, indices: &[usize]) -> IaaResult<Span> {
        let tokens = indices
            .iter()
            .map(|&idx| match self.tokens.get(idx) {
                Some(token) if !token.is_root() => Ok(token.clone()),
                Some(_) => Err(IaaError::invalid_input("the root token cannot be annotated")),
                None => Err(IaaError::invalid_input(format!(
                    "token index {} out of range for sentence with {} words",
                    idx,
                    self.words().len()
                ))),
            })
            .collect::<IaaResult<Vec<_>>>()?;
        Span::new(tokens)
    }

    /// File name of the source document, without its directory.
    pub fn file_name(&self) -> String {
        Path::new(&self.source_file_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Two sentences are the same for agreement purposes iff their text is identical.
    pub fn same_text(&self, other: &Sentence) -> bool {
        self.original_text == other.original_text
    }

    /// A copy of this sentence with every instance's cause and effect exchanged.
    pub fn with_swapped_arguments(&self) -> Self {
        let mut swapped = self.clone();
        swapped.causation_instances = self
            .causation_instances
            .iter()
            .map(CausationInstance::with_swapped_arguments)
            .collect();
        swapped
    }
}

/// Split `text` on whitespace into word tokens numbered from 1.
///
/// Offsets count characters, not bytes.
pub fn whitespace_tokens(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current: Option<(usize, String)> = None;
    let mut end = 0;
    for (offset, ch) in text.chars().enumerate() {
        end = offset + 1;
        if ch.is_whitespace() {
            if let Some((start, word)) = current.take() {
                tokens.push(Token::new(tokens.len() + 1, start, offset, word));
            }
        } else {
            current.get_or_insert_with(|| (offset, String::new())).1.push(ch);
        }
    }
    if let Some((start, word)) = current {
        tokens.push(Token::new(tokens.len() + 1, start, end, word));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence() -> Sentence {
        // "I left because it rained"
        let words = vec![
            Token::new(1, 0, 1, "I"),
            Token::new(2, 2, 6, "left"),
            Token::new(3, 7, 14, "because"),
            Token::new(4, 15, 17, "it"),
            Token::new(5, 18, 24, "rained"),
        ];
        Sentence::new("I left because it rained", "/data/doc.ann", words)
    }

    #[test]
    fn test_span_sorts_tokens() {
        let s = sentence();
        let span = s.span(&[5, 4]).unwrap();
        let offsets: Vec<_> = span.offsets().collect();
        assert_eq!(offsets, vec![(15, 17), (18, 24)]);
        assert_eq!(span.start_offset(), 15);
        assert_eq!(span.covered_len(), 8);
        assert_eq!(span.text(), "it rained");
    }

    #[test]
    fn test_token_len_with_reversed_offsets() {
        assert_eq!(Token::new(1, 2, 6, "left").len(), 4);
        let reversed = Token::new(1, 6, 2, "left");
        assert_eq!(reversed.len(), 0);
        assert!(reversed.is_empty());
        assert!(Span::new(vec![reversed]).is_err());
    }

    #[test]
    fn test_span_rejects_overlapping_tokens() {
        let result = Span::new(vec![Token::new(1, 0, 5, "hello"), Token::new(2, 3, 8, "lower")]);
        assert!(matches!(result, Err(IaaError::InvalidInput { .. })));
    }

    #[test]
    fn test_span_rejects_empty_and_root() {
        assert!(Span::new(vec![]).is_err());
        assert!(sentence().span(&[0]).is_err());
        assert!(sentence().span(&[9]).is_err());
    }

    #[test]
    fn test_fragments_group_consecutive_tokens() {
        let s = sentence();
        let span = s.span(&[1, 2, 4]).unwrap();
        let fragments = span.fragments();
        assert_eq!(fragments.len(), 2);
        assert_eq!((fragments[0].start_offset, fragments[0].end_offset), (0, 6));
        assert_eq!((fragments[0].first_token, fragments[0].last_token), (1, 2));
        assert_eq!((fragments[1].start_offset, fragments[1].end_offset), (15, 17));
    }

    #[test]
    fn test_sentence_root_and_file_name() {
        let s = sentence();
        assert!(s.tokens[0].is_root());
        assert_eq!(s.words().len(), 5);
        assert_eq!(s.file_name(), "doc.ann");
    }

    #[test]
    fn test_whitespace_tokens_use_char_offsets() {
        let tokens = whitespace_tokens("  Café closed,  so   we left ");
        let words: Vec<_> = tokens
            .iter()
            .map(|t| (t.index, t.start_offset, t.end_offset, t.text.as_str()))
            .collect();
        assert_eq!(
            words,
            vec![
                (1, 2, 6, "Café"),
                (2, 7, 14, "closed,"),
                (3, 16, 18, "so"),
                (4, 21, 23, "we"),
                (5, 24, 28, "left"),
            ]
        );
        let s = Sentence::from_text("I left", "a.ann");
        assert_eq!(s.tokens.len(), 3);
        assert_eq!(s.span(&[2]).unwrap().text(), "left");
    }

    #[test]
    fn test_swapped_arguments() {
        let s = sentence();
        let instance = CausationInstance::new("T1", s.span(&[3]).unwrap())
            .with_cause(s.span(&[4, 5]).unwrap())
            .with_effect(s.span(&[1, 2]).unwrap());
        let swapped = instance.with_swapped_arguments();
        assert_eq!(swapped.cause, instance.effect);
        assert_eq!(swapped.effect, instance.cause);
        assert_eq!(swapped.connective, instance.connective);
    }
}
