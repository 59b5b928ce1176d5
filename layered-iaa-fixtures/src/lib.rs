#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Declarative causal annotation fixtures for layered-iaa.
//!
//! Fixtures are `.ron` files describing annotated sentences by token index.
//! Loading one yields the [`Sentence`](layered_iaa::Sentence) values an
//! agreement comparison consumes.
//!
//! ## Modules
//!
//! - [`fixture`] - Fixture data types and their conversion to sentences
//! - [`loader`] - Reading single fixture files and whole directories
//! - [`errors`] - Error types for fixture loading

pub mod errors;
pub mod fixture;
pub mod loader;

pub use errors::{FixtureError, FixtureResult};
pub use fixture::{AnnotationFixture, InstanceFixture, SentenceFixture};
pub use loader::{load_all_fixtures, load_corpus, load_fixture, load_sentences, parse_fixture};
