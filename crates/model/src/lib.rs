pub mod document;
pub mod fact;
pub mod label;
pub mod language;
pub mod render;
pub mod span;

pub use document::{Document, Sentence, Word};
pub use fact::{ContextLink, Fact, FactCollection, FactId, FactNode, FactStore, Link, LinkTarget};
pub use label::{ContextLabel, FactLabel, UnknownLabel};
pub use language::{LanguageSet, LanguageTag};
pub use span::{MaybeSpan, WordRange};
