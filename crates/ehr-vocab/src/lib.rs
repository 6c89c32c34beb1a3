#![deny(unsafe_code)]

pub mod crossmap;
pub mod error;
pub mod loader;
pub mod paths;
pub mod registry;
pub mod standard;
pub mod vocabulary;

pub use crate::crossmap::CrossMap;
pub use crate::error::{UnmappedCode, VocabError};
pub use crate::loader::{cross_map_path, load_cross_map, load_vocabulary, vocabulary_path};
pub use crate::paths::{VOCAB_ENV_VAR, resolve_vocab_dir};
pub use crate::registry::{
    DEFAULT_DRUG_LEVEL, DomainVocabulary, RegistrySpec, VocabularyRegistry, VocabularySpec,
};
pub use crate::standard::{CodingStandard, HierarchyScheme};
pub use crate::vocabulary::{Concept, VocabularyMap};
