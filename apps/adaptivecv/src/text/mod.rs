pub mod cleaner;
pub mod normalizer;
pub mod stopwords;

pub use cleaner::{clean_generated_text, clean_identifier, clean_lines, clean_text_block};
pub use normalizer::{default_normalizer, NormalizedTokenSet, NormalizerConfig, TextNormalizer};
