pub mod augmentation;
pub mod event;
pub mod lab_results;
pub mod output;
pub mod reader;

// Re-export the operator surface
pub use augmentation::{
    apply_step, enhance_terms, index_words, insert_related_terms, plan_deletions,
    random_char_deletion, scramble_word_order, AugmentationConfig, Augmenter, DeleteMethod,
    DeletionRecord, EnhancementTable, EnhancementTableError, EnhancementType, PerWordCap, Step,
    WordIndex, WordSpan,
};

// Re-export I/O helpers used by the CLI and integration tests
pub use event::{handle, HandlerResponse, LocalObjectStore, ObjectFetcher, ObjectLocation};
pub use output::{RunStats, VariantRow};
pub use reader::{parse_term_bytes, parse_terms, ReaderConfig, TermReader, TermRecord};
