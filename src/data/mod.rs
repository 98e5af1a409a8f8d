// mod.rs - Data structures module

pub mod calls;
pub mod loaders;
pub mod locus;

// Re-export main types for convenience
pub use calls::{chromosome_counts, CallMatrix, MatrixStats, TimepointBlock, TimepointPartition};
pub use loaders::{load_call_table, LoadOptions};
pub use locus::{Locus, SELECTED_MUTATION_TYPE};
