// locus.rs - Genomic site identity

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Mutation type that marks a known selected site in benchmark data
pub const SELECTED_MUTATION_TYPE: u32 = 2;

/// A genomic site, unique within one run.
///
/// Ordering is `(chrom, position, mutation_type)` with chromosomes compared as
/// plain strings, so `chr10` sorts before `chr2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locus {
    pub chrom: String,
    pub position: u64,
    /// Only present in benchmark (simulated) data
    pub mutation_type: Option<u32>,
}

impl Locus {
    pub fn new(chrom: impl Into<String>, position: u64) -> Self {
        Self {
            chrom: chrom.into(),
            position,
            mutation_type: None,
        }
    }

    pub fn with_mutation_type(chrom: impl Into<String>, position: u64, mutation_type: u32) -> Self {
        Self {
            chrom: chrom.into(),
            position,
            mutation_type: Some(mutation_type),
        }
    }

    pub fn is_selected(&self) -> bool {
        self.mutation_type == Some(SELECTED_MUTATION_TYPE)
    }

    /// Key used when ranking report rows
    pub fn sort_key(&self) -> (&str, u64) {
        (&self.chrom, self.position)
    }
}

impl Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mutation_type {
            Some(mt) => write!(f, "{}:{} (MT={})", self.chrom, self.position, mt),
            None => write!(f, "{}:{}", self.chrom, self.position),
        }
    }
}
