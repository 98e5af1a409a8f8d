// errors.rs - Error taxonomy for the scanning core

use std::error;
use std::fmt;

use crate::data::Locus;

/// Errors raised while partitioning, windowing or dispatching a scan.
///
/// Every variant is fatal for the track that raised it.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// Per-timepoint chromosome counts do not add up to the matrix width
    ShapeMismatch { expected: usize, found: usize },

    /// A site row is not as wide as the first row of the matrix
    RaggedMatrix { site: usize, expected: usize, found: usize },

    /// Locus list and call matrix disagree on the number of sites
    LocusCountMismatch { loci: usize, sites: usize },

    /// Window width is zero or even
    InvalidWindowWidth(usize),

    /// No timepoints were configured
    EmptyPartition,

    /// Generation timestamps do not line up with the timepoints
    GenerationMismatch { expected: usize, found: usize },

    /// A site has no observed calls at a timepoint
    UndefinedFrequency { timepoint: usize, site: usize },

    /// A timepoint contributes no chromosomes to a haplotype window
    DegenerateHaplotypeWindow { center: usize, timepoint: usize },

    /// The predictor or statistic failed, or returned the wrong number of results
    Predictor { locus: Locus, message: String },

    /// Two valid centres map to the same locus
    DuplicateLocus(Locus),

    /// Failure while writing reports or diagnostics
    Io(String),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { expected, found } => write!(
                f,
                "Sample counts sum to {} chromosomes but the call matrix has {}",
                expected, found
            ),
            Self::RaggedMatrix { site, expected, found } => write!(
                f,
                "Site {} has {} calls, expected {}",
                site, found, expected
            ),
            Self::LocusCountMismatch { loci, sites } => write!(
                f,
                "Locus list has {} entries but the call matrix has {} sites",
                loci, sites
            ),
            Self::InvalidWindowWidth(w) => {
                write!(f, "Window width must be a positive odd number, got {}", w)
            }
            Self::EmptyPartition => write!(f, "No timepoints to partition into"),
            Self::GenerationMismatch { expected, found } => write!(
                f,
                "Expected {} generation timestamps (one per timepoint), got {}",
                expected, found
            ),
            Self::UndefinedFrequency { timepoint, site } => write!(
                f,
                "Undefined allele frequency: site {} has no calls at timepoint {}",
                site, timepoint
            ),
            Self::DegenerateHaplotypeWindow { center, timepoint } => write!(
                f,
                "Degenerate haplotype window at center {}: timepoint {} has no chromosomes",
                center, timepoint
            ),
            Self::Predictor { locus, message } => {
                write!(f, "Prediction failed at {}: {}", locus, message)
            }
            Self::DuplicateLocus(locus) => write!(f, "Duplicate locus in window stream: {}", locus),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl error::Error for ScanError {}

impl From<std::io::Error> for ScanError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<ScanError> for String {
    fn from(e: ScanError) -> Self {
        e.to_string()
    }
}
