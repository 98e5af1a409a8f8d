// lib.rs - timesweep library root

//! # timesweep - Windowed selective-sweep scanning of time-series genomic samples
//!
//! Sites sampled at several timepoints are turned into fixed-width windows and
//! handed to pretrained classifiers, giving a neutral / hard sweep / soft sweep
//! call for every window centre. Three tracks are available:
//!
//! - **AFS**: minor-allele frequency trajectories across the window
//! - **HFS**: ranked haplotype-frequency spectra per timepoint
//! - **FIT**: a frequency-increment test on each centre's trajectory
//!
//! Classifiers and tests are supplied by the caller through the [`Predictor`]
//! and [`StatisticTest`] traits. The CLI wires them to external commands that
//! speak JSON on stdin/stdout.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use timesweep::prelude::*;
//!
//! let matrix = load_call_table(std::path::Path::new("calls.tsv"), &LoadOptions::default())?;
//!
//! let afs = FnPredictor::new("toy", |w: &WindowTensor| {
//!     let last = w.rows().last().map(|r| r.iter().sum::<f64>()).unwrap_or(0.0);
//!     Ok(ClassProbabilities([1.0 - last.min(1.0), last.min(1.0), 0.0]))
//! });
//!
//! let settings = ScanSettings {
//!     window_size: 51,
//!     chromosome_counts: chromosome_counts(&[10, 10, 10], 2),
//!     generations: vec![10060, 10070, 10080],
//!     batch_size: 256,
//!     progress: false,
//! };
//! let tracks = TrackSet {
//!     afs: Some(&afs),
//!     hfs: None,
//!     fit: None,
//!     haplotypes: &RankedHaplotypeSpectrum,
//! };
//! let outputs = run_scan(&matrix, &settings, &tracks).map_err(|e| e.to_string())?;
//! # Ok::<(), String>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod output;
pub mod predictors;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{prepare_afs_series, run_scan, ScanOutputs, ScanSettings, TrackSet};
    pub use crate::core::{HaplotypeSpectrumBuilder, RankedHaplotypeSpectrum};
    pub use crate::core::{ScanError, WindowIndex, WindowTensor};
    pub use crate::data::{chromosome_counts, load_call_table, CallMatrix, LoadOptions, Locus};
    pub use crate::predictors::{ClassProbabilities, FitResult, FnPredictor, FnStatistic};
    pub use crate::predictors::{ExternalPredictor, ExternalStatistic, Predictor, StatisticTest};
}

// Re-export main types at the root level for convenience
pub use crate::cli::{Args, ValidationResult};
pub use crate::core::{ScanError, ScanSettings, WindowIndex, WindowTensor};
pub use crate::data::{CallMatrix, Locus};
pub use crate::predictors::{ClassProbabilities, FitResult, Predictor, StatisticTest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "timesweep v{} - Windowed selective-sweep scanner for time-series samples",
        VERSION
    )
}
