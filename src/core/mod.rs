// mod.rs - Core scanning logic

pub mod alleles;
pub mod dispatch;
pub mod errors;
pub mod haplotypes;
pub mod pipeline;
pub mod windows;

// Re-export main types for convenience
pub use alleles::{build_afs_series, prepare_afs_series, resolve_minor_alleles, FrequencySeries};
pub use dispatch::{
    classify_windows, evaluate_sites, CapturedWindow, ClassificationOutput, DiagnosticCapture,
    LocusSeries, LocusWindow, ResultMap,
};
pub use errors::ScanError;
pub use haplotypes::{HaplotypeSpectrumBuilder, RankedHaplotypeSpectrum};
pub use pipeline::{
    run_afs_track, run_fit_track, run_hfs_track, run_scan, ScanOutputs, ScanSettings, TrackSet,
    DEFAULT_BATCH_SIZE, DEFAULT_WINDOW_SIZE,
};
pub use windows::{assemble_afs_window, WindowIndex, WindowSpan, WindowTensor};
