// haplotypes.rs - Haplotype-frequency spectra over a window of sites

use crate::core::errors::ScanError;
use crate::core::windows::{WindowSpan, WindowTensor};
use crate::data::CallMatrix;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Turns the haplotypes of one window into a (timepoints × columns) tensor
pub trait HaplotypeSpectrumBuilder: Send + Sync {
    fn name(&self) -> &'static str;

    fn spectrum(
        &self,
        matrix: &CallMatrix,
        span: WindowSpan,
        chromosome_counts: &[usize],
    ) -> Result<WindowTensor, ScanError>;
}

/// Frequency of every distinct haplotype per timepoint.
///
/// Columns are ranked by frequency at the last timepoint, then by summed
/// frequency over all timepoints, then by the haplotype itself. Rows are
/// zero-padded to the total number of sampled chromosomes so every window of a
/// run has the same width. Missing calls are kept as their own symbol.
#[derive(Debug, Clone, Default)]
pub struct RankedHaplotypeSpectrum;

impl HaplotypeSpectrumBuilder for RankedHaplotypeSpectrum {
    fn name(&self) -> &'static str {
        "ranked"
    }

    fn spectrum(
        &self,
        matrix: &CallMatrix,
        span: WindowSpan,
        chromosome_counts: &[usize],
    ) -> Result<WindowTensor, ScanError> {
        let total: usize = chromosome_counts.iter().sum();
        if total != matrix.n_chromosomes() {
            return Err(ScanError::ShapeMismatch {
                expected: total,
                found: matrix.n_chromosomes(),
            });
        }
        if let Some(timepoint) = chromosome_counts.iter().position(|&c| c == 0) {
            return Err(ScanError::DegenerateHaplotypeWindow {
                center: span.center,
                timepoint,
            });
        }

        let n_timepoints = chromosome_counts.len();
        let mut counts: HashMap<Vec<u8>, Vec<usize>> = HashMap::new();

        let mut chromosome = 0;
        for (timepoint, &block) in chromosome_counts.iter().enumerate() {
            for column in chromosome..chromosome + block {
                let haplotype: Vec<u8> = span.indices().map(|s| matrix.site(s)[column]).collect();
                counts
                    .entry(haplotype)
                    .or_insert_with(|| vec![0; n_timepoints])[timepoint] += 1;
            }
            chromosome += block;
        }

        let mut ranked: Vec<(Vec<u8>, Vec<f64>)> = counts
            .into_iter()
            .map(|(hap, per_tp)| {
                let freqs = per_tp
                    .iter()
                    .zip(chromosome_counts)
                    .map(|(&n, &size)| n as f64 / size as f64)
                    .collect();
                (hap, freqs)
            })
            .collect();
        ranked.sort_by(|(hap_a, a), (hap_b, b)| compare_ranked(hap_a, a, hap_b, b));

        let rows = (0..n_timepoints)
            .map(|t| {
                let mut row: Vec<f64> = ranked.iter().map(|(_, freqs)| freqs[t]).collect();
                row.resize(total, 0.0);
                row
            })
            .collect();

        Ok(WindowTensor::from_rows(rows))
    }
}

fn compare_ranked(hap_a: &[u8], a: &[f64], hap_b: &[u8], b: &[f64]) -> Ordering {
    let last = a.len() - 1;
    b[last]
        .total_cmp(&a[last])
        .then_with(|| b.iter().sum::<f64>().total_cmp(&a.iter().sum::<f64>()))
        .then_with(|| hap_a.cmp(hap_b))
}
