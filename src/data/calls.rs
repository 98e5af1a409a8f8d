// calls.rs - Per-site call matrix and its per-timepoint partition

use crate::core::errors::ScanError;
use crate::data::locus::Locus;
use rayon::prelude::*;
use std::ops::Range;

/// Sentinel for a missing allele call; never counted as an observation
pub const MISSING_CALL: u8 = u8::MAX;

/// Reference allele id
pub const REFERENCE_ALLELE: u8 = 0;

/// Summary statistics of a loaded call matrix
#[derive(Debug, Clone)]
pub struct MatrixStats {
    pub n_sites: usize,
    pub n_chromosomes: usize,
    pub missing_calls: usize,
    pub missing_fraction: f64,
    pub multiallelic_sites: usize,
    pub monomorphic_sites: usize,
}

/// Allele calls for every site (rows) and sampled chromosome (columns).
///
/// Chromosome columns are ordered from the earliest to the latest sampling
/// time, which is what makes [`CallMatrix::partition`] a pure reshape.
#[derive(Debug, Clone)]
pub struct CallMatrix {
    pub loci: Vec<Locus>,
    calls: Vec<Vec<u8>>,
    n_chromosomes: usize,
}

impl CallMatrix {
    /// Build a matrix, checking that rows are rectangular and match the loci
    pub fn new(loci: Vec<Locus>, calls: Vec<Vec<u8>>) -> Result<Self, ScanError> {
        if loci.len() != calls.len() {
            return Err(ScanError::LocusCountMismatch {
                loci: loci.len(),
                sites: calls.len(),
            });
        }

        let n_chromosomes = calls.first().map(|row| row.len()).unwrap_or(0);
        for (site, row) in calls.iter().enumerate() {
            if row.len() != n_chromosomes {
                return Err(ScanError::RaggedMatrix {
                    site,
                    expected: n_chromosomes,
                    found: row.len(),
                });
            }
        }

        Ok(Self {
            loci,
            calls,
            n_chromosomes,
        })
    }

    /// A matrix with no sites, e.g. after every site was filtered out
    pub fn empty(n_chromosomes: usize) -> Self {
        Self {
            loci: Vec::new(),
            calls: Vec::new(),
            n_chromosomes,
        }
    }

    pub fn n_sites(&self) -> usize {
        self.calls.len()
    }

    pub fn n_chromosomes(&self) -> usize {
        self.n_chromosomes
    }

    /// All calls at one site
    pub fn site(&self, index: usize) -> &[u8] {
        &self.calls[index]
    }

    pub fn is_benchmark(&self) -> bool {
        self.loci.iter().any(|l| l.mutation_type.is_some())
    }

    /// Split the chromosome dimension into consecutive per-timepoint blocks
    pub fn partition(&self, counts: &[usize]) -> Result<TimepointPartition<'_>, ScanError> {
        if counts.is_empty() {
            return Err(ScanError::EmptyPartition);
        }

        let total: usize = counts.iter().sum();
        if total != self.n_chromosomes {
            return Err(ScanError::ShapeMismatch {
                expected: total,
                found: self.n_chromosomes,
            });
        }

        let mut offset = 0;
        let blocks = counts
            .iter()
            .map(|&count| {
                let block = TimepointBlock {
                    matrix: self,
                    columns: offset..offset + count,
                };
                offset += count;
                block
            })
            .collect();

        Ok(TimepointPartition { blocks })
    }

    pub fn statistics(&self) -> MatrixStats {
        let per_site: Vec<(usize, usize)> = self
            .calls
            .par_iter()
            .map(|row| {
                let missing = row.iter().filter(|&&c| c == MISSING_CALL).count();
                let mut seen = [false; 256];
                for &c in row.iter().filter(|&&c| c != MISSING_CALL) {
                    seen[c as usize] = true;
                }
                let distinct = seen.iter().filter(|&&s| s).count();
                (missing, distinct)
            })
            .collect();

        let missing_calls: usize = per_site.iter().map(|(m, _)| m).sum();
        let total_cells = self.n_sites() * self.n_chromosomes;
        let missing_fraction = if total_cells == 0 {
            0.0
        } else {
            missing_calls as f64 / total_cells as f64
        };

        MatrixStats {
            n_sites: self.n_sites(),
            n_chromosomes: self.n_chromosomes,
            missing_calls,
            missing_fraction,
            multiallelic_sites: per_site.iter().filter(|(_, d)| *d > 2).count(),
            monomorphic_sites: per_site.iter().filter(|(_, d)| *d <= 1).count(),
        }
    }

    /// Print matrix statistics
    pub fn print_matrix_statistics(&self, phase: &str) {
        let stats = self.statistics();
        println!("\n📊 === CALL MATRIX STATISTICS ({}) ===", phase);
        println!(
            "  📏 Dimensions: {} sites × {} chromosomes",
            stats.n_sites, stats.n_chromosomes
        );

        let missing_percent = 100.0 * stats.missing_fraction;
        print!(
            "  📊 Missing calls: {:.2}% ({} calls)",
            missing_percent, stats.missing_calls
        );
        if missing_percent <= 5.0 {
            println!("  🟢 EXCELLENT");
        } else if missing_percent <= 15.0 {
            println!("  🟡 GOOD");
        } else {
            println!("  🔴 HIGH - undefined frequencies are likely");
        }

        println!("  🧬 Multiallelic sites: {}", stats.multiallelic_sites);
        println!("  ➖ Monomorphic sites: {}", stats.monomorphic_sites);
        if self.is_benchmark() {
            let selected = self.loci.iter().filter(|l| l.is_selected()).count();
            println!("  🎯 Benchmark mode: {} selected-site markers", selected);
        }
    }
}

/// Convert per-timepoint individual counts into chromosome counts
pub fn chromosome_counts(sample_sizes: &[usize], ploidy: usize) -> Vec<usize> {
    sample_sizes.iter().map(|s| s * ploidy).collect()
}

/// One timepoint's chromosome slice of a [`CallMatrix`]
#[derive(Debug, Clone)]
pub struct TimepointBlock<'a> {
    matrix: &'a CallMatrix,
    columns: Range<usize>,
}

impl<'a> TimepointBlock<'a> {
    /// This timepoint's calls at one site
    pub fn site(&self, index: usize) -> &'a [u8] {
        &self.matrix.calls[index][self.columns.clone()]
    }

    pub fn n_sites(&self) -> usize {
        self.matrix.n_sites()
    }

    pub fn n_chromosomes(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> Range<usize> {
        self.columns.clone()
    }
}

/// Ordered per-timepoint blocks, earliest first
#[derive(Debug, Clone)]
pub struct TimepointPartition<'a> {
    blocks: Vec<TimepointBlock<'a>>,
}

impl<'a> TimepointPartition<'a> {
    pub fn blocks(&self) -> &[TimepointBlock<'a>] {
        &self.blocks
    }

    pub fn n_timepoints(&self) -> usize {
        self.blocks.len()
    }

    pub fn last(&self) -> Option<&TimepointBlock<'a>> {
        self.blocks.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<Vec<u8>>) -> CallMatrix {
        let loci = (0..rows.len())
            .map(|i| Locus::new("1", (i as u64 + 1) * 100))
            .collect();
        CallMatrix::new(loci, rows).unwrap()
    }

    #[test]
    fn test_partition_sizes_and_reconstruction() {
        let m = matrix(vec![
            vec![0, 1, 2, 3, 4, 5, 6],
            vec![6, 5, 4, 3, 2, 1, 0],
        ]);
        let counts = [2, 0, 4, 1];
        let partition = m.partition(&counts).unwrap();

        assert_eq!(partition.n_timepoints(), 4);
        let sizes: Vec<_> = partition.blocks().iter().map(|b| b.n_chromosomes()).collect();
        assert_eq!(sizes, counts);

        for site in 0..m.n_sites() {
            let rebuilt: Vec<u8> = partition
                .blocks()
                .iter()
                .flat_map(|b| b.site(site).iter().copied())
                .collect();
            assert_eq!(rebuilt, m.site(site));
        }
    }

    #[test]
    fn test_partition_shape_mismatch() {
        let m = matrix(vec![vec![0; 6]]);
        let err = m.partition(&[2, 2]).unwrap_err();
        assert_eq!(err, ScanError::ShapeMismatch { expected: 4, found: 6 });
        assert_eq!(m.partition(&[]).unwrap_err(), ScanError::EmptyPartition);
    }

    #[test]
    fn test_ragged_and_locus_mismatch() {
        let loci = vec![Locus::new("1", 1), Locus::new("1", 2)];
        let err = CallMatrix::new(loci.clone(), vec![vec![0, 1], vec![0]]).unwrap_err();
        assert_eq!(err, ScanError::RaggedMatrix { site: 1, expected: 2, found: 1 });

        let err = CallMatrix::new(loci, vec![vec![0, 1]]).unwrap_err();
        assert_eq!(err, ScanError::LocusCountMismatch { loci: 2, sites: 1 });
    }

    #[test]
    fn test_statistics() {
        let m = matrix(vec![
            vec![0, 0, 0, MISSING_CALL],
            vec![0, 1, 2, 1],
            vec![0, 1, 1, 0],
        ]);
        let stats = m.statistics();
        assert_eq!(stats.missing_calls, 1);
        assert_eq!(stats.multiallelic_sites, 1);
        assert_eq!(stats.monomorphic_sites, 1);
        assert!((stats.missing_fraction - 1.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_chromosome_counts() {
        assert_eq!(chromosome_counts(&[10, 5], 2), vec![20, 10]);
        assert_eq!(chromosome_counts(&[3], 1), vec![3]);
    }
}
