// alleles.rs - Minor-allele resolution and allele-frequency time series

use crate::core::errors::ScanError;
use crate::data::calls::{CallMatrix, TimepointPartition, MISSING_CALL, REFERENCE_ALLELE};
use serde::Serialize;

/// Minor-allele frequencies, one row per timepoint and one column per site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrequencySeries {
    rows: Vec<Vec<f64>>,
}

impl FrequencySeries {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn n_timepoints(&self) -> usize {
        self.rows.len()
    }

    pub fn n_sites(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn get(&self, timepoint: usize, site: usize) -> f64 {
        self.rows[timepoint][site]
    }

    /// Time series of a single site, earliest timepoint first
    pub fn site_series(&self, site: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[site]).collect()
    }
}

/// Count every allele id at one site, skipping missing calls
fn count_alleles(calls: &[u8]) -> [usize; 256] {
    let mut counts = [0usize; 256];
    for &c in calls {
        if c != MISSING_CALL {
            counts[c as usize] += 1;
        }
    }
    counts
}

/// Pick the minor allele of every site from the final timepoint.
///
/// The minor allele is the most frequent non-reference allele at the last
/// timepoint; ties go to the lower allele id. It stays fixed for the whole
/// series so the frequency label cannot flip between timepoints. A site with
/// no alternate calls at the last timepoint resolves to allele 1.
pub fn resolve_minor_alleles(partition: &TimepointPartition<'_>) -> Result<Vec<u8>, ScanError> {
    let last = partition.last().ok_or(ScanError::EmptyPartition)?;

    let minor = (0..last.n_sites())
        .map(|site| {
            let counts = count_alleles(last.site(site));
            let mut best = REFERENCE_ALLELE + 1;
            let mut best_count = counts[best as usize];
            // strict comparison keeps the first (lowest) id on ties
            for allele in (REFERENCE_ALLELE as usize + 1)..(MISSING_CALL as usize) {
                if counts[allele] > best_count {
                    best = allele as u8;
                    best_count = counts[allele];
                }
            }
            best
        })
        .collect();

    Ok(minor)
}

/// Build the (timepoints × sites) minor-allele frequency matrix.
///
/// A site with no observed calls at some timepoint is an error, never NaN.
pub fn build_afs_series(
    partition: &TimepointPartition<'_>,
    minor_alleles: &[u8],
) -> Result<FrequencySeries, ScanError> {
    let mut rows = Vec::with_capacity(partition.n_timepoints());

    for (timepoint, block) in partition.blocks().iter().enumerate() {
        let mut row = Vec::with_capacity(minor_alleles.len());
        for (site, &minor) in minor_alleles.iter().enumerate() {
            let counts = count_alleles(block.site(site));
            let observed: usize = counts.iter().sum();
            if observed == 0 {
                return Err(ScanError::UndefinedFrequency { timepoint, site });
            }
            row.push(counts[minor as usize] as f64 / observed as f64);
        }
        rows.push(row);
    }

    Ok(FrequencySeries { rows })
}

/// Partition, resolve minor alleles and build the frequency series in one go
pub fn prepare_afs_series(
    matrix: &CallMatrix,
    chromosome_counts: &[usize],
) -> Result<FrequencySeries, ScanError> {
    let partition = matrix.partition(chromosome_counts)?;
    let minor_alleles = resolve_minor_alleles(&partition)?;
    build_afs_series(&partition, &minor_alleles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Locus;

    fn matrix(rows: Vec<Vec<u8>>) -> CallMatrix {
        let loci = (0..rows.len()).map(|i| Locus::new("1", i as u64)).collect();
        CallMatrix::new(loci, rows).unwrap()
    }

    #[test]
    fn test_minor_allele_from_last_timepoint() {
        // first timepoint favours allele 1, last timepoint favours allele 2
        let m = matrix(vec![vec![1, 1, 1, 0, 2, 2, 2, 1]]);
        let partition = m.partition(&[4, 4]).unwrap();
        assert_eq!(resolve_minor_alleles(&partition).unwrap(), vec![2]);
    }

    #[test]
    fn test_minor_allele_ties_and_reference() {
        let m = matrix(vec![
            vec![3, 2, 0, 0],            // tie between 2 and 3 -> 2
            vec![0, 0, 0, 0],            // no alternates -> 1
            vec![0, 0, 0, MISSING_CALL], // missing is not an allele
            vec![0, 0, 0, 5],
        ]);
        let partition = m.partition(&[4]).unwrap();
        let minor = resolve_minor_alleles(&partition).unwrap();
        assert_eq!(minor, vec![2, 1, 1, 5]);
        assert!(minor.iter().all(|&a| a != REFERENCE_ALLELE));
    }

    #[test]
    fn test_afs_series_values() {
        let m = matrix(vec![
            vec![0, 0, 0, 1, 0, 1, 1, 1],
            vec![0, MISSING_CALL, 2, 2, 2, 2, 0, 0],
        ]);
        let series = prepare_afs_series(&m, &[4, 4]).unwrap();

        assert_eq!(series.n_timepoints(), 2);
        assert_eq!(series.n_sites(), 2);
        assert_eq!(series.get(0, 0), 0.25);
        assert_eq!(series.get(1, 0), 0.75);
        // missing call drops out of the denominator
        assert!((series.get(0, 1) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(series.get(1, 1), 0.5);
        assert_eq!(series.site_series(0), vec![0.25, 0.75]);

        for row in series.rows() {
            assert!(row.iter().all(|f| (0.0..=1.0).contains(f)));
        }
    }

    #[test]
    fn test_zero_calls_is_an_error() {
        let m = matrix(vec![
            vec![0, 1, 1, 1],
            vec![MISSING_CALL, MISSING_CALL, 1, 0],
        ]);
        let err = prepare_afs_series(&m, &[2, 2]).unwrap_err();
        assert_eq!(err, ScanError::UndefinedFrequency { timepoint: 0, site: 1 });

        // an empty timepoint block has no calls at all
        let m = matrix(vec![vec![0, 1]]);
        let err = prepare_afs_series(&m, &[0, 2]).unwrap_err();
        assert_eq!(err, ScanError::UndefinedFrequency { timepoint: 0, site: 0 });
    }
}
