// windows.rs - Window index generation and per-window tensor assembly

use crate::core::alleles::FrequencySeries;
use crate::core::errors::ScanError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// A (timepoints × columns) matrix handed to a predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowTensor {
    rows: Vec<Vec<f64>>,
}

impl WindowTensor {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// (timepoints, columns)
    pub fn shape(&self) -> (usize, usize) {
        (
            self.rows.len(),
            self.rows.first().map(|r| r.len()).unwrap_or(0),
        )
    }
}

/// Site-index span of one window; `end` is inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpan {
    pub center: usize,
    pub start: usize,
    pub end: usize,
}

impl WindowSpan {
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Valid window centres for `n_sites` sites and an odd window width.
///
/// Centres closer than `width / 2` to either end are excluded. Iterating is
/// lazy and can be restarted since the index itself is `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowIndex {
    n_sites: usize,
    width: usize,
}

impl WindowIndex {
    pub fn new(n_sites: usize, width: usize) -> Result<Self, ScanError> {
        if width == 0 || width % 2 == 0 {
            return Err(ScanError::InvalidWindowWidth(width));
        }
        Ok(Self { n_sites, width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn half(&self) -> usize {
        self.width / 2
    }

    /// Half-open range of valid centres; empty when the sequence is too short
    pub fn centers(&self) -> std::ops::Range<usize> {
        let half = self.half();
        half..self.n_sites.saturating_sub(half).max(half)
    }

    pub fn len(&self) -> usize {
        self.centers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn span(&self, center: usize) -> WindowSpan {
        let half = self.half();
        WindowSpan {
            center,
            start: center - half,
            end: center + half,
        }
    }

    /// Centre that receives the diagnostic capture when no selected site
    /// overrides it: half the number of centres, clamped to the first centre.
    pub fn midpoint_center(&self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        Some((self.len() / 2).max(self.half()))
    }

    pub fn iter(&self) -> WindowIter {
        WindowIter {
            index: *self,
            next: self.centers(),
        }
    }
}

impl IntoIterator for WindowIndex {
    type Item = WindowSpan;
    type IntoIter = WindowIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over [`WindowSpan`]s in ascending centre order
#[derive(Debug, Clone)]
pub struct WindowIter {
    index: WindowIndex,
    next: std::ops::Range<usize>,
}

impl Iterator for WindowIter {
    type Item = WindowSpan;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.next().map(|c| self.index.span(c))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.next.size_hint()
    }
}

impl ExactSizeIterator for WindowIter {}

/// Slice every timepoint of the series at the window's sites
pub fn assemble_afs_window(series: &FrequencySeries, span: WindowSpan) -> WindowTensor {
    let rows = series
        .rows()
        .iter()
        .map(|row| row[span.indices()].to_vec())
        .collect();
    WindowTensor { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_count_formula() {
        for n in 0..40 {
            for w in [1usize, 3, 5, 11, 51] {
                let index = WindowIndex::new(n, w).unwrap();
                let expected = n.saturating_sub(2 * (w / 2));
                assert_eq!(index.len(), expected, "n={} w={}", n, w);
                assert_eq!(index.iter().count(), expected);

                for span in index.iter() {
                    assert_eq!(span.width(), w);
                    assert!(span.end < n);
                    assert_eq!(span.indices().count(), w);
                }
            }
        }
    }

    #[test]
    fn test_ascending_and_restartable() {
        let index = WindowIndex::new(10, 5).unwrap();
        let first: Vec<_> = index.iter().map(|s| s.center).collect();
        let second: Vec<_> = index.into_iter().map(|s| s.center).collect();
        assert_eq!(first, vec![2, 3, 4, 5, 6, 7]);
        assert_eq!(first, second);
        assert_eq!(index.span(2), WindowSpan { center: 2, start: 0, end: 4 });
    }

    #[test]
    fn test_invalid_width() {
        assert_eq!(WindowIndex::new(10, 4).unwrap_err(), ScanError::InvalidWindowWidth(4));
        assert_eq!(WindowIndex::new(10, 0).unwrap_err(), ScanError::InvalidWindowWidth(0));
    }

    #[test]
    fn test_midpoint_center() {
        assert_eq!(WindowIndex::new(100, 51).unwrap().midpoint_center(), Some(25));
        assert_eq!(WindowIndex::new(10, 5).unwrap().midpoint_center(), Some(3));
        // fewer centres than the buffer: clamp to the first centre
        assert_eq!(WindowIndex::new(60, 51).unwrap().midpoint_center(), Some(25));
        assert_eq!(WindowIndex::new(50, 51).unwrap().midpoint_center(), None);
    }

    #[test]
    fn test_assemble_afs_window() {
        let series = FrequencySeries::from_rows(vec![
            (0..10).map(|i| i as f64 / 10.0).collect(),
            (0..10).map(|i| (10 - i) as f64 / 10.0).collect(),
        ]);
        let index = WindowIndex::new(10, 3).unwrap();
        let tensor = assemble_afs_window(&series, index.span(4));

        assert_eq!(tensor.shape(), (2, 3));
        assert_eq!(tensor.rows()[0], vec![0.3, 0.4, 0.5]);
        assert_eq!(tensor.rows()[1], vec![0.7, 0.6, 0.5]);
    }
}
