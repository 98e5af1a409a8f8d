// dispatch.rs - Feed window streams to predictors and collect per-locus results

use crate::core::errors::ScanError;
use crate::core::windows::WindowTensor;
use crate::data::Locus;
use crate::predictors::{ClassProbabilities, FitResult, Predictor, StatisticTest};
use indicatif::ProgressBar;
use std::collections::HashMap;

/// One assembled window, tagged with the locus at its centre
#[derive(Debug, Clone, PartialEq)]
pub struct LocusWindow {
    pub locus: Locus,
    pub center: usize,
    pub tensor: WindowTensor,
}

/// One site's allele-frequency time series for the statistic track
#[derive(Debug, Clone, PartialEq)]
pub struct LocusSeries {
    pub locus: Locus,
    pub center: usize,
    pub series: Vec<f64>,
}

/// Results keyed by locus, kept in window-traversal order
#[derive(Debug, Clone)]
pub struct ResultMap<T> {
    entries: Vec<(Locus, T)>,
    /// Position of each locus in `entries`
    index: HashMap<Locus, usize>,
}

impl<T> Default for ResultMap<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> ResultMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locus: Locus, value: T) -> Result<(), ScanError> {
        if self.index.contains_key(&locus) {
            return Err(ScanError::DuplicateLocus(locus));
        }
        self.index.insert(locus.clone(), self.entries.len());
        self.entries.push((locus, value));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, locus: &Locus) -> bool {
        self.index.contains_key(locus)
    }

    pub fn get(&self, locus: &Locus) -> Option<&T> {
        self.index.get(locus).map(|&i| &self.entries[i].1)
    }

    /// Entries in traversal order
    pub fn iter(&self) -> impl Iterator<Item = &(Locus, T)> {
        self.entries.iter()
    }

    /// Entries sorted by `(chrom, position)`; ties keep traversal order
    pub fn sorted(&self) -> Vec<&(Locus, T)> {
        let mut rows: Vec<_> = self.entries.iter().collect();
        rows.sort_by(|(a, _), (b, _)| a.sort_key().cmp(&b.sort_key()));
        rows
    }
}

/// Window kept for diagnostic plotting
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedWindow {
    pub locus: Locus,
    pub center: usize,
    pub tensor: WindowTensor,
}

/// Fold accumulator selecting the diagnostic window of a track.
///
/// A window replaces the held one when its locus carries the selected-site
/// marker or when it sits at the midpoint centre. The last match in traversal
/// order wins.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticCapture {
    midpoint_center: Option<usize>,
    captured: Option<CapturedWindow>,
}

impl DiagnosticCapture {
    pub fn new(midpoint_center: Option<usize>) -> Self {
        Self {
            midpoint_center,
            captured: None,
        }
    }

    pub fn matches(&self, window: &LocusWindow) -> bool {
        window.locus.is_selected() || Some(window.center) == self.midpoint_center
    }

    pub fn observe(self, window: &LocusWindow) -> Self {
        if self.matches(window) {
            Self {
                midpoint_center: self.midpoint_center,
                captured: Some(CapturedWindow {
                    locus: window.locus.clone(),
                    center: window.center,
                    tensor: window.tensor.clone(),
                }),
            }
        } else {
            self
        }
    }

    pub fn captured(&self) -> Option<&CapturedWindow> {
        self.captured.as_ref()
    }

    pub fn finish(self) -> Option<CapturedWindow> {
        self.captured
    }
}

/// Results of one classification track
#[derive(Debug, Clone)]
pub struct ClassificationOutput {
    pub results: ResultMap<ClassProbabilities>,
    pub capture: Option<CapturedWindow>,
}

/// Classify every window of a stream, `batch_size` windows per predictor call.
///
/// Exactly one result is recorded per window. Any predictor error aborts the
/// whole track.
pub fn classify_windows<I>(
    windows: I,
    predictor: &dyn Predictor,
    batch_size: usize,
    midpoint_center: Option<usize>,
    pb: &ProgressBar,
) -> Result<ClassificationOutput, ScanError>
where
    I: IntoIterator<Item = Result<LocusWindow, ScanError>>,
{
    let batch_size = batch_size.max(1);
    let mut results = ResultMap::new();
    let mut capture = DiagnosticCapture::new(midpoint_center);
    let mut batch: Vec<LocusWindow> = Vec::with_capacity(batch_size);

    for window in windows {
        let window = window?;
        capture = capture.observe(&window);
        batch.push(window);
        if batch.len() == batch_size {
            flush_class_batch(&mut batch, predictor, &mut results)?;
            pb.inc(batch_size as u64);
        }
    }
    if !batch.is_empty() {
        let n = batch.len();
        flush_class_batch(&mut batch, predictor, &mut results)?;
        pb.inc(n as u64);
    }

    Ok(ClassificationOutput {
        results,
        capture: capture.finish(),
    })
}

fn flush_class_batch(
    batch: &mut Vec<LocusWindow>,
    predictor: &dyn Predictor,
    results: &mut ResultMap<ClassProbabilities>,
) -> Result<(), ScanError> {
    let (loci, tensors): (Vec<Locus>, Vec<WindowTensor>) =
        batch.drain(..).map(|w| (w.locus, w.tensor)).unzip();

    let probs = predictor
        .classify_batch(&tensors)
        .map_err(|message| ScanError::Predictor {
            locus: loci[0].clone(),
            message,
        })?;

    if probs.len() != loci.len() {
        return Err(ScanError::Predictor {
            locus: loci[0].clone(),
            message: format!(
                "{} returned {} predictions for a batch of {}",
                predictor.name(),
                probs.len(),
                loci.len()
            ),
        });
    }

    for (locus, p) in loci.into_iter().zip(probs) {
        results.insert(locus, p)?;
    }
    Ok(())
}

/// Run the statistic on every site series, `batch_size` sites per call
pub fn evaluate_sites<I>(
    sites: I,
    test: &dyn StatisticTest,
    generations: &[u64],
    batch_size: usize,
    pb: &ProgressBar,
) -> Result<ResultMap<FitResult>, ScanError>
where
    I: IntoIterator<Item = LocusSeries>,
{
    let batch_size = batch_size.max(1);
    let mut results = ResultMap::new();
    let mut batch: Vec<LocusSeries> = Vec::with_capacity(batch_size);

    for site in sites {
        if site.series.len() != generations.len() {
            return Err(ScanError::GenerationMismatch {
                expected: site.series.len(),
                found: generations.len(),
            });
        }
        batch.push(site);
        if batch.len() == batch_size {
            flush_fit_batch(&mut batch, test, generations, &mut results)?;
            pb.inc(batch_size as u64);
        }
    }
    if !batch.is_empty() {
        let n = batch.len();
        flush_fit_batch(&mut batch, test, generations, &mut results)?;
        pb.inc(n as u64);
    }

    Ok(results)
}

fn flush_fit_batch(
    batch: &mut Vec<LocusSeries>,
    test: &dyn StatisticTest,
    generations: &[u64],
    results: &mut ResultMap<FitResult>,
) -> Result<(), ScanError> {
    let (loci, series): (Vec<Locus>, Vec<Vec<f64>>) =
        batch.drain(..).map(|s| (s.locus, s.series)).unzip();

    let fits = test
        .evaluate_batch(&series, generations)
        .map_err(|message| ScanError::Predictor {
            locus: loci[0].clone(),
            message,
        })?;

    if fits.len() != loci.len() {
        return Err(ScanError::Predictor {
            locus: loci[0].clone(),
            message: format!(
                "{} returned {} results for a batch of {}",
                test.name(),
                fits.len(),
                loci.len()
            ),
        });
    }

    for (locus, fit) in loci.into_iter().zip(fits) {
        results.insert(locus, fit)?;
    }
    Ok(())
}
