// pipeline.rs - Per-track run controller: build series, window, dispatch

use crate::core::alleles::{prepare_afs_series, FrequencySeries};
use crate::core::dispatch::{
    classify_windows, evaluate_sites, ClassificationOutput, LocusSeries, LocusWindow, ResultMap,
};
use crate::core::errors::ScanError;
use crate::core::haplotypes::HaplotypeSpectrumBuilder;
use crate::core::windows::{assemble_afs_window, WindowIndex};
use crate::data::CallMatrix;
use crate::predictors::{FitResult, Predictor, StatisticTest};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Instant;

/// Window width used by the published sweep classifiers
pub const DEFAULT_WINDOW_SIZE: usize = 51;

/// Windows sent to a predictor per call
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Settings shared by every track of a scan
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub window_size: usize,
    /// Chromosomes sampled at each timepoint, earliest first
    pub chromosome_counts: Vec<usize>,
    /// Generation timestamp of each timepoint (frequency-increment track only)
    pub generations: Vec<u64>,
    pub batch_size: usize,
    /// Draw progress bars
    pub progress: bool,
}

/// Caller-supplied predictors; a `None` track is skipped
pub struct TrackSet<'a> {
    pub afs: Option<&'a dyn Predictor>,
    pub hfs: Option<&'a dyn Predictor>,
    pub fit: Option<&'a dyn StatisticTest>,
    pub haplotypes: &'a dyn HaplotypeSpectrumBuilder,
}

/// Results of every track that ran
#[derive(Debug, Clone, Default)]
pub struct ScanOutputs {
    pub afs: Option<ClassificationOutput>,
    pub hfs: Option<ClassificationOutput>,
    pub fit: Option<ResultMap<FitResult>>,
    /// Allele-frequency series built for the AFS or FIT track
    pub series: Option<FrequencySeries>,
}

/// Progress bars of one or more tracks; concurrent tracks share a `MultiProgress`
struct TrackProgress {
    enabled: bool,
    multi: Option<MultiProgress>,
}

impl TrackProgress {
    fn standalone(enabled: bool) -> Self {
        Self {
            enabled,
            multi: None,
        }
    }

    fn shared(enabled: bool) -> Self {
        let multi = if enabled {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        Self {
            enabled,
            multi: Some(multi),
        }
    }

    fn bar(&self, len: usize, label: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {per_sec} ETA: {eta}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_prefix(label.to_string());
        match &self.multi {
            Some(multi) => multi.add(pb),
            None => pb,
        }
    }

    /// Print a line without tearing the bars still drawing
    fn println(&self, line: String) {
        match &self.multi {
            Some(multi) if self.enabled => multi.suspend(|| println!("{}", line)),
            _ => println!("{}", line),
        }
    }
}

/// Allele-frequency windows in ascending centre order
pub fn afs_windows<'a>(
    matrix: &'a CallMatrix,
    series: &'a FrequencySeries,
    index: WindowIndex,
) -> impl Iterator<Item = Result<LocusWindow, ScanError>> + 'a {
    index.into_iter().map(move |span| {
        Ok(LocusWindow {
            locus: matrix.loci[span.center].clone(),
            center: span.center,
            tensor: assemble_afs_window(series, span),
        })
    })
}

/// Haplotype-frequency windows in ascending centre order
pub fn hfs_windows<'a>(
    matrix: &'a CallMatrix,
    builder: &'a dyn HaplotypeSpectrumBuilder,
    chromosome_counts: &'a [usize],
    index: WindowIndex,
) -> impl Iterator<Item = Result<LocusWindow, ScanError>> + 'a {
    index.into_iter().map(move |span| {
        let tensor = builder.spectrum(matrix, span, chromosome_counts)?;
        Ok(LocusWindow {
            locus: matrix.loci[span.center].clone(),
            center: span.center,
            tensor,
        })
    })
}

/// Classify allele-frequency windows
pub fn run_afs_track(
    matrix: &CallMatrix,
    series: &FrequencySeries,
    settings: &ScanSettings,
    predictor: &dyn Predictor,
) -> Result<ClassificationOutput, ScanError> {
    let progress = TrackProgress::standalone(settings.progress);
    afs_track(matrix, series, settings, predictor, &progress)
}

fn afs_track(
    matrix: &CallMatrix,
    series: &FrequencySeries,
    settings: &ScanSettings,
    predictor: &dyn Predictor,
    progress: &TrackProgress,
) -> Result<ClassificationOutput, ScanError> {
    let index = WindowIndex::new(matrix.n_sites(), settings.window_size)?;
    let start = Instant::now();
    let pb = progress.bar(index.len(), "AFS");

    let output = classify_windows(
        afs_windows(matrix, series, index),
        predictor,
        settings.batch_size,
        index.midpoint_center(),
        &pb,
    )?;

    pb.finish_with_message("done");
    progress.println(format!(
        "✅ AFS track: {} windows classified by {} in {:.2}s",
        output.results.len(),
        predictor.name(),
        start.elapsed().as_secs_f64()
    ));
    Ok(output)
}

/// Classify haplotype-frequency windows
pub fn run_hfs_track(
    matrix: &CallMatrix,
    settings: &ScanSettings,
    predictor: &dyn Predictor,
    builder: &dyn HaplotypeSpectrumBuilder,
) -> Result<ClassificationOutput, ScanError> {
    let progress = TrackProgress::standalone(settings.progress);
    hfs_track(matrix, settings, predictor, builder, &progress)
}

fn hfs_track(
    matrix: &CallMatrix,
    settings: &ScanSettings,
    predictor: &dyn Predictor,
    builder: &dyn HaplotypeSpectrumBuilder,
    progress: &TrackProgress,
) -> Result<ClassificationOutput, ScanError> {
    let index = WindowIndex::new(matrix.n_sites(), settings.window_size)?;
    let start = Instant::now();
    let pb = progress.bar(index.len(), "HFS");

    let output = classify_windows(
        hfs_windows(matrix, builder, &settings.chromosome_counts, index),
        predictor,
        settings.batch_size,
        index.midpoint_center(),
        &pb,
    )?;

    pb.finish_with_message("done");
    progress.println(format!(
        "✅ HFS track: {} windows classified by {} ({} spectra) in {:.2}s",
        output.results.len(),
        predictor.name(),
        builder.name(),
        start.elapsed().as_secs_f64()
    ));
    Ok(output)
}

/// Run the frequency-increment test at every valid window centre
pub fn run_fit_track(
    matrix: &CallMatrix,
    series: &FrequencySeries,
    settings: &ScanSettings,
    test: &dyn StatisticTest,
) -> Result<ResultMap<FitResult>, ScanError> {
    let progress = TrackProgress::standalone(settings.progress);
    fit_track(matrix, series, settings, test, &progress)
}

fn fit_track(
    matrix: &CallMatrix,
    series: &FrequencySeries,
    settings: &ScanSettings,
    test: &dyn StatisticTest,
    progress: &TrackProgress,
) -> Result<ResultMap<FitResult>, ScanError> {
    if settings.generations.len() != series.n_timepoints() {
        return Err(ScanError::GenerationMismatch {
            expected: series.n_timepoints(),
            found: settings.generations.len(),
        });
    }

    let index = WindowIndex::new(matrix.n_sites(), settings.window_size)?;
    let start = Instant::now();
    let pb = progress.bar(index.len(), "FIT");

    let sites = index.into_iter().map(|span| LocusSeries {
        locus: matrix.loci[span.center].clone(),
        center: span.center,
        series: series.site_series(span.center),
    });
    let results = evaluate_sites(sites, test, &settings.generations, settings.batch_size, &pb)?;

    pb.finish_with_message("done");
    progress.println(format!(
        "✅ FIT track: {} sites evaluated by {} in {:.2}s",
        results.len(),
        test.name(),
        start.elapsed().as_secs_f64()
    ));
    Ok(results)
}

/// Run every configured track.
///
/// The allele-frequency series is built once, before any window is produced,
/// so an undefined frequency stops the scan up front. Tracks only share
/// read-only inputs and run concurrently on the rayon pool, drawing their
/// bars on one shared `MultiProgress`. The series is handed back in
/// [`ScanOutputs::series`] for window export.
pub fn run_scan(
    matrix: &CallMatrix,
    settings: &ScanSettings,
    tracks: &TrackSet<'_>,
) -> Result<ScanOutputs, ScanError> {
    WindowIndex::new(matrix.n_sites(), settings.window_size)?;

    let series = if tracks.afs.is_some() || tracks.fit.is_some() {
        Some(prepare_afs_series(matrix, &settings.chromosome_counts)?)
    } else {
        matrix.partition(&settings.chromosome_counts)?;
        None
    };

    let progress = TrackProgress::shared(settings.progress);
    let (afs, (hfs, fit)) = rayon::join(
        || match (tracks.afs, series.as_ref()) {
            (Some(p), Some(s)) => Some(afs_track(matrix, s, settings, p, &progress)),
            _ => None,
        },
        || {
            rayon::join(
                || {
                    tracks
                        .hfs
                        .map(|p| hfs_track(matrix, settings, p, tracks.haplotypes, &progress))
                },
                || match (tracks.fit, series.as_ref()) {
                    (Some(t), Some(s)) => Some(fit_track(matrix, s, settings, t, &progress)),
                    _ => None,
                },
            )
        },
    );

    Ok(ScanOutputs {
        afs: afs.transpose()?,
        hfs: hfs.transpose()?,
        fit: fit.transpose()?,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::haplotypes::RankedHaplotypeSpectrum;
    use crate::data::calls::MISSING_CALL;
    use crate::data::Locus;
    use crate::predictors::{ClassProbabilities, FnPredictor, FnStatistic};
    use crate::core::windows::WindowTensor;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn synthetic_matrix(n_sites: usize, n_chromosomes: usize, mutation_types: &[u32]) -> CallMatrix {
        let loci = (0..n_sites)
            .map(|i| {
                let pos = 1000 + 10 * i as u64;
                match mutation_types.get(i) {
                    Some(&mt) => Locus::with_mutation_type("1", pos, mt),
                    None => Locus::new("1", pos),
                }
            })
            .collect();
        let calls = (0..n_sites)
            .map(|s| {
                (0..n_chromosomes)
                    .map(|c| ((s * 7 + c * 3) % 3 == 0) as u8)
                    .collect()
            })
            .collect();
        CallMatrix::new(loci, calls).unwrap()
    }

    fn settings(window_size: usize, counts: Vec<usize>) -> ScanSettings {
        let generations = (0..counts.len() as u64).map(|i| 10060 + 10 * i).collect();
        ScanSettings {
            window_size,
            chromosome_counts: counts,
            generations,
            batch_size: 4,
            progress: false,
        }
    }

    fn shape_predictor() -> impl Predictor {
        FnPredictor::new("shape", |w: &WindowTensor| {
            let (t, c) = w.shape();
            Ok(ClassProbabilities([t as f64, c as f64, 0.0]))
        })
    }

    #[test]
    fn test_ten_sites_three_timepoints() {
        let matrix = synthetic_matrix(10, 12, &[]);
        let settings = settings(5, vec![4, 4, 4]);
        let series = prepare_afs_series(&matrix, &settings.chromosome_counts).unwrap();

        let output = run_afs_track(&matrix, &series, &settings, &shape_predictor()).unwrap();

        assert_eq!(output.results.len(), 6);
        let centers: Vec<u64> = output.results.iter().map(|(l, _)| l.position).collect();
        let expected: Vec<u64> = (2..8).map(|i| 1000 + 10 * i).collect();
        assert_eq!(centers, expected);

        for (_, probs) in output.results.iter() {
            assert_eq!(probs.0, [3.0, 5.0, 0.0]);
        }

        let keys: HashSet<_> = output.results.iter().map(|(l, _)| l.clone()).collect();
        assert_eq!(keys.len(), 6);
        assert!(keys.iter().all(|l| matrix.loci.contains(l)));
    }

    #[test]
    fn test_zero_calls_stops_before_any_window() {
        let mut rows: Vec<Vec<u8>> = (0..10).map(|_| vec![0, 1, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1]).collect();
        for c in 4..8 {
            rows[3][c] = MISSING_CALL;
        }
        let loci = (0..10).map(|i| Locus::new("1", i as u64)).collect();
        let matrix = CallMatrix::new(loci, rows).unwrap();

        let calls = AtomicUsize::new(0);
        let counting = FnPredictor::new("counting", |_: &WindowTensor| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ClassProbabilities([1.0, 0.0, 0.0]))
        });
        let tracks = TrackSet {
            afs: Some(&counting),
            hfs: None,
            fit: None,
            haplotypes: &RankedHaplotypeSpectrum,
        };

        let err = run_scan(&matrix, &settings(5, vec![4, 4, 4]), &tracks).unwrap_err();
        assert_eq!(err, ScanError::UndefinedFrequency { timepoint: 1, site: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_capture_keeps_last_selected_site() {
        let mut mutation_types = vec![1u32; 100];
        mutation_types[10] = 2;
        mutation_types[40] = 2;
        let matrix = synthetic_matrix(100, 8, &mutation_types);
        let settings = settings(51, vec![4, 4]);
        let series = prepare_afs_series(&matrix, &settings.chromosome_counts).unwrap();

        let output = run_afs_track(&matrix, &series, &settings, &shape_predictor()).unwrap();
        let captured = output.capture.unwrap();

        assert_eq!(captured.center, 40);
        assert_eq!(captured.locus, matrix.loci[40]);
        assert_eq!(captured.tensor, assemble_afs_window(&series, WindowIndex::new(100, 51).unwrap().span(40)));
    }

    #[test]
    fn test_hfs_track_shapes() {
        let matrix = synthetic_matrix(10, 12, &[]);
        let settings = settings(5, vec![4, 4, 4]);

        let output =
            run_hfs_track(&matrix, &settings, &shape_predictor(), &RankedHaplotypeSpectrum).unwrap();

        assert_eq!(output.results.len(), 6);
        for (_, probs) in output.results.iter() {
            // padded to the total number of chromosomes
            assert_eq!(probs.0, [3.0, 12.0, 0.0]);
        }
        assert_eq!(output.capture.unwrap().center, 3);
    }

    #[test]
    fn test_full_scan_matches_individual_tracks() {
        let matrix = synthetic_matrix(30, 9, &[]);
        let settings = settings(11, vec![3, 3, 3]);
        let fit = FnStatistic::new("delta", |s: &[f64], _: &[u64]| {
            let delta = s[s.len() - 1] - s[0];
            Ok(FitResult::new(delta, 1.0 - delta.abs()))
        });
        let afs = shape_predictor();
        let hfs = shape_predictor();
        let tracks = TrackSet {
            afs: Some(&afs),
            hfs: Some(&hfs),
            fit: Some(&fit),
            haplotypes: &RankedHaplotypeSpectrum,
        };

        let outputs = run_scan(&matrix, &settings, &tracks).unwrap();
        let series = prepare_afs_series(&matrix, &settings.chromosome_counts).unwrap();
        let fit_alone = run_fit_track(&matrix, &series, &settings, &fit).unwrap();

        let n_centers = 30 - 2 * 5;
        assert_eq!(outputs.afs.as_ref().unwrap().results.len(), n_centers);
        assert_eq!(outputs.hfs.as_ref().unwrap().results.len(), n_centers);

        let combined: Vec<_> = outputs.fit.unwrap().iter().cloned().collect();
        let alone: Vec<_> = fit_alone.iter().cloned().collect();
        assert_eq!(combined.len(), n_centers);
        assert_eq!(combined, alone);
    }

    #[test]
    fn test_shared_progress_bars() {
        let shared = TrackProgress::shared(true);
        let afs = shared.bar(10, "AFS");
        let hfs = shared.bar(20, "HFS");
        assert_eq!(afs.length(), Some(10));
        assert_eq!(hfs.length(), Some(20));
        assert_eq!(hfs.prefix(), "HFS");

        assert!(TrackProgress::shared(false).bar(10, "FIT").is_hidden());
        assert!(TrackProgress::standalone(false).bar(10, "FIT").is_hidden());
    }

    #[test]
    fn test_scan_with_progress_drawn() {
        let matrix = synthetic_matrix(20, 6, &[]);
        let mut settings = settings(5, vec![2, 2, 2]);
        settings.progress = true;
        let afs = shape_predictor();
        let hfs = shape_predictor();
        let tracks = TrackSet {
            afs: Some(&afs),
            hfs: Some(&hfs),
            fit: None,
            haplotypes: &RankedHaplotypeSpectrum,
        };

        let outputs = run_scan(&matrix, &settings, &tracks).unwrap();
        assert_eq!(outputs.afs.unwrap().results.len(), 16);
        assert_eq!(outputs.hfs.unwrap().results.len(), 16);
    }

    #[test]
    fn test_scan_hands_back_series() {
        let matrix = synthetic_matrix(12, 6, &[]);
        let settings = settings(5, vec![2, 2, 2]);
        let afs = shape_predictor();
        let hfs = shape_predictor();

        let with_afs = TrackSet {
            afs: Some(&afs),
            hfs: None,
            fit: None,
            haplotypes: &RankedHaplotypeSpectrum,
        };
        let outputs = run_scan(&matrix, &settings, &with_afs).unwrap();
        let expected = prepare_afs_series(&matrix, &settings.chromosome_counts).unwrap();
        assert_eq!(outputs.series, Some(expected));
        assert!(outputs.hfs.is_none());

        let hfs_only = TrackSet {
            afs: None,
            hfs: Some(&hfs),
            fit: None,
            haplotypes: &RankedHaplotypeSpectrum,
        };
        let outputs = run_scan(&matrix, &settings, &hfs_only).unwrap();
        assert!(outputs.series.is_none());
        assert!(outputs.afs.is_none());
        assert_eq!(outputs.hfs.unwrap().results.len(), 8);
    }

    #[test]
    fn test_generation_mismatch() {
        let matrix = synthetic_matrix(10, 6, &[]);
        let mut settings = settings(3, vec![2, 2, 2]);
        settings.generations = vec![1, 2];
        let series = prepare_afs_series(&matrix, &settings.chromosome_counts).unwrap();
        let fit = FnStatistic::new("noop", |_: &[f64], _: &[u64]| Ok(FitResult::new(0.0, 1.0)));

        let err = run_fit_track(&matrix, &series, &settings, &fit).unwrap_err();
        assert_eq!(err, ScanError::GenerationMismatch { expected: 3, found: 2 });
    }

    #[test]
    fn test_too_few_sites_is_not_an_error() {
        let matrix = synthetic_matrix(4, 4, &[]);
        let settings = settings(5, vec![2, 2]);
        let series = prepare_afs_series(&matrix, &settings.chromosome_counts).unwrap();

        let output = run_afs_track(&matrix, &series, &settings, &shape_predictor()).unwrap();
        assert!(output.results.is_empty());
        assert!(output.capture.is_none());
    }
}
