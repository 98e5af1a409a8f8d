// traits.rs - Capabilities supplied by the caller: classifiers and statistical tests

use crate::core::windows::WindowTensor;
use serde::{Deserialize, Serialize};

/// Class labels in probability-vector order
pub const CLASS_LABELS: [&str; 3] = ["Neut", "Hard", "Soft"];

/// Probabilities for (neutral, hard sweep, soft sweep)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassProbabilities(pub [f64; 3]);

impl ClassProbabilities {
    pub fn neutral(&self) -> f64 {
        self.0[0]
    }

    pub fn hard(&self) -> f64 {
        self.0[1]
    }

    pub fn soft(&self) -> f64 {
        self.0[2]
    }

    /// Index of the largest probability; the first maximum wins
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for i in 1..self.0.len() {
            if self.0[i] > self.0[best] {
                best = i;
            }
        }
        best
    }

    pub fn label(&self) -> &'static str {
        CLASS_LABELS[self.argmax()]
    }
}

/// Output of the frequency-increment test at one site
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub t_value: f64,
    pub p_value: f64,
}

impl FitResult {
    pub fn new(t_value: f64, p_value: f64) -> Self {
        Self { t_value, p_value }
    }

    /// `1 - p`, so larger means more significant
    pub fn inverse_p_value(&self) -> f64 {
        1.0 - self.p_value
    }
}

/// A pretrained classifier over window tensors.
///
/// Implementations must accept the window width and timepoint count they were
/// trained with; nothing here reshapes the tensor for them.
pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    fn classify(&self, window: &WindowTensor) -> Result<ClassProbabilities, String>;

    /// Classify several windows at once; must return one result per window, in order
    fn classify_batch(&self, windows: &[WindowTensor]) -> Result<Vec<ClassProbabilities>, String> {
        windows.iter().map(|w| self.classify(w)).collect()
    }
}

/// A statistical test over one site's allele-frequency time series
pub trait StatisticTest: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, series: &[f64], generations: &[u64]) -> Result<FitResult, String>;

    /// Evaluate several series at once; must return one result per series, in order
    fn evaluate_batch(
        &self,
        series: &[Vec<f64>],
        generations: &[u64],
    ) -> Result<Vec<FitResult>, String> {
        series.iter().map(|s| self.evaluate(s, generations)).collect()
    }
}

/// Adapts a closure into a [`Predictor`]
pub struct FnPredictor<F> {
    name: String,
    f: F,
}

impl<F> FnPredictor<F>
where
    F: Fn(&WindowTensor) -> Result<ClassProbabilities, String> + Send + Sync,
{
    pub fn new(name: &str, f: F) -> Self {
        Self {
            name: name.to_string(),
            f,
        }
    }
}

impl<F> Predictor for FnPredictor<F>
where
    F: Fn(&WindowTensor) -> Result<ClassProbabilities, String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, window: &WindowTensor) -> Result<ClassProbabilities, String> {
        (self.f)(window)
    }
}

/// Adapts a closure into a [`StatisticTest`]
pub struct FnStatistic<F> {
    name: String,
    f: F,
}

impl<F> FnStatistic<F>
where
    F: Fn(&[f64], &[u64]) -> Result<FitResult, String> + Send + Sync,
{
    pub fn new(name: &str, f: F) -> Self {
        Self {
            name: name.to_string(),
            f,
        }
    }
}

impl<F> StatisticTest for FnStatistic<F>
where
    F: Fn(&[f64], &[u64]) -> Result<FitResult, String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, series: &[f64], generations: &[u64]) -> Result<FitResult, String> {
        (self.f)(series, generations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_and_labels() {
        assert_eq!(ClassProbabilities([0.1, 0.7, 0.2]).label(), "Hard");
        assert_eq!(ClassProbabilities([0.1, 0.2, 0.7]).label(), "Soft");
        assert_eq!(ClassProbabilities([0.8, 0.1, 0.1]).argmax(), 0);
        // ties resolve to the first maximum
        assert_eq!(ClassProbabilities([0.4, 0.4, 0.2]).argmax(), 0);
        assert_eq!(ClassProbabilities([0.2, 0.4, 0.4]).argmax(), 1);
    }

    #[test]
    fn test_inverse_p_value() {
        let fit = FitResult::new(2.5, 0.05);
        assert!((fit.inverse_p_value() - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_default_batch_preserves_order() {
        let predictor = FnPredictor::new("first-cell", |w: &WindowTensor| {
            let v = w.rows()[0][0];
            Ok(ClassProbabilities([v, 1.0 - v, 0.0]))
        });
        let windows = vec![
            WindowTensor::from_rows(vec![vec![0.25]]),
            WindowTensor::from_rows(vec![vec![0.75]]),
        ];
        let out = predictor.classify_batch(&windows).unwrap();
        assert_eq!(out[0].neutral(), 0.25);
        assert_eq!(out[1].neutral(), 0.75);
        assert_eq!(predictor.name(), "first-cell");
    }
}
