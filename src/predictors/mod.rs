// mod.rs - Predictor and statistical test capabilities

pub mod external;
pub mod traits;

// Re-export main types for convenience
pub use external::{ExternalPredictor, ExternalStatistic};
pub use traits::{
    ClassProbabilities, FitResult, FnPredictor, FnStatistic, Predictor, StatisticTest,
    CLASS_LABELS,
};
