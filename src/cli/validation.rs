// validation.rs - Input validation utilities

use crate::cli::args::Args;
use crate::core::windows::WindowIndex;
use crate::data::chromosome_counts;
use regex::Regex;
use std::path::{Path, PathBuf};

pub struct ValidationResult {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub sample_sizes: Vec<usize>,
    pub chromosome_counts: Vec<usize>,
    pub generations: Vec<u64>,
    pub include_chroms_regex: Option<Regex>,
}

/// Parse a comma-separated list such as `10,10,10`
fn parse_list<T: std::str::FromStr>(value: &str, what: &str) -> Result<Vec<T>, String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<T>()
                .map_err(|_| format!("Invalid {} value '{}'", what, s))
        })
        .collect()
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    // Input file
    let input = args.input.as_ref().ok_or("--input is required")?;
    let input_path = PathBuf::from(input);
    if !input_path.is_file() {
        return Err(format!("Input file '{}' does not exist", input));
    }

    // Sampling design
    let sample_sizes: Vec<usize> = parse_list(
        args.sample_sizes
            .as_deref()
            .ok_or("--sample-sizes is required")?,
        "sample size",
    )?;
    if sample_sizes.is_empty() {
        return Err("--sample-sizes must list at least one timepoint".to_string());
    }
    if sample_sizes.iter().any(|&s| s == 0) {
        return Err("Every timepoint must sample at least one individual".to_string());
    }
    if args.ploidy == 0 {
        return Err("Ploidy must be at least 1".to_string());
    }
    let chromosome_counts = chromosome_counts(&sample_sizes, args.ploidy);

    // Generations
    let generations: Vec<u64> = match &args.generations {
        Some(list) => parse_list(list, "generation")?,
        None => (0..sample_sizes.len() as u64)
            .map(|i| args.gen_start + i * args.gen_step)
            .collect(),
    };
    if generations.len() != sample_sizes.len() {
        return Err(format!(
            "{} generations given for {} timepoints",
            generations.len(),
            sample_sizes.len()
        ));
    }

    // Scan settings
    WindowIndex::new(0, args.window_size).map_err(|e| e.to_string())?;
    if args.batch_size == 0 {
        return Err("Batch size must be at least 1".to_string());
    }

    // At least one track, unless only statistics are requested
    let no_track =
        args.afs_model.is_none() && args.hfs_model.is_none() && args.fit_command.is_none();
    if no_track && !args.stats_only {
        return Err(
            "No track configured: set at least one of --afs-model, --hfs-model, --fit-command"
                .to_string(),
        );
    }

    // Compile regex patterns
    let include_chroms_regex = if let Some(pattern) = &args.include_chroms {
        Some(Regex::new(pattern).map_err(|e| format!("Invalid include_chroms regex: {}", e))?)
    } else {
        None
    };

    let output_dir = match &args.output_dir {
        Some(dir) => PathBuf::from(dir),
        None => input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    Ok(ValidationResult {
        input_path,
        output_dir,
        sample_sizes,
        chromosome_counts,
        generations,
        include_chroms_regex,
    })
}
