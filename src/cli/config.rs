// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub input: Option<String>,
    pub output_dir: Option<String>,

    // Sampling design
    pub sample_sizes: Option<Vec<usize>>,
    pub ploidy: Option<usize>,
    pub generations: Option<Vec<u64>>,
    pub gen_start: Option<u64>,
    pub gen_step: Option<u64>,

    // Scan settings
    pub window_size: Option<usize>,
    pub batch_size: Option<usize>,
    pub threads: Option<usize>,

    // Models
    pub afs_model: Option<String>,
    pub hfs_model: Option<String>,
    pub fit_command: Option<String>,

    // Site filtering
    pub region: Option<String>,
    pub include_chroms: Option<String>,

    // Flags
    pub export_windows: Option<bool>,
    pub no_progress: Option<bool>,
    pub dry_run: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# timesweep.toml - Configuration file for timesweep
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Call table: CHROM, POS, optional MT, one column per sampled chromosome
input = "/path/to/calls.tsv"

# Output directory (defaults to the directory of the input file)
output_dir = "results"

# =============================================================================
# SAMPLING DESIGN
# =============================================================================

# Individuals sampled per timepoint, earliest first
sample_sizes = [10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10]

# Chromosomes per individual
ploidy = 2

# Generation of every timepoint, used by the frequency-increment test.
# When omitted: gen_start + i * gen_step
# generations = [10060, 10070, 10080]
gen_start = 10060
gen_step = 10

# =============================================================================
# SCAN SETTINGS
# =============================================================================

# Window width in sites (odd, must match the trained models)
window_size = 51

# Windows sent to a model per invocation
batch_size = 256

# Number of threads (omit for auto-detection)
# threads = 8

# =============================================================================
# MODELS
# =============================================================================
# Each command reads a JSON request on stdin and writes JSON on stdout.
# A track without a command is skipped.

afs_model = "python3 predict.py --model models/afs.keras"
hfs_model = "python3 predict.py --model models/hfs.keras"
# fit_command = "python3 fit.py"

# =============================================================================
# SITE FILTERING
# =============================================================================

# Only scan one chromosome or CHROM:START-END
# region = "2L:1-1000000"

# Include only chromosomes matching regex pattern
# include_chroms = "^chr[0-9]+$"

# =============================================================================
# FLAGS
# =============================================================================

# Also write every window tensor as JSON lines
export_windows = false

# Hide progress bars
no_progress = false

# Validate inputs without computation (dry run)
dry_run = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert_eq!(config.sample_sizes.as_ref().map(|s| s.len()), Some(20));
        assert_eq!(config.ploidy, Some(2));
        assert_eq!(config.window_size, Some(51));
        assert_eq!(config.gen_start, Some(10060));
        assert!(config.generations.is_none());
        assert!(config.fit_command.is_none());
        assert_eq!(config.export_windows, Some(false));
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("timesweep_config_{}.toml", std::process::id()));
        let config = Config {
            input: Some("calls.tsv".to_string()),
            generations: Some(vec![10, 20, 30]),
            ..Config::new()
        };
        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
