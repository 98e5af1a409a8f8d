// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};

fn join_list<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.input.is_none() {
            self.input = config.input;
        }
        if self.output_dir.is_none() {
            self.output_dir = config.output_dir;
        }

        // Sampling design
        if self.sample_sizes.is_none() {
            self.sample_sizes = config.sample_sizes.map(|s| join_list(&s));
        }
        if self.generations.is_none() {
            self.generations = config.generations.map(|g| join_list(&g));
        }

        // Defaults only, not explicit CLI values
        if let (2, Some(ploidy)) = (self.ploidy, config.ploidy) {
            self.ploidy = ploidy;
        }
        if let (10060, Some(start)) = (self.gen_start, config.gen_start) {
            self.gen_start = start;
        }
        if let (10, Some(step)) = (self.gen_step, config.gen_step) {
            self.gen_step = step;
        }
        if let (51, Some(width)) = (self.window_size, config.window_size) {
            self.window_size = width;
        }
        if let (256, Some(batch)) = (self.batch_size, config.batch_size) {
            self.batch_size = batch;
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }

        // Models
        if self.afs_model.is_none() {
            self.afs_model = config.afs_model;
        }
        if self.hfs_model.is_none() {
            self.hfs_model = config.hfs_model;
        }
        if self.fit_command.is_none() {
            self.fit_command = config.fit_command;
        }

        // Site filtering
        if self.region.is_none() {
            self.region = config.region;
        }
        if self.include_chroms.is_none() {
            self.include_chroms = config.include_chroms;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.export_windows && config.export_windows.unwrap_or(false) {
            self.export_windows = true;
        }
        if !self.no_progress && config.no_progress.unwrap_or(false) {
            self.no_progress = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
