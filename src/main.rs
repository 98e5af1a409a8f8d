// main.rs - CLI entry point

use std::time::Instant;
use timesweep::cli::Config;
use timesweep::core::pipeline::{afs_windows, hfs_windows};
use timesweep::output::{
    write_class_report, write_diagnostic, write_fit_report, write_window_export, AFS_DIAGNOSTIC,
    AFS_PREDICTIONS, AFS_WINDOWS, FIT_PREDICTIONS, HFS_DIAGNOSTIC, HFS_PREDICTIONS, HFS_WINDOWS,
};
use timesweep::prelude::*;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let total_start = Instant::now();
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    let validation = validate_args(&args)?;

    println!("🚀 timesweep v{}", env!("CARGO_PKG_VERSION"));

    // Configure thread pool
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        println!("🧵 Threads: {}", n);
    } else {
        let num_threads = rayon::current_num_threads();
        println!("🧵 Threads: {} (auto-detected)", num_threads);
    }

    // Load call table
    println!("📊 Loading call table: {}", validation.input_path.display());
    let options = LoadOptions {
        region: args.region.clone(),
        include_chroms: validation.include_chroms_regex.clone(),
    };
    let matrix = load_call_table(&validation.input_path, &options)?;
    matrix.print_matrix_statistics("loaded");

    let partition = matrix
        .partition(&validation.chromosome_counts)
        .map_err(|e| e.to_string())?;
    println!(
        "⏱️  Timepoints: {} (chromosomes per timepoint: {:?})",
        partition.n_timepoints(),
        validation.chromosome_counts
    );

    let index = WindowIndex::new(matrix.n_sites(), args.window_size).map_err(|e| e.to_string())?;
    println!(
        "🪟 Window: {} sites, {} valid centres",
        args.window_size,
        index.len()
    );

    if args.stats_only {
        println!("\n✅ Statistics analysis completed");
        return Ok(());
    }

    // Build the configured tracks
    let afs_model = args
        .afs_model
        .as_deref()
        .map(|c| ExternalPredictor::from_command("afs", c))
        .transpose()?;
    let hfs_model = args
        .hfs_model
        .as_deref()
        .map(|c| ExternalPredictor::from_command("hfs", c))
        .transpose()?;
    let fit_test = args
        .fit_command
        .as_deref()
        .map(|c| ExternalStatistic::from_command("fit", c))
        .transpose()?;

    for (label, configured) in [
        ("AFS", afs_model.is_some()),
        ("HFS", hfs_model.is_some()),
        ("FIT", fit_test.is_some()),
    ] {
        if configured {
            println!("🧬 {} track: enabled", label);
        } else {
            println!("⚠️  {} track: no command configured, skipping", label);
        }
    }

    if args.dry_run {
        println!("✅ Dry run completed successfully");
        println!(
            "📊 Final matrix: {} sites × {} chromosomes",
            matrix.n_sites(),
            matrix.n_chromosomes()
        );
        return Ok(());
    }

    let settings = ScanSettings {
        window_size: args.window_size,
        chromosome_counts: validation.chromosome_counts.clone(),
        generations: validation.generations.clone(),
        batch_size: args.batch_size,
        progress: !args.no_progress,
    };
    let tracks = TrackSet {
        afs: afs_model.as_ref().map(|p| p as &dyn Predictor),
        hfs: hfs_model.as_ref().map(|p| p as &dyn Predictor),
        fit: fit_test.as_ref().map(|t| t as &dyn StatisticTest),
        haplotypes: &RankedHaplotypeSpectrum,
    };

    println!("\n🔄 Scanning...");
    let outputs = run_scan(&matrix, &settings, &tracks).map_err(|e| e.to_string())?;

    let out_dir = &validation.output_dir;
    let benchmark = matrix.is_benchmark();

    // Windows are exported for the tracks that ran, before any report
    if args.export_windows {
        println!("\n📦 Exporting window tensors...");
        if let (Some(_), Some(series)) = (&outputs.afs, &outputs.series) {
            write_window_export(
                &out_dir.join(AFS_WINDOWS),
                afs_windows(&matrix, series, index),
            )
            .map_err(|e| e.to_string())?;
        }
        if outputs.hfs.is_some() {
            write_window_export(
                &out_dir.join(HFS_WINDOWS),
                hfs_windows(
                    &matrix,
                    &RankedHaplotypeSpectrum,
                    &settings.chromosome_counts,
                    index,
                ),
            )
            .map_err(|e| e.to_string())?;
        }
    }

    // Write outputs
    for (output, report, diagnostic) in [
        (&outputs.afs, AFS_PREDICTIONS, AFS_DIAGNOSTIC),
        (&outputs.hfs, HFS_PREDICTIONS, HFS_DIAGNOSTIC),
    ] {
        if let Some(output) = output {
            write_class_report(&out_dir.join(report), &output.results, benchmark)
                .map_err(|e| e.to_string())?;
            match &output.capture {
                Some(captured) => {
                    write_diagnostic(&out_dir.join(diagnostic), captured, &command_line)
                        .map_err(|e| e.to_string())?
                }
                None => println!("⚠️  No valid window centres, {} not written", diagnostic),
            }
        }
    }

    if let Some(fit) = &outputs.fit {
        write_fit_report(&out_dir.join(FIT_PREDICTIONS), fit, benchmark)
            .map_err(|e| e.to_string())?;
    }

    println!("📁 Outputs written to: {}", out_dir.display());
    println!("📋 Command: {}", command_line);
    println!(
        "\n⏱️  Total execution time: {:.2}s",
        total_start.elapsed().as_secs_f64()
    );
    Ok(())
}
