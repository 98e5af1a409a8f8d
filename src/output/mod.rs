// mod.rs - Report, diagnostic and window-export writers

use crate::core::dispatch::{CapturedWindow, LocusWindow, ResultMap};
use crate::core::errors::ScanError;
use crate::core::windows::WindowTensor;
use crate::data::Locus;
use crate::predictors::{ClassProbabilities, FitResult};
use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub const AFS_PREDICTIONS: &str = "afs_preds.tsv";
pub const HFS_PREDICTIONS: &str = "hfs_preds.tsv";
pub const FIT_PREDICTIONS: &str = "fit_preds.tsv";
pub const AFS_DIAGNOSTIC: &str = "afs_centers.tsv";
pub const HFS_DIAGNOSTIC: &str = "hfs_centers.tsv";
pub const AFS_WINDOWS: &str = "afs_windows.jsonl";
pub const HFS_WINDOWS: &str = "hfs_windows.jsonl";

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &Path) -> Result<(), ScanError> {
    if let Some(parent) = file_path.parent() {
        create_dir_all(parent).map_err(|e| {
            ScanError::Io(format!(
                "Failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

fn create_output(file_path: &Path) -> Result<BufWriter<File>, ScanError> {
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path).map_err(|e| {
        ScanError::Io(format!(
            "Failed to create output file '{}': {}",
            file_path.display(),
            e
        ))
    })?;
    Ok(BufWriter::new(file))
}

fn write_err(e: impl std::fmt::Display) -> ScanError {
    ScanError::Io(format!("Write error: {}", e))
}

fn write_command_header<W: Write>(writer: &mut W, command_line: &str) -> Result<(), ScanError> {
    writeln!(writer, "# Command: {}", command_line).map_err(write_err)?;
    writeln!(
        writer,
        "# Generated: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
    .map_err(write_err)?;
    writeln!(writer, "# timesweep v{}", env!("CARGO_PKG_VERSION")).map_err(write_err)?;
    Ok(())
}

fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer)
}

fn locus_fields(locus: &Locus, benchmark: bool) -> Vec<String> {
    let mut fields = vec![locus.chrom.clone(), locus.position.to_string()];
    if benchmark {
        fields.push(
            locus
                .mutation_type
                .map(|mt| mt.to_string())
                .unwrap_or_default(),
        );
    }
    fields
}

fn header_fields(benchmark: bool, tail: &[&str]) -> Vec<String> {
    let mut fields = vec!["Chrom".to_string(), "BP".to_string()];
    if benchmark {
        fields.push("Mut Type".to_string());
    }
    fields.extend(tail.iter().map(|s| s.to_string()));
    fields
}

/// Write per-locus class predictions, sorted by `(chrom, position)`.
///
/// The column header is the first line; reports carry no comment lines.
pub fn write_class_report(
    file_path: &Path,
    results: &ResultMap<ClassProbabilities>,
    benchmark: bool,
) -> Result<(), ScanError> {
    let mut writer = tsv_writer(create_output(file_path)?);
    writer
        .write_record(header_fields(
            benchmark,
            &["Class", "Neut Score", "Hard Score", "Soft Score"],
        ))
        .map_err(write_err)?;

    for (locus, probs) in results.sorted() {
        let mut record = locus_fields(locus, benchmark);
        record.push(probs.label().to_string());
        record.extend(probs.0.iter().map(|p| p.to_string()));
        writer.write_record(&record).map_err(write_err)?;
    }

    writer.flush().map_err(|e| ScanError::Io(format!("Flush error: {}", e)))?;
    println!(
        "✅ {} predictions written to: {}",
        results.len(),
        file_path.display()
    );
    Ok(())
}

/// Write per-locus frequency-increment results as `1 - p`
pub fn write_fit_report(
    file_path: &Path,
    results: &ResultMap<FitResult>,
    benchmark: bool,
) -> Result<(), ScanError> {
    let mut writer = tsv_writer(create_output(file_path)?);
    writer
        .write_record(header_fields(benchmark, &["Inv pval"]))
        .map_err(write_err)?;

    for (locus, fit) in results.sorted() {
        let mut record = locus_fields(locus, benchmark);
        record.push(fit.inverse_p_value().to_string());
        writer.write_record(&record).map_err(write_err)?;
    }

    writer.flush().map_err(|e| ScanError::Io(format!("Flush error: {}", e)))?;
    println!(
        "✅ {} FIT results written to: {}",
        results.len(),
        file_path.display()
    );
    Ok(())
}

/// Write the captured diagnostic window, one row per timepoint
pub fn write_diagnostic(
    file_path: &Path,
    captured: &CapturedWindow,
    command_line: &str,
) -> Result<(), ScanError> {
    let mut out = create_output(file_path)?;
    write_command_header(&mut out, command_line)?;
    writeln!(out, "# Locus: {}", captured.locus).map_err(write_err)?;
    writeln!(out, "# Center: {}", captured.center).map_err(write_err)?;

    let (timepoints, width) = captured.tensor.shape();
    writeln!(out, "# Shape: {} x {}", timepoints, width).map_err(write_err)?;

    let mut writer = tsv_writer(out);
    for row in captured.tensor.rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(write_err)?;
    }

    writer.flush().map_err(|e| ScanError::Io(format!("Flush error: {}", e)))?;
    println!(
        "✅ Diagnostic window at {} written to: {}",
        captured.locus,
        file_path.display()
    );
    Ok(())
}

#[derive(Serialize)]
struct ExportedWindow<'a> {
    chrom: &'a str,
    pos: u64,
    mut_type: Option<u32>,
    window: &'a WindowTensor,
}

/// Stream windows to a JSON-lines file; returns the number written
pub fn write_window_export<I>(file_path: &Path, windows: I) -> Result<usize, ScanError>
where
    I: IntoIterator<Item = Result<LocusWindow, ScanError>>,
{
    let mut out = create_output(file_path)?;
    let mut written = 0;

    for window in windows {
        let window = window?;
        let line = ExportedWindow {
            chrom: &window.locus.chrom,
            pos: window.locus.position,
            mut_type: window.locus.mutation_type,
            window: &window.tensor,
        };
        serde_json::to_writer(&mut out, &line).map_err(write_err)?;
        writeln!(out).map_err(write_err)?;
        written += 1;
    }

    out.flush().map_err(|e| ScanError::Io(format!("Flush error: {}", e)))?;
    println!("✅ {} windows exported to: {}", written, file_path.display());
    Ok(written)
}
