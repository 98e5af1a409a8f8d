// tsv.rs - TSV loader for time-series call tables

use crate::data::calls::{CallMatrix, MISSING_CALL};
use crate::data::locus::Locus;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Site filters applied while reading
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// `CHROM` or `CHROM:START-END` (1-based, inclusive)
    pub region: Option<String>,
    /// Keep only chromosomes whose name matches
    pub include_chroms: Option<Regex>,
}

#[derive(Debug, Clone, PartialEq)]
struct Region {
    chrom: String,
    range: Option<(u64, u64)>,
}

impl Region {
    fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        let Some((chrom, span)) = text.rsplit_once(':') else {
            return Ok(Self {
                chrom: text.to_string(),
                range: None,
            });
        };

        let (start, end) = span
            .split_once('-')
            .ok_or_else(|| format!("Invalid region '{}': expected CHROM:START-END", text))?;
        let start: u64 = start
            .replace(',', "")
            .parse()
            .map_err(|_| format!("Invalid region start in '{}'", text))?;
        let end: u64 = end
            .replace(',', "")
            .parse()
            .map_err(|_| format!("Invalid region end in '{}'", text))?;
        if start > end {
            return Err(format!("Invalid region '{}': start is after end", text));
        }

        Ok(Self {
            chrom: chrom.to_string(),
            range: Some((start, end)),
        })
    }

    fn contains(&self, chrom: &str, position: u64) -> bool {
        if chrom != self.chrom {
            return false;
        }
        match self.range {
            Some((start, end)) => position >= start && position <= end,
            None => true,
        }
    }
}

/// Parse one call; `.`, `-`, `NA` and empty fields are missing
pub fn parse_call(s: &str) -> Result<u8, String> {
    let cleaned = s.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == "-" || cleaned == "NA" {
        return Ok(MISSING_CALL);
    }

    let call = cleaned
        .parse::<u8>()
        .map_err(|_| format!("Failed to parse '{}' as an allele id", cleaned))?;

    if call == MISSING_CALL {
        return Err(format!("Allele id {} is reserved for missing calls", MISSING_CALL));
    }

    Ok(call)
}

/// Load a call table.
///
/// Layout: optional `#` comment lines, a header `CHROM POS [MT] chrom_1 ...`,
/// then one row per site. Chromosome columns must run from the earliest to the
/// latest sampling time.
pub fn load_call_table(file_path: &Path, options: &LoadOptions) -> Result<CallMatrix, String> {
    let file = File::open(file_path).map_err(|e| format!("Failed to open call table: {}", e))?;
    let region = options.region.as_deref().map(Region::parse).transpose()?;

    let reader = BufReader::new(file);
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| match line {
            Ok(l) => !l.starts_with('#') && !l.trim().is_empty(),
            Err(_) => true,
        });

    // Read header
    let (_, header_line) = lines.next().ok_or("Empty call table")?;
    let header_line = header_line.map_err(|e| format!("Failed to read header: {}", e))?;
    let header_parts: Vec<&str> = header_line.split('\t').map(|s| s.trim()).collect();

    if header_parts.len() < 3
        || !header_parts[0].eq_ignore_ascii_case("CHROM")
        || !header_parts[1].eq_ignore_ascii_case("POS")
    {
        return Err(
            "Call table header must start with CHROM and POS followed by chromosome columns"
                .to_string(),
        );
    }

    let benchmark = header_parts[2].eq_ignore_ascii_case("MT");
    let first_call = if benchmark { 3 } else { 2 };
    let n_chromosomes = header_parts.len() - first_call;
    if n_chromosomes == 0 {
        return Err("Call table has no chromosome columns".to_string());
    }

    let mut loci = Vec::new();
    let mut calls = Vec::new();
    let mut skipped = 0usize;

    for (line_num, line) in lines {
        let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num, e))?;
        let parts: Vec<&str> = line.split('\t').collect();

        if parts.len() != header_parts.len() {
            return Err(format!(
                "Line {} has {} columns, expected {}",
                line_num,
                parts.len(),
                header_parts.len()
            ));
        }

        let chrom = parts[0].trim();
        let position: u64 = parts[1]
            .trim()
            .parse()
            .map_err(|_| format!("Invalid position '{}' at line {}", parts[1], line_num))?;

        let keep = region.as_ref().map_or(true, |r| r.contains(chrom, position))
            && options
                .include_chroms
                .as_ref()
                .map_or(true, |re| re.is_match(chrom));
        if !keep {
            skipped += 1;
            continue;
        }

        let locus = if benchmark {
            let mt: u32 = parts[2].trim().parse().map_err(|_| {
                format!("Invalid mutation type '{}' at line {}", parts[2], line_num)
            })?;
            Locus::with_mutation_type(chrom, position, mt)
        } else {
            Locus::new(chrom, position)
        };

        let row = parts[first_call..]
            .iter()
            .enumerate()
            .map(|(i, s)| {
                parse_call(s).map_err(|e| {
                    format!(
                        "Invalid call at line {} column {}: {}",
                        line_num,
                        header_parts[first_call + i],
                        e
                    )
                })
            })
            .collect::<Result<Vec<u8>, String>>()?;

        loci.push(locus);
        calls.push(row);
    }

    println!(
        "✅ Call table loaded: {} sites, {} chromosomes{}",
        loci.len(),
        n_chromosomes,
        if benchmark { " (benchmark mode)" } else { "" }
    );
    if skipped > 0 {
        println!("   Filtered out {} sites", skipped);
    }

    let matrix = if loci.is_empty() {
        CallMatrix::empty(n_chromosomes)
    } else {
        CallMatrix::new(loci, calls).map_err(|e| e.to_string())?
    };
    Ok(matrix)
}
