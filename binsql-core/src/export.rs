use std::io::Write;
use std::path::Path;

use binsql_common::{HistogramError, Result};

use crate::histogram::{Bin, HistogramSummary};

// --- text table with bars ---

pub fn write_table<W: Write>(out: &mut W, bins: &[Bin], bar_width: usize) -> Result<()> {
    if bins.is_empty() {
        writeln!(out, "(no non-null values)")?;
        return Ok(());
    }
    let max_size = bins.iter().map(|b| b.size).max().unwrap_or(1);
    writeln!(out, "{:>4} {:>12} {:>12} {:>8}  {}", "id", "inf", "sup", "size", "")?;
    for bin in bins {
        let blen = (bin.size as f64 / max_size as f64 * bar_width as f64).round() as usize;
        writeln!(
            out,
            "{:>4} {:>12.4} {:>12.4} {:>8}  |{:<bw$}|",
            bin.id,
            bin.inf,
            bin.sup,
            bin.size,
            "█".repeat(blen.max(1)),
            bw = bar_width,
        )?;
    }
    let summary = HistogramSummary::from_bins(bins);
    writeln!(out, "{:<16} {}", "values:", summary.total_count)?;
    writeln!(out, "{:<16} {}", "non-empty bins:", summary.non_empty_bins)?;
    Ok(())
}

pub fn print_bins(bins: &[Bin], bar_width: usize) -> Result<()> {
    let stdout = std::io::stdout();
    write_table(&mut stdout.lock(), bins, bar_width)
}

// --- JSON ---

pub fn write_json<W: Write>(out: &mut W, bins: &[Bin]) -> Result<()> {
    let doc = serde_json::json!({
        "summary": HistogramSummary::from_bins(bins),
        "bins": bins,
    });
    serde_json::to_writer_pretty(&mut *out, &doc)
        .map_err(|e| HistogramError::Other(e.to_string()))?;
    writeln!(out)?;
    Ok(())
}

pub fn export_json(output_path: &Path, bins: &[Bin]) -> Result<()> {
    let mut file = std::fs::File::create(output_path)?;
    write_json(&mut file, bins)
}

// --- CSV ---

pub fn write_csv<W: Write>(out: &mut W, bins: &[Bin]) -> Result<()> {
    writeln!(out, "{}", Bin::COLUMNS.join(","))?;
    for b in bins {
        writeln!(out, "{},{},{},{},{},{}", b.id, b.size, b.inf, b.sup, b.min, b.max)?;
    }
    Ok(())
}

pub fn export_csv(output_path: &Path, bins: &[Bin]) -> Result<()> {
    let mut file = std::fs::File::create(output_path)?;
    write_csv(&mut file, bins)
}
