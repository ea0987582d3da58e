//! Plain-text rendering of the session and report downloads.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use salescast_core::error::Result;
use salescast_core::session::SessionSnapshot;
use salescast_core::types::{
    AnalysisBundle, ChatMessage, Row, Sender, CUSTOM_FORECAST_TABLE_KEY, CUSTOM_FORECAST_TEXT_KEY,
};
use salescast_report::Catalog;

pub const CUSTOM_FORECAST_FILE: &str = "custom_forecast.csv";

pub fn render_catalog(out: &mut impl Write, catalog: &Catalog) -> io::Result<()> {
    writeln!(out, "Products:")?;
    for product in &catalog.products {
        writeln!(out, "  {}", product)?;
    }
    writeln!(out, "{}", catalog.availability())
}

pub fn render_banner(out: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(out, "! {}", message)
}

pub fn render_message(out: &mut impl Write, message: &ChatMessage) -> io::Result<()> {
    let label = match message.sender() {
        Sender::User => "you",
        Sender::Assistant => "assistant",
    };
    writeln!(out, "{}> {}", label, message.text())
}

/// Print everything a generation produced.
pub fn render_report(
    out: &mut impl Write,
    product: &str,
    snapshot: &SessionSnapshot,
) -> io::Result<()> {
    writeln!(out, "=== Report for {} ===", product)?;

    section(out, "Historical summary", &snapshot.context.historical_summary)?;
    section(out, "Forecast summary", &snapshot.context.forecast_summary)?;

    let images: Vec<_> = snapshot.bundle.images().collect();
    if !images.is_empty() {
        writeln!(out)?;
        writeln!(out, "--- Charts ---")?;
        for (key, handle) in images {
            writeln!(
                out,
                "  {} ({}, {} bytes) {}",
                key,
                handle.content_type(),
                handle.len(),
                handle.view_url()
            )?;
        }
    }

    if let Some(rows) = snapshot.bundle.table(CUSTOM_FORECAST_TABLE_KEY) {
        writeln!(out)?;
        writeln!(out, "--- Custom forecast ---")?;
        render_table(out, rows)?;
    }

    if !snapshot.context.ready() {
        let missing: Vec<String> = snapshot
            .context
            .missing()
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(out)?;
        writeln!(out, "Assistant unavailable, report lacks: {}", missing.join(", "))?;
    }
    Ok(())
}

fn section(out: &mut impl Write, title: &str, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "--- {} ---", title)?;
    writeln!(out, "{}", text.trim_end())
}

/// Print rows as left-aligned columns under the first row's headers.
pub fn render_table(out: &mut impl Write, rows: &[Row]) -> io::Result<()> {
    let Some(first) = rows.first() else {
        return writeln!(out, "(no rows)");
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let widths: Vec<usize> = headers
        .iter()
        .map(|h| {
            rows.iter()
                .filter_map(|row| row.get(*h))
                .map(|v| v.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(headers.clone()))?;
    for row in rows {
        let cells = headers
            .iter()
            .map(|h| row.get(*h).map(String::as_str).unwrap_or(""))
            .collect();
        writeln!(out, "{}", line(cells))?;
    }
    Ok(())
}

/// Write the verbatim downloads of a bundle into `dir`.
///
/// Produces `<product>_report.zip` when the archive is present and
/// `custom_forecast.csv` when the custom forecast text is. Returns the
/// written paths.
pub fn save_downloads(
    dir: &Path,
    product: &str,
    bundle: &AnalysisBundle,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let archive = bundle.archive();
    let custom = bundle.text(CUSTOM_FORECAST_TEXT_KEY);
    if archive.is_none() && custom.is_none() {
        return Ok(written);
    }
    fs::create_dir_all(dir)?;

    if let Some(bytes) = archive {
        let path = dir.join(format!("{}_report.zip", file_stem(product)));
        fs::write(&path, bytes)?;
        written.push(path);
    }
    if let Some(text) = custom {
        let path = dir.join(CUSTOM_FORECAST_FILE);
        fs::write(&path, text)?;
        written.push(path);
    }
    Ok(written)
}

fn file_stem(product: &str) -> String {
    product
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}
