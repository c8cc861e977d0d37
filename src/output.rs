// WHY: Variant rows and run statistics are written the same way by every CLI mode

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// One generated variant of an input term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRow {
    pub term_index: usize,
    pub variant_index: usize,
    pub variant: String,
    pub original: String,
}

impl VariantRow {
    /// `term_index \t variant_index \t variant \t original`; tabs and newlines inside
    /// the text fields are flattened to spaces so each row stays on one line
    pub fn format_line(&self) -> String {
        let flatten = |s: &str| s.replace(['\t', '\n', '\r'], " ");
        format!(
            "{}\t{}\t{}\t{}",
            self.term_index,
            self.variant_index,
            flatten(&self.variant),
            flatten(&self.original)
        )
    }
}

/// Write variant rows to any async sink
pub async fn write_variants<W: AsyncWrite + Unpin>(sink: W, rows: &[VariantRow]) -> Result<()> {
    let mut writer = BufWriter::new(sink);
    for row in rows {
        writer.write_all(row.format_line().as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Write variant rows to a file, replacing any existing content
pub async fn write_variants_file(path: &Path, rows: &[VariantRow]) -> Result<()> {
    let file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    write_variants(file, rows).await
}

/// Run-level statistics written to the stats JSON file
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RunStats {
    /// Unix timestamp (seconds) when the run started
    pub run_start: u64,
    pub input_path: String,
    pub terms_read: u64,
    pub variants_written: u64,
    /// Variants identical to their source term
    pub unchanged_variants: u64,
    pub steps: Vec<String>,
    pub processing_time_ms: u64,
    pub variants_per_sec: f64,
    pub read_error: Option<String>,
}

impl RunStats {
    pub fn new(input_path: &Path) -> Self {
        let run_start = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            run_start,
            input_path: input_path.display().to_string(),
            ..Self::default()
        }
    }

    /// Count a batch of generated rows
    pub fn record_rows(&mut self, rows: &[VariantRow]) {
        self.variants_written += rows.len() as u64;
        self.unchanged_variants += rows.iter().filter(|r| r.variant == r.original).count() as u64;
    }

    pub fn finish(&mut self, elapsed: std::time::Duration) {
        self.processing_time_ms = elapsed.as_millis() as u64;
        let secs = elapsed.as_secs_f64();
        self.variants_per_sec = if secs > 0.0 {
            self.variants_written as f64 / secs
        } else {
            0.0
        };
    }

    pub async fn write_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write stats file {}", path.display()))?;
        Ok(())
    }
}
