use anyhow::Result;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Separator between a term and its related names
const RELATED_FIELD_SEPARATOR: char = '\t';
/// Separator between related names
const RELATED_NAME_SEPARATOR: char = ';';

/// Configuration for terms file reading
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Whether to fail fast on first error or return partial results
    pub fail_fast: bool,
    /// Buffer size for async reading (default: 8KB)
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            buffer_size: 8192,
        }
    }
}

/// One canonical term with the related names listed next to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRecord {
    /// 1-based line number in the source
    pub line_number: usize,
    pub term: String,
    pub related_terms: Vec<String>,
}

/// Statistics for one terms file
#[derive(Debug, Clone)]
pub struct ReadStats {
    pub file_path: String,
    pub lines_read: u64,
    pub bytes_read: u64,
    pub terms_read: u64,
    pub duration_ms: u64,
    pub read_error: Option<String>,
}

/// Parse one line of a terms file: `term` or `term<TAB>related; related; ...`.
/// Blank lines yield `None`.
pub fn parse_term_line(line_number: usize, line: &str) -> Option<TermRecord> {
    let (term, related) = match line.split_once(RELATED_FIELD_SEPARATOR) {
        Some((term, related)) => (term, related),
        None => (line, ""),
    };

    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    let related_terms = related
        .split(RELATED_NAME_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    Some(TermRecord {
        line_number,
        term: term.to_string(),
        related_terms,
    })
}

/// Parse every line of an in-memory terms document
pub fn parse_terms(content: &str) -> Vec<TermRecord> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| parse_term_line(i + 1, line))
        .collect()
}

/// Parse an in-memory terms document that arrived as raw bytes
pub fn parse_term_bytes(bytes: &[u8]) -> Result<Vec<TermRecord>> {
    let content = std::str::from_utf8(bytes).map_err(|e| anyhow::anyhow!("UTF-8 decoding error: {}", e))?;
    Ok(parse_terms(content))
}

/// Async reader for terms files
pub struct TermReader {
    config: ReaderConfig,
}

impl TermReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read a terms file line-by-line with buffered async I/O
    pub async fn read_terms<P: AsRef<Path>>(&self, file_path: P) -> Result<(Vec<TermRecord>, ReadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();

        debug!("Starting async read of terms file: {}", path.display());

        let failed_stats = |lines_read: u64, bytes_read: u64, terms_read: u64, error_msg: &str| ReadStats {
            file_path: path.display().to_string(),
            lines_read,
            bytes_read,
            terms_read,
            duration_ms: start_time.elapsed().as_millis() as u64,
            read_error: Some(error_msg.to_string()),
        };

        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) => {
                let error_msg = format!("Failed to open terms file {}: {}", path.display(), e);
                let stats = failed_stats(0, 0, 0, &error_msg);
                return self.stop_reading(error_msg, Vec::new(), stats);
            }
        };

        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut buffer = Vec::new();
        let mut records = Vec::new();
        let mut line_count = 0u64;
        let mut byte_count = 0u64;

        loop {
            buffer.clear();
            let raw_len = match reader.read_until(b'\n', &mut buffer).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    let error_msg = format!("Read error in {} at line {}: {}", path.display(), line_count + 1, e);
                    let stats = failed_stats(line_count, byte_count, records.len() as u64, &error_msg);
                    return self.stop_reading(error_msg, records, stats);
                }
            };

            let line = match std::str::from_utf8(&buffer) {
                Ok(line) => line,
                Err(e) => {
                    let error_msg = format!(
                        "UTF-8 decoding error in {} at line {}: {}",
                        path.display(),
                        line_count + 1,
                        e
                    );
                    // Partial results up to the bad line
                    let stats = failed_stats(line_count, byte_count, records.len() as u64, &error_msg);
                    return self.stop_reading(error_msg, records, stats);
                }
            };

            // WHY: count raw bytes so CRLF terminators are included
            byte_count += raw_len as u64;
            line_count += 1;
            let line = line.strip_suffix('\n').unwrap_or(line);
            let line = line.strip_suffix('\r').unwrap_or(line);
            if let Some(record) = parse_term_line(line_count as usize, line) {
                records.push(record);
            }
        }

        let stats = ReadStats {
            file_path: path.display().to_string(),
            lines_read: line_count,
            bytes_read: byte_count,
            terms_read: records.len() as u64,
            duration_ms: start_time.elapsed().as_millis() as u64,
            read_error: None,
        };

        info!(
            "Read {}: {} lines, {} terms, {} bytes in {}ms",
            path.display(),
            line_count,
            stats.terms_read,
            byte_count,
            stats.duration_ms
        );

        Ok((records, stats))
    }

    /// Fail under `fail_fast`, otherwise hand back what was read so far
    fn stop_reading(
        &self,
        error_msg: String,
        records: Vec<TermRecord>,
        stats: ReadStats,
    ) -> Result<(Vec<TermRecord>, ReadStats)> {
        warn!("{}", error_msg);
        if self.config.fail_fast {
            return Err(anyhow::anyhow!(error_msg));
        }
        Ok((records, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    async fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> Result<std::path::PathBuf> {
        let file_path = dir.join(name);
        fs::write(&file_path, content).await?;
        Ok(file_path)
    }

    #[test]
    fn test_parse_term_line() {
        assert_eq!(parse_term_line(1, "   "), None);
        assert_eq!(
            parse_term_line(2, "Hematocrit of Blood"),
            Some(TermRecord {
                line_number: 2,
                term: "Hematocrit of Blood".to_string(),
                related_terms: Vec::new(),
            })
        );

        let record = parse_term_line(3, "Hematocrit of Blood\tHct; PCV ;; Packed cell volume").unwrap();
        assert_eq!(record.term, "Hematocrit of Blood");
        assert_eq!(record.related_terms, vec!["Hct", "PCV", "Packed cell volume"]);
    }

    #[test]
    fn test_parse_terms_skips_blank_lines() {
        let records = parse_terms("Glucose\n\nSodium\tNa\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].line_number, 3);
        assert_eq!(records[1].related_terms, vec!["Na"]);
    }

    #[test]
    fn test_parse_term_bytes_rejects_invalid_utf8() {
        let records = parse_term_bytes(b"Glucose\nSodium\tNa\n").unwrap();
        assert_eq!(records.len(), 2);

        let error = parse_term_bytes(&[b'G', 0xFF, b'\n']).unwrap_err();
        assert!(error.to_string().contains("UTF-8"));
    }

    #[tokio::test]
    async fn test_read_terms_file() {
        let temp_dir = TempDir::new().unwrap();
        let content = "Hematocrit of Blood\tHct; PCV\n\n5-Hydroxytryptophan [Measurement] in Urine\n";
        let file_path = create_test_file(temp_dir.path(), "terms.tsv", content.as_bytes()).await.unwrap();

        let reader = TermReader::new(ReaderConfig::default());
        let (records, stats) = reader.read_terms(&file_path).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].related_terms, vec!["Hct", "PCV"]);
        assert_eq!(records[1].line_number, 3);
        assert_eq!(stats.lines_read, 3);
        assert_eq!(stats.terms_read, 2);
        assert_eq!(stats.bytes_read, content.len() as u64);
        assert!(stats.read_error.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_continue() {
        let temp_dir = TempDir::new().unwrap();
        let reader = TermReader::new(ReaderConfig::default());

        let (records, stats) = reader.read_terms(temp_dir.path().join("missing.tsv")).await.unwrap();
        assert!(records.is_empty());
        assert!(stats.read_error.is_some());
    }

    #[tokio::test]
    async fn test_missing_file_fail_fast() {
        let temp_dir = TempDir::new().unwrap();
        let reader = TermReader::new(ReaderConfig { fail_fast: true, ..Default::default() });

        assert!(reader.read_terms(temp_dir.path().join("missing.tsv")).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_utf8_returns_partial_results() {
        let temp_dir = TempDir::new().unwrap();
        let mut content = b"Glucose\nSodium\n".to_vec();
        content.extend_from_slice(&[0xFF, 0xFE, b'\n']);
        let file_path = create_test_file(temp_dir.path(), "bad.tsv", &content).await.unwrap();

        let reader = TermReader::new(ReaderConfig::default());
        let (records, stats) = reader.read_terms(&file_path).await.unwrap();

        assert_eq!(records.len(), 2);
        assert!(stats.read_error.unwrap().contains("line 3"));
    }

    #[tokio::test]
    async fn test_crlf_lines_count_every_byte() {
        let temp_dir = TempDir::new().unwrap();
        let content = "Glucose\tGlu\r\n\r\nSodium\r\nPotassium";
        let file_path = create_test_file(temp_dir.path(), "crlf.tsv", content.as_bytes()).await.unwrap();

        let reader = TermReader::new(ReaderConfig::default());
        let (records, stats) = reader.read_terms(&file_path).await.unwrap();

        assert_eq!(stats.bytes_read, content.len() as u64);
        assert_eq!(stats.lines_read, 4);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].related_terms, vec!["Glu"]);
        assert_eq!(records[1].term, "Sodium");
        assert_eq!(records[2].term, "Potassium");
    }
}
