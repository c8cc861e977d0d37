// Integration test utilities and common code
// WHY: Centralized fixtures avoid duplicating terms/table/config files across tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const LAB_TERMS: &str = "\
Hematocrit of Blood\tHct; PCV; Packed cell volume
5-Hydroxytryptophan [Measurement] in Urine\t5-HTP; Ur

SARS-CoV-2 E gene Resp Ql NAA+probe\tCOVID-19; Coronavirus disease 2019
Hemoglobin [Mass/volume] in Blood\tHgb; Hb; Bld
";

pub const ENHANCEMENTS: &str = r#"{
    "hemoglobin": {"abbreviation": ["Hgb", "Hb"], "acronym": ["HGB"], "replacement": ["haemoglobin"]},
    "blood": {"abbreviation": ["Bld"], "replacement": ["whole blood"]},
    "urine": {"abbreviation": ["Ur"], "replacement": ["urine specimen"]},
    "hematocrit": {"abbreviation": ["Hct"]}
}"#;

/// Test fixture helper for creating temporary directories with terms and config files
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();
        Self { temp_dir, root_path }
    }

    /// Write a file relative to the fixture root, creating parent directories
    pub fn create_file<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    pub fn create_terms_file(&self) -> PathBuf {
        self.create_file("terms.tsv", LAB_TERMS)
    }

    pub fn create_enhancements_file(&self) -> PathBuf {
        self.create_file("enhancements.json", ENHANCEMENTS)
    }

    pub fn create_config_file(&self, content: &str) -> PathBuf {
        self.create_file("config.json", content)
    }

    /// Parse a variants TSV into (term_index, variant_index, variant, original) tuples
    pub fn parse_variants(content: &str) -> Vec<(usize, usize, String, String)> {
        content
            .lines()
            .map(|line| {
                let fields: Vec<&str> = line.split('\t').collect();
                assert_eq!(fields.len(), 4, "malformed variant row: {line}");
                (
                    fields[0].parse().expect("term index"),
                    fields[1].parse().expect("variant index"),
                    fields[2].to_string(),
                    fields[3].to_string(),
                )
            })
            .collect()
    }
}
