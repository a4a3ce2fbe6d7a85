//! Configuration types for Kestrel

use crate::KestrelError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub tree: TreeConfig,
}

/// How raw metadata columns map onto the normalized schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetadataConfig {
    /// Input delimiter; detected from the file extension when unset
    #[serde(default)]
    pub delimiter: Option<char>,
    #[serde(default)]
    pub columns: ColumnMapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default = "default_accession_column")]
    pub accession: String,
    #[serde(default = "default_strain_column")]
    pub strain: String,
    #[serde(default = "default_date_column")]
    pub collection_date: String,
    #[serde(default = "default_host_column")]
    pub host: String,
    #[serde(default = "default_location_column")]
    pub location: String,
    #[serde(default = "default_subtype_column")]
    pub subtype: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Fraction of malformed records a stage tolerates before failing
    #[serde(default = "default_max_malformed_fraction")]
    pub max_malformed_fraction: f64,
    /// Residue alphabet sequences are validated against
    #[serde(default)]
    pub alphabet: Alphabet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alphabet {
    /// IUPAC nucleotide codes
    #[default]
    Nucleotide,
    /// IUPAC amino-acid codes
    Protein,
    /// Any IUPAC letter
    Any,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Aligner to run: "mafft" or "muscle"
    #[serde(default = "default_aligner")]
    pub tool: String,
    /// Explicit path to the aligner binary
    #[serde(default)]
    pub binary: Option<String>,
    /// MAFFT strategy flag (e.g. "--auto", "--localpair")
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_gap_open")]
    pub gap_open: f64,
    #[serde(default = "default_gap_extension")]
    pub gap_extension: f64,
    /// Threads passed to the aligner (0 = all available)
    #[serde(default)]
    pub threads: usize,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    #[serde(default = "default_label")]
    pub default_label: String,
    #[serde(default)]
    pub rules: Vec<ClassificationRule>,
}

/// A labelling rule, tried in ascending `priority` then declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(flatten)]
    pub matcher: RuleMatcher,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RuleMatcher {
    /// A normalized metadata field matches a regular expression
    Metadata { field: String, pattern: String },
    /// The residue at a 1-based alignment column is one of `residues`
    Position { column: usize, residues: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Delimiter of every table Kestrel writes
    #[serde(default = "default_output_delimiter")]
    pub delimiter: char,
    /// Residues per FASTA line (0 = unwrapped)
    #[serde(default = "default_line_width")]
    pub fasta_line_width: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Endpoint with an `{accession}` placeholder
    #[serde(default = "default_url_template")]
    pub url_template: String,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Write `[&a=1,b=2,]` so Taxonium does not swallow the closing bracket
    #[serde(default = "default_taxonium_compat")]
    pub taxonium_compat: bool,
}

// Default value functions
fn default_accession_column() -> String { "accession".to_string() }
fn default_strain_column() -> String { "strain".to_string() }
fn default_date_column() -> String { "collection_date".to_string() }
fn default_host_column() -> String { "host".to_string() }
fn default_location_column() -> String { "location".to_string() }
fn default_subtype_column() -> String { "subtype".to_string() }
fn default_max_malformed_fraction() -> f64 { 0.05 }
fn default_aligner() -> String { "mafft".to_string() }
fn default_strategy() -> String { "--auto".to_string() }
fn default_gap_open() -> f64 { 1.53 }
fn default_gap_extension() -> f64 { 0.123 }
fn default_label() -> String { "unassigned".to_string() }
fn default_output_delimiter() -> char { '\t' }
fn default_line_width() -> usize { 80 }
fn default_url_template() -> String {
    "https://www.bv-brc.org/api/genome_sequence/?accession={accession}".to_string()
}
fn default_max_concurrency() -> usize { 10 }
fn default_timeout_seconds() -> u64 { 30 }
fn default_retry_delay_ms() -> u64 { 2000 }
fn default_taxonium_compat() -> bool { true }

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            accession: default_accession_column(),
            strain: default_strain_column(),
            collection_date: default_date_column(),
            host: default_host_column(),
            location: default_location_column(),
            subtype: default_subtype_column(),
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_malformed_fraction: default_max_malformed_fraction(),
            alphabet: Alphabet::default(),
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            tool: default_aligner(),
            binary: None,
            strategy: default_strategy(),
            gap_open: default_gap_open(),
            gap_extension: default_gap_extension(),
            threads: 0,
            extra_args: Vec::new(),
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            default_label: default_label(),
            rules: Vec::new(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            delimiter: default_output_delimiter(),
            fasta_line_width: default_line_width(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            max_concurrency: default_max_concurrency(),
            timeout_seconds: default_timeout_seconds(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            taxonium_compat: default_taxonium_compat(),
        }
    }
}

impl Config {
    /// Reject settings no stage could run with
    pub fn validate(&self) -> Result<(), KestrelError> {
        let fraction = self.quality.max_malformed_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(KestrelError::Configuration(format!(
                "quality.max_malformed_fraction must be within 0..=1, got {}",
                fraction
            )));
        }
        if !self.download.url_template.contains("{accession}") {
            return Err(KestrelError::Configuration(
                "download.url_template must contain an {accession} placeholder".to_string(),
            ));
        }
        let delimiters = [Some(self.export.delimiter), self.metadata.delimiter];
        if let Some(bad) = delimiters.into_iter().flatten().find(|c| !c.is_ascii()) {
            return Err(KestrelError::Configuration(format!(
                "table delimiters must be single ASCII characters, got {:?}",
                bad
            )));
        }
        if self.download.max_concurrency == 0 {
            return Err(KestrelError::Configuration(
                "download.max_concurrency must be at least 1".to_string(),
            ));
        }
        for rule in &self.classification.rules {
            if let RuleMatcher::Position { column: 0, .. } = rule.matcher {
                return Err(KestrelError::Configuration(format!(
                    "classification rule '{}': alignment columns are 1-based",
                    rule.name
                )));
            }
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, KestrelError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| KestrelError::Configuration(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), KestrelError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| KestrelError::Configuration(format!("Failed to serialize config: {}", e)))?;
    crate::system::write_atomic(path, |w| -> Result<(), KestrelError> {
        w.write_all(contents.as_bytes())?;
        Ok(())
    })
}

/// Config file to use when none is given on the command line
///
/// Order: `$KESTREL_CONFIG`, `./kestrel.toml`, `$KESTREL_HOME/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KESTREL_CONFIG") {
        return Some(PathBuf::from(path));
    }

    [
        PathBuf::from("kestrel.toml"),
        crate::system::kestrel_home().join("config.toml"),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

/// Load the effective configuration and report which file it came from
///
/// An explicitly named file (or `$KESTREL_CONFIG`) must exist; with no file
/// found the built-in defaults are used.
pub fn load_effective_config(
    explicit: Option<&Path>,
) -> Result<(Config, Option<PathBuf>), KestrelError> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    match path {
        Some(path) => {
            if !path.exists() {
                return Err(KestrelError::Configuration(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!("Loading configuration from {}", path.display());
            let config = load_config(&path)?;
            Ok((config, Some(path)))
        }
        None => {
            tracing::debug!("No config file found, using defaults");
            Ok((default_config(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.metadata.delimiter, None);
        assert_eq!(config.metadata.columns.accession, "accession");
        assert_eq!(config.metadata.columns.collection_date, "collection_date");
        assert_eq!(config.quality.max_malformed_fraction, 0.05);
        assert_eq!(config.quality.alphabet, Alphabet::Nucleotide);

        assert_eq!(config.alignment.tool, "mafft");
        assert_eq!(config.alignment.strategy, "--auto");
        assert_eq!(config.alignment.gap_open, 1.53);
        assert_eq!(config.alignment.gap_extension, 0.123);

        assert_eq!(config.classification.default_label, "unassigned");
        assert!(config.classification.rules.is_empty());

        assert_eq!(config.export.delimiter, '\t');
        assert_eq!(config.export.fasta_line_width, 80);
        assert_eq!(config.download.max_concurrency, 10);
        assert!(config.tree.taxonium_compat);
    }

    #[test]
    fn test_load_partial_config() {
        let toml_content = r#"
[metadata.columns]
accession = "Genome ID"
host = "Host Name"

[alignment]
strategy = "--localpair"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(config.metadata.columns.accession, "Genome ID");
        assert_eq!(config.metadata.columns.host, "Host Name");
        assert_eq!(config.metadata.columns.strain, "strain");
        assert_eq!(config.alignment.strategy, "--localpair");
        assert_eq!(config.alignment.gap_open, 1.53);
        assert_eq!(config.export.fasta_line_width, 80);
    }

    #[test]
    fn test_load_classification_rules() {
        let toml_content = r#"
[classification]
default_label = "other"

[[classification.rules]]
name = "h5-host"
label = "2.3.4.4b"
priority = 2
kind = "metadata"
field = "host"
pattern = "(?i)avian"

[[classification.rules]]
name = "site-155"
label = "2.3.2.1c"
priority = 1
kind = "position"
column = 155
residues = "NS"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        let rules = &config.classification.rules;

        assert_eq!(config.classification.default_label, "other");
        assert_eq!(rules.len(), 2);
        assert_eq!(
            rules[0].matcher,
            RuleMatcher::Metadata {
                field: "host".to_string(),
                pattern: "(?i)avian".to_string()
            }
        );
        assert_eq!(
            rules[1].matcher,
            RuleMatcher::Position {
                column: 155,
                residues: "NS".to_string()
            }
        );
    }

    #[test]
    fn test_load_invalid_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "this is not valid TOML {{").unwrap();

        match load_config(temp_file.path()).unwrap_err() {
            KestrelError::Configuration(msg) => assert!(msg.contains("Failed to parse config")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.quality.max_malformed_fraction = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.download.url_template = "https://example.org/api".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.classification.rules.push(ClassificationRule {
            name: "zero".to_string(),
            label: "x".to_string(),
            priority: 0,
            matcher: RuleMatcher::Position {
                column: 0,
                residues: "A".to_string(),
            },
        });
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.export.delimiter = '§';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_config("/nonexistent/path/to/kestrel.toml");
        assert!(matches!(result, Err(KestrelError::Io(_))));
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = Config::default();
        config.alignment.threads = 4;
        config.alignment.extra_args = vec!["--nuc".to_string()];
        config.export.delimiter = ',';
        config.classification.rules.push(ClassificationRule {
            name: "hx".to_string(),
            label: "H5".to_string(),
            priority: 0,
            matcher: RuleMatcher::Metadata {
                field: "strain".to_string(),
                pattern: "H5N1".to_string(),
            },
        });

        let temp_file = NamedTempFile::new().unwrap();
        save_config(temp_file.path(), &config).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(loaded.alignment.threads, 4);
        assert_eq!(loaded.alignment.extra_args, vec!["--nuc".to_string()]);
        assert_eq!(loaded.export.delimiter, ',');
        assert_eq!(loaded.classification.rules, config.classification.rules);
    }

    #[test]
    #[serial]
    fn test_effective_config_explicit_and_env() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "[export]\nfasta_line_width = 60\n").unwrap();

        std::env::remove_var("KESTREL_CONFIG");
        let (config, path) = load_effective_config(Some(temp_file.path())).unwrap();
        assert_eq!(config.export.fasta_line_width, 60);
        assert_eq!(path.as_deref(), Some(temp_file.path()));

        std::env::set_var("KESTREL_CONFIG", temp_file.path());
        let (config, _) = load_effective_config(None).unwrap();
        assert_eq!(config.export.fasta_line_width, 60);

        std::env::set_var("KESTREL_CONFIG", "/nonexistent/kestrel.toml");
        assert!(matches!(
            load_effective_config(None),
            Err(KestrelError::Configuration(_))
        ));
        std::env::remove_var("KESTREL_CONFIG");
    }

    #[test]
    #[serial]
    fn test_effective_config_defaults_without_files() {
        let home = tempfile::TempDir::new().unwrap();
        std::env::remove_var("KESTREL_CONFIG");
        std::env::set_var("KESTREL_HOME", home.path());

        if !Path::new("kestrel.toml").exists() {
            let (config, path) = load_effective_config(None).unwrap();
            assert!(path.is_none());
            assert_eq!(config.alignment.tool, "mafft");
        }

        std::fs::write(home.path().join("config.toml"), "[tree]\ntaxonium_compat = false\n").unwrap();
        if !Path::new("kestrel.toml").exists() {
            let (config, path) = load_effective_config(None).unwrap();
            assert_eq!(path, Some(home.path().join("config.toml")));
            assert!(!config.tree.taxonium_compat);
        }
        std::env::remove_var("KESTREL_HOME");
    }
}
