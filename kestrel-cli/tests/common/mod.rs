#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Stand-in for MAFFT: pads every record to the longest one and answers in
/// lowercase, like the real tool does
const FAKE_MAFFT: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "v7.505 (2022/Apr/10)" >&2
  exit 0
fi
for last; do :; done
awk '
/^>/ { if (id != "") { n++; ids[n] = id; seqs[n] = seq } id = $0; seq = ""; next }
{ gsub(/[ \t\r]/, ""); seq = seq $0 }
END {
  if (id != "") { n++; ids[n] = id; seqs[n] = seq }
  max = 0
  for (i = 1; i <= n; i++) if (length(seqs[i]) > max) max = length(seqs[i])
  for (i = 1; i <= n; i++) {
    s = seqs[i]
    while (length(s) < max) s = s "-"
    print ids[i]
    print tolower(s)
  }
}' "$last"
"#;

/// A `kestrel` invocation isolated from the user's home and config
pub fn kestrel_cmd(env: &TestEnvironment) -> Command {
    let mut cmd = Command::cargo_bin("kestrel").unwrap();
    cmd.current_dir(env.path())
        .env("KESTREL_HOME", env.home())
        .env_remove("KESTREL_CONFIG")
        .env_remove("KESTREL_LOG");
    cmd
}

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        fs::create_dir_all(temp_dir.path().join("home"))?;
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn home(&self) -> PathBuf {
        self.temp_dir.path().join("home")
    }

    pub fn create_input_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Write an executable script
    pub fn create_script(&self, name: &str, body: &str) -> Result<PathBuf> {
        let path = self.create_input_file(name, body)?;
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms)?;
        Ok(path)
    }

    pub fn fake_mafft(&self) -> Result<PathBuf> {
        self.create_script("fake-mafft", FAKE_MAFFT)
    }

    /// Config file pointing `[alignment] binary` at `aligner`
    pub fn config_with_aligner(&self, aligner: &Path) -> Result<PathBuf> {
        self.create_input_file(
            "kestrel-test.toml",
            &format!("[alignment]\ntool = \"mafft\"\nbinary = '{}'\n", aligner.display()),
        )
    }
}

/// Raw metadata with a duplicated accession and one row missing its date
pub fn create_metadata_csv() -> String {
    "accession,strain,collection_date,host,location,subtype\n\
     CY021709,A/duck/Hong Kong/1/2002,2002-03-01,duck,Hong Kong,H5N1\n\
     MN908947,A/swine/Iowa/2/2019,2019-11-12,swine,USA,\n\
     CY021709,A/duck/Hong Kong/dup,2002-03-02,duck,Hong Kong,H5N1\n\
     KX351455,A/chicken/Egypt/3/2016,,chicken,Egypt,H9N2\n\
     AB000001,A/human/Tokyo/4/2009,2009-05-20,human,Japan,H1N1\n"
        .to_string()
}

/// Sequences of lengths 298, 300 and 299 plus one without metadata
pub fn create_raw_fasta() -> String {
    format!(
        ">CY021709 segment 4\n{}\n>MN908947\n{}\n>AB000001\n{}\n>ZZ999999 orphan\n{}\n",
        "ACGT".repeat(74) + "AC",
        "ACGT".repeat(75),
        "acgt".repeat(74) + "ACG",
        "ACGT".repeat(10),
    )
}

pub fn count_sequences(path: &Path) -> Result<usize> {
    Ok(fs::read_to_string(path)?
        .lines()
        .filter(|l| l.starts_with('>'))
        .count())
}

pub fn fasta_ids(path: &Path) -> Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .filter_map(|l| l.strip_prefix('>'))
        .map(|l| l.split_whitespace().next().unwrap_or("").to_string())
        .collect())
}
