//! Sequence types and file formats for Kestrel

pub mod formats;
pub mod sequence;

// Re-export commonly used types
pub use sequence::{InvalidResidue, Sequence, GAP_CHARS};

// Re-export format entry points
pub use formats::fasta::{parse_fasta, write_fasta, FastaReader};
pub use formats::jsonl::{extract_sequences, JsonlExtraction};
pub use formats::newick::{parse_newick, write_newick, NewickStyle, Node, Tree};
pub use formats::nexus::parse_nexus;
pub use formats::table::{
    delimiter_for, read_records, write_records, AnnotatedRecord, LookupEntry, MetadataRecord,
    TableRow,
};
