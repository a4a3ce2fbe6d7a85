pub mod fasta;
pub mod jsonl;
pub mod newick;
pub mod nexus;
pub mod table;
