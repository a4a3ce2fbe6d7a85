use kestrel_core::Alphabet;
use serde::{Deserialize, Serialize};

/// Gap characters emitted by multiple-sequence aligners
pub const GAP_CHARS: &[u8] = b"-.";

const NUCLEOTIDE_CODES: &[u8] = b"ACGTURYSWKMBDHVN";
const PROTEIN_CODES: &[u8] = b"ACDEFGHIKLMNPQRSTVWYBZXUO*";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub description: Option<String>,
    pub sequence: Vec<u8>,
}

/// Why a record failed residue validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidResidue {
    Empty,
    Character { position: usize, residue: char },
}

impl std::fmt::Display for InvalidResidue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidResidue::Empty => write!(f, "empty sequence"),
            InvalidResidue::Character { position, residue } => {
                write!(f, "invalid residue {:?} at position {}", residue, position + 1)
            }
        }
    }
}

impl Sequence {
    pub fn new(id: String, sequence: Vec<u8>) -> Self {
        Self {
            id,
            description: None,
            sequence,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Length without gap characters
    pub fn ungapped_len(&self) -> usize {
        self.sequence
            .iter()
            .filter(|c| !GAP_CHARS.contains(c))
            .count()
    }

    /// Residue at a 1-based alignment column
    pub fn residue_at(&self, column: usize) -> Option<u8> {
        column
            .checked_sub(1)
            .and_then(|idx| self.sequence.get(idx))
            .copied()
    }

    /// Check every residue against an IUPAC alphabet (gaps allowed)
    pub fn validate(&self, alphabet: Alphabet) -> Result<(), InvalidResidue> {
        if self.ungapped_len() == 0 {
            return Err(InvalidResidue::Empty);
        }

        for (position, &c) in self.sequence.iter().enumerate() {
            let upper = c.to_ascii_uppercase();
            let ok = GAP_CHARS.contains(&upper)
                || match alphabet {
                    Alphabet::Nucleotide => NUCLEOTIDE_CODES.contains(&upper),
                    Alphabet::Protein => PROTEIN_CODES.contains(&upper),
                    Alphabet::Any => {
                        NUCLEOTIDE_CODES.contains(&upper) || PROTEIN_CODES.contains(&upper)
                    }
                };
            if !ok {
                return Err(InvalidResidue::Character {
                    position,
                    residue: c as char,
                });
            }
        }
        Ok(())
    }

    pub fn header(&self) -> String {
        let mut header = format!(">{}", self.id);
        if let Some(desc) = &self.description {
            if !desc.is_empty() {
                header.push(' ');
                header.push_str(desc);
            }
        }
        header
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_with_description() {
        let seq = Sequence::new("CY021709".to_string(), b"ACGT".to_vec())
            .with_description("Influenza A virus (A/duck/Guangdong/2006(H5N1))".to_string());
        assert_eq!(
            seq.header(),
            ">CY021709 Influenza A virus (A/duck/Guangdong/2006(H5N1))"
        );

        let bare = Sequence::new("A".to_string(), b"ACGT".to_vec());
        assert_eq!(bare.header(), ">A");
    }

    #[test]
    fn test_ungapped_len_and_residue_at() {
        let seq = Sequence::new("a".to_string(), b"AC--GT.".to_vec());
        assert_eq!(seq.len(), 7);
        assert_eq!(seq.ungapped_len(), 4);
        assert_eq!(seq.residue_at(1), Some(b'A'));
        assert_eq!(seq.residue_at(3), Some(b'-'));
        assert_eq!(seq.residue_at(0), None);
        assert_eq!(seq.residue_at(8), None);
    }

    #[test]
    fn test_validate_nucleotide() {
        let ok = Sequence::new("a".to_string(), b"ACGTNRY-".to_vec());
        assert!(ok.validate(Alphabet::Nucleotide).is_ok());

        let bad = Sequence::new("b".to_string(), b"ACGJT".to_vec());
        assert_eq!(
            bad.validate(Alphabet::Nucleotide),
            Err(InvalidResidue::Character {
                position: 3,
                residue: 'J'
            })
        );

        let protein = Sequence::new("c".to_string(), b"MEFL".to_vec());
        assert!(protein.validate(Alphabet::Nucleotide).is_err());
        assert!(protein.validate(Alphabet::Protein).is_ok());
        assert!(protein.validate(Alphabet::Any).is_ok());
    }

    #[test]
    fn test_validate_empty() {
        let empty = Sequence::new("e".to_string(), Vec::new());
        assert_eq!(empty.validate(Alphabet::Any), Err(InvalidResidue::Empty));

        let only_gaps = Sequence::new("g".to_string(), b"---".to_vec());
        assert_eq!(only_gaps.validate(Alphabet::Any), Err(InvalidResidue::Empty));
    }
}
