//! Mock aligner for tests

use crate::traits::MultipleAligner;
use anyhow::Result;
use kestrel_bio::sequence::Sequence;
use kestrel_core::KestrelError;

/// Pads every sequence with trailing gaps to the longest input
///
/// Enough to satisfy the alignment contract (equal lengths, same records)
/// without an external binary. `failing()` builds one that always errors
/// like a crashed tool.
pub struct MockAligner {
    fail: bool,
}

impl Default for MockAligner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAligner {
    pub fn new() -> Self {
        MockAligner { fail: false }
    }

    pub fn failing() -> Self {
        MockAligner { fail: true }
    }
}

impl MultipleAligner for MockAligner {
    fn align(&self, sequences: &[Sequence]) -> Result<Vec<Sequence>> {
        if self.fail {
            return Err(KestrelError::external_tool(self.name(), "exit status 1").into());
        }

        let width = sequences.iter().map(Sequence::len).max().unwrap_or(0);
        Ok(sequences
            .iter()
            .map(|seq| {
                let mut padded = seq.clone();
                padded.sequence.resize(width, b'-');
                padded
            })
            .collect())
    }

    fn version(&self) -> Result<String> {
        Ok("MockAligner 1.0.0".to_string())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_to_longest() {
        let input = vec![
            Sequence::new("A".to_string(), vec![b'A'; 298]),
            Sequence::new("B".to_string(), vec![b'C'; 300]),
            Sequence::new("C".to_string(), vec![b'G'; 299]),
        ];
        let aligned = MockAligner::new().align(&input).unwrap();

        assert!(aligned.iter().all(|s| s.len() == 300));
        assert_eq!(aligned[0].ungapped_len(), 298);
        assert_eq!(&aligned[0].sequence[298..], b"--");
    }

    #[test]
    fn test_failing() {
        assert!(MockAligner::failing().align(&[]).is_err());
    }
}
