use crate::sequence::Sequence;
use flate2::read::GzDecoder;
use kestrel_core::error::{KestrelError, KestrelResult};
use kestrel_core::write_atomic;
use memmap2::Mmap;
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{line_ending, not_line_ending, space1},
    combinator::{cut, map_res, opt},
    sequence::{preceded, terminated},
    IResult,
};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// Header fields: `>id[ description]`, without the line terminator
fn header_fields(input: &[u8]) -> IResult<&[u8], (&str, Option<&str>)> {
    let (input, _) = tag(b">")(input)?;
    let (input, id) = map_res(
        take_till(|c: u8| c == b' ' || c == b'\t' || c == b'\n' || c == b'\r'),
        std::str::from_utf8,
    )(input)?;
    let (input, description) = opt(preceded(
        space1,
        cut(map_res(not_line_ending, std::str::from_utf8)),
    ))(input)?;
    Ok((input, (id, description.map(str::trim_end))))
}

/// Parse a FASTA header line
fn parse_header(input: &[u8]) -> IResult<&[u8], (&str, Option<&str>)> {
    terminated(header_fields, opt(line_ending))(input)
}

/// Parse sequence lines until next header or EOF
fn parse_sequence(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let mut sequence = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() && remaining[0] != b'>' {
        let (rest, line) =
            take_till::<_, _, nom::error::Error<_>>(|c: u8| c == b'\n' || c == b'\r')(remaining)?;
        let (rest, _) = opt(line_ending)(rest)?;
        // A lone '\r' would otherwise stall the loop
        let rest = if rest.len() == remaining.len() {
            &rest[1..]
        } else {
            rest
        };

        push_residues(&mut sequence, line);
        remaining = rest;
    }

    Ok((remaining, sequence))
}

fn push_residues(sequence: &mut Vec<u8>, line: &[u8]) {
    sequence.extend(
        line.iter()
            .filter(|c| !c.is_ascii_whitespace())
            .map(|c| c.to_ascii_uppercase()),
    );
}

/// Parse a single FASTA record
fn parse_record(input: &[u8]) -> IResult<&[u8], Sequence> {
    let (input, (id, description)) = parse_header(input)?;
    let (input, sequence) = parse_sequence(input)?;

    let mut seq = Sequence::new(id.to_string(), sequence);
    if let Some(desc) = description.filter(|d| !d.is_empty()) {
        seq = seq.with_description(desc.to_string());
    }

    Ok((input, seq))
}

/// Parse FASTA from bytes
///
/// Records with no residues are kept; callers decide whether they are
/// malformed.
pub fn parse_fasta_from_bytes(data: &[u8]) -> KestrelResult<Vec<Sequence>> {
    let mut input = data;
    let mut sequences = Vec::new();

    loop {
        while !input.is_empty() && input[0].is_ascii_whitespace() {
            input = &input[1..];
        }

        if input.is_empty() {
            break;
        }

        if input[0] != b'>' {
            let offset = data.len() - input.len();
            return Err(KestrelError::Parse(format!(
                "Expected '>' at byte {} of FASTA input",
                offset
            )));
        }

        match parse_record(input) {
            Ok((remaining, seq)) => {
                sequences.push(seq);
                input = remaining;
            }
            Err(e) => {
                return Err(KestrelError::Parse(format!(
                    "Failed to parse FASTA: {:?}",
                    e
                )));
            }
        }
    }

    Ok(sequences)
}

/// Parse a FASTA file into sequences (supports .gz compression)
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> KestrelResult<Vec<Sequence>> {
    let path = path.as_ref();

    if is_gzipped(path) {
        let file = File::open(path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut buffer = Vec::new();
        decoder.read_to_end(&mut buffer)?;
        parse_fasta_from_bytes(&buffer)
    } else {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Vec::new());
        }
        let mmap = unsafe { Mmap::map(&file)? };
        parse_fasta_from_bytes(&mmap[..])
    }
}

fn is_gzipped(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("gz")
}

/// Open a FASTA file for reading, detecting gzip compression from the extension
pub fn open_for_reading<P: AsRef<Path>>(path: P) -> KestrelResult<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Streaming FASTA reader that yields one record at a time
///
/// Used by the sequence filter so raw collections never have to fit in
/// memory.
pub struct FastaReader<R: BufRead> {
    reader: R,
    pending_header: Option<Vec<u8>>,
    line: Vec<u8>,
    line_number: usize,
    finished: bool,
}

impl FastaReader<Box<dyn BufRead>> {
    /// Open a plain or gzipped FASTA file
    pub fn from_path<P: AsRef<Path>>(path: P) -> KestrelResult<Self> {
        Ok(Self::new(open_for_reading(path)?))
    }
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending_header: None,
            line: Vec::new(),
            line_number: 0,
            finished: false,
        }
    }

    fn read_line(&mut self) -> KestrelResult<bool> {
        self.line.clear();
        let n = self.reader.read_until(b'\n', &mut self.line)?;
        if n > 0 {
            self.line_number += 1;
        }
        Ok(n > 0)
    }

    fn next_record(&mut self) -> KestrelResult<Option<Sequence>> {
        let header = match self.pending_header.take() {
            Some(header) => header,
            None => loop {
                if !self.read_line()? {
                    return Ok(None);
                }
                if self.line.iter().all(|c| c.is_ascii_whitespace()) {
                    continue;
                }
                if self.line[0] != b'>' {
                    return Err(KestrelError::Parse(format!(
                        "FASTA line {}: expected a '>' header",
                        self.line_number
                    )));
                }
                break self.line.clone();
            },
        };

        let header_line = self.line_number;
        let (id, description) = match header_fields(&header) {
            Ok((_, fields)) => fields,
            Err(_) => {
                // Skip this record's residues so iteration can resume at the next header
                self.skip_residues()?;
                return Err(KestrelError::MalformedRecord(format!(
                    "FASTA line {}: header is not valid UTF-8",
                    header_line
                )));
            }
        };
        let mut seq = Sequence::new(id.to_string(), Vec::new());
        if let Some(desc) = description.filter(|d| !d.is_empty()) {
            seq = seq.with_description(desc.to_string());
        }

        while self.read_line()? {
            if self.line.first() == Some(&b'>') {
                self.pending_header = Some(self.line.clone());
                break;
            }
            push_residues(&mut seq.sequence, &self.line);
        }

        Ok(Some(seq))
    }

    fn skip_residues(&mut self) -> KestrelResult<()> {
        while self.read_line()? {
            if self.line.first() == Some(&b'>') {
                self.pending_header = Some(self.line.clone());
                break;
            }
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = KestrelResult<Sequence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(seq)) => Some(Ok(seq)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e @ KestrelError::MalformedRecord(_)) => Some(Err(e)),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Write sequences to any writer, wrapping residues at `line_width` (0 = unwrapped)
pub fn write_fasta_to_writer<W: Write>(
    writer: &mut W,
    sequences: &[Sequence],
    line_width: usize,
) -> KestrelResult<()> {
    for seq in sequences {
        write_record(writer, seq, line_width)?;
    }
    Ok(())
}

/// Write one record
pub fn write_record<W: Write>(writer: &mut W, seq: &Sequence, line_width: usize) -> KestrelResult<()> {
    writer.write_all(seq.header().as_bytes())?;
    writer.write_all(b"\n")?;

    if line_width == 0 {
        writer.write_all(&seq.sequence)?;
        writer.write_all(b"\n")?;
    } else {
        for chunk in seq.sequence.chunks(line_width) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Atomically write sequences to a FASTA file
pub fn write_fasta<P: AsRef<Path>>(
    path: P,
    sequences: &[Sequence],
    line_width: usize,
) -> KestrelResult<()> {
    write_atomic(path, |w| write_fasta_to_writer(w, sequences, line_width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_parse_header() {
        let input = b">CY021709 Influenza A virus (A/duck/Guangdong/2006)\nACGT";
        let (remaining, (id, desc)) = parse_header(input).unwrap();
        assert_eq!(id, "CY021709");
        assert_eq!(desc, Some("Influenza A virus (A/duck/Guangdong/2006)"));
        assert_eq!(remaining, b"ACGT");
    }

    #[test]
    fn test_parse_header_tab_separated() {
        let (_, (id, desc)) = parse_header(b">MN908947\tSARS-CoV-2\n").unwrap();
        assert_eq!(id, "MN908947");
        assert_eq!(desc, Some("SARS-CoV-2"));
    }

    #[test]
    fn test_parse_multiple_records() {
        let input = b">A first\nacgt\nAC\n\n>B\r\nTTTT\r\n>C\n";
        let result = parse_fasta_from_bytes(input).unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].id, "A");
        assert_eq!(result[0].description.as_deref(), Some("first"));
        assert_eq!(result[0].sequence, b"ACGTAC");
        assert_eq!(result[1].id, "B");
        assert_eq!(result[1].sequence, b"TTTT");
        assert_eq!(result[2].id, "C");
        assert!(result[2].is_empty());
    }

    #[test]
    fn test_parse_rejects_leading_garbage() {
        let err = parse_fasta_from_bytes(b"ACGT\n>A\nAC\n").unwrap_err();
        assert!(matches!(err, KestrelError::Parse(_)));
    }

    #[test]
    fn test_streaming_reader_matches_parser() {
        let input = b"\n>A one\nAC-GT\nNN\n>B\nTT\n>C two words\n\nGG\n";
        let parsed = parse_fasta_from_bytes(input).unwrap();
        let streamed: Vec<Sequence> = FastaReader::new(Cursor::new(&input[..]))
            .collect::<KestrelResult<_>>()
            .unwrap();

        assert_eq!(streamed, parsed);
        assert_eq!(streamed[2].description.as_deref(), Some("two words"));
        assert_eq!(streamed[2].sequence, b"GG");
    }

    #[test]
    fn test_streaming_reader_error_stops_iteration() {
        let mut reader = FastaReader::new(Cursor::new(&b"not fasta\n>A\nAC\n"[..]));
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_streaming_reader_skips_record_with_invalid_utf8_header() {
        let input = b">A\nAC\n>\xff\xfe bad\nGGGG\nTT\n>B\nCC\n";
        let mut reader = FastaReader::new(Cursor::new(&input[..]));

        assert_eq!(reader.next().unwrap().unwrap().id, "A");
        match reader.next().unwrap() {
            Err(KestrelError::MalformedRecord(msg)) => assert!(msg.contains("line 3")),
            other => panic!("expected a malformed record, got {:?}", other),
        }
        let b = reader.next().unwrap().unwrap();
        assert_eq!(b.id, "B");
        assert_eq!(b.sequence, b"CC");
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_invalid_utf8_header_is_a_parse_error() {
        assert!(parse_header(b">\xffA\n").is_err());
        assert!(parse_header(b">A \xff\n").is_err());
    }

    #[test]
    fn test_write_wraps_lines() {
        let seqs = vec![
            Sequence::new("A".to_string(), b"ACGTACGTAC".to_vec())
                .with_description("strain x".to_string()),
            Sequence::new("B".to_string(), b"TT".to_vec()),
        ];

        let mut out = Vec::new();
        write_fasta_to_writer(&mut out, &seqs, 4).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            ">A strain x\nACGT\nACGT\nAC\n>B\nTT\n"
        );

        let mut unwrapped = Vec::new();
        write_fasta_to_writer(&mut unwrapped, &seqs, 0).unwrap();
        assert_eq!(
            String::from_utf8(unwrapped).unwrap(),
            ">A strain x\nACGTACGTAC\n>B\nTT\n"
        );
    }

    #[test]
    fn test_file_round_trip_plain_and_gz() {
        let dir = TempDir::new().unwrap();
        let seqs = vec![
            Sequence::new("A".to_string(), b"ACGT".to_vec()),
            Sequence::new("B".to_string(), b"GGCC".to_vec()),
        ];

        let plain = dir.path().join("out.fasta");
        write_fasta(&plain, &seqs, 80).unwrap();
        assert_eq!(parse_fasta(&plain).unwrap(), seqs);

        let gz = dir.path().join("raw.fasta.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(&std::fs::read(&plain).unwrap()).unwrap();
        encoder.finish().unwrap();

        assert_eq!(parse_fasta(&gz).unwrap(), seqs);
        let streamed: Vec<Sequence> = FastaReader::from_path(&gz)
            .unwrap()
            .collect::<KestrelResult<_>>()
            .unwrap();
        assert_eq!(streamed, seqs);
    }

    #[test]
    fn test_parse_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.fasta");
        std::fs::write(&path, "").unwrap();
        assert!(parse_fasta(&path).unwrap().is_empty());
    }
}
