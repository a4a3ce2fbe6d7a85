//! Multiple sequence alignment stage
//!
//! The alignment itself comes from an external tool; this stage refuses
//! empty input and rejects any tool output that is not an alignment of
//! exactly the input records.

use super::report::StageReport;
use kestrel_bio::{parse_fasta, write_fasta, Sequence};
use kestrel_core::{KestrelError, KestrelResult};
use kestrel_tools::MultipleAligner;
use std::collections::HashSet;
use std::path::Path;

fn describe(ids: &[&str]) -> String {
    let shown: Vec<&str> = ids.iter().take(3).copied().collect();
    if ids.len() > shown.len() {
        format!("{} and {} more", shown.join(", "), ids.len() - shown.len())
    } else {
        shown.join(", ")
    }
}

/// Check that `aligned` is a usable alignment of `input` and upper-case it
pub fn validate_alignment(
    tool: &str,
    input: &[Sequence],
    mut aligned: Vec<Sequence>,
) -> KestrelResult<Vec<Sequence>> {
    if aligned.is_empty() {
        return Err(KestrelError::external_tool(tool, "produced no aligned records"));
    }

    let expected = aligned[0].len();
    if let Some(odd) = aligned.iter().find(|s| s.len() != expected) {
        return Err(KestrelError::external_tool(
            tool,
            format!(
                "aligned records differ in length ({} has {}, expected {})",
                odd.id,
                odd.len(),
                expected
            ),
        ));
    }

    let input_ids: HashSet<&str> = input.iter().map(|s| s.id.as_str()).collect();
    let output_ids: HashSet<&str> = aligned.iter().map(|s| s.id.as_str()).collect();
    if output_ids.len() != aligned.len() {
        return Err(KestrelError::external_tool(
            tool,
            "output repeats a sequence identifier",
        ));
    }
    if input_ids != output_ids {
        let mut missing: Vec<&str> = input_ids.difference(&output_ids).copied().collect();
        let mut unexpected: Vec<&str> = output_ids.difference(&input_ids).copied().collect();
        missing.sort_unstable();
        unexpected.sort_unstable();

        let mut problems = Vec::new();
        if !missing.is_empty() {
            problems.push(format!("missing {}", describe(&missing)));
        }
        if !unexpected.is_empty() {
            problems.push(format!("unexpected {}", describe(&unexpected)));
        }
        return Err(KestrelError::external_tool(
            tool,
            format!("output identifiers differ from input ({})", problems.join("; ")),
        ));
    }

    for seq in &mut aligned {
        seq.sequence.make_ascii_uppercase();
    }
    Ok(aligned)
}

/// Run `aligner` and validate what it returns
pub fn align_sequences(
    aligner: &dyn MultipleAligner,
    sequences: &[Sequence],
) -> KestrelResult<Vec<Sequence>> {
    if sequences.is_empty() {
        return Err(KestrelError::InvalidInput(
            "no sequences to align".to_string(),
        ));
    }

    tracing::info!("Aligning {} sequences with {}", sequences.len(), aligner.name());
    let aligned = aligner.align(sequences).map_err(|e| match e.downcast::<KestrelError>() {
        Ok(err) => err,
        Err(other) => KestrelError::external_tool(aligner.name(), format!("{:#}", other)),
    })?;

    validate_alignment(aligner.name(), sequences, aligned)
}

/// Align the FASTA at `input` into `output`
pub fn align_fasta(
    input: &Path,
    output: &Path,
    aligner: &dyn MultipleAligner,
    line_width: usize,
) -> KestrelResult<StageReport> {
    let sequences = parse_fasta(input)?;
    let aligned = align_sequences(aligner, &sequences)?;
    write_fasta(output, &aligned, line_width)?;

    let mut report = StageReport::new("align");
    report.records_in = sequences.len();
    report.records_out = aligned.len();
    report.note("tool", aligner.name());
    report.note("alignment_length", aligned[0].len());
    if let Ok(version) = aligner.version() {
        report.note("tool_version", version);
    }
    report.log_summary();
    Ok(report)
}
