//! Nexus conversion and Taxonium annotation of trees

use kestrel_bio::{parse_newick, parse_nexus, write_newick, NewickStyle, Node, Tree};
use kestrel_core::KestrelResult;
use std::path::Path;

/// How many tip labels were rewritten
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnnotateSummary {
    pub annotated: usize,
    pub unchanged: usize,
}

/// Read a tree file, Nexus or Newick, detected from its first bytes
pub fn read_tree(path: &Path) -> KestrelResult<Tree> {
    let text = std::fs::read_to_string(path)?;
    let head = text.trim_start().trim_start_matches('\u{feff}');
    if head.get(..6).is_some_and(|h| h.eq_ignore_ascii_case("#nexus")) {
        parse_nexus(&text)
    } else {
        parse_newick(&text)
    }
}

/// Write the first tree of a Nexus file as plain Newick without comments
pub fn convert_nexus(input: &Path, output: &Path, topology_only: bool) -> KestrelResult<usize> {
    let text = std::fs::read_to_string(input)?;
    let tree = parse_nexus(&text)?;
    let style = NewickStyle {
        branch_lengths: !topology_only,
        comments: false,
    };
    write_newick(output, &tree, style)?;
    Ok(tree.root.leaf_count())
}

/// Move `accession|name|subtype|host[|country]` fields into a node comment
///
/// Returns `None` when the name carries no `|`, `Some(false)` when it has
/// an unexpected number of fields and is left alone.
fn annotate_node(node: &mut Node) -> Option<bool> {
    let name = node.name.as_deref().filter(|n| n.contains('|'))?;
    let fields: Vec<&str> = name.split('|').collect();
    if fields.len() != 4 && fields.len() != 5 {
        tracing::warn!("Unexpected label format ({} fields): {}", fields.len(), name);
        return Some(false);
    }

    let mut attributes = format!(
        "name={},subtype={},host={}",
        fields[1], fields[2], fields[3]
    );
    if let Some(country) = fields.get(4) {
        attributes.push_str(&format!(",country={}", country));
    }
    let accession = fields[0].to_string();

    node.comment = Some(match node.comment.take() {
        Some(existing) if !existing.is_empty() => format!("{},{}", existing, attributes),
        _ => format!("&{}", attributes),
    });
    node.name = Some(accession);
    Some(true)
}

/// Annotate every node of `tree`
///
/// With `taxonium_compat` every comment ends in `,` so Taxonium does not
/// read the closing bracket as part of the last value.
pub fn annotate_tree(tree: &mut Tree, taxonium_compat: bool) -> AnnotateSummary {
    let mut summary = AnnotateSummary::default();
    tree.root.visit_mut(&mut |node| {
        match annotate_node(node) {
            Some(true) => summary.annotated += 1,
            Some(false) => summary.unchanged += 1,
            None => {}
        }
        if taxonium_compat {
            if let Some(comment) = node.comment.as_mut().filter(|c| !c.ends_with(',')) {
                comment.push(',');
            }
        }
    });
    summary
}

/// Annotate the tree in `input` and write it as Newick with comments
pub fn annotate_file(input: &Path, output: &Path, taxonium_compat: bool) -> KestrelResult<AnnotateSummary> {
    let mut tree = read_tree(input)?;
    let summary = annotate_tree(&mut tree, taxonium_compat);
    write_newick(output, &tree, NewickStyle::default())?;
    tracing::info!(
        "Annotated {} labels, left {} unchanged",
        summary.annotated,
        summary.unchanged
    );
    Ok(summary)
}
