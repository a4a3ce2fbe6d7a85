//! Nexus tree files (BEAST, MrBayes, IQ-TREE exports)
//!
//! Only the TREES block is read. Numeric tip labels are mapped back to
//! taxon names through the block's TRANSLATE table.

use super::newick::{label, parse_newick, Tree};
use kestrel_core::error::{KestrelError, KestrelResult};
use nom::{
    character::complete::{char, multispace0, multispace1},
    combinator::opt,
    multi::separated_list0,
    sequence::{preceded, separated_pair, terminated},
    IResult,
};
use std::collections::HashMap;

/// Split on `;` outside quotes and `[...]` comments
fn statements(input: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    let mut comment_depth = 0usize;

    for (idx, c) in input.char_indices() {
        match c {
            '\'' if comment_depth == 0 => in_quote = !in_quote,
            '[' if !in_quote => comment_depth += 1,
            ']' if !in_quote && comment_depth > 0 => comment_depth -= 1,
            ';' if !in_quote && comment_depth == 0 => {
                out.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if !input[start..].trim().is_empty() {
        out.push(&input[start..]);
    }
    out
}

/// Drop leading whitespace and `[...]` comments
fn strip_leading_comments(mut statement: &str) -> &str {
    loop {
        statement = statement.trim_start();
        match statement.strip_prefix('[').and_then(|s| s.find(']').map(|end| &s[end + 1..])) {
            Some(rest) => statement = rest,
            None => return statement,
        }
    }
}

fn keyword(statement: &str) -> String {
    statement
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn translate_entries(input: &str) -> IResult<&str, Vec<(String, String)>> {
    terminated(
        separated_list0(
            preceded(multispace0, char(',')),
            preceded(multispace0, separated_pair(label, multispace1, label)),
        ),
        preceded(multispace0, opt(char(','))),
    )(input)
}

fn parse_translate(body: &str) -> KestrelResult<HashMap<String, String>> {
    let (rest, entries) = translate_entries(body)
        .map_err(|e| KestrelError::Parse(format!("Invalid TRANSLATE table: {:?}", e)))?;
    if !rest.trim().is_empty() {
        return Err(KestrelError::Parse(format!(
            "Invalid TRANSLATE entry near: {}",
            rest.trim().chars().take(40).collect::<String>()
        )));
    }
    Ok(entries.into_iter().collect())
}

/// Read the first tree of a Nexus TREES block, with TRANSLATE applied
pub fn parse_nexus(input: &str) -> KestrelResult<Tree> {
    let trimmed = input.trim_start().trim_start_matches('\u{feff}');
    if !trimmed
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("#nexus"))
    {
        return Err(KestrelError::Parse("Missing #NEXUS header".to_string()));
    }
    let body = &trimmed[6..];

    let mut in_trees = false;
    let mut translate = HashMap::new();

    for statement in statements(body) {
        let statement = strip_leading_comments(statement);
        let word = keyword(statement);

        if !in_trees {
            if word == "begin" && keyword(&statement[5..]) == "trees" {
                in_trees = true;
            }
            continue;
        }

        match word.as_str() {
            "translate" => {
                translate = parse_translate(&statement["translate".len()..])?;
            }
            "tree" => {
                let (_, newick) = statement.split_once('=').ok_or_else(|| {
                    KestrelError::Parse("TREE statement without '='".to_string())
                })?;
                let mut tree = parse_newick(&format!("{};", newick))?;
                if !translate.is_empty() {
                    tree.root.visit_mut(&mut |node| {
                        if let Some(name) = node.name.as_ref().and_then(|n| translate.get(n)) {
                            node.name = Some(name.clone());
                        }
                    });
                }
                return Ok(tree);
            }
            "end" | "endblock" => in_trees = false,
            _ => {}
        }
    }

    Err(KestrelError::NotFound(
        "No tree found in Nexus TREES block".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::newick::NewickStyle;
    use pretty_assertions::assert_eq;

    const BEAST_STYLE: &str = "#NEXUS\n\
        [exported by a tree builder]\n\
        Begin taxa;\n\
            Dimensions ntax=3;\n\
        End;\n\
        Begin trees;\n\
            Translate\n\
                1 CY021709,\n\
                2 'CY1|A/duck (HK)|H5N1|duck',\n\
                3 MN908947\n\
            ;\n\
            tree TREE1 = [&R] ((1[&rate=1.0]:0.1,2:0.2):0.05,3:0.3);\n\
            tree TREE2 = (1,2,3);\n\
        End;\n";

    #[test]
    fn test_first_tree_with_translate() {
        let tree = parse_nexus(BEAST_STYLE).unwrap();
        assert_eq!(
            tree.root.leaf_names(),
            vec!["CY021709", "CY1|A/duck (HK)|H5N1|duck", "MN908947"]
        );

        let style = NewickStyle {
            branch_lengths: true,
            comments: false,
        };
        assert_eq!(
            tree.to_newick(style),
            "((CY021709:0.1,'CY1|A/duck (HK)|H5N1|duck':0.2):0.05,MN908947:0.3);"
        );
    }

    #[test]
    fn test_without_translate() {
        let input = "#nexus\nbegin trees;\n tree one = (A:1,B:2);\nend;";
        let tree = parse_nexus(input).unwrap();
        assert_eq!(tree.to_newick(NewickStyle::default()), "(A:1,B:2);");
    }

    #[test]
    fn test_missing_header_or_tree() {
        assert!(matches!(
            parse_nexus("(A,B);"),
            Err(KestrelError::Parse(_))
        ));
        assert!(matches!(
            parse_nexus("#NEXUS\nbegin taxa;\nend;\n"),
            Err(KestrelError::NotFound(_))
        ));
    }

    #[test]
    fn test_statements_respect_quotes_and_comments() {
        let parts = statements("a 'x;y' [c;d] b; c;");
        assert_eq!(parts, vec!["a 'x;y' [c;d] b", " c"]);
    }
}
