//! Newick trees
//!
//! Supports quoted labels (`'A B'`, with `''` as an escaped quote), branch
//! lengths, and `[...]` comments after the label or after the branch
//! length. Comments at the same node are joined with `,`.

use kestrel_core::error::{KestrelError, KestrelResult};
use kestrel_core::write_atomic;
use nom::{
    branch::alt,
    bytes::complete::{take_till, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, preceded},
    IResult,
};
use std::io::Write;
use std::path::Path;

const UNQUOTED_STOP: &str = "()[]':;,";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub branch_length: Option<f64>,
    pub comment: Option<String>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub root: Node,
}

/// What to keep when writing a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewickStyle {
    pub branch_lengths: bool,
    pub comments: bool,
}

impl Default for NewickStyle {
    fn default() -> Self {
        Self {
            branch_lengths: true,
            comments: true,
        }
    }
}

impl Node {
    pub fn leaf(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaves below (and including) this node
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(Node::leaf_count).sum()
        }
    }

    /// Leaf labels in tree order
    pub fn leaf_names(&self) -> Vec<&str> {
        if self.is_leaf() {
            vec![self.name.as_deref().unwrap_or("")]
        } else {
            self.children.iter().flat_map(Node::leaf_names).collect()
        }
    }

    /// Visit this node and every descendant, parents first
    pub fn visit_mut<F: FnMut(&mut Node)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    fn write_to(&self, out: &mut String, style: NewickStyle) {
        if !self.children.is_empty() {
            out.push('(');
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                child.write_to(out, style);
            }
            out.push(')');
        }

        if let Some(name) = &self.name {
            out.push_str(&quote_label(name));
        }
        if style.branch_lengths {
            if let Some(length) = self.branch_length {
                out.push(':');
                out.push_str(&length.to_string());
            }
        }
        if style.comments {
            if let Some(comment) = &self.comment {
                out.push('[');
                out.push_str(comment);
                out.push(']');
            }
        }
    }
}

impl Tree {
    /// Serialize as a single Newick line terminated by `;`
    pub fn to_newick(&self, style: NewickStyle) -> String {
        let mut out = String::new();
        self.root.write_to(&mut out, style);
        out.push(';');
        out
    }
}

/// Quote a label if it contains characters Newick treats as syntax
pub fn quote_label(name: &str) -> String {
    let needs_quotes = name.is_empty()
        || name
            .chars()
            .any(|c| c.is_whitespace() || UNQUOTED_STOP.contains(c));
    if needs_quotes {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

fn unquoted_label(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| !c.is_whitespace() && !UNQUOTED_STOP.contains(c)),
        str::to_string,
    )(input)
}

fn quoted_label(input: &str) -> IResult<&str, String> {
    let (mut input, _) = char('\'')(input)?;
    let mut label = String::new();
    loop {
        let (rest, chunk) = take_till(|c| c == '\'')(input)?;
        label.push_str(chunk);
        let (rest, _) = char('\'')(rest)?;
        match rest.strip_prefix('\'') {
            Some(after) => {
                label.push('\'');
                input = after;
            }
            None => return Ok((rest, label)),
        }
    }
}

pub(crate) fn label(input: &str) -> IResult<&str, String> {
    alt((quoted_label, unquoted_label))(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    delimited(char('['), take_till(|c| c == ']'), char(']'))(input)
}

fn comments(input: &str) -> IResult<&str, Vec<&str>> {
    many0(preceded(multispace0, comment))(input)
}

fn children(input: &str) -> IResult<&str, Vec<Node>> {
    delimited(
        char('('),
        separated_list1(preceded(multispace0, char(',')), subtree),
        preceded(multispace0, char(')')),
    )(input)
}

fn subtree(input: &str) -> IResult<&str, Node> {
    let (input, _) = multispace0(input)?;
    let (input, children) = opt(children)(input)?;
    let (input, name) = opt(preceded(multispace0, label))(input)?;
    let (input, mut notes) = comments(input)?;
    let (input, branch_length) = opt(preceded(
        preceded(multispace0, char(':')),
        preceded(multispace0, double),
    ))(input)?;
    let (input, trailing) = comments(input)?;
    notes.extend(trailing);

    let comment = if notes.is_empty() {
        None
    } else {
        Some(notes.join(","))
    };

    Ok((
        input,
        Node {
            name: name.filter(|n| !n.is_empty()),
            branch_length,
            comment,
            children: children.unwrap_or_default(),
        },
    ))
}

fn tree(input: &str) -> IResult<&str, Tree> {
    // Rooting annotations such as `[&R]` before the tree carry no node data
    let (input, _) = comments(input)?;
    let (input, root) = subtree(input)?;
    let (input, _) = preceded(multispace0, char(';'))(input)?;
    Ok((input, Tree { root }))
}

/// Parse the first tree in a Newick string
pub fn parse_newick(input: &str) -> KestrelResult<Tree> {
    let (rest, tree) = tree(input).map_err(|e| {
        KestrelError::Parse(format!("Failed to parse Newick tree: {:?}", e))
    })?;

    if !rest.trim().is_empty() && !rest.trim_start().starts_with('(') {
        return Err(KestrelError::Parse(format!(
            "Unexpected text after Newick tree: {}",
            rest.trim().chars().take(40).collect::<String>()
        )));
    }
    Ok(tree)
}

/// Atomically write a tree followed by a newline
pub fn write_newick<P: AsRef<Path>>(path: P, tree: &Tree, style: NewickStyle) -> KestrelResult<()> {
    let text = tree.to_newick(style);
    write_atomic(path, |w| -> KestrelResult<()> {
        w.write_all(text.as_bytes())?;
        w.write_all(b"\n")?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple() {
        let tree = parse_newick("((A:0.1,B:0.2)90:0.05,C:0.3);").unwrap();
        let root = &tree.root;
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.leaf_count(), 3);

        let inner = &root.children[0];
        assert_eq!(inner.name.as_deref(), Some("90"));
        assert_eq!(inner.branch_length, Some(0.05));
        assert_eq!(inner.children[1], Node {
            name: Some("B".to_string()),
            branch_length: Some(0.2),
            ..Default::default()
        });
    }

    #[test]
    fn test_parse_quoted_labels_and_comments() {
        let input = "( 'CY1|A/duck/HK|H5N1|duck' [&x=1]:0.1 , 'it''s':2[&y=2] )root;\n";
        let tree = parse_newick(input).unwrap();
        let a = &tree.root.children[0];
        assert_eq!(a.name.as_deref(), Some("CY1|A/duck/HK|H5N1|duck"));
        assert_eq!(a.comment.as_deref(), Some("&x=1"));
        assert_eq!(a.branch_length, Some(0.1));

        let b = &tree.root.children[1];
        assert_eq!(b.name.as_deref(), Some("it's"));
        assert_eq!(b.comment.as_deref(), Some("&y=2"));
        assert_eq!(tree.root.name.as_deref(), Some("root"));
    }

    #[test]
    fn test_parse_leading_rooting_comment() {
        let tree = parse_newick("[&R] (A,B);").unwrap();
        assert_eq!(tree.root.leaf_count(), 2);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_newick("(A,B)").is_err());
        assert!(parse_newick("(A,(B,C);").is_err());
        assert!(parse_newick("(A,B); trailing").is_err());
    }

    #[test]
    fn test_write_round_trip() {
        let input = "((A:0.1,'B C':0.2[&n=1])0.9:0.05,C:1.5);";
        let tree = parse_newick(input).unwrap();
        assert_eq!(tree.to_newick(NewickStyle::default()), input);
        assert_eq!(parse_newick(&tree.to_newick(NewickStyle::default())).unwrap(), tree);
    }

    #[test]
    fn test_write_topology_only() {
        let tree = parse_newick("((A:0.1,B:0.2[&c]):0.05,C:0.3);").unwrap();
        let style = NewickStyle {
            branch_lengths: false,
            comments: false,
        };
        assert_eq!(tree.to_newick(style), "((A,B),C);");
    }

    #[test]
    fn test_visit_mut_renames_every_leaf() {
        let mut tree = parse_newick("((a,b),c);").unwrap();
        tree.root.visit_mut(&mut |node| {
            if let Some(name) = &mut node.name {
                *name = name.to_uppercase();
            }
        });
        assert_eq!(tree.to_newick(NewickStyle::default()), "((A,B),C);");
    }

    #[test]
    fn test_quote_label() {
        assert_eq!(quote_label("CY1|H5N1"), "CY1|H5N1");
        assert_eq!(quote_label("A/duck (HK)"), "'A/duck (HK)'");
        assert_eq!(quote_label("it's"), "'it''s'");
    }
}
