//! Localization of string literals in C# code.
//!
//! Literals are found in a tree-sitter syntax tree, classified by the
//! [`LiteralFilters`] and, when they read like user-facing text, replaced
//! with `D["Key"]` lookups by the [`CodeRewriter`].

pub mod filters;
pub mod literal;
pub mod rewriter;

pub use filters::{LiteralFilter, LiteralFilters};
pub use literal::{LiteralContext, LiteralKind};
pub use rewriter::{CodeRewriter, Rewritten};

use razloc_std::error::prelude::*;
use tree_sitter::{Parser, Tree};

/// Parses C# source text.
pub fn parse_csharp(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
        .context_ut("load C# grammar")?;
    parser.parse(source, None).context("parse C# source")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_loads() {
        let tree = parse_csharp("class Users { string Title => \"Users\"; }").unwrap();
        let root = tree.root_node();
        assert_eq!(root.kind(), "compilation_unit");
        assert!(!root.has_error());
    }
}
