//! Rewriting of localizable literals into `D["Key"]` lookups.

use std::ops::Range;

use razloc_l10n::{LOCALIZER, ResourceCatalog, is_valid_key, synthesize};
use razloc_std::Result;
use tree_sitter::Node;

use crate::filters::LiteralFilters;
use crate::literal::{LiteralContext, LiteralKind};
use crate::parse_csharp;

/// The lookup expression for `key` in C# code.
pub fn code_lookup(key: &str) -> String {
    format!("{LOCALIZER}[\"{key}\"]")
}

/// The result of rewriting one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// The rewritten source.
    pub text: String,
    /// Whether `text` differs from the input.
    pub changed: bool,
}

/// Replaces user-facing string literals with catalog lookups.
#[derive(Default)]
pub struct CodeRewriter {
    filters: LiteralFilters,
}

impl CodeRewriter {
    /// Creates a rewriter classifying literals with `filters`.
    pub fn new(filters: LiteralFilters) -> Self {
        Self { filters }
    }

    /// The filters in use.
    pub fn filters(&self) -> &LiteralFilters {
        &self.filters
    }

    /// Rewrites every localizable literal of `source`.
    ///
    /// Keys are scoped by the first generic argument of the call a literal is
    /// passed to, so `Dialog.OpenAsync<AddUser>("Add User")` becomes
    /// `AddUser.adduser`. Otherwise the enclosing type declaration is used,
    /// and `class_name` when there is none.
    pub fn rewrite(
        &self,
        source: &str,
        class_name: &str,
        catalog: &mut ResourceCatalog,
    ) -> Result<Rewritten> {
        let tree = parse_csharp(source)?;
        let mut literals = Vec::new();
        collect_literals(tree.root_node(), &mut literals);

        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        for node in literals {
            let Some(literal) = LiteralContext::new(node, source) else {
                continue;
            };
            if literal.kind() != LiteralKind::Regular {
                continue;
            }
            if literal.ancestors().any(|node| node.is_error()) {
                log::debug!("skipping literal {} in unparsable code", literal.text());
                continue;
            }
            if !self.filters.is_localizable(&literal) {
                continue;
            }

            let fragment = synthesize(literal.value());
            if fragment.is_empty() {
                continue;
            }
            let key = format!("{}.{fragment}", key_scope(&literal, class_name));
            if !is_valid_key(&key) {
                continue;
            }

            catalog.try_add(&key, literal.value());
            let lookup = code_lookup(&key);
            log::debug!("{class_name}: {} -> {lookup}", literal.text());
            edits.push((node.byte_range(), lookup));
        }

        let mut text = source.to_owned();
        for (range, lookup) in edits.into_iter().rev() {
            text.replace_range(range, &lookup);
        }
        let changed = text != source;
        Ok(Rewritten { text, changed })
    }
}

fn collect_literals<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if LiteralKind::of(node).is_some() {
        out.push(node);
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_literals(child, out);
    }
}

fn key_scope<'t>(literal: &LiteralContext<'t>, class_name: &'t str) -> &'t str {
    let generic = literal
        .enclosing_invocation()
        .and_then(|invocation| invocation.child_by_field_name("function"))
        .and_then(first_type_argument)
        .map(|ty| short_type_name(literal.node_text(ty)))
        .filter(|ty| !ty.is_empty());
    if let Some(ty) = generic {
        return ty;
    }

    literal
        .ancestors()
        .find(|node| {
            matches!(
                node.kind(),
                "class_declaration" | "record_declaration" | "struct_declaration"
            )
        })
        .and_then(|decl| decl.child_by_field_name("name"))
        .map(|name| literal.node_text(name))
        .unwrap_or(class_name)
}

fn first_type_argument(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() == "type_argument_list" {
        return node.named_child(0);
    }
    // Type arguments of a nested call belong to that call.
    let mut cursor = node.walk();
    let children: Vec<_> = node
        .named_children(&mut cursor)
        .filter(|child| !matches!(child.kind(), "invocation_expression" | "argument_list"))
        .collect();
    children.into_iter().find_map(first_type_argument)
}

/// `Pages.AddUser` and `AddUser<T>?` both become `AddUser`.
fn short_type_name(ty: &str) -> &str {
    let ty = ty.split('<').next().unwrap_or_default();
    let ty = ty.trim().trim_end_matches(['?', '[', ']']);
    ty.rsplit('.').next().unwrap_or_default()
}
