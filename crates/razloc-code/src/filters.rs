//! Filters deciding which string literals are code rather than text.
//!
//! A literal is left alone as soon as one filter prohibits it. New filters
//! implement [`LiteralFilter`] and are registered with
//! [`LiteralFilters::push`], or added to [`BUILTIN_FILTERS`].

use std::sync::LazyLock;

use regex::Regex;

use crate::literal::{LiteralContext, LiteralKind};

/// A predicate marking literals that must not be localized.
pub trait LiteralFilter {
    /// The name reported when this filter prohibits a literal.
    fn name(&self) -> &str;

    /// Whether `literal` must be left untouched.
    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool;
}

/// Shortest localizable value, in characters.
pub const MIN_TEXT_LEN: usize = 3;
/// Longest localizable value, in characters.
pub const MAX_TEXT_LEN: usize = 150;

/// Method calls whose direct string arguments are format strings.
pub const DEFAULT_EXCLUDED_METHODS: &[&str] = &["ToString", "Format"];

static EXPORT_METHOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Export").unwrap());
static INVOKE_METHOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Invoke").unwrap());

/// The built-in filters in evaluation order.
pub const BUILTIN_FILTERS: &[fn() -> Box<dyn LiteralFilter>] = &[
    make::<AttributeArgumentFilter>,
    make::<InterpolationFilter>,
    make::<IndexerFilter>,
    make::<MemberAccessFilter>,
    make::<SwitchLabelFilter>,
    make::<NamedArgumentFilter>,
    make::<VariableDeclarationFilter>,
    make::<TooShortFilter>,
    make::<TooLongFilter>,
    make::<VerbatimFilter>,
    make::<BackslashFilter>,
    make::<SlashFilter>,
    make::<MethodCallFilter>,
    make::<EmptyFilter>,
    make::<InitializerFilter>,
    make::<DictionaryKeyFilter>,
    make::<BinaryExpressionFilter>,
    || Box::new(MethodCallFilter::new(["Query"])),
    || Box::new(MethodCallFilter::new(["NavigateTo"])),
    || Box::new(MethodPatternFilter::new("Export call", &EXPORT_METHOD)),
    || Box::new(MethodPatternFilter::new("JS invoke call", &INVOKE_METHOD)),
];

fn make<F: LiteralFilter + Default + 'static>() -> Box<dyn LiteralFilter> {
    Box::new(F::default())
}

/// The composite of all registered filters.
pub struct LiteralFilters {
    filters: Vec<Box<dyn LiteralFilter>>,
}

impl Default for LiteralFilters {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LiteralFilters {
    /// A composite without any filter.
    pub fn empty() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The built-in filters.
    pub fn builtin() -> Self {
        Self {
            filters: BUILTIN_FILTERS.iter().map(|make| make()).collect(),
        }
    }

    /// The built-in filters plus one that excludes arguments of `methods`.
    pub fn with_excluded_methods<S: Into<String>>(methods: impl IntoIterator<Item = S>) -> Self {
        let mut filters = Self::builtin();
        let methods: Vec<String> = methods.into_iter().map(Into::into).collect();
        if !methods.is_empty() {
            filters.push(MethodCallFilter::new(methods));
        }
        filters
    }

    /// Registers another filter after the existing ones.
    pub fn push(&mut self, filter: impl LiteralFilter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// The registered filters in order.
    pub fn filters(&self) -> impl Iterator<Item = &dyn LiteralFilter> {
        self.filters.iter().map(|filter| &**filter)
    }

    /// The first filter prohibiting `literal`.
    pub fn prohibiting(&self, literal: &LiteralContext<'_>) -> Option<&dyn LiteralFilter> {
        self.filters().find(|filter| filter.is_prohibited(literal))
    }

    /// Whether `literal` is a plain string literal no filter prohibits.
    pub fn is_localizable(&self, literal: &LiteralContext<'_>) -> bool {
        literal.kind() == LiteralKind::Regular && !self.is_prohibited(literal)
    }
}

impl LiteralFilter for LiteralFilters {
    fn name(&self) -> &str {
        "Composite"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        match self.prohibiting(literal) {
            Some(filter) => {
                log::debug!(
                    "literal {} is not localizable because of filter '{}'",
                    literal.text(),
                    filter.name()
                );
                true
            }
            None => false,
        }
    }
}

/// Arguments of attributes, e.g. `[Route("/users")]`.
#[derive(Default)]
pub struct AttributeArgumentFilter;

impl LiteralFilter for AttributeArgumentFilter {
    fn name(&self) -> &str {
        "Attribute argument"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal.has_ancestor(&["attribute_argument", "attribute"])
    }
}

/// Parts of interpolated strings.
#[derive(Default)]
pub struct InterpolationFilter;

impl LiteralFilter for InterpolationFilter {
    fn name(&self) -> &str {
        "Interpolated string"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        matches!(
            literal.parent_kind(),
            "interpolated_string_expression"
                | "interpolation"
                | "interpolation_alignment_clause"
                | "interpolation_format_clause"
        )
    }
}

/// Subscripts of element access, e.g. `row["Name"]` or `D["Key"]`.
#[derive(Default)]
pub struct IndexerFilter;

impl LiteralFilter for IndexerFilter {
    fn name(&self) -> &str {
        "Indexer"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        let Some(list) = bracketed_argument_list(literal) else {
            return false;
        };
        list.parent().is_some_and(|access| {
            matches!(
                access.kind(),
                "element_access_expression" | "element_binding_expression"
            )
        })
    }
}

/// Receivers of member access, e.g. `"id".Length`.
#[derive(Default)]
pub struct MemberAccessFilter;

impl LiteralFilter for MemberAccessFilter {
    fn name(&self) -> &str {
        "Member access"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal
            .parent()
            .filter(|parent| parent.kind() == "member_access_expression")
            .is_some_and(|parent| literal.is_field_of(parent, "expression"))
    }
}

/// Constant patterns, e.g. `case "admin":`, `"x" => ..` or `is "x"`.
#[derive(Default)]
pub struct SwitchLabelFilter;

impl LiteralFilter for SwitchLabelFilter {
    fn name(&self) -> &str {
        "Switch label"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        let owner = literal.ancestors().find(|node| {
            !matches!(
                node.kind(),
                "constant_pattern"
                    | "parenthesized_pattern"
                    | "or_pattern"
                    | "and_pattern"
                    | "negated_pattern"
                    | "parenthesized_expression"
            )
        });
        owner.is_some_and(|node| {
            matches!(
                node.kind(),
                "switch_section"
                    | "case_switch_label"
                    | "case_pattern_switch_label"
                    | "switch_expression_arm"
                    | "is_pattern_expression"
            )
        })
    }
}

/// Names in `name: value` and `name = value` bindings.
#[derive(Default)]
pub struct NamedArgumentFilter;

impl LiteralFilter for NamedArgumentFilter {
    fn name(&self) -> &str {
        "Named argument"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        matches!(literal.parent_kind(), "name_colon" | "name_equals")
    }
}

/// Identifier suffixes of variables holding code rather than text.
const CODE_VARIABLE_SUFFIXES: &[&str] = &[
    "key", "id", "path", "url", "uri", "route", "format", "pattern", "regex", "selector", "event",
];

/// Initializers that must stay constant or hold identifiers: fields,
/// properties, constants, parameter defaults and variables named like
/// `userId` or `routePath`.
#[derive(Default)]
pub struct VariableDeclarationFilter;

impl LiteralFilter for VariableDeclarationFilter {
    fn name(&self) -> &str {
        "Variable declaration"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        let Some(mut parent) = literal.parent() else {
            return false;
        };
        if parent.kind() == "equals_value_clause" {
            match parent.parent() {
                Some(grand) => parent = grand,
                None => return false,
            }
        }

        match parent.kind() {
            "parameter" | "property_declaration" => true,
            "variable_declarator" => {
                let declaration = parent
                    .parent()
                    .filter(|node| node.kind() == "variable_declaration")
                    .and_then(|node| node.parent());
                if let Some(declaration) = declaration {
                    match declaration.kind() {
                        "field_declaration" | "event_field_declaration" => return true,
                        "local_declaration_statement" if has_const_modifier(literal, declaration) => {
                            return true;
                        }
                        _ => {}
                    }
                }

                let name = parent
                    .child_by_field_name("name")
                    .or_else(|| parent.named_child(0))
                    .map(|name| literal.node_text(name).to_ascii_lowercase())
                    .unwrap_or_default();
                CODE_VARIABLE_SUFFIXES
                    .iter()
                    .any(|suffix| name.ends_with(suffix))
            }
            _ => false,
        }
    }
}

fn has_const_modifier(literal: &LiteralContext<'_>, declaration: tree_sitter::Node<'_>) -> bool {
    let mut cursor = declaration.walk();
    declaration
        .children(&mut cursor)
        .any(|child| child.kind() == "modifier" && literal.node_text(child) == "const")
}

/// Values shorter than [`MIN_TEXT_LEN`].
#[derive(Default)]
pub struct TooShortFilter;

impl LiteralFilter for TooShortFilter {
    fn name(&self) -> &str {
        "Too short"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal.value().chars().count() < MIN_TEXT_LEN
    }
}

/// Values longer than [`MAX_TEXT_LEN`].
#[derive(Default)]
pub struct TooLongFilter;

impl LiteralFilter for TooLongFilter {
    fn name(&self) -> &str {
        "Too long"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal.value().chars().count() > MAX_TEXT_LEN
    }
}

/// Verbatim, raw and UTF-8 literals.
#[derive(Default)]
pub struct VerbatimFilter;

impl LiteralFilter for VerbatimFilter {
    fn name(&self) -> &str {
        "Verbatim string"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal.kind() != LiteralKind::Regular
    }
}

/// Values containing a backslash.
#[derive(Default)]
pub struct BackslashFilter;

impl LiteralFilter for BackslashFilter {
    fn name(&self) -> &str {
        "Escape sequence"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal.value().contains('\\')
    }
}

/// Values containing a slash, which are usually paths or URLs.
#[derive(Default)]
pub struct SlashFilter;

impl LiteralFilter for SlashFilter {
    fn name(&self) -> &str {
        "Slash"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal.value().contains('/')
    }
}

/// Direct arguments of calls to the given methods.
pub struct MethodCallFilter {
    name: String,
    methods: Vec<String>,
}

impl Default for MethodCallFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_METHODS.iter().copied())
    }
}

impl MethodCallFilter {
    /// Excludes direct arguments of calls to any of `methods`.
    pub fn new<S: Into<String>>(methods: impl IntoIterator<Item = S>) -> Self {
        let methods: Vec<String> = methods.into_iter().map(Into::into).collect();
        Self {
            name: format!("Method call ({})", methods.join(", ")),
            methods,
        }
    }
}

impl LiteralFilter for MethodCallFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal
            .argument_of()
            .and_then(|invocation| literal.invoked_name(invocation))
            .is_some_and(|name| self.methods.iter().any(|method| method == name))
    }
}

/// Literals anywhere inside a call to a method whose name matches a regex.
pub struct MethodPatternFilter {
    name: &'static str,
    pattern: &'static Regex,
}

impl MethodPatternFilter {
    /// Excludes literals inside calls whose method name matches `pattern`.
    pub fn new(name: &'static str, pattern: &'static Regex) -> Self {
        Self { name, pattern }
    }
}

impl LiteralFilter for MethodPatternFilter {
    fn name(&self) -> &str {
        self.name
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal
            .enclosing_invocation()
            .and_then(|invocation| literal.invoked_name(invocation))
            .is_some_and(|name| self.pattern.is_match(name))
    }
}

/// Values that are empty or only whitespace.
#[derive(Default)]
pub struct EmptyFilter;

impl LiteralFilter for EmptyFilter {
    fn name(&self) -> &str {
        "Empty"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal.value().trim().is_empty()
    }
}

/// Literals inside object and collection initializers.
#[derive(Default)]
pub struct InitializerFilter;

impl LiteralFilter for InitializerFilter {
    fn name(&self) -> &str {
        "Initializer expression"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal.has_ancestor(&["initializer_expression", "collection_expression"])
    }
}

/// Keys in bracketed argument lists, e.g. `["Name"] = value`.
#[derive(Default)]
pub struct DictionaryKeyFilter;

impl LiteralFilter for DictionaryKeyFilter {
    fn name(&self) -> &str {
        "String in dictionary"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        bracketed_argument_list(literal).is_some()
    }
}

/// Direct operands of binary operators, e.g. `value == "Logout"`.
#[derive(Default)]
pub struct BinaryExpressionFilter;

impl LiteralFilter for BinaryExpressionFilter {
    fn name(&self) -> &str {
        "Binary expression"
    }

    fn is_prohibited(&self, literal: &LiteralContext<'_>) -> bool {
        literal.parent_kind() == "binary_expression"
    }
}

fn bracketed_argument_list<'t>(literal: &LiteralContext<'t>) -> Option<tree_sitter::Node<'t>> {
    literal
        .parent()
        .filter(|node| node.kind() == "argument")?
        .parent()
        .filter(|node| node.kind() == "bracketed_argument_list")
}
