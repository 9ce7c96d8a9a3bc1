//! String literals and the syntax around them.

use tree_sitter::Node;

/// The syntax a string literal is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// `"text"`
    Regular,
    /// `@"text"`
    Verbatim,
    /// `"""text"""`
    Raw,
    /// `"text"u8`
    Utf8,
}

impl LiteralKind {
    /// The kind of a literal node, or `None` if `node` is not a string literal.
    pub fn of(node: Node<'_>) -> Option<Self> {
        match node.kind() {
            "string_literal" => {
                let mut cursor = node.walk();
                let utf8 = node
                    .children(&mut cursor)
                    .any(|child| child.kind() == "string_literal_encoding");
                Some(if utf8 { Self::Utf8 } else { Self::Regular })
            }
            "verbatim_string_literal" => Some(Self::Verbatim),
            "raw_string_literal" => Some(Self::Raw),
            _ => None,
        }
    }
}

/// A string literal together with its position in the syntax tree.
pub struct LiteralContext<'t> {
    node: Node<'t>,
    source: &'t str,
    kind: LiteralKind,
    value: String,
}

impl<'t> LiteralContext<'t> {
    /// Wraps a string literal node of a tree parsed from `source`.
    pub fn new(node: Node<'t>, source: &'t str) -> Option<Self> {
        let kind = LiteralKind::of(node)?;
        let text = source.get(node.byte_range())?;
        let value = match kind {
            LiteralKind::Regular => unescape(strip_quotes(text)),
            LiteralKind::Utf8 => {
                let text = text.trim_end_matches(['u', 'U', '8']);
                unescape(strip_quotes(text))
            }
            LiteralKind::Verbatim => {
                strip_quotes(text.strip_prefix('@').unwrap_or(text)).replace("\"\"", "\"")
            }
            LiteralKind::Raw => text.trim_matches('"').to_owned(),
        };
        Some(Self {
            node,
            source,
            kind,
            value,
        })
    }

    /// The literal node.
    pub fn node(&self) -> Node<'t> {
        self.node
    }

    /// The literal syntax.
    pub fn kind(&self) -> LiteralKind {
        self.kind
    }

    /// The literal as written, quotes included.
    pub fn text(&self) -> &'t str {
        self.node_text(self.node)
    }

    /// The string value with escapes resolved.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The source text of any node in the same tree.
    pub fn node_text(&self, node: Node<'_>) -> &'t str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    /// The syntactic parent.
    pub fn parent(&self) -> Option<Node<'t>> {
        self.node.parent()
    }

    /// The kind of the syntactic parent, or `""` at the root.
    pub fn parent_kind(&self) -> &'static str {
        self.parent().map_or("", |parent| parent.kind())
    }

    /// All ancestors, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        std::iter::successors(self.node.parent(), |node| node.parent())
    }

    /// Whether any ancestor has the given kind.
    pub fn has_ancestor(&self, kinds: &[&str]) -> bool {
        self.ancestors().any(|node| kinds.contains(&node.kind()))
    }

    /// The nearest enclosing method invocation.
    pub fn enclosing_invocation(&self) -> Option<Node<'t>> {
        self.ancestors()
            .find(|node| node.kind() == "invocation_expression")
    }

    /// The invocation this literal is passed to directly, as in `Call("text")`.
    pub fn argument_of(&self) -> Option<Node<'t>> {
        let argument = self.parent().filter(|node| node.kind() == "argument")?;
        let list = argument.parent().filter(|node| node.kind() == "argument_list")?;
        list.parent()
            .filter(|node| node.kind() == "invocation_expression")
    }

    /// Whether this literal is the `field` child of `node`.
    pub fn is_field_of(&self, node: Node<'_>, field: &str) -> bool {
        node.child_by_field_name(field)
            .is_some_and(|child| child.id() == self.node.id())
    }

    /// The name of the method called by `invocation`, e.g. `Format` for
    /// `string.Format(..)` and `OpenAsync` for `Dialog.OpenAsync<T>(..)`.
    pub fn invoked_name(&self, invocation: Node<'_>) -> Option<&'t str> {
        let mut function = invocation.child_by_field_name("function")?;
        if function.kind() == "member_access_expression" {
            function = function.child_by_field_name("name")?;
        }
        if function.kind() == "generic_name" {
            function = function.named_child(0)?;
        }
        (function.kind() == "identifier").then(|| self.node_text(function))
    }
}

fn strip_quotes(text: &str) -> &str {
    let text = text.strip_prefix('"').unwrap_or(text);
    text.strip_suffix('"').unwrap_or(text)
}

/// Resolves the escape sequences of a regular literal body. An unknown escape
/// keeps the escaped character.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        let resolved = match escaped {
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            '0' => Some('\0'),
            'a' => Some('\u{7}'),
            'b' => Some('\u{8}'),
            'f' => Some('\u{c}'),
            'v' => Some('\u{b}'),
            'u' => hex_char(&mut chars, 4),
            'U' => hex_char(&mut chars, 8),
            'x' => hex_char(&mut chars, 4),
            other => Some(other),
        };
        out.extend(resolved);
    }
    out
}

/// Reads up to `max` hex digits as a code point.
fn hex_char(chars: &mut std::str::Chars<'_>, max: usize) -> Option<char> {
    let rest = chars.as_str();
    let len = rest
        .bytes()
        .take(max)
        .take_while(u8::is_ascii_hexdigit)
        .count();
    let code = u32::from_str_radix(&rest[..len], 16).ok()?;
    for _ in 0..len {
        chars.next();
    }
    char::from_u32(code)
}
