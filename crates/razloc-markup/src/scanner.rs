//! A small scanner for the tag structure of Razor markup.
//!
//! It recognizes opening tags with their attributes and the text directly
//! enclosed by an element. It is not a parser: nesting is not tracked and
//! anything it does not understand is skipped.

use std::ops::Range;

/// An attribute value as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrValue {
    /// The value without its quotes.
    pub text: String,
    /// The byte range of `text` in the scanned content.
    pub span: Range<usize>,
    /// The quote character, if the value is quoted.
    pub quote: Option<char>,
}

/// An attribute of an opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name, e.g. `Text` or `@bind-Value`.
    pub name: String,
    /// The value, absent for boolean attributes.
    pub value: Option<AttrValue>,
}

/// An opening (or self-closing) tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// The tag name, e.g. `RadzenButton`.
    pub name: String,
    /// The byte range from `<` to `>` inclusive.
    pub span: Range<usize>,
    /// The attributes in source order.
    pub attrs: Vec<Attribute>,
    /// Whether the tag ends with `/>`.
    pub self_closing: bool,
}

impl Tag {
    /// Finds an attribute by name, ignoring ASCII case.
    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    /// The value of an attribute, if present.
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attr(name)?.value.as_ref().map(|v| v.text.as_str())
    }

    /// Returns the text of this tag with the value of attribute `name`
    /// replaced by `new_value`.
    pub fn with_attr_value(&self, content: &str, name: &str, new_value: &str) -> Option<String> {
        let value = self.attr(name)?.value.as_ref()?;
        let tag_text = content.get(self.span.clone())?;
        let start = value.span.start - self.span.start;
        let end = value.span.end - self.span.start;

        let mut out = String::with_capacity(tag_text.len() + new_value.len());
        out.push_str(&tag_text[..start]);
        if value.quote.is_some() {
            out.push_str(new_value);
        } else {
            out.push('"');
            out.push_str(new_value);
            out.push('"');
        }
        out.push_str(&tag_text[end..]);
        Some(out)
    }
}

/// Elements whose content is never prose.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Byte ranges the tag rules must not look into: Razor comments, HTML
/// comments, `@code`/`@functions` blocks and script/style contents.
pub fn protected_ranges(content: &str) -> Vec<Range<usize>> {
    let bytes = content.as_bytes();
    let len = bytes.len();
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < len {
        let rest = &bytes[i..];
        let range = if rest.starts_with(b"@*") {
            Some(i..find_from(content, i + 2, "*@").map_or(len, |e| e + 2))
        } else if rest.starts_with(b"<!--") {
            Some(i..find_from(content, i + 4, "-->").map_or(len, |e| e + 3))
        } else if bytes[i] == b'@' && (i == 0 || !is_word(bytes[i - 1])) {
            code_block_end(bytes, i).map(|end| i..end)
        } else if bytes[i] == b'<' {
            raw_text_range(content, i)
        } else {
            None
        };

        match range {
            Some(range) => {
                i = range.end;
                ranges.push(range);
            }
            None => i += 1,
        }
    }

    ranges
}

/// Scans all opening tags outside protected ranges.
pub fn scan_tags(content: &str) -> Vec<Tag> {
    let protected = protected_ranges(content);
    let bytes = content.as_bytes();
    let mut tags = Vec::new();
    let mut next_protected = 0;
    let mut i = 0;

    while i < bytes.len() {
        while next_protected < protected.len() && protected[next_protected].end <= i {
            next_protected += 1;
        }
        if let Some(range) = protected.get(next_protected).filter(|r| r.contains(&i)) {
            i = range.end;
            continue;
        }

        if bytes[i] == b'<' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
            if let Some(tag) = parse_tag(content, i) {
                i = tag.span.end;
                tags.push(tag);
                continue;
            }
        }
        i += 1;
    }

    tags
}

/// Byte ranges of text directly enclosed by an element, i.e. text that
/// follows an opening tag and runs up to a closing tag.
pub fn inner_text_ranges(content: &str) -> Vec<Range<usize>> {
    scan_tags(content)
        .into_iter()
        .filter(|tag| !tag.self_closing)
        .filter(|tag| {
            !RAW_TEXT_ELEMENTS
                .iter()
                .any(|name| tag.name.eq_ignore_ascii_case(name))
        })
        .filter_map(|tag| {
            let start = tag.span.end;
            let end = find_from(content, start, "<")?;
            content[end..].starts_with("</").then_some(start..end)
        })
        .filter(|range| !range.is_empty())
        .collect()
}

fn parse_tag(content: &str, start: usize) -> Option<Tag> {
    let bytes = content.as_bytes();
    let len = bytes.len();
    let mut i = start + 1;
    while i < len && is_name_byte(bytes[i]) {
        i += 1;
    }
    let name = content[start + 1..i].to_owned();
    let mut attrs = Vec::new();

    loop {
        i = skip_ws(bytes, i);
        match *bytes.get(i)? {
            b'>' => {
                return Some(Tag {
                    name,
                    span: start..i + 1,
                    attrs,
                    self_closing: false,
                });
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Some(Tag {
                    name,
                    span: start..i + 2,
                    attrs,
                    self_closing: true,
                });
            }
            c if c.is_ascii_alphabetic() || matches!(c, b'_' | b'@' | b':') => {
                let (attr, end) = parse_attribute(content, i)?;
                attrs.push(attr);
                i = end;
            }
            _ => return None,
        }
    }
}

fn parse_attribute(content: &str, start: usize) -> Option<(Attribute, usize)> {
    let bytes = content.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() && (is_name_byte(bytes[i]) || bytes[i] == b'@') {
        i += 1;
    }
    let name = content[start..i].to_owned();

    let eq = skip_ws(bytes, i);
    if bytes.get(eq) != Some(&b'=') {
        return Some((Attribute { name, value: None }, i));
    }

    let vstart = skip_ws(bytes, eq + 1);
    let code_like = name.starts_with('@');
    let (value, end) = match *bytes.get(vstart)? {
        q @ (b'"' | b'\'') => {
            let text_start = vstart + 1;
            let razor = code_like || bytes.get(text_start) == Some(&b'@');
            let close = razor
                .then(|| razor_value_end(bytes, text_start, q))
                .flatten()
                .or_else(|| bytes[text_start..].iter().position(|b| *b == q).map(|p| p + text_start))?;
            let value = AttrValue {
                text: content[text_start..close].to_owned(),
                span: text_start..close,
                quote: Some(q as char),
            };
            (value, close + 1)
        }
        _ => {
            let close = if content[vstart..].starts_with("@(") {
                delimited_end(bytes, vstart + 1)? + 1
            } else {
                let mut k = vstart;
                while k < bytes.len()
                    && !bytes[k].is_ascii_whitespace()
                    && bytes[k] != b'>'
                    && !(bytes[k] == b'/' && bytes.get(k + 1) == Some(&b'>'))
                {
                    k += 1;
                }
                k
            };
            if close == vstart {
                return None;
            }
            let value = AttrValue {
                text: content[vstart..close].to_owned(),
                span: vstart..close,
                quote: None,
            };
            (value, close)
        }
    };

    Some((
        Attribute {
            name,
            value: Some(value),
        },
        end,
    ))
}

/// Finds the closing quote of a value holding a Razor expression, where
/// nested brackets may contain quoted strings, e.g. `@D["Button.Save"]`.
fn razor_value_end(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'"' | b'\'' if depth > 0 => {
                i = skip_string(bytes, i)?;
                continue;
            }
            c if c == quote && depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// The end of a `@code { .. }` or `@functions { .. }` block starting at the
/// `@`, exclusive.
fn code_block_end(bytes: &[u8], at: usize) -> Option<usize> {
    let word_end = (at + 1..bytes.len())
        .find(|&k| !is_word(bytes[k]))
        .unwrap_or(bytes.len());
    let word = &bytes[at + 1..word_end];
    if word != b"code" && word != b"functions" {
        return None;
    }
    let open = skip_ws(bytes, word_end);
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    Some(delimited_end(bytes, open).map_or(bytes.len(), |close| close + 1))
}

/// The contents of a `<script>` or `<style>` element starting at `<`.
fn raw_text_range(content: &str, at: usize) -> Option<Range<usize>> {
    let bytes = content.as_bytes();
    let name = RAW_TEXT_ELEMENTS.iter().find(|name| {
        content
            .get(at + 1..at + 1 + name.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(name))
            && !bytes.get(at + 1 + name.len()).is_some_and(|b| is_name_byte(*b))
    })?;
    let open_end = find_from(content, at, ">")? + 1;
    let lower = content[open_end..].to_ascii_lowercase();
    let close = lower
        .find(&format!("</{name}"))
        .map_or(content.len(), |p| p + open_end);
    Some(open_end..close)
}

/// Finds the bracket closing the one at `open`, skipping strings and
/// comments of the embedded code.
fn delimited_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' | b'\'' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = (i..bytes.len())
                    .find(|&k| bytes[k] == b'\n')
                    .unwrap_or(bytes.len());
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = (i + 2..bytes.len().saturating_sub(1))
                    .find(|&k| bytes[k] == b'*' && bytes[k + 1] == b'/')
                    .map_or(bytes.len(), |k| k + 2);
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Skips a quoted string starting at `start`, returning the index after the
/// closing quote. Verbatim strings (`@"..."`) use doubled quotes as escapes.
fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let verbatim = quote == b'"' && start > 0 && bytes[start - 1] == b'@';
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if !verbatim => i += 2,
            b'"' if verbatim && bytes.get(i + 1) == Some(&b'"') => i += 2,
            c if c == quote => return Some(i + 1),
            b'\n' if quote == b'\'' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn find_from(content: &str, from: usize, needle: &str) -> Option<usize> {
    content.get(from..)?.find(needle).map(|p| p + from)
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_name_byte(b: u8) -> bool {
    is_word(b) || matches!(b, b'-' | b'.' | b':')
}
