//! The markup rule engine.

use std::ops::Range;

use razloc_l10n::ResourceCatalog;
use regex::{Captures, Regex};
use rustc_hash::FxHashMap;

use crate::scanner::{Tag, inner_text_ranges, scan_tags};

/// The kind of file a rule is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A `.razor` component.
    Markup,
    /// A C# companion file.
    Code,
}

/// The variable holding the class name of the current file.
pub const CLASS_NAME: &str = "className";
/// The variable holding the item type captured from a form tag.
pub const ITEM_TYPE: &str = "TItem";

/// Per-file variables shared between rules.
///
/// A fresh set is created for every file, so nothing captured in one file
/// can leak into the key scoping of the next.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    vars: FxHashMap<String, String>,
}

impl Variables {
    /// Creates variables for a file whose class name is `class_name`.
    pub fn for_class(class_name: &str) -> Self {
        let mut vars = Self::default();
        vars.set(CLASS_NAME, class_name);
        vars
    }

    /// Sets a variable.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.vars.insert(name.to_owned(), value.into());
    }

    /// Reads a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// The class name of the current file.
    pub fn class_name(&self) -> &str {
        self.get(CLASS_NAME).unwrap_or_default()
    }

    /// The captured item type, falling back to the class name.
    pub fn item_type(&self) -> &str {
        self.get(ITEM_TYPE)
            .filter(|ty| !ty.is_empty())
            .unwrap_or_else(|| self.class_name())
    }
}

/// The state a rule reads and writes while a file is processed.
pub struct RuleContext<'a> {
    /// The catalog receiving new entries.
    pub catalog: &'a mut ResourceCatalog,
    /// The per-file variables.
    pub vars: Variables,
}

/// What a rule looks for.
pub enum RulePattern {
    /// Opening tags whose name fully matches the regex.
    Tag(Regex),
    /// Text directly enclosed by an element.
    InnerText,
    /// Any match of the regex.
    Regex(Regex),
}

impl RulePattern {
    /// Matches tags whose name fully matches `name_pattern`.
    pub fn tag(name_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Tag(Regex::new(&format!("^(?:{name_pattern})$"))?))
    }
}

/// One match handed to a rule.
pub enum RuleMatch<'a> {
    /// An opening tag and its source text.
    Tag {
        /// The scanned tag.
        tag: &'a Tag,
        /// The whole content the tag was scanned from.
        content: &'a str,
    },
    /// An enclosed text run.
    Text(&'a str),
    /// A regex match.
    Regex(&'a Captures<'a>),
}

impl RuleMatch<'_> {
    /// The matched source text.
    pub fn text(&self) -> &str {
        match self {
            RuleMatch::Tag { tag, content } => &content[tag.span.clone()],
            RuleMatch::Text(text) => text,
            RuleMatch::Regex(caps) => caps.get(0).map_or("", |m| m.as_str()),
        }
    }
}

/// A rewrite rule for one kind of markup construct.
pub trait Rule {
    /// The component (tag) name or name pattern, for diagnostics.
    fn component(&self) -> &str;

    /// What the rule matches.
    fn pattern(&self) -> &RulePattern;

    /// The file kind the rule is restricted to. `None` applies everywhere.
    fn file_kind(&self) -> Option<FileKind> {
        Some(FileKind::Markup)
    }

    /// Returns the replacement for a match, or `None` to leave it as is.
    fn apply(&self, m: &RuleMatch<'_>, ctx: &mut RuleContext<'_>) -> Option<String>;
}

/// An ordered list of rules.
#[derive(Default)]
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    /// Creates an engine without rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. Rules run in the order they are added.
    pub fn push(&mut self, rule: impl Rule + 'static) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// The registered rules in order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| &**rule)
    }

    /// Applies every rule for `kind` to `content` with fresh variables for
    /// `class_name`.
    pub fn apply_rules(
        &self,
        content: &str,
        class_name: &str,
        kind: Option<FileKind>,
        catalog: &mut ResourceCatalog,
    ) -> String {
        let mut ctx = RuleContext {
            catalog,
            vars: Variables::for_class(class_name),
        };
        self.apply_rules_with(content, kind, &mut ctx)
    }

    /// Applies every rule for `kind` to `content`. Each rule rewrites the
    /// whole content before the next one runs.
    pub fn apply_rules_with(
        &self,
        content: &str,
        kind: Option<FileKind>,
        ctx: &mut RuleContext<'_>,
    ) -> String {
        let mut content = content.to_owned();
        for rule in self.rules() {
            let applies = match (kind, rule.file_kind()) {
                (None, _) | (_, None) => true,
                (Some(kind), Some(restriction)) => kind == restriction,
            };
            if applies {
                content = apply_rule(rule, &content, ctx);
            }
        }
        content
    }
}

fn apply_rule(rule: &dyn Rule, content: &str, ctx: &mut RuleContext<'_>) -> String {
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut record = |range: Range<usize>, old: &str, new: Option<String>| {
        if let Some(new) = new.filter(|new| new != old) {
            log::debug!("{}: {old} -> {new}", rule.component());
            edits.push((range, new));
        }
    };

    match rule.pattern() {
        RulePattern::Tag(name) => {
            for tag in scan_tags(content).iter().filter(|t| name.is_match(&t.name)) {
                let m = RuleMatch::Tag { tag, content };
                let new = rule.apply(&m, ctx);
                record(tag.span.clone(), m.text(), new);
            }
        }
        RulePattern::InnerText => {
            for range in inner_text_ranges(content) {
                let text = &content[range.clone()];
                let new = rule.apply(&RuleMatch::Text(text), ctx);
                record(range, text, new);
            }
        }
        RulePattern::Regex(re) => {
            for caps in re.captures_iter(content) {
                let Some(whole) = caps.get(0) else { continue };
                let new = rule.apply(&RuleMatch::Regex(&caps), ctx);
                record(whole.range(), whole.as_str(), new);
            }
        }
    }

    if edits.is_empty() {
        return content.to_owned();
    }

    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for (range, new) in edits {
        out.push_str(&content[last..range.start]);
        out.push_str(&new);
        last = range.end;
    }
    out.push_str(&content[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper(RulePattern);

    impl Rule for Upper {
        fn component(&self) -> &str {
            "Upper"
        }

        fn pattern(&self) -> &RulePattern {
            &self.0
        }

        fn apply(&self, m: &RuleMatch<'_>, ctx: &mut RuleContext<'_>) -> Option<String> {
            ctx.vars.set("seen", m.text());
            Some(m.text().to_uppercase())
        }
    }

    struct Capture(RulePattern);

    impl Rule for Capture {
        fn component(&self) -> &str {
            "Capture"
        }

        fn pattern(&self) -> &RulePattern {
            &self.0
        }

        fn file_kind(&self) -> Option<FileKind> {
            Some(FileKind::Code)
        }

        fn apply(&self, _m: &RuleMatch<'_>, _ctx: &mut RuleContext<'_>) -> Option<String> {
            Some("code only".to_owned())
        }
    }

    #[test]
    fn rules_run_in_order_over_whole_content() {
        let mut engine = RuleEngine::new();
        engine
            .push(Upper(RulePattern::Regex(Regex::new("b+").unwrap())))
            .push(Upper(RulePattern::tag("x|y").unwrap()));

        let mut catalog = ResourceCatalog::new();
        let out = engine.apply_rules("abba <x a=1> <z> bb", "Page", None, &mut catalog);
        assert_eq!(out, "aBBa <X A=1> <z> BB");
    }

    #[test]
    fn file_kind_restriction() {
        let mut engine = RuleEngine::new();
        engine.push(Capture(RulePattern::InnerText));

        let mut catalog = ResourceCatalog::new();
        let content = "<p>text</p>";
        assert_eq!(
            engine.apply_rules(content, "Page", Some(FileKind::Markup), &mut catalog),
            content
        );
        assert_eq!(
            engine.apply_rules(content, "Page", Some(FileKind::Code), &mut catalog),
            "<p>code only</p>"
        );
    }

    #[test]
    fn variables_fall_back_to_class_name() {
        let mut vars = Variables::for_class("Login");
        assert_eq!(vars.item_type(), "Login");
        vars.set(ITEM_TYPE, "User");
        assert_eq!(vars.item_type(), "User");
        assert_eq!(vars.class_name(), "Login");
    }
}
