//! The built-in rules for Radzen Blazor components.

pub use razloc_l10n::LOCALIZER;
use razloc_l10n::{humanize, is_valid_key, synthesize};
use razloc_std::error::prelude::*;
use regex::Regex;

use crate::engine::{FileKind, ITEM_TYPE, Rule, RuleContext, RuleEngine, RuleMatch, RulePattern};
use crate::scanner::Tag;

/// The markup lookup expression for `key`, e.g. `@D["Button.Save"]`.
pub fn markup_lookup(key: &str) -> String {
    format!("@{LOCALIZER}[\"{key}\"]")
}

/// The last dotted segment of a type name, e.g. `User` for `App.Models.User`.
fn short_type_name(ty: &str) -> &str {
    ty.trim().rsplit('.').next().unwrap_or_default()
}

/// Registers `value` of `attribute` under `key` and rewrites it to a lookup.
///
/// Values that are already Razor expressions (starting with `@`) are never
/// touched.
fn localize_attribute(
    tag: &Tag,
    content: &str,
    attribute: &str,
    key: &str,
    ctx: &mut RuleContext<'_>,
) -> Option<String> {
    let value = tag.attr_value(attribute)?.trim();
    if value.starts_with('@') || value.is_empty() || !is_valid_key(key) {
        return None;
    }
    ctx.catalog.try_add(key, value);
    tag.with_attr_value(content, attribute, &markup_lookup(key))
}

/// Registers keys of lookups that are already in the file, leaving the text
/// unchanged.
pub struct ExistingLookupRule {
    pattern: RulePattern,
}

impl ExistingLookupRule {
    /// Creates the rule.
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(&format!(r#"\b{LOCALIZER}\["([^"]+)"\]"#))
            .context_ut("compile lookup pattern")?;
        Ok(Self {
            pattern: RulePattern::Regex(pattern),
        })
    }
}

impl Rule for ExistingLookupRule {
    fn component(&self) -> &str {
        "ExistingLocalizerCall"
    }

    fn pattern(&self) -> &RulePattern {
        &self.pattern
    }

    fn file_kind(&self) -> Option<FileKind> {
        None
    }

    fn apply(&self, m: &RuleMatch<'_>, ctx: &mut RuleContext<'_>) -> Option<String> {
        let RuleMatch::Regex(caps) = m else {
            return None;
        };
        let key = caps.get(1)?.as_str();
        ctx.catalog.try_add(key, &format!("# {}", humanize(key)));
        None
    }
}

/// Localizes plain text enclosed by an element, scoped to the file's class.
pub struct InnerTextRule {
    pattern: RulePattern,
}

impl InnerTextRule {
    /// Creates the rule.
    pub fn new() -> Self {
        Self {
            pattern: RulePattern::InnerText,
        }
    }
}

impl Default for InnerTextRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for InnerTextRule {
    fn component(&self) -> &str {
        "Content"
    }

    fn pattern(&self) -> &RulePattern {
        &self.pattern
    }

    fn apply(&self, m: &RuleMatch<'_>, ctx: &mut RuleContext<'_>) -> Option<String> {
        let RuleMatch::Text(text) = m else {
            return None;
        };
        let trimmed = text.trim();
        if trimmed.contains('@') || !trimmed.chars().any(char::is_alphanumeric) {
            return None;
        }

        let fragment = synthesize(trimmed);
        if fragment.is_empty() {
            return None;
        }
        let key = format!("{}.{fragment}", ctx.vars.class_name());
        if !is_valid_key(&key) {
            return None;
        }
        ctx.catalog.try_add(&key, trimmed);

        let leading = &text[..text.len() - text.trim_start().len()];
        let trailing = &text[text.trim_end().len()..];
        Some(format!("{leading}{}{trailing}", markup_lookup(&key)))
    }
}

/// Remembers the item type of a form so that field-level rules can scope
/// their keys with the model type.
pub struct ItemTypeRule {
    component: &'static str,
    attribute: &'static str,
    pattern: RulePattern,
}

impl ItemTypeRule {
    /// Captures `attribute` of `component` tags.
    pub fn new(component: &'static str, attribute: &'static str) -> Result<Self> {
        Ok(Self {
            component,
            attribute,
            pattern: RulePattern::tag(component).context_ut("compile tag pattern")?,
        })
    }
}

impl Rule for ItemTypeRule {
    fn component(&self) -> &str {
        self.component
    }

    fn pattern(&self) -> &RulePattern {
        &self.pattern
    }

    fn apply(&self, m: &RuleMatch<'_>, ctx: &mut RuleContext<'_>) -> Option<String> {
        let RuleMatch::Tag { tag, .. } = m else {
            return None;
        };
        let ty = tag.attr_value(self.attribute)?;
        if !ty.starts_with('@') {
            let ty = short_type_name(ty);
            if !ty.is_empty() {
                ctx.vars.set(ITEM_TYPE, ty);
            }
        }
        None
    }
}

/// Localizes the `Title` of a data grid column as `{ItemType}.{Property}`.
pub struct GridColumnRule {
    component: &'static str,
    pattern: RulePattern,
}

impl GridColumnRule {
    /// Creates the rule for `component` tags.
    pub fn new(component: &'static str) -> Result<Self> {
        Ok(Self {
            component,
            pattern: RulePattern::tag(component).context_ut("compile tag pattern")?,
        })
    }
}

impl Rule for GridColumnRule {
    fn component(&self) -> &str {
        self.component
    }

    fn pattern(&self) -> &RulePattern {
        &self.pattern
    }

    fn apply(&self, m: &RuleMatch<'_>, ctx: &mut RuleContext<'_>) -> Option<String> {
        let RuleMatch::Tag { tag, content } = m else {
            return None;
        };
        let property = tag.attr_value("Property")?.trim();
        if property.is_empty() || property.starts_with('@') {
            return None;
        }
        let item_type = match tag.attr_value(ITEM_TYPE).map(short_type_name) {
            Some(ty) if !ty.is_empty() && !ty.starts_with('@') => ty,
            _ => ctx.vars.item_type(),
        };
        let key = format!("{item_type}.{property}");
        localize_attribute(tag, content, "Title", &key, ctx)
    }
}

/// The scope (first segment) of a key built by an [`AttributeRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    /// The item type captured from the enclosing form, or the class name.
    ItemType,
    /// The class name of the file.
    ClassName,
    /// A fixed category such as `Button`.
    Fixed(&'static str),
}

/// The fragment (second segment) of a key built by an [`AttributeRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFragment {
    /// The synthesized key of the attribute text.
    Synthesized,
    /// The attribute text itself.
    Raw,
    /// The value of another attribute, e.g. the bound `Component`.
    FromAttribute(&'static str),
}

/// Localizes one text-bearing attribute of a component.
pub struct AttributeRule {
    component: &'static str,
    attribute: &'static str,
    scope: KeyScope,
    fragment: KeyFragment,
    pattern: RulePattern,
}

impl AttributeRule {
    /// Localizes `attribute` of tags matching `component`.
    pub fn new(
        component: &'static str,
        attribute: &'static str,
        scope: KeyScope,
        fragment: KeyFragment,
    ) -> Result<Self> {
        Ok(Self {
            component,
            attribute,
            scope,
            fragment,
            pattern: RulePattern::tag(component).context_ut("compile tag pattern")?,
        })
    }
}

impl Rule for AttributeRule {
    fn component(&self) -> &str {
        self.component
    }

    fn pattern(&self) -> &RulePattern {
        &self.pattern
    }

    fn apply(&self, m: &RuleMatch<'_>, ctx: &mut RuleContext<'_>) -> Option<String> {
        let RuleMatch::Tag { tag, content } = m else {
            return None;
        };
        let text = tag.attr_value(self.attribute)?.trim();
        if text.is_empty() || text.starts_with('@') {
            return None;
        }

        let fragment = match self.fragment {
            KeyFragment::Synthesized => synthesize(text),
            KeyFragment::Raw => text.to_owned(),
            KeyFragment::FromAttribute(name) => {
                let value = tag.attr_value(name)?.trim();
                if value.starts_with('@') {
                    return None;
                }
                value.to_owned()
            }
        };
        if fragment.is_empty() {
            return None;
        }

        let scope = match self.scope {
            KeyScope::ItemType => ctx.vars.item_type(),
            KeyScope::ClassName => ctx.vars.class_name(),
            KeyScope::Fixed(scope) => scope,
        };
        let key = format!("{scope}.{fragment}");
        localize_attribute(tag, content, self.attribute, &key, ctx)
    }
}

/// Localizes the `Text` of validators; the validator kind is part of the
/// key, e.g. `User.Email.RequiredValidator`.
pub struct ValidatorRule {
    pattern: RulePattern,
    name: Regex,
}

impl ValidatorRule {
    const COMPONENT: &'static str = r"Radzen(?<kind>\w+)Validator";

    /// Creates the rule.
    pub fn new() -> Result<Self> {
        let name = Regex::new(&format!("^(?:{})$", Self::COMPONENT))
            .context_ut("compile tag pattern")?;
        Ok(Self {
            pattern: RulePattern::Tag(name.clone()),
            name,
        })
    }
}

impl Rule for ValidatorRule {
    fn component(&self) -> &str {
        Self::COMPONENT
    }

    fn pattern(&self) -> &RulePattern {
        &self.pattern
    }

    fn apply(&self, m: &RuleMatch<'_>, ctx: &mut RuleContext<'_>) -> Option<String> {
        let RuleMatch::Tag { tag, content } = m else {
            return None;
        };
        let kind = self.name.captures(&tag.name)?.name("kind")?.as_str().to_owned();
        let item_type = ctx.vars.item_type();
        let key = match tag.attr_value("Component").map(str::trim) {
            Some(component) if !component.is_empty() && !component.starts_with('@') => {
                format!("{item_type}.{component}.{kind}Validator")
            }
            _ => format!("{item_type}.{kind}Validator"),
        };
        localize_attribute(tag, content, "Text", &key, ctx)
    }
}

impl RuleEngine {
    /// Creates an engine with the built-in rules in their canonical order.
    ///
    /// Lookup recognition comes first so existing keys are known, and the
    /// form rule precedes every rule scoped by the item type.
    pub fn with_builtin_rules() -> Result<Self> {
        use KeyFragment::*;
        use KeyScope::*;

        let mut engine = Self::new();
        engine
            .push(ExistingLookupRule::new()?)
            .push(InnerTextRule::new())
            .push(ItemTypeRule::new("RadzenTemplateForm", ITEM_TYPE)?)
            .push(GridColumnRule::new("RadzenDropDownDataGridColumn")?)
            .push(GridColumnRule::new("RadzenDataGridColumn")?)
            .push(AttributeRule::new("RadzenLabel", "Text", ItemType, FromAttribute("Component"))?)
            .push(AttributeRule::new("RadzenFormField", "Text", ItemType, Synthesized)?)
            .push(AttributeRule::new("Radzen(?:Text|Heading)", "Text", ClassName, Synthesized)?)
            .push(AttributeRule::new("RadzenAlert", "Title", ClassName, Synthesized)?)
            .push(ValidatorRule::new()?)
            .push(AttributeRule::new("RadzenButton", "Text", Fixed("Button"), Raw)?)
            .push(AttributeRule::new("RadzenPanelMenuItem", "Text", Fixed("Menu"), Raw)?)
            .push(AttributeRule::new("RadzenProfileMenuItem", "Text", Fixed("Menu"), Raw)?);
        Ok(engine)
    }
}
