//! Localization of Razor component markup.
//!
//! The [`RuleEngine`] runs an ordered list of [`Rule`]s over a component.
//! Each rule finds tags, enclosed text or regex matches, registers their
//! text in a [`ResourceCatalog`] and rewrites them into lookups such as
//! `@D["Button.Save"]`.

pub mod engine;
pub mod inject;
pub mod rules;
pub mod scanner;

pub use engine::{FileKind, Rule, RuleContext, RuleEngine, RuleMatch, RulePattern, Variables};
pub use inject::ensure_localizer_injection;
pub use rules::{LOCALIZER, markup_lookup};

use razloc_l10n::ResourceCatalog;

/// Localizes one `.razor` component: ensures the localizer is injected, then
/// applies the markup rules.
pub fn localize_markup(
    engine: &RuleEngine,
    content: &str,
    class_name: &str,
    resource_class: &str,
    catalog: &mut ResourceCatalog,
) -> String {
    let injected = ensure_localizer_injection(content, resource_class);
    engine.apply_rules(&injected, class_name, Some(FileKind::Markup), catalog)
}
