//! The localizer injection directive.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::rules::LOCALIZER;

static INJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@inject\s+(?:Microsoft\.Extensions\.Localization\.)?IStringLocalizer<[\w.]+>\s+D\b")
        .unwrap()
});

/// Whether the component already injects the string localizer.
pub fn has_localizer_injection(content: &str) -> bool {
    INJECTION.is_match(content)
}

/// Prepends the injection of `IStringLocalizer<{resource_class}>` unless the
/// component already has one.
pub fn ensure_localizer_injection<'a>(content: &'a str, resource_class: &str) -> Cow<'a, str> {
    if has_localizer_injection(content) {
        return Cow::Borrowed(content);
    }
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    Cow::Owned(format!(
        "@inject Microsoft.Extensions.Localization.IStringLocalizer<{resource_class}> {LOCALIZER}{newline}{content}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_once() {
        let injected = ensure_localizer_injection("<h1>Hi</h1>\n", "SharedResources");
        assert_eq!(
            injected,
            "@inject Microsoft.Extensions.Localization.IStringLocalizer<SharedResources> D\n<h1>Hi</h1>\n"
        );
        assert!(matches!(
            ensure_localizer_injection(&injected, "SharedResources"),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn recognizes_short_form_and_crlf() {
        let content = "@page \"/\"\r\n@inject IStringLocalizer<App.Resources.Shared>  D\r\n";
        assert!(has_localizer_injection(content));

        let injected = ensure_localizer_injection("@page \"/\"\r\n", "Shared");
        assert!(injected.starts_with("@inject Microsoft.Extensions.Localization.IStringLocalizer<Shared> D\r\n"));
    }
}
