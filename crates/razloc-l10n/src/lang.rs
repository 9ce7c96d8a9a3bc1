//! Language codes and per-language catalog paths.

use std::path::{Path, PathBuf};

use razloc_std::{Error, Result};
use unic_langid::LanguageIdentifier;

/// Parses and validates a target language code such as `de` or `pt-BR`.
pub fn parse_language(code: &str) -> Result<LanguageIdentifier> {
    let code = code.trim();
    let invalid = || Error::config("parse language", format!("invalid language code: {code:?}"));

    let lid: LanguageIdentifier = code.parse().map_err(|_| invalid())?;
    let lang = lid.language.as_str();
    if lid.language.is_empty() || !(2..=3).contains(&lang.len()) {
        return Err(invalid());
    }
    Ok(lid)
}

/// The culture suffix of a catalog file name, e.g. `de` for
/// `SharedResources.de.resx`. Base catalogs have none.
pub fn culture_suffix(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    let (_, suffix) = stem.rsplit_once('.')?;
    let primary = suffix.split(['-', '_']).next()?;
    let looks_like_language =
        (2..=3).contains(&primary.len()) && primary.bytes().all(|b| b.is_ascii_lowercase());
    (looks_like_language && parse_language(suffix).is_ok()).then_some(suffix)
}

/// The path of the `lang` variant of a base catalog, e.g.
/// `Resources/SharedResources.resx` becomes `Resources/SharedResources.de.resx`.
pub fn translation_path(base: &Path, lang: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = base
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resx".to_owned());
    base.with_file_name(format!("{stem}.{lang}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_codes() {
        assert!(parse_language("de").is_ok());
        assert!(parse_language("pt-BR").is_ok());
        assert!(parse_language("fil").is_ok());
        let err = parse_language("xx-invalid-!!").unwrap_err();
        assert!(err.is_config());
        assert!(parse_language("und").is_err());
        assert!(parse_language("").is_err());
        assert!(parse_language("english").is_err());
    }

    #[test]
    fn detects_culture_suffix() {
        assert_eq!(culture_suffix(Path::new("SharedResources.de.resx")), Some("de"));
        assert_eq!(culture_suffix(Path::new("a/Shared.pt-BR.resx")), Some("pt-BR"));
        assert_eq!(culture_suffix(Path::new("SharedResources.resx")), None);
        assert_eq!(culture_suffix(Path::new("Pages.Login.resx")), None);
    }

    #[test]
    fn per_language_path() {
        assert_eq!(
            translation_path(Path::new("Resources/SharedResources.resx"), "fr"),
            PathBuf::from("Resources/SharedResources.fr.resx")
        );
    }
}
