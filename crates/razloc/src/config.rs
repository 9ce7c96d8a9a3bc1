//! Command configuration.
//!
//! Every command is configured from three layers: options given on the
//! command line, the `razloc.toml` settings file and built-in defaults. The
//! first layer that sets a value wins. The merged options are validated
//! into a config before anything on disk is touched.

use std::path::{Path, PathBuf};

use razloc_l10n::lang::parse_language;
use razloc_std::Error;
use razloc_std::error::prelude::*;
use razloc_std::path::{PathClean, has_extension};
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

/// The settings file looked up next to the project.
pub const CONFIG_FILE: &str = "razloc.toml";
/// The base catalog, relative to the project directory.
pub const DEFAULT_RESOURCE: &str = "Resources/SharedResources.resx";
/// Markup files processed by default.
pub const DEFAULT_INCLUDE: &[&str] = &["*.razor"];
/// Components that are never localized by default.
pub const DEFAULT_EXCLUDE: &[&str] = &[
    "App.razor",
    "_Imports.razor",
    "RedirectToLogin.razor",
    "CulturePicker.razor",
];
/// The MyMemory translation endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.mymemory.translated.net/get";
/// The language catalogs are written in.
pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";

/// The contents of a settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SettingsFile {
    /// Defaults for `razloc localize`.
    pub localize: LocalizeOptions,
    /// Defaults for `razloc translate`.
    pub translate: TranslateOptions,
}

impl SettingsFile {
    /// Parses settings. Relative paths are resolved against `base`.
    pub fn parse(text: &str, base: &Path) -> Result<Self> {
        let mut settings: Self = toml::from_str(text)
            .map_err(|err| Error::config("parse settings", err.to_string()))?;
        settings.localize.project = settings.localize.project.map(|p| base.join(p).clean());
        settings.translate.source = settings.translate.source.map(|p| base.join(p).clean());
        settings.translate.output = settings.translate.output.map(|p| base.join(p).clean());
        Ok(settings)
    }

    /// Loads the settings file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::config(
                "load settings",
                format!("cannot read {}: {err}", path.display()),
            )
        })?;
        let base = path.parent().unwrap_or(Path::new("."));
        Self::parse(&text, base)
    }

    /// Loads `explicit` if given, otherwise `razloc.toml` in `dir` if it
    /// exists.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            log::debug!("using settings {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Unvalidated options of `razloc localize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LocalizeOptions {
    /// A `.csproj` file or a directory holding exactly one.
    pub project: Option<PathBuf>,
    /// The base catalog, relative to the project directory.
    pub resource: Option<PathBuf>,
    /// Include globs for markup files.
    pub include: Vec<String>,
    /// Excluded file names.
    pub exclude: Vec<String>,
    /// Whether to archive files before changing them.
    pub backup: Option<bool>,
    /// Methods whose string arguments are never localized.
    pub excluded_methods: Vec<String>,
    /// Whether to generate the resource class and `@using` directive.
    pub scaffold: Option<bool>,
    /// Whether to only log the changes.
    pub dry_run: Option<bool>,
}

impl LocalizeOptions {
    /// Fills every unset option from `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        Self {
            project: self.project.or(fallback.project),
            resource: self.resource.or(fallback.resource),
            include: or_vec(self.include, fallback.include),
            exclude: or_vec(self.exclude, fallback.exclude),
            backup: self.backup.or(fallback.backup),
            excluded_methods: or_vec(self.excluded_methods, fallback.excluded_methods),
            scaffold: self.scaffold.or(fallback.scaffold),
            dry_run: self.dry_run.or(fallback.dry_run),
        }
    }
}

/// Unvalidated options of `razloc translate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct TranslateOptions {
    /// A directory searched for base catalogs, or a single catalog.
    pub source: Option<PathBuf>,
    /// A directory receiving the translated catalogs.
    pub output: Option<PathBuf>,
    /// Target language codes. Entries may be comma separated.
    pub target_languages: Vec<String>,
    /// The contact email sent to the translation endpoint.
    pub email: Option<String>,
    /// The language of the base catalogs.
    pub source_language: Option<String>,
    /// The translation endpoint.
    pub endpoint: Option<String>,
    /// Whether to only log the work.
    pub dry_run: Option<bool>,
}

impl TranslateOptions {
    /// Fills every unset option from `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        Self {
            source: self.source.or(fallback.source),
            output: self.output.or(fallback.output),
            target_languages: or_vec(self.target_languages, fallback.target_languages),
            email: self.email.or(fallback.email),
            source_language: self.source_language.or(fallback.source_language),
            endpoint: self.endpoint.or(fallback.endpoint),
            dry_run: self.dry_run.or(fallback.dry_run),
        }
    }
}

fn or_vec<T>(preferred: Vec<T>, fallback: Vec<T>) -> Vec<T> {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

/// A validated `razloc localize` run.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalizeConfig {
    /// The `.csproj` file.
    pub project_file: PathBuf,
    /// The directory holding the project file.
    pub project_dir: PathBuf,
    /// The base catalog.
    pub resource: PathBuf,
    /// Include globs for markup files.
    pub include: Vec<String>,
    /// Excluded file names.
    pub exclude: Vec<String>,
    /// Whether to archive files before changing them.
    pub backup: bool,
    /// Methods whose string arguments are never localized.
    pub excluded_methods: Vec<String>,
    /// Whether to generate the resource class and `@using` directive.
    pub scaffold: bool,
    /// Whether to only log the changes.
    pub dry_run: bool,
}

impl LocalizeConfig {
    /// Validates options, resolving relative paths against `cwd`.
    pub fn resolve(options: LocalizeOptions, cwd: &Path) -> Result<Self> {
        let project = options
            .project
            .map_or_else(|| cwd.to_owned(), |p| cwd.join(p).clean());
        let project_file = find_project_file(&project)?;
        let project_dir = project_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_owned());

        let resource = options
            .resource
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCE));
        if !has_extension(&resource, "resx") {
            bail_config!(
                "resolve localize config",
                "resource {} is not a .resx file",
                resource.display()
            );
        }
        let resource = project_dir.join(resource).clean();

        let include = or_vec(options.include, owned(DEFAULT_INCLUDE));
        let exclude = or_vec(options.exclude, owned(DEFAULT_EXCLUDE));

        Ok(Self {
            project_file,
            project_dir,
            resource,
            include,
            exclude,
            backup: options.backup.unwrap_or(false),
            excluded_methods: options.excluded_methods,
            scaffold: options.scaffold.unwrap_or(true),
            dry_run: options.dry_run.unwrap_or(false),
        })
    }

    /// The class name of the resource catalog, e.g. `SharedResources`.
    pub fn resource_class(&self) -> String {
        self.resource
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Resolves a project argument to a `.csproj` file.
pub fn find_project_file(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        if has_extension(path, "csproj") {
            return Ok(path.to_owned());
        }
        bail_config!(
            "find project",
            "{} is not a .csproj file",
            path.display()
        );
    }
    if !path.is_dir() {
        bail_config!("find project", "project {} does not exist", path.display());
    }

    let entries = std::fs::read_dir(path)
        .map_err(|err| Error::config("find project", format!("{}: {err}", path.display())))?;
    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && has_extension(p, "csproj"))
        .collect();
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => bail_config!("find project", "no .csproj file in {}", path.display()),
        n => bail_config!(
            "find project",
            "{n} .csproj files in {}, pass one with --project",
            path.display()
        ),
    }
}

/// A validated `razloc translate` run.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateConfig {
    /// A directory searched for base catalogs, or a single catalog.
    pub source: PathBuf,
    /// A directory receiving the translated catalogs. Next to the base
    /// catalog when unset.
    pub output: Option<PathBuf>,
    /// Target languages, in the order given.
    pub target_languages: Vec<LanguageIdentifier>,
    /// The contact email sent to the translation endpoint.
    pub email: String,
    /// The language of the base catalogs.
    pub source_language: LanguageIdentifier,
    /// The translation endpoint.
    pub endpoint: String,
    /// Whether to only log the work.
    pub dry_run: bool,
}

impl TranslateConfig {
    /// Validates options, resolving relative paths against `cwd`.
    pub fn resolve(options: TranslateOptions, cwd: &Path) -> Result<Self> {
        let dry_run = options.dry_run.unwrap_or(false);

        let source = options
            .source
            .map_or_else(|| cwd.to_owned(), |p| cwd.join(p).clean());
        if !source.exists() {
            bail_config!(
                "resolve translate config",
                "source {} does not exist",
                source.display()
            );
        }
        if source.is_file() && !has_extension(&source, "resx") {
            bail_config!(
                "resolve translate config",
                "source {} is not a .resx file",
                source.display()
            );
        }
        let output = options.output.map(|p| cwd.join(p).clean());

        let target_languages = options
            .target_languages
            .iter()
            .flat_map(|codes| codes.split(','))
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(parse_language)
            .collect::<Result<Vec<_>>>()?;
        if target_languages.is_empty() {
            bail_config!("resolve translate config", "no target languages given");
        }

        let source_language = parse_language(
            options
                .source_language
                .as_deref()
                .unwrap_or(DEFAULT_SOURCE_LANGUAGE),
        )?;

        let email = options.email.unwrap_or_default().trim().to_owned();
        if email.is_empty() && !dry_run {
            bail_config!(
                "resolve translate config",
                "an email is required by the translation endpoint"
            );
        }

        Ok(Self {
            source,
            output,
            target_languages,
            email,
            source_language,
            endpoint: options
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            dry_run,
        })
    }
}

/// A validated `razloc restore` run.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreConfig {
    /// The directory holding the project file and its backups.
    pub project_dir: PathBuf,
    /// Whether to overwrite files changed since the backup.
    pub force: bool,
    /// Whether to only log the work.
    pub dry_run: bool,
}

impl RestoreConfig {
    /// Validates options, resolving relative paths against `cwd`.
    pub fn resolve(
        project: Option<PathBuf>,
        force: bool,
        dry_run: bool,
        cwd: &Path,
    ) -> Result<Self> {
        let project = project.map_or_else(|| cwd.to_owned(), |p| cwd.join(p).clean());
        let project_file = find_project_file(&project)?;
        let project_dir = project_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_owned());
        Ok(Self {
            project_dir,
            force,
            dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(dir: &Path) -> PathBuf {
        let file = dir.join("Crm.csproj");
        std::fs::write(&file, "<Project Sdk=\"Microsoft.NET.Sdk.Web\" />").unwrap();
        file
    }

    #[test]
    fn localize_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = project(dir.path());

        let config = LocalizeConfig::resolve(LocalizeOptions::default(), dir.path()).unwrap();
        assert_eq!(config.project_file, file);
        assert_eq!(config.project_dir, dir.path());
        assert_eq!(
            config.resource,
            dir.path().join("Resources").join("SharedResources.resx")
        );
        assert_eq!(config.resource_class(), "SharedResources");
        assert_eq!(config.include, ["*.razor"]);
        assert!(config.exclude.iter().any(|name| name == "_Imports.razor"));
        assert!(!config.backup);
        assert!(config.scaffold);
    }

    #[test]
    fn command_line_overrides_settings() {
        let dir = tempfile::tempdir().unwrap();
        project(dir.path());
        let settings = SettingsFile::parse(
            r#"
[localize]
resource = "Localization/Strings.resx"
include = ["*.razor", "*.cshtml"]
backup = true
excluded-methods = ["Log"]

[translate]
target-languages = ["de", "fr"]
"#,
            dir.path(),
        )
        .unwrap();

        let cli = LocalizeOptions {
            backup: Some(false),
            ..Default::default()
        };
        let config = LocalizeConfig::resolve(cli.or(settings.localize), dir.path()).unwrap();
        assert!(!config.backup);
        assert_eq!(config.include, ["*.razor", "*.cshtml"]);
        assert_eq!(config.excluded_methods, ["Log"]);
        assert_eq!(
            config.resource,
            dir.path().join("Localization").join("Strings.resx")
        );
        assert_eq!(settings.translate.target_languages, ["de", "fr"]);
    }

    #[test]
    fn unknown_settings_are_rejected() {
        let err = SettingsFile::parse("[localize]\nbakup = true\n", Path::new(".")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn project_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalizeConfig::resolve(LocalizeOptions::default(), dir.path()).unwrap_err();
        assert!(err.is_config());

        std::fs::write(dir.path().join("A.csproj"), "").unwrap();
        std::fs::write(dir.path().join("B.csproj"), "").unwrap();
        let err = LocalizeConfig::resolve(LocalizeOptions::default(), dir.path()).unwrap_err();
        assert!(err.is_config());

        let options = LocalizeOptions {
            project: Some(PathBuf::from("A.csproj")),
            ..Default::default()
        };
        assert!(LocalizeConfig::resolve(options, dir.path()).is_ok());

        let options = LocalizeOptions {
            project: Some(PathBuf::from("Missing.csproj")),
            ..Default::default()
        };
        assert!(LocalizeConfig::resolve(options, dir.path()).unwrap_err().is_config());
    }

    #[test]
    fn translate_validation() {
        let dir = tempfile::tempdir().unwrap();
        let options = |langs: &[&str], email: Option<&str>| TranslateOptions {
            target_languages: owned(langs),
            email: email.map(str::to_owned),
            ..Default::default()
        };

        let config =
            TranslateConfig::resolve(options(&["de, pt-BR"], Some("me@example.com")), dir.path())
                .unwrap();
        let langs: Vec<_> = config
            .target_languages
            .iter()
            .map(|lang| lang.to_string())
            .collect();
        assert_eq!(langs, ["de", "pt-BR"]);
        assert_eq!(config.source_language.to_string(), "en");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);

        let err = TranslateConfig::resolve(options(&["de", "xx-invalid-!!"], Some("me@example.com")), dir.path())
            .unwrap_err();
        assert!(err.is_config());

        let err = TranslateConfig::resolve(options(&["de"], None), dir.path()).unwrap_err();
        assert!(err.is_config());

        let dry_run = TranslateOptions {
            dry_run: Some(true),
            ..options(&["de"], None)
        };
        assert!(TranslateConfig::resolve(dry_run, dir.path()).is_ok());

        let missing = TranslateOptions {
            source: Some(PathBuf::from("missing")),
            ..options(&["de"], Some("me@example.com"))
        };
        assert!(TranslateConfig::resolve(missing, dir.path()).unwrap_err().is_config());
    }
}
