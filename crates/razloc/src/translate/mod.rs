//! Machine translation of base catalogs into per-language catalogs.

mod client;

pub use client::{MyMemoryTranslator, TranslateResult, Translator};

use std::path::{Path, PathBuf};

use razloc_l10n::lang::{culture_suffix, translation_path};
use razloc_l10n::{CatalogStore, ResourceCatalog, ResxStore};
use razloc_std::Error;
use razloc_std::error::prelude::*;
use unic_langid::LanguageIdentifier;

use crate::cancel::CancelToken;
use crate::config::TranslateConfig;
use crate::files::FileSelection;

/// The number of failed calls in a row after which the step is abandoned.
pub const MAX_CONSECUTIVE_FAILURES: usize = 5;

/// The outcome of [`TranslateService::run`].
#[derive(Debug, Default)]
pub struct TranslateReport {
    /// Base catalogs found.
    pub files: usize,
    /// Entries translated, or that would be in a dry run.
    pub translated: usize,
    /// Failed translation calls.
    pub failures: usize,
    /// Whether the step stopped after too many failures in a row.
    pub aborted: bool,
    /// Whether the step stopped early on request.
    pub cancelled: bool,
    /// Per-language catalogs written.
    pub written: Vec<PathBuf>,
    /// Catalogs that could not be read or written.
    pub failed: Vec<(PathBuf, Error)>,
}

impl TranslateReport {
    /// Whether every call and file succeeded.
    pub fn is_success(&self) -> bool {
        !self.aborted && self.failures == 0 && self.failed.is_empty()
    }
}

/// Where the step is within a run.
enum Flow {
    Continue,
    Stop,
}

/// Fills per-language catalogs with translations of missing entries.
pub struct TranslateService<T> {
    config: TranslateConfig,
    translator: T,
}

impl TranslateService<MyMemoryTranslator> {
    /// Creates a service backed by the configured endpoint.
    pub fn mymemory(config: TranslateConfig) -> Self {
        let translator = MyMemoryTranslator::new(
            &config.endpoint,
            &config.email,
            config.source_language.clone(),
        );
        Self::new(config, translator)
    }
}

impl<T: Translator> TranslateService<T> {
    /// Creates a service using `translator`.
    pub fn new(config: TranslateConfig, translator: T) -> Self {
        Self { config, translator }
    }

    /// The configuration of the service.
    pub fn config(&self) -> &TranslateConfig {
        &self.config
    }

    /// The client the service translates with.
    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// The base catalogs under the source, sorted by path.
    pub fn base_catalogs(&self) -> Result<Vec<PathBuf>> {
        let source = &self.config.source;
        if source.is_file() {
            return Ok(vec![source.clone()]);
        }
        let selection = FileSelection::new(&["*.resx".to_owned()], &[])?;
        Ok(selection
            .collect(source)
            .into_iter()
            .filter(|path| culture_suffix(path).is_none())
            .collect())
    }

    /// The `lang` catalog for `base`, mirrored under the output directory
    /// when one is set.
    pub fn output_path(&self, base: &Path, lang: &LanguageIdentifier) -> PathBuf {
        let config = &self.config;
        let target = match &config.output {
            Some(output) => {
                let rel = if config.source.is_file() {
                    base.file_name().map(PathBuf::from)
                } else {
                    base.strip_prefix(&config.source).ok().map(Path::to_path_buf)
                };
                match rel {
                    Some(rel) => output.join(rel),
                    None => base.to_owned(),
                }
            }
            None => base.to_owned(),
        };
        translation_path(&target, &lang.to_string())
    }

    /// Translates every base catalog into every target language.
    ///
    /// Entries already present in a language catalog are kept. A language
    /// catalog is written only when it gained entries. After
    /// [`MAX_CONSECUTIVE_FAILURES`] failed calls in a row the step stops,
    /// keeping what was translated so far.
    pub async fn run(&self, cancel: &CancelToken) -> Result<TranslateReport> {
        let mut report = TranslateReport::default();
        let mut consecutive_failures = 0;

        let bases = self.base_catalogs()?;
        report.files = bases.len();
        if bases.is_empty() {
            log::warn!("no base catalogs under {}", self.config.source.display());
        }

        'files: for base in bases {
            let entries = match ResxStore.load(&base) {
                Ok(entries) => entries,
                Err(err) => {
                    log::error!("failed to read {}: {err}", base.display());
                    report.failed.push((base, err));
                    continue;
                }
            };

            for lang in &self.config.target_languages {
                let path = self.output_path(&base, lang);
                let flow = self
                    .translate_file(
                        &entries,
                        lang,
                        &path,
                        &mut consecutive_failures,
                        &mut report,
                        cancel,
                    )
                    .await;
                match flow {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Stop) => break 'files,
                    Err(err) => {
                        log::error!("failed to translate {}: {err}", path.display());
                        report.failed.push((path, err));
                    }
                }
            }
        }

        log::info!(
            "translated {} entries, {} failed calls",
            report.translated,
            report.failures
        );
        Ok(report)
    }

    async fn translate_file(
        &self,
        entries: &[(String, String)],
        lang: &LanguageIdentifier,
        path: &Path,
        consecutive_failures: &mut usize,
        report: &mut TranslateReport,
        cancel: &CancelToken,
    ) -> Result<Flow> {
        let mut catalog = ResourceCatalog::new();
        ResxStore
            .load_into(path, &mut catalog)
            .map_err(wrap_err("load translations"))?;

        let mut added = 0;
        let mut flow = Flow::Continue;
        for (key, value) in entries {
            if cancel.is_cancelled() {
                log::warn!("cancelled, saving the translations done so far");
                report.cancelled = true;
                flow = Flow::Stop;
                break;
            }
            if value.trim().is_empty() || catalog.contains_key(key) {
                continue;
            }
            if self.config.dry_run {
                log::info!("would translate {key} into {lang}: {value:?}");
                report.translated += 1;
                continue;
            }

            match self.translator.translate(value, lang).await {
                Ok(text) => {
                    *consecutive_failures = 0;
                    if catalog.try_add(key, &text) {
                        added += 1;
                        report.translated += 1;
                    }
                }
                Err(err) => {
                    *consecutive_failures += 1;
                    report.failures += 1;
                    log::warn!("failed to translate {key} into {lang}: {err}");
                    if *consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        log::error!(
                            "{MAX_CONSECUTIVE_FAILURES} translations failed in a row, stopping"
                        );
                        report.aborted = true;
                        flow = Flow::Stop;
                        break;
                    }
                }
            }
        }

        if added > 0 {
            ResxStore.save_catalog(path, &catalog)?;
            log::info!("added {added} {lang} entries to {}", path.display());
            report.written.push(path.to_owned());
        }
        Ok(flow)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use razloc_l10n::lang::parse_language;

    use super::*;

    /// Uppercases text, failing for values listed in `fail`.
    struct Shouting {
        fail: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Translator for Shouting {
        async fn translate(&self, text: &str, target: &LanguageIdentifier) -> TranslateResult {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(format!("{target}:{text}"));
            }
            if self.fail.contains(&text) {
                return Err("unavailable".into());
            }
            Ok(text.to_uppercase())
        }
    }

    fn config(source: &Path, languages: &[&str], dry_run: bool) -> TranslateConfig {
        TranslateConfig {
            source: source.to_owned(),
            output: None,
            target_languages: languages.iter().map(|l| parse_language(l).unwrap()).collect(),
            email: "dev@example.com".to_owned(),
            source_language: parse_language("en").unwrap(),
            endpoint: String::new(),
            dry_run,
        }
    }

    fn write_base(dir: &Path) -> PathBuf {
        let base = dir.join("SharedResources.resx");
        ResxStore
            .save(
                &base,
                &mut [("Button.Save", "Save"), ("Login.welcome", "Welcome"), ("Menu.Empty", " ")]
                    .into_iter(),
            )
            .unwrap();
        base
    }

    #[tokio::test]
    async fn translates_missing_entries_only() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_base(dir.path());
        let de = translation_path(&base, "de");
        ResxStore
            .save(&de, &mut [("Button.Save", "Sichern")].into_iter())
            .unwrap();

        let translator = Shouting {
            fail: vec![],
            calls: Mutex::default(),
        };
        let service = TranslateService::new(config(dir.path(), &["de", "fr"], false), translator);
        let report = service.run(&CancelToken::new()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.files, 1);
        assert_eq!(report.translated, 3);
        assert_eq!(
            *service.translator.calls.lock().unwrap(),
            ["de:Welcome", "fr:Save", "fr:Welcome"]
        );
        assert_eq!(
            ResxStore.load(&de).unwrap(),
            [
                ("Button.Save".to_owned(), "Sichern".to_owned()),
                ("Login.welcome".to_owned(), "WELCOME".to_owned()),
            ]
        );
        assert!(translation_path(&base, "fr").exists());
    }

    #[tokio::test]
    async fn translations_are_not_rediscovered_as_bases() {
        let dir = tempfile::tempdir().unwrap();
        write_base(dir.path());
        let translator = Shouting {
            fail: vec![],
            calls: Mutex::default(),
        };
        let service = TranslateService::new(config(dir.path(), &["de"], false), translator);
        service.run(&CancelToken::new()).await.unwrap();

        let again = service.run(&CancelToken::new()).await.unwrap();
        assert_eq!(again.files, 1);
        assert_eq!(again.translated, 0);
        assert!(again.written.is_empty());
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_base(dir.path());
        let translator = Shouting {
            fail: vec![],
            calls: Mutex::default(),
        };
        let service = TranslateService::new(config(&base, &["de"], true), translator);
        let report = service.run(&CancelToken::new()).await.unwrap();

        assert_eq!(report.translated, 2);
        assert!(service.translator.calls.lock().unwrap().is_empty());
        assert!(!translation_path(&base, "de").exists());
    }

    #[test]
    fn output_mirrors_source_tree() {
        let mut config = config(Path::new("/src"), &["de"], true);
        config.output = Some(PathBuf::from("/out"));
        let translator = Shouting {
            fail: vec![],
            calls: Mutex::default(),
        };
        let service = TranslateService::new(config, translator);
        let de = parse_language("de").unwrap();
        assert_eq!(
            service.output_path(Path::new("/src/Resources/Shared.resx"), &de),
            PathBuf::from("/out/Resources/Shared.de.resx")
        );
    }
}
