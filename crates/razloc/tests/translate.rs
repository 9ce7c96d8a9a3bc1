//! Translation runs against a scripted translator.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use razloc::config::TranslateOptions;
use razloc::translate::{MAX_CONSECUTIVE_FAILURES, TranslateResult};
use razloc::{CancelToken, TranslateConfig, TranslateService, Translator};
use razloc_l10n::lang::translation_path;
use razloc_l10n::{CatalogStore, ResxStore};
use unic_langid::LanguageIdentifier;

/// Replays scripted results, then echoes the text back in brackets.
#[derive(Default)]
struct Scripted {
    script: Mutex<VecDeque<TranslateResult>>,
    calls: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(script: impl IntoIterator<Item = TranslateResult>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::default(),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl Translator for Scripted {
    async fn translate(&self, text: &str, target: &LanguageIdentifier) -> TranslateResult {
        self.calls.lock().unwrap().push(format!("{target}:{text}"));
        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(format!("[{text}]")),
        }
    }
}

fn base_catalog(dir: &Path, count: usize) -> PathBuf {
    let entries: Vec<(String, String)> = (1..=count)
        .map(|i| (format!("Page.text{i}"), format!("Text number {i}")))
        .collect();
    let base = dir.join("Resources").join("SharedResources.resx");
    ResxStore
        .save(
            &base,
            &mut entries.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
        .unwrap();
    base
}

fn config(source: &Path, languages: &str) -> TranslateConfig {
    let options = TranslateOptions {
        source: Some(source.to_owned()),
        target_languages: vec![languages.to_owned()],
        email: Some("dev@example.com".to_owned()),
        ..Default::default()
    };
    TranslateConfig::resolve(options, source).unwrap()
}

#[tokio::test]
async fn aborts_after_consecutive_failures() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_catalog(dir.path(), 8);

    let failures = (0..6).map(|_| Err("quota exceeded".into()));
    let service = TranslateService::new(config(dir.path(), "de,fr"), Scripted::new(failures));
    let report = service.run(&CancelToken::new()).await.unwrap();

    assert!(report.aborted);
    assert!(!report.is_success());
    assert_eq!(report.failures, MAX_CONSECUTIVE_FAILURES);
    assert_eq!(report.translated, 0);
    assert!(report.written.is_empty());

    let translator = service.translator();
    assert_eq!(translator.calls().len(), MAX_CONSECUTIVE_FAILURES);
    assert!(translator.calls().iter().all(|call| call.starts_with("de:")));
    assert_eq!(translator.remaining(), 1);
    assert!(!translation_path(&base, "de").exists());
    assert!(!translation_path(&base, "fr").exists());
}

#[tokio::test]
async fn abort_keeps_earlier_translations() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_catalog(dir.path(), 8);

    let script = [Ok("Text eins".to_owned()), Ok("Text zwei".to_owned())]
        .into_iter()
        .chain((0..5).map(|_| Err("unavailable".into())));
    let service = TranslateService::new(config(dir.path(), "de"), Scripted::new(script));
    let report = service.run(&CancelToken::new()).await.unwrap();

    assert!(report.aborted);
    assert_eq!(report.translated, 2);
    let de = translation_path(&base, "de");
    assert_eq!(report.written, [de.clone()]);
    assert_eq!(
        ResxStore.load(&de).unwrap(),
        [
            ("Page.text1".to_owned(), "Text eins".to_owned()),
            ("Page.text2".to_owned(), "Text zwei".to_owned()),
        ]
    );
}

#[tokio::test]
async fn a_success_resets_the_failure_count() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_catalog(dir.path(), 10);

    let script = (0..4)
        .map(|_| Err("flaky".into()))
        .chain([Ok("ok".to_owned())])
        .chain((0..4).map(|_| Err("flaky".into())));
    let service = TranslateService::new(config(dir.path(), "de"), Scripted::new(script));
    let report = service.run(&CancelToken::new()).await.unwrap();

    assert!(!report.aborted);
    assert_eq!(report.failures, 8);
    assert_eq!(report.translated, 2);
    let de = ResxStore.load(&translation_path(&base, "de")).unwrap();
    assert_eq!(
        de,
        [
            ("Page.text5".to_owned(), "ok".to_owned()),
            ("Page.text10".to_owned(), "[Text number 10]".to_owned()),
        ]
    );

    // The next run only retries what is still missing.
    let retry = TranslateService::new(config(dir.path(), "de"), Scripted::default());
    let report = retry.run(&CancelToken::new()).await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.translated, 8);
    assert_eq!(retry.translator().calls().len(), 8);
}

#[tokio::test]
async fn cancellation_stops_between_entries() {
    let dir = tempfile::tempdir().unwrap();
    base_catalog(dir.path(), 3);

    let cancel = CancelToken::new();
    cancel.cancel();
    let service = TranslateService::new(config(dir.path(), "de"), Scripted::default());
    let report = service.run(&cancel).await.unwrap();

    assert!(report.cancelled);
    assert!(service.translator().calls().is_empty());
}
