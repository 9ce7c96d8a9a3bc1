//! The `localize` run over a whole project.

use std::path::{Path, PathBuf};

use razloc_code::{CodeRewriter, LiteralFilters};
use razloc_l10n::{CatalogStore, ResourceCatalog, ResxStore};
use razloc_markup::{FileKind, RuleEngine, localize_markup};
use razloc_std::Error;
use razloc_std::error::prelude::*;

use crate::backup::BackupService;
use crate::cancel::CancelToken;
use crate::config::LocalizeConfig;
use crate::files::FileSelection;
use crate::scaffold::scaffold;

/// The outcome of [`localize`].
#[derive(Debug, Default)]
pub struct LocalizeReport {
    /// Markup files looked at.
    pub files_scanned: usize,
    /// Markup and companion files whose content changed.
    pub files_changed: usize,
    /// Files that could not be processed, with the reason.
    pub failed: Vec<(PathBuf, Error)>,
    /// Entries in the catalog after the run.
    pub catalog_size: usize,
    /// Whether the run stopped early on request.
    pub cancelled: bool,
    /// The backup archive written by the run.
    pub archive: Option<PathBuf>,
}

impl LocalizeReport {
    /// Whether every file was processed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Processes one project.
struct Localizer<'a> {
    config: &'a LocalizeConfig,
    engine: RuleEngine,
    rewriter: CodeRewriter,
    resource_class: String,
}

impl Localizer<'_> {
    /// Localizes `X.razor` and its companion `X.razor.cs`, returning how many
    /// of the two changed.
    fn process_file(
        &self,
        file: &Path,
        catalog: &mut ResourceCatalog,
        backup: &mut BackupService,
    ) -> Result<usize> {
        let class_name = file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut changed = 0;

        let mut companion = file.as_os_str().to_owned();
        companion.push(".cs");
        let companion = PathBuf::from(companion);
        if companion.is_file() {
            log::debug!("processing {}", companion.display());
            let source = read(&companion)?;
            let rewritten = self
                .rewriter
                .rewrite(&source, &class_name, catalog)
                .map_err(wrap_err("rewrite code"))?;
            let text =
                self.engine
                    .apply_rules(&rewritten.text, &class_name, Some(FileKind::Code), catalog);
            if text != source {
                backup.write_with_backup(&companion, &text)?;
                changed += 1;
            }
        }

        log::debug!("processing {}", file.display());
        let content = read(file)?;
        let text = localize_markup(
            &self.engine,
            &content,
            &class_name,
            &self.resource_class,
            catalog,
        );
        if text != content {
            backup.write_with_backup(file, &text)?;
            changed += 1;
        }
        Ok(changed)
    }

    fn run(
        &self,
        catalog: &mut ResourceCatalog,
        backup: &mut BackupService,
        cancel: &CancelToken,
    ) -> Result<LocalizeReport> {
        let config = self.config;
        let selection = FileSelection::new(&config.include, &config.exclude)?;
        let mut report = LocalizeReport::default();

        for file in selection.collect(&config.project_dir) {
            if cancel.is_cancelled() {
                log::warn!("cancelled, saving the work done so far");
                report.cancelled = true;
                break;
            }
            report.files_scanned += 1;
            match self.process_file(&file, catalog, backup) {
                Ok(changed) => report.files_changed += changed,
                Err(err) => {
                    log::error!("failed to localize {}: {err}", file.display());
                    report.failed.push((file, err));
                }
            }
        }

        report.catalog_size = catalog.len();
        if !catalog.is_empty() {
            backup.write_with_backup(&config.resource, &ResxStore::render(catalog.iter()))?;
        }
        if config.scaffold && !report.cancelled {
            scaffold(config, backup)?;
        }
        Ok(report)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(error_once_map!("read file", path: path.display()))
}

/// Localizes every selected component of the project.
///
/// The existing catalog is loaded first so known keys keep their text. A
/// file that fails is reported and skipped. The catalog and backup archive
/// are finalized even when the run is cancelled.
pub fn localize(config: &LocalizeConfig, cancel: &CancelToken) -> Result<LocalizeReport> {
    let mut catalog = ResourceCatalog::new();
    let loaded = ResxStore
        .load_into(&config.resource, &mut catalog)
        .map_err(wrap_err("load catalog"))?;
    log::info!("loaded {loaded} entries from {}", config.resource.display());

    let localizer = Localizer {
        config,
        engine: RuleEngine::with_builtin_rules()?,
        rewriter: CodeRewriter::new(LiteralFilters::with_excluded_methods(
            config.excluded_methods.iter().cloned(),
        )),
        resource_class: config.resource_class(),
    };

    let mut backup = BackupService::new(&config.project_dir, config.backup, config.dry_run);
    let result = localizer.run(&mut catalog, &mut backup, cancel);
    let archive = backup.close();

    let mut report = result?;
    report.archive = archive?;
    log::info!(
        "localized {} of {} files, {} catalog entries",
        report.files_changed,
        report.files_scanned,
        report.catalog_size
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_file_is_scoped_by_component() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("Crm.csproj"), "<Project />").unwrap();
        std::fs::create_dir_all(root.join("Pages")).unwrap();
        std::fs::write(root.join("Pages/Users.razor"), "<h3>Users</h3>\n").unwrap();
        std::fs::write(
            root.join("Pages/Users.razor.cs"),
            "public partial class Users { void M() { Show(\"Deleted successfully\"); var t = D[\"Users.title\"]; } }\n",
        )
        .unwrap();

        let config = LocalizeConfig::resolve(Default::default(), root).unwrap();
        let report = localize(&config, &CancelToken::new()).unwrap();
        assert!(report.is_success());
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.files_changed, 2);

        let code = std::fs::read_to_string(root.join("Pages/Users.razor.cs")).unwrap();
        assert!(code.contains(r#"Show(D["Users.deletedsuccessfully"])"#), "{code}");

        let catalog = ResxStore.load(&config.resource).unwrap();
        assert_eq!(
            catalog,
            vec![
                ("Users.deletedsuccessfully".to_owned(), "Deleted successfully".to_owned()),
                ("Users.title".to_owned(), "# Users.title".to_owned()),
                ("Users.users".to_owned(), "Users".to_owned()),
            ]
        );
    }

    #[test]
    fn cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("Crm.csproj"), "<Project />").unwrap();
        std::fs::write(root.join("Index.razor"), "<h1>Hello there</h1>\n").unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let config = LocalizeConfig::resolve(Default::default(), root).unwrap();
        let report = localize(&config, &cancel).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.files_scanned, 0);
        assert!(!config.resource.exists());
        assert!(!root.join("_Imports.razor").exists());
    }
}
