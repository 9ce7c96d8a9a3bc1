//! Localization of Blazor/Razor projects.
//!
//! [`localize`] rewrites the UI text of `.razor` components and their C#
//! companions into `D["Key"]` lookups and collects the text into a `.resx`
//! catalog. [`translate::TranslateService`] fills per-language copies of
//! such catalogs, and [`backup::restore`] undoes the last localization run.

pub mod backup;
pub mod cancel;
pub mod config;
pub mod files;
pub mod localize;
pub mod scaffold;
pub mod translate;

pub use backup::{BackupService, RestoreReport, restore};
pub use cancel::CancelToken;
pub use config::{LocalizeConfig, RestoreConfig, TranslateConfig};
pub use localize::{LocalizeReport, localize};
pub use translate::{TranslateReport, TranslateService, Translator};
