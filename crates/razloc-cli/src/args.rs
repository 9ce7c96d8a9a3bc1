use std::path::PathBuf;

use razloc::config::{LocalizeOptions, TranslateOptions};

#[derive(Debug, Clone, clap::Parser)]
#[clap(name = "razloc", author, version, about)]
pub struct CliArguments {
    /// Mode of the binary
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Subcommand)]
#[clap(rename_all = "kebab-case")]
pub enum Commands {
    /// Replaces UI text in components with catalog lookups
    Localize(LocalizeArgs),
    /// Translates catalogs into other languages
    Translate(TranslateArgs),
    /// Puts back the files changed by the last localization
    Restore(RestoreArgs),
}

impl Commands {
    /// The options every command shares.
    pub fn common(&self) -> &CommonArgs {
        match self {
            Self::Localize(args) => &args.common,
            Self::Translate(args) => &args.common,
            Self::Restore(args) => &args.common,
        }
    }
}

/// How much is logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// Progress and warnings
    #[default]
    Normal,
    /// Every decision
    Detailed,
    /// Everything
    Diagnostic,
}

impl Verbosity {
    /// The log level of the razloc crates.
    pub fn level(self) -> log::LevelFilter {
        use log::LevelFilter::*;

        match self {
            Self::Quiet => Error,
            Self::Normal => Info,
            Self::Detailed => Debug,
            Self::Diagnostic => Trace,
        }
    }
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct CommonArgs {
    /// Logs what would change without writing anything
    #[clap(long)]
    pub dry_run: bool,

    /// How much to log
    #[clap(long, short = 'v', value_enum, default_value_t = Verbosity::Normal)]
    pub verbosity: Verbosity,

    /// The settings file, `razloc.toml` next to the project by default
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl CommonArgs {
    fn dry_run(&self) -> Option<bool> {
        self.dry_run.then_some(true)
    }
}

#[derive(Debug, Clone, Default, clap::Parser)]
pub struct LocalizeArgs {
    #[clap(flatten)]
    pub common: CommonArgs,

    /// A `.csproj` file or a directory holding exactly one
    #[clap(long, value_name = "PATH")]
    pub project: Option<PathBuf>,

    /// The base catalog, relative to the project directory
    #[clap(long, value_name = "FILE")]
    pub resource: Option<PathBuf>,

    /// Globs selecting the components to localize
    #[clap(long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// File names of components that are left alone
    #[clap(long, value_name = "NAME")]
    pub exclude: Vec<String>,

    /// Archives every file before changing it
    #[clap(long)]
    pub backup: bool,

    /// Methods whose string arguments are never localized
    #[clap(long = "excluded-method", value_name = "NAME")]
    pub excluded_methods: Vec<String>,

    /// Skips generating the resource class and `@using` directive
    #[clap(long)]
    pub no_scaffold: bool,
}

impl From<&LocalizeArgs> for LocalizeOptions {
    fn from(args: &LocalizeArgs) -> Self {
        Self {
            project: args.project.clone(),
            resource: args.resource.clone(),
            include: args.include.clone(),
            exclude: args.exclude.clone(),
            backup: args.backup.then_some(true),
            excluded_methods: args.excluded_methods.clone(),
            scaffold: args.no_scaffold.then_some(false),
            dry_run: args.common.dry_run(),
        }
    }
}

#[derive(Debug, Clone, Default, clap::Parser)]
pub struct TranslateArgs {
    #[clap(flatten)]
    pub common: CommonArgs,

    /// A directory searched for base catalogs, or a single catalog
    #[clap(long, value_name = "PATH")]
    pub source: Option<PathBuf>,

    /// A directory receiving the translated catalogs
    #[clap(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Target language codes such as `de,fr,pt-BR`
    #[clap(long, value_delimiter = ',', value_name = "LANGS")]
    pub target_languages: Vec<String>,

    /// The contact email sent to the translation endpoint
    #[clap(long, env = "RAZLOC_EMAIL")]
    pub email: Option<String>,

    /// The language of the base catalogs
    #[clap(long, value_name = "LANG")]
    pub source_language: Option<String>,

    /// The translation endpoint
    #[clap(long, value_name = "URL", hide = true)]
    pub endpoint: Option<String>,
}

impl From<&TranslateArgs> for TranslateOptions {
    fn from(args: &TranslateArgs) -> Self {
        Self {
            source: args.source.clone(),
            output: args.output.clone(),
            target_languages: args.target_languages.clone(),
            email: args.email.clone(),
            source_language: args.source_language.clone(),
            endpoint: args.endpoint.clone(),
            dry_run: args.common.dry_run(),
        }
    }
}

#[derive(Debug, Clone, Default, clap::Parser)]
pub struct RestoreArgs {
    #[clap(flatten)]
    pub common: CommonArgs,

    /// A `.csproj` file or a directory holding exactly one
    #[clap(long, value_name = "PATH")]
    pub project: Option<PathBuf>,

    /// Also overwrites files changed after the backup
    #[clap(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[test]
    fn arguments_are_consistent() {
        CliArguments::command().debug_assert();
    }

    #[test]
    fn localize_flags_override_settings() {
        let args = CliArguments::try_parse_from([
            "razloc",
            "localize",
            "--project",
            "Crm",
            "--include",
            "Pages/*.razor",
            "--no-scaffold",
            "--dry-run",
            "-v",
            "detailed",
        ])
        .unwrap();
        let Commands::Localize(localize) = &args.command else {
            panic!("expected localize");
        };
        assert_eq!(args.command.common().verbosity, Verbosity::Detailed);

        let settings = LocalizeOptions {
            include: vec!["*.razor".to_owned()],
            backup: Some(true),
            scaffold: Some(true),
            ..Default::default()
        };
        let options = LocalizeOptions::from(localize).or(settings);
        assert_eq!(options.project, Some(PathBuf::from("Crm")));
        assert_eq!(options.include, ["Pages/*.razor"]);
        assert_eq!(options.backup, Some(true));
        assert_eq!(options.scaffold, Some(false));
        assert_eq!(options.dry_run, Some(true));
    }

    #[test]
    fn target_languages_are_split() {
        let args = CliArguments::try_parse_from([
            "razloc",
            "translate",
            "--target-languages",
            "de,fr",
            "--target-languages",
            "pt-BR",
            "--email",
            "dev@example.com",
        ])
        .unwrap();
        let Commands::Translate(translate) = args.command else {
            panic!("expected translate");
        };
        assert_eq!(translate.target_languages, ["de", "fr", "pt-BR"]);
        assert_eq!(translate.common.verbosity, Verbosity::Normal);
    }
}
