//! End-to-end runs of `localize` and `restore` on a small project.

use std::path::Path;

use razloc::config::LocalizeOptions;
use razloc::{CancelToken, LocalizeConfig, localize, restore};
use razloc_l10n::{CatalogStore, ResxStore};

const LOGIN: &str = "@page \"/login\"\n<RadzenText Text=\"Welcome\" />\n<RadzenButton Text=\"Save\" />\n";
const USERS: &str = "@page \"/users\"\n<h3>Users</h3>\n";
const USERS_CODE: &str = r#"namespace Crm.Pages
{
    public partial class Users
    {
        void OnDelete() => Notify("User deleted successfully");
        string Route() => string.Format("/users/{0}", 1);
    }
}
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).unwrap()
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "Crm.csproj",
        "<Project Sdk=\"Microsoft.NET.Sdk.Web\">\n  <PropertyGroup>\n    <RootNamespace>Crm</RootNamespace>\n  </PropertyGroup>\n</Project>\n",
    );
    write(root, "App.razor", "<Router AppAssembly=\"@typeof(App).Assembly\" />\n");
    write(root, "Pages/Login.razor", LOGIN);
    write(root, "Pages/Users.razor", USERS);
    write(root, "Pages/Users.razor.cs", USERS_CODE);
    dir
}

fn config(root: &Path) -> LocalizeConfig {
    let options = LocalizeOptions {
        backup: Some(true),
        ..Default::default()
    };
    LocalizeConfig::resolve(options, root).unwrap()
}

#[test]
fn localizes_a_project() {
    let dir = project();
    let root = dir.path();
    let config = config(root);

    let report = localize(&config, &CancelToken::new()).unwrap();
    assert!(report.is_success());
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.files_changed, 3);
    assert!(report.archive.is_some());

    let login = read(root, "Pages/Login.razor");
    assert!(login.starts_with(
        "@inject Microsoft.Extensions.Localization.IStringLocalizer<SharedResources> D\n"
    ));
    assert!(login.contains(r#"<RadzenText Text="@D["Login.welcome"]" />"#));
    assert!(login.contains(r#"<RadzenButton Text="@D["Button.Save"]" />"#));

    let users = read(root, "Pages/Users.razor");
    assert!(users.contains(r#"<h3>@D["Users.users"]</h3>"#));

    let code = read(root, "Pages/Users.razor.cs");
    assert!(code.contains(r#"Notify(D["Users.userdeletedsuccessfully"])"#));
    assert!(code.contains(r#"string.Format("/users/{0}", 1)"#));

    assert_eq!(read(root, "App.razor"), "<Router AppAssembly=\"@typeof(App).Assembly\" />\n");

    let catalog = ResxStore.load(&config.resource).unwrap();
    let keys: Vec<_> = catalog.iter().map(|(key, _)| key.as_str()).collect();
    assert_eq!(
        keys,
        [
            "Login.welcome",
            "Button.Save",
            "Users.userdeletedsuccessfully",
            "Users.users",
        ]
    );

    let stub = read(root, "Resources/SharedResources.cs");
    assert!(stub.starts_with("namespace Crm.Resources\n"));
    assert!(stub.contains("public class SharedResources"));
    assert_eq!(read(root, "_Imports.razor"), "@using Crm.Resources\n");
}

#[test]
fn rerun_is_idempotent() {
    let dir = project();
    let root = dir.path();
    let config = config(root);

    localize(&config, &CancelToken::new()).unwrap();
    let login = read(root, "Pages/Login.razor");
    let resx = std::fs::read(&config.resource).unwrap();

    let again = localize(&config, &CancelToken::new()).unwrap();
    assert!(again.is_success());
    assert_eq!(again.files_changed, 0);
    assert!(again.archive.is_none());
    assert_eq!(read(root, "Pages/Login.razor"), login);
    assert_eq!(std::fs::read(&config.resource).unwrap(), resx);
}

#[test]
fn existing_catalog_text_is_kept() {
    let dir = project();
    let root = dir.path();
    let config = config(root);
    ResxStore
        .save(&config.resource, &mut [("Login.welcome", "Welcome back")].into_iter())
        .unwrap();

    localize(&config, &CancelToken::new()).unwrap();
    let catalog = ResxStore.load(&config.resource).unwrap();
    assert_eq!(catalog[0], ("Login.welcome".to_owned(), "Welcome back".to_owned()));
}

#[test]
fn dry_run_touches_nothing() {
    let dir = project();
    let root = dir.path();
    let options = LocalizeOptions {
        dry_run: Some(true),
        backup: Some(true),
        ..Default::default()
    };
    let config = LocalizeConfig::resolve(options, root).unwrap();

    let report = localize(&config, &CancelToken::new()).unwrap();
    assert!(report.is_success());
    assert!(report.archive.is_none());
    assert_eq!(read(root, "Pages/Login.razor"), LOGIN);
    assert!(!config.resource.exists());
    assert!(!root.join("_Imports.razor").exists());
    assert!(!root.join(razloc::backup::BACKUP_DIR).exists());
}

#[test]
fn restore_undoes_the_run() {
    let dir = project();
    let root = dir.path();
    localize(&config(root), &CancelToken::new()).unwrap();

    let report = restore(root, false, false).unwrap();
    assert_eq!(
        report.restored,
        ["Pages/Login.razor", "Pages/Users.razor.cs", "Pages/Users.razor"]
    );
    assert!(report.skipped.is_empty());
    assert_eq!(read(root, "Pages/Login.razor"), LOGIN);
    assert_eq!(read(root, "Pages/Users.razor"), USERS);
    assert_eq!(read(root, "Pages/Users.razor.cs"), USERS_CODE);
}

#[test]
fn restore_keeps_later_edits_unless_forced() {
    let dir = project();
    let root = dir.path();
    localize(&config(root), &CancelToken::new()).unwrap();

    let edited = format!("{}<p>@D[\"Login.hint\"]</p>\n", read(root, "Pages/Login.razor"));
    write(root, "Pages/Login.razor", &edited);

    let report = restore(root, false, false).unwrap();
    assert_eq!(report.skipped, ["Pages/Login.razor"]);
    assert_eq!(read(root, "Pages/Login.razor"), edited);
    assert_eq!(read(root, "Pages/Users.razor"), USERS);

    let forced = restore(root, true, false).unwrap();
    assert!(forced.skipped.is_empty());
    assert_eq!(read(root, "Pages/Login.razor"), LOGIN);
}

#[test]
fn restore_without_backup_fails() {
    let dir = project();
    assert!(restore(dir.path(), false, false).is_err());
}
