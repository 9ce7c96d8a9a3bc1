//! Path utilities.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

pub use path_clean::PathClean;

/// Get the path cleaned as a unix-style string.
pub fn unix_slash(root: &Path) -> String {
    let mut res = String::with_capacity(root.as_os_str().len());
    let mut parent_norm = false;
    for comp in root.components() {
        match comp {
            Component::Prefix(p) => {
                res.push_str(&p.as_os_str().to_string_lossy());
                parent_norm = false;
            }
            Component::RootDir => {
                res.push('/');
                parent_norm = false;
            }
            Component::CurDir => {
                parent_norm = false;
            }
            Component::ParentDir => {
                if parent_norm {
                    res.push('/');
                }
                res.push_str("..");
                parent_norm = true;
            }
            Component::Normal(p) => {
                if parent_norm {
                    res.push('/');
                }
                res.push_str(&p.to_string_lossy());
                parent_norm = true;
            }
        }
    }

    if res.is_empty() {
        res.push('.');
    }

    res
}

/// Construct a relative path from a provided base directory path to the
/// provided path.
pub fn diff(fr: &Path, to: &Path) -> Option<PathBuf> {
    // pathdiff does not normalize `.` and `..` itself.
    fn clean_for_diff(p: &Path) -> Cow<'_, Path> {
        if p.components()
            .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
        {
            Cow::Owned(p.clean())
        } else {
            Cow::Borrowed(p)
        }
    }

    pathdiff::diff_paths(clean_for_diff(to).as_ref(), clean_for_diff(fr).as_ref())
}

/// The project-relative, unix-style name of `path`, used for archive entries
/// and manifest keys. Returns `None` when `path` escapes `root`.
pub fn project_relative(root: &Path, path: &Path) -> Option<String> {
    let rel = diff(root, path)?;
    if rel
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        return None;
    }
    Some(unix_slash(&rel))
}

/// Whether the file name of `path` equals `name`, ignoring ASCII case.
pub fn file_name_eq(path: &Path, name: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(name))
}

/// Whether `path` has the extension `ext`, ignoring ASCII case.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_unix_slash() {
        assert_eq!(unix_slash(Path::new("a/./b")), "a/b");
        assert_eq!(unix_slash(Path::new("/a/../b")), "/a/../b");
        assert_eq!(unix_slash(Path::new("")), ".");
    }

    #[test]
    fn relative_names() {
        let root = Path::new("/work/app");
        assert_eq!(
            project_relative(root, Path::new("/work/app/Pages/Index.razor")).as_deref(),
            Some("Pages/Index.razor")
        );
        assert_eq!(
            project_relative(root, Path::new("/work/app/./Shared/../Login.razor")).as_deref(),
            Some("Login.razor")
        );
        assert_eq!(project_relative(root, Path::new("/work/other/x.razor")), None);
    }

    #[test]
    fn case_insensitive_names() {
        assert!(file_name_eq(Path::new("x/_imports.RAZOR"), "_Imports.razor"));
        assert!(has_extension(Path::new("App.CsProj"), "csproj"));
        assert!(!has_extension(Path::new("App.razor.cs"), "razor"));
    }
}
