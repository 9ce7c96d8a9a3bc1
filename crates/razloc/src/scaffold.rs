//! Generated glue between the components and the resource catalog.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::Event;
use razloc_std::error::prelude::*;
use razloc_std::path::diff;

use crate::backup::BackupService;
use crate::config::LocalizeConfig;

/// The imports file components share.
pub const IMPORTS_FILE: &str = "_Imports.razor";

/// The `<RootNamespace>` of a project file, if it declares one.
pub fn root_namespace(csproj: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(csproj);
    let mut in_root_namespace = false;
    loop {
        match reader.read_event().context_ut("parse project file")? {
            Event::Start(e) if e.local_name().as_ref() == b"RootNamespace" => {
                in_root_namespace = true;
            }
            Event::Text(t) if in_root_namespace => {
                let text = t.unescape().context_ut("parse project file")?;
                let text = text.trim();
                if !text.is_empty() {
                    return Ok(Some(text.to_owned()));
                }
            }
            Event::End(_) => in_root_namespace = false,
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// The namespace of the resource class: the project namespace extended with
/// the resource folder, e.g. `Crm.Resources`.
pub fn resource_namespace(config: &LocalizeConfig) -> Result<String> {
    let csproj = std::fs::read_to_string(&config.project_file)
        .map_err(error_once_map!("read project file", path: config.project_file.display()))?;
    let mut namespace = match root_namespace(&csproj)? {
        Some(ns) => ns,
        None => config
            .project_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let folder = config
        .resource
        .parent()
        .and_then(|parent| diff(&config.project_dir, parent));
    for part in folder.iter().flat_map(|folder| folder.iter()) {
        let part = part.to_string_lossy();
        if !part.is_empty() && part != "." {
            namespace.push('.');
            namespace.push_str(&part);
        }
    }
    Ok(namespace.replace(['-', ' '], "_"))
}

/// The marker class the string localizer is typed with.
pub fn resource_stub(namespace: &str, class: &str) -> String {
    format!("namespace {namespace}\n{{\n    public class {class}\n    {{\n    }}\n}}\n")
}

/// `imports` with `@using {namespace}` appended, or `None` if it already has
/// the directive.
pub fn add_using<'a>(imports: &'a str, namespace: &str) -> Option<Cow<'a, str>> {
    let directive = format!("@using {namespace}");
    if imports.lines().any(|line| line.trim() == directive) {
        return None;
    }
    if imports.is_empty() {
        return Some(Cow::Owned(format!("{directive}\n")));
    }
    let newline = if imports.contains("\r\n") { "\r\n" } else { "\n" };
    let separator = if imports.ends_with('\n') { "" } else { newline };
    Some(Cow::Owned(format!("{imports}{separator}{directive}{newline}")))
}

/// Generates the resource class next to the catalog if it is missing and
/// imports its namespace into every component.
pub fn scaffold(config: &LocalizeConfig, backup: &mut BackupService) -> Result<()> {
    let namespace = resource_namespace(config)?;

    let stub = config.resource.with_extension("cs");
    if !stub.exists() {
        backup.write_with_backup(&stub, &resource_stub(&namespace, &config.resource_class()))?;
    }

    let imports_path = config.project_dir.join(IMPORTS_FILE);
    let imports = match std::fs::read_to_string(&imports_path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => {
            return Err(err).map_err(error_once_map!("read imports", path: imports_path.display()));
        }
    };
    if let Some(updated) = add_using(&imports, &namespace) {
        log::info!("adding @using {namespace} to {}", imports_path.display());
        backup.write_with_backup(&imports_path, &updated)?;
    }
    Ok(())
}
