//! Persisted catalogs.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use razloc_std::error::prelude::*;

use crate::catalog::ResourceCatalog;

/// Loads and saves catalogs as ordered `(key, value)` entries.
pub trait CatalogStore {
    /// Reads all entries in document order. A missing file is an empty catalog.
    fn load(&self, path: &Path) -> Result<Vec<(String, String)>>;

    /// Rewrites the file with the given entries.
    fn save(&self, path: &Path, entries: &mut dyn Iterator<Item = (&str, &str)>) -> Result<()>;

    /// Merges the persisted entries at `path` into `catalog`, returning how
    /// many were new.
    fn load_into(&self, path: &Path, catalog: &mut ResourceCatalog) -> Result<usize> {
        Ok(catalog.merge(self.load(path)?))
    }

    /// Saves a whole catalog.
    fn save_catalog(&self, path: &Path, catalog: &ResourceCatalog) -> Result<()> {
        self.save(path, &mut catalog.iter())
    }
}

/// The `.resx` catalog format used by .NET resource managers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResxStore;

const RESHEADERS: &[(&str, &str)] = &[
    ("resmimetype", "text/microsoft-resx"),
    ("version", "2.0"),
    (
        "reader",
        "System.Resources.ResXResourceReader, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089",
    ),
    (
        "writer",
        "System.Resources.ResXResourceWriter, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089",
    ),
];

impl ResxStore {
    /// Parses resx text into string entries. Typed (non-string) resources
    /// are skipped.
    pub fn parse(text: &str) -> Result<Vec<(String, String)>> {
        let mut reader = Reader::from_str(text);
        let mut entries = Vec::new();

        // (name, is_string) of the open `<data>` element.
        let mut data: Option<(String, bool)> = None;
        let mut in_value = false;
        let mut value = String::new();

        loop {
            match reader.read_event().context_ut("parse resx")? {
                Event::Start(e) => match e.name().as_ref() {
                    b"data" => {
                        let name = match e.try_get_attribute("name").context_ut("parse resx")? {
                            Some(attr) => attr.unescape_value().context_ut("parse resx")?.into_owned(),
                            None => String::new(),
                        };
                        let typed = e.try_get_attribute("type").context_ut("parse resx")?.is_some()
                            || e.try_get_attribute("mimetype").context_ut("parse resx")?.is_some();
                        data = Some((name, !typed));
                        value.clear();
                    }
                    b"value" if data.is_some() => in_value = true,
                    _ => {}
                },
                Event::Text(t) if in_value => {
                    value.push_str(&t.unescape().context_ut("parse resx")?);
                }
                Event::CData(c) if in_value => {
                    value.push_str(&String::from_utf8_lossy(&c));
                }
                Event::End(e) => match e.name().as_ref() {
                    b"value" => in_value = false,
                    b"data" => {
                        if let Some((name, true)) = data.take() {
                            if !name.is_empty() {
                                entries.push((name, std::mem::take(&mut value)));
                            }
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(entries)
    }

    /// Renders entries as a complete resx document.
    pub fn render<'a, 'b>(entries: impl Iterator<Item = (&'a str, &'b str)>) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root>\n");
        for (name, value) in RESHEADERS {
            out.push_str(&format!(
                "  <resheader name=\"{name}\">\n    <value>{}</value>\n  </resheader>\n",
                escape(value)
            ));
        }
        for (name, value) in entries {
            out.push_str(&format!(
                "  <data name=\"{}\" xml:space=\"preserve\">\n    <value>{}</value>\n  </data>\n",
                escape(name),
                escape(value)
            ));
        }
        out.push_str("</root>\n");
        out
    }
}

impl CatalogStore for ResxStore {
    fn load(&self, path: &Path) -> Result<Vec<(String, String)>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).map_err(error_once_map!("read catalog", path: path.display()));
            }
        };
        Self::parse(&text).map_err(wrap_err("load catalog"))
    }

    fn save(&self, path: &Path, entries: &mut dyn Iterator<Item = (&str, &str)>) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(error_once_map!("create catalog dir", path: parent.display()))?;
        }
        let text = Self::render(entries);
        std::fs::write(path, text).map_err(error_once_map!("write catalog", path: path.display()))?;
        log::info!("saved catalog {}", path.display());
        Ok(())
    }
}
