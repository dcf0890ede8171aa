//! The layout applier. Wraps each HTML entry in a `gtmpl` template chosen by
//! its `layout` metadata (or the configured default).
//!
//! Templates see the entry's metadata at the top level along with:
//!
//! * `.contents`: the entry's HTML body
//! * `.path`: the entry's final output path
//! * `.url`: the site URL joined with `.path`, if the site has a URL
//! * `.site`: the site's `title`, `url`, `author`, and `description`
//! * `.collections`: collection name to its members, in order; each member
//!   carries its own metadata plus `path` and `url`
//! * `.previous` and `.next`: the neighbouring members of the first
//!   collection with `refer` set that the entry belongs to

use crate::config::{LayoutsConfig, SiteMetadata};
use crate::entry::{FileEntry, Files};
use crate::value::{to_object, Value};
use gtmpl::{Context, Template, Value as TemplateValue};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The metadata key naming an entry's layout. `false` opts out of layouts.
pub const LAYOUT_KEY: &str = "layout";

const HTML_EXTENSION: &str = ".html";

/// Applies layouts to every HTML entry and returns how many were wrapped.
pub fn apply(files: &mut Files, config: &LayoutsConfig, site: &SiteMetadata) -> Result<usize> {
    let mut templates: HashMap<String, Template> = HashMap::new();
    let site_value = site_value(site);
    let collections_value = collections_value(files, site);

    let mut applied = 0;
    for path in files.paths() {
        if !path.ends_with(HTML_EXTENSION) {
            continue;
        }
        let entry = match files.get(&path) {
            Some(entry) => entry,
            None => continue,
        };
        let name = match layout_name(entry, config) {
            Some(name) => name.to_owned(),
            None => continue,
        };

        if !templates.contains_key(&name) {
            let template = parse_template(config, &name)?;
            templates.insert(name.clone(), template);
        }
        let template = &templates[&name];

        let mut object = to_object(&entry.metadata);
        object.insert(
            String::from("contents"),
            TemplateValue::String(String::from_utf8_lossy(&entry.contents).into_owned()),
        );
        object.insert(String::from("path"), TemplateValue::String(path.clone()));
        object.insert(String::from("url"), url_value(site, &path));
        object.insert(String::from("site"), site_value.clone());
        object.insert(String::from("collections"), collections_value.clone());
        let (previous, next) = neighbours(files, entry, site);
        object.insert(String::from("previous"), previous);
        object.insert(String::from("next"), next);

        let context = Context::from(TemplateValue::Object(object)).map_err(|err| {
            Error::Template {
                layout: name.clone(),
                message: err.to_string(),
            }
        })?;
        let mut output: Vec<u8> = Vec::new();
        template
            .execute(&mut output, &context)
            .map_err(|err| Error::Template {
                layout: name.clone(),
                message: format!("rendering `{}`: {}", path, err),
            })?;

        if let Some(entry) = files.get_mut(&path) {
            entry.contents = output;
        }
        applied += 1;
    }
    Ok(applied)
}

fn layout_name<'a>(entry: &'a FileEntry, config: &'a LayoutsConfig) -> Option<&'a str> {
    match entry.metadata.get(LAYOUT_KEY) {
        Some(Value::Bool(false)) => None,
        Some(Value::String(name)) => Some(name.as_str()),
        _ => config.default.as_deref(),
    }
}

// Loads the partials and the layout, concatenating them into one template so
// the layout can invoke the partials' definitions.
fn parse_template(config: &LayoutsConfig, layout: &str) -> Result<Template> {
    let mut contents = String::new();
    for file in config.partials.iter().map(String::as_str).chain(Some(layout)) {
        contents.push_str(&read_template(&config.directory.join(file))?);
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(|err| Error::Template {
        layout: layout.to_owned(),
        message: err.to_string(),
    })?;
    Ok(template)
}

fn read_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| Error::OpenTemplateFile {
        path: path.to_owned(),
        err,
    })
}

fn url_value(site: &SiteMetadata, path: &str) -> TemplateValue {
    match site.url.as_ref().and_then(|url| url.join(path).ok()) {
        Some(url) => TemplateValue::String(url.to_string()),
        None => TemplateValue::Nil,
    }
}

fn option_value(value: &Option<String>) -> TemplateValue {
    match value {
        Some(s) => TemplateValue::String(s.clone()),
        None => TemplateValue::Nil,
    }
}

fn site_value(site: &SiteMetadata) -> TemplateValue {
    let mut m: HashMap<String, TemplateValue> = HashMap::new();
    m.insert(String::from("title"), option_value(&site.title));
    m.insert(
        String::from("url"),
        option_value(&site.url.as_ref().map(|url| url.to_string())),
    );
    m.insert(String::from("author"), option_value(&site.author));
    m.insert(String::from("description"), option_value(&site.description));
    TemplateValue::Object(m)
}

// A member of a collection as seen from another entry's template.
fn summary_value(files: &Files, path: &str, site: &SiteMetadata) -> TemplateValue {
    let mut m = match files.get(path) {
        Some(entry) => to_object(&entry.metadata),
        None => HashMap::new(),
    };
    m.insert(String::from("path"), TemplateValue::String(path.to_owned()));
    m.insert(String::from("url"), url_value(site, path));
    TemplateValue::Object(m)
}

fn collections_value(files: &Files, site: &SiteMetadata) -> TemplateValue {
    TemplateValue::Object(
        files
            .collections()
            .map(|(name, collection)| {
                let members = collection
                    .members
                    .iter()
                    .map(|member| summary_value(files, member, site))
                    .collect();
                (name.to_owned(), TemplateValue::Array(members))
            })
            .collect(),
    )
}

fn neighbours(
    files: &Files,
    entry: &FileEntry,
    site: &SiteMetadata,
) -> (TemplateValue, TemplateValue) {
    for (name, &i) in &entry.memberships {
        let collection = match files.collection(name) {
            Some(collection) if collection.refer => collection,
            _ => continue,
        };
        let sibling = |j: Option<usize>| match j.and_then(|j| collection.members.get(j)) {
            Some(member) => summary_value(files, member, site),
            None => TemplateValue::Nil,
        };
        return (sibling(i.checked_sub(1)), sibling(i.checked_add(1)));
    }
    (TemplateValue::Nil, TemplateValue::Nil)
}

/// Represents the result of applying layouts.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error applying layouts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    #[error("opening template file `{}`: {err}", path.display())]
    OpenTemplateFile {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for errors parsing or executing a layout.
    #[error("layout `{layout}`: {message}")]
    Template { layout: String, message: String },
}
