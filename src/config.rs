//! Defines the [`BuildConfiguration`] handed to each build stage and the
//! [`Project`] loader that assembles it from a `quire.yaml` file.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file searched for by [`Project::from_directory`].
pub const PROJECT_FILE: &str = "quire.yaml";

/// Rules for one named collection.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CollectionConfig {
    /// Glob selecting member paths, e.g. `writings/**/*.md`.
    pub pattern: String,

    /// The metadata field members are ordered by.
    #[serde(default = "default_sort_by")]
    pub sort_by: String,

    /// Descending order when true.
    #[serde(default)]
    pub reverse: bool,

    /// Links members to their previous and next siblings when true.
    #[serde(default = "default_true")]
    pub refer: bool,
}

impl CollectionConfig {
    pub fn new(pattern: &str) -> CollectionConfig {
        CollectionConfig {
            pattern: pattern.to_owned(),
            sort_by: default_sort_by(),
            reverse: false,
            refer: true,
        }
    }
}

fn default_sort_by() -> String {
    String::from("date")
}

fn default_true() -> bool {
    true
}

/// Markdown dialect switches.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Strikethrough, task lists, and footnotes.
    pub gfm: bool,

    /// Pipe tables.
    pub tables: bool,

    /// Curly quotes, dashes, and ellipses.
    pub smartypants: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        MarkdownConfig {
            gfm: true,
            tables: true,
            smartypants: false,
        }
    }
}

/// Where static assets are copied from and to.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetsConfig {
    /// The directory assets are read from.
    pub source: PathBuf,

    /// The slash-separated output prefix assets are placed under. Empty
    /// means the output root.
    pub destination: String,
}

/// Permalink rules. With no pattern, paths are left as they are.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PermalinksConfig {
    /// Slash-separated segments, where `:field` segments are replaced by
    /// the slugified metadata value, e.g. `blog/:title`.
    pub pattern: Option<String>,
}

/// Where layout templates live and which one applies by default.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutsConfig {
    /// The directory layout and partial templates are read from.
    pub directory: PathBuf,

    /// The layout used for entries that don't name one.
    pub default: Option<String>,

    /// Templates, relative to `directory`, parsed ahead of every layout so
    /// their definitions can be shared.
    pub partials: Vec<String>,
}

/// Site-wide values made available to every layout as `.site`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMetadata {
    pub title: Option<String>,
    pub url: Option<Url>,
    pub author: Option<String>,
    pub description: Option<String>,
}

/// Everything the build stages need. Constructed once and never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildConfiguration {
    pub site: SiteMetadata,
    pub collections: BTreeMap<String, CollectionConfig>,
    pub markdown: MarkdownConfig,
    pub assets: Option<AssetsConfig>,
    pub permalinks: PermalinksConfig,
    pub layouts: Option<LayoutsConfig>,
}

impl Default for BuildConfiguration {
    /// Posts under `writings/` newest first, and pages under `pages/` by
    /// title without previous/next links.
    fn default() -> Self {
        BuildConfiguration {
            site: SiteMetadata::default(),
            collections: default_collections(),
            markdown: MarkdownConfig::default(),
            assets: None,
            permalinks: PermalinksConfig::default(),
            layouts: None,
        }
    }
}

fn default_collections() -> BTreeMap<String, CollectionConfig> {
    let mut collections = BTreeMap::new();
    collections.insert(
        String::from("writings"),
        CollectionConfig {
            reverse: true,
            ..CollectionConfig::new("writings/**/*.md")
        },
    );
    collections.insert(
        String::from("pages"),
        CollectionConfig {
            sort_by: String::from("title"),
            refer: false,
            ..CollectionConfig::new("pages/**/*.md")
        },
    );
    collections
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AssetsFile {
    source: PathBuf,
    #[serde(default)]
    destination: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutsFile {
    #[serde(default = "default_layouts_directory")]
    directory: PathBuf,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    partials: Vec<String>,
}

fn default_layouts_directory() -> PathBuf {
    PathBuf::from("layouts")
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectFile {
    #[serde(default = "default_source")]
    source: PathBuf,
    #[serde(default = "default_destination")]
    destination: PathBuf,
    #[serde(default)]
    site: SiteMetadata,
    #[serde(default)]
    collections: Option<BTreeMap<String, CollectionConfig>>,
    #[serde(default)]
    markdown: MarkdownConfig,
    #[serde(default)]
    assets: Option<AssetsFile>,
    #[serde(default)]
    permalinks: PermalinksConfig,
    #[serde(default)]
    layouts: Option<LayoutsFile>,

    // Tag indexing is accepted in the project file but never run.
    #[serde(default)]
    tags: Option<serde_yaml::Value>,
}

fn default_source() -> PathBuf {
    PathBuf::from("src")
}

fn default_destination() -> PathBuf {
    PathBuf::from("build")
}

/// A loaded project: where to read, where to write, and how to build.
#[derive(Clone, Debug, PartialEq)]
pub struct Project {
    pub source_directory: PathBuf,
    pub destination_directory: PathBuf,
    pub build: BuildConfiguration,
}

impl Project {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its parents.
    pub fn from_directory(dir: &Path) -> Result<Project> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Project::from_project_file(&path)
                .with_context(|| format!("Loading configuration `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Project::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads a project file. Relative directories are resolved against the
    /// directory containing the file.
    pub fn from_project_file(path: &Path) -> Result<Project> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: ProjectFile = serde_yaml::from_reader(file)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;

        if project.tags.is_some() {
            tracing::debug!("tag indexing is configured but disabled");
        }

        Ok(Project {
            source_directory: project_root.join(&project.source),
            destination_directory: project_root.join(&project.destination),
            build: BuildConfiguration {
                site: project.site,
                collections: project.collections.unwrap_or_else(default_collections),
                markdown: project.markdown,
                assets: project.assets.map(|assets| AssetsConfig {
                    source: project_root.join(assets.source),
                    destination: assets.destination.trim_matches('/').to_owned(),
                }),
                permalinks: project.permalinks,
                layouts: project.layouts.map(|layouts| LayoutsConfig {
                    directory: project_root.join(layouts.directory),
                    default: layouts.default,
                    partials: layouts.partials,
                }),
            },
        })
    }
}
