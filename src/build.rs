//! Exports the [`build`] function which stitches together the high-level
//! steps of building the output static site: loading the source tree
//! ([`crate::source`]), running each [`Stage`] in order over the in-memory
//! [`Files`] mapping, and writing the result ([`crate::write`]).

use crate::config::{
    AssetsConfig, BuildConfiguration, CollectionConfig, LayoutsConfig, MarkdownConfig,
    PermalinksConfig, SiteMetadata,
};
use crate::entry::Files;
use crate::{assets, collections, drafts, layouts, markdown, permalinks, source, updated, write};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A boxed error from a single stage.
pub type StageFailure = Box<dyn std::error::Error + Send + Sync>;

/// One step of the build. Each stage carries the slice of the
/// [`BuildConfiguration`] it reads.
#[derive(Clone, Copy, Debug)]
pub enum Stage<'a> {
    Drafts,
    Collections(&'a BTreeMap<String, CollectionConfig>),
    Markdown(&'a MarkdownConfig),
    Updated,
    Assets(Option<&'a AssetsConfig>),
    Permalinks(&'a PermalinksConfig),
    Layouts(Option<&'a LayoutsConfig>, &'a SiteMetadata),
}

impl<'a> Stage<'a> {
    /// The fixed stage order. Tag indexing is configurable but never run.
    pub fn pipeline(config: &'a BuildConfiguration) -> Vec<Stage<'a>> {
        vec![
            Stage::Drafts,
            Stage::Collections(&config.collections),
            Stage::Markdown(&config.markdown),
            Stage::Updated,
            Stage::Assets(config.assets.as_ref()),
            Stage::Permalinks(&config.permalinks),
            Stage::Layouts(config.layouts.as_ref(), &config.site),
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Drafts => "drafts",
            Stage::Collections(_) => "collections",
            Stage::Markdown(_) => "markdown",
            Stage::Updated => "updated",
            Stage::Assets(_) => "assets",
            Stage::Permalinks(_) => "permalinks",
            Stage::Layouts(_, _) => "layouts",
        }
    }

    /// Runs the stage, consuming the mapping and handing back the
    /// transformed one.
    pub fn apply(&self, mut files: Files) -> std::result::Result<Files, StageFailure> {
        match *self {
            Stage::Drafts => {
                let removed = drafts::filter(&mut files);
                tracing::debug!(removed, "filtered drafts");
            }
            Stage::Collections(config) => collections::group(&mut files, config)?,
            Stage::Markdown(config) => {
                let rendered = markdown::render(&mut files, config)?;
                tracing::debug!(rendered, "rendered markdown");
            }
            Stage::Updated => updated::annotate(&mut files),
            Stage::Assets(Some(config)) => {
                let copied = assets::copy(&mut files, config)?;
                tracing::debug!(copied, "copied assets");
            }
            Stage::Assets(None) => {}
            Stage::Permalinks(config) => permalinks::rewrite(&mut files, config)?,
            Stage::Layouts(Some(config), site) => {
                let applied = layouts::apply(&mut files, config, site)?;
                tracing::debug!(applied, "applied layouts");
            }
            Stage::Layouts(None, _) => {}
        }
        Ok(files)
    }
}

/// Builds the site: loads `source_directory`, runs every stage, and writes
/// the result to `destination_directory`. Nothing is written unless every
/// stage succeeds.
pub fn build(
    source_directory: &Path,
    destination_directory: &Path,
    config: &BuildConfiguration,
) -> Result<()> {
    if !source_directory.is_dir() {
        return Err(Error::SourceNotFound(source_directory.to_owned()));
    }
    let mut files = source::read(source_directory)?;
    tracing::info!(
        files = files.len(),
        source = %source_directory.display(),
        "loaded source files"
    );

    for stage in Stage::pipeline(config) {
        let _span = tracing::info_span!("stage", stage = stage.name()).entered();
        files = stage.apply(files).map_err(|err| Error::Stage {
            stage: stage.name(),
            err,
        })?;
        tracing::debug!(files = files.len(), "stage complete");
    }

    write::write(&files, destination_directory)?;
    tracing::info!(
        files = files.len(),
        destination = %destination_directory.display(),
        "site built"
    );
    Ok(())
}

/// The result of building a site.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can happen while loading the
/// source tree, in any stage, or while writing the output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the source directory doesn't exist.
    #[error("source directory `{}` not found", .0.display())]
    SourceNotFound(PathBuf),

    /// Returned for errors loading source files.
    #[error(transparent)]
    Source(#[from] source::Error),

    /// Returned when a stage fails. Names the stage and wraps its error.
    #[error("stage `{stage}` failed: {err}")]
    Stage {
        stage: &'static str,
        #[source]
        err: StageFailure,
    },

    /// Returned for errors writing the output tree.
    #[error(transparent)]
    Write(#[from] write::Error),
}
