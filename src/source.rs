//! Loads a source directory into [`Files`]. Every file under the directory
//! becomes an entry keyed by its slash-separated relative path; front matter
//! is parsed off the top of Markdown files and moved into the entry's
//! metadata. Everything else is loaded byte for byte.

use crate::entry::{DuplicatePath, FileEntry, Files};
use crate::{frontmatter, markdown};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Reads every file under `source_directory` into memory.
pub fn read(source_directory: &Path) -> Result<Files> {
    let mut files = Files::new();
    for result in WalkDir::new(source_directory)
        .min_depth(1)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = result?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative_path = entry
            .path()
            .strip_prefix(source_directory)
            // WalkDir only yields paths beneath its root
            .map_err(|_| Error::InvalidFileName(entry.path().to_owned()))?;
        let key = relative_key(relative_path)?;
        let file_entry = read_entry(entry.path())?;
        files.insert(key, file_entry)?;
    }
    tracing::debug!(
        files = files.len(),
        source = %source_directory.display(),
        "loaded source tree"
    );
    Ok(files)
}

/// Converts a relative path into the slash-separated key used by [`Files`].
pub fn relative_key(relative_path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative_path.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| Error::InvalidFileName(relative_path.to_owned()))?,
            ),
            Component::CurDir => {}
            _ => return Err(Error::InvalidFileName(relative_path.to_owned())),
        }
    }
    Ok(parts.join("/"))
}

/// Reads a single file. UTF-8 Markdown files have their front matter parsed;
/// other files are kept as opaque bytes.
pub fn read_entry(path: &Path) -> Result<FileEntry> {
    let annotate = |err| Error::Io {
        path: path.to_owned(),
        err,
    };
    let contents = std::fs::read(path).map_err(annotate)?;
    let modified = modified_time(path);

    let is_markdown = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(markdown::markdown_stem)
        .is_some();
    let text = if is_markdown {
        std::str::from_utf8(&contents).ok()
    } else {
        None
    };

    let mut file_entry = match text {
        Some(text) => {
            let (metadata, body) = frontmatter::parse(text).map_err(|err| Error::Frontmatter {
                path: path.to_owned(),
                err,
            })?;
            let mut file_entry = FileEntry::new(body);
            file_entry.metadata = metadata;
            file_entry
        }
        None => FileEntry::new(contents),
    };
    file_entry.modified = modified;
    Ok(file_entry)
}

/// Represents the result of loading source files.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading source files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for I/O problems reading a file.
    #[error("reading `{}`: {err}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for WalkDir I/O errors.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// Returned when a source path isn't valid UTF-8.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(PathBuf),

    /// Returned when a file's front matter can't be parsed.
    #[error("parsing front matter of `{}`: {err}", path.display())]
    Frontmatter {
        path: PathBuf,
        #[source]
        err: frontmatter::Error,
    },

    /// Returned when two source files map to the same key.
    #[error(transparent)]
    DuplicatePath(#[from] DuplicatePath),
}

/// Returns a file's last-modified time, if the platform reports one.
pub fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(|t| DateTime::<Utc>::from(t).naive_utc())
}
