//! Writes the final [`Files`] mapping to disk. Output goes to a staging
//! directory next to the destination first and only replaces the destination
//! once every file has been written, so a failed write never leaves a
//! half-built site behind.

use crate::entry::Files;
use std::path::{Component, Path, PathBuf};

/// Writes every entry in `files` under `destination`, replacing whatever was
/// there before. An empty mapping produces an empty directory. On failure the
/// previous destination is left in place and the staging directory is removed.
pub fn write(files: &Files, destination: &Path) -> Result<()> {
    let staging = sibling(destination, "staging")?;
    rmdir(&staging)?;
    if let Err(err) = write_all(files, &staging).and_then(|()| replace(&staging, destination)) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(err);
    }
    tracing::debug!(
        files = files.len(),
        destination = %destination.display(),
        "wrote output tree"
    );
    Ok(())
}

// Swaps `staging` in for `destination`. The old destination is moved aside
// first and moved back if the swap fails.
fn replace(staging: &Path, destination: &Path) -> Result<()> {
    let rename = |from: &Path, to: &Path| {
        std::fs::rename(from, to).map_err(|err| Error::Io {
            path: to.to_owned(),
            err,
        })
    };

    let previous = sibling(destination, "old")?;
    rmdir(&previous)?;
    let moved_aside = match std::fs::symlink_metadata(destination) {
        Ok(metadata) if metadata.is_file() => {
            return Err(Error::InvalidDestination(destination.to_owned()));
        }
        Ok(_) => {
            rename(destination, &previous)?;
            true
        }
        Err(_) => false,
    };

    if let Err(err) = rename(staging, destination) {
        if moved_aside {
            let _ = std::fs::rename(&previous, destination);
        }
        return Err(err);
    }
    if moved_aside {
        if let Err(err) = rmdir(&previous) {
            tracing::warn!("removing previous output: {}", err);
        }
    }
    Ok(())
}

fn write_all(files: &Files, root: &Path) -> Result<()> {
    create_dir_all(root)?;
    for (path, entry) in files.iter() {
        let target = root.join(checked_relative_path(path)?);
        if let Some(parent) = target.parent() {
            create_dir_all(parent)?;
        }
        std::fs::write(&target, &entry.contents).map_err(|err| Error::Io {
            path: target.clone(),
            err,
        })?;
    }
    Ok(())
}

// Staging and previous output live in hidden siblings of the destination so
// the renames stay on one filesystem.
fn sibling(destination: &Path, suffix: &str) -> Result<PathBuf> {
    let name = destination
        .file_name()
        .ok_or_else(|| Error::InvalidDestination(destination.to_owned()))?;
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_owned(),
        _ => PathBuf::from("."),
    };
    create_dir_all(&parent)?;
    Ok(parent.join(format!(".{}.{}", name.to_string_lossy(), suffix)))
}

// Entry paths must stay inside the output directory.
fn checked_relative_path(path: &str) -> Result<&Path> {
    let relative = Path::new(path);
    if path.is_empty()
        || !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(Error::InvalidPath(path.to_owned()));
    }
    Ok(relative)
}

fn create_dir_all(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|err| Error::Io {
        path: dir.to_owned(),
        err,
    })
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

/// The result of a fallible write operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing the output tree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for I/O problems while cleaning output directories.
    #[error("cleaning directory `{}`: {err}", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for I/O problems writing output files.
    #[error("writing `{}`: {err}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the destination has no directory name to stage under or
    /// exists but isn't a directory.
    #[error("invalid destination directory `{}`", .0.display())]
    InvalidDestination(PathBuf),

    /// Returned when an entry path would escape the output directory.
    #[error("invalid output path `{0}`")]
    InvalidPath(String),
}
