//! The asset copier. Static files that live outside the source tree (a
//! theme's stylesheets, images, fonts) are pulled into the file mapping under
//! a destination prefix.

use crate::config::AssetsConfig;
use crate::entry::{FileEntry, Files};
use crate::source::{modified_time, relative_key};
use std::path::PathBuf;
use walkdir::WalkDir;

/// Copies every file under `config.source` into `files` at
/// `{config.destination}/{relative path}` and returns how many were copied.
/// Asset contents are copied verbatim; front matter is not parsed.
pub fn copy(files: &mut Files, config: &AssetsConfig) -> Result<usize> {
    if !config.source.is_dir() {
        return Err(Error::SourceNotFound(config.source.clone()));
    }

    let mut copied = 0;
    for result in WalkDir::new(&config.source).min_depth(1) {
        let entry = result?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative_path = entry
            .path()
            .strip_prefix(&config.source)
            .map_err(|_| Error::InvalidFileName(entry.path().to_owned()))?;
        let key = relative_key(relative_path)
            .map_err(|_| Error::InvalidFileName(entry.path().to_owned()))?;
        let key = match config.destination.as_str() {
            "" => key,
            destination => format!("{}/{}", destination, key),
        };

        let contents = std::fs::read(entry.path()).map_err(|err| Error::Io {
            path: entry.path().to_owned(),
            err,
        })?;
        let mut file_entry = FileEntry::new(contents);
        file_entry.modified = modified_time(entry.path());
        files.insert(key, file_entry)?;
        copied += 1;
    }
    Ok(copied)
}

/// Represents the result of copying assets.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error copying assets.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the assets directory doesn't exist.
    #[error("assets directory `{}` not found", .0.display())]
    SourceNotFound(PathBuf),

    /// Returned for I/O problems reading an asset.
    #[error("reading `{}`: {err}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for WalkDir I/O errors.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// Returned when an asset path isn't valid UTF-8.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(PathBuf),

    /// Returned when an asset would overwrite another entry.
    #[error(transparent)]
    DuplicatePath(#[from] crate::entry::DuplicatePath),
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_copy() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("css/fonts"))?;
        fs::write(dir.path().join("css/site.css"), "body {}")?;
        fs::write(dir.path().join("css/fonts/serif.woff"), [0u8, 1, 2])?;

        let mut files = Files::new();
        files.insert("index.html", FileEntry::new("<p>hi</p>"))?;

        let config = AssetsConfig {
            source: dir.path().to_owned(),
            destination: String::from("assets"),
        };
        assert_eq!(2, copy(&mut files, &config)?);
        assert_eq!(
            vec![
                "assets/css/fonts/serif.woff",
                "assets/css/site.css",
                "index.html",
            ],
            files.paths()
        );
        assert_eq!(
            vec![0u8, 1, 2],
            files.get("assets/css/fonts/serif.woff").unwrap().contents
        );
        assert_eq!(
            b"<p>hi</p>".to_vec(),
            files.get("index.html").unwrap().contents
        );
        Ok(())
    }

    #[test]
    fn test_copy_to_root_collides() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("index.html"), "asset")?;

        let mut files = Files::new();
        files.insert("index.html", FileEntry::new("page"))?;

        let config = AssetsConfig {
            source: dir.path().to_owned(),
            destination: String::new(),
        };
        assert!(matches!(
            copy(&mut files, &config),
            Err(Error::DuplicatePath(_))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_source() {
        let config = AssetsConfig {
            source: PathBuf::from("/definitely/not/here"),
            destination: String::from("assets"),
        };
        assert!(matches!(
            copy(&mut Files::new(), &config),
            Err(Error::SourceNotFound(_))
        ));
    }
}
