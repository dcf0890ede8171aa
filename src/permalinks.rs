//! The permalink rewriter. Moves HTML entries to their public paths and
//! records the final path on each one as `path` metadata. Relative `href` and
//! `src` links between entries are re-pointed at the moved paths.

use crate::config::PermalinksConfig;
use crate::entry::Files;
use crate::value::Value;
use std::collections::BTreeMap;
use url::Url;

/// The metadata key holding an entry's final output path.
pub const PATH_KEY: &str = "path";

const HTML_EXTENSION: &str = ".html";
const INDEX_FILE: &str = "index.html";
const LINK_ATTRIBUTES: &[&str] = &["href=\"", "src=\""];

/// Applies the permalink pattern to every HTML entry. Without a pattern the
/// paths are left as they are.
pub fn rewrite(files: &mut Files, config: &PermalinksConfig) -> Result<()> {
    let mut moves = BTreeMap::new();
    for path in files.paths() {
        if !path.ends_with(HTML_EXTENSION) {
            continue;
        }
        let target = match (&config.pattern, files.get(&path)) {
            (Some(pattern), Some(entry)) => {
                permalink(pattern, &entry.metadata).unwrap_or_else(|| path.clone())
            }
            _ => path.clone(),
        };
        files.rename(&path, &target)?;
        if let Some(entry) = files.get_mut(&target) {
            entry
                .metadata
                .insert(PATH_KEY.to_owned(), Value::from(target.as_str()));
        }
        if target != path {
            moves.insert(path, target);
        }
    }
    if !moves.is_empty() {
        relink(files, &moves);
    }
    Ok(())
}

// Rewrites relative links in every HTML entry so they still reach their
// targets after `moves` (old path to new path) has been applied.
fn relink(files: &mut Files, moves: &BTreeMap<String, String>) {
    let origins: BTreeMap<&str, &str> = moves
        .iter()
        .map(|(old, new)| (new.as_str(), old.as_str()))
        .collect();
    let paths = files.paths();
    for path in &paths {
        if !path.ends_with(HTML_EXTENSION) {
            continue;
        }
        let origin = origins.get(path.as_str()).copied().unwrap_or(path.as_str());
        let entry = match files.get_mut(path) {
            Some(entry) => entry,
            None => continue,
        };
        let html = match std::str::from_utf8(&entry.contents) {
            Ok(html) => html,
            Err(_) => continue,
        };
        let relinked = relink_html(html, |link| {
            let (target, suffix) = resolve(origin, link)?;
            let moved = moves.get(&target);
            if moved.is_none() && origin == path.as_str() {
                return None;
            }
            let target = match moved {
                Some(moved) => moved.clone(),
                None if paths.binary_search(&target).is_ok() => target,
                None => return None,
            };
            Some(format!("{}{}", relative_link(path, &target), suffix))
        });
        entry.contents = relinked.into_bytes();
    }
}

// Calls `relocate` with the value of each link attribute and substitutes the
// links it returns.
fn relink_html(html: &str, mut relocate: impl FnMut(&str) -> Option<String>) -> String {
    let mut output = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = LINK_ATTRIBUTES
        .iter()
        .filter_map(|attribute| rest.find(attribute).map(|i| i + attribute.len()))
        .min()
    {
        let end = match rest[start..].find('"') {
            Some(end) => start + end,
            None => break,
        };
        let link = &rest[start..end];
        output.push_str(&rest[..start]);
        match relocate(link) {
            Some(relocated) => output.push_str(&relocated),
            None => output.push_str(link),
        }
        rest = &rest[end..];
    }
    output.push_str(rest);
    output
}

// Resolves a relative link found in the entry at `from` to the path it names,
// returning the path and any `?query` or `#fragment` suffix. Absolute URLs,
// root-relative paths, bare fragments, and links that climb above the output
// root resolve to nothing.
fn resolve(from: &str, link: &str) -> Option<(String, String)> {
    let external = link.starts_with('/') || link.starts_with('#') || Url::parse(link).is_ok();
    if link.is_empty() || external {
        return None;
    }
    let split = link.find(|c: char| c == '#' || c == '?').unwrap_or(link.len());
    let (relative, suffix) = link.split_at(split);

    let mut segments: Vec<&str> = from.split('/').collect();
    segments.pop();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            segment => segments.push(segment),
        }
    }
    Some((segments.join("/"), suffix.to_owned()))
}

// The link from the entry at `from` to the entry at `to`, relative to the
// directory `from` is served out of.
fn relative_link(from: &str, to: &str) -> String {
    let mut from_dir: Vec<&str> = from.split('/').collect();
    from_dir.pop();
    let to_segments: Vec<&str> = to.split('/').collect();
    let to_dir = &to_segments[..to_segments.len() - 1];

    let common = from_dir
        .iter()
        .zip(to_dir.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut link = "../".repeat(from_dir.len() - common);
    link.push_str(&to_segments[common..].join("/"));
    link
}

// Expands `pattern` into `{segments}/index.html`. Returns `None` when a
// referenced field is missing or slugifies to nothing.
fn permalink(pattern: &str, metadata: &crate::value::Metadata) -> Option<String> {
    let mut segments = Vec::new();
    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        let segment = match segment.strip_prefix(':') {
            Some(field) => slug::slugify(metadata.get(field)?.to_string()),
            None => segment.to_owned(),
        };
        if segment.is_empty() {
            return None;
        }
        segments.push(segment);
    }
    if segments.is_empty() {
        return None;
    }
    segments.push(INDEX_FILE.to_owned());
    Some(segments.join("/"))
}

/// Represents the result of rewriting permalinks.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error rewriting permalinks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when two entries end up with the same permalink.
    #[error(transparent)]
    DuplicatePath(#[from] crate::entry::DuplicatePath),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entry::FileEntry;

    fn post(title: &str, date: &str) -> FileEntry {
        FileEntry::new("<p>body</p>")
            .with("title", title)
            .with("date", Value::parse_date(date).unwrap())
    }

    #[test]
    fn test_default_is_identity() -> Result<()> {
        let mut files = Files::new();
        files.insert("writings/a.html", post("A", "2020-01-01")).unwrap();
        files.insert("style.css", FileEntry::new("p {}")).unwrap();

        rewrite(&mut files, &PermalinksConfig::default())?;

        assert_eq!(vec!["style.css", "writings/a.html"], files.paths());
        assert_eq!(
            Some(&Value::from("writings/a.html")),
            files.get("writings/a.html").unwrap().metadata.get(PATH_KEY)
        );
        assert_eq!(None, files.get("style.css").unwrap().metadata.get(PATH_KEY));
        Ok(())
    }

    #[test]
    fn test_pattern() -> Result<()> {
        let mut files = Files::new();
        files
            .insert("writings/a.html", post("Tightly Controlled Textareas", "2017-09-05"))
            .unwrap();
        files.insert("notes.html", FileEntry::new("<p>untitled</p>")).unwrap();

        let config = PermalinksConfig {
            pattern: Some(String::from("blog/:date/:title")),
        };
        rewrite(&mut files, &config)?;

        let wanted = "blog/2017-09-05/tightly-controlled-textareas/index.html";
        assert_eq!(vec![wanted, "notes.html"], files.paths());
        assert_eq!(
            Some(&Value::from(wanted)),
            files.get(wanted).unwrap().metadata.get(PATH_KEY)
        );
        Ok(())
    }

    #[test]
    fn test_links_follow_moved_entries() -> Result<()> {
        let mut files = Files::new();
        files
            .insert(
                "writings/hooks.html",
                FileEntry::new(concat!(
                    r#"<p><a href="reduce.html#sum">reduce</a> "#,
                    r#"<img src="../logo.png"> <a href="https://example.org/a.html">x</a></p>"#,
                ))
                .with("title", "Thinking in Hooks"),
            )
            .unwrap();
        files
            .insert(
                "writings/reduce.html",
                FileEntry::new(r#"<a href="hooks.html">hooks</a>"#)
                    .with("title", "Reducing Arrays"),
            )
            .unwrap();
        files
            .insert(
                "index.html",
                FileEntry::new(r#"<a href="writings/reduce.html">r</a>"#),
            )
            .unwrap();
        files.insert("logo.png", FileEntry::new("png")).unwrap();

        let config = PermalinksConfig {
            pattern: Some(String::from("writings/:title")),
        };
        rewrite(&mut files, &config)?;

        let contents = |path: &str| String::from_utf8(files.get(path).unwrap().contents.clone());
        assert_eq!(
            concat!(
                r#"<p><a href="../reducing-arrays/index.html#sum">reduce</a> "#,
                r#"<img src="../../logo.png"> <a href="https://example.org/a.html">x</a></p>"#,
            ),
            contents("writings/thinking-in-hooks/index.html").unwrap()
        );
        assert_eq!(
            r#"<a href="../thinking-in-hooks/index.html">hooks</a>"#,
            contents("writings/reducing-arrays/index.html").unwrap()
        );
        assert_eq!(
            r#"<a href="writings/reducing-arrays/index.html">r</a>"#,
            contents("index.html").unwrap()
        );
        Ok(())
    }

    #[test]
    fn test_relative_link() {
        assert_eq!("b.html", relative_link("a.html", "b.html"));
        assert_eq!("../c/index.html", relative_link("a/b/index.html", "a/c/index.html"));
        assert_eq!("a/index.html", relative_link("index.html", "a/index.html"));
        assert_eq!("../a", relative_link("a/index.html", "a"));
        assert_eq!(None, resolve("a.html", "../escape.html"));
        assert_eq!(None, resolve("a.html", "/root.html"));
    }

    #[test]
    fn test_collision() {
        let mut files = Files::new();
        files.insert("a.html", post("Same", "2020-01-01")).unwrap();
        files.insert("b.html", post("Same", "2020-01-02")).unwrap();

        let config = PermalinksConfig {
            pattern: Some(String::from(":title")),
        };
        assert!(matches!(
            rewrite(&mut files, &config),
            Err(Error::DuplicatePath(_))
        ));
    }
}
