//! The Markdown renderer. Converts Markdown entries into HTML entries and
//! renames them from `*.md` to `*.html`.

use crate::config::MarkdownConfig;
use crate::entry::Files;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use url::{ParseError as UrlParseError, Url};

const MARKDOWN_EXTENSIONS: &[&str] = &[".md", ".markdown"];
const MARKDOWN_EXTENSION: &str = ".md";
const HTML_EXTENSION: &str = ".html";

/// Returns the path with its Markdown extension stripped, if it has one.
pub(crate) fn markdown_stem(path: &str) -> Option<&str> {
    MARKDOWN_EXTENSIONS
        .iter()
        .find_map(|extension| path.strip_suffix(extension))
}

/// Renders every Markdown entry and returns how many were rendered.
pub fn render(files: &mut Files, config: &MarkdownConfig) -> Result<usize> {
    let options = options(config);
    let mut rendered = 0;
    for path in files.paths() {
        let stem = match markdown_stem(&path) {
            Some(stem) => stem,
            None => continue,
        };
        let target = format!("{}{}", stem, HTML_EXTENSION);
        if let Some(entry) = files.get_mut(&path) {
            let markdown = std::str::from_utf8(&entry.contents)
                .map_err(|_| Error::NotUtf8(path.clone()))?;
            entry.contents = to_html(markdown, options).into_bytes();
        }
        files.rename(&path, &target)?;
        rendered += 1;
    }
    Ok(rendered)
}

fn options(config: &MarkdownConfig) -> Options {
    let mut options = Options::empty();
    if config.tables {
        options.insert(Options::ENABLE_TABLES);
    }
    if config.gfm {
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
    }
    if config.smartypants {
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
    }
    options
}

/// Converts markdown to HTML. Relative links to other Markdown files are
/// pointed at their rendered HTML.
pub fn to_html(markdown: &str, options: Options) -> String {
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(
        &mut output,
        Parser::new_ext(markdown, options).map(convert_event),
    );
    output
}

fn convert_event(ev: Event) -> Event {
    match ev {
        Event::Start(Tag::Link(link_type, url, title)) => {
            let url = match convert_link(&url) {
                Some(converted) => CowStr::Boxed(converted.into_boxed_str()),
                None => url,
            };
            Event::Start(Tag::Link(link_type, url, title))
        }
        _ => ev,
    }
}

// Returns the rewritten link for relative links to `.md` files. Absolute URLs
// and everything else are left alone.
fn convert_link(url: &str) -> Option<String> {
    match Url::parse(url) {
        Err(UrlParseError::RelativeUrlWithoutBase) => {}
        _ => return None,
    }
    let split = url.find(|c: char| c == '#' || c == '?').unwrap_or(url.len());
    let (path, suffix) = url.split_at(split);
    path.strip_suffix(MARKDOWN_EXTENSION)
        .map(|stem| format!("{}{}{}", stem, HTML_EXTENSION, suffix))
}

/// Represents the result of rendering Markdown.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error rendering Markdown.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a Markdown entry isn't valid UTF-8.
    #[error("`{0}` is not valid UTF-8")]
    NotUtf8(String),

    /// Returned when the rendered path is already taken.
    #[error(transparent)]
    DuplicatePath(#[from] crate::entry::DuplicatePath),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entry::FileEntry;
    use crate::value::Value;

    const TABLE: &str = "| Name | Value |\n|------|-------|\n| a    | 1     |\n";

    fn render_one(markdown: &str, config: &MarkdownConfig) -> Result<String> {
        let mut files = Files::new();
        files.insert("post.md", FileEntry::new(markdown)).unwrap();
        render(&mut files, config)?;
        Ok(String::from_utf8(files.get("post.html").unwrap().contents.clone()).unwrap())
    }

    #[test]
    fn test_tables() -> Result<()> {
        let html = render_one(TABLE, &MarkdownConfig::default())?;
        assert!(html.contains("<table>"), "{}", html);
        assert!(!html.contains("|------|"), "{}", html);
        Ok(())
    }

    #[test]
    fn test_tables_disabled() -> Result<()> {
        let config = MarkdownConfig {
            tables: false,
            ..MarkdownConfig::default()
        };
        let html = render_one(TABLE, &config)?;
        assert!(!html.contains("<table>"), "{}", html);
        Ok(())
    }

    #[test]
    fn test_gfm_strikethrough() -> Result<()> {
        let html = render_one("~~gone~~", &MarkdownConfig::default())?;
        assert_eq!("<p><del>gone</del></p>\n", html);

        let config = MarkdownConfig {
            gfm: false,
            ..MarkdownConfig::default()
        };
        assert_eq!("<p>~~gone~~</p>\n", render_one("~~gone~~", &config)?);
        Ok(())
    }

    #[test]
    fn test_render_keeps_metadata_and_collection() -> Result<()> {
        let mut files = Files::new();
        files
            .insert("writings/a.md", FileEntry::new("# A").with("title", "A"))
            .unwrap();
        files.insert("style.css", FileEntry::new("p {}")).unwrap();
        files.set_collection(
            "writings",
            crate::entry::Collection {
                members: vec![String::from("writings/a.md")],
                refer: true,
            },
        );

        assert_eq!(1, render(&mut files, &MarkdownConfig::default())?);
        assert_eq!(vec!["style.css", "writings/a.html"], files.paths());

        let a = files.get("writings/a.html").unwrap();
        assert_eq!(b"<h1>A</h1>\n".to_vec(), a.contents);
        assert_eq!(Some(&Value::from("A")), a.metadata.get("title"));
        assert_eq!(
            vec!["writings/a.html"],
            files.collection("writings").unwrap().members
        );
        assert_eq!(b"p {}".to_vec(), files.get("style.css").unwrap().contents);
        Ok(())
    }

    #[test]
    fn test_duplicate_output_path() {
        let mut files = Files::new();
        files.insert("a.md", FileEntry::new("a")).unwrap();
        files.insert("a.html", FileEntry::new("<p>a</p>")).unwrap();
        assert!(matches!(
            render(&mut files, &MarkdownConfig::default()),
            Err(Error::DuplicatePath(_))
        ));
    }

    #[test]
    fn test_not_utf8() {
        let mut files = Files::new();
        files.insert("a.md", FileEntry::new(vec![0xffu8, 0xfe])).unwrap();
        assert!(matches!(
            render(&mut files, &MarkdownConfig::default()),
            Err(Error::NotUtf8(path)) if path == "a.md"
        ));
    }

    #[test]
    fn test_convert_link() {
        assert_eq!(Some(String::from("other.html")), convert_link("other.md"));
        assert_eq!(
            Some(String::from("../pages/about.html#team")),
            convert_link("../pages/about.md#team")
        );
        assert_eq!(None, convert_link("https://example.org/readme.md"));
        assert_eq!(None, convert_link("image.png"));
    }

    #[test]
    fn test_links_rewritten_in_output() {
        let html = to_html("[next](next.md)", Options::empty());
        assert_eq!("<p><a href=\"next.html\">next</a></p>\n", html);
    }
}
