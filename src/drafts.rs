//! The draft filter: drops every entry whose front matter says `draft: true`.

use crate::entry::Files;
use crate::frontmatter::DRAFT_KEY;

/// Removes unpublished entries and returns how many were removed. Entries
/// are never added or renamed.
pub fn filter(files: &mut Files) -> usize {
    let drafts: Vec<String> = files
        .iter()
        .filter(|(_, entry)| {
            entry
                .metadata
                .get(DRAFT_KEY)
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
        })
        .map(|(path, _)| path.to_owned())
        .collect();

    for path in &drafts {
        tracing::debug!(path = %path, "skipping draft");
        files.remove(path);
    }
    drafts.len()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entry::FileEntry;

    #[test]
    fn test_filter() {
        let mut files = Files::new();
        files
            .insert("writings/a.md", FileEntry::new("a").with(DRAFT_KEY, false))
            .unwrap();
        files
            .insert("writings/b.md", FileEntry::new("b").with(DRAFT_KEY, true))
            .unwrap();
        files.insert("writings/c.md", FileEntry::new("c")).unwrap();

        assert_eq!(1, filter(&mut files));
        assert_eq!(vec!["writings/a.md", "writings/c.md"], files.paths());
    }
}
