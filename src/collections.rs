//! The collection grouper. Each configured collection selects entries by
//! glob, orders them by a metadata field, and records the result on
//! [`Files`] so later stages can find an entry's siblings.

use crate::config::CollectionConfig;
use crate::entry::{Collection, Files};
use globset::{GlobBuilder, GlobMatcher};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Groups entries into every configured collection.
pub fn group(
    files: &mut Files,
    collections: &BTreeMap<String, CollectionConfig>,
) -> Result<()> {
    for (name, config) in collections {
        let collection = Collection {
            members: select(files, &matcher(&config.pattern)?, config),
            refer: config.refer,
        };
        tracing::debug!(
            collection = %name,
            members = collection.members.len(),
            "grouped collection"
        );
        files.set_collection(name, collection);
    }
    Ok(())
}

fn matcher(pattern: &str) -> Result<GlobMatcher> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|err| Error::Pattern {
            pattern: pattern.to_owned(),
            err,
        })?
        .compile_matcher())
}

// Entries with the sort field come first, in field order (reversed if asked).
// Entries without it follow in path order.
fn select(files: &Files, matcher: &GlobMatcher, config: &CollectionConfig) -> Vec<String> {
    let mut members: Vec<(&str, _)> = files
        .iter()
        .filter(|(path, _)| matcher.is_match(path))
        .map(|(path, entry)| (path, entry.metadata.get(&config.sort_by)))
        .collect();

    members.sort_by(|(a_path, a), (b_path, b)| {
        let ordering = match (a, b) {
            (Some(a), Some(b)) => {
                let ordering = a.compare(b);
                if config.reverse {
                    ordering.reverse()
                } else {
                    ordering
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        ordering.then_with(|| a_path.cmp(b_path))
    });

    members
        .into_iter()
        .map(|(path, _)| path.to_owned())
        .collect()
}

/// Represents the result of grouping collections.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error grouping collections.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a collection's pattern isn't a valid glob.
    #[error("invalid collection pattern `{pattern}`: {err}")]
    Pattern {
        pattern: String,
        #[source]
        err: globset::Error,
    },
}
