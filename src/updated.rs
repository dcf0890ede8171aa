//! The timestamp annotator: records when each entry was last updated.

use crate::entry::Files;
use crate::value::Value;

/// The metadata key holding the last-updated date.
pub const UPDATED_KEY: &str = "updated";

/// Sets `updated` on every entry. A date from front matter wins; otherwise
/// the source file's modification time is used. Contents are never touched.
pub fn annotate(files: &mut Files) {
    for (_, entry) in files.iter_mut() {
        if matches!(entry.metadata.get(UPDATED_KEY), Some(Value::Date(_))) {
            continue;
        }
        if let Some(modified) = entry.modified {
            entry
                .metadata
                .insert(UPDATED_KEY.to_owned(), Value::Date(modified));
        }
    }
}
