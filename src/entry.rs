//! Defines [`FileEntry`] and [`Files`], the in-memory file mapping that every
//! build stage reads and rewrites, along with the [`Collection`] views that
//! are layered on top of it.

use crate::value::{Metadata, Value};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// The metadata key listing the collections an entry belongs to.
pub const COLLECTION_KEY: &str = "collection";

/// One source or in-progress output file. Its path is the key under which it
/// is stored in [`Files`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileEntry {
    /// The raw payload. Text for Markdown and HTML, anything for assets.
    pub contents: Vec<u8>,

    /// Front-matter fields plus stage-derived fields.
    pub metadata: Metadata,

    /// The last-modified time of the source file, if it came from disk.
    pub modified: Option<NaiveDateTime>,

    /// Collection name to the entry's index within that collection.
    pub memberships: BTreeMap<String, usize>,
}

impl FileEntry {
    pub fn new(contents: impl Into<Vec<u8>>) -> FileEntry {
        FileEntry {
            contents: contents.into(),
            ..FileEntry::default()
        }
    }

    /// Builder-style helper for attaching a metadata field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> FileEntry {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }
}

/// A named, ordered view over a subset of the entries in [`Files`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    /// Member paths in collection order.
    pub members: Vec<String>,

    /// Whether members are linked to their previous and next siblings.
    pub refer: bool,
}

/// Returned when an insert or rename would make two entries share a path.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("duplicate output path `{0}`")]
pub struct DuplicatePath(pub String);

/// The in-memory file mapping, keyed by relative slash-separated path. Paths
/// are iterated in sorted order so builds are deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Files {
    entries: BTreeMap<String, FileEntry>,
    collections: BTreeMap<String, Collection>,
}

impl Files {
    pub fn new() -> Files {
        Files::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut FileEntry> {
        self.entries.get_mut(path)
    }

    /// Returns the entry paths in sorted order.
    pub fn paths(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileEntry)> {
        self.entries.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut FileEntry)> {
        self.entries
            .iter_mut()
            .map(|(path, entry)| (path.as_str(), entry))
    }

    /// Adds a new entry. Fails rather than replacing an existing one.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        entry: FileEntry,
    ) -> Result<(), DuplicatePath> {
        use std::collections::btree_map::Entry;
        match self.entries.entry(path.into()) {
            Entry::Occupied(occupied) => Err(DuplicatePath(occupied.key().clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(())
            }
        }
    }

    /// Removes an entry, dropping it from any collection it belongs to and
    /// re-indexing the remaining members.
    pub fn remove(&mut self, path: &str) -> Option<FileEntry> {
        let entry = self.entries.remove(path)?;
        for name in entry.memberships.keys() {
            if let Some(collection) = self.collections.get_mut(name) {
                collection.members.retain(|member| member != path);
                for (i, member) in collection.members.iter().enumerate() {
                    if let Some(e) = self.entries.get_mut(member) {
                        e.memberships.insert(name.clone(), i);
                    }
                }
            }
        }
        Some(entry)
    }

    /// Moves an entry to a new path, keeping collection member lists in step.
    /// Renaming an entry to its own path is a no-op.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), DuplicatePath> {
        if from == to || !self.entries.contains_key(from) {
            return Ok(());
        }
        if self.entries.contains_key(to) {
            return Err(DuplicatePath(to.to_owned()));
        }
        if let Some(entry) = self.entries.remove(from) {
            for (name, &i) in &entry.memberships {
                if let Some(member) = self
                    .collections
                    .get_mut(name)
                    .and_then(|collection| collection.members.get_mut(i))
                {
                    *member = to.to_owned();
                }
            }
            self.entries.insert(to.to_owned(), entry);
        }
        Ok(())
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    pub fn collections(&self) -> impl Iterator<Item = (&str, &Collection)> {
        self.collections
            .iter()
            .map(|(name, collection)| (name.as_str(), collection))
    }

    /// Records a collection, annotating each member with its index and
    /// appending the collection name to its `collection` metadata list.
    /// Members that aren't in the mapping are dropped.
    pub fn set_collection(&mut self, name: &str, mut collection: Collection) {
        collection
            .members
            .retain(|member| self.entries.contains_key(member));
        for (i, member) in collection.members.iter().enumerate() {
            if let Some(entry) = self.entries.get_mut(member) {
                entry.memberships.insert(name.to_owned(), i);
                let names = entry
                    .metadata
                    .entry(COLLECTION_KEY.to_owned())
                    .or_insert_with(|| Value::List(Vec::new()));
                if let Value::List(names) = names {
                    names.push(Value::from(name));
                }
            }
        }
        self.collections.insert(name.to_owned(), collection);
    }
}
