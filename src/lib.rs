//! The library code for the `quire` static site generator. A build is a fixed
//! sequence of steps over an in-memory file mapping ([`entry::Files`]):
//!
//! 1. Loading every file under the source directory, parsing front matter
//!    off the top of each text file ([`source`], [`frontmatter`])
//! 2. Running the stages in order ([`build::Stage`]):
//!    1. dropping drafts ([`drafts`])
//!    2. grouping entries into sorted collections ([`collections`])
//!    3. rendering Markdown to HTML ([`markdown`])
//!    4. recording last-updated times ([`updated`])
//!    5. copying static assets ([`assets`])
//!    6. moving entries to their permalinks ([`permalinks`])
//!    7. wrapping HTML in layout templates ([`layouts`])
//! 3. Writing the mapping to the destination directory ([`write`])
//!
//! Every step is fallible and fatal. The destination is only replaced once
//! the whole site has been built and written out, so a broken build leaves
//! the previous output in place.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod assets;
pub mod build;
pub mod collections;
pub mod config;
pub mod drafts;
pub mod entry;
pub mod frontmatter;
pub mod layouts;
pub mod markdown;
pub mod permalinks;
pub mod source;
pub mod updated;
pub mod value;
pub mod write;
