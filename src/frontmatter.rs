//! Splits YAML front matter off the top of a source file and converts it into
//! [`Metadata`]. Fields with a fixed meaning (`date`, `updated`, `draft`) are
//! validated here so later stages can rely on their types.

use crate::value::{Metadata, Value};
use serde_yaml::Value as Yaml;

/// The fence that opens and closes a front-matter block.
const FENCE: &str = "---";

/// Keys whose values must parse as dates.
const DATE_KEYS: &[&str] = &["date", "updated"];

/// The key marking an entry as unpublished.
pub const DRAFT_KEY: &str = "draft";

/// Splits `input` into its YAML block and body. Returns `None` if `input`
/// doesn't open with a fence line.
fn split(input: &str) -> Result<Option<(&str, &str)>> {
    let rest = match input.strip_prefix(FENCE) {
        Some(rest) => rest,
        None => return Ok(None),
    };
    let rest = match rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) {
        Some(rest) => rest,
        None => return Ok(None),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(&['\r', '\n'][..]) == FENCE {
            return Ok(Some((&rest[..offset], &rest[offset + line.len()..])));
        }
        offset += line.len();
    }
    Err(Error::MissingEndFence)
}

/// Parses the front matter at the top of `input`, returning the metadata and
/// the remaining body. Input without front matter yields empty metadata and
/// the whole input as the body.
pub fn parse(input: &str) -> Result<(Metadata, &str)> {
    let (yaml, body) = match split(input)? {
        Some(parts) => parts,
        None => return Ok((Metadata::new(), input)),
    };
    if yaml.trim().is_empty() {
        return Ok((Metadata::new(), body));
    }

    let mapping = match serde_yaml::from_str::<Yaml>(yaml)? {
        Yaml::Mapping(mapping) => mapping,
        Yaml::Null => return Ok((Metadata::new(), body)),
        _ => return Err(Error::NotAMapping),
    };

    let mut metadata = Metadata::new();
    for (key, value) in mapping.iter() {
        let key = match key {
            Yaml::String(key) => key.clone(),
            other => return Err(Error::InvalidKey(format!("{:?}", other))),
        };
        if let Some(value) = convert(&key, value)? {
            metadata.insert(key, value);
        }
    }
    Ok((metadata, body))
}

// Converts one YAML value into the closed set of metadata kinds. Nulls are
// dropped.
fn convert(key: &str, value: &Yaml) -> Result<Option<Value>> {
    if DATE_KEYS.contains(&key) {
        return match value {
            Yaml::Null => Ok(None),
            Yaml::String(s) => match Value::parse_date(s) {
                Some(date) => Ok(Some(Value::Date(date))),
                None => Err(Error::InvalidDate {
                    key: key.to_owned(),
                    value: s.clone(),
                }),
            },
            other => Err(Error::InvalidDate {
                key: key.to_owned(),
                value: format!("{:?}", other),
            }),
        };
    }
    if key == DRAFT_KEY {
        return match value {
            Yaml::Null => Ok(None),
            Yaml::Bool(b) => Ok(Some(Value::Bool(*b))),
            _ => Err(Error::InvalidDraft),
        };
    }

    Ok(match value {
        Yaml::Null => None,
        Yaml::Bool(b) => Some(Value::Bool(*b)),
        Yaml::Number(n) => match n.as_f64() {
            Some(n) => Some(Value::Number(n)),
            None => return Err(Error::UnsupportedValue(key.to_owned())),
        },
        Yaml::String(s) => Some(Value::String(s.clone())),
        Yaml::Sequence(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                if let Some(v) = convert(key, item)? {
                    values.push(v);
                }
            }
            Some(Value::List(values))
        }
        Yaml::Mapping(_) => return Err(Error::UnsupportedValue(key.to_owned())),
    })
}

/// Represents the result of a front-matter parse.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing front matter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the opening fence was found but the closing one wasn't.
    #[error("missing closing `---`")]
    MissingEndFence,

    /// Returned when the front matter isn't valid YAML.
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),

    /// Returned when the front matter is valid YAML but not a mapping.
    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,

    /// Returned for mapping keys that aren't strings.
    #[error("front matter keys must be strings; found {0}")]
    InvalidKey(String),

    /// Returned when a date field can't be parsed as a date.
    #[error("`{key}` must be a date; found `{value}`")]
    InvalidDate { key: String, value: String },

    /// Returned when `draft` isn't a boolean.
    #[error("`draft` must be `true` or `false`")]
    InvalidDraft,

    /// Returned for values outside the supported kinds (nested mappings,
    /// numbers too large to represent).
    #[error("unsupported value for `{0}`")]
    UnsupportedValue(String),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() -> Result<()> {
        let (metadata, body) = parse(
            "---\ntitle: Hello, world!\ndate: 2021-04-16\ntags: [greet, misc]\n---\n# Hello\n",
        )?;
        assert_eq!(Some(&Value::from("Hello, world!")), metadata.get("title"));
        assert_eq!(
            Some(&Value::Date(Value::parse_date("2021-04-16").unwrap())),
            metadata.get("date")
        );
        assert_eq!(
            Some(&Value::List(vec![Value::from("greet"), Value::from("misc")])),
            metadata.get("tags")
        );
        assert_eq!("# Hello\n", body);
        Ok(())
    }

    #[test]
    fn test_no_frontmatter() -> Result<()> {
        let (metadata, body) = parse("# Just a heading\n")?;
        assert!(metadata.is_empty());
        assert_eq!("# Just a heading\n", body);
        Ok(())
    }

    #[test]
    fn test_leading_rule_is_not_frontmatter() -> Result<()> {
        let (metadata, body) = parse("----\ntext\n")?;
        assert!(metadata.is_empty());
        assert_eq!("----\ntext\n", body);
        Ok(())
    }

    #[test]
    fn test_empty_frontmatter() -> Result<()> {
        let (metadata, body) = parse("---\n---\nbody")?;
        assert!(metadata.is_empty());
        assert_eq!("body", body);
        Ok(())
    }

    #[test]
    fn test_crlf_fences() -> Result<()> {
        let (metadata, body) = parse("---\r\ndraft: true\r\n---\r\nbody")?;
        assert_eq!(Some(&Value::Bool(true)), metadata.get(DRAFT_KEY));
        assert_eq!("body", body);
        Ok(())
    }

    #[test]
    fn test_missing_end_fence() {
        assert!(matches!(
            parse("---\ntitle: x\n"),
            Err(Error::MissingEndFence)
        ));
    }

    #[test]
    fn test_invalid_draft() {
        assert!(matches!(
            parse("---\ndraft: maybe\n---\n"),
            Err(Error::InvalidDraft)
        ));
    }

    #[test]
    fn test_invalid_date() {
        assert!(matches!(
            parse("---\ndate: last tuesday\n---\n"),
            Err(Error::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_nested_mapping_rejected() {
        assert!(matches!(
            parse("---\nauthor:\n  name: x\n---\n"),
            Err(Error::UnsupportedValue(key)) if key == "author"
        ));
    }
}
