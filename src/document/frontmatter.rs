use crate::ParseError;
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Metadata fields of a pad, keyed by field name
pub type Metadata = BTreeMap<String, Value>;

/// A YAML front matter block split off the start of a pad
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub fields: Metadata,
    /// Byte offset in the input where the markdown body starts
    pub body_offset: usize,
}

/// Splits a leading YAML front matter block off `input`.
///
/// The first line must be `---` (a BOM is tolerated) and the block ends at the
/// next `---` or `...` line. Returns `Ok(None)` when there is no complete
/// block, which leaves the whole input as markdown body.
///
/// # Errors
///
/// `ParseError::FrontMatter` when the block is not valid YAML or not a
/// mapping.
pub fn split_front_matter(input: &str) -> Result<Option<FrontMatter>, ParseError> {
    let mut lines = input.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if first.trim_start_matches('\u{feff}').trim_end() != "---" {
        return Ok(None);
    }

    let mut offset = first.len();
    let yaml_start = offset;
    let mut yaml_end = None;

    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            yaml_end = Some(offset);
            offset += line.len();
            break;
        }
        offset += line.len();
    }

    let Some(yaml_end) = yaml_end else {
        return Ok(None);
    };

    let fields = parse_yaml_mapping(&input[yaml_start..yaml_end])?;
    Ok(Some(FrontMatter {
        fields,
        body_offset: offset,
    }))
}

fn parse_yaml_mapping(yaml: &str) -> Result<Metadata, ParseError> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::new());
    }

    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| ParseError::FrontMatter(e.to_string()))?;

    match value {
        Value::Mapping(mapping) => Ok(mapping
            .into_iter()
            .filter_map(|(key, value)| scalar_to_string(&key).map(|key| (key, value)))
            .collect()),
        Value::Null => Ok(Metadata::new()),
        _ => Err(ParseError::FrontMatter(
            "front matter is not a mapping".to_string(),
        )),
    }
}

/// Renders a scalar YAML value as text; `None` for null, sequences and mappings
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
