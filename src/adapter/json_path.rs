//! Dotted-path lookup into a parsed JSON document, e.g. `data.links[0].url`

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path '{path}' not found")]
    PathNotFound { path: String },

    #[error("path '{path}' expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid path syntax '{0}'")]
    InvalidPath(String),
}

enum Step<'p> {
    Key(&'p str),
    Index(usize),
}

/// Walk `path` through `root`
pub fn lookup<'v>(root: &'v Value, path: &str) -> Result<&'v Value, PathError> {
    if path.trim().is_empty() {
        return Err(PathError::InvalidPath(path.to_string()));
    }

    let mut current = root;
    let mut walked = String::new();

    for segment in path.split('.') {
        for step in parse_segment(segment).ok_or_else(|| PathError::InvalidPath(path.to_string()))? {
            match step {
                Step::Key(key) => {
                    if !walked.is_empty() {
                        walked.push('.');
                    }
                    walked.push_str(key);

                    let object = current.as_object().ok_or_else(|| PathError::TypeMismatch {
                        path: walked.clone(),
                        expected: "object",
                        found: kind(current),
                    })?;
                    current = object.get(key).ok_or_else(|| PathError::PathNotFound {
                        path: walked.clone(),
                    })?;
                }
                Step::Index(index) => {
                    walked.push_str(&format!("[{index}]"));

                    let array = current.as_array().ok_or_else(|| PathError::TypeMismatch {
                        path: walked.clone(),
                        expected: "array",
                        found: kind(current),
                    })?;
                    current = array.get(index).ok_or_else(|| PathError::PathNotFound {
                        path: walked.clone(),
                    })?;
                }
            }
        }
    }

    Ok(current)
}

/// `name`, `name[1]`, `name[1][2]` or `[0]`
fn parse_segment(segment: &str) -> Option<Vec<Step<'_>>> {
    let (name, mut rest) = match segment.find('[') {
        Some(pos) => (&segment[..pos], &segment[pos..]),
        None => (segment, ""),
    };

    let mut steps = Vec::new();
    if !name.is_empty() {
        steps.push(Step::Key(name));
    }

    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        steps.push(Step::Index(inner[..close].trim().parse().ok()?));
        rest = &inner[close + 1..];
    }

    if steps.is_empty() { None } else { Some(steps) }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
