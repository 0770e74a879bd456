//! Path template parsing and matching.
//!
//! # Responsibilities
//! - Parse templates such as `/api/clients/{client_id}/fs/{*path}`
//! - Match a request path segment by segment, capturing variables
//! - Produce the normalized form used to detect duplicate routes
//!
//! # Design Decisions
//! - `{name}` captures exactly one non-empty segment
//! - `{*name}` captures the rest of the path and must be the last component
//! - Literals are case-sensitive and compared after percent-decoding
//! - A trailing slash is ignored on both templates and paths
//! - No regex: matching is a single linear walk over segments

use std::borrow::Cow;
use std::collections::BTreeMap;

use thiserror::Error;

/// Variable name → decoded captured value.
pub type PathVars = BTreeMap<String, String>;

/// Malformed route template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template must start with '/'")]
    MissingLeadingSlash,

    #[error("placeholder in segment '{0}' has an invalid name")]
    InvalidPlaceholder(String),

    #[error("rest-of-path placeholder '{0}' must be the last component")]
    RestNotLast(String),

    #[error("variable '{0}' appears more than once")]
    DuplicateVariable(String),

    #[error("segment '{0}' mixes literal text and braces")]
    MalformedSegment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Rest(String),
}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn decode(segment: &str) -> Cow<'_, str> {
    urlencoding::decode(segment).unwrap_or_else(|_| {
        let bytes = urlencoding::decode_binary(segment.as_bytes());
        Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
    })
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        if !raw.starts_with('/') {
            return Err(TemplateError::MissingLeadingSlash);
        }

        let parts = split_path(raw);
        let mut segments = Vec::with_capacity(parts.len());
        let mut seen: Vec<&str> = Vec::new();

        for (i, part) in parts.iter().enumerate() {
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(inner) => {
                    let (name, rest) = match inner.strip_prefix('*') {
                        Some(name) => (name, true),
                        None => (inner, false),
                    };
                    if !valid_name(name) {
                        return Err(TemplateError::InvalidPlaceholder(part.to_string()));
                    }
                    if seen.contains(&name) {
                        return Err(TemplateError::DuplicateVariable(name.to_string()));
                    }
                    seen.push(name);
                    if rest && i + 1 != parts.len() {
                        return Err(TemplateError::RestNotLast(name.to_string()));
                    }
                    if rest {
                        Segment::Rest(name.to_string())
                    } else {
                        Segment::Param(name.to_string())
                    }
                }
                None if part.contains('{') || part.contains('}') => {
                    return Err(TemplateError::MalformedSegment(part.to_string()));
                }
                None => Segment::Literal(part.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Template with variable names erased: `/a/{x}` and `/a/{y}/` both
    /// normalize to `/a/{}`.
    pub fn normalized(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => format!("/{}", text),
                Segment::Param(_) => "/{}".to_string(),
                Segment::Rest(_) => "/{*}".to_string(),
            })
            .collect()
    }

    /// Variable names in template order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) | Segment::Rest(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a raw (still percent-encoded) request path.
    pub fn matches(&self, path: &str) -> Option<PathVars> {
        let parts = split_path(path);
        let mut vars = PathVars::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => {
                    if decode(parts.get(i)?) != text.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let part = parts.get(i)?;
                    if part.is_empty() {
                        return None;
                    }
                    vars.insert(name.clone(), decode(part).into_owned());
                }
                Segment::Rest(name) => {
                    let rest = parts.get(i..).filter(|rest| !rest.is_empty())?;
                    let joined = rest.iter().map(|p| decode(p)).collect::<Vec<_>>().join("/");
                    vars.insert(name.clone(), joined);
                    return Some(vars);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_template() {
        let template = PathTemplate::parse("/api/clients").unwrap();
        assert_eq!(template.matches("/api/clients"), Some(PathVars::new()));
        assert_eq!(template.matches("/api/clients/"), Some(PathVars::new()));
        assert!(template.matches("/api/Clients").is_none());
        assert!(template.matches("/api/clients/C.1").is_none());
        assert!(template.matches("/api").is_none());
    }

    #[test]
    fn test_single_segment_capture() {
        let template = PathTemplate::parse("/api/clients/{client_id}/flows/{flow_id}").unwrap();
        let vars = template.matches("/api/clients/C.1234/flows/F%3AAB").unwrap();
        assert_eq!(vars["client_id"], "C.1234");
        assert_eq!(vars["flow_id"], "F:AB");
        assert!(template.matches("/api/clients//flows/F").is_none());
    }

    #[test]
    fn test_rest_capture_is_greedy() {
        let template = PathTemplate::parse("/api/aff4/{*aff4_path}").unwrap();
        let vars = template.matches("/api/aff4/C.1/fs/os/etc%20files").unwrap();
        assert_eq!(vars["aff4_path"], "C.1/fs/os/etc files");
        assert!(template.matches("/api/aff4").is_none());
    }

    #[test]
    fn test_root_template() {
        let template = PathTemplate::parse("/").unwrap();
        assert_eq!(template.normalized(), "/");
        assert!(template.matches("/").is_some());
        assert!(template.matches("/x").is_none());
    }

    #[test]
    fn test_normalized_erases_names() {
        let a = PathTemplate::parse("/api/hunts/{hunt_id}/log").unwrap();
        let b = PathTemplate::parse("/api/hunts/{id}/log/").unwrap();
        assert_eq!(a.normalized(), "/api/hunts/{}/log");
        assert_eq!(a.normalized(), b.normalized());
        assert_eq!(a.variables().collect::<Vec<_>>(), ["hunt_id"]);
    }

    #[test]
    fn test_invalid_templates() {
        assert_eq!(
            PathTemplate::parse("api/x").unwrap_err(),
            TemplateError::MissingLeadingSlash
        );
        assert_eq!(
            PathTemplate::parse("/api/{*path}/tail").unwrap_err(),
            TemplateError::RestNotLast("path".into())
        );
        assert_eq!(
            PathTemplate::parse("/api/{id}/{id}").unwrap_err(),
            TemplateError::DuplicateVariable("id".into())
        );
        assert!(matches!(
            PathTemplate::parse("/api/{}").unwrap_err(),
            TemplateError::InvalidPlaceholder(_)
        ));
        assert!(matches!(
            PathTemplate::parse("/api/v{version}").unwrap_err(),
            TemplateError::MalformedSegment(_)
        ));
    }
}
