//! Composite identifiers
//!
//! The host persists one opaque string per resource instance. For Sentry
//! resources it is the slash-joined path of the resource:
//! `org`, `org/project` or `org/project/id`. Slugs can never contain `/`, so
//! the format is unambiguous. The format is persisted across runs and must
//! stay byte-stable.

use super::ResourceKind;
use crate::error::{ProviderError, Result};
use serde::Serialize;

pub const DELIMITER: char = '/';

/// How many segments an identifier of a given resource kind carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdShape {
    Org,
    OrgProject,
    OrgProjectId,
}

impl IdShape {
    pub const fn parts(self) -> usize {
        match self {
            IdShape::Org => 1,
            IdShape::OrgProject => 2,
            IdShape::OrgProjectId => 3,
        }
    }

    /// Human-readable shape used in error messages
    pub const fn pattern(self) -> &'static str {
        match self {
            IdShape::Org => "org",
            IdShape::OrgProject => "org/project",
            IdShape::OrgProjectId => "org/project/id",
        }
    }

    fn from_parts(parts: usize) -> Option<Self> {
        match parts {
            1 => Some(IdShape::Org),
            2 => Some(IdShape::OrgProject),
            3 => Some(IdShape::OrgProjectId),
            _ => None,
        }
    }
}

/// Join segments into a composite identifier.
pub fn encode<S: AsRef<str>>(segments: &[S]) -> Result<String> {
    let mut id = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let segment = segment.as_ref();
        if segment.is_empty() {
            return Err(ProviderError::Encoding {
                segment: segment.to_string(),
                reason: "segment is empty",
            });
        }
        if segment.contains(DELIMITER) {
            return Err(ProviderError::Encoding {
                segment: segment.to_string(),
                reason: "segment contains the '/' delimiter",
            });
        }
        if i > 0 {
            id.push(DELIMITER);
        }
        id.push_str(segment);
    }
    Ok(id)
}

/// Split a composite identifier, requiring exactly `expected_parts` non-empty segments.
pub fn decode(id: &str, expected_parts: usize) -> Result<Vec<String>> {
    let segments: Vec<String> = id.split(DELIMITER).map(String::from).collect();

    if segments.len() != expected_parts || segments.iter().any(|s| s.is_empty()) {
        return Err(malformed(id, expected_parts, segments.len()));
    }

    Ok(segments)
}

/// Decode with the segment count of `kind`
pub fn decode_for(kind: ResourceKind, id: &str) -> Result<Vec<String>> {
    decode(id, kind.id_shape().parts())
}

/// Decode an `org/project` identifier.
pub fn decode_pair(id: &str) -> Result<(String, String)> {
    let [org, project] = <[String; 2]>::try_from(decode(id, IdShape::OrgProject.parts())?)
        .map_err(|parts| malformed(id, 2, parts.len()))?;
    Ok((org, project))
}

/// Decode an `org/project/id` identifier.
pub fn decode_triple(id: &str) -> Result<(String, String, String)> {
    let [org, project, inner] = <[String; 3]>::try_from(decode(id, IdShape::OrgProjectId.parts())?)
        .map_err(|parts| malformed(id, 3, parts.len()))?;
    Ok((org, project, inner))
}

fn malformed(id: &str, expected_parts: usize, actual_parts: usize) -> ProviderError {
    ProviderError::MalformedIdentifier {
        id: id.to_string(),
        shape: IdShape::from_parts(expected_parts)
            .map(IdShape::pattern)
            .unwrap_or("?"),
        expected_parts,
        actual_parts,
    }
}
