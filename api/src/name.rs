//! Structured resource names.
//!
//! A resource name is a `/`-separated path of literal and slug segments, e.g.
//! `project/foo` or `project/foo/site/bar`. Each resource kind declares a
//! [`NamePattern`] (`project/:slug`) that names are parsed against and built
//! from.

use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Values captured from a name, keyed by pattern parameter.
pub type NameParams = BTreeMap<String, String>;

/// Errors raised while parsing or building resource names.
///
/// These indicate a misconfigured pattern or a caller passing a name of the
/// wrong kind, and are returned to the caller rather than swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name does not have the shape the pattern declares
    #[error("malformed resource name `{name}` for pattern `{pattern}`")]
    MalformedName {
        /// Offending name (or parameter value)
        name: String,
        /// Pattern it was checked against
        pattern: String,
    },

    /// A pattern parameter has no value
    #[error("missing parameter `{param}` for pattern `{pattern}`")]
    MissingParam {
        /// Name of the missing parameter
        param: String,
        /// Pattern being built
        pattern: String,
    },

    /// The pattern itself is invalid
    #[error("invalid name pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// A resource name, the primary key of a resource collection.
///
/// The empty name is the "unset" marker carried by instances that have not
/// been persisted yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    /// Wrap a name without validating it against any pattern.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The unset name of a not-yet-persisted instance.
    #[must_use]
    pub const fn unset() -> Self {
        Self(String::new())
    }

    /// Whether this is the unset name.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.0.is_empty()
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ResourceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ResourceName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One segment of a [`NamePattern`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Must appear verbatim
    Literal(Cow<'static, str>),
    /// Captures a slug under this parameter name
    Param(Cow<'static, str>),
}

/// A declared name shape such as `project/:project/site/:slug`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamePattern {
    segments: Cow<'static, [Segment]>,
}

/// Whether `value` is a non-empty URL-safe token (`[A-Za-z0-9-._~]+`).
#[must_use]
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

impl NamePattern {
    /// Build a pattern from static segments.
    ///
    /// The segments are trusted: they must form a valid pattern.
    #[must_use]
    pub const fn from_static(segments: &'static [Segment]) -> Self {
        Self {
            segments: Cow::Borrowed(segments),
        }
    }

    /// Parse a pattern such as `project/:slug`.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::InvalidPattern`] for an empty pattern, an empty
    /// segment, an unnamed or duplicate parameter, or a literal that is not
    /// URL-safe.
    pub fn parse(pattern: &str) -> Result<Self, NameError> {
        let invalid = |reason| NameError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let mut segments = Vec::new();
        for raw in pattern.split('/') {
            if let Some(param) = raw.strip_prefix(':') {
                if !is_valid_slug(param) {
                    return Err(invalid("parameter name must be a non-empty slug"));
                }
                if segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param(p) if p == param))
                {
                    return Err(invalid("duplicate parameter"));
                }
                segments.push(Segment::Param(Cow::Owned(param.to_string())));
            } else if is_valid_slug(raw) {
                segments.push(Segment::Literal(Cow::Owned(raw.to_string())));
            } else {
                return Err(invalid("literal segments must be non-empty slugs"));
            }
        }

        Ok(Self {
            segments: Cow::Owned(segments),
        })
    }

    /// The pattern's segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in declaration order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(p) => Some(p.as_ref()),
            Segment::Literal(_) => None,
        })
    }

    /// Extract the named segments of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::MalformedName`] on a wrong segment count, a
    /// literal mismatch, or an empty / non-URL-safe slug.
    pub fn parse_name(&self, name: &str) -> Result<NameParams, NameError> {
        let parts: Vec<&str> = name.split('/').collect();
        self.capture(&parts).ok_or_else(|| self.malformed(name))
    }

    /// Build a name from parameter values. Extra parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::MissingParam`] if a pattern parameter has no
    /// value, or [`NameError::MalformedName`] if a value is not a valid slug.
    pub fn build_name(&self, params: &NameParams) -> Result<ResourceName, NameError> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in self.segments.iter() {
            match segment {
                Segment::Literal(literal) => parts.push(literal.as_ref()),
                Segment::Param(param) => {
                    let value = params
                        .get(param.as_ref())
                        .ok_or_else(|| NameError::MissingParam {
                            param: param.to_string(),
                            pattern: self.to_string(),
                        })?;
                    if !is_valid_slug(value) {
                        return Err(self.malformed(value));
                    }
                    parts.push(value.as_str());
                },
            }
        }
        Ok(ResourceName(parts.join("/")))
    }

    /// Resolve the leading segments of a URL path to a resource name.
    ///
    /// `/project/foo/site/bar/edit?tab=1` matched against `project/:slug`
    /// yields `project/foo`. Returns `None` if the path is too short or its
    /// leading segments do not fit the pattern.
    #[must_use]
    pub fn match_prefix(&self, path: &str) -> Option<ResourceName> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.strip_prefix('/').unwrap_or(path);
        let parts: Vec<&str> = path.split('/').take(self.segments.len()).collect();
        if parts.len() < self.segments.len() {
            return None;
        }
        self.capture(&parts)?;
        Some(ResourceName(parts.join("/")))
    }

    fn capture(&self, parts: &[&str]) -> Option<NameParams> {
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = NameParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {},
                Segment::Literal(_) => return None,
                Segment::Param(_) if !is_valid_slug(part) => return None,
                Segment::Param(param) => {
                    params.insert(param.to_string(), (*part).to_string());
                },
            }
        }
        Some(params)
    }

    fn malformed(&self, name: &str) -> NameError {
        NameError::MalformedName {
            name: name.to_string(),
            pattern: self.to_string(),
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match segment {
                Segment::Literal(literal) => f.write_str(literal)?,
                Segment::Param(param) => write!(f, ":{param}")?,
            }
        }
        Ok(())
    }
}

/// Extract the named segments of `name` according to `pattern`.
///
/// # Errors
///
/// See [`NamePattern::parse_name`].
pub fn parse_name(pattern: &NamePattern, name: &str) -> Result<NameParams, NameError> {
    pattern.parse_name(name)
}

/// Build a name from `params` according to `pattern`.
///
/// # Errors
///
/// See [`NamePattern::build_name`].
pub fn build_name(pattern: &NamePattern, params: &NameParams) -> Result<ResourceName, NameError> {
    pattern.build_name(params)
}
