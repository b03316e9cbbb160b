//! Path pattern parsing and matching.
//!
//! # Responsibilities
//! - Parse route templates (`/archive/:year`) into literal and parameter segments
//! - Reject malformed templates at registration time
//! - Match a split request path against a single pattern and bind parameters
//!
//! # Design Decisions
//! - Method must be equal, segment count must be equal
//! - Literal segments compare exactly (case-sensitive)
//! - Parameter segments accept any non-empty value
//! - No regex, no wildcards spanning several segments

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Error raised while building a route table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("route template must start with '/': {0:?}")]
    MissingLeadingSlash(String),

    #[error("route template has an empty segment: {0:?}")]
    EmptySegment(String),

    #[error("route template has a parameter without a name: {0:?}")]
    UnnamedParam(String),

    #[error("route template binds parameter {name:?} twice: {template:?}")]
    DuplicateParam { template: String, name: String },

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

/// HTTP verbs a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(RouteError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl TryFrom<&axum::http::Method> for Method {
    type Error = RouteError;

    fn try_from(method: &axum::http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

/// One `/`-delimited piece of a route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment exactly.
    Literal(String),
    /// Binds the path segment to this name.
    Param(String),
}

/// A registered route: method plus template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    method: Method,
    template: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a template such as `/:year/:title/:id`.
    ///
    /// `/` is the root pattern and has no segments.
    pub fn parse(method: Method, template: &str) -> Result<Self, RouteError> {
        let rest = template
            .strip_prefix('/')
            .ok_or_else(|| RouteError::MissingLeadingSlash(template.to_string()))?;

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for piece in rest.split('/') {
                if piece.is_empty() {
                    return Err(RouteError::EmptySegment(template.to_string()));
                }
                match piece.strip_prefix(':') {
                    Some("") => return Err(RouteError::UnnamedParam(template.to_string())),
                    Some(name) => {
                        let taken = segments
                            .iter()
                            .any(|s| matches!(s, Segment::Param(n) if n == name));
                        if taken {
                            return Err(RouteError::DuplicateParam {
                                template: template.to_string(),
                                name: name.to_string(),
                            });
                        }
                        segments.push(Segment::Param(name.to_string()));
                    }
                    None => segments.push(Segment::Literal(piece.to_string())),
                }
            }
        }

        Ok(Self {
            method,
            template: template.to_string(),
            segments,
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The template text as registered.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the parameter segments, in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match already split and decoded path segments.
    ///
    /// Returns the parameter bindings when the pattern applies.
    pub fn matches(&self, method: Method, path: &[String]) -> Option<HashMap<String, String>> {
        if self.method != method || self.segments.len() != path.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, value) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), value.clone());
                }
            }
        }
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.template)
    }
}

/// Split a request path into non-empty, percent-decoded segments.
///
/// A segment that does not decode to UTF-8 is kept as received.
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match urlencoding::decode(s) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => s.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments() {
        let pattern = PathPattern::parse(Method::Get, "/:year/:title/:id/edit").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Param("year".into()),
                Segment::Param("title".into()),
                Segment::Param("id".into()),
                Segment::Literal("edit".into()),
            ]
        );
        assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["year", "title", "id"]);

        let root = PathPattern::parse(Method::Get, "/").unwrap();
        assert!(root.segments().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            PathPattern::parse(Method::Get, "archive"),
            Err(RouteError::MissingLeadingSlash("archive".into()))
        );
        assert_eq!(
            PathPattern::parse(Method::Get, ""),
            Err(RouteError::MissingLeadingSlash("".into()))
        );
        assert!(matches!(
            PathPattern::parse(Method::Get, "/archive//x"),
            Err(RouteError::EmptySegment(_))
        ));
        assert!(matches!(
            PathPattern::parse(Method::Get, "/archive/"),
            Err(RouteError::EmptySegment(_))
        ));
        assert!(matches!(
            PathPattern::parse(Method::Get, "/archive/:"),
            Err(RouteError::UnnamedParam(_))
        ));
        assert!(matches!(
            PathPattern::parse(Method::Get, "/:id/x/:id"),
            Err(RouteError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn test_matches_binds_params() {
        let pattern = PathPattern::parse(Method::Get, "/:year/:title/:id").unwrap();
        let params = pattern.matches(Method::Get, &split_path("/2020/my-post/42")).unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params["year"], "2020");
        assert_eq!(params["title"], "my-post");
        assert_eq!(params["id"], "42");
    }

    #[test]
    fn test_matches_requires_method_and_shape() {
        let pattern = PathPattern::parse(Method::Get, "/archive/:year").unwrap();
        assert!(pattern.matches(Method::Post, &split_path("/archive/2020")).is_none());
        assert!(pattern.matches(Method::Get, &split_path("/archive")).is_none());
        assert!(pattern.matches(Method::Get, &split_path("/archive/2020/x")).is_none());
        assert!(pattern.matches(Method::Get, &split_path("/Archive/2020")).is_none());
        assert!(pattern.matches(Method::Get, &split_path("/archive/2020")).is_some());
    }

    #[test]
    fn test_split_path_decodes() {
        assert_eq!(split_path("/"), Vec::<String>::new());
        assert_eq!(split_path("//a///b/"), vec!["a", "b"]);
        assert_eq!(split_path("/shared/hello%20world"), vec!["shared", "hello world"]);
        assert_eq!(split_path("/bad/%FF"), vec!["bad", "%FF"]);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("POST".parse::<Method>(), Ok(Method::Post));
        assert!("get".parse::<Method>().is_err());
        assert_eq!(Method::try_from(&axum::http::Method::DELETE), Ok(Method::Delete));
        assert!(Method::try_from(&axum::http::Method::OPTIONS).is_err());
    }
}
