use crate::error::Error;
use crate::types::WILDCARD_PARAM;
use std::collections::HashMap;

/// One segment of a compiled path template.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    /// Matches the candidate segment byte-exact.
    Literal(String),
    /// `:name`: matches any single non-empty segment, captured under `name`.
    Param(String),
    /// `*`: matches any single non-empty segment, captured under `_`.
    SingleStar,
    /// `**`: consumes the remainder of the path (zero or more segments),
    /// captured under `_`. Must be the last segment.
    DoubleStar,
}

/// A compiled path template.
///
/// Templates are split into segments at `/`. A segment is a parameter when it
/// starts with `:`, a single-segment wildcard when it is exactly `*`, a
/// trailing multi-segment wildcard when it is exactly `**`, and a literal
/// otherwise. A pattern is *literal* iff every segment is a literal; literal
/// patterns are eligible for the route store's O(1) index.
///
/// ## Example
///
/// ```
/// use viaduct::pattern::PathPattern;
///
/// let pattern = PathPattern::compile("/users/:id").unwrap();
/// let params = pattern.match_path("/users/42").unwrap();
/// assert_eq!(params.get("id").map(String::as_str), Some("42"));
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
    literal: bool,
}

impl PathPattern {
    /// Compiles a template string.
    ///
    /// Fails when `**` is not the last segment or a parameter name is empty;
    /// no route should be registered from a template that does not compile.
    pub fn compile(template: &str) -> Result<Self, Error> {
        let trimmed = template.strip_prefix('/').unwrap_or(template);
        let raw: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        let mut segments = Vec::with_capacity(raw.len());
        for (index, piece) in raw.iter().enumerate() {
            let segment = match *piece {
                "*" => Segment::SingleStar,
                "**" => {
                    if index != raw.len() - 1 {
                        return Err(Error::config(format!(
                            "`**` must be the last segment in `{}`",
                            template
                        )));
                    }
                    Segment::DoubleStar
                }
                piece if piece.starts_with(':') => {
                    let name = &piece[1..];
                    if name.is_empty() {
                        return Err(Error::config(format!(
                            "empty parameter name in `{}`",
                            template
                        )));
                    }
                    Segment::Param(name.to_string())
                }
                piece => Segment::Literal(piece.to_string()),
            };
            segments.push(segment);
        }

        let literal = segments
            .iter()
            .all(|segment| matches!(segment, Segment::Literal(_)));

        Ok(Self {
            template: template.to_string(),
            segments,
            literal,
        })
    }

    /// True iff every segment is a literal.
    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Attempts to match a path, returning the extracted parameters.
    ///
    /// Segments are compared positionally and byte-exact; parameters and `*`
    /// reject empty candidate segments; `**` consumes the remaining segments
    /// joined by `/` (zero remaining segments yield an empty capture). A
    /// length mismatch fails unless the pattern ends in `**`.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let parts: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        let mut params = HashMap::new();
        for (index, segment) in self.segments.iter().enumerate() {
            if let Segment::DoubleStar = segment {
                let tail = if index < parts.len() {
                    parts[index..].join("/")
                } else {
                    String::new()
                };
                params.insert(WILDCARD_PARAM.to_string(), tail);
                return Some(params);
            }

            let part = *parts.get(index)?;
            match segment {
                Segment::Literal(text) => {
                    if text != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), part.to_string());
                }
                Segment::SingleStar => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(WILDCARD_PARAM.to_string(), part.to_string());
                }
                Segment::DoubleStar => unreachable!("handled above"),
            }
        }

        if parts.len() != self.segments.len() {
            return None;
        }

        Some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches_exactly() {
        let pattern = PathPattern::compile("/users/list").unwrap();
        assert!(pattern.is_literal());

        let params = pattern.match_path("/users/list").unwrap();
        assert!(params.is_empty());

        assert!(pattern.match_path("/users/other").is_none());
        assert!(pattern.match_path("/users/list/extra").is_none());
        assert!(pattern.match_path("/users").is_none());
    }

    #[test]
    fn templates_with_holes_are_not_literal() {
        assert!(!PathPattern::compile("/users/:id").unwrap().is_literal());
        assert!(!PathPattern::compile("/files/*").unwrap().is_literal());
        assert!(!PathPattern::compile("/files/**").unwrap().is_literal());
        assert!(PathPattern::compile("/").unwrap().is_literal());
    }

    #[test]
    fn param_extraction() {
        let pattern = PathPattern::compile("/users/:id/posts/:pid").unwrap();
        let params = pattern.match_path("/users/42/posts/7").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert_eq!(params.get("pid").map(String::as_str), Some("7"));
    }

    #[test]
    fn params_never_capture_empty_or_slash() {
        let pattern = PathPattern::compile("/users/:id").unwrap();
        assert!(pattern.match_path("/users//").is_none());
        assert!(pattern.match_path("/users/a/b").is_none());

        let params = pattern.match_path("/users/a-b.c").unwrap();
        let captured = params.get("id").unwrap();
        assert!(!captured.is_empty());
        assert!(!captured.contains('/'));
    }

    #[test]
    fn single_star_captures_under_reserved_key() {
        let pattern = PathPattern::compile("/files/*").unwrap();
        let params = pattern.match_path("/files/report.txt").unwrap();
        assert_eq!(params.get("_").map(String::as_str), Some("report.txt"));
        assert!(pattern.match_path("/files/a/b").is_none());
    }

    #[test]
    fn double_star_captures_the_tail() {
        let pattern = PathPattern::compile("/files/**").unwrap();
        let params = pattern.match_path("/files/a/b/c.txt").unwrap();
        assert_eq!(params.get("_").map(String::as_str), Some("a/b/c.txt"));
    }

    #[test]
    fn double_star_accepts_zero_segments() {
        let pattern = PathPattern::compile("/files/**").unwrap();
        let params = pattern.match_path("/files").unwrap();
        assert_eq!(params.get("_").map(String::as_str), Some(""));

        assert!(pattern.match_path("/users").is_none());
    }

    #[test]
    fn double_star_must_be_terminal() {
        let err = PathPattern::compile("/a/**/b").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Config);
    }

    #[test]
    fn empty_param_name_is_rejected() {
        let err = PathPattern::compile("/users/:").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Config);
    }

    #[test]
    fn trailing_slash_is_not_ignored() {
        let pattern = PathPattern::compile("/hello").unwrap();
        assert!(pattern.match_path("/hello/").is_none());
    }

    #[test]
    fn root_pattern_matches_root() {
        let pattern = PathPattern::compile("/").unwrap();
        assert!(pattern.match_path("/").unwrap().is_empty());
        assert!(pattern.match_path("/x").is_none());
    }
}
