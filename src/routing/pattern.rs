use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route pattern {pattern:?} failed to compile: {source}")]
    Compile {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A route path such as `/users/:id/posts/:post` compiled to an anchored regex.
///
/// Each `:name` segment runs to the next `/` (or the end) and matches one or
/// more non-`/` characters. Everything else matches literally. There is no
/// prefix matching and no trailing-slash folding.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
    param_names: Vec<String>,
}

impl RoutePattern {
    pub fn compile(pattern: &str) -> Result<Self, RouteError> {
        let (expr, param_names) = to_regex(pattern);
        let regex = Regex::new(&expr).map_err(|source| RouteError::Compile {
            pattern: pattern.to_string(),
            source,
        })?;

        debug_assert_eq!(regex.captures_len() - 1, param_names.len());

        Ok(Self {
            source: pattern.to_string(),
            regex,
            param_names,
        })
    }

    /// The pattern as declared.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Binds each capture to its parameter name, or `None` if `path` does not match.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let caps = self.regex.captures(path)?;

        Some(
            self.param_names
                .iter()
                .zip(caps.iter().skip(1))
                .map(|(name, m)| {
                    let value = m.map(|m| m.as_str()).unwrap_or_default();
                    (name.clone(), value.to_string())
                })
                .collect(),
        )
    }
}

/// Translates a route pattern into regex source plus its parameter names.
fn to_regex(pattern: &str) -> (String, Vec<String>) {
    let mut expr = String::with_capacity(pattern.len() + 8);
    let mut names = Vec::new();
    let mut chars = pattern.chars().peekable();

    expr.push('^');
    while let Some(c) = chars.next() {
        if c != ':' {
            let mut utf8 = [0u8; 4];
            expr.push_str(&regex::escape(c.encode_utf8(&mut utf8)));
            continue;
        }

        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if next == '/' {
                break;
            }
            name.push(next);
            chars.next();
        }
        names.push(name);
        expr.push_str("([^/]+)");
    }
    expr.push('$');

    (expr, names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_metacharacters_are_escaped() {
        let (expr, names) = to_regex("/files/v1.0/(all)");
        assert_eq!(expr, r"^/files/v1\.0/\(all\)$");
        assert!(names.is_empty());
    }

    #[test]
    fn params_run_to_next_slash() {
        let (expr, names) = to_regex("/users/:id/posts/:post_id");
        assert_eq!(expr, "^/users/([^/]+)/posts/([^/]+)$");
        assert_eq!(names, vec!["id", "post_id"]);
    }

    #[test]
    fn param_can_follow_literal_text() {
        let pattern = RoutePattern::compile("/v:version/status").unwrap();
        let caps = pattern.captures("/v2/status").unwrap();
        assert_eq!(caps, vec![("version".to_string(), "2".to_string())]);
    }
}
