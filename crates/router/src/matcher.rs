//! Compiles a single pathname pattern into a matcher.
//!
//! Patterns are `/`-separated segments. A segment is either static text or a named param:
//!
//! | segment  | matches                                   |
//! |----------|-------------------------------------------|
//! | `:id`    | exactly one segment                       |
//! | `:id?`   | one segment, or nothing                   |
//! | `:rest*` | the rest of the path, or nothing          |
//! | `:rest+` | the rest of the path, at least one segment |
//!
//! Optional segments are expanded into several routes of one [`matchit::Router`], so the
//! match itself stays a plain radix-tree lookup.
//!
//! Static text matches without regard to ASCII case, while captured values keep the case
//! of the requested pathname. A repeated param captures its segments as a list.

use matchit::InsertError;
use serde_json::{Map, Value};
use thiserror::Error;

type InnerRouter = matchit::Router<()>;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("pattern '{pattern}' must start with '/'")]
    MissingLeadingSlash { pattern: String },

    #[error("pattern '{pattern}' has an invalid param segment '{segment}'")]
    InvalidParam { pattern: String, segment: String },

    #[error("pattern '{pattern}' has a repeated param that is not the last segment")]
    CatchAllNotLast { pattern: String },

    #[error("pattern '{pattern}' can not be compiled: {source}")]
    Conflict {
        pattern: String,
        #[source]
        source: InsertError,
    },
}

/// A compiled pathname pattern.
pub struct PathMatcher {
    pattern: String,
    inner: InnerRouter,
    repeated: Vec<String>,
}

impl std::fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathMatcher").field("pattern", &self.pattern).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Optional(String),
    Rest { name: String, required: bool },
}

impl PathMatcher {
    /// Compiles `pattern`, e.g. `/users/:id` or `/files/:path*`.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let segments = parse(pattern)?;

        let mut inner = InnerRouter::new();
        let mut shapes = Vec::new();
        for route in expand(&segments) {
            let shape = route_shape(&route);
            // `/a/:b?/:c?` yields `/a/{b}` and `/a/{c}`; the leftmost param wins
            if shapes.contains(&shape) {
                continue;
            }
            inner
                .insert(route, ())
                .map_err(|source| PatternError::Conflict { pattern: pattern.to_string(), source })?;
            shapes.push(shape);
        }

        let repeated = segments
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Rest { name, .. } => Some(name),
                _ => None,
            })
            .collect();

        Ok(Self { pattern: pattern.to_string(), inner, repeated })
    }

    /// The pattern this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Matches a concrete pathname, returning the extracted params.
    ///
    /// Never fails: a pathname that does not fit the pattern is `None`. A single trailing
    /// slash is ignored.
    pub fn matches(&self, pathname: &str) -> Option<PathParams> {
        if let Some(params) = self.lookup(pathname) {
            return Some(params);
        }

        match pathname.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => self.lookup(trimmed),
            _ => None,
        }
    }

    fn lookup(&self, pathname: &str) -> Option<PathParams> {
        // ascii lowercasing keeps byte offsets, so captures map back onto `pathname`
        let lowered = pathname.to_ascii_lowercase();
        let matched = self.inner.at(&lowered).ok()?;

        let params = matched
            .params
            .iter()
            .map(|(name, value)| {
                let start = value.as_ptr().addr() - lowered.as_ptr().addr();
                let original = &pathname[start..start + value.len()];
                PathParam {
                    name: name.to_string(),
                    value: original.to_string(),
                    repeated: self.repeated.iter().any(|repeated| repeated == name),
                }
            })
            .collect();
        Some(PathParams { inner: params })
    }
}

fn parse(pattern: &str) -> Result<Vec<Segment>, PatternError> {
    let Some(rest) = pattern.strip_prefix('/') else {
        return Err(PatternError::MissingLeadingSlash { pattern: pattern.to_string() });
    };

    let mut segments = Vec::new();
    for raw in rest.split('/').filter(|raw| !raw.is_empty()) {
        let segment = match raw.strip_prefix(':') {
            None => Segment::Static(raw.to_string()),
            Some(param) => parse_param(param).ok_or_else(|| PatternError::InvalidParam {
                pattern: pattern.to_string(),
                segment: raw.to_string(),
            })?,
        };

        if matches!(segments.last(), Some(Segment::Rest { .. })) {
            return Err(PatternError::CatchAllNotLast { pattern: pattern.to_string() });
        }
        segments.push(segment);
    }

    Ok(segments)
}

fn parse_param(param: &str) -> Option<Segment> {
    let (name, modifier) = match param.char_indices().last() {
        Some((index, c @ ('?' | '*' | '+'))) => (&param[..index], Some(c)),
        _ => (param, None),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    let name = name.to_string();
    Some(match modifier {
        None => Segment::Param(name),
        Some('?') => Segment::Optional(name),
        Some('*') => Segment::Rest { name, required: false },
        _ => Segment::Rest { name, required: true },
    })
}

/// Every concrete matchit route the segments can produce, longest first.
fn expand(segments: &[Segment]) -> Vec<String> {
    let mut routes: Vec<Vec<String>> = vec![Vec::new()];

    for segment in segments {
        let mut next = Vec::with_capacity(routes.len() * 2);
        for route in routes {
            let (part, optional) = match segment {
                Segment::Static(text) => (escape(&text.to_ascii_lowercase()), false),
                Segment::Param(name) => (format!("{{{name}}}"), false),
                Segment::Optional(name) => (format!("{{{name}}}"), true),
                Segment::Rest { name, required } => (format!("{{*{name}}}"), !required),
            };

            let mut with = route.clone();
            with.push(part);
            next.push(with);
            if optional {
                next.push(route);
            }
        }
        routes = next;
    }

    routes.into_iter().map(|parts| format!("/{}", parts.join("/"))).collect()
}

fn escape(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// The route with param names erased, used to detect ambiguous expansions.
fn route_shape(route: &str) -> String {
    route
        .split('/')
        .map(|part| match part {
            _ if part.starts_with("{*") => "{*}",
            _ if part.starts_with('{') && !part.starts_with("{{") => "{}",
            _ => part,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PathParam {
    name: String,
    value: String,
    repeated: bool,
}

/// Named segment values extracted from a matched pathname.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    inner: Vec<PathParam>,
}

impl PathParams {
    #[inline]
    pub fn empty() -> Self {
        Self { inner: Vec::new() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Gets the matched text of a param by its name. For a repeated param this is every
    /// captured segment, still joined by `/`.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        self.find(key.as_ref()).map(|param| param.value.as_str())
    }

    /// Gets the segments of a param. A single param has exactly one.
    pub fn segments(&self, key: impl AsRef<str>) -> Option<Vec<&str>> {
        self.find(key.as_ref()).map(PathParam::segments)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|param| (param.name.as_str(), param.value.as_str()))
    }

    /// The params as a JSON object ready for validation: strings for single params and
    /// lists of strings for repeated ones.
    pub fn to_value(&self) -> Value {
        let object = self
            .inner
            .iter()
            .map(|param| {
                let value = if param.repeated {
                    Value::Array(param.segments().into_iter().map(|segment| Value::String(segment.to_string())).collect())
                } else {
                    Value::String(param.value.clone())
                };
                (param.name.clone(), value)
            })
            .collect::<Map<_, _>>();
        Value::Object(object)
    }

    fn find(&self, key: &str) -> Option<&PathParam> {
        self.inner.iter().find(|param| param.name == key)
    }
}

impl PathParam {
    fn segments(&self) -> Vec<&str> {
        if self.repeated {
            self.value.split('/').filter(|segment| !segment.is_empty()).collect()
        } else {
            vec![self.value.as_str()]
        }
    }
}

/// Collects single-segment params.
impl FromIterator<(String, String)> for PathParams {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let inner = iter.into_iter().map(|(name, value)| PathParam { name, value, repeated: false }).collect();
        Self { inner }
    }
}
