//! Hierarchical URIs addressing the component tree and external resources.
//!
//! ```text
//! URI := [ <scheme> ":" ] <path>
//!
//! cpath:/World/Europe/Belgium   absolute component path
//! ../Africa                     relative component path (scheme defaults to cpath)
//! file:/data/mesh.msh           file path
//! http://host/resource          opaque, never completed
//! ```
//!
//! `cpath` and `file` paths are hierarchical: repeated separators collapse,
//! and [`Uri::complete_path`] resolves `.` and `..` the way POSIX paths do.

use crate::{CfError, CfResult};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Div;
use std::str::FromStr;

/// A URI scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Scheme {
    /// Component tree path.
    #[default]
    Cpath,
    /// Local file path.
    File,
    /// HTTP resource.
    Http,
    /// HTTPS resource.
    Https,
}

impl Scheme {
    /// All known schemes.
    pub const ALL: [Scheme; 4] = [Scheme::Cpath, Scheme::File, Scheme::Http, Scheme::Https];

    /// Returns the textual prefix (without the colon).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cpath => "cpath",
            Self::File => "file",
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Looks up a scheme by its textual prefix.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == prefix)
    }

    /// Returns `true` if paths of this scheme form a `/`-separated hierarchy.
    #[must_use]
    pub fn is_hierarchical(self) -> bool {
        matches!(self, Self::Cpath | Self::File)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed URI.
///
/// # Example
///
/// ```
/// use cf_types::{Scheme, Uri};
///
/// let uri = Uri::parse("cpath:/World/Europe//Belgium").expect("valid uri");
/// assert_eq!(uri.scheme(), Scheme::Cpath);
/// assert_eq!(uri.path(), "/World/Europe/Belgium");
/// assert_eq!(uri.name(), "Belgium");
/// assert_eq!(uri.base_path().to_string(), "cpath:/World/Europe");
///
/// let sibling = Uri::parse("../Africa").expect("valid uri");
/// let done = sibling.complete_path(&uri).expect("completes");
/// assert_eq!(done.to_string(), "cpath:/World/Europe/Africa");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Uri {
    scheme: Scheme,
    path: String,
}

impl Uri {
    /// The component tree root, `cpath:/`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            scheme: Scheme::Cpath,
            path: "/".to_string(),
        }
    }

    /// Creates a `cpath` URI from a path, collapsing repeated separators.
    #[must_use]
    pub fn cpath(path: &str) -> Self {
        Self {
            scheme: Scheme::Cpath,
            path: normalize_separators(path),
        }
    }

    /// Parses a URI from text.
    ///
    /// A missing scheme means `cpath`.
    ///
    /// # Errors
    ///
    /// [`CfError::BadValue`] if the text contains control characters or an
    /// unknown scheme prefix.
    pub fn parse(text: &str) -> CfResult<Self> {
        if let Some(c) = text.chars().find(|c| c.is_control()) {
            return Err(CfError::bad_value(format!(
                "URI '{}' contains control character {c:?}",
                text.escape_debug()
            )));
        }

        let (scheme, rest) = split_scheme(text)?;
        let path = if scheme.is_hierarchical() {
            normalize_separators(rest)
        } else {
            rest.to_string()
        };

        Ok(Self { scheme, path })
    }

    /// Parses a URI and checks its scheme against `allowed`.
    ///
    /// # Errors
    ///
    /// [`CfError::BadValue`] for malformed text, [`CfError::ProtocolError`]
    /// if the scheme is not allowed.
    pub fn parse_with(text: &str, allowed: &[Scheme]) -> CfResult<Self> {
        let uri = Self::parse(text)?;
        uri.check_scheme(allowed)?;
        Ok(uri)
    }

    /// Checks the scheme against an allowed set. An empty set allows all.
    ///
    /// # Errors
    ///
    /// [`CfError::ProtocolError`] if the scheme is not in `allowed`.
    pub fn check_scheme(&self, allowed: &[Scheme]) -> CfResult<()> {
        if allowed.is_empty() || allowed.contains(&self.scheme) {
            return Ok(());
        }
        let expected: Vec<&str> = allowed.iter().map(|s| s.as_str()).collect();
        Err(CfError::ProtocolError(format!(
            "scheme '{}' of '{self}' is not one of [{}]",
            self.scheme,
            expected.join(", ")
        )))
    }

    /// Returns the scheme.
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns the path part (everything after `scheme:`).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` if the path is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Returns `true` for absolute paths. Opaque schemes are always absolute.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        !self.scheme.is_hierarchical() || self.path.starts_with('/')
    }

    /// Returns `true` for relative paths.
    #[must_use]
    pub fn is_relative(&self) -> bool {
        !self.is_absolute()
    }

    /// Returns `true` for the hierarchy root (`cpath:/`, `file:/`).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.scheme.is_hierarchical() && self.path == "/"
    }

    /// Iterates over the non-empty path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }

    /// Returns the last path segment, or `""` for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    /// Returns the URI with its last segment removed.
    ///
    /// The root is its own base path.
    #[must_use]
    pub fn base_path(&self) -> Uri {
        let path = match self.path.rfind('/') {
            Some(0) => "/".to_string(),
            Some(pos) => self.path[..pos].to_string(),
            None => String::new(),
        };
        Self {
            scheme: self.scheme,
            path,
        }
    }

    /// Appends a relative path.
    #[must_use]
    pub fn join(&self, rhs: &str) -> Uri {
        let rhs = rhs.trim_start_matches('/');
        if rhs.is_empty() {
            return self.clone();
        }

        let joined = if self.path.is_empty() {
            rhs.to_string()
        } else if self.path.ends_with('/') {
            format!("{}{rhs}", self.path)
        } else {
            format!("{}/{rhs}", self.path)
        };

        let path = if self.scheme.is_hierarchical() {
            normalize_separators(&joined)
        } else {
            joined
        };

        Self {
            scheme: self.scheme,
            path,
        }
    }

    /// Resolves this URI against `base`, folding `.` and `..` segments.
    ///
    /// Absolute URIs ignore `base`. Relative URIs take the scheme of `base`.
    /// `..` at the root stays at the root. The result is always absolute and
    /// normalised, so completing it again returns it unchanged.
    ///
    /// # Errors
    ///
    /// - [`CfError::ProtocolError`] if either scheme is not hierarchical
    /// - [`CfError::BadValue`] if a relative URI is completed against a
    ///   relative base
    pub fn complete_path(&self, base: &Uri) -> CfResult<Uri> {
        if !self.scheme.is_hierarchical() {
            return Err(CfError::ProtocolError(format!(
                "cannot complete '{self}': scheme '{}' has no path hierarchy",
                self.scheme
            )));
        }

        let (scheme, joined) = if self.is_absolute() {
            (self.scheme, self.path.clone())
        } else {
            if !base.scheme.is_hierarchical() {
                return Err(CfError::ProtocolError(format!(
                    "cannot complete '{self}' against '{base}': scheme '{}' has no path hierarchy",
                    base.scheme
                )));
            }
            if base.is_relative() {
                return Err(CfError::bad_value(format!(
                    "cannot complete '{self}' against relative base '{base}'"
                )));
            }
            (base.scheme, format!("{}/{}", base.path, self.path))
        };

        let mut stack: Vec<&str> = Vec::new();
        for segment in joined.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    stack.pop();
                }
                name => stack.push(name),
            }
        }

        Ok(Self {
            scheme,
            path: format!("/{}", stack.join("/")),
        })
    }
}

/// Splits an optional `scheme:` prefix from the text.
fn split_scheme(text: &str) -> CfResult<(Scheme, &str)> {
    let Some(pos) = text.find(':') else {
        return Ok((Scheme::Cpath, text));
    };

    let prefix = &text[..pos];
    let looks_like_scheme = !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !looks_like_scheme {
        return Ok((Scheme::Cpath, text));
    }

    Scheme::from_prefix(prefix)
        .map(|scheme| (scheme, &text[pos + 1..]))
        .ok_or_else(|| CfError::bad_value(format!("unknown URI scheme '{prefix}' in '{text}'")))
}

/// Collapses repeated separators and drops a trailing one (except at the root).
fn normalize_separators(path: &str) -> String {
    let joined = path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if path.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path)
    }
}

impl FromStr for Uri {
    type Err = CfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Uri {
    type Error = CfError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Div<&str> for &Uri {
    type Output = Uri;

    fn div(self, rhs: &str) -> Uri {
        self.join(rhs)
    }
}

impl Div<&str> for Uri {
    type Output = Uri;

    fn div(self, rhs: &str) -> Uri {
        self.join(rhs)
    }
}

impl Div<&Uri> for &Uri {
    type Output = Uri;

    fn div(self, rhs: &Uri) -> Uri {
        self.join(rhs.path())
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(text: &str) -> Uri {
        Uri::parse(text).expect("test URI should parse")
    }

    // ── Parsing ──────────────────────────────────────────────

    #[test]
    fn parse_without_scheme_defaults_to_cpath() {
        let u = uri("/World/Europe");
        assert_eq!(u.scheme(), Scheme::Cpath);
        assert_eq!(u.to_string(), "cpath:/World/Europe");
    }

    #[test]
    fn parse_collapses_separators() {
        assert_eq!(uri("cpath://World///Europe/").path(), "/World/Europe");
        assert_eq!(uri("cpath:/").path(), "/");
    }

    #[test]
    fn parse_keeps_http_opaque() {
        let u = uri("http://example.org/a//b");
        assert_eq!(u.scheme(), Scheme::Http);
        assert_eq!(u.path(), "//example.org/a//b");
        assert!(u.is_absolute());
    }

    #[test]
    fn parse_unknown_scheme_is_bad_value() {
        let err = Uri::parse("ftp:/pub").expect_err("ftp is not a known scheme");
        assert!(matches!(err, CfError::BadValue(_)));
    }

    #[test]
    fn parse_control_character_is_bad_value() {
        let err = Uri::parse("cpath:/a\u{7}b").expect_err("control chars are rejected");
        assert!(matches!(err, CfError::BadValue(_)));
    }

    #[test]
    fn parse_with_restricted_schemes() {
        assert!(Uri::parse_with("file:/mesh.msh", &[Scheme::File]).is_ok());
        let err = Uri::parse_with("cpath:/Mesh", &[Scheme::File])
            .expect_err("cpath is not allowed for a file reader");
        assert!(matches!(err, CfError::ProtocolError(_)));
    }

    #[test]
    fn empty_allowed_set_accepts_everything() {
        assert!(uri("https://x/y").check_scheme(&[]).is_ok());
    }

    // ── Path operations ──────────────────────────────────────

    #[test]
    fn base_path_and_name() {
        let u = uri("cpath:/World/Europe/Belgium");
        assert_eq!(u.name(), "Belgium");
        assert_eq!(u.base_path(), uri("cpath:/World/Europe"));
        assert_eq!(uri("cpath:/World").base_path(), Uri::root());
        assert_eq!(Uri::root().base_path(), Uri::root());
        assert_eq!(Uri::root().name(), "");
        assert!(uri("leaf").base_path().is_empty());
    }

    #[test]
    fn join_with_div_operator() {
        let world = uri("cpath:/World");
        assert_eq!((&world / "Europe").to_string(), "cpath:/World/Europe");
        assert_eq!((Uri::root() / "World").to_string(), "cpath:/World");
        assert_eq!((&world / &uri("Europe/Belgium")).name(), "Belgium");
        assert_eq!(&world / "", world);
    }

    #[test]
    fn complete_relative_path() {
        let base = uri("cpath:/World/Europe");
        assert_eq!(
            uri("./Belgium").complete_path(&base).expect("completes"),
            uri("cpath:/World/Europe/Belgium")
        );
        assert_eq!(
            uri("../Africa/Congo").complete_path(&base).expect("completes"),
            uri("cpath:/World/Africa/Congo")
        );
    }

    #[test]
    fn complete_dotdot_stops_at_root() {
        let done = uri("../../../..").complete_path(&uri("cpath:/a")).expect("completes");
        assert!(done.is_root());
    }

    #[test]
    fn complete_absolute_ignores_base() {
        let done = uri("cpath:/a/./b/../c")
            .complete_path(&uri("cpath:/zzz"))
            .expect("completes");
        assert_eq!(done, uri("cpath:/a/c"));
    }

    #[test]
    fn complete_takes_scheme_of_base() {
        let done = uri("data/mesh.msh")
            .complete_path(&uri("file:/home/user"))
            .expect("completes");
        assert_eq!(done.to_string(), "file:/home/user/data/mesh.msh");
    }

    #[test]
    fn complete_is_idempotent() {
        let base = uri("cpath:/World/Europe");
        for text in ["..", "./a/../b", "cpath:/x/./y", "a/b/c/../../d", "."] {
            let once = uri(text).complete_path(&base).expect("first completion");
            let twice = once.complete_path(&base).expect("second completion");
            assert_eq!(once, twice, "completion of '{text}' must be idempotent");
        }
    }

    #[test]
    fn complete_rejects_relative_base() {
        let err = uri("a").complete_path(&uri("b")).expect_err("relative base");
        assert!(matches!(err, CfError::BadValue(_)));
    }

    #[test]
    fn complete_rejects_opaque_scheme() {
        let err = uri("http://host/x")
            .complete_path(&Uri::root())
            .expect_err("http has no hierarchy");
        assert!(matches!(err, CfError::ProtocolError(_)));
    }

    // ── Serialization ────────────────────────────────────────

    #[test]
    fn serializes_as_string() {
        let u = uri("cpath:/Tools");
        let json = serde_json::to_string(&u).expect("uri should serialize");
        assert_eq!(json, "\"cpath:/Tools\"");
        let back: Uri = serde_json::from_str(&json).expect("uri should deserialize");
        assert_eq!(back, u);
    }

    #[test]
    fn deserialize_rejects_bad_scheme() {
        let result: Result<Uri, _> = serde_json::from_str("\"gopher:/x\"");
        assert!(result.is_err());
    }
}
