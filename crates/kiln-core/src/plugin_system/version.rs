use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for version parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The input matched none of the accepted version formats
    #[error("Invalid version format: '{0}'")]
    InvalidFormat(String),
    /// A numeric component did not fit into a u32
    #[error("Version component '{component}' out of range in '{input}'")]
    OutOfRange { input: String, component: String },
    /// The comparison operator of a matcher is unknown
    #[error("Unknown version operator: '{0}'")]
    UnknownOperator(String),
}

/// A plugin version: `MAJOR.MINOR[.PATCH][-EXTENSION]`.
///
/// Equality takes the extension into account, ordering does not: use
/// [`Version::compare`] for the extension-blind total order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub extension: Option<String>,
}

impl Version {
    /// Creates a version without extension
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch, extension: None }
    }

    /// Creates a version carrying an extension token like `beta` or `rc-1`
    pub fn with_extension(major: u32, minor: u32, patch: u32, extension: &str) -> Result<Self, VersionError> {
        if !is_extension(extension) {
            return Err(VersionError::InvalidFormat(format!("{}.{}.{}-{}", major, minor, patch, extension)));
        }
        Ok(Self {
            major,
            minor,
            patch,
            extension: Some(extension.to_string()),
        })
    }

    /// Parses one of `M.m.p-EXT`, `M.m.p`, `M.m-EXT` or `M.m`.
    ///
    /// The whole input has to match; trailing garbage such as `1.2.3extra`
    /// is rejected.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        // The numeric core never contains '-', so the first one starts the extension.
        let (core, extension) = match input.split_once('-') {
            Some((core, ext)) => {
                if !is_extension(ext) {
                    return Err(VersionError::InvalidFormat(input.to_string()));
                }
                (core, Some(ext.to_string()))
            }
            None => (input, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(VersionError::InvalidFormat(input.to_string()));
        }

        let parse_part = |part: &str| -> Result<u32, VersionError> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::InvalidFormat(input.to_string()));
            }
            part.parse::<u32>().map_err(|_| VersionError::OutOfRange {
                input: input.to_string(),
                component: part.to_string(),
            })
        };

        let major = parse_part(parts[0])?;
        let minor = parse_part(parts[1])?;
        let patch = match parts.get(2) {
            Some(part) => parse_part(part)?,
            None => 0,
        };

        Ok(Self { major, minor, patch, extension })
    }

    /// Compares the numeric cores only; the extension never participates.
    pub fn compare(&self, other: &Version) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }

    /// Whether the extension is set
    pub fn is_extended(&self) -> bool {
        self.extension.is_some()
    }
}

fn is_extension(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Consistent with `Eq`: equal cores with different extensions are unordered.
impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.compare(other) {
            Ordering::Equal if self.extension != other.extension => None,
            ordering => Some(ordering),
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ext) = &self.extension {
            write!(f, "-{}", ext)?;
        }
        Ok(())
    }
}

/// Comparison operator attached to a dependency declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionMatcher {
    /// `=`: identical version, extension included
    Exact,
    /// `>`
    Greater,
    /// `>=`
    AtLeast,
    /// `<`
    Less,
    /// `<=`
    AtMost,
    /// `^`: same major (same minor while major is 0) and at least the required version
    Compatible,
    /// `~`: same major and minor and at least the required version
    Approximately,
    /// `*`: any version
    Any,
}

impl VersionMatcher {
    /// Evaluates the operator with `required` on the left-hand side.
    pub fn matches(&self, required: &Version, candidate: &Version) -> bool {
        let ordering = candidate.compare(required);
        match self {
            VersionMatcher::Exact => candidate == required,
            VersionMatcher::Greater => ordering == Ordering::Greater,
            VersionMatcher::AtLeast => ordering != Ordering::Less,
            VersionMatcher::Less => ordering == Ordering::Less,
            VersionMatcher::AtMost => ordering != Ordering::Greater,
            VersionMatcher::Compatible => {
                let same_line = if required.major == 0 {
                    candidate.major == 0 && candidate.minor == required.minor
                } else {
                    candidate.major == required.major
                };
                same_line && ordering != Ordering::Less
            }
            VersionMatcher::Approximately => {
                candidate.major == required.major
                    && candidate.minor == required.minor
                    && ordering != Ordering::Less
            }
            VersionMatcher::Any => true,
        }
    }

    /// The operator symbol used in declarations
    pub fn symbol(&self) -> &'static str {
        match self {
            VersionMatcher::Exact => "=",
            VersionMatcher::Greater => ">",
            VersionMatcher::AtLeast => ">=",
            VersionMatcher::Less => "<",
            VersionMatcher::AtMost => "<=",
            VersionMatcher::Compatible => "^",
            VersionMatcher::Approximately => "~",
            VersionMatcher::Any => "*",
        }
    }

    /// Splits a leading operator off `input`, e.g. `">=1.2"` into (`AtLeast`, `"1.2"`).
    /// A bare version means `AtLeast`.
    pub fn split_operator(input: &str) -> (Self, &str) {
        // Two-character operators first so ">=" is not read as ">".
        const OPERATORS: [(&str, VersionMatcher); 8] = [
            (">=", VersionMatcher::AtLeast),
            ("<=", VersionMatcher::AtMost),
            ("=", VersionMatcher::Exact),
            (">", VersionMatcher::Greater),
            ("<", VersionMatcher::Less),
            ("^", VersionMatcher::Compatible),
            ("~", VersionMatcher::Approximately),
            ("*", VersionMatcher::Any),
        ];
        let trimmed = input.trim();
        for (symbol, matcher) in OPERATORS {
            if let Some(rest) = trimmed.strip_prefix(symbol) {
                return (matcher, rest.trim_start());
            }
        }
        (VersionMatcher::AtLeast, trimmed)
    }

    /// Parses a whole requirement such as `">=1.2"`, `"^2.0"` or `"*"`.
    /// `*` takes no version and compares against 0.0.0.
    pub fn parse_requirement(input: &str) -> Result<(Self, Version), VersionError> {
        let (matcher, version) = Self::split_operator(input);
        if matcher == VersionMatcher::Any {
            if !version.is_empty() {
                return Err(VersionError::InvalidFormat(input.trim().to_string()));
            }
            return Ok((matcher, Version::new(0, 0, 0)));
        }
        Ok((matcher, Version::parse(version)?))
    }
}

impl FromStr for VersionMatcher {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(VersionMatcher::Exact),
            ">" => Ok(VersionMatcher::Greater),
            ">=" => Ok(VersionMatcher::AtLeast),
            "<" => Ok(VersionMatcher::Less),
            "<=" => Ok(VersionMatcher::AtMost),
            "^" => Ok(VersionMatcher::Compatible),
            "~" => Ok(VersionMatcher::Approximately),
            "*" => Ok(VersionMatcher::Any),
            other => Err(VersionError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for VersionMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
