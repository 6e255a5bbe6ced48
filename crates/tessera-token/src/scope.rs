//! Permission scopes carried by tokens.
//!
//! On the wire the `scope` claim is a single space-separated string
//! (`"monitoring.scrape monitoring.query"`).

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single permission label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope(Cow<'static, str>);

impl Scope {
    /// Permission to scrape the metrics endpoint.
    pub const MONITORING_SCRAPE: Self = Self(Cow::Borrowed("monitoring.scrape"));
    /// Permission to use the monitoring query engine.
    pub const MONITORING_QUERY: Self = Self(Cow::Borrowed("monitoring.query"));
    /// Permission to access the web UI.
    pub const WEB_UI_ACCESS: Self = Self(Cow::Borrowed("web_ui.access"));

    /// Create a scope from any label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(Cow::Owned(label.into()))
    }

    /// The label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Scope {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// The set of scopes granted by a token, in wire order without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(Vec<Scope>);

impl ScopeSet {
    /// Create an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a space-separated scope string. Repeated whitespace is ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.split_ascii_whitespace().map(Scope::from).collect()
    }

    /// Add a scope if not already present.
    pub fn insert(&mut self, scope: Scope) {
        if !self.0.contains(&scope) {
            self.0.push(scope);
        }
    }

    /// Whether `scope` is granted.
    #[must_use]
    pub fn contains(&self, scope: &Scope) -> bool {
        self.0.contains(scope)
    }

    /// The first of `required` that is not granted, if any.
    #[must_use]
    pub fn first_missing<'a>(&self, required: &'a [Scope]) -> Option<&'a Scope> {
        required.iter().find(|scope| !self.contains(scope))
    }

    /// Iterate over the granted scopes.
    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.0.iter()
    }

    /// Number of granted scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no scope is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        let mut set = Self::new();
        for scope in iter {
            set.insert(scope);
        }
        set
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, scope) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(scope.as_str())?;
        }
        Ok(())
    }
}

impl Serialize for ScopeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScopeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
