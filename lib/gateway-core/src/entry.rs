//! Compiled routing entries

use crate::pattern::PathPattern;
use crate::{CoreError, Result};
use gateway_api::{EntryType, Phase, ProxyType, RoutingEntrySpec};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, warn};

/// Level used when neither `phase` nor `level` is set
pub const DEFAULT_LEVEL: &str = "50";

/// Level every `auth` phase entry runs at
pub const AUTH_LEVEL: &str = "10";

/// Where in a module descriptor a routing entry was declared
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Provides,
    TopLevel,
    Handlers,
    Filters,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Provides => "provides",
            Section::TopLevel => "toplevel",
            Section::Handlers => "handlers",
            Section::Filters => "filters",
        };
        f.write_str(name)
    }
}

/// Ordering key of an entry within a request pipeline.
///
/// Numeric levels sort numerically and ahead of non-numeric ones, which sort
/// lexically, so the order is total.
#[derive(Clone, Copy, Debug)]
pub struct PhaseLevel<'a>(&'a str);

impl<'a> PhaseLevel<'a> {
    pub fn new(level: &'a str) -> Self {
        Self(level)
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }

    fn key(&self) -> (bool, u64, &'a str) {
        match self.0.trim().parse::<u64>() {
            Ok(n) => (false, n, self.0),
            Err(_) => (true, 0, self.0),
        }
    }
}

impl PartialEq for PhaseLevel<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PhaseLevel<'_> {}

impl PartialOrd for PhaseLevel<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PhaseLevel<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Resolve the ordering value of an entry: `auth` phase wins over `level`,
/// which wins over the default
pub fn resolve_phase_level<'a>(phase: Option<Phase>, level: Option<&'a str>) -> &'a str {
    match (phase, level) {
        (Some(Phase::Auth), _) => AUTH_LEVEL,
        (None, Some(level)) => level,
        (None, None) => DEFAULT_LEVEL,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Check a declared entry before it is compiled.
///
/// In non-strict mode a legacy `path` entry is accepted with a warning; strict
/// mode rejects it.
pub fn validate(spec: &RoutingEntrySpec, strict: bool, section: Section) -> Result<()> {
    debug!(?spec, %section, "Validating routing entry");

    let invalid = |reason: &str| CoreError::InvalidEntry {
        section: section.to_string(),
        reason: reason.to_string(),
    };

    let path = non_empty(&spec.path);
    let pattern = non_empty(&spec.path_pattern);
    if path.is_none() && pattern.is_none() {
        return Err(invalid("Bad routing entry, needs a pathPattern or at least a path"));
    }

    if let (Some(path), None) = (path, pattern) {
        if strict {
            return Err(invalid(&format!(
                "Routing entry uses old type path {}. Use a pathPattern instead",
                path
            )));
        }
        warn!(path, %section, "RoutingEntry uses old type path. Use a pathPattern instead");
    }

    if spec.entry_type == Some(EntryType::Redirect) && non_empty(&spec.redirect_path).is_none() {
        return Err(invalid("Redirect entry needs a redirectPath"));
    }

    // TODO: check permissionsRequired/permissionsDesired against the module's declared permission sets
    Ok(())
}

#[derive(Clone, Debug)]
enum PathMatcher {
    Pattern {
        pattern: PathPattern,
        redirect: Option<String>,
    },
    Prefix(String),
}

/// A validated routing entry with its path matcher compiled.
///
/// Immutable once built; the `with_*` methods produce a copy recompiled under
/// the same validation mode and section.
#[derive(Clone, Debug)]
pub struct RoutingEntry {
    spec: RoutingEntrySpec,
    matcher: PathMatcher,
    strict: bool,
    section: Section,
}

impl RoutingEntry {
    /// Validate (non-strict) and compile a declared entry
    pub fn compile(spec: RoutingEntrySpec) -> Result<Self> {
        Self::compile_with(spec, false, Section::TopLevel)
    }

    pub fn compile_with(spec: RoutingEntrySpec, strict: bool, section: Section) -> Result<Self> {
        validate(&spec, strict, section)?;

        let matcher = match (non_empty(&spec.path_pattern), non_empty(&spec.path)) {
            (Some(template), _) => {
                let pattern = PathPattern::compile(template).map_err(|source| {
                    CoreError::InvalidPattern {
                        pattern: template.to_string(),
                        source,
                    }
                })?;
                let redirect = non_empty(&spec.redirect_path).map(|target| pattern.replacement_for(target));
                debug!(pattern = template, "Compiled path pattern");
                PathMatcher::Pattern { pattern, redirect }
            }
            (None, Some(prefix)) => PathMatcher::Prefix(prefix.to_string()),
            (None, None) => {
                return Err(CoreError::InvalidEntry {
                    section: section.to_string(),
                    reason: "Bad routing entry, needs a pathPattern or at least a path".to_string(),
                })
            }
        };

        Ok(Self {
            spec,
            matcher,
            strict,
            section,
        })
    }

    /// Check whether a request (method may be absent) is served by this entry.
    ///
    /// Query and fragment are ignored, except when `?` or `#` is the very first
    /// character of the URI.
    pub fn matches(&self, uri: &str, method: Option<&str>) -> bool {
        let mut path = uri;
        if let Some(index) = path.find('?').filter(|i| *i > 0) {
            path = &path[..index];
        }
        if let Some(index) = path.find('#').filter(|i| *i > 0) {
            path = &path[..index];
        }

        let path_ok = match &self.matcher {
            PathMatcher::Pattern { pattern, .. } => pattern.is_match(path),
            PathMatcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
        };
        path_ok && self.matches_method(method)
    }

    // An entry without methods never matches, not even a request without a method
    fn matches_method(&self, method: Option<&str>) -> bool {
        self.spec
            .methods
            .iter()
            .any(|m| method.is_none() || m == "*" || Some(m.as_str()) == method)
    }

    /// Rewrite `uri` to the redirect target, keeping any query or fragment.
    ///
    /// Returns `None` when the entry has no redirect target.
    pub fn redirect_uri(&self, uri: &str) -> Option<String> {
        match &self.matcher {
            PathMatcher::Pattern { pattern, redirect } => {
                let replacement = redirect.as_deref()?;
                let split = uri.find(['?', '#']).unwrap_or(uri.len());
                let (path, suffix) = uri.split_at(split);
                let mut target = pattern.rewrite(path, replacement).into_owned();
                target.push_str(suffix);
                Some(target)
            }
            PathMatcher::Prefix(prefix) => {
                let redirect = non_empty(&self.spec.redirect_path)?;
                let rest = uri.get(prefix.len()..).unwrap_or("");
                Some(format!("{}{}", redirect, rest))
            }
        }
    }

    pub fn methods(&self) -> &[String] {
        &self.spec.methods
    }

    pub fn path_pattern(&self) -> Option<&str> {
        match &self.matcher {
            PathMatcher::Pattern { pattern, .. } => Some(pattern.as_str()),
            PathMatcher::Prefix(_) => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.spec.path.as_deref()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.spec.phase
    }

    pub fn level(&self) -> Option<&str> {
        self.spec.level.as_deref()
    }

    pub fn phase_level(&self) -> PhaseLevel<'_> {
        PhaseLevel::new(resolve_phase_level(self.spec.phase, self.spec.level.as_deref()))
    }

    pub fn entry_type(&self) -> Option<EntryType> {
        self.spec.entry_type
    }

    pub fn proxy_type(&self) -> ProxyType {
        self.spec
            .entry_type
            .map(|t| t.proxy_type())
            .unwrap_or_default()
    }

    pub fn redirect_path(&self) -> Option<&str> {
        self.spec.redirect_path.as_deref()
    }

    pub fn permissions_required(&self) -> &[String] {
        self.spec.permissions_required.as_deref().unwrap_or_default()
    }

    pub fn permissions_desired(&self) -> &[String] {
        self.spec.permissions_desired.as_deref().unwrap_or_default()
    }

    pub fn module_permissions(&self) -> &[String] {
        self.spec.module_permissions.as_deref().unwrap_or_default()
    }

    /// The declared shape of this entry, without derived fields
    pub fn spec(&self) -> &RoutingEntrySpec {
        &self.spec
    }

    pub fn to_spec(&self) -> RoutingEntrySpec {
        self.spec.clone()
    }

    /// Section the entry was validated for
    pub fn section(&self) -> Section {
        self.section
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Copy of this entry with another redirect target
    pub fn with_redirect_path(&self, redirect_path: impl Into<String>) -> Result<Self> {
        let mut spec = self.spec.clone();
        spec.redirect_path = Some(redirect_path.into());
        Self::compile_with(spec, self.strict, self.section)
    }

    /// Copy of this entry answering other methods
    pub fn with_methods<M, S>(&self, methods: M) -> Result<Self>
    where
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = self.spec.clone();
        spec.methods = methods.into_iter().map(Into::into).collect();
        Self::compile_with(spec, self.strict, self.section)
    }
}
