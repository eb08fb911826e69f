//! Release number to codename lookup.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Debian release numbers and their codenames, oldest first.
pub const DEBIAN_CODENAMES: &[(&str, &str)] = &[
    ("1.1", "buzz"),
    ("1.2", "rex"),
    ("1.3", "bo"),
    ("2.0", "hamm"),
    ("2.1", "slink"),
    ("2.2", "potato"),
    ("3.0", "woody"),
    ("3.1", "sarge"),
    ("4.0", "etch"),
    ("5.0", "lenny"),
    ("6.0", "squeeze"),
    ("7.0", "wheezy"),
    ("8.0", "jessie"),
    ("9.0", "stretch"),
    ("10.0", "buster"),
    ("11.0", "bullseye"),
    ("12.0", "bookworm"),
    ("13.0", "trixie"),
];

/// Rolling suites, least to most recent. They rank after every codename.
pub const ROLLING_SUITES: &[&str] = &["stable", "testing", "unstable", "sid"];

/// From this major release on, the minor number is a point release.
const POINT_RELEASE_MAJOR: u32 = 7;

fn release_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)(r(\d+))?").expect("valid release regex"))
}

/// Immutable codename table plus the suite recency ordering derived from it.
#[derive(Debug, Clone, Copy)]
pub struct CodenameTable {
    entries: &'static [(&'static str, &'static str)],
    rolling: &'static [&'static str],
}

impl Default for CodenameTable {
    fn default() -> Self {
        Self::debian()
    }
}

impl CodenameTable {
    /// The built-in Debian table.
    pub fn debian() -> Self {
        Self::new(DEBIAN_CODENAMES, ROLLING_SUITES)
    }

    /// Build a table from explicit data.
    pub fn new(
        entries: &'static [(&'static str, &'static str)],
        rolling: &'static [&'static str],
    ) -> Self {
        Self { entries, rolling }
    }

    /// Map a numeric release (`7.0`, `3.1r8`, `12.5`) to its codename.
    ///
    /// Releases before 7 only match their exact `major.minor` entry. From
    /// 7 on, a release with no exact entry falls back to `major.0`, so
    /// `7.8` is wheezy where a `major.minor` lookup alone finds nothing.
    ///
    /// Returns `None` for non-numeric input and releases not in the table.
    pub fn lookup(&self, release: &str) -> Option<&'static str> {
        let caps = release_regex().captures(release)?;
        let major = &caps[1];
        let minor = &caps[2];

        let exact = format!("{}.{}", major, minor);
        if let Some(name) = self.find(&exact) {
            return Some(name);
        }

        // 7.8 is a point release of 7.0
        let major_num: u32 = major.parse().ok()?;
        if major_num >= POINT_RELEASE_MAJOR {
            return self.find(&format!("{}.0", major));
        }
        None
    }

    fn find(&self, short_release: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(release, _)| *release == short_release)
            .map(|(_, name)| *name)
    }

    /// Every suite name in recency order, oldest first.
    fn release_order(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries
            .iter()
            .map(|(_, name)| *name)
            .chain(self.rolling.iter().copied())
    }

    /// Recency rank of a suite: lower is more recent. `None` if unknown.
    pub fn recency_rank(&self, suite: &str) -> Option<usize> {
        let order: Vec<&str> = self.release_order().collect();
        order
            .iter()
            .position(|name| *name == suite)
            .map(|index| order.len() - index)
    }

    /// Order two optional suites for release selection.
    ///
    /// Entries without a suite come first, then known suites from most to
    /// least recent, then unknown suites alphabetically.
    pub fn compare_suites(&self, a: Option<&str>, b: Option<&str>) -> Ordering {
        self.suite_key(a).cmp(&self.suite_key(b))
    }

    fn suite_key<'s>(&self, suite: Option<&'s str>) -> SuiteKey<'s> {
        match suite {
            None | Some("") => SuiteKey::Unspecified,
            Some(name) => match self.recency_rank(name) {
                Some(rank) => SuiteKey::Known(rank),
                None => SuiteKey::Unknown(name),
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SuiteKey<'s> {
    Unspecified,
    Known(usize),
    Unknown(&'s str),
}
