//! `apt-cache policy` parsing and release selection.
//!
//! Policy output lists each package source under a priority line:
//!
//! ```text
//!  500 http://ftp.debian.org/debian/ wheezy/main amd64 Packages
//!      release v=7.8,o=Debian,a=stable,n=wheezy,l=Debian,c=main
//!      origin ftp.debian.org
//! ```
//!
//! Each `release` line becomes a [`PolicyEntry`] carrying the most recent
//! priority seen above it.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::codename::CodenameTable;
use super::info::UNKNOWN_CODENAME;

/// Mirror whose Release file reports version `1.0` for its unstable suite.
pub const DEBIAN_PORTS_ORIGIN: &str = "Debian Ports";
/// Label used by the Debian Ports mirror.
pub const DEBIAN_PORTS_LABEL: &str = "ftp.debian-ports.org";

/// Codename used for the testing suite when nothing more specific is known.
pub const DEFAULT_TESTING_CODENAME: &str = "unknown.new.testing";

/// Short attribute keys and the names they stand for.
const ATTRIBUTE_NAMES: &[(&str, &str)] = &[
    ("v", "version"),
    ("o", "origin"),
    ("a", "suite"),
    ("c", "component"),
    ("l", "label"),
];

fn priority_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(-?\d+)").expect("valid priority regex"))
}

/// One `release` line from policy output and the priority it sits under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyEntry {
    pub priority: i64,
    pub attributes: BTreeMap<String, String>,
}

impl PolicyEntry {
    /// Attribute by long name (`version`, `origin`, `suite`, ...).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.get("version")
    }

    pub fn origin(&self) -> Option<&str> {
        self.get("origin")
    }

    pub fn suite(&self) -> Option<&str> {
        self.get("suite")
    }

    pub fn component(&self) -> Option<&str> {
        self.get("component")
    }

    pub fn label(&self) -> Option<&str> {
        self.get("label")
    }
}

/// Parse the attribute list of a `release` line (`v=7.8,o=Debian,...`).
///
/// Unknown keys and pieces without `=` are dropped.
pub fn parse_release_attributes(data: &str) -> BTreeMap<String, String> {
    data.split(',')
        .filter_map(|bit| bit.split_once('='))
        .filter_map(|(key, value)| {
            ATTRIBUTE_NAMES
                .iter()
                .find(|(short, _)| *short == key)
                .map(|(_, long)| (long.to_string(), value.to_string()))
        })
        .collect()
}

/// Parse full `apt-cache policy` output.
///
/// `release` lines that appear before any priority line are skipped.
pub fn parse_policy(output: &str) -> Vec<PolicyEntry> {
    let mut entries = Vec::new();
    let mut priority: Option<i64> = None;

    for line in output.lines() {
        let line = line.trim();

        if let Some(caps) = priority_regex().captures(line) {
            priority = caps[1].parse().ok();
        }

        if line.starts_with("release") {
            let Some((_, data)) = line.split_once(' ') else {
                continue;
            };
            match priority {
                Some(priority) => entries.push(PolicyEntry {
                    priority,
                    attributes: parse_release_attributes(data),
                }),
                None => tracing::debug!("release line before any priority: {}", line),
            }
        }
    }

    entries
}

/// Which package sources count as the distribution's own.
#[derive(Debug, Clone)]
pub struct PolicyFilter {
    pub origin: String,
    pub component: String,
    pub label: String,
    /// Alternate mirrors as (origin, label) pairs.
    pub alternates: Vec<(String, String)>,
}

impl Default for PolicyFilter {
    fn default() -> Self {
        Self {
            origin: "Debian".to_string(),
            component: "main".to_string(),
            label: "Debian".to_string(),
            alternates: vec![(
                DEBIAN_PORTS_ORIGIN.to_string(),
                DEBIAN_PORTS_LABEL.to_string(),
            )],
        }
    }
}

impl PolicyFilter {
    /// Whether `entry` comes from the configured origin or an alternate.
    pub fn matches(&self, entry: &PolicyEntry) -> bool {
        let origin = entry.origin().unwrap_or("");
        let label = entry.label().unwrap_or("");

        let primary = origin == self.origin
            && entry.component().unwrap_or("") == self.component
            && label == self.label;

        let alternate = self
            .alternates
            .iter()
            .any(|(alt_origin, alt_label)| origin == alt_origin && label == alt_label);

        primary || alternate
    }
}

/// Pick the entry describing the release the system tracks.
///
/// Keeps matching entries with the highest priority, then prefers the most
/// recent suite per the codename table.
pub fn select_release<'a>(
    entries: &'a [PolicyEntry],
    filter: &PolicyFilter,
    table: &CodenameTable,
) -> Option<&'a PolicyEntry> {
    let candidates: Vec<&PolicyEntry> = entries.iter().filter(|e| filter.matches(e)).collect();
    let max_priority = candidates.iter().map(|e| e.priority).max()?;

    candidates
        .into_iter()
        .filter(|e| e.priority == max_priority)
        .min_by(|a, b| table.compare_suites(a.suite(), b.suite()))
}

/// Release and codename derived from a policy entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRelease {
    pub release: String,
    pub codename: String,
}

/// Turn the selected entry into a release and codename.
///
/// A numeric `version` maps through the codename table. Without one, the
/// suite (default `unstable`) is the release and the codename is `sid`, or
/// `testing_codename` for the testing suite.
pub fn resolve_release(
    entry: &PolicyEntry,
    table: &CodenameTable,
    testing_codename: &str,
) -> PolicyRelease {
    let ports_unstable = entry.version() == Some("1.0")
        && entry.origin() == Some(DEBIAN_PORTS_ORIGIN)
        && entry.label() == Some(DEBIAN_PORTS_LABEL);

    if let Some(version) = entry.version().filter(|v| !v.is_empty() && !ports_unstable) {
        return PolicyRelease {
            release: version.to_string(),
            codename: table
                .lookup(version)
                .unwrap_or(UNKNOWN_CODENAME)
                .to_string(),
        };
    }

    let suite = if ports_unstable {
        "unstable"
    } else {
        entry.suite().unwrap_or("unstable")
    };
    let codename = if suite == "testing" {
        testing_codename
    } else {
        "sid"
    };

    PolicyRelease {
        release: suite.to_string(),
        codename: codename.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHEEZY_POLICY: &str = "\
Package files:
 100 /var/lib/dpkg/status
     release a=now
 500 http://security.debian.org/ wheezy/updates/main amd64 Packages
     release v=7.0,o=Debian,a=stable,n=wheezy,l=Debian-Security,c=main
     origin security.debian.org
 500 http://ftp.debian.org/debian/ wheezy/main amd64 Packages
     release v=7.8,o=Debian,a=stable,n=wheezy,l=Debian,c=main
     origin ftp.debian.org
 100 http://ftp.debian.org/debian/ jessie/main amd64 Packages
     release v=8.0,o=Debian,a=testing,n=jessie,l=Debian,c=main
     origin ftp.debian.org
Pinned packages:
";

    fn entry(priority: i64, attrs: &str) -> PolicyEntry {
        PolicyEntry {
            priority,
            attributes: parse_release_attributes(attrs),
        }
    }

    #[test]
    fn parses_attributes_with_long_names() {
        let attrs = parse_release_attributes("v=7.8,o=Debian,a=stable,n=wheezy,l=Debian,c=main");
        assert_eq!(attrs.get("version").map(String::as_str), Some("7.8"));
        assert_eq!(attrs.get("origin").map(String::as_str), Some("Debian"));
        assert_eq!(attrs.get("suite").map(String::as_str), Some("stable"));
        assert_eq!(attrs.get("component").map(String::as_str), Some("main"));
        assert_eq!(attrs.get("label").map(String::as_str), Some("Debian"));
        assert!(!attrs.contains_key("n"));
    }

    #[test]
    fn skips_malformed_attribute_pieces() {
        let attrs = parse_release_attributes("garbage,o=Debian,,=x");
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn parses_policy_output() {
        let entries = parse_policy(WHEEZY_POLICY);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].priority, 100);
        assert_eq!(entries[0].suite(), Some("now"));
        assert_eq!(entries[2].priority, 500);
        assert_eq!(entries[2].version(), Some("7.8"));
        assert_eq!(entries[3].priority, 100);
    }

    #[test]
    fn release_before_priority_is_skipped() {
        let entries = parse_policy("release v=1.0,o=Debian\n 500 x\n release a=sid\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].suite(), Some("sid"));
    }

    #[test]
    fn negative_priorities_parse() {
        let entries = parse_policy(" -10 http://x\n release a=experimental,o=Debian\n");
        assert_eq!(entries[0].priority, -10);
    }

    #[test]
    fn empty_output_has_no_entries() {
        assert!(parse_policy("").is_empty());
    }

    #[test]
    fn selects_highest_priority_debian_main() {
        let entries = parse_policy(WHEEZY_POLICY);
        let table = CodenameTable::debian();
        let chosen = select_release(&entries, &PolicyFilter::default(), &table).unwrap();
        assert_eq!(chosen.version(), Some("7.8"));
    }

    #[test]
    fn prefers_more_recent_suite_at_equal_priority() {
        let entries = vec![
            entry(500, "o=Debian,a=stable,l=Debian,c=main"),
            entry(500, "o=Debian,a=unstable,l=Debian,c=main"),
            entry(500, "o=Debian,a=testing,l=Debian,c=main"),
        ];
        let table = CodenameTable::debian();
        let chosen = select_release(&entries, &PolicyFilter::default(), &table).unwrap();
        assert_eq!(chosen.suite(), Some("unstable"));
    }

    #[test]
    fn no_matching_entries_selects_nothing() {
        let entries = vec![entry(500, "o=Ubuntu,a=trusty,l=Ubuntu,c=main")];
        let table = CodenameTable::debian();
        assert!(select_release(&entries, &PolicyFilter::default(), &table).is_none());
    }

    #[test]
    fn alternate_mirror_matches_without_component() {
        let filter = PolicyFilter::default();
        assert!(filter.matches(&entry(500, "o=Debian Ports,l=ftp.debian-ports.org")));
        assert!(!filter.matches(&entry(500, "o=Debian Ports,l=Debian")));
    }

    #[test]
    fn version_maps_through_codename_table() {
        let table = CodenameTable::debian();
        let resolved = resolve_release(
            &entry(500, "v=6.0,o=Debian,a=oldstable"),
            &table,
            DEFAULT_TESTING_CODENAME,
        );
        assert_eq!(resolved.release, "6.0");
        assert_eq!(resolved.codename, "squeeze");
    }

    #[test]
    fn unknown_version_maps_to_na() {
        let table = CodenameTable::debian();
        let resolved = resolve_release(&entry(500, "v=4.4"), &table, DEFAULT_TESTING_CODENAME);
        assert_eq!(resolved.codename, "n/a");
    }

    #[test]
    fn debian_ports_one_point_zero_is_unstable() {
        let table = CodenameTable::debian();
        let resolved = resolve_release(
            &entry(500, "v=1.0,o=Debian Ports,l=ftp.debian-ports.org"),
            &table,
            DEFAULT_TESTING_CODENAME,
        );
        assert_eq!(resolved.release, "unstable");
        assert_eq!(resolved.codename, "sid");
    }

    #[test]
    fn testing_suite_uses_testing_codename() {
        let table = CodenameTable::debian();
        let resolved = resolve_release(&entry(990, "o=Debian,a=testing"), &table, "stretch");
        assert_eq!(resolved.release, "testing");
        assert_eq!(resolved.codename, "stretch");
    }

    #[test]
    fn missing_suite_defaults_to_unstable() {
        let table = CodenameTable::debian();
        let resolved = resolve_release(&entry(500, "o=Debian"), &table, DEFAULT_TESTING_CODENAME);
        assert_eq!(resolved.release, "unstable");
        assert_eq!(resolved.codename, "sid");
    }
}
