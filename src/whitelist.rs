//! Whitelist loading and matching.

use std::fmt;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use log::warn;

use crate::entry::Entry;
use crate::error::{Result, WhitelistError};
use crate::resolver::{Resolver, SystemResolver};

/// First content line that turns whitelist checking off for the whole file.
///
/// Deliberately verbose so it cannot be reached by a typo.
pub const DISABLE_SENTINEL: &str =
    "YesIReallyWantToDisableWhitelistItsExtremelyDangerousButIKnowWhatIAmDoing";

/// Default file content written when no configuration exists.
const DEFAULT_FILE: &str = "\
# List of allowed proxy IPs
#
# An empty whitelist will disallow all proxies.
# Each entry must be a valid IP address, domain name or CIDR.
# Domain names are re-resolved every five minutes.
# Each domain can have multiple A/AAAA records, all of them will be allowed.
# CIDR prefixes are not allowed in domain names.

127.0.0.0/8
::1/128
";

/// Outcome of loading a whitelist configuration.
///
/// `Disabled` allows every peer; an `Active` whitelist with zero entries
/// denies every peer. The two are deliberately distinct states.
#[derive(Debug)]
pub enum WhitelistState {
    /// Checking is turned off by the opt-out sentinel.
    Disabled,
    /// Checking is on; a peer must match one of the entries.
    Active(Whitelist),
}

/// An ordered collection of whitelist entries.
///
/// Entry membership is immutable after loading; a reload replaces the whole
/// object. Individual domain entries refresh their internal caches on access.
pub struct Whitelist {
    entries: Vec<Entry>,
    resolver: Arc<dyn Resolver>,
}

impl Whitelist {
    /// Load a whitelist from configuration text using the system resolver.
    pub fn load(text: &str) -> Result<WhitelistState> {
        Self::load_with_resolver(text, Arc::new(SystemResolver::new()))
    }

    /// Load a whitelist from configuration text with an injected resolver.
    ///
    /// Blank lines and lines whose first non-whitespace character is `#` are
    /// skipped. If the first content line starts with the opt-out sentinel
    /// the whole file is treated as disabled, regardless of later content.
    /// The first malformed entry aborts the load.
    pub fn load_with_resolver(text: &str, resolver: Arc<dyn Resolver>) -> Result<WhitelistState> {
        let mut entries = Vec::new();
        let mut first = true;

        for (line_num, line) in text.lines().enumerate() {
            let line_num = line_num + 1; // 1-based line numbers
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if first && line.starts_with(DISABLE_SENTINEL) {
                warn!("proxy whitelist checking is disabled by configuration");
                return Ok(WhitelistState::Disabled);
            }
            first = false;

            let entry = Entry::parse(line).map_err(|e| WhitelistError::ParseErrorAtLine {
                line: line_num,
                message: e.to_string(),
            })?;
            entries.push(entry);
        }

        Ok(WhitelistState::Active(Whitelist { entries, resolver }))
    }

    /// Load a whitelist from a configuration file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<WhitelistState> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            WhitelistError::ConfigError(format!(
                "Failed to read whitelist file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::load(&text)
    }

    /// Load a whitelist file, writing a default one first if none exists.
    ///
    /// The default allows the IPv4 loopback range and the IPv6 loopback
    /// address, so a proxy on the same host is trusted out of the box.
    pub fn load_or_create_default(path: impl AsRef<Path>) -> Result<WhitelistState> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() || path.is_dir() {
            fs::write(path, DEFAULT_FILE)?;
        }
        Self::load_from_file(path)
    }

    /// Check whether any entry covers the address. Short-circuits on the
    /// first match; an empty whitelist matches nothing.
    pub fn matches(&self, addr: IpAddr) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.contains(addr, self.resolver.as_ref()))
    }

    /// Number of entries, for diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the whitelist has no entries (and therefore denies everything).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

impl fmt::Debug for Whitelist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(Entry::raw))
            .finish()
    }
}
