//! Whitelist entry parsing and containment testing.

use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use ipnet::IpNet;
use log::warn;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

use crate::error::{Result, WhitelistError};
use crate::resolver::Resolver;

/// How long a resolved domain entry is trusted before re-resolution.
pub const RESOLVE_TTL: Duration = Duration::from_secs(5 * 60);

/// Regex pattern for validating domain-name entries.
/// Labels are alphanumeric with inner hyphens, separated by dots.
static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("DOMAIN_PATTERN: hardcoded regex is invalid")
});

/// Cached resolution result for a domain entry.
///
/// `valid_until` is `None` until the first successful resolution and is left
/// untouched when a resolution fails, so the next check retries immediately.
#[derive(Debug)]
struct ResolvedSet {
    addrs: Vec<IpAddr>,
    valid_until: Option<Instant>,
}

#[derive(Debug)]
enum EntryKind {
    /// Literal address or CIDR block, stored uniformly as a network.
    /// A literal is a network of full prefix length.
    Network(IpNet),
    /// Domain name resolved on demand, with a per-entry guarded cache.
    Domain {
        name: String,
        cache: Mutex<ResolvedSet>,
    },
}

/// A single whitelist entry parsed from one configuration line.
#[derive(Debug)]
pub struct Entry {
    raw: String,
    kind: EntryKind,
}

impl Entry {
    /// Parse one trimmed, non-empty, non-comment configuration line.
    ///
    /// Accepts a literal IP address, a CIDR block, or a domain name.
    /// A prefix length attached to a domain name is rejected.
    pub fn parse(line: &str) -> Result<Entry> {
        let line = line.trim();

        if let Some((base, prefix)) = line.rsplit_once('/') {
            if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
                return Err(WhitelistError::InvalidCidr(format!(
                    "{}: prefix length must be a non-negative integer",
                    line
                )));
            }
            let prefix_len: u8 = prefix.parse().map_err(|_| {
                WhitelistError::InvalidCidr(format!("{}: prefix length out of range", line))
            })?;
            let addr: IpAddr = base.parse().map_err(|_| {
                WhitelistError::InvalidCidr(format!(
                    "{}: prefix lengths are only allowed on literal IP addresses",
                    line
                ))
            })?;
            let network = IpNet::new(addr, prefix_len).map_err(|_| {
                WhitelistError::InvalidCidr(format!("{}: prefix length out of range", line))
            })?;
            return Ok(Entry {
                raw: line.to_string(),
                kind: EntryKind::Network(network),
            });
        }

        if let Ok(addr) = line.parse::<IpAddr>() {
            return Ok(Entry {
                raw: line.to_string(),
                kind: EntryKind::Network(IpNet::from(addr)),
            });
        }

        if !DOMAIN_PATTERN.is_match(line) {
            return Err(WhitelistError::InvalidEntry(line.to_string()));
        }

        Ok(Entry {
            raw: line.to_string(),
            kind: EntryKind::Domain {
                name: line.to_ascii_lowercase(),
                cache: Mutex::new(ResolvedSet {
                    addrs: Vec::new(),
                    valid_until: None,
                }),
            },
        })
    }

    /// The original configuration line.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Check whether the address is covered by this entry.
    ///
    /// Network entries use prefix containment; an address-family mismatch is
    /// a normal no-match. Domain entries re-resolve through `resolver` when
    /// the cached address set has expired, then test for exact membership.
    pub fn contains(&self, addr: IpAddr, resolver: &dyn Resolver) -> bool {
        match &self.kind {
            EntryKind::Network(network) => network.contains(&addr),
            EntryKind::Domain { name, cache } => {
                self.ensure_resolved(name, cache, resolver);
                cache.lock().addrs.contains(&addr)
            }
        }
    }

    /// Refresh an expired domain cache.
    ///
    /// The lock is not held across the lookup, so concurrent callers may
    /// resolve redundantly; the results are identical and last writer wins.
    /// On failure the previous set and expiry are kept, which forces a retry
    /// on the next check.
    fn ensure_resolved(&self, name: &str, cache: &Mutex<ResolvedSet>, resolver: &dyn Resolver) {
        let expired = {
            let cache = cache.lock();
            match cache.valid_until {
                Some(t) => Instant::now() >= t,
                None => true,
            }
        };
        if !expired {
            return;
        }

        match resolver.resolve(name) {
            Ok(addrs) => {
                let mut cache = cache.lock();
                cache.addrs = addrs;
                cache.valid_until = Some(Instant::now() + RESOLVE_TTL);
            }
            Err(e) => {
                warn!("failed to resolve whitelist entry '{}': {}", self.raw, e);
            }
        }
    }

    /// Force the next check to re-resolve, as if the TTL had elapsed.
    #[cfg(test)]
    pub(crate) fn expire_cache(&self) {
        if let EntryKind::Domain { cache, .. } = &self.kind {
            cache.lock().valid_until = None;
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
