//! DNS resolver module.
//!
//! Provides interfaces and implementations for name resolution.

use std::collections::HashMap;
use std::net::{IpAddr, ToSocketAddrs};

use crate::error::{Result, WhitelistError};

/// DNS resolver interface.
pub trait Resolver: Send + Sync {
    /// Resolve the hostname to all of its IPv4 and IPv6 addresses.
    ///
    /// An empty list means the host exists but has no address records.
    /// Returns an error if the resolution fails completely.
    fn resolve(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// System DNS resolver using the OS resolver.
pub struct SystemResolver;

impl SystemResolver {
    /// Create a new system resolver.
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for SystemResolver {
    fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        // First check if host is already an IP address
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        // Resolve using system DNS
        let addrs = (host, 0u16).to_socket_addrs().map_err(|e| {
            WhitelistError::ResolveError(format!("Failed to resolve {}: {}", host, e))
        })?;

        Ok(dedup_ips(addrs.map(|a| a.ip())))
    }
}

/// Nil resolver that always returns no addresses.
pub struct NilResolver;

impl NilResolver {
    /// Create a new nil resolver.
    pub fn new() -> Self {
        Self
    }
}

impl Default for NilResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for NilResolver {
    fn resolve(&self, _host: &str) -> Result<Vec<IpAddr>> {
        Ok(Vec::new())
    }
}

/// Static resolver with predefined mappings.
pub struct StaticResolver {
    mappings: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    /// Create a new empty static resolver.
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
        }
    }

    /// Add a mapping for a hostname.
    pub fn add(&mut self, host: impl Into<String>, addrs: Vec<IpAddr>) {
        self.mappings.insert(host.into(), addrs);
    }

    /// Add a mapping and return self for chaining.
    pub fn with_mapping(mut self, host: impl Into<String>, addrs: Vec<IpAddr>) -> Self {
        self.add(host, addrs);
        self
    }
}

impl Default for StaticResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for StaticResolver {
    fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        // First check if host is already an IP address
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        self.mappings
            .get(host)
            .cloned()
            .ok_or_else(|| WhitelistError::ResolveError(format!("Host not found: {}", host)))
    }
}

/// Drop duplicate addresses while preserving resolver order.
///
/// `ToSocketAddrs` can report the same address once per socket type.
fn dedup_ips(ips: impl Iterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut out: Vec<IpAddr> = Vec::new();
    for ip in ips {
        if !out.contains(&ip) {
            out.push(ip);
        }
    }
    out
}

/// Test-only resolver that replays a fixed sequence of responses and
/// counts how many lookups were attempted.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::Resolver;
    use crate::error::{Result, WhitelistError};

    pub(crate) struct ScriptedResolver {
        responses: Mutex<VecDeque<Result<Vec<IpAddr>>>>,
        calls: AtomicUsize,
    }

    impl ScriptedResolver {
        pub(crate) fn new(responses: Vec<Result<Vec<IpAddr>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Resolver for ScriptedResolver {
        fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().pop_front().unwrap_or_else(|| {
                Err(WhitelistError::ResolveError(format!(
                    "no scripted response left for {}",
                    host
                )))
            })
        }
    }
}
