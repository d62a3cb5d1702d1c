//! Connection gate: the active whitelist plus warning deduplication.

use std::net::IpAddr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::whitelist::WhitelistState;

/// Owns the active whitelist for the connection-acceptance path.
///
/// Constructed once at startup and shared by handle. `check` is invoked once
/// per accepted connection; `warning_for` rate-limits operator-facing log
/// noise by suppressing repeats from the most recently rejected address.
pub struct Gate {
    active: RwLock<Arc<WhitelistState>>,
    last_warned: Mutex<Option<IpAddr>>,
}

impl Gate {
    /// Create a gate around a loaded whitelist state.
    pub fn new(state: WhitelistState) -> Self {
        Self {
            active: RwLock::new(Arc::new(state)),
            last_warned: Mutex::new(None),
        }
    }

    /// Replace the active whitelist wholesale, for a configuration reload.
    ///
    /// In-flight checks keep the state they already snapshotted; later checks
    /// see the new one. No partially loaded state is ever observable.
    pub fn replace(&self, state: WhitelistState) {
        *self.active.write() = Arc::new(state);
    }

    /// Whether checking is currently disabled by the opt-out sentinel.
    pub fn is_disabled(&self) -> bool {
        matches!(**self.active.read(), WhitelistState::Disabled)
    }

    /// Decide whether a peer may be trusted as a proxy source.
    ///
    /// `peer` is `None` for transports without an IP address (e.g. a Unix
    /// socket); those are allowed only while checking is disabled.
    pub fn check(&self, peer: Option<IpAddr>) -> bool {
        let state = Arc::clone(&self.active.read());
        match (&*state, peer) {
            (WhitelistState::Disabled, _) => true,
            (WhitelistState::Active(whitelist), Some(addr)) => whitelist.matches(addr),
            (WhitelistState::Active(_), None) => false,
        }
    }

    /// Produce a warning message for a rejected peer, suppressing repeats.
    ///
    /// Returns a message only when the peer is rejected and differs from the
    /// previously warned address (single slot, so only immediate repeats are
    /// suppressed). Purely for operator visibility; never use it for access
    /// control.
    pub fn warning_for(&self, peer: Option<IpAddr>) -> Option<String> {
        let addr = peer?;
        if self.check(peer) {
            return None;
        }

        let mut last_warned = self.last_warned.lock();
        if *last_warned == Some(addr) {
            return None;
        }
        *last_warned = Some(addr);
        Some(format!(
            "Proxied remote address {} is not in the whitelist",
            addr
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    use super::*;
    use crate::resolver::NilResolver;
    use crate::whitelist::Whitelist;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    fn gate_for(text: &str) -> Gate {
        Gate::new(Whitelist::load_with_resolver(text, Arc::new(NilResolver::new())).unwrap())
    }

    #[test]
    fn test_disabled_allows_everything() {
        let gate = Gate::new(WhitelistState::Disabled);

        assert!(gate.is_disabled());
        assert!(gate.check(Some(v4(203, 0, 113, 99))));
        assert!(gate.check(None));
        assert!(gate.warning_for(Some(v4(203, 0, 113, 99))).is_none());
    }

    #[test]
    fn test_active_whitelist_filters_peers() {
        let gate = gate_for("10.0.0.0/8\n");

        assert!(!gate.is_disabled());
        assert!(gate.check(Some(v4(10, 1, 2, 3))));
        assert!(!gate.check(Some(v4(192, 168, 0, 1))));
    }

    #[test]
    fn test_non_ip_peer_rejected_while_active() {
        let gate = gate_for("10.0.0.0/8\n");

        assert!(!gate.check(None));
        assert!(gate.warning_for(None).is_none());
    }

    #[test]
    fn test_empty_whitelist_denies_everything() {
        let gate = gate_for("# nothing\n");

        assert!(!gate.check(Some(v4(127, 0, 0, 1))));
    }

    #[test]
    fn test_warning_deduplicates_immediate_repeats() {
        let gate = gate_for("10.0.0.0/8\n");
        let x = v4(192, 168, 0, 1);
        let y = v4(192, 168, 0, 2);

        assert!(gate.warning_for(Some(x)).is_some());
        assert!(gate.warning_for(Some(x)).is_none());
        assert!(gate.warning_for(Some(y)).is_some());
        // A single slot only suppresses immediate repeats, so X warns again.
        assert!(gate.warning_for(Some(x)).is_some());
    }

    #[test]
    fn test_no_warning_for_allowed_peer() {
        let gate = gate_for("10.0.0.0/8\n");

        assert!(gate.warning_for(Some(v4(10, 1, 2, 3))).is_none());
    }

    #[test]
    fn test_warning_message_names_the_peer() {
        let gate = gate_for("10.0.0.0/8\n");

        let message = gate.warning_for(Some(v4(192, 168, 0, 1))).unwrap();
        assert!(message.contains("192.168.0.1"), "got: {}", message);
    }

    #[test]
    fn test_replace_swaps_the_active_state() {
        let gate = gate_for("10.0.0.0/8\n");
        let peer = v4(192, 168, 0, 1);
        assert!(!gate.check(Some(peer)));

        gate.replace(
            Whitelist::load_with_resolver("192.168.0.0/16\n", Arc::new(NilResolver::new()))
                .unwrap(),
        );
        assert!(gate.check(Some(peer)));
        assert!(!gate.check(Some(v4(10, 1, 2, 3))));
    }
}
