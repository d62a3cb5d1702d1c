//! Proxy Whitelist - a source-IP whitelist engine for proxied connections
//!
//! This library decides whether a connection claiming to arrive via a
//! reverse proxy originates from a trusted address, before the caller
//! trusts any proxy-supplied metadata (such as a forwarded client
//! address). It supports:
//! - Literal IPv4/IPv6 addresses
//! - CIDR ranges
//! - Domain names (all A/AAAA records, re-resolved every 5 minutes)
//! - An explicit opt-out sentinel that disables checking entirely
//!
//! # Example
//!
//! ```rust
//! use std::net::IpAddr;
//! use proxy_whitelist_r::{Gate, Whitelist};
//!
//! let config = "
//! ## Trusted proxy sources
//! 127.0.0.0/8
//! ::1/128
//! 10.0.0.0/8
//! ";
//!
//! let gate = Gate::new(Whitelist::load(config).unwrap());
//!
//! let peer: IpAddr = "10.1.2.3".parse().unwrap();
//! if !gate.check(Some(peer)) {
//!     if let Some(warning) = gate.warning_for(Some(peer)) {
//!         eprintln!("{}", warning);
//!     }
//! }
//! ```
//!
//! # File Format
//!
//! One entry per line; blank lines and lines starting with `#` are skipped.
//!
//! | Entry | Example | Description |
//! |-------|---------|-------------|
//! | IP | `203.0.113.5` | Single IPv4 or IPv6 address |
//! | CIDR | `10.0.0.0/8` | Address range by prefix length |
//! | Domain | `proxy.example.com` | All A/AAAA records of the name |
//!
//! A first content line starting with the opt-out sentinel
//! (`YesIReallyWantToDisableWhitelistItsExtremelyDangerousButIKnowWhatIAmDoing`)
//! turns checking off for the whole file. A missing whitelist file can be
//! bootstrapped with [`Whitelist::load_or_create_default`], which seeds the
//! IPv4 and IPv6 loopback entries.
//!
//! Note the difference between the two permissive-looking states: a
//! disabled whitelist allows every peer, while an empty whitelist denies
//! every peer.

pub mod entry;
pub mod error;
pub mod gate;
pub mod resolver;
pub mod whitelist;

// Re-export commonly used items
pub use entry::{Entry, RESOLVE_TTL};
pub use error::{Result, WhitelistError};
pub use gate::Gate;
pub use resolver::{NilResolver, Resolver, StaticResolver, SystemResolver};
pub use whitelist::{Whitelist, WhitelistState, DISABLE_SENTINEL};
