//! Keyspace layout shared with the rule provisioning side.
//!
//! These names are a compatibility surface: every router process and the
//! control plane agree on them.

/// Hash of domain rules keyed by hostname pattern.
pub const DOMAINS: &str = "alice.http|domains";

/// Field names of the per-application flag hash.
pub const FLAG_CACHE_VERSION: &str = "cache_version";
pub const FLAG_SUSPENDED: &str = "suspended";
pub const FLAG_MAINTENANCE: &str = "maintenance";

/// Hash of flags for one application.
pub fn application_flags(application: &str) -> String {
    format!("alice.http|applications:{}", application)
}

/// Hash of path rules for one application.
pub fn paths(application: &str) -> String {
    format!("alice.http|paths:{}", application)
}

/// Rotating list of backend instances serving `(application, process)`.
pub fn backends(application: &str, process: &str) -> String {
    format!("alice.http|backends:{}:{}", application, process)
}

/// Rotating list of passers running on one machine.
pub fn passers(machine: &str) -> String {
    format!("alice.http|passers:{}", machine)
}
