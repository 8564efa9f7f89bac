//! Async client for the Slicer VM orchestrator REST API.
//!
//! Covers the four operations every deployer needs: create a node in a host
//! group, list a host group's nodes, delete a VM, and fetch serial-console
//! logs. Everything else (scheduling, networking, storage) is the
//! orchestrator's business.

pub mod client;
pub mod types;

pub use client::SlicerClient;
pub use types::{CreateNodeRequest, CreateNodeResponse, VmRecord};

/// Strip a CIDR suffix from an IP, e.g. `192.168.137.7/24` -> `192.168.137.7`.
pub fn strip_cidr(ip: &str) -> &str {
    match ip.find('/') {
        Some(idx) => &ip[..idx],
        None => ip,
    }
}

/// Exact-match tag lookup. Tags are the only workload classification
/// mechanism the orchestrator offers.
pub fn has_tag(tags: &[String], tag: &str) -> bool {
    tags.iter().any(|t| t == tag)
}

/// Keep only the nodes carrying `tag`.
pub fn filter_by_tag(nodes: Vec<VmRecord>, tag: &str) -> Vec<VmRecord> {
    nodes
        .into_iter()
        .filter(|node| has_tag(&node.tags, tag))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(hostname: &str, tags: &[&str]) -> VmRecord {
        VmRecord {
            hostname: hostname.to_string(),
            ip: "192.168.137.7/24".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn strips_cidr_suffix() {
        assert_eq!(strip_cidr("192.168.137.7/24"), "192.168.137.7");
        assert_eq!(strip_cidr("192.168.137.7"), "192.168.137.7");
    }

    #[test]
    fn tag_match_is_exact() {
        let tags = vec!["k3s".to_string(), "k3s-cp".to_string()];
        assert!(has_tag(&tags, "k3s-cp"));
        assert!(!has_tag(&tags, "k3s-agent"));
        assert!(!has_tag(&tags, "k3s-"));
    }

    #[test]
    fn filters_nodes_by_tag() {
        let nodes = vec![
            record("pg-1", &["postgres"]),
            record("bk-1", &["buildkit"]),
            record("pg-2", &["postgres"]),
        ];
        let filtered = filter_by_tag(nodes, "postgres");
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|n| has_tag(&n.tags, "postgres")));
    }
}
