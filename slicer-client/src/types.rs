//! Wire types for the Slicer orchestrator API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A VM as reported by the orchestrator.
///
/// The IP may carry a CIDR suffix (`192.168.137.7/24`); strip it with
/// [`crate::strip_cidr`] before handing it to anything that dials the VM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmRecord {
    pub hostname: String,
    pub ip: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for node creation. Optional fields stay off the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNodeRequest {
    pub ram_gb: u32,
    pub cpus: u32,
    pub userdata: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_keys: Vec<String>,
    /// GitHub username whose public SSH keys the VM imports at boot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_user: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNodeResponse {
    pub hostname: String,
    pub ip: String,
    pub created_at: DateTime<Utc>,
}

/// Serial-console log payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_omits_empty_fields() {
        let req = CreateNodeRequest {
            ram_gb: 4,
            cpus: 2,
            userdata: "#!/bin/bash".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("ssh_keys"));
        assert!(!obj.contains_key("import_user"));
        assert!(!obj.contains_key("tags"));
    }

    #[test]
    fn create_request_serializes_set_fields() {
        let req = CreateNodeRequest {
            ram_gb: 8,
            cpus: 4,
            userdata: String::new(),
            ssh_keys: vec!["ssh-ed25519 AAAA".to_string()],
            import_user: Some("alexellis".to_string()),
            tags: vec!["buildkit".to_string()],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["ram_gb"], 8);
        assert_eq!(json["import_user"], "alexellis");
        assert_eq!(json["tags"][0], "buildkit");
    }

    #[test]
    fn vm_record_tolerates_missing_tags() {
        let record: VmRecord = serde_json::from_str(
            r#"{"hostname":"bk-1","ip":"192.168.138.2/24","created_at":"2025-11-02T10:00:00Z"}"#,
        )
        .unwrap();
        assert!(record.tags.is_empty());
    }
}
