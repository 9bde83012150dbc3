//! Caller allow-list check.

use std::collections::HashSet;

/// Set-membership check of caller identities against the configured
/// `allowed_ids`. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct PermissionGate {
    allowed: HashSet<String>,
}

impl PermissionGate {
    pub fn new<I, S>(allowed_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed_ids
                .into_iter()
                .map(Into::into)
                .map(|id: String| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    pub fn is_allowed(&self, caller_id: &str) -> bool {
        self.allowed.contains(caller_id.trim())
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_is_allowed() {
        let gate = PermissionGate::new(["10001", "10002"]);
        assert!(gate.is_allowed("10001"));
        assert!(gate.is_allowed(" 10002 "));
    }

    #[test]
    fn test_non_member_is_rejected() {
        let gate = PermissionGate::new(["10001"]);
        assert!(!gate.is_allowed("10003"));
        assert!(!gate.is_allowed(""));
    }

    #[test]
    fn test_empty_list_allows_nobody() {
        let gate = PermissionGate::default();
        assert!(gate.is_empty());
        assert!(!gate.is_allowed("10001"));
    }

    #[test]
    fn test_blank_entries_are_dropped() {
        let gate = PermissionGate::new(vec!["".to_string(), "  ".to_string(), "7".to_string()]);
        assert_eq!(gate.len(), 1);
        assert!(!gate.is_allowed(""));
    }
}
