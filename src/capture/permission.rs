//! Camera permission gate.

use super::PermissionPolicy;

/// Runtime permission check for the camera.
pub trait PermissionGate {
    /// Returns true if the camera permission is currently held.
    fn is_granted(&self) -> bool;

    /// Asks for the permission and returns whether it was granted.
    fn request(&mut self) -> bool;
}

/// Permission gate driven by a fixed [`PermissionPolicy`].
#[derive(Debug, Clone)]
pub struct StaticPermission {
    policy: PermissionPolicy,
    granted: bool,
}

impl StaticPermission {
    /// Creates a gate following `policy`.
    pub fn new(policy: PermissionPolicy) -> Self {
        Self {
            policy,
            granted: policy == PermissionPolicy::Granted,
        }
    }
}

impl PermissionGate for StaticPermission {
    fn is_granted(&self) -> bool {
        self.granted
    }

    fn request(&mut self) -> bool {
        self.granted = match self.policy {
            PermissionPolicy::Granted | PermissionPolicy::GrantOnRequest => true,
            PermissionPolicy::Denied => false,
        };
        tracing::debug!(policy = ?self.policy, granted = self.granted, "Camera permission requested");
        self.granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_on_request_is_remembered() {
        let mut gate = StaticPermission::new(PermissionPolicy::GrantOnRequest);
        assert!(!gate.is_granted());
        assert!(gate.request());
        assert!(gate.is_granted());
    }

    #[test]
    fn test_denied_never_grants() {
        let mut gate = StaticPermission::new(PermissionPolicy::Denied);
        assert!(!gate.request());
        assert!(!gate.request());
        assert!(!gate.is_granted());
    }

    #[test]
    fn test_granted_up_front() {
        let gate = StaticPermission::new(PermissionPolicy::Granted);
        assert!(gate.is_granted());
    }
}
