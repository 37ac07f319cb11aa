//! Execution identity for in-container processes.

use crate::error::RunnerError;

/// Effective user and group of the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostIdentity {
    pub uid: u32,
    pub gid: u32,
}

impl HostIdentity {
    /// Reads the effective UID and GID of the calling process.
    pub fn current() -> Self {
        // SAFETY: geteuid/getegid cannot fail and touch no memory we own.
        let uid = unsafe { libc::geteuid() };
        let gid = unsafe { libc::getegid() };
        Self { uid, gid }
    }

    /// Formats the identity the way Docker expects it.
    pub fn as_user(&self) -> String {
        format!("{}:{}", self.uid, self.gid)
    }
}

/// Picks the user a container runs as.
///
/// An explicit user is passed through unchanged. Without one, the host's
/// effective identity is used so files written into the mounted case are
/// owned by the caller instead of the image's default user.
pub fn resolve_user(user: Option<&str>) -> Result<String, RunnerError> {
    match user {
        Some(user) => {
            let user = user.trim();
            if user.is_empty() {
                return Err(RunnerError::Config("user cannot be empty".to_string()));
            }
            Ok(user.to_string())
        }
        None => Ok(HostIdentity::current().as_user()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_user_defaults_to_host() {
        let expected = HostIdentity::current().as_user();
        assert_eq!(resolve_user(None).expect("resolve"), expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_host_identity_owns_new_files() {
        use std::os::unix::fs::MetadataExt;

        let file = tempfile::NamedTempFile::new().expect("tempfile");
        let meta = file.as_file().metadata().expect("metadata");
        assert_eq!(HostIdentity::current().uid, meta.uid());
    }

    #[test]
    fn test_resolve_user_explicit() {
        assert_eq!(resolve_user(Some("1000:1000")).expect("resolve"), "1000:1000");
        assert_eq!(resolve_user(Some(" root ")).expect("resolve"), "root");
    }

    #[test]
    fn test_resolve_user_rejects_blank() {
        assert!(matches!(resolve_user(Some("  ")), Err(RunnerError::Config(_))));
    }

    #[test]
    fn test_host_identity_format() {
        let identity = HostIdentity { uid: 1001, gid: 100 };
        assert_eq!(identity.as_user(), "1001:100");
    }
}
