//! # Configuration
//!
//! The handful of deployment-specific values the identity engine needs,
//! passed in explicitly at construction time. There is no process-global
//! registry here on purpose: every [`crate::did::Did`] gets its
//! [`PlcConfig`] handed to it, so tests and multi-tenant hosts can run
//! several configurations side by side.

/// The public PLC directory.
pub const DEFAULT_DIRECTORY_URL: &str = "https://plc.directory";

/// Service id under which the package repository endpoint is advertised
/// in the DID document.
pub const SERVICE_ID_PACKAGE_REPO: &str = "fairpm_repo";

/// Service type tag for the package repository endpoint.
pub const SERVICE_TYPE_PACKAGE_REPO: &str = "FairPackageManagementRepo";

/// Deployment configuration for the identity engine.
#[derive(Debug, Clone)]
pub struct PlcConfig {
    /// Base URL of the PLC directory.
    pub directory_url: String,
    /// Base URL of this host's package metadata API; the per-identity
    /// service endpoint is `<packages_url>/<did>`.
    pub packages_url: String,
}

impl PlcConfig {
    /// Configuration against the public directory with the given
    /// package API base.
    pub fn new(packages_url: &str) -> Self {
        Self {
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            packages_url: packages_url.trim_end_matches('/').to_string(),
        }
    }

    /// Override the directory URL (testing, staging mirrors).
    pub fn with_directory(mut self, directory_url: &str) -> Self {
        self.directory_url = directory_url.trim_end_matches('/').to_string();
        self
    }

    /// The package repository endpoint advertised for `did`.
    pub fn repo_endpoint(&self, did: &str) -> String {
        format!("{}/{}", self.packages_url, did)
    }
}
