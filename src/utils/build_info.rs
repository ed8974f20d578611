/// Compile-time build metadata produced by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildMetadata {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

impl BuildMetadata {
    /// One-line summary printed by the `version` command.
    pub fn summary(&self) -> String {
        format!(
            "debtor_core {} ({} {}, {} build for {})",
            self.version, self.git_hash, self.timestamp, self.profile, self.target
        )
    }
}

pub fn current() -> BuildMetadata {
    BuildMetadata {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("DEBTOR_CORE_BUILD_HASH").unwrap_or("unknown"),
        timestamp: option_env!("DEBTOR_CORE_BUILD_TIMESTAMP").unwrap_or("unknown"),
        target: option_env!("DEBTOR_CORE_BUILD_TARGET").unwrap_or("unknown"),
        profile: option_env!("DEBTOR_CORE_BUILD_PROFILE").unwrap_or("unknown"),
        rustc: option_env!("DEBTOR_CORE_BUILD_RUSTC").unwrap_or("unknown"),
    }
}
