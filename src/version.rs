use crate::error::Error;

/// A predicate over the configured backend version. `None` means no backend
/// was configured and every gate passes; this favors the widest default
/// surface at the cost of possibly emitting a feature the actual server is
/// too old for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionGate {
    version: Option<(u32, u32)>,
}

impl VersionGate {
    pub fn new(version: Option<(u32, u32)>) -> Self {
        VersionGate { version }
    }

    pub fn at(major: u32, minor: u32) -> Self {
        VersionGate {
            version: Some((major, minor)),
        }
    }

    /// Permissive gate: no configured backend.
    pub fn any() -> Self {
        VersionGate { version: None }
    }

    pub fn version(&self) -> Option<(u32, u32)> {
        self.version
    }

    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        match self.version {
            None => true,
            Some(v) => v >= (major, minor),
        }
    }

    /// For rules with no generic fallback: a too-old backend is a hard,
    /// user-facing error naming the minimum version, never silently wrong
    /// SQL.
    pub fn require(&self, major: u32, minor: u32, feature: &'static str) -> Result<(), Error> {
        if self.at_least(major, minor) {
            Ok(())
        } else {
            Err(Error::MinimumVersion {
                feature,
                major,
                minor,
            })
        }
    }
}
