use std::fmt;

/// State of a managed symlink compared with its manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Symlink exists and points at the entry content
    Valid,
    /// Nothing at the user path
    NotExists,
    /// Path exists but is not a symlink
    NotSymlink,
    /// Symlink points somewhere else
    WrongTarget,
    /// Symlink target cannot be read
    Unresolvable,
}

impl LinkStatus {
    /// Human-readable reason for this status.
    pub fn reason(&self) -> &'static str {
        match self {
            LinkStatus::Valid => "valid",
            LinkStatus::NotExists => "does not exist",
            LinkStatus::NotSymlink => "not a symlink",
            LinkStatus::WrongTarget => "points to different location",
            LinkStatus::Unresolvable => "cannot resolve target",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, LinkStatus::Valid)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}
