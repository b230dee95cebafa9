//! Output abstraction for quiet mode support.
//!
//! Reports and requested data always print; summaries and hints are
//! suppressed in quiet mode.

/// Output handler that respects quiet mode.
///
/// Quiet mode is enabled if either `--quiet` is passed or `--json-errors` is used.
#[derive(Debug, Clone)]
pub struct Output {
    quiet: bool,
}

impl Output {
    #[must_use]
    pub const fn new(quiet: bool, json_errors: bool) -> Self {
        Self {
            quiet: quiet || json_errors,
        }
    }

    /// Print informational message (suppressed in quiet mode).
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet {
            println!("{msg}");
        }
    }

    /// Print success message (suppressed in quiet mode), e.g. "Project initialised".
    pub fn success(&self, msg: impl std::fmt::Display) {
        if !self.quiet {
            println!("{msg}");
        }
    }

    /// Print tip or hint (suppressed in quiet mode).
    pub fn tip(&self, msg: impl std::fmt::Display) {
        if !self.quiet {
            println!("{msg}");
        }
    }

    /// Print requested data; never suppressed.
    #[allow(clippy::unused_self)]
    pub fn data(&self, msg: impl std::fmt::Display) {
        println!("{msg}");
    }

    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_mode_from_quiet_flag() {
        assert!(Output::new(true, false).is_quiet());
    }

    #[test]
    fn test_quiet_mode_from_json_errors() {
        assert!(Output::new(false, true).is_quiet());
    }

    #[test]
    fn test_not_quiet_when_no_flags() {
        assert!(!Output::new(false, false).is_quiet());
    }
}
