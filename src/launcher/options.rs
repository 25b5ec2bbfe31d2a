//! Launch flags and configuration.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

// ============================================================================
// LaunchOptions
// ============================================================================

/// Configuration for spawning a Chrome process.
///
/// # Example
///
/// ```ignore
/// let options = LaunchOptions {
///     headless: false,
///     extra_args: vec!["--window-size=1280,720".to_string()],
///     ..LaunchOptions::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Explicit executable path; discovered via [`super::find_chrome`] when
    /// absent.
    pub executable: Option<PathBuf>,

    /// Run without a visible window.
    pub headless: bool,

    /// Debugging port; 0 lets Chrome pick one (reported in the endpoint
    /// line).
    pub port: u16,

    /// Profile directory; a temporary one is created and cleaned up when
    /// absent.
    pub user_data_dir: Option<PathBuf>,

    /// Additional command-line flags, appended verbatim.
    pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            port: 0,
            user_data_dir: None,
            extra_args: Vec::new(),
        }
    }
}

impl LaunchOptions {
    /// Builds the argument list, minus the user-data-dir flag which the
    /// launcher adds once the directory is known.
    #[must_use]
    pub(crate) fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.port),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-background-networking".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = LaunchOptions::default().to_args();
        assert!(args.contains(&"--remote-debugging-port=0".to_string()));
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--no-first-run".to_string()));
    }

    #[test]
    fn test_headful_omits_headless_flag() {
        let options = LaunchOptions {
            headless: false,
            ..LaunchOptions::default()
        };
        assert!(!options.to_args().iter().any(|a| a.starts_with("--headless")));
    }

    #[test]
    fn test_extra_args_are_appended() {
        let options = LaunchOptions {
            extra_args: vec!["--mute-audio".to_string()],
            ..LaunchOptions::default()
        };
        assert_eq!(options.to_args().last().unwrap(), "--mute-audio");
    }
}
