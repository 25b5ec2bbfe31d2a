//! Best-effort Chrome executable discovery.

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::path::PathBuf;

use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// Names resolvable through `PATH`.
const PATH_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Well-known absolute install locations.
#[cfg(target_os = "linux")]
const ABSOLUTE_CANDIDATES: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

#[cfg(target_os = "macos")]
const ABSOLUTE_CANDIDATES: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(target_os = "windows")]
const ABSOLUTE_CANDIDATES: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const ABSOLUTE_CANDIDATES: &[&str] = &[];

// ============================================================================
// find_chrome
// ============================================================================

/// Returns a best-effort path to a Chrome executable.
///
/// Checks `CHROME_PATH`, then well-known install locations, then `PATH`.
/// `None` means nothing was found; callers surface that as a configuration
/// error.
#[must_use]
pub fn find_chrome() -> Option<PathBuf> {
    if let Ok(path) = env::var("CHROME_PATH") {
        let path = PathBuf::from(path);
        if path.is_file() {
            debug!(path = %path.display(), "Using CHROME_PATH");
            return Some(path);
        }
    }

    for candidate in ABSOLUTE_CANDIDATES {
        let path = PathBuf::from(candidate);
        if path.is_file() {
            debug!(path = %path.display(), "Found Chrome at known location");
            return Some(path);
        }
    }

    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        for name in PATH_CANDIDATES {
            let path = dir.join(name);
            if path.is_file() {
                debug!(path = %path.display(), "Found Chrome on PATH");
                return Some(path);
            }
        }
    }

    None
}

// ============================================================================
// Tests
// ============================================================================
