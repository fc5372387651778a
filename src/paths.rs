//! Path expansion for config values
//!
//! Config paths may use `~` and `$VAR`/`${VAR}`. Expansion against an
//! explicit home directory keeps tasks testable without touching `$HOME`.

use std::path::{Path, PathBuf};

/// Expand `~` against `home` and environment variables from the process.
///
/// Unknown variables are left as written.
pub fn expand_with_home(path: &str, home: &Path) -> PathBuf {
    let home = home.to_string_lossy().into_owned();
    let expanded = shellexpand::full_with_context_no_errors(
        path,
        || Some(home),
        |var: &str| std::env::var(var).ok(),
    );
    PathBuf::from(expanded.as_ref())
}

/// The user's home directory, falling back to `/root`
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"))
}
