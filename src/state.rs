//! Atomic JSON state persistence.
//!
//! `save_state` writes to a temp file next to the target and renames it into
//! place, so a crash mid-write leaves either the old or the new record on
//! disk, never a torn one.

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Load a JSON state file into `T`.
///
/// Errors if the file is missing or does not parse; callers treat a missing
/// file as a cold start via `unwrap_or_default()`.
pub fn load_state<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read state file {}", path.display()))?;
    let state = serde_json::from_str(&contents)
        .wrap_err_with(|| format!("failed to parse state file {}", path.display()))?;
    Ok(state)
}

/// Save `state` as JSON at `path`, atomically.
///
/// Creates parent directories as needed. The write goes to `<path>.tmp` and
/// is renamed over the target; rename is atomic on the same filesystem.
pub fn save_state<T: Serialize>(path: &Path, state: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create state dir {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(state)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    fs::write(tmp, json)
        .wrap_err_with(|| format!("failed to write temp state file {}", tmp.display()))?;
    fs::rename(tmp, path)
        .wrap_err_with(|| format!("failed to move state file into place at {}", path.display()))?;

    Ok(())
}
