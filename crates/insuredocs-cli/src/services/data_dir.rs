// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::{Path, PathBuf};

use insuredocs_core::error::Result;

/// Resolve the data directory and create it if needed.
///
/// An explicit `override_dir` wins; otherwise `$XDG_DATA_HOME/insuredocs`,
/// then `~/.local/share/insuredocs`.
pub fn data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs_fallback().join("insuredocs"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn dirs_fallback() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from("/tmp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_is_created() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let wanted = tmp.path().join("nested").join("data");
        let dir = data_dir(Some(&wanted)).expect("data dir");
        assert_eq!(dir, wanted);
        assert!(dir.is_dir());
    }

    #[test]
    fn absolute_paths_are_kept() {
        let base = Path::new("/srv/insuredocs");
        assert_eq!(resolve(base, Path::new("db.sqlite")), base.join("db.sqlite"));
        assert_eq!(resolve(base, Path::new("/var/db.sqlite")), PathBuf::from("/var/db.sqlite"));
    }
}
