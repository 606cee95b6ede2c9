use std::path::{Path, PathBuf};

/// Resolve the directory relative manifest paths are read from.
///
/// Priority:
/// 1. `--workdir` flag / `GITHUB_WORKSPACE` env var (passed in as `explicit`)
/// 2. The current directory
/// 3. `.` if the current directory is gone
pub fn resolve_workdir(explicit: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match explicit {
        Some(p) if p.as_os_str().is_empty() => cwd,
        Some(p) if p.is_relative() => cwd.join(p),
        Some(p) => p.to_path_buf(),
        None => cwd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_workdir_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_workdir(Some(dir.path())), dir.path());
    }

    #[test]
    fn relative_workdir_is_anchored_at_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolve_workdir(Some(Path::new("deploy"))), cwd.join("deploy"));
    }

    #[test]
    fn empty_or_missing_falls_back_to_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolve_workdir(None), cwd);
        assert_eq!(resolve_workdir(Some(Path::new(""))), cwd);
    }
}
