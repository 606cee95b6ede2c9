//! Host platform naming used by the tool cache and the release channel.
//!
//! The tool cache keys entries by the pipeline runner's architecture names
//! (`x64`, `arm64`, ...) while the release channel uses Go's `GOOS`/`GOARCH`
//! names (`linux/amd64`, `darwin/arm64`, ...).

use std::env::consts;

pub const KUBECTL: &str = "kubectl";

/// `.exe` on Windows, empty elsewhere.
pub fn executable_extension() -> &'static str {
    consts::EXE_SUFFIX
}

/// File name of `tool` on this platform, e.g. `kubectl.exe` on Windows.
pub fn binary_name(tool: &str) -> String {
    format!("{tool}{}", executable_extension())
}

/// Architecture segment of tool cache paths.
pub fn cache_arch() -> &'static str {
    cache_arch_for(consts::ARCH)
}

pub fn cache_arch_for(arch: &'static str) -> &'static str {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "x86",
        "arm" => "arm",
        other => other,
    }
}

/// Operating system segment of release download URLs.
pub fn download_os() -> &'static str {
    download_os_for(consts::OS)
}

pub fn download_os_for(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Architecture segment of release download URLs.
pub fn download_arch() -> &'static str {
    download_arch_for(consts::ARCH)
}

pub fn download_arch_for(arch: &'static str) -> &'static str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_name_carries_platform_suffix() {
        let name = binary_name(KUBECTL);
        if cfg!(windows) {
            assert_eq!(name, "kubectl.exe");
        } else {
            assert_eq!(name, "kubectl");
        }
    }

    #[test]
    fn arch_names_follow_each_convention() {
        assert_eq!(cache_arch_for("x86_64"), "x64");
        assert_eq!(cache_arch_for("aarch64"), "arm64");
        assert_eq!(download_arch_for("x86_64"), "amd64");
        assert_eq!(download_arch_for("x86"), "386");
        assert_eq!(download_arch_for("riscv64"), "riscv64");
    }

    #[test]
    fn macos_downloads_as_darwin() {
        assert_eq!(download_os_for("macos"), "darwin");
        assert_eq!(download_os_for("linux"), "linux");
        assert_eq!(download_os_for("windows"), "windows");
    }
}
