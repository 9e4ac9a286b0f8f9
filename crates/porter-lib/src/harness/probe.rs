//! Toolchain presence probes

use std::process::Command;

/// Answers whether an executable is installed
pub trait ToolchainProbe {
    fn is_available(&self, executable: &str) -> bool;
}

/// Looks the executable up on `PATH`
#[derive(Debug, Clone, Copy, Default)]
pub struct PathProbe;

impl ToolchainProbe for PathProbe {
    fn is_available(&self, executable: &str) -> bool {
        which::which(executable).is_ok()
    }
}

/// Asks the shell via `hash`, for environments where the shell's lookup
/// differs from `PATH` (aliases, functions)
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellProbe;

impl ShellProbe {
    fn script(executable: &str) -> String {
        format!(
            "if hash {} 2>/dev/null; then echo 1; else echo 0; fi",
            executable
        )
    }
}

impl ToolchainProbe for ShellProbe {
    fn is_available(&self, executable: &str) -> bool {
        // the name is interpolated into a script
        if !executable
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return false;
        }
        match Command::new("sh").arg("-c").arg(Self::script(executable)).output() {
            Ok(output) => available(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => {
                tracing::debug!(executable, error = %e, "Shell probe could not start sh");
                false
            }
        }
    }
}

/// The probe prints `1` when the executable exists
fn available(stdout: &str) -> bool {
    stdout.trim() == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_compared_by_value() {
        assert!(available("1\n"));
        assert!(available(&format!("{}{}", " ", "1")));
        assert!(!available("0\n"));
        assert!(!available("11"));
        assert!(!available(""));
    }

    #[test]
    fn test_path_probe_rejects_nonsense() {
        assert!(!PathProbe.is_available("porter-no-such-tool-4f2a"));
    }

    #[test]
    fn test_shell_probe_rejects_unsafe_names() {
        assert!(!ShellProbe.is_available("gcc; rm -rf /"));
        assert!(!ShellProbe.is_available("porter-no-such-tool-4f2a"));
    }

    #[cfg(unix)]
    #[test]
    fn test_probes_agree_on_sh() {
        assert!(PathProbe.is_available("sh"));
        assert!(ShellProbe.is_available("sh"));
    }
}
