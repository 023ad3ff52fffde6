//! Adapter for the external accelerated search binary.

use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;

use crate::task::{MatchResult, PatternSpec};

use super::{EngineError, MatchingEngine};

fn key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Private: ([a-fA-F0-9]+) Address:([a-zA-Z0-9]+)").expect("valid key regex")
    })
}

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Time:\s*(\d+)s").expect("valid time regex"))
}

fn speed_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Total:\s*([\d.]+)\s*MH/s").expect("valid speed regex"))
}

/// Runs `<binary> --matching <template> --prefix-count <n> --suffix-count <n> --quit-count <n>`.
#[derive(Debug, Clone)]
pub struct ExternalEngine {
    binary: PathBuf,
    quit_count: u32,
}

impl ExternalEngine {
    pub fn new(binary: impl Into<PathBuf>, quit_count: u32) -> Self {
        Self {
            binary: binary.into(),
            quit_count,
        }
    }

    /// The bundled binary for the current platform.
    pub fn default_binary() -> PathBuf {
        let name = if cfg!(target_os = "macos") {
            "./profanity.arm64"
        } else if cfg!(target_os = "windows") {
            "./profanity.exe"
        } else {
            "./profanity.x64"
        };
        PathBuf::from(name)
    }
}

impl MatchingEngine for ExternalEngine {
    fn search(&self, spec: &PatternSpec) -> Result<MatchResult, EngineError> {
        if !self.binary.exists() {
            return Err(EngineError::MissingExecutable(self.binary.clone()));
        }

        let matching = spec.template.as_arg();
        tracing::info!(
            binary = %self.binary.display(),
            matching = %matching,
            prefix_count = spec.prefix_count,
            suffix_count = spec.suffix_count,
            quit_count = self.quit_count,
            "running external engine"
        );

        let output = Command::new(&self.binary)
            .arg("--matching")
            .arg(&matching)
            .arg("--prefix-count")
            .arg(spec.prefix_count.to_string())
            .arg("--suffix-count")
            .arg(spec.suffix_count.to_string())
            .arg("--quit-count")
            .arg(self.quit_count.to_string())
            .output()?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(EngineError::ProcessFailed {
                status: output.status,
                output: combined,
            });
        }

        tracing::debug!(output = %combined, "external engine finished");
        parse_engine_output(&combined)
    }

    fn name(&self) -> &'static str {
        "external"
    }
}

/// Extracts the key, address, and attempt estimate from engine output.
///
/// `total_generated = floor(MH/s × seconds × 1e6)`, or 0 when either
/// throughput token is missing. A missing key/address line is an error.
pub fn parse_engine_output(output: &str) -> Result<MatchResult, EngineError> {
    let captures = key_regex()
        .captures(output)
        .ok_or_else(|| EngineError::Parse(output.to_string()))?;

    let seconds = time_regex()
        .captures(output)
        .and_then(|c| c[1].parse::<i64>().ok());
    let speed = speed_regex()
        .captures(output)
        .and_then(|c| c[1].parse::<f64>().ok());

    let total_generated = match (seconds, speed) {
        (Some(seconds), Some(speed)) => (speed * seconds as f64 * 1_000_000.0).floor() as i64,
        _ => 0,
    };

    Ok(MatchResult {
        private_key: captures[1].to_string(),
        address: captures[2].to_string(),
        total_generated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::classify_custom;
    #[cfg(unix)]
    use std::path::Path;

    const SAMPLE: &str = "\
Devices:
  GPU0: Apple M2, 17179869184 bytes available, 10 compute units
Initializing OpenCL...
  Time: 8s Score: 4 Private: ab12cd34 Address:TXYZ999
Total: 15.619 MH/s - GPU0: 15.619 MH/s
";

    #[test]
    fn test_parse_full_output() {
        let result = parse_engine_output(SAMPLE).unwrap();
        assert_eq!(result.private_key, "ab12cd34");
        assert_eq!(result.address, "TXYZ999");
        assert_eq!(result.total_generated, 124_952_000);
    }

    #[test]
    fn test_parse_without_throughput() {
        let result = parse_engine_output("Private: ff00 Address:Tabc").unwrap();
        assert_eq!(result.private_key, "ff00");
        assert_eq!(result.total_generated, 0);
    }

    #[test]
    fn test_parse_missing_key_is_error() {
        let err = parse_engine_output("Time: 8s\nTotal: 15.619 MH/s\n").unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }

    #[test]
    fn test_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ExternalEngine::new(dir.path().join("profanity.x64"), 1);
        let spec = classify_custom("TABC-8888").unwrap();

        let err = engine.search(&spec).unwrap_err();
        assert!(matches!(err, EngineError::MissingExecutable(_)));
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-engine");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_binary_with_contract_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let spec = classify_custom("TABC-8888").unwrap();
        let expected = format!(
            "--matching {} --prefix-count 4 --suffix-count 4 --quit-count 1",
            spec.template.as_arg()
        );
        let script = write_script(
            dir.path(),
            &format!(
                "[ \"$*\" = \"{expected}\" ] || exit 9\n\
                 echo 'Time: 2s Private: 0a0b Address:TABCxyz'\n\
                 echo 'Total: 1.5 MH/s' >&2"
            ),
        );
        let engine = ExternalEngine::new(&script, 1);

        let result = engine.search(&spec).unwrap();
        assert_eq!(result.private_key, "0a0b");
        assert_eq!(result.address, "TABCxyz");
        assert_eq!(result.total_generated, 3_000_000);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo 'no device' >&2\nexit 3");
        let engine = ExternalEngine::new(&script, 1);
        let spec = classify_custom("TABC-8888").unwrap();

        match engine.search(&spec).unwrap_err() {
            EngineError::ProcessFailed { output, .. } => assert!(output.contains("no device")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unparseable_output_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo 'Total: 9.0 MH/s'");
        let engine = ExternalEngine::new(&script, 1);
        let spec = classify_custom("TABC-8888").unwrap();

        assert!(matches!(
            engine.search(&spec).unwrap_err(),
            EngineError::Parse(_)
        ));
    }
}
