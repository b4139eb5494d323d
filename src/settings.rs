use log::warn;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_INTERPRETER: &str = "python";
pub const DEFAULT_SCRIPT: &str = "run_ootd.py";
pub const DEFAULT_OUTPUT_IMAGE: &str = "images_output/out_hd_0.png";
pub const DEFAULT_TOTAL_LINES: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPolicy {
    /// Block the calling thread until the script exits.
    Blocking,
    /// Read the script's stdout on a worker and report progress.
    Streaming,
}

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub interpreter: String,
    pub script: String,
    pub working_dir: Option<PathBuf>,
    pub(crate) output_image: PathBuf,
    // Guess at how many lines the script prints, used for line-count progress
    pub assumed_total_lines: u32,
    pub policy: ExecutionPolicy,
    pub debug: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            script: DEFAULT_SCRIPT.to_string(),
            working_dir: None,
            output_image: PathBuf::from(DEFAULT_OUTPUT_IMAGE),
            assumed_total_lines: DEFAULT_TOTAL_LINES,
            policy: ExecutionPolicy::Streaming,
            debug: false,
        }
    }
}

impl RunnerSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(interpreter) = lookup("OOTD_PYTHON").filter(|v| !v.is_empty()) {
            settings.interpreter = interpreter;
        }
        if let Some(script) = lookup("OOTD_SCRIPT").filter(|v| !v.is_empty()) {
            settings.script = script;
        }
        settings.working_dir = lookup("OOTD_WORKDIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        if let Some(output) = lookup("OOTD_OUTPUT_IMAGE").filter(|v| !v.is_empty()) {
            settings.output_image = PathBuf::from(output);
        }
        if let Some(raw) = lookup("OOTD_TOTAL_LINES") {
            match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => settings.assumed_total_lines = n,
                _ => warn!(
                    "Ignoring OOTD_TOTAL_LINES={:?}, using {}",
                    raw, DEFAULT_TOTAL_LINES
                ),
            }
        }
        if lookup("OOTD_SYNC").is_some_and(|v| v == "1") {
            settings.policy = ExecutionPolicy::Blocking;
        }
        settings.debug = lookup("DEBUG").is_some_and(|v| v == "1");

        settings
    }

    /// Where the script leaves its result. Relative paths are taken from the
    /// child's working directory.
    pub fn output_image_path(&self) -> PathBuf {
        match &self.working_dir {
            Some(dir) if self.output_image.is_relative() => dir.join(&self.output_image),
            _ => self.output_image.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> RunnerSettings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RunnerSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let settings = settings_from(&[]);
        assert_eq!(settings.interpreter, "python");
        assert_eq!(settings.script, "run_ootd.py");
        assert_eq!(settings.assumed_total_lines, 100);
        assert_eq!(settings.policy, ExecutionPolicy::Streaming);
        assert!(!settings.debug);
        assert_eq!(
            settings.output_image_path(),
            PathBuf::from("images_output/out_hd_0.png")
        );
    }

    #[test]
    fn overrides_from_environment() {
        let settings = settings_from(&[
            ("OOTD_PYTHON", "python3"),
            ("OOTD_SCRIPT", "scripts/run_ootd.py"),
            ("OOTD_TOTAL_LINES", "250"),
            ("OOTD_SYNC", "1"),
            ("DEBUG", "1"),
        ]);
        assert_eq!(settings.interpreter, "python3");
        assert_eq!(settings.script, "scripts/run_ootd.py");
        assert_eq!(settings.assumed_total_lines, 250);
        assert_eq!(settings.policy, ExecutionPolicy::Blocking);
        assert!(settings.debug);
    }

    #[test]
    fn bad_line_total_falls_back() {
        assert_eq!(settings_from(&[("OOTD_TOTAL_LINES", "0")]).assumed_total_lines, 100);
        assert_eq!(settings_from(&[("OOTD_TOTAL_LINES", "lots")]).assumed_total_lines, 100);
    }

    #[test]
    fn relative_output_resolves_against_workdir() {
        let settings = settings_from(&[("OOTD_WORKDIR", "/opt/ootd/run")]);
        assert_eq!(
            settings.output_image_path(),
            PathBuf::from("/opt/ootd/run/images_output/out_hd_0.png")
        );
    }

    #[cfg(unix)]
    #[test]
    fn absolute_output_ignores_workdir() {
        let settings = settings_from(&[
            ("OOTD_WORKDIR", "/opt/ootd/run"),
            ("OOTD_OUTPUT_IMAGE", "/tmp/out.png"),
        ]);
        assert_eq!(settings.output_image_path(), PathBuf::from("/tmp/out.png"));
    }
}
