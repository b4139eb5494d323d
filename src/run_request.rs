use crate::error::RunError;
use crate::settings::RunnerSettings;

use std::path::PathBuf;

/// Snapshot of the form fields taken when Run is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub model_path: String,
    pub cloth_path: String,
    pub scale: String,
    pub sample: String,
}

impl RunRequest {
    /// Both paths must be set. Scale and sample go through as typed.
    pub fn new(
        model_path: &str,
        cloth_path: &str,
        scale: &str,
        sample: &str,
    ) -> Result<Self, RunError> {
        if model_path.is_empty() || cloth_path.is_empty() {
            return Err(RunError::MissingInput);
        }
        Ok(Self {
            model_path: model_path.to_string(),
            cloth_path: cloth_path.to_string(),
            scale: scale.to_string(),
            sample: sample.to_string(),
        })
    }

    // No quoting: the values reach the shell exactly as entered.
    pub fn command_line(&self, settings: &RunnerSettings) -> String {
        format!(
            "{} {} --model_path {} --cloth_path {} --scale {} --sample {}",
            settings.interpreter,
            settings.script,
            self.model_path,
            self.cloth_path,
            self.scale,
            self.sample
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    pub output_image: PathBuf,
}

impl RunOutcome {
    pub fn new(success: bool, settings: &RunnerSettings) -> Self {
        Self {
            success,
            output_image: settings.output_image_path(),
        }
    }
}
