use crate::console_command::RunnerEvent;
use crate::error::RunError;
use crate::run_request::{RunOutcome, RunRequest};
use crate::settings::RunnerSettings;

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running { dots: u8 },
    Complete,
    Failed,
}

impl Status {
    pub fn text(&self) -> String {
        match self {
            Status::Idle => String::new(),
            Status::Running { dots } => format!("Loading{}", ".".repeat(*dots as usize)),
            Status::Complete => "Complete!".to_string(),
            Status::Failed => "Error occurred".to_string(),
        }
    }

    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            Status::Idle => None,
            Status::Running { .. } => Some("status-running"),
            Status::Complete => Some("status-success"),
            Status::Failed => Some("status-error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Model,
    Cloth,
}

impl InputKind {
    pub fn dialog_title(&self) -> &'static str {
        match self {
            InputKind::Model => "Select Model File",
            InputKind::Cloth => "Select Cloth File",
        }
    }

    fn label_prefix(&self) -> &'static str {
        match self {
            InputKind::Model => "Model Path",
            InputKind::Cloth => "Cloth Path",
        }
    }
}

/// What the window has to do once a run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub status: Status,
    pub image: Option<PathBuf>,
}

/// Everything the window shows that is not read back from a widget.
/// Lives on the GTK thread only.
#[derive(Debug)]
pub struct AppState {
    pub settings: RunnerSettings,
    model_path: String,
    cloth_path: String,
    run_enabled: bool,
    status: Status,
    marker_progress: Option<i32>,
    line_progress: u32,
}

impl AppState {
    pub fn new(settings: RunnerSettings) -> Self {
        Self {
            settings,
            model_path: String::new(),
            cloth_path: String::new(),
            run_enabled: true,
            status: Status::Idle,
            marker_progress: None,
            line_progress: 0,
        }
    }

    pub fn path(&self, kind: InputKind) -> &str {
        match kind {
            InputKind::Model => &self.model_path,
            InputKind::Cloth => &self.cloth_path,
        }
    }

    pub fn path_label(&self, kind: InputKind) -> String {
        let path = self.path(kind);
        if path.is_empty() {
            format!("{}: Not Selected", kind.label_prefix())
        } else {
            format!("{}: {}", kind.label_prefix(), path)
        }
    }

    /// `None` means the chooser was cancelled. Returns whether the path changed.
    pub fn select(&mut self, kind: InputKind, chosen: Option<String>) -> bool {
        let Some(path) = chosen.filter(|p| !p.is_empty()) else {
            return false;
        };
        match kind {
            InputKind::Model => self.model_path = path,
            InputKind::Cloth => self.cloth_path = path,
        }
        true
    }

    pub fn run_enabled(&self) -> bool {
        self.run_enabled
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, Status::Running { .. })
    }

    /// Validates the paths and moves into the running state. On error
    /// nothing is changed.
    pub fn begin_run(&mut self, scale: &str, sample: &str) -> Result<String, RunError> {
        let request = RunRequest::new(&self.model_path, &self.cloth_path, scale, sample)?;
        let command = request.command_line(&self.settings);
        self.run_enabled = false;
        self.status = Status::Running { dots: 1 };
        self.marker_progress = None;
        self.line_progress = 0;
        Ok(command)
    }

    /// Advances the loading animation, `Loading.` to `Loading...` and around.
    pub fn tick(&mut self) -> Option<Status> {
        match &mut self.status {
            Status::Running { dots } => {
                *dots = (*dots % 3) + 1;
                Some(self.status)
            }
            _ => None,
        }
    }

    /// Applies a progress event and returns the bar fraction to show.
    pub fn record_progress(&mut self, event: &RunnerEvent) -> Option<f64> {
        if !self.is_running() {
            return None;
        }
        match event {
            RunnerEvent::Progress(value) => self.marker_progress = Some(*value),
            RunnerEvent::LineProgress(value) => self.line_progress = *value,
            _ => return None,
        }
        Some(self.progress_fraction())
    }

    /// Marker progress from the script wins over the line-count guess.
    pub fn progress_fraction(&self) -> f64 {
        let percent = match self.marker_progress {
            Some(value) => value.clamp(0, 100) as f64,
            None => self.line_progress.min(100) as f64,
        };
        percent / 100.0
    }

    /// Ends the current run. Returns `None` if no run is in flight, so a run
    /// re-enables the trigger only once.
    pub fn finish(&mut self, outcome: &RunOutcome) -> Option<Completion> {
        if !self.is_running() {
            return None;
        }
        self.run_enabled = true;
        if outcome.success {
            self.status = Status::Complete;
            let image = Some(outcome.output_image.clone()).filter(|path| path.exists());
            Some(Completion {
                status: self.status,
                image,
            })
        } else {
            self.status = Status::Failed;
            Some(Completion {
                status: self.status,
                image: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ready_state() -> AppState {
        let mut state = AppState::new(RunnerSettings::default());
        state.select(InputKind::Model, Some("M".to_string()));
        state.select(InputKind::Cloth, Some("C".to_string()));
        state
    }

    #[test]
    fn run_without_paths_changes_nothing() {
        let mut state = AppState::new(RunnerSettings::default());
        assert!(matches!(state.begin_run("2.0", "1"), Err(RunError::MissingInput)));
        assert!(state.run_enabled());
        assert_eq!(state.status(), Status::Idle);

        state.select(InputKind::Model, Some("M".to_string()));
        assert!(state.begin_run("2.0", "1").is_err());
        assert!(state.run_enabled());
        assert!(!state.is_running());
    }

    #[test]
    fn begin_run_builds_command_and_disables_trigger() {
        let mut state = ready_state();
        let command = state.begin_run("2.0", "1").unwrap();
        assert_eq!(
            command,
            "python run_ootd.py --model_path M --cloth_path C --scale 2.0 --sample 1"
        );
        assert!(!state.run_enabled());
        assert_eq!(state.status().text(), "Loading.");
        assert_eq!(state.status().css_class(), Some("status-running"));
    }

    #[test]
    fn cancelled_chooser_keeps_previous_path() {
        let mut state = AppState::new(RunnerSettings::default());
        assert!(state.select(InputKind::Model, Some("/img/person.png".to_string())));
        assert!(!state.select(InputKind::Model, None));
        assert_eq!(state.path(InputKind::Model), "/img/person.png");
        assert_eq!(state.path_label(InputKind::Model), "Model Path: /img/person.png");
        assert_eq!(state.path_label(InputKind::Cloth), "Cloth Path: Not Selected");
    }

    #[test]
    fn loading_dots_cycle() {
        let mut state = ready_state();
        assert_eq!(state.tick(), None);
        state.begin_run("2.0", "1").unwrap();
        let texts: Vec<String> = (0..4).map(|_| state.tick().unwrap().text()).collect();
        assert_eq!(texts, ["Loading..", "Loading...", "Loading.", "Loading.."]);
    }

    #[test]
    fn success_loads_existing_output() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"png").unwrap();
        let outcome = RunOutcome {
            success: true,
            output_image: file.path().to_path_buf(),
        };

        let mut state = ready_state();
        state.begin_run("2.0", "1").unwrap();
        let completion = state.finish(&outcome).unwrap();
        assert_eq!(completion.status, Status::Complete);
        assert_eq!(completion.image.as_deref(), Some(file.path()));
        assert_eq!(completion.status.text(), "Complete!");
        assert_eq!(completion.status.css_class(), Some("status-success"));
        assert!(state.run_enabled());
    }

    #[test]
    fn success_without_output_shows_no_image() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = RunOutcome {
            success: true,
            output_image: dir.path().join("missing.png"),
        };
        let mut state = ready_state();
        state.begin_run("2.0", "1").unwrap();
        let completion = state.finish(&outcome).unwrap();
        assert_eq!(completion.status, Status::Complete);
        assert_eq!(completion.image, None);
    }

    #[test]
    fn failure_never_loads_image() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let outcome = RunOutcome {
            success: false,
            output_image: file.path().to_path_buf(),
        };
        let mut state = ready_state();
        state.begin_run("2.0", "1").unwrap();
        let completion = state.finish(&outcome).unwrap();
        assert_eq!(completion.status, Status::Failed);
        assert_eq!(completion.image, None);
        assert_eq!(completion.status.text(), "Error occurred");
        assert_eq!(completion.status.css_class(), Some("status-error"));
        assert!(state.run_enabled());
    }

    #[test]
    fn trigger_reenabled_once_per_run() {
        let outcome = RunOutcome::new(false, &RunnerSettings::default());
        let mut state = ready_state();
        state.begin_run("2.0", "1").unwrap();
        assert!(state.finish(&outcome).is_some());
        assert!(state.finish(&outcome).is_none());
        assert!(state.run_enabled());
    }

    #[test]
    fn marker_progress_overrides_line_count() {
        let mut state = ready_state();
        state.begin_run("2.0", "1").unwrap();
        assert_eq!(state.record_progress(&RunnerEvent::LineProgress(10)), Some(0.1));
        assert_eq!(state.record_progress(&RunnerEvent::Progress(42)), Some(0.42));
        assert_eq!(state.record_progress(&RunnerEvent::LineProgress(90)), Some(0.42));
        assert_eq!(state.record_progress(&RunnerEvent::Progress(250)), Some(1.0));
        assert_eq!(state.record_progress(&RunnerEvent::Line("x".to_string())), None);
    }

    #[test]
    fn progress_after_finish_is_dropped() {
        let mut state = ready_state();
        state.begin_run("2.0", "1").unwrap();
        state.finish(&RunOutcome::new(true, &RunnerSettings::default()));
        assert_eq!(state.record_progress(&RunnerEvent::Progress(50)), None);
    }
}
