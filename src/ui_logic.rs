use crate::app_state::{AppState, Completion, InputKind};
use crate::console_command::{self, RunnerEvent};
use crate::run_request::RunOutcome;
use crate::settings::{ExecutionPolicy, RunnerSettings};
use crate::ui_elements::UiElements;

use glib_macros::clone;
use gtk4::{gdk, gio, glib, prelude::*};
use log::{debug, error, info, warn};
use std::{cell::RefCell, path::Path, rc::Rc};

const STATUS_CSS: &str = "
.status-running { color: black; }
.status-success { color: green; }
.status-error { color: red; }
.preview { border: 1px solid black; }
";

fn load_css() {
    let provider = gtk4::CssProvider::new();
    provider.load_from_string(STATUS_CSS);

    match gdk::Display::default() {
        Some(display) => gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        ),
        None => warn!("No display available, status colors disabled"),
    }
}

fn file_filter(name: &str, suffixes: &[&str]) -> gtk4::FileFilter {
    let filter = gtk4::FileFilter::new();
    filter.set_name(Some(name));
    for suffix in suffixes {
        filter.add_suffix(suffix);
    }
    filter
}

fn chooser_filters(kind: InputKind) -> gio::ListStore {
    let all_files = gtk4::FileFilter::new();
    all_files.set_name(Some("All Files"));
    all_files.add_pattern("*");

    let specific = match kind {
        InputKind::Model => file_filter("PNG Files", &["png"]),
        InputKind::Cloth => file_filter("JPEG Files", &["jpg", "jpeg"]),
    };

    let filter_store = gio::ListStore::with_type(gtk4::FileFilter::static_type());
    filter_store.append(&all_files);
    filter_store.append(&specific);
    filter_store
}

fn log_output_image(path: &Path) {
    match image::image_dimensions(path) {
        Ok((width, height)) => info!(
            "Output image {} ({}x{})",
            path.display(),
            width,
            height
        ),
        Err(e) => warn!("Output image {} could not be decoded: {}", path.display(), e),
    }
}

struct Controller {
    ui: Rc<UiElements>,
    state: RefCell<AppState>,
    loading_timer: RefCell<Option<glib::SourceId>>,
}

impl Controller {
    fn select(self: &Rc<Self>, kind: InputKind) {
        let file_dialog = gtk4::FileDialog::new();
        file_dialog.set_title(kind.dialog_title());
        file_dialog.set_filters(Some(&chooser_filters(kind)));
        file_dialog.set_modal(true);

        let controller = Rc::clone(self);
        file_dialog.open(
            Some(&self.ui.window),
            None::<&gio::Cancellable>,
            move |result| {
                let chosen = result
                    .ok()
                    .and_then(|file| file.path())
                    .map(|path| path.to_string_lossy().into_owned());
                controller.apply_selection(kind, chosen);
            },
        );
    }

    fn apply_selection(&self, kind: InputKind, chosen: Option<String>) {
        let mut state = self.state.borrow_mut();
        if !state.select(kind, chosen) {
            return;
        }
        let path = state.path(kind).to_string();
        info!("{:?} selected: {}", kind, path);
        let (label, picture) = match kind {
            InputKind::Model => (&self.ui.model_label, &self.ui.model_picture),
            InputKind::Cloth => (&self.ui.cloth_label, &self.ui.cloth_picture),
        };
        label.set_text(&state.path_label(kind));
        picture.set_filename(Some(&path));
    }

    fn run(self: &Rc<Self>) {
        let scale = self.ui.scale_entry.text();
        let sample = self.ui.sample_entry.text();

        let (command, settings) = {
            let mut state = self.state.borrow_mut();
            match state.begin_run(&scale, &sample) {
                Ok(command) => (command, state.settings.clone()),
                Err(e) => {
                    warn!("{}", e);
                    gtk4::AlertDialog::builder()
                        .message(e.to_string())
                        .modal(true)
                        .build()
                        .show(Some(&self.ui.window));
                    return;
                }
            }
        };

        self.ui.button_run.set_sensitive(self.state.borrow().run_enabled());
        self.ui.progress_bar.set_fraction(0.0);
        self.ui.progress_bar.set_text(None);
        self.show_status();
        self.start_loading_timer();

        match settings.policy {
            ExecutionPolicy::Blocking => {
                let success = match console_command::run_blocking(&command, &settings) {
                    Ok(output) => output.success,
                    Err(e) => {
                        error!("{}", e);
                        false
                    }
                };
                self.complete(&RunOutcome::new(success, &settings));
            }
            ExecutionPolicy::Streaming => self.run_in_background(command, settings),
        }
    }

    fn run_in_background(self: &Rc<Self>, command: String, settings: RunnerSettings) {
        let (sender, receiver) = async_channel::unbounded();

        // offload the blocking read loop to the thread pool
        let _ = gio::spawn_blocking(move || {
            console_command::run_streaming(&command, &settings, &sender);
        });

        let controller = Rc::clone(self);
        glib::MainContext::default().spawn_local(async move {
            while let Ok(event) = receiver.recv().await {
                match event {
                    RunnerEvent::Finished(outcome) => {
                        controller.complete(&outcome);
                        break;
                    }
                    RunnerEvent::Line(line) => {
                        controller.ui.progress_bar.set_text(Some(line.as_str()));
                    }
                    event => {
                        let fraction = controller.state.borrow_mut().record_progress(&event);
                        if let Some(fraction) = fraction {
                            controller.ui.progress_bar.set_fraction(fraction);
                        }
                    }
                }
            }
        });
    }

    fn start_loading_timer(self: &Rc<Self>) {
        self.stop_loading_timer();
        let controller = Rc::clone(self);
        let source = glib::timeout_add_seconds_local(1, move || {
            if controller.state.borrow_mut().tick().is_some() {
                controller.show_status();
            }
            glib::ControlFlow::Continue
        });
        self.loading_timer.replace(Some(source));
    }

    fn stop_loading_timer(&self) {
        if let Some(source) = self.loading_timer.take() {
            source.remove();
        }
    }

    fn show_status(&self) {
        let status = self.state.borrow().status();
        self.ui.set_status(&status.text(), status.css_class());
    }

    fn complete(&self, outcome: &RunOutcome) {
        let completion = self.state.borrow_mut().finish(outcome);
        let Some(Completion { status, image }) = completion else {
            return;
        };

        self.stop_loading_timer();
        self.ui.button_run.set_sensitive(self.state.borrow().run_enabled());
        self.ui.set_status(&status.text(), status.css_class());

        if outcome.success {
            info!("Command executed successfully");
            self.ui.progress_bar.set_fraction(1.0);
            match image {
                Some(path) => {
                    log_output_image(&path);
                    let file = gio::File::for_path(&path);
                    self.ui.output_picture.set_file(Some(&file));
                }
                None => warn!(
                    "No output image at {}",
                    outcome.output_image.display()
                ),
            }
        } else {
            error!("Error executing command");
        }
    }
}

pub fn build_ui(app: &gtk4::Application) {
    load_css();

    let settings = RunnerSettings::from_env();
    if settings.debug {
        debug!("{:?}", settings);
    }
    let sync = settings.policy == ExecutionPolicy::Blocking;

    let ui_elements = Rc::new(UiElements::new(app));
    ui_elements.checkbox_sync.set_active(sync);

    let controller = Rc::new(Controller {
        ui: Rc::clone(&ui_elements),
        state: RefCell::new(AppState::new(settings)),
        loading_timer: RefCell::new(None),
    });

    ui_elements.button_model.connect_clicked(clone!(
        #[strong]
        controller,
        move |_| controller.select(InputKind::Model)
    ));

    ui_elements.button_cloth.connect_clicked(clone!(
        #[strong]
        controller,
        move |_| controller.select(InputKind::Cloth)
    ));

    ui_elements.checkbox_sync.connect_toggled(clone!(
        #[strong]
        controller,
        move |checkbox_sync| {
            info!("Run synchronously: {}", checkbox_sync.is_active());
            controller.state.borrow_mut().settings.policy = if checkbox_sync.is_active() {
                ExecutionPolicy::Blocking
            } else {
                ExecutionPolicy::Streaming
            };
        }
    ));

    ui_elements.button_run.connect_clicked(clone!(
        #[strong]
        controller,
        move |_| controller.run()
    ));

    ui_elements.window.present();
}
