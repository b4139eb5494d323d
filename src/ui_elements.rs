use gtk4::{
    prelude::*, Align, ApplicationWindow, Button, CheckButton, ContentFit, Entry, Grid, Label,
    Picture, ProgressBar,
};

const PREVIEW_SIZE: i32 = 300;

pub struct UiElements {
    pub window: ApplicationWindow,
    pub model_picture: Picture,
    pub cloth_picture: Picture,
    pub output_picture: Picture,
    pub model_label: Label,
    pub cloth_label: Label,
    pub button_model: Button,
    pub button_cloth: Button,
    pub button_run: Button,
    pub scale_entry: Entry,
    pub sample_entry: Entry,
    pub status_label: Label,
    pub progress_bar: ProgressBar,
    pub checkbox_sync: CheckButton,
}

fn caption(text: &str) -> Label {
    let label = Label::new(Some(text));
    label.set_halign(Align::Center);
    label
}

fn preview() -> Picture {
    let picture = Picture::new();
    picture.set_size_request(PREVIEW_SIZE, PREVIEW_SIZE);
    picture.set_content_fit(ContentFit::Contain);
    picture.set_can_shrink(true);
    picture.add_css_class("preview");
    picture
}

impl UiElements {
    pub fn new(app: &gtk4::Application) -> Self {
        let window = gtk4::ApplicationWindow::builder()
            .application(app)
            .title("Virtual Fitting")
            .resizable(true)
            .build();

        let model_picture = preview();
        let cloth_picture = preview();
        let output_picture = preview();

        let model_label = caption("Model Path: Not Selected");
        model_label.set_wrap(true);
        let cloth_label = caption("Cloth Path: Not Selected");
        cloth_label.set_wrap(true);

        let button_model = Button::with_label("Select Model");
        let button_cloth = Button::with_label("Select Cloth");
        let button_run = Button::with_label("Run");

        let scale_entry = Entry::new();
        scale_entry.set_text("2.0");
        let sample_entry = Entry::new();
        sample_entry.set_text("1");

        let status_label = caption("");

        let progress_bar = ProgressBar::new();
        progress_bar.set_show_text(true);
        progress_bar.set_hexpand(true);

        let checkbox_sync = CheckButton::with_label("Run synchronously");
        checkbox_sync.set_active(false);

        let grid = Grid::new();
        grid.set_column_spacing(12);
        grid.set_row_spacing(12);
        grid.set_margin_top(12);
        grid.set_margin_bottom(12);
        grid.set_margin_start(12);
        grid.set_margin_end(12);
        grid.set_column_homogeneous(true);

        grid.attach(&caption("Model Image"), 0, 0, 1, 1);
        grid.attach(&model_picture, 0, 1, 1, 1);
        grid.attach(&caption("Cloth Image"), 1, 0, 1, 1);
        grid.attach(&cloth_picture, 1, 1, 1, 1);
        grid.attach(&caption("Output Image"), 2, 0, 1, 1);
        grid.attach(&output_picture, 2, 1, 1, 1);

        grid.attach(&button_model, 0, 2, 1, 1);
        grid.attach(&button_cloth, 1, 2, 1, 1);
        grid.attach(&button_run, 2, 2, 1, 1);
        grid.attach(&model_label, 0, 3, 1, 1);
        grid.attach(&cloth_label, 1, 3, 1, 1);
        grid.attach(&checkbox_sync, 2, 3, 1, 1);

        grid.attach(&caption("Scale:"), 0, 4, 1, 1);
        grid.attach(&scale_entry, 1, 4, 1, 1);
        grid.attach(&caption("Sample:"), 0, 5, 1, 1);
        grid.attach(&sample_entry, 1, 5, 1, 1);
        grid.attach(&status_label, 2, 4, 1, 2);

        grid.attach(&progress_bar, 0, 6, 3, 1);

        window.set_child(Some(&grid));

        Self {
            window,
            model_picture,
            cloth_picture,
            output_picture,
            model_label,
            cloth_label,
            button_model,
            button_cloth,
            button_run,
            scale_entry,
            sample_entry,
            status_label,
            progress_bar,
            checkbox_sync,
        }
    }

    pub fn set_status(&self, text: &str, css_class: Option<&str>) {
        for class in ["status-running", "status-success", "status-error"] {
            self.status_label.remove_css_class(class);
        }
        if let Some(class) = css_class {
            self.status_label.add_css_class(class);
        }
        self.status_label.set_text(text);
    }
}
