use gtk4::glib;
use gtk4::prelude::*;
use std::env;

mod app_state;
mod console_command;
mod error;
mod run_request;
mod settings;
mod ui_elements;
mod ui_logic;

const APP_ID: &str = "org.gtk-rs.ootd-fitting";

fn main() -> glib::ExitCode {
    let debug: bool = env::var("DEBUG").is_ok_and(|v| v == "1");
    let default_filter = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let app = gtk4::Application::builder().application_id(APP_ID).build();
    app.connect_activate(ui_logic::build_ui);
    app.run()
}
