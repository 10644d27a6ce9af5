use std::env;
use std::path::Path;
use std::process::ExitCode;

use env_logger::Env;

mod config;
mod engine;
mod library;
mod player;
mod playlist;
mod search;
mod session;
mod shell;

use config::Settings;
use engine::RodioEngine;
use session::Session;

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("config error: {e}, using defaults");
            Settings::default()
        }
    };
    if let Err(e) = settings.validate() {
        eprintln!("invalid config: {e}");
        return ExitCode::FAILURE;
    }

    let (engine, events) = RodioEngine::spawn();
    let mut session = Session::new(settings, Box::new(engine), events);

    if let Some(dir) = env::args().nth(1) {
        let count = session.load_directory(Path::new(&dir));
        println!("Loaded {count} tracks from {dir}.");
    }

    if let Err(e) = shell::run(&mut session) {
        eprintln!("shell error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
