mod config;
mod library;
mod mpris;
mod player;
mod runtime;
mod ui;

fn main() {
    if let Err(e) = runtime::run() {
        eprintln!("trackdeck: {e}");
        std::process::exit(1);
    }
}
