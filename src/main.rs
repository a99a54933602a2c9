use std::process;

fn main() {
    env_logger::init();

    if let Err(err) = ortholay::run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
