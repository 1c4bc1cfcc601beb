use lexdiv_cli::config::CliOpts;
use lexdiv_cli::driver;
use log::error;

fn main() {
    env_logger::init();

    let opts = CliOpts::new();

    if let Err(e) = driver::run(&opts) {
        error!("{e}");
        std::process::exit(1);
    }
}
