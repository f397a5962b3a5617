mod cli;
mod logging;
mod profiles;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
