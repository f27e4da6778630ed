use tracing::{info, warn};
use tracing_subscriber;

use clap::{value_t, App, Arg};

use multiuser_ar::node;
use multiuser_ar::settings::Settings;
use multiuser_ar::Result;

fn main() -> Result<()> {
    let matches = App::new("multiuser")
        .version("0.1")
        .about("Runs a simulated multi-user AR session")
        .arg(
            Arg::with_name("devices")
                .short("n")
                .long("devices")
                .value_name("DEVICES")
                .takes_value(true)
                .default_value("3"),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("CONFIG_FILE")
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::with_name("log-level")
                .short("l")
                .long("log-level")
                .value_name("LEVEL")
                .takes_value(true)
                .required(false),
        )
        .get_matches();

    let devices = value_t!(matches.value_of("devices"), usize).unwrap_or_else(|e| e.exit());
    let loaded = match matches.value_of("config") {
        Some(path) => Settings::from_file(path),
        None => Settings::new(),
    };
    let (settings, load_error) = match loaded {
        Ok(settings) => (settings, None),
        Err(err) => (Settings::default(), Some(err)),
    };

    let level = matches.value_of("log-level").unwrap_or(settings.log_level.as_str());
    tracing_subscriber::fmt()
        .with_level(false)
        .with_target(false)
        .without_time()
        .compact()
        .with_max_level(level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO))
        .init();

    if let Some(err) = load_error {
        // A bad explicit config file is fatal, a missing default one is not
        if matches.is_present("config") {
            return Err(err);
        }
        warn!("using built-in settings: {}", err);
    }

    let sys = actix::System::new();
    sys.block_on(node::run_demo(settings, devices))?;
    info!(target: "multiuser", "session finished");

    Ok(())
}
