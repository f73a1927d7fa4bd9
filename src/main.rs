use particle_field::config::FieldConfig;
use particle_field::window;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Optional JSON config path as the only argument.
    let config = match std::env::args().nth(1) {
        Some(path) => match FieldConfig::load(&path) {
            Ok(config) => {
                info!(%path, "loaded config");
                config
            }
            Err(e) => {
                error!(%path, "{}", e);
                std::process::exit(2);
            }
        },
        None => FieldConfig::default(),
    };

    if let Err(e) = window::run(config) {
        error!("{}", e);
        std::process::exit(1);
    }
}
