//! Serve command - run the HTTP tile server.

use std::path::PathBuf;

use streettiles::app::{AppConfig, StreetTilesApp};
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the serve command.
pub struct ServeArgs {
    pub config: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// Run the serve command until Ctrl-C.
pub fn run(args: ServeArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref())?;
    runner.log_startup("serve");

    let mut app_config = AppConfig::from_config_file(runner.config());
    if let Some(bind) = args.bind {
        app_config.server.bind = bind;
    }
    if let Some(port) = args.port {
        app_config.server.port = port;
    }

    let runtime = runner.runtime()?;
    runtime.block_on(async move {
        let app = StreetTilesApp::start(app_config).await?;

        println!("StreetTiles v{}", streettiles::VERSION);
        println!("Serving tiles on http://{}/tile/{{z}}/{{x}}/{{y}}", app.local_addr());
        println!("Press Ctrl-C to stop.");

        let token = app.cancellation();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C, shutting down");
                token.cancel();
            }
        });

        app.wait().await?;
        Ok::<(), CliError>(())
    })
}
