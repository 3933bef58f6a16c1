mod cli;
mod shell;

use std::path::Path;

use tracing_subscriber::EnvFilter;
use winit::event_loop::EventLoop;

use vitrine_config::Credentials;

fn main() {
    // Parse CLI arguments
    let args = cli::parse();

    // Initialize logging
    let log_directive = args.log_level.as_deref().unwrap_or("vitrine=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "vitrine=info".parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("Vitrine v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load config
    let config = match &args.config {
        Some(path) => vitrine_config::load_from_path(Path::new(path)),
        None => vitrine_config::load_config(),
    }
    .unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        vitrine_config::ShellConfig::default()
    });

    // Optional explicit credentials for the authentication collaborator.
    // Only presence is logged, never the contents.
    let credentials = Credentials::load(config.general.credentials_path.as_deref())
        .unwrap_or_else(|e| {
            tracing::warn!("Credential load failed, relying on platform SSO: {e}");
            None
        });

    // Expose the engine's diagnostic port before any surface exists.
    if let Some(port) = config.general.remote_debugging_port {
        std::env::set_var(
            "WEBVIEW2_ADDITIONAL_BROWSER_ARGUMENTS",
            format!("--remote-debugging-port={port}"),
        );
        tracing::info!("remote inspection on local port {port}");
    }

    let layout_name = args
        .layout
        .clone()
        .unwrap_or_else(|| config.general.default_layout.clone());

    // Create event loop and run
    let event_loop = EventLoop::<shell::ShellUserEvent>::with_user_event()
        .build()
        .expect("failed to create event loop");
    let proxy = event_loop.create_proxy();
    let mut app = shell::Shell::new(config, credentials, layout_name, proxy);

    tracing::info!("Entering event loop");
    if let Err(e) = event_loop.run_app(&mut app) {
        tracing::error!("Event loop error: {e}");
    }
    tracing::info!("Shutdown complete");
}
