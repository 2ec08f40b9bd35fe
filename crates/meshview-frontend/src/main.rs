//! Mesh Viewer main entry point

use meshview_frontend::{AppConfig, AppError, CliArgs, MeshViewApp};
use winit::event_loop::{ControlFlow, EventLoop};

fn main() -> Result<(), AppError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "meshview_frontend=debug,meshview_core=info,meshview_renderer=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = CliArgs::parse(std::env::args().skip(1))?;
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    tracing::info!("Starting Mesh Viewer with {:?}", config.viewer.assets.mesh);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = MeshViewApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
