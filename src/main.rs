use color_eyre::Result;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;
use vrcontroller::controller::{ConnectionState, ControllerButton};
use vrcontroller::{ControllerInput, ControllerInputConfig};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = ControllerInputConfig::load().await?;
    info!("Starting controller input with config: {:?}", config);
    let poll_interval = Duration::from_millis(config.poll_interval_ms);

    let mut input = ControllerInput::new(config);
    info!(
        "Provider: {} (battery status supported: {})",
        input.provider_kind(),
        input.supports_battery_status()
    );

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let poller = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => log_frame(&mut input),
            }
        }
        input.pause();
        info!("Controller polling stopped");
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    shutdown.cancel();
    poller.await?;

    Ok(())
}

fn log_frame(input: &mut ControllerInput) {
    let state = input.update();
    if state.connection_state != ConnectionState::Connected {
        return;
    }

    for button in [
        ControllerButton::Click,
        ControllerButton::App,
        ControllerButton::Home,
    ] {
        let button_state = state.button(button);
        if button_state.down {
            info!("Button {:?} pressed", button);
        } else if button_state.up {
            info!("Button {:?} released", button);
        }
    }
    if state.recentered {
        info!("Controller recentered");
    }
    if state.is_touching {
        debug!(
            "Touch at ({:.3}, {:.3})",
            state.touch_pos.x, state.touch_pos.y
        );
    }
    debug!("Orientation: {:?}", state.orientation);
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
