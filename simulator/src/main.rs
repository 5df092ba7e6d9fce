use clap::Parser;
use simulator::{router, SimState, SimulatorConfig};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "simulator", about = "Synthetic vibration-monitoring service")]
struct Args {
    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,

    #[arg(long, env = "SIM_USERNAME", default_value = "demo")]
    username: String,

    #[arg(long, env = "SIM_PASSWORD", default_value = "demo")]
    password: String,

    /// Number of measuring points to serve
    #[arg(long, env = "SIM_POINTS", default_value_t = 3)]
    points: usize,

    /// Name the record array "samples" instead of "records"
    #[arg(long)]
    samples_envelope: bool,

    /// Emit frequency_* field names instead of freq_*
    #[arg(long)]
    long_frequency_names: bool,

    /// Emit timestamps in milliseconds instead of seconds
    #[arg(long)]
    timestamps_in_millis: bool,

    /// Always fail record queries for this point id
    #[arg(long)]
    fail_point: Option<i64>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt::init();

    info!("Starting simulator with {} measuring points", args.points);

    let state = SimState::new(SimulatorConfig {
        username: args.username,
        password: args.password,
        points: args.points,
        samples_envelope: args.samples_envelope,
        long_frequency_names: args.long_frequency_names,
        timestamps_in_millis: args.timestamps_in_millis,
        fail_point: args.fail_point,
    });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {}: {}", args.addr, e);
            std::process::exit(1);
        });

    info!("Listening on {}", args.addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
}
