use clap::Parser;
use dashboard::client::{RemoteClient, Transport};
use dashboard::model::Snapshot;
use dashboard::poller::PollingController;
use dashboard::session::SessionStore;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "dashboard", about = "Terminal dashboard for a remote vibration-monitoring service")]
struct Args {
    /// Base URL of the remote API
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8080/api/v1")]
    base_url: String,

    /// Route calls through a forwarding proxy (takes precedence over --base-url)
    #[arg(long, env = "API_PROXY_URL")]
    proxy_url: Option<String>,

    /// Where the session token is persisted
    #[arg(long, env = "SESSION_FILE", default_value = "session.json")]
    session_file: PathBuf,

    /// Seconds between automatic refreshes
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value_t = 15)]
    interval: u64,

    #[arg(long, env = "API_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "API_PASSWORD")]
    password: Option<String>,

    /// Run offline with fixed demo data
    #[arg(long)]
    demo: bool,

    /// Show detail records for this measuring point after each refresh
    #[arg(long)]
    point: Option<i64>,

    /// Detail window in hours (1, 6, 24 and 168 are the usual presets)
    #[arg(long, default_value_t = 24)]
    window_hours: i64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt::init();

    info!("Starting vibration dashboard");

    let store = SessionStore::new(&args.session_file);
    let transport = match &args.proxy_url {
        Some(proxy_url) => Transport::Proxied { proxy_url: proxy_url.clone() },
        None => Transport::Direct { base_url: args.base_url.clone() },
    };

    let client = match RemoteClient::new(transport, store.clone()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    let mut controller = PollingController::new(client);

    if args.demo {
        controller.set_demo_mode();
    } else if controller.has_session() {
        info!(
            "Resuming stored session for {}",
            store.username().unwrap_or_else(|| "<unknown>".to_string())
        );
    } else {
        let (Some(username), Some(password)) = (&args.username, &args.password) else {
            error!("No valid session; pass --username and --password, or --demo");
            std::process::exit(2);
        };
        if let Err(e) = controller.login(username, password).await {
            error!("Login failed: {}", e);
            std::process::exit(1);
        }
    }

    controller.refresh_all().await;
    render(&controller.snapshot());
    show_details(&controller, args.point, args.window_hours).await;

    let mut ticker = interval(Duration::from_secs(args.interval.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if controller.auto_refresh_enabled() {
                    controller.refresh_all().await;
                    render(&controller.snapshot());
                    show_details(&controller, args.point, args.window_hours).await;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    info!("Shutting down");
}

fn render(snapshot: &Snapshot) {
    let active = snapshot.points.iter().filter(|p| p.point.active).count();
    println!(
        "\n[{}] status: {} | {} points ({} active)",
        snapshot.last_update.format("%H:%M:%S"),
        snapshot.connection_status,
        snapshot.points.len(),
        active
    );
    if let Some(message) = &snapshot.last_error {
        println!("  ! {}", message);
    }
    for summary in &snapshot.points {
        let sensor = summary
            .point
            .sensor
            .as_ref()
            .map(|s| format!("{} {:.0}% {:.0}dBm", s.serial, s.battery_level, s.signal_strength))
            .unwrap_or_else(|| "no sensor".to_string());
        println!(
            "  {:<24} {:>6.2} mm/s  {:<7} {}  [{}]",
            summary.point.name, summary.last_ppv, summary.alarm_level, summary.point.category, sensor
        );
    }
}

async fn show_details(controller: &PollingController, point: Option<i64>, window_hours: i64) {
    let Some(point_id) = point else { return };
    match controller.load_details(point_id, window_hours).await {
        Ok(records) => {
            println!("  -- {} records for point {} over {}h --", records.len(), point_id, window_hours);
            for r in &records {
                println!(
                    "  {} {}  X {:.2}@{:.0}Hz  Y {:.2}@{:.0}Hz  Z {:.2}@{:.0}Hz  max {} {}Hz",
                    r.date_string(), r.time_string(),
                    r.ppv_x, r.freq_x, r.ppv_y, r.freq_y, r.ppv_z, r.freq_z,
                    r.max_axis, r.dominant_freq
                );
            }
        }
        Err(e) => error!("Failed to load details for point {}: {}", point_id, e),
    }
}
