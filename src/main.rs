//! Optiya CLI
//!
//! Command-line console for the ANPR backend:
//! - Log in and manage the stored token
//! - Manage cameras and the watchlist
//! - Search and export plate logs
//! - Watch a camera's live stream with plate detections

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use optiya_console::api::{
    parse_time_arg, ApiClient, ApiError, Camera, CameraCreate, LogQuery, PlateLog, UserCreate,
    Watchlist, WatchlistCreate,
};
use optiya_console::config::{generate_default_config, Config};
use optiya_console::credentials::{CredentialStore, StoredCredential};
use optiya_console::export::{self, ExportFormat};
use optiya_console::stream::{SessionEvent, SessionEventKind, StreamError, WebSocketTransport};
use optiya_console::viewer::{LiveViewer, ViewerState};

#[derive(Parser)]
#[command(name = "optiya")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator console for the Optiya ANPR backend")]
#[command(long_about = "Optiya is a console for an ANPR backend.\nWatch live camera streams with plate detections, manage cameras and the watchlist, and search plate logs.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend URL (overrides config and OPTIYA_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Config file (default: search the usual locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the token
    Login {
        /// Account email
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        email: String,
        /// Display name
        name: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
        #[arg(long, default_value = "viewer")]
        role: String,
    },

    /// Forget the stored token
    Logout,

    /// Show the logged-in account
    Whoami,

    /// Camera management
    #[command(subcommand)]
    Cameras(CameraCommands),

    /// Plate log search and export
    #[command(subcommand)]
    Logs(LogCommands),

    /// Watchlist management
    #[command(subcommand)]
    Watchlist(WatchlistCommands),

    /// Show dashboard KPIs and panels
    Dashboard,

    /// Watch a camera's live stream until Ctrl-C
    ///
    /// Type `r` and Enter to reconnect, `q` and Enter to quit.
    Watch {
        camera_id: i64,
        /// Keep the latest frame in this file
        #[arg(long)]
        save_frame: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum CameraCommands {
    /// List cameras
    List {
        #[arg(long, default_value = "0")]
        skip: u32,
        #[arg(long, default_value = "100")]
        limit: u32,
    },
    /// Show one camera
    Show { id: i64 },
    /// Register a camera
    Add {
        name: String,
        rtsp_url: String,
        #[arg(long)]
        site: Option<String>,
        /// Extra metadata as a JSON object
        #[arg(long)]
        meta: Option<String>,
    },
    /// Change a camera
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        rtsp_url: Option<String>,
        #[arg(long)]
        site: Option<String>,
        /// Extra metadata as a JSON object
        #[arg(long)]
        meta: Option<String>,
    },
    /// Delete a camera
    Remove { id: i64 },
    /// Save the camera's current frame on the backend
    Snapshot { id: i64 },
    /// Show health metrics
    Health { id: i64 },
}

#[derive(Subcommand)]
pub enum LogCommands {
    /// Search plate logs
    Search {
        #[command(flatten)]
        filter: LogFilterArgs,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "10")]
        per_page: u32,
    },
    /// Show one log entry
    Show { id: i64 },
    /// Export matching logs
    Export {
        #[command(flatten)]
        filter: LogFilterArgs,
        /// Output file; format follows the extension (csv, json, ndjson)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Use the backend's CSV export (date filters only)
        #[arg(long)]
        server: bool,
    },
}

#[derive(clap::Args, Clone)]
pub struct LogFilterArgs {
    /// Plate substring
    #[arg(long)]
    plate: Option<String>,
    #[arg(long)]
    camera: Option<i64>,
    /// Start time: now-24h, now-7d, 2025-03-01, RFC 3339
    #[arg(long)]
    from: Option<String>,
    /// End time, same formats as --from
    #[arg(long)]
    to: Option<String>,
    /// Only plates on the watchlist
    #[arg(long)]
    watchlist_only: bool,
    #[arg(long)]
    min_confidence: Option<f64>,
}

impl LogFilterArgs {
    fn to_query(&self) -> Result<LogQuery> {
        let from = self.from.as_deref().map(parse_time_arg).transpose()?;
        let to = self.to.as_deref().map(parse_time_arg).transpose()?;

        let mut query = LogQuery::new().between(from, to);
        if let Some(plate) = &self.plate {
            query = query.plate(plate);
        }
        if let Some(camera) = self.camera {
            query = query.camera(camera);
        }
        if self.watchlist_only {
            query = query.watchlist_only();
        }
        if let Some(c) = self.min_confidence {
            query = query.min_confidence(c);
        }
        Ok(query)
    }
}

#[derive(Subcommand)]
pub enum WatchlistCommands {
    /// List watchlist entries
    List {
        #[arg(long, default_value = "0")]
        skip: u32,
        #[arg(long, default_value = "100")]
        limit: u32,
    },
    /// Add a plate
    Add {
        plate: String,
        #[arg(long)]
        description: Option<String>,
        /// Notify by SMS
        #[arg(long)]
        sms: bool,
        /// Do not notify by email
        #[arg(long)]
        no_email: bool,
    },
    /// Change an entry
    Update {
        id: i64,
        #[arg(long)]
        plate: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// SMS notification on or off
        #[arg(long)]
        sms: Option<bool>,
        /// Email notification on or off
        #[arg(long)]
        email: Option<bool>,
    },
    /// Remove an entry
    Remove { id: i64 },
}

struct App {
    config: Config,
    api: ApiClient,
    store: CredentialStore,
    format: OutputFormat,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match Config::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    if let Some(url) = &cli.api_url {
        config.api.url = url.clone();
    }

    optiya_console::logging::init(&config.logging, cli.verbose);

    if let Err(e) = run(cli, config).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    if let Commands::Config { output } = &cli.command {
        return write_default_config(output.as_deref());
    }

    let store = CredentialStore::from_config(&config.credentials)?;
    let mut api = ApiClient::with_timeout(&config.api.url, config.api.request_timeout())?;
    if let Some(stored) = store.load().context("Failed to read stored credential")? {
        if !stored.is_expired() {
            api.set_token(Some(stored.access_token));
        }
    }

    let app = App {
        config,
        api,
        store,
        format: cli.format,
    };

    // A 401 from login means bad credentials, not a stale token
    let logging_in = matches!(cli.command, Commands::Login { .. });
    let result = dispatch(&app, cli.command).await;

    if let Err(e) = &result {
        let rejected = e
            .downcast_ref::<ApiError>()
            .map(ApiError::is_unauthorized)
            .unwrap_or(false);
        if rejected && !logging_in {
            app.store.clear()?;
            tracing::info!("Cleared rejected credential");
            bail!("{:#}\nYour session is no longer valid; run `optiya login` again.", e);
        }
    }
    result
}

async fn dispatch(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            let token = app
                .api
                .login(&email, &password)
                .await
                .context("Login failed")?;
            app.store
                .save(&StoredCredential::from_token(&token, Some(email.clone())))?;
            println!("Logged in as {}", email);
            println!("Token stored in {:?}", app.store.path());
        }

        Commands::Register {
            email,
            name,
            password,
            role,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            let mut body = UserCreate::new(email, password, name);
            body.role = role;
            let user = app.api.register(&body).await.context("Registration failed")?;
            match app.format {
                OutputFormat::Json => print_json(&user)?,
                OutputFormat::Table => {
                    println!("Registered {} <{}> as {}", user.name, user.email, user.role);
                    println!("Log in with: optiya login {}", user.email);
                }
            }
        }

        Commands::Logout => {
            if app.store.clear()? {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }

        Commands::Whoami => {
            require_token(app)?;
            let user = app.api.me().await?;
            match app.format {
                OutputFormat::Json => print_json(&user)?,
                OutputFormat::Table => {
                    println!("Name:  {}", user.name);
                    println!("Email: {}", user.email);
                    println!("Role:  {}", user.role);
                    if let Some(expires) = app.store.load()?.and_then(|s| s.expires_at) {
                        println!("Token expires: {}", expires.format("%Y-%m-%d %H:%M:%S UTC"));
                    }
                }
            }
        }

        Commands::Cameras(command) => {
            require_token(app)?;
            cameras(app, command).await?;
        }

        Commands::Logs(command) => {
            require_token(app)?;
            logs(app, command).await?;
        }

        Commands::Watchlist(command) => {
            require_token(app)?;
            watchlist(app, command).await?;
        }

        Commands::Dashboard => {
            require_token(app)?;
            let overview = app.api.dashboard().await?;
            match app.format {
                OutputFormat::Json => print_json(&overview)?,
                OutputFormat::Table => {
                    let k = &overview.kpis;
                    println!("Active cameras:   {}/{}", k.active_cameras, k.total_cameras);
                    println!("Detections today: {}", k.detections_today);
                    println!("Watchlist hits:   {}", k.watchlist_hits);
                    println!("Avg latency:      {} ms", k.avg_latency);

                    println!();
                    println!("Recent detections:");
                    println!("{:<14} {:<20} {:>5} {:<20} {}", "Plate", "Camera", "Conf", "Time", "Hit");
                    println!("{}", "-".repeat(68));
                    for d in &overview.recent_detections {
                        println!(
                            "{:<14} {:<20} {:>4}% {:<20} {}",
                            d.plate_text,
                            d.camera_name,
                            d.confidence,
                            d.timestamp.format("%Y-%m-%d %H:%M:%S"),
                            if d.is_watchlist_hit { "YES" } else { "" }
                        );
                    }

                    println!();
                    println!("Cameras:");
                    for c in &overview.camera_status {
                        println!(
                            "  {:<20} {:<16} {:<8} {} ms",
                            c.name,
                            c.site.as_deref().unwrap_or("-"),
                            c.status,
                            c.latency
                        );
                    }

                    println!();
                    println!("Detections (last days):");
                    for t in &overview.detection_trends {
                        println!("  {}  {}", t.date.format("%Y-%m-%d"), t.detections);
                    }

                    println!();
                    println!("Detection types:");
                    for t in &overview.detection_types {
                        println!("  {:<20} {}", t.name, t.value);
                    }
                }
            }
        }

        Commands::Watch {
            camera_id,
            save_frame,
        } => {
            watch(app, camera_id, save_frame).await?;
        }

        Commands::Config { output } => write_default_config(output.as_deref())?,
    }

    Ok(())
}

async fn cameras(app: &App, command: CameraCommands) -> Result<()> {
    match command {
        CameraCommands::List { skip, limit } => {
            let cameras = app.api.list_cameras(skip, limit).await?;
            match app.format {
                OutputFormat::Json => print_json(&cameras)?,
                OutputFormat::Table => print_cameras(&cameras),
            }
        }

        CameraCommands::Show { id } => {
            let camera = app.api.get_camera(id).await?;
            match app.format {
                OutputFormat::Json => print_json(&camera)?,
                OutputFormat::Table => print_camera(&camera),
            }
        }

        CameraCommands::Add {
            name,
            rtsp_url,
            site,
            meta,
        } => {
            let body = CameraCreate {
                name,
                rtsp_url,
                site,
                meta: meta.as_deref().map(parse_meta).transpose()?,
            };
            let camera = app.api.create_camera(&body).await?;
            match app.format {
                OutputFormat::Json => print_json(&camera)?,
                OutputFormat::Table => println!("Added camera {} ({})", camera.id, camera.name),
            }
        }

        CameraCommands::Update {
            id,
            name,
            rtsp_url,
            site,
            meta,
        } => {
            let current = app.api.get_camera(id).await?;
            let mut body = CameraCreate::from(&current);
            if let Some(name) = name {
                body.name = name;
            }
            if let Some(url) = rtsp_url {
                body.rtsp_url = url;
            }
            if site.is_some() {
                body.site = site;
            }
            if let Some(meta) = meta {
                body.meta = Some(parse_meta(&meta)?);
            }
            let camera = app.api.update_camera(id, &body).await?;
            match app.format {
                OutputFormat::Json => print_json(&camera)?,
                OutputFormat::Table => println!("Updated camera {} ({})", camera.id, camera.name),
            }
        }

        CameraCommands::Remove { id } => {
            app.api.delete_camera(id).await?;
            println!("Removed camera {}", id);
        }

        CameraCommands::Snapshot { id } => {
            let snapshot = app.api.capture_snapshot(id).await?;
            match app.format {
                OutputFormat::Json => print_json(&snapshot)?,
                OutputFormat::Table => {
                    println!("Snapshot saved: {}{}", app.api.base_url(), snapshot.image_url)
                }
            }
        }

        CameraCommands::Health { id } => {
            let health = app.api.camera_health(id).await?;
            match app.format {
                OutputFormat::Json => print_json(&health)?,
                OutputFormat::Table => {
                    println!("Camera:  {}", health.camera_id);
                    println!("Status:  {}", health.status);
                    println!("Latency: {:.0} ms", health.latency_ms);
                    println!("CPU:     {:.1}%", health.cpu_usage);
                    println!(
                        "Updated: {}",
                        health.last_updated.as_deref().unwrap_or("never")
                    );
                }
            }
        }
    }

    Ok(())
}

async fn logs(app: &App, command: LogCommands) -> Result<()> {
    match command {
        LogCommands::Search {
            filter,
            page,
            per_page,
        } => {
            let query = filter.to_query()?.page(page, per_page);
            let result = app.api.search_logs(&query).await?;
            match app.format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Table => {
                    print_logs(&result.items);
                    let pages = result.total.div_ceil(query.per_page as u64).max(1);
                    println!();
                    println!("Page {} of {} ({} total)", query.page, pages, result.total);
                }
            }
        }

        LogCommands::Show { id } => {
            let log = app.api.get_log(id).await?;
            match app.format {
                OutputFormat::Json => print_json(&log)?,
                OutputFormat::Table => {
                    println!("ID:         {}", log.id);
                    println!("Plate:      {}", log.plate_text);
                    println!("Confidence: {}%", log.confidence);
                    println!("Camera:     {}", log.camera_id);
                    println!("Time:       {}", log.timestamp.format("%Y-%m-%d %H:%M:%S"));
                    if let Some(image) = &log.image_snapshot_ref {
                        println!("Image:      {}", image);
                    }
                    if let Some(meta) = &log.extra_metadata {
                        println!("Metadata:   {}", meta);
                    }
                }
            }
        }

        LogCommands::Export {
            filter,
            output,
            server,
        } => {
            if server {
                let query = filter.to_query()?;
                let csv = app
                    .api
                    .export_logs_csv(query.from_date, query.to_date)
                    .await?;
                match output {
                    Some(path) => {
                        std::fs::write(&path, &csv)
                            .with_context(|| format!("Failed to write {:?}", path))?;
                        println!("Exported to {:?}", path);
                    }
                    None => print!("{}", csv),
                }
                return Ok(());
            }

            let logs = app.api.fetch_all_logs(&filter.to_query()?).await?;
            match output {
                Some(path) => {
                    let count = export::export_to_path(&path, &logs)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Exported {} logs to {:?}", count, path);
                }
                None => {
                    let stdout = std::io::stdout();
                    export::write_logs(stdout.lock(), &logs, ExportFormat::Csv)?;
                }
            }
        }
    }

    Ok(())
}

async fn watchlist(app: &App, command: WatchlistCommands) -> Result<()> {
    match command {
        WatchlistCommands::List { skip, limit } => {
            let entries = app.api.list_watchlist(skip, limit).await?;
            match app.format {
                OutputFormat::Json => print_json(&entries)?,
                OutputFormat::Table => print_watchlist(&entries),
            }
        }

        WatchlistCommands::Add {
            plate,
            description,
            sms,
            no_email,
        } => {
            let body = WatchlistCreate {
                plate_text: plate,
                description,
                notify_sms: sms as i64,
                notify_email: (!no_email) as i64,
            };
            let entry = app.api.add_watchlist(&body).await?;
            match app.format {
                OutputFormat::Json => print_json(&entry)?,
                OutputFormat::Table => {
                    println!("Added {} to the watchlist (id {})", entry.plate_text, entry.id)
                }
            }
        }

        WatchlistCommands::Update {
            id,
            plate,
            description,
            sms,
            email,
        } => {
            // No single-entry endpoint; find it in the list
            let current = app
                .api
                .list_watchlist(0, 1000)
                .await?
                .into_iter()
                .find(|e| e.id == id)
                .ok_or_else(|| anyhow!("Watchlist entry {} not found", id))?;

            let body = WatchlistCreate {
                plate_text: plate.unwrap_or(current.plate_text),
                description: description.or(current.description),
                notify_sms: sms.map(i64::from).unwrap_or(current.notify_sms),
                notify_email: email.map(i64::from).unwrap_or(current.notify_email),
            };
            let entry = app.api.update_watchlist(id, &body).await?;
            match app.format {
                OutputFormat::Json => print_json(&entry)?,
                OutputFormat::Table => println!("Updated watchlist entry {}", entry.id),
            }
        }

        WatchlistCommands::Remove { id } => {
            app.api.remove_watchlist(id).await?;
            println!("Removed watchlist entry {}", id);
        }
    }

    Ok(())
}

async fn watch(app: &App, camera_id: i64, save_frame: Option<PathBuf>) -> Result<()> {
    let credential = app.store.credential()?;

    let transport = Arc::new(
        WebSocketTransport::new(&app.config.api.ws_url())
            .with_connect_timeout(app.config.stream.connect_timeout()),
    );
    let mut viewer = LiveViewer::new(transport, app.config.stream.session_options());

    match viewer.select_camera(camera_id, credential).await {
        Ok(()) => {}
        Err(StreamError::AuthMissing) => bail!("Not logged in; run `optiya login` first"),
        Err(e) => return Err(e.into()),
    }

    eprintln!("Watching camera {} (r + Enter: reconnect, q + Enter: quit, Ctrl-C: stop)", camera_id);

    // Plain thread: a blocked stdin read must not hold up shutdown
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        while stdin.read_line(&mut line).map(|n| n > 0).unwrap_or(false) {
            if line_tx.send(line.trim().to_string()).is_err() {
                break;
            }
            line.clear();
        }
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            Some(line) = line_rx.recv() => match line.as_str() {
                "r" => match viewer.refresh() {
                    Ok(()) => eprintln!("Reconnecting..."),
                    Err(e) => eprintln!("Cannot refresh: {}", e),
                },
                "q" => break,
                _ => {}
            },
            event = viewer.next_event() => match event {
                Some(event) => {
                    if let (SessionEventKind::Frame(frame), Some(path)) = (&event.kind, &save_frame) {
                        frame
                            .save(path)
                            .await
                            .with_context(|| format!("Failed to write frame to {:?}", path))?;
                    }
                    render_event(app.format, &event, viewer.state())?
                }
                None => break,
            },
        }
    }

    viewer.close().await;
    Ok(())
}

fn render_event(
    format: OutputFormat,
    event: &SessionEvent,
    state: &ViewerState,
) -> Result<()> {
    if format == OutputFormat::Json {
        let line = match &event.kind {
            SessionEventKind::Status(status) => {
                serde_json::json!({"type": "status", "camera_id": event.camera_id, "status": status.label()})
            }
            SessionEventKind::Frame(frame) => {
                serde_json::json!({"type": "frame", "camera_id": event.camera_id, "bytes": frame.image_bytes.len()})
            }
            SessionEventKind::Detections(window) => {
                serde_json::json!({"type": "detections", "camera_id": event.camera_id, "detections": window})
            }
            SessionEventKind::Error(message) => {
                serde_json::json!({"type": "error", "camera_id": event.camera_id, "message": message})
            }
            SessionEventKind::WatchlistAlert(hit) => {
                serde_json::json!({"type": "watchlist_alert", "camera_id": event.camera_id, "detection": hit})
            }
        };
        println!("{}", line);
        return Ok(());
    }

    match &event.kind {
        SessionEventKind::Status(_) => {
            println!("[camera {}] {}", event.camera_id, state.status_label);
        }
        SessionEventKind::Frame(_) => {}
        SessionEventKind::Detections(window) => {
            println!(
                "[camera {}] {} active | {} high confidence | {} watchlist",
                event.camera_id,
                state.active_detections(),
                state.high_confidence_count(),
                state.watchlist_hit_count()
            );
            for d in window.iter().rev() {
                println!(
                    "  {:<14} {:>3.0}%  {}{}",
                    d.plate_text,
                    d.confidence,
                    d.seen_at.format("%H:%M:%S"),
                    if d.is_watchlist_hit { "  WATCHLIST" } else { "" }
                );
            }
        }
        SessionEventKind::Error(message) => {
            eprintln!("[camera {}] error: {}", event.camera_id, message);
        }
        SessionEventKind::WatchlistAlert(hit) => {
            println!(
                "WATCHLIST ALERT: {} ({:.0}%) on camera {}",
                hit.plate_text, hit.confidence, event.camera_id
            );
        }
    }

    std::io::stdout().flush()?;
    Ok(())
}

fn require_token(app: &App) -> Result<()> {
    if app.api.token().is_none() {
        bail!("Not logged in; run `optiya login` first");
    }
    Ok(())
}

fn write_default_config(output: Option<&Path>) -> Result<()> {
    let config = generate_default_config();

    match output {
        Some(path) => {
            // Create parent directory if needed
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => {
            print!("{}", config);
        }
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn parse_meta(raw: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--meta must be a JSON object")?;
    if !value.is_object() {
        bail!("--meta must be a JSON object");
    }
    Ok(value)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_cameras(cameras: &[Camera]) {
    if cameras.is_empty() {
        println!("No cameras registered yet.");
        println!();
        println!("Add one with:");
        println!("  optiya cameras add \"Main Gate\" rtsp://10.0.0.5/stream");
        return;
    }

    println!("{:<6} {:<20} {:<16} {:<8} {}", "ID", "Name", "Site", "Status", "Last seen");
    println!("{}", "-".repeat(72));
    for c in cameras {
        println!(
            "{:<6} {:<20} {:<16} {:<8} {}",
            c.id,
            c.name,
            c.site.as_deref().unwrap_or("-"),
            c.status,
            c.last_seen
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

fn print_camera(c: &Camera) {
    println!("ID:        {}", c.id);
    println!("Name:      {}", c.name);
    println!("RTSP URL:  {}", c.rtsp_url);
    println!("Site:      {}", c.site.as_deref().unwrap_or("-"));
    println!("Status:    {}", c.status);
    if let Some(seen) = c.last_seen {
        println!("Last seen: {}", seen.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("Created:   {}", c.created_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(meta) = &c.meta {
        println!("Metadata:  {}", meta);
    }
}

fn print_logs(logs: &[PlateLog]) {
    if logs.is_empty() {
        println!("No plate logs match.");
        return;
    }

    println!("{:<8} {:<14} {:>5} {:<8} {}", "ID", "Plate", "Conf", "Camera", "Time");
    println!("{}", "-".repeat(60));
    for log in logs {
        println!(
            "{:<8} {:<14} {:>4}% {:<8} {}",
            log.id,
            log.plate_text,
            log.confidence,
            log.camera_id,
            log.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

fn print_watchlist(entries: &[Watchlist]) {
    if entries.is_empty() {
        println!("Watchlist is empty.");
        return;
    }

    println!("{:<6} {:<14} {:<5} {:<5} {}", "ID", "Plate", "SMS", "Email", "Description");
    println!("{}", "-".repeat(60));
    for e in entries {
        println!(
            "{:<6} {:<14} {:<5} {:<5} {}",
            e.id,
            e.plate_text,
            if e.notify_sms != 0 { "yes" } else { "no" },
            if e.notify_email != 0 { "yes" } else { "no" },
            e.description.as_deref().unwrap_or("")
        );
    }
}
