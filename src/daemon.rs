//! Background daemon for periodic news and product updates.
//!
//! Provides Chrome-updater-style background updates without requiring
//! system scheduler configuration.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::sync::Notify;
use tokio::time::interval;
use tracing::{error, info};

use crate::app::{AppContext, EstuaryError};
use crate::news::refresh_news;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Update interval in seconds (default: 3600 = 1 hour)
    pub update_interval_secs: u64,
    /// Whether to run an update immediately on start
    pub update_on_start: bool,
    /// Whether each cycle also runs the product scraper
    pub with_products: bool,
    /// Log file path (None = tracing output)
    pub log_file: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: 3600, // 1 hour
            update_on_start: true,
            with_products: false,
            log_file: None,
        }
    }
}

impl DaemonConfig {
    /// Parse interval string like "1h", "30m", "6h", "1d"
    pub fn parse_interval(s: &str) -> Result<u64, String> {
        let s = s.trim().to_lowercase();

        let secs = if let Some(hours) = s.strip_suffix('h') {
            hours
                .parse::<u64>()
                .map(|h| h * 3600)
                .map_err(|_| format!("Invalid hours: {}", hours))
        } else if let Some(minutes) = s.strip_suffix('m') {
            minutes
                .parse::<u64>()
                .map(|m| m * 60)
                .map_err(|_| format!("Invalid minutes: {}", minutes))
        } else if let Some(days) = s.strip_suffix('d') {
            days.parse::<u64>()
                .map(|d| d * 86400)
                .map_err(|_| format!("Invalid days: {}", days))
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map_err(|_| format!("Invalid seconds: {}", secs))
        } else {
            // Try parsing as raw seconds
            s.parse::<u64>()
                .map_err(|_| format!("Invalid interval: {}. Use format like '1h', '30m', '1d'", s))
        }?;

        if secs == 0 {
            return Err("Interval must be greater than zero".to_string());
        }
        Ok(secs)
    }

    /// Format interval for display
    pub fn format_interval(secs: u64) -> String {
        if secs >= 86400 && secs.is_multiple_of(86400) {
            format!("{}d", secs / 86400)
        } else if secs >= 3600 && secs.is_multiple_of(3600) {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs.is_multiple_of(60) {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

/// Daemon runner
pub struct Daemon {
    ctx: Arc<AppContext>,
    config: DaemonConfig,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl Daemon {
    pub fn new(ctx: Arc<AppContext>, config: DaemonConfig) -> Self {
        Self {
            ctx,
            config,
            running: Arc::new(AtomicBool::new(true)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get the PID file path
    pub fn pid_file_path() -> Option<PathBuf> {
        dirs::runtime_dir()
            .or_else(dirs::cache_dir)
            .map(|d| d.join("estuary").join("daemon.pid"))
    }

    /// Check if another daemon is already running
    pub fn is_running() -> bool {
        read_pid().is_some_and(Self::process_exists)
    }

    #[cfg(unix)]
    fn process_exists(pid: u32) -> bool {
        Command::new("kill")
            .args(["-0", &pid.to_string()])
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[cfg(windows)]
    fn process_exists(pid: u32) -> bool {
        Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid)])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains(&pid.to_string()))
            .unwrap_or(false)
    }

    /// Write PID file
    fn write_pid_file(&self) -> std::io::Result<()> {
        if let Some(pid_path) = Self::pid_file_path() {
            if let Some(parent) = pid_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(&pid_path)?;
            writeln!(file, "{}", std::process::id())?;
        }
        Ok(())
    }

    /// Remove PID file
    fn remove_pid_file(&self) {
        if let Some(pid_path) = Self::pid_file_path() {
            let _ = fs::remove_file(pid_path);
        }
    }

    /// Log a message with timestamp
    fn log(&self, msg: &str) {
        match self.config.log_file {
            Some(ref log_path) => {
                let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
                if let Ok(mut file) = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(log_path)
                {
                    let _ = writeln!(file, "[{}] {}", timestamp, msg);
                }
            }
            None => info!("{}", msg),
        }
    }

    fn spawn_signal_listener(&self) {
        let running = self.running.clone();
        let shutdown = self.shutdown.clone();

        #[cfg(unix)]
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};

            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        error!("Failed to install signal handlers: {}", e);
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
            running.store(false, Ordering::SeqCst);
            shutdown.notify_one();
        });

        #[cfg(windows)]
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            running.store(false, Ordering::SeqCst);
            shutdown.notify_one();
        });
    }

    /// Run the daemon
    pub async fn run(&self) -> crate::app::Result<()> {
        if Self::is_running() {
            return Err(EstuaryError::Other(
                "Another daemon instance is already running".to_string(),
            ));
        }

        self.write_pid_file()
            .map_err(|e| EstuaryError::Other(format!("Failed to write PID file: {}", e)))?;

        self.spawn_signal_listener();

        self.log(&format!(
            "Estuary daemon started (update interval: {}, products: {}, PID: {})",
            DaemonConfig::format_interval(self.config.update_interval_secs),
            if self.config.with_products { "on" } else { "off" },
            std::process::id()
        ));

        if self.config.update_on_start {
            self.log("Running initial update...");
            self.run_update().await;
        }

        let mut timer = interval(Duration::from_secs(self.config.update_interval_secs));
        timer.tick().await; // Skip the first immediate tick

        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                _ = timer.tick() => {}
                _ = self.shutdown.notified() => break,
            }

            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            self.log("Running scheduled update...");
            self.run_update().await;
        }

        self.log("Daemon shutting down...");
        self.remove_pid_file();

        Ok(())
    }

    /// Run a single update cycle. Failures are logged, never returned, so
    /// one bad cycle does not stop the daemon.
    async fn run_update(&self) {
        let start = Utc::now();

        let aggregator = self.ctx.news_aggregator();
        match refresh_news(&aggregator, &*self.ctx.store).await {
            Ok(count) => self.log(&format!("  {} news articles stored", count)),
            Err(e) => self.log(&format!("  News update failed: {}", e)),
        }

        if self.config.with_products {
            match self.ctx.scrape_orchestrator() {
                Ok(orchestrator) => {
                    let outcome = orchestrator.run(&self.ctx.config.scraper.url).await;
                    match outcome.persist(&*self.ctx.store) {
                        Ok(summary) => self.log(&format!(
                            "  {} products stored, page fragments {}",
                            summary.listings_stored,
                            if summary.fragments_stored { "stored" } else { "skipped" }
                        )),
                        Err(e) => self.log(&format!("  Storing products failed: {}", e)),
                    }
                }
                Err(e) => self.log(&format!("  Product scraper misconfigured: {}", e)),
            }
        }

        let elapsed = Utc::now().signed_duration_since(start);
        self.log(&format!(
            "Update complete ({:.1}s)",
            elapsed.num_milliseconds() as f64 / 1000.0
        ));
    }

    /// Stop the daemon (called externally)
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();
    }
}

fn read_pid() -> Option<u32> {
    let pid_path = Daemon::pid_file_path()?;
    fs::read_to_string(pid_path).ok()?.trim().parse().ok()
}

/// Re-launch the current executable as a detached foreground daemon.
///
/// `args` are the arguments after the program name; `--foreground` is added.
pub fn spawn_detached(args: &[String]) -> Result<u32, String> {
    let exe = std::env::current_exe().map_err(|e| format!("Failed to locate executable: {}", e))?;

    let child = Command::new(exe)
        .args(args)
        .arg("--foreground")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("Failed to start daemon: {}", e))?;

    Ok(child.id())
}

/// Stop a running daemon by reading PID file and sending signal
pub fn stop_daemon() -> Result<(), String> {
    let pid_path =
        Daemon::pid_file_path().ok_or_else(|| "Could not determine PID file path".to_string())?;

    if !pid_path.exists() {
        return Err("No daemon is running (PID file not found)".to_string());
    }

    let pid = read_pid().ok_or_else(|| "Invalid PID in PID file".to_string())?;

    #[cfg(unix)]
    let status = Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status()
        .map_err(|e| format!("Failed to send signal: {}", e))?;

    #[cfg(windows)]
    let status = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .status()
        .map_err(|e| format!("Failed to stop process: {}", e))?;

    if status.success() {
        let _ = fs::remove_file(&pid_path);
        Ok(())
    } else {
        Err(format!("Failed to stop daemon (PID {})", pid))
    }
}

/// Check daemon status
pub fn daemon_status() -> String {
    match read_pid() {
        Some(pid) if Daemon::process_exists(pid) => format!("Daemon is running (PID: {})", pid),
        Some(_) => "Daemon is not running (stale PID file)".to_string(),
        None => "Daemon is not running".to_string(),
    }
}
