// Config Module - Configuration management and command-line argument parsing
use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Web control panel for tuning cone/cube HSV thresholds of the vision process",
    long_about = "Serves a small web UI for editing the HSV bounds in cone-params.txt and\n\
                  cube-params.txt, and for switching the vision process between run, tune\n\
                  and restart via the shared 'mode' file."
)]
pub struct Args {
    /// Directory holding the parameter files and the mode file
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(short, long)]
    pub ip: Option<String>,

    /// Port to bind the HTTP server to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Vision device address shown on the index page
    #[arg(short = 'D', long)]
    pub device_address: Option<String>,

    /// Milliseconds to stay in restart mode before returning to run
    #[arg(long)]
    pub restart_delay_ms: Option<u64>,

    /// Log filter (e.g. "info", "visiontune=debug"); RUST_LOG takes precedence
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,

    /// Config file path or name (e.g., --cfg /full/path, or --cfg lab for
    /// ~/.config/visiontune/lab.conf)
    #[arg(long)]
    pub cfg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    pub data_dir: PathBuf,
    pub httpd_ip: String,
    pub httpd_port: u16,
    pub device_address: String,
    pub restart_delay_ms: u64,
    pub log_level: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            config_path: None,
            data_dir: PathBuf::from("."),
            httpd_ip: "0.0.0.0".to_string(),
            httpd_port: 5000,
            device_address: "10.0.0.11".to_string(),
            restart_delay_ms: 2000,
            log_level: "info".to_string(),
        }
    }
}

impl PanelConfig {
    /// Apply command-line overrides. Returns true if any were given.
    pub fn merge_with_args(&mut self, args: &Args) -> bool {
        let mut args_provided = false;

        if let Some(dir) = &args.data_dir {
            self.data_dir = dir.clone();
            args_provided = true;
        }

        if let Some(ip) = &args.ip {
            self.httpd_ip = ip.clone();
            args_provided = true;
        }

        if let Some(port) = args.port {
            self.httpd_port = port;
            args_provided = true;
        }

        if let Some(addr) = &args.device_address {
            self.device_address = addr.clone();
            args_provided = true;
        }

        if let Some(delay) = args.restart_delay_ms {
            self.restart_delay_ms = delay;
            args_provided = true;
        }

        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
            args_provided = true;
        }

        if args_provided {
            self.sanitize();
        }
        args_provided
    }

    pub fn config_path(cfg_arg: Option<&str>) -> Result<PathBuf> {
        if let Some(cfg) = cfg_arg {
            let path = PathBuf::from(cfg);
            if path.is_absolute() {
                return Ok(path);
            }

            // Relative path
            if cfg.contains('/') || cfg.contains('\\') {
                return Ok(path);
            }

            // Otherwise treat as config name in config directory
            let filename = if cfg.ends_with(".conf") {
                cfg.to_string()
            } else {
                format!("{}.conf", cfg)
            };
            Ok(Self::config_dir()?.join(filename))
        } else {
            Ok(Self::config_dir()?.join("config.conf"))
        }
    }

    fn config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        let config_dir = PathBuf::from(home).join(".config").join("visiontune");
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create {}", config_dir.display()))?;
        Ok(config_dir)
    }

    pub fn load_from(path: PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut parsed: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        parsed.config_path = Some(path);
        parsed.sanitize();
        Ok(parsed)
    }

    /// Sanitize config values to handle common formatting issues
    pub fn sanitize(&mut self) {
        self.httpd_ip = self.httpd_ip.trim().to_string();
        self.device_address = self.device_address.trim().to_string();
        self.log_level = self.log_level.trim().to_string();

        if self.httpd_ip.is_empty() {
            self.httpd_ip = "0.0.0.0".to_string();
        }
        if self.log_level.is_empty() {
            self.log_level = "info".to_string();
        }
        if self.data_dir.as_os_str().is_empty() {
            self.data_dir = PathBuf::from(".");
        }

        self.httpd_port = self.httpd_port.max(1);
        self.restart_delay_ms = self.restart_delay_ms.min(60_000);
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn mode_path(&self) -> PathBuf {
        self.data_dir.join("mode")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.httpd_ip, self.httpd_port)
    }

    /// Render the config as commented TOML
    pub fn to_toml(&self) -> String {
        format!(
            r#"# visiontune configuration

# Directory holding cone-params.txt, cube-params.txt and the mode file
# (the vision process must read the same directory)
data_dir = {}

# HTTP server bind address and port
httpd_ip = {}
httpd_port = {}

# Address of the vision device, shown on the index page
device_address = {}

# How long the vision process stays in "restart" before returning to "run" (ms)
restart_delay_ms = {}

# Log filter, e.g. "info" or "visiontune=debug" (RUST_LOG overrides this)
log_level = {}
"#,
            toml::Value::String(self.data_dir.display().to_string()),
            toml::Value::String(self.httpd_ip.clone()),
            self.httpd_port,
            toml::Value::String(self.device_address.clone()),
            self.restart_delay_ms,
            toml::Value::String(self.log_level.clone()),
        )
    }

    pub fn save(&self) -> Result<()> {
        let path = match &self.config_path {
            Some(p) => p.clone(),
            None => Self::config_path(None)?,
        };

        let mut sanitized = self.clone();
        sanitized.sanitize();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&path, sanitized.to_toml())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
