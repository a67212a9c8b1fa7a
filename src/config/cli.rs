use crate::app::pages::Page;
use crate::config::toml_config::{AdminConfig, AnalyticsConfig, AnalyticsSource, WatchConfig};
use crate::domain::model::{PaymentStatus, PenaltyStatus, ReservationStatus, RowId, StationStatus};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "chargepark-admin")]
#[command(about = "Admin console for EV charging stations, parking lots, reservations and penalties")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "chargepark.toml")]
    pub config: PathBuf,

    /// Data store base URL, overrides [store].url
    #[arg(long, global = true, env = "CHARGEPARK_URL")]
    pub url: Option<String>,

    /// Data store API key, overrides [store].api_key
    #[arg(long, global = true, env = "CHARGEPARK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Polling interval for watch mode, overrides [watch].poll_interval_seconds
    #[arg(long, global = true)]
    pub poll_interval: Option<u64>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Summary cards and recent activity
    Dashboard,
    /// Charging stations
    Stations {
        #[command(subcommand)]
        action: StationAction,
    },
    /// Parking lots
    Parking {
        #[command(subcommand)]
        action: ParkingAction,
    },
    /// Reservations
    Reservations {
        #[command(subcommand)]
        action: ReservationAction,
    },
    /// Penalties
    Penalties {
        #[command(subcommand)]
        action: PenaltyAction,
    },
    /// Station busyness over the analytics window
    Analytics {
        /// Where busyness comes from, overrides [analytics].source
        #[arg(long, value_enum)]
        source: Option<AnalyticsSource>,
        /// Also write the usage table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Render a page and refresh it whenever its tables change
    Watch {
        #[arg(value_enum)]
        page: Page,
        /// Search filter for the reservations page
        #[arg(long, default_value = "")]
        search: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum StationAction {
    List,
    Add(StationArgs),
    Update {
        id: RowId,
        #[command(flatten)]
        fields: StationArgs,
    },
    Delete {
        id: RowId,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct StationArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub total_ports: Option<u32>,
    #[arg(long)]
    pub available_ports: Option<u32>,
    #[arg(long)]
    pub status: Option<StationStatus>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ParkingAction {
    List,
    Add(ParkingArgs),
    Update {
        id: RowId,
        #[command(flatten)]
        fields: ParkingArgs,
    },
    Delete {
        id: RowId,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct ParkingArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub total_spaces: Option<u32>,
    #[arg(long)]
    pub available_spaces: Option<u32>,
    #[arg(long)]
    pub hourly_rate: Option<f64>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ReservationAction {
    List {
        /// Filter by user name, station name or status (case-insensitive)
        #[arg(short, long, default_value = "")]
        search: String,
    },
    Add(ReservationArgs),
    Update {
        id: RowId,
        #[command(flatten)]
        fields: ReservationArgs,
    },
    Delete {
        id: RowId,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct ReservationArgs {
    #[arg(long)]
    pub user_id: Option<RowId>,
    #[arg(long)]
    pub station_id: Option<RowId>,
    #[arg(long)]
    pub slot: Option<String>,
    /// Start time, RFC 3339 or "YYYY-MM-DD HH:MM:SS" (UTC)
    #[arg(long)]
    pub start: Option<String>,
    /// End time, RFC 3339 or "YYYY-MM-DD HH:MM:SS" (UTC)
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub status: Option<ReservationStatus>,
    #[arg(long)]
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum PenaltyAction {
    List,
    Add(PenaltyArgs),
    Update {
        id: RowId,
        #[command(flatten)]
        fields: PenaltyArgs,
    },
    /// Flip a penalty between paid and unpaid
    Toggle {
        id: RowId,
    },
    Delete {
        id: RowId,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct PenaltyArgs {
    #[arg(long)]
    pub reservation_id: Option<RowId>,
    #[arg(long)]
    pub reason: Option<String>,
    #[arg(long)]
    pub amount: Option<String>,
    #[arg(long)]
    pub status: Option<PenaltyStatus>,
}

impl CliConfig {
    /// 合併設定檔與命令列參數；設定檔不存在時只使用命令列與環境變數
    pub fn resolve(&self) -> Result<AdminConfig> {
        let mut config = if self.config.exists() {
            tracing::debug!("Loading configuration from {}", self.config.display());
            AdminConfig::from_file(&self.config)?
        } else {
            tracing::debug!(
                "No configuration file at {}, using defaults",
                self.config.display()
            );
            AdminConfig::default()
        };

        if let Some(url) = &self.url {
            config.store.url = url.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.store.api_key = api_key.clone();
        }
        if let Some(seconds) = self.poll_interval {
            config.watch = Some(WatchConfig {
                poll_interval_seconds: Some(seconds),
            });
        }
        if let Command::Analytics {
            source: Some(source),
            ..
        } = &self.command
        {
            let mut analytics = config.analytics.take().unwrap_or(AnalyticsConfig {
                source: None,
                window_days: None,
            });
            analytics.source = Some(*source);
            config.analytics = Some(analytics);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reservation_search() {
        let cli = CliConfig::try_parse_from([
            "chargepark-admin",
            "reservations",
            "list",
            "--search",
            "north",
        ])
        .unwrap();

        match cli.command {
            Command::Reservations {
                action: ReservationAction::List { search },
            } => assert_eq!(search, "north"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_station_update_with_status() {
        let cli = CliConfig::try_parse_from([
            "chargepark-admin",
            "stations",
            "update",
            "3",
            "--status",
            "maintenance",
        ])
        .unwrap();

        match cli.command {
            Command::Stations {
                action: StationAction::Update { id, fields },
            } => {
                assert_eq!(id, 3);
                assert_eq!(fields.status, Some(StationStatus::Maintenance));
                assert_eq!(fields.name, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let parsed = CliConfig::try_parse_from([
            "chargepark-admin",
            "penalties",
            "add",
            "--status",
            "waived",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chargepark.toml");
        std::fs::write(
            &path,
            "[store]\nurl = \"https://file.example.com\"\napi_key = \"file-key\"\n",
        )
        .unwrap();

        let cli = CliConfig::try_parse_from([
            "chargepark-admin",
            "--config",
            path.to_str().unwrap(),
            "--url",
            "https://flag.example.com",
            "--poll-interval",
            "9",
            "analytics",
            "--source",
            "local",
        ])
        .unwrap();
        let config = cli.resolve().unwrap();

        assert_eq!(config.store.url, "https://flag.example.com");
        assert_eq!(config.store.api_key, "file-key");
        assert_eq!(config.poll_interval().as_secs(), 9);
        assert_eq!(config.analytics_source(), AnalyticsSource::Local);
    }
}
