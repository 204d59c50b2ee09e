use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use devpanel::{Consistency, EmptyReplies};
use std::path::PathBuf;

pub fn parse() -> Cli {
    Cli::parse()
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Turn console debugging information on
    #[arg(short, long)]
    pub console: bool,

    /// Log to a file
    #[arg(short, long, value_name = "FILE", default_value = "devpanel.log")]
    pub log_file: PathBuf,

    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Device API root, overrides DEVPANEL_API_URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds, overrides DEVPANEL_TIMEOUT_SECS
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Which of two overlapping fetches of the same resource wins
    #[arg(long, value_enum)]
    pub consistency: Option<Consistency>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show telemetry and device settings
    Status,

    /// Edit device settings
    Config(ConfigArgs),

    /// Switch maintenance mode
    Maintenance {
        #[arg(value_enum)]
        switch: Switch,
    },

    /// SDI-12 sensor management
    Sensor {
        #[command(subcommand)]
        action: SensorAction,
    },

    /// Send raw SDI-12 commands read from stdin
    Monitor {
        /// Keep replies without any response text in the history
        #[arg(long, value_enum)]
        empty_replies: Option<EmptyReplies>,
    },

    /// Interactive page session
    Shell {
        /// Terminal width the layout is computed for
        #[arg(short, long, default_value_t = 80)]
        width: u16,

        #[arg(long, value_enum)]
        empty_replies: Option<EmptyReplies>,
    },
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub id: Option<String>,

    #[arg(long)]
    pub ssid: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Minutes between transmissions
    #[arg(long)]
    pub interval: Option<u32>,

    /// YYYY-MM-DD, local time
    #[arg(long, requires = "first_send_time")]
    pub first_send_date: Option<String>,

    /// HH:MM, local time
    #[arg(long, requires = "first_send_date")]
    pub first_send_time: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum Switch {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum SensorAction {
    /// Create a sensor with the device defaults
    Add { name: String },

    /// Change a sensor, starting from its current settings
    Update {
        name: String,

        #[command(flatten)]
        fields: SensorFields,
    },

    Rename { name: String, new_name: String },

    Delete { name: String },

    /// Read the sensor once
    Test { name: String },
}

#[derive(Args)]
pub struct SensorFields {
    /// SDI-12 address
    #[arg(long)]
    pub address: Option<String>,

    /// Seconds
    #[arg(long)]
    pub bootup_time: Option<u32>,

    /// Minutes
    #[arg(long)]
    pub record_interval: Option<u32>,

    #[arg(long)]
    pub enabled: Option<bool>,

    /// Number of readings, pads or truncates
    #[arg(long, value_name = "N")]
    pub readings: Option<usize>,

    /// Full readings list as a JSON array, replaces the current one
    #[arg(long, value_name = "JSON", conflicts_with = "readings")]
    pub reading_json: Option<String>,
}
