use clap::{Arg, ArgAction, Command, arg, parser::ValueSource::DefaultValue};
use serde::Deserialize;
use serde_json::Value;
use std::{ffi::OsString, fs, time::Duration};
use toml::from_str;

pub const DEFAULT_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_EXCHANGE: &str = "https://shapeshift.io/";

/// What to do once connected.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Sends one request and prints its result
    Call { method: String, params: Vec<Value> },
    /// Prints the events of a subscription, forever or `count` times
    Watch { name: String, count: Option<usize> },
    /// Follows a deposit address until its exchange settles
    Track { address: String },
    /// Lists the coins supported by the exchange
    Coins,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Args {
    // NOTE: property names match the config file fields
    pub url: String,
    pub logdir: Option<String>,
    #[serde(rename = "loglevel")]
    pub log_level: String,
    /// Milliseconds
    pub request_timeout: u64,
    /// Milliseconds
    pub poll_interval: u64,
    pub exchange: String,
    #[serde(rename = "exchange-key")]
    pub exchange_api_key: Option<String>,
    /// Milliseconds
    pub track_interval: u64,
    #[serde(skip)]
    pub action: Option<Action>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            logdir: None,
            log_level: "info".into(),
            request_timeout: 30_000,
            poll_interval: 1_000,
            exchange: DEFAULT_EXCHANGE.to_string(),
            exchange_api_key: None,
            track_interval: 2_000,
            action: None,
        }
    }
}

impl Args {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    pub fn track_interval(&self) -> Duration {
        Duration::from_millis(self.track_interval)
    }
}

pub fn cli() -> Command {
    let defaults: Args = Default::default();

    Command::new("nodelink")
        .about(format!("{} v{}", env!("CARGO_PKG_DESCRIPTION"), env!("CARGO_PKG_VERSION")))
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg(arg!(-C --configfile <CONFIG_FILE> "Path of config file."))
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .env("NODELINK_URL")
                .value_name("URL")
                .require_equals(true)
                .help(format!("Node endpoint, http(s):// or ws(s):// (default: {}).", defaults.url)),
        )
        .arg(arg!(--logdir <LOG_DIR> "Directory to log output."))
        .arg(
            Arg::new("log_level")
                .short('d')
                .long("loglevel")
                .env("NODELINK_LOG_LEVEL")
                .value_name("LEVEL")
                .default_value("info")
                .require_equals(true)
                .help("Logging level for all subsystems {off, error, warn, info, debug, trace}\n-- You may also specify <subsystem>=<level>,<subsystem2>=<level>,... to set the log level for individual subsystems.".to_string()),
        )
        .arg(
            Arg::new("request-timeout")
                .long("request-timeout")
                .env("NODELINK_REQUEST_TIMEOUT")
                .value_name("MILLIS")
                .require_equals(true)
                .value_parser(clap::value_parser!(u64))
                .help(format!("Request timeout in milliseconds (default: {}).", defaults.request_timeout)),
        )
        .arg(
            Arg::new("poll-interval")
                .long("poll-interval")
                .env("NODELINK_POLL_INTERVAL")
                .value_name("MILLIS")
                .require_equals(true)
                .value_parser(clap::value_parser!(u64))
                .help(format!("Interval of polled subscriptions in milliseconds (default: {}).", defaults.poll_interval)),
        )
        .arg(
            Arg::new("exchange")
                .long("exchange")
                .env("NODELINK_EXCHANGE")
                .value_name("URL")
                .require_equals(true)
                .help(format!("Exchange endpoint used by `track` and `coins` (default: {}).", defaults.exchange)),
        )
        .arg(
            Arg::new("exchange-key")
                .long("exchange-key")
                .env("NODELINK_EXCHANGE_KEY")
                .value_name("KEY")
                .require_equals(true)
                .help("Public exchange API key."),
        )
        .arg(
            Arg::new("track-interval")
                .long("track-interval")
                .value_name("MILLIS")
                .require_equals(true)
                .value_parser(clap::value_parser!(u64))
                .help(format!("Interval of deposit status checks in milliseconds (default: {}).", defaults.track_interval)),
        )
        .subcommand(
            Command::new("call")
                .about("Send one request and print its result")
                .arg(Arg::new("method").required(true).help("Method name, as in eth_blockNumber"))
                .arg(Arg::new("params").action(ArgAction::Append).help("Positional parameters; each is parsed as JSON, or taken as a string")),
        )
        .subcommand(
            Command::new("watch")
                .about("Print the events of a subscription")
                .arg(Arg::new("name").required(true).help("Subscription name, as in eth_blockNumber or newHeads"))
                .arg(
                    Arg::new("count")
                        .short('n')
                        .long("count")
                        .value_parser(clap::value_parser!(usize))
                        .help("Exit after this many events"),
                ),
        )
        .subcommand(
            Command::new("track")
                .about("Follow a deposit address until its exchange settles")
                .arg(Arg::new("address").required(true)),
        )
        .subcommand(Command::new("coins").about("List the coins supported by the exchange"))
}

pub fn parse_args() -> Args {
    match Args::parse(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => err.exit(),
    }
}

impl Args {
    pub fn parse<I, T>(itr: I) -> Result<Args, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let m: clap::ArgMatches = cli().try_get_matches_from(itr)?;
        let mut defaults: Args = Default::default();

        if let Some(config_file) = m.get_one::<String>("configfile") {
            let config_str = fs::read_to_string(config_file)?;
            defaults = from_str(&config_str).map_err(|toml_error| {
                clap::Error::raw(
                    clap::error::ErrorKind::ValueValidation,
                    format!("failed parsing config file, reason: {}", toml_error.message()),
                )
            })?;
        }

        let args = Args {
            url: arg_match_unwrap_or::<String>(&m, "url", defaults.url),
            logdir: m.get_one::<String>("logdir").cloned().or(defaults.logdir),
            log_level: arg_match_unwrap_or::<String>(&m, "log_level", defaults.log_level),
            request_timeout: arg_match_unwrap_or::<u64>(&m, "request-timeout", defaults.request_timeout),
            poll_interval: arg_match_unwrap_or::<u64>(&m, "poll-interval", defaults.poll_interval),
            exchange: arg_match_unwrap_or::<String>(&m, "exchange", defaults.exchange),
            exchange_api_key: m.get_one::<String>("exchange-key").cloned().or(defaults.exchange_api_key),
            track_interval: arg_match_unwrap_or::<u64>(&m, "track-interval", defaults.track_interval),
            action: action(&m),
        };

        Ok(args)
    }
}

fn action(m: &clap::ArgMatches) -> Option<Action> {
    match m.subcommand()? {
        ("call", sub) => Some(Action::Call {
            method: sub.get_one::<String>("method").cloned()?,
            params: sub.get_many::<String>("params").map(|values| values.map(|value| parse_param(value)).collect()).unwrap_or_default(),
        }),
        ("watch", sub) => Some(Action::Watch { name: sub.get_one::<String>("name").cloned()?, count: sub.get_one::<usize>("count").copied() }),
        ("track", sub) => Some(Action::Track { address: sub.get_one::<String>("address").cloned()? }),
        ("coins", _) => Some(Action::Coins),
        _ => None,
    }
}

/// Command-line parameters are JSON when they parse as such, plain strings otherwise.
fn parse_param(value: &str) -> Value {
    serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn arg_match_unwrap_or<T: Clone + Send + Sync + 'static>(m: &clap::ArgMatches, arg_id: &str, default: T) -> T {
    m.get_one::<T>(arg_id).cloned().filter(|_| m.value_source(arg_id) != Some(DefaultValue)).unwrap_or(default)
}
