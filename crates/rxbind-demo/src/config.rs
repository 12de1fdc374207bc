#![forbid(unsafe_code)]

//! Command-line and environment configuration for the demo binary.
//!
//! Environment variables (`RXBIND_*`) override defaults; explicit flags
//! override the environment.

use std::env;
use std::process;
use std::time::Duration;

use crate::screens::{DEFAULT_DELAY, DEFAULT_PATTERN};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
rxbind demo: reactive bindings driving headless screens

USAGE:
    rxbind-demo [OPTIONS]

OPTIONS:
    --scenario=NAME        Scenario to run (default: all)
    --debounce-ms=N        Validation debounce delay in ms (default: 500)
    --pattern=REGEX        Validation pattern (default: e-mail shape)
    --users-url=URL        Fetch users from URL (needs the `http` feature)
    --fetch-timeout-ms=N   Give up on a user load after N ms (default: 5000)
    --log-json             Emit logs as JSON lines
    --help, -h             Show this help message
    --version, -V          Show version

SCENARIOS:
    sequence   Just and array publishers delivering then completing
    users      User list bound to labels; the add button appends users
    validate   Typed text debounced and matched against the pattern
    notify     Add-button announcements on the users.added channel
    fetch      User list loaded on a worker thread into a load state
    all        Every scenario above, in order

ENVIRONMENT VARIABLES:
    RXBIND_LOG                Log filter directives (default: info)
    RXBIND_SCENARIO           Override --scenario
    RXBIND_DEBOUNCE_MS        Override --debounce-ms
    RXBIND_PATTERN            Override --pattern
    RXBIND_USERS_URL          Override --users-url
    RXBIND_FETCH_TIMEOUT_MS   Override --fetch-timeout-ms
    RXBIND_LOG_JSON           Emit JSON logs (1/true)";

/// Which screens the binary drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scenario {
    Sequence,
    Users,
    Validate,
    Notify,
    Fetch,
    #[default]
    All,
}

impl Scenario {
    /// Every single scenario, in the order `All` runs them.
    pub const EACH: [Self; 5] = [
        Self::Sequence,
        Self::Users,
        Self::Validate,
        Self::Notify,
        Self::Fetch,
    ];

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sequence" => Some(Self::Sequence),
            "users" => Some(Self::Users),
            "validate" => Some(Self::Validate),
            "notify" => Some(Self::Notify),
            "fetch" => Some(Self::Fetch),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Users => "users",
            Self::Validate => "validate",
            Self::Notify => "notify",
            Self::Fetch => "fetch",
            Self::All => "all",
        }
    }

    /// The single scenarios this one expands to.
    #[must_use]
    pub fn expand(self) -> Vec<Self> {
        match self {
            Self::All => Self::EACH.to_vec(),
            single => vec![single],
        }
    }
}

/// Parsed demo options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub scenario: Scenario,
    /// Quiet period before typed text is validated.
    pub debounce: Duration,
    pub pattern: String,
    /// Remote user list; `None` serves the built-in sample.
    pub users_url: Option<String>,
    pub fetch_timeout: Duration,
    pub log_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::All,
            debounce: DEFAULT_DELAY,
            pattern: DEFAULT_PATTERN.to_string(),
            users_url: None,
            fetch_timeout: Duration::from_secs(5),
            log_json: false,
        }
    }
}

impl DemoConfig {
    /// Parse command-line arguments and environment variables, exiting the
    /// process on `--help`, `--version`, or a bad flag.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(config) => config,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("rxbind-demo {VERSION}");
                process::exit(0);
            }
            Err(ParseError::InvalidValue { flag, value }) => {
                eprintln!("Invalid {flag} value: {value}");
                process::exit(2);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(2);
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = get_env("RXBIND_SCENARIO")
            && let Some(scenario) = Scenario::from_name(&val)
        {
            config.scenario = scenario;
        }
        if let Some(val) = get_env("RXBIND_DEBOUNCE_MS")
            && let Ok(ms) = val.trim().parse()
        {
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(val) = get_env("RXBIND_PATTERN")
            && !val.is_empty()
        {
            config.pattern = val;
        }
        if let Some(val) = get_env("RXBIND_USERS_URL")
            && !val.trim().is_empty()
        {
            config.users_url = Some(val);
        }
        if let Some(val) = get_env("RXBIND_FETCH_TIMEOUT_MS")
            && let Ok(ms) = val.trim().parse()
        {
            config.fetch_timeout = Duration::from_millis(ms);
        }
        if let Some(val) = get_env("RXBIND_LOG_JSON") {
            config.log_json = val == "1" || val.eq_ignore_ascii_case("true");
        }

        // Flags override the environment.
        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                "--log-json" => config.log_json = true,
                other => {
                    if let Some(val) = other.strip_prefix("--scenario=") {
                        config.scenario =
                            Scenario::from_name(val).ok_or_else(|| ParseError::InvalidValue {
                                flag: "--scenario",
                                value: val.to_string(),
                            })?;
                    } else if let Some(val) = other.strip_prefix("--debounce-ms=") {
                        config.debounce = Duration::from_millis(parse_ms("--debounce-ms", val)?);
                    } else if let Some(val) = other.strip_prefix("--pattern=") {
                        if val.is_empty() {
                            return Err(ParseError::InvalidValue {
                                flag: "--pattern",
                                value: String::new(),
                            });
                        }
                        config.pattern = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--users-url=") {
                        config.users_url = (!val.trim().is_empty()).then(|| val.to_string());
                    } else if let Some(val) = other.strip_prefix("--fetch-timeout-ms=") {
                        config.fetch_timeout =
                            Duration::from_millis(parse_ms("--fetch-timeout-ms", val)?);
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = scenario;
        self
    }

    #[must_use]
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    #[must_use]
    pub fn with_users_url(mut self, url: impl Into<String>) -> Self {
        self.users_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_log_json(mut self, enabled: bool) -> Self {
        self.log_json = enabled;
        self
    }
}

fn parse_ms(flag: &'static str, raw: &str) -> Result<u64, ParseError> {
    raw.trim().parse().map_err(|_| ParseError::InvalidValue {
        flag,
        value: raw.to_string(),
    })
}
