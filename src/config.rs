//! Runtime configuration: command-line flags with environment fallbacks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::crypto::ADDRESS_LEN;
use crate::dispatcher::DispatcherSettings;
use crate::engine::{BruteForceEngine, EngineKind, ExternalEngine, MatchingEngine};
use crate::queue::RedisSettings;
use crate::task::PatternSpec;

/// Longest accepted per-job deadline, one week.
pub const MAX_TASK_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Tron vanity address worker
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Log filter, e.g. `info` or `tron_vanity=debug` (RUST_LOG wins if set)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Consume jobs from the Redis queue until interrupted
    Server(ServerArgs),
    /// Generate addresses directly for a template
    Build(BuildArgs),
}

/// Matching engine selection, shared by both commands.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Matching engine: external or cpu
    #[arg(long, env = "ENGINE", default_value = "external")]
    pub engine: EngineKind,

    /// Path to the external engine binary (default: platform bundle)
    #[arg(long, env = "ENGINE_BINARY")]
    pub engine_binary: Option<PathBuf>,

    /// Number of CPU search threads (default: number of CPU cores)
    #[arg(short = 'w', long, env = "WORKERS")]
    pub workers: Option<usize>,
}

impl EngineArgs {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Builds the selected engine. Each search stops after one match.
    pub fn build_engine(&self) -> Arc<dyn MatchingEngine> {
        match self.engine {
            EngineKind::External => {
                let binary = self
                    .engine_binary
                    .clone()
                    .unwrap_or_else(ExternalEngine::default_binary);
                Arc::new(ExternalEngine::new(binary, 1))
            }
            EngineKind::Cpu => Arc::new(BruteForceEngine::new(self.worker_count())),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Redis address, host:port
    #[arg(long, env = "REDIS_ADDR")]
    pub redis_addr: String,

    #[arg(long, env = "REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,

    #[arg(long, env = "REDIS_DB", default_value = "0")]
    pub redis_db: i64,

    /// Connect timeout in seconds
    #[arg(long, env = "REDIS_DIAL_TIMEOUT", default_value = "5")]
    pub redis_dial_timeout: u64,

    /// Read timeout in seconds
    #[arg(long, env = "REDIS_READ_TIMEOUT", default_value = "5")]
    pub redis_read_timeout: u64,

    /// Write timeout in seconds
    #[arg(long, env = "REDIS_WRITE_TIMEOUT", default_value = "5")]
    pub redis_write_timeout: u64,

    /// List jobs are popped from
    #[arg(long, env = "QUEUE_IN", default_value = "address_producer")]
    pub queue_in: String,

    /// List outcomes are pushed to
    #[arg(long, env = "QUEUE_OUT", default_value = "address_consumer")]
    pub queue_out: String,

    /// Liveness marker key
    #[arg(long, env = "HEARTBEAT_KEY", default_value = "is_worker_alive")]
    pub heartbeat_key: String,

    /// Template list used by the fixed-digit task types
    #[arg(long, env = "TEMPLATE_LIST", default_value = "./profanity.txt")]
    pub template_list: PathBuf,

    /// Per-job deadline in seconds
    #[arg(long, env = "TASK_TIMEOUT", default_value = "1800")]
    pub task_timeout: u64,

    #[command(flatten)]
    pub engine: EngineArgs,
}

impl ServerArgs {
    pub fn redis_settings(&self) -> RedisSettings {
        RedisSettings {
            addr: self.redis_addr.clone(),
            password: self.redis_password.clone(),
            db: self.redis_db,
            dial_timeout: Duration::from_secs(self.redis_dial_timeout),
            read_timeout: Duration::from_secs(self.redis_read_timeout),
            write_timeout: Duration::from_secs(self.redis_write_timeout),
        }
    }

    pub fn dispatcher_settings(&self) -> DispatcherSettings {
        DispatcherSettings {
            in_key: self.queue_in.clone(),
            job_timeout: Duration::from_secs(self.task_timeout),
            ..DispatcherSettings::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Full-length template address to match against
    pub template: String,

    /// Leading characters of the template that must match
    pub prefix_count: usize,

    /// Trailing characters of the template that must match
    pub suffix_count: usize,

    /// How many addresses to generate
    pub quit_count: u32,

    /// Upload every result as JSON to this URL
    #[arg(long, env = "POST_URL")]
    pub post_url: Option<String>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

impl BuildArgs {
    pub fn pattern_spec(&self) -> PatternSpec {
        PatternSpec::from_template(self.template.clone(), self.prefix_count, self.suffix_count)
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.command {
            Command::Server(args) => {
                if args.redis_addr.trim().is_empty() {
                    return Err(ConfigError::MissingValue("REDIS_ADDR"));
                }
                if args.task_timeout == 0 {
                    return Err(ConfigError::Invalid("task timeout must be positive".into()));
                }
                if args.task_timeout > MAX_TASK_TIMEOUT_SECS {
                    return Err(ConfigError::Invalid(format!(
                        "task timeout must be at most {} seconds",
                        MAX_TASK_TIMEOUT_SECS
                    )));
                }
                validate_engine(&args.engine)
            }
            Command::Build(args) => {
                let len = args.template.chars().count();
                if args.prefix_count + args.suffix_count > len {
                    return Err(ConfigError::Invalid(format!(
                        "prefix + suffix count ({}) exceeds template length ({})",
                        args.prefix_count + args.suffix_count,
                        len
                    )));
                }
                if len > ADDRESS_LEN {
                    return Err(ConfigError::Invalid(format!(
                        "template is longer than an address ({} characters)",
                        ADDRESS_LEN
                    )));
                }
                validate_engine(&args.engine)
            }
        }
    }
}

fn validate_engine(engine: &EngineArgs) -> Result<(), ConfigError> {
    if engine.workers == Some(0) {
        return Err(ConfigError::Invalid("workers must be at least 1".into()));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    MissingValue(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
