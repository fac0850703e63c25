//! demo cli & tracing configs

pub mod cli {
    //! Parse from either cli or env var

    /// Default store server set
    pub static DEFAULT_SERVERS: &str = "127.0.0.1:2181";
    /// Default subtree the demo works under
    pub static DEFAULT_BASE_PATH: &str = "/ns/demo/zns";
    /// Default short name registered for the base path
    pub static DEFAULT_SHORT_NAME: &str = "zns-demo";
    /// Seconds the demo lingers after the walk to observe watch refreshes
    pub const DEFAULT_LINGER: u64 = 20;
    /// tokio worker thread name
    pub static DEFAULT_THREAD_NAME: &str = "zns-worker";
    /// default log level. Can use this argument or ZNS_LOG env var
    pub const DEFAULT_ZNS_LOG: &str = "info";

    pub use clap::Parser;

    #[derive(Parser, Debug, Clone, PartialEq, Eq)]
    #[clap(author, name = "zns", bin_name = "zns", about, long_about = None)]
    /// parses from cli & environment var. zns will load `.env` in the current dir as well
    pub struct Config {
        /// comma-separated host:port list identifying the store server set
        #[clap(short, long, value_parser, env, default_value = DEFAULT_SERVERS)]
        pub servers: String,
        /// subtree whose children are the demo's instances
        #[clap(short, long, value_parser, env, default_value = DEFAULT_BASE_PATH)]
        pub base_path: String,
        /// short name to register for the base path
        #[clap(long, env, value_parser, default_value = DEFAULT_SHORT_NAME)]
        pub short_name: String,
        /// seconds to keep running after the walk so watch-driven refreshes
        /// are observable
        #[clap(long, env, value_parser, default_value_t = DEFAULT_LINGER)]
        pub linger: u64,
        /// Worker thread name
        #[clap(long, env, value_parser, default_value = DEFAULT_THREAD_NAME)]
        pub thread_name: String,
        /// number of tokio worker threads, default is num logical CPUs
        #[clap(long, env, value_parser)]
        pub threads: Option<usize>,
        /// set the log level. All valid RUST_LOG arguments are accepted
        #[clap(long, env, value_parser, default_value = DEFAULT_ZNS_LOG)]
        pub zns_log: String,
    }
}

pub mod trace {
    //! tracing configuration
    use anyhow::Result;
    use tracing_subscriber::{
        filter::EnvFilter,
        fmt::{
            self,
            format::{Format, PrettyFields},
        },
        prelude::__tracing_subscriber_SubscriberExt,
        util::SubscriberInitExt,
    };

    /// log as "json" or "standard" (unstructured)
    static DEFAULT_LOG_FORMAT: &str = "standard";

    /// Configuration for log output
    #[derive(Debug)]
    pub struct Config {
        /// formatting to apply to logs
        pub log_frmt: String,
    }

    impl Config {
        /// Install the global subscriber. Log level comes from ZNS_LOG
        pub fn parse(zns_log: &str) -> Result<Self> {
            let log_frmt =
                std::env::var("LOG_FORMAT").unwrap_or_else(|_| DEFAULT_LOG_FORMAT.to_owned());

            let filter = EnvFilter::try_new(zns_log).or_else(|_| EnvFilter::try_new("info"))?;

            match &log_frmt[..] {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json())
                        .init();
                }
                "pretty" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(
                            fmt::layer()
                                .event_format(
                                    Format::default().pretty().with_source_location(false),
                                )
                                .fmt_fields(PrettyFields::new()),
                        )
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer())
                        .init();
                }
            }

            Ok(Self { log_frmt })
        }
    }
}
