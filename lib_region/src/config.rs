use clap::{Parser, ValueEnum};

/// How the telemetry consumer counts devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceCounting {
    /// Every successfully decoded message increments the counter. This is a
    /// rate indicator, not a cardinality: repeated messages from the same
    /// device keep incrementing.
    Messages,
    /// Deduplicate by device_id in-process; the reported count is the size
    /// of the set of devices seen this process lifetime.
    Unique,
}

/// When the activity consumer acknowledges a queue message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AckMode {
    /// Auto-acknowledge on delivery (at-most-once; a crash mid-processing
    /// loses the message).
    Before,
    /// Acknowledge after processing finishes. Decode failures are still
    /// acknowledged and dropped.
    After,
}

/// Shared configuration for the server and both consumers. Values come from
/// the environment (after an optional .env file) or the command line, with
/// documented defaults.
#[derive(Parser, Debug, Clone)]
#[clap(about = "Regional state & failover coordination service", version)]
pub struct Config {
    #[clap(long, env = "REGION", default_value = "region1", help = "Identifier of this region.")]
    pub region: String,

    #[clap(long, env = "REDIS_HOST", default_value = "localhost", help = "State store host.")]
    pub redis_host: String,

    #[clap(long, env = "REDIS_PORT", default_value_t = 6379, help = "State store port.")]
    pub redis_port: u16,

    #[clap(long, env = "MQTT_BROKER", default_value = "localhost", help = "MQTT broker host for device telemetry.")]
    pub mqtt_broker: String,

    #[clap(long, env = "MQTT_PORT", default_value_t = 1883, help = "MQTT broker port.")]
    pub mqtt_port: u16,

    #[clap(long, env = "MQTT_TOPIC", default_value = "og/field/#", help = "Telemetry subscription topic (hierarchical wildcard).")]
    pub mqtt_topic: String,

    #[clap(long, env = "RABBITMQ_HOST", default_value = "localhost", help = "RabbitMQ host for user activity.")]
    pub rabbitmq_host: String,

    #[clap(long, env = "RABBITMQ_PORT", default_value_t = 5672, help = "RabbitMQ port.")]
    pub rabbitmq_port: u16,

    #[clap(long, env = "RABBITMQ_USER", default_value = "admin", help = "RabbitMQ user.")]
    pub rabbitmq_user: String,

    #[clap(long, env = "RABBITMQ_PASS", default_value = "admin123", help = "RabbitMQ password.")]
    pub rabbitmq_pass: String,

    #[clap(long, env = "RABBITMQ_QUEUE", default_value = "webapp_active_users", help = "Durable queue carrying activity snapshots.")]
    pub activity_queue: String,

    #[clap(long, env = "HTTP_PORT", default_value_t = 8000, help = "Port for the HTTP status/metrics surface.")]
    pub http_port: u16,

    #[clap(long, env = "LOG_DIR", default_value = "./logs", help = "Directory for log files.")]
    pub log_dir: std::path::PathBuf,

    #[clap(long, env = "LOG_LEVEL", default_value = "info", help = "Logging level (debug, info, warn, error).")]
    pub log_level: String,

    #[clap(long, env = "DEVICE_COUNTING", value_enum, default_value = "messages", help = "Device counting policy: messages (rate indicator) or unique (dedup by device_id).")]
    pub device_counting: DeviceCounting,

    #[clap(long, env = "ACK_MODE", value_enum, default_value = "before", help = "Queue acknowledgement policy: before (auto-ack) or after processing.")]
    pub ack_mode: AckMode,

    #[clap(long, env = "BROKER_RETRY_LIMIT", default_value_t = 10, help = "Connection attempts against a broker before giving up.")]
    pub broker_retry_limit: u32,

    #[clap(long, env = "BROKER_RETRY_DELAY_SECS", default_value_t = 5, help = "Fixed delay between broker connection attempts, in seconds.")]
    pub broker_retry_delay_secs: u64,
}

impl Config {
    /// Loads .env (when present) and then parses environment and CLI.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/", self.redis_host, self.redis_port)
    }

    pub fn amqp_url(&self) -> String {
        format!(
            "amqp://{}:{}@{}:{}/%2f",
            self.rabbitmq_user, self.rabbitmq_pass, self.rabbitmq_host, self.rabbitmq_port
        )
    }

    /// Region-qualified application version string.
    pub fn app_version(&self) -> String {
        format!("v{}_{}", env!("CARGO_PKG_VERSION"), self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Config::command().debug_assert();
    }

    #[test]
    fn urls_are_well_formed() {
        let config = Config::parse_from([
            "test",
            "--region",
            "region1",
            "--redis-host",
            "10.0.0.5",
            "--redis-port",
            "6379",
            "--rabbitmq-user",
            "svc",
        ]);
        assert_eq!(config.redis_url(), "redis://10.0.0.5:6379/");
        assert!(config.amqp_url().starts_with("amqp://svc:"));
        assert!(config.app_version().ends_with("_region1"));
    }
}
