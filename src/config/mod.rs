use crate::lint::LintPolicy;
use crate::validation::ValidatorSettings;
use anyhow::Error;
use confique::Config;
use std::{
    net::IpAddr,
    sync::{Arc, OnceLock},
    time::Duration,
};

#[derive(Debug, Config)]
pub struct PushProxyConfig {
    #[config(env = "PUSHPROXY_PORT", default = 6000)]
    pub port: u16,
    #[config(env = "PUSHPROXY_ENDPOINT", default = "127.0.0.1")]
    pub endpoint: IpAddr,

    #[config(env = "PUSHPROXY_HTTP_BODY_LIMIT", default = "10mb")]
    pub http_body_limit: String,

    #[config(env = "PUSHPROXY_HTTP_SERVER_TIMEOUT_SECONDS", default = 30)]
    pub http_server_timeout_seconds: u64,

    /// `builtin`, or the URL of a lint service.
    #[config(env = "PUSHPROXY_LINT_BACKEND", default = "builtin")]
    pub lint_backend: String,

    #[config(env = "PUSHPROXY_LINT_TIMEOUT_SECONDS", default = 10)]
    pub lint_timeout_seconds: u64,

    #[config(env = "PUSHPROXY_LINT_POLICY", default = "strict")]
    pub lint_policy: String,

    /// 0 disables the timeout.
    #[config(env = "PUSHPROXY_GATEWAY_TIMEOUT_SECONDS", default = 10)]
    pub gateway_timeout_seconds: u64,

    /// Base URL used by the `/metrics/job/...` passthrough route.
    #[config(env = "PUSHPROXY_GATEWAY_URL")]
    pub gateway_url: Option<String>,

    #[config(
        env = "PUSHPROXY_ALLOWED_GATEWAYS",
        parse_env = confique::env::parse::list_by_comma,
        default = []
    )]
    pub allowed_gateways: Vec<String>,

    #[config(env = "PUSHPROXY_REQUIRE_HELP", default = true)]
    pub require_help: bool,

    #[config(
        env = "PUSHPROXY_PERMITTED_RESERVED_LABELS",
        parse_env = confique::env::parse::list_by_comma,
        default = []
    )]
    pub permitted_reserved_labels: Vec<String>,

    #[config(env = "PUSHPROXY_ALLOW_NON_FINITE_GAUGES", default = false)]
    pub allow_non_finite_gauges: bool,

    #[config(env = "PUSHPROXY_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

impl PushProxyConfig {
    pub fn load() -> Result<PushProxyConfig, Error> {
        let c = PushProxyConfig::builder()
            .env()
            .file("settings.toml")
            .load()?;

        Ok(c)
    }

    pub fn parse_http_body_limit(&self) -> Result<usize, Error> {
        let size = byte_unit::Byte::parse_str(self.http_body_limit.clone(), true)?.as_u64();
        if size > 128 * 1024 * 1024 * 1024 {
            anyhow::bail!("Body size is too big: > 128GB");
        }
        Ok(size as usize)
    }

    pub fn parse_lint_policy(&self) -> Result<LintPolicy, Error> {
        self.lint_policy.parse()
    }

    pub fn lint_timeout(&self) -> Duration {
        Duration::from_secs(self.lint_timeout_seconds)
    }

    pub fn gateway_timeout(&self) -> Option<Duration> {
        match self.gateway_timeout_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }

    pub fn validator_settings(&self) -> ValidatorSettings {
        let clean = |values: &[String]| -> Vec<String> {
            values
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect()
        };
        ValidatorSettings {
            require_help: self.require_help,
            permitted_reserved_labels: clean(&self.permitted_reserved_labels),
            allow_non_finite_gauges: self.allow_non_finite_gauges,
            allowed_gateways: clean(&self.allowed_gateways),
        }
    }
}

static PUSHPROXY_CONFIG: OnceLock<Arc<PushProxyConfig>> = OnceLock::new();

pub fn get() -> Result<Arc<PushProxyConfig>, Error> {
    PUSHPROXY_CONFIG.get().cloned().ok_or_else(|| {
        Error::msg(
            "Configuration not loaded. Please call load_configuration() before using the configuration",
        )
    })
}

pub fn load_configuration() -> Result<(), Error> {
    if PUSHPROXY_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = PushProxyConfig::load()?;
    PUSHPROXY_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}

use std::sync::Mutex;

#[allow(dead_code)] // Used by integration tests
static TEST_CONFIG_INIT: Mutex<()> = Mutex::new(());

/// Loads the configuration once per test binary.
#[allow(dead_code)] // Used by integration tests
pub fn load_configuration_for_tests() -> Result<(), Error> {
    let _guard = TEST_CONFIG_INIT
        .lock()
        .map_err(|err| Error::msg(format!("Test configuration lock poisoned: {}", err)))?;

    if PUSHPROXY_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = PushProxyConfig::load()?;
    PUSHPROXY_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}
