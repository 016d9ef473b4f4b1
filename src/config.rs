use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_RXNAV_URL: &str = "https://rxnav.nlm.nih.gov/REST";
pub const DEFAULT_SPREADSHEET_URL: &str = "https://www.340besp.com/ndcs";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub rxnav: RxNavConfig,
    pub spreadsheet: SpreadsheetConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    /// Serve streamable HTTP on this port instead of stdio
    pub port: Option<u16>,
    pub bind_address: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RxNavConfig {
    pub base_url: String,
    /// Unset means requests may block as long as the transport allows
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpreadsheetConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    pub approximate_candidates: u32,
}

impl Config {
    /// Load configuration, layering an optional explicit file over `config/default`
    pub fn load_from(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mut builder = config::Config::builder()
            .set_default("server.name", "340b-drugs")?
            .set_default("server.version", "1.0.0")?
            .set_default("server.bind_address", "0.0.0.0")?
            .set_default("rxnav.base_url", DEFAULT_RXNAV_URL)?
            .set_default("spreadsheet.url", DEFAULT_SPREADSHEET_URL)?
            .set_default("batch.approximate_candidates", 3)?
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("NDC340B")
                .separator("__")
                .try_parsing(true),
        );

        // Hosting platforms hand out the port through a bare PORT variable
        if let Ok(port) = std::env::var("PORT") {
            if !port.trim().is_empty() {
                builder = builder.set_override("server.port", port.trim())?;
            }
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.rxnav.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid RxNav base URL: {}", e))?;
        url::Url::parse(&self.spreadsheet.url)
            .map_err(|e| anyhow::anyhow!("Invalid spreadsheet URL: {}", e))?;
        if self.batch.approximate_candidates == 0 {
            anyhow::bail!("batch.approximate_candidates must be positive");
        }
        Ok(())
    }

    pub fn rxnav_timeout(&self) -> Option<Duration> {
        self.rxnav.timeout_secs.map(Duration::from_secs)
    }

    /// HTTP listen address when a port is configured
    pub fn http_address(&self) -> Option<String> {
        self.server
            .port
            .map(|port| format!("{}:{}", self.server.bind_address, port))
    }
}
