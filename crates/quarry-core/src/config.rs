//! Configuration management for Quarry services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Plain deployment variables (`NEO4J_URI`, `GOOGLE_ADK_MODEL`, ...)
//! 2. Environment variables (`QUARRY__` prefix, `__` separator)
//! 3. Config file (`quarry.toml`)
//! 4. Defaults (the public companies demo database)
//!
//! A `.env` file in the working directory is read first, so its values act
//! as environment variables.

use serde::{Deserialize, Serialize};

use crate::error::QuarryError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuarryConfig {
    #[serde(default)]
    pub neo4j: Neo4jSettings,

    #[serde(default)]
    pub agent: AgentSettings,
}

/// Connection settings for the graph store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_companies")]
    pub username: String,

    #[serde(default = "default_companies")]
    pub password: String,

    /// Database name used by the toolbox source definition.
    #[serde(default = "default_companies")]
    pub database: String,

    /// Size of the driver connection pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Rows pulled per network round trip.
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

/// Settings for the hosting agent framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Model name handed to the agent framework.
    #[serde(default = "default_model")]
    pub model: String,

    /// Use the Vertex AI backend instead of the public API.
    #[serde(default)]
    pub use_vertex_ai: bool,

    /// SSE endpoint of the external MCP toolbox service.
    #[serde(default = "default_toolbox_url")]
    pub mcp_toolbox_url: String,

    /// Where the generated toolbox YAML is written.
    #[serde(default = "default_toolbox_output")]
    pub toolbox_output: String,
}

fn default_uri() -> String {
    "neo4j+s://demo.neo4jlabs.com".to_string()
}

fn default_companies() -> String {
    "companies".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_toolbox_url() -> String {
    "https://toolbox-990868019953.us-central1.run.app/mcp/sse".to_string()
}

fn default_toolbox_output() -> String {
    "investment_agent/.adk/tools.yaml".to_string()
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            username: default_companies(),
            password: default_companies(),
            database: default_companies(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            use_vertex_ai: false,
            mcp_toolbox_url: default_toolbox_url(),
            toolbox_output: default_toolbox_output(),
        }
    }
}

impl AgentSettings {
    /// Name of the model backend the host framework should talk to.
    pub fn backend(&self) -> &'static str {
        if self.use_vertex_ai {
            "vertex-ai"
        } else {
            "gemini-api"
        }
    }
}

impl QuarryConfig {
    /// Load configuration from `<file_prefix>.toml`, `QUARRY__*` variables,
    /// and the plain deployment variables, then validate it.
    pub fn load(file_prefix: &str) -> Result<Self, QuarryError> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("QUARRY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut loaded: QuarryConfig = cfg.try_deserialize()?;
        loaded.apply_overrides(|key| std::env::var(key).ok());
        loaded.validate()?;
        Ok(loaded)
    }

    /// Apply the plain variable names used by existing deployments.
    ///
    /// Empty values are ignored so a blank line in `.env` never wipes a default.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("NEO4J_URI") {
            self.neo4j.uri = v;
        }
        if let Some(v) = get("NEO4J_USERNAME") {
            self.neo4j.username = v;
        }
        if let Some(v) = get("NEO4J_PASSWORD") {
            self.neo4j.password = v;
        }
        if let Some(v) = get("NEO4J_DATABASE") {
            self.neo4j.database = v;
        }
        if let Some(v) = get("GOOGLE_ADK_MODEL") {
            self.agent.model = v;
        }
        if let Some(v) = get("GOOGLE_GENAI_USE_VERTEXAI") {
            self.agent.use_vertex_ai = parse_flag(&v);
        }
        if let Some(v) = get("MCP_TOOLBOX_URL") {
            self.agent.mcp_toolbox_url = v;
        }
    }

    /// Reject configurations that cannot possibly connect.
    pub fn validate(&self) -> Result<(), QuarryError> {
        let required = [
            ("neo4j.uri", &self.neo4j.uri),
            ("neo4j.username", &self.neo4j.username),
            ("neo4j.password", &self.neo4j.password),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(QuarryError::Config(format!("{name} must not be empty")));
            }
        }
        if self.neo4j.max_connections == 0 {
            return Err(QuarryError::Config(
                "neo4j.max_connections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
