//! CLI entry point for the quarry research tools.
//!
//! Results go to stdout as JSON; logs go to stderr. The `call` subcommand
//! reads a `{"tool": ..., "args": ...}` request from stdin so a host agent
//! framework can drive the tools as a subprocess.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use quarry_core::QuarryConfig;
use quarry_tools::toolbox;
use quarry_tools::{ResearchTools, ToolCall, ToolResponse};

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Read-only Neo4j research tools for LLM agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: quarry).
    #[arg(short, long, default_value = "quarry", global = true)]
    config: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the graph schema.
    Schema,
    /// Run a read-only Cypher query.
    Query {
        /// The Cypher query.
        query: String,
        /// Named parameters as a JSON object.
        #[arg(long)]
        params: Option<String>,
    },
    /// List the investors of a company by exact name or id.
    Investors {
        /// Company name or id.
        company: String,
    },
    /// Count all nodes in the database.
    NodeCount,
    /// Dispatch a tool call read as JSON from stdin.
    Call,
    /// Print the tool catalogue.
    Tools,
    /// Generate the MCP toolbox configuration.
    ToolboxYaml {
        /// Output path (default: agent.toolbox_output).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print to stdout instead of writing a file.
        #[arg(long)]
        stdout: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if cli.json_logs {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    let config = QuarryConfig::load(&cli.config)?;
    // The agent section is consumed by the host framework; quarry only reports it.
    tracing::debug!(
        model = %config.agent.model,
        backend = config.agent.backend(),
        toolbox_url = %config.agent.mcp_toolbox_url,
        "Agent settings"
    );

    match cli.command {
        Command::Tools => {
            println!("{}", serde_json::to_string_pretty(&ResearchTools::catalogue())?);
        }
        Command::ToolboxYaml { output, stdout } => {
            if stdout {
                print!("{}", toolbox::render_toolbox_yaml(&config.neo4j)?);
            } else {
                let path = output.unwrap_or_else(|| PathBuf::from(&config.agent.toolbox_output));
                toolbox::write_toolbox_yaml(&config.neo4j, &path)?;
                eprintln!(
                    "Generated {} (serve it behind {})",
                    path.display(),
                    config.agent.mcp_toolbox_url
                );
            }
        }
        command => {
            let tools = ResearchTools::connect(&config.neo4j).await?;
            let response = run(&tools, command).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

async fn run(tools: &ResearchTools, command: Command) -> anyhow::Result<ToolResponse> {
    let response = match command {
        Command::Schema => tools.get_schema().await,
        Command::Query { query, params } => {
            let params = params
                .as_deref()
                .map(serde_json::from_str::<serde_json::Map<String, serde_json::Value>>)
                .transpose()?;
            tools.execute_read_query(&query, params).await
        }
        Command::Investors { company } => tools.get_investors(&company).await,
        Command::NodeCount => tools.node_count().await,
        Command::Call => {
            let input = std::io::read_to_string(std::io::stdin())?;
            let call: ToolCall = serde_json::from_str(&input)?;
            tools.call(call).await
        }
        Command::Tools | Command::ToolboxYaml { .. } => {
            anyhow::bail!("command does not need a database connection")
        }
    };
    Ok(response)
}
