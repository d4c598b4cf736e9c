use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "luminary-cli")]
#[command(about = "Management CLI for a running Luminary server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000", env = "LUMINARY_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage environments
    #[command(subcommand)]
    Env(EnvCommands),
    /// Load, show or clear the current spec
    #[command(subcommand)]
    Spec(SpecCommands),
    /// Send a request through the proxy
    Call {
        /// Environment ID
        env: String,
        method: String,
        /// Path template, e.g. /items/{id}
        path: String,
        /// Path parameter as name=value (repeatable)
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
        /// Query parameter as name=value (repeatable)
        #[arg(short = 'q', long = "query")]
        query: Vec<String>,
        /// Header as name=value (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
        /// Timeout in seconds
        #[arg(short, long, default_value_t = 30.0)]
        timeout: f64,
    },
}

#[derive(Subcommand)]
enum EnvCommands {
    /// List environments
    List,
    /// Show one environment
    Show { id: String },
    /// Delete an environment
    Delete { id: String },
}

#[derive(Subcommand)]
enum SpecCommands {
    /// Load a spec from a URL
    Load {
        url: String,
        /// Environment whose auth is sent with the root fetch
        #[arg(short, long)]
        env: Option<String>,
    },
    /// Show the current spec summary
    Show,
    /// Clear the current spec
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Env(EnvCommands::List) => {
            client.get(format!("{base}/api/environments")).send().await?
        }
        Commands::Env(EnvCommands::Show { id }) => {
            client.get(format!("{base}/api/environments/{id}")).send().await?
        }
        Commands::Env(EnvCommands::Delete { id }) => {
            client.delete(format!("{base}/api/environments/{id}")).send().await?
        }
        Commands::Spec(SpecCommands::Load { url, env }) => {
            client
                .post(format!("{base}/api/spec/load"))
                .json(&json!({ "url": url, "environment_id": env }))
                .send()
                .await?
        }
        Commands::Spec(SpecCommands::Show) => client.get(format!("{base}/api/spec")).send().await?,
        Commands::Spec(SpecCommands::Clear) => {
            client.delete(format!("{base}/api/spec")).send().await?
        }
        Commands::Call {
            env,
            method,
            path,
            params,
            query,
            headers,
            body,
            timeout,
        } => {
            let body: Option<Value> = body.as_deref().map(serde_json::from_str).transpose()?;
            client
                .post(format!("{base}/api/proxy/execute"))
                .json(&json!({
                    "environment_id": env,
                    "method": method,
                    "path": path,
                    "path_params": pairs(&params)?,
                    "query_params": pairs(&query)?,
                    "headers": pairs(&headers)?,
                    "body": body,
                    "timeout": timeout,
                }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

/// Parse repeated `name=value` arguments into a JSON object.
fn pairs(items: &[String]) -> Result<Value, String> {
    let mut map = serde_json::Map::new();
    for item in items {
        let (name, value) = item
            .split_once('=')
            .ok_or_else(|| format!("expected name=value, got '{item}'"))?;
        map.insert(name.to_string(), Value::String(value.to_string()));
    }
    Ok(Value::Object(map))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Luminary returned status {}", status);
        if let Ok(text) = res.text().await {
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            eprintln!("Detail: {}", detail);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
