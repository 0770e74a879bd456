use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

const XSSI_PREFIX: &str = ")]}'\n";

#[derive(Parser)]
#[command(name = "api-cli")]
#[command(about = "Command-line client for the API gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    /// Justification sent with the call.
    #[arg(short, long)]
    reason: Option<String>,

    /// Ask the gateway to unwrap `{type, value}` envelopes.
    #[arg(long)]
    strip_type_info: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call a GET route
    Get {
        /// Route path, e.g. /api/routes
        path: String,
        /// Query parameter as key=value; repeatable
        #[arg(short, long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
    /// Call a POST route
    Post {
        path: String,
        /// JSON arguments object
        #[arg(long, default_value = "{}")]
        json: String,
        /// File part as name=path; switches to a multipart body
        #[arg(short, long = "file", value_parser = parse_pair)]
        files: Vec<(String, String)>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Get { path, mut query } => {
            if let Some(reason) = &cli.reason {
                query.push(("reason".to_string(), reason.clone()));
            }
            if cli.strip_type_info {
                query.push(("strip_type_info".to_string(), "1".to_string()));
            }
            let res = client
                .get(format!("{}{}", base, path))
                .query(&query)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Post { path, json, files } => {
            let params: Value = serde_json::from_str(&json)?;

            let mut headers = HeaderMap::new();
            if let Some(reason) = &cli.reason {
                let encoded = urlencoding::encode(reason);
                headers.insert("x-api-reason", HeaderValue::from_str(&encoded)?);
            }
            if cli.strip_type_info {
                headers.insert("x-strip-type-info", HeaderValue::from_static("1"));
            }

            let request = client.post(format!("{}{}", base, path)).headers(headers);
            let request = if files.is_empty() {
                request.json(&params)
            } else {
                let mut form = Form::new().text("_params_", params.to_string());
                for (name, file) in files {
                    let path = PathBuf::from(&file);
                    let data = tokio::fs::read(&path).await?;
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or(file);
                    form = form.part(name, Part::bytes(data).file_name(file_name));
                }
                request.multipart(form)
            };
            print_response(request.send().await?).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = text.strip_prefix(XSSI_PREFIX).unwrap_or(&text);

    let rendered = match serde_json::from_str::<Value>(body) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => body.to_string(),
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: API returned status {}", status);
        eprintln!("{}", rendered);
    }
    Ok(())
}
