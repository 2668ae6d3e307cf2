use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::multipart;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for a running patent relay", long_about = None)]
struct Cli {
    /// Relay base URL
    #[arg(short, long, default_value = "http://localhost:3001")]
    relay: String,

    /// Origin header to send (must be on the relay's allow list when set)
    #[arg(long)]
    origin: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay liveness
    Health,
    /// Fetch a URL through the relay
    Fetch {
        /// Upstream URL
        url: String,
        /// Write the body to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a document for conversion
    Upload {
        /// File to upload
        file: PathBuf,
        /// MIME type sent with the file
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
        /// Write the converted body to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let relay = cli.relay.trim_end_matches('/');

    let mut headers = reqwest::header::HeaderMap::new();
    if let Some(origin) = &cli.origin {
        headers.insert(reqwest::header::ORIGIN, origin.parse()?);
    }

    match cli.command {
        Commands::Health => {
            let res = client
                .get(format!("{}/health", relay))
                .headers(headers)
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::Fetch { url, output } => {
            let res = client
                .get(format!("{}/api/proxy", relay))
                .query(&[("url", url.as_str())])
                .headers(headers)
                .send()
                .await?;
            write_body(res, output).await?;
        }
        Commands::Upload { file, mime, output } => {
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();
            let part = multipart::Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(&mime)?;
            let form = multipart::Form::new().part("file", part);
            let res = client
                .post(format!("{}/api/upload", relay))
                .multipart(form)
                .headers(headers)
                .send()
                .await?;
            write_body(res, output).await?;
        }
    }

    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn write_body(
    res: reqwest::Response,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_redirection() {
        let location = res
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("<none>");
        println!("{} -> {}", status, location);
        return Ok(());
    }
    if !status.is_success() {
        return print_json(res).await;
    }

    let content_type = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let body = res.bytes().await?;
    match output {
        Some(path) => {
            tokio::fs::write(&path, &body).await?;
            eprintln!("{} ({} bytes, {}) -> {}", status, body.len(), content_type, path.display());
        }
        None => {
            eprintln!("{} ({} bytes, {})", status, body.len(), content_type);
            println!("{}", String::from_utf8_lossy(&body));
        }
    }
    Ok(())
}
