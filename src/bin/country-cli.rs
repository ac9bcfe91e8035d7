use clap::{Parser, Subcommand};
use reqwest::Url;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "country-cli")]
#[command(about = "Query a running Country Info API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// National animal of a country
    Animal { country: String },
    /// Capital city and its population
    Capital { country: String },
    /// Currency name, symbol and USD value
    Currency { country: String },
    /// Conversion of the country's currency to INR
    ExchangeRate { country: String },
    /// Dump the Prometheus metrics
    Metrics,
}

impl Commands {
    fn path(&self) -> Vec<&str> {
        match self {
            Commands::Animal { country } => vec!["api", "animal", country],
            Commands::Capital { country } => vec!["api", "capital", country],
            Commands::Currency { country } => vec!["api", "currency", country],
            Commands::ExchangeRate { country } => vec!["api", "exchange-rate", country],
            Commands::Metrics => vec!["api", "metrics"],
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut url = Url::parse(&cli.url)?;
    url.path_segments_mut()
        .map_err(|_| format!("{} cannot be used as a base url", cli.url))?
        .pop_if_empty()
        .extend(cli.command.path());

    let res = client.get(url).send().await?;
    print_response(res, matches!(cli.command, Commands::Metrics)).await
}

async fn print_response(res: reqwest::Response, raw: bool) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    if raw {
        print!("{}", res.text().await?);
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
