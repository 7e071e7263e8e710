use clap::{Parser, Subcommand};
use reqwest::{StatusCode, Url};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "record-cli")]
#[command(about = "Command-line client for the record service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a record
    Create { id: String, value: String },
    /// Fetch a record's value
    Get { id: String },
    /// Replace a record's value
    Update { id: String, value: String },
    /// Remove a record
    Delete { id: String },
    /// List all records
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = Url::parse(&cli.url)?;

    let request = match &cli.command {
        Commands::Create { id, value } => client
            .post(data_url(&base, None)?)
            .json(&json!({ "id": id, "value": value })),
        Commands::Get { id } => client.get(data_url(&base, Some(id))?),
        Commands::Update { id, value } => client
            .put(data_url(&base, Some(id))?)
            .json(&json!({ "value": value })),
        Commands::Delete { id } => client.delete(data_url(&base, Some(id))?),
        Commands::List => client.get(data_url(&base, None)?),
    };

    let res = request.send().await?;
    if !print_response(res).await? {
        std::process::exit(1);
    }
    Ok(())
}

/// `{base}/data` or `{base}/data/{id}`, with `id` percent-encoded as a
/// single path segment.
fn data_url(base: &Url, id: Option<&str>) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| format!("{base} cannot be used as a base url"))?;
        segments.pop_if_empty().push("data");
        if let Some(id) = id {
            segments.push(id);
        }
    }
    Ok(url)
}

/// Print the envelope; returns whether the request succeeded.
async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(false);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if status == StatusCode::NO_CONTENT => {}
        Err(_) => println!("{}", text),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:5000").unwrap()
    }

    #[test]
    fn test_data_url() {
        assert_eq!(data_url(&base(), None).unwrap().as_str(), "http://localhost:5000/data");
        assert_eq!(
            data_url(&base(), Some("1")).unwrap().as_str(),
            "http://localhost:5000/data/1"
        );

        let prefixed = Url::parse("http://localhost:5000/api/").unwrap();
        assert_eq!(
            data_url(&prefixed, Some("1")).unwrap().as_str(),
            "http://localhost:5000/api/data/1"
        );
    }

    #[test]
    fn test_id_is_one_segment() {
        let url = data_url(&base(), Some("a/b")).unwrap();
        assert_eq!(url.path(), "/data/a%2Fb");

        let url = data_url(&base(), Some("x?y")).unwrap();
        assert_eq!(url.path(), "/data/x%3Fy");
        assert_eq!(url.query(), None);
    }
}
