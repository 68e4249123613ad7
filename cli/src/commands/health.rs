use crate::OutputFormat;
use anyhow::Result;
use colored::*;
use serde_json::{json, Value};
use std::process::ExitCode;
use tracing::debug;

/// Probe the server's health endpoint
pub async fn execute(base_url: &str, app_id: &str, format: OutputFormat) -> Result<ExitCode> {
    let url = health_url(base_url);
    debug!("Requesting {} as {}", url, app_id);

    let status = match reqwest::Client::new()
        .get(&url)
        .header("AppId", app_id)
        .send()
        .await
    {
        Ok(response) => {
            let code = response.status();
            let body: Value = response
                .json()
                .await
                .unwrap_or_else(|_| json!({}));
            json!({
                "endpoint": url,
                "http_status": code.as_u16(),
                "reachable": true,
                "body": body,
            })
        }
        Err(e) => json!({
            "endpoint": url,
            "reachable": false,
            "message": format!("API server is not running or not reachable: {}", e),
        }),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&status)?),
        OutputFormat::Text => print_health_status_text(&status),
    }

    Ok(if is_healthy(&status) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn is_healthy(status: &Value) -> bool {
    status["http_status"].as_u64() == Some(200)
}

fn health_url(base_url: &str) -> String {
    format!("{}/api/v1/health", base_url.trim_end_matches('/'))
}

fn print_health_status_text(status: &Value) {
    println!("{}", "=== Bookshelf Server Health Check ===".bold());
    println!("Endpoint: {}", status["endpoint"].as_str().unwrap_or(""));

    if status["reachable"] != json!(true) {
        println!("Status: {}", "OFFLINE".white().bold());
        if let Some(message) = status["message"].as_str() {
            println!("  {}", message);
        }
        return;
    }

    let display = match status["http_status"].as_u64() {
        Some(200) => "HEALTHY".green().bold(),
        Some(401) => "UNAUTHORIZED".red().bold(),
        Some(503) => "DEGRADED".yellow().bold(),
        _ => "UNHEALTHY".red().bold(),
    };
    println!("Status: {}", display);

    let body = &status["body"];
    if let Some(version) = body["version"].as_str() {
        println!("Version: {}", version);
    }
    if let Some(message) = body["database"]["message"].as_str() {
        println!("Database: {}", message);
    }
    if let Some(title) = body["title"].as_str() {
        println!("  {}", title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_url() {
        assert_eq!(
            health_url("http://localhost:3030/"),
            "http://localhost:3030/api/v1/health"
        );
        assert_eq!(
            health_url("http://shelf.internal"),
            "http://shelf.internal/api/v1/health"
        );
    }

    #[test]
    fn test_only_ok_is_healthy() {
        assert!(is_healthy(&json!({ "reachable": true, "http_status": 200 })));
        assert!(!is_healthy(&json!({ "reachable": true, "http_status": 503 })));
        assert!(!is_healthy(&json!({ "reachable": false })));
    }
}
