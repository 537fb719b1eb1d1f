//! Generic resource commands against the REST API.
//!
//! `centro get crm/customers`, `centro create notify/triggers --json ...`,
//! etc. Paths are passed through as-is, so every module endpoint is
//! reachable without the CLI knowing the resource catalogue.

use anyhow::Result;

use crate::config::{ClientConfig, Context};

/// Normalize a user-supplied API path ("crm/customers" → "/crm/customers").
fn api_path(path: &str) -> Result<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        anyhow::bail!("Empty API path.");
    }
    Ok(format!("/{}", trimmed))
}

/// HTTP client helper. `org` overrides the context's default org id.
fn build_client(
    ctx: &Context,
    org: Option<&str>,
) -> Result<(reqwest::blocking::Client, String)> {
    if ctx.server.is_empty() {
        anyhow::bail!(
            "No server URL set for context \"{}\". Run `centro context set {} --server <url>`.",
            ctx.name,
            ctx.name
        );
    }

    let mut headers = reqwest::header::HeaderMap::new();
    if !ctx.token.is_empty() {
        let val = format!("Bearer {}", ctx.token);
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&val)?,
        );
    }
    let org = org
        .map(str::to_string)
        .or_else(|| (!ctx.org.is_empty()).then(|| ctx.org.clone()));
    if let Some(org) = org {
        headers.insert(
            "x-org-id",
            reqwest::header::HeaderValue::from_str(&org)?,
        );
    }

    let client = reqwest::blocking::Client::builder()
        .default_headers(headers)
        .build()?;

    Ok((client, ctx.server.trim_end_matches('/').to_string()))
}

/// Pull the error message out of a `{"code", "message"}` response body.
fn api_error(body: &serde_json::Value) -> &str {
    body["message"].as_str().unwrap_or("unknown error")
}

/// GET a resource (list or get by ID).
pub fn get(
    path: &str,
    id: Option<&str>,
    org: Option<&str>,
    limit: Option<usize>,
    offset: Option<usize>,
    client_config_path: &std::path::Path,
) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context."))?;

    let api_path = api_path(path)?;
    let (client, base_url) = build_client(ctx, org)?;

    let url = if let Some(id) = id {
        format!("{}{}/{}", base_url, api_path, id)
    } else {
        let mut u = format!("{}{}", base_url, api_path);
        let mut params = Vec::new();
        if let Some(l) = limit {
            params.push(format!("limit={}", l));
        }
        if let Some(o) = offset {
            params.push(format!("offset={}", o));
        }
        if !params.is_empty() {
            u.push('?');
            u.push_str(&params.join("&"));
        }
        u
    };

    let resp = client.get(&url).send()?;
    let status = resp.status();
    let body: serde_json::Value = resp.json()?;

    if !status.is_success() {
        anyhow::bail!("Error ({}): {}", status, api_error(&body));
    }

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// CREATE a resource (POST).
pub fn create(
    path: &str,
    json_body: &str,
    org: Option<&str>,
    client_config_path: &std::path::Path,
) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context."))?;

    let api_path = api_path(path)?;
    let (client, base_url) = build_client(ctx, org)?;

    let url = format!("{}{}", base_url, api_path);
    let body: serde_json::Value = serde_json::from_str(json_body)
        .map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))?;

    let resp = client.post(&url).json(&body).send()?;
    let status = resp.status();
    let result: serde_json::Value = resp.json()?;

    if !status.is_success() {
        anyhow::bail!("Error ({}): {}", status, api_error(&result));
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// UPDATE a resource (PATCH).
pub fn update(
    path: &str,
    id: &str,
    json_body: &str,
    org: Option<&str>,
    client_config_path: &std::path::Path,
) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context."))?;

    let api_path = api_path(path)?;
    let (client, base_url) = build_client(ctx, org)?;

    let url = format!("{}{}/{}", base_url, api_path, id);
    let body: serde_json::Value = serde_json::from_str(json_body)
        .map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))?;

    let resp = client.patch(&url).json(&body).send()?;
    let status = resp.status();
    let result: serde_json::Value = resp.json()?;

    if !status.is_success() {
        anyhow::bail!("Error ({}): {}", status, api_error(&result));
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// DELETE a resource.
pub fn delete(
    path: &str,
    id: &str,
    org: Option<&str>,
    client_config_path: &std::path::Path,
) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context."))?;

    let api_path = api_path(path)?;
    let (client, base_url) = build_client(ctx, org)?;

    let url = format!("{}{}/{}", base_url, api_path, id);
    let resp = client.delete(&url).send()?;
    let status = resp.status();

    if !status.is_success() {
        let body: serde_json::Value = resp.json().unwrap_or_default();
        anyhow::bail!("Error ({}): {}", status, api_error(&body));
    }

    println!("{} deleted.", id);
    Ok(())
}

/// STATUS — check server health.
pub fn status(client_config_path: &std::path::Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context."))?;

    println!("Context:   {}", ctx.name);
    println!(
        "Server:    {}",
        if ctx.server.is_empty() { "-" } else { &ctx.server }
    );
    println!(
        "Org:       {}",
        if ctx.org.is_empty() { "-" } else { &ctx.org }
    );

    if ctx.server.is_empty() {
        println!("Status:    no server configured");
        return Ok(());
    }

    let (client, base_url) = build_client(ctx, None)?;
    match client.get(format!("{}/health", base_url)).send() {
        Ok(resp) if resp.status().is_success() => {
            println!("Status:    connected");
        }
        Ok(resp) => {
            println!("Status:    error ({})", resp.status());
        }
        Err(e) => {
            println!("Status:    disconnected ({})", e);
        }
    }
    Ok(())
}
