//! Raw requests against arbitrary paths.

use qryti_client::RequestOptions;
use qryti_core::error::{QrytiError, QrytiResult};
use serde_json::Value;

use super::CommandContext;

pub async fn get(path: &str, query: &[String], ctx: &CommandContext) -> QrytiResult<()> {
    let options = RequestOptions::new().with_query(parse_query(query)?);
    let value = ctx.client.get(path, options).await?;
    ctx.output.json(&value);
    Ok(())
}

pub async fn post(path: &str, data: &str, ctx: &CommandContext) -> QrytiResult<()> {
    let body = parse_body(data)?;
    let value = ctx.client.post(path, &body, RequestOptions::new()).await?;
    ctx.output.json(&value);
    Ok(())
}

pub async fn put(path: &str, data: &str, ctx: &CommandContext) -> QrytiResult<()> {
    let body = parse_body(data)?;
    let value = ctx.client.put(path, &body, RequestOptions::new()).await?;
    ctx.output.json(&value);
    Ok(())
}

pub async fn delete(path: &str, ctx: &CommandContext) -> QrytiResult<()> {
    let value = ctx.client.delete(path, RequestOptions::new()).await?;
    if !value.is_null() {
        ctx.output.json(&value);
    }
    ctx.output.success(&format!("Deleted {}", path));
    Ok(())
}

/// Parse `--data` as JSON
pub fn parse_body(data: &str) -> QrytiResult<Value> {
    serde_json::from_str(data).map_err(|e| QrytiError::ConfigValidation {
        field: "data".to_string(),
        reason: format!("not valid JSON: {}", e),
    })
}

/// Parse repeated `key=value` query arguments
pub fn parse_query(pairs: &[String]) -> QrytiResult<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(QrytiError::ConfigValidation {
                field: "query".to_string(),
                reason: format!("expected KEY=VALUE, got '{}'", pair),
            }),
        })
        .collect()
}
