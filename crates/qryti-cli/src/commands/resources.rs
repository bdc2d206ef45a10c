//! Listings of compliance clients, AI models and reports.

use qryti_core::error::{QrytiError, QrytiResult};
use qryti_core::types::{ModelFilters, RiskLevel};

use super::CommandContext;

const MISSING: &str = "-";

pub async fn list_clients(ctx: &CommandContext) -> QrytiResult<()> {
    let clients = ctx.client.clients().list().await?;

    let rows: Vec<Vec<String>> = clients
        .into_iter()
        .map(|client| {
            vec![
                client.id.unwrap_or_else(|| MISSING.to_string()),
                client.name,
                client.industry.unwrap_or_else(|| MISSING.to_string()),
                client.contact_email.unwrap_or_else(|| MISSING.to_string()),
            ]
        })
        .collect();

    ctx.output.table(&["ID", "NAME", "INDUSTRY", "CONTACT"], &rows);
    Ok(())
}

/// Build model filters from command-line flags
pub fn model_filters(
    status: Option<String>,
    risk_level: Option<String>,
    model_type: Option<String>,
    client_id: Option<String>,
) -> QrytiResult<ModelFilters> {
    let risk_level = risk_level
        .map(|level| {
            level
                .parse::<RiskLevel>()
                .map_err(|reason| QrytiError::ConfigValidation {
                    field: "risk-level".to_string(),
                    reason,
                })
        })
        .transpose()?;

    Ok(ModelFilters {
        client_id,
        status,
        risk_level,
        model_type,
    })
}

pub async fn list_models(filters: &ModelFilters, ctx: &CommandContext) -> QrytiResult<()> {
    let models = ctx.client.models().list(filters).await?;

    let rows: Vec<Vec<String>> = models
        .into_iter()
        .map(|model| {
            vec![
                model.id.unwrap_or_else(|| MISSING.to_string()),
                model.name,
                model.client_name.unwrap_or_else(|| MISSING.to_string()),
                model.model_type.unwrap_or_else(|| MISSING.to_string()),
                model
                    .risk_level
                    .map(|level| level.as_str().to_string())
                    .unwrap_or_else(|| MISSING.to_string()),
                model.status.unwrap_or_else(|| MISSING.to_string()),
            ]
        })
        .collect();

    ctx.output
        .table(&["ID", "NAME", "CLIENT", "TYPE", "RISK", "STATUS"], &rows);
    Ok(())
}

pub async fn list_reports(ctx: &CommandContext) -> QrytiResult<()> {
    let reports = ctx.client.reports().list().await?;

    let rows: Vec<Vec<String>> = reports
        .into_iter()
        .map(|report| {
            vec![
                report.id.unwrap_or_else(|| MISSING.to_string()),
                report.title.unwrap_or_else(|| MISSING.to_string()),
                report.report_type.unwrap_or_else(|| MISSING.to_string()),
                report.status.unwrap_or_else(|| MISSING.to_string()),
                report
                    .created_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| MISSING.to_string()),
            ]
        })
        .collect();

    ctx.output
        .table(&["ID", "TITLE", "TYPE", "STATUS", "CREATED"], &rows);
    Ok(())
}

pub async fn download_report(id: &str, ctx: &CommandContext) -> QrytiResult<()> {
    let download = ctx.client.reports().download(id).await?;

    ctx.output.field("URL", &download.download_url);
    if let Some(seconds) = download.expires_in {
        ctx.output.field("Expires in", &format!("{}s", seconds));
    }
    Ok(())
}
