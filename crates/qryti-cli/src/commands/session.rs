//! Sign-in, sign-out and session inspection.

use qryti_core::error::{QrytiError, QrytiResult};

use super::CommandContext;

pub async fn login(email: &str, password: Option<String>, ctx: &CommandContext) -> QrytiResult<()> {
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| QrytiError::ConfigValidation {
            field: "password".to_string(),
            reason: "pass --password or set QRYTI_PASSWORD".to_string(),
        })?;

    let session = ctx.client.login(email, &password).await?;
    let name = session
        .user()
        .map(|user| user.display_name().to_string())
        .unwrap_or_else(|| email.to_string());

    ctx.output.success(&format!("Signed in as {}", name));
    ctx.output.info(&format!("Session saved to {}", ctx.session_file));
    Ok(())
}

pub async fn logout(ctx: &CommandContext) -> QrytiResult<()> {
    let was_signed_in = ctx.client.is_authenticated();
    ctx.client.logout().await?;

    if was_signed_in {
        ctx.output.success("Signed out");
    } else {
        ctx.output.info("No active session");
    }
    Ok(())
}

pub async fn whoami(ctx: &CommandContext) -> QrytiResult<()> {
    if !ctx.client.is_authenticated() {
        return Err(not_signed_in());
    }

    match ctx.client.user() {
        Some(user) => {
            ctx.output.field("Name", user.display_name());
            ctx.output.field("Email", &user.email);
            if let Some(role) = &user.role {
                ctx.output.field("Role", role);
            }
            if let Some(id) = &user.id {
                ctx.output.field("ID", id);
            }
        }
        None => ctx.output.info("Signed in; no profile stored"),
    }
    Ok(())
}

pub async fn verify(ctx: &CommandContext) -> QrytiResult<()> {
    if !ctx.client.is_authenticated() {
        return Err(not_signed_in());
    }

    if ctx.client.verify_token().await {
        ctx.output.success("Session is valid");
        Ok(())
    } else if ctx.client.is_authenticated() {
        // Still signed in: the check itself failed, not the token
        Err(QrytiError::Network {
            message: "Could not confirm the session with the backend".to_string(),
            source: None,
        })
    } else {
        Err(QrytiError::Auth {
            status: Some(401),
            message: "Session expired; you have been signed out".to_string(),
            data: serde_json::Value::Null,
        })
    }
}

fn not_signed_in() -> QrytiError {
    QrytiError::Auth {
        status: None,
        message: "Not signed in".to_string(),
        data: serde_json::Value::Null,
    }
}
