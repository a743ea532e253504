use anyhow::{anyhow, Context};
use serde_json::json;
use std::time::Instant;
use uuid::Uuid;

use crate::cli::utils::{output_error, output_expense, output_expenses, output_success};
use crate::cli::{OutputFormat, Session};
use crate::client::{ClientError, ExpenseApi, FormEvent, ItemForm, Section};

fn parse_id(id: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("Invalid expense ID '{}'", id))
}

/// Machine-readable code for a failed command
fn error_code(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<ClientError>() {
        Some(ClientError::Network(_)) => "UNREACHABLE",
        Some(ClientError::Unauthorized(_)) => "UNAUTHORIZED",
        Some(ClientError::NotFound(_)) => "NOT_FOUND",
        Some(ClientError::Validation { .. }) => "VALIDATION_ERROR",
        Some(ClientError::Server { .. }) => "SERVER_ERROR",
        Some(ClientError::Decode(_)) => "INVALID_RESPONSE",
        Some(ClientError::Token(_)) => "TOKEN_ERROR",
        Some(ClientError::InvalidUrl(_)) => "INVALID_URL",
        None => "INVALID_INPUT",
    }
}

/// In JSON mode, also print the failure as an error document on stdout
fn report(output: &OutputFormat, err: anyhow::Error) -> anyhow::Error {
    if matches!(output, OutputFormat::Json) {
        if let Err(e) = output_error(output, &format!("{:#}", err), Some(error_code(&err))) {
            tracing::warn!("Failed to write error output: {}", e);
        }
    }
    err
}

/// Run a form submit and turn a locally blocked submit into an error
async fn submit(form: &mut ItemForm, session: &mut Session) -> anyhow::Result<crate::models::Expense> {
    let now = Instant::now();
    match form.submit(&mut session.state, &session.client, now).await? {
        Some(expense) => {
            if let Some(banner) = form.banner_at(now) {
                output_success(&session.output, &banner.message, Some(json!(expense)))?;
            }
            Ok(expense)
        }
        None => Err(anyhow!(form.error().unwrap_or("Invalid input").to_string())),
    }
}

pub async fn health(session: Session) -> anyhow::Result<()> {
    let url = session.client.base_url().to_string();
    match session.client.health().await {
        Ok(true) => output_success(&session.output, "Server is healthy", Some(json!({ "server": url }))),
        Ok(false) => Err(report(&session.output, anyhow!("Server at {} is unhealthy", url))),
        Err(e) => Err(report(&session.output, anyhow!(e).context(format!("Could not reach {}", url)))),
    }
}

pub async fn list(mut session: Session) -> anyhow::Result<()> {
    session.state.activate(Section::Expenses, &session.client).await;

    if !session.state.status().is_healthy() {
        return Err(report(&session.output, anyhow!("{}", session.state.status_message())));
    }
    output_expenses(&session.output, session.state.items())
}

pub async fn get(session: Session, id: &str) -> anyhow::Result<()> {
    let fetched = match parse_id(id) {
        Ok(id) => session.client.get(id).await.map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };
    match fetched {
        Ok(expense) => output_expense(&session.output, &expense),
        Err(e) => Err(report(&session.output, e)),
    }
}

async fn add_expense(session: &mut Session, title: String, category: String, value: String) -> anyhow::Result<()> {
    let mut form = ItemForm::new();
    form.apply(FormEvent::SetTitle(title));
    form.apply(FormEvent::SetCategory(category));
    form.apply(FormEvent::SetValue(value));

    let expense = submit(&mut form, session).await?;
    if matches!(session.output, OutputFormat::Text) {
        println!("{}", crate::cli::utils::format_expense_line(&expense));
    }
    Ok(())
}

async fn update_expense(
    session: &mut Session,
    id: &str,
    title: Option<String>,
    category: Option<String>,
    value: Option<String>,
) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    session.state.activate(Section::Expenses, &session.client).await;

    let mut form = ItemForm::new();
    match session.state.find(id) {
        Some(current) => form.apply(FormEvent::BeginEdit(current)),
        None => {
            // Not in the list; let the server say why
            let current = session.client.get(id).await?;
            form.apply(FormEvent::BeginEdit(&current));
        }
    }

    if let Some(title) = title {
        form.apply(FormEvent::SetTitle(title));
    }
    if let Some(category) = category {
        form.apply(FormEvent::SetCategory(category));
    }
    if let Some(value) = value {
        form.apply(FormEvent::SetValue(value));
    }

    let expense = submit(&mut form, session).await?;
    if matches!(session.output, OutputFormat::Text) {
        println!("{}", crate::cli::utils::format_expense_line(&expense));
    }
    Ok(())
}

async fn delete_expense(session: &mut Session, id: &str) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    let now = Instant::now();
    let mut form = ItemForm::new();

    form.delete(id, &mut session.state, &session.client, now).await?;
    let message = form
        .banner_at(now)
        .map(|b| b.message.clone())
        .unwrap_or_else(|| "Deleted".to_string());
    output_success(&session.output, &message, Some(json!({ "id": id })))
}

pub async fn add(mut session: Session, title: String, category: String, value: String) -> anyhow::Result<()> {
    add_expense(&mut session, title, category, value)
        .await
        .map_err(|e| report(&session.output, e))
}

pub async fn update(
    mut session: Session,
    id: &str,
    title: Option<String>,
    category: Option<String>,
    value: Option<String>,
) -> anyhow::Result<()> {
    update_expense(&mut session, id, title, category, value)
        .await
        .map_err(|e| report(&session.output, e))
}

pub async fn delete(mut session: Session, id: &str) -> anyhow::Result<()> {
    delete_expense(&mut session, id)
        .await
        .map_err(|e| report(&session.output, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&format!(" {} ", id)).unwrap(), id);
    }

    #[test]
    fn failures_carry_machine_readable_codes() {
        assert_eq!(error_code(&parse_id("nope").unwrap_err()), "INVALID_INPUT");
        assert_eq!(error_code(&anyhow!("All fields are required!")), "INVALID_INPUT");

        let not_found = anyhow!(ClientError::NotFound("Expense x not found".into()));
        assert_eq!(error_code(&not_found), "NOT_FOUND");

        let wrapped = anyhow!(ClientError::Unauthorized("Invalid or expired token".into())).context("list failed");
        assert_eq!(error_code(&wrapped), "UNAUTHORIZED");
    }

    #[test]
    fn report_returns_the_same_error() {
        let err = report(&OutputFormat::Json, anyhow!(ClientError::NotFound("gone".into())));
        assert!(matches!(err.downcast_ref::<ClientError>(), Some(ClientError::NotFound(_))));
    }
}
