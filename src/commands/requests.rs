//! Paper request commands.
//!
//! - `request`: ask for a paper the catalog is missing
//! - `requests`: list requests, optionally changing one's status first

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, Portal};
use crate::display::{format_request_table, format_status};
use crate::error::{QvaultError, Result};
use crate::remote::{PaperRequestForm, RequestStatus};
use crate::requests::{RequestDesk, RequestOutcome, validate_form};

fn login_required(action: &str) -> QvaultError {
    QvaultError::Auth(format!("{action} needs a signed-in user"))
}

/// Submit a request for a missing paper
pub async fn cmd_request(form: PaperRequestForm, output_json: bool) -> Result<()> {
    let form = validate_form(&form)?;
    let portal = Portal::load()?;
    let desk = portal.request_desk().await?;

    let RequestOutcome::Done(sent) = desk.submit(&form).await? else {
        return Err(login_required("requesting a paper"));
    };

    CommandOutput::new(json!({
        "action": "request",
        "request": &sent,
        "success": true,
    }))
    .with_text(format!(
        "Requested {} ({})",
        sent.course_name.cyan(),
        sent.course_code
    ))
    .print(output_json)
}

/// List paper requests, optionally setting the status of one first
pub async fn cmd_requests(
    status: Option<RequestStatus>,
    update: Option<(String, RequestStatus)>,
    output_json: bool,
) -> Result<()> {
    let portal = Portal::load()?;
    let mut desk = portal.request_desk().await?;

    if desk.load().await?.done().is_none() {
        return Err(login_required("listing paper requests"));
    }

    let mut updated = None;
    if let Some((id, to)) = update {
        let Some(stored) = desk.set_status(&id, to).await?.done() else {
            return Err(login_required("updating a paper request"));
        };
        updated = Some((id, stored));
    }

    let requests = desk.requests(status);

    let mut text = String::new();
    if let Some((id, stored)) = &updated {
        text.push_str(&format!("Marked {} {}\n\n", id.cyan(), format_status(*stored)));
    }
    if requests.is_empty() {
        text.push_str(&"No requests".dimmed().to_string());
    } else {
        text.push_str(&format!(
            "{}\n{}",
            format_request_table(&requests),
            format!("{} requests", requests.len()).dimmed()
        ));
    }

    CommandOutput::new(json!({
        "updated": updated.map(|(id, status)| json!({ "id": id, "status": status })),
        "requests": requests,
    }))
    .with_text(text)
    .print(output_json)
}
