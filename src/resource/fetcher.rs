//! Database Fetcher
//!
//! Lists the databases of a Cloud SQL instance, following pagination and
//! retrying transient conditions until the client's read deadline.

use super::database::{Database, DatabasesListResponse};
use crate::error::Result;
use crate::gcp::client::GcpClient;
use crate::gcp::retry::retry_until;
use serde_json::Value;

/// Result of paginated fetch
pub struct PaginatedResult {
    pub items: Vec<Database>,
    pub next_token: Option<String>,
}

/// Fetch all databases of an instance (auto-paginate)
pub async fn fetch_databases(
    client: &GcpClient,
    project: &str,
    instance: &str,
) -> Result<Vec<Database>> {
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;
    // One budget for the whole listing, not one per page
    let deadline = client.retry.deadline();

    loop {
        let result = retry_until(client.retry, deadline, || {
            fetch_databases_paginated(client, project, instance, page_token.as_deref())
        })
        .await?;
        all_items.extend(result.items);

        if result.next_token.is_none() {
            break;
        }
        page_token = result.next_token;
    }

    tracing::debug!(
        "Fetched {} databases from {}/{}",
        all_items.len(),
        project,
        instance
    );
    Ok(all_items)
}

/// Fetch one page of databases
pub async fn fetch_databases_paginated(
    client: &GcpClient,
    project: &str,
    instance: &str,
    page_token: Option<&str>,
) -> Result<PaginatedResult> {
    let mut url = client.sql_databases_url(project, instance)?;
    if let Some(token) = page_token {
        url.query_pairs_mut().append_pair("pageToken", token);
    }

    let response = client.get(url.as_str()).await?;
    let page = parse_page(response)?;

    Ok(PaginatedResult {
        items: page.items,
        next_token: page.next_page_token.filter(|t| !t.is_empty()),
    })
}

/// Decode a list response; an empty body is an empty page
fn parse_page(response: Value) -> Result<DatabasesListResponse> {
    if response.is_null() {
        return Ok(DatabasesListResponse::default());
    }
    Ok(serde_json::from_value(response)?)
}
