//! Drive Activity API queries: paginated iteration with rate-limit-aware
//! exponential backoff, plus classification of the primary action.

use std::time::Duration;

use chrono::{DateTime, Days, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::ClientResult;

use super::DriveClient;

/// API maximum page size.
const MAX_PAGE_SIZE: usize = 100;
/// Retries per page on rate-limit errors.
const MAX_RETRIES: u32 = 3;
/// First backoff delay; doubles per retry (2 s, 4 s, 8 s).
const BASE_DELAY: Duration = Duration::from_secs(2);
/// Pages fetched between quota pauses (the API allows 100 queries/minute).
const PAGES_PER_BATCH: usize = 90;
/// Pause between page batches.
const BATCH_PAUSE: Duration = Duration::from_secs(60);

/// One classified activity event.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub action_type: String,
    pub action_detail: String,
    pub actors: Vec<String>,
    pub targets: Vec<String>,
    pub target_titles: Vec<String>,
}

/// Query the activity feed until `max_results` entries are gathered or the
/// feed runs out of pages.
pub(super) async fn query_activity(
    client: &DriveClient,
    days_back: u64,
    max_results: usize,
) -> ClientResult<Vec<ActivityEntry>> {
    let page_size = max_results.clamp(1, MAX_PAGE_SIZE);

    let mut request = serde_json::json!({ "pageSize": page_size });
    if days_back > 0 {
        let cutoff = Utc::now()
            .checked_sub_days(Days::new(days_back))
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        request["filter"] = Value::String(format!("time >= \"{cutoff}\""));
    }

    let mut entries = Vec::new();
    let mut page_count = 0usize;

    loop {
        let response = query_page_with_retry(client, &request).await?;
        page_count += 1;

        // Quota guard: after a batch of pages, pause before continuing.
        if page_count % PAGES_PER_BATCH == 0 {
            tracing::warn!(
                pages = page_count,
                activities = entries.len(),
                "pausing 60s to respect activity API rate limits"
            );
            tokio::time::sleep(BATCH_PAUSE).await;
        }

        if let Some(activities) = response["activities"].as_array() {
            for activity in activities {
                entries.push(parse_activity(activity));
                if entries.len() >= max_results {
                    return Ok(entries);
                }
            }
        }

        match response["nextPageToken"].as_str() {
            Some(token) if !token.is_empty() => {
                request["pageToken"] = Value::String(token.to_string());
            }
            _ => break,
        }
    }

    Ok(entries)
}

/// Fetch one activity page, retrying on rate-limit errors with exponential
/// backoff. Non-retryable errors terminate the query.
async fn query_page_with_retry(
    client: &DriveClient,
    request: &Value,
) -> ClientResult<Value> {
    let url = client.activity_query_url();
    let mut retry = 0;
    loop {
        match client.post(&url, &[], request).await {
            Ok(response) => return Ok(response),
            Err(err) if err.is_rate_limit() && retry < MAX_RETRIES => {
                let delay = BASE_DELAY * 2u32.pow(retry);
                retry += 1;
                tracing::warn!(
                    delay_secs = delay.as_secs(),
                    retry,
                    max_retries = MAX_RETRIES,
                    "activity API rate limit hit, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn parse_activity(activity: &Value) -> ActivityEntry {
    let timestamp = activity["timestamp"]
        .as_str()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default();

    let mut actors = Vec::new();
    if let Some(actor_list) = activity["actors"].as_array() {
        for actor in actor_list {
            if let Some(name) = actor["user"]["knownUser"]["personName"].as_str() {
                if !name.is_empty() {
                    actors.push(name.to_string());
                }
            } else if actor.get("administrator").is_some() {
                actors.push("Administrator".to_string());
            } else if actor.get("anonymous").is_some() {
                actors.push("Anonymous".to_string());
            }
        }
    }

    let mut targets = Vec::new();
    let mut target_titles = Vec::new();
    if let Some(target_list) = activity["targets"].as_array() {
        for target in target_list {
            if let Some(item) = target.get("driveItem") {
                let name = item["name"].as_str().unwrap_or_default();
                match item["title"].as_str().filter(|t| !t.is_empty()) {
                    Some(title) => target_titles.push(title.to_string()),
                    None if !name.is_empty() => {
                        let id = name.strip_prefix("items/").unwrap_or(name);
                        target_titles.push(format!("<ID: {id}>"));
                    }
                    None => {}
                }
                if !name.is_empty() {
                    targets.push(name.to_string());
                }
            }
            if target.pointer("/fileComment/parent").is_some() {
                targets.push("Comment".to_string());
            }
        }
    }

    let (action_type, action_detail) = classify_action(&activity["primaryActionDetail"]);

    ActivityEntry {
        timestamp,
        action_type: action_type.to_string(),
        action_detail,
        actors,
        targets,
        target_titles,
    }
}

/// Classify the primary action by which key the API populated.
fn classify_action(action: &Value) -> (&'static str, String) {
    if let Some(create) = action.get("create") {
        if create.get("new").is_some() {
            return ("Create", "Created new item".to_string());
        }
        if create.get("upload").is_some() {
            return ("Upload", "Uploaded file".to_string());
        }
        if create.get("copy").is_some() {
            return ("Copy", "Copied file".to_string());
        }
    }

    if action.get("edit").is_some() {
        return ("Edit", "Edited file".to_string());
    }

    if let Some(mv) = action.get("move") {
        let mut detail = "Moved".to_string();
        if mv["addedParents"].as_array().is_some_and(|p| !p.is_empty()) {
            detail.push_str(" to new location");
        }
        if mv["removedParents"].as_array().is_some_and(|p| !p.is_empty()) {
            detail.push_str(" from old location");
        }
        return ("Move", detail);
    }

    if let Some(rename) = action.get("rename") {
        let old = rename["oldTitle"].as_str().unwrap_or_default();
        let new = rename["newTitle"].as_str().unwrap_or_default();
        let detail = if old.is_empty() || new.is_empty() {
            "Renamed".to_string()
        } else {
            format!("Renamed from '{old}' to '{new}'")
        };
        return ("Rename", detail);
    }

    if let Some(delete) = action.get("delete") {
        let detail = match delete["type"].as_str() {
            Some("TRASH") => "Moved to trash",
            Some("PERMANENT_DELETE") => "Permanently deleted",
            _ => "Deleted",
        };
        return ("Delete", detail.to_string());
    }

    if action.get("restore").is_some() {
        return ("Restore", "Restored from trash".to_string());
    }

    if let Some(change) = action.get("permissionChange") {
        let mut detail = "Changed permissions";
        if change["addedPermissions"].as_array().is_some_and(|p| !p.is_empty()) {
            detail = "Added permissions";
        }
        if change["removedPermissions"].as_array().is_some_and(|p| !p.is_empty()) {
            detail = "Removed permissions";
        }
        return ("Permission", detail.to_string());
    }

    if let Some(comment) = action.get("comment") {
        if comment.get("post").is_some() {
            return ("Comment", "Posted comment".to_string());
        }
        if comment.get("assignment").is_some() {
            return ("Comment", "Assigned task".to_string());
        }
    }

    if action.get("dlpChange").is_some() {
        return ("DLP", "Data loss prevention change".to_string());
    }

    if action.get("reference").is_some() {
        return ("Reference", "Referenced in another document".to_string());
    }

    if action.get("settingsChange").is_some() {
        return ("Settings", "Changed settings".to_string());
    }

    ("Unknown", "Unknown action".to_string())
}
