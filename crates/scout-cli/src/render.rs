//! Plain-text rendering of timeline entries for the terminal.

use chrono::Local;
use scout_types::{CompanyRecord, ConnectionState, Content, Entry, JobListing, Profile, ResultItem, Role};
use std::fmt::Write;

/// Render one entry as a block of lines, without a trailing newline.
pub fn render_entry(entry: &Entry) -> String {
    let label = match entry.role {
        Role::User => "you",
        Role::Assistant => "scout",
        Role::Error => "error",
    };
    let time = entry.created_at.with_timezone(&Local).format("%H:%M:%S");
    let header = format!("[{}] {}:", time, label);

    match &entry.content {
        Content::Text(text) => format!("{} {}", header, text),
        Content::Items(items) if items.is_empty() => format!("{} (no results)", header),
        Content::Items(items) => {
            let mut out = format!("{} {} result(s)", header, items.len());
            for (idx, item) in items.iter().enumerate() {
                out.push('\n');
                out.push_str(&indent(&render_item(idx + 1, item)));
            }
            out
        }
    }
}

/// Render a result card.
pub fn render_item(position: usize, item: &ResultItem) -> String {
    match item {
        ResultItem::Job(job) => render_job(position, job),
        ResultItem::Profile(profile) => render_profile(position, profile),
        ResultItem::Company(company) => render_company(position, company),
        ResultItem::Generic { data } => {
            let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
            format!("{}. {}", position, pretty)
        }
    }
}

fn render_job(position: usize, job: &JobListing) -> String {
    let mut out = format!("{}. {}", position, job.title.as_deref().unwrap_or("(untitled job)"));
    push_line(&mut out, "company", job.company.as_deref());
    push_line(&mut out, "location", job.location.as_deref());
    push_line(&mut out, "posted", job.posted_at.as_deref());
    push_line(&mut out, "link", job.url.as_deref());
    out
}

fn render_profile(position: usize, profile: &Profile) -> String {
    let mut out = format!("{}. {}", position, profile.name.as_deref().unwrap_or("(unnamed profile)"));
    push_line(&mut out, "headline", profile.headline.as_deref());
    push_line(&mut out, "location", profile.location.as_deref());
    push_line(&mut out, "link", profile.url.as_deref());
    out
}

fn render_company(position: usize, company: &CompanyRecord) -> String {
    let mut out = format!("{}. {}", position, company.name.as_deref().unwrap_or("(unnamed company)"));
    push_line(&mut out, "industry", company.industry.as_deref());
    push_line(&mut out, "about", company.description.as_deref());
    push_line(&mut out, "link", company.url.as_deref());
    out
}

fn push_line(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        let _ = write!(out, "\n   {}: {}", label, value);
    }
}

fn indent(block: &str) -> String {
    block
        .lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Status line for a connection state change.
pub fn render_state(state: ConnectionState) -> String {
    match state {
        ConnectionState::Idle => "-- disconnected".to_string(),
        ConnectionState::Connecting => "-- connecting...".to_string(),
        ConnectionState::Open => "-- connected".to_string(),
        ConnectionState::Closed => "-- connection lost, retrying".to_string(),
    }
}
