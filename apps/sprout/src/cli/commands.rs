//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, parse_instant};
use crate::config::{Backend, Settings};
use chrono::{DateTime, Utc};
use sprout_core::{AgeSpan, ContentTable, Guidance, Registry, SproutError, Stage, UserId};
use std::path::Path;

// =============================================================================
// HELPERS
// =============================================================================

/// Open the registry on the configured backend.
pub fn open_registry(settings: &Settings) -> Result<Registry, SproutError> {
    settings.backend.open(&settings.database)
}

/// Load the configured content table.
///
/// With no content file configured the table is empty and every window
/// comes back empty; a configured file that fails to load is an error.
pub fn load_content(settings: &Settings) -> Result<ContentTable, SproutError> {
    let Some(path) = settings.content.as_deref() else {
        tracing::warn!("No content file configured, guidance will be empty");
        return Ok(ContentTable::empty());
    };

    let table = ContentTable::from_path(path)?;
    tracing::info!(
        path = %path.display(),
        rows = table.len(),
        skipped = table.skipped_rows(),
        "Loaded content table"
    );
    for label in table.unknown_stages() {
        tracing::warn!(label, "Content row uses a label outside the stage sequence");
    }
    Ok(table)
}

/// Parse the birth and reference dates of a classification command.
fn parse_dates(
    birth_date: &str,
    today: Option<&str>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), SproutError> {
    let birth = parse_instant("birth_date", birth_date)?;
    let now = match today {
        Some(value) => parse_instant("today", value)?,
        None => Utc::now(),
    };
    if birth > now {
        return Err(SproutError::BirthDateInFuture);
    }
    Ok((birth, now))
}

fn labels(stages: &[Stage]) -> Vec<&'static str> {
    stages.iter().map(|s| s.label()).collect()
}

fn content_display(settings: &Settings) -> String {
    settings
        .content
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(settings: &Settings) -> Result<(), SproutError> {
    let registry = open_registry(settings)?;
    let content = load_content(settings)?;

    println!("Sprout Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", settings.host);
    println!("  Port:     {}", settings.port);
    println!("  Backend:  {}", settings.backend);
    println!("  Database: {:?}", settings.database);
    println!("  Content:  {} ({} rows)", content_display(settings), content.len());
    println!();
    println!("Endpoints:");
    println!("  GET  /health                 - Health check");
    println!("  GET  /status                 - Record and content status");
    println!("  GET  /stages                 - Stage list and coverage");
    println!("  GET  /stage                  - Classify a birth date");
    println!("  *    /children[/{{id}}]        - Children");
    println!("  GET  /children/{{id}}/guidance - Guidance for a child");
    println!("  *    /milestones[/{{id}}]      - Milestones");
    println!("  *    /activities[/{{id}}]      - Activities");
    println!("  GET  /profile, PUT /profile  - Caller profile");
    println!("  POST /onboarding/complete    - Finish onboarding");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&settings.address(), registry, content).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show record and content status.
pub fn cmd_status(settings: &Settings, json_mode: bool) -> Result<(), SproutError> {
    let registry = open_registry(settings)?;
    let content = load_content(settings)?;
    let child_count = registry.child_count()?;
    let stage_count = content.stage_labels().len();

    if json_mode {
        print_json(&serde_json::json!({
            "database": settings.database.to_string_lossy(),
            "backend": settings.backend.as_str(),
            "child_count": child_count,
            "content": settings.content.as_ref().map(|p| p.to_string_lossy()),
            "content_rows": content.len(),
            "content_stages": stage_count,
            "skipped_rows": content.skipped_rows(),
        }));
        return Ok(());
    }

    println!("Sprout Status");
    println!("=============");
    println!("Database: {:?}", settings.database);
    println!("Backend:  {}", settings.backend);
    println!("Content:  {}", content_display(settings));
    println!();
    println!("Children:       {}", child_count);
    println!("Content rows:   {}", content.len());
    println!("Content stages: {}", stage_count);
    println!("Skipped rows:   {}", content.skipped_rows());

    Ok(())
}

// =============================================================================
// STAGE COMMAND
// =============================================================================

/// Classify a birth date.
pub fn cmd_stage(
    settings: &Settings,
    json_mode: bool,
    birth_date: &str,
    today: Option<&str>,
) -> Result<(), SproutError> {
    let (birth, now) = parse_dates(birth_date, today)?;
    let content = load_content(settings)?;

    let age = AgeSpan::between(birth, now);
    let stage = Stage::for_age(&age);
    let window = stage.relevant_window(&content);

    if json_mode {
        print_json(&serde_json::json!({
            "stage": stage.label(),
            "next_stage": stage.next().map(|s| s.label()),
            "age": {
                "days": age.total_days,
                "weeks": age.total_weeks,
                "months": age.total_months,
                "description": age.describe(),
            },
            "window": labels(&window),
        }));
        return Ok(());
    }

    println!("Developmental Stage");
    println!("===================");
    println!("Age:    {}", age.describe());
    println!(
        "        {} days, {} weeks, {} months",
        age.total_days, age.total_weeks, age.total_months
    );
    println!("Stage:  {}", stage);
    match stage.next() {
        Some(next) => println!("Next:   {}", next),
        None => println!("Next:   (final stage)"),
    }
    if window.is_empty() {
        println!("Window: (no content for current or next stage)");
    } else {
        println!("Window: {}", labels(&window).join(", "));
    }

    Ok(())
}

// =============================================================================
// GUIDANCE COMMAND
// =============================================================================

/// Show the content sections relevant for a birth date.
pub fn cmd_guidance(
    settings: &Settings,
    json_mode: bool,
    birth_date: &str,
    today: Option<&str>,
) -> Result<(), SproutError> {
    let (birth, now) = parse_dates(birth_date, today)?;
    let content = load_content(settings)?;
    let guidance = Guidance::assemble(birth, now, &content);

    if json_mode {
        print_json(&serde_json::json!({
            "stage": guidance.stage.label(),
            "age": guidance.age.describe(),
            "window": labels(&guidance.window),
            "sections": guidance.sections,
        }));
        return Ok(());
    }

    println!("Guidance for {} ({})", guidance.stage, guidance.age.describe());
    println!("==========================================");

    if guidance.is_empty() {
        println!("No content available for this stage yet.");
        return Ok(());
    }

    for section in &guidance.sections {
        println!();
        println!("[{}]", section.stage);
        for entry in &section.entries {
            println!("  {}: {}", entry.category, entry.description);
            if let Some(image) = &entry.image {
                println!("    image: {}", image);
            }
        }
    }

    Ok(())
}

// =============================================================================
// CONTENT COMMAND
// =============================================================================

/// Summarize the content table.
pub fn cmd_content(settings: &Settings, json_mode: bool) -> Result<(), SproutError> {
    let content = load_content(settings)?;
    let coverage = content.coverage();
    let unknown = content.unknown_stages();

    if json_mode {
        let stages: Vec<_> = coverage
            .iter()
            .map(|(stage, rows)| serde_json::json!({ "label": stage.label(), "rows": rows }))
            .collect();
        print_json(&serde_json::json!({
            "path": settings.content.as_ref().map(|p| p.to_string_lossy()),
            "rows": content.len(),
            "skipped_rows": content.skipped_rows(),
            "stages": stages,
            "unknown_labels": unknown,
        }));
        return Ok(());
    }

    println!("Content Table");
    println!("=============");
    println!("Path:    {}", content_display(settings));
    println!("Rows:    {}", content.len());
    println!("Skipped: {}", content.skipped_rows());
    println!();
    for (stage, rows) in &coverage {
        let marker = if *rows == 0 { "-" } else { "+" };
        println!("  {} {:<14} {} rows", marker, stage.label(), rows);
    }
    if !unknown.is_empty() {
        println!();
        println!("Unknown labels: {}", unknown.join(", "));
    }

    Ok(())
}

// =============================================================================
// CHILDREN COMMAND
// =============================================================================

/// List a user's children with their current stage.
pub fn cmd_children(settings: &Settings, json_mode: bool, user: &str) -> Result<(), SproutError> {
    let user = UserId::new(user.trim());
    if user.as_str().is_empty() {
        return Err(SproutError::InvalidInput("user must not be empty".to_string()));
    }

    let registry = open_registry(settings)?;
    let children = registry.list_children(&user)?;
    let now = Utc::now();

    if json_mode {
        let items: Vec<_> = children
            .iter()
            .map(|entry| {
                let child = &entry.child;
                let stage = (child.date_of_birth <= now)
                    .then(|| sprout_core::classify_stage(child.date_of_birth, now).label());
                serde_json::json!({
                    "id": child.id.0,
                    "name": child.name,
                    "date_of_birth": child.date_of_birth.to_rfc3339(),
                    "relationship": entry.relationship.as_str(),
                    "is_primary": entry.is_primary,
                    "stage": stage,
                })
            })
            .collect();
        print_json(&serde_json::json!({ "user": user.as_str(), "children": items }));
        return Ok(());
    }

    println!("Children of {}", user);
    println!("====================");
    if children.is_empty() {
        println!("(none)");
        return Ok(());
    }

    for entry in &children {
        let child = &entry.child;
        let stage = if child.date_of_birth <= now {
            let age = AgeSpan::between(child.date_of_birth, now);
            format!("{} ({})", Stage::for_age(&age), age.describe())
        } else {
            "not born yet".to_string()
        };
        println!(
            "  #{:<4} {:<20} {}  {:<11} {}",
            child.id.0,
            child.name,
            child.date_of_birth.format("%Y-%m-%d"),
            entry.relationship.as_str(),
            stage
        );
    }

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new database.
pub fn cmd_init(settings: &Settings, force: bool) -> Result<(), SproutError> {
    let db_path: &Path = &settings.database;

    if settings.backend == Backend::Memory {
        println!("Memory backend selected; nothing to initialize");
        return Ok(());
    }

    if db_path.exists() {
        if !force {
            return Err(SproutError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| SproutError::IoError(format!("Remove database: {}", e)))?;
    }

    let _registry = Registry::with_redb(db_path)?;
    println!("Initialized new redb database at {:?}", db_path);

    Ok(())
}
