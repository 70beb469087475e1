use std::cmp;

use anyhow::Result;

use crate::models::{EntityInfo, Record, SearchResponse, StoreSummary};

/// Internal representation of a row rendered by the CLI.
///
/// Both text and table formats are derived from the same rows.
struct DisplayRow {
    entity: String,
    id: String,
    summary: String,
}

/// Render a `SearchResponse` in human-readable text form.
///
/// Each record is rendered as `entity id: summary`, where `entity`
/// carries the application variant when there is one
/// (e.g. `application/submitted`).
pub fn print_text(response: &SearchResponse) -> Result<()> {
    for row in build_rows(&response.results) {
        println!("{} {}: {}", row.entity, row.id, row.summary);
    }

    Ok(())
}

/// Render a `SearchResponse` as a simple table.
///
/// Columns:
/// - ENTITY
/// - ID
/// - SUMMARY
pub fn print_table(response: &SearchResponse) -> Result<()> {
    let rows = build_rows(&response.results);

    if rows.is_empty() {
        return Ok(());
    }

    const MAX_ID_WIDTH: usize = 30;
    const MAX_SUMMARY_WIDTH: usize = 60;

    let entity_header = "ENTITY";
    let id_header = "ID";
    let summary_header = "SUMMARY";

    let max_entity_len = rows.iter().map(|r| r.entity.len()).max().unwrap_or(0);
    let max_id_len = rows.iter().map(|r| r.id.chars().count()).max().unwrap_or(0);
    let max_summary_len = rows
        .iter()
        .map(|r| r.summary.chars().count())
        .max()
        .unwrap_or(0);

    let entity_width = cmp::max(entity_header.len(), max_entity_len);
    let id_width = cmp::min(cmp::max(id_header.len(), max_id_len), MAX_ID_WIDTH);
    let summary_width = cmp::min(
        cmp::max(summary_header.len(), max_summary_len),
        MAX_SUMMARY_WIDTH,
    );

    println!(
        "{:<entity_width$} {:<id_width$} {:<summary_width$}",
        entity_header, id_header, summary_header
    );

    for row in rows {
        let id = truncate(&row.id, id_width);
        let summary = truncate(&row.summary, summary_width);
        println!(
            "{:<entity_width$} {:<id_width$} {:<summary_width$}",
            row.entity, id, summary
        );
    }

    Ok(())
}

/// Render a `StoreSummary` in human-readable text form.
pub fn print_store_summary_text(summary: &StoreSummary) -> Result<()> {
    println!("backend      : {}", summary.backend.as_str());
    println!("store_path   : {}", summary.store_path.display());

    if let Some(schema) = &summary.schema_version {
        println!("schema       : {schema}");
    }
    if let Some(tool) = &summary.tool_version {
        println!("tool_version : {tool}");
    }
    if let Some(created) = &summary.created_at {
        println!("created_at   : {created}");
    }
    if let Some(updated) = &summary.updated_at {
        println!("updated_at   : {updated}");
    }
    if let Some(loaded) = summary.records_loaded {
        println!("loaded       : {loaded}");
    }

    for (table, count) in &summary.counts {
        println!("{:<13}: {count}", table);
    }

    Ok(())
}

/// Render the entity catalogue as text.
pub fn print_entities_text(entities: &[EntityInfo]) -> Result<()> {
    for entity in entities {
        println!("{} ({})", entity.name, entity.scope);
        println!("    operators : {}", entity.operators.join(" "));
        if !entity.renames.is_empty() {
            let renames: Vec<String> = entity
                .renames
                .iter()
                .map(|(from, to)| format!("{from}->{to}"))
                .collect();
            println!("    renames   : {}", renames.join(", "));
        }
        if !entity.converted.is_empty() {
            println!("    converted : {}", entity.converted.join(", "));
        }
        if !entity.overrides.is_empty() {
            println!("    overrides : {}", entity.overrides.join(", "));
        }
    }

    Ok(())
}

fn build_rows(records: &[Record]) -> Vec<DisplayRow> {
    records
        .iter()
        .map(|record| DisplayRow {
            entity: entity_label(record),
            id: record.identifier().to_string(),
            summary: record.summary(),
        })
        .collect()
}

fn entity_label(record: &Record) -> String {
    match record.variant() {
        Some(variant) => format!("{}/{}", record.table().as_str(), variant.as_str()),
        None => record.table().as_str().to_string(),
    }
}

fn truncate(s: &str, max_width: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_width {
        s.to_string()
    } else if max_width <= 1 {
        "…".to_string()
    } else {
        s.chars()
            .take(max_width.saturating_sub(1))
            .collect::<String>()
            + "…"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Role, User};

    #[test]
    fn truncate_leaves_short_strings_unchanged() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abc", 3), "abc");
    }

    #[test]
    fn truncate_handles_unicode_characters() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("éééé", 3), "éé…");
        assert_eq!(truncate("abcdef", 1), "…");
    }

    #[test]
    fn rows_label_tables() {
        let records = vec![
            Record::Account(Account {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                confirmed: true,
            }),
            Record::User(User {
                username: "bob".to_string(),
                name: "Bob Smith".to_string(),
                department: "Physics".to_string(),
                account: None,
                role: Role {
                    id: 2,
                    name: "reviewer".to_string(),
                    description: String::new(),
                    single_user: false,
                },
            }),
        ];

        let rows = build_rows(&records);
        assert_eq!(rows[0].entity, "account");
        assert_eq!(rows[0].id, "alice");
        assert_eq!(rows[0].summary, "alice@example.com (confirmed)");
        assert_eq!(rows[1].entity, "user");
        assert_eq!(rows[1].summary, "Bob Smith [reviewer]");
    }
}
