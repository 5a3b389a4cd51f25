use clap::Subcommand;
use serde_json::json;

use crate::app::AppState;
use crate::cli::utils::{level_indent, output_collection, output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::database::models::SoftDeleteScope;
use crate::services::division_service::{DivisionNode, OutlineRow};

#[derive(Subcommand)]
pub enum DivisionCommands {
    #[command(about = "Indented outline of the hierarchy with head counts")]
    List {
        #[arg(long, conflicts_with = "all", help = "Only soft-deleted divisions")]
        deleted: bool,

        #[arg(long, help = "Active and soft-deleted divisions")]
        all: bool,
    },

    #[command(about = "Nested tree of active divisions")]
    Tree,

    #[command(about = "Undo a soft delete")]
    Restore {
        #[arg(help = "Division id")]
        id: i64,
    },

    #[command(about = "Permanently delete a division and its sub-divisions")]
    Purge {
        #[arg(help = "Division id")]
        id: i64,
    },
}

fn outline_line(row: &OutlineRow) -> String {
    let d = &row.division;
    let marker = if d.is_active() { "" } else { " (deleted)" };
    format!(
        "{:<40} {:<12} {:>5} {:>9} {:>7}",
        format!("{}{}{}", level_indent(d.level), d.name, marker),
        d.code,
        d.level,
        row.employee_count,
        row.total_employee_count
    )
}

fn print_node(node: &DivisionNode) {
    let d = &node.row.division;
    println!("{}{} ({}) [{}]", level_indent(d.level), d.name, d.code, node.row.employee_count);
    for child in &node.children {
        print_node(child);
    }
}

fn node_json(node: &DivisionNode) -> serde_json::Value {
    let d = &node.row.division;
    json!({
        "id": d.id,
        "code": d.code,
        "name": d.name,
        "level": d.level,
        "employee_count": node.row.employee_count,
        "children": node.children.iter().map(node_json).collect::<Vec<_>>(),
    })
}

pub async fn handle(cmd: DivisionCommands, state: &AppState, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DivisionCommands::List { deleted, all } => {
            let scope = match (deleted, all) {
                (_, true) => SoftDeleteScope::All,
                (true, false) => SoftDeleteScope::Deleted,
                (false, false) => SoftDeleteScope::Active,
            };
            let rows = state.divisions.outline(scope).await?;
            if rows.is_empty() {
                return output_empty_collection(output_format, "divisions", "No divisions found");
            }

            output_collection(
                output_format,
                "divisions",
                &rows,
                |row| {
                    json!({
                        "id": row.division.id,
                        "code": row.division.code,
                        "name": row.division.name,
                        "level": row.division.level,
                        "parent_id": row.division.parent_id,
                        "is_active": row.division.is_active(),
                        "employee_count": row.employee_count,
                        "total_employee_count": row.total_employee_count,
                    })
                },
                &format!("{:<40} {:<12} {:>5} {:>9} {:>7}", "NAME", "CODE", "LEVEL", "EMPLOYEES", "TOTAL"),
                outline_line,
            )
        }
        DivisionCommands::Tree => {
            let tree = state.divisions.tree_view().await?;
            if tree.is_empty() {
                return output_empty_collection(output_format, "tree", "No divisions found");
            }
            match output_format {
                OutputFormat::Json => {
                    let nodes: Vec<_> = tree.iter().map(node_json).collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "count": nodes.len(), "tree": nodes }))?);
                }
                OutputFormat::Text => tree.iter().for_each(print_node),
            }
            Ok(())
        }
        DivisionCommands::Restore { id } => {
            let division = state.divisions.restore(id).await?;
            output_success(
                output_format,
                &format!("Division '{}' restored", division.code),
                Some(json!({ "id": division.id, "code": division.code })),
            )
        }
        DivisionCommands::Purge { id } => {
            let removed = state.divisions.purge(id).await?;
            output_success(
                output_format,
                &format!("Division {} purged ({} row(s) removed)", id, removed),
                Some(json!({ "id": id, "removed": removed })),
            )
        }
    }
}
