use clap::Subcommand;
use serde_json::json;

use crate::app::AppState;
use crate::cli::utils::{output_collection, output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::database::models::FacePose;
use crate::services::user_service::{UserQuery, UserRow};

/// Upper bound for `user list`; the CLI does not paginate
const LIST_LIMIT: i64 = 10_000;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a staff superuser account")]
    CreateSuperuser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        employee_id: String,

        #[arg(long)]
        password: String,
    },

    #[command(about = "List active users")]
    List {
        #[arg(long, help = "Case-insensitive match on name, username, email or employee id")]
        search: Option<String>,
    },

    #[command(about = "Add a user to a role group (Staff, Manager, HR Admin)")]
    AssignGroup {
        #[arg(help = "User id")]
        id: i64,

        #[arg(help = "Group name")]
        group: String,
    },

    #[command(about = "Record the stored path of a face photo")]
    SetFacePhoto {
        #[arg(help = "User id")]
        id: i64,

        #[arg(help = "front, left or right")]
        pose: FacePose,

        #[arg(help = "Stored image path")]
        path: String,

        #[arg(long, help = "File size in bytes")]
        size: u64,
    },
}

fn user_line(row: &UserRow) -> String {
    let u = &row.user;
    format!(
        "{:>6} {:<12} {:<20} {:<30} {}",
        u.id,
        u.employee_id,
        u.username,
        u.email,
        row.division_name.as_deref().unwrap_or("-")
    )
}

pub async fn handle(cmd: UserCommands, state: &AppState, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::CreateSuperuser { username, email, employee_id, password } => {
            let user = state.accounts.create_superuser(&username, &email, &employee_id, &password).await?;
            output_success(
                output_format,
                &format!("Superuser '{}' created", user.username),
                Some(json!({ "id": user.id, "username": user.username })),
            )
        }
        UserCommands::List { search } => {
            let query = UserQuery { search, is_active: Some(true), ..UserQuery::default() };
            let (_, rows) = state.users.list(&query, LIST_LIMIT, 0).await?;
            if rows.is_empty() {
                return output_empty_collection(output_format, "users", "No users found");
            }

            output_collection(
                output_format,
                "users",
                &rows,
                |row| {
                    json!({
                        "id": row.user.id,
                        "employee_id": row.user.employee_id,
                        "username": row.user.username,
                        "email": row.user.email,
                        "full_name": row.user.full_name(),
                        "division": row.division_name,
                        "groups": row.user.groups,
                    })
                },
                &format!("{:>6} {:<12} {:<20} {:<30} {}", "ID", "EMPLOYEE", "USERNAME", "EMAIL", "DIVISION"),
                user_line,
            )
        }
        UserCommands::AssignGroup { id, group } => {
            let user = state.accounts.assign_group(id, &group).await?;
            output_success(
                output_format,
                &format!("User '{}' is now in: {}", user.username, user.groups.join(", ")),
                Some(json!({ "id": user.id, "groups": user.groups })),
            )
        }
        UserCommands::SetFacePhoto { id, pose, path, size } => {
            let user = state.accounts.set_face_photo(id, pose, &path, size).await?;
            output_success(
                output_format,
                &format!(
                    "Face photo stored for '{}' (complete: {})",
                    user.username,
                    user.has_complete_face_data()
                ),
                Some(json!({ "id": user.id, "has_complete_face_data": user.has_complete_face_data() })),
            )
        }
    }
}
