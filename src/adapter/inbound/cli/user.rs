//! `parimarket user ...` handlers.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::UserCommand;
use crate::adapter::inbound::cli::output;
use crate::application::market::MarketService;
use crate::domain::{User, UserId};
use crate::error::Result;
use crate::port::outbound::store::RecordStore;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Balance")]
    balance: i64,
    #[tabled(rename = "Admin")]
    admin: &'static str,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.value(),
            username: user.username.clone(),
            balance: user.balance,
            admin: if user.is_admin { "yes" } else { "" },
        }
    }
}

pub fn execute<S: RecordStore>(service: &MarketService<S>, cmd: UserCommand) -> Result<()> {
    match cmd {
        UserCommand::Add { username, admin } => {
            let user = service.create_user(&username, admin)?;
            output::success(&format!(
                "Created {} ({}) with {} pts",
                user.username, user.id, user.balance
            ));
            output::json_output(json!({ "command": "user.add", "user": user }));
        }
        UserCommand::Balance { user, set } => {
            let user_id = UserId::new(user);
            let user = match set {
                Some(balance) => {
                    let user = service.set_balance(user_id, balance)?;
                    output::success(&format!("Balance of {} set to {}", user.username, balance));
                    user
                }
                None => service.user(user_id)?,
            };
            output::field("User", &user.username);
            output::field("Balance", output::highlight(user.balance));
            output::json_output(json!({ "command": "user.balance", "user": user }));
        }
        UserCommand::List => {
            let users = service.users()?;
            if users.is_empty() {
                output::note("No users yet");
            } else {
                output::table(users.iter().map(UserRow::from));
            }
            output::json_output(json!({ "command": "user.list", "users": users }));
        }
    }
    Ok(())
}
