use anyhow::Result;
use eniri::cli::{self, actions::Action};

#[tokio::main]
async fn main() -> Result<()> {
    let (action, globals) = cli::start()?;

    match &action {
        Action::Login { .. } => cli::actions::login::handle(action, &globals).await,
        Action::Logout => cli::actions::logout::handle(&globals),
    }
}
