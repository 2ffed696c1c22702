//! Account provisioning command handlers

use anyhow::Context;

use crate::config::Config;
use crate::db::Store;
use crate::domain::Role;

fn read_password() -> anyhow::Result<String> {
    println!("Password:");

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .context("Failed to read password from stdin")?;

    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn cmd_user_add(
    config: &Config,
    username: &str,
    role: Role,
    password: Option<String>,
) -> anyhow::Result<()> {
    let username = username.trim();
    if username.is_empty() {
        anyhow::bail!("Username cannot be empty");
    }

    let password = match password {
        Some(p) => p,
        None => read_password()?,
    };
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let store = Store::new(&config.general.database_path).await?;

    if store
        .get_account_credentials(username, role)
        .await?
        .is_some()
    {
        println!("Account '{username}' with role {role} already exists.");
        return Ok(());
    }

    let account = store
        .create_account(username, &password, role, &config.security)
        .await?;

    println!(
        "Created {} account '{}' (ID: {})",
        account.role, account.username, account.id
    );
    Ok(())
}

pub async fn cmd_user_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let accounts = store.list_accounts().await?;

    if accounts.is_empty() {
        println!("No accounts provisioned.");
        println!();
        println!("Add one with: supportsync user add <username> --role <user|admin>");
        return Ok(());
    }

    println!("Accounts ({} total)", accounts.len());
    println!("{:-<70}", "");

    for account in accounts {
        println!(
            "[{}] {} ({}) created {}",
            account.id, account.username, account.role, account.created_at
        );
        if let Some(department) = &account.department {
            println!("    Department: {department}");
        }
    }

    Ok(())
}
