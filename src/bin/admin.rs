use std::collections::VecDeque;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use bookvote::auth::hash_password;
use bookvote::domain::{ballot_titles, NewUser, StatusUpdate};
use bookvote::infra::{PgStatusStore, PgUserStore, PgVoteStore, StatusStore, UserStore, VoteStore};
use bookvote::tally;

fn print_help() {
    eprintln!(
        "\
bookvote-admin

USAGE:
  bookvote-admin <command> [options]

COMMANDS:
  migrate                              Run database migrations
  create-admin <username> <email> <password>
                                       Create an admin account
  set-admin <username> <true|false>    Grant or revoke the admin flag
  status                               Print the voting status
  set-status [--active <bool>] [--results <bool>]
                                       Partially update the voting status
  tally                                Print per-option counts and percentages

COMMON OPTIONS:
  --database-url <postgres_url>        (defaults to env DATABASE_URL)
"
    );
}

fn require_database_url(database_url: Option<String>) -> anyhow::Result<String> {
    database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required (or pass --database-url)"))
}

fn parse_bool(label: &str, value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        other => anyhow::bail!("invalid {label}: {other} (expected true or false)"),
    }
}

async fn connect(database_url: Option<String>) -> anyhow::Result<PgPool> {
    let database_url = require_database_url(database_url)?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    Ok(pool)
}

/// Pull `--database-url` out of an argument list, leaving the rest in place.
fn take_database_url(args: &mut VecDeque<String>) -> anyhow::Result<Option<String>> {
    let mut database_url = None;
    let mut rest = VecDeque::with_capacity(args.len());
    while let Some(arg) = args.pop_front() {
        if arg == "--database-url" {
            database_url = Some(
                args.pop_front()
                    .ok_or_else(|| anyhow::anyhow!("missing value for --database-url"))?,
            );
        } else {
            rest.push_back(arg);
        }
    }
    *args = rest;
    Ok(database_url)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: VecDeque<String> = std::env::args().skip(1).collect();
    let Some(command) = args.pop_front() else {
        print_help();
        return Ok(());
    };

    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_help();
        return Ok(());
    }

    let database_url = take_database_url(&mut args)?;

    match command.as_str() {
        "migrate" => {
            if let Some(other) = args.pop_front() {
                anyhow::bail!("unexpected argument: {other}");
            }
            let pool = connect(database_url).await?;
            bookvote::migrations::run_postgres(&pool).await?;
            println!("ok: migrations applied");
            Ok(())
        }
        "create-admin" => {
            let (Some(username), Some(email), Some(password)) =
                (args.pop_front(), args.pop_front(), args.pop_front())
            else {
                anyhow::bail!("usage: bookvote-admin create-admin <username> <email> <password>");
            };
            if let Some(other) = args.pop_front() {
                anyhow::bail!("unexpected argument: {other}");
            }

            let pool = connect(database_url).await?;
            let users = PgUserStore::new(pool);
            let password_hash = hash_password(&password)?;
            let user = users
                .create_user(NewUser::new(username, email, password_hash).admin())
                .await?;
            println!("ok: created admin {} ({})", user.username, user.id);
            Ok(())
        }
        "set-admin" => {
            let (Some(username), Some(flag)) = (args.pop_front(), args.pop_front()) else {
                anyhow::bail!("usage: bookvote-admin set-admin <username> <true|false>");
            };
            if let Some(other) = args.pop_front() {
                anyhow::bail!("unexpected argument: {other}");
            }
            let is_admin = parse_bool("admin flag", &flag)?;

            let pool = connect(database_url).await?;
            let users = PgUserStore::new(pool);
            if !users.set_admin(&username, is_admin).await? {
                anyhow::bail!("no such user: {username}");
            }
            println!("ok: {} admin={}", username, is_admin);
            Ok(())
        }
        "status" => {
            if let Some(other) = args.pop_front() {
                anyhow::bail!("unexpected argument: {other}");
            }
            let pool = connect(database_url).await?;
            let status = PgStatusStore::new(pool).get_status().await?;
            println!("is_active:       {}", status.is_active);
            println!("display_results: {}", status.display_results);
            println!("last_updated:    {}", status.last_updated.to_rfc3339());
            Ok(())
        }
        "set-status" => {
            let mut update = StatusUpdate::default();
            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--active" => {
                        let value = args
                            .pop_front()
                            .ok_or_else(|| anyhow::anyhow!("missing value for --active"))?;
                        update.is_active = Some(parse_bool("--active", &value)?);
                    }
                    "--results" => {
                        let value = args
                            .pop_front()
                            .ok_or_else(|| anyhow::anyhow!("missing value for --results"))?;
                        update.display_results = Some(parse_bool("--results", &value)?);
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }
            if update.is_empty() {
                anyhow::bail!("set-status needs --active and/or --results");
            }

            let pool = connect(database_url).await?;
            let status = PgStatusStore::new(pool).set_status(update).await?;
            println!(
                "ok: is_active={} display_results={}",
                status.is_active, status.display_results
            );
            Ok(())
        }
        "tally" => {
            if let Some(other) = args.pop_front() {
                anyhow::bail!("unexpected argument: {other}");
            }
            let pool = connect(database_url).await?;
            let records = PgVoteStore::new(pool).list_votes().await?;
            let counts = tally::compute_counts(&ballot_titles(), records.iter().map(|r| &r.book));

            let total: u64 = counts.iter().map(|c| c.count).sum();
            println!("total votes: {total}");
            for entry in counts {
                println!(
                    "  {:<16} {:>4}  {:>6.2}%",
                    entry.book.as_str(),
                    entry.count,
                    entry.percentage
                );
            }
            Ok(())
        }
        other => {
            print_help();
            anyhow::bail!("unknown command: {other}");
        }
    }
}
