use std::{io::Write, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use client_core::{ListDiff, TodoController, TodoDraft, TodoSession};
use shared::domain::TodoItem;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every item.
    List,
    Show {
        id: String,
    },
    Add {
        name: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Due date as YYYY-MM-DD.
        #[arg(long, value_parser = parse_due_date)]
        due: Option<DateTime<Utc>>,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, value_parser = parse_due_date, conflicts_with = "no_due")]
        due: Option<DateTime<Utc>>,
        #[arg(long)]
        no_due: bool,
    },
    Complete {
        id: String,
    },
    Reopen {
        id: String,
    },
    Delete {
        id: String,
    },
    /// Poll the server and print row changes as they happen.
    Watch {
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
    },
}

pub async fn run(
    command: Command,
    controller: Arc<TodoController>,
    out: &mut impl Write,
) -> Result<()> {
    let now = Utc::now();
    match command {
        Command::List => {
            controller.load_all().await?;
            let items = controller.items();
            if items.is_empty() {
                writeln!(out, "no todo items")?;
            }
            for item in &items {
                writeln!(out, "{}", render_line(item, now))?;
            }
        }
        Command::Show { id } => {
            let item = require(&controller, &id).await?;
            writeln!(out, "{}", render_line(&item, now))?;
            if !item.notes.is_empty() {
                writeln!(out, "  {}", item.notes)?;
            }
        }
        Command::Add { name, notes, due } => {
            let mut draft = TodoDraft::new_item();
            draft.name = name;
            draft.notes = notes;
            draft.set_due_date(due);
            let saved = controller.save(draft.to_item(now)?).await?;
            writeln!(out, "added {}", saved.id)?;
        }
        Command::Edit {
            id,
            name,
            notes,
            due,
            no_due,
        } => {
            let item = require(&controller, &id).await?;
            let mut draft = TodoDraft::edit(&item);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(notes) = notes {
                draft.notes = notes;
            }
            if no_due {
                draft.set_due_date(None);
            } else if due.is_some() {
                draft.set_due_date(due);
            }
            save_draft(&controller, &draft, now, out).await?;
        }
        Command::Complete { id } => set_completed(&controller, &id, true, now, out).await?,
        Command::Reopen { id } => set_completed(&controller, &id, false, now, out).await?,
        Command::Delete { id } => {
            let item = require(&controller, &id).await?;
            if !TodoDraft::edit(&item).can_delete() {
                bail!("todo item '{id}' cannot be deleted");
            }
            controller.delete(&item).await?;
            writeln!(out, "deleted {id}")?;
        }
        Command::Watch { interval_secs } => watch(controller, interval_secs, out).await?,
    }
    Ok(())
}

async fn require(controller: &TodoController, id: &str) -> Result<TodoItem> {
    controller
        .load_by_id(id)
        .await?
        .with_context(|| format!("no todo item with id '{id}'"))
}

async fn set_completed(
    controller: &TodoController,
    id: &str,
    completed: bool,
    now: DateTime<Utc>,
    out: &mut impl Write,
) -> Result<()> {
    let item = require(controller, id).await?;
    let mut draft = TodoDraft::edit(&item);
    draft.completed = completed;
    save_draft(controller, &draft, now, out).await
}

async fn save_draft(
    controller: &TodoController,
    draft: &TodoDraft,
    now: DateTime<Utc>,
    out: &mut impl Write,
) -> Result<()> {
    if !draft.has_changes() {
        writeln!(out, "nothing to change")?;
        return Ok(());
    }
    let saved = controller.save(draft.to_item(now)?).await?;
    writeln!(out, "updated {}", saved.id)?;
    Ok(())
}

async fn watch(
    controller: Arc<TodoController>,
    interval_secs: u64,
    out: &mut impl Write,
) -> Result<()> {
    let mut list = controller.subscribe_list();
    let mut session = TodoSession::new(Arc::clone(&controller));
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => session.spawn_load_all(),
            changed = list.next_diff() => {
                let Some(changes) = changed else { break };
                write_changes(&changes, list.rendered(), Utc::now(), out)?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.close().await;
    Ok(())
}

fn write_changes(
    changes: &ListDiff,
    rendered: &[TodoItem],
    now: DateTime<Utc>,
    out: &mut impl Write,
) -> Result<()> {
    for index in &changes.removed {
        writeln!(out, "- row {index}")?;
    }
    for index in &changes.inserted {
        writeln!(out, "+ {}", render_line(&rendered[*index], now))?;
    }
    for index in &changes.updated {
        writeln!(out, "~ {}", render_line(&rendered[*index], now))?;
    }
    for moved in &changes.moved {
        writeln!(out, "> row {} -> {}", moved.from, moved.to)?;
    }
    out.flush()?;
    Ok(())
}

pub fn render_line(item: &TodoItem, now: DateTime<Utc>) -> String {
    let mark = if item.completed { "x" } else { " " };
    let mut line = format!("[{mark}] {}  {}", item.id, item.name);
    if let Some(label) = item.due_label() {
        line.push_str(&format!("  due {label}"));
        if item.is_overdue(now) && !item.completed {
            line.push_str(" (overdue)");
        }
    }
    line
}

fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|error| format!("expected YYYY-MM-DD: {error}"))
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
