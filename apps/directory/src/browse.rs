//! Line-driven interactive session over a [`DirectoryHandle`].

use std::sync::Arc;

use anyhow::Result;
use client_core::{DirectoryEvent, DirectoryHandle};
use shared::domain::{FilterField, ResultLimit};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, warn};

use crate::render::{render_dialog, render_filters, render_table};

const HELP: &str = "\
commands:
  last <text>    stage a last-name filter
  first <text>   stage a first-name filter
  search         apply the staged name filters
  limit <n>      show 25, 50, 100 or 200 employees (applies immediately)
  open <row>     show details for a row of the table
  close          close the details dialog
  show           redraw
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Stage(FilterField, String),
    Limit(ResultLimit),
    Search,
    Open(usize),
    Close,
    Show,
    Help,
    Quit,
}

pub fn parse_intent(line: &str) -> Result<Intent, String> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "last" => Ok(Intent::Stage(FilterField::LastName, rest.to_string())),
        "first" => Ok(Intent::Stage(FilterField::FirstName, rest.to_string())),
        "search" => Ok(Intent::Search),
        "limit" => rest
            .parse::<u32>()
            .map_err(|_| format!("`{rest}` is not a number"))
            .and_then(|value| ResultLimit::try_from(value).map_err(|err| err.to_string()))
            .map(Intent::Limit),
        "open" => match rest.parse::<usize>() {
            Ok(row) if row > 0 => Ok(Intent::Open(row)),
            _ => Err(format!("`{rest}` is not a row number")),
        },
        "close" => Ok(Intent::Close),
        "" | "show" => Ok(Intent::Show),
        "help" | "?" => Ok(Intent::Help),
        "quit" | "exit" => Ok(Intent::Quit),
        other => Err(format!("unknown command `{other}`; type `help`")),
    }
}

pub async fn run(handle: Arc<dyn DirectoryHandle>) -> Result<()> {
    let mut events = handle.subscribe_events();
    handle.start().await;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_intent(&line) {
                    Ok(Intent::Quit) => break,
                    Ok(intent) => dispatch(handle.as_ref(), intent).await,
                    Err(message) => println!("{message}"),
                }
            }
            event = events.recv() => match event {
                Ok(event) => on_event(handle.as_ref(), event).await,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "browse: event stream lagged; redrawing");
                    redraw(handle.as_ref()).await;
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

async fn dispatch(handle: &dyn DirectoryHandle, intent: Intent) {
    match intent {
        Intent::Stage(field, value) => handle.stage_edit(field, &value).await,
        Intent::Limit(limit) => {
            handle.apply_limit(limit).await;
        }
        Intent::Search => {
            handle.confirm_search().await;
        }
        Intent::Open(row) => {
            debug!(row, "browse: row activated");
            if handle.activate_result_row(row - 1).await.is_none() {
                println!("row {row} cannot be opened");
            }
        }
        Intent::Close => handle.close_modal().await,
        Intent::Show => redraw(handle).await,
        Intent::Help => println!("{HELP}"),
        Intent::Quit => {}
    }
}

async fn on_event(handle: &dyn DirectoryHandle, event: DirectoryEvent) {
    match event {
        DirectoryEvent::StagedFilterChanged { .. } => {
            println!("{}", render_filters(&handle.snapshot().await));
        }
        DirectoryEvent::QueryFailed { query, error } => {
            warn!(?query, code = ?error.code, "browse: query failed");
            println!("{query:?} query failed: {}", error.message);
        }
        DirectoryEvent::AppliedFilterChanged { .. }
        | DirectoryEvent::ListSettled { .. }
        | DirectoryEvent::ModalOpened { .. }
        | DirectoryEvent::DetailSettled { .. }
        | DirectoryEvent::ModalClosed => redraw(handle).await,
    }
}

async fn redraw(handle: &dyn DirectoryHandle) {
    let snapshot = handle.snapshot().await;
    println!("{}", render_filters(&snapshot));
    print!("{}", render_table(&snapshot));
    print!("{}", render_dialog(&snapshot.modal));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_staging_and_limit_commands() {
        assert_eq!(
            parse_intent("last  Smith "),
            Ok(Intent::Stage(FilterField::LastName, "Smith".into()))
        );
        assert_eq!(
            parse_intent("first"),
            Ok(Intent::Stage(FilterField::FirstName, String::new()))
        );
        assert_eq!(parse_intent("limit 100"), Ok(Intent::Limit(ResultLimit::L100)));
        assert!(parse_intent("limit 30").is_err());
        assert!(parse_intent("limit lots").is_err());
    }

    #[test]
    fn parses_row_and_dialog_commands() {
        assert_eq!(parse_intent("open 3"), Ok(Intent::Open(3)));
        assert!(parse_intent("open 0").is_err());
        assert_eq!(parse_intent("CLOSE"), Ok(Intent::Close));
        assert_eq!(parse_intent(""), Ok(Intent::Show));
        assert_eq!(parse_intent("exit"), Ok(Intent::Quit));
        assert!(parse_intent("delete 3").is_err());
    }
}
