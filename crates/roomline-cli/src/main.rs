//! # roomline
//!
//! Terminal front end for the roomline client engine.
//!
//! Reads commands and messages from stdin, renders the room after every
//! timeline change and keeps the session token in a local SQLite database
//! so the next start signs in without asking.

mod cli;
mod render;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use roomline_client::intake::convert;
use roomline_client::{CandidateFile, ChatClient, ClientConfig, HttpApi, Screen, UiEvent};
use roomline_shared::constants::MAX_AVATAR_SIZE;
use roomline_store::{Database, MemoryTokenStore, SqliteTokenStore, TokenStore};

use crate::cli::{parse_input, Cli, Input, HELP};
use crate::render::{render, Pager};

type Client = ChatClient<HttpApi>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Tracing and configuration
    // -----------------------------------------------------------------------
    roomline_client::init_tracing();

    let args = Cli::parse();
    let config = args.apply(ClientConfig::from_env());
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 2. Token storage and transport
    // -----------------------------------------------------------------------
    let store: Arc<dyn TokenStore> = if args.ephemeral {
        Arc::new(MemoryTokenStore::new())
    } else {
        let db = match &config.data_dir {
            Some(dir) => Database::open_in_dir(dir),
            None => Database::new(),
        }
        .context("opening the session database")?;
        Arc::new(SqliteTokenStore::new(db))
    };
    let api = HttpApi::new(&config.server_url).context("building the HTTP client")?;

    let (client, mut events) = ChatClient::new(api, store, config);
    let mut pager = Pager::new(args.rows);

    // -----------------------------------------------------------------------
    // 3. Interaction loop
    // -----------------------------------------------------------------------
    client.restore().await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Input::Quit => break,
                    input => handle_input(&client, &mut pager, input).await,
                }
            }
            Some(event) = events.recv() => on_event(&client, &mut pager, event),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.shutdown();
    Ok(())
}

fn redraw(client: &Client, pager: &mut Pager) {
    let view = client.view();
    pager.set_total(view.messages.len());
    print!("{}", render(&view, pager));
}

fn on_event(client: &Client, pager: &mut Pager, event: UiEvent) {
    match event {
        UiEvent::ScreenChanged(Screen::Unauthenticated) => {
            println!("Not signed in. /login <nickname> <password> or /register, /help for more.");
        }
        UiEvent::ScreenChanged(Screen::Authenticated) => println!("Signed in."),
        UiEvent::ScreenChanged(Screen::Loading) => {}
        UiEvent::TimelineChanged { scroll } => {
            let view = client.view();
            pager.set_total(view.messages.len());
            pager.apply(scroll);
            print!("{}", render(&view, pager));
        }
        UiEvent::AuthErrorChanged(Some(error)) => println!("!! {error}"),
        UiEvent::ChatErrorChanged(Some(error)) => println!("!! {error}"),
        UiEvent::JumpAffordance(true) => println!("── more below, /bottom to jump ──"),
        UiEvent::StagingChanged { count } if count > 0 => println!("{count} image(s) staged"),
        _ => {}
    }
}

async fn read_candidate(path: &Path) -> Option<CandidateFile> {
    match CandidateFile::read(path).await {
        Ok(file) => Some(file),
        Err(e) => {
            println!("!! cannot read {}: {e}", path.display());
            None
        }
    }
}

async fn handle_input(client: &Client, pager: &mut Pager, input: Input) {
    match input {
        Input::Login { nickname, password } => {
            // Failures are reported through AuthErrorChanged.
            let _ = client.login(&nickname, &password).await;
        }
        Input::Register {
            nickname,
            password,
            avatar,
        } => {
            let avatar = match avatar {
                Some(path) => {
                    let Some(file) = read_candidate(&path).await else {
                        return;
                    };
                    match convert(&file, MAX_AVATAR_SIZE) {
                        Ok(encoded) => Some(encoded),
                        Err(e) => {
                            println!("!! avatar rejected: {e}");
                            return;
                        }
                    }
                }
                None => None,
            };
            let _ = client.register(&nickname, &password, avatar).await;
        }
        Input::Attach(paths) => {
            let added = client.stage_files(&paths).await;
            if added < paths.len() {
                println!("{} of {} file(s) staged", added, paths.len());
            }
        }
        Input::Unstage(n) => match client.staged().get(n - 1) {
            Some(item) => {
                client.unstage(item.id);
            }
            None => println!("!! no staged image #{n}"),
        },
        Input::Avatar(path) => {
            if let Some(file) = read_candidate(&path).await {
                match client.update_avatar(file).await {
                    Ok(_) => println!("Avatar updated."),
                    Err(e) => println!("!! {e}"),
                }
            }
        }
        Input::Up => {
            pager.page_up();
            client.on_scroll(pager.viewport());
            redraw(client, pager);
        }
        Input::Down => {
            pager.page_down();
            client.on_scroll(pager.viewport());
            redraw(client, pager);
        }
        Input::Bottom => {
            pager.apply(client.jump_to_bottom());
            redraw(client, pager);
        }
        Input::Logout => client.logout().await,
        Input::Help => println!("{HELP}"),
        Input::Say(text) => {
            if client.screen() != Screen::Authenticated {
                println!("!! sign in first");
                return;
            }
            client.set_compose(&text);
            // The pending copy shows up through TimelineChanged while the
            // request is in flight.
            let client = client.clone();
            tokio::spawn(async move {
                if let Err(e) = client.send_compose().await {
                    warn!(error = %e, "Message not sent");
                }
            });
        }
        Input::Invalid(reason) => println!("!! {reason}"),
        Input::Empty | Input::Quit => {}
    }
}

