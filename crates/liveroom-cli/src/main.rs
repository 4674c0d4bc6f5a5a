mod cli;
mod commands;

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use liveroom_common::{Notice, NoticeLevel, NoticeQueue};
use liveroom_config::LiveroomConfig;
use liveroom_core::{
    DocumentService, HttpDocumentService, LiveSession, LiveSessionHandle, LocalIdentity,
    NavigationAction, NoDocuments, NoMedia, Role, SessionEvent,
};

use commands::{parse_line, LineCommand, HELP};

fn init_logging(args: &cli::Args, config: &LiveroomConfig) {
    let fallback = args
        .log_level
        .clone()
        .unwrap_or_else(|| format!("liveroom_cli={0},liveroom_core={0}", config.logging.level.as_str()));
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &cli::Args) -> LiveroomConfig {
    let mut config = liveroom_config::load_config(args.config.as_deref().map(Path::new))
        .unwrap_or_else(|e| {
            eprintln!("Config load failed, using defaults: {e}");
            LiveroomConfig::default()
        });
    if let Some(url) = &args.broker {
        config.channel.broker_url = url.clone();
    }
    config
}

fn documents(config: &LiveroomConfig) -> Arc<dyn DocumentService> {
    if config.documents.api_base_url.trim().is_empty() {
        return Arc::new(NoDocuments);
    }
    match HttpDocumentService::new(&config.documents) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::warn!("Document service unavailable: {e}");
            Arc::new(NoDocuments)
        }
    }
}

fn print_notice(notice: &Notice) {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    if notice.body.is_empty() {
        println!("! [{tag}] {}", notice.title);
    } else {
        println!("! [{tag}] {}: {}", notice.title, notice.body);
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::StatusChanged(status) => println!("* channel {status:?}"),
        SessionEvent::ParticipantJoined(p) => println!("* {} ({}) joined", p.name, p.id),
        SessionEvent::ParticipantLeft(p) => println!("* {} left", p.id),
        SessionEvent::RosterReset => println!("* roster cleared, waiting for re-announcements"),
        SessionEvent::LinkStateChanged { peer, state } => println!("* link {peer}: {state:?}"),
        SessionEvent::PageChanged { slot, page, by } => match by {
            Some(by) => println!("* slot {slot} -> page {page} (by {by})"),
            None => println!("* slot {slot} -> page {page}"),
        },
        SessionEvent::SlotsRefreshed => println!("* slot list refreshed"),
        SessionEvent::ActiveSlotCleared => println!("* active presentation removed"),
        SessionEvent::EntitlementsChanged(change) => {
            println!("* entitlements of {}: {:?}", change.participant, change.state)
        }
        SessionEvent::Kicked { reason, by } => println!("* removed by {by}: {reason}"),
        SessionEvent::ParticipantKicked { id } => println!("* {id} was removed"),
        SessionEvent::ChatMessage(msg) => println!("<{}> {}", msg.sender_name, msg.content),
        SessionEvent::TypingChanged(names) if !names.is_empty() => {
            println!("* typing: {}", names.join(", "))
        }
        SessionEvent::Notice(notice) => print_notice(notice),
        SessionEvent::Closed => println!("* session closed"),
        _ => {}
    }
}

async fn run_command(
    handle: &LiveSessionHandle,
    notices: &mut NoticeQueue,
    cmd: LineCommand,
) -> Result<(), String> {
    let active = || {
        handle
            .snapshot()
            .active_slot
            .ok_or_else(|| "no active presentation".to_string())
    };
    let done = |r: Result<(), liveroom_common::LiveError>| r.map_err(|e| e.to_string());

    match cmd {
        LineCommand::Chat(text) => {
            handle.send_chat(text).await.map_err(|e| e.to_string())?;
        }
        LineCommand::Page(page) => {
            let page = handle
                .go_to_page(active()?, page)
                .await
                .map_err(|e| e.to_string())?;
            println!("* page {page}");
        }
        LineCommand::Next => {
            let page = handle
                .navigate(active()?, 0, NavigationAction::NextPage)
                .await
                .map_err(|e| e.to_string())?;
            println!("* page {page}");
        }
        LineCommand::Prev => {
            let page = handle
                .navigate(active()?, 0, NavigationAction::PreviousPage)
                .await
                .map_err(|e| e.to_string())?;
            println!("* page {page}");
        }
        LineCommand::Slots => {
            let snapshot = handle.snapshot();
            for slot in &snapshot.slots {
                let marker = if snapshot.active_slot.as_deref() == Some(slot.id.as_str()) {
                    ">"
                } else {
                    " "
                };
                println!(
                    "{marker} {} {} (page {}/{})",
                    slot.id,
                    slot.original_file_name,
                    slot.current_page,
                    slot.total_pages.map_or("?".to_string(), |t| t.to_string())
                );
            }
        }
        LineCommand::Roster => {
            for p in handle.snapshot().roster {
                println!("  {} {} [{:?}]", p.id, p.name, p.role);
            }
        }
        LineCommand::Grant {
            target,
            entitlement,
        } => done(handle.set_entitlement(target, entitlement, true).await)?,
        LineCommand::Revoke {
            target,
            entitlement,
        } => done(handle.set_entitlement(target, entitlement, false).await)?,
        LineCommand::Global { entitlement, value } => {
            done(handle.set_global(entitlement, value).await)?
        }
        LineCommand::MuteAll => done(handle.mute_all().await)?,
        LineCommand::UnmuteAll => done(handle.allow_unmute_all().await)?,
        LineCommand::Kick { target, reason } => done(handle.kick(target, reason).await)?,
        LineCommand::Clear => done(handle.clear_surface().await)?,
        LineCommand::Export(path) => {
            let image = handle.export_surface().await.map_err(|e| e.to_string())?;
            tokio::fs::write(&path, image)
                .await
                .map_err(|e| format!("failed to write {path}: {e}"))?;
            println!("* whiteboard written to {path}");
        }
        LineCommand::Notices => {
            let visible = notices.visible();
            if visible.is_empty() {
                println!("* no recent notices");
            }
            for notice in visible {
                print_notice(notice);
            }
        }
        LineCommand::Help => println!("{HELP}"),
        LineCommand::Leave => done(handle.leave().await)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = cli::parse();
    let config = load_config(&args);
    init_logging(&args, &config);

    tracing::info!("Liveroom v{} starting...", env!("CARGO_PKG_VERSION"));

    let role = if args.host { Role::Host } else { Role::Member };
    let name = args.name.clone().unwrap_or_else(|| args.user.clone());
    let mut identity = LocalIdentity::new(&args.user, name, role);
    if let Some(token) = args
        .token
        .clone()
        .or_else(|| std::env::var("LIVEROOM_TOKEN").ok())
    {
        identity = identity.with_access_token(token);
    }

    let (handle, mut events) = LiveSession::start(
        &config,
        identity,
        &args.room,
        Arc::new(NoMedia),
        documents(&config),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut notices = NoticeQueue::default();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    print_event(&event);
                    if let SessionEvent::Notice(notice) = &event {
                        notices.push(notice.clone());
                    }
                    if matches!(event, SessionEvent::Closed) {
                        break;
                    }
                }
                None => break,
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_line(&line) {
                    Ok(Some(cmd)) => {
                        if let Err(e) = run_command(&handle, &mut notices, cmd).await {
                            println!("! {e}");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("! {e}"),
                },
                Ok(None) => {
                    stdin_open = false;
                    if let Err(e) = handle.leave().await {
                        tracing::warn!("Leave failed: {e}");
                    }
                }
                Err(e) => {
                    tracing::error!("stdin error: {e}");
                    stdin_open = false;
                    let _ = handle.leave().await;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                if let Err(e) = handle.leave().await {
                    tracing::warn!("Leave failed: {e}");
                }
                break;
            }
        }
    }
    tracing::info!("Shutdown complete");
}
