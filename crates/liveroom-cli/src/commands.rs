//! Line commands read from stdin.

use liveroom_core::Entitlement;

#[derive(Debug, Clone, PartialEq)]
pub enum LineCommand {
    Chat(String),
    Page(u32),
    Next,
    Prev,
    Slots,
    Roster,
    Grant { target: String, entitlement: Entitlement },
    Revoke { target: String, entitlement: Entitlement },
    Global { entitlement: Entitlement, value: bool },
    MuteAll,
    UnmuteAll,
    Kick { target: String, reason: String },
    Clear,
    Export(String),
    Notices,
    Help,
    Leave,
}

pub const HELP: &str = "\
commands:
  <text>                      send a chat message
  /page N | /next | /prev     move the active presentation (host)
  /slots                      list document slots
  /roster                     list participants
  /grant ID PERM              grant an entitlement (host)
  /revoke ID PERM             revoke an entitlement (host)
  /global PERM on|off         change the room default (host)
  /mute-all | /unmute-all     (host)
  /kick ID [reason]           (host)
  /clear                      clear the whiteboard (host)
  /export FILE                write the whiteboard as PPM
  /notices                    show recent notices
  /leave";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<LineCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(LineCommand::Chat(line.to_string())));
    };

    let mut words = rest.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let cmd = match verb {
        "chat" => {
            let text = rest
                .trim_start()
                .strip_prefix("chat")
                .unwrap_or_default()
                .trim();
            if text.is_empty() {
                return Err("usage: /chat TEXT".into());
            }
            LineCommand::Chat(text.to_string())
        }
        "page" => {
            let page = words
                .next()
                .and_then(|w| w.parse().ok())
                .ok_or("usage: /page N")?;
            LineCommand::Page(page)
        }
        "next" => LineCommand::Next,
        "prev" => LineCommand::Prev,
        "slots" => LineCommand::Slots,
        "roster" | "who" => LineCommand::Roster,
        "grant" | "revoke" => {
            let target = words.next().ok_or(format!("usage: /{verb} ID PERM"))?;
            let entitlement = words
                .next()
                .ok_or(format!("usage: /{verb} ID PERM"))?
                .parse::<Entitlement>()?;
            let target = target.to_string();
            if verb == "grant" {
                LineCommand::Grant {
                    target,
                    entitlement,
                }
            } else {
                LineCommand::Revoke {
                    target,
                    entitlement,
                }
            }
        }
        "global" => {
            let entitlement = words
                .next()
                .ok_or("usage: /global PERM on|off")?
                .parse::<Entitlement>()?;
            let value = match words.next() {
                Some("on") => true,
                Some("off") => false,
                _ => return Err("usage: /global PERM on|off".into()),
            };
            LineCommand::Global { entitlement, value }
        }
        "mute-all" => LineCommand::MuteAll,
        "unmute-all" => LineCommand::UnmuteAll,
        "kick" => {
            let target = words.next().ok_or("usage: /kick ID [reason]")?.to_string();
            let reason = words.collect::<Vec<_>>().join(" ");
            LineCommand::Kick { target, reason }
        }
        "clear" => LineCommand::Clear,
        "export" => {
            let path = words.next().ok_or("usage: /export FILE")?;
            LineCommand::Export(path.to_string())
        }
        "notices" => LineCommand::Notices,
        "help" | "?" => LineCommand::Help,
        "leave" | "quit" | "exit" => LineCommand::Leave,
        other => return Err(format!("unknown command /{other}, try /help")),
    };
    Ok(Some(cmd))
}
