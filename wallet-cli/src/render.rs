//! Snapshot rendering for the terminal.

use serde_json::json;
use shared::dto::{SessionSnapshot, SessionStatus};
use shared::networks::network_name;
use shared::utils::{format_balance, truncate_address};

/// One human-readable line describing `snapshot`.
pub fn describe(snapshot: &SessionSnapshot) -> String {
    let mut line = format!("[{}]", snapshot.status.label());

    if let (Some(account), Some(chain_id)) = (&snapshot.account, &snapshot.chain_id) {
        line.push_str(&format!(" {} on {}", truncate_address(account), network_name(chain_id)));
        match &snapshot.balance_wei {
            Some(wei) => line.push_str(&format!(" | {}", format_balance(wei))),
            None if snapshot.error_message.is_none() => line.push_str(" | balance loading..."),
            None => {}
        }
    } else if snapshot.status == SessionStatus::Disconnected {
        line.push_str(" type 'connect' to connect a wallet");
    }

    if let Some(error) = &snapshot.error_message {
        line.push_str(&format!(" ! {}", error));
    }

    line
}

/// Render `snapshot` with a timestamp, as text or a JSON object.
pub fn render(snapshot: &SessionSnapshot, at: &str, as_json: bool) -> String {
    if as_json {
        json!({ "at": at, "session": snapshot }).to_string()
    } else {
        format!("{} {}", at, describe(snapshot))
    }
}
