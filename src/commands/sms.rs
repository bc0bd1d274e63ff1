//! iMessage: send through Messages.app, read from the local chat database.
//!
//! Reads open `~/Library/Messages/chat.db` directly with bound SQL
//! parameters; the database is only readable once the hosting terminal has
//! Full Disk Access, so both failure modes get that remediation.

use crate::error::{MctrlError, Result};
use crate::output;
use crate::platform;
use crate::script::{self, sanitize::ScriptBuilder};
use chrono::{DateTime, SecondsFormat};
use clap::Subcommand;
use rusqlite::{Connection, OpenFlags, ToSql};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Sms {
    /// Send an iMessage
    Send {
        /// Phone number or email
        to: String,
        /// Message text
        message: String,
    },
    /// Read recent messages from the local iMessage database
    Get {
        /// Filter by phone/email
        #[arg(long)]
        contact: Option<String>,
        /// Number of messages
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Filter by message text
        #[arg(long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct Message {
    text: String,
    date: String,
    from_me: bool,
    contact: String,
}

/// Apple stores message dates as nanoseconds since 2001-01-01.
const APPLE_EPOCH_OFFSET: i64 = 978_307_200;

fn message_db_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join("Library").join("Messages").join("chat.db"))
}

impl Sms {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Sms::Send { to, message } => send(&to, &message),
            Sms::Get {
                contact,
                limit,
                search,
                json,
            } => get(contact.as_deref(), limit, search.as_deref(), json),
        }
    }
}

fn send(to: &str, message: &str) -> Result<()> {
    let script = ScriptBuilder::new()
        .raw("tell application \"Messages\"\n  send ")
        .literal(message)
        .raw(" to participant ")
        .literal(to)
        .raw(" of account 1\nend tell")
        .build();
    script::osascript(&script)?;
    println!("Sent to {}", to);
    Ok(())
}

fn get(contact: Option<&str>, limit: u32, search: Option<&str>, json: bool) -> Result<()> {
    let Some(db_path) = message_db_path() else {
        return Err(MctrlError::Failed("cannot locate home directory.".into()));
    };
    if !db_path.exists() {
        return Err(MctrlError::Failed(
            "iMessage database not found. Grant Full Disk Access to your terminal.".into(),
        ));
    }
    let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|_| {
            MctrlError::Failed(
                "cannot read iMessage database. Ensure Full Disk Access is granted.".into(),
            )
        })?;
    let messages = query_messages(&conn, contact, search, limit).map_err(|_| {
        MctrlError::Failed(
            "cannot read iMessage database. Ensure Full Disk Access is granted.".into(),
        )
    })?;

    if messages.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("No messages found.");
        }
        return Ok(());
    }
    if json {
        output::json_out(&messages);
    } else {
        for m in &messages {
            let dir = if m.from_me { ">>>" } else { "<<<" };
            println!("  {} [{}] {}", dir, m.contact, m.date);
            println!("      {}\n", m.text);
        }
    }
    Ok(())
}

/// Newest-first messages with optional contact and substring filters, all
/// bound as SQL parameters.
fn query_messages(
    conn: &Connection,
    contact: Option<&str>,
    search: Option<&str>,
    limit: u32,
) -> rusqlite::Result<Vec<Message>> {
    let mut sql = String::from(
        "SELECT msg.text, msg.date / 1000000000 + ? AS unix_ts, msg.is_from_me, COALESCE(hdl.id, '') AS sender \
         FROM message msg \
         LEFT OUTER JOIN handle hdl ON msg.handle_id = hdl.rowid \
         WHERE msg.text IS NOT NULL",
    );
    let like_pattern = search.map(|s| format!("%{}%", s));
    let mut params: Vec<&dyn ToSql> = vec![&APPLE_EPOCH_OFFSET];
    if let Some(contact) = contact.as_ref() {
        sql.push_str(" AND hdl.id = ?");
        params.push(contact);
    }
    if let Some(pattern) = like_pattern.as_ref() {
        sql.push_str(" AND msg.text LIKE ?");
        params.push(pattern);
    }
    sql.push_str(" ORDER BY msg.date DESC LIMIT ?");
    let limit = i64::from(limit);
    params.push(&limit);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params.as_slice(), |row| {
        let text: String = row.get(0)?;
        let unix_ts: i64 = row.get(1)?;
        let from_me: i64 = row.get(2)?;
        let sender: String = row.get(3)?;
        Ok(Message {
            text,
            date: format_timestamp(unix_ts),
            from_me: from_me == 1,
            contact: sender,
        })
    })?;
    rows.collect()
}

fn format_timestamp(unix_ts: i64) -> String {
    DateTime::from_timestamp(unix_ts, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE message (rowid INTEGER PRIMARY KEY, text TEXT, date INTEGER, is_from_me INTEGER, handle_id INTEGER);
             CREATE TABLE handle (rowid INTEGER PRIMARY KEY, id TEXT);
             INSERT INTO handle (rowid, id) VALUES (1, '+15551234567'), (2, 'pal@example.com');
             INSERT INTO message (text, date, is_from_me, handle_id) VALUES
               ('see you at 5', 1000000000, 0, 1),
               ('on my way', 2000000000, 1, 1),
               ('lunch?', 3000000000, 0, 2),
               (NULL, 4000000000, 0, 2);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn messages_come_back_newest_first_without_null_texts() {
        let conn = seeded_db();
        let messages = query_messages(&conn, None, None, 10).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].text, "lunch?");
        assert_eq!(messages[0].contact, "pal@example.com");
        assert!(!messages[0].from_me);
        assert!(messages[1].from_me);
    }

    #[test]
    fn contact_filter_binds_as_a_parameter() {
        let conn = seeded_db();
        let messages = query_messages(&conn, Some("+15551234567"), None, 10).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.contact == "+15551234567"));

        // A hostile "contact" is just an unmatched value, not SQL.
        let messages =
            query_messages(&conn, Some("' OR '1'='1"), None, 10).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn search_filter_matches_substrings() {
        let conn = seeded_db();
        let messages = query_messages(&conn, None, Some("way"), 10).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "on my way");
    }

    #[test]
    fn limit_caps_the_result() {
        let conn = seeded_db();
        let messages = query_messages(&conn, None, None, 1).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn timestamps_render_as_utc_rfc3339() {
        // 2001-01-01T00:00:01Z in Apple time is offset + 1.
        let rendered = format_timestamp(APPLE_EPOCH_OFFSET + 1);
        assert_eq!(rendered, "2001-01-01T00:00:01.000Z");
    }

    #[test]
    fn send_script_escapes_message_and_recipient() {
        let script = ScriptBuilder::new()
            .raw("tell application \"Messages\"\n  send ")
            .literal("it's \"done\"")
            .raw(" to participant ")
            .literal("+15551234567")
            .raw(" of account 1\nend tell")
            .build();
        assert!(script.contains("send \"it's \\\"done\\\"\" to participant \"+15551234567\""));
    }
}
