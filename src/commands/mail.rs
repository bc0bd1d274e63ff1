//! Mail.app: inbox listing, sending, unread count.

use crate::error::Result;
use crate::output;
use crate::platform;
use crate::script::{self, sanitize::ScriptBuilder};
use clap::Subcommand;
use serde::Serialize;

/// Inbox scans are capped so a huge mailbox cannot stall the interpreter.
const INBOX_CAP: u32 = 50;

#[derive(Subcommand, Debug)]
pub enum Mail {
    /// List recent inbox messages
    Inbox {
        /// Number of messages (max 50)
        #[arg(long, default_value_t = 5)]
        limit: u32,
        /// Only show unread messages
        #[arg(long)]
        unread: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send an email via Mail.app
    Send {
        /// Recipient email
        #[arg(long)]
        to: String,
        /// Email subject
        #[arg(long)]
        subject: String,
        /// Email body
        #[arg(long)]
        body: String,
        /// File path(s) to attach
        #[arg(long)]
        attachment: Vec<String>,
    },
    /// Print the number of unread inbox messages
    UnreadCount,
}

#[derive(Debug, Serialize)]
struct Message {
    from: String,
    subject: String,
    date: String,
    read: bool,
}

impl Mail {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Mail::Inbox {
                limit,
                unread,
                json,
            } => inbox(limit.min(INBOX_CAP), unread, json),
            Mail::Send {
                to,
                subject,
                body,
                attachment,
            } => send(&to, &subject, &body, &attachment),
            Mail::UnreadCount => {
                let count = script::osascript(&format!(
                    "tell application \"Mail\"\n  set n to count of (messages of inbox whose read status is false)\n  if n > {cap} then set n to {cap}\n  return n\nend tell",
                    cap = INBOX_CAP
                ))?;
                println!("{}", count);
                Ok(())
            }
        }
    }
}

fn inbox_script(cap: u32, unread: bool) -> String {
    let filter = if unread {
        " whose read status is false"
    } else {
        ""
    };
    format!(
        "tell application \"Mail\"\n  set msgs to (messages of inbox{filter})\n  set n to count of msgs\n  if n > {cap} then set n to {cap}\n  set out to \"\"\n  repeat with i from 1 to n\n    set m to item i of msgs\n    set out to out & (sender of m) & \"|||\" & (subject of m) & \"|||\" & (date received of m as string) & \"|||\" & (read status of m as string) & linefeed\n  end repeat\n  return out\nend tell",
        filter = filter,
        cap = cap
    )
}

fn inbox(cap: u32, unread: bool, json: bool) -> Result<()> {
    let raw = script::osascript(&inbox_script(cap, unread))?;
    let messages = parse_inbox(&raw);
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
            let tag = if m.read { "" } else { " [UNREAD]" };
            println!("  From: {}", m.from);
            println!("  Subject: {}{}", m.subject, tag);
            println!("  Date: {}\n", m.date);
        }
    }
    Ok(())
}

fn parse_inbox(raw: &str) -> Vec<Message> {
    output::records(raw)
        .map(|line| {
            let fields = output::fields(line);
            let get = |i: usize| fields.get(i).copied().unwrap_or("").to_string();
            Message {
                from: get(0),
                subject: get(1),
                date: get(2),
                read: fields.get(3).copied() == Some("true"),
            }
        })
        .collect()
}

fn send_script(to: &str, subject: &str, body: &str, attachments: &[String]) -> String {
    let mut builder = ScriptBuilder::new()
        .raw("tell application \"Mail\"\n  set msg to make new outgoing message with properties {subject:")
        .literal(subject)
        .raw(", content:")
        .literal(body)
        .raw(", visible:true}\n  tell msg\n    make new to recipient at end of to recipients with properties {address:")
        .literal(to)
        .raw("}\n  end tell\n");
    for path in attachments {
        builder = builder
            .raw("  tell content of msg\n    make new attachment with properties {file name:POSIX file ")
            .literal(path)
            .raw("} at after last paragraph\n  end tell\n  delay 2\n");
    }
    builder.raw("  send msg\nend tell").build()
}

fn send(to: &str, subject: &str, body: &str, attachments: &[String]) -> Result<()> {
    script::osascript(&send_script(to, subject, body, attachments))?;
    println!("Sent to {}: {}", to, subject);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbox_script_caps_the_scan() {
        let script = inbox_script(5, false);
        assert!(script.contains("if n > 5 then set n to 5"));
        assert!(!script.contains("read status is false"));
    }

    #[test]
    fn unread_filter_is_applied_when_asked() {
        let script = inbox_script(10, true);
        assert!(script.contains("messages of inbox whose read status is false"));
    }

    #[test]
    fn inbox_records_parse_read_state() {
        let raw = "a@x.com|||Hi|||Mon Mar 1|||true\nb@y.com|||Yo|||Tue Mar 2|||false";
        let messages = parse_inbox(raw);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].read);
        assert!(!messages[1].read);
        assert_eq!(messages[1].from, "b@y.com");
    }

    #[test]
    fn send_script_escapes_every_caller_slot() {
        let script = send_script(
            "user@example.com",
            "Status \"report\"",
            "All green",
            &["/tmp/summary.pdf".to_string()],
        );
        assert!(script.contains("subject:\"Status \\\"report\\\"\""));
        assert!(script.contains("address:\"user@example.com\""));
        assert!(script.contains("POSIX file \"/tmp/summary.pdf\""));
        assert!(script.trim_end().ends_with("send msg\nend tell"));
    }

    #[test]
    fn send_script_without_attachments_skips_the_attachment_block() {
        let script = send_script("a@b.c", "Hi", "Body", &[]);
        assert!(!script.contains("attachment"));
    }
}
