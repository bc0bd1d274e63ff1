//! Calendar.app events. AppleScript has no date literals worth trusting
//! across locales, so datetimes are lowered into component-wise `set`
//! assignments on `current date`.

use crate::error::{MctrlError, Result};
use crate::output;
use crate::platform;
use crate::script::{self, sanitize};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum Calendar {
    /// List calendar events for a date or range
    List {
        /// Start date YYYY-MM-DD (default: today)
        #[arg(long)]
        from: Option<String>,
        /// End date YYYY-MM-DD (default: same as --from)
        #[arg(long)]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new calendar event
    Create {
        /// Event title
        title: String,
        /// Start (YYYY-MM-DDTHH:MM)
        #[arg(long)]
        start: String,
        /// End (YYYY-MM-DDTHH:MM)
        #[arg(long)]
        end: String,
        /// Location
        #[arg(long, default_value = "")]
        location: String,
        /// Notes
        #[arg(long, default_value = "")]
        notes: String,
        /// Calendar name (default: first)
        #[arg(long)]
        calendar: Option<String>,
    },
    /// Delete a calendar event by title and date
    Delete {
        /// Event title
        title: String,
        /// Date of the event (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Calendar name
        #[arg(long)]
        calendar: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct Event {
    title: String,
    start: String,
    end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    calendar: String,
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| {
            MctrlError::InvalidArgument(format!(
                "Invalid datetime '{}'; expected YYYY-MM-DDTHH:MM.",
                s
            ))
        })
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        MctrlError::InvalidArgument(format!("Invalid date '{}'; expected YYYY-MM-DD.", s))
    })
}

/// `set <var> to current date` plus component assignments for one datetime.
fn date_set_script(var: &str, dt: NaiveDateTime) -> String {
    format!(
        "set {var} to current date\n\
         set year of {var} to {}\n\
         set month of {var} to {}\n\
         set day of {var} to {}\n\
         set hours of {var} to {}\n\
         set minutes of {var} to {}\n\
         set seconds of {var} to 0",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        var = var,
    )
}

fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (
        date.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default()),
        date.and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default()),
    )
}

impl Calendar {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Calendar::List { from, to, json } => list(from.as_deref(), to.as_deref(), json),
            Calendar::Create {
                title,
                start,
                end,
                location,
                notes,
                calendar,
            } => create(&title, &start, &end, &location, &notes, calendar.as_deref()),
            Calendar::Delete {
                title,
                date,
                calendar,
            } => delete(&title, &date, calendar.as_deref()),
        }
    }
}

fn list(from: Option<&str>, to: Option<&str>, json: bool) -> Result<()> {
    let from_date = match from {
        Some(s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };
    let to_date = match to {
        Some(s) => parse_date(s)?,
        None => from_date,
    };
    let (start, _) = day_bounds(from_date);
    let (_, end) = day_bounds(to_date);

    let script = format!(
        "{}\n{}\nset out to \"\"\n\
         tell application \"Calendar\"\n\
         \x20 repeat with c in calendars\n\
         \x20   set evts to (every event of c whose start date >= sd and start date <= ed)\n\
         \x20   repeat with ev in evts\n\
         \x20     set out to out & (summary of ev) & \"|||\" & (start date of ev as string) & \"|||\" & (end date of ev as string) & \"|||\"\n\
         \x20     try\n\
         \x20       set out to out & (location of ev)\n\
         \x20     end try\n\
         \x20     set out to out & \"|||\" & (name of c) & linefeed\n\
         \x20   end repeat\n\
         \x20 end repeat\n\
         end tell\n\
         return out",
        date_set_script("sd", start),
        date_set_script("ed", end),
    );

    let raw = script::osascript(&script)?;
    let events = parse_events(&raw);
    if events.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("No events found.");
        }
        return Ok(());
    }
    if json {
        output::json_out(&events);
    } else {
        for e in &events {
            println!("  {}", e.title);
            println!("    {} - {}", e.start, e.end);
            if let Some(loc) = &e.location {
                println!("    Location: {}", loc);
            }
            println!();
        }
    }
    Ok(())
}

fn parse_events(raw: &str) -> Vec<Event> {
    output::records(raw)
        .map(|line| {
            let fields = output::fields(line);
            let get = |i: usize| fields.get(i).copied().unwrap_or("").to_string();
            let location = get(3);
            Event {
                title: get(0),
                start: get(1),
                end: get(2),
                location: if location.is_empty() {
                    None
                } else {
                    Some(location)
                },
                calendar: get(4),
            }
        })
        .collect()
}

fn create(
    title: &str,
    start: &str,
    end: &str,
    location: &str,
    notes: &str,
    calendar: Option<&str>,
) -> Result<()> {
    let start = parse_datetime(start)?;
    let end = parse_datetime(end)?;
    let cal_ref = match calendar {
        Some(name) => format!("calendar {}", sanitize::quoted(name)),
        None => "first calendar".to_string(),
    };
    let script = format!(
        "tell application \"Calendar\"\n{}\n{}\n  tell {}\n    make new event with properties {{summary:{}, start date:sd, end date:ed, location:{}, description:{}}}\n  end tell\nend tell",
        date_set_script("sd", start),
        date_set_script("ed", end),
        cal_ref,
        sanitize::quoted(title),
        sanitize::quoted(location),
        sanitize::quoted(notes),
    );
    script::osascript(&script)?;
    println!("Created: {}", title);
    Ok(())
}

fn delete(title: &str, date: &str, calendar: Option<&str>) -> Result<()> {
    let date = parse_date(date)?;
    let (start, end) = day_bounds(date);
    // Same loop either way; a named calendar just narrows the list.
    let list_expr = match calendar {
        Some(name) => format!("{{calendar {}}}", sanitize::quoted(name)),
        None => "calendars".to_string(),
    };
    let script = format!(
        "tell application \"Calendar\"\n{}\n{}\n  repeat with c in {}\n    set evts to (every event of c whose summary is {} and start date >= sd and start date <= ed)\n    repeat with ev in evts\n      delete ev\n    end repeat\n  end repeat\nend tell",
        date_set_script("sd", start),
        date_set_script("ed", end),
        list_expr,
        sanitize::quoted(title),
    );
    script::osascript(&script)?;
    println!("Deleted: {} on {}", title, date);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetimes_parse_with_and_without_seconds() {
        assert!(parse_datetime("2026-03-01T09:00").is_ok());
        assert!(parse_datetime("2026-03-01T09:00:30").is_ok());
        assert!(parse_datetime("2026-03-01").is_err());
        assert!(parse_datetime("tomorrow").is_err());
    }

    #[test]
    fn date_lowering_assigns_each_component() {
        let dt = parse_datetime("2026-03-01T09:30").unwrap();
        let script = date_set_script("sd", dt);
        assert!(script.contains("set sd to current date"));
        assert!(script.contains("set year of sd to 2026"));
        assert!(script.contains("set month of sd to 3"));
        assert!(script.contains("set day of sd to 1"));
        assert!(script.contains("set hours of sd to 9"));
        assert!(script.contains("set minutes of sd to 30"));
        assert!(script.contains("set seconds of sd to 0"));
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let date = parse_date("2026-03-01").unwrap();
        let (start, end) = day_bounds(date);
        assert_eq!(start.hour(), 0);
        assert_eq!(end.hour(), 23);
        assert_eq!(end.minute(), 59);
    }

    #[test]
    fn event_records_parse_with_optional_location() {
        let raw = "Standup|||Mon Mar 1|||Mon Mar 1|||Room 4|||Work\nLunch|||Tue|||Tue||||||Home";
        let events = parse_events(raw);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].location.as_deref(), Some("Room 4"));
        assert!(events[1].location.is_none());
        assert_eq!(events[1].calendar, "Home");
    }
}
