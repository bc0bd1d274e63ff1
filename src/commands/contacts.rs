//! Contacts.app lookups.

use crate::error::Result;
use crate::output;
use crate::platform;
use crate::script::{self, sanitize::ScriptBuilder};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Contacts {
    /// Look up a contact's phone number by full name
    Phone {
        /// Full name of the contact
        name: String,
    },
    /// Look up a contact's email address by full name
    Email {
        /// Full name of the contact
        name: String,
    },
    /// Find contacts whose name contains a string
    Search {
        /// Name to search for
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Contacts {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Contacts::Phone { name } => {
                println!("{}", script::osascript(&value_script(&name, "phone"))?);
                Ok(())
            }
            Contacts::Email { name } => {
                println!("{}", script::osascript(&value_script(&name, "email"))?);
                Ok(())
            }
            Contacts::Search { query, json } => {
                let raw = script::osascript(&search_script(&query))?;
                let names: Vec<&str> = output::records(&raw).collect();
                if json {
                    output::json_out(&names);
                } else {
                    for name in names {
                        println!("{}", name);
                    }
                }
                Ok(())
            }
        }
    }
}

fn value_script(name: &str, property: &str) -> String {
    ScriptBuilder::new()
        .raw("tell application \"Contacts\"\n  set entry to first person whose name is ")
        .literal(name)
        .raw(&format!(
            "\n  return value of first {} of entry\nend tell",
            property
        ))
        .build()
}

fn search_script(query: &str) -> String {
    ScriptBuilder::new()
        .raw("tell application \"Contacts\"\n  set results to every person whose name contains ")
        .literal(query)
        .raw(
            "\n  set nameLines to {}\n  repeat with entry in results\n    set end of nameLines to name of entry\n  end repeat\n  set AppleScript's text item delimiters to linefeed\n  return nameLines as text\nend tell",
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_scripts_differ_only_in_the_property() {
        let phone = value_script("John Doe", "phone");
        let email = value_script("John Doe", "email");
        assert!(phone.contains("value of first phone of entry"));
        assert!(email.contains("value of first email of entry"));
        assert!(phone.contains("name is \"John Doe\""));
    }

    #[test]
    fn search_escapes_the_query() {
        let script = search_script("O\"Brien");
        assert!(script.contains("name contains \"O\\\"Brien\""));
    }
}
