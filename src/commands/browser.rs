//! Browser control via AppleScript, with Chrome and Safari variants.

use crate::config;
use crate::error::Result;
use crate::output;
use crate::platform;
use crate::script::{self, sanitize};
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum Browser {
    /// Open a URL in a browser
    Open {
        /// URL to open
        url: String,
        /// Browser app name
        #[arg(long)]
        app: Option<String>,
    },
    /// List all open browser tabs
    Tabs {
        /// Browser app
        #[arg(long)]
        app: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get the URL of the active tab
    CurrentUrl {
        #[arg(long)]
        app: Option<String>,
    },
    /// Get the title of the active tab
    CurrentTitle {
        #[arg(long)]
        app: Option<String>,
    },
    /// Execute JavaScript in the active browser tab
    Js {
        /// JavaScript code to execute
        code: String,
        #[arg(long)]
        app: Option<String>,
    },
    /// Get the HTML source of the active tab
    PageSource {
        #[arg(long)]
        app: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct Tab {
    index: usize,
    title: String,
    url: String,
}

/// `--app` flag, then the config default, then Chrome.
fn resolve_app(app: Option<String>) -> String {
    app.or_else(|| config::get().browser.clone())
        .unwrap_or_else(|| "Google Chrome".to_string())
}

fn wrap_tell(app: &str, body: &str) -> String {
    sanitize::ScriptBuilder::new()
        .raw("tell application ")
        .literal(app)
        .raw("\n")
        .raw(body)
        .raw("\nend tell")
        .build()
}

/// Chrome and Safari spell their tab accessors differently; pick the body
/// matching the target app.
fn for_browser(app: &str, chrome_body: &str, safari_body: &str) -> String {
    if app.to_lowercase().contains("chrome") {
        wrap_tell(app, chrome_body)
    } else {
        wrap_tell(app, safari_body)
    }
}

impl Browser {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Browser::Open { url, app } => {
                let app = resolve_app(app);
                script::shell("open", &["-a", &app, &url])?;
                println!("Opened: {}", url);
                Ok(())
            }
            Browser::Tabs { app, json } => tabs(&resolve_app(app), json),
            Browser::CurrentUrl { app } => {
                let app = resolve_app(app);
                let script = for_browser(
                    &app,
                    "return URL of active tab of front window",
                    "return URL of front document",
                );
                println!("{}", script::osascript(&script)?);
                Ok(())
            }
            Browser::CurrentTitle { app } => {
                let app = resolve_app(app);
                let script = for_browser(
                    &app,
                    "return title of active tab of front window",
                    "return name of front document",
                );
                println!("{}", script::osascript(&script)?);
                Ok(())
            }
            Browser::Js { code, app } => {
                let app = resolve_app(app);
                println!("{}", script::osascript(&js_script(&app, &code))?);
                Ok(())
            }
            Browser::PageSource { app } => {
                let app = resolve_app(app);
                println!(
                    "{}",
                    script::osascript(&js_script(&app, "document.documentElement.outerHTML"))?
                );
                Ok(())
            }
        }
    }
}

fn js_script(app: &str, code: &str) -> String {
    let chrome_body = format!(
        "return execute active tab of front window javascript {}",
        sanitize::quoted(code)
    );
    let safari_body = format!(
        "return do JavaScript {} in front document",
        sanitize::quoted(code)
    );
    for_browser(app, &chrome_body, &safari_body)
}

const CHROME_TABS_BODY: &str = "set out to \"\"
repeat with w in windows
  repeat with t in tabs of w
    set out to out & (title of t) & \"|||\" & (URL of t) & linefeed
  end repeat
end repeat
return out";

const SAFARI_TABS_BODY: &str = "set out to \"\"
repeat with w in windows
  repeat with t in tabs of w
    set out to out & (name of t) & \"|||\" & (URL of t) & linefeed
  end repeat
end repeat
return out";

fn tabs(app: &str, json: bool) -> Result<()> {
    let script = for_browser(app, CHROME_TABS_BODY, SAFARI_TABS_BODY);
    let raw = script::osascript(&script)?;
    let tabs = parse_tabs(&raw);
    if tabs.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("No tabs found.");
        }
        return Ok(());
    }
    if json {
        output::json_out(&tabs);
    } else {
        for t in &tabs {
            println!("  [{}] {}\n      {}", t.index, t.title, t.url);
        }
    }
    Ok(())
}

fn parse_tabs(raw: &str) -> Vec<Tab> {
    output::records(raw)
        .enumerate()
        .map(|(index, line)| {
            let fields = output::fields(line);
            Tab {
                index,
                title: fields.first().copied().unwrap_or("").to_string(),
                url: fields.get(1).copied().unwrap_or("").to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrome_and_safari_get_their_own_tab_syntax() {
        let chrome = for_browser("Google Chrome", "chrome-body", "safari-body");
        assert!(chrome.contains("tell application \"Google Chrome\""));
        assert!(chrome.contains("chrome-body"));

        let safari = for_browser("Safari", "chrome-body", "safari-body");
        assert!(safari.contains("tell application \"Safari\""));
        assert!(safari.contains("safari-body"));
    }

    #[test]
    fn js_code_is_escaped_into_the_literal() {
        let script = js_script("Google Chrome", r#"document.title + "!""#);
        assert!(script.contains(r#"javascript "document.title + \"!\"""#));
    }

    #[test]
    fn parses_tab_records() {
        let raw = "Home|||https://example.com\nDocs|||https://docs.example.com";
        let tabs = parse_tabs(raw);
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[0].index, 0);
        assert_eq!(tabs[1].url, "https://docs.example.com");
    }

    #[test]
    fn empty_tab_output_is_an_empty_list() {
        assert!(parse_tabs("").is_empty());
    }

    #[test]
    fn app_defaults_to_chrome_without_config() {
        // The config default is exercised only when ~/.mctrl/config.json sets
        // a browser; the flag always wins.
        assert_eq!(resolve_app(Some("Safari".into())), "Safari");
    }
}
