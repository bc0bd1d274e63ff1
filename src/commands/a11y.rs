//! Accessibility tree inspection via Swift AX snippets and System Events.

use crate::error::Result;
use crate::output;
use crate::platform;
use crate::script::{self, sanitize};
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum A11y {
    /// Print the accessibility element tree of an application
    Tree {
        /// Max depth to traverse
        #[arg(long, default_value_t = 3)]
        depth: u32,
        /// Target app (default: frontmost)
        #[arg(long)]
        app: Option<String>,
    },
    /// Get the currently focused UI element
    Focused {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List top-level UI elements of the frontmost window
    Children {
        /// Filter by AX role (e.g. AXButton, AXTextField)
        #[arg(long)]
        role: Option<String>,
        /// Target app (default: frontmost)
        #[arg(long)]
        app: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct FocusedElement {
    role: String,
    title: String,
    value: String,
    description: String,
    #[serde(rename = "roleDescription")]
    role_description: String,
}

#[derive(Debug, Serialize)]
struct ChildElement {
    role: String,
    title: String,
    description: String,
}

/// AX helpers shared by the tree snippet; target/depth get bound after.
const AX_TREE_HELPERS: &str = r##"
import Cocoa
import ApplicationServices

func attr(_ e: AXUIElement, _ a: String) -> String? {
    var v: AnyObject?
    guard AXUIElementCopyAttributeValue(e, a as CFString, &v) == .success else { return nil }
    if let s = v as? String { return s }
    if let n = v as? NSNumber { return n.stringValue }
    return nil
}

func kids(_ e: AXUIElement) -> [AXUIElement] {
    var v: AnyObject?
    guard AXUIElementCopyAttributeValue(e, kAXChildrenAttribute as String as CFString, &v) == .success,
          let a = v as? [AXUIElement] else { return [] }
    return a
}

func dump(_ e: AXUIElement, _ pre: String, _ max: Int) {
    guard max > 0 else { return }
    let r = attr(e, kAXRoleAttribute as String) ?? "?"
    let t = attr(e, kAXTitleAttribute as String)
    let v = attr(e, kAXValueAttribute as String)
    let rd = attr(e, kAXRoleDescriptionAttribute as String)
    let d = attr(e, kAXDescriptionAttribute as String)
    var ln = pre + r
    if let t = t, !t.isEmpty { ln += " \"\(t)\"" }
    if let rd = rd, !rd.isEmpty { ln += " [\(rd)]" }
    if let v = v, !v.isEmpty, v.count < 80 { ln += " = \(v)" }
    if let d = d, !d.isEmpty { ln += " (\(d))" }
    print(ln)
    for c in kids(e) { dump(c, pre + "  ", max - 1) }
}
"##;

const AX_TREE_MAIN: &str = r##"
let app: NSRunningApplication? = target != nil
    ? NSWorkspace.shared.runningApplications.first { $0.localizedName == target }
    : NSWorkspace.shared.frontmostApplication
guard let a = app else { fputs("App not found\n", stderr); exit(1) }
let ax = AXUIElementCreateApplication(a.processIdentifier)
var ws: AnyObject?
AXUIElementCopyAttributeValue(ax, kAXWindowsAttribute as String as CFString, &ws)
if let wins = ws as? [AXUIElement] { for w in wins { dump(w, "", maxDepth) } }
else { dump(ax, "", maxDepth) }
"##;

const AX_FOCUSED_SRC: &str = r##"
import Cocoa
import ApplicationServices

func attr(_ e: AXUIElement, _ a: String) -> String? {
    var v: AnyObject?
    guard AXUIElementCopyAttributeValue(e, a as CFString, &v) == .success else { return nil }
    if let s = v as? String { return s }
    if let n = v as? NSNumber { return n.stringValue }
    return nil
}

guard let app = NSWorkspace.shared.frontmostApplication else { exit(1) }
let ax = AXUIElementCreateApplication(app.processIdentifier)
var focusedValue: AnyObject?
let err = AXUIElementCopyAttributeValue(ax, kAXFocusedUIElementAttribute as String as CFString, &focusedValue)
guard err == .success, let focused = focusedValue else {
    print("No focused element found.")
    exit(0)
}
let fe = focused as! AXUIElement
let role = attr(fe, kAXRoleAttribute as String) ?? ""
let title = attr(fe, kAXTitleAttribute as String) ?? ""
let value = attr(fe, kAXValueAttribute as String) ?? ""
let desc = attr(fe, kAXDescriptionAttribute as String) ?? ""
let rd = attr(fe, kAXRoleDescriptionAttribute as String) ?? ""
print("\(role)|||\(title)|||\(value)|||\(desc)|||\(rd)")
"##;

impl A11y {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        platform::ensure_accessibility()?;
        match self {
            A11y::Tree { depth, app } => tree(depth, app.as_deref()),
            A11y::Focused { json } => focused(json),
            A11y::Children { role, app, json } => children(role.as_deref(), app.as_deref(), json),
        }
    }
}

fn tree_source(depth: u32, app: Option<&str>) -> String {
    let target_expr = match app {
        Some(app) => sanitize::quoted(app),
        None => "nil".to_string(),
    };
    format!(
        "{}\nlet target: String? = {}\nlet maxDepth = {}\n{}",
        AX_TREE_HELPERS, target_expr, depth, AX_TREE_MAIN
    )
}

fn tree(depth: u32, app: Option<&str>) -> Result<()> {
    let out = script::swift(&tree_source(depth, app))?;
    if out.is_empty() {
        println!("No accessibility elements found.");
    } else {
        println!("{}", out);
    }
    Ok(())
}

fn focused(json: bool) -> Result<()> {
    let raw = match script::swift(AX_FOCUSED_SRC) {
        Ok(raw) => raw,
        Err(_) => {
            println!("No focused element found.");
            return Ok(());
        }
    };
    if raw.starts_with("No focused") {
        println!("{}", raw);
        return Ok(());
    }
    let element = parse_focused(&raw);
    if json {
        output::json_out(&element);
    } else {
        for (key, value) in [
            ("role", &element.role),
            ("title", &element.title),
            ("value", &element.value),
            ("description", &element.description),
            ("roleDescription", &element.role_description),
        ] {
            if !value.is_empty() {
                println!("{}: {}", key, value);
            }
        }
    }
    Ok(())
}

fn parse_focused(raw: &str) -> FocusedElement {
    let fields = output::fields(raw);
    let get = |i: usize| fields.get(i).copied().unwrap_or("").to_string();
    FocusedElement {
        role: get(0),
        title: get(1),
        value: get(2),
        description: get(3),
        role_description: get(4),
    }
}

fn children_source(role: Option<&str>, app: Option<&str>) -> String {
    let filter = match role {
        Some(role) => format!(" whose role is {}", sanitize::quoted(role)),
        None => String::new(),
    };
    sanitize::ScriptBuilder::new()
        .raw("set out to \"\"\ntell application \"System Events\"\n  set w to front window of ")
        .raw(&super::window::target_fragment(app))
        .raw("\n  repeat with e in (UI elements of w")
        .raw(&filter)
        .raw(")\n    set r to role of e\n    set t to \"\"\n    try\n      set t to title of e\n    end try\n    set d to \"\"\n    try\n      set d to description of e\n    end try\n    set out to out & r & \"|||\" & t & \"|||\" & d & linefeed\n  end repeat\nend tell\nreturn out")
        .build()
}

fn children(role: Option<&str>, app: Option<&str>, json: bool) -> Result<()> {
    let raw = script::osascript(&children_source(role, app))?;
    let elems: Vec<ChildElement> = output::records(&raw)
        .map(|line| {
            let fields = output::fields(line);
            let get = |i: usize| fields.get(i).copied().unwrap_or("").to_string();
            ChildElement {
                role: get(0),
                title: get(1),
                description: get(2),
            }
        })
        .collect();
    if elems.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("No elements found.");
        }
        return Ok(());
    }
    if json {
        output::json_out(&elems);
    } else {
        for e in &elems {
            let mut line = format!("  {}", e.role);
            if !e.title.is_empty() {
                line.push_str(&format!(" \"{}\"", e.title));
            }
            if !e.description.is_empty() {
                line.push_str(&format!(" ({})", e.description));
            }
            println!("{}", line);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_source_defaults_to_the_frontmost_app() {
        let src = tree_source(3, None);
        assert!(src.contains("let target: String? = nil\nlet maxDepth = 3\n"));
        assert!(src.contains("AXUIElementCreateApplication"));
        // Imports precede the injected bindings.
        assert!(src.find("import Cocoa").unwrap() < src.find("let target").unwrap());
    }

    #[test]
    fn tree_source_escapes_the_app_name() {
        let src = tree_source(4, Some("My \"App\""));
        assert!(src.contains("let target: String? = \"My \\\"App\\\"\"\nlet maxDepth = 4"));
    }

    #[test]
    fn children_source_filters_by_role() {
        let src = children_source(Some("AXButton"), None);
        assert!(src.contains("UI elements of w whose role is \"AXButton\""));
        assert!(src.contains("first application process whose frontmost is true"));
    }

    #[test]
    fn children_source_without_filter_lists_everything() {
        let src = children_source(None, Some("Finder"));
        assert!(src.contains("UI elements of w)"));
        assert!(src.contains("application process \"Finder\""));
    }

    #[test]
    fn parses_focused_element_record() {
        let el = parse_focused("AXTextField|||Search|||hello|||the search box|||text field");
        assert_eq!(el.role, "AXTextField");
        assert_eq!(el.value, "hello");
        assert_eq!(el.role_description, "text field");
    }

    #[test]
    fn short_focused_record_fills_empty_fields() {
        let el = parse_focused("AXButton|||OK");
        assert_eq!(el.role, "AXButton");
        assert_eq!(el.title, "OK");
        assert_eq!(el.description, "");
    }
}
