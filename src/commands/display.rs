//! Screenshots, screen dimensions, and monitor info.

use crate::error::{MctrlError, Result};
use crate::output;
use crate::platform;
use crate::script;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Subcommand, Debug)]
pub enum Display {
    /// Print screen dimensions (width x height)
    Size {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print center coordinates of the screen
    Center {
        #[arg(long)]
        json: bool,
    },
    /// Capture the screen or a region to a PNG file
    Screenshot {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Capture a specific region (x,y,width,height)
        #[arg(long)]
        region: Option<String>,
    },
    /// List connected displays with resolution and position
    Info {
        #[arg(long)]
        json: bool,
    },
    /// Get the frontmost application name and window title
    ActiveWindow {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct ScreenSize {
    width: i64,
    height: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct DisplayInfo {
    id: u64,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    main: bool,
}

#[derive(Debug, Serialize)]
struct ActiveWindow {
    app: String,
    title: String,
}

impl Display {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Display::Size { json } => {
                let raw = script::python(
                    "import Quartz; d = Quartz.CGDisplayBounds(Quartz.CGMainDisplayID()); print(f'{int(d.size.width)}x{int(d.size.height)}')",
                )?;
                if json {
                    let (width, height) = parse_size(&raw)?;
                    output::json_out(&ScreenSize { width, height });
                } else {
                    println!("{}", raw);
                }
                Ok(())
            }
            Display::Center { json } => {
                let raw = script::python(
                    "import Quartz; d = Quartz.CGDisplayBounds(Quartz.CGMainDisplayID()); print(f'{int(d.size.width // 2)},{int(d.size.height // 2)}')",
                )?;
                if json {
                    let (x, y) = parse_center(&raw)?;
                    output::json_out(&serde_json::json!({ "x": x, "y": y }));
                } else {
                    println!("{}", raw);
                }
                Ok(())
            }
            Display::Screenshot { output, region } => screenshot(output, region.as_deref()),
            Display::Info { json } => info(json),
            Display::ActiveWindow { json } => active_window(json),
        }
    }
}

fn parse_size(raw: &str) -> Result<(i64, i64)> {
    let mut parts = raw.trim().splitn(2, 'x');
    let parse = |s: Option<&str>| {
        s.and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| MctrlError::Failed(format!("unexpected display size output: {}", raw)))
    };
    Ok((parse(parts.next())?, parse(parts.next())?))
}

fn parse_center(raw: &str) -> Result<(i64, i64)> {
    let mut parts = raw.trim().splitn(2, ',');
    let parse = |s: Option<&str>| {
        s.and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| MctrlError::Failed(format!("unexpected display center output: {}", raw)))
    };
    Ok((parse(parts.next())?, parse(parts.next())?))
}

fn screenshot(output: Option<PathBuf>, region: Option<&str>) -> Result<()> {
    let out = output.unwrap_or_else(default_screenshot_path);
    let out_str = out.to_string_lossy().into_owned();
    let mut args: Vec<&str> = vec!["-x"];
    if let Some(region) = region {
        args.push("-R");
        args.push(region);
    }
    args.push(&out_str);
    script::shell("screencapture", &args)?;
    println!("{}", out_str);
    Ok(())
}

fn default_screenshot_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("mctrl_{}.png", nanos))
}

fn info(json: bool) -> Result<()> {
    let raw = script::python(
        "import Quartz, json
(err, ids, cnt) = Quartz.CGGetActiveDisplayList(16, None, None)
result = []
for d in ids:
    b = Quartz.CGDisplayBounds(d)
    result.append({'id': d, 'x': int(b.origin.x), 'y': int(b.origin.y), 'width': int(b.size.width), 'height': int(b.size.height), 'main': bool(Quartz.CGDisplayIsMain(d))})
print(json.dumps(result))",
    )?;
    let displays: Vec<DisplayInfo> = serde_json::from_str(&raw)
        .map_err(|e| MctrlError::Failed(format!("unexpected display list output: {}", e)))?;
    if json {
        output::json_out(&displays);
    } else {
        for d in &displays {
            let tag = if d.main { " (main)" } else { "" };
            println!(
                "Display {}: {}x{} at ({},{}){}",
                d.id, d.width, d.height, d.x, d.y, tag
            );
        }
    }
    Ok(())
}

fn active_window(json: bool) -> Result<()> {
    let app = script::osascript(
        "tell application \"System Events\" to get name of first application process whose frontmost is true",
    )?;
    // A frontmost process without windows is normal; fall back to "".
    let title = script::osascript(
        "tell application \"System Events\"\ntry\nreturn name of front window of first application process whose frontmost is true\non error\nreturn \"\"\nend try\nend tell",
    )
    .unwrap_or_default();
    if json {
        output::json_out(&ActiveWindow {
            app: app.clone(),
            title,
        });
    } else {
        println!("app: {}", app);
        if !title.is_empty() {
            println!("title: {}", title);
        }
    }
    Ok(())
}
