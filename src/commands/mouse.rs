//! Mouse control via Quartz CGEvents (python3 + PyObjC).

use crate::error::{MctrlError, Result};
use crate::output;
use crate::platform;
use crate::script;
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum Mouse {
    /// Print the current mouse cursor position
    Position {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move the mouse cursor to screen coordinates
    Move {
        /// X coordinate
        #[arg(long)]
        x: i64,
        /// Y coordinate
        #[arg(long)]
        y: i64,
    },
    /// Click at coordinates (current position if omitted)
    Click {
        /// X coordinate
        #[arg(long)]
        x: Option<i64>,
        /// Y coordinate
        #[arg(long)]
        y: Option<i64>,
        /// left or right
        #[arg(long, default_value = "left")]
        button: String,
        /// Number of clicks
        #[arg(long, default_value_t = 1)]
        clicks: u32,
    },
    /// Double-click at coordinates
    DoubleClick {
        #[arg(long)]
        x: Option<i64>,
        #[arg(long)]
        y: Option<i64>,
    },
    /// Triple-click at coordinates
    TripleClick {
        #[arg(long)]
        x: Option<i64>,
        #[arg(long)]
        y: Option<i64>,
    },
    /// Right-click (context menu) at coordinates
    RightClick {
        #[arg(long)]
        x: Option<i64>,
        #[arg(long)]
        y: Option<i64>,
    },
    /// Scroll the mouse wheel. Positive = up, negative = down
    Scroll {
        /// Scroll amount
        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },
    /// Press the mouse button down (for drag operations)
    Down {
        /// left or right
        #[arg(long, default_value = "left")]
        button: String,
    },
    /// Release the mouse button
    Up {
        /// left or right
        #[arg(long, default_value = "left")]
        button: String,
    },
    /// Drag from one point to another
    Drag {
        #[arg(long)]
        from_x: i64,
        #[arg(long)]
        from_y: i64,
        #[arg(long)]
        to_x: i64,
        #[arg(long)]
        to_y: i64,
        /// Drag duration in milliseconds
        #[arg(long, default_value_t = 500)]
        duration: u64,
    },
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Point {
    x: i64,
    y: i64,
}

impl Mouse {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Mouse::Position { json } => {
                let pos = cursor_pos()?;
                if json {
                    output::json_out(&pos);
                } else {
                    println!("{},{}", pos.x, pos.y);
                }
                Ok(())
            }
            Mouse::Move { x, y } => move_to(x, y),
            Mouse::Click {
                x,
                y,
                button,
                clicks,
            } => click_at(x, y, &button, clicks),
            Mouse::DoubleClick { x, y } => click_at(x, y, "left", 2),
            Mouse::TripleClick { x, y } => click_at(x, y, "left", 3),
            Mouse::RightClick { x, y } => click_at(x, y, "right", 1),
            Mouse::Scroll { amount } => {
                script::python(&format!(
                    "import Quartz; evt = Quartz.CGEventCreateScrollWheelEvent(None, Quartz.kCGScrollEventUnitLine, 1, {}); Quartz.CGEventPost(Quartz.kCGHIDEventTap, evt)",
                    amount
                ))?;
                Ok(())
            }
            Mouse::Down { button } => button_event(&button, Direction::Down),
            Mouse::Up { button } => button_event(&button, Direction::Up),
            Mouse::Drag {
                from_x,
                from_y,
                to_x,
                to_y,
                duration,
            } => drag(from_x, from_y, to_x, to_y, duration),
        }
    }
}

enum Direction {
    Down,
    Up,
}

/// Quartz event/button constant pair for a button name.
fn button_constants(button: &str, direction: &Direction) -> Result<(&'static str, &'static str)> {
    match (button, direction) {
        ("left", Direction::Down) => Ok(("Quartz.kCGEventLeftMouseDown", "Quartz.kCGMouseButtonLeft")),
        ("left", Direction::Up) => Ok(("Quartz.kCGEventLeftMouseUp", "Quartz.kCGMouseButtonLeft")),
        ("right", Direction::Down) => Ok(("Quartz.kCGEventRightMouseDown", "Quartz.kCGMouseButtonRight")),
        ("right", Direction::Up) => Ok(("Quartz.kCGEventRightMouseUp", "Quartz.kCGMouseButtonRight")),
        (other, _) => Err(MctrlError::InvalidArgument(format!(
            "Unknown button: {}",
            other
        ))),
    }
}

fn cursor_pos() -> Result<Point> {
    let out = script::python(
        "import Quartz; loc = Quartz.NSEvent.mouseLocation(); h = Quartz.CGDisplayPixelsHigh(Quartz.CGMainDisplayID()); print(f'{int(loc.x)},{int(h - loc.y)}')",
    )?;
    parse_point(&out)
}

fn parse_point(raw: &str) -> Result<Point> {
    let mut parts = raw.trim().split(',');
    let (Some(x), Some(y)) = (parts.next(), parts.next()) else {
        return Err(MctrlError::Failed(format!(
            "unexpected cursor position output: {}",
            raw
        )));
    };
    let x = x.trim().parse().map_err(|_| {
        MctrlError::Failed(format!("unexpected cursor position output: {}", raw))
    })?;
    let y = y.trim().parse().map_err(|_| {
        MctrlError::Failed(format!("unexpected cursor position output: {}", raw))
    })?;
    Ok(Point { x, y })
}

fn move_to(x: i64, y: i64) -> Result<()> {
    script::python(&format!(
        "import Quartz; Quartz.CGWarpMouseCursorPosition(({}, {}))",
        x, y
    ))?;
    Ok(())
}

fn click_at(x: Option<i64>, y: Option<i64>, button: &str, clicks: u32) -> Result<()> {
    let pos = match (x, y) {
        (Some(x), Some(y)) => Point { x, y },
        _ => cursor_pos()?,
    };
    let (down_evt, btn) = button_constants(button, &Direction::Down)?;
    let (up_evt, _) = button_constants(button, &Direction::Up)?;
    script::python(&format!(
        "import Quartz, time
pt = ({x}, {y})
for i in range({clicks}):
    down = Quartz.CGEventCreateMouseEvent(None, {down_evt}, pt, {btn})
    Quartz.CGEventSetIntegerValueField(down, Quartz.kCGMouseEventClickState, i + 1)
    Quartz.CGEventPost(Quartz.kCGHIDEventTap, down)
    time.sleep(0.02)
    up = Quartz.CGEventCreateMouseEvent(None, {up_evt}, pt, {btn})
    Quartz.CGEventSetIntegerValueField(up, Quartz.kCGMouseEventClickState, i + 1)
    Quartz.CGEventPost(Quartz.kCGHIDEventTap, up)
    time.sleep(0.05)",
        x = pos.x,
        y = pos.y,
        clicks = clicks,
        down_evt = down_evt,
        up_evt = up_evt,
        btn = btn,
    ))?;
    Ok(())
}

fn button_event(button: &str, direction: Direction) -> Result<()> {
    let pos = cursor_pos()?;
    let (evt, btn) = button_constants(button, &direction)?;
    script::python(&format!(
        "import Quartz; e = Quartz.CGEventCreateMouseEvent(None, {}, ({}, {}), {}); Quartz.CGEventPost(Quartz.kCGHIDEventTap, e)",
        evt, pos.x, pos.y, btn
    ))?;
    Ok(())
}

fn drag(from_x: i64, from_y: i64, to_x: i64, to_y: i64, duration_ms: u64) -> Result<()> {
    let steps = std::cmp::max(10, duration_ms / 16);
    script::python(&format!(
        "import Quartz, time
sx, sy, ex, ey, n = {from_x}, {from_y}, {to_x}, {to_y}, {steps}
Quartz.CGWarpMouseCursorPosition((sx, sy))
time.sleep(0.05)
d = Quartz.CGEventCreateMouseEvent(None, Quartz.kCGEventLeftMouseDown, (sx, sy), Quartz.kCGMouseButtonLeft)
Quartz.CGEventPost(Quartz.kCGHIDEventTap, d)
for i in range(1, n + 1):
    t = i / n
    x = sx + (ex - sx) * t
    y = sy + (ey - sy) * t
    m = Quartz.CGEventCreateMouseEvent(None, Quartz.kCGEventLeftMouseDragged, (x, y), Quartz.kCGMouseButtonLeft)
    Quartz.CGEventPost(Quartz.kCGHIDEventTap, m)
    time.sleep({secs} / n)
u = Quartz.CGEventCreateMouseEvent(None, Quartz.kCGEventLeftMouseUp, (ex, ey), Quartz.kCGMouseButtonLeft)
Quartz.CGEventPost(Quartz.kCGHIDEventTap, u)",
        from_x = from_x,
        from_y = from_y,
        to_x = to_x,
        to_y = to_y,
        steps = steps,
        secs = duration_ms as f64 / 1000.0,
    ))?;
    Ok(())
}
