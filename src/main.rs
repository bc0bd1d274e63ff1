use clap::{Parser, Subcommand};
use mctrl::commands::{
    a11y, browser, calendar, clipboard, contacts, display, files, keyboard, mail, mouse, os,
    screen, sms, window,
};
use mctrl::logging;

#[derive(Parser)]
#[command(
    name = "mctrl",
    version,
    about = "mctrl — fine-grained macOS control from the command line.",
    long_about = "mctrl — fine-grained macOS control from the command line.\n\n\
Built for AI agents and automation. Every subcommand has its own --help.\n\n\
PRIMITIVES:\n\
  keyboard    Type text, press keys, trigger hotkeys (Cmd+C, etc.)\n\
  mouse       Move, click, scroll, drag the mouse cursor\n\
  display     Screenshots, screen dimensions, monitor info\n\
  clipboard   Copy/paste text, read clipboard contents\n\
  screen      OCR (read text from screen), screen recording\n\
  window      List/focus/resize/move/minimize application windows\n\
  a11y        Read the accessibility tree, inspect UI elements\n\
  browser     Open URLs, list tabs, execute JS, get page source\n\
  files       Search, read, write, edit files on disk\n\
  os          Notifications, app launch/quit, frontmost app\n\
  calendar    List/create/delete calendar events (Calendar.app)\n\
  contacts    Look up phone numbers and emails (Contacts.app)\n\
  mail        Read inbox, send email, check unread (Mail.app)\n\
  sms         Send/read iMessages (Messages.app)\n\n\
USAGE:\n\
  mctrl <command> --help           detailed usage for a primitive\n\
  mctrl <command> <sub> --help     options and examples for an action\n\
  Most commands support --json for structured output."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type text, press keys, and trigger hotkeys
    #[command(subcommand)]
    Keyboard(keyboard::Keyboard),
    /// Move, click, scroll, and drag the mouse cursor
    #[command(subcommand)]
    Mouse(mouse::Mouse),
    /// Screenshots, screen dimensions, and monitor info
    #[command(subcommand)]
    Display(display::Display),
    /// Copy, paste, and view clipboard contents
    #[command(subcommand)]
    Clipboard(clipboard::Clipboard),
    /// OCR (read text from screen) and screen recording
    #[command(subcommand)]
    Screen(screen::Screen),
    /// Window management: list, focus, resize, move, minimize, fullscreen
    #[command(subcommand)]
    Window(window::Window),
    /// Accessibility: inspect UI elements, read the AX tree
    #[command(name = "a11y", subcommand)]
    A11y(a11y::A11y),
    /// Control web browsers: open URLs, list tabs, execute JS
    #[command(subcommand)]
    Browser(browser::Browser),
    /// File system operations: search, read, write, edit, list
    #[command(subcommand)]
    Files(files::Files),
    /// OS-level actions: launch/quit apps, notifications, frontmost app
    #[command(subcommand)]
    Os(os::Os),
    /// Read and create calendar events (macOS Calendar.app)
    #[command(subcommand)]
    Calendar(calendar::Calendar),
    /// Look up contacts from macOS Contacts.app
    #[command(subcommand)]
    Contacts(contacts::Contacts),
    /// Read and send email via macOS Mail.app
    #[command(subcommand)]
    Mail(mail::Mail),
    /// Send and read iMessages (macOS Messages.app)
    #[command(subcommand)]
    Sms(sms::Sms),
}

fn main() {
    let _guard = logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Keyboard(cmd) => cmd.run(),
        Commands::Mouse(cmd) => cmd.run(),
        Commands::Display(cmd) => cmd.run(),
        Commands::Clipboard(cmd) => cmd.run(),
        Commands::Screen(cmd) => cmd.run(),
        Commands::Window(cmd) => cmd.run(),
        Commands::A11y(cmd) => cmd.run(),
        Commands::Browser(cmd) => cmd.run(),
        Commands::Files(cmd) => cmd.run(),
        Commands::Os(cmd) => cmd.run(),
        Commands::Calendar(cmd) => cmd.run(),
        Commands::Contacts(cmd) => cmd.run(),
        Commands::Mail(cmd) => cmd.run(),
        Commands::Sms(cmd) => cmd.run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
