//! User-facing console lines. Colored prefixes only when stdout is a TTY.

use owo_colors::OwoColorize;

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

enum Tag {
    Info,
    Warn,
    Error,
    Ok,
}

fn line(tag: Tag, msg: &str) -> String {
    let tty = is_tty();
    let prefix = match (tag, tty) {
        (Tag::Info, true) => "info:".cyan().bold().to_string(),
        (Tag::Warn, true) => "warn:".yellow().bold().to_string(),
        (Tag::Error, true) => "error:".red().bold().to_string(),
        (Tag::Ok, true) => "ok:".green().bold().to_string(),
        (Tag::Info, false) => "info:".to_string(),
        (Tag::Warn, false) => "warn:".to_string(),
        (Tag::Error, false) => "error:".to_string(),
        (Tag::Ok, false) => "ok:".to_string(),
    };
    format!("{prefix} {msg}")
}

pub fn print_info(msg: &str) {
    println!("{}", line(Tag::Info, msg));
}

pub fn print_warn(msg: &str) {
    eprintln!("{}", line(Tag::Warn, msg));
}

pub fn print_error(msg: &str) {
    eprintln!("{}", line(Tag::Error, msg));
}

pub fn print_success(msg: &str) {
    println!("{}", line(Tag::Ok, msg));
}

/// Plain line with no prefix, for output users may script against.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}
