use crate::ui::theme::{paint, Role};
use crate::ui::Icons;

pub fn header(icon: &str, text: &str) {
    println!("{} {}", icon, paint(Role::Header, text));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, paint(Role::Error, label));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        paint(Role::Info, Icons::INFO),
        paint(Role::Label, label),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", paint(Role::Header, title));
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", paint(Role::Label, label), value);
}

/// Print a rendered table, or a muted placeholder when there is nothing to show
pub fn table_or_empty(table: &str, empty_label: &str) {
    if table.is_empty() {
        println!("{} {}", Icons::EMPTY, paint(Role::Muted, empty_label));
    } else {
        println!("{}", table);
    }
}
