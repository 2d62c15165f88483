//! Status lines printed to stderr while long operations run.

use std::io::Write;

use console::Style;

fn write_status(style: &Style, label: &str, message: &str) {
    let _ = writeln!(
        std::io::stderr(),
        "{:>12} {message}",
        style.apply_to(label)
    );
}

/// `   Resolving app:app@1.0`, with the label in bold green.
pub fn status(label: &str, message: &str) {
    write_status(&Style::new().green().bold(), label, message);
}

/// Same layout as [`status`], bold yellow label.
pub fn status_warn(label: &str, message: &str) {
    write_status(&Style::new().yellow().bold(), label, message);
}
