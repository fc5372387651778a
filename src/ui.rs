use colored::Colorize;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair with the key padded to `width`
pub fn kv(key: &str, value: &str, width: usize) {
    println!("  {} {}", format!("{key:width$}").dimmed(), value);
}

/// Value or a dimmed placeholder when empty
pub fn or_none(value: &str) -> String {
    if value.is_empty() {
        "(none)".dimmed().to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_none() {
        colored::control::set_override(false);
        assert_eq!(or_none(""), "(none)");
        assert_eq!(or_none("LXQt"), "LXQt");
    }
}
