//! Message helpers for consistent command output.

use arbiter_types::CheckResponse;

use super::colors::SemanticStyle;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".allow(), msg);
}

pub fn print_warn(msg: &str) {
    println!("{} {}", "⚠".warning(), msg);
}

pub fn print_hint(msg: &str) {
    println!("{} {}", "→".muted(), msg.muted());
}

/// Prints an allow/deny verdict followed by its reason.
pub fn print_verdict(response: &CheckResponse) {
    if response.allowed {
        println!("{} {}", "✓".allow(), "ALLOWED".allow());
    } else {
        println!("{} {}", "✗".deny(), "DENIED".deny());
    }
    if let Some(reason) = &response.reason {
        println!("  {}: {}", "reason".muted(), reason);
    }
}
