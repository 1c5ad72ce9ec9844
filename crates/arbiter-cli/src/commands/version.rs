//! Version command implementation.

use arbiter::OPERATOR_SET_VERSION;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() {
    println!("arbiter {VERSION}");
    println!();
    println!("Attribute-based access decisions for principals and resources.");
    println!();
    println!("Build info:");
    println!("  Operator set: v{OPERATOR_SET_VERSION}");
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
}
