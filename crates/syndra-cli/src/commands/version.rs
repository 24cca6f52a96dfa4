//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - stabilizer circuit generation and noise injection",
        style("Syndra").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  syndra-ir       Circuit trace, measurement tracking, builder");
    println!("  syndra-compile  Noise injection, layer IR, passes, memory experiments");
    println!("  syndra-cli      Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style(env!("CARGO_PKG_REPOSITORY")).underlined()
    );
    println!("License:    {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
