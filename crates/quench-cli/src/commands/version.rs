//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - spectral functions from real-time evolution",
        style("quench").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  quench-sim            Operators, evolution loop, correlation functions");
    println!("  quench-adapter-dense  Exact state-vector backend");
    println!("  quench-cli            Command-line interface");
    println!();
    println!("Backends:");
    println!("  dense   models TFIChain, XXZChain, FermionChain; engine TrotterEngine");
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
