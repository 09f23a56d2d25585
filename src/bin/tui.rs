use anyhow::Result;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h" || args[1] == "help") {
        print_help();
        return Ok(());
    }

    examplan::tui::run().await
}

fn print_help() {
    println!(
        "Examplan v{} - Interactive exam calendar planner (TUI)",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    examplan            Start interactive TUI");
    println!("    examplan --help     Show this help message");
    println!();
    println!("KEYBINDINGS:");
    println!("    Press '?' inside the app for interactive help");
    println!();
    println!("    Tab                 Cycle focus (subjects, grid, rules, versions)");
    println!("    Enter / Space       Open calendar, pick up a subject, place it");
    println!("    m                   Move an existing exam to another day");
    println!("    x                   Remove an exam from the calendar");
    println!("    B                   Toggle a blocked (holiday) day");
    println!("    a / d               Add / delete in the focused pane");
    println!("    H                   Toggle a subject's heavy flag");
    println!("    /                   Filter the unassigned subject list");
    println!("    v                   Save the current layout as a version");
    println!("    e / E               Export as PDF / Excel");
    println!("    r                   Refresh from the server");
    println!("    q                   Quit");
    println!();
    println!("CONFIGURATION:");
    println!("    A config.toml with the backend URL and credentials is created");
    println!("    on first start; run the binary once to go through setup.");
}
