// Entry point and main loop for the TUI application.
pub mod action;
pub mod handlers;
pub mod network;
pub mod state;
pub mod view;

use crate::client::ApiClient;
use crate::config::Config;
use crate::context::{AppContext, StandardContext};
use crate::tui::state::AppState;
use crate::tui::view::draw;

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rpassword::prompt_password;
use simplelog::WriteLogger;
use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};
use tokio::sync::mpsc;

pub async fn run() -> Result<()> {
    // Panic hook: raw mode swallows panics, keep them on disk.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        use std::io::Write;
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("examplan_panic.log")
        {
            let _ = writeln!(file, "PANIC: {:?}", info);
        }
        default_hook(info);
    }));

    let ctx: Arc<dyn AppContext> = Arc::new(StandardContext::new(None));

    if let Ok(log_path) = ctx.get_log_file_path()
        && let Ok(file) = std::fs::File::create(&log_path)
    {
        let _ = WriteLogger::init(log::LevelFilter::Info, simplelog::Config::default(), file);
    }

    // --- CONFIG & ONBOARDING ---
    let cfg = match Config::load(ctx.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            // A syntax or permission error is not a fresh install; report
            // it instead of overwriting the file.
            if !Config::is_missing_config_error(&e) {
                eprintln!("Error loading configuration:\n{}", e);
                std::process::exit(1);
            }

            println!("Welcome to Examplan (TUI). No configuration file found.");
            println!("Let's connect to your exam scheduling backend.\n");

            let mut new_config = Config::default();
            loop {
                print!("API URL (e.g. https://exams.example.edu/api): ");
                io::stdout().flush()?;
                let mut url = String::new();
                io::stdin().read_line(&mut url)?;
                new_config.api_url = url.trim().to_string();

                print!("Username: ");
                io::stdout().flush()?;
                let mut user = String::new();
                io::stdin().read_line(&mut user)?;
                new_config.username = user.trim().to_string();

                new_config.password = prompt_password("Password: ")?;

                print!("Allow insecure SSL certificates? (y/N): ");
                io::stdout().flush()?;
                let mut insecure = String::new();
                io::stdin().read_line(&mut insecure)?;
                new_config.allow_insecure_certs = insecure.trim().eq_ignore_ascii_case("y");

                println!("\nTesting connection...");
                let check = async {
                    let client =
                        ApiClient::new(&new_config.api_url, new_config.allow_insecure_certs)?;
                    let user = client
                        .login(&new_config.username, &new_config.password)
                        .await?;
                    Ok::<String, String>(user.username)
                }
                .await;

                match check {
                    Ok(username) => {
                        println!("Success! Signed in as {}.", username);
                        break;
                    }
                    Err(e) => {
                        eprintln!("Connection failed: {}", e);
                        println!("Retry configuration? [Y/n]");
                        let mut retry = String::new();
                        io::stdin().read_line(&mut retry)?;
                        if retry.trim().eq_ignore_ascii_case("n") {
                            println!("Saving provided details anyway.");
                            break;
                        }
                    }
                }
            }

            if let Err(e) = new_config.save(ctx.as_ref()) {
                eprintln!("Warning: Could not save config file: {}", e);
            } else if let Ok(path) = Config::get_path_string(ctx.as_ref()) {
                println!("Configuration saved to: {}", path);
            }

            println!("Starting TUI...");
            std::thread::sleep(Duration::from_secs(1));
            new_config
        }
    };

    let client = ApiClient::new(&cfg.api_url, cfg.allow_insecure_certs)
        .map_err(|e| anyhow::anyhow!(e))?;
    let export_dir = match &cfg.export_dir {
        Some(dir) => dir.clone(),
        None => ctx.get_export_dir()?,
    };

    // --- TERMINAL SETUP ---
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState::new_with_ctx(ctx);

    let (action_tx, action_rx) = mpsc::channel(10);
    let (event_tx, mut event_rx) = mpsc::channel(10);

    // --- NETWORK ACTOR ---
    tokio::spawn(network::run_network_actor(
        client,
        cfg.username,
        cfg.password,
        export_dir,
        action_rx,
        event_tx,
    ));

    // --- UI LOOP ---
    loop {
        terminal.draw(|f| draw(f, &mut app_state))?;

        if let Ok(app_event) = event_rx.try_recv() {
            handlers::handle_app_event(&mut app_state, app_event);
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                // Filter out KeyRelease events to prevent double input on
                // Windows.
                if key.kind == event::KeyEventKind::Release {
                    continue;
                }
                if let Some(action) = handlers::handle_key_event(key, &mut app_state) {
                    let quitting = matches!(action, action::Action::Quit);
                    let _ = action_tx.send(action).await;
                    if quitting {
                        break;
                    }
                }
            }
        }
    }

    // --- CLEANUP ---
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
