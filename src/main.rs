use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use reportctl::console::Console;
use reportctl::gate::GateState;
use reportctl::model::Session;
use reportctl::session::SessionStore;

#[derive(Parser)]
#[command(name = "reportctl")]
#[command(about = "Admin console for the scheduled reporting job", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store connection parameters and connect to the settings store
    Login {
        #[arg(long)]
        url: String,
        #[arg(long)]
        repo: String,
        #[arg(long)]
        token: String,
    },

    /// Forget the stored connection parameters
    Logout,

    /// Show gate state and the latest run of the reporting job
    Status {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the settings document and the next scheduled run
    Show {
        #[arg(long)]
        password: String,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the admin password (first run), or change it
    SetPassword {
        #[arg(long)]
        new: String,
        /// Current password (required once a password is set)
        #[arg(long)]
        current: Option<String>,
    },

    /// Manage report recipients
    Recipients {
        #[command(subcommand)]
        command: RecipientCommands,
    },

    /// Manage the report schedule
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },

    /// Trigger the reporting job now
    Trigger {
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum RecipientCommands {
    /// List recipients in order
    List {
        #[arg(long)]
        password: String,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a recipient address
    Add {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Remove a recipient by position (as shown by `recipients list`)
    Remove {
        index: usize,
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum ScheduleCommands {
    /// Set the weekly schedule (day name + hour 0-23, UTC)
    Set {
        #[arg(long)]
        day: String,
        #[arg(long)]
        hour: i32,
        #[arg(long)]
        password: String,
    },
    /// Show the next scheduled occurrence
    Next {
        #[arg(long)]
        password: String,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let store = SessionStore::open(SessionStore::default_root()?);

    match cli.command {
        Commands::Login { url, repo, token } => {
            let mut console = Console::new(store);
            let state = console.connect(Session {
                base_url: url,
                repo,
                token,
            })?;
            match state {
                GateState::NeedsPasswordSetup => {
                    println!("Connected. No admin password set yet;");
                    println!("choose one with `reportctl set-password --new ...`");
                }
                _ => println!("Connected. Settings are locked; commands take --password"),
            }
        }

        Commands::Logout => {
            let mut console = Console::new(store);
            console.logout()?;
            println!("Logged out");
        }

        Commands::Status { json } => {
            let console = Console::start(store)?;
            let run = console.run_status();
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "gate": state_label(console.state()),
                        "latest_run": run,
                    }))
                    .context("serialize status json")?
                );
            } else {
                println!("gate: {}", state_label(console.state()));
                match run {
                    Some(run) => {
                        println!("latest run: {} at {}", run.outcome.as_str(), run.created_at);
                        println!("           {}", run.url);
                    }
                    None => println!("latest run: unknown"),
                }
            }
        }

        Commands::Show { password, json } => {
            let console = unlocked(store, &password)?;
            let doc = console.document()?;
            let next = console.next_run(OffsetDateTime::now_utc())?;
            let next = next.format(&Rfc3339).context("format next run")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "settings": doc,
                        "next_run": next,
                    }))
                    .context("serialize settings json")?
                );
            } else {
                println!("recipients:");
                for (i, r) in doc.recipients.iter().enumerate() {
                    println!("  [{}] {}", i, r);
                }
                println!(
                    "schedule: every {} at {:02}:00 UTC",
                    doc.schedule_day, doc.schedule_hour
                );
                println!("next run: {}", next);
            }
        }

        Commands::SetPassword { new, current } => {
            let mut console = Console::start(store)?;
            match console.state() {
                GateState::NoSession => {
                    anyhow::bail!("no session configured (run `reportctl login`)")
                }
                GateState::NeedsPasswordSetup => {}
                GateState::Locked | GateState::Unlocked => {
                    let current = current
                        .context("a password is already set; pass --current to change it")?;
                    if !console.unlock(&current)? {
                        anyhow::bail!("wrong password");
                    }
                }
            }
            console.set_password(&new)?;
            println!("Password updated");
        }

        Commands::Recipients { command } => match command {
            RecipientCommands::List { password, json } => {
                let console = unlocked(store, &password)?;
                let doc = console.document()?;
                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&doc.recipients)
                            .context("serialize recipients json")?
                    );
                } else {
                    for (i, r) in doc.recipients.iter().enumerate() {
                        println!("[{}] {}", i, r);
                    }
                }
            }
            RecipientCommands::Add { email, password } => {
                let mut console = unlocked(store, &password)?;
                console.add_recipient(&email)?;
                console.save()?;
                println!("Added {}", email);
            }
            RecipientCommands::Remove { index, password } => {
                let mut console = unlocked(store, &password)?;
                let removed = console.remove_recipient(index)?;
                console.save()?;
                println!("Removed {}", removed);
            }
        },

        Commands::Schedule { command } => match command {
            ScheduleCommands::Set {
                day,
                hour,
                password,
            } => {
                let mut console = unlocked(store, &password)?;
                console.set_schedule(&day, hour)?;
                console.save()?;
                println!("Schedule updated: every {} at {:02}:00 UTC", day, hour);
            }
            ScheduleCommands::Next { password } => {
                let console = unlocked(store, &password)?;
                let next = console.next_run(OffsetDateTime::now_utc())?;
                println!("{}", next.format(&Rfc3339).context("format next run")?);
            }
        },

        Commands::Trigger { password } => {
            let console = unlocked(store, &password)?;
            console.trigger_report()?;
            println!("Report dispatched");
        }
    }

    Ok(())
}

fn unlocked(store: SessionStore, password: &str) -> Result<Console> {
    let mut console = Console::start(store)?;
    match console.state() {
        GateState::NoSession => anyhow::bail!("no session configured (run `reportctl login`)"),
        GateState::NeedsPasswordSetup => {
            anyhow::bail!("no admin password set (run `reportctl set-password --new ...`)")
        }
        _ => {}
    }
    if !console.unlock(password)? {
        anyhow::bail!("wrong password");
    }
    Ok(console)
}

fn state_label(state: GateState) -> &'static str {
    match state {
        GateState::NoSession => "no session (run `reportctl login`)",
        GateState::NeedsPasswordSetup => "needs password setup",
        GateState::Locked => "locked",
        GateState::Unlocked => "unlocked",
    }
}
