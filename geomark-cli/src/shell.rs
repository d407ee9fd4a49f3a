//! Interactive shell
//!
//! Reads one command per line and drives the session manager and, once
//! logged in, the marker store. Errors are printed and the shell keeps going.

use crate::render;
use clap::{Parser, Subcommand};
use geomark_applications::{
    encode_image_file, locate, provider_from_config, DraftField, MarkerStore, SessionManager,
    Storage,
};
use geomark_core::{
    validation_error, Category, CategoryFilter, ErrorContext, GeomarkConfig, GeomarkError,
    GeomarkResult, LocationProvider, Position,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "geomark",
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true,
    disable_help_subcommand = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
enum ShellCommand {
    Register {
        username: String,
        password: String,
    },
    Login {
        username: String,
        password: String,
    },
    Logout,
    Whoami,
    #[command(allow_negative_numbers = true)]
    New {
        #[arg(required_unless_present = "here", conflicts_with = "here")]
        lat: Option<f64>,
        #[arg(required_unless_present = "here")]
        lng: Option<f64>,
        /// Use the current location
        #[arg(long)]
        here: bool,
    },
    Edit {
        index: usize,
    },
    Set {
        #[command(subcommand)]
        field: SetField,
    },
    ClearImage,
    Save,
    Cancel,
    Delete {
        index: usize,
    },
    Filter {
        category: CategoryFilter,
    },
    Search {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    List,
    Show {
        index: usize,
    },
    Locate,
    Help,
    #[command(alias = "exit", alias = "q")]
    Quit,
}

#[derive(Subcommand, Debug, PartialEq)]
enum SetField {
    Description {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    Category {
        category: Category,
    },
    Image {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn parse_line(line: &str) -> Result<ShellCommand, clap::Error> {
    ShellLine::try_parse_from(line.split_whitespace()).map(|parsed| parsed.command)
}

pub struct Shell {
    config: GeomarkConfig,
    storage: Storage,
    sessions: SessionManager<Storage>,
    /// Open only while a session exists
    markers: Option<MarkerStore<Storage>>,
    location: Box<dyn LocationProvider>,
    category: CategoryFilter,
    search: String,
}

impl Shell {
    pub fn new(config: GeomarkConfig, storage: Storage) -> Self {
        let location = provider_from_config(&config.location);
        Self {
            sessions: SessionManager::new(storage.clone()),
            markers: None,
            location,
            category: CategoryFilter::All,
            search: String::new(),
            config,
            storage,
        }
    }

    pub async fn run(&mut self) -> GeomarkResult<()> {
        info!("Starting shell on {}", self.storage.describe());

        println!("🗺  Geomark shell ({})", self.storage.describe());
        println!(
            "   Map centered on {} at zoom {}",
            self.config.map.default_center, self.config.map.default_zoom
        );
        match self.sessions.registered_username() {
            Ok(Some(username)) => println!("   Registered user: {} ('login' to continue)", username),
            Ok(None) => println!("   No user yet, start with 'register <username> <password>'"),
            Err(e) => println!("{}", render::error(&e)),
        }
        println!("💡 Type 'help' for commands, 'quit' to exit\n");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("{} ", self.prompt());
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                println!();
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let command = match parse_line(line) {
                Ok(command) => command,
                Err(e) => {
                    println!("❌ {}", e.to_string().trim_end());
                    continue;
                }
            };

            match self.execute(command).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => {
                    if !e.is_user_error() {
                        e.log();
                    }
                    println!("{}", render::error(&e));
                }
            }
        }

        println!("👋 Goodbye!");
        Ok(())
    }

    fn prompt(&self) -> String {
        match (self.sessions.current(), self.markers.as_ref().and_then(|m| m.draft())) {
            (Some(session), Some(_)) => format!("geomark({}*)>", session.username),
            (Some(session), None) => format!("geomark({})>", session.username),
            (None, _) => "geomark>".to_string(),
        }
    }

    async fn execute(&mut self, command: ShellCommand) -> GeomarkResult<Flow> {
        debug!(?command, "Executing shell command");

        match command {
            ShellCommand::Register { username, password } => {
                self.sessions.register(&username, &password)?;
                println!(
                    "✅ Registered {}. Log in with 'login {} <password>'",
                    username, username
                );
            }
            ShellCommand::Login { username, password } => {
                let username = self.sessions.login(&username, &password)?.username.clone();
                let store = MarkerStore::initialize(self.storage.clone());
                println!("✅ Welcome, {}! {} markers loaded", username, store.len());
                self.markers = Some(store);
                self.category = CategoryFilter::All;
                self.search.clear();
                self.print_list();
            }
            ShellCommand::Logout => match self.sessions.logout() {
                Some(session) => {
                    // drops any pending draft with the store
                    self.markers = None;
                    println!("👋 Logged out {}", session.username);
                }
                None => println!("Not logged in"),
            },
            ShellCommand::Whoami => match self.sessions.current() {
                Some(session) => println!(
                    "👤 {} (since {})",
                    session.username,
                    session.started_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => println!("👤 Not logged in"),
            },
            ShellCommand::New { lat, lng, here } => {
                self.ensure_session()?;
                let position = match (here, lat, lng) {
                    (true, _, _) => self.current_position().await?,
                    (false, Some(lat), Some(lng)) => Position::new(lat, lng),
                    _ => {
                        return Err(validation_error!(
                            "Give both latitude and longitude, or --here",
                            "position",
                            "shell"
                        ))
                    }
                };
                let draft = self.markers_mut()?.begin_create(position)?;
                println!("{}", render::draft_summary(draft));
            }
            ShellCommand::Edit { index } => {
                let draft = self.markers_mut()?.begin_edit(index)?;
                println!("{}", render::draft_summary(draft));
            }
            ShellCommand::Set { field } => {
                self.ensure_session()?;
                let field = match field {
                    SetField::Description { text } => DraftField::Description(text.join(" ")),
                    SetField::Category { category } => DraftField::Category(Some(category)),
                    SetField::Image { path } => DraftField::Image(Some(encode_image_file(
                        &path,
                        self.config.markers.max_image_bytes,
                    )?)),
                };
                let draft = self.markers_mut()?.update_draft(field)?;
                println!("{}", render::draft_summary(draft));
            }
            ShellCommand::ClearImage => {
                let draft = self.markers_mut()?.update_draft(DraftField::Image(None))?;
                println!("{}", render::draft_summary(draft));
            }
            ShellCommand::Save => {
                let outcome = self.markers_mut()?.commit()?;
                println!(
                    "✅ {} marker [{}]",
                    if outcome.created { "Created" } else { "Updated" },
                    outcome.index
                );
                self.print_list();
            }
            ShellCommand::Cancel => match self.markers_mut()?.cancel_draft() {
                Some(_) => println!("🗑  Draft discarded"),
                None => println!("No draft to cancel"),
            },
            ShellCommand::Delete { index } => {
                let removed = self.markers_mut()?.delete(index)?;
                println!("🗑  Deleted [{}] {}", index, removed.description);
                self.print_list();
            }
            ShellCommand::Filter { category } => {
                self.ensure_session()?;
                self.category = category;
                self.print_list();
            }
            ShellCommand::Search { text } => {
                self.ensure_session()?;
                self.search = text.join(" ");
                self.print_list();
            }
            ShellCommand::List => {
                self.ensure_session()?;
                self.print_list();
            }
            ShellCommand::Show { index } => {
                let store = self.markers_ref()?;
                let marker = store.get(index).ok_or_else(|| GeomarkError::IndexOutOfRange {
                    index,
                    len: store.len(),
                    context: ErrorContext::new("shell")
                        .with_operation("show")
                        .with_suggestion("Run 'list' to see current marker numbers"),
                })?;
                println!("{}", render::marker_details(index, marker));
                println!(
                    "🧭 Map centered on {} at zoom {}",
                    marker.position, self.config.map.fly_to_zoom
                );
            }
            ShellCommand::Locate => {
                let position = self.current_position().await?;
                println!(
                    "📍 You are here: {} (map zoom {})",
                    position, self.config.map.fly_to_zoom
                );
            }
            ShellCommand::Help => println!("{}", render::HELP),
            ShellCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    async fn current_position(&self) -> GeomarkResult<Position> {
        locate(self.location.as_ref(), self.config.location.timeout_ms).await
    }

    fn print_list(&self) {
        if let Some(store) = &self.markers {
            println!(
                "{}",
                render::marker_list(
                    store.filter(self.category, &self.search),
                    store.len(),
                    self.category,
                    &self.search
                )
            );
        }
    }

    fn ensure_session(&self) -> GeomarkResult<()> {
        self.markers_ref().map(|_| ())
    }

    fn markers_ref(&self) -> GeomarkResult<&MarkerStore<Storage>> {
        self.sessions.require_session()?;
        self.markers.as_ref().ok_or_else(workspace_closed)
    }

    fn markers_mut(&mut self) -> GeomarkResult<&mut MarkerStore<Storage>> {
        self.sessions.require_session()?;
        self.markers.as_mut().ok_or_else(workspace_closed)
    }
}

fn workspace_closed() -> GeomarkError {
    GeomarkError::Internal {
        message: "marker workspace is not open".to_string(),
        source: None,
        context: ErrorContext::new("shell").with_operation("markers"),
    }
}
