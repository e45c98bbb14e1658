use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;

use crate::remote::{PaperRequestForm, RequestStatus};
use crate::session::Filters;

#[derive(Parser)]
#[command(name = "qvault")]
#[command(about = "Search and browse the Q-Vault exam paper catalog")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Structured search filters shared by `search` and `share`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Exam year (e.g. 2024)
    #[arg(long)]
    pub year: Option<String>,

    /// Semester number
    #[arg(long)]
    pub semester: Option<String>,

    /// Exam type (e.g. "Mid Term", "Final")
    #[arg(long = "exam-type")]
    pub exam_type: Option<String>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> Filters {
        Filters {
            year: self.year.as_deref().unwrap_or_default().trim().to_string(),
            semester: self.semester.as_deref().unwrap_or_default().trim().to_string(),
            exam_type: self.exam_type.as_deref().unwrap_or_default().trim().to_string(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the catalog
    #[command(visible_alias = "s")]
    Search {
        /// Free-text search term (title, course, course code)
        term: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Number of result pages to load
        #[arg(long, default_value = "1", value_parser = parse_pages)]
        pages: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reproduce the results of a shared search link
    Open {
        /// Share link, `?q=...` fragment or bare query string
        link: String,

        /// Number of result pages to load
        #[arg(long, default_value = "1", value_parser = parse_pages)]
        pages: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the share link for a search without running it
    Share {
        /// Free-text search term
        term: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Prefix the query string with this page URL
        #[arg(long)]
        base: Option<String>,
    },

    /// List your favorite papers
    #[command(visible_alias = "favs")]
    Favorites {
        /// Only show papers matching this text
        #[arg(long)]
        filter: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the catalog for administration
    Manage {
        /// Only show papers matching this text
        #[arg(long)]
        filter: Option<String>,

        /// Delete the paper with this ID
        #[arg(long)]
        delete: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open a paper in the default viewer
    View {
        /// Paper ID
        id: String,

        /// Copy the link to the clipboard instead of opening it
        #[arg(long, conflicts_with = "print")]
        copy: bool,

        /// Only print the link
        #[arg(long)]
        print: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a paper as PDF
    #[command(visible_alias = "dl")]
    Download {
        /// Paper ID
        id: String,

        /// Directory to save into (default: configured download_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Toggle a paper in your favorites
    #[command(visible_alias = "fav")]
    Favorite {
        /// Paper ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Request a paper that is missing from the catalog
    Request {
        /// Course name (e.g. "Operating Systems")
        #[arg(long = "course-name")]
        course_name: String,

        /// Course code (e.g. CS302)
        #[arg(long = "course-code")]
        course_code: String,

        /// Semester number
        #[arg(long)]
        semester: Option<String>,

        /// Exam type (e.g. "Mid Term", "Final")
        #[arg(long = "exam-type")]
        exam_type: Option<String>,

        /// Exam year
        #[arg(long)]
        year: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List paper requests
    Requests {
        /// Only show requests with this status (pending, fulfilled, rejected)
        #[arg(long)]
        status: Option<RequestStatus>,

        /// Change the status of the request with this ID
        #[arg(long, requires = "to")]
        update: Option<String>,

        /// New status for --update
        #[arg(long, requires = "update")]
        to: Option<RequestStatus>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for [possible values: bash, zsh, fish, powershell, elvish]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (base_url, auth.token, page_size, debounce_ms, request_timeout, download_dir)
        key: String,
        /// Value to set
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get a configuration value
    Get {
        /// Configuration key (base_url, auth.token, page_size, debounce_ms, request_timeout, download_dir)
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Execute the command, dispatching to the appropriate handler.
    pub async fn run(self) -> crate::error::Result<()> {
        use crate::commands::{
            LinkMode, cmd_config_get, cmd_config_set, cmd_config_show, cmd_download,
            cmd_favorite, cmd_favorites, cmd_manage, cmd_open, cmd_request, cmd_requests,
            cmd_search, cmd_share, cmd_view, cmd_whoami,
        };

        match self {
            Commands::Search {
                term,
                filters,
                pages,
                json,
            } => {
                cmd_search(
                    term.as_deref().unwrap_or_default(),
                    filters.to_filters(),
                    pages,
                    json,
                )
                .await
            }
            Commands::Open { link, pages, json } => cmd_open(&link, pages, json).await,
            Commands::Share {
                term,
                filters,
                base,
            } => cmd_share(
                term.as_deref().unwrap_or_default(),
                filters.to_filters(),
                base.as_deref(),
            ),

            Commands::Favorites { filter, json } => cmd_favorites(filter.as_deref(), json).await,
            Commands::Manage {
                filter,
                delete,
                json,
            } => cmd_manage(filter.as_deref(), delete.as_deref(), json).await,

            Commands::View {
                id,
                copy,
                print,
                json,
            } => {
                let mode = if copy {
                    LinkMode::Clipboard
                } else if print || json {
                    LinkMode::Print
                } else {
                    LinkMode::Open
                };
                cmd_view(&id, mode, json).await
            }
            Commands::Download { id, out, json } => cmd_download(&id, out, json).await,
            Commands::Favorite { id, json } => cmd_favorite(&id, json).await,
            Commands::Request {
                course_name,
                course_code,
                semester,
                exam_type,
                year,
                json,
            } => {
                let form = PaperRequestForm {
                    course_name,
                    course_code,
                    semester: semester.unwrap_or_default(),
                    exam_type: exam_type.unwrap_or_default(),
                    year: year.unwrap_or_default(),
                };
                cmd_request(form, json).await
            }
            Commands::Requests {
                status,
                update,
                to,
                json,
            } => cmd_requests(status, update.zip(to), json).await,
            Commands::Whoami { json } => cmd_whoami(json).await,

            Commands::Config { action } => match action {
                ConfigAction::Show { json } => cmd_config_show(json),
                ConfigAction::Set { key, value, json } => cmd_config_set(&key, &value, json),
                ConfigAction::Get { key, json } => cmd_config_get(&key, json),
            },

            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

fn parse_pages(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("Invalid page count '{s}'. Must be a whole number of at least 1")),
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "qvault", &mut io::stdout());
}
