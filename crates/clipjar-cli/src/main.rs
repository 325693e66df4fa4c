use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clipjar_core::{parse_tags, ClipId, ClipKind, NewClip, Session, SortOrder, Store};
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

mod actions;
mod config;
mod copy_helpers;
mod lazy_store;
mod logging;
mod picker;
mod theme;

use copy_helpers::SystemClipboard;
use lazy_store::LazyStore;

#[derive(Parser)]
#[command(name = "clipjar", version, about = "Keep text and image snippets at hand")]
struct Cli {
    /// Path to the SQLite database (overrides settings)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Storage backend (overrides settings)
    #[arg(long, global = true, value_enum)]
    store: Option<Backend>,
    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Sqlite,
    Mem,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    InitDb,
    /// Add a text clip (reads STDIN when TEXT is omitted)
    Add {
        text: Option<String>,
        /// Comma separated tags, e.g. "work, snippets"
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        memo: Option<String>,
    },
    /// Add an image clip from a file
    AddImage {
        path: PathBuf,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        memo: Option<String>,
    },
    /// Ingest files as if dropped on the window; each is classified as text or image
    Drop {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Extra tags for every ingested file
        #[arg(long)]
        tags: Option<String>,
    },
    /// List clips
    List {
        /// Case-insensitive match on content, memo and tags
        #[arg(long)]
        search: Option<String>,
        /// Only `text` or `image` clips
        #[arg(long)]
        kind: Option<ClipKind>,
        /// `newest` or `oldest` first
        #[arg(long)]
        sort: Option<SortOrder>,
        #[arg(long)]
        json: bool,
    },
    /// Search clips by substring
    Search {
        query: String,
        #[arg(long)]
        kind: Option<ClipKind>,
        #[arg(long)]
        json: bool,
    },
    /// Show one clip in full
    Show {
        id: ClipId,
        #[arg(long)]
        json: bool,
    },
    /// Copy a clip to the system clipboard
    Copy { id: ClipId },
    /// Write an image clip's original bytes to disk
    Download {
        id: ClipId,
        /// Target file or directory (default: the configured downloads dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Delete a clip
    Delete {
        id: ClipId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Browse clips interactively
    Browse,
    /// Apply pending migrations
    Migrate {
        /// Only report current and pending versions
        #[arg(long)]
        status: bool,
    },
    /// Show resolved configuration paths
    Config {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, matches!(cli.command, Commands::Browse));
    let settings = config::load_settings();
    let db_path = cli.db.clone().unwrap_or_else(|| config::db_path(&settings));
    let backend = match cli.store {
        Some(b) => b,
        None => match settings.storage {
            config::Storage::Sqlite { .. } => Backend::Sqlite,
            config::Storage::Mem => Backend::Mem,
        },
    };
    let store = match backend {
        Backend::Sqlite => LazyStore::sqlite(db_path.clone()),
        Backend::Mem => LazyStore::mem(),
    };
    tracing::debug!(?backend, db = %db_path.display(), "resolved store");

    match cli.command {
        Commands::InitDb => {
            store.init()?;
            match backend {
                Backend::Sqlite => println!("database ready at {}", db_path.display()),
                Backend::Mem => println!("in-memory store ready"),
            }
        }
        Commands::Add { text, tags, memo } => {
            let text = match text {
                Some(t) => t,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let clip = NewClip::text(text)
                .with_tags(parse_tags(tags.as_deref().unwrap_or("")))
                .with_memo(memo);
            let mut session = Session::open(&store, settings.initial_view())?;
            let id = session.save(clip)?;
            println!("added {}", id);
        }
        Commands::AddImage { path, tags, memo } => {
            let mut session = Session::open(&store, settings.initial_view())?;
            let tags = parse_tags(tags.as_deref().unwrap_or(""));
            let id = session
                .save_image_file(&path, &tags, memo)
                .with_context(|| format!("add image {}", path.display()))?;
            println!("added {}", id);
        }
        Commands::Drop { paths, tags } => {
            let mut session = Session::open(&store, settings.initial_view())?;
            let tags = parse_tags(tags.as_deref().unwrap_or(""));
            let report = session.ingest(&paths, &tags);
            for (path, id) in &report.saved {
                println!("added {}\t{}", id, path.display());
            }
            for (path, err) in &report.rejected {
                eprintln!("skipped {}: {:#}", path.display(), err);
            }
            if report.saved.is_empty() && !report.rejected.is_empty() {
                anyhow::bail!("no files were added");
            }
        }
        Commands::List {
            search,
            kind,
            sort,
            json,
        } => {
            let mut view = settings.initial_view();
            if let Some(q) = search {
                view.search = q;
            }
            if kind.is_some() {
                view.category = kind;
            }
            if let Some(s) = sort {
                view.sort = s;
            }
            let session = Session::open(&store, view)?;
            print_clips(&session.visible(), json)?;
        }
        Commands::Search { query, kind, json } => {
            let items = store.search(&query, kind)?;
            let mut view = settings.initial_view();
            view.category = kind;
            let items = clipjar_core::derive(&items, &view);
            print_clips(&items, json)?;
        }
        Commands::Show { id, json } => {
            let clip = store
                .get(id)?
                .ok_or(clipjar_core::ClipError::NotFound(id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&clip)?);
            } else {
                println!("{}", actions::render_preview(&clip));
            }
        }
        Commands::Copy { id } => {
            let clip = store
                .get(id)?
                .ok_or(clipjar_core::ClipError::NotFound(id))?;
            actions::copy_clip(&clip, &SystemClipboard)?;
            println!("copied {}", id);
        }
        Commands::Download { id, out } => {
            let clip = store
                .get(id)?
                .ok_or(clipjar_core::ClipError::NotFound(id))?;
            let path = actions::download_clip(&clip, &config::downloads_dir(&settings), out.as_deref())?;
            println!("saved {}", path.display());
        }
        Commands::Delete { id, yes } => {
            let Some(clip) = store.get(id)? else {
                tracing::warn!(id, "nothing to delete");
                eprintln!("clip {} not found", id);
                return Ok(());
            };
            if !yes && !confirm(&format!("Delete clip {} ({})?", id, clip.preview(40)))? {
                println!("kept {}", id);
                return Ok(());
            }
            let mut session = Session::open(&store, settings.initial_view())?;
            session.delete(id)?;
            println!("deleted {}", id);
        }
        Commands::Browse => {
            let mut session = Session::open(&store, settings.initial_view())?;
            let theme = theme::TuiTheme::from_settings(&settings.tui());
            picker::run_browser(
                &mut session,
                &SystemClipboard,
                &config::downloads_dir(&settings),
                &theme,
            )?;
        }
        Commands::Migrate { status } => {
            if let Backend::Mem = backend {
                println!("in-memory store has no migrations");
                return Ok(());
            }
            if let Some(dir) = db_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let sqlite = clipjar_core::SqliteStore::new_with(&db_path, false)?;
            if !status {
                sqlite.migrate_all()?;
            }
            let st = sqlite.migration_status()?;
            println!("current: {}", st.current);
            println!("latest: {}", st.latest);
            if st.pending.is_empty() {
                println!("pending: none");
            } else {
                println!("pending: {}", st.pending.join(", "));
            }
        }
        Commands::Config { json } => {
            let storage = match backend {
                Backend::Sqlite => "sqlite",
                Backend::Mem => "mem",
            };
            let view = settings.initial_view();
            let info = serde_json::json!({
                "config_dir": config::config_dir(),
                "settings_path": config::settings_path(),
                "db_path": db_path,
                "downloads_dir": config::downloads_dir(&settings),
                "storage": storage,
                "view": { "sort": view.sort, "kind": view.category },
            });
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("config_dir: {}", config::config_dir().display());
                println!("settings: {}", config::settings_path().display());
                println!("storage: {}", storage);
                println!("db: {}", db_path.display());
                println!("downloads: {}", config::downloads_dir(&settings).display());
                println!("view: {} first, {}", view.sort, view.category.map(|k| k.as_str()).unwrap_or("all"));
            }
        }
    }

    Ok(())
}

fn print_clips(items: &[&clipjar_core::Clip], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else if items.is_empty() {
        println!("No clips found.");
    } else {
        for c in items {
            println!("{}", actions::card_line(c));
        }
    }
    Ok(())
}

/// Asks on stderr, reads one line from stdin; anything but y/yes declines.
fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
