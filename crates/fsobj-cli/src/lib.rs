//! fso: inspect and manipulate filesystem objects from the shell.
//!
//! Argument parsing lives here so the command set can be driven from tests
//! with an explicit [`FsContext`] and an in-memory writer.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fsobj_kernel::{AncestorTarget, FsContext, FsoConfig, Handle, PathStyle, TreeOptions};

#[derive(Parser, Debug)]
#[command(name = "fso", version)]
#[command(about = "Typed filesystem handles: listing, ancestry, attributes and search", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: $FSOBJ_CONFIG, then the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print absolute paths instead of paths relative to the working directory
    #[arg(long, global = true)]
    pub absolute: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a directory's entries
    Ls {
        path: Option<PathBuf>,

        /// Show kind and size
        #[arg(short, long)]
        long: bool,
    },

    /// Print a directory tree as JSON
    Tree {
        path: Option<PathBuf>,

        #[arg(long)]
        size: bool,

        #[arg(long)]
        mime: bool,

        #[arg(long)]
        md5: bool,
    },

    /// Expand a glob pattern
    Glob {
        pattern: String,

        /// Directory the pattern is relative to
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Print parent directories, nearest first
    Ancestors {
        path: Option<PathBuf>,

        /// Stop at the first directory with this name
        #[arg(long, conflicts_with_all = ["until", "marker"])]
        name: Option<String>,

        /// Stop at this directory, or at :root, :home, :pwd or :tmp
        #[arg(long, conflicts_with = "marker")]
        until: Option<PathBuf>,

        /// Stop at the first directory containing this path
        #[arg(long)]
        marker: Option<String>,
    },

    /// Find files with lines containing every term
    Search {
        #[arg(required = true)]
        terms: Vec<String>,

        /// Directory to search (default: working directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Per-file key/value attributes
    Attr {
        #[command(subcommand)]
        action: AttrAction,
    },

    /// Print a file's MIME type
    Mime { path: PathBuf },

    /// Create an empty file or bump its modification time
    Touch { path: PathBuf },

    /// Delete a file or directory tree
    Rm { path: PathBuf },

    /// Move or rename; a directory destination receives the source
    Mv { src: PathBuf, dst: PathBuf },

    /// Compare two trees; exits 1 when they differ
    Same { a: PathBuf, b: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum AttrAction {
    Get { path: PathBuf, key: String },
    Set { path: PathBuf, key: String, value: String },
    Rm { path: PathBuf, key: String },
    Ls { path: PathBuf },
}

/// Build the context for `cli`: configuration plus the process working
/// directory.
pub fn context(cli: &Cli) -> Result<FsContext> {
    let config = match &cli.config {
        Some(path) => FsoConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FsoConfig::load().context("Failed to load config")?,
    };
    let ctx = FsContext::current(&config).context("Failed to resolve working directory")?;
    Ok(if cli.absolute {
        ctx.with_style(PathStyle::Absolute)
    } else {
        ctx
    })
}

/// Parse-free entry point used by `main`.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<bool> {
    let ctx = context(cli)?;
    execute(cli, &ctx, out)
}

/// Run one command. `Ok(false)` means the command completed but reports a
/// negative answer (`same` on differing trees).
pub fn execute(cli: &Cli, ctx: &FsContext, out: &mut impl Write) -> Result<bool> {
    tracing::debug!(command = ?cli.command, cwd = %ctx.cwd().display(), "executing");
    match &cli.command {
        Command::Ls { path, long } => ls(ctx, &dir_or_pwd(ctx, path.as_deref()), *long, out)?,
        Command::Tree { path, size, mime, md5 } => {
            let dir = dir_or_pwd(ctx, path.as_deref());
            let opts = TreeOptions { size: *size, mime: *mime, md5: *md5 };
            let tree = dir
                .to_json(ctx, opts)
                .with_context(|| format!("Failed to build tree for {}", ctx.display(&dir)))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&tree)?)?;
        }
        Command::Glob { pattern, dir } => {
            let dir = dir_or_pwd(ctx, dir.as_deref());
            for found in dir.glob(pattern).with_context(|| format!("Bad pattern {pattern:?}"))? {
                writeln!(out, "{}", ctx.display(&found))?;
            }
        }
        Command::Ancestors { path, name, until, marker } => {
            let start = dir_or_pwd(ctx, path.as_deref());
            let target = match (name, until, marker) {
                (Some(name), _, _) => AncestorTarget::Named(name.clone()),
                (_, Some(until), _) => until_target(ctx, until)?,
                (_, _, Some(marker)) => AncestorTarget::ExistingChild(marker.clone()),
                _ => AncestorTarget::Root,
            };
            for dir in start.ancestors_until(&target)? {
                writeln!(out, "{}", ctx.display(&dir))?;
            }
        }
        Command::Search { terms, dir } => {
            let dir = dir_or_pwd(ctx, dir.as_deref());
            let result = dir
                .search(ctx, terms.as_slice())
                .with_context(|| format!("Search failed in {}", ctx.display(&dir)))?;
            for hit in result.matches() {
                let shown = ctx.display(hit.handle());
                for line in hit.lines() {
                    writeln!(out, "{shown}:{line}")?;
                }
            }
        }
        Command::Attr { action } => attr(ctx, action, out)?,
        Command::Mime { path } => {
            let file = ctx.handle(path);
            writeln!(out, "{}", file.mime(ctx)?)?;
        }
        Command::Touch { path } => {
            let touched = ctx
                .touch(path)
                .with_context(|| format!("Failed to touch {}", path.display()))?;
            writeln!(out, "{}", ctx.display(&touched))?;
        }
        Command::Rm { path } => ctx.handle(path).delete()?,
        Command::Mv { src, dst } => {
            let mut moving = present(ctx, src)?;
            moving
                .move_to(&ctx.handle(dst))
                .with_context(|| format!("Failed to move {}", src.display()))?;
            writeln!(out, "{}", ctx.display(&moving))?;
        }
        Command::Same { a, b } => {
            let same = ctx.handle(a).same_tree(ctx, &ctx.handle(b))?;
            writeln!(out, "{}", if same { "same" } else { "different" })?;
            return Ok(same);
        }
    }
    Ok(true)
}

fn dir_or_pwd(ctx: &FsContext, path: Option<&Path>) -> Handle {
    match path {
        Some(path) => ctx.handle(path),
        None => ctx.pwd(),
    }
}

/// `:name` picks a well-known directory; anything else is a path.
fn until_target(ctx: &FsContext, until: &Path) -> Result<AncestorTarget> {
    match until.to_str().and_then(|s| s.strip_prefix(':')) {
        Some(symbol) => AncestorTarget::from_symbol(symbol, ctx)
            .with_context(|| format!("Unknown directory :{symbol}")),
        None => Ok(AncestorTarget::Handle(ctx.handle(until))),
    }
}

/// Untyped handle for something that must already exist.
fn present(ctx: &FsContext, path: &Path) -> Result<Handle> {
    ctx.classify(path)
        .with_context(|| format!("{} does not exist", path.display()))
}

fn ls(ctx: &FsContext, dir: &Handle, long: bool, out: &mut impl Write) -> Result<()> {
    let mut entries = dir.children()?.into_vec();
    entries.sort_by_key(Handle::name);
    for entry in &entries {
        if long {
            let kind = entry.kind();
            let size = if kind.is_file() {
                entry.size()?.to_string()
            } else {
                "-".to_string()
            };
            writeln!(out, "{:<9} {:>10} {}", kind.as_str(), size, ctx.display(entry))?;
        } else {
            writeln!(out, "{}", ctx.display(entry))?;
        }
    }
    Ok(())
}

fn attr(ctx: &FsContext, action: &AttrAction, out: &mut impl Write) -> Result<()> {
    match action {
        AttrAction::Get { path, key } => {
            let file = present(ctx, path)?;
            match file.attrs(ctx).get(key)? {
                Some(value) => writeln!(out, "{value}")?,
                None => bail!("{}: no attribute {key:?}", ctx.display(&file)),
            }
        }
        AttrAction::Set { path, key, value } => {
            let file = present(ctx, path)?;
            file.attrs(ctx).set(key, value)?;
        }
        AttrAction::Rm { path, key } => {
            let file = present(ctx, path)?;
            file.attrs(ctx).delete(key)?;
        }
        AttrAction::Ls { path } => {
            let file = present(ctx, path)?;
            let mut attrs = file.attrs(ctx);
            for key in attrs.keys()? {
                writeln!(out, "{key}")?;
            }
        }
    }
    Ok(())
}
