//! # mgtree
//!
//! Command-line tool for `.mgtree` outline files.
//!
//! ## Usage
//!
//! Show an outline as a tree:
//! ```sh
//! mgtree show notes.mgtree
//! ```
//!
//! Resolve jumps against the companion markdown document:
//! ```sh
//! mgtree jumps --code notes.mgtree
//! ```
//!
//! Edit in place:
//! ```sh
//! mgtree add --parent node-0 notes.mgtree 'Loops >java++'
//! ```

mod cli;

use clap::Parser as ClapParser;
use cli::{Cli, Command, OutputFormat};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail};
use mgtree::{CodeBlockIndex, Config, FileWatcher, FsStore, Outline, OutlineNode, OutlineStore};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn main() -> Result<()> {
    color_eyre::install()?;

    // Handle dynamic shell completions
    #[cfg(feature = "unstable-dynamic")]
    clap_complete::CompleteEnv::with_factory(|| {
        use clap::CommandFactory;
        Cli::command()
    })
    .complete();

    let args = Cli::parse();

    let config = match args.config {
        Some(ref path) => Config::load_from(path).unwrap_or_default(),
        None => Config::load(),
    };
    mgtree::logging::init(&config.log.level);

    match args.command {
        Command::Show {
            file,
            output,
            filter,
        } => {
            let outline = Outline::parse(&read_input(&file)?);
            let format = match output {
                Some(format) => format,
                None => config_output_format(&config),
            };
            print_outline(&outline, format, filter.as_deref())
        }
        Command::Fmt { file, write, check } => format_outline(&file, write, check),
        Command::Stats { file, json } => {
            let outline = Outline::parse(&read_input(&file)?);
            print_stats(&outline, json)
        }
        Command::Jumps {
            file,
            markdown,
            code,
            json,
        } => {
            let outline = Outline::parse(&read_input(&file)?);
            let markdown = markdown.or_else(|| {
                (!is_stdin(&file)).then(|| config.companion_markdown(&file))
            });
            print_jumps(&outline, markdown.as_deref(), code, json)
        }
        Command::Add { file, parent, text } => {
            let key = edit_file(&file, |outline| {
                let key = outline.add_child(parent)?;
                outline.rename(key, &text)?;
                Ok(key)
            })?;
            println!("{}", key);
            Ok(())
        }
        Command::Rename { file, key, text } => {
            edit_file(&file, |outline| Ok(outline.rename(key, &text)?))
        }
        Command::Remove { file, key } => edit_file(&file, |outline| {
            let removed = outline.remove(key)?;
            let count = removed.subtree_len();
            if count > 1 {
                eprintln!("Removed {} and {} descendant(s)", key, count - 1);
            }
            Ok(())
        }),
        Command::Watch { file } => watch_outline(&file, &config),
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_input(path: &Path) -> Result<String> {
    if is_stdin(path) {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .wrap_err("Failed to read stdin")?;
        return Ok(buffer);
    }
    Ok(FsStore.read(path)?)
}

fn config_output_format(config: &Config) -> OutputFormat {
    use clap::ValueEnum;

    OutputFormat::from_str(&config.output.format, true).unwrap_or_else(|_| {
        tracing::warn!(format = %config.output.format, "unknown output format in config");
        OutputFormat::Tree
    })
}

/// Load an outline file, apply an edit, and write it back atomically.
fn edit_file<T>(path: &Path, edit: impl FnOnce(&mut Outline) -> Result<T>) -> Result<T> {
    if is_stdin(path) {
        bail!("Editing commands need a file path, not stdin");
    }

    let mut outline = Outline::parse(&FsStore.read(path)?);
    let result = edit(&mut outline)?;
    FsStore.write(path, &outline.serialize())?;
    Ok(result)
}

fn print_outline(outline: &Outline, format: OutputFormat, filter: Option<&str>) -> Result<()> {
    if let Some(pattern) = filter {
        let matches = outline.filter(pattern);
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            }
            OutputFormat::Plain | OutputFormat::Tree => {
                for node in matches {
                    println!("{}  {}", node.key, describe(node));
                }
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Plain => {
            for (depth, node) in outline.iter() {
                println!("{}{}", "  ".repeat(depth), describe(node));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outline.nodes())?);
        }
        OutputFormat::Tree => print!("{}", outline.render_tree()),
    }
    Ok(())
}

fn describe(node: &OutlineNode) -> String {
    match &node.jump {
        Some(jump) => format!("{}  → {}", node.display_title(), jump),
        None => node.display_title().to_string(),
    }
}

fn format_outline(path: &Path, write: bool, check: bool) -> Result<()> {
    let original = read_input(path)?;
    let formatted = Outline::parse(&original).serialize();

    if check {
        if formatted != original {
            bail!("{} is not formatted", path.display());
        }
        return Ok(());
    }

    if write {
        if is_stdin(path) {
            bail!("--write needs a file path, not stdin");
        }
        if formatted != original {
            FsStore.write(path, &formatted)?;
        }
        return Ok(());
    }

    print!("{}", formatted);
    Ok(())
}

fn print_stats(outline: &Outline, json: bool) -> Result<()> {
    let stats = outline.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Nodes:     {}", stats.node_count);
    println!("Roots:     {}", stats.root_count);
    println!("Depth:     {}", stats.max_depth);
    println!("Empty:     {}", stats.empty_count);
    println!("Jumps:     {}", stats.jump_count);
    for (language, count) in &stats.languages {
        println!("  {}: {}", language, count);
    }
    Ok(())
}

fn print_jumps(outline: &Outline, markdown: Option<&Path>, code: bool, json: bool) -> Result<()> {
    let index = match markdown {
        Some(path) => match CodeBlockIndex::from_file(path) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "no markdown document");
                CodeBlockIndex::default()
            }
        },
        None => CodeBlockIndex::default(),
    };

    let resolved = index.resolve(outline.nodes());

    if json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    for jump in &resolved {
        let target = match jump.block {
            Some(block) => format!("line {}", block.start_line),
            None => format!("missing ({} {} block(s))", index.count(jump.language), jump.language),
        };
        let title = if jump.title.is_empty() {
            mgtree::EMPTY_NODE_PLACEHOLDER
        } else {
            jump.title
        };
        println!(
            "{}  {}  → {}#{}  {}",
            jump.key, title, jump.language, jump.index, target
        );

        if code {
            if let Some(block) = jump.block {
                println!("```{}", block.language);
                println!("{}", block.content.trim_end());
                println!("```");
            }
        }
    }
    Ok(())
}

fn watch_outline(path: &Path, config: &Config) -> Result<()> {
    if is_stdin(path) {
        bail!("watch needs a file path, not stdin");
    }
    // Watcher events carry canonical paths
    let path: PathBuf = path
        .canonicalize()
        .wrap_err_with(|| format!("Cannot watch {}", path.display()))?;

    let mut watcher = FileWatcher::with_debounce(config.debounce())?;
    watcher.watch(&path)?;

    let mut outline = Outline::parse(&FsStore.read(&path)?);
    print!("{}", outline.render_tree());

    loop {
        if !watcher.wait_for_change(Duration::from_secs(1)) {
            continue;
        }

        match FsStore.read(&path) {
            Ok(text) => {
                // Every change replaces the whole forest
                outline = Outline::parse(&text);
                println!("\n--- {} ({} nodes)", path.display(), outline.len());
                print!("{}", outline.render_tree());
            }
            Err(e) => {
                tracing::warn!(error = %e, "reload failed");
                eprintln!("{}", e);
            }
        }
    }
}
