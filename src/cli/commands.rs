use clap::{Parser, Subcommand, ValueEnum};
use mgtree::NodeKey;
use std::path::PathBuf;

#[cfg(feature = "unstable-dynamic")]
use clap_complete::engine::{ArgValueCompleter, CompletionCandidate, ValueCompleter};

#[derive(Parser, Debug)]
#[command(name = "mgtree")]
#[command(version)]
#[command(about = "Outline files with jumps into markdown code blocks")]
#[command(
    long_about = "mgtree - read, format and edit .mgtree outline files.\n\n\
    An outline has one node per line; indentation sets nesting, and a trailing\n\
    annotation such as >java[3], >java++, >java+=2 or >java points the node at a\n\
    code block of that language in a companion markdown document.\n\n\
    Examples:\n  \
    mgtree show notes.mgtree                 # Box-drawing tree\n  \
    mgtree show -o json notes.mgtree         # Nodes as JSON\n  \
    mgtree fmt --write notes.mgtree          # Normalize indentation\n  \
    mgtree jumps --code notes.mgtree         # Resolve jumps against notes.md\n  \
    mgtree add --parent node-2 notes.mgtree 'Loops >java++'"
)]
pub struct Cli {
    /// Use this config file instead of the platform default
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the outline
    ///
    /// Renders the node tree. Jump nodes are marked with their resolved
    /// target, e.g. `→ java#3`.
    Show {
        /// Outline file (.mgtree), or '-' for stdin
        #[arg(add = outline_file_completer())]
        file: PathBuf,

        /// Output format (defaults to the config file setting)
        ///
        ///   plain - Indented titles
        ///   json  - Node tree as JSON
        ///   tree  - Box-drawing tree structure
        #[arg(short = 'o', long = "output")]
        output: Option<OutputFormat>,

        /// Only show nodes whose title contains PATTERN (case-insensitive)
        #[arg(long = "filter", value_name = "PATTERN")]
        filter: Option<String>,
    },

    /// Re-serialize the outline with canonical two-space indentation
    ///
    /// Node lines are kept verbatim, annotations included; only indentation
    /// and blank lines change. Prints the result unless --write or --check.
    Fmt {
        /// Outline file (.mgtree), or '-' for stdin
        #[arg(add = outline_file_completer())]
        file: PathBuf,

        /// Write the result back to the file
        #[arg(short = 'w', long = "write", conflicts_with = "check")]
        write: bool,

        /// Exit with an error if the file is not already formatted
        #[arg(long = "check")]
        check: bool,
    },

    /// Count nodes, depth and jumps per language
    Stats {
        /// Outline file (.mgtree), or '-' for stdin
        #[arg(add = outline_file_completer())]
        file: PathBuf,

        /// Print statistics as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// List jump annotations and resolve them against a markdown document
    ///
    /// By default the markdown document is the outline's path with the
    /// configured companion extension (notes.mgtree -> notes.md).
    Jumps {
        /// Outline file (.mgtree), or '-' for stdin
        #[arg(add = outline_file_completer())]
        file: PathBuf,

        /// Markdown document containing the code blocks
        #[arg(short = 'm', long = "markdown", value_name = "DOC")]
        markdown: Option<PathBuf>,

        /// Print the code of each resolved block
        #[arg(long = "code")]
        code: bool,

        /// Print resolutions as JSON
        #[arg(long = "json", conflicts_with = "code")]
        json: bool,
    },

    /// Append a node and save the outline
    ///
    /// Prints the key of the new node.
    Add {
        /// Outline file (.mgtree)
        #[arg(add = outline_file_completer())]
        file: PathBuf,

        /// Parent node key (e.g. node-3); omit to add a root node
        #[arg(short = 'p', long = "parent", value_name = "KEY")]
        parent: Option<NodeKey>,

        /// Node text, optionally ending in a jump annotation
        text: String,
    },

    /// Replace a node's text and save the outline
    Rename {
        /// Outline file (.mgtree)
        #[arg(add = outline_file_completer())]
        file: PathBuf,

        /// Node key (e.g. node-3)
        key: NodeKey,

        /// New node text, optionally ending in a jump annotation
        text: String,
    },

    /// Remove a node and its children and save the outline
    Remove {
        /// Outline file (.mgtree)
        #[arg(add = outline_file_completer())]
        file: PathBuf,

        /// Node key (e.g. node-3)
        key: NodeKey,
    },

    /// Print the outline again every time the file changes
    Watch {
        /// Outline file (.mgtree)
        #[arg(add = outline_file_completer())]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// JSON output
    Json,
    /// Tree format with box-drawing
    Tree,
}

#[cfg(feature = "unstable-dynamic")]
fn outline_file_completer() -> ArgValueCompleter {
    use std::ffi::OsStr;
    use std::path::Path;

    struct OutlineCompleter;

    impl ValueCompleter for OutlineCompleter {
        fn complete(&self, current: &OsStr) -> Vec<CompletionCandidate> {
            // "../notes/ja" -> directory="../notes", prefix="ja"
            let input_str = current.to_string_lossy();
            let input_path = Path::new(input_str.as_ref());

            let (search_dir, prefix) = if input_str.is_empty() {
                (Path::new("."), String::new())
            } else if input_str.ends_with('/') || input_str.ends_with('\\') {
                (input_path, String::new())
            } else {
                // parent() returns Some("") for bare file names
                let parent = input_path.parent().unwrap_or(Path::new("."));
                let dir = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
                let prefix = input_path
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                (dir, prefix)
            };

            let entries = match std::fs::read_dir(search_dir) {
                Ok(entries) => entries,
                Err(_) => return vec![],
            };

            entries
                .filter_map(Result::ok)
                .filter_map(|entry| {
                    let path = entry.path();
                    let file_name = path.file_name()?.to_string_lossy().to_string();

                    if !prefix.is_empty()
                        && !file_name.to_lowercase().starts_with(&prefix.to_lowercase())
                    {
                        return None;
                    }

                    let completion_value = if search_dir == Path::new(".") {
                        file_name
                    } else {
                        search_dir.join(&file_name).to_string_lossy().to_string()
                    };

                    if path.is_dir() {
                        let mut dir_completion = completion_value;
                        if !dir_completion.ends_with('/') {
                            dir_completion.push('/');
                        }
                        return Some(
                            CompletionCandidate::new(dir_completion).help(Some("directory".into())),
                        );
                    }

                    let ext = path.extension()?.to_string_lossy().to_lowercase();
                    (ext == mgtree::OUTLINE_EXTENSION)
                        .then(|| CompletionCandidate::new(completion_value))
                })
                .collect()
        }
    }

    ArgValueCompleter::new(OutlineCompleter)
}

#[cfg(not(feature = "unstable-dynamic"))]
fn outline_file_completer() -> clap::builder::ValueHint {
    clap::ValueHint::FilePath
}
