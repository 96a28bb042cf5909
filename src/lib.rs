//! # mgtree
//!
//! Outline files with jumps into markdown code blocks.
//!
//! An outline is plain text with one node per non-blank line. Indentation
//! sets nesting, and a line may end with a jump annotation that points the
//! node at the n-th fenced code block of a language in a companion markdown
//! document:
//!
//! ```text
//! Java basics
//!   Print statement >java[1]
//!   Variables >java++
//!     Scope >java
//!   Loops >java+=2
//! ```
//!
//! ## Example
//!
//! ```rust
//! use mgtree::{Outline, parse_outline, serialize_outline};
//!
//! let text = "Basics\n  Print >java[1]\n  Loops >java++\n";
//!
//! let nodes = parse_outline(text);
//! assert_eq!(nodes[0].children[1].jump_index(), Some(2));
//!
//! // Source lines are written back verbatim
//! assert_eq!(serialize_outline(&nodes), text);
//!
//! // Editable forest with stable keys
//! let mut outline = Outline::parse(text);
//! let key = outline.add_child(None).unwrap();
//! outline.rename(key, "Classes >java++").unwrap();
//! assert_eq!(outline.find(key).unwrap().jump_index(), Some(3));
//! ```

/// Configuration module for persisting user preferences.
pub mod config;

/// Logging setup for the binary.
pub mod logging;

/// Code block index over markdown documents, used to resolve jumps.
pub mod markdown;

/// Outline parser, serializer and editable forest.
pub mod outline;

/// Reading and atomically writing outline documents.
pub mod storage;

/// File watching for live re-parsing.
pub mod watcher;

pub use config::Config;
pub use markdown::{CodeBlock, CodeBlockIndex, JumpResolution};
pub use outline::{
    EMPTY_NODE_PLACEHOLDER, EditError, Jump, NodeKey, OUTLINE_EXTENSION, Outline, OutlineNode,
    OutlineStats, parse_file, parse_outline, serialize_outline,
};
pub use storage::{FsStore, OutlineStore, StorageError};
pub use watcher::FileWatcher;
