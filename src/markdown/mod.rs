//! Code blocks of a companion markdown document.
//!
//! Jump annotations in an outline point at the n-th fenced code block of a
//! language in a markdown document. This module indexes those blocks and
//! resolves outline jumps against them. The outline parser never checks
//! that a target exists; resolution here is where missing targets show up.
//!
//! Block parsing is delegated to `turbovault-parser`, so fences inside
//! lists, blockquotes and details blocks are found in document order.

use crate::outline::{Jump, NodeKey, OutlineIter, OutlineNode};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;
use turbovault_parser::ContentBlock as Block;

/// One fenced code block with a language tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    /// Language tag as written on the fence
    pub language: String,
    /// 1-based position among blocks of the same language
    pub position: u32,
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Code blocks grouped by lowercase language, in document order.
#[derive(Debug, Clone, Default)]
pub struct CodeBlockIndex {
    by_language: IndexMap<String, Vec<CodeBlock>>,
}

/// Outcome of resolving one outline jump.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpResolution<'a> {
    pub key: NodeKey,
    pub title: &'a str,
    pub language: &'a str,
    pub index: u32,
    /// `None` when the markdown has fewer blocks of that language
    pub block: Option<&'a CodeBlock>,
}

impl CodeBlockIndex {
    pub fn from_markdown(markdown: &str) -> Self {
        let blocks = turbovault_parser::parse_blocks_from_line(markdown, 0);
        let mut index = Self::default();
        index.collect(&blocks);
        tracing::debug!(
            languages = index.by_language.len(),
            blocks = index.len(),
            "indexed code blocks"
        );
        index
    }

    /// Index the code blocks of a markdown file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_markdown(&content))
    }

    fn collect(&mut self, blocks: &[Block]) {
        for block in blocks {
            match block {
                Block::Code {
                    language,
                    content,
                    start_line,
                    end_line,
                } => {
                    let Some(language) = language.as_deref().map(str::trim) else {
                        continue;
                    };
                    if language.is_empty() {
                        continue;
                    }
                    let entries = self.by_language.entry(language.to_lowercase()).or_default();
                    let position = entries.len() as u32 + 1;
                    entries.push(CodeBlock {
                        language: language.to_string(),
                        position,
                        content: content.clone(),
                        start_line: *start_line as usize,
                        end_line: *end_line as usize,
                    });
                }
                Block::List { items, .. } => {
                    for item in items {
                        self.collect(&item.blocks);
                    }
                }
                Block::Blockquote { blocks, .. } => self.collect(blocks),
                Block::Details { blocks, .. } => self.collect(blocks),
                _ => {}
            }
        }
    }

    /// The `index`-th (1-based) block of `language`, compared case-insensitively.
    pub fn get(&self, language: &str, index: u32) -> Option<&CodeBlock> {
        let position = usize::try_from(index).ok()?.checked_sub(1)?;
        self.by_language
            .get(&language.to_lowercase())?
            .get(position)
    }

    /// Block targeted by a resolved jump.
    pub fn lookup(&self, jump: &Jump) -> Option<&CodeBlock> {
        self.get(&jump.language, jump.index)
    }

    /// Number of blocks tagged `language`.
    pub fn count(&self, language: &str) -> usize {
        self.by_language
            .get(&language.to_lowercase())
            .map_or(0, Vec::len)
    }

    /// Languages with their block counts, in first-seen order.
    pub fn languages(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_language
            .iter()
            .map(|(lang, blocks)| (lang.as_str(), blocks.len()))
    }

    /// Total number of indexed blocks.
    pub fn len(&self) -> usize {
        self.by_language.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_language.is_empty()
    }

    /// Resolve every jump node of an outline, in document order.
    pub fn resolve<'a>(&'a self, nodes: &'a [OutlineNode]) -> Vec<JumpResolution<'a>> {
        OutlineIter::new(nodes)
            .filter_map(|(_, node)| {
                let jump = node.jump.as_ref()?;
                Some(JumpResolution {
                    key: node.key,
                    title: &node.title,
                    language: &jump.language,
                    index: jump.index,
                    block: self.lookup(jump),
                })
            })
            .collect()
    }
}
