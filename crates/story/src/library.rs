//! Stories available for reading: the bundled ones and any `.txt` files in a
//! library directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use jiff::Timestamp;

/// A readable story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    title: String,
    content: String,
    created_at: Timestamp,
}

impl Story {
    pub fn new(title: impl Into<String>, content: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            created_at,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Parse a story file: the first line is the title, the rest is the content.
    /// Returns `None` for files with fewer than two lines.
    pub fn parse(text: &str, created_at: Timestamp) -> Option<Self> {
        let (title, content) = text.split_once('\n')?;
        let title = title.trim_end_matches('\r');

        Some(Self::new(title, content, created_at))
    }
}

const BUILTIN: &[(&str, &str)] = &[
    ("The Adventure Begins", "Once upon a time..."),
    ("The Magical Forest", "In a mysterious forest..."),
    ("The Enchanted Castle", "Deep inside the castle..."),
];

/// An ordered collection of stories.
#[derive(Debug, Clone, Default)]
pub struct Library {
    stories: Vec<Story>,
}

impl Library {
    /// The stories that ship with the application.
    pub fn builtin() -> Self {
        let now = Timestamp::now();

        Self {
            stories: BUILTIN
                .iter()
                .map(|(title, content)| Story::new(*title, *content, now))
                .collect(),
        }
    }

    /// Every `*.txt` file in `dir`, in file name order.
    ///
    /// Unreadable files and files without content are skipped with a warning.
    /// Only a missing or unreadable directory is an error.
    pub fn load_dir(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .collect();

        paths.sort();

        let mut stories = Vec::with_capacity(paths.len());

        for path in paths {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Error reading {}: {e}", path.display());
                    continue;
                }
            };

            let created_at = fs::metadata(&path)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| Timestamp::try_from(modified).ok())
                .unwrap_or_else(Timestamp::now);

            match Story::parse(&text, created_at) {
                Some(story) => stories.push(story),
                None => log::warn!("Skipping {}: a story needs a title line and content", path.display()),
            }
        }

        log::debug!("Loaded {} stories from {}", stories.len(), dir.display());

        Ok(Self { stories })
    }

    /// Append stories after the existing ones.
    pub fn extend(&mut self, stories: impl IntoIterator<Item = Story>) {
        self.stories.extend(stories);
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// First story whose title matches, ignoring case.
    pub fn find(&self, title: &str) -> Option<&Story> {
        let title = title.trim();

        self.stories.iter().find(|story| story.title.eq_ignore_ascii_case(title))
    }
}
