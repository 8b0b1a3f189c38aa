//! The model behind the "create a story" screen.
//!
//! State is plain owned data. Every change is pushed to the subscribed
//! listeners. A generation runs on a tokio task and reports back through a
//! weak reference guarded by a cancellation token, so a dismissed or dropped
//! composer turns a late reply into a no-op.

use std::{
    borrow::Cow,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    error::GenerationError,
    favorites::FavoriteStory,
    generator::{Generation, StoryGenerator},
    messages::ChatMessage,
};

/// What a finished generation shows the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryOutcome {
    Story(String),
    NoStory,
    Failed(String),
}

impl StoryOutcome {
    pub fn display_text(&self) -> Cow<'_, str> {
        match self {
            StoryOutcome::Story(story) => Cow::Borrowed(story),
            StoryOutcome::NoStory => Cow::Borrowed("No story generated."),
            StoryOutcome::Failed(message) => Cow::Owned(format!("Error generating story: {message}")),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StoryOutcome::Failed(_))
    }
}

impl From<Result<Generation, GenerationError>> for StoryOutcome {
    fn from(result: Result<Generation, GenerationError>) -> Self {
        match result {
            Ok(Generation::Story(story)) if !story.trim().is_empty() => StoryOutcome::Story(story),
            Ok(_) => StoryOutcome::NoStory,
            Err(error) => StoryOutcome::Failed(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    Finished(StoryOutcome),
}

/// Snapshot of the screen state handed to listeners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposerState {
    pub prompt: String,
    pub phase: Phase,
}

impl ComposerState {
    /// The generated story, if the last generation produced one.
    pub fn story(&self) -> Option<&str> {
        match &self.phase {
            Phase::Finished(StoryOutcome::Story(story)) => Some(story),
            _ => None,
        }
    }
}

type Listener = Arc<dyn Fn(&ComposerState) + Send + Sync>;

#[derive(Default)]
struct Shared {
    state: Mutex<ComposerState>,
    listeners: Mutex<Vec<Listener>>,
}

impl Shared {
    fn update(&self, change: impl FnOnce(&mut ComposerState)) {
        let snapshot = {
            let mut state = lock(&self.state);
            change(&mut state);
            state.clone()
        };

        self.notify(&snapshot);
    }

    /// Runs with no lock held, so listeners may call back into the composer.
    fn notify(&self, snapshot: &ComposerState) {
        let listeners = lock(&self.listeners).clone();

        for listener in listeners {
            listener(snapshot);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct StoryComposer {
    generator: Arc<dyn StoryGenerator>,
    prompt_prefix: Option<String>,
    shared: Arc<Shared>,
    cancellation: CancellationToken,
}

impl StoryComposer {
    pub fn new(generator: Arc<dyn StoryGenerator>) -> Self {
        Self {
            generator,
            prompt_prefix: None,
            shared: Arc::default(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Sentence the user prompt completes, e.g. "Can you generate a children story about".
    pub fn with_prompt_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prompt_prefix = Some(prefix.into());
        self
    }

    pub fn subscribe(&self, listener: impl Fn(&ComposerState) + Send + Sync + 'static) {
        lock(&self.shared.listeners).push(Arc::new(listener));
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.shared.update(|state| state.prompt = prompt);
    }

    pub fn state(&self) -> ComposerState {
        lock(&self.shared.state).clone()
    }

    /// The text sent to the model for the current prompt.
    pub fn message_text(&self) -> String {
        self.compose(&lock(&self.shared.state).prompt)
    }

    fn compose(&self, prompt: &str) -> String {
        let prompt = prompt.trim();

        match &self.prompt_prefix {
            Some(prefix) => format!("{prefix} {prompt}"),
            None => prompt.to_string(),
        }
    }

    /// Start generating a story for the current prompt.
    ///
    /// Returns `None` without sending anything when the prompt is blank, a
    /// generation is already running, or the composer was dismissed.
    pub fn generate(&self) -> Option<JoinHandle<()>> {
        if self.cancellation.is_cancelled() {
            log::debug!("Composer dismissed, ignoring generate request");
            return None;
        }

        // Check and claim under one lock so concurrent callers start at most one request.
        let (snapshot, messages) = {
            let mut state = lock(&self.shared.state);

            if state.prompt.trim().is_empty() {
                log::debug!("Empty prompt, nothing to generate");
                return None;
            }

            if state.phase == Phase::Generating {
                log::debug!("A story is already being generated");
                return None;
            }

            state.phase = Phase::Generating;

            (state.clone(), vec![ChatMessage::user(self.compose(&state.prompt))])
        };

        self.shared.notify(&snapshot);

        let generator = Arc::clone(&self.generator);
        let shared = Arc::downgrade(&self.shared);
        let token = self.cancellation.clone();

        Some(tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => {
                    log::debug!("Composer dismissed while generating, dropping the request");
                    return;
                }
                result = generator.generate_story(&messages) => result,
            };

            deliver(&shared, &token, StoryOutcome::from(result));
        }))
    }

    /// The current story as a new favorite, if there is one.
    pub fn favorite(&self) -> Option<FavoriteStory> {
        self.state().story().map(FavoriteStory::new)
    }

    /// The screen went away. Pending and future generations become no-ops.
    pub fn dismiss(&self) {
        self.cancellation.cancel();
    }
}

impl Drop for StoryComposer {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

fn deliver(shared: &Weak<Shared>, token: &CancellationToken, outcome: StoryOutcome) {
    if token.is_cancelled() {
        return;
    }

    let Some(shared) = shared.upgrade() else {
        return;
    };

    if let StoryOutcome::Failed(message) = &outcome {
        log::warn!("Story generation failed: {message}");
    }

    shared.update(|state| state.phase = Phase::Finished(outcome));
}
