//! Scripted `CompletionClient` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use emberfall_ai::{CompletionClient, CompletionRequest};
use emberfall_core::error::EngineError;

/// A completion client that replays a scripted sequence of responses and
/// records every request it receives. Panics if the script is exhausted.
#[derive(Debug)]
pub struct ScriptedCompletions {
    script: Mutex<Vec<Result<String, EngineError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletions {
    /// Creates a client replaying `script` front to back.
    #[must_use]
    pub fn new(script: Vec<Result<String, EngineError>>) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Convenience constructor for an all-success script.
    #[must_use]
    pub fn replying(responses: Vec<&str>) -> Self {
        Self::new(responses.into_iter().map(|r| Ok(r.to_owned())).collect())
    }

    /// Number of requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Snapshot of the user prompts received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn user_prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.user.clone())
            .collect()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletions {
    async fn complete(&self, request: CompletionRequest) -> Result<String, EngineError> {
        self.requests.lock().unwrap().push(request);
        let mut script = self.script.lock().unwrap();
        assert!(!script.is_empty(), "ScriptedCompletions script exhausted");
        script.remove(0)
    }
}

/// A completion client that always fails with a transport error.
#[derive(Debug, Default)]
pub struct FailingCompletions;

#[async_trait]
impl CompletionClient for FailingCompletions {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, EngineError> {
        Err(EngineError::Transport("request timed out".to_owned()))
    }
}
