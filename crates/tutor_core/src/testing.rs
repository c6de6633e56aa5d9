//! Scripted generation service used by the unit tests in this crate.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::ports::{GenerationReply, GenerationRequest, GenerationService, PortError, PortResult};

/// Replays queued replies in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<PortResult<GenerationReply>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<PortResult<GenerationReply>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> PortResult<GenerationReply> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unexpected("no scripted reply left".to_string())))
    }
}
