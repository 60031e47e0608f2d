use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use textlens::{
    Error, Result,
    gateway::{Inference, Task},
};

/// Canned reply for the mock gateway. `Error` is not `Clone`, so replies are
/// described here and turned into errors per call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Upstream(u16, Value),
    Malformed(String),
    Timeout,
}

/// Mock inference gateway for testing
#[derive(Debug, Clone)]
pub struct MockInference {
    pub reply: MockReply,
    pub calls: Arc<Mutex<Vec<(Task, String)>>>,
}

impl MockInference {
    pub fn new() -> Self {
        Self::with_reply(MockReply::Text("mock output".to_string()))
    }

    pub fn with_reply(reply: MockReply) -> Self {
        Self {
            reply,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_calls(&self) -> Vec<(Task, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockInference {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Inference for MockInference {
    async fn infer(&self, task: Task, text: &str) -> Result<String> {
        self.calls.lock().unwrap().push((task, text.to_string()));

        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Upstream(status, body) => Err(Error::Upstream {
                status: *status,
                body: body.clone(),
            }),
            MockReply::Malformed(msg) => Err(Error::malformed(msg.clone())),
            MockReply::Timeout => Err(Error::Timeout(Duration::from_secs(30))),
        }
    }
}
