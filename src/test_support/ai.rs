use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::{json, Value};

use crate::ai::{internal_error, AiHttpTransport, AiResult, PreparedRequest};

/// In-process [`AiHttpTransport`] that answers from a script.
///
/// Responses are consumed in the order requests arrive. A gated response is
/// held back until the matching sender returned by [`ScriptedTransport::push_gated`]
/// fires, which lets tests decide which of several in-flight calls resolves first.
/// An exhausted script answers with an internal error.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

#[derive(Default)]
struct ScriptState {
    responses: VecDeque<Scripted>,
    requests: Vec<PreparedRequest>,
}

struct Scripted {
    response: AiResult<Value>,
    gate: Option<oneshot::Receiver<()>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: AiResult<Value>) {
        self.lock().responses.push_back(Scripted {
            response,
            gate: None,
        });
    }

    pub fn push_text(&self, text: &str) {
        self.push_response(Ok(text_response(text)));
    }

    pub fn push_function_call(&self, name: &str, args: Value) {
        self.push_response(Ok(function_call_response(name, args)));
    }

    pub fn push_gated(&self, response: AiResult<Value>) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.lock().responses.push_back(Scripted {
            response,
            gate: Some(receiver),
        });
        sender
    }

    /// Drains the requests seen so far.
    pub fn take_requests(&self) -> Vec<PreparedRequest> {
        std::mem::take(&mut self.lock().requests)
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

#[async_trait]
impl AiHttpTransport for ScriptedTransport {
    async fn send(&self, request: PreparedRequest) -> AiResult<Value> {
        let next = {
            let mut state = self.lock();
            state.requests.push(request);
            state.responses.pop_front()
        };
        let Some(Scripted { response, gate }) = next else {
            return Err(internal_error("scripted transport has no response left"));
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        response
    }
}

pub fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

pub fn function_call_response(name: &str, args: Value) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"functionCall": {"name": name, "args": args}}]},
            "finishReason": "STOP"
        }]
    })
}
