//! Oracle stubs shared by unit tests

use crate::error::OracleError;
use crate::oracle::{GenerationParams, TextGenerator};
use std::collections::VecDeque;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&str) -> Result<String, OracleError> + Send + Sync>;

/// Replays scripted responses and records every call
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, OracleError>>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<(String, GenerationParams)>>,
}

impl std::fmt::Debug for ScriptedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedGenerator").finish()
    }
}

impl ScriptedGenerator {
    /// Responses in order; once exhausted every call fails with `EmptyResponse`
    pub fn new(script: Vec<Result<String, OracleError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Same output for every call
    pub fn repeating(output: &str) -> Self {
        let output = output.to_string();
        Self::responding(move |_| Ok(output.clone()))
    }

    /// Output computed from the prompt
    pub fn responding<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, OracleError> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(responder)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, GenerationParams)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, OracleError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), *params));

        if let Some(responder) = &self.responder {
            return responder(prompt);
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(OracleError::EmptyResponse))
    }
}
