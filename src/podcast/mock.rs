//! Scripted studio backend for tests.

use crate::client::{ChatOptions, Message};
use crate::models::ProviderError;
use crate::podcast::StudioBackend;
use async_trait::async_trait;
use std::sync::Mutex;

pub struct MockStudio {
    reply: String,
    fail_chat: bool,
    fail_speech: bool,
    chat_prompts: Mutex<Vec<String>>,
    speech_voices: Mutex<Vec<String>>,
}

impl MockStudio {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_chat: false,
            fail_speech: false,
            chat_prompts: Mutex::new(Vec::new()),
            speech_voices: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_chat() -> Self {
        Self {
            fail_chat: true,
            ..Self::new("")
        }
    }

    pub fn failing_speech(reply: &str) -> Self {
        Self {
            fail_speech: true,
            ..Self::new(reply)
        }
    }

    /// User prompts received by `chat`.
    pub fn chat_prompts(&self) -> Vec<String> {
        self.chat_prompts.lock().unwrap().clone()
    }

    pub fn speech_voices(&self) -> Vec<String> {
        self.speech_voices.lock().unwrap().clone()
    }
}

#[async_trait]
impl StudioBackend for MockStudio {
    async fn chat(
        &self,
        _model: &str,
        messages: &[Message],
        _options: ChatOptions,
    ) -> Result<String, ProviderError> {
        if let Some(user) = messages.iter().find(|m| m.role == "user") {
            self.chat_prompts.lock().unwrap().push(user.content.clone());
        }
        if self.fail_chat {
            return Err(ProviderError::Unavailable("chat is down".to_string()));
        }
        Ok(self.reply.clone())
    }

    async fn speech(
        &self,
        _model: &str,
        voice: &str,
        _input: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        self.speech_voices.lock().unwrap().push(voice.to_string());
        if self.fail_speech {
            return Err(ProviderError::Unavailable("speech is down".to_string()));
        }
        Ok(b"ID3fake".to_vec())
    }
}
