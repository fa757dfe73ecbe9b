use std::cell::RefCell;
use std::collections::VecDeque;

use super::*;

/// A mock provider for testing. Returns pre-configured outcomes in order
/// and records every request it receives.
pub struct MockProvider {
    name: String,
    outcomes: RefCell<VecDeque<Result<ChatResponse, ProviderError>>>,
    requests: RefCell<Vec<Vec<ChatMessage>>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcomes: RefCell::new(VecDeque::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_response(self, response: ChatResponse) -> Self {
        self.outcomes.borrow_mut().push_back(Ok(response));
        self
    }

    /// Queue a plain-text reply.
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.with_response(ChatResponse::text(content))
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        self.outcomes.borrow_mut().push_back(Err(error));
        self
    }

    /// Queue more replies after construction.
    pub fn push_reply(&self, content: impl Into<String>) {
        self.outcomes
            .borrow_mut()
            .push_back(Ok(ChatResponse::text(content)));
    }

    pub fn remaining_responses(&self) -> usize {
        self.outcomes.borrow().len()
    }

    /// Messages of every request received so far.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.borrow().clone()
    }
}

impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn chat(
        &self,
        messages: &[ChatMessage],
        _options: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError> {
        self.requests.borrow_mut().push(messages.to_vec());
        self.outcomes.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(ProviderError::RequestFailed(
                "no mock responses remaining".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_returns_responses_in_order() {
        let provider = MockProvider::new("test").with_reply("First").with_reply("Second");
        let opts = ChatOptions::default();
        let msgs = [ChatMessage::user("test")];

        assert_eq!(provider.chat(&msgs, &opts).unwrap().content, "First");
        assert_eq!(provider.chat(&msgs, &opts).unwrap().content, "Second");
    }

    #[test]
    fn test_mock_provider_empty_returns_error() {
        let provider = MockProvider::new("test");
        let result = provider.chat(&[ChatMessage::user("test")], &ChatOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_mock_provider_remaining_count() {
        let provider = MockProvider::new("test").with_reply("a");
        assert_eq!(provider.remaining_responses(), 1);
        let _ = provider.chat(&[ChatMessage::user("x")], &ChatOptions::default());
        assert_eq!(provider.remaining_responses(), 0);
    }

    #[test]
    fn test_mock_provider_records_requests() {
        let provider = MockProvider::new("test").with_reply("a");
        let _ = provider.chat(
            &[ChatMessage::system("sys"), ChatMessage::user("x")],
            &ChatOptions::default(),
        );
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].role, Role::System);
    }

    #[test]
    fn test_mock_provider_queued_error() {
        let provider = MockProvider::new("test").with_error(ProviderError::Timeout);
        let result = provider.chat(&[ChatMessage::user("x")], &ChatOptions::default());
        assert_eq!(result.unwrap_err(), ProviderError::Timeout);
    }
}
