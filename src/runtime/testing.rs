//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::{start, ChatHandle, SurfaceEvent};
use crate::responder::{Reply, Responder, ResponderError};
use crate::transcript::{Transcript, Turn};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;

// ============================================================================
// Mock Responder
// ============================================================================

/// Mock responder that returns queued replies
pub struct MockResponder {
    replies: Mutex<VecDeque<Result<Reply, ResponderError>>>,
    /// Transcript snapshot passed to every call
    pub requests: Mutex<Vec<Vec<Turn>>>,
}

impl MockResponder {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_reply(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_error(&self, error: ResponderError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, turns: &[Turn]) -> Result<Reply, ResponderError> {
        self.requests.lock().unwrap().push(turns.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ResponderError::network("No mock reply queued")))
    }
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn respond(&self, turns: &[Turn]) -> Result<Reply, ResponderError> {
        self.next_reply(turns)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Delayed Mock Responder (for single-flight testing)
// ============================================================================

/// Mock responder with configurable delay
pub struct DelayedMockResponder {
    inner: MockResponder,
    delay: Duration,
    /// Notified when a call starts
    pub request_started: Arc<Notify>,
}

impl DelayedMockResponder {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockResponder::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: Reply) {
        self.inner.queue_reply(reply);
    }

    pub fn recorded_requests(&self) -> Vec<Vec<Turn>> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl Responder for DelayedMockResponder {
    async fn respond(&self, turns: &[Turn]) -> Result<Reply, ResponderError> {
        self.request_started.notify_waiters();
        tokio::time::sleep(self.delay).await;
        self.inner.next_reply(turns)
    }

    fn name(&self) -> &str {
        "delayed-mock"
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

/// Running session plus a subscription to its surface events
pub struct TestRuntime<R: Responder + ?Sized + 'static> {
    pub handle: ChatHandle,
    pub events: broadcast::Receiver<SurfaceEvent>,
    join: JoinHandle<Transcript>,
    _responder: std::marker::PhantomData<Arc<R>>,
}

impl<R: Responder + ?Sized + 'static> TestRuntime<R> {
    pub fn start(responder: Option<Arc<R>>) -> Self {
        let (handle, join) = start("test-session", responder);
        let events = handle.subscribe();
        Self {
            handle,
            events,
            join,
            _responder: std::marker::PhantomData,
        }
    }

    pub async fn submit(&self, text: &str) {
        self.handle
            .submit(text)
            .await
            .expect("Failed to submit");
    }

    /// Wait for the first surface event matching `pred`
    pub async fn wait_for<F>(&mut self, timeout: Duration, pred: F) -> Option<SurfaceEvent>
    where
        F: Fn(&SurfaceEvent) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.events.recv()).await {
                Ok(Ok(event)) if pred(&event) => return Some(event),
                Ok(Err(broadcast::error::RecvError::Closed)) => return None,
                _ => continue,
            }
        }
        None
    }

    /// Wait for the pending flag to drop
    pub async fn wait_for_idle(&mut self, timeout: Duration) -> bool {
        self.wait_for(timeout, |e| matches!(e, SurfaceEvent::StateChange { pending: false }))
            .await
            .is_some()
    }

    /// Drop the handle and collect the final transcript
    pub async fn finish(self) -> Transcript {
        drop(self.handle);
        self.join.await.expect("Runtime task panicked")
    }
}

impl TestRuntime<MockResponder> {
    pub fn with_mock(mock: MockResponder) -> Self {
        Self::start(Some(Arc::new(mock)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::{EchoResponder, ResponderErrorKind, DEFAULT_ECHO_DELAY};
    use crate::transcript::{Role, EMPTY_RESPONSE_NOTICE, UNAVAILABLE_NOTICE};

    fn roles(transcript: &Transcript) -> Vec<Role> {
        transcript.turns().iter().map(|t| t.role).collect()
    }

    #[tokio::test]
    async fn test_mock_responder() {
        let mock = MockResponder::new();
        mock.queue_reply(Reply::text("Hello"));

        let reply = mock.respond(&[Turn::user("Hi")]).await.unwrap();
        assert_eq!(reply, Reply::text("Hello"));

        // Second call should fail (no more replies)
        assert!(mock.respond(&[]).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    /// Integration test: one full success cycle
    #[tokio::test]
    async fn test_simple_text_response() {
        let mock = MockResponder::new();
        mock.queue_reply(Reply::text("Hello!"));

        let mut rt = TestRuntime::with_mock(mock);
        rt.submit("Hi").await;
        assert!(rt.wait_for_idle(Duration::from_secs(2)).await);

        let transcript = rt.finish().await;
        assert_eq!(roles(&transcript), vec![Role::User, Role::Model]);
        assert_eq!(transcript.turns()[0].content, "Hi");
        assert_eq!(transcript.turns()[1].content, "Hello!");
    }

    #[tokio::test]
    async fn test_user_turn_precedes_outcome() {
        let mock = MockResponder::new();
        mock.queue_reply(Reply::text("reply"));

        let mut rt = TestRuntime::with_mock(mock);
        rt.submit("question").await;

        let mut seen = Vec::new();
        while let Some(event) = rt.wait_for(Duration::from_secs(2), |_| true).await {
            let done = matches!(event, SurfaceEvent::StateChange { pending: false });
            seen.push(event);
            if done {
                break;
            }
        }

        assert!(matches!(
            &seen[0],
            SurfaceEvent::TurnAppended { turn } if turn.role == Role::User && turn.content == "question"
        ));
        assert!(matches!(seen[1], SurfaceEvent::InputCleared));
        assert!(matches!(seen[2], SurfaceEvent::StateChange { pending: true }));
        assert!(matches!(
            &seen[3],
            SurfaceEvent::TurnAppended { turn } if turn.role == Role::Model
        ));
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_responder_sees_full_transcript() {
        let mock = Arc::new(MockResponder::new());
        mock.queue_reply(Reply::text("one"));
        mock.queue_error(ResponderError::network("down"));
        mock.queue_reply(Reply::text("three"));

        let mut rt = TestRuntime::start(Some(mock.clone()));
        for text in ["a", "b", "c"] {
            rt.submit(text).await;
            assert!(rt.wait_for_idle(Duration::from_secs(2)).await);
        }
        let transcript = rt.finish().await;

        let requests = mock.recorded_requests();
        let lens: Vec<_> = requests.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![1, 3, 5]);
        // Each call ends with the user turn that triggered it
        for (request, text) in requests.iter().zip(["a", "b", "c"]) {
            let last = request.last().unwrap();
            assert_eq!(last.role, Role::User);
            assert_eq!(last.content, text);
        }
        assert_eq!(
            roles(&transcript),
            vec![Role::User, Role::Model, Role::User, Role::Error, Role::User, Role::Model]
        );
    }

    #[tokio::test]
    async fn test_each_outcome_appends_one_turn() {
        let mock = MockResponder::new();
        mock.queue_reply(Reply::blocked("HATE_SPEECH"));
        mock.queue_reply(Reply::text(""));
        mock.queue_error(ResponderError::new(
            ResponderErrorKind::ServerError,
            "Server error: overloaded",
        ));

        let mut rt = TestRuntime::with_mock(mock);
        for text in ["one", "two", "three"] {
            rt.submit(text).await;
            assert!(rt.wait_for_idle(Duration::from_secs(2)).await);
        }
        let transcript = rt.finish().await;

        assert_eq!(transcript.len(), 6);
        let errors: Vec<_> = transcript
            .turns()
            .iter()
            .filter(|t| t.role == Role::Error)
            .map(|t| t.content.as_str())
            .collect();
        assert!(errors[0].contains("HATE_SPEECH"));
        assert_eq!(errors[1], EMPTY_RESPONSE_NOTICE);
        assert!(errors[2].contains("overloaded"));
    }

    #[tokio::test]
    async fn test_blank_submit_is_ignored() {
        let mock = MockResponder::new();
        mock.queue_reply(Reply::text("ok"));

        let mut rt = TestRuntime::with_mock(mock);
        rt.submit("   ").await;
        rt.submit("real").await;
        assert!(rt.wait_for_idle(Duration::from_secs(2)).await);

        let transcript = rt.finish().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.turns()[0].content, "real");
    }

    #[tokio::test]
    async fn test_submit_rejected_while_pending() {
        let responder = Arc::new(DelayedMockResponder::new(Duration::from_millis(200)));
        responder.queue_reply(Reply::text("slow answer"));
        responder.queue_reply(Reply::text("never used"));

        let mut rt = TestRuntime::start(Some(responder.clone()));
        rt.submit("first").await;
        assert!(rt
            .wait_for(Duration::from_secs(2), |e| matches!(
                e,
                SurfaceEvent::StateChange { pending: true }
            ))
            .await
            .is_some());

        rt.submit("second").await;
        assert!(rt
            .wait_for(Duration::from_secs(2), |e| matches!(e, SurfaceEvent::Rejected { .. }))
            .await
            .is_some());

        assert!(rt.wait_for_idle(Duration::from_secs(2)).await);
        let transcript = rt.finish().await;

        assert_eq!(roles(&transcript), vec![Role::User, Role::Model]);
        assert_eq!(transcript.turns()[0].content, "first");
        assert_eq!(responder.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_responder_alerts() {
        let mut rt: TestRuntime<MockResponder> = TestRuntime::start(None);
        rt.submit("hello").await;

        let event = rt
            .wait_for(Duration::from_secs(2), |e| matches!(e, SurfaceEvent::Alert { .. }))
            .await;
        assert!(matches!(
            event,
            Some(SurfaceEvent::Alert { ref message }) if message == UNAVAILABLE_NOTICE
        ));

        let transcript = rt.finish().await;
        assert!(transcript.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_echo_replies_within_delay_window() {
        let mut rt = TestRuntime::start(Some(Arc::new(EchoResponder::default())));

        let start = tokio::time::Instant::now();
        rt.submit("hi").await;
        assert!(rt.wait_for_idle(Duration::from_secs(5)).await);
        let elapsed = start.elapsed();

        assert!(elapsed >= DEFAULT_ECHO_DELAY);
        assert!(elapsed <= DEFAULT_ECHO_DELAY + Duration::from_millis(100));

        let transcript = rt.finish().await;
        assert_eq!(roles(&transcript), vec![Role::User, Role::Model]);
        assert_eq!(transcript.turns()[1].content, "\"hi\" 라고 하셨군요!");
    }

    #[tokio::test]
    async fn test_in_flight_reply_lands_after_handles_dropped() {
        let responder = Arc::new(DelayedMockResponder::new(Duration::from_millis(100)));
        responder.queue_reply(Reply::text("answer"));
        let started = responder.request_started.clone();

        let rt = TestRuntime::start(Some(responder.clone()));
        let notified = started.notified();
        rt.submit("bye").await;
        notified.await;

        // Every handle goes away while the call is in flight; the runtime
        // stays up until the outcome is recorded.
        let transcript = rt.finish().await;

        assert_eq!(roles(&transcript), vec![Role::User, Role::Model]);
        assert_eq!(transcript.turns()[1].content, "answer");
        assert_eq!(responder.recorded_requests().len(), 1);
    }
}
