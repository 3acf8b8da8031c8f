//! End-to-end tests for the secure chat core
//!
//! This suite covers:
//! - Identity creation and password-gated unlock
//! - Session key agreement between two users
//! - Message round-trips through the storage collaborator
//! - Error handling (wrong password, keyless peer, tampered rows)

use async_trait::async_trait;
use crewchat_core::storage::models::{Conversation, EncryptedMessage, StoredIdentity};
use crewchat_core::{
    ChatError, ChatStore, ConversationSession, MemoryStore, MessageBody, SessionState,
};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

const PW_A: &str = "pw-alice-1";
const PW_B: &str = "pw-bob-22";

/// First contact with a keyless peer still establishes the caller's own
/// identity; used to bootstrap users in order
async fn bootstrap_identity(store: &Arc<MemoryStore>, user: &str, peer: &str, password: &str) {
    let mut session = ConversationSession::new(store.clone(), user, peer);
    match session.init(password).await {
        Ok(()) | Err(ChatError::PeerKeyless(_)) => {}
        Err(e) => panic!("unexpected init error: {}", e),
    }
}

async fn ready_session(
    store: &Arc<MemoryStore>,
    user: &str,
    peer: &str,
    password: &str,
) -> ConversationSession<MemoryStore> {
    let mut session = ConversationSession::new(store.clone(), user, peer);
    session.init(password).await.expect("init should succeed");
    session
}

/// Test the full two-user scenario: both establish identities and exchange
/// a message through the store
#[tokio::test]
async fn test_two_user_message_exchange() {
    let store = Arc::new(MemoryStore::new());

    // Alice opens the chat first: her identity is created, but Bob has
    // no key yet, so the session reports that instead of going Ready
    let mut alice = ConversationSession::new(store.clone(), "alice", "bob");
    let err = alice.init(PW_A).await.unwrap_err();
    assert!(matches!(err, ChatError::PeerKeyless(ref id) if id == "bob"));
    assert!(store.get_identity("alice").await.unwrap().is_some());

    // Bob acts: now both sides can initialize
    let _bob = ready_session(&store, "bob", "alice", PW_B).await;
    alice.init(PW_A).await.unwrap();
    assert_eq!(alice.state(), SessionState::Ready);

    let sent = alice.send_message("hello").await.unwrap().unwrap();
    assert_eq!(sent.body, MessageBody::Plaintext("hello".to_string()));

    // Bob re-initializes and reads the history decrypted with his own key
    let bob = ready_session(&store, "bob", "alice", PW_B).await;
    assert_eq!(bob.messages().len(), 1);
    assert_eq!(bob.messages()[0].sender_id, "alice");
    assert_eq!(bob.messages()[0].body, MessageBody::Plaintext("hello".to_string()));
}

/// Test that messaging a user who never set up secure chat surfaces
/// PeerKeyless instead of creating an identity on their behalf
#[tokio::test]
async fn test_peer_without_identity_is_reported() {
    let store = Arc::new(MemoryStore::new());

    let mut alice = ConversationSession::new(store.clone(), "alice", "carol");
    let err = alice.init(PW_A).await.unwrap_err();

    assert!(matches!(err, ChatError::PeerKeyless(ref id) if id == "carol"));
    assert_eq!(alice.state(), SessionState::Failed);
    assert!(alice.last_error().is_some());

    // No identity record may appear for carol as a side effect
    assert!(store.get_identity("carol").await.unwrap().is_none());
}

/// Test that the wrong password fails init with Authentication and that
/// a retry with the right password recovers the session
#[tokio::test]
async fn test_wrong_password_then_retry() {
    let store = Arc::new(MemoryStore::new());
    bootstrap_identity(&store, "bob", "alice", PW_B).await;
    let _alice = ready_session(&store, "alice", "bob", PW_A).await;

    let mut again = ConversationSession::new(store.clone(), "alice", "bob");
    let err = again.init("totally-wrong-9").await.unwrap_err();
    assert!(matches!(err, ChatError::Authentication(_)));
    assert_eq!(again.state(), SessionState::Failed);

    // Retry from Failed with the correct password
    again.init(PW_A).await.unwrap();
    assert_eq!(again.state(), SessionState::Ready);
}

/// Test that a weak password is rejected when creating a new identity
#[tokio::test]
async fn test_weak_password_rejected_on_first_use() {
    let store = Arc::new(MemoryStore::new());

    let mut session = ConversationSession::new(store.clone(), "alice", "bob");
    let err = session.init("short").await.unwrap_err();
    assert!(matches!(err, ChatError::Validation(_)));
    assert!(store.get_identity("alice").await.unwrap().is_none());
}

/// Test that tampering with one stored row only marks that row as failed
/// while adjacent messages stay readable
#[tokio::test]
async fn test_tampered_row_does_not_block_history() {
    let store = Arc::new(MemoryStore::new());
    bootstrap_identity(&store, "bob", "alice", PW_B).await;
    let mut alice = ready_session(&store, "alice", "bob", PW_A).await;

    alice.send_message("first").await.unwrap();
    alice.send_message("second").await.unwrap();

    let bob = ready_session(&store, "bob", "alice", PW_B).await;
    let conversation_id = bob.conversation().unwrap().id.clone();
    let rows = store.list_messages(&conversation_id, 200).await.unwrap();
    assert_eq!(rows.len(), 2);

    // Flip one byte of the first row's ciphertext
    let mut bytes = b64_decode(&rows[0].ciphertext);
    bytes[0] ^= 0x01;
    let tampered = EncryptedMessage {
        ciphertext: b64_encode(&bytes),
        ..rows[0].clone()
    };

    assert_eq!(bob.decrypt_row(&tampered).body, MessageBody::DecryptionFailed);
    assert_eq!(
        bob.decrypt_row(&rows[1]).body,
        MessageBody::Plaintext("second".to_string())
    );
}

/// Test that empty messages and non-ready sessions are send no-ops
#[tokio::test]
async fn test_send_noop_cases() {
    let store = Arc::new(MemoryStore::new());

    let mut uninitialized = ConversationSession::new(store.clone(), "alice", "bob");
    assert!(uninitialized.send_message("hi").await.unwrap().is_none());

    bootstrap_identity(&store, "bob", "alice", PW_B).await;
    let mut alice = ready_session(&store, "alice", "bob", PW_A).await;
    assert!(alice.send_message("").await.unwrap().is_none());
    assert_eq!(alice.messages().len(), 0);
}

/// Test that the local view keeps messages in send order
#[tokio::test]
async fn test_messages_keep_send_order() {
    let store = Arc::new(MemoryStore::new());
    bootstrap_identity(&store, "bob", "alice", PW_B).await;
    let mut alice = ready_session(&store, "alice", "bob", PW_A).await;

    for text in ["one", "two", "three"] {
        alice.send_message(text).await.unwrap();
    }

    let bodies: Vec<_> = alice.messages().iter().map(|m| m.body.clone()).collect();
    assert_eq!(
        bodies,
        vec![
            MessageBody::Plaintext("one".to_string()),
            MessageBody::Plaintext("two".to_string()),
            MessageBody::Plaintext("three".to_string()),
        ]
    );
}

/// Хранилище, «зависающее» на одном вызове get_identity — имитация
/// медленного бэкенда, на котором вызывающий компонент успевает умереть
struct StallingStore {
    inner: MemoryStore,
    stall_next: AtomicBool,
}

impl StallingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            stall_next: AtomicBool::new(false),
        }
    }

    fn stall_next_get_identity(&self) {
        self.stall_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatStore for StallingStore {
    async fn get_identity(
        &self,
        user_id: &str,
    ) -> crewchat_core::Result<Option<StoredIdentity>> {
        if self.stall_next.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.get_identity(user_id).await
    }

    async fn put_identity(&self, identity: StoredIdentity) -> crewchat_core::Result<()> {
        self.inner.put_identity(identity).await
    }

    async fn get_or_create_conversation(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> crewchat_core::Result<Conversation> {
        self.inner.get_or_create_conversation(user_a, user_b).await
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> crewchat_core::Result<Vec<EncryptedMessage>> {
        self.inner.list_messages(conversation_id, limit).await
    }

    async fn append_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        iv: String,
        ciphertext: String,
    ) -> crewchat_core::Result<EncryptedMessage> {
        self.inner
            .append_message(conversation_id, sender_id, iv, ciphertext)
            .await
    }
}

fn noop_waker() -> Waker {
    fn clone(_: *const ()) -> RawWaker {
        RawWaker::new(std::ptr::null(), &VTABLE)
    }
    fn noop(_: *const ()) {}
    static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
    unsafe { Waker::from_raw(RawWaker::new(std::ptr::null(), &VTABLE)) }
}

/// Test that an init() future abandoned mid-await (component teardown)
/// leaves the session retryable instead of wedged
#[tokio::test]
async fn test_abandoned_init_leaves_session_retryable() {
    let store = Arc::new(StallingStore::new());

    // Обе identity создаются заранее, пока хранилище отвечает
    {
        let mut bob = ConversationSession::new(store.clone(), "bob", "alice");
        match bob.init(PW_B).await {
            Ok(()) | Err(ChatError::PeerKeyless(_)) => {}
            Err(e) => panic!("unexpected init error: {}", e),
        }
        let mut alice = ConversationSession::new(store.clone(), "alice", "bob");
        alice.init(PW_A).await.unwrap();
    }

    let mut session = ConversationSession::new(store.clone(), "alice", "bob");

    // Первый init повисает на хранилище и бросается недовыполненным
    store.stall_next_get_identity();
    {
        let mut fut = Box::pin(session.init(PW_A));
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(matches!(fut.as_mut().poll(&mut cx), Poll::Pending));
        // future дропается здесь, не дойдя до конца
    }

    // Повторный init должен пройти как обычно
    session.init(PW_A).await.unwrap();
    assert_eq!(session.state(), SessionState::Ready);
}

/// Test that both participants resolve the same conversation record
#[tokio::test]
async fn test_conversation_is_canonical_for_both_sides() {
    let store = Arc::new(MemoryStore::new());
    bootstrap_identity(&store, "bob", "alice", PW_B).await;
    let alice = ready_session(&store, "alice", "bob", PW_A).await;
    let bob = ready_session(&store, "bob", "alice", PW_B).await;

    assert_eq!(
        alice.conversation().unwrap().id,
        bob.conversation().unwrap().id
    );
}

fn b64_decode(text: &str) -> Vec<u8> {
    crewchat_core::utils::b64::decode(text).unwrap()
}

fn b64_encode(bytes: &[u8]) -> String {
    crewchat_core::utils::b64::encode(bytes)
}
