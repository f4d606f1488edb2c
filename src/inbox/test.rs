use super::*;
use crate::ap::{Actor, Freshness};
use crate::dereference::Dereferencer;
use crate::mock::{self, Canned, MockTransport, REMOTE_ACTOR};
use crate::store::{self, MemoryStore};
use crate::transport::Transport;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

const INBOX: &str = "/users/bob/inbox";

#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

#[async_trait]
impl Processor for Recorder {
    async fn apply(&self, ctx: InboxContext, _cancel: CancellationToken) -> store::Result<()> {
        self.0.lock().expect("in test").push(ctx.activity.id);
        Ok(())
    }
}

impl Recorder {
    fn applied(&self) -> Vec<String> {
        self.0.lock().expect("in test").clone()
    }
}

struct Setup {
    federator: Federator,
    store: Arc<MemoryStore>,
    transport: Arc<MockTransport>,
    pool: Arc<WorkerPool>,
    recorder: Arc<Recorder>,
}

fn setup(store: MemoryStore, transport: MockTransport) -> Setup {
    let store = Arc::new(store);
    let transport = Arc::new(transport);
    let pool = Arc::new(WorkerPool::new(2, 8));
    let recorder = Arc::new(Recorder::default());
    let dereferencer = Dereferencer::new(store.clone(), transport.clone() as Arc<dyn Transport>);
    let authenticator =
        Authenticator::new(store.clone(), dereferencer, Duration::from_secs(300));
    let federator = Federator::new(store.clone(), authenticator, pool.clone(), recorder.clone());
    assert!(pool.start());
    Setup {
        federator,
        store,
        transport,
        pool,
        recorder,
    }
}

fn follow(actor: &str) -> Activity {
    serde_json::from_value(json!({
        "@context": "https://www.w3.org/ns/activitystreams",
        "id": format!("{}/follows/1", actor),
        "type": "Follow",
        "actor": actor,
        "object": format!("{}/users/bob", mock::LOCAL),
    }))
    .expect("in test")
}

fn body(activity: &Activity) -> Vec<u8> {
    serde_json::to_vec(activity).expect("in test")
}

async fn deliver(setup: &Setup, request: &InboundRequest) -> Result<(InboxContext, bool), Error> {
    let activity = serde_json::from_slice(&request.body).expect("in test");
    let ctx = setup
        .federator
        .handle_inbound_body(request, "bob", activity)
        .await?;
    setup.federator.authenticate(ctx, request).await
}

#[tokio::test]
async fn inbound_body_binds_the_receiving_account() -> TestResult {
    let setup = setup(mock::store(), MockTransport::default());
    let activity = follow(REMOTE_ACTOR);
    let request = mock::signed_post(&mock::remote_key(), INBOX, &body(&activity));

    let ctx = setup
        .federator
        .handle_inbound_body(&request, "bob", activity.clone())
        .await?;
    assert_eq!(ctx.receiving_account.username, "bob");
    assert_eq!(ctx.activity, activity);
    assert!(!ctx.is_authenticated());
    assert_eq!(setup.transport.calls(), 0);

    let unknown = setup
        .federator
        .handle_inbound_body(&request, "nobody", activity)
        .await;
    assert!(matches!(unknown, Err(Error::UnknownAccount(name)) if name == "nobody"));
    Ok(())
}

#[tokio::test]
async fn valid_signature_from_unknown_actor_is_accepted() -> TestResult {
    let setup = setup(mock::store(), MockTransport::serving_alice());
    let activity = follow(REMOTE_ACTOR);
    let request = mock::signed_post(&mock::remote_key(), INBOX, &body(&activity));

    let (ctx, authenticated) = deliver(&setup, &request).await?;
    assert!(authenticated);
    assert_eq!(
        ctx.requesting_actor.as_ref().map(|actor| actor.uri.as_str()),
        Some(REMOTE_ACTOR)
    );
    assert!(ctx.signature.is_some());
    assert_eq!(setup.transport.calls(), 1);
    assert!(setup.store.actor(REMOTE_ACTOR).await?.is_some());

    // The second delivery is verified from the store
    deliver(&setup, &request).await?;
    assert_eq!(setup.transport.calls(), 1);

    assert!(setup.pool.stop().await);
    assert_eq!(setup.recorder.applied(), vec![activity.id.clone(), activity.id]);
    Ok(())
}

#[tokio::test]
async fn wrong_signature_is_rejected_without_error() -> TestResult {
    let setup = setup(mock::store(), MockTransport::serving_alice());
    let activity = follow(REMOTE_ACTOR);
    let request = mock::signed_post(&mock::other_key(), INBOX, &body(&activity));

    let (ctx, authenticated) = deliver(&setup, &request).await?;
    assert!(!authenticated);
    assert!(ctx.requesting_actor.is_none());

    assert!(setup.pool.stop().await);
    assert!(setup.recorder.applied().is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_headers_are_errors() {
    let setup = setup(mock::store(), MockTransport::serving_alice());
    let activity = follow(REMOTE_ACTOR);
    let signed = mock::signed_post(&mock::remote_key(), INBOX, &body(&activity));

    for (header, expected) in &[("signature", "signature"), ("date", "date"), ("digest", "digest")] {
        let mut request = signed.clone();
        request.headers.remove(*header);
        match deliver(&setup, &request).await {
            Err(Error::MissingHeader(name)) => assert_eq!(&name, expected),
            other => panic!("without {}: {:?}", header, other.map(|(_, ok)| ok)),
        }
    }
    assert_eq!(setup.transport.calls(), 0);
}

#[tokio::test]
async fn authorization_header_carries_the_signature() -> TestResult {
    let setup = setup(mock::store(), MockTransport::serving_alice());
    let activity = follow(REMOTE_ACTOR);
    let mut request = mock::signed_post(&mock::remote_key(), INBOX, &body(&activity));
    let value = request.headers.remove("signature").expect("in test");
    let value = format!("Signature {}", value.to_str()?);
    request.headers.insert("authorization", value.parse()?);

    let (_, authenticated) = deliver(&setup, &request).await?;
    assert!(authenticated);
    Ok(())
}

#[tokio::test]
async fn unreachable_signer_is_a_transient_error() {
    let setup = setup(
        mock::store(),
        MockTransport::default().with(REMOTE_ACTOR, Canned::Timeout),
    );
    let activity = follow(REMOTE_ACTOR);
    let request = mock::signed_post(&mock::remote_key(), INBOX, &body(&activity));

    match deliver(&setup, &request).await {
        Err(Error::Dereference(e)) => assert!(e.is_transient()),
        other => panic!("expected a transient error, got {:?}", other.map(|(_, ok)| ok)),
    }
}

#[tokio::test]
async fn vanished_signer_is_rejected() -> TestResult {
    let setup = setup(
        mock::store(),
        MockTransport::default().with(REMOTE_ACTOR, Canned::Respond(410, Vec::new())),
    );
    let activity = follow(REMOTE_ACTOR);
    let request = mock::signed_post(&mock::remote_key(), INBOX, &body(&activity));

    let (_, authenticated) = deliver(&setup, &request).await?;
    assert!(!authenticated);
    Ok(())
}

#[tokio::test]
async fn signer_must_be_the_activity_actor() -> TestResult {
    let setup = setup(mock::store(), MockTransport::serving_alice());
    let activity = follow("https://remote.example/users/mallory");
    let request = mock::signed_post(&mock::remote_key(), INBOX, &body(&activity));

    let (_, authenticated) = deliver(&setup, &request).await?;
    assert!(!authenticated);
    Ok(())
}

#[tokio::test]
async fn old_and_future_dates_are_rejected() -> TestResult {
    let setup = setup(mock::store(), MockTransport::serving_alice());
    let activity = follow(REMOTE_ACTOR);
    for offset in &[-ChronoDuration::hours(1), ChronoDuration::hours(1)] {
        let date = Utc::now() + *offset;
        let request = mock::signed_post_at(&mock::remote_key(), INBOX, &body(&activity), date);
        let (_, authenticated) = deliver(&setup, &request).await?;
        assert!(!authenticated);
    }
    Ok(())
}

#[tokio::test]
async fn tampered_body_is_rejected() -> TestResult {
    let setup = setup(mock::store(), MockTransport::serving_alice());
    let activity = follow(REMOTE_ACTOR);
    let mut request = mock::signed_post(&mock::remote_key(), INBOX, &body(&activity));
    let mut tampered = activity;
    tampered.id = format!("{}/follows/2", REMOTE_ACTOR);
    request.body = body(&tampered).into();

    let (_, authenticated) = deliver(&setup, &request).await?;
    assert!(!authenticated);
    Ok(())
}

#[tokio::test]
async fn rotated_key_is_picked_up_by_refetching() -> TestResult {
    let store = mock::store();
    let stale = Actor {
        public_key: crate::ap::PublicKey {
            public_key_pem: mock::other_key().public_key_pem()?,
            ..mock::remote_actor().public_key
        },
        freshness: Freshness::CachedRemote {
            fetched_at: Utc::now() - ChronoDuration::days(30),
        },
        ..mock::remote_actor()
    };
    store.put_actor(stale).await?;
    let setup = setup(store, MockTransport::serving_alice());
    let activity = follow(REMOTE_ACTOR);
    let request = mock::signed_post(&mock::remote_key(), INBOX, &body(&activity));

    let (_, authenticated) = deliver(&setup, &request).await?;
    assert!(authenticated);
    assert_eq!(setup.transport.calls(), 1);
    let cached = setup.store.actor(REMOTE_ACTOR).await?.expect("in test");
    assert_eq!(
        cached.public_key.public_key_pem,
        mock::remote_key().public_key_pem()?
    );
    Ok(())
}

#[tokio::test]
async fn stopped_pool_refuses_accepted_deliveries() {
    let setup = setup(mock::store(), MockTransport::serving_alice());
    assert!(setup.pool.stop().await);
    let activity = follow(REMOTE_ACTOR);
    let request = mock::signed_post(&mock::remote_key(), INBOX, &body(&activity));

    assert!(matches!(
        deliver(&setup, &request).await,
        Err(Error::ShuttingDown)
    ));
}

#[tokio::test]
async fn store_processor_keeps_replies_to_known_statuses() -> TestResult {
    let store = Arc::new(mock::store());
    let processor = StoreProcessor::new(store.clone());
    let parent = mock::bob_status();
    let create = |note_id: &str, in_reply_to: &str, author: &str| -> Activity {
        serde_json::from_value(json!({
            "id": format!("{}/activity", note_id),
            "type": "Create",
            "actor": REMOTE_ACTOR,
            "object": {
                "id": note_id,
                "type": "Note",
                "attributedTo": author,
                "inReplyTo": in_reply_to,
                "content": "a reply"
            }
        }))
        .expect("in test")
    };
    let bob = store.local_account("bob").await?.expect("in test");
    let apply = |activity: Activity| {
        processor.apply(InboxContext::new(bob.clone(), activity), CancellationToken::new())
    };

    apply(create("https://remote.example/notes/1", &parent.uri, REMOTE_ACTOR)).await?;
    // Twice is still once
    apply(create("https://remote.example/notes/1", &parent.uri, REMOTE_ACTOR)).await?;
    // Not a reply to anything we know
    apply(create("https://remote.example/notes/2", "https://elsewhere.example/1", REMOTE_ACTOR))
        .await?;
    // Attributed to someone other than the sender
    apply(create("https://remote.example/notes/3", &parent.uri, "https://remote.example/users/eve"))
        .await?;

    let replies = store.status_replies(&parent, None, false, 10).await?;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].uri, "https://remote.example/notes/1");
    assert_eq!(replies[0].account_uri, REMOTE_ACTOR);
    assert!(!replies[0].local);
    Ok(())
}
