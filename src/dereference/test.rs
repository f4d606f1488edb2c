use super::*;
use crate::ap::Freshness;
use crate::mock::{self, Canned, MockTransport, REMOTE_ACTOR};
use crate::store::MemoryStore;
use serde_json::json;

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

fn dereferencer(store: MemoryStore, transport: MockTransport) -> (Dereferencer, Arc<MockTransport>) {
    let transport = Arc::new(transport);
    (
        Dereferencer::new(Arc::new(store), transport.clone()),
        transport,
    )
}

#[tokio::test]
async fn unknown_actor_is_fetched_but_not_stored() -> TestResult {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(MockTransport::serving_alice());
    let dereferencer = Dereferencer::new(store.clone(), transport.clone());

    let actor = dereferencer.resolve_actor(REMOTE_ACTOR).await?;
    assert_eq!(actor.uri, REMOTE_ACTOR);
    assert_eq!(actor.public_key.id, format!("{}#main-key", REMOTE_ACTOR));
    assert!(matches!(actor.freshness, Freshness::CachedRemote { .. }));
    assert_eq!(transport.calls(), 1);
    assert!(store.actor(REMOTE_ACTOR).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn stored_actor_skips_the_network() -> TestResult {
    let store = MemoryStore::default();
    store.put_actor(mock::remote_actor()).await?;
    let (dereferencer, transport) = dereferencer(store, MockTransport::default());

    assert_eq!(dereferencer.resolve_actor(REMOTE_ACTOR).await?.uri, REMOTE_ACTOR);
    assert!(matches!(
        dereferencer.resolve(REMOTE_ACTOR).await?,
        ApObject::Actor { .. }
    ));
    assert_eq!(transport.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn stored_status_resolves_as_a_note() -> TestResult {
    let (dereferencer, transport) = dereferencer(mock::store(), MockTransport::default());
    let uri = mock::bob_status().uri;
    match dereferencer.resolve(&uri).await? {
        ApObject::Note(note) => assert_eq!(note.id, uri),
        other => panic!("expected a note, got {:?}", other),
    }
    assert_eq!(transport.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn failures_are_classified() {
    let uri = "https://remote.example/thing";
    let cases = vec![
        (Canned::Respond(404, Vec::new()), false),
        (Canned::Respond(410, Vec::new()), false),
        (Canned::Respond(403, Vec::new()), false),
        (Canned::Respond(429, Vec::new()), true),
        (Canned::Respond(502, Vec::new()), true),
        (Canned::Respond(200, b"<html>".to_vec()), false),
        (Canned::Timeout, true),
        (Canned::Oversized, false),
    ];
    for (canned, transient) in cases {
        let (dereferencer, _) = dereferencer(
            MemoryStore::default(),
            MockTransport::default().with(uri, canned.clone()),
        );
        match dereferencer.resolve(uri).await {
            Err(e) => assert_eq!(e.is_transient(), transient, "{:?}", canned),
            Ok(object) => panic!("{:?} resolved to {:?}", canned, object),
        }
    }
}

#[tokio::test]
async fn mismatched_id_is_permanent() {
    let uri = "https://remote.example/users/mallory";
    let (dereferencer, _) = dereferencer(
        MemoryStore::default(),
        MockTransport::default().with(uri, Canned::Respond(200, mock::remote_actor_json())),
    );
    let err = dereferencer.resolve_actor(uri).await.expect_err("in test");
    assert!(matches!(err, Error::IdMismatch { .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn non_actor_is_the_wrong_type() -> TestResult {
    let uri = "https://remote.example/notes/1";
    let note = json!({
        "id": uri,
        "type": "Note",
        "attributedTo": REMOTE_ACTOR,
        "content": "hi"
    });
    let (dereferencer, _) = dereferencer(
        MemoryStore::default(),
        MockTransport::default().with(uri, Canned::Respond(200, serde_json::to_vec(&note)?)),
    );

    assert!(matches!(dereferencer.resolve(uri).await?, ApObject::Note(_)));
    let err = dereferencer.resolve_actor(uri).await.expect_err("in test");
    assert!(matches!(err, Error::WrongType { ref kind, .. } if kind == "Note"));
    assert!(!err.is_transient());
    Ok(())
}

#[tokio::test]
async fn oversized_document_is_malformed() {
    let (dereferencer, _) = dereferencer(
        MemoryStore::default(),
        MockTransport::default().with(REMOTE_ACTOR, Canned::Oversized),
    );
    let err = dereferencer.resolve_actor(REMOTE_ACTOR).await.expect_err("in test");
    assert!(matches!(err, Error::Malformed { ref uri, .. } if uri == REMOTE_ACTOR));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn fetched_actor_keeps_its_own_type() -> TestResult {
    let mut document: serde_json::Value = serde_json::from_slice(&mock::remote_actor_json())?;
    document["type"] = json!("Service");
    let (dereferencer, _) = dereferencer(
        MemoryStore::default(),
        MockTransport::default().with(REMOTE_ACTOR, Canned::Respond(200, serde_json::to_vec(&document)?)),
    );

    let object = dereferencer.fetch(REMOTE_ACTOR).await?;
    assert_eq!(object.kind(), "Service");
    assert_eq!(object.id(), REMOTE_ACTOR);
    assert_eq!(dereferencer.fetch_actor(REMOTE_ACTOR).await?.uri, REMOTE_ACTOR);
    Ok(())
}
