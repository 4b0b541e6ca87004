use super::*;
use std::collections::HashSet;
use std::time::Duration;
use zkvote_test_utils::{enable_tracing, id::*, iter_check};

struct Peer {
    peer_id: PeerId,
    pubsub: DynPubSub,
    index: DynIdentityIndex,
    subscriber: Arc<CoreSubscriber>,
}

fn mk_builder() -> Arc<Builder> {
    crate::default_test_builder()
        .with_default_config()
        .unwrap()
        .build()
}

async fn mk_peer(builder: &Arc<Builder>, name: &str) -> Peer {
    let peer_id = PeerId::from(name);
    let pubsub = builder
        .pubsub
        .create(builder.clone(), peer_id.clone())
        .await
        .unwrap();
    let index = builder
        .identity_index
        .create(builder.clone())
        .await
        .unwrap();
    let subscriber = CoreSubscriber::create(pubsub.clone(), index.clone());
    Peer {
        peer_id,
        pubsub,
        index,
        subscriber,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn activate_is_idempotent() {
    let builder = mk_builder();
    let p = mk_peer(&builder, "p1").await;

    let subject = Subject::new("lunch", "where do we eat");
    let hash = p.subscriber.activate(&subject).unwrap();
    p.subscriber.activate(&subject).unwrap();

    assert_eq!(
        vec![(hash.clone(), subject.clone())],
        p.subscriber.active_subjects()
    );
    assert!(p.subscriber.has_subscriptions());

    let hex = hash.hex();
    assert_eq!(
        vec![identity_topic(&hex), vote_topic(&hex)],
        p.pubsub.topics()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn register_inserts_locally_and_reaches_peers() {
    enable_tracing();

    let builder = mk_builder();
    let a = mk_peer(&builder, "a").await;
    let b = mk_peer(&builder, "b").await;

    let subject = random_subject();
    let hash = subject.hash();
    b.subscriber.activate(&subject).unwrap();

    let commitment = random_commitment();
    let identity = a
        .subscriber
        .register(&hash.hex(), &commitment)
        .await
        .unwrap();
    assert_eq!(Identity::new(commitment).hash(), identity);

    // local insert does not depend on our own broadcast
    assert!(a.index.contains(&hash, &identity));

    iter_check!({
        if b.index.contains(&hash, &identity) {
            break;
        }
    });
}

#[tokio::test(flavor = "multi_thread")]
async fn register_on_unknown_subject_uses_hex_label() {
    let builder = mk_builder();
    let a = mk_peer(&builder, "a").await;

    let hash = random_subject_hash();
    a.subscriber
        .register(&hash.hex(), &random_commitment())
        .await
        .unwrap();

    assert_eq!(
        vec![(hash.clone(), Subject::new(hash.hex().to_string(), ""))],
        a.subscriber.active_subjects()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn register_rejects_bad_subject_hex() {
    let builder = mk_builder();
    let a = mk_peer(&builder, "a").await;

    for bad in ["zz", "abcd", ""] {
        let err = a.subscriber.register(bad, "c").await.unwrap_err();
        assert!(matches!(err, ZkvError::Decode { .. }), "{err:?}");
    }
    assert!(!a.subscriber.has_subscriptions());
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_and_malformed_announcements_are_harmless() {
    let builder = mk_builder();
    let a = mk_peer(&builder, "a").await;
    let b = mk_peer(&builder, "b").await;

    let subject = random_subject();
    let hash = subject.hash();
    b.subscriber.activate(&subject).unwrap();

    let topic = identity_topic(&hash.hex());
    let x = random_identity_hash();

    a.pubsub
        .publish(&topic, bytes::Bytes::from_static(b"short"))
        .await
        .unwrap();
    for _ in 0..3 {
        a.pubsub
            .publish(&topic, bytes::Bytes::clone(&x.0))
            .await
            .unwrap();
    }

    iter_check!({
        if b.index.contains(&hash, &x) {
            break;
        }
    });

    // give the listener time to process the duplicates
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(
        [x.hex()].into_iter().collect::<HashSet<_>>(),
        b.index.get(&hash)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn votes_are_logged_and_drained() {
    let builder = mk_builder();
    let a = mk_peer(&builder, "a").await;
    let b = mk_peer(&builder, "b").await;

    let subject = random_subject();
    let hash = subject.hash();
    a.subscriber.activate(&subject).unwrap();
    b.subscriber.activate(&subject).unwrap();

    for v in ["yes", "no"] {
        a.subscriber
            .vote(&hash.hex(), bytes::Bytes::from_static(v.as_bytes()))
            .await
            .unwrap();
    }

    let topic = vote_topic(&hash.hex());
    iter_check!({
        if b.subscriber.message_topics() == vec![topic.clone()] {
            break;
        }
    });

    let msgs = iter_check!({
        let len = b
            .subscriber
            .messages
            .lock()
            .unwrap()
            .get(&topic)
            .map(|m| m.len())
            .unwrap_or(0);
        if len == 2 {
            return b.subscriber.drain_messages(&topic);
        }
    });

    assert_eq!(a.peer_id, msgs[0].from);
    assert_eq!(&b"yes"[..], &msgs[0].data[..]);
    assert_eq!(&b"no"[..], &msgs[1].data[..]);

    assert!(b.subscriber.drain_messages(&topic).is_empty());
    assert!(b.subscriber.message_topics().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn vote_requires_active_subject() {
    let builder = mk_builder();
    let a = mk_peer(&builder, "a").await;

    let err = a
        .subscriber
        .vote(&random_subject_hash().hex(), bytes::Bytes::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ZkvError::NotReady(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn deactivate_stops_merging() {
    let builder = mk_builder();
    let a = mk_peer(&builder, "a").await;
    let b = mk_peer(&builder, "b").await;

    let subject = random_subject();
    let hash = subject.hash();
    b.subscriber.activate(&subject).unwrap();

    assert!(b.subscriber.deactivate(&hash.hex()).unwrap());
    assert!(!b.subscriber.deactivate(&hash.hex()).unwrap());
    assert!(!b.subscriber.has_subscriptions());
    assert!(b.pubsub.topics().is_empty());

    a.subscriber
        .register(&hash.hex(), &random_commitment())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(b.index.get(&hash).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_and_drop_cancel_everything() {
    let builder = mk_builder();
    let a = mk_peer(&builder, "a").await;

    a.subscriber.activate(&random_subject()).unwrap();
    a.subscriber.activate(&random_subject()).unwrap();
    assert_eq!(4, a.pubsub.topics().len());

    a.subscriber.shutdown();
    assert!(a.subscriber.active_subjects().is_empty());
    assert!(a.pubsub.topics().is_empty());

    a.subscriber.activate(&random_subject()).unwrap();
    assert_eq!(2, a.pubsub.topics().len());

    let Peer {
        pubsub, subscriber, ..
    } = a;
    drop(subscriber);
    assert!(pubsub.topics().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn broadcast_publishes_on_any_topic() {
    let builder = mk_builder();
    let a = mk_peer(&builder, "a").await;
    let b = mk_peer(&builder, "b").await;

    let sub = b.pubsub.subscribe("free-form").unwrap();
    a.subscriber
        .broadcast("free-form", bytes::Bytes::from_static(b"hello"))
        .await
        .unwrap();

    assert_eq!(&b"hello"[..], &sub.next().await.unwrap().data[..]);
}
