use std::collections::BTreeSet;
use std::sync::Arc;
use zkvote_api::*;
use zkvote_core::{default_test_builder, Node};
use zkvote_test_utils::{enable_tracing, id::*, iter_check};

fn make_builder() -> Arc<Builder> {
    default_test_builder().with_default_config().unwrap().build()
}

async fn make_nodes(builder: &Arc<Builder>, count: usize) -> Vec<Node> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(Node::new(builder.clone()).await.unwrap());
    }
    out
}

fn set(ids: &[&IdentityHash]) -> BTreeSet<HashHex> {
    ids.iter().map(|i| i.hex()).collect()
}

fn index_set(node: &Node, subject: &SubjectHash) -> BTreeSet<HashHex> {
    node.index().get(subject).into_iter().collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn late_joiner_pulls_then_follows_gossip() {
    enable_tracing();

    let builder = make_builder();
    let nodes = make_nodes(&builder, 3).await;
    let (a, b, c) = (&nodes[0], &nodes[1], &nodes[2]);

    let subject = Subject::new("lunch", "where do we eat");
    let hash = subject.hash();

    // a and b register before c is around
    a.subscriber().activate(&subject).unwrap();
    b.subscriber().activate(&subject).unwrap();
    let x = a
        .subscriber()
        .register(&hash.hex(), &random_commitment())
        .await
        .unwrap();
    let y = b
        .subscriber()
        .register(&hash.hex(), &random_commitment())
        .await
        .unwrap();

    iter_check!({
        if index_set(a, &hash) == set(&[&x, &y])
            && index_set(b, &hash) == set(&[&x, &y])
        {
            break;
        }
    });

    a.collector().announce().await.unwrap();
    b.collector().announce().await.unwrap();

    // c joins and pulls the history it missed
    c.subscriber().activate(&subject).unwrap();
    c.collector().announce().await.unwrap();
    assert!(index_set(c, &hash).is_empty());

    let report = c.collector().collect().await.unwrap();
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(set(&[&x, &y]), report.subjects[&hash.hex()].identities);
    assert_eq!("lunch", report.subjects[&hash.hex()].subject.title);
    assert_eq!(set(&[&x, &y]), index_set(c, &hash));
    assert_eq!(0, c.protocol().pending_count());

    // every provider is known, c itself included, but c never pulled
    // from itself
    assert_eq!(3, c.collector().providers().len());
    assert!(!c.addr_book().addrs(&a.peer_id()).is_empty());

    // from now on gossip keeps everyone current
    let z = c
        .subscriber()
        .register(&hash.hex(), &random_commitment())
        .await
        .unwrap();

    for node in nodes.iter() {
        iter_check!({
            if index_set(node, &hash) == set(&[&x, &y, &z]) {
                break;
            }
        });
    }

    let query = QuerySubjectsResponse::from(&report);
    assert_eq!("2", query.results[&hash.hex().to_string()]["identityCount"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn announce_needs_a_subject() {
    let builder = make_builder();
    let nodes = make_nodes(&builder, 2).await;

    let err = nodes[0].collector().announce().await.unwrap_err();
    assert!(matches!(err, ZkvError::NotReady(_)));
    assert_eq!(1, GenericError::from(&err).code);

    // nothing was advertised
    assert!(nodes[1]
        .discovery()
        .find_peers(SUBJECTS_KEY)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn vanished_provider_is_reported() {
    let builder = make_builder();
    let mut nodes = make_nodes(&builder, 3).await;

    let subject = random_subject();
    let hash = subject.hash();
    for node in nodes.iter() {
        node.subscriber().activate(&subject).unwrap();
        node.collector().announce().await.unwrap();
    }

    let x = nodes[0]
        .subscriber()
        .register(&hash.hex(), &random_commitment())
        .await
        .unwrap();

    // the advertisement outlives the node
    let gone = nodes.remove(1);
    let gone_id = gone.peer_id();
    drop(gone);

    let report = nodes[1].collector().collect().await.unwrap();

    assert_eq!(1, report.failures.len());
    assert_eq!(gone_id, report.failures[0].peer);
    assert_eq!(hash.hex(), report.failures[0].subject);
    assert_eq!(set(&[&x]), report.subjects[&hash.hex()].identities);
}

#[tokio::test(flavor = "multi_thread")]
async fn subjects_converge_independently() {
    let builder = make_builder();
    let nodes = make_nodes(&builder, 4).await;

    let s1 = random_subject();
    let s2 = random_subject();

    // the first pair follows s1, the second pair s2
    for (i, node) in nodes.iter().enumerate() {
        let s = if i < 2 { &s1 } else { &s2 };
        node.subscriber().activate(s).unwrap();
    }

    let mut expected1 = Vec::new();
    let mut expected2 = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        let s = if i < 2 { &s1 } else { &s2 };
        let id = node
            .subscriber()
            .register(&s.hash().hex(), &random_commitment())
            .await
            .unwrap();
        if i < 2 {
            expected1.push(id);
        } else {
            expected2.push(id);
        }
    }

    let e1: Vec<&IdentityHash> = expected1.iter().collect();
    let e2: Vec<&IdentityHash> = expected2.iter().collect();

    for (i, node) in nodes.iter().enumerate() {
        iter_check!({
            let ok = if i < 2 {
                index_set(node, &s1.hash()) == set(&e1)
                    && index_set(node, &s2.hash()).is_empty()
            } else {
                index_set(node, &s2.hash()) == set(&e2)
                    && index_set(node, &s1.hash()).is_empty()
            };
            if ok {
                break;
            }
        });
    }
}
