use super::*;
use std::collections::HashSet;

fn ident(s: &str) -> IdentityHash {
    Identity::new(s).hash()
}

#[test]
fn insert_is_idempotent() {
    let index = MemIdentityIndex::default();
    let subject = Subject::new("s1", "").hash();

    assert!(index.insert(&subject, &ident("x")));
    let after_first = index.get(&subject);

    for _ in 0..5 {
        assert!(!index.insert(&subject, &ident("x")));
    }

    assert_eq!(after_first, index.get(&subject));
    assert_eq!(1, index.get(&subject).len());
    assert!(index.contains(&subject, &ident("x")));
}

#[test]
fn insert_order_does_not_matter() {
    let subject = Subject::new("s1", "").hash();
    let ids: Vec<_> = ["a", "b", "c", "d"].iter().map(|s| ident(s)).collect();

    let forward = MemIdentityIndex::default();
    for id in ids.iter() {
        forward.insert(&subject, id);
    }

    // reversed, with duplicates interleaved
    let backward = MemIdentityIndex::default();
    for id in ids.iter().rev().chain(ids.iter()) {
        backward.insert(&subject, id);
    }

    assert_eq!(forward.get(&subject), backward.get(&subject));
}

#[test]
fn subjects_are_separate() {
    let index = MemIdentityIndex::default();
    let s1 = Subject::new("s1", "").hash();
    let s2 = Subject::new("s2", "").hash();

    index.insert(&s1, &ident("x"));
    index.insert(&s2, &ident("y"));

    assert!(index.contains(&s1, &ident("x")));
    assert!(!index.contains(&s1, &ident("y")));
    assert!(index.get(&Subject::new("s3", "").hash()).is_empty());

    let subjects: HashSet<_> = index.subjects().into_iter().collect();
    assert_eq!(subjects, [s1, s2].into_iter().collect());
}

#[test]
fn all_decodes_back_to_digests() {
    let index = MemIdentityIndex::default();
    let subject = Subject::new("s1", "").hash();
    index.insert(&subject, &ident("x"));
    index.insert(&subject, &ident("y"));

    let all: HashSet<_> = index.all(&subject).into_iter().collect();
    assert_eq!(all, [ident("x"), ident("y")].into_iter().collect());
}

#[test]
fn snapshot_is_detached() {
    let index = MemIdentityIndex::default();
    let subject = Subject::new("s1", "").hash();
    index.insert(&subject, &ident("x"));

    let snapshot = index.get(&subject);
    index.insert(&subject, &ident("y"));

    assert_eq!(1, snapshot.len());
    assert_eq!(2, index.get(&subject).len());
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_inserts_converge() {
    let index = Arc::new(MemIdentityIndex::default());
    let subject = Subject::new("s1", "").hash();

    let mut tasks = Vec::new();
    for t in 0..8 {
        let index = index.clone();
        let subject = subject.clone();
        tasks.push(tokio::task::spawn(async move {
            // every task inserts the same 50 identities in a different order
            for i in 0..50 {
                let n = (i * 7 + t * 13) % 50;
                index.insert(&subject, &ident(&format!("id-{n}")));
            }
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    assert_eq!(50, index.get(&subject).len());
}
