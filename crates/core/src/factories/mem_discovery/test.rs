use super::*;

fn mk_builder() -> Arc<Builder> {
    crate::default_test_builder()
        .with_default_config()
        .unwrap()
        .build()
}

async fn mk_discovery(builder: &Arc<Builder>, peer: &str) -> DynDiscovery {
    let local = PeerInfo {
        id: PeerId::from(peer),
        addrs: vec![PeerAddr::from(format!("mem://{peer}"))],
    };
    builder
        .discovery
        .create(builder.clone(), local)
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn advertised_peers_are_found() {
    let builder = mk_builder();
    let d1 = mk_discovery(&builder, "p1").await;
    let d2 = mk_discovery(&builder, "p2").await;

    assert!(d1.find_peers(SUBJECTS_KEY).await.unwrap().is_empty());

    d1.advertise(SUBJECTS_KEY, Duration::from_secs(60))
        .await
        .unwrap();
    d2.advertise(SUBJECTS_KEY, Duration::from_secs(60))
        .await
        .unwrap();

    let found = d1.find_peers(SUBJECTS_KEY).await.unwrap();
    assert_eq!(
        vec![PeerId::from("p1"), PeerId::from("p2")],
        found.iter().map(|p| p.id.clone()).collect::<Vec<_>>()
    );
    assert_eq!(vec![PeerAddr::from("mem://p2")], found[1].addrs);

    assert!(d1.find_peers("other-key").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn re_advertising_replaces_the_record() {
    let builder = mk_builder();
    let d1 = mk_discovery(&builder, "p1").await;

    for _ in 0..3 {
        d1.advertise(SUBJECTS_KEY, Duration::from_secs(60))
            .await
            .unwrap();
    }

    assert_eq!(1, d1.find_peers(SUBJECTS_KEY).await.unwrap().len());
}

#[tokio::test(flavor = "multi_thread")]
async fn records_expire() {
    let builder = mk_builder();
    let d1 = mk_discovery(&builder, "p1").await;

    d1.advertise(SUBJECTS_KEY, Duration::from_millis(10))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert!(d1.find_peers(SUBJECTS_KEY).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn granted_ttl_is_capped() {
    let mut builder = crate::default_test_builder()
        .with_default_config()
        .unwrap();
    let mut config: MemDiscoveryModConfig =
        builder.config.get_module_config().unwrap();
    config.mem_discovery.max_ttl_s = 5;
    builder.config = Config::default();
    builder.config.set_module_config(&config).unwrap();
    let builder = builder.build();

    let d1 = mk_discovery(&builder, "p1").await;
    let granted = d1
        .advertise(SUBJECTS_KEY, Duration::from_secs(600))
        .await
        .unwrap();
    assert_eq!(Duration::from_secs(5), granted);

    let granted = d1
        .advertise(SUBJECTS_KEY, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(Duration::from_secs(1), granted);
}
