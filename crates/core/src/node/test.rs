use super::*;
use crate::factories::core_collector::{
    CoreCollectorConfig, CoreCollectorModConfig,
};

#[test]
fn default_config_includes_core_modules() {
    let builder =
        crate::default_test_builder().with_default_config().unwrap();

    let json = serde_json::to_value(&builder.config).unwrap();
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    for key in [
        "memPubSub",
        "memDiscovery",
        "memAddrBook",
        "coreIdentityProtocol",
        "coreCollector",
    ] {
        assert!(keys.iter().any(|k| *k == key), "{key} missing: {keys:?}");
    }

    let protocol = &json["coreIdentityProtocol"];
    assert_eq!(30_000, protocol["requestTimeoutMs"]);
    assert_eq!(1_000, protocol["sweepIntervalMs"]);

    let collector = &json["coreCollector"];
    assert_eq!("subjects", collector["discoveryKey"]);
    assert_eq!(600, collector["advertiseTtlS"]);
    assert_eq!(30, collector["discoveryTimeoutS"]);
    assert_eq!(86_400, collector["addrTtlS"]);
}

#[test]
fn core_defaults_are_added_once() {
    let mut builder =
        crate::default_test_builder().with_default_config().unwrap();
    Node::default_config(&mut builder.config).unwrap_err();
}

#[tokio::test]
async fn node_uses_configured_discovery_key() {
    let mut config = Config::default();
    config
        .set_module_config(&CoreCollectorModConfig {
            core_collector: CoreCollectorConfig {
                discovery_key: "elsewhere".into(),
                ..Default::default()
            },
        })
        .unwrap();
    let custom = Builder {
        config,
        ..crate::default_test_builder()
    }
    .build();
    let standard = crate::default_test_builder()
        .with_default_config()
        .unwrap()
        .build();

    let a = Node::new(custom.clone()).await.unwrap();
    let b = Node::new(custom).await.unwrap();
    let c = Node::new(standard).await.unwrap();

    a.subscriber().activate(&Subject::new("lunch", "")).unwrap();
    a.collector().announce().await.unwrap();

    let found = b.collector().find_proposers().await.unwrap();
    assert!(found.iter().any(|p| p.id == a.peer_id()));

    let found = c.collector().find_proposers().await.unwrap();
    assert!(found.iter().all(|p| p.id != a.peer_id()));
}
