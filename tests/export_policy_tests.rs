use export_gateway::{
    ApiError, AppConfig,
    auth::Identity,
    exports::{ExportPolicy, NAMESPACES, resource_key},
};

fn policy() -> ExportPolicy {
    ExportPolicy::from_config(&AppConfig::default())
}

#[test]
fn test_resource_key_layout() {
    assert_eq!(resource_key("enwiki", None, "0"), "export/enwiki/enwiki_0.json");
    assert_eq!(
        resource_key("enwiki", Some("group_1"), "0"),
        "export/enwiki/enwiki_group_1_0.json"
    );
    // An empty suffix is the unscoped artifact, not a dangling underscore.
    assert_eq!(resource_key("enwiki", Some(""), "6"), "export/enwiki/enwiki_6.json");
}

#[test]
fn test_resolve_for_every_namespace() {
    let policy = policy();
    let unlimited = Identity::new("reader", ["unlimited"]);
    let restricted = Identity::new("partner", ["group_1"]);

    for namespace in NAMESPACES {
        for dataset in ["enwiki", "dewiktionary", "commonswiki", "frwikisource"] {
            assert_eq!(
                policy.resolve(namespace, dataset, &unlimited).unwrap(),
                format!("export/{dataset}/{dataset}_{namespace}.json")
            );
            assert_eq!(
                policy.resolve(namespace, dataset, &restricted).unwrap(),
                format!("export/{dataset}/{dataset}_group_1_{namespace}.json")
            );
        }
    }
}

#[test]
fn test_unrecognized_namespaces_are_bad_requests() {
    let policy = policy();
    let identity = Identity::new("reader", ["unlimited"]);

    for namespace in ["10", "1", "-1", "", "00", "0 "] {
        match policy.resolve(namespace, "enwiki", &identity) {
            Err(ApiError::BadRequest(message)) => assert!(message.contains(&format!("'{namespace}'"))),
            other => panic!("expected bad request for {namespace:?}, got {other:?}"),
        }
    }
}

#[test]
fn test_unrecognized_datasets_are_bad_requests() {
    let policy = policy();
    let identity = Identity::new("reader", ["unlimited"]);

    for dataset in ["e", "wiki", "EnWiki", "en-wiki", "enwikix", "../enwiki"] {
        match policy.resolve("0", dataset, &identity) {
            Err(ApiError::BadRequest(message)) => assert!(message.contains(dataset)),
            other => panic!("expected bad request for {dataset:?}, got {other:?}"),
        }
    }
}

#[test]
fn test_namespace_is_checked_before_dataset() {
    let identity = Identity::new("reader", ["unlimited"]);

    match policy().resolve("10", "e", &identity) {
        Err(ApiError::BadRequest(message)) => assert!(message.contains("'10'")),
        other => panic!("expected namespace rejection, got {other:?}"),
    }
}

#[test]
fn test_parameters_are_checked_before_groups() {
    let outsider = Identity::new("outsider", ["group_2"]);

    assert!(matches!(
        policy().resolve("10", "enwiki", &outsider),
        Err(ApiError::BadRequest(_))
    ));
    assert!(matches!(
        policy().resolve("0", "enwiki", &outsider),
        Err(ApiError::Forbidden(_))
    ));
}

#[test]
fn test_configured_dataset_allow_list_replaces_code_rule() {
    let policy = ExportPolicy::new("partners", ["enwiki", "wikidata"]);
    let identity = Identity::new("partner", ["partners"]);

    assert_eq!(
        policy.resolve("0", "wikidata", &identity).unwrap(),
        "export/wikidata/wikidata_partners_0.json"
    );
    assert!(matches!(
        policy.resolve("0", "dewiki", &identity),
        Err(ApiError::BadRequest(_))
    ));
    assert_eq!(policy.restricted_group(), "partners");
}
