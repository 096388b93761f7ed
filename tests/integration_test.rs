// Integration tests for teamatch
use std::io::Write;
use teamatch::prelude::*;

const MENU: &str = "\
Menu,Category,Base Type,Flavor Tags,Contains Caffeine,Dairy Free
Mango Tea,Fruit Tea,Fruit Tea,\"mango, fruity\",Yes,Yes
Thai Milk Tea,Milk Tea,\"Black Tea, Milk Tea, Black Tea\",\"creamy, sweet\",Yes,No
Taro Slush,Slush,,\"taro, icy, creamy\",No,
Peach Oolong,Fruit Tea,\"Oolong Tea, Fruit Tea\",\"peach, fruity, floral\",Yes,Yes
Lychee Sparkler,Sparkling,Fruit Tea,\"lychee, fruity, sweet\",,Yes
,Classic,Green Tea,grassy,No,Yes
";

fn menu() -> Catalog {
    read_catalog(MENU.as_bytes(), &CatalogSchema::default()).unwrap()
}

#[test]
fn test_load_catalog_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MENU.as_bytes()).unwrap();

    let catalog = load_catalog(file.path(), &CatalogSchema::default()).unwrap();
    assert_eq!(catalog.len(), 5);
    assert_eq!(catalog.skipped(), 1);

    let thai = catalog.get("Thai Milk Tea").unwrap();
    assert_eq!(thai.base_type_canonical(), "Black Tea, Milk Tea");
    assert_eq!(thai.attribute("Dairy Free"), TriState::No);
    assert_eq!(catalog.get("Taro Slush").unwrap().attribute("Dairy Free"), TriState::Unknown);
}

#[test]
fn test_missing_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_catalog(dir.path().join("menu.csv"), &CatalogSchema::default());
    assert!(matches!(result, Err(teamatch::Error::Io(_))));
}

#[test]
fn test_catalog_options() {
    let options = menu().options();
    assert_eq!(options.categories, vec!["Fruit Tea", "Milk Tea", "Slush", "Sparkling"]);
    assert!(options.base_types.contains(&"Oolong Tea".to_string()));
    assert_eq!(options.attributes, vec!["Contains Caffeine", "Dairy Free"]);
}

#[test]
fn test_mango_with_fruit_tea_base() {
    let recommender = Recommender::new(RecommendOptions::threshold(0.3).with_top_n(5));
    let query = Query::new().with_tag("mango").with_base_type("Fruit Tea");
    let result = recommender.recommend(&menu(), &query);

    assert_eq!(result.outcome, Outcome::Matched);
    assert_eq!(result.candidates, 3);
    assert_eq!(result.menu_names(), vec!["Mango Tea", "Peach Oolong"]);
    assert!(result.items.iter().all(|r| r.score >= 0.3));
}

#[test]
fn test_absent_tag() {
    let query = Query::new().with_tag("chocolate");
    let result = Recommender::default().recommend(&menu(), &query);
    assert!(result.is_empty());
    assert_eq!(result.outcome, Outcome::NoQualifyingMatch);
    assert_eq!(result.candidates, 5);
}

#[test]
fn test_caffeine_free_strict_and_lenient() {
    let query = Query::new()
        .with_tag("fruity")
        .with_base_type("Fruit Tea")
        .with_preference("Contains Caffeine", TriState::No);

    let strict = Recommender::new(RecommendOptions::top_n(5)).recommend(&menu(), &query);
    assert!(strict.is_empty());
    assert_eq!(strict.outcome, Outcome::EmptyCandidateSet);

    let lenient = Recommender::new(RecommendOptions::top_n(5).with_boolean_match(BooleanMatch::Lenient))
        .recommend(&menu(), &query);
    assert_eq!(lenient.menu_names(), vec!["Lychee Sparkler"]);
}

#[test]
fn test_single_item_scope() {
    let catalog = menu();
    let query = Query::new()
        .with_tag("chocolate")
        .with_base_type("Oolong Tea")
        .with_preference("Dairy Free", TriState::Yes);

    let top_n = Recommender::new(RecommendOptions::top_n(5)).recommend(&catalog, &query);
    assert_eq!(top_n.menu_names(), vec!["Peach Oolong"]);

    let threshold = Recommender::default().recommend(&catalog, &query.clone().with_tag("peach"));
    assert_eq!(threshold.menu_names(), vec!["Peach Oolong"]);
}

#[test]
fn test_top_n_bound_and_ordering() {
    let catalog = menu();
    let recommender = Recommender::new(RecommendOptions::top_n(2));
    for tag in ["mango", "creamy", "sweet", "fruity", "floral", "icy", "chocolate"] {
        let result = recommender.recommend(&catalog, &Query::new().with_tag(tag));
        assert!(result.len() <= 2);
        assert!(result.items.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn test_threshold_is_respected() {
    let catalog = menu();
    for threshold in [0.0, 0.1, 0.3, 0.5, 0.9] {
        let recommender = Recommender::new(RecommendOptions::threshold(threshold));
        let query = Query::new().with_tags(["sweet", "creamy"]);
        let result = recommender.recommend(&catalog, &query);
        assert!(result.items.iter().all(|r| r.score >= threshold));
    }
}

#[test]
fn test_idempotence() {
    let catalog = menu();
    let recommender = Recommender::new(RecommendOptions::top_n(5));
    let query = Query::new().with_tags(["sweet", "fruity"]).with_category("Fruit Tea");
    assert_eq!(
        recommender.recommend(&catalog, &query),
        recommender.recommend(&catalog, &query)
    );
}

#[test]
fn test_nearest_neighbors_ignore_base_scope() {
    let recommender = Recommender::new(RecommendOptions::nearest_neighbors(3));
    let query = Query::new().with_tag("creamy").with_base_type("Fruit Tea");
    let result = recommender.recommend(&menu(), &query);
    assert_eq!(result.candidates, 5);
    assert_eq!(result.len(), 3);
}

#[test]
fn test_feedback_for_recommendations() {
    let catalog = menu();
    let query = Query::new().with_tag("mango").with_base_type("Fruit Tea");
    let result = Recommender::default().recommend(&catalog, &query);

    let sink = MemoryFeedbackSink::new();
    let records = FeedbackRecord::for_recommendations(
        "a1b2c3d4",
        None,
        Some("Fruit Tea"),
        &["mango".to_string()],
        result.menu_names(),
    );
    assert_eq!(sink.record_all(records).unwrap(), result.len());

    let mut out = Vec::new();
    sink.export_csv(&mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("User ID,Category,Base Type,Selected Tags,Recommendation,Rating,Purchased,Created At")
    );
    assert!(lines.next().unwrap().starts_with("a1b2c3d4,,Fruit Tea,mango,Mango Tea,,No,"));
}
