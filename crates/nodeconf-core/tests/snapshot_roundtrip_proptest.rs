//! Property tests: save then restore reproduces the selection's data
//!
//! Covers whole lists, single entries and nested containers of typed leaves.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use nodeconf_core::meta::MetaBuilder;
use nodeconf_core::snapshot::{restore, save, SnapshotDocument};
use nodeconf_core::MetaRef;
use proptest::prelude::*;
use serde_json::{json, Value as Json};

/// Bird lists with unique ids and optional leaves
fn birds() -> impl Strategy<Value = Json> {
    prop::collection::btree_map(
        any::<u32>(),
        (
            prop::option::of("[a-z]{1,12}"),
            prop::option::of(any::<i32>()),
        ),
        0..8,
    )
    .prop_map(|entries| {
        let items: Vec<Json> = entries
            .into_iter()
            .map(|(id, (name, wingspan))| {
                let mut entry = serde_json::Map::new();
                entry.insert("id".to_string(), json!(id));
                if let Some(name) = name {
                    entry.insert("name".to_string(), json!(name));
                }
                if let Some(wingspan) = wingspan {
                    entry.insert("wingspan".to_string(), json!(wingspan));
                }
                Json::Object(entry)
            })
            .collect();
        json!({ "bird": items })
    })
}

/// Feeding station: leaves of several formats, two container levels below it
fn station_module() -> MetaRef {
    MetaBuilder::module("stations")
        .definition(
            MetaBuilder::container("station")
                .definition(MetaBuilder::leaf("name", "string"))
                .definition(MetaBuilder::leaf("elevation", "int32"))
                .definition(MetaBuilder::leaf("active", "boolean"))
                .definition(
                    MetaBuilder::container("feeder")
                        .definition(MetaBuilder::leaf("seed", "string"))
                        .definition(MetaBuilder::leaf("capacity", "uint16"))
                        .definition(
                            MetaBuilder::container("tray")
                                .definition(MetaBuilder::leaf("count", "uint8")),
                        ),
                ),
        )
        .build()
        .unwrap()
}

fn object(fields: Vec<(&str, Option<Json>)>) -> Json {
    Json::Object(
        fields
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
            .collect(),
    )
}

/// Station data with any subset of leaves and containers present
fn stations() -> impl Strategy<Value = Json> {
    let tray = prop::option::of(any::<u8>())
        .prop_map(|count| object(vec![("count", count.map(|c| json!(c)))]));
    let feeder = (
        prop::option::of("[a-z ]{0,10}"),
        prop::option::of(any::<u16>()),
        prop::option::of(tray),
    )
        .prop_map(|(seed, capacity, tray)| {
            object(vec![
                ("seed", seed.map(Json::from)),
                ("capacity", capacity.map(|c| json!(c))),
                ("tray", tray),
            ])
        });
    (
        prop::option::of("[a-z]{1,12}"),
        prop::option::of(any::<i32>()),
        prop::option::of(any::<bool>()),
        prop::option::of(feeder),
    )
        .prop_map(|(name, elevation, active, feeder)| {
            json!({
                "station": object(vec![
                    ("name", name.map(Json::from)),
                    ("elevation", elevation.map(|e| json!(e))),
                    ("active", active.map(Json::from)),
                    ("feeder", feeder),
                ])
            })
        })
}

proptest! {
    /// A container subtree survives save, encode, decode and restore
    #[test]
    fn nested_container_roundtrip(data in stations()) {
        let (root, _tree) = tree_selection(station_module(), data.clone());
        let station = root.find("station").unwrap();

        let text = save(&station).unwrap().to_json_string().unwrap();
        let restored = restore(&SnapshotDocument::from_json_str(&text).unwrap()).unwrap();

        prop_assert_eq!(render(&restored), render(&station));
        prop_assert_eq!(
            serde_json::from_str::<Json>(&render(&restored)).unwrap(),
            data["station"].clone()
        );
    }

    /// Restoring an inner container keeps only that subtree
    #[test]
    fn inner_container_roundtrip(data in stations()) {
        let (root, _tree) = tree_selection(station_module(), data.clone());
        if let Ok(feeder) = root.find("station/feeder") {
            let restored = restore(&save(&feeder).unwrap()).unwrap();
            prop_assert_eq!(render(&restored), render(&feeder));
            prop_assert_eq!(
                serde_json::from_str::<Json>(&render(&restored)).unwrap(),
                data["station"]["feeder"].clone()
            );
        }
    }

    /// A whole list survives save, encode, decode and restore
    #[test]
    fn whole_list_roundtrip(data in birds()) {
        let (root, _tree) = tree_selection(bird_module(), data);
        let list = root.find("bird").unwrap();

        let text = save(&list).unwrap().to_json_string().unwrap();
        let restored = restore(&SnapshotDocument::from_json_str(&text).unwrap()).unwrap();

        prop_assert_eq!(render(&restored), render(&list));
    }

    /// Every entry saved on its own restores to a one-entry list holding it
    #[test]
    fn list_item_roundtrip(data in birds()) {
        let (root, _tree) = tree_selection(bird_module(), data);
        let entries: Vec<_> = root
            .find("bird")
            .unwrap()
            .entries()
            .unwrap()
            .map(Result::unwrap)
            .collect();

        for entry in entries {
            let path = entry.path();
            let restored = restore(&save(&entry).unwrap()).unwrap();
            let again = restored.parent().unwrap().find(&path).unwrap();
            prop_assert_eq!(
                format!("{{\"bird\":[{}]}}", render(&entry)),
                render(&restored)
            );
            prop_assert_eq!(again.path(), path);
        }
    }
}
