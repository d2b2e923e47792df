use nodeconf_core::meta::MetaBuilder;
use nodeconf_core::node::json::{to_json_string, JsonReader};
use nodeconf_core::node::tree::TreeNode;
use nodeconf_core::{MetaRef, Selection};
use serde_json::Value as Json;

/// `list hobbies { key name; leaf name; container favorite { leaf label } }`
/// plus `container hockey { leaf favorite-team }`
#[allow(dead_code)]
pub fn hobbies_module() -> MetaRef {
    MetaBuilder::module("test")
        .definition(
            MetaBuilder::list("hobbies")
                .key("name")
                .definition(MetaBuilder::leaf("name", "string"))
                .definition(
                    MetaBuilder::container("favorite")
                        .definition(MetaBuilder::leaf("label", "string")),
                ),
        )
        .definition(
            MetaBuilder::container("hockey")
                .definition(MetaBuilder::leaf("favorite-team", "string")),
        )
        .build()
        .unwrap()
}

/// `container hobbies { container birding { leaf favorite-species } }`
#[allow(dead_code)]
pub fn birding_module() -> MetaRef {
    MetaBuilder::module("test")
        .definition(
            MetaBuilder::container("hobbies").definition(
                MetaBuilder::container("birding")
                    .definition(MetaBuilder::leaf("favorite-species", "string")),
            ),
        )
        .build()
        .unwrap()
}

/// `list bird { key id; leaf id (uint32); leaf name; leaf wingspan (int32) }`
#[allow(dead_code)]
pub fn bird_module() -> MetaRef {
    MetaBuilder::module("birds")
        .definition(
            MetaBuilder::list("bird")
                .key("id")
                .definition(MetaBuilder::leaf("id", "uint32"))
                .definition(MetaBuilder::leaf("name", "string"))
                .definition(MetaBuilder::leaf("wingspan", "int32")),
        )
        .build()
        .unwrap()
}

/// Root selection over a writable in-memory copy of `data`
#[allow(dead_code)]
pub fn tree_selection(meta: MetaRef, data: Json) -> (Selection, TreeNode) {
    let tree = TreeNode::from_json(data);
    let sel = Selection::new(meta, tree.node()).unwrap();
    (sel, tree)
}

/// Root selection over a read-only document
#[allow(dead_code)]
pub fn reader_selection(meta: MetaRef, data: &str) -> Selection {
    let reader = JsonReader::parse(data).unwrap();
    Selection::new(meta, reader.node()).unwrap()
}

/// Compact JSON of a selection's plain data
#[allow(dead_code)]
pub fn render(sel: &Selection) -> String {
    to_json_string(sel).unwrap()
}
