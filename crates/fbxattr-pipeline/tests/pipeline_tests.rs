//! End-to-end tests for container generation
//!
//! These tests cover:
//! - Scheduling by partial name match and deferred execution
//! - Idempotent re-materialization and preserved user fields
//! - Conflicts with foreign assets at the target path
//! - The filesystem host reading real binary FBX files

use std::cell::Cell;

use serde::{Deserialize, Serialize};
use serde_json::json;

use fbxattr_core::Error;
use fbxattr_parsers::{FbxSceneReader, FbxVersion, MemorySceneReader, Property, Scene, SceneWriter};
use fbxattr_pipeline::{
    AssetDatabase, Color, Container, ContainerData, Filter, FsAssetDatabase, ImportContext,
    ImportTrigger, MemoryAssetDatabase, ModelInstance, PipelineConfig, RuleDeclaration,
    RuleRegistry, StoredAsset, Vec3,
};

fbxattr_pipeline::attribute_enum! {
    pub enum Paint { Green, Blue, Red }
}

fbxattr_pipeline::mesh_attributes! {
    pub struct CarAttributes {
        "paint" => pub paint: Paint,
        "label" => pub label: String,
        "seats" => pub seats: i32,
        "mass" => pub mass: f32,
        "tint" => pub tint: Color,
        "offset" => pub offset: Vec3,
    }
}

thread_local! {
    /// Record count seen by the last post-import hook on this thread
    static HOOK_RECORDS: Cell<Option<usize>> = const { Cell::new(None) };
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CarContainer {
    #[serde(flatten)]
    pub data: ContainerData<CarAttributes>,
    /// Authored by hand, never touched by generation
    #[serde(default)]
    pub notes: String,
}

impl Container for CarContainer {
    type Record = CarAttributes;
    const TYPE_NAME: &'static str = "CarContainer";
    const FILTERS: &'static [Filter] = &[Filter::new("Car", "_Attributes")];

    fn data(&self) -> &ContainerData<CarAttributes> {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ContainerData<CarAttributes> {
        &mut self.data
    }

    fn on_post_import(&mut self) {
        HOOK_RECORDS.with(|seen| seen.set(Some(self.data.records.len())));
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LabelContainer {
    #[serde(flatten)]
    pub data: ContainerData<CarAttributes>,
}

impl Container for LabelContainer {
    type Record = CarAttributes;
    const TYPE_NAME: &'static str = "LabelContainer";

    fn data(&self) -> &ContainerData<CarAttributes> {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ContainerData<CarAttributes> {
        &mut self.data
    }
}

const MODEL_PATH: &str = "Models/SM_Car.fbx";
const TARGET_PATH: &str = "Models/SM_Car_Attributes.asset";

/// Helper to build the car scene: Car > [Wheel, Empty]
fn make_scene() -> Scene {
    let mut scene = Scene::new();
    let car = scene.add_node(scene.root(), "SM_Car");
    scene.node_mut(car).set_property(Property::string("label", "sedan"));
    scene.node_mut(car).set_property(Property::enumeration("paint", 1));

    let wheel = scene.add_node(car, "Wheel");
    scene.node_mut(wheel).mesh = Some("Wheel".to_string());
    scene.node_mut(wheel).materials = vec!["Rubber".to_string()];
    scene.node_mut(wheel).set_property(Property::int("seats", 0));
    scene.node_mut(wheel).set_property(Property::double("mass", 18.5));
    scene.node_mut(wheel).set_property(Property::color("tint", [0.1, 0.1, 0.1]));

    let body = scene.add_node(car, "Body");
    scene.node_mut(body).mesh = Some("Body".to_string());
    scene.node_mut(body).set_property(Property::int("seats", 4));
    scene.node_mut(body).set_property(Property::vector3("offset", [0.0, 0.5, 0.0]));

    scene.add_node(car, "Empty");
    scene
}

fn make_registry() -> RuleRegistry {
    RuleRegistry::builder().container::<CarContainer>().build()
}

fn memory_hosts() -> (MemoryAssetDatabase, MemorySceneReader) {
    let scene = make_scene();
    let database = MemoryAssetDatabase::new().with_model(ModelInstance::from_scene(MODEL_PATH, &scene));
    let scenes = MemorySceneReader::new().with_scene(MODEL_PATH, scene);
    (database, scenes)
}

fn import(
    registry: &RuleRegistry,
    database: &mut dyn AssetDatabase,
    scenes: &MemorySceneReader,
) -> Vec<fbxattr_pipeline::MaterializeOutcome> {
    let mut trigger = ImportTrigger::new(registry, PipelineConfig::default());
    trigger.on_postprocess_model("SM_Car", MODEL_PATH);
    let mut ctx = ImportContext::new(database, scenes);
    trigger.run_deferred(&mut ctx)
}

mod generation_tests {
    use super::*;

    #[test]
    fn test_creates_container() {
        let registry = make_registry();
        let (mut database, scenes) = memory_hosts();

        let outcomes = import(&registry, &mut database, &scenes);
        assert_eq!(outcomes.len(), 1);
        let report = outcomes[0].result.as_ref().unwrap();
        assert!(report.created);
        assert_eq!(report.records, 2);
        assert_eq!(report.target, TARGET_PATH);

        let stored = database.asset(TARGET_PATH).unwrap();
        assert!(stored.is_container_of("CarContainer"));

        let container: CarContainer = stored.decode().unwrap();
        let source = container.data.source.as_ref().unwrap();
        assert_eq!(source.path, MODEL_PATH);
        assert_eq!(source.name, "SM_Car");

        let records = &container.data.records;
        assert_eq!(records[0].mesh.as_ref().unwrap().name, "Wheel");
        assert_eq!(records[0].materials, vec!["Rubber".to_string()]);
        assert_eq!(records[0].paint, Paint::Blue);
        assert_eq!(records[0].label, "sedan");
        assert_eq!(records[0].mass, 18.5);
        assert_eq!(records[1].mesh.as_ref().unwrap().name, "Body");
        assert_eq!(records[1].seats, 4);
        assert_eq!(records[1].offset, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(records[1].tint, Color::CLEAR);

        assert_eq!(database.reimports(), [TARGET_PATH.to_string()]);
    }

    #[test]
    fn test_rematerialization_is_idempotent() {
        let registry = make_registry();
        let (mut database, scenes) = memory_hosts();

        import(&registry, &mut database, &scenes);
        let first = database.asset(TARGET_PATH).unwrap().clone();

        let outcomes = import(&registry, &mut database, &scenes);
        let report = outcomes[0].result.as_ref().unwrap();
        assert!(!report.created);
        assert_eq!(database.asset(TARGET_PATH).unwrap(), &first);
    }

    #[test]
    fn test_user_fields_survive() {
        let registry = make_registry();
        let (mut database, scenes) = memory_hosts();

        import(&registry, &mut database, &scenes);

        let mut container: CarContainer = database.asset(TARGET_PATH).unwrap().decode().unwrap();
        container.notes = "checked by art".to_string();
        container.data.records.clear();
        database
            .save_asset(TARGET_PATH, StoredAsset::from_container(&container).unwrap())
            .unwrap();

        import(&registry, &mut database, &scenes);

        let container: CarContainer = database.asset(TARGET_PATH).unwrap().decode().unwrap();
        assert_eq!(container.notes, "checked by art");
        assert_eq!(container.data.records.len(), 2);
    }

    #[test]
    fn test_post_import_hook_sees_committed_records() {
        let registry = make_registry();
        let (mut database, scenes) = memory_hosts();
        HOOK_RECORDS.with(|seen| seen.set(None));

        let outcomes = import(&registry, &mut database, &scenes);
        let report = outcomes[0].result.as_ref().unwrap();

        let stored: CarContainer = database.asset(TARGET_PATH).unwrap().decode().unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(HOOK_RECORDS.with(Cell::get), Some(report.records));
        assert_eq!(HOOK_RECORDS.with(Cell::get), Some(stored.data.records.len()));
    }

    #[test]
    fn test_non_matching_model_schedules_nothing() {
        let registry = make_registry();
        let mut trigger = ImportTrigger::new(&registry, PipelineConfig::default());
        assert_eq!(trigger.on_postprocess_model("Boat", "Models/Boat.fbx"), 0);

        let (mut database, scenes) = memory_hosts();
        let mut ctx = ImportContext::new(&mut database, &scenes);
        assert!(trigger.run_deferred(&mut ctx).is_empty());
    }
}

mod conflict_tests {
    use super::*;

    #[test]
    fn test_foreign_asset_is_left_untouched() {
        let registry = make_registry();
        let (mut database, scenes) = memory_hosts();
        let foreign = StoredAsset::other("Material", json!({ "shader": "Lit" }));
        database.insert_asset(TARGET_PATH, foreign.clone());

        let outcomes = import(&registry, &mut database, &scenes);
        let error = outcomes[0].result.as_ref().unwrap_err();

        assert!(error.is_conflict());
        assert!(error.to_string().contains(TARGET_PATH));
        assert!(error.to_string().contains("SM_Car"));
        assert_eq!(database.asset(TARGET_PATH), Some(&foreign));
        assert!(database.reimports().is_empty());
    }

    #[test]
    fn test_other_registered_container_is_refreshed() {
        let registry = RuleRegistry::builder()
            .container::<CarContainer>()
            .rule(RuleDeclaration::of::<LabelContainer>("", "_Labels"))
            .build();
        let (mut database, scenes) = memory_hosts();
        let other = StoredAsset::from_container(&LabelContainer::default()).unwrap();
        database.insert_asset(TARGET_PATH, other);

        let outcomes = import(&registry, &mut database, &scenes);
        let report = outcomes[0].result.as_ref().unwrap();
        assert_eq!(report.container, "LabelContainer");
        assert_eq!(report.records, 2);
        assert!(!report.created);

        let stored = database.asset(TARGET_PATH).unwrap();
        assert!(stored.is_container_of("LabelContainer"));
        let container: LabelContainer = stored.decode().unwrap();
        assert_eq!(container.data.source.as_ref().unwrap().name, "SM_Car");
        assert_eq!(container.data.records[1].seats, 4);
        assert_eq!(database.reimports(), [TARGET_PATH.to_string()]);
    }

    #[test]
    fn test_unregistered_container_type_conflicts() {
        let registry = make_registry();
        let (mut database, scenes) = memory_hosts();
        let other = StoredAsset::from_container(&LabelContainer::default()).unwrap();
        database.insert_asset(TARGET_PATH, other.clone());

        let outcomes = import(&registry, &mut database, &scenes);
        assert!(matches!(outcomes[0].result, Err(Error::Conflict { .. })));
        assert_eq!(database.asset(TARGET_PATH), Some(&other));
        assert!(database.reimports().is_empty());
    }

    #[test]
    fn test_undecodable_container_conflicts() {
        let registry = make_registry();
        let (mut database, scenes) = memory_hosts();
        let broken = StoredAsset {
            asset_type: StoredAsset::CONTAINER_TYPE.to_string(),
            container: Some("CarContainer".to_string()),
            data: json!({ "records": "not a list" }),
        };
        database.insert_asset(TARGET_PATH, broken.clone());

        let outcomes = import(&registry, &mut database, &scenes);
        assert!(matches!(outcomes[0].result, Err(Error::Conflict { .. })));
        assert_eq!(database.asset(TARGET_PATH), Some(&broken));
    }

    #[test]
    fn test_failures_are_isolated() {
        let registry = RuleRegistry::builder()
            .container::<CarContainer>()
            .rule(RuleDeclaration::of::<LabelContainer>("^SM_", "_Labels"))
            .build();
        let (mut database, scenes) = memory_hosts();
        database.insert_asset(TARGET_PATH, StoredAsset::other("Material", json!({})));

        let outcomes = import(&registry, &mut database, &scenes);
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_ok());
        assert!(outcomes[1].is_ok());
        assert!(database.asset("Models/SM_Car_Labels.asset").is_some());
    }

    #[test]
    fn test_unreadable_scene_persists_nothing() {
        let registry = make_registry();
        let (mut database, _) = memory_hosts();
        let empty = MemorySceneReader::new();

        let outcomes = import(&registry, &mut database, &empty);
        assert!(matches!(outcomes[0].result, Err(Error::SceneRead { .. })));
        assert!(database.asset(TARGET_PATH).is_none());
    }
}

mod registry_tests {
    use super::*;

    #[test]
    fn test_late_declaration_is_seen() {
        let registry = RuleRegistry::new();
        let (mut database, scenes) = memory_hosts();

        assert!(import(&registry, &mut database, &scenes).is_empty());

        registry.register_container::<CarContainer>();
        assert_eq!(import(&registry, &mut database, &scenes).len(), 1);
    }
}

mod filesystem_tests {
    use super::*;

    #[test]
    fn test_import_from_binary_fbx() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Models")).unwrap();

        for version in [FbxVersion::V7_4, FbxVersion::V7_5] {
            let file = std::fs::File::create(dir.path().join(MODEL_PATH)).unwrap();
            SceneWriter::new(version).write(&make_scene(), file).unwrap();

            let registry = make_registry();
            let mut database = FsAssetDatabase::new(dir.path());
            let scenes = FbxSceneReader::new(dir.path());

            let mut trigger = ImportTrigger::new(&registry, PipelineConfig::default());
            assert_eq!(trigger.on_postprocess_model("SM_Car", MODEL_PATH), 1);

            let mut ctx = ImportContext::new(&mut database, &scenes);
            let outcomes = trigger.run_deferred(&mut ctx);
            let report = outcomes[0].result.as_ref().unwrap();
            assert_eq!(report.records, 2);

            let text = std::fs::read_to_string(dir.path().join(TARGET_PATH)).unwrap();
            let stored: StoredAsset = serde_json::from_str(&text).unwrap();
            let container: CarContainer = stored.decode().unwrap();
            assert_eq!(container.data.records[0].label, "sedan");
            assert_eq!(container.data.records[1].seats, 4);
        }
    }
}
