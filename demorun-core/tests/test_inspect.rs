mod common;
use anyhow::Result;
use common::dataset;
use demorun_core::dataset::DatasetInfo;

#[test]
fn test_dataset_info() -> Result<()> {
    let mut store = dataset(&[4, 6, 5], 2);
    store.remove("data/demo_2/actions");

    let info = DatasetInfo::collect(&store, 2)?;
    assert_eq!(info.n_demos, 3);
    let samples: Vec<_> = info.demos.iter().map(|d| d.n_samples).collect();
    assert_eq!(samples, vec![Some(4), Some(6), None]);

    let first = info.first_demo.as_ref().unwrap();
    assert_eq!(first.id, "demo_0");
    assert_eq!(
        first.keys,
        vec!["actions", "dones", "next_obs", "obs", "rewards", "states"]
    );
    assert_eq!(first.timesteps.len(), 2);
    assert_eq!(first.timesteps[1].obs["pos"].len(), 2);
    assert_eq!(first.dones, vec![false, false, false, true]);
    assert_eq!(first.model_file.as_deref(), Some("<mujoco model=\"lift\"/>"));

    let meta = info.env_meta.as_ref().unwrap();
    assert_eq!(meta.env_name, "Lift");
    assert_eq!(meta.controller_type(), Some("OSC_POSE"));

    let json = serde_json::to_value(&info)?;
    assert_eq!(json["demos"][2]["n_samples"], serde_json::Value::Null);
    Ok(())
}

#[test]
fn test_dataset_without_env_args() -> Result<()> {
    let mut store = demorun_core::dataset::MemoryStore::new();
    common::insert_demo(&mut store, "demo_0", 3, 2);
    let info = DatasetInfo::collect(&store, 10)?;
    assert!(info.env_meta.is_none());
    assert_eq!(info.first_demo.unwrap().timesteps.len(), 3);
    Ok(())
}

#[test]
fn test_first_demo_without_actions() -> Result<()> {
    let mut store = dataset(&[4, 6], 2);
    store.remove("data/demo_0/actions");

    let info = DatasetInfo::collect(&store, 2)?;
    assert_eq!(info.n_demos, 2);
    assert_eq!(info.demos[0].n_samples, None);
    assert_eq!(info.demos[1].n_samples, Some(6));
    assert_eq!(info.first_demo.unwrap().id, "demo_1");

    let mut store = dataset(&[3], 2);
    store.remove("data/demo_0/actions");
    let info = DatasetInfo::collect(&store, 2)?;
    assert!(info.first_demo.is_none());
    Ok(())
}
