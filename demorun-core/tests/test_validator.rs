mod common;
use anyhow::Result;
use common::{dataset, init_logger};
use demorun_core::{
    dataset::{DatasetStore, Demonstration, MemoryStore},
    error::DemorunError,
    validator::{CheckKind, Tolerance, Validator},
};
use ndarray::{Array1, Axis};

fn load(store: &MemoryStore, id: &str) -> Result<Demonstration> {
    Demonstration::load(store, id)
}

#[test]
fn test_consistent_demo_passes() -> Result<()> {
    init_logger();
    let store = dataset(&[12], 3);
    let report = Validator::new().action_dim(3).validate(&load(&store, "demo_0")?);
    report.log();
    assert!(report.is_ok());
    assert!(report.checks.iter().all(|c| c.performed));
    Ok(())
}

#[test]
fn test_continuity_violation_is_located() -> Result<()> {
    let mut store = dataset(&[10], 2);
    let mut next_obs = store.read_f64("data/demo_0/next_obs/pos")?;
    next_obs.index_axis_mut(Axis(0), 3)[[0]] += 1e-3;
    store.insert("data/demo_0/next_obs/pos", next_obs);

    let report = Validator::new().validate(&load(&store, "demo_0")?);
    let alignment = report.check(CheckKind::Alignment).unwrap();
    assert_eq!(
        alignment.issues[0],
        DemorunError::DataIntegrity {
            demo: "demo_0".to_string(),
            channel: Some("pos".to_string()),
            timestep: Some(3),
            msg: "obs[4] differs from next_obs[3]".to_string(),
        }
    );
    assert!(report.check(CheckKind::Shape).unwrap().passed());
    Ok(())
}

#[test]
fn test_one_step_offset_is_flagged_at_first_step() -> Result<()> {
    let mut store = dataset(&[10], 2);
    let obs = store.read_f64("data/demo_0/obs/pos")?;
    store.insert("data/demo_0/next_obs/pos", obs);

    let report = Validator::new().validate(&load(&store, "demo_0")?);
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        DemorunError::DataIntegrity {
            timestep: Some(0),
            ..
        }
    ));
    Ok(())
}

#[test]
fn test_difference_within_tolerance_is_accepted() -> Result<()> {
    let mut store = dataset(&[10], 2);
    let mut next_obs = store.read_f64("data/demo_0/next_obs/pos")?;
    next_obs.index_axis_mut(Axis(0), 5)[[1]] += 1e-4;
    store.insert("data/demo_0/next_obs/pos", next_obs);
    let demo = load(&store, "demo_0")?;

    assert!(!Validator::new().validate(&demo).is_ok());
    let loose = Tolerance {
        atol: 1e-3,
        rtol: 0.0,
    };
    assert!(Validator::new().tolerance(loose).validate(&demo).is_ok());
    Ok(())
}

#[test]
fn test_extra_reward_is_flagged() -> Result<()> {
    let mut store = dataset(&[8], 2);
    store.insert("data/demo_0/rewards", Array1::<f64>::zeros(9).into_dyn());
    let report = Validator::new().validate(&load(&store, "demo_0")?);

    let length = report.check(CheckKind::Length).unwrap();
    assert_eq!(length.issues.len(), 1);
    assert!(matches!(
        &length.issues[0],
        DemorunError::DataIntegrity { channel: Some(c), .. } if c == "rewards"
    ));
    Ok(())
}

#[test]
fn test_missing_dones_are_flagged() -> Result<()> {
    let mut store = dataset(&[8], 2);
    store.remove("data/demo_0/dones");
    let demo = load(&store, "demo_0")?;
    assert!(demo.dones.is_empty());

    let report = Validator::new().validate(&demo);
    assert!(!report.check(CheckKind::Length).unwrap().passed());
    Ok(())
}

#[test]
fn test_short_channel_is_flagged() -> Result<()> {
    let mut store = dataset(&[8], 2);
    let obs = store.read_f64("data/demo_0/obs/pos")?;
    let short = obs.slice_axis(Axis(0), (0..7).into()).to_owned();
    store.insert("data/demo_0/obs/pos", short);

    let report = Validator::new().validate(&load(&store, "demo_0")?);
    let shape = report.check(CheckKind::Shape).unwrap();
    assert!(matches!(
        &shape.issues[0],
        DemorunError::DataIntegrity { channel: Some(c), .. } if c == "obs/pos"
    ));
    Ok(())
}

#[test]
fn test_action_shape_against_env() -> Result<()> {
    let store = dataset(&[4], 1);
    let demo = load(&store, "demo_0")?;
    let report = Validator::new().action_dim(7).validate(&demo);
    assert_eq!(
        report.check(CheckKind::ActionShape).unwrap().issues,
        vec![DemorunError::ActionShape {
            expected: 7,
            actual: vec![1],
            timestep: Some(0),
        }]
    );

    let report = Validator::new().validate(&demo);
    assert!(!report.check(CheckKind::ActionShape).unwrap().performed);
    Ok(())
}

#[test]
fn test_alignment_skipped_without_next_obs() -> Result<()> {
    let mut store = dataset(&[4], 2);
    store.remove("data/demo_0/next_obs/pos");
    let report = Validator::new().validate(&load(&store, "demo_0")?);
    let alignment = report.check(CheckKind::Alignment).unwrap();
    assert!(!alignment.performed);
    assert!(report.is_ok());
    Ok(())
}

#[test]
fn test_unreadable_demo_does_not_stop_validation() -> Result<()> {
    init_logger();
    let mut store = dataset(&[5, 6, 4], 2);
    store.remove("data/demo_0/actions");
    store.insert("data/demo_2/rewards", Array1::<f64>::zeros(5).into_dyn());

    let validation = Validator::new().action_dim(2).validate_dataset(&store)?;
    assert_eq!(validation.n_demos(), 3);
    assert_eq!(validation.unreadable.len(), 1);
    assert_eq!(validation.unreadable[0].0, "demo_0");
    let ids: Vec<_> = validation.reports.iter().map(|r| r.demo.as_str()).collect();
    assert_eq!(ids, vec!["demo_1", "demo_2"]);
    assert!(validation.reports[0].is_ok());
    assert!(!validation.reports[1].is_ok());
    assert_eq!(validation.n_invalid(), 2);
    assert!(!validation.is_ok());

    let validation = Validator::new().validate_dataset(&dataset(&[3, 3], 2))?;
    assert!(validation.is_ok());
    Ok(())
}
