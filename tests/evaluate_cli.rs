mod support;

use support::{parse_scores, run_tool, stderr, stdout, write_feature_csv};
use tempfile::tempdir;
use validator_pipeline::ml::ModelArtifact;
use validator_pipeline::ml::gbdt::{GbdtModel, MODEL_VERSION, Node, RegressionTree};

const EXE: &str = env!("CARGO_BIN_EXE_validator-eval");

fn threshold_model() -> ModelArtifact {
    ModelArtifact::from(GbdtModel {
        model_version: MODEL_VERSION,
        feature_names: vec!["f0".into(), "f1".into()],
        learning_rate: 1.0,
        init_raw: 0.0,
        trees: vec![RegressionTree {
            nodes: vec![
                Node::Split {
                    feature_index: 0,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: -2.0 },
                Node::Leaf { value: 2.0 },
            ],
        }],
    })
}

#[test]
fn prints_first_five_probabilities() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("model.json");
    threshold_model().save(&model).unwrap();
    let rows: Vec<Vec<f32>> = (0..8).map(|i| vec![(i % 2) as f32, i as f32]).collect();
    let data = write_feature_csv(&dir.path().join("data.csv"), &["f0", "f1"], &rows);

    let output = run_tool(
        EXE,
        dir.path(),
        &[model.to_str().unwrap(), data.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let (label, values) = parse_scores(&stdout(&output));
    assert_eq!(label, "probs");
    assert_eq!(values.len(), 5);
    assert!(values.iter().all(|p| (0.0..=1.0).contains(p)));
    assert!(values[0] < 0.5 && values[1] > 0.5);
}

#[test]
fn short_files_print_every_row() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("model.json");
    threshold_model().save(&model).unwrap();
    let data = write_feature_csv(
        &dir.path().join("data.csv"),
        &["f0", "f1"],
        &[vec![0.0, 0.0], vec![1.0, 0.0]],
    );

    let output = run_tool(
        EXE,
        dir.path(),
        &[model.to_str().unwrap(), data.to_str().unwrap()],
    );
    let (_, values) = parse_scores(&stdout(&output));
    assert_eq!(values.len(), 2);
}

#[test]
fn missing_arguments_print_usage() {
    let dir = tempdir().unwrap();
    for args in [&[][..], &["model.json"][..]] {
        let output = run_tool(EXE, dir.path(), args);
        assert_eq!(output.status.code(), Some(1));
        assert!(stdout(&output).contains("Usage: validator-eval"));
    }
}

#[test]
fn unreadable_model_exits_with_error() {
    let dir = tempdir().unwrap();
    let data = write_feature_csv(&dir.path().join("data.csv"), &["f0"], &[vec![1.0]]);
    let output = run_tool(
        EXE,
        dir.path(),
        &[
            dir.path().join("absent.json").to_str().unwrap(),
            data.to_str().unwrap(),
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to read model"));
}

#[test]
fn preview_rows_follow_config() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("validator-pipeline")).unwrap();
    std::fs::write(
        dir.path().join("validator-pipeline").join("config.toml"),
        "[evaluate]\npreview_rows = 3\n",
    )
    .unwrap();
    let model = dir.path().join("model.json");
    threshold_model().save(&model).unwrap();
    let rows: Vec<Vec<f32>> = (0..8).map(|i| vec![0.0, i as f32]).collect();
    let data = write_feature_csv(&dir.path().join("data.csv"), &["f0", "f1"], &rows);

    let output = run_tool(
        EXE,
        dir.path(),
        &[model.to_str().unwrap(), data.to_str().unwrap()],
    );
    let (_, values) = parse_scores(&stdout(&output));
    assert_eq!(values.len(), 3);
}

#[test]
fn extra_arguments_are_ignored() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("model.json");
    threshold_model().save(&model).unwrap();
    let data = write_feature_csv(&dir.path().join("data.csv"), &["f0", "f1"], &[vec![1.0, 0.0]]);

    let output = run_tool(
        EXE,
        dir.path(),
        &[model.to_str().unwrap(), data.to_str().unwrap(), "leftover"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let (label, values) = parse_scores(&stdout(&output));
    assert_eq!(label, "probs");
    assert_eq!(values.len(), 1);
}
