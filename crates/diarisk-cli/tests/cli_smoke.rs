use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn diarisk() -> Command {
    let mut cmd = Command::cargo_bin("diarisk").expect("binary is built");
    cmd.env("DIARISK_LOG", "error");
    cmd
}

fn train_into(dir: &Path) {
    diarisk()
        .args(["train", "--no-report", "-o"])
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected"));
}

const POSITIVE: [&str; 16] = [
    "--pregnancies", "6", "--glucose", "148", "--blood-pressure", "72", "--skin-thickness", "35",
    "--insulin", "0", "--bmi", "33.6", "--pedigree", "0.627", "--age", "50",
];

#[test]
fn help_lists_subcommands() {
    diarisk()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("predict"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn predict_without_model_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    diarisk()
        .args(["predict", "-m"])
        .arg(dir.path().join("model"))
        .args(POSITIVE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No trained model"));
}

#[test]
fn out_of_range_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = POSITIVE;
    args[3] = "450";
    diarisk()
        .args(["predict", "-m"])
        .arg(dir.path())
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Glucose"));
}

#[test]
fn train_predict_and_history_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("model");
    let history = dir.path().join("history.json");
    let csv = dir.path().join("history.csv");

    train_into(&model);
    for file in ["classifier.json", "scaler.json", "metrics.json", "training_config.json"] {
        assert!(model.join(file).is_file(), "{} missing", file);
    }
    assert!(!model.join("training_report.html").exists());

    diarisk()
        .args(["predict", "-m"])
        .arg(&model)
        .args(["--subject", "alice", "--history"])
        .arg(&history)
        .args(POSITIVE)
        .assert()
        .success()
        .stdout(predicate::str::contains("Risk"));

    diarisk()
        .args(["history", "alice", "--history"])
        .arg(&history)
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 assessment(s) for 'alice'"));

    let exported = fs::read_to_string(&csv).unwrap();
    assert!(exported.starts_with("Date,Risk Level,Probability %"));
    assert_eq!(exported.lines().count(), 2);

    diarisk()
        .args(["history", "alice", "--clear", "--history"])
        .arg(&history)
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1"));
}

#[test]
fn json_input_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("model");
    train_into(&model);

    let input = dir.path().join("records.json");
    fs::write(
        &input,
        r#"[{"pregnancies":1,"glucose":85,"blood_pressure":66,"skin_thickness":29,"insulin":0,"bmi":26.6,"pedigree":0.351,"age":31},
            {"pregnancies":6,"glucose":148,"blood_pressure":72,"skin_thickness":35,"insulin":0,"bmi":33.6,"pedigree":0.627,"age":50}]"#,
    )
    .unwrap();

    let output = diarisk()
        .args(["predict", "--json", "-m"])
        .arg(&model)
        .arg("-i")
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 2);
    for item in items {
        let p = item["probability"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert!(item["tier"].is_string());
    }
}
