use std::path::PathBuf;

fn exe() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lale-expr"))
}

#[test]
fn cli_fmt_prints_canonical_text() {
    let out = std::process::Command::new(exe())
        .args(["fmt", "mean( it.sales )"])
        .output()
        .unwrap();

    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap().trim(), "mean(it.sales)");
}

#[test]
fn cli_fmt_rejects_bad_text() {
    let out = std::process::Command::new(exe())
        .args(["fmt", "mean(it."])
        .output()
        .unwrap();

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("parse expression"));
}

#[test]
fn cli_tree_prints_json() {
    let out = std::process::Command::new(exe())
        .args(["tree", "it.x"])
        .output()
        .unwrap();

    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["kind"], "attribute");
    assert_eq!(v["attr"], "x");
}

#[test]
fn cli_aggregate_prints_hyperparams() {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("aggregate.json");
    let fixture_arg = fixture.to_string_lossy().to_string();

    let out = std::process::Command::new(exe())
        .args(["aggregate", "--in", fixture_arg.as_str()])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["avg_sales"], "mean(it.sales)");
    let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["avg_sales", "n_orders", "first_month", "region"]);

    let out = std::process::Command::new(exe())
        .args(["aggregate", "--in", fixture_arg.as_str(), "--label"])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8(out.stdout).unwrap().starts_with("Aggregate:\nmean sales"));
}
