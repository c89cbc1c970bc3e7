//! Integration tests for the studio CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI bound to a throwaway data dir and config home
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("studio"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn json(dir: &Path, args: &[&str]) -> Value {
    let output = cli(dir).args(args).arg("--json").assert().success();
    serde_json::from_slice(&output.get_output().stdout).expect("stdout should be JSON")
}

fn add_monday_class(dir: &Path, movements: &[&str]) -> String {
    let mut args = vec![
        "classes", "add", "--title", "Monday Reformer", "--date", "2024-03-04", "--start", "09:00",
        "--duration", "60", "--weekly", "mon",
    ];
    for m in movements {
        args.push("--movement");
        args.push(*m);
    }
    json(dir, &args)["id"].as_str().unwrap().to_string()
}

#[test]
fn test_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("calendar"))
        .stdout(predicate::str::contains("templates"));
}

#[test]
fn test_movements_list_shows_seed_catalog() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["movements", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The Hundred"))
        .stdout(predicate::str::contains("Short Spine"));
}

#[test]
fn test_movements_list_by_category() {
    let temp_dir = setup_test_dir();
    let movements = json(temp_dir.path(), &["movements", "list", "--category", "core"]);
    let ids: Vec<_> = movements
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"single_leg_stretch"));
    assert!(ids.contains(&"double_leg_stretch"));
}

#[test]
fn test_movement_add_and_show() {
    let temp_dir = setup_test_dir();
    let added = json(
        temp_dir.path(),
        &["movements", "add", "--name", "Teaser", "--category", "Core", "--level", "Advanced", "--precaution", "high"],
    );
    assert_eq!(added["precautionLevel"], "High");
    assert_eq!(added["isCatalogSeed"], false);

    cli(temp_dir.path())
        .args(["movements", "show", added["id"].as_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Teaser"))
        .stdout(predicate::str::contains("precaution High"));
}

#[test]
fn test_movement_add_rejects_unknown_precaution() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["movements", "add", "--name", "Teaser", "--category", "Core", "--precaution", "extreme"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("extreme"));
}

#[test]
fn test_recurring_class_resolves_in_range() {
    let temp_dir = setup_test_dir();
    let id = add_monday_class(temp_dir.path(), &[]);

    let view = json(
        temp_dir.path(),
        &["calendar", "range", "--from", "2024-03-01", "--to", "2024-03-31"],
    );
    let starts: Vec<_> = view["occurrences"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| {
            assert_eq!(o["classDefinitionId"], id.as_str());
            o["start"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        starts,
        vec![
            "2024-03-04T09:00:00",
            "2024-03-11T09:00:00",
            "2024-03-18T09:00:00",
            "2024-03-25T09:00:00"
        ]
    );
}

#[test]
fn test_recurrence_end_date_is_inclusive() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args([
            "classes", "add", "--title", "Short Run", "--date", "2024-03-04", "--weekly", "1",
            "--until", "2024-03-11",
        ])
        .assert()
        .success();

    let view = json(
        temp_dir.path(),
        &["calendar", "range", "--from", "2024-03-01", "--to", "2024-03-31"],
    );
    assert_eq!(view["occurrences"].as_array().unwrap().len(), 2);
}

#[test]
fn test_class_defaults_from_config() {
    let temp_dir = setup_test_dir();
    let class = json(
        temp_dir.path(),
        &["classes", "add", "--title", "Drop-in", "--date", "2024-03-05"],
    );
    assert_eq!(class["schedule"]["anchor"]["start"], "2024-03-05T09:00:00");
    assert_eq!(class["schedule"]["anchor"]["durationMinutes"], 60);
    assert_eq!(class["schedule"]["recurrence"]["kind"], "none");
    assert_eq!(class["category"], "Regular");
}

#[test]
fn test_calendar_text_output() {
    let temp_dir = setup_test_dir();
    add_monday_class(temp_dir.path(), &[]);

    cli(temp_dir.path())
        .args(["calendar", "day", "--date", "2024-03-11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("09:00-10:00  Monday Reformer"));

    cli(temp_dir.path())
        .args(["calendar", "day", "--date", "2024-03-12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monday Reformer").not());
}

#[test]
fn test_month_view_covers_six_weeks() {
    let temp_dir = setup_test_dir();
    add_monday_class(temp_dir.path(), &[]);

    let view = json(
        temp_dir.path(),
        &["calendar", "month", "--year", "2024", "--month", "3"],
    );
    assert_eq!(view["window"]["start"], "2024-02-25");
    assert_eq!(view["window"]["end"], "2024-04-06");
    assert_eq!(view["occurrences"].as_array().unwrap().len(), 5);
}

#[test]
fn test_reversed_range_fails() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["calendar", "range", "--from", "2024-03-31", "--to", "2024-03-01"])
        .assert()
        .failure();
}

#[test]
fn test_sequence_stats() {
    let temp_dir = setup_test_dir();
    let id = add_monday_class(temp_dir.path(), &["the_hundred", "short_spine", "elephant"]);

    let stats = json(temp_dir.path(), &["classes", "stats", id.as_str()]);
    assert_eq!(stats["movementCount"], 3);
    assert_eq!(stats["estimatedMinutes"], 14);
    assert_eq!(stats["highRiskCount"], 1);

    cli(temp_dir.path())
        .args(["classes", "stats", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("The Hundred"))
        .stdout(predicate::str::contains("Estimated: ~14 min"));
}

#[test]
fn test_sequence_editing() {
    let temp_dir = setup_test_dir();
    let id = add_monday_class(temp_dir.path(), &["the_hundred", "elephant"]);

    let sequence = json(temp_dir.path(), &["classes", "append", id.as_str(), "short_spine"]);
    assert_eq!(sequence, serde_json::json!(["the_hundred", "elephant", "short_spine"]));

    // Appending an existing movement is a no-op
    let sequence = json(temp_dir.path(), &["classes", "append", id.as_str(), "elephant"]);
    assert_eq!(sequence.as_array().unwrap().len(), 3);

    let sequence = json(temp_dir.path(), &["classes", "move", id.as_str(), "2", "0"]);
    assert_eq!(sequence, serde_json::json!(["short_spine", "the_hundred", "elephant"]));

    let sequence = json(temp_dir.path(), &["classes", "drop", id.as_str(), "1"]);
    assert_eq!(sequence, serde_json::json!(["short_spine", "elephant"]));

    cli(temp_dir.path())
        .args(["classes", "drop", id.as_str(), "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IndexOutOfRange"));
}

#[test]
fn test_copy_class_is_single_and_renamed() {
    let temp_dir = setup_test_dir();
    let id = add_monday_class(temp_dir.path(), &["the_hundred"]);

    let copy = json(temp_dir.path(), &["classes", "copy", id.as_str()]);
    assert_ne!(copy["id"], id.as_str());
    assert_eq!(copy["title"], "Monday Reformer (Copy)");
    assert_eq!(copy["schedule"]["recurrence"]["kind"], "none");
    assert_eq!(copy["sequence"], serde_json::json!(["the_hundred"]));

    let classes = json(temp_dir.path(), &["classes", "list"]);
    assert_eq!(classes.as_array().unwrap().len(), 2);
}

#[test]
fn test_template_save_and_use() {
    let temp_dir = setup_test_dir();
    let id = add_monday_class(temp_dir.path(), &["footwork_series", "rowing_series"]);

    let template = json(temp_dir.path(), &["templates", "save", id.as_str()]);
    assert_eq!(template["name"], "Monday Reformer Template");
    assert_eq!(template["durationMinutes"], 60);
    assert_eq!(template["sequence"], serde_json::json!(["footwork_series", "rowing_series"]));

    let class = json(
        temp_dir.path(),
        &["templates", "use", template["id"].as_str().unwrap()],
    );
    assert_eq!(class["title"], "Monday Reformer Template");
    assert_eq!(class["sequence"], template["sequence"]);
    assert_eq!(class["schedule"]["anchor"]["durationMinutes"], 60);

    cli(temp_dir.path())
        .args(["templates", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monday Reformer Template"));
}

#[test]
fn test_named_template() {
    let temp_dir = setup_test_dir();
    let id = add_monday_class(temp_dir.path(), &[]);

    let template = json(temp_dir.path(), &["templates", "save", id.as_str(), "--name", "Core Burner"]);
    assert_eq!(template["name"], "Core Burner");
}

#[test]
fn test_removed_movement_leaves_dangling_reference() {
    let temp_dir = setup_test_dir();
    let id = add_monday_class(temp_dir.path(), &["the_hundred", "elephant"]);

    cli(temp_dir.path())
        .args(["check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All sequence entries resolve"));

    cli(temp_dir.path())
        .args(["movements", "remove", "the_hundred"])
        .assert()
        .success();

    let dangling = json(temp_dir.path(), &["check"]);
    assert_eq!(
        dangling,
        serde_json::json!([{ "owner": "class", "ownerId": id, "movementId": "the_hundred" }])
    );

    // The class keeps the id and stats still count it
    let stats = json(temp_dir.path(), &["classes", "stats", id.as_str()]);
    assert_eq!(stats["movementCount"], 2);
    assert_eq!(stats["highRiskCount"], 0);
}

#[test]
fn test_unknown_ids_fail() {
    let temp_dir = setup_test_dir();
    for args in [
        vec!["classes", "stats", "missing"],
        vec!["classes", "copy", "missing"],
        vec!["classes", "remove", "missing"],
        vec!["templates", "use", "missing"],
        vec!["movements", "show", "missing"],
    ] {
        cli(temp_dir.path())
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("NotFound"));
    }
}

#[test]
fn test_invalid_weekly_days_fail() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["classes", "add", "--title", "Bad", "--date", "2024-03-04", "--weekly", "9"])
        .assert()
        .failure();

    cli(temp_dir.path())
        .args([
            "classes", "add", "--title", "Bad", "--date", "2024-03-04", "--weekly", "mon",
            "--until", "2024-03-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation"));

    // Nothing was stored
    let classes = json(temp_dir.path(), &["classes", "list"]);
    assert!(classes.as_array().unwrap().is_empty());
}

#[test]
fn test_class_remove() {
    let temp_dir = setup_test_dir();
    let id = add_monday_class(temp_dir.path(), &[]);

    cli(temp_dir.path())
        .args(["classes", "remove", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed class"));

    let view = json(
        temp_dir.path(),
        &["calendar", "range", "--from", "2024-03-01", "--to", "2024-03-31"],
    );
    assert!(view["occurrences"].as_array().unwrap().is_empty());
}

fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_movements_list_filters() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    let intermediate = json(dir, &["movements", "list", "--level", "intermediate"]);
    assert_eq!(ids(&intermediate).len(), 4);

    let high = json(dir, &["movements", "list", "--precaution", "high"]);
    assert_eq!(ids(&high), ["long_stretch_series", "short_spine"]);

    let tagged = json(dir, &["movements", "list", "--tag", "coordination"]);
    assert_eq!(ids(&tagged), ["double_leg_stretch", "single_leg_stretch"]);

    let searched = json(dir, &["movements", "list", "--search", "hundred"]);
    assert_eq!(ids(&searched), ["the_hundred"]);

    let combined = json(
        dir,
        &["movements", "list", "--category", "full body", "--precaution", "moderate"],
    );
    assert_eq!(ids(&combined), ["elephant"]);

    cli(dir)
        .args(["movements", "list", "--precaution", "extreme"])
        .assert()
        .failure();
}

#[test]
fn test_movement_edit() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    let edited = json(
        dir,
        &[
            "movements", "edit", "the_hundred", "--level", "Beginner", "--precaution", "moderate",
            "--tag", "breathing", "--tag", "core",
        ],
    );
    assert_eq!(edited["name"], "The Hundred");
    assert_eq!(edited["level"], "Beginner");
    assert_eq!(edited["precautionLevel"], "Moderate");
    assert_eq!(edited["tags"], serde_json::json!(["breathing", "core"]));
    assert_eq!(edited["isCatalogSeed"], true);

    let shown = json(dir, &["movements", "show", "the_hundred"]);
    assert_eq!(shown, edited);

    cli(dir)
        .args(["movements", "edit", "the_hundred", "--name", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation"));

    cli(dir)
        .args(["movements", "edit", "missing", "--level", "Beginner"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
}

#[test]
fn test_class_edit_reschedules() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let id = add_monday_class(dir, &["the_hundred"]);

    let edited = json(
        dir,
        &[
            "classes", "edit", id.as_str(), "--date", "2024-03-05", "--start", "18:00", "--weekly",
            "tue,thu", "--until", "2024-03-14",
        ],
    );
    assert_eq!(edited["id"], id.as_str());
    assert_eq!(edited["title"], "Monday Reformer");
    assert_eq!(edited["sequence"], serde_json::json!(["the_hundred"]));
    assert_eq!(edited["schedule"]["anchor"]["durationMinutes"], 60);

    let view = json(
        dir,
        &["calendar", "range", "--from", "2024-03-01", "--to", "2024-03-31"],
    );
    let starts: Vec<_> = view["occurrences"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["start"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        starts,
        vec![
            "2024-03-05T18:00:00",
            "2024-03-07T18:00:00",
            "2024-03-12T18:00:00",
            "2024-03-14T18:00:00"
        ]
    );
}

#[test]
fn test_class_edit_pattern_and_end() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let id = add_monday_class(dir, &[]);
    let march = ["calendar", "range", "--from", "2024-03-01", "--to", "2024-03-31"];
    let count = |dir: &Path| json(dir, &march)["occurrences"].as_array().unwrap().len();

    let edited = json(
        dir,
        &["classes", "edit", id.as_str(), "--monthly", "mon", "--until", "2024-03-11"],
    );
    assert_eq!(edited["schedule"]["recurrence"]["pattern"], "monthly");
    assert_eq!(count(dir), 2);

    let edited = json(dir, &["classes", "edit", id.as_str(), "--no-end"]);
    assert!(edited["schedule"]["recurrence"]["endDate"].is_null());
    assert_eq!(edited["schedule"]["recurrence"]["pattern"], "monthly");
    assert_eq!(count(dir), 4);

    let edited = json(dir, &["classes", "edit", id.as_str(), "--no-repeat", "--title", "One-off"]);
    assert_eq!(edited["schedule"]["recurrence"]["kind"], "none");
    assert_eq!(edited["title"], "One-off");
    assert_eq!(count(dir), 1);

    cli(dir)
        .args(["classes", "edit", id.as_str(), "--until", "2024-04-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation"));
}

#[test]
fn test_class_edit_rejects_empty_days() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let id = add_monday_class(dir, &[]);

    cli(dir)
        .args(["classes", "edit", id.as_str(), "--weekly", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation"));

    cli(dir)
        .args(["classes", "edit", id.as_str(), "--duration", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation"));

    // Stored class is untouched
    let classes = json(dir, &["classes", "list"]);
    assert_eq!(classes[0]["schedule"]["recurrence"]["daysOfWeek"], serde_json::json!([1]));
    assert_eq!(classes[0]["schedule"]["anchor"]["durationMinutes"], 60);
}

#[test]
fn test_clear_sequence() {
    let temp_dir = setup_test_dir();
    let id = add_monday_class(temp_dir.path(), &["the_hundred", "elephant"]);

    let sequence = json(temp_dir.path(), &["classes", "clear", id.as_str()]);
    assert_eq!(sequence, serde_json::json!([]));

    let stats = json(temp_dir.path(), &["classes", "stats", id.as_str()]);
    assert_eq!(stats["movementCount"], 0);
    assert_eq!(stats["estimatedMinutes"], 0);
}

#[test]
fn test_remove_commands_print_json() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let id = add_monday_class(dir, &[]);
    let template = json(dir, &["templates", "save", id.as_str()]);
    let template_id = template["id"].as_str().unwrap();

    let removed = json(dir, &["templates", "remove", template_id]);
    assert_eq!(removed["id"], template_id);
    assert_eq!(removed["name"], "Monday Reformer Template");

    let removed = json(dir, &["classes", "remove", id.as_str()]);
    assert_eq!(removed["id"], id.as_str());

    let removed = json(dir, &["movements", "remove", "elephant"]);
    assert_eq!(removed["name"], "Elephant");

    cli(dir)
        .args(["movements", "remove", "elephant"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
}
