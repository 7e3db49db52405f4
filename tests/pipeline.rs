use std::fs;
use std::path::Path;

use bayes_tan::cli::{self, Args};
use clap::Parser;
use tempfile::TempDir;

const TRAIN: &str = "\
@relation toy
@attribute A {a, b}
@attribute class {yes, no}
@data
a,yes
b,no
";

const TEST: &str = "\
@relation toy
@attribute A {a, b}
@attribute class {yes, no}
@data
a,yes
b,yes
";

const TAN_TRAIN: &str = "\
@relation copies
@attribute first {0,1}
@attribute noise {0,1}
@attribute copy {0,1}
@attribute class {yes,no}
@data
0,0,0,yes
1,0,1,yes
0,1,0,yes
1,1,1,yes
0,1,0,no
1,0,1,no
1,1,1,no
0,0,0,no
";

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn run(args: &[&str]) -> anyhow::Result<String> {
    let mut argv = vec!["bayes"];
    argv.extend_from_slice(args);
    let args = Args::try_parse_from(argv).unwrap();
    let mut out = Vec::new();
    cli::run(&args, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn naive_bayes_report() {
    let dir = TempDir::new().unwrap();
    let train = write(dir.path(), "train.arff", TRAIN);
    let test = write(dir.path(), "test.arff", TEST);

    let output = run(&[&train, &test, "n"]).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 4);

    let first: Vec<&str> = lines[0].split(' ').collect();
    assert_eq!(&first[..2], &["yes", "yes"]);
    let posterior: f64 = first[2].parse().unwrap();
    assert!((posterior - 2.0 / 3.0).abs() < 1e-12);

    assert!(lines[1].starts_with("no yes "));
    assert_eq!(lines[2], "");
    assert_eq!(lines[3], "Accuracy= 1/2");
}

#[test]
fn tan_report_starts_with_tree() {
    let dir = TempDir::new().unwrap();
    let train = write(dir.path(), "train.arff", TAN_TRAIN);

    let output = run(&[&train, &train, "tan"]).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(&lines[..4], &["first class", "noise first class", "copy first class", ""]);
    assert_eq!(lines.len(), 4 + 8 + 2);

    // Both labels see identical statistics, so every posterior ties and the
    // first label wins.
    for line in &lines[4..12] {
        assert!(line.starts_with("yes "));
        assert!(line.ends_with(" 0.5"));
    }
    assert_eq!(lines[13], "Accuracy= 4/8");
}

#[test]
fn describe_prints_summaries() {
    let dir = TempDir::new().unwrap();
    let train = write(dir.path(), "train.arff", TRAIN);
    let test = write(dir.path(), "test.arff", TEST);

    let output = run(&[&train, &test, "n", "--describe"]).unwrap();
    assert!(output.starts_with("Relation: toy\nClass: yes,no\nA: a,b\n"));
    assert_eq!(output.matches("Instances: 2").count(), 2);
}

#[test]
fn metadata_mismatch_aborts_before_training() {
    let dir = TempDir::new().unwrap();
    let train = write(dir.path(), "train.arff", TRAIN);
    let test = write(
        dir.path(),
        "test.arff",
        "@attribute A {a, b}\n@attribute class {no, yes}\n@data\na,yes\n",
    );

    let err = run(&[&train, &test, "t"]).unwrap_err();
    assert!(format!("{err:#}").contains("metadata"));
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let train = write(dir.path(), "train.arff", TRAIN);
    let missing = dir.path().join("absent.arff");

    let err = run(&[&train, missing.to_str().unwrap(), "n"]).unwrap_err();
    assert!(format!("{err:#}").contains("failed to load test data"));
}
