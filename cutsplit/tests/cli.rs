use assert_cmd::Command;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_test_tone<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    duration_ms: u64,
) -> Result<(), Box<dyn Error>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for n in 0..sample_rate as u64 * duration_ms / 1_000 {
        let t = n as f32 / sample_rate as f32;
        writer.write_sample(((t * 440.0 * std::f32::consts::TAU).sin() * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

#[test]
fn cli_splits_audio_at_cut_points() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input_path = input_dir.path().join("input.wav");
    write_test_tone(&input_path, 8_000, 3_000)?;
    let cutlist_path = input_dir.path().join("cuts.txt");
    fs::write(&cutlist_path, "0:00 Intro\n0:01 Verse: One\n0:02 Outro\n")?;

    let output_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("cutsplit")?;
    cmd.arg("-c")
        .arg(&cutlist_path)
        .arg("-i")
        .arg(&input_path)
        .arg("-o")
        .arg(output_dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Extracting 'Intro' from 00:00 to 00:01...",
        ))
        .stdout(predicate::str::contains(
            "Extracting 'Outro' from 00:02 to end...",
        ))
        .stdout(predicate::str::contains("Saved "));

    let mut segments: Vec<_> = fs::read_dir(output_dir.path())?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    segments.sort();
    assert_eq!(segments, ["Intro.wav", "Outro.wav", "Verse_ One.wav"]);

    output_dir.close()?;
    input_dir.close()?;
    Ok(())
}

#[test]
fn cli_warns_about_malformed_lines() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input_path = input_dir.path().join("input.wav");
    write_test_tone(&input_path, 8_000, 2_000)?;
    let cutlist_path = input_dir.path().join("cuts.txt");
    fs::write(&cutlist_path, "0:00 Intro\nbadline\n0:01 Outro\n")?;

    let output_dir = tempdir()?;

    Command::cargo_bin("cutsplit")?
        .arg("--cutlist")
        .arg(&cutlist_path)
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(output_dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("line 2").and(predicate::str::contains("'badline'")));

    assert!(output_dir.path().join("Intro.wav").is_file());
    assert!(output_dir.path().join("Outro.wav").is_file());

    output_dir.close()?;
    input_dir.close()?;
    Ok(())
}

#[test]
fn cli_reports_missing_input_file() -> Result<(), Box<dyn Error>> {
    let output_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("cutsplit")?;
    cmd.args(["-c", "cuts.txt", "-i", "missing.wav", "-o"])
        .arg(output_dir.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("input file does not exist"));

    output_dir.close()?;
    Ok(())
}

#[test]
fn cli_fails_when_no_entry_is_valid() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input_path = input_dir.path().join("input.wav");
    write_test_tone(&input_path, 8_000, 500)?;
    let cutlist_path = input_dir.path().join("cuts.txt");
    fs::write(&cutlist_path, "garbage\n")?;

    Command::cargo_bin("cutsplit")?
        .arg("-c")
        .arg(&cutlist_path)
        .arg("-i")
        .arg(&input_path)
        .arg("-o")
        .arg(input_dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no valid entries"));

    input_dir.close()?;
    Ok(())
}

#[test]
fn cli_requires_all_paths() -> Result<(), Box<dyn Error>> {
    Command::cargo_bin("cutsplit")?
        .args(["-i", "input.wav", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--cutlist"));
    Ok(())
}

#[test]
fn cli_dry_run_prints_plan_without_creating_files() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input_path = input_dir.path().join("input.wav");
    write_test_tone(&input_path, 8_000, 1_100)?;
    let cutlist_path = input_dir.path().join("cuts.txt");
    fs::write(&cutlist_path, "0:00 Side A\n1:30 Side B?\n")?;

    let output_dir = tempdir()?;

    let assert = Command::cargo_bin("cutsplit")?
        .arg("-c")
        .arg(&cutlist_path)
        .arg("-i")
        .arg(&input_path)
        .arg("-o")
        .arg(output_dir.path())
        .arg("--dry-run")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    assert!(stdout.contains("Dry run: would generate 2 segment(s):"));
    let expected = [
        format!(
            "  {} (from 00:00 to 01:30)",
            output_dir.path().join("Side A.wav").display()
        ),
        format!(
            "  {} (from 01:30 to end)",
            output_dir.path().join("Side B_.wav").display()
        ),
    ];
    for needle in expected {
        assert!(stdout.contains(&needle), "missing dry-run entry for {needle}");
    }

    let mut produced = fs::read_dir(output_dir.path())?;
    assert!(produced.next().is_none(), "dry run should not create files");

    output_dir.close()?;
    input_dir.close()?;
    Ok(())
}
