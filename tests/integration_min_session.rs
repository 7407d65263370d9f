// Integration tests that drive the compiled binary.
//
// The `--stats` path needs no terminal. The PTY test exercises the real event loop
// and crossterm input handling; it is Unix-only and ignored by default.
// Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::fs;
use std::time::Duration;

use assert_cmd::Command;
use expectrl::{spawn, Eof};
use tempfile::tempdir;

#[test]
fn stats_prints_aggregates_without_a_tty() {
    let home = tempdir().unwrap();
    let history = home.path().join("history.txt");
    fs::write(
        &history,
        "User: dana\nDate: 2024-02-01 08:00:00\nWPM: 40\nAccuracy: 95.00%\nDuration: 60 seconds\nDifficulty: 1\n------------------------\n\
         User: dana\nDate: 2024-02-02 08:00:00\nWPM: 60\nAccuracy: 97.00%\nDuration: 60 seconds\nDifficulty: 2\n------------------------\n",
    )
    .unwrap();

    let output = Command::cargo_bin("typemaster")
        .unwrap()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .args(["--stats", "--user", "dana", "--history-file"])
        .arg(&history)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("User: dana"), "{stdout}");
    assert!(stdout.contains("Tests: 2"), "{stdout}");
    assert!(stdout.contains("Average WPM: 50.0"), "{stdout}");
    assert!(stdout.contains("Best WPM: 60"), "{stdout}");
    assert!(stdout.contains("2024-02-02 08:00:00"), "{stdout}");
}

#[test]
fn stats_for_new_user_are_zero() {
    let home = tempdir().unwrap();
    let output = Command::cargo_bin("typemaster")
        .unwrap()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .args(["--stats", "--user", "nobody", "--history-file"])
        .arg(home.path().join("missing.txt"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Tests: 0"), "{stdout}");
}

#[test]
#[ignore]
fn minimal_session_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("typemaster");
    let cmd = format!(
        "env HOME={} {} -p hi --history-file {}",
        home.path().display(),
        bin.display(),
        home.path().join("history.txt").display()
    );

    let mut p = spawn(cmd)?;

    // Give the app a moment to initialize the terminal/alternate screen
    std::thread::sleep(Duration::from_millis(200));

    // Typing the whole custom passage ends the test
    p.send("hi")?;
    std::thread::sleep(Duration::from_millis(200));

    // Results -> setup -> quit
    p.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("\x1b")?;

    p.expect(Eof)?;

    let log = fs::read_to_string(home.path().join("history.txt"))?;
    assert!(log.contains("WPM:"));
    Ok(())
}
