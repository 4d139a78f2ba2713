use std::process::Command;

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_picoclobber"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("PicoClobber"));
    assert!(stdout.contains("--lines"));
    assert!(stdout.contains("--worker-delay-ms"));
}

#[test]
fn test_cli_missing_board_profile() {
    let output = Command::new(env!("CARGO_BIN_EXE_picoclobber"))
        .arg("-b")
        .arg("non_existent_board.yaml")
        .output()
        .expect("Failed to execute command");

    // It should fail because the profile file is missing
    assert!(!output.status.success());
}
