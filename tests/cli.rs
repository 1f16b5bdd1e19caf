use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("kodegen_bundler_dmg").unwrap();
    cmd.env_remove("DMG_SIGNING_IDENTITY").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_layout_options() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--overwrite"))
        .stdout(contains("--identity"))
        .stdout(contains("--dmg-title"))
        .stdout(contains("--folder-x"))
        .stdout(contains("DMG_SIGNING_IDENTITY"));
}

#[test]
fn app_argument_is_required() {
    cmd().assert().failure().stderr(contains("<APP>"));
}

#[test]
fn verbose_and_quiet_conflict() {
    cmd()
        .args(["Lungo.app", "--verbose", "--quiet"])
        .assert()
        .failure()
        .stderr(contains("cannot be used with"));
}

#[cfg(not(target_os = "macos"))]
#[test]
fn refuses_to_run_off_macos() {
    let tmp = tempfile::tempdir().unwrap();
    cmd()
        .arg(tmp.path().join("Lungo.app"))
        .arg(tmp.path())
        .assert()
        .code(1)
        .stderr(contains("macOS only"));
}

#[cfg(target_os = "macos")]
#[test]
fn missing_app_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    cmd()
        .arg(tmp.path().join("Missing.app"))
        .arg(tmp.path())
        .assert()
        .code(1)
        .stderr(contains("Could not find"));

    assert!(!tmp.path().join("Missing 1.0.dmg").exists());
}

#[cfg(target_os = "macos")]
#[test]
fn title_longer_than_limit_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    cmd()
        .arg(tmp.path().join("Lungo.app"))
        .arg(tmp.path())
        .args(["--dmg-title", "A Very Long Application Name"])
        .assert()
        .code(1)
        .stderr(contains("27").and(contains("characters")));
}

#[cfg(target_os = "macos")]
#[test]
fn existing_image_needs_overwrite() {
    let tmp = tempfile::tempdir().unwrap();
    let app = tmp.path().join("Lungo.app");
    std::fs::create_dir_all(app.join("Contents")).unwrap();
    std::fs::write(
        app.join("Contents/Info.plist"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleName</key>
    <string>Lungo</string>
    <key>CFBundleShortVersionString</key>
    <string>1.0</string>
</dict>
</plist>
"#,
    )
    .unwrap();
    std::fs::write(tmp.path().join("Lungo 1.0.dmg"), b"old").unwrap();

    cmd()
        .arg(&app)
        .arg(tmp.path())
        .assert()
        .code(1)
        .stderr(contains("already exists"));

    assert_eq!(std::fs::read(tmp.path().join("Lungo 1.0.dmg")).unwrap(), b"old");
}
