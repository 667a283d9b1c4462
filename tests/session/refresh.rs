//! End-to-end session tests driving a mock sdkmanager script.
//!
//! These tests build a fake SDK root containing an executable
//! `tools/bin/sdkmanager` shell script, run real session operations against
//! it, and assert on the notice stream, the catalog contents, and the
//! argument lines the tool was invoked with.

#![cfg(test)]
#![cfg(not(target_os = "windows"))]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use sdkbridge::catalog::Mark;
use sdkbridge::events::Notice;
use sdkbridge::session::{Session, SessionError};

/// Listing transcript served by the mock tool for `--list`.
const LISTING: &str = "\
Loading package information...
Installed packages:
  Path            | Version | Location       | Description
  -------         | ------- | -------        | -------
  platform-tools  | 29.0.5  | platform-tools | Android SDK Platform-Tools
  tools           | 26.1.1  | tools          | Android SDK Tools
Available Packages:
  Path            | Version | Description
  -------         | ------- | -------
  platform-tools  | 30.0.1  | Android SDK Platform-Tools
  emulator        | 30.0.12 | Android Emulator
";

/// What: Install a mock sdkmanager under `<root>/tools/bin`.
///
/// Inputs:
/// - `root`: Fake SDK root directory.
/// - `listing`: Transcript to print for `--list` invocations.
/// - `list_delay_secs`: Sleep before serving the listing (0 for none).
///
/// Output:
/// - Path of the invocation log the script appends each argument line to.
///
/// Details:
/// - Non-list invocations echo a progress line so install runs produce
///   Progress/Status notices.
fn install_mock_tool(root: &Path, listing: &str, list_delay_secs: u32) -> PathBuf {
    let bin = root.join("tools").join("bin");
    fs::create_dir_all(&bin).expect("create tools/bin");
    let log = root.join("invocations.log");
    let listing_file = root.join("listing.txt");
    fs::write(&listing_file, listing).expect("write listing");
    let script = format!(
        "#!/bin/bash\n\
         echo \"$*\" >> \"{log}\"\n\
         if [ \"$1\" = \"--list\" ]; then\n\
           sleep {list_delay_secs}\n\
           cat \"{listing}\"\n\
           exit 0\n\
         fi\n\
         if [ \"$1\" = \"--uninstall\" ]; then\n\
           echo \"Removing $2...\"\n\
           exit 0\n\
         fi\n\
         echo \"[ 50% ] Installing $1\"\n\
         exit 0\n",
        log = log.display(),
        listing = listing_file.display(),
    );
    let tool = bin.join("sdkmanager");
    fs::write(&tool, script).expect("write mock tool");
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).expect("chmod mock tool");
    log
}

/// Drain notices until (and including) the next `Done`.
fn drain_until_done(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    loop {
        let n = rx.blocking_recv().expect("notice before channel close");
        let done = matches!(n, Notice::Done { .. });
        notices.push(n);
        if done {
            return notices;
        }
    }
}

/// Argument lines the mock tool recorded, one per invocation.
fn invocation_lines(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
/// What: refresh populates the catalog from a real tool run
///
/// - Input: Mock tool serving the standard listing
/// - Output: CatalogCleared then package notices, Done reporting the outdated id, catalog holding three records
fn session_refresh_populates_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    install_mock_tool(dir.path(), LISTING, 0);
    let (session, mut rx) = Session::new(Some(dir.path().to_path_buf()));

    session.refresh().expect("refresh accepted");
    let notices = drain_until_done(&mut rx);

    assert!(notices.contains(&Notice::CatalogCleared));
    let updated: Vec<&Notice> = notices
        .iter()
        .filter(|n| matches!(n, Notice::PackageUpdated { .. }))
        .collect();
    assert_eq!(updated.len(), 4, "two installed rows plus two available rows");
    match notices.last() {
        Some(Notice::Done { updates }) => {
            assert_eq!(
                updates,
                &vec!["platform-tools".to_string(), "tools".to_string()]
            );
        }
        other => panic!("expected Done, got {other:?}"),
    }

    let catalog = session.catalog();
    assert_eq!(catalog.len(), 3);
    let pt = catalog.get("platform-tools").expect("platform-tools");
    assert_eq!(pt.version_installed, "29.0.5");
    assert_eq!(pt.version_available, "30.0.1");
    assert!(!pt.is_latest());
    let tools = catalog.get("tools").expect("tools");
    assert!(
        !tools.is_latest(),
        "installed without a known remote version is not latest"
    );
    assert!(!catalog.get("emulator").expect("emulator").is_installed());
    assert!(!session.is_busy());
}

#[test]
/// What: apply_changes runs remove, install, list in that order with one Done
///
/// - Input: One install id and one remove id against the mock tool
/// - Output: Invocation log shows --uninstall first and --list last; progress from the install run surfaces
fn session_apply_changes_ordering() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = install_mock_tool(dir.path(), LISTING, 0);
    let (session, mut rx) = Session::new(Some(dir.path().to_path_buf()));

    session
        .apply_changes(vec!["emulator".to_string()], vec!["tools".to_string()])
        .expect("apply accepted");
    let notices = drain_until_done(&mut rx);

    assert_eq!(
        invocation_lines(&log),
        vec![
            "--uninstall tools".to_string(),
            "emulator".to_string(),
            "--list".to_string(),
        ]
    );
    assert!(notices.contains(&Notice::Progress(50)));
    assert!(notices.contains(&Notice::Status("Installing emulator".to_string())));
    assert_eq!(
        notices
            .iter()
            .filter(|n| matches!(n, Notice::Done { .. }))
            .count(),
        1
    );
}

#[test]
/// What: install_updates installs the given ids then relists
///
/// - Input: install_updates with one id
/// - Output: Invocation log shows the bare id then --list
fn session_install_updates_invocations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = install_mock_tool(dir.path(), LISTING, 0);
    let (session, mut rx) = Session::new(Some(dir.path().to_path_buf()));

    session
        .install_updates(vec!["platform-tools".to_string()])
        .expect("install accepted");
    drain_until_done(&mut rx);

    assert_eq!(
        invocation_lines(&log),
        vec!["platform-tools".to_string(), "--list".to_string()]
    );
}

#[test]
/// What: update_all hands the whole update to the tool in one run, then relists
///
/// - Input: update_all against the mock tool
/// - Output: Invocation log shows --update then --list
fn session_update_all_invocations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = install_mock_tool(dir.path(), LISTING, 0);
    let (session, mut rx) = Session::new(Some(dir.path().to_path_buf()));

    session.update_all().expect("update accepted");
    drain_until_done(&mut rx);

    assert_eq!(
        invocation_lines(&log),
        vec!["--update".to_string(), "--list".to_string()]
    );
}

#[test]
/// What: Done implies idle and carries the update set from its own run
///
/// - Input: Refresh, then a second refresh issued the moment Done arrives
/// - Output: Second refresh accepted without a Busy rejection; the first Done already reported the full update set
fn session_done_follows_busy_release() {
    let dir = tempfile::tempdir().expect("tempdir");
    install_mock_tool(dir.path(), LISTING, 0);
    let (session, mut rx) = Session::new(Some(dir.path().to_path_buf()));

    session.refresh().expect("first refresh accepted");
    let notices = drain_until_done(&mut rx);
    session
        .refresh()
        .expect("session idle by the time Done is observed");
    match notices.last() {
        Some(Notice::Done { updates }) => {
            assert_eq!(
                updates,
                &vec!["platform-tools".to_string(), "tools".to_string()]
            );
        }
        other => panic!("expected Done, got {other:?}"),
    }
    drain_until_done(&mut rx);
}

#[test]
/// What: A second operation while Busy is rejected without disturbing the first
///
/// - Input: Slow mock listing; refresh immediately followed by refresh and apply_changes
/// - Output: Both follow-ups rejected with Busy; the first run still completes with one Done
fn session_concurrent_operation_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    install_mock_tool(dir.path(), LISTING, 1);
    let (session, mut rx) = Session::new(Some(dir.path().to_path_buf()));

    session.refresh().expect("first refresh accepted");
    assert_eq!(session.refresh(), Err(SessionError::Busy));
    assert_eq!(
        session.apply_changes(vec!["emulator".to_string()], Vec::new()),
        Err(SessionError::Busy)
    );

    let notices = drain_until_done(&mut rx);
    assert_eq!(
        notices
            .iter()
            .filter(|n| matches!(n, Notice::Done { .. }))
            .count(),
        1
    );
    assert_eq!(session.catalog().len(), 3);
}

#[test]
/// What: A second refresh never mixes in records or marks from the first run
///
/// - Input: Refresh, mark a record, swap the listing to drop that id, refresh again
/// - Output: Catalog reflects only the second listing; no mark survives
fn session_sequential_refreshes_never_mix() {
    let dir = tempfile::tempdir().expect("tempdir");
    install_mock_tool(dir.path(), LISTING, 0);
    let (session, mut rx) = Session::new(Some(dir.path().to_path_buf()));

    session.refresh().expect("first refresh");
    drain_until_done(&mut rx);
    session.toggle_mark("tools");
    assert_eq!(
        session.catalog().marked(Mark::MarkRemove),
        vec!["tools".to_string()]
    );

    let second = "\
Installed packages:
  Path   | Version | Location | Description
  emulator | 30.0.12 | emulator | Android Emulator
";
    install_mock_tool(dir.path(), second, 0);
    session.refresh().expect("second refresh");
    drain_until_done(&mut rx);

    let catalog = session.catalog();
    assert_eq!(catalog.len(), 1);
    assert!(catalog.get("tools").is_none());
    assert!(catalog.marked(Mark::MarkRemove).is_empty());
    assert!(catalog.marked(Mark::MarkInstall).is_empty());
}
