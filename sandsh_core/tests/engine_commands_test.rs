//! Command engine behavior against a real sandbox directory.
//!
//! Each test gets its own sandbox root (a private temp dir) populated with
//! `dir1/`, `dir2/`, `file1.txt` and `file2.txt`.

mod common;

use common::{Fixture, args, read};
use sandsh_core::command::Command;
use sandsh_core::{Outcome, ShellError};
use std::fs;
use std::time::{Duration, SystemTime};

// ============= whoami =============

#[test]
fn test_whoami_returns_identity() {
    let fx = Fixture::new();
    assert_eq!(fx.engine.whoami(&fx.session, &[]).unwrap(), "user");
}

#[test]
fn test_whoami_rejects_arguments() {
    let fx = Fixture::new();
    let err = fx.engine.whoami(&fx.session, &args(&["root"])).unwrap_err();
    assert!(matches!(err, ShellError::InvalidArgument { command: "whoami", .. }));
}

// ============= ls =============

#[test]
fn test_ls_lists_sorted_visible_entries() {
    let fx = Fixture::new();
    let out = fx.engine.ls(&fx.session, &[]).unwrap();
    assert_eq!(out, "dir1\ndir2\nfile1.txt\nfile2.txt");
}

#[test]
fn test_ls_hides_dotfiles_unless_all() {
    let fx = Fixture::new();
    fs::create_dir(fx.path("box")).unwrap();
    fx.write("box/b", "");
    fx.write("box/a", "");
    fx.write("box/.hidden", "");

    let plain = fx.engine.ls(&fx.session, &args(&["box"])).unwrap();
    assert_eq!(plain, "a\nb");

    let all = fx.engine.ls(&fx.session, &args(&["-a", "box"])).unwrap();
    assert_eq!(all, ".hidden\na\nb");
}

#[test]
fn test_ls_detailed_lines() {
    let fx = Fixture::new();
    let out = fx.engine.ls(&fx.session, &args(&["-l"])).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 4);

    let file_line = lines
        .iter()
        .find(|l| l.ends_with(" file1.txt"))
        .expect("file1.txt listed");
    let fields: Vec<&str> = file_line.split(' ').collect();
    // MODE SIZE DATE TIME NAME
    assert_eq!(fields.len(), 5);
    assert!(fields[0].chars().all(|c| c.is_digit(8)) && fields[0].len() == 3);
    assert_eq!(fields[1], "11B");
    assert_eq!(fields[2].len(), "2024-01-01".len());
    assert_eq!(fields[3].len(), "12:00:00".len());
}

#[cfg(target_os = "linux")]
#[test]
fn test_ls_detailed_non_utf8_name() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fx = Fixture::new();
    fs::write(fx.path("dir2").join(OsStr::from_bytes(b"bad\xffname")), "x").unwrap();

    let out = fx.engine.ls(&fx.session, &args(&["-l", "dir2"])).unwrap();
    assert_eq!(out.lines().count(), 1);
    assert!(out.contains(" 1B "));
    assert!(out.ends_with("bad\u{fffd}name"));
}

#[test]
fn test_ls_human_sizes() {
    let fx = Fixture::new();
    fx.write("dir2/big.bin", &"x".repeat(1536));
    let out = fx.engine.ls(&fx.session, &args(&["-lh", "/dir2"])).unwrap();
    assert!(out.contains(" 1.5K "), "unexpected output: {out}");
    assert!(out.ends_with(" big.bin"));
}

#[test]
fn test_ls_empty_directory_is_empty_output() {
    let fx = Fixture::new();
    assert_eq!(fx.engine.ls(&fx.session, &args(&["dir1"])).unwrap(), "");
}

#[test]
fn test_ls_missing_path() {
    let fx = Fixture::new();
    let err = fx.engine.ls(&fx.session, &args(&["nowhere"])).unwrap_err();
    assert!(matches!(
        err,
        ShellError::PathNotFound { command: "ls", ref path } if path == "nowhere"
    ));
}

#[test]
fn test_ls_single_file() {
    let fx = Fixture::new();
    assert_eq!(
        fx.engine.ls(&fx.session, &args(&["file1.txt"])).unwrap(),
        "file1.txt"
    );
}

#[test]
fn test_ls_uses_current_directory() {
    let mut fx = Fixture::new();
    fx.write("dir1/inner.txt", "x");
    fx.engine.cd(&mut fx.session, &args(&["dir1"])).unwrap();
    assert_eq!(fx.engine.ls(&fx.session, &[]).unwrap(), "inner.txt");
}

// ============= cd =============

#[test]
fn test_cd_valid() {
    let mut fx = Fixture::new();
    fx.engine.cd(&mut fx.session, &args(&["dir1"])).unwrap();
    assert_eq!(fx.session.current_directory().to_string(), "/dir1");
}

#[test]
fn test_cd_invalid_leaves_state() {
    let mut fx = Fixture::new();
    let err = fx
        .engine
        .cd(&mut fx.session, &args(&["nonexistent"]))
        .unwrap_err();
    assert!(matches!(err, ShellError::PathNotFound { command: "cd", .. }));
    assert!(fx.session.current_directory().is_root());
}

#[test]
fn test_cd_onto_file_is_rejected() {
    let mut fx = Fixture::new();
    assert!(fx.engine.cd(&mut fx.session, &args(&["file1.txt"])).is_err());
    assert!(fx.session.current_directory().is_root());
}

#[test]
fn test_cd_back() {
    let mut fx = Fixture::new();
    fx.engine.cd(&mut fx.session, &args(&["dir1"])).unwrap();
    fx.engine.cd(&mut fx.session, &args(&[".."])).unwrap();
    assert_eq!(fx.session.current_directory().to_string(), "/");
}

#[test]
fn test_cd_dot_dot_clamped_at_root() {
    let mut fx = Fixture::new();
    for _ in 0..5 {
        fx.engine.cd(&mut fx.session, &args(&[".."])).unwrap();
        assert!(fx.session.current_directory().is_root());
    }
}

#[test]
fn test_cd_round_trip_from_nested() {
    let mut fx = Fixture::new();
    fs::create_dir_all(fx.path("dir1/sub/deeper")).unwrap();
    fx.engine.cd(&mut fx.session, &args(&["dir1/sub"])).unwrap();
    let before = fx.session.current_directory().clone();
    fx.engine.cd(&mut fx.session, &args(&["deeper"])).unwrap();
    fx.engine.cd(&mut fx.session, &args(&[".."])).unwrap();
    assert_eq!(fx.session.current_directory(), &before);
}

#[test]
fn test_cd_absolute_and_relative_from_subdir() {
    let mut fx = Fixture::new();
    fs::create_dir_all(fx.path("dir1/sub")).unwrap();
    fx.engine.cd(&mut fx.session, &args(&["dir1"])).unwrap();
    fx.engine.cd(&mut fx.session, &args(&["sub"])).unwrap();
    assert_eq!(fx.session.current_directory().to_string(), "/dir1/sub");
    fx.engine.cd(&mut fx.session, &args(&["/dir2"])).unwrap();
    assert_eq!(fx.session.current_directory().to_string(), "/dir2");
    fx.engine.cd(&mut fx.session, &args(&["../../../dir1"])).unwrap();
    assert_eq!(fx.session.current_directory().to_string(), "/dir1");
}

#[test]
fn test_cd_without_argument_is_noop() {
    let mut fx = Fixture::new();
    fx.engine.cd(&mut fx.session, &args(&["dir1"])).unwrap();
    fx.engine.cd(&mut fx.session, &[]).unwrap();
    assert_eq!(fx.session.current_directory().to_string(), "/dir1");
}

#[test]
fn test_cd_too_many_arguments() {
    let mut fx = Fixture::new();
    let err = fx
        .engine
        .cd(&mut fx.session, &args(&["dir1", "dir2"]))
        .unwrap_err();
    assert!(matches!(err, ShellError::InvalidArgument { command: "cd", .. }));
}

// ============= chmod =============

#[cfg(unix)]
#[test]
fn test_chmod_sets_mode() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    let out = fx
        .engine
        .chmod(&fx.session, &args(&["755", "file1.txt"]))
        .unwrap();
    assert!(out.contains("file1.txt"));
    let mode = fs::metadata(fx.path("file1.txt")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[cfg(unix)]
#[test]
fn test_chmod_relative_to_current_directory() {
    use std::os::unix::fs::PermissionsExt;

    let mut fx = Fixture::new();
    fx.write("dir1/run.sh", "echo");
    fx.engine.cd(&mut fx.session, &args(&["dir1"])).unwrap();
    fx.engine
        .chmod(&fx.session, &args(&["700", "run.sh"]))
        .unwrap();
    let mode = fs::metadata(fx.path("dir1/run.sh")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o700);
}

#[test]
fn test_chmod_invalid_mode() {
    let fx = Fixture::new();
    for mode in ["7A5", "invalid", "75", "7555", "789"] {
        let err = fx
            .engine
            .chmod(&fx.session, &args(&[mode, "file1.txt"]))
            .unwrap_err();
        assert!(
            matches!(err, ShellError::InvalidArgument { command: "chmod", .. }),
            "mode {mode} should be rejected"
        );
    }
}

#[test]
fn test_chmod_invalid_file() {
    let fx = Fixture::new();
    let err = fx
        .engine
        .chmod(&fx.session, &args(&["755", "nonexistent.txt"]))
        .unwrap_err();
    assert!(matches!(
        err,
        ShellError::PathNotFound { command: "chmod", ref path } if path == "nonexistent.txt"
    ));
}

#[test]
fn test_chmod_usage() {
    let fx = Fixture::new();
    let err = fx.engine.chmod(&fx.session, &args(&["755"])).unwrap_err();
    assert!(err.to_string().contains("usage"));
}

// ============= cp =============

#[test]
fn test_cp_valid() {
    let fx = Fixture::new();
    fx.engine
        .cp(&fx.session, &args(&["file1.txt", "dir1/file1_copy.txt"]))
        .unwrap();
    assert_eq!(read(&fx.path("dir1/file1_copy.txt")), "Test file 1");
}

#[test]
fn test_cp_creates_parents_and_keeps_mtime() {
    let fx = Fixture::new();
    let past = SystemTime::UNIX_EPOCH + Duration::from_secs(1_500_000_000);
    fs::OpenOptions::new()
        .write(true)
        .open(fx.path("file1.txt"))
        .unwrap()
        .set_modified(past)
        .unwrap();

    fx.engine
        .cp(&fx.session, &args(&["file1.txt", "sub/b.txt"]))
        .unwrap();

    let copied = fx.path("sub/b.txt");
    assert_eq!(fs::read(&copied).unwrap(), fs::read(fx.path("file1.txt")).unwrap());
    assert_eq!(fs::metadata(&copied).unwrap().modified().unwrap(), past);
}

#[cfg(unix)]
#[test]
fn test_cp_keeps_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    fs::set_permissions(fx.path("file2.txt"), fs::Permissions::from_mode(0o640)).unwrap();
    fx.engine
        .cp(&fx.session, &args(&["file2.txt", "dir2/file2.txt"]))
        .unwrap();
    let mode = fs::metadata(fx.path("dir2/file2.txt")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o640);
}

#[test]
fn test_cp_directory_recursion() {
    let fx = Fixture::new();
    fx.write("srcdir/x.txt", "x");
    fx.write("srcdir/nested/y.txt", "y");

    fx.engine
        .cp(&fx.session, &args(&["srcdir", "destdir"]))
        .unwrap();

    assert_eq!(read(&fx.path("destdir/x.txt")), "x");
    assert_eq!(read(&fx.path("destdir/nested/y.txt")), "y");
    // Source untouched
    assert_eq!(read(&fx.path("srcdir/nested/y.txt")), "y");
}

#[test]
fn test_cp_directory_into_existing_directory_merges() {
    let fx = Fixture::new();
    fx.write("srcdir/x.txt", "new");
    fx.write("dir2/keep.txt", "keep");

    fx.engine.cp(&fx.session, &args(&["srcdir", "dir2"])).unwrap();

    assert_eq!(read(&fx.path("dir2/x.txt")), "new");
    assert_eq!(read(&fx.path("dir2/keep.txt")), "keep");
}

#[test]
fn test_cp_directory_onto_file_conflicts() {
    let fx = Fixture::new();
    let err = fx
        .engine
        .cp(&fx.session, &args(&["dir1", "file1.txt"]))
        .unwrap_err();
    assert!(matches!(err, ShellError::DestinationConflict { command: "cp", .. }));
    assert_eq!(read(&fx.path("file1.txt")), "Test file 1");
}

#[test]
fn test_cp_directory_into_itself() {
    let fx = Fixture::new();
    let err = fx
        .engine
        .cp(&fx.session, &args(&["dir1", "dir1/copy"]))
        .unwrap_err();
    assert!(matches!(err, ShellError::InvalidArgument { command: "cp", .. }));
}

#[test]
fn test_cp_file_onto_itself_keeps_contents() {
    let fx = Fixture::new();
    let err = fx
        .engine
        .cp(&fx.session, &args(&["file1.txt", "file1.txt"]))
        .unwrap_err();
    assert!(matches!(err, ShellError::InvalidArgument { command: "cp", .. }));
    assert!(err.to_string().contains("file1.txt"));
    assert_eq!(read(&fx.path("file1.txt")), "Test file 1");
}

#[test]
fn test_cp_file_into_its_own_directory_keeps_contents() {
    let fx = Fixture::new();
    let err = fx
        .engine
        .cp(&fx.session, &args(&["file1.txt", "/"]))
        .unwrap_err();
    assert!(matches!(err, ShellError::InvalidArgument { command: "cp", .. }));
    assert_eq!(read(&fx.path("file1.txt")), "Test file 1");

    fx.write("dir1/inner.txt", "inner");
    let mut session = fx.session.clone();
    fx.engine.cd(&mut session, &args(&["dir1"])).unwrap();
    assert!(fx.engine.cp(&session, &args(&["inner.txt", "."])).is_err());
    assert_eq!(read(&fx.path("dir1/inner.txt")), "inner");
}

#[cfg(unix)]
#[test]
fn test_cp_directory_into_linked_subdirectory() {
    let fx = Fixture::new();
    fx.write("dir1/inner/a.txt", "a");
    std::os::unix::fs::symlink(fx.path("dir1/inner"), fx.path("door")).unwrap();

    let err = fx
        .engine
        .cp(&fx.session, &args(&["dir1", "door/copy"]))
        .unwrap_err();
    assert!(matches!(err, ShellError::InvalidArgument { command: "cp", .. }));
    assert!(!fx.path("dir1/inner/copy").exists());
}

#[test]
fn test_cp_invalid_source() {
    let fx = Fixture::new();
    let err = fx
        .engine
        .cp(&fx.session, &args(&["nonexistent.txt", "dir1/file1_copy.txt"]))
        .unwrap_err();
    assert!(matches!(
        err,
        ShellError::PathNotFound { command: "cp", ref path } if path == "nonexistent.txt"
    ));
    assert!(!fx.path("dir1/file1_copy.txt").exists());
}

#[test]
fn test_cp_usage() {
    let fx = Fixture::new();
    for list in [&["a"][..], &["a", "b", "c"][..], &[][..]] {
        let err = fx.engine.cp(&fx.session, &args(list)).unwrap_err();
        assert!(matches!(err, ShellError::InvalidArgument { command: "cp", .. }));
    }
}

#[test]
fn test_cp_cannot_escape_sandbox() {
    let fx = Fixture::new();
    fx.engine
        .cp(&fx.session, &args(&["file1.txt", "../../../escaped.txt"]))
        .unwrap();
    // `..` is clamped at the virtual root, so the copy lands inside the sandbox.
    assert_eq!(read(&fx.path("escaped.txt")), "Test file 1");
    let outside = fx.root.path().parent().unwrap().join("escaped.txt");
    assert!(!outside.exists());
}

// ============= dispatch =============

#[test]
fn test_execute_unknown_command() {
    let mut fx = Fixture::new();
    let err = fx
        .engine
        .execute(&mut fx.session, &Command::Unknown("frobnicate".into()))
        .unwrap_err();
    assert!(matches!(err, ShellError::UnknownCommand(ref raw) if raw == "frobnicate"));
    assert!(fx.session.current_directory().is_root());
}

#[test]
fn test_execute_exit() {
    let mut fx = Fixture::new();
    let outcome = fx.engine.execute(&mut fx.session, &Command::Exit).unwrap();
    assert!(matches!(outcome, Outcome::Exit(_)));
}

#[test]
fn test_execute_cd_is_silent() {
    let mut fx = Fixture::new();
    let outcome = fx
        .engine
        .execute(&mut fx.session, &Command::Cd(args(&["dir2"])))
        .unwrap();
    assert_eq!(outcome, Outcome::Output(String::new()));
    assert_eq!(fx.session.current_directory().to_string(), "/dir2");
}
