mod common;

use common::{Sandbox, test_config};
use secure_fs::{
    Context, CreateDirectoryRequest, EntryKind, Error, FileReadOutcome, GetFileInfoRequest,
    ListDirectoryRequest, MoveFileRequest, ReadFileRequest, ReadMultipleFilesRequest,
    WriteFileRequest,
};

#[test]
fn read_returns_content_and_requested_path() {
    let sandbox = Sandbox::new();
    let path = sandbox.write("a.txt", "hello");
    let ctx = sandbox.context();

    let response = ctx
        .read_file(ReadFileRequest { path: path.clone() })
        .expect("read");
    assert_eq!(response.content, "hello");
    assert_eq!(response.path, path);
}

#[test]
fn read_rejects_files_over_the_limit() {
    let sandbox = Sandbox::new();
    let path = sandbox.write("big.txt", "0123456789");
    let mut config = test_config(&[&sandbox.root]);
    config.limits.max_read_bytes = 4;
    let ctx = Context::new(config).expect("ctx");

    let err = ctx.read_file(ReadFileRequest { path }).expect_err("too large");
    match err {
        Error::FileTooLarge {
            size_bytes: 10,
            max_bytes: 4,
            ..
        } => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn read_rejects_non_utf8_content() {
    let sandbox = Sandbox::new();
    let path = sandbox.root.join("bin.dat");
    std::fs::write(&path, [0xff, 0xfe, 0x00]).expect("write");
    let ctx = sandbox.context();

    let err = ctx.read_file(ReadFileRequest { path }).expect_err("utf8");
    match err {
        Error::InvalidUtf8(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn read_multiple_isolates_failures_and_keeps_order() {
    let sandbox = Sandbox::new();
    let a = sandbox.write("a.txt", "A");
    let b = sandbox.write("b.txt", "B");
    let missing = sandbox.root.join("missing.txt");
    let outside = sandbox.outside.join("x.txt");
    std::fs::write(&outside, "X").expect("write");
    let ctx = sandbox.context();

    let response = ctx.read_multiple_files(ReadMultipleFilesRequest {
        paths: vec![a.clone(), missing.clone(), outside.clone(), b.clone()],
    });

    assert_eq!(response.files.len(), 4);
    assert_eq!(
        response.files[0],
        FileReadOutcome::Read {
            path: a,
            content: "A".to_string()
        }
    );
    assert!(response.files[1].is_failed());
    assert_eq!(response.files[1].path(), missing.as_path());
    assert!(response.files[2].is_failed());
    assert_eq!(
        response.files[3],
        FileReadOutcome::Read {
            path: b,
            content: "B".to_string()
        }
    );
}

#[test]
fn write_creates_then_replaces() {
    let sandbox = Sandbox::new();
    let ctx = sandbox.context();
    let path = sandbox.root.join("new.txt");

    let created = ctx
        .write_file(WriteFileRequest {
            path: path.clone(),
            content: "one".to_string(),
        })
        .expect("create");
    assert!(created.created);

    let replaced = ctx
        .write_file(WriteFileRequest {
            path: path.clone(),
            content: "two".to_string(),
        })
        .expect("replace");
    assert!(!replaced.created);
    assert_eq!(replaced.bytes_written, 3);
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "two");
}

#[test]
fn write_requires_existing_parent() {
    let sandbox = Sandbox::new();
    let ctx = sandbox.context();

    let err = ctx
        .write_file(WriteFileRequest {
            path: sandbox.root.join("no/such/dir/file.txt"),
            content: "x".to_string(),
        })
        .expect_err("missing parent");
    match err {
        Error::NotFound(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!sandbox.root.join("no").exists());
}

#[test]
fn write_outside_roots_is_out_of_bounds() {
    let sandbox = Sandbox::new();
    let ctx = sandbox.context();

    let err = ctx
        .write_file(WriteFileRequest {
            path: sandbox.outside.join("evil.txt"),
            content: "x".to_string(),
        })
        .expect_err("outside");
    match err {
        Error::OutOfBounds(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!sandbox.outside.join("evil.txt").exists());
}

#[test]
fn write_over_limit_is_rejected() {
    let sandbox = Sandbox::new();
    let mut config = test_config(&[&sandbox.root]);
    config.limits.max_write_bytes = 2;
    let ctx = Context::new(config).expect("ctx");

    let err = ctx
        .write_file(WriteFileRequest {
            path: sandbox.root.join("a.txt"),
            content: "abc".to_string(),
        })
        .expect_err("too large");
    match err {
        Error::FileTooLarge { .. } => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn create_directory_makes_parents_and_is_idempotent() {
    let sandbox = Sandbox::new();
    let ctx = sandbox.context();
    let path = sandbox.root.join("a/b/c");

    let first = ctx
        .create_directory(CreateDirectoryRequest { path: path.clone() })
        .expect("create");
    assert!(first.created);
    assert!(path.is_dir());

    let second = ctx
        .create_directory(CreateDirectoryRequest { path: path.clone() })
        .expect("exists");
    assert!(!second.created);
}

#[test]
fn create_directory_over_a_file_fails() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("a.txt", "");
    let ctx = sandbox.context();

    let err = ctx
        .create_directory(CreateDirectoryRequest { path: file })
        .expect_err("file");
    match err {
        Error::AlreadyExists(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn list_directory_marks_files_and_directories() {
    let sandbox = Sandbox::new();
    sandbox.write("a.txt", "hello");
    std::fs::create_dir_all(sandbox.root.join("sub")).expect("mkdir");
    let ctx = sandbox.context();

    let response = ctx
        .list_directory(ListDirectoryRequest {
            path: sandbox.root.clone(),
        })
        .expect("list");
    let mut lines: Vec<_> = response.to_text().lines().map(str::to_string).collect();
    lines.sort();
    assert_eq!(lines, vec!["[DIR] sub".to_string(), "[FILE] a.txt".to_string()]);
    assert!(
        response
            .entries
            .iter()
            .any(|entry| entry.name == "sub" && entry.kind == EntryKind::Directory)
    );
}

#[test]
fn list_directory_on_file_is_rejected() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("a.txt", "");
    let ctx = sandbox.context();

    let err = ctx
        .list_directory(ListDirectoryRequest { path: file })
        .expect_err("file");
    match err {
        Error::InvalidPath(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn move_renames_within_root() {
    let sandbox = Sandbox::new();
    let source = sandbox.write("a.txt", "A");
    std::fs::create_dir_all(sandbox.root.join("dest")).expect("mkdir");
    let ctx = sandbox.context();
    let destination = sandbox.root.join("dest/b.txt");

    let response = ctx
        .move_file(MoveFileRequest {
            source: source.clone(),
            destination: destination.clone(),
        })
        .expect("move");
    assert_eq!(response.kind, EntryKind::File);
    assert!(!source.exists());
    assert_eq!(std::fs::read_to_string(&destination).expect("read"), "A");
}

#[test]
fn move_refuses_to_overwrite() {
    let sandbox = Sandbox::new();
    let source = sandbox.write("a.txt", "A");
    let destination = sandbox.write("b.txt", "B");
    let ctx = sandbox.context();

    let err = ctx
        .move_file(MoveFileRequest {
            source: source.clone(),
            destination: destination.clone(),
        })
        .expect_err("exists");
    match err {
        Error::AlreadyExists(path) => assert_eq!(path, destination),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(std::fs::read_to_string(&source).expect("read"), "A");
    assert_eq!(std::fs::read_to_string(&destination).expect("read"), "B");
}

#[test]
fn move_out_of_the_sandbox_is_out_of_bounds() {
    let sandbox = Sandbox::new();
    let source = sandbox.write("a.txt", "A");
    let ctx = sandbox.context();

    let err = ctx
        .move_file(MoveFileRequest {
            source: source.clone(),
            destination: sandbox.outside.join("a.txt"),
        })
        .expect_err("outside");
    match err {
        Error::OutOfBounds(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(source.exists());
}

#[test]
fn move_of_the_root_itself_is_refused() {
    let sandbox = Sandbox::new();
    let ctx = sandbox.context();

    let err = ctx
        .move_file(MoveFileRequest {
            source: sandbox.root.clone(),
            destination: sandbox.root.join("moved"),
        })
        .expect_err("root");
    match err {
        Error::OutOfBounds(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(sandbox.root.is_dir());
}

#[test]
fn get_file_info_reports_kind_and_size() {
    let sandbox = Sandbox::new();
    let path = sandbox.write("a.txt", "hello");
    let ctx = sandbox.context();

    let info = ctx
        .get_file_info(GetFileInfoRequest { path })
        .expect("info");
    assert_eq!(info.size, 5);
    assert!(info.is_file);
    assert!(!info.is_directory);
    assert!(info.modified.is_some());
    assert_eq!(info.permissions.len(), 3);

    let dir_info = ctx
        .get_file_info(GetFileInfoRequest {
            path: sandbox.root.clone(),
        })
        .expect("dir info");
    assert!(dir_info.is_directory);
}

#[cfg(unix)]
mod symlinks {
    use std::os::unix::fs::symlink;

    use super::*;

    #[test]
    fn move_renames_the_link_not_its_target() {
        let sandbox = Sandbox::new();
        let target = sandbox.write("target.txt", "T");
        symlink(&target, sandbox.root.join("link.txt")).expect("symlink");
        let ctx = sandbox.context();

        ctx.move_file(MoveFileRequest {
            source: sandbox.root.join("link.txt"),
            destination: sandbox.root.join("renamed.txt"),
        })
        .expect("move");

        assert!(target.exists());
        let meta = std::fs::symlink_metadata(sandbox.root.join("renamed.txt")).expect("meta");
        assert!(meta.file_type().is_symlink());
    }

    #[test]
    fn write_through_escaping_symlink_is_refused() {
        let sandbox = Sandbox::new();
        let outside_file = sandbox.outside.join("victim.txt");
        std::fs::write(&outside_file, "original").expect("write");
        symlink(&outside_file, sandbox.root.join("victim.txt")).expect("symlink");
        let ctx = sandbox.context();

        let err = ctx
            .write_file(WriteFileRequest {
                path: sandbox.root.join("victim.txt"),
                content: "pwned".to_string(),
            })
            .expect_err("escape");
        match err {
            Error::OutOfBounds(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            std::fs::read_to_string(&outside_file).expect("read"),
            "original"
        );
    }
}
