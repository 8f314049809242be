mod common;

use common::Sandbox;
use secure_fs::{DirectoryTreeRequest, EntryKind, Error, TreeEntry};

fn find<'a>(entries: &'a [TreeEntry], name: &str) -> &'a TreeEntry {
    entries
        .iter()
        .find(|entry| entry.name == name)
        .unwrap_or_else(|| panic!("missing entry {name}: {entries:?}"))
}

#[test]
fn tree_nests_children_only_under_directories() {
    let sandbox = Sandbox::new();
    sandbox.write("a.txt", "a");
    sandbox.write("src/lib.rs", "");
    sandbox.write("src/ops/mod.rs", "");
    std::fs::create_dir_all(sandbox.root.join("empty")).expect("mkdir");
    let ctx = sandbox.context();

    let response = ctx
        .directory_tree(DirectoryTreeRequest {
            path: sandbox.root.clone(),
        })
        .expect("tree");

    assert_eq!(response.entries.len(), 3);
    let file = find(&response.entries, "a.txt");
    assert_eq!(file.kind, EntryKind::File);
    assert!(file.children.is_none());

    let empty = find(&response.entries, "empty");
    assert_eq!(empty.kind, EntryKind::Directory);
    assert_eq!(empty.children.as_deref(), Some(&[][..]));

    let src = find(&response.entries, "src");
    let src_children = src.children.as_deref().expect("children");
    assert_eq!(src_children.len(), 2);
    let ops = find(src_children, "ops");
    assert_eq!(find(ops.children.as_deref().expect("children"), "mod.rs").kind, EntryKind::File);
}

#[test]
fn tree_json_uses_type_and_omits_children_for_files() {
    let sandbox = Sandbox::new();
    sandbox.write("only.txt", "x");
    let ctx = sandbox.context();

    let response = ctx
        .directory_tree(DirectoryTreeRequest {
            path: sandbox.root.clone(),
        })
        .expect("tree");
    let json: serde_json::Value =
        serde_json::from_str(&response.to_json_pretty().expect("json")).expect("parse");
    assert_eq!(json, serde_json::json!([{ "name": "only.txt", "type": "file" }]));
}

#[test]
fn tree_on_a_file_is_rejected() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("a.txt", "a");
    let ctx = sandbox.context();

    let err = ctx
        .directory_tree(DirectoryTreeRequest { path: file })
        .expect_err("not a dir");
    match err {
        Error::InvalidPath(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn tree_outside_roots_is_out_of_bounds() {
    let sandbox = Sandbox::new();
    let ctx = sandbox.context();

    let err = ctx
        .directory_tree(DirectoryTreeRequest {
            path: sandbox.outside.clone(),
        })
        .expect_err("outside");
    match err {
        Error::OutOfBounds(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[cfg(unix)]
mod symlinks {
    use std::os::unix::fs::symlink;

    use super::*;

    #[test]
    fn symlink_cycle_terminates_with_cycle_detected() {
        let sandbox = Sandbox::new();
        sandbox.write("sub/file.txt", "x");
        symlink(&sandbox.root, sandbox.root.join("sub/back")).expect("symlink");
        let ctx = sandbox.context();

        let err = ctx
            .directory_tree(DirectoryTreeRequest {
                path: sandbox.root.clone(),
            })
            .expect_err("cycle");
        match err {
            Error::CycleDetected(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn symlinked_directory_inside_root_is_followed() {
        let sandbox = Sandbox::new();
        sandbox.write("real/inner.txt", "x");
        symlink(sandbox.root.join("real"), sandbox.root.join("alias")).expect("symlink");
        let ctx = sandbox.context();

        let response = ctx
            .directory_tree(DirectoryTreeRequest {
                path: sandbox.root.clone(),
            })
            .expect("tree");
        let alias = find(&response.entries, "alias");
        assert_eq!(alias.kind, EntryKind::Directory);
        assert_eq!(alias.children.as_deref().expect("children")[0].name, "inner.txt");
    }

    #[test]
    fn escaping_symlinks_are_skipped_not_fatal() {
        let sandbox = Sandbox::new();
        sandbox.write("ok.txt", "x");
        sandbox.write("nested/keep.txt", "x");
        std::fs::write(sandbox.outside.join("f.txt"), "secret").expect("write outside");
        symlink(sandbox.outside.join("f.txt"), sandbox.root.join("deep_link")).expect("symlink");
        symlink(&sandbox.outside, sandbox.root.join("nested/escape")).expect("symlink dir");
        let ctx = sandbox.context();

        let response = ctx
            .directory_tree(DirectoryTreeRequest {
                path: sandbox.root.clone(),
            })
            .expect("tree");
        assert_eq!(response.skipped_entries, 2);
        assert_eq!(response.entries.len(), 2);
        find(&response.entries, "ok.txt");
        assert!(response.entries.iter().all(|entry| entry.name != "deep_link"));
        let nested = find(&response.entries, "nested");
        let children = nested.children.as_deref().expect("children");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "keep.txt");
    }
}
