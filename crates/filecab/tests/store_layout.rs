//! Persisted-layout assertions: one `<user>_folder` tree plus one
//! `<user>_database` file per username, created together.

use assert_fs::prelude::*;
use assert_fs::TempDir;

use filecab::{ensure_user_store, Category};

#[test]
fn store_layout_matches_contract() {
    let base = TempDir::new().unwrap();

    ensure_user_store(base.path(), "alice").unwrap();

    assert!(base.child("alice_folder").path().is_dir());
    assert!(base.child("alice_database").path().is_file());
    for cat in Category::ALL {
        assert!(
            base.child(format!("alice_folder/{cat}")).path().is_dir(),
            "missing category folder {cat}"
        );
    }
}

#[test]
fn provisioning_two_users_creates_disjoint_trees() {
    let base = TempDir::new().unwrap();

    ensure_user_store(base.path(), "alice").unwrap();
    ensure_user_store(base.path(), "bob").unwrap();

    assert!(base.child("alice_folder").path().is_dir());
    assert!(base.child("bob_folder").path().is_dir());
    assert!(base.child("alice_database").path().is_file());
    assert!(base.child("bob_database").path().is_file());
}

#[test]
fn reprovisioning_preserves_existing_content() {
    let base = TempDir::new().unwrap();

    let store = ensure_user_store(base.path(), "alice").unwrap();
    let marker = store.category_dir(Category::Other).join("1_keep.bin");
    std::fs::write(&marker, b"keep").unwrap();

    ensure_user_store(base.path(), "alice").unwrap();
    assert_eq!(std::fs::read(&marker).unwrap(), b"keep");
}
