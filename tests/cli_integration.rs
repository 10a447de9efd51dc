//! CLI integration tests for yamlcontent
//!
//! These tests drive the binary from project initialization through
//! document, field and upload commands, checking the files it leaves behind.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONTACT: &str = "uuid: c-1\ntitle: Contact\nform: []\n";

/// Get a command instance running inside `dir`, isolated from any global config
fn yc_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("yamlcontent"));
    cmd.current_dir(dir)
        .env_remove("YAMLCONTENT_CONFIG")
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd
}

/// Create a temporary directory and initialize a project in it
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    yc_cmd(dir.path()).arg("init").assert().success();
    dir
}

/// Project with a `contact` document saved
fn setup_contact() -> TempDir {
    let dir = setup_project();
    yc_cmd(dir.path())
        .args(["doc", "save", "contact", CONTACT])
        .assert()
        .success();
    dir
}

fn read_doc(dir: &Path, name: &str) -> serde_yaml::Value {
    let path = dir.join("storage/app/common").join(format!("{}.yaml", name));
    serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_structure() {
    let dir = TempDir::new().unwrap();

    yc_cmd(dir.path())
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized yaml-content project"));

    assert!(dir.path().join("yamlcontent.toml").is_file());
    assert!(dir.path().join("storage/app").is_dir());
    assert!(dir.path().join("storage/app/public").is_dir());
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();

    yc_cmd(dir.path()).arg("init").assert().success();
    yc_cmd(dir.path()).arg("init").assert().success();
}

#[test]
fn test_commands_require_project() {
    let dir = TempDir::new().unwrap();

    yc_cmd(dir.path())
        .args(["doc", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("yamlcontent init"));
}

#[test]
fn test_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let config = dir.path().join("site.toml");
    fs::write(&config, "folder = \"pages\"\n").unwrap();

    yc_cmd(elsewhere.path())
        .arg("--config")
        .arg(&config)
        .args(["doc", "save", "home", CONTACT])
        .assert()
        .success();

    assert!(dir.path().join("storage/app/pages/home.yaml").is_file());
}

// =============================================================================
// Document Tests
// =============================================================================

#[test]
fn test_doc_save_and_get() {
    let dir = setup_contact();

    assert!(dir.path().join("storage/app/common/contact.yaml").is_file());

    yc_cmd(dir.path())
        .args(["doc", "get", "contact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("title: Contact"));
}

#[test]
fn test_doc_save_from_stdin() {
    let dir = setup_project();

    yc_cmd(dir.path())
        .args(["doc", "save", "contact", "-"])
        .write_stdin(CONTACT)
        .assert()
        .success();

    assert_eq!(read_doc(dir.path(), "contact")["uuid"], "c-1");
}

#[test]
fn test_doc_get_json() {
    let dir = setup_contact();

    yc_cmd(dir.path())
        .args(["--format", "json", "doc", "get", "contact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\":\"Contact\""));
}

#[test]
fn test_doc_get_missing() {
    let dir = setup_project();

    yc_cmd(dir.path())
        .args(["doc", "get", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document not found: nope"));
}

#[test]
fn test_doc_save_without_index_key_fails() {
    let dir = setup_project();

    yc_cmd(dir.path())
        .args(["doc", "save", "broken", "title: No key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("uuid"));

    assert!(!dir.path().join("storage/app/common/broken.yaml").exists());
}

#[test]
fn test_index_tracks_documents() {
    let dir = setup_contact();

    yc_cmd(dir.path())
        .arg("index")
        .assert()
        .success()
        .stdout(predicate::str::contains("c-1").and(predicate::str::contains("Contact")));

    yc_cmd(dir.path())
        .args(["doc", "update", "contact", "title: Get in touch"])
        .assert()
        .success();

    yc_cmd(dir.path())
        .args(["--format", "json", "index"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"c-1\":\"Get in touch\""));
}

#[test]
fn test_doc_list() {
    let dir = setup_contact();
    yc_cmd(dir.path())
        .args(["doc", "save", "about", "uuid: a-1\ntitle: About\n"])
        .assert()
        .success();

    yc_cmd(dir.path())
        .args(["--format", "json", "doc", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[\"about\",\"contact\"]"));
}

#[test]
fn test_doc_delete_removes_index() {
    let dir = setup_contact();

    yc_cmd(dir.path())
        .args(["doc", "delete", "contact"])
        .assert()
        .success();

    assert!(!dir.path().join("storage/app/common/contact.yaml").exists());
    assert!(!dir.path().join("storage/app/common/index.yaml").exists());

    yc_cmd(dir.path())
        .arg("index")
        .assert()
        .success()
        .stdout(predicate::str::contains("Index is empty"));
}

// =============================================================================
// Field Tests
// =============================================================================

#[test]
fn test_field_add_and_get() {
    let dir = setup_contact();

    yc_cmd(dir.path())
        .args(["field", "add", "contact", "{name: email, label: Email, type: text}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added field email"));

    yc_cmd(dir.path())
        .args(["field", "get", "contact", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: email"));
}

#[test]
fn test_field_add_duplicate_fails() {
    let dir = setup_contact();
    let field = "{name: email, type: text}";

    yc_cmd(dir.path())
        .args(["field", "add", "contact", field])
        .assert()
        .success();

    yc_cmd(dir.path())
        .args(["field", "add", "contact", field])
        .assert()
        .failure()
        .stderr(predicate::str::contains("The field email already exists"));
}

#[test]
fn test_nested_fields() {
    let dir = setup_contact();

    yc_cmd(dir.path())
        .args(["field", "add", "contact", "{name: address, type: fieldset}"])
        .assert()
        .success();
    yc_cmd(dir.path())
        .args(["field", "add", "contact", "{name: street, type: text, parent: '0'}"])
        .assert()
        .success();
    yc_cmd(dir.path())
        .args(["field", "add", "contact", "{name: city, type: text, parent: '0'}"])
        .assert()
        .success();

    let doc = read_doc(dir.path(), "contact");
    assert_eq!(doc["form"][0]["fields"][0]["name"], "street");
    assert_eq!(doc["form"][0]["fields"][1]["name"], "city");

    yc_cmd(dir.path())
        .args(["field", "get", "contact", "0.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: city"));

    yc_cmd(dir.path())
        .args(["field", "find", "contact", "city", "--parent", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: city"));
}

#[test]
fn test_field_update_and_type_guard() {
    let dir = setup_contact();
    yc_cmd(dir.path())
        .args(["field", "add", "contact", "{name: email, label: Mail, type: text}"])
        .assert()
        .success();

    yc_cmd(dir.path())
        .args(["field", "update", "contact", "0", "--type", "select", "{label: Email}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be type select"));

    yc_cmd(dir.path())
        .args(["field", "update", "contact", "0", "--type", "text", "{label: Email, name: renamed}"])
        .assert()
        .success();

    let doc = read_doc(dir.path(), "contact");
    assert_eq!(doc["form"][0]["label"], "Email");
    assert_eq!(doc["form"][0]["name"], "email");
}

#[test]
fn test_field_delete() {
    let dir = setup_contact();
    for field in ["{name: a, type: text}", "{name: b, type: text}"] {
        yc_cmd(dir.path())
            .args(["field", "add", "contact", field])
            .assert()
            .success();
    }

    yc_cmd(dir.path())
        .args(["field", "delete", "contact", "0", "--type", "text"])
        .assert()
        .success();

    let doc = read_doc(dir.path(), "contact");
    assert_eq!(doc["form"].as_sequence().unwrap().len(), 1);
    assert_eq!(doc["form"][0]["name"], "b");
}

// =============================================================================
// Upload Tests
// =============================================================================

#[test]
fn test_upload_numbers_repeated_names() {
    let dir = setup_project();
    let file = dir.path().join("photo.jpg");
    fs::write(&file, b"jpeg").unwrap();

    yc_cmd(dir.path())
        .arg("upload")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("uploads/photo.jpg"));

    yc_cmd(dir.path())
        .arg("upload")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("uploads/photo_0.jpg"));

    let public = dir.path().join("storage/app/public/uploads");
    assert!(public.join("photo.jpg").is_file());
    assert!(public.join("photo_0.jpg").is_file());

    yc_cmd(dir.path())
        .args(["--format", "json", "uploads"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[\"photo.jpg\",\"photo_0.jpg\"]"));
}

#[test]
fn test_upload_short_extension_keeps_every_copy() {
    let dir = setup_project();
    let file = dir.path().join("data.gz");

    for content in ["one", "two", "three"] {
        fs::write(&file, content).unwrap();
        yc_cmd(dir.path())
            .arg("upload")
            .arg(&file)
            .args(["--dest", "dumps"])
            .assert()
            .success();
    }

    let public = dir.path().join("storage/app/public/dumps");
    assert_eq!(fs::read_to_string(public.join("data.gz")).unwrap(), "one");
    assert_eq!(fs::read_to_string(public.join("data.gz_0")).unwrap(), "two");
    assert_eq!(fs::read_to_string(public.join("data.gz_1")).unwrap(), "three");
}

#[test]
fn test_uploads_empty_folder() {
    let dir = setup_project();

    yc_cmd(dir.path())
        .args(["uploads", "docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No uploads in docs."));
}

#[test]
fn test_upload_into_field_replaces_previous_file() {
    let dir = setup_contact();
    yc_cmd(dir.path())
        .args(["field", "add", "contact", "{name: cv, type: file}"])
        .assert()
        .success();

    let file = dir.path().join("cv.pdf");
    fs::write(&file, b"v1").unwrap();

    for _ in 0..2 {
        yc_cmd(dir.path())
            .arg("upload")
            .arg(&file)
            .args(["--dest", "docs", "--doc", "contact", "--path", "0", "--attribute", "value"])
            .assert()
            .success();
    }

    let doc = read_doc(dir.path(), "contact");
    assert_eq!(doc["form"][0]["value"], "docs/cv.pdf");

    let stored: Vec<_> = fs::read_dir(dir.path().join("storage/app/public/docs"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .collect();
    assert_eq!(stored.len(), 1);
}
