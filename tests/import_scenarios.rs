//! End-to-end import runs against an in-memory memory service.

use chatwise_to_nowledge::client::{CreatedThread, MemoryService, RemoteThread};
use chatwise_to_nowledge::conversation::ThreadPayload;
use chatwise_to_nowledge::parser::parse_chat_document;
use chatwise_to_nowledge::pipeline;
use chatwise_to_nowledge::prompt::LinePrompter;
use chatwise_to_nowledge::{ImportConfig, ImportError, ImportMode, Result};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;
use zip::write::SimpleFileOptions;

#[derive(Default)]
struct RecordingService {
    existing: Vec<RemoteThread>,
    created: RefCell<Vec<ThreadPayload>>,
}

impl MemoryService for RecordingService {
    fn list_threads(&self) -> Result<Vec<RemoteThread>> {
        Ok(self.existing.clone())
    }

    fn create_thread(&self, payload: &ThreadPayload) -> Result<CreatedThread> {
        self.created.borrow_mut().push(payload.clone());
        Ok(CreatedThread {
            id: Some(format!("t{}", self.created.borrow().len())),
        })
    }
}

impl RecordingService {
    fn created_ids(&self) -> Vec<String> {
        self.created
            .borrow()
            .iter()
            .map(|p| p.thread_id.clone())
            .collect()
    }
}

fn chat_json(id: &str, title: &str, first: &str) -> String {
    json!({
        "id": id,
        "title": title,
        "model": "gpt-4o",
        "createdAt": "2024-05-01T10:00:00.000Z",
        "updatedAt": "2024-05-02T10:00:00.000Z",
        "messages": [
            {"role": "user", "content": first},
            {"role": "assistant", "content": format!("answer to {first}")}
        ]
    })
    .to_string()
}

fn write_dir_export(root: &Path, chats: &[(&str, String)]) {
    fs::write(root.join("chatwise-export-verison.txt"), "1").unwrap();
    for (id, body) in chats {
        fs::write(root.join(format!("chat-{id}.json")), body).unwrap();
    }
}

fn write_zip_export(path: &Path, chats: &[(&str, String)]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    let opts = SimpleFileOptions::default();
    zip.start_file("export/chatwise-export-verison.txt", opts)
        .unwrap();
    zip.write_all(b"1").unwrap();
    for (id, body) in chats {
        zip.start_file(format!("export/chat-{id}.json"), opts).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn auto_config(input: &Path) -> ImportConfig {
    ImportConfig {
        input: input.to_path_buf(),
        base_url: "http://127.0.0.1:14242".into(),
        timeout: Duration::from_secs(5),
        mode: Some(ImportMode::Auto),
        quiet: true,
    }
}

fn run(config: &ImportConfig, service: &RecordingService, answers: &str) -> (Result<chatwise_to_nowledge::ImportSummary>, String) {
    let mut prompter = LinePrompter::new(Cursor::new(answers.as_bytes().to_vec()), Vec::<u8>::new());
    let mut out = Vec::<u8>::new();
    let result = pipeline::execute(config, service, &mut prompter, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn one_of_three_already_present_is_not_resubmitted() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("chatwise.zip");
    write_zip_export(
        &archive,
        &[
            ("a", chat_json("a", "Alpha", "first")),
            ("b", chat_json("b", "Beta", "second")),
            ("c", chat_json("c", "Gamma", "third")),
        ],
    );
    let service = RecordingService {
        existing: vec![RemoteThread {
            id: "chatwise-b".into(),
            title: "Beta".into(),
            metadata: None,
        }],
        ..Default::default()
    };

    let (result, out) = run(&auto_config(&archive), &service, "");
    let summary = result.unwrap();

    assert_eq!(summary.imported, 2);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(service.created_ids(), vec!["chatwise-a", "chatwise-c"]);
    assert!(out.contains("2 imported, 0 skipped, 1 duplicate, 0 failed"));
}

#[test]
fn malformed_record_is_skipped_and_the_rest_imported() {
    let dir = tempdir().unwrap();
    let mut chats: Vec<(&str, String)> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|id| (*id, chat_json(id, &format!("Chat {id}"), id)))
        .collect();
    chats.push(("broken", "{\"id\": \"broken\", \"messages\": [".to_string()));
    write_dir_export(dir.path(), &chats);
    let service = RecordingService::default();

    let (result, _) = run(&auto_config(dir.path()), &service, "");
    let summary = result.unwrap();

    assert_eq!(summary.imported, 5);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
}

#[test]
fn same_chat_exported_twice_becomes_one_thread() {
    let dir = tempdir().unwrap();
    write_dir_export(
        dir.path(),
        &[
            ("a", chat_json("a", "New Chat", "hi")),
            ("b", chat_json("b", "New Chat", "hi")),
        ],
    );
    let service = RecordingService::default();

    let summary = run(&auto_config(dir.path()), &service, "").0.unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(service.created_ids(), vec!["chatwise-a"]);
}

#[test]
fn numeric_ids_are_imported() {
    let dir = tempdir().unwrap();
    let body = json!({
        "id": 123,
        "title": "Numbers",
        "messages": [{"role": "user", "content": "count"}]
    })
    .to_string();
    write_dir_export(dir.path(), &[("123", body)]);
    let service = RecordingService::default();

    let summary = run(&auto_config(dir.path()), &service, "").0.unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(service.created_ids(), vec!["chatwise-123"]);
}

#[test]
fn second_run_against_populated_service_imports_nothing() {
    let dir = tempdir().unwrap();
    write_dir_export(
        dir.path(),
        &[
            ("a", chat_json("a", "Alpha", "first")),
            ("b", chat_json("b", "Beta", "second")),
        ],
    );

    let first = RecordingService::default();
    run(&auto_config(dir.path()), &first, "").0.unwrap();

    // The service echoes back what it stored, under ids of its own choosing.
    let second = RecordingService {
        existing: first
            .created
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, p)| RemoteThread {
                id: format!("server-{i}"),
                title: p.title.clone(),
                metadata: Some(serde_json::to_value(&p.metadata).unwrap()),
            })
            .collect(),
        ..Default::default()
    };
    let summary = run(&auto_config(dir.path()), &second, "").0.unwrap();

    assert_eq!(summary.imported, 0);
    assert_eq!(summary.duplicates, 2);
    assert!(second.created.borrow().is_empty());
}

#[test]
fn manual_mode_submits_only_confirmed_records() {
    let dir = tempdir().unwrap();
    write_dir_export(
        dir.path(),
        &[
            ("a", chat_json("a", "Alpha", "first")),
            ("b", chat_json("b", "Beta", "second")),
            ("c", chat_json("c", "Gamma", "third")),
        ],
    );
    let service = RecordingService::default();
    let config = ImportConfig {
        mode: Some(ImportMode::Manual),
        ..auto_config(dir.path())
    };

    let (result, out) = run(&config, &service, "n\ny\nq\n");
    let summary = result.unwrap();

    assert_eq!(service.created_ids(), vec!["chatwise-b"]);
    assert_eq!(summary.skipped, 1);
    assert!(summary.aborted);
    assert!(out.contains("Title:         Alpha"));
    assert!(out.contains("Stopped early"));
}

#[test]
fn payload_matches_service_contract() {
    let dir = tempdir().unwrap();
    write_dir_export(dir.path(), &[("a", chat_json("a", "Alpha", "first"))]);
    let service = RecordingService::default();

    run(&auto_config(dir.path()), &service, "").0.unwrap();

    let created = service.created.borrow();
    let body = serde_json::to_value(&created[0]).unwrap();
    assert_eq!(body["thread_id"], "chatwise-a");
    assert_eq!(body["title"], "Alpha");
    assert_eq!(body["source"], "chatwise");
    assert_eq!(body["messages"][0], json!({"content": "first", "role": "user"}));
    assert_eq!(body["metadata"]["original_id"], "a");
    assert_eq!(body["metadata"]["created_at"], "2024-05-01T10:00:00Z");
    assert!(body["import_date"].is_string());
}

#[test]
fn missing_input_fails_before_contacting_the_service() {
    let dir = tempdir().unwrap();
    let service = RecordingService::default();
    let (result, _) = run(&auto_config(&dir.path().join("missing.zip")), &service, "");
    assert!(matches!(result.unwrap_err(), ImportError::Setup(_)));
}

#[test]
fn fingerprint_is_stable_across_parses() {
    let body = chat_json("a", "Alpha", "first");
    let one = parse_chat_document("chat-a.json", body.as_bytes()).unwrap();
    let two = parse_chat_document("chat-a.json", body.as_bytes()).unwrap();
    assert_eq!(one, two);
    assert_eq!(one.fingerprint(), two.fingerprint());
}
