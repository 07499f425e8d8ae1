mod common;

use common::*;
use notesync::{Note, NoteService};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

async fn create_note_helper(client: &Client, api: &str, text: &str) -> Note {
    client
        .post(&format!("{}/note", api))
        .json(&json!({ "text": text }))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .expect("Failed to parse response")
}

#[tokio::test]
async fn health_check() {
    let app = spawn_app().await;
    let response = Client::new()
        .get(&format!("{}/health_check", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn new_note() {
    let app = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(&format!("{}/note", app.api()))
        .json(&json!({ "text": "buy milk" }))
        .send()
        .await
        .expect("Failed to execute request.")
        .json::<Value>()
        .await
        .expect("Failed to parse response");
    assert!(response["id"].is_string());
    assert_eq!(response["text"], "buy milk");
    assert_eq!(app.service.list_notes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_notes() {
    let app = spawn_app().await;
    let client = Client::new();
    let note1 = create_note_helper(&client, &app.api(), "buy milk").await;
    let note2 = create_note_helper(&client, &app.api(), "buy bread").await;

    let notes: Vec<Note> = client
        .get(&format!("{}/note", app.api()))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(notes, vec![note1, note2]);
}

#[tokio::test]
async fn update_note() {
    let app = spawn_app().await;
    let client = Client::new();
    let note = create_note_helper(&client, &app.api(), "buy milk").await;

    let response = client
        .post(&format!("{}/note/{}", app.api(), note.id))
        .json(&json!({ "text": "buy bread" }))
        .send()
        .await
        .expect("Failed to execute request.")
        .json::<Value>()
        .await
        .expect("Failed to parse response");
    assert_eq!(response["id"], note.id.as_ref());
    assert_eq!(response["text"], "buy bread");

    let response = client
        .post(&format!("{}/note/missing", app.api()))
        .json(&json!({ "text": "buy bread" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_note() {
    let app = spawn_app().await;
    let client = Client::new();
    let note = create_note_helper(&client, &app.api(), "buy milk").await;

    let response = client
        .delete(&format!("{}/note/{}", app.api(), note.id))
        .send()
        .await
        .expect("Failed to execute request.")
        .json::<Value>()
        .await
        .expect("Failed to parse response");
    assert_eq!(response, json!({ "id": note.id.as_ref() }));

    let response = client
        .delete(&format!("{}/note/{}", app.api(), note.id))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_note_rejected() {
    let app = spawn_app().await;
    let response = Client::new()
        .post(&format!("{}/note", app.api()))
        .json(&json!({ "text": "  " }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_channel_rejected() {
    let app = spawn_app().await;
    let response = Client::new()
        .get(&format!("{}/subscribe/renamed", app.api()))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_required_when_configured() {
    let app = spawn_app_with_token(Some("s3cret")).await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/note", app.api()))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(&format!("{}/note", app.api()))
        .bearer_auth("s3cret")
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), StatusCode::OK);
}
