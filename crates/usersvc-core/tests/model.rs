#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use usersvc_core::model::{validate_email, validate_name};
use usersvc_core::{UserInput, UsersError};

#[test]
fn names() {
    assert!(validate_name("Alice Dupont"));
    assert!(validate_name("Alice Dupont-Updated"));
    assert!(validate_name("Zoë O'Neil"));
    assert!(validate_name("Élodie"));

    assert!(!validate_name("A"));
    assert!(!validate_name(&"a".repeat(101)));
    assert!(!validate_name("Robert'); DROP TABLE users;--"));
    assert!(!validate_name("<script>"));
    assert!(!validate_name("R2D2"));
}

#[test]
fn emails() {
    assert!(validate_email("alice@example.com"));
    assert!(validate_email("alice.updated@example.com"));
    assert!(validate_email("a+tag_1%x@sub.example-host.io"));

    assert!(!validate_email("alice"));
    assert!(!validate_email("@example.com"));
    assert!(!validate_email("alice@example"));
    assert!(!validate_email("alice@example.c"));
    assert!(!validate_email("alice@.com"));
    assert!(!validate_email("alice@example.c0m"));
    assert!(!validate_email("al ice@example.com"));
    assert!(!validate_email("a@b@example.com"));
}

#[test]
fn input_requires_both_fields() {
    let missing = UserInput {
        name: Some("Alice Dupont".into()),
        email: None,
    };
    match missing.validate() {
        Err(UsersError::BadRequest(msg)) => assert_eq!(msg, "name and email are required"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn input_normalizes_email() {
    let input = UserInput::new("Alice Dupont", "  Alice@Example.COM ");
    let new = input.validate().unwrap();
    assert_eq!(new.email, "alice@example.com");
    assert_eq!(new.name, "Alice Dupont");
}

#[test]
fn input_rejects_bad_formats() {
    let err = UserInput::new("X", "alice@example.com").validate().unwrap_err();
    assert_eq!(err.client_code().http_status(), 400);

    let err = UserInput::new("Alice Dupont", "not-an-email").validate().unwrap_err();
    assert_eq!(err.to_string(), "Invalid email format");
}

#[test]
fn user_serializes_contract_fields() {
    let input: UserInput =
        serde_json::from_str(r#"{"name":"Alice Dupont","email":"alice@example.com"}"#).unwrap();
    assert_eq!(input.name.as_deref(), Some("Alice Dupont"));

    let user = usersvc_core::User {
        id: 1,
        name: "Alice Dupont".into(),
        email: "alice@example.com".into(),
        created_at: chrono::Utc::now(),
    };
    let v = serde_json::to_value(&user).unwrap();
    assert_eq!(v["id"], 1);
    assert_eq!(v["name"], "Alice Dupont");
    assert_eq!(v["email"], "alice@example.com");
    assert!(v["created_at"].is_string());
}
