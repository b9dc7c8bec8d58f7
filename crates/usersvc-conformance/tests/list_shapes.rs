#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;
use usersvc_conformance::client::user_list;

#[test]
fn bare_array_is_the_list() {
    let list = user_list(json!([{"id": 1}])).unwrap();
    assert_eq!(list, json!([{"id": 1}]));
}

#[test]
fn wrapped_list_is_unwrapped() {
    let body = json!({"data": [{"id": 1}], "source": "database"});
    assert_eq!(user_list(body).unwrap(), json!([{"id": 1}]));

    let body = json!({"users": [], "count": 0});
    assert_eq!(user_list(body).unwrap(), json!([]));
}

#[test]
fn other_shapes_are_schema_mismatches() {
    for body in [json!({}), json!({"data": "nope"}), json!("users"), json!(null)] {
        let err = user_list(body).unwrap_err();
        assert_eq!(err.kind(), "schema_mismatch");
    }
}
