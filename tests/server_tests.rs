//! End-to-end tests against a real server on an ephemeral port.
//!
//! Every operation is exercised with valid input and with input that must be
//! rejected, using a raw TCP client so the exact status codes and bodies on
//! the wire are checked.

mod common;

use common::http::{get, post_file, post_form, request, send_json, TestResponse};
use common::test_server::TestServer;
use person_api::config::AppConfig;
use serde_json::{json, Value};

fn person() -> Value {
    json!({
        "first_name": "Facundo",
        "last_name": "García Martoni",
        "age": 21,
        "hair_color": "blonde",
        "is_married": false,
        "email": "facundo@example.com",
        "card_number": "4242 4242 4242 4242",
        "password": "holasoyfacundo"
    })
}

fn location() -> Value {
    json!({ "city": "Bogotá", "state": "Cundinamarca", "country": "Colombia" })
}

/// `(loc, type)` pairs of a 422 body, in order.
fn errors(resp: &TestResponse) -> Vec<(Value, String)> {
    assert_eq!(resp.status, 422, "expected 422, got {}", resp.text());
    resp.json()["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| (d["loc"].clone(), d["type"].as_str().unwrap().to_string()))
        .collect()
}

fn has_error(resp: &TestResponse, loc: Value, kind: &str) -> bool {
    errors(resp).iter().any(|(l, k)| *l == loc && k == kind)
}

#[test]
fn test_home() {
    let server = TestServer::start();
    let resp = get(server.addr(), "/");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, "application/json");
    assert_eq!(resp.json(), json!({ "Hello": "World" }));
}

#[test]
fn test_create_person_returns_created_without_password() {
    let server = TestServer::start();
    let resp = send_json(server.addr(), "POST", "/person/new", &person());
    assert_eq!(resp.status, 201, "{}", resp.text());

    let body = resp.json();
    assert_eq!(body["first_name"], "Facundo");
    assert_eq!(body["hair_color"], "blonde");
    assert_eq!(body["card_number"], "424242******4242");
    assert!(body.get("password").is_none());
}

#[test]
fn test_create_person_reports_every_invalid_field() {
    let server = TestServer::start();
    let mut p = person();
    p["age"] = json!(0);
    p["email"] = json!("not-an-email");
    p["first_name"] = json!("x".repeat(51));
    let resp = send_json(server.addr(), "POST", "/person/new", &p);

    let errs = errors(&resp);
    assert_eq!(errs.len(), 3, "{errs:?}");
    assert!(has_error(&resp, json!(["body", "age"]), "value_error.number.not_ge"));
    assert!(has_error(&resp, json!(["body", "email"]), "value_error.email"));
    assert!(has_error(
        &resp,
        json!(["body", "first_name"]),
        "value_error.any_str.max_length"
    ));
}

#[test]
fn test_create_person_boundary_values_are_accepted() {
    let server = TestServer::start();
    let mut p = person();
    p["age"] = json!(115);
    p["first_name"] = json!("x".repeat(50));
    p["password"] = json!("12345678");
    let resp = send_json(server.addr(), "POST", "/person/new", &p);
    assert_eq!(resp.status, 201, "{}", resp.text());
}

#[test]
fn test_create_person_rejects_bad_card_and_hair_color() {
    let server = TestServer::start();
    let mut p = person();
    p["card_number"] = json!("4242424242424241");
    let resp = send_json(server.addr(), "POST", "/person/new", &p);
    assert!(has_error(&resp, json!(["body", "card_number"]), "value_error"));

    let mut p = person();
    p["hair_color"] = json!("green");
    let resp = send_json(server.addr(), "POST", "/person/new", &p);
    assert!(has_error(&resp, json!(["body", "hair_color"]), "type_error.enum"));
}

#[test]
fn test_create_person_reports_missing_and_invalid_fields_together() {
    let server = TestServer::start();
    let resp = send_json(
        server.addr(),
        "POST",
        "/person/new",
        &json!({ "age": 200, "email": "nope", "is_married": "maybe", "password": "x" }),
    );

    let errs = errors(&resp);
    assert_eq!(errs.len(), 6, "{errs:?}");
    assert!(has_error(&resp, json!(["body", "first_name"]), "value_error.missing"));
    assert!(has_error(&resp, json!(["body", "last_name"]), "value_error.missing"));
    assert!(has_error(&resp, json!(["body", "age"]), "value_error.number.not_le"));
    assert!(has_error(&resp, json!(["body", "email"]), "value_error.email"));
    assert!(has_error(&resp, json!(["body", "is_married"]), "type_error.bool"));
    assert!(has_error(
        &resp,
        json!(["body", "password"]),
        "value_error.any_str.min_length"
    ));
}

#[test]
fn test_create_person_wrong_type_points_at_field() {
    let server = TestServer::start();
    let mut p = person();
    p["age"] = json!("abc");
    let resp = send_json(server.addr(), "POST", "/person/new", &p);
    assert_eq!(
        errors(&resp),
        vec![(json!(["body", "age"]), "type_error.integer".to_string())]
    );
}

#[test]
fn test_create_person_missing_body_and_field() {
    let server = TestServer::start();
    let resp = request(
        server.addr(),
        "POST",
        "/person/new",
        &[("Content-Type", "application/json")],
        b"",
    );
    assert!(has_error(&resp, json!(["body"]), "value_error.missing"));

    let mut p = person();
    p.as_object_mut().unwrap().remove("password");
    let resp = send_json(server.addr(), "POST", "/person/new", &p);
    assert!(has_error(
        &resp,
        json!(["body", "password"]),
        "value_error.missing"
    ));
}

#[test]
fn test_invalid_json_is_unprocessable() {
    let server = TestServer::start();
    let resp = request(
        server.addr(),
        "POST",
        "/person/new",
        &[("Content-Type", "application/json")],
        b"{\"first_name\": ",
    );
    assert_eq!(resp.status, 422);
    assert_eq!(resp.json()["detail"][0]["type"], "value_error.jsondecode");
}

#[test]
fn test_show_person_query_parameters() {
    let server = TestServer::start();
    let resp = get(server.addr(), "/person/detail?name=Roc%C3%ADo&age=25");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.json(), json!({ "Rocío": 25 }));

    let resp = get(server.addr(), "/person/detail?age=25");
    assert_eq!(resp.json(), json!({ "null": 25 }));
}

#[test]
fn test_show_person_query_validation() {
    let server = TestServer::start();
    let resp = get(server.addr(), "/person/detail");
    assert!(has_error(&resp, json!(["query", "age"]), "value_error.missing"));

    let resp = get(server.addr(), "/person/detail?age=abc");
    assert!(has_error(&resp, json!(["query", "age"]), "type_error.integer"));

    let long_name = "n".repeat(51);
    let resp = get(
        server.addr(),
        &format!("/person/detail?age=30&name={long_name}"),
    );
    assert_eq!(errors(&resp)[0].0, json!(["query", "name"]));
}

#[test]
fn test_show_person_by_id_membership() {
    let server = TestServer::start();
    let resp = get(server.addr(), "/person/detail/3");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.json(), json!({ "3": "It exists!" }));

    let resp = get(server.addr(), "/person/detail/6");
    assert_eq!(resp.status, 404);
    assert_eq!(resp.json(), json!({ "detail": "¡This person doesn't exist!" }));
}

#[test]
fn test_show_person_by_id_path_validation() {
    let server = TestServer::start();
    let resp = get(server.addr(), "/person/detail/0");
    assert_eq!(errors(&resp)[0].0, json!(["path", "person_id"]));

    let resp = get(server.addr(), "/person/detail/abc");
    assert!(has_error(
        &resp,
        json!(["path", "person_id"]),
        "type_error.integer"
    ));
}

#[test]
fn test_known_ids_come_from_config() {
    let config = AppConfig {
        known_person_ids: vec![42],
        ..AppConfig::default()
    };
    let server = TestServer::with_config(config);
    assert_eq!(get(server.addr(), "/person/detail/42").status, 200);
    assert_eq!(get(server.addr(), "/person/detail/1").status, 404);
}

#[test]
fn test_update_person_merges_records() {
    let server = TestServer::start();
    let body = json!({ "person": person(), "location": location() });
    let resp = send_json(server.addr(), "PUT", "/person/3", &body);
    assert_eq!(resp.status, 200, "{}", resp.text());

    let merged = resp.json();
    assert_eq!(merged["first_name"], "Facundo");
    assert_eq!(merged["city"], "Bogotá");
    assert_eq!(merged["country"], "Colombia");
    assert!(merged.get("password").is_none());
}

#[test]
fn test_update_person_reports_both_records() {
    let server = TestServer::start();
    let mut p = person();
    p["age"] = json!(200);
    let mut loc = location();
    loc["city"] = json!("");
    let resp = send_json(
        server.addr(),
        "PUT",
        "/person/3",
        &json!({ "person": p, "location": loc }),
    );
    assert!(has_error(
        &resp,
        json!(["body", "person", "age"]),
        "value_error.number.not_le"
    ));
    assert!(has_error(
        &resp,
        json!(["body", "location", "city"]),
        "value_error.any_str.min_length"
    ));

    let resp = send_json(server.addr(), "PUT", "/person/3", &json!({ "person": person() }));
    assert!(has_error(
        &resp,
        json!(["body", "location"]),
        "value_error.missing"
    ));
}

#[test]
fn test_login_form() {
    let server = TestServer::start();
    let resp = post_form(
        server.addr(),
        "/login",
        &[("username", "facundo"), ("password", "secret")],
        &[],
    );
    assert_eq!(resp.status, 200, "{}", resp.text());
    assert_eq!(
        resp.json(),
        json!({ "username": "facundo", "message": "Login Succesfully!" })
    );

    let resp = post_form(server.addr(), "/login", &[("username", "facundo")], &[]);
    assert!(has_error(
        &resp,
        json!(["body", "password"]),
        "value_error.missing"
    ));

    let long = "u".repeat(21);
    let resp = post_form(
        server.addr(),
        "/login",
        &[("username", long.as_str()), ("password", "secret")],
        &[],
    );
    assert_eq!(errors(&resp)[0].0, json!(["body", "username"]));
}

fn contact_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("first_name", "Facundo"),
        ("last_name", "García"),
        ("email", "facundo@example.com"),
        ("message", "I would like to know more about the course."),
    ]
}

#[test]
fn test_contact_returns_user_agent() {
    let server = TestServer::start();
    let resp = post_form(
        server.addr(),
        "/contact",
        &contact_fields(),
        &[("User-Agent", "test-agent/1.0"), ("Cookie", "ads=yes")],
    );
    assert_eq!(resp.status, 200, "{}", resp.text());
    assert_eq!(resp.json(), json!("test-agent/1.0"));

    let resp = post_form(server.addr(), "/contact", &contact_fields(), &[]);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.json(), Value::Null);
}

#[test]
fn test_contact_validation() {
    let server = TestServer::start();
    let mut fields = contact_fields();
    fields[2] = ("email", "nope");
    fields[3] = ("message", "too short");
    let resp = post_form(server.addr(), "/contact", &fields, &[]);
    let locs: Vec<Value> = errors(&resp).into_iter().map(|(l, _)| l).collect();
    assert!(locs.contains(&json!(["body", "email"])));
    assert!(locs.contains(&json!(["body", "message"])));
}

#[test]
fn test_post_image() {
    let server = TestServer::start();
    let contents = vec![7u8; 1536];
    let resp = post_file(
        server.addr(),
        "/post-image",
        "image",
        "cat.png",
        "image/png",
        &contents,
    );
    assert_eq!(resp.status, 200, "{}", resp.text());
    assert_eq!(
        resp.json(),
        json!({ "Filename": "cat.png", "Format": "image/png", "Size(kb)": 1.5 })
    );
}

#[test]
fn test_post_image_without_file() {
    let server = TestServer::start();
    let resp = post_file(
        server.addr(),
        "/post-image",
        "document",
        "notes.txt",
        "text/plain",
        b"hello",
    );
    assert!(has_error(&resp, json!(["body", "image"]), "value_error.missing"));
}

#[test]
fn test_unknown_route_and_wrong_method() {
    let server = TestServer::start();
    let resp = get(server.addr(), "/nope");
    assert_eq!(resp.status, 404);
    assert_eq!(resp.json(), json!({ "detail": "Not Found" }));

    let resp = request(server.addr(), "DELETE", "/", &[], b"");
    assert_eq!(resp.status, 405);
    assert_eq!(resp.json(), json!({ "detail": "Method Not Allowed" }));

    // Trailing slashes are significant
    assert_eq!(get(server.addr(), "/person/detail/3/").status, 404);
}

#[test]
fn test_body_over_limit_is_rejected() {
    let config = AppConfig {
        max_body_bytes: 64,
        ..AppConfig::default()
    };
    let server = TestServer::with_config(config);
    let resp = send_json(server.addr(), "POST", "/person/new", &person());
    assert_eq!(resp.status, 413);
}

#[test]
fn test_builtin_endpoints() {
    let server = TestServer::start();

    let resp = get(server.addr(), "/health");
    assert_eq!(resp.json(), json!({ "status": "ok" }));

    assert_eq!(get(server.addr(), "/").status, 200);
    let resp = get(server.addr(), "/metrics");
    assert_eq!(resp.status, 200);
    assert!(resp.content_type.starts_with("text/plain"));
    let text = resp.text();
    assert!(text.contains("person_api_requests_total 1"), "{text}");
    assert!(text.contains("person_api_handler_requests_total{handler=\"home\"} 1"));

    let resp = get(server.addr(), "/openapi.json");
    let doc = resp.json();
    assert_eq!(doc["openapi"], "3.1.0");
    assert!(doc["paths"]["/person/{person_id}"]["put"].is_object());

    let resp = get(server.addr(), "/openapi.yaml");
    assert_eq!(resp.status, 200);
    let yaml = resp.text();
    assert!(yaml.contains("openapi:"), "{yaml}");
    assert!(yaml.contains("/person/detail/{person_id}"));
}
