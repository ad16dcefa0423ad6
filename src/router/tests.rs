use super::Router;

#[test]
fn test_root_path() {
    let (re, params) = Router::path_to_regex("/");
    assert!(re.is_match("/"));
    assert!(params.is_empty());
}

#[test]
fn test_parameterized_path() {
    let (re, params) = Router::path_to_regex("/items/{id}");
    assert!(re.is_match("/items/123"));
    assert_eq!(params, vec!["id"]);
}

#[test]
fn test_nested_path() {
    let (re, params) = Router::path_to_regex("/a/{b}/c");
    assert!(re.is_match("/a/1/c"));
    assert_eq!(params, vec!["b"]);
}

#[test]
fn test_literal_segments_are_escaped() {
    let (re, params) = Router::path_to_regex("/post-image");
    assert!(re.is_match("/post-image"));
    assert!(!re.is_match("/postXimage"));
    assert!(params.is_empty());
}

#[test]
fn test_trailing_slash_is_significant() {
    let (re, _) = Router::path_to_regex("/person/new");
    assert!(re.is_match("/person/new"));
    assert!(!re.is_match("/person/new/"));
}

#[test]
fn test_percent_encoded_segment_is_decoded() {
    let router = Router::new(crate::routes::route_table());
    let m = router
        .route(http::Method::PUT, "/person/4%32")
        .expect("route matches");
    assert_eq!(m.get_path_param("person_id"), Some("42"));
}

#[test]
fn test_allowed_methods_distinguishes_405_from_404() {
    let router = Router::new(crate::routes::route_table());
    assert!(router.route(http::Method::GET, "/login").is_none());
    assert_eq!(router.allowed_methods("/login"), vec![http::Method::POST]);
    // `/person/new` also fits the `/person/{person_id}` pattern
    assert_eq!(
        router.allowed_methods("/person/new"),
        vec![http::Method::POST, http::Method::PUT]
    );
    assert!(router.allowed_methods("/nope").is_empty());
}
