use super::{ParameterMeta, RouteMeta};
use crate::models::{ApiModel, ImageInfo, Location, LoginOut, Person, PersonOut};
use http::Method;
use serde_json::json;

const HOME: &str = "Home";
const PERSONS: &str = "Persons";

fn person_id_param() -> ParameterMeta {
    ParameterMeta::path(
        "person_id",
        json!({ "title": "Person ID", "type": "integer", "exclusiveMinimum": 0 }),
    )
    .describe("This is the person ID. It's required")
    .example(json!(123))
}

/// The service's operations, in the order they are documented.
#[must_use]
pub fn route_table() -> Vec<RouteMeta> {
    vec![
        RouteMeta::new(Method::GET, "/", "home", "Home").tag(HOME),
        RouteMeta::new(
            Method::POST,
            "/person/new",
            "create_person",
            "Create Person in the app",
        )
        .tag(PERSONS)
        .describe("Creates a person in the app and returns it without the password.")
        .json_body(Person::schema())
        .status(201)
        .response_model(PersonOut::NAME, PersonOut::schema()),
        RouteMeta::new(Method::GET, "/person/detail", "show_person", "Show Person")
            .tag(PERSONS)
            .param(
                ParameterMeta::query(
                    "name",
                    false,
                    json!({ "title": "Person Name", "type": "string", "minLength": 1, "maxLength": 50 }),
                )
                .describe("This is the person name. It's between 1 and 50 characters")
                .example(json!("Rocío")),
            )
            .param(
                ParameterMeta::query("age", true, json!({ "title": "Person Age", "type": "integer" }))
                    .describe("This is the person age. It's required")
                    .example(json!(25)),
            ),
        RouteMeta::new(
            Method::GET,
            "/person/detail/{person_id}",
            "show_person_by_id",
            "Show Person by ID",
        )
        .tag(PERSONS)
        .param(person_id_param()),
        RouteMeta::new(Method::PUT, "/person/{person_id}", "update_person", "Update Person")
            .tag(PERSONS)
            .describe("Merges the person and location records into a single object.")
            .param(person_id_param())
            .json_body(json!({
                "type": "object",
                "required": ["person", "location"],
                "properties": {
                    "person": Person::schema(),
                    "location": Location::schema()
                }
            })),
        RouteMeta::new(Method::POST, "/login", "login", "Login")
            .tag(PERSONS)
            .form_body()
            .param(ParameterMeta::form("username", json!({ "type": "string", "maxLength": 20 })))
            .param(ParameterMeta::form("password", json!({ "type": "string" })))
            .response_model(LoginOut::NAME, LoginOut::schema()),
        RouteMeta::new(Method::POST, "/contact", "contact", "Contact")
            .tag(HOME)
            .form_body()
            .param(ParameterMeta::form(
                "first_name",
                json!({ "type": "string", "minLength": 1, "maxLength": 20 }),
            ))
            .param(ParameterMeta::form(
                "last_name",
                json!({ "type": "string", "minLength": 1, "maxLength": 20 }),
            ))
            .param(ParameterMeta::form(
                "email",
                json!({ "type": "string", "format": "email", "pattern": "^[^@\\s]+@[^@\\s]+\\.[^@\\s]+$" }),
            ))
            .param(ParameterMeta::form("message", json!({ "type": "string", "minLength": 20 })))
            .param(ParameterMeta::header("user_agent", json!({ "type": "string" })))
            .param(ParameterMeta::cookie("ads", json!({ "type": "string" }))),
        RouteMeta::new(Method::POST, "/post-image", "post_image", "Upload an image")
            .tag(HOME)
            .multipart_body()
            .param(ParameterMeta::file("image"))
            .response_model(ImageInfo::NAME, ImageInfo::schema()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_handler_names_are_unique() {
        let routes = route_table();
        let names: HashSet<_> = routes.iter().map(|r| r.handler_name.as_str()).collect();
        assert_eq!(names.len(), routes.len());
    }

    #[test]
    fn test_create_person_returns_created() {
        let routes = route_table();
        let create = routes
            .iter()
            .find(|r| r.handler_name == "create_person")
            .unwrap();
        assert_eq!(create.success_status, 201);
        assert_eq!(create.response_model.as_ref().unwrap().0, "PersonOut");
    }

    #[test]
    fn test_path_params_are_declared() {
        for route in route_table() {
            let declared: Vec<_> = route
                .parameters_in(crate::error::ParamLocation::Path)
                .map(|p| format!("{{{}}}", p.name))
                .collect();
            for name in &declared {
                assert!(route.path_pattern.contains(name.as_str()), "{name} in {}", route.path_pattern);
            }
            assert_eq!(declared.len(), route.path_pattern.matches('{').count());
        }
    }
}
