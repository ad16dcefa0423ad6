use crate::dispatcher::HandlerRequest;
use crate::error::ApiError;
use crate::models::{Location, Person, PersonOut};
use crate::typed::{from_params, json_body_field, Handler, TypedHandlerRequest};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::convert::TryFrom;
use tracing::debug;

/// Detail of the 404 for an unknown person id.
pub const PERSON_NOT_FOUND: &str = "¡This person doesn't exist!";

/// `POST /person/new`
pub struct CreatePerson;

#[derive(Debug)]
pub struct CreatePersonRequest {
    pub person: Person,
}

impl TryFrom<HandlerRequest> for CreatePersonRequest {
    type Error = ApiError;

    fn try_from(mut req: HandlerRequest) -> Result<Self, Self::Error> {
        let person = json_body_field(&mut req.body, None)?;
        Ok(Self { person })
    }
}

impl Handler for CreatePerson {
    type Request = CreatePersonRequest;
    type Response = PersonOut;
    const STATUS: u16 = 201;

    fn handle(&self, req: TypedHandlerRequest<CreatePersonRequest>) -> Result<PersonOut, ApiError> {
        Ok(PersonOut::from(req.data.person))
    }
}

/// `GET /person/detail`
pub struct ShowPerson;

#[derive(Debug, Deserialize)]
pub struct ShowPersonRequest {
    pub name: Option<String>,
    pub age: i64,
}

impl TryFrom<HandlerRequest> for ShowPersonRequest {
    type Error = ApiError;

    fn try_from(req: HandlerRequest) -> Result<Self, Self::Error> {
        from_params(&req)
    }
}

impl Handler for ShowPerson {
    type Request = ShowPersonRequest;
    type Response = Value;

    fn handle(&self, req: TypedHandlerRequest<ShowPersonRequest>) -> Result<Value, ApiError> {
        let ShowPersonRequest { name, age } = req.data;
        // An absent name is keyed as "null"
        let key = name.unwrap_or_else(|| "null".to_string());
        let mut out = Map::new();
        out.insert(key, json!(age));
        Ok(Value::Object(out))
    }
}

/// `GET /person/detail/{person_id}`: membership test against the known ids.
pub struct ShowPersonById {
    known_ids: BTreeSet<i64>,
}

impl ShowPersonById {
    #[must_use]
    pub fn new(known_ids: &[i64]) -> Self {
        Self {
            known_ids: known_ids.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShowPersonByIdRequest {
    pub person_id: i64,
}

impl TryFrom<HandlerRequest> for ShowPersonByIdRequest {
    type Error = ApiError;

    fn try_from(req: HandlerRequest) -> Result<Self, Self::Error> {
        from_params(&req)
    }
}

impl Handler for ShowPersonById {
    type Request = ShowPersonByIdRequest;
    type Response = Value;

    fn handle(&self, req: TypedHandlerRequest<ShowPersonByIdRequest>) -> Result<Value, ApiError> {
        let person_id = req.data.person_id;
        if !self.known_ids.contains(&person_id) {
            debug!(request_id = %req.request_id, person_id, "Unknown person id");
            return Err(ApiError::not_found(PERSON_NOT_FOUND));
        }
        let mut out = Map::new();
        out.insert(person_id.to_string(), json!("It exists!"));
        Ok(Value::Object(out))
    }
}

/// `PUT /person/{person_id}`: merges the person and location records.
pub struct UpdatePerson;

#[derive(Debug)]
pub struct UpdatePersonRequest {
    pub person_id: i64,
    pub person: Person,
    pub location: Location,
}

#[derive(Deserialize)]
struct PersonIdParam {
    person_id: i64,
}

impl TryFrom<HandlerRequest> for UpdatePersonRequest {
    type Error = ApiError;

    fn try_from(mut req: HandlerRequest) -> Result<Self, Self::Error> {
        let PersonIdParam { person_id } = from_params(&req)?;
        // Both records are checked so every problem is reported at once
        let person = json_body_field::<Person>(&mut req.body, Some("person"));
        let location = json_body_field::<Location>(&mut req.body, Some("location"));
        match (person, location) {
            (Ok(person), Ok(location)) => Ok(Self {
                person_id,
                person,
                location,
            }),
            (person, location) => {
                let mut details = person.err().unwrap_or_default();
                details.extend(location.err().unwrap_or_default());
                Err(ApiError::Validation(details))
            }
        }
    }
}

impl Handler for UpdatePerson {
    type Request = UpdatePersonRequest;
    type Response = Value;

    fn handle(&self, req: TypedHandlerRequest<UpdatePersonRequest>) -> Result<Value, ApiError> {
        let UpdatePersonRequest {
            person_id,
            person,
            location,
        } = req.data;
        debug!(request_id = %req.request_id, person_id, "Merging person and location");

        let mut merged = match serde_json::to_value(PersonOut::from(person)) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Ok(Value::Object(loc)) = serde_json::to_value(location) {
            merged.extend(loc);
        }
        Ok(Value::Object(merged))
    }
}
