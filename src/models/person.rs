use super::{bounded_string, nullable, ApiModel, PaymentCardNumber};
use crate::validation::{BodyFields, BodyModel};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HairColor {
    White,
    Brown,
    Black,
    Blonde,
    Red,
}

impl HairColor {
    pub const ALL: [HairColor; 5] = [
        HairColor::White,
        HairColor::Brown,
        HairColor::Black,
        HairColor::Blonde,
        HairColor::Red,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HairColor::White => "white",
            HairColor::Brown => "brown",
            HairColor::Black => "black",
            HairColor::Blonde => "blonde",
            HairColor::Red => "red",
        }
    }

    fn schema() -> Value {
        let values: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
        json!({ "title": "HairColor", "type": "string", "enum": values })
    }
}

/// A person as submitted by clients.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct Person {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(range(min = 1, max = 115))]
    pub age: i64,
    pub hair_color: Option<HairColor>,
    pub is_married: Option<bool>,
    #[validate(email)]
    pub email: Option<String>,
    pub card_number: Option<PaymentCardNumber>,
    #[validate(length(min = 8))]
    pub password: String,
}

impl BodyModel for Person {
    fn read(fields: &mut BodyFields) -> Self {
        Self {
            first_name: fields.required("first_name"),
            last_name: fields.required("last_name"),
            age: fields.required("age"),
            hair_color: fields.optional("hair_color"),
            is_married: fields.optional("is_married"),
            email: fields.optional("email"),
            card_number: fields.optional("card_number"),
            password: fields.required("password"),
        }
    }
}

impl ApiModel for Person {
    const NAME: &'static str = "Person";

    fn schema() -> Value {
        json!({
            "title": "Person",
            "type": "object",
            "required": ["first_name", "last_name", "age", "password"],
            "properties": {
                "first_name": bounded_string(1, 50),
                "last_name": bounded_string(1, 50),
                "age": { "type": "integer", "exclusiveMinimum": 0, "maximum": 115 },
                "hair_color": nullable(HairColor::schema()),
                "is_married": { "type": ["boolean", "null"] },
                "email": { "type": ["string", "null"], "format": "email" },
                "card_number": { "type": ["string", "null"], "pattern": "^[0-9 ]{12,}$" },
                "password": { "type": "string", "minLength": 8 }
            }
        })
    }

    fn example() -> Option<Value> {
        Some(json!({
            "first_name": "Facundo",
            "last_name": "García Martoni",
            "age": 21,
            "hair_color": "blonde",
            "is_married": false,
            "email": "facundo@example.com",
            "password": "holasoyfacundo"
        }))
    }
}

/// What the service returns for a person: never the password, and the card
/// number only in masked form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonOut {
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub hair_color: Option<HairColor>,
    pub is_married: Option<bool>,
    pub email: Option<String>,
    pub card_number: Option<String>,
}

impl From<Person> for PersonOut {
    fn from(person: Person) -> Self {
        Self {
            first_name: person.first_name,
            last_name: person.last_name,
            age: person.age,
            hair_color: person.hair_color,
            is_married: person.is_married,
            email: person.email,
            card_number: person.card_number.map(|c| c.masked()),
        }
    }
}

impl ApiModel for PersonOut {
    const NAME: &'static str = "PersonOut";

    fn schema() -> Value {
        json!({
            "title": "PersonOut",
            "type": "object",
            "required": ["first_name", "last_name", "age"],
            "additionalProperties": false,
            "properties": {
                "first_name": bounded_string(1, 50),
                "last_name": bounded_string(1, 50),
                "age": { "type": "integer", "exclusiveMinimum": 0, "maximum": 115 },
                "hair_color": nullable(HairColor::schema()),
                "is_married": { "type": ["boolean", "null"] },
                "email": { "type": ["string", "null"] },
                "card_number": { "type": ["string", "null"] }
            }
        })
    }

    fn example() -> Option<Value> {
        Some(json!({
            "first_name": "Facundo",
            "last_name": "García Martoni",
            "age": 21,
            "hair_color": "blonde",
            "is_married": false,
            "email": "facundo@example.com",
            "card_number": null
        }))
    }
}
