//! # Handlers
//!
//! One typed handler per operation in the route table. Request types are
//! built from a [`crate::dispatcher::HandlerRequest`] with `TryFrom`, which
//! is where body models are deserialized and validated.

mod forms;
mod home;
mod persons;

pub use forms::{
    Contact, ContactRequest, Login, LoginRequest, PostImage, PostImageRequest,
};
pub use home::Home;
pub use persons::{
    CreatePerson, CreatePersonRequest, ShowPerson, ShowPersonById, ShowPersonByIdRequest,
    ShowPersonRequest, UpdatePerson, UpdatePersonRequest, PERSON_NOT_FOUND,
};
