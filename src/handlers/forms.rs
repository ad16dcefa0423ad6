use crate::dispatcher::HandlerRequest;
use crate::error::ApiError;
use crate::models::{ImageInfo, LoginOut, UploadedFile};
use crate::typed::{from_params, required_file, Handler, TypedHandlerRequest};
use serde::Deserialize;
use std::convert::TryFrom;
use tracing::info;

/// `POST /login`
pub struct Login;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl TryFrom<HandlerRequest> for LoginRequest {
    type Error = ApiError;

    fn try_from(req: HandlerRequest) -> Result<Self, Self::Error> {
        from_params(&req)
    }
}

impl Handler for Login {
    type Request = LoginRequest;
    type Response = LoginOut;

    fn handle(&self, req: TypedHandlerRequest<LoginRequest>) -> Result<LoginOut, ApiError> {
        Ok(LoginOut::for_user(req.data.username))
    }
}

/// `POST /contact`: answers with the caller's `User-Agent`, if any.
pub struct Contact;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub message: String,
    pub user_agent: Option<String>,
    pub ads: Option<String>,
}

impl TryFrom<HandlerRequest> for ContactRequest {
    type Error = ApiError;

    fn try_from(req: HandlerRequest) -> Result<Self, Self::Error> {
        from_params(&req)
    }
}

impl Handler for Contact {
    type Request = ContactRequest;
    type Response = Option<String>;

    fn handle(&self, req: TypedHandlerRequest<ContactRequest>) -> Result<Option<String>, ApiError> {
        let data = req.data;
        info!(
            request_id = %req.request_id,
            email = %data.email,
            message_len = data.message.chars().count(),
            ads = data.ads.is_some(),
            "Contact message received"
        );
        Ok(data.user_agent)
    }
}

/// `POST /post-image`: reports name, content type and size of the upload.
pub struct PostImage;

#[derive(Debug)]
pub struct PostImageRequest {
    pub image: UploadedFile,
}

impl TryFrom<HandlerRequest> for PostImageRequest {
    type Error = ApiError;

    fn try_from(mut req: HandlerRequest) -> Result<Self, Self::Error> {
        let image = required_file(&mut req, "image")?;
        Ok(Self { image })
    }
}

impl Handler for PostImage {
    type Request = PostImageRequest;
    type Response = ImageInfo;

    fn handle(&self, req: TypedHandlerRequest<PostImageRequest>) -> Result<ImageInfo, ApiError> {
        Ok(ImageInfo::from(&req.data.image))
    }
}
