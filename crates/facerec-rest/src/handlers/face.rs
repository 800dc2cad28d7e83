use axum::{
    extract::{Multipart, State},
    Json,
};

use facerec_service::{MatchedUser, Registration};

use super::ApiError;
use crate::AppState;

/// Fields of a face upload form.
#[derive(Debug, Default)]
struct UploadForm {
    image: Option<Vec<u8>>,
    email: Option<String>,
}

impl UploadForm {
    /// Reads the `image` and `email` fields. Unknown fields are skipped.
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            match field.name() {
                Some("image") => form.image = Some(field.bytes().await?.to_vec()),
                Some("email") => form.email = Some(field.text().await?),
                _ => {}
            }
        }
        Ok(form)
    }
}

/// `POST /register`: registers the face in `image` under `email`.
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Registration>, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let registration = state
        .service
        .register(form.image.as_deref(), form.email.as_deref())
        .await?;

    tracing::info!(user_id = %registration.user_id, "user registered");
    Ok(Json(registration))
}

/// `POST /match`: resolves the user whose face is in `image`.
pub async fn match_face(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MatchedUser>, ApiError> {
    let form = UploadForm::read(multipart).await?;
    match state.service.identify(form.image.as_deref()).await? {
        Some(user) => {
            tracing::info!(user_id = %user.user_id, "face matched");
            Ok(Json(user))
        }
        None => Err(ApiError::NoMatch),
    }
}
