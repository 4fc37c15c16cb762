use crate::errors::ServiceError;
use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// JSON body that has been decoded and passed its `validator` rules.
///
/// Every rejection is reported as a 400 with an issue list, including a
/// missing content type or a body that does not match the schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ServiceError {
    let code = match &rejection {
        JsonRejection::JsonDataError(_) => "schema",
        JsonRejection::JsonSyntaxError(_) => "syntax",
        JsonRejection::MissingJsonContentType(_) => "content_type",
        _ => "body",
    };
    ServiceError::invalid_field("body", code, rejection.body_text())
}

/// Path parameters whose parse failures answer with the JSON error body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: PathRejection| {
                ServiceError::invalid_field("path", "invalid", rejection.body_text())
            })?;
        Ok(ApiPath(value))
    }
}

/// Query string counterpart of [`ApiPath`]; unknown enum values and
/// unparsable numbers become a `query` issue.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                ServiceError::invalid_field("query", "invalid", rejection.body_text())
            })?;
        Ok(ApiQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(range(min = 1, max = 10))]
        n: i32,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let ValidatedJson(sample) = ValidatedJson::<Sample>::from_request(json_request(r#"{"n":3}"#), &())
            .await
            .unwrap();
        assert_eq!(sample.n, 3);
    }

    #[tokio::test]
    async fn malformed_json_is_a_body_issue() {
        let err = ValidatedJson::<Sample>::from_request(json_request("{"), &())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidFields(issues)
            if issues[0].path == "body" && issues[0].code == "syntax");
        assert_eq!(
            ServiceError::invalid_field("body", "syntax", "x").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[derive(Debug, Deserialize)]
    struct Filter {
        #[allow(dead_code)]
        limit: Option<u32>,
    }

    #[tokio::test]
    async fn bad_query_values_are_query_issues() {
        let (mut parts, _) = Request::builder()
            .uri("/?limit=many")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let err = ApiQuery::<Filter>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidFields(issues)
            if issues[0].path == "query" && issues[0].code == "invalid");
    }

    #[tokio::test]
    async fn rule_violations_name_the_field() {
        let err = ValidatedJson::<Sample>::from_request(json_request(r#"{"n":99}"#), &())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidFields(issues) if issues[0].path == "n");
    }
}
