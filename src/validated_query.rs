//! Axum extractor that parses and validates query string parameters

use crate::error::SeriesError;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use url::form_urlencoded;
use validator::Validate;

/// Types that can be built from decoded query string pairs.
///
/// Pairs are given in query string order, so repeated keys such as
/// `locations=a&locations=b` can be collected.
pub trait FromQueryPairs: Sized {
    fn from_query_pairs(pairs: Vec<(String, String)>) -> Result<Self, SeriesError>;
}

/// An axum extractor that builds a [FromQueryPairs] type from the request's query string and
/// validates it using the validator crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: FromQueryPairs + Validate,
    S: Send + Sync,
{
    type Rejection = SeriesError;

    /// Extract a `ValidatedQuery` from request `Parts`.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        let pairs = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        let value = T::from_query_pairs(pairs)?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    // https://github.com/tokio-rs/axum/blob/main/examples/testing/src/main.rs

    use super::*;
    use axum::{
        body::Body,
        http::{self, Request, StatusCode},
        response::Response,
        routing::get,
        Router,
    };
    use regex::Regex;
    use tower::ServiceExt; // for `oneshot` and `ready`

    #[derive(Validate)]
    struct TestParams {
        #[validate(length(min = 1, max = 3))]
        pub foo: Vec<String>,
        pub bar: Option<u32>,
    }

    impl FromQueryPairs for TestParams {
        fn from_query_pairs(pairs: Vec<(String, String)>) -> Result<Self, SeriesError> {
            let mut params = TestParams {
                foo: vec![],
                bar: None,
            };
            for (key, value) in pairs {
                match key.as_str() {
                    "foo" => params.foo.push(value),
                    "bar" => {
                        let bar = value.parse().map_err(|_| {
                            SeriesError::InvalidQueryParameter { name: "bar", value }
                        })?;
                        params.bar = Some(bar);
                    }
                    _ => (),
                }
            }
            Ok(params)
        }
    }

    // Handler function that accepts a ValidatedQuery extractor.
    async fn test_handler(ValidatedQuery(params): ValidatedQuery<TestParams>) -> String {
        format!("foo: {:?} bar: {:?}", params.foo, params.bar)
    }

    // Build a router and make a oneshot request.
    async fn request(uri: &str) -> Response {
        Router::new()
            .route("/", get(test_handler))
            .oneshot(
                Request::builder()
                    .method(http::Method::GET)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    // Jump through the hoops to get the body as a string.
    async fn body_string(response: Response) -> String {
        String::from_utf8(
            hyper::body::to_bytes(response.into_body())
                .await
                .unwrap()
                .to_vec(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn ok() {
        let response = request("/?foo=abc&bar=123").await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert_eq!(&body[..], r#"foo: ["abc"] bar: Some(123)"#);
    }

    #[tokio::test]
    async fn repeated_keys() {
        let response = request("/?foo=a&foo=b%20c&foo=d+e").await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert_eq!(&body[..], r#"foo: ["a", "b c", "d e"] bar: None"#);
    }

    #[tokio::test]
    async fn invalid_bar_type() {
        let response = request("/?foo=abc&bar=xyz").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await;
        let re = Regex::new(r#".*invalid value \\"xyz\\" for query parameter bar.*"#).unwrap();
        assert!(re.is_match(&body[..]), "body: {body}")
    }

    #[tokio::test]
    async fn missing_foo() {
        let response = request("/").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await;
        let re = Regex::new(r".*request parameters are not valid.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}");
        let re = Regex::new(r".*foo: Validation error: length.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}");
    }

    #[tokio::test]
    async fn too_many_foo() {
        let response = request("/?foo=a&foo=b&foo=c&foo=d").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await;
        let re = Regex::new(r".*foo: Validation error: length.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}");
    }
}
