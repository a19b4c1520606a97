//! Request routing and the per-invocation worker hand-off.

use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use tokio::sync::oneshot;
use tracing::{error, warn};

use crate::invocation::{InvocationResponse, InvocationRuntime};

use super::LISTENER_TARGET;

/// Path fragment that marks an invocation request.
pub(crate) const INVOKE_MARKER: &str = "invoke";

const WORKER_NAME: &str = "invoker-worker";
const ENCODE_FAILURE_BODY: &[u8] =
    br#"{"Result":"","Success":false,"Error":"failed to encode invocation response","Output":""}"#;

/// Returns `true` for POST requests whose path contains [`INVOKE_MARKER`].
pub(crate) fn is_invocation(method: &Method, path: &str) -> bool {
    method.as_str().eq_ignore_ascii_case(Method::POST.as_str()) && path.contains(INVOKE_MARKER)
}

/// Serves one HTTP request.
///
/// A body that cannot be read is answered with a failed invocation naming the
/// read error; nothing is dispatched.
pub(crate) async fn route<B>(
    request: Request<B>,
    runtime: Arc<InvocationRuntime>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Display,
{
    if !is_invocation(request.method(), request.uri().path()) {
        return Ok(not_found());
    }

    let response = match request.into_body().collect().await {
        Ok(collected) => invoke_on_worker(runtime, collected.to_bytes()).await,
        Err(error) => {
            warn!(
                target: LISTENER_TARGET,
                error = %error,
                "failed to read invocation body"
            );
            InvocationResponse::failure(
                format!("failed to read invocation body: {error}"),
                String::new(),
            )
        }
    };
    Ok(json_response(&response))
}

/// Runs the invocation on a dedicated thread so user code never blocks the
/// async executor.
async fn invoke_on_worker(runtime: Arc<InvocationRuntime>, body: Bytes) -> InvocationResponse {
    let (sender, receiver) = oneshot::channel();
    let spawned = thread::Builder::new()
        .name(WORKER_NAME.to_owned())
        .spawn(move || {
            let response = runtime.handle(&body);
            let _ = sender.send(response);
        });
    if let Err(spawn_error) = spawned {
        error!(
            target: LISTENER_TARGET,
            error = %spawn_error,
            "failed to spawn invocation worker"
        );
        return InvocationResponse::failure(
            format!("failed to start invocation worker: {spawn_error}"),
            String::new(),
        );
    }

    match receiver.await {
        Ok(response) => response,
        Err(_) => InvocationResponse::failure(
            String::from("invocation worker exited without a response"),
            String::new(),
        ),
    }
}

fn not_found() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

fn json_response(body: &InvocationResponse) -> Response<Full<Bytes>> {
    let bytes = match body.encode() {
        Ok(bytes) => Bytes::from(bytes),
        Err(encode_error) => {
            error!(
                target: LISTENER_TARGET,
                error = %encode_error,
                "failed to encode invocation response"
            );
            Bytes::from_static(ENCODE_FAILURE_BODY)
        }
    };
    let mut response = Response::new(Full::new(bytes));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::{fixture_runtime, request_body, unique_variable};
    use hyper::body::Frame;
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Body whose stream fails before yielding any data.
    struct ResetBody;

    impl Body for ResetBody {
        type Data = Bytes;
        type Error = io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            Poll::Ready(Some(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "peer reset the stream",
            ))))
        }
    }

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("response body is JSON")
    }

    #[rstest]
    #[case(Method::POST, "/invoke", true)]
    #[case(Method::POST, "/functions/hello/invoke", true)]
    #[case(Method::POST, "/reinvoked", true)]
    #[case(Method::GET, "/invoke", false)]
    #[case(Method::PUT, "/invoke", false)]
    #[case(Method::POST, "/healthz", false)]
    #[case(Method::POST, "/Invoke", false)]
    fn recognises_invocations(#[case] method: Method, #[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_invocation(&method, path), expected);
    }

    #[test]
    fn not_found_has_empty_body() {
        let response = not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn json_responses_are_tagged() {
        let response = json_response(&InvocationResponse::success(
            String::from("null"),
            String::new(),
        ));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
    }

    #[tokio::test]
    async fn unreadable_bodies_report_the_read_error() {
        let (runtime, reporter) = fixture_runtime(&unique_variable("reset_body"));
        let request = Request::post("/invoke")
            .body(ResetBody)
            .expect("build request");

        let response = route(request, Arc::new(runtime))
            .await
            .expect("routing is infallible");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["Success"], json!(false));
        assert_eq!(body["Result"], json!(""));
        let error = body["Error"].as_str().expect("error text");
        assert!(
            error.starts_with("failed to read invocation body: peer reset the stream"),
            "error was {error}"
        );
        assert_eq!(reporter.loaders_published(), 0);
        assert_eq!(reporter.loaders_failed(), 0);
    }

    #[tokio::test]
    async fn readable_bodies_are_dispatched() {
        let (runtime, _) = fixture_runtime(&unique_variable("full_body"));
        let dir = tempfile::tempdir().expect("temp module dir");
        let payload = request_body("invoker.Echo", dir.path(), json!([1, 2]), false);
        let request = Request::post("/fn/invoke")
            .body(Full::new(Bytes::from(payload)))
            .expect("build request");

        let response = route(request, Arc::new(runtime))
            .await
            .expect("routing is infallible");

        let body = body_json(response).await;
        assert_eq!(body["Success"], json!(true), "body was {body}");
        assert_eq!(body["Result"], json!("[1,2]"));
    }
}
