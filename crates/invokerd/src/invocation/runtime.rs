//! Request-to-response invocation boundary.

use std::error::Error;
use std::io::Write;

use tracing::{info, warn};

use crate::capture;

use super::{
    DISPATCH_TARGET, Dispatcher, ExecutionContext, InvocationRequest, InvocationResponse,
    InvokeError,
};

/// Turns request bodies into response bodies.
///
/// Never fails: every error is reported inside the response.
#[derive(Debug)]
pub struct InvocationRuntime {
    dispatcher: Dispatcher,
    context_variable: String,
}

impl InvocationRuntime {
    /// Creates a runtime reading the execution context from
    /// `context_variable`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, context_variable: impl Into<String>) -> Self {
        Self {
            dispatcher,
            context_variable: context_variable.into(),
        }
    }

    /// Dispatcher used for invocations.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serves one request body.
    pub fn handle(&self, body: &[u8]) -> InvocationResponse {
        let request = match InvocationRequest::decode(body) {
            Ok(request) => request,
            Err(error) => {
                let error = InvokeError::from(error);
                report_failure(None, &error);
                return InvocationResponse::failure(error.to_string(), String::new());
            }
        };

        let (outcome, output) = if request.return_output {
            let (outcome, captured) = capture::capture(|| self.invoke(&request));
            (outcome, captured.render())
        } else {
            (self.invoke(&request), String::new())
        };

        match outcome {
            Ok(result) => InvocationResponse::success(result, output),
            Err(error) => InvocationResponse::failure(error.to_string(), output),
        }
    }

    fn invoke(&self, request: &InvocationRequest) -> Result<String, InvokeError> {
        let outcome = ExecutionContext::from_env(&self.context_variable)
            .map_err(InvokeError::from)
            .and_then(|context| self.dispatcher.dispatch(request, context));
        match &outcome {
            Ok(_) => info!(
                target: DISPATCH_TARGET,
                handler = %request.handler,
                "invocation succeeded"
            ),
            Err(error) => report_failure(Some(request), error),
        }
        outcome
    }
}

/// Logs a failure and writes its error chain to the invocation's stderr sink.
fn report_failure(request: Option<&InvocationRequest>, error: &InvokeError) {
    warn!(
        target: DISPATCH_TARGET,
        handler = request.map(|request| request.handler.as_str()),
        kind = %error.kind(),
        error = %error,
        "invocation failed"
    );

    let mut sink = capture::stderr();
    let _ = writeln!(sink, "{error}");
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = writeln!(sink, "caused by: {cause}");
        source = cause.source();
    }
}
