//! Behavioural tests for handler resolution, dispatch and output capture.

use std::cell::RefCell;
use std::path::PathBuf;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use tempfile::TempDir;

use crate::invocation::{InvocationResponse, InvocationRuntime};

use super::support::{fixture_runtime, request_body, unique_variable};

type StepResult = Result<(), String>;

pub struct InvocationWorld {
    runtime: InvocationRuntime,
    temp_dir: TempDir,
    module_dir: PathBuf,
    return_output: bool,
    response: Option<InvocationResponse>,
}

impl InvocationWorld {
    fn new() -> Self {
        let (runtime, _) = fixture_runtime(&unique_variable("behaviour"));
        let temp_dir = TempDir::new().expect("temp module dir");
        let module_dir = temp_dir.path().to_path_buf();
        Self {
            runtime,
            temp_dir,
            module_dir,
            return_output: false,
            response: None,
        }
    }

    fn response(&self) -> Result<&InvocationResponse, String> {
        self.response
            .as_ref()
            .ok_or_else(|| String::from("no invocation has run"))
    }
}

#[fixture]
fn world() -> RefCell<InvocationWorld> {
    RefCell::new(InvocationWorld::new())
}

#[given("a module directory")]
fn given_module_directory(world: &RefCell<InvocationWorld>) {
    let mut world = world.borrow_mut();
    world.module_dir = world.temp_dir.path().to_path_buf();
}

#[given("a module directory that does not exist")]
fn given_missing_module_directory(world: &RefCell<InvocationWorld>) {
    let mut world = world.borrow_mut();
    world.module_dir = world.temp_dir.path().join("missing");
}

#[given("output capture is requested")]
fn given_capture_requested(world: &RefCell<InvocationWorld>) {
    world.borrow_mut().return_output = true;
}

#[when("the handler \"{handler}\" is invoked with params {params}")]
fn when_handler_invoked(
    world: &RefCell<InvocationWorld>,
    handler: String,
    params: String,
) -> StepResult {
    let params: Value =
        serde_json::from_str(&params).map_err(|error| format!("invalid params: {error}"))?;
    let mut world = world.borrow_mut();
    let body = request_body(&handler, &world.module_dir, params, world.return_output);
    world.response = Some(world.runtime.handle(&body));
    Ok(())
}

#[then("the invocation succeeds with result {result}")]
fn then_invocation_succeeds(world: &RefCell<InvocationWorld>, result: String) -> StepResult {
    let world = world.borrow();
    let response = world.response()?;
    if !response.success {
        return Err(format!("invocation failed: {}", response.error));
    }
    let expected: Value =
        serde_json::from_str(&result).map_err(|error| format!("invalid expectation: {error}"))?;
    let actual: Value = serde_json::from_str(&response.result)
        .map_err(|error| format!("result is not JSON text: {error}"))?;
    assert_eq!(actual, expected);
    assert!(response.error.is_empty());
    Ok(())
}

#[then("the invocation fails mentioning \"{text}\"")]
fn then_invocation_fails(world: &RefCell<InvocationWorld>, text: String) -> StepResult {
    let world = world.borrow();
    let response = world.response()?;
    assert!(!response.success, "invocation succeeded unexpectedly");
    assert_eq!(response.result, "");
    assert!(
        response.error.contains(&text),
        "error {:?} does not mention {text:?}",
        response.error
    );
    Ok(())
}

#[then("the output is empty")]
fn then_output_empty(world: &RefCell<InvocationWorld>) -> StepResult {
    let world = world.borrow();
    assert_eq!(world.response()?.output, "");
    Ok(())
}

#[then("the captured stdout is \"{stdout}\" and stderr is \"{stderr}\"")]
fn then_captured_output(
    world: &RefCell<InvocationWorld>,
    stdout: String,
    stderr: String,
) -> StepResult {
    let world = world.borrow();
    assert_eq!(world.response()?.output, format!("{stdout}\n{stderr}"));
    Ok(())
}

#[scenario(
    path = "tests/features/invocation.feature",
    name = "Echo returns its parameters"
)]
fn echo_returns_params(world: RefCell<InvocationWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/invocation.feature",
    name = "A module name alone calls the handler method"
)]
fn module_name_calls_handler(world: RefCell<InvocationWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/invocation.feature",
    name = "An explicit method is called by name"
)]
fn explicit_method_called(world: RefCell<InvocationWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/invocation.feature",
    name = "A module without a zero-argument constructor fails"
)]
fn missing_constructor_fails(world: RefCell<InvocationWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/invocation.feature",
    name = "A three-parameter handler is an arity failure"
)]
fn three_parameter_handler_fails(world: RefCell<InvocationWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/invocation.feature",
    name = "Unknown modules are reported"
)]
fn unknown_module_reported(world: RefCell<InvocationWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/invocation.feature",
    name = "A missing module directory is reported"
)]
fn missing_module_directory_reported(world: RefCell<InvocationWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/invocation.feature",
    name = "Captured output joins stdout and stderr"
)]
fn captured_output_joined(world: RefCell<InvocationWorld>) {
    let _ = world;
}
