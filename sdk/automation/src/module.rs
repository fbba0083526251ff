use azure_core::error::{Error, ErrorKind, ResultExt};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

/// Some Ansible versions wrap the parameters in this key.
const WRAPPED_ARGS_KEY: &str = "ANSIBLE_MODULE_ARGS";
/// Prefix of the internal keys (`_ansible_check_mode`, `_ansible_verbosity`, ...).
const INTERNAL_ARGS_PREFIX: &str = "_ansible_";

/// The task parameters handed to a binary module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleArgs {
    params: Map<String, Value>,
}

impl ModuleArgs {
    /// Loads the parameters from the args file named by the first command
    /// line argument (the program name must already be skipped).
    pub fn from_argv<I>(args: I) -> azure_core::Result<Self>
    where
        I: IntoIterator<Item = OsString>,
    {
        let path = args.into_iter().next().ok_or_else(|| {
            Error::message(
                ErrorKind::Other,
                "no module arguments file given; binary modules expect its path as the first argument",
            )
        })?;
        Self::from_file(path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> azure_core::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).with_context(ErrorKind::Io, || {
            format!("failed to read module arguments from {}", path.display())
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> azure_core::Result<Self> {
        let document: Value = serde_json::from_str(json)
            .context(ErrorKind::DataConversion, "module arguments are not valid JSON")?;
        Self::from_value(document)
    }

    pub fn from_value(document: Value) -> azure_core::Result<Self> {
        let mut params = match document {
            Value::Object(params) => params,
            other => {
                return Err(Error::with_message(ErrorKind::DataConversion, || {
                    format!("module arguments must be a JSON object, found: {other}")
                }))
            }
        };

        let params = match params.remove(WRAPPED_ARGS_KEY) {
            Some(Value::Object(wrapped)) => wrapped,
            Some(other) => {
                return Err(Error::with_message(ErrorKind::DataConversion, || {
                    format!("{WRAPPED_ARGS_KEY} must be a JSON object, found: {other}")
                }))
            }
            None => params,
        };

        Ok(Self {
            params: params
                .into_iter()
                .filter(|(name, _)| !name.starts_with(INTERNAL_ARGS_PREFIX))
                .collect(),
        })
    }

    /// A parameter value; `null` counts as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name).filter(|value| !value.is_null())
    }

    /// Fails with Ansible's `missing required arguments: ...` message when any
    /// of `names` is absent.
    pub fn require(&self, names: &[&str]) -> azure_core::Result<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| self.get(name).is_none())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::with_message(ErrorKind::Other, || {
                format!("missing required arguments: {}", missing.join(", "))
            }))
        }
    }

    pub fn parse<T>(&self) -> azure_core::Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(Value::Object(self.params.clone())).map_err(|error| {
            let message = format!("invalid module arguments: {error}");
            Error::full(ErrorKind::DataConversion, error, message)
        })
    }
}

/// The JSON object a module reports back (`exit_json` / `fail_json`).
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleResult {
    body: Map<String, Value>,
    failed: bool,
}

impl ModuleResult {
    /// A successful result. A non-object value is reported under `result`.
    pub fn exit(fields: Value) -> Self {
        let body = match fields {
            Value::Object(body) => body,
            other => {
                let mut body = Map::new();
                body.insert("result".to_owned(), other);
                body
            }
        };
        Self {
            body,
            failed: false,
        }
    }

    pub fn fail(msg: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("failed".to_owned(), Value::Bool(true));
        body.insert("msg".to_owned(), Value::String(msg.into()));
        Self { body, failed: true }
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    pub fn emit<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        serde_json::to_writer(&mut *writer, &self.body)?;
        writeln!(writer)?;
        writer.flush()
    }
}

impl From<azure_core::Result<Value>> for ModuleResult {
    fn from(outcome: azure_core::Result<Value>) -> Self {
        match outcome {
            Ok(fields) => ModuleResult::exit(fields),
            Err(error) => ModuleResult::fail(error.to_string()),
        }
    }
}

/// Runs a module body against the args file named on the command line and
/// prints its result on stdout.
pub async fn run<F, Fut>(body: F) -> ExitCode
where
    F: FnOnce(ModuleArgs) -> Fut,
    Fut: Future<Output = azure_core::Result<Value>>,
{
    let outcome = match ModuleArgs::from_argv(std::env::args_os().skip(1)) {
        Ok(args) => body(args).await,
        Err(error) => Err(error),
    };

    if let Err(error) = &outcome {
        debug!("module failed: {error:?}");
    }

    let result = ModuleResult::from(outcome);
    match result.emit(&mut std::io::stdout().lock()) {
        Ok(()) => result.exit_code(),
        Err(error) => {
            error!("failed to write module result: {error}");
            ExitCode::FAILURE
        }
    }
}
