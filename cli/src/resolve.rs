//! # Resolve Command
//!
//! Shows which operation a request path and method resolve to.

use cdd_validator::{Method, OperationMatch};

use crate::error::{CliError, CliResult};
use crate::validate::ContractArgs;

/// Arguments for the resolve command.
#[derive(clap::Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Contract options.
    #[clap(flatten)]
    pub contract: ContractArgs,

    /// HTTP method, any case.
    #[clap(long, short, default_value = "GET")]
    pub method: String,

    /// Request path, optionally with a query string.
    pub path: String,
}

/// Resolves the path. Returns the rendered outcome and whether an operation was found.
pub fn execute(args: &ResolveArgs) -> CliResult<(String, bool)> {
    let method: Method = args
        .method
        .to_ascii_uppercase()
        .parse()
        .map_err(|e| CliError::General(format!("{}", e)))?;
    let validator = args.contract.builder()?.build()?;
    let resolution = validator.resolve(&args.path, method);
    let found = resolution.operation().is_some();
    Ok((describe(&resolution, &args.path, method), found))
}

fn describe(resolution: &OperationMatch, path: &str, method: Method) -> String {
    match resolution {
        OperationMatch::Found(op) => {
            let mut out = format!("{} {}", op.method(), op.api_path());
            if let Some(id) = op.operation_id() {
                out.push_str(&format!(" ({})", id));
            }
            for (name, value) in op.path_params() {
                out.push_str(&format!("\n  {} = {}", name, value));
            }
            out
        }
        OperationMatch::PathNotFound => {
            format!("No API path found that matches request '{}'.", path)
        }
        OperationMatch::MethodNotAllowed { api_path, allowed } => {
            let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
            format!(
                "{} operation not allowed on path '{}'. Allowed operations: {}",
                method,
                api_path,
                allowed.join(", ")
            )
        }
    }
}
