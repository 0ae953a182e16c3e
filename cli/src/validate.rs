#![deny(missing_docs)]

//! # Validate Command
//!
//! Validates one interaction fixture against a contract and renders the report.

use std::fs;
use std::path::{Path, PathBuf};

use cdd_validator::whitelist::{message_has_key, Whitelist};
use cdd_validator::{
    Contract, InteractionValidator, InteractionValidatorBuilder, LevelResolver, ValidationReport,
};
use tracing::info;

use crate::error::{CliError, CliResult};
use crate::fixture::InteractionFixture;

/// Options shared by every command that loads a contract.
#[derive(clap::Args, Debug, Clone)]
pub struct ContractArgs {
    /// Path to the OpenAPI 3.x contract (YAML or JSON).
    #[clap(long, env = "CDD_CONTRACT", default_value = "docs/openapi.yaml")]
    pub contract: PathBuf,

    /// Base path to strip instead of the one derived from `servers`.
    #[clap(long)]
    pub base_path: Option<String>,

    /// Treat a trailing slash as significant.
    #[clap(long)]
    pub strict_paths: bool,
}

impl ContractArgs {
    /// Loads the contract and starts a validator configuration from it.
    pub fn builder(&self) -> CliResult<InteractionValidatorBuilder> {
        let contract = load_contract(&self.contract)?;
        let mut builder = InteractionValidator::builder(contract)
            .with_strict_path_matching(self.strict_paths);
        if let Some(base_path) = &self.base_path {
            builder = builder.with_base_path(base_path.clone());
        }
        Ok(builder)
    }
}

/// Report rendering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per finding.
    Text,
    /// The serialized report.
    Json,
}

/// Arguments for the validate command.
#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Contract options.
    #[clap(flatten)]
    pub contract: ContractArgs,

    /// Interaction fixture (YAML or JSON).
    #[clap(long, short)]
    pub interaction: PathBuf,

    /// Level configuration (YAML with `defaultLevel` and `levels`).
    #[clap(long)]
    pub levels: Option<PathBuf>,

    /// Message key to ignore. Repeatable.
    #[clap(long = "ignore", value_name = "KEY")]
    pub ignore: Vec<String>,

    /// Reject object properties the schemas do not declare.
    #[clap(long)]
    pub additional_properties: bool,

    /// Output format.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Reads a contract file. JSON documents are parsed as YAML.
pub fn load_contract(path: &Path) -> CliResult<Contract> {
    if !path.exists() {
        return Err(CliError::General(format!(
            "Contract file not found: {:?}",
            path
        )));
    }
    let content = fs::read_to_string(path)?;
    let contract = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Contract::from_json(&content)?,
        _ => Contract::from_yaml(&content)?,
    };
    info!(path = %path.display(), version = contract.version(), "Loaded contract");
    Ok(contract)
}

/// Validates the fixture and returns the classified report.
pub fn execute(args: &ValidateArgs) -> CliResult<ValidationReport> {
    let mut builder = args
        .contract
        .builder()?
        .with_additional_properties_enforced(args.additional_properties);

    if let Some(levels) = &args.levels {
        let content = fs::read_to_string(levels)?;
        builder = builder.with_level_resolver(LevelResolver::from_yaml(&content)?);
    }
    if !args.ignore.is_empty() {
        let whitelist = args.ignore.iter().fold(Whitelist::new(), |whitelist, key| {
            whitelist.with_rule(format!("--ignore {}", key), message_has_key(key.clone()))
        });
        builder = builder.with_whitelist(whitelist);
    }
    let validator = builder.build()?;

    let fixture = InteractionFixture::load(&args.interaction)?;
    let request = fixture.to_request()?;
    let report = match fixture.to_response()? {
        Some(response) => validator.validate(&request, &response),
        None => validator.validate_request(&request),
    };
    info!(
        messages = report.messages().len(),
        has_errors = report.has_errors(),
        "Validated interaction"
    );
    Ok(report)
}

/// Renders a report for the terminal or for tooling.
pub fn render(report: &ValidationReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(report.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| CliError::General(format!("Failed to serialize report: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdd_validator::Level;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const CONTRACT: &str = r#"
openapi: 3.1.0
info: {title: T, version: 1.0}
servers:
  - url: /api
paths:
  /pets/{id}:
    get:
      operationId: getPet
      parameters:
        - name: id
          in: path
          required: true
          schema: { type: integer }
      responses:
        '200':
          description: OK
          content:
            application/json:
              schema:
                type: object
                required: [name]
                properties:
                  name: { type: string }
"#;

    fn args(dir: &Path, fixture: &str) -> ValidateArgs {
        let contract = dir.join("openapi.yaml");
        let interaction = dir.join("interaction.yaml");
        fs::write(&contract, CONTRACT).unwrap();
        fs::write(&interaction, fixture).unwrap();
        ValidateArgs {
            contract: ContractArgs {
                contract,
                base_path: None,
                strict_paths: false,
            },
            interaction,
            levels: None,
            ignore: Vec::new(),
            additional_properties: false,
            format: OutputFormat::Text,
        }
    }

    const GOOD: &str = r#"
request: {method: GET, path: /api/pets/1}
response:
  status: 200
  headers: {Content-Type: application/json}
  body: {name: Rex, extra: true}
"#;

    const BAD: &str = r#"
request: {method: GET, path: /api/pets/rex}
response:
  status: 200
  headers: {Content-Type: application/json}
  body: {}
"#;

    #[test]
    fn test_valid_interaction() {
        let dir = tempdir().unwrap();
        let report = execute(&args(dir.path(), GOOD)).unwrap();
        assert!(report.is_empty());
        assert_eq!(
            render(&report, OutputFormat::Text).unwrap(),
            "No validation errors."
        );
    }

    #[test]
    fn test_invalid_interaction() {
        let dir = tempdir().unwrap();
        let report = execute(&args(dir.path(), BAD)).unwrap();
        let keys: Vec<&str> = report.messages().iter().map(|m| m.key()).collect();
        assert_eq!(
            keys,
            vec![
                "validation.request.parameter.schema.type",
                "validation.response.body.schema.required"
            ]
        );
        assert!(report.has_errors());

        let rendered = render(&report, OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(json["messages"][0]["context"]["parameter"], "id");
    }

    #[test]
    fn test_additional_properties_flag() {
        let dir = tempdir().unwrap();
        let mut args = args(dir.path(), GOOD);
        args.additional_properties = true;
        let report = execute(&args).unwrap();
        assert_eq!(
            report.messages()[0].key(),
            "validation.response.body.schema.additionalProperties"
        );
    }

    #[test]
    fn test_levels_and_ignore() {
        let dir = tempdir().unwrap();
        let levels = dir.path().join("levels.yaml");
        fs::write(&levels, "levels:\n  validation.response: WARN\n").unwrap();

        let mut args = args(dir.path(), BAD);
        args.levels = Some(levels);
        args.ignore = vec!["validation.request.parameter.schema.type".to_string()];

        let report = execute(&args).unwrap();
        let levels: Vec<Level> = report.messages().iter().map(|m| m.level()).collect();
        assert_eq!(levels, vec![Level::Ignore, Level::Warn]);
        assert!(!report.has_errors());
        assert_eq!(
            report.messages()[0]
                .context()
                .unwrap()
                .applied_whitelist_rule(),
            Some("--ignore validation.request.parameter.schema.type")
        );
    }

    #[test]
    fn test_missing_contract() {
        let dir = tempdir().unwrap();
        let mut args = args(dir.path(), GOOD);
        args.contract.contract = dir.path().join("missing.yaml");
        assert!(matches!(execute(&args), Err(CliError::General(_))));
    }

    #[test]
    fn test_swagger_contract_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("swagger.json");
        fs::write(&path, r#"{"swagger": "2.0", "paths": {}}"#).unwrap();
        assert!(matches!(load_contract(&path), Err(CliError::Core(_))));
    }
}
