//! ssm_parameters_by_path data source

use std::collections::HashMap;

use aws_sdk_ssm::types::{Parameter, ParameterType};
use sextant_core::provider::ProviderResult;
use sextant_core::resource::{Resource, State, Value};

use super::with_decryption;
use crate::provider::{SsmProvider, api_error, required_str};

impl SsmProvider {
    pub(crate) async fn query_parameters_by_path(
        &self,
        query: &Resource,
    ) -> ProviderResult<State> {
        let id = &query.id;
        let path = required_str(query, "path")?;
        let decrypt = with_decryption(query);
        let recursive = query.get_bool("recursive").unwrap_or(false);

        let mut parameters: Vec<Parameter> = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .get_parameters_by_path()
                .path(path)
                .recursive(recursive)
                .with_decryption(decrypt)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error(id, "GetParametersByPath", e))?;

            parameters.extend(output.parameters().iter().cloned());

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        log::debug!("{}: {} parameters under {}", id, parameters.len(), path);

        let mut attributes = parameter_lists(&parameters);
        attributes.insert("path".to_string(), Value::String(path.to_string()));
        attributes.insert("with_decryption".to_string(), Value::Bool(decrypt));
        attributes.insert("recursive".to_string(), Value::Bool(recursive));

        Ok(State::existing(id.clone(), attributes).with_identifier(path))
    }
}

/// Parallel `arns`, `names`, `types` and `values` lists
fn parameter_lists(parameters: &[Parameter]) -> HashMap<String, Value> {
    let column = |f: fn(&Parameter) -> Option<&str>| {
        Value::string_list(parameters.iter().map(|p| f(p).unwrap_or_default()))
    };

    HashMap::from([
        ("arns".to_string(), column(Parameter::arn)),
        ("names".to_string(), column(Parameter::name)),
        (
            "types".to_string(),
            column(|p| p.r#type().map(ParameterType::as_str)),
        ),
        ("values".to_string(), column(Parameter::value)),
    ])
}
