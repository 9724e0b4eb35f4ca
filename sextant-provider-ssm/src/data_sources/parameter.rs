//! ssm_parameter data source

use sextant_core::provider::ProviderResult;
use sextant_core::resource::{Resource, State, Value};

use super::{not_found, with_decryption};
use crate::provider::{SsmProvider, api_error, is_service_error, required_str};
use crate::resources::parameter_attributes;

impl SsmProvider {
    pub(crate) async fn query_parameter(&self, query: &Resource) -> ProviderResult<State> {
        let id = &query.id;
        let name = required_str(query, "name")?;
        let decrypt = with_decryption(query);

        let output = match self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(decrypt)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if is_service_error(&e, |e| e.is_parameter_not_found()) => {
                return Err(not_found(query, &format!("Parameter {}", name)));
            }
            Err(e) => return Err(api_error(id, "GetParameter", e)),
        };
        let Some(parameter) = output.parameter() else {
            return Err(not_found(query, &format!("Parameter {}", name)));
        };

        let mut attributes = parameter_attributes(parameter, None, false);
        // Only plain values are exposed unmasked
        if attributes.get("type").and_then(Value::as_str) != Some("SecureString")
            && let Some(value) = attributes.get("value").cloned()
        {
            attributes.insert("insecure_value".to_string(), value);
        }
        attributes.insert("with_decryption".to_string(), Value::Bool(decrypt));

        Ok(State::existing(id.clone(), attributes).with_identifier(name))
    }
}
