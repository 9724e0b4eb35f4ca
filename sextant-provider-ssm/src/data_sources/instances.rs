//! ssm_instances data source

use std::collections::HashMap;

use aws_sdk_ssm::types::InstanceInformationStringFilter;
use sextant_core::provider::ProviderResult;
use sextant_core::resource::{Resource, State, Value};

use crate::provider::{SsmProvider, api_error, build_error};
use crate::resources::{block_str, blocks, string_items};

impl SsmProvider {
    pub(crate) async fn query_instances(&self, query: &Resource) -> ProviderResult<State> {
        let id = &query.id;

        let filters = blocks(query.attributes.get("filter"))
            .into_iter()
            .map(|block| {
                InstanceInformationStringFilter::builder()
                    .set_key(block_str(block, "name").map(String::from))
                    .set_values(string_items(block.get("values")))
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| build_error(id, e))?;

        let mut ids: Vec<String> = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_instance_information()
                .set_filters((!filters.is_empty()).then(|| filters.clone()))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error(id, "DescribeInstanceInformation", e))?;

            ids.extend(
                output
                    .instance_information_list()
                    .iter()
                    .filter_map(|i| i.instance_id().map(String::from)),
            );

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        let mut attributes = HashMap::from([("ids".to_string(), Value::string_list(ids))]);
        if let Some(filter) = query.attributes.get("filter") {
            attributes.insert("filter".to_string(), filter.clone());
        }

        Ok(State::existing(id.clone(), attributes).with_identifier(self.region()))
    }
}
