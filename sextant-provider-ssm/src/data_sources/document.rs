//! ssm_document data source

use std::collections::HashMap;

use aws_sdk_ssm::types::{DocumentFormat, DocumentType};
use sextant_core::provider::ProviderResult;
use sextant_core::resource::{Resource, State, Value};

use super::not_found;
use crate::provider::{SsmProvider, api_error, is_service_error, required_str};

impl SsmProvider {
    pub(crate) async fn query_document(&self, query: &Resource) -> ProviderResult<State> {
        let id = &query.id;
        let name = required_str(query, "name")?;
        let format = query.get_str("document_format").unwrap_or("JSON");

        let output = match self
            .client
            .get_document()
            .name(name)
            .document_format(DocumentFormat::from(format))
            .set_document_version(query.get_str("document_version").map(String::from))
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if is_service_error(&e, |e| e.is_invalid_document()) => {
                return Err(not_found(query, &format!("Document {}", name)));
            }
            Err(e) => return Err(api_error(id, "GetDocument", e)),
        };

        let mut attributes = HashMap::from([
            ("name".to_string(), Value::String(name.to_string())),
            ("arn".to_string(), Value::String(self.arns.document(name))),
            (
                "document_format".to_string(),
                Value::String(format.to_string()),
            ),
        ]);
        if let Some(content) = output.content() {
            attributes.insert("content".to_string(), Value::String(content.to_string()));
        }
        if let Some(kind) = output.document_type() {
            attributes.insert(
                "document_type".to_string(),
                Value::String(DocumentType::as_str(kind).to_string()),
            );
        }
        if let Some(version) = output.document_version() {
            attributes.insert(
                "document_version".to_string(),
                Value::String(version.to_string()),
            );
        }

        Ok(State::existing(id.clone(), attributes).with_identifier(name))
    }
}
