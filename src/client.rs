//! Real CloudFormation client implementation over rusoto.
//!
//! Built from an explicit [`Source`] — static credentials plus region —
//! so there is no process-wide AWS state. One [`StackBackend`] method per
//! remote operation, each a single call; retry lives with the caller.
//!
//! CloudFormation's query API reports throttling and validation failures
//! as untyped 400 responses, so error mapping digs the `<Code>` and
//! `<Message>` elements out of the raw body. That extraction is what makes
//! [`crate::error::CfnError::is_rate_limited`] and the no-op-update check
//! work against the real service.

use crate::backend::StackBackend;
use crate::dispatch::CHANGE_SET_DESCRIPTION;
use crate::error::CfnError;
use crate::types::{
    ChangeSetSummary, ChangeSetType, Source, StackDescription, StackEvent, StackSpec,
};
use chrono::{DateTime, Utc};
use rusoto_cloudformation::{
    CloudFormation, CloudFormationClient, CreateChangeSetInput, CreateStackInput,
    DeleteStackInput, DescribeStackEventsInput, DescribeStacksInput, ExecuteChangeSetInput,
    ListChangeSetsInput, UpdateStackInput,
};
use rusoto_core::credential::StaticProvider;
use rusoto_core::request::BufferedHttpResponse;
use rusoto_core::{HttpClient, Region, RusotoError};
use std::str::FromStr;

pub struct RusotoStackBackend {
    client: CloudFormationClient,
}

impl RusotoStackBackend {
    /// Build a client for the source's region using its static credentials.
    pub fn from_source(source: &Source) -> Result<Self, CfnError> {
        let region = Region::from_str(&source.region)
            .map_err(|err| CfnError::Input(format!("invalid region {:?}: {err}", source.region)))?;
        let credentials = StaticProvider::new_minimal(
            source.aws_access_key_id.clone(),
            source.aws_secret_access_key.clone(),
        );
        let dispatcher = HttpClient::new()
            .map_err(|err| CfnError::Transport(format!("could not build http client: {err}")))?;
        Ok(Self {
            client: CloudFormationClient::new_with(dispatcher, credentials, region),
        })
    }

    fn cfn_parameters(spec: &StackSpec) -> Option<Vec<rusoto_cloudformation::Parameter>> {
        if spec.parameters.is_empty() {
            return None;
        }
        Some(
            spec.parameters
                .iter()
                .map(|p| rusoto_cloudformation::Parameter {
                    parameter_key: Some(p.key.clone()),
                    parameter_value: Some(p.value.clone()),
                    use_previous_value: Some(p.use_previous_value),
                    ..Default::default()
                })
                .collect(),
        )
    }

    fn cfn_tags(spec: &StackSpec) -> Option<Vec<rusoto_cloudformation::Tag>> {
        if spec.tags.is_empty() {
            return None;
        }
        Some(
            spec.tags
                .iter()
                .map(|t| rusoto_cloudformation::Tag {
                    key: t.key.clone(),
                    value: t.value.clone(),
                })
                .collect(),
        )
    }

    fn cfn_capabilities(spec: &StackSpec) -> Option<Vec<String>> {
        if spec.capabilities.is_empty() {
            None
        } else {
            Some(spec.capabilities.clone())
        }
    }
}

impl StackBackend for RusotoStackBackend {
    async fn describe_stack(&self, stack_name: &str) -> Result<StackDescription, CfnError> {
        let output = self
            .client
            .describe_stacks(DescribeStacksInput {
                stack_name: Some(stack_name.to_string()),
                ..Default::default()
            })
            .await
            .map_err(map_rusoto_error)?;

        let stack = output
            .stacks
            .and_then(|mut stacks| (!stacks.is_empty()).then(|| stacks.remove(0)))
            .ok_or_else(|| {
                CfnError::Malformed(format!("describe returned no stacks for {stack_name}"))
            })?;

        let last_updated_time = stack
            .last_updated_time
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(StackDescription {
            stack_id: stack.stack_id,
            stack_status: stack.stack_status,
            last_updated_time,
        })
    }

    async fn create_stack(&self, spec: &StackSpec) -> Result<(), CfnError> {
        self.client
            .create_stack(CreateStackInput {
                stack_name: spec.stack_name.clone(),
                template_body: Some(spec.template_body.clone()),
                parameters: Self::cfn_parameters(spec),
                tags: Self::cfn_tags(spec),
                capabilities: Self::cfn_capabilities(spec),
                ..Default::default()
            })
            .await
            .map_err(map_rusoto_error)?;
        Ok(())
    }

    async fn update_stack(&self, spec: &StackSpec) -> Result<(), CfnError> {
        self.client
            .update_stack(UpdateStackInput {
                stack_name: spec.stack_name.clone(),
                template_body: Some(spec.template_body.clone()),
                parameters: Self::cfn_parameters(spec),
                tags: Self::cfn_tags(spec),
                capabilities: Self::cfn_capabilities(spec),
                ..Default::default()
            })
            .await
            .map_err(map_rusoto_error)?;
        Ok(())
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<(), CfnError> {
        self.client
            .delete_stack(DeleteStackInput {
                stack_name: stack_name.to_string(),
                ..Default::default()
            })
            .await
            .map_err(map_rusoto_error)?;
        Ok(())
    }

    async fn create_change_set(
        &self,
        spec: &StackSpec,
        change_set_name: &str,
        change_set_type: ChangeSetType,
    ) -> Result<(), CfnError> {
        self.client
            .create_change_set(CreateChangeSetInput {
                stack_name: spec.stack_name.clone(),
                change_set_name: change_set_name.to_string(),
                change_set_type: Some(change_set_type.as_str().to_string()),
                description: Some(CHANGE_SET_DESCRIPTION.to_string()),
                template_body: Some(spec.template_body.clone()),
                parameters: Self::cfn_parameters(spec),
                tags: Self::cfn_tags(spec),
                capabilities: Self::cfn_capabilities(spec),
                ..Default::default()
            })
            .await
            .map_err(map_rusoto_error)?;
        Ok(())
    }

    async fn list_change_sets(&self, stack_name: &str) -> Result<Vec<ChangeSetSummary>, CfnError> {
        let output = self
            .client
            .list_change_sets(ListChangeSetsInput {
                stack_name: stack_name.to_string(),
                ..Default::default()
            })
            .await
            .map_err(map_rusoto_error)?;

        Ok(output
            .summaries
            .unwrap_or_default()
            .into_iter()
            .map(|summary| ChangeSetSummary {
                name: summary.change_set_name.unwrap_or_default(),
                status: summary.status.unwrap_or_default(),
            })
            .collect())
    }

    async fn execute_change_set(
        &self,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<(), CfnError> {
        self.client
            .execute_change_set(ExecuteChangeSetInput {
                change_set_name: change_set_name.to_string(),
                stack_name: Some(stack_name.to_string()),
                ..Default::default()
            })
            .await
            .map_err(map_rusoto_error)?;
        Ok(())
    }

    async fn describe_stack_events(&self, stack_name: &str) -> Result<Vec<StackEvent>, CfnError> {
        let output = self
            .client
            .describe_stack_events(DescribeStackEventsInput {
                stack_name: Some(stack_name.to_string()),
                ..Default::default()
            })
            .await
            .map_err(map_rusoto_error)?;

        output
            .stack_events
            .unwrap_or_default()
            .into_iter()
            .map(|event| {
                Ok(StackEvent {
                    stack_id: event.stack_id,
                    resource_type: event.resource_type.unwrap_or_default(),
                    resource_status: event.resource_status.unwrap_or_default(),
                    timestamp: parse_timestamp(&event.timestamp)?,
                })
            })
            .collect()
    }
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, CfnError> {
    DateTime::parse_from_rfc3339(text)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| CfnError::Malformed(format!("bad timestamp {text:?}: {err}")))
}

fn map_rusoto_error<E: std::fmt::Display>(err: RusotoError<E>) -> CfnError {
    match err {
        RusotoError::Unknown(response) => map_unknown(response),
        RusotoError::Service(service_err) => CfnError::Api {
            code: "ServiceError".into(),
            message: service_err.to_string(),
        },
        RusotoError::HttpDispatch(dispatch_err) => CfnError::Transport(dispatch_err.to_string()),
        RusotoError::Credentials(credentials_err) => {
            CfnError::Transport(credentials_err.to_string())
        }
        RusotoError::Validation(message) => CfnError::Api {
            code: "ValidationError".into(),
            message,
        },
        RusotoError::ParseError(message) => CfnError::Malformed(message),
        RusotoError::Blocking => CfnError::Transport("failed to run blocking future".into()),
    }
}

fn map_unknown(response: BufferedHttpResponse) -> CfnError {
    let body = String::from_utf8_lossy(&response.body).into_owned();
    map_error_body(response.status.as_u16(), &body)
}

fn map_error_body(status: u16, body: &str) -> CfnError {
    let code = xml_element(body, "Code").unwrap_or_else(|| format!("Http{status}"));
    let message = xml_element(body, "Message").unwrap_or_else(|| body.to_string());
    CfnError::Api { code, message }
}

/// Pull the text of the first `<tag>...</tag>` out of an error body. The
/// query API's error envelope is flat; a real XML parser would be overkill.
fn xml_element(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const THROTTLING_BODY: &str = "<ErrorResponse xmlns=\"http://cloudformation.amazonaws.com/doc/2010-05-15/\">\
        <Error><Type>Sender</Type><Code>Throttling</Code>\
        <Message>Rate exceeded</Message></Error>\
        <RequestId>abc</RequestId></ErrorResponse>";

    #[test]
    fn test_xml_element_extraction() {
        assert_eq!(
            xml_element(THROTTLING_BODY, "Code").as_deref(),
            Some("Throttling")
        );
        assert_eq!(
            xml_element(THROTTLING_BODY, "Message").as_deref(),
            Some("Rate exceeded")
        );
        assert_eq!(xml_element(THROTTLING_BODY, "Missing"), None);
    }

    #[test]
    fn test_throttling_body_maps_to_rate_limit() {
        assert!(map_error_body(400, THROTTLING_BODY).is_rate_limited());
    }

    #[test]
    fn test_no_op_update_body_is_recognized() {
        let body = "<ErrorResponse><Error><Code>ValidationError</Code>\
            <Message>No updates are to be performed.</Message></Error></ErrorResponse>";
        assert!(map_error_body(400, body).is_no_op_update());
    }

    #[test]
    fn test_unparseable_body_falls_back_to_status() {
        let err = map_error_body(503, "Service Unavailable");
        assert_eq!(
            err,
            CfnError::Api {
                code: "Http503".into(),
                message: "Service Unavailable".into(),
            }
        );
    }

    #[test]
    fn test_timestamp_parsing() {
        let parsed = parse_timestamp("2021-06-01T12:00:00.000Z").expect("parse");
        assert_eq!(parsed.to_string(), "2021-06-01 12:00:00 UTC");
        assert!(parse_timestamp("yesterday").is_err());
    }
}
