//! Parsers for the parameter and tag file payloads.
//!
//! File IO stays with the caller; these take raw bytes. A payload that
//! does not parse is fatal for the invocation — the binaries exit on it.

use crate::error::CfnError;
use crate::types::{Parameter, Tag};

/// Parse a parameters file:
/// `[{"ParameterKey": ..., "ParameterValue": ..., "UsePreviousValue": ...}]`.
pub fn parse_parameters(bytes: &[u8]) -> Result<Vec<Parameter>, CfnError> {
    serde_json::from_slice(bytes)
        .map_err(|err| CfnError::Input(format!("could not parse parameters file: {err}")))
}

/// Parse a tags file: `[{"TagKey": ..., "TagValue": ...}]`.
pub fn parse_tags(bytes: &[u8]) -> Result<Vec<Tag>, CfnError> {
    serde_json::from_slice(bytes)
        .map_err(|err| CfnError::Input(format!("could not parse tags file: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameters() {
        let payload = br#"[
            {"ParameterKey": "Env", "ParameterValue": "prod", "UsePreviousValue": false},
            {"ParameterKey": "Size", "ParameterValue": "t3.small"}
        ]"#;
        let parameters = parse_parameters(payload).expect("parse");
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[0].key, "Env");
        assert_eq!(parameters[0].value, "prod");
        // UsePreviousValue is optional and defaults off.
        assert!(!parameters[1].use_previous_value);
    }

    #[test]
    fn test_parse_tags() {
        let payload = br#"[{"TagKey": "team", "TagValue": "infra"}]"#;
        let tags = parse_tags(payload).expect("parse");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].key, "team");
        assert_eq!(tags[0].value, "infra");
    }

    #[test]
    fn test_empty_list() {
        assert!(parse_parameters(b"[]").expect("parse").is_empty());
        assert!(parse_tags(b"[]").expect("parse").is_empty());
    }

    #[test]
    fn test_garbage_is_an_input_error() {
        let err = parse_parameters(b"not json").expect_err("must fail");
        assert!(matches!(err, CfnError::Input(_)));
        let err = parse_tags(b"{\"TagKey\": \"x\"}").expect_err("object is not a list");
        assert!(matches!(err, CfnError::Input(_)));
    }
}
