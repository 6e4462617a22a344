//! Version computation: deployment fingerprints and check-flow comparison.
//!
//! Two independent algorithms live here. The fingerprint labels a completed
//! deployment with a content-derived identity: SHA-1 over a canonical
//! concatenation of template, parameters and tags, encoded as a URL-safe
//! base64 token. The check comparison turns a previously recorded version
//! marker plus the remote stack's last-modification timestamp into the 0-,
//! 1- or 2-element version list the check flow emits.

use crate::resolve::RemoteStackStatus;
use crate::types::{Parameter, Tag};
use base64::{engine::general_purpose::URL_SAFE, Engine};
use chrono::{DateTime, Utc};
use sha1::{Digest, Sha1};

/// Marker emitted for a stack that exists but has never been updated.
pub const NIL_VERSION: &str = "nil";

/// The one canonical text form of a remote timestamp. Version markers are
/// compared and persisted in exactly this form; any other rendering would
/// produce false "changed" results.
pub fn canonical_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_string()
}

/// Deterministic content fingerprint of a deployment.
///
/// Equal inputs always produce the same token; a change to the template
/// text, any parameter, or any tag produces a different one. Fields are
/// length-delimited before hashing so adjacent values cannot alias.
pub fn fingerprint(template_body: &str, parameters: &[Parameter], tags: &[Tag]) -> String {
    let mut hasher = Sha1::new();
    hash_field(&mut hasher, template_body);
    for parameter in parameters {
        hash_field(&mut hasher, &parameter.key);
        hash_field(&mut hasher, &parameter.value);
        hasher.update([u8::from(parameter.use_previous_value)]);
    }
    for tag in tags {
        hash_field(&mut hasher, &tag.key);
        hash_field(&mut hasher, &tag.value);
    }
    URL_SAFE.encode(hasher.finalize())
}

fn hash_field(hasher: &mut Sha1, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

/// The check flow's version list.
///
/// - stack absent (describe failed)         → `[]`
/// - stack present, never updated           → `["nil"]`
/// - remote timestamp equals `previous`     → `[previous]`
/// - remote timestamp differs               → `[previous, current]`
pub fn check_versions(previous: &str, remote: &RemoteStackStatus) -> Vec<String> {
    if !remote.exists {
        return Vec::new();
    }
    let Some(timestamp) = &remote.last_updated_time else {
        return vec![NIL_VERSION.to_string()];
    };
    let current = canonical_timestamp(timestamp);
    if previous == current {
        vec![current]
    } else {
        vec![previous.to_string(), current]
    }
}
