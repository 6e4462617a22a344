//! `in` entry point: a deliberate no-op.
//!
//! The resource has nothing to fetch — versions are remote timestamps, not
//! artifacts — so `in` acknowledges with an empty version and metadata and
//! performs no remote calls.

use serde_json::json;

fn main() {
    let response = json!({
        "version": {},
        "metadata": [],
    });
    println!("{response}");
}
