//! Cross-crate tests: requests go in on the request topic, responses are read
//! back from the response topic.

#[cfg(test)]
mod harness;

mod delivery_semantics;
mod e2e_bridge;
