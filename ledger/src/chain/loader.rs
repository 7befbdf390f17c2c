//! Reading and writing the persisted chain shape.
//!
//! ```text
//! [
//!   {"hash": "<hex>",
//!    "contents": {"block_number": 0,
//!                 "parent_hash": null,
//!                 "transaction_count": 1,
//!                 "transactions": [{"Tom": 10}]}},
//!   ...
//! ]
//! ```
//!
//! Loading only parses. Whether the parsed chain is any good is a question
//! for [`check_chain`]; [`load_and_check`] asks both.

use serde_json::Value;
use tracing::debug;

use crate::block::Block;
use crate::config::MAX_CHAIN_INPUT_BYTES;
use crate::error::{LedgerError, Result};
use crate::state::LedgerState;

use super::validate::check_chain;
use super::Chain;

/// Parse a JSON chain.
///
/// # Errors
///
/// - [`LedgerError::MalformedInput`] if the input is too large, is not
///   JSON, is not an array, or an element is not a block. Element errors
///   name the index.
/// - [`LedgerError::EmptyChain`] for an empty array.
pub fn load_chain(input: &str) -> Result<Chain> {
    load_chain_with_limit(input, MAX_CHAIN_INPUT_BYTES)
}

fn load_chain_with_limit(input: &str, limit: usize) -> Result<Chain> {
    if input.len() > limit {
        return Err(LedgerError::MalformedInput(format!(
            "input is {} bytes, limit is {}",
            input.len(),
            limit
        )));
    }

    let parsed: Value = serde_json::from_str(input)
        .map_err(|e| LedgerError::MalformedInput(format!("not valid JSON: {}", e)))?;

    let items = match parsed {
        Value::Array(items) => items,
        other => {
            return Err(LedgerError::MalformedInput(format!(
                "expected an array of blocks, found {}",
                json_kind(&other)
            )))
        }
    };

    let blocks = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Block>(item)
                .map_err(|e| LedgerError::MalformedInput(format!("block {}: {}", index, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(blocks = blocks.len(), "chain parsed");
    Chain::from_blocks(blocks)
}

/// Parse then validate; returns the chain and its final state.
pub fn load_and_check(input: &str) -> Result<(Chain, LedgerState)> {
    let chain = load_chain(input)?;
    let state = check_chain(&chain)?;
    Ok((chain, state))
}

/// Serialize `chain` to the persisted JSON shape.
pub fn export_chain(chain: &Chain) -> Result<String> {
    Ok(serde_json::to_string(chain)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::add_transaction;
    use crate::transaction::Transaction;

    fn sample_chain() -> (Chain, LedgerState) {
        let chain = Chain::new(Block::genesis(vec![Transaction::from([("Tom", 10)])]).unwrap());
        let state = check_chain(&chain).unwrap();
        let tx = Transaction::transfer("Tom", "Medium", 1).unwrap();
        let (state, chain) = add_transaction(&tx, &state, &chain).unwrap();
        (chain, state)
    }

    fn assert_malformed(input: &str) {
        match load_chain(input) {
            Err(LedgerError::MalformedInput(_)) => {}
            other => panic!("expected MalformedInput for {:?}, got {:?}", input, other),
        }
    }

    #[test]
    fn export_then_load_preserves_chain_and_state() {
        let (chain, state) = sample_chain();
        let json = export_chain(&chain).unwrap();
        let (loaded, loaded_state) = load_and_check(&json).unwrap();
        assert_eq!(loaded, chain);
        assert_eq!(loaded_state, state);
    }

    #[test]
    fn accepts_reference_layout() {
        let input = r#"[{"hash": "5d94f0b113a5465f1c5442e3fa71e2c3804837c44cfbe054d1cef03a9244dbfb",
                        "contents": {"block_number": 0, "parent_hash": null,
                                     "transaction_count": 1, "transactions": [{"Tom": 10}]}}]"#;
        let (chain, state) = load_and_check(input).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(state.balance("Tom"), 10);
    }

    #[test]
    fn rejects_non_json() {
        assert_malformed("this is not json");
        assert_malformed("[{");
    }

    #[test]
    fn rejects_non_arrays() {
        assert_malformed("{}");
        assert_malformed("42");
        assert_malformed("\"chain\"");
        assert_malformed("null");
    }

    #[test]
    fn rejects_wrongly_shaped_blocks() {
        assert_malformed("[1, 2, 3]");
        assert_malformed(r#"[{"hash": "abc", "contents": {}}]"#);
        assert_malformed(
            r#"[{"hash": "5d94f0b113a5465f1c5442e3fa71e2c3804837c44cfbe054d1cef03a9244dbfb",
                 "contents": {"block_number": -1, "parent_hash": null,
                              "transaction_count": 0, "transactions": []}}]"#,
        );
        assert_malformed(
            r#"[{"hash": "5d94f0b113a5465f1c5442e3fa71e2c3804837c44cfbe054d1cef03a9244dbfb",
                 "contents": {"block_number": 0, "parent_hash": null,
                              "transaction_count": 1, "transactions": [{"Tom": 1.5}]}}]"#,
        );
    }

    #[test]
    fn element_errors_name_the_index() {
        let (chain, _) = sample_chain();
        let mut json: Value = serde_json::from_str(&export_chain(&chain).unwrap()).unwrap();
        json[1]["contents"]["transactions"] = Value::String("oops".into());

        match load_chain(&json.to_string()) {
            Err(LedgerError::MalformedInput(msg)) => assert!(msg.starts_with("block 1:"), "{}", msg),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_fields() {
        let (chain, _) = sample_chain();
        let mut json: Value = serde_json::from_str(&export_chain(&chain).unwrap()).unwrap();
        json[0]["contents"]["nonce"] = Value::from(7);
        assert!(matches!(
            load_chain(&json.to_string()),
            Err(LedgerError::MalformedInput(_))
        ));
    }

    #[test]
    fn oversized_input_is_refused_before_parsing() {
        let (chain, _) = sample_chain();
        let json = export_chain(&chain).unwrap();

        assert!(load_chain_with_limit(&json, json.len()).is_ok());
        match load_chain_with_limit(&json, json.len() - 1) {
            Err(LedgerError::MalformedInput(msg)) => assert!(msg.contains("limit"), "{}", msg),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn input_past_the_configured_cap_is_malformed() {
        let padding = " ".repeat(MAX_CHAIN_INPUT_BYTES - 1);
        let input = format!("[{}]", padding);
        assert_eq!(input.len(), MAX_CHAIN_INPUT_BYTES + 1);
        assert_malformed(&input);
    }

    #[test]
    fn empty_array_is_an_empty_chain() {
        assert_eq!(load_chain("[]"), Err(LedgerError::EmptyChain));
    }

    #[test]
    fn loading_does_not_validate() {
        let (chain, _) = sample_chain();
        let mut json: Value = serde_json::from_str(&export_chain(&chain).unwrap()).unwrap();
        json[1]["contents"]["transactions"][0]["Tom"] = Value::from(-5);
        json[1]["contents"]["transactions"][0]["Medium"] = Value::from(5);

        let tampered = json.to_string();
        assert!(load_chain(&tampered).is_ok());
        assert!(matches!(
            load_and_check(&tampered),
            Err(LedgerError::HashMismatch { block_number: 1, .. })
        ));
    }
}
