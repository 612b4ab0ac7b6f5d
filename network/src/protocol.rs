//! JSON request and response shapes of the ledger WebSocket API.
//!
//! Requests are `{"id": <n>, "command": "<name>", ...params}`. Responses echo
//! the id and carry either `"status": "success"` with a `result` object or
//! `"status": "error"` with `error` / `error_message`.

use serde_json::{json, Map, Value};

use crate::gateway::SubmitResult;
use crate::NetworkError;

pub const ACCOUNT_INFO: &str = "account_info";
pub const LEDGER_CURRENT: &str = "ledger_current";
pub const SUBMIT: &str = "submit";

/// Serialize a request with the given id.
pub fn request(id: u64, command: &str, params: Value) -> String {
    let mut body = Map::new();
    body.insert("id".into(), json!(id));
    body.insert("command".into(), json!(command));
    if let Value::Object(params) = params {
        body.extend(params);
    }
    Value::Object(body).to_string()
}

/// The request id of an incoming frame, if it answers a request.
pub fn response_id(frame: &Value) -> Option<u64> {
    frame.get("id").and_then(Value::as_u64)
}

/// Unwrap the `result` object of a response frame.
pub fn into_result(command: &str, frame: Value) -> Result<Value, NetworkError> {
    let Value::Object(mut frame) = frame else {
        return Err(malformed(command, "response is not an object"));
    };
    let status = frame.get("status").and_then(Value::as_str).map(str::to_string);
    match status.as_deref() {
        Some("success") => frame
            .remove("result")
            .ok_or_else(|| malformed(command, "missing result")),
        Some("error") => {
            let text = |key: &str| frame.get(key).and_then(Value::as_str).map(str::to_string);
            Err(NetworkError::Rpc {
                command: command.to_string(),
                error: text("error").unwrap_or_else(|| "unknown".to_string()),
                message: text("error_message"),
            })
        }
        _ => Err(malformed(command, "missing status")),
    }
}

pub fn parse_account_sequence(result: &Value) -> Result<u32, NetworkError> {
    let sequence = result
        .pointer("/account_data/Sequence")
        .and_then(Value::as_u64)
        .ok_or_else(|| malformed(ACCOUNT_INFO, "missing account_data.Sequence"))?;
    u32::try_from(sequence).map_err(|_| malformed(ACCOUNT_INFO, "sequence out of range"))
}

pub fn parse_ledger_current(result: &Value) -> Result<u32, NetworkError> {
    let index = result
        .get("ledger_current_index")
        .and_then(Value::as_u64)
        .ok_or_else(|| malformed(LEDGER_CURRENT, "missing ledger_current_index"))?;
    u32::try_from(index).map_err(|_| malformed(LEDGER_CURRENT, "ledger index out of range"))
}

/// Parse a submit result, falling back to the locally computed hash when the
/// node does not echo `tx_json.hash`.
pub fn parse_submit(result: &Value, local_hash: &str) -> Result<SubmitResult, NetworkError> {
    let engine_result = result
        .get("engine_result")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(SUBMIT, "missing engine_result"))?;
    let tx_hash = result
        .pointer("/tx_json/hash")
        .and_then(Value::as_str)
        .unwrap_or(local_hash);
    Ok(SubmitResult {
        engine_result: engine_result.to_string(),
        engine_result_message: result
            .get("engine_result_message")
            .and_then(Value::as_str)
            .map(str::to_string),
        tx_hash: tx_hash.to_string(),
    })
}

fn malformed(command: &str, reason: &str) -> NetworkError {
    NetworkError::Malformed {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_merges_params() {
        let text = request(7, ACCOUNT_INFO, json!({"account": "rABC", "ledger_index": "current"}));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["command"], "account_info");
        assert_eq!(value["account"], "rABC");
        assert_eq!(value["ledger_index"], "current");
    }

    #[test]
    fn success_result_is_unwrapped() {
        let frame = json!({"id": 1, "status": "success", "result": {"ledger_current_index": 812}});
        let result = into_result(LEDGER_CURRENT, frame).unwrap();
        assert_eq!(parse_ledger_current(&result).unwrap(), 812);
    }

    #[test]
    fn error_frame_maps_to_rpc_error() {
        let frame = json!({
            "id": 2, "status": "error", "error": "actNotFound",
            "error_message": "Account not found."
        });
        match into_result(ACCOUNT_INFO, frame) {
            Err(NetworkError::Rpc { command, error, message }) => {
                assert_eq!(command, "account_info");
                assert_eq!(error, "actNotFound");
                assert_eq!(message.as_deref(), Some("Account not found."));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn account_sequence_from_account_data() {
        let result = json!({"account_data": {"Account": "rABC", "Sequence": 4021}});
        assert_eq!(parse_account_sequence(&result).unwrap(), 4021);
        assert!(parse_account_sequence(&json!({})).is_err());
        let huge = json!({"account_data": {"Sequence": u64::from(u32::MAX) + 1}});
        assert!(parse_account_sequence(&huge).is_err());
    }

    #[test]
    fn submit_result_prefers_node_hash() {
        let result = json!({
            "engine_result": "tesSUCCESS",
            "engine_result_message": "The transaction was applied.",
            "tx_json": {"hash": "NODEHASH"}
        });
        let parsed = parse_submit(&result, "LOCAL").unwrap();
        assert_eq!(parsed.engine_result, "tesSUCCESS");
        assert_eq!(parsed.tx_hash, "NODEHASH");

        let bare = parse_submit(&json!({"engine_result": "tecPATH_DRY"}), "LOCAL").unwrap();
        assert_eq!(bare.tx_hash, "LOCAL");
        assert_eq!(bare.engine_result_message, None);
    }

    #[test]
    fn frames_without_status_are_malformed() {
        assert!(matches!(
            into_result(SUBMIT, json!({"id": 3})),
            Err(NetworkError::Malformed { .. })
        ));
        assert!(matches!(
            into_result(SUBMIT, json!("text")),
            Err(NetworkError::Malformed { .. })
        ));
    }
}
