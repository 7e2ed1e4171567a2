//! Operation parsing
//!
//! Converts raw Horizon operation records into `Transaction`s. Only the
//! payment family is understood. Everything else, malformed records and
//! records outside the lookback window are dropped without failing the batch.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::ledger::LookbackWindow;
use crate::scoring::pricing::NATIVE_SYMBOL;
use crate::scoring::types::{Transaction, TransactionKind};

/// Horizon operation record, tagged by its `type` field
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawOperation {
    #[serde(rename = "payment")]
    Payment(RawPayment),
    #[serde(rename = "path_payment_strict_send")]
    PathPaymentStrictSend(RawPayment),
    #[serde(rename = "path_payment_strict_receive", alias = "path_payment")]
    PathPaymentStrictReceive(RawPayment),
    #[serde(other)]
    Unsupported,
}

/// Fields shared by payments and path payments.
///
/// `amount` / `asset_*` describe the destination side; the `source_*`
/// fields exist only on path payments.
#[derive(Debug, Deserialize)]
struct RawPayment {
    id: String,
    created_at: String,
    #[serde(default = "default_successful", alias = "successful")]
    transaction_successful: bool,
    from: String,
    to: String,
    amount: String,
    asset_type: String,
    asset_code: Option<String>,
    source_amount: Option<String>,
    source_asset_type: Option<String>,
    source_asset_code: Option<String>,
    transaction: Option<JoinedTransaction>,
}

fn default_successful() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct JoinedTransaction {
    memo: Option<String>,
}

/// Why a record did not become a transaction
#[derive(Debug, Clone, PartialEq)]
enum Discard {
    Unsupported,
    Malformed(String),
    OutsideWindow,
}

/// Stateless parser for one wallet's operation records
#[derive(Debug, Clone, Default)]
pub struct OperationParser;

impl OperationParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one record, or `None` if it is discarded
    pub fn parse(
        &self,
        record: &serde_json::Value,
        wallet: &str,
        window: &LookbackWindow,
    ) -> Option<Transaction> {
        match self.try_parse(record, wallet, window) {
            Ok(tx) => Some(tx),
            Err(Discard::Malformed(reason)) => {
                debug!(wallet = %wallet, reason = %reason, "Dropping malformed operation");
                None
            }
            Err(_) => None,
        }
    }

    /// Parse a batch, keeping the order of the input
    pub fn parse_batch(
        &self,
        records: &[serde_json::Value],
        wallet: &str,
        window: &LookbackWindow,
    ) -> Vec<Transaction> {
        let mut transactions = Vec::with_capacity(records.len());
        let (mut unsupported, mut malformed, mut outside) = (0u32, 0u32, 0u32);

        for record in records {
            match self.try_parse(record, wallet, window) {
                Ok(tx) => transactions.push(tx),
                Err(Discard::Unsupported) => unsupported += 1,
                Err(Discard::OutsideWindow) => outside += 1,
                Err(Discard::Malformed(reason)) => {
                    debug!(wallet = %wallet, reason = %reason, "Dropping malformed operation");
                    malformed += 1;
                }
            }
        }

        debug!(
            wallet = %wallet,
            kept = transactions.len(),
            unsupported,
            malformed,
            outside_window = outside,
            "Parsed operation batch"
        );

        transactions
    }

    fn try_parse(
        &self,
        record: &serde_json::Value,
        wallet: &str,
        window: &LookbackWindow,
    ) -> Result<Transaction, Discard> {
        let operation = RawOperation::deserialize(record)
            .map_err(|e| Discard::Malformed(e.to_string()))?;

        let (raw, is_path) = match operation {
            RawOperation::Payment(raw) => (raw, false),
            RawOperation::PathPaymentStrictSend(raw)
            | RawOperation::PathPaymentStrictReceive(raw) => (raw, true),
            RawOperation::Unsupported => return Err(Discard::Unsupported),
        };

        let timestamp = parse_timestamp(&raw.created_at)?;
        if !window.contains(timestamp) {
            return Err(Discard::OutsideWindow);
        }

        let outgoing = raw.from == wallet;
        let kind = match (is_path, outgoing) {
            (false, true) => TransactionKind::OutgoingPayment,
            (false, false) => TransactionKind::IncomingPayment,
            (true, true) => TransactionKind::OutgoingPathPayment,
            (true, false) => TransactionKind::IncomingPathPayment,
        };

        // Use the side of the payment local to the wallet
        let (amount, asset) = if is_path && outgoing {
            let amount = raw
                .source_amount
                .as_deref()
                .ok_or_else(|| Discard::Malformed(format!("{}: missing source_amount", raw.id)))?;
            let asset_type = raw.source_asset_type.as_deref().ok_or_else(|| {
                Discard::Malformed(format!("{}: missing source_asset_type", raw.id))
            })?;
            (
                parse_amount(amount)?,
                asset_symbol(asset_type, raw.source_asset_code.as_deref()),
            )
        } else {
            (
                parse_amount(&raw.amount)?,
                asset_symbol(&raw.asset_type, raw.asset_code.as_deref()),
            )
        };

        Ok(Transaction {
            id: raw.id,
            kind,
            amount,
            asset,
            from: raw.from,
            to: raw.to,
            timestamp,
            successful: raw.transaction_successful,
            memo: raw.transaction.and_then(|t| t.memo),
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, Discard> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Discard::Malformed(format!("bad timestamp {:?}: {}", value, e)))
}

fn parse_amount(value: &str) -> Result<f64, Discard> {
    let amount: f64 = value
        .parse()
        .map_err(|_| Discard::Malformed(format!("bad amount {:?}", value)))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(Discard::Malformed(format!("amount out of range: {}", amount)));
    }
    Ok(amount)
}

/// Relabel the native asset; issued assets keep their code
fn asset_symbol(asset_type: &str, asset_code: Option<&str>) -> String {
    if asset_type == "native" {
        return NATIVE_SYMBOL.to_string();
    }
    asset_code.unwrap_or(asset_type).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const WALLET: &str = "GWALLET";

    fn window() -> LookbackWindow {
        LookbackWindow::ending_at(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(), 90).unwrap()
    }

    fn payment(from: &str, to: &str) -> serde_json::Value {
        json!({
            "id": "1001",
            "type": "payment",
            "created_at": "2024-05-10T08:30:00Z",
            "transaction_successful": true,
            "from": from,
            "to": to,
            "amount": "125.5000000",
            "asset_type": "native",
            "transaction": { "memo": "rent" }
        })
    }

    #[test]
    fn test_outgoing_native_payment() {
        let tx = OperationParser::new()
            .parse(&payment(WALLET, "GOTHER"), WALLET, &window())
            .unwrap();

        assert_eq!(tx.id, "1001");
        assert_eq!(tx.kind, TransactionKind::OutgoingPayment);
        assert_eq!(tx.asset, "XLM");
        assert!((tx.amount - 125.5).abs() < 1e-9);
        assert_eq!(tx.memo.as_deref(), Some("rent"));
        assert!(tx.successful);
        assert_eq!(
            tx.timestamp,
            Utc.with_ymd_and_hms(2024, 5, 10, 8, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_incoming_issued_asset_payment() {
        let mut record = payment("GOTHER", WALLET);
        record["asset_type"] = json!("credit_alphanum4");
        record["asset_code"] = json!("USDC");
        record["transaction_successful"] = json!(false);

        let tx = OperationParser::new().parse(&record, WALLET, &window()).unwrap();

        assert_eq!(tx.kind, TransactionKind::IncomingPayment);
        assert_eq!(tx.asset, "USDC");
        assert!(!tx.successful);
    }

    fn path_payment(kind: &str, from: &str, to: &str) -> serde_json::Value {
        json!({
            "id": "2002",
            "type": kind,
            "created_at": "2024-04-01T00:00:00Z",
            "from": from,
            "to": to,
            "amount": "50.0000000",
            "asset_type": "credit_alphanum4",
            "asset_code": "USDC",
            "source_amount": "480.0000000",
            "source_asset_type": "native"
        })
    }

    #[test]
    fn test_outgoing_path_payment_uses_source_side() {
        let record = path_payment("path_payment_strict_send", WALLET, "GOTHER");
        let tx = OperationParser::new().parse(&record, WALLET, &window()).unwrap();

        assert_eq!(tx.kind, TransactionKind::OutgoingPathPayment);
        assert_eq!(tx.asset, "XLM");
        assert!((tx.amount - 480.0).abs() < 1e-9);
        // Missing success flag defaults to true
        assert!(tx.successful);
    }

    #[test]
    fn test_incoming_path_payment_uses_destination_side() {
        let record = path_payment("path_payment_strict_receive", "GOTHER", WALLET);
        let tx = OperationParser::new().parse(&record, WALLET, &window()).unwrap();

        assert_eq!(tx.kind, TransactionKind::IncomingPathPayment);
        assert_eq!(tx.asset, "USDC");
        assert!((tx.amount - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_legacy_path_payment_alias() {
        let record = path_payment("path_payment", "GOTHER", WALLET);
        assert!(OperationParser::new().parse(&record, WALLET, &window()).is_some());
    }

    #[test]
    fn test_non_payment_kinds_discarded() {
        let parser = OperationParser::new();
        for kind in ["create_account", "change_trust", "manage_sell_offer", "set_options"] {
            let record = json!({
                "id": "3003",
                "type": kind,
                "created_at": "2024-05-10T08:30:00Z",
                "source_account": WALLET
            });
            assert!(parser.parse(&record, WALLET, &window()).is_none());
        }
    }

    #[test]
    fn test_malformed_records_discarded() {
        let parser = OperationParser::new();

        let mut bad_time = payment(WALLET, "GOTHER");
        bad_time["created_at"] = json!("last tuesday");
        assert!(parser.parse(&bad_time, WALLET, &window()).is_none());

        let mut bad_amount = payment(WALLET, "GOTHER");
        bad_amount["amount"] = json!("lots");
        assert!(parser.parse(&bad_amount, WALLET, &window()).is_none());

        let mut negative = payment(WALLET, "GOTHER");
        negative["amount"] = json!("-5.0");
        assert!(parser.parse(&negative, WALLET, &window()).is_none());

        let mut missing = payment(WALLET, "GOTHER");
        missing.as_object_mut().unwrap().remove("to");
        assert!(parser.parse(&missing, WALLET, &window()).is_none());

        let mut no_source = path_payment("path_payment_strict_send", WALLET, "GOTHER");
        no_source.as_object_mut().unwrap().remove("source_amount");
        assert!(parser.parse(&no_source, WALLET, &window()).is_none());

        assert!(parser.parse(&json!("not an object"), WALLET, &window()).is_none());
    }

    #[test]
    fn test_out_of_window_discarded() {
        let mut old = payment(WALLET, "GOTHER");
        old["created_at"] = json!("2023-12-01T00:00:00Z");
        assert!(OperationParser::new().parse(&old, WALLET, &window()).is_none());
    }

    #[test]
    fn test_batch_keeps_good_records() {
        let records = vec![
            payment(WALLET, "GOTHER"),
            json!({ "id": "9", "type": "create_account", "created_at": "2024-05-10T08:30:00Z" }),
            json!({ "type": "payment" }),
            path_payment("path_payment_strict_receive", "GOTHER", WALLET),
        ];
        let txs = OperationParser::new().parse_batch(&records, WALLET, &window());

        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].id, "1001");
        assert_eq!(txs[1].id, "2002");
    }
}
