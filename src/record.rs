use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One client account as it appears on a report.
///
/// `account_number` and `last_transaction_date` are opaque strings that are
/// printed exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub name: String,
    pub address: String,
    pub account_number: String,
    pub balance: Decimal,
    pub email_address: String,
    pub phone_number: String,
    pub last_transaction_date: String,
}

impl Record {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        account_number: impl Into<String>,
        balance: Decimal,
        email_address: impl Into<String>,
        phone_number: impl Into<String>,
        last_transaction_date: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            account_number: account_number.into(),
            balance,
            email_address: email_address.into(),
            phone_number: phone_number.into(),
            last_transaction_date: last_transaction_date.into(),
        }
    }
}

/// Exact sum of all balances, or `None` if it does not fit in a `Decimal`.
pub fn total_balance(records: &[Record]) -> Option<Decimal> {
    records
        .iter()
        .try_fold(Decimal::ZERO, |acc, record| acc.checked_add(record.balance))
}
