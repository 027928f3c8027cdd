use crate::error::{LedgerError, Result};
use crate::{sha256, Hash};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            "transfer" => Ok(TransactionKind::Transfer),
            _ => Err(LedgerError::invalid_tx(format!(
                "unknown transaction kind `{s}`"
            ))),
        }
    }
}

/// Money in minor units (cents). Parsed from and shown as a two-place decimal.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const MINOR_PER_MAJOR: u64 = 100;

    pub const fn from_minor(units: u64) -> Self {
        Amount(units)
    }

    pub fn from_major(units: u64) -> Option<Self> {
        units.checked_mul(Self::MINOR_PER_MAJOR).map(Amount)
    }

    pub fn minor_units(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let bad = || LedgerError::invalid_tx(format!("`{s}` is not a valid amount"));

        let (whole, frac) = match s.split_once('.') {
            Some((_, "")) => return Err(bad()),
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !digits(whole) || !digits(frac) {
            return Err(bad());
        }
        if frac.len() > 2 {
            return Err(LedgerError::invalid_tx(format!(
                "`{s}` has more than two decimal places"
            )));
        }

        let whole: u64 = whole.parse().map_err(|_| bad())?;
        let cents = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| bad())? * 10,
            _ => frac.parse::<u64>().map_err(|_| bad())?,
        };
        Amount::from_major(whole)
            .and_then(|a| a.0.checked_add(cents))
            .map(Amount)
            .ok_or_else(bad)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / Self::MINOR_PER_MAJOR,
            self.0 % Self::MINOR_PER_MAJOR
        )
    }
}

/// A validated, immutable ledger entry.
///
/// Field order is part of the canonical encoding: the merkle leaf for a
/// transaction is SHA-256 over its compact JSON form
/// `{"sender":..,"receiver":..,"amount":<cents>,"kind":".."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub(crate) sender: String,
    pub(crate) receiver: String,
    pub(crate) amount: Amount,
    pub(crate) kind: TransactionKind,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: Amount,
        kind: TransactionKind,
    ) -> Result<Self> {
        let tx = Self {
            sender: sender.into().trim().to_string(),
            receiver: receiver.into().trim().to_string(),
            amount,
            kind,
        };
        tx.validate()?;
        Ok(tx)
    }

    /// Builds a transaction from the raw strings an ingestion layer receives.
    pub fn parse(sender: &str, receiver: &str, amount: &str, kind: &str) -> Result<Self> {
        Self::new(sender, receiver, amount.parse()?, kind.parse()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sender.is_empty() {
            return Err(LedgerError::invalid_tx("sender is empty"));
        }
        if self.receiver.is_empty() {
            return Err(LedgerError::invalid_tx("receiver is empty"));
        }
        if self.amount.is_zero() {
            return Err(LedgerError::invalid_tx("amount must be greater than zero"));
        }
        if self.kind == TransactionKind::Transfer && self.sender == self.receiver {
            return Err(LedgerError::invalid_tx(format!(
                "{} cannot transfer to itself",
                self.sender
            )));
        }
        Ok(())
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn involves(&self, account: &str) -> bool {
        self.sender == account || self.receiver == account
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("transaction fields always serialize")
    }

    pub fn leaf_hash(&self) -> Hash {
        sha256(&self.canonical_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice_to_bob(amount: u64, kind: TransactionKind) -> Transaction {
        Transaction::new("Alice", "Bob", Amount::from_minor(amount), kind).unwrap()
    }

    #[test]
    fn canonical_encoding_has_fixed_field_order() {
        let tx = alice_to_bob(5000, TransactionKind::Deposit);
        let json = String::from_utf8(tx.canonical_bytes()).unwrap();
        assert_eq!(
            json,
            r#"{"sender":"Alice","receiver":"Bob","amount":5000,"kind":"deposit"}"#
        );
    }

    #[test]
    fn leaf_hash_covers_kind() {
        let deposit = alice_to_bob(5000, TransactionKind::Deposit);
        let transfer = alice_to_bob(5000, TransactionKind::Transfer);
        assert_ne!(deposit.leaf_hash(), transfer.leaf_hash());
        assert_eq!(deposit.leaf_hash(), deposit.clone().leaf_hash());
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = Transaction::new("Alice", "Bob", Amount::from_minor(0), TransactionKind::Deposit)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransaction(_)));
    }

    #[test]
    fn blank_parties_are_rejected() {
        let amount = Amount::from_minor(1);
        assert!(Transaction::new("  ", "Bob", amount, TransactionKind::Deposit).is_err());
        assert!(Transaction::new("Alice", "", amount, TransactionKind::Withdrawal).is_err());
    }

    #[test]
    fn self_transfer_is_rejected_but_self_deposit_is_not() {
        let amount = Amount::from_minor(100);
        assert!(Transaction::new("Alice", "Alice", amount, TransactionKind::Transfer).is_err());
        assert!(Transaction::new("Alice", "Alice", amount, TransactionKind::Deposit).is_ok());
    }

    #[test]
    fn parties_are_trimmed() {
        let kind = TransactionKind::Deposit;
        let tx = Transaction::new(" Alice ", "Bob\n", Amount::from_minor(1), kind).unwrap();
        assert_eq!(tx.sender(), "Alice");
        assert_eq!(tx.receiver(), "Bob");
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("DEPOSIT".parse::<TransactionKind>().unwrap(), TransactionKind::Deposit);
        assert_eq!(" Withdrawal".parse::<TransactionKind>().unwrap(), TransactionKind::Withdrawal);
        assert_eq!("transfer".parse::<TransactionKind>().unwrap(), TransactionKind::Transfer);
        assert!("refund".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn amount_parses_decimals() {
        assert_eq!("50".parse::<Amount>().unwrap(), Amount::from_minor(5000));
        assert_eq!("50.5".parse::<Amount>().unwrap(), Amount::from_minor(5050));
        assert_eq!("50.25".parse::<Amount>().unwrap(), Amount::from_minor(5025));
        assert_eq!("0.01".parse::<Amount>().unwrap(), Amount::from_minor(1));
        assert_eq!(" 7 ".parse::<Amount>().unwrap(), Amount::from_minor(700));
    }

    #[test]
    fn amount_rejects_malformed_input() {
        for bad in [
            "", "-5", "+5", "5.", ".5", "5.123", "abc", "1e3", "5,00", "184467440737095517",
        ] {
            assert!(bad.parse::<Amount>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn amount_displays_two_places() {
        assert_eq!(Amount::from_minor(5000).to_string(), "50.00");
        assert_eq!(Amount::from_minor(5).to_string(), "0.05");
        assert_eq!(Amount::from_minor(12345).to_string(), "123.45");
    }

    #[test]
    fn parse_builds_from_raw_fields() {
        let tx = Transaction::parse("SYSTEM", "+254712345678", "50", "DEPOSIT").unwrap();
        assert_eq!(tx.amount(), Amount::from_minor(5000));
        assert_eq!(tx.kind(), TransactionKind::Deposit);
        assert!(tx.involves("+254712345678"));
        assert!(!tx.involves("ATM"));
        assert!(Transaction::parse("SYSTEM", "Bob", "0", "deposit").is_err());
        assert!(Transaction::parse("SYSTEM", "Bob", "10", "gift").is_err());
    }
}
