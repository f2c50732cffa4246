//! Edit transactions for `maniphest.edit`.
//!
//! One call carries a [`TransactionSet`]; the server applies all of its
//! transactions together. Each kind appears at most once per set.

use crate::form::{FormValue, Params};
use crate::records::Phid;

/// Status keyword for an open task.
pub const STATUS_OPEN: &str = "open";

/// A single field-level mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    /// Set the title.
    Title(String),
    /// Set the status keyword.
    Status(String),
    /// Set the priority keyword.
    Priority(String),
    /// Set story points.
    Points(String),
    /// Set the raw description.
    Description(String),
    /// Set or clear the owner. `None` is sent as an empty value.
    Owner(Option<Phid>),
    /// Replace the full project list.
    ProjectsSet(Vec<Phid>),
    /// Move the task into a space.
    Space(Phid),
}

impl Transaction {
    /// Wire name of this transaction's type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Status(_) => "status",
            Self::Priority(_) => "priority",
            Self::Points(_) => "points",
            Self::Description(_) => "description",
            Self::Owner(_) => "owner",
            Self::ProjectsSet(_) => "projects.set",
            Self::Space(_) => "space",
        }
    }

    /// Wire value of this transaction.
    #[must_use]
    pub fn value(&self) -> FormValue {
        match self {
            Self::Title(text)
            | Self::Status(text)
            | Self::Priority(text)
            | Self::Points(text)
            | Self::Description(text) => FormValue::scalar(text),
            Self::Owner(owner) => {
                FormValue::scalar(owner.as_ref().map(Phid::as_str).unwrap_or_default())
            }
            Self::ProjectsSet(projects) => FormValue::list(projects.iter().map(Phid::as_str)),
            Self::Space(space) => FormValue::scalar(space.as_str()),
        }
    }

    fn to_form(&self) -> FormValue {
        FormValue::map([
            ("type", FormValue::scalar(self.kind())),
            ("value", self.value()),
        ])
    }
}

/// Ordered transactions for one edit call, unique by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionSet {
    transactions: Vec<Transaction>,
}

impl TransactionSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            transactions: Vec::new(),
        }
    }

    /// Adds a transaction, replacing any existing one of the same kind
    /// in its original position.
    pub fn set(&mut self, transaction: Transaction) {
        if let Some(existing) = self
            .transactions
            .iter_mut()
            .find(|t| t.kind() == transaction.kind())
        {
            *existing = transaction;
        } else {
            self.transactions.push(transaction);
        }
    }

    /// Looks up the transaction of the given kind.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&Transaction> {
        self.iter().find(|t| t.kind() == kind)
    }

    /// Kinds in set order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.iter().map(Transaction::kind).collect()
    }

    /// Number of transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Iterates transactions in set order.
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Request parameters for `maniphest.edit`: `transactions[i][type]`
    /// and `transactions[i][value]`.
    #[must_use]
    pub fn to_params(&self) -> Params {
        Params::new().with(
            "transactions",
            FormValue::List(self.iter().map(Transaction::to_form).collect()),
        )
    }
}
