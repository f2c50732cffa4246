//! Wire-level definitions for the Conduit API used by `taskcopy`.
//!
//! Requests are form-encoded ([`form`]), responses arrive wrapped in a
//! JSON [`envelope`], and the payloads deserialize into [`records`].
//! Task edits are expressed as a [`transaction::TransactionSet`].

pub mod envelope;
pub mod form;
pub mod records;
pub mod transaction;
