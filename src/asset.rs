use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A dealer account record, keyed in the store by `dealer_id`.
///
/// Fields are declared in alphabetical order of their encoded names so the
/// JSON encoding is byte-for-byte deterministic. Do not reorder them.
///
/// Absent fields decode as zero or empty. A field of the wrong type is a
/// decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Asset {
    pub balance: i64,
    #[serde(rename = "DealerID")]
    pub dealer_id: String,
    pub mpin: String,
    pub msisdn: String,
    pub remarks: String,
    pub status: String,
    pub trans_amount: i64,
    pub trans_type: String,
}

impl Asset {
    /// Encode into the canonical stored form.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(|e| Error::encode(&self.dealer_id, e))
    }

    /// Decode a value read from the store under `key`.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes).map_err(|e| Error::decode(key, e))
    }
}

/// The records written by `Registry::init_ledger`, in write order.
pub fn seed_assets() -> Vec<Asset> {
    [
        ("DEALER001", "1234567890", "1234", 10000, "Active", 5000, "Credit", "Initial deposit"),
        ("DEALER002", "0987654321", "5678", 15000, "Active", 2000, "Debit", "Payment for stock"),
        ("DEALER003", "1122334455", "9101", 25000, "Inactive", 3000, "Credit", "Refund from supplier"),
        ("DEALER004", "2233445566", "1213", 5000, "Active", 1000, "Debit", "Payment for delivery"),
        ("DEALER005", "3344556677", "1415", 20000, "Active", 7000, "Credit", "Monthly sales revenue"),
    ]
    .into_iter()
    .map(
        |(dealer_id, msisdn, mpin, balance, status, trans_amount, trans_type, remarks)| Asset {
            balance,
            dealer_id: dealer_id.to_string(),
            mpin: mpin.to_string(),
            msisdn: msisdn.to_string(),
            remarks: remarks.to_string(),
            status: status.to_string(),
            trans_amount,
            trans_type: trans_type.to_string(),
        },
    )
    .collect()
}
