//! Account capability trait and value types
//!
//! An account is anything that can present a profile, an account type, and a
//! store identifier. Two variants exist: [`StoredAccount`], hydrated from the
//! account repository, and [`BasicAccount`], a minimal value built from only
//! an email address and used to probe password validity before the real
//! account is fetched.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Capability set shared by every account variant.
pub trait Account: fmt::Debug + Send + Sync {
    fn profile(&self) -> Profile;
    fn account_type(&self) -> AccountType;
    /// Identifier of the physical store branch the account is attached to,
    /// zero when unattached.
    fn store_identifier(&self) -> i64;
}

/// Accounts cross task boundaries and live in session stores, so they are
/// shared behind an `Arc` rather than cloned.
pub type SharedAccount = Arc<dyn Account>;

/// Public profile fields of an account.
///
/// The password hash is deliberately absent; it never leaves the repository
/// layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub gender: Gender,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Unspecified,
    Male,
    Female,
    Others,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Unspecified => "",
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Others => "Others",
        }
    }

    /// Maps the repository's integer column to a variant. Unknown values fall
    /// back to `Unspecified`.
    pub fn from_repr(value: i16) -> Self {
        match value {
            1 => Gender::Male,
            2 => Gender::Female,
            3 => Gender::Others,
            _ => Gender::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Unspecified,
    Customer,
    MerchantCashier,
    Management,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Unspecified => "",
            AccountType::Customer => "Customer",
            AccountType::MerchantCashier => "Merchant Cashier",
            AccountType::Management => "Management",
        }
    }

    pub fn from_repr(value: i16) -> Self {
        match value {
            1 => AccountType::Customer,
            2 => AccountType::MerchantCashier,
            3 => AccountType::Management,
            _ => AccountType::Unspecified,
        }
    }
}

/// Minimal account value, not backed by any repository row.
#[derive(Debug, Clone)]
pub struct BasicAccount {
    profile: Profile,
    account_type: AccountType,
    store_identifier: i64,
}

impl BasicAccount {
    pub fn new(profile: Profile, account_type: AccountType, store_identifier: i64) -> Self {
        Self {
            profile,
            account_type,
            store_identifier,
        }
    }

    /// Builds the email-only lookup variant used by the login flow to probe
    /// password validity before the full account is loaded.
    pub fn lookup(email: &str) -> Self {
        Self {
            profile: Profile {
                id: 0,
                name: String::new(),
                email: email.to_string(),
                gender: Gender::Unspecified,
            },
            account_type: AccountType::Unspecified,
            store_identifier: 0,
        }
    }
}

impl Account for BasicAccount {
    fn profile(&self) -> Profile {
        self.profile.clone()
    }

    fn account_type(&self) -> AccountType {
        self.account_type
    }

    fn store_identifier(&self) -> i64 {
        self.store_identifier
    }
}

/// Fully-hydrated account as the repository stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAccount {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub account_type: AccountType,
    pub store_id: i64,
    pub email_validated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account for StoredAccount {
    fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            gender: self.gender,
        }
    }

    fn account_type(&self) -> AccountType {
        self.account_type
    }

    fn store_identifier(&self) -> i64 {
        self.store_id
    }
}
