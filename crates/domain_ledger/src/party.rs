//! Customers and the companies they belong to

use serde::{Deserialize, Serialize};

use core_kernel::{CompanyId, CustomerId, Money};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub company_name: String,
    pub address: String,
    pub email: String,
    pub phone_number: String,
    pub is_active: bool,
}

impl Company {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            id: CompanyId::new_v7(),
            company_name: company_name.into(),
            address: String::new(),
            email: String::new(),
            phone_number: String::new(),
            is_active: true,
        }
    }
}

/// A trading counterparty with a running debt balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub company_id: CompanyId,
    pub full_name: String,
    pub address: String,
    pub phone_number: String,
    /// Sum of outstanding debt across this customer's transactions.
    /// Written only through `CustomerDebtAggregator`.
    pub debt: Money,
}

impl Customer {
    pub fn new(company_id: CompanyId, full_name: impl Into<String>) -> Self {
        Self {
            id: CustomerId::new_v7(),
            company_id,
            full_name: full_name.into(),
            address: String::new(),
            phone_number: String::new(),
            debt: Money::ZERO,
        }
    }
}
