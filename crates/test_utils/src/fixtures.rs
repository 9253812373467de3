//! Pre-built Test Fixtures
//!
//! A [`LedgerFixture`] is an in-memory ledger seeded with one company and
//! one customer, plus whatever inventory a test adds. All services built
//! from it share the same store and a clock pinned to [`fixed_instant`].

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fake::faker::address::en::StreetName;
use fake::faker::company::en::CompanyName;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use core_kernel::{Clock, FixedClock, Money};
use domain_ledger::{
    Company, Customer, CustomerDebtAggregator, InMemoryLedgerStore, InventoryItem, LedgerEngine,
    LedgerQueries, LedgerStore, SettlementProcessor,
};

/// 10:00 on 9 March 2024 in Jakarta
static FIXED_INSTANT: Lazy<DateTime<Utc>> =
    Lazy::new(|| Utc.with_ymd_and_hms(2024, 3, 9, 3, 0, 0).unwrap());

/// Instant every fixture clock is pinned to
pub fn fixed_instant() -> DateTime<Utc> {
    *FIXED_INSTANT
}

/// Business date of [`fixed_instant`] in Jakarta
pub fn business_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
}

/// Clock pinned to [`fixed_instant`] in the Jakarta timezone
pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::at(fixed_instant()).in_timezone(chrono_tz::Asia::Jakarta))
}

/// Creates a company with generated details
pub fn fake_company() -> Company {
    let mut company = Company::new(CompanyName().fake::<String>());
    company.address = StreetName().fake();
    company.phone_number = PhoneNumber().fake();
    company.email = "accounts@example.com".to_string();
    company
}

/// Creates a customer of `company` with generated details
pub fn fake_customer(company: &Company) -> Customer {
    let mut customer = Customer::new(company.id, Name().fake::<String>());
    customer.address = StreetName().fake();
    customer.phone_number = PhoneNumber().fake();
    customer
}

/// In-memory ledger seeded with a company and a customer
pub struct LedgerFixture {
    pub store: InMemoryLedgerStore,
    pub company: Company,
    pub customer: Customer,
}

impl LedgerFixture {
    /// Seeds a company and one of its customers
    pub async fn new() -> Self {
        let store = InMemoryLedgerStore::new();
        let company = fake_company();
        let customer = fake_customer(&company);

        store.add_company(company.clone()).await;
        store.add_customer(customer.clone()).await;

        Self {
            store,
            company,
            customer,
        }
    }

    /// Adds an active item with the given stock
    pub async fn add_item(&self, name: &str, stock: Decimal) -> InventoryItem {
        let item = InventoryItem::new(name, Money::new(dec!(10)), stock, fixed_instant());
        self.store.add_item(item.clone()).await;
        item
    }

    /// Adds another customer of the same company
    pub async fn add_customer(&self) -> Customer {
        let customer = fake_customer(&self.company);
        self.store.add_customer(customer.clone()).await;
        customer
    }

    pub fn store(&self) -> Arc<dyn LedgerStore> {
        Arc::new(self.store.clone())
    }

    pub fn engine(&self) -> LedgerEngine {
        LedgerEngine::new(self.store(), fixed_clock())
    }

    pub fn settlement(&self) -> SettlementProcessor {
        SettlementProcessor::new(self.store(), fixed_clock())
    }

    pub fn queries(&self) -> LedgerQueries {
        LedgerQueries::new(self.store())
    }

    pub fn aggregator(&self) -> CustomerDebtAggregator {
        CustomerDebtAggregator::new(self.store())
    }

    /// Current stock of an item
    pub async fn stock_of(&self, item: &InventoryItem) -> Decimal {
        self.store.snapshot().await.items[&item.id].stock
    }

    /// Current stored debt of the fixture customer
    pub async fn customer_debt(&self) -> Money {
        self.store.snapshot().await.customers[&self.customer.id].debt
    }
}
