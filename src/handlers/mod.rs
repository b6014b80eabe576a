pub mod bank_accounts;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;
pub mod verification;
