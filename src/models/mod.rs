pub mod bank_account;
pub mod order;
pub mod product;

pub use bank_account::BankAccount;
pub use order::{Order, OrderItem, OrderStatus, PaymentInfo, PaymentMethod, PaymentStatus};
pub use product::Product;
