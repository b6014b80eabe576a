pub mod database;
pub mod email;
pub mod invoice;
pub mod storage;
pub mod verification;

pub use database::OrderDb;
pub use email::{EmailAttachment, EmailMessage, EmailProvider, MockEmailProvider, SmtpProvider};
pub use invoice::{InvoiceData, InvoiceRenderer};
pub use storage::{LocalStorage, Storage};
pub use verification::{CodeStore, InMemoryCodeStore, RedisCodeStore, VerificationRegistry};
