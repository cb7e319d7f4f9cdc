pub mod contact;
pub mod order;
pub mod page;
pub mod secret;
pub mod tag;

pub use contact::Contact;
pub use contact::ProtectedDataRecord;
pub use order::AppOrder;
pub use order::DatasetOrder;
pub use order::RequestOrder;
pub use order::WorkerpoolOrder;
pub use page::OrderPage;
pub use page::PageCursor;
pub use page::Published;
pub use secret::RequesterSecretPayload;
pub use tag::Tag;
pub use tag::TagFlag;
