pub mod paginate;
pub mod select;

pub use paginate::fetch_all_pages;
pub use select::first_app_order_under;
pub use select::first_dataset_order_under;
pub use select::random_workerpool_order_under;
pub use select::OrderSelectionError;
