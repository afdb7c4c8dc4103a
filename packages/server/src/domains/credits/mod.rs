// Credits domain - balances, purchases, plans, and the cost calculator

pub mod math;
pub mod models;
pub mod plans;

pub use models::purchase::{CreditPurchase, PurchaseOutcome, PurchaseStatus, PurchaseType};
pub use models::shop::{CreditError, Shop};
