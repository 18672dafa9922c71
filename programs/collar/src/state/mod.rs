pub mod events;
pub mod loan;
pub mod market;
pub mod oracle;
pub mod policy;
pub mod traits;
