mod account;
mod expense;
mod journal;
mod ledger;
mod money;
mod plan;
mod product;
mod sale;
mod statements;
mod user;

pub use account::*;
pub use expense::*;
pub use journal::*;
pub use ledger::*;
pub use money::*;
pub use plan::*;
pub use product::*;
pub use sale::*;
pub use statements::*;
pub use user::*;
