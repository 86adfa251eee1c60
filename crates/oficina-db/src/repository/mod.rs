//! # Repository Modules
//!
//! One repository per aggregate. Repositories own SQL; business rules stay
//! in oficina-core and the service layer.

pub mod movement;
pub mod product;
pub mod session;

pub use movement::{MovementFilter, MovementRepository, MovementSortKey, NewMovement, SortOrder};
pub use product::ProductRepository;
pub use session::SessionRepository;
