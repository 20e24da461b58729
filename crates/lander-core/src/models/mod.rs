//! Domain models shared between the repositories, services and HTTP layer

pub mod campaign;
pub mod line_tag;
pub mod site;
pub mod tracking;

pub use campaign::*;
pub use line_tag::*;
pub use site::*;
pub use tracking::*;
