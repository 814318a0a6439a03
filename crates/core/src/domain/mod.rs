pub mod bracket;
pub mod carrier;
pub mod document;
pub mod geo;
pub mod price;
pub mod route;
