pub mod access;
pub mod carrier;
pub mod gate;
pub mod public_routes;

pub use gate::AuthenticationGate;
