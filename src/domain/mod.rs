//! Domain model: offerings, the cart, the checkout state machine and the
//! ports through which the application talks to the outside world.

pub mod booking;
pub mod cart;
pub mod checkout;
pub mod money;
pub mod notification;
pub mod offering;
pub mod ports;
mod wire;
