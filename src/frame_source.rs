pub mod impl_fake;
pub mod impl_zmq;
pub mod interface;
