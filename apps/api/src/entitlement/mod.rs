// Entitlement: decides whether a generation request may run and what it costs.
// The gate itself is pure; the quota store and subscription oracle are the only I/O.

pub mod gate;
pub mod quota;
pub mod subscription;
