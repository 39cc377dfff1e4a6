/// Runtime values and their types.
///
/// Defines the `Value` enum carried by literal tokens and the `ValueType`
/// used for declarations, parameters and return types.
pub mod core;
