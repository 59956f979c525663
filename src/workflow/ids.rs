//! Step id generation
//!
//! Steps created in the editor get a random v4 UUID. Steps reconstructed
//! from a payload that carries no id get a name-based v5 UUID derived from
//! the payload and its position, so loading the same payload twice yields
//! the same ids.

use uuid::Uuid;

const STEP_NAMESPACE: Uuid = Uuid::from_u128(0x5a1c_e7d2_9b3f_4c61_a8e0_2f4d_6b71_c90e);

/// Random id for a newly created step
pub fn fresh() -> String {
    Uuid::new_v4().to_string()
}

/// Deterministic id for a step at `path` whose payload serializes to `payload`
pub fn derived(path: &str, payload: &str) -> String {
    let mut seed = String::with_capacity(path.len() + payload.len() + 1);
    seed.push_str(path);
    seed.push('|');
    seed.push_str(payload);
    Uuid::new_v5(&STEP_NAMESPACE, seed.as_bytes()).to_string()
}
