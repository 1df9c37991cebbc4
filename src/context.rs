//! Security-context store (spec.md §3, §4.1).
//!
//! The reference implementation keeps an intrusive singly linked list
//! of contexts allocated from a `memb` pool and addressed by raw
//! pointer. Spec.md §9's first REDESIGN FLAG calls that out
//! explicitly: replace the pointer walk with a fixed-size table of
//! slots addressed by stable small-integer handles, so a caller can
//! never dereference a freed context. We go one step further than a
//! bare index and add a per-slot generation counter (the standard
//! "slot map" trick) so a handle captured before a `free` cannot
//! silently alias a different, later context that reused the slot.

use zeroize::Zeroizing;

use crate::config::{CONTEXT_NUM, IV_LEN, KEY_LEN};
use crate::error::ContextError;

/// AEAD algorithm bound to a context. Only one variant exists today —
/// spec.md fixes AES-CCM-64-64-128 — but keeping it as an enum instead
/// of a bare constant leaves room to add a suite later without
/// changing every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    AesCcm64_64_128,
}

/// COSE algorithm identifier used in this core's AAD header block
/// (spec.md §8 scenario S1/S2: `0x0A`).
pub const ALG_AES_CCM_64_64_128: u8 = 0x0A;

impl Algorithm {
    pub fn id(self) -> u8 {
        match self {
            Self::AesCcm64_64_128 => ALG_AES_CCM_64_64_128,
        }
    }
}

/// Per-peer keying material and replay counters (spec.md §3).
pub struct SecurityContext {
    pub context_id: u32,
    pub alg: Algorithm,
    pub sender_key: Zeroizing<[u8; KEY_LEN]>,
    pub sender_iv: [u8; IV_LEN],
    pub receiver_key: Zeroizing<[u8; KEY_LEN]>,
    pub receiver_iv: [u8; IV_LEN],
    pub sender_seq: u32,
    pub receiver_seq: u32,
}

/// A stable handle into the [`ContextStore`]. Opaque outside this
/// module except for equality/debug — callers never see the slot index
/// or generation directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextHandle {
    index: u16,
    generation: u16,
}

enum Slot {
    Free { next_free: Option<u16>, generation: u16 },
    Occupied { ctx: SecurityContext, generation: u16 },
}

/// Fixed-capacity registry of security contexts (spec.md §4.1).
pub struct ContextStore {
    slots: [Slot; CONTEXT_NUM],
    free_head: Option<u16>,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStore {
    /// Clear the store (spec.md §4.1 `init`).
    pub fn new() -> Self {
        let slots = core::array::from_fn(|i| {
            let next_free = if i + 1 < CONTEXT_NUM {
                Some((i + 1) as u16)
            } else {
                None
            };
            Slot::Free {
                next_free,
                generation: 0,
            }
        });
        Self {
            slots,
            free_head: if CONTEXT_NUM > 0 { Some(0) } else { None },
        }
    }

    /// Allocate a context from the fixed-capacity pool (spec.md §4.1
    /// `new`). Fails with `CapacityExhausted` once `CONTEXT_NUM`
    /// contexts are live.
    pub fn new_context(
        &mut self,
        context_id: u32,
        sender_key: [u8; KEY_LEN],
        sender_iv: [u8; IV_LEN],
        receiver_key: [u8; KEY_LEN],
        receiver_iv: [u8; IV_LEN],
    ) -> Result<ContextHandle, ContextError> {
        let index = self.free_head.ok_or(ContextError::CapacityExhausted)?;

        let generation = match &self.slots[index as usize] {
            Slot::Free {
                next_free,
                generation,
            } => {
                self.free_head = *next_free;
                *generation
            }
            Slot::Occupied { .. } => unreachable!("free list pointed at an occupied slot"),
        };

        self.slots[index as usize] = Slot::Occupied {
            ctx: SecurityContext {
                context_id,
                alg: Algorithm::AesCcm64_64_128,
                sender_key: Zeroizing::new(sender_key),
                sender_iv,
                receiver_key: Zeroizing::new(receiver_key),
                receiver_iv,
                sender_seq: 0,
                receiver_seq: 0,
            },
            generation,
        };

        Ok(ContextHandle { index, generation })
    }

    /// Linear search by context id (spec.md §4.1 `find_by_cid`). A
    /// fresh store never has two contexts with the same id, so the
    /// first match is the only match.
    pub fn find_by_cid(&self, cid: u32) -> Option<ContextHandle> {
        for (i, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied { ctx, generation } = slot {
                if ctx.context_id == cid {
                    return Some(ContextHandle {
                        index: i as u16,
                        generation: *generation,
                    });
                }
            }
        }
        None
    }

    fn resolve(&self, handle: ContextHandle) -> Result<&SecurityContext, ContextError> {
        match self.slots.get(handle.index as usize) {
            Some(Slot::Occupied { ctx, generation }) if *generation == handle.generation => {
                Ok(ctx)
            }
            _ => Err(ContextError::InvalidHandle),
        }
    }

    fn resolve_mut(&mut self, handle: ContextHandle) -> Result<&mut SecurityContext, ContextError> {
        match self.slots.get_mut(handle.index as usize) {
            Some(Slot::Occupied { ctx, generation }) if *generation == handle.generation => {
                Ok(ctx)
            }
            _ => Err(ContextError::InvalidHandle),
        }
    }

    /// Borrow the context behind a handle.
    pub fn get(&self, handle: ContextHandle) -> Result<&SecurityContext, ContextError> {
        self.resolve(handle)
    }

    /// Mutably borrow the context behind a handle.
    pub fn get_mut(&mut self, handle: ContextHandle) -> Result<&mut SecurityContext, ContextError> {
        self.resolve_mut(handle)
    }

    /// Unlink and zeroize a context, returning its slot to the pool
    /// (spec.md §4.1 `free`). After this call `handle` (and any copy
    /// of it) resolves to `InvalidHandle` forever — the generation
    /// bump prevents use-after-free even if the slot is reused.
    pub fn free(&mut self, handle: ContextHandle) -> Result<(), ContextError> {
        match self.slots.get(handle.index as usize) {
            Some(Slot::Occupied { generation, .. }) if *generation == handle.generation => {}
            _ => return Err(ContextError::InvalidHandle),
        }

        let next_generation = handle.generation.wrapping_add(1);
        // `ctx` (and its `Zeroizing` fields) drops here, zeroizing key
        // and IV material before the slot becomes reusable.
        self.slots[handle.index as usize] = Slot::Free {
            next_free: self.free_head,
            generation: next_generation,
        };
        self.free_head = Some(handle.index);
        Ok(())
    }
}

impl SecurityContext {
    /// Atomically (single-threaded: just increment) advance the sender
    /// sequence counter, retiring the context before it could wrap
    /// (spec.md §9, REDESIGN FLAG 5).
    pub fn increment_sender_seq(&mut self) -> Result<u32, crate::error::ProtectError> {
        if self.sender_seq >= u32::MAX - crate::config::SEQUENCE_RETIRE_MARGIN {
            return Err(crate::error::ProtectError::SequenceExhausted);
        }
        self.sender_seq += 1;
        Ok(self.sender_seq)
    }

    /// Accept `incoming_seq` only if strictly greater than the highest
    /// previously accepted sequence (spec.md §3 invariant, §4.9 step 4).
    /// On acceptance, updates `receiver_seq` and returns `true`.
    pub fn validate_receiver_seq(&mut self, incoming_seq: u32) -> bool {
        if incoming_seq > self.receiver_seq {
            self.receiver_seq = incoming_seq;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ([u8; KEY_LEN], [u8; IV_LEN], [u8; KEY_LEN], [u8; IV_LEN]) {
        ([0x11; KEY_LEN], [0x22; IV_LEN], [0x33; KEY_LEN], [0x44; IV_LEN])
    }

    #[test]
    fn new_then_find_by_cid() {
        let mut store = ContextStore::new();
        let (sk, si, rk, ri) = sample();
        let h = store.new_context(2, sk, si, rk, ri).unwrap();
        assert_eq!(store.find_by_cid(2), Some(h));
        assert_eq!(store.find_by_cid(3), None);
    }

    #[test]
    fn capacity_exhausted_when_pool_full() {
        let mut store = ContextStore::new();
        let (sk, si, rk, ri) = sample();
        for i in 0..CONTEXT_NUM {
            store.new_context(i as u32, sk, si, rk, ri).unwrap();
        }
        assert_eq!(
            store.new_context(999, sk, si, rk, ri),
            Err(ContextError::CapacityExhausted)
        );
    }

    #[test]
    fn free_then_reuse_slot_invalidates_old_handle() {
        let mut store = ContextStore::new();
        let (sk, si, rk, ri) = sample();
        let h1 = store.new_context(2, sk, si, rk, ri).unwrap();
        store.free(h1).unwrap();
        assert_eq!(store.get(h1), Err(ContextError::InvalidHandle));

        let h2 = store.new_context(2, sk, si, rk, ri).unwrap();
        assert_ne!(h1, h2);
        assert_eq!(store.get(h1), Err(ContextError::InvalidHandle));
        assert!(store.get(h2).is_ok());
    }

    #[test]
    fn free_zeroizes_key_material() {
        let mut store = ContextStore::new();
        let (sk, si, rk, ri) = sample();
        let h = store.new_context(2, sk, si, rk, ri).unwrap();
        store.free(h).unwrap();
        // The slot is Free now; re-occupy with different data and make
        // sure no trace of the old key leaked into a fresh context.
        let h2 = store.new_context(5, [0u8; KEY_LEN], [0u8; IV_LEN], [0u8; KEY_LEN], [0u8; IV_LEN])
            .unwrap();
        let ctx = store.get(h2).unwrap();
        assert_eq!(*ctx.sender_key, [0u8; KEY_LEN]);
    }

    #[test]
    fn sender_seq_strictly_increases_across_sends() {
        let mut store = ContextStore::new();
        let (sk, si, rk, ri) = sample();
        let h = store.new_context(2, sk, si, rk, ri).unwrap();
        let ctx = store.get_mut(h).unwrap();
        let s1 = ctx.increment_sender_seq().unwrap();
        let s2 = ctx.increment_sender_seq().unwrap();
        assert!(s1 < s2);
    }

    #[test]
    fn receiver_seq_rejects_replay_and_reorder() {
        let mut store = ContextStore::new();
        let (sk, si, rk, ri) = sample();
        let h = store.new_context(2, sk, si, rk, ri).unwrap();
        let ctx = store.get_mut(h).unwrap();
        ctx.receiver_seq = 4;

        assert!(ctx.validate_receiver_seq(5));
        assert_eq!(ctx.receiver_seq, 5);
        assert!(!ctx.validate_receiver_seq(5));
        assert!(!ctx.validate_receiver_seq(3));
        assert_eq!(ctx.receiver_seq, 5);
    }

    #[test]
    fn sequence_near_overflow_retires_context() {
        let mut store = ContextStore::new();
        let (sk, si, rk, ri) = sample();
        let h = store.new_context(2, sk, si, rk, ri).unwrap();
        let ctx = store.get_mut(h).unwrap();
        ctx.sender_seq = u32::MAX - crate::config::SEQUENCE_RETIRE_MARGIN;
        assert_eq!(
            ctx.increment_sender_seq(),
            Err(crate::error::ProtectError::SequenceExhausted)
        );
    }
}
