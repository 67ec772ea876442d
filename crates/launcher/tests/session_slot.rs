//! Unit tests for the single-job session slot.
//!
//! The slot is the server-side guard behind "one routing job per process":
//! a second start request while a permit is outstanding must not produce a
//! new job, and the slot must free itself however the job ends.

use routebridge_launcher::state::SessionSlot;

// ---------------------------------------------------------------------------
// Test: a fresh slot is free and can be claimed
// ---------------------------------------------------------------------------

#[test]
fn fresh_slot_is_free() {
    let slot = SessionSlot::new();

    assert!(!slot.is_busy());
    assert!(slot.try_acquire().is_some());
}

// ---------------------------------------------------------------------------
// Test: a held slot rejects a second claim
// ---------------------------------------------------------------------------

#[test]
fn held_slot_rejects_second_claim() {
    let slot = SessionSlot::new();

    let _permit = slot.try_acquire().expect("first claim succeeds");
    assert!(slot.is_busy());
    assert!(slot.try_acquire().is_none());
}

// ---------------------------------------------------------------------------
// Test: dropping the permit frees the slot
// ---------------------------------------------------------------------------

#[test]
fn dropping_permit_frees_slot() {
    let slot = SessionSlot::new();

    let permit = slot.try_acquire().expect("first claim succeeds");
    drop(permit);

    assert!(!slot.is_busy());
    assert!(slot.try_acquire().is_some());
}

// ---------------------------------------------------------------------------
// Test: clones share one slot
// ---------------------------------------------------------------------------

#[test]
fn clones_share_the_slot() {
    let slot = SessionSlot::new();
    let clone = slot.clone();

    let _permit = slot.try_acquire().expect("first claim succeeds");
    assert!(clone.is_busy());
    assert!(clone.try_acquire().is_none());
}

// ---------------------------------------------------------------------------
// Test: rejection does not disturb the outstanding permit
// ---------------------------------------------------------------------------

#[test]
fn rejected_claim_leaves_permit_intact() {
    let slot = SessionSlot::new();

    let _permit = slot.try_acquire().expect("first claim succeeds");
    assert!(slot.try_acquire().is_none());
    assert!(slot.try_acquire().is_none());

    // Still held by the original permit.
    assert!(slot.is_busy());
}
