//! Learning rate schedulers
//!
//! `MilestoneLR` holds the base rate until the first milestone epoch, then applies
//! the milestone's multiplier. The default MART schedule decays ×0.1 at epoch 75,
//! ×0.01 at 90 and ×0.001 at 100.

mod milestone;


pub use milestone::MilestoneLR;

/// Learning rate scheduler trait
pub trait LRScheduler {
    /// Get the current learning rate
    fn get_lr(&self) -> f32;

    /// Step the scheduler (typically called after each epoch or batch)
    fn step(&mut self);
}
