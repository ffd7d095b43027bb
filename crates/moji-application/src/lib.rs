//! Application layer of the Moji funnel.
//!
//! Hosts the use case that sequences one session through the generation
//! funnel, wiring the domain components from `moji-core` to the
//! collaborator contracts from `moji-interaction`.

pub mod funnel_usecase;

pub use funnel_usecase::FunnelUseCase;

#[cfg(test)]
mod funnel_usecase_test;
