//! Prediction cache: the read-through pattern with a long TTL.
//!
//! Generation is expensive, so entries age after 50 minutes and expire after
//! 60 (`FreshnessPolicy::PREDICTIONS`). An aging prediction is served as-is
//! while a replacement is generated in the background; a missing one blocks
//! the caller on the generative call.

use crate::read_through::ReadThroughCache;
use crate::store::KeyedTtlStore;
use tickr_core::PredictionRecord;

pub type PredictionStore = KeyedTtlStore<PredictionRecord>;

/// Prediction read path backed by a generative analysis source.
pub type PredictionCache<G> = ReadThroughCache<G>;
