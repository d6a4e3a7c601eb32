// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Decoder cache
//!
//! Memoises the expensive half of a decoder solve: the activity matrix `A`
//! and the pseudo-inverse of its Gram matrix. Any new target function over
//! the same population then only costs `Ginv · (A · targetᵀ)`.
//!
//! Keys have the shape `{signature}[_eval{hash}]_{index}`; the signature
//! covers every parameter that shapes the activity matrix.

use ahash::AHashMap;
use core::fmt;
use ndarray::Array2;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::trace;
use xxhash_rust::xxh64::{xxh64, Xxh64};

/// Cached `(Ginv, A)` pair for one sub-population
#[derive(Debug, Clone, PartialEq)]
pub struct GammaInverse {
    /// `neurons × neurons`
    pub ginv: Array2<f64>,
    /// `neurons × samples`, noise included
    pub activities: Array2<f64>,
}

/// Storage service for decoder intermediates
pub trait DecoderCache: fmt::Debug + Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<GammaInverse>>;

    fn set(&self, key: &str, value: Arc<GammaInverse>);

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// A cache handle shared between networks
pub type SharedDecoderCache = Arc<dyn DecoderCache>;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Process-local cache
#[derive(Default)]
pub struct InMemoryDecoderCache {
    entries: RwLock<AHashMap<String, Arc<GammaInverse>>>,
    stats: Mutex<CacheStats>,
}

impl InMemoryDecoderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh cache behind a shareable handle
    pub fn shared() -> SharedDecoderCache {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        *self.stats.lock() = CacheStats::default();
    }
}

impl DecoderCache for InMemoryDecoderCache {
    fn get(&self, key: &str) -> Option<Arc<GammaInverse>> {
        let found = self.entries.read().get(key).cloned();
        let mut stats = self.stats.lock();
        if found.is_some() {
            stats.hits += 1;
            trace!(target: "nef-decoding", "[CACHE] hit {}", key);
        } else {
            stats.misses += 1;
            trace!(target: "nef-decoding", "[CACHE] miss {}", key);
        }
        found
    }

    fn set(&self, key: &str, value: Arc<GammaInverse>) {
        self.entries.write().insert(key.to_string(), value);
        self.stats.lock().inserts += 1;
    }

    fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }
}

impl fmt::Debug for InMemoryDecoderCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryDecoderCache")
            .field("entries", &self.len())
            .field("stats", &*self.stats.lock())
            .finish()
    }
}

/// Builds a deterministic population signature.
///
/// Every field is fed to an xxh64 stream, so the same parameters produce
/// the same key across runs and processes.
pub struct SignatureBuilder {
    prefix: String,
    hasher: Xxh64,
}

impl SignatureBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            hasher: Xxh64::new(0),
        }
    }

    pub fn with_str(mut self, value: &str) -> Self {
        self.hasher.update(&(value.len() as u64).to_le_bytes());
        self.hasher.update(value.as_bytes());
        self
    }

    pub fn with_u64(mut self, value: u64) -> Self {
        self.hasher.update(&value.to_le_bytes());
        self
    }

    pub fn with_f64(mut self, value: f64) -> Self {
        self.hasher.update(&value.to_bits().to_le_bytes());
        self
    }

    pub fn with_matrix(self, matrix: &Array2<f64>) -> Self {
        self.with_u64(eval_points_hash(matrix))
    }

    pub fn finish(self) -> String {
        format!("{}_{:016x}", self.prefix, self.hasher.digest())
    }
}

/// Hash of a point matrix: shape followed by every value's bit pattern
pub fn eval_points_hash(points: &Array2<f64>) -> u64 {
    let (rows, cols) = points.dim();
    let mut bytes = Vec::with_capacity(16 + rows * cols * 8);
    bytes.extend_from_slice(&(rows as u64).to_le_bytes());
    bytes.extend_from_slice(&(cols as u64).to_le_bytes());
    for value in points.iter() {
        bytes.extend_from_slice(&value.to_bits().to_le_bytes());
    }
    xxh64(&bytes, 0)
}

/// Append the evaluation-point suffix to a base key
pub fn eval_key(base: &str, points: &Array2<f64>) -> String {
    format!("{}_eval{:016x}", base, eval_points_hash(points))
}

/// Append the sub-population suffix to a base key
pub fn index_key(base: &str, index: usize) -> String {
    format!("{}_{}", base, index)
}
