//! Progress hooks for generation and analysis.
//!
//! The engines report what they do through an [`Observer`] instead of
//! logging directly. [`TracingObserver`] forwards everything to `tracing`;
//! `()` ignores everything.

use crate::analyze::AnalysisTotals;
use crate::error::Error;

/// Receives structured progress events. Every method defaults to a no-op.
pub trait Observer {
    /// Generation is about to start with the given substitution keys.
    fn generation_started(&mut self, _keys: &[&str]) {}

    /// A slide is about to be processed. `index` is 1-based.
    fn slide_started(&mut self, _index: usize, _part: &str) {}

    /// A placeholder was replaced inside a run on slide `slide`.
    fn replacement_made(&mut self, _slide: usize, _placeholder: &str, _value: &str) {}

    /// A run containing `${` was rewritten.
    fn run_rewritten(&mut self, _slide: usize, _original: &str, _replaced: &str) {}

    /// The filled package was written. Not called when generation fails.
    fn generation_finished(&mut self, _slides: usize, _rewritten_runs: usize) {}

    /// A template analysis completed.
    fn analysis_finished(&mut self, _totals: &AnalysisTotals) {}

    /// A template could not be loaded for analysis.
    fn analysis_failed(&mut self, _error: &Error) {}
}

impl Observer for () {}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn generation_started(&mut self, keys: &[&str]) {
        tracing::info!(?keys, "Starting presentation generation");
    }

    fn slide_started(&mut self, index: usize, part: &str) {
        tracing::debug!(slide = index, part, "Processing slide");
    }

    fn replacement_made(&mut self, slide: usize, placeholder: &str, value: &str) {
        tracing::debug!(slide, placeholder, value, "Replaced placeholder");
    }

    fn run_rewritten(&mut self, slide: usize, original: &str, replaced: &str) {
        tracing::debug!(slide, original, replaced, "Rewrote run");
    }

    fn generation_finished(&mut self, slides: usize, rewritten_runs: usize) {
        tracing::info!(slides, replacements = rewritten_runs, "Presentation generated");
    }

    fn analysis_finished(&mut self, totals: &AnalysisTotals) {
        tracing::info!(
            slides = totals.slides,
            text_shapes = totals.text_shapes,
            placeholders = totals.placeholders,
            "Template analyzed"
        );
    }

    fn analysis_failed(&mut self, error: &Error) {
        tracing::error!(%error, "Template analysis failed");
    }
}
