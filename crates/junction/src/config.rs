//! Configuration types for Junction conversions.
//!
//! This module provides the configuration structures that control how
//! sources are read, transformed and rendered. All types implement
//! [`serde::Deserialize`] so they can be loaded from a TOML file.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`RenderConfig`] - Default layout direction for rendered output.
//! - [`TextOptions`] - Options for the free-form text front end.
//! - [`TransformConfig`] - Optional simplification between parse and render.
//!
//! # Example
//!
//! ```
//! # use junction::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.render().direction().is_none());
//! assert!(!config.transform().simplify());
//! ```

use serde::Deserialize;

use junction_core::{format::Direction, graph::SimplifyOptions};

pub use junction_parser::text::TextOptions;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Render configuration section.
    #[serde(default)]
    render: RenderConfig,

    /// Text front end section.
    #[serde(default)]
    text: TextOptions,

    /// Transformation section.
    #[serde(default)]
    transform: TransformConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(render: RenderConfig, text: TextOptions, transform: TransformConfig) -> Self {
        Self {
            render,
            text,
            transform,
        }
    }

    /// Returns the render configuration.
    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    /// Returns the text front end options.
    pub fn text(&self) -> &TextOptions {
        &self.text
    }

    /// Returns the transformation configuration.
    pub fn transform(&self) -> &TransformConfig {
        &self.transform
    }
}

/// Rendering defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Direction used when a conversion does not name one. When unset, the
    /// direction read from the source is kept.
    #[serde(default)]
    direction: Option<Direction>,
}

impl RenderConfig {
    /// Creates a new [`RenderConfig`].
    pub fn new(direction: Option<Direction>) -> Self {
        Self { direction }
    }

    /// Returns the configured default direction, if any.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }
}

/// Transformations applied by [`Converter::convert`](crate::Converter::convert)
/// between parsing and rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    /// Remove transitive edges.
    #[serde(default)]
    simplify: bool,

    /// With `simplify`, also drop nodes left without edges.
    #[serde(default)]
    remove_isolated: bool,
}

impl TransformConfig {
    /// Creates a new [`TransformConfig`].
    pub fn new(simplify: bool, remove_isolated: bool) -> Self {
        Self {
            simplify,
            remove_isolated,
        }
    }

    /// Whether transitive edges are removed.
    pub fn simplify(&self) -> bool {
        self.simplify
    }

    /// Whether isolated nodes are removed after simplifying.
    pub fn remove_isolated(&self) -> bool {
        self.remove_isolated
    }

    /// Options for [`junction_core::graph::simplify_with`].
    pub fn simplify_options(&self) -> SimplifyOptions {
        SimplifyOptions {
            remove_isolated: self.remove_isolated,
        }
    }
}
