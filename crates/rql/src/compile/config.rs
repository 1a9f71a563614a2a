// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::{Deserialize, Serialize};

use crate::{compile::Compiler, interface::Catalog};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
	/// Nesting depth of plan nodes and expressions before compilation
	/// fails with a recursion error
	pub max_depth: usize,
	/// Seed multi-column equi-joins and selects from persisted hash indexes
	pub hash_index_shortcut: bool,
	/// Compile `TopN` over an ordered projection as bounded top-K passes
	pub topn_pushdown: bool,
}

impl CompilerConfig {
	pub fn new() -> Self {
		Self {
			max_depth: 256,
			hash_index_shortcut: true,
			topn_pushdown: true,
		}
	}
}

impl Default for CompilerConfig {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Debug, Clone, Default)]
pub struct CompilerBuilder {
	config: CompilerConfig,
}

impl CompilerBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_config(config: CompilerConfig) -> Self {
		Self {
			config,
		}
	}

	pub fn max_depth(mut self, max_depth: usize) -> Self {
		self.config.max_depth = max_depth;
		self
	}

	pub fn hash_index_shortcut(mut self, enabled: bool) -> Self {
		self.config.hash_index_shortcut = enabled;
		self
	}

	pub fn topn_pushdown(mut self, enabled: bool) -> Self {
		self.config.topn_pushdown = enabled;
		self
	}

	pub fn config(&self) -> &CompilerConfig {
		&self.config
	}

	pub fn build<'a>(self, catalog: &'a dyn Catalog) -> Compiler<'a> {
		Compiler::new(catalog, self.config)
	}
}
