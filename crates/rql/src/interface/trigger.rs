// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{
	expression::Expression,
	interface::{TableId, TriggerId},
};

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDef {
	pub id: TriggerId,
	pub table: TableId,
	pub name: String,
	pub time: TriggerTime,
	pub event: TriggerEvent,
	/// Name under which the rows before the change are visible; `old` if unset
	pub old_name: Option<String>,
	/// Name under which the rows after the change are visible; `new` if unset
	pub new_name: Option<String>,
	/// Procedural statements run once per triggering statement
	pub body: Vec<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerTime {
	Before,
	After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
	Insert,
	Update,
	Delete,
}

impl TriggerDef {
	pub fn old_name(&self) -> &str {
		self.old_name.as_deref().unwrap_or("old")
	}

	pub fn new_name(&self) -> &str {
		self.new_name.as_deref().unwrap_or("new")
	}
}
