// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{self, Display, Formatter},
	ops::{Deref, Index},
};

use quarry_type::Value;
use serde::{Deserialize, Serialize};

/// Rows produced by an `Output` statement, column by column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
	pub columns: Vec<FrameColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameColumn {
	pub relation: String,
	pub name: String,
	pub values: Vec<Value>,
}

impl FrameColumn {
	pub fn qualified_name(&self) -> String {
		if self.relation.is_empty() {
			self.name.clone()
		} else {
			format!("{}.{}", self.relation, self.name)
		}
	}
}

impl Deref for Frame {
	type Target = [FrameColumn];

	fn deref(&self) -> &Self::Target {
		&self.columns
	}
}

impl Index<usize> for Frame {
	type Output = FrameColumn;

	fn index(&self, index: usize) -> &Self::Output {
		self.columns.index(index)
	}
}

impl Frame {
	pub fn new(columns: Vec<FrameColumn>) -> Self {
		Self {
			columns,
		}
	}

	pub fn row_count(&self) -> usize {
		self.columns.first().map_or(0, |c| c.values.len())
	}

	pub fn column(&self, name: &str) -> Option<&FrameColumn> {
		self.columns.iter().find(|c| c.name == name)
	}

	/// Row-major copy of the values.
	pub fn rows(&self) -> Vec<Vec<Value>> {
		(0..self.row_count())
			.map(|row| self.columns.iter().map(|c| c.values.get(row).cloned().unwrap_or(Value::Undefined)).collect())
			.collect()
	}
}

fn escape_control_chars(s: &str) -> String {
	s.replace('\n', "\\n").replace('\t', "\\t")
}

fn width(s: &str) -> usize {
	s.chars().count()
}

impl Display for Frame {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let headers: Vec<String> = self.columns.iter().map(|c| escape_control_chars(&c.qualified_name())).collect();
		let cells: Vec<Vec<String>> = self
			.rows()
			.iter()
			.map(|row| row.iter().map(|v| escape_control_chars(&v.to_string())).collect())
			.collect();

		let mut col_widths: Vec<usize> = headers.iter().map(|h| width(h)).collect();
		for row in &cells {
			for (i, cell) in row.iter().enumerate() {
				col_widths[i] = col_widths[i].max(width(cell));
			}
		}
		for w in &mut col_widths {
			*w += 2;
		}

		let sep: String = if col_widths.is_empty() {
			"++".to_string()
		} else {
			col_widths.iter().map(|w| format!("+{}", "-".repeat(*w))).collect::<String>() + "+"
		};

		let line = |parts: &[String]| -> String {
			let cells: Vec<String> = parts
				.iter()
				.zip(col_widths.iter())
				.map(|(text, w)| {
					let pad = w - width(text);
					let l = pad / 2;
					let r = pad - l;
					format!("{:l$}{}{:r$}", "", text, "")
				})
				.collect();
			format!("|{}|", cells.join("|"))
		};

		writeln!(f, "{}", sep)?;
		writeln!(f, "{}", line(&headers))?;
		writeln!(f, "{}", sep)?;
		for row in &cells {
			writeln!(f, "{}", line(row))?;
		}
		write!(f, "{}", sep)
	}
}
