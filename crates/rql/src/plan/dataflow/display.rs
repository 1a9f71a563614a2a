// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter, Write};

use crate::plan::dataflow::{Cardinality, Op, Program, StmtId};

impl Program {
	fn write_block(&self, out: &mut String, block: &[StmtId], depth: usize) -> std::fmt::Result {
		for id in block {
			let stmt = self.stmt(*id);
			let indent = "  ".repeat(depth);
			let operands: Vec<String> = stmt.op.operands().iter().map(|o| o.to_string()).collect();
			let card = match stmt.card {
				Cardinality::Scalar => "",
				Cardinality::Column => "[]",
			};
			writeln!(out, "{}{} := {}({}) :{}{}", indent, id, stmt.op.name(), operands.join(", "), stmt.ty, card)?;
			match &stmt.op {
				Op::If {
					then,
					otherwise,
					..
				} => {
					self.write_block(out, then, depth + 1)?;
					if !otherwise.is_empty() {
						writeln!(out, "{}else", indent)?;
						self.write_block(out, otherwise, depth + 1)?;
					}
				}
				Op::While {
					prelude,
					body,
					..
				} => {
					self.write_block(out, prelude, depth + 1)?;
					writeln!(out, "{}do", indent)?;
					self.write_block(out, body, depth + 1)?;
				}
				_ => {}
			}
		}
		Ok(())
	}
}

impl Display for Program {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let mut out = String::new();
		self.write_block(&mut out, self.block(), 0)?;
		f.write_str(&out)
	}
}
