// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
	pub name: String,
	pub kind: FunctionKind,
	pub result: ReturnType,
	pub arity: Arity,
	/// Result columns of a table function; empty otherwise
	pub columns: Vec<FunctionColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionColumn {
	pub name: String,
	pub ty: Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
	Scalar,
	/// A boolean predicate usable as a join condition
	Filter,
	/// Receives the ordering permutation, the partition ids and the peer
	/// ids as trailing arguments
	Window,
	/// Produces a relation; only valid as a plan node
	Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
	Fixed(Type),
	SameAsFirst,
	/// Common type of the arguments from position `from` on
	Common {
		from: usize,
	},
	/// Widest numeric type among the arguments; operands must be numeric
	Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
	Exact(usize),
	AtLeast(usize),
	Between(usize, usize),
}

impl FunctionDef {
	pub fn scalar(name: impl Into<String>, arity: Arity, result: ReturnType) -> Self {
		Self {
			name: name.into(),
			kind: FunctionKind::Scalar,
			result,
			arity,
			columns: vec![],
		}
	}

	pub fn filter(name: impl Into<String>, arity: Arity) -> Self {
		Self {
			name: name.into(),
			kind: FunctionKind::Filter,
			result: ReturnType::Fixed(Type::Boolean),
			arity,
			columns: vec![],
		}
	}

	pub fn window(name: impl Into<String>, arity: Arity, result: ReturnType) -> Self {
		Self {
			name: name.into(),
			kind: FunctionKind::Window,
			result,
			arity,
			columns: vec![],
		}
	}

	pub fn table(name: impl Into<String>, arity: Arity, columns: &[(&str, Type)]) -> Self {
		Self {
			name: name.into(),
			kind: FunctionKind::Table,
			result: ReturnType::Fixed(Type::Undefined),
			arity,
			columns: columns
				.iter()
				.map(|(name, ty)| FunctionColumn {
					name: name.to_string(),
					ty: *ty,
				})
				.collect(),
		}
	}

	pub fn accepts(&self, count: usize) -> bool {
		match self.arity {
			Arity::Exact(n) => count == n,
			Arity::AtLeast(n) => count >= n,
			Arity::Between(low, high) => count >= low && count <= high,
		}
	}

	/// Result type for the given argument types, `None` when a numeric
	/// function receives a non numeric operand.
	pub fn return_type(&self, args: &[Type]) -> Option<Type> {
		match self.result {
			ReturnType::Fixed(ty) => Some(ty),
			ReturnType::SameAsFirst => Some(args.first().copied().unwrap_or(Type::Undefined)),
			ReturnType::Common {
				from,
			} => args.iter().skip(from).try_fold(Type::Undefined, |acc, ty| Type::common(acc, *ty)),
			ReturnType::Numeric => {
				let mut result = Type::Undefined;
				for ty in args {
					if *ty != Type::Undefined && !ty.is_numeric() {
						return None;
					}
					result = Type::common(result, *ty)?;
				}
				Some(result)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_numeric_widening() {
		let add = FunctionDef::scalar("add", Arity::Exact(2), ReturnType::Numeric);
		assert_eq!(add.return_type(&[Type::Int4, Type::Int8]), Some(Type::Int8));
		assert_eq!(add.return_type(&[Type::Int8, Type::Float8]), Some(Type::Float8));
		assert_eq!(add.return_type(&[Type::Undefined, Type::Int4]), Some(Type::Int4));
		assert_eq!(add.return_type(&[Type::Utf8, Type::Int4]), None);
	}

	#[test]
	fn test_common_skips_leading_arguments() {
		let branch = FunctionDef::scalar(
			"ifthenelse",
			Arity::Exact(3),
			ReturnType::Common {
				from: 1,
			},
		);
		assert_eq!(branch.return_type(&[Type::Boolean, Type::Int4, Type::Int8]), Some(Type::Int8));
		assert_eq!(branch.return_type(&[Type::Boolean, Type::Undefined, Type::Utf8]), Some(Type::Utf8));
		assert_eq!(branch.return_type(&[Type::Boolean, Type::Int4, Type::Utf8]), None);
	}

	#[test]
	fn test_arity() {
		let concat = FunctionDef::scalar("concat", Arity::AtLeast(1), ReturnType::Fixed(Type::Utf8));
		assert!(!concat.accepts(0));
		assert!(concat.accepts(3));

		let rank = FunctionDef::window("rank", Arity::Between(0, 1), ReturnType::Fixed(Type::Int8));
		assert!(rank.accepts(0));
		assert!(!rank.accepts(2));
	}
}
