// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::{Value, error::diagnostic::runtime::invalid_argument, return_error};

fn text<'a>(function: &str, value: &'a Value) -> crate::Result<Option<&'a str>> {
	match value {
		Value::Undefined => Ok(None),
		Value::Utf8(s) => Ok(Some(s.as_str())),
		other => return_error!(invalid_argument(function, &format!("expects text, got {}", other.get_type()))),
	}
}

fn unary(function: &str, args: &[&Value], f: impl FnOnce(&str) -> Value) -> crate::Result<Value> {
	let Some(value) = args.first() else {
		return_error!(invalid_argument(function, "expects one argument"));
	};
	Ok(text(function, value)?.map(f).unwrap_or(Value::Undefined))
}

pub(super) fn upper(args: &[&Value]) -> crate::Result<Value> {
	unary("upper", args, |s| Value::utf8(s.to_uppercase()))
}

pub(super) fn lower(args: &[&Value]) -> crate::Result<Value> {
	unary("lower", args, |s| Value::utf8(s.to_lowercase()))
}

/// Length in characters.
pub(super) fn length(args: &[&Value]) -> crate::Result<Value> {
	unary("length", args, |s| Value::Int8(s.chars().count() as i64))
}

/// NULL if any operand is NULL; non-text operands are rendered.
pub(super) fn concat(args: &[&Value]) -> crate::Result<Value> {
	let mut result = String::new();
	for arg in args {
		match arg {
			Value::Undefined => return Ok(Value::Undefined),
			Value::Utf8(s) => result.push_str(s),
			other => result.push_str(&other.to_string()),
		}
	}
	Ok(Value::Utf8(result))
}

pub(super) fn like(args: &[&Value]) -> crate::Result<Value> {
	let [value, pattern] = args else {
		return_error!(invalid_argument("like", "expects two arguments"));
	};
	let (Some(value), Some(pattern)) = (text("like", value)?, text("like", pattern)?) else {
		return Ok(Value::Undefined);
	};
	let value: Vec<char> = value.chars().collect();
	let pattern: Vec<char> = pattern.chars().collect();
	Ok(Value::Boolean(matches(&value, &pattern)))
}

/// `%` matches any run of characters, `_` exactly one.
fn matches(value: &[char], pattern: &[char]) -> bool {
	let (mut v, mut p) = (0, 0);
	let mut backtrack: Option<(usize, usize)> = None;
	while v < value.len() {
		match pattern.get(p) {
			Some('%') => {
				backtrack = Some((p, v));
				p += 1;
			}
			Some('_') => {
				v += 1;
				p += 1;
			}
			Some(c) if *c == value[v] => {
				v += 1;
				p += 1;
			}
			_ => match backtrack {
				Some((star, start)) => {
					p = star + 1;
					v = start + 1;
					backtrack = Some((star, start + 1));
				}
				None => return false,
			},
		}
	}
	pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
	use super::*;

	fn is_like(value: &str, pattern: &str) -> bool {
		like(&[&Value::utf8(value), &Value::utf8(pattern)]).unwrap() == Value::bool(true)
	}

	#[test]
	fn test_like() {
		assert!(is_like("hello", "hello"));
		assert!(is_like("hello", "h%"));
		assert!(is_like("hello", "%llo"));
		assert!(is_like("hello", "h_l%o"));
		assert!(is_like("", "%"));
		assert!(is_like("abcabc", "%bc"));
		assert!(!is_like("hello", "h_o"));
		assert!(!is_like("hello", "hello_"));
		assert!(!is_like("hello", "%x%"));
	}

	#[test]
	fn test_like_null() {
		assert_eq!(like(&[&Value::Undefined, &Value::utf8("%")]).unwrap(), Value::Undefined);
	}

	#[test]
	fn test_case_and_length() {
		assert_eq!(upper(&[&Value::utf8("abc")]).unwrap(), Value::utf8("ABC"));
		assert_eq!(lower(&[&Value::utf8("AbC")]).unwrap(), Value::utf8("abc"));
		assert_eq!(length(&[&Value::utf8("héllo")]).unwrap(), Value::int8(5));
		assert!(upper(&[&Value::int4(1)]).is_err());
	}

	#[test]
	fn test_concat() {
		assert_eq!(concat(&[&Value::utf8("a"), &Value::int4(1)]).unwrap(), Value::utf8("a1"));
		assert_eq!(concat(&[&Value::utf8("a"), &Value::Undefined]).unwrap(), Value::Undefined);
	}
}
