//! String method implementations.

use crate::runtime::value::Value;

fn arg_string(args: &[Value], index: usize) -> String {
    match args.get(index) {
        Some(Value::Undefined) | None => "undefined".to_string(),
        Some(value) => value.to_string(),
    }
}

fn arg_index(args: &[Value], index: usize, default: i64) -> i64 {
    match args.get(index) {
        Some(Value::Undefined) | None => default,
        Some(value) => {
            let n = value.to_number();
            if n.is_nan() { 0 } else { n as i64 }
        }
    }
}

/// Calls a string method; `None` if `method` is not a string method.
pub fn call_string_method(s: &str, method: &str, args: &[Value]) -> Option<Value> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let substring = |start: i64, end: i64| -> String {
        let start = start.clamp(0, len) as usize;
        let end = end.clamp(0, len) as usize;
        if start >= end {
            String::new()
        } else {
            chars[start..end].iter().collect()
        }
    };
    let char_offset = |byte: usize| s[..byte].chars().count() as f64;

    let value = match method {
        "charAt" => {
            let idx = arg_index(args, 0, 0).clamp(-1, len);
            Value::String(substring(idx, idx + 1))
        }
        "charCodeAt" => {
            let idx = arg_index(args, 0, 0);
            usize::try_from(idx)
                .ok()
                .and_then(|i| chars.get(i))
                .map(|c| Value::Number(*c as u32 as f64))
                .unwrap_or(Value::Number(f64::NAN))
        }
        "indexOf" => {
            let search = arg_string(args, 0);
            let start = arg_index(args, 1, 0).clamp(0, len) as usize;
            let byte_start: usize = chars[..start].iter().map(|c| c.len_utf8()).sum();
            match s[byte_start..].find(&search) {
                Some(pos) => Value::Number(char_offset(byte_start + pos)),
                None => Value::Number(-1.0),
            }
        }
        "lastIndexOf" => match s.rfind(&arg_string(args, 0)) {
            Some(pos) => Value::Number(char_offset(pos)),
            None => Value::Number(-1.0),
        },
        "substring" => {
            let start = arg_index(args, 0, 0).clamp(0, len);
            let end = arg_index(args, 1, len).clamp(0, len);
            Value::String(substring(start.min(end), start.max(end)))
        }
        "slice" => {
            let relative = |n: i64| if n < 0 { len.saturating_add(n).max(0) } else { n.min(len) };
            let start = relative(arg_index(args, 0, 0));
            let end = relative(arg_index(args, 1, len));
            Value::String(substring(start, end))
        }
        "startsWith" => {
            let position = arg_index(args, 1, 0).clamp(0, len) as usize;
            let rest: String = chars[position..].iter().collect();
            Value::Boolean(rest.starts_with(&arg_string(args, 0)))
        }
        "endsWith" => {
            let end = arg_index(args, 1, len).clamp(0, len) as usize;
            let head: String = chars[..end].iter().collect();
            Value::Boolean(head.ends_with(&arg_string(args, 0)))
        }
        "toLowerCase" => Value::String(s.to_lowercase()),
        "toUpperCase" => Value::String(s.to_uppercase()),
        "trim" => Value::String(s.trim().to_string()),
        "split" => {
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::Undefined) => vec![Value::from(s)],
                Some(sep) => {
                    let sep = sep.to_string();
                    if sep.is_empty() {
                        chars.iter().map(|c| Value::String(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::from).collect()
                    }
                }
            };
            Value::array(parts)
        }
        "replace" => {
            let pattern = arg_string(args, 0);
            let replacement = arg_string(args, 1);
            Value::String(s.replacen(&pattern, &replacement, 1))
        }
        "concat" => {
            let mut out = s.to_string();
            for arg in args {
                out.push_str(&arg.to_string());
            }
            Value::String(out)
        }
        "toString" | "valueOf" => Value::from(s),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(s: &str, method: &str, args: &[Value]) -> Value {
        call_string_method(s, method, args).expect("known method")
    }

    #[test]
    fn test_index_of_and_slices() {
        assert_eq!(call("app/main", "indexOf", &["/".into()]), Value::Number(3.0));
        assert_eq!(call("app/main", "indexOf", &["x".into()]), Value::Number(-1.0));
        assert_eq!(call("app/main", "slice", &[Value::Number(-4.0)]), Value::from("main"));
        assert_eq!(
            call("app/main", "substring", &[Value::Number(4.0), Value::Number(0.0)]),
            Value::from("app/")
        );
    }

    #[test]
    fn test_split_and_case() {
        let parts = call("a.b.c", "split", &[".".into()]);
        assert_eq!(parts.to_string(), "a,b,c");
        assert_eq!(call("MiXed", "toLowerCase", &[]), Value::from("mixed"));
    }

    #[test]
    fn test_out_of_range_indices() {
        let infinity = Value::Number(f64::INFINITY);
        let minus_infinity = Value::Number(f64::NEG_INFINITY);
        assert_eq!(call("abc", "charAt", &[infinity.clone()]), Value::from(""));
        assert_eq!(call("abc", "charAt", &[minus_infinity.clone()]), Value::from(""));
        assert_eq!(call("abc", "charAt", &[Value::Number(1e300)]), Value::from(""));
        assert_eq!(call("abc", "charAt", &[Value::Number(-1.0)]), Value::from(""));
        assert_eq!(call("abc", "charAt", &[Value::Number(2.0)]), Value::from("c"));
        assert_eq!(call("abc", "slice", &[minus_infinity, infinity.clone()]), Value::from("abc"));
        assert_eq!(call("abc", "substring", &[infinity.clone()]), Value::from(""));
        assert!(matches!(call("abc", "charCodeAt", &[infinity]), Value::Number(n) if n.is_nan()));
    }

    #[test]
    fn test_starts_and_ends_with() {
        assert_eq!(call("app/main", "startsWith", &["app/".into()]), Value::Boolean(true));
        assert_eq!(call("app/main", "startsWith", &["main".into()]), Value::Boolean(false));
        assert_eq!(
            call("app/main", "startsWith", &["main".into(), Value::Number(4.0)]),
            Value::Boolean(true)
        );
        assert_eq!(call("app/main", "endsWith", &["main".into()]), Value::Boolean(true));
        assert_eq!(
            call("app/main", "endsWith", &["app".into(), Value::Number(3.0)]),
            Value::Boolean(true)
        );
        assert_eq!(call("", "endsWith", &["".into()]), Value::Boolean(true));
    }

    #[test]
    fn test_unknown_method() {
        assert!(call_string_method("x", "frobnicate", &[]).is_none());
    }
}
