//! Thread-safety checks.

use std::sync::Arc;
use std::thread;

use json::{parse, to_string, to_string_pretty, Error, Number, ParseError, Value};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn public_types_are_send_and_sync() {
    assert_send_sync::<Value>();
    assert_send_sync::<Number>();
    assert_send_sync::<Error>();
    assert_send_sync::<ParseError>();
}

#[test]
fn parse_and_serialize_on_many_threads() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let input = format!(r#"{{"thread": {i}, "items": [{i}, "{i}", {i}.5]}}"#);
                let value = parse(&input).unwrap();
                assert_eq!(value.get("thread"), Some(&Value::number(i)));
                to_string(&value).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let text = handle.join().unwrap();
        assert_eq!(text, format!(r#"{{"thread":{i},"items":[{i},"{i}",{i}.5]}}"#));
    }
}

#[test]
fn shared_tree_read_concurrently() {
    let value = Arc::new(parse(r#"{"a": [1, 2, 3], "b": {"c": "d"}}"#).unwrap());
    let expected = to_string_pretty(&value, 2).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let value = Arc::clone(&value);
            thread::spawn(move || to_string_pretty(&value, 2).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
