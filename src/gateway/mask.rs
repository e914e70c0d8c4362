//! Log-safe copies of provider payloads.
//!
//! Customer contact data and card numbers never reach the log sink verbatim.

use serde::Serialize;

fn mask_tail(value: &str, visible: usize) -> String {
    let len = value.chars().count();
    if len > visible {
        let tail: String = value.chars().skip(len - visible).collect();
        "*".repeat(len - visible) + &tail
    } else {
        "*".repeat(len)
    }
}

fn mask_email(value: &str) -> String {
    match value.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => mask_tail(value, 0),
    }
}

fn is_email_key(key: &str) -> bool {
    key.to_lowercase().contains("email")
}

fn is_phone_key(key: &str) -> bool {
    let k = key.to_lowercase();
    k.contains("phone") || k.contains("msisdn")
}

fn is_card_key(key: &str) -> bool {
    let k = key.to_lowercase();
    k == "card_number" || k == "cardnumber" || k == "pan"
}

fn is_secret_key(key: &str) -> bool {
    let k = key.to_lowercase();
    k.contains("server_key") || k.contains("signature_key") || k == "cvv"
}

pub fn secure_serializable(v: impl Serialize) -> serde_json::Value {
    match serde_json::to_value(v) {
        Ok(value) => secure_value(&value),
        Err(_) => serde_json::Value::Null,
    }
}

pub fn secure_value(v: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match v {
        Value::Object(map) => {
            let mut new = serde_json::Map::with_capacity(map.len());
            for (k, val) in map {
                let new_val = match val {
                    Value::String(_) | Value::Number(_) if is_secret_key(k) => {
                        Value::String("***".to_string())
                    }
                    Value::String(s) if is_email_key(k) => Value::String(mask_email(s)),
                    Value::String(s) if is_phone_key(k) || is_card_key(k) => {
                        Value::String(mask_tail(s, 4))
                    }
                    Value::Number(n) if is_phone_key(k) || is_card_key(k) => {
                        Value::String(mask_tail(&n.to_string(), 4))
                    }
                    _ => secure_value(val),
                };
                new.insert(k.clone(), new_val);
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(secure_value).collect()),
        other => other.clone(),
    }
}
