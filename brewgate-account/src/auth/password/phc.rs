//! PHC string codec
//!
//! Serializes and deserializes the `$`-delimited self-describing hash format
//! shared by every scheme:
//!
//! ```text
//! $<scheme-id>$v=<version>$<k1=v1,k2=v2,...>$<salt-hex>$<digest-hex>
//! ```
//!
//! Exactly six `$`-delimited fields (the leading separator produces an empty
//! first field). Consumers that need byte-exact compatibility with stored
//! hashes must preserve this ordering and the separators.

use std::str::FromStr;

use super::PasswordError;

/// Decoded form of a PHC string.
///
/// Parameters keep their insertion order so `serialize` → `deserialize`
/// round-trips without loss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhcHash {
    pub id: String,
    pub version: u32,
    pub params: Vec<(String, String)>,
    pub salt: String,
    pub hash: String,
}

impl PhcHash {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Looks up a parameter that must exist and parse as a number.
    pub fn numeric_param<T: FromStr>(&self, key: &str) -> Result<T, PasswordError> {
        let value = self.param(key).ok_or_else(|| {
            PasswordError::MalformedEncoding(format!("missing parameter `{key}`"))
        })?;
        value.parse::<T>().map_err(|_| {
            PasswordError::MalformedEncoding(format!("parameter `{key}` is not numeric: `{value}`"))
        })
    }
}

pub fn serialize(phc: &PhcHash) -> String {
    let params = phc
        .params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "${}$v={}${}${}${}",
        phc.id, phc.version, params, phc.salt, phc.hash
    )
}

/// Splits an encoded string back into a [`PhcHash`].
///
/// The field count is validated before any indexing, so truncated or
/// otherwise malformed input is a [`PasswordError::MalformedEncoding`], never
/// a panic.
pub fn deserialize(encoded: &str) -> Result<PhcHash, PasswordError> {
    let fields: Vec<&str> = encoded.split('$').collect();
    if fields.len() != 6 || !fields[0].is_empty() {
        return Err(PasswordError::MalformedEncoding(format!(
            "expected 6 '$'-delimited fields, got {}",
            fields.len()
        )));
    }

    let version = fields[2]
        .strip_prefix("v=")
        .ok_or_else(|| {
            PasswordError::MalformedEncoding(format!("missing version field: `{}`", fields[2]))
        })?
        .parse::<u32>()
        .map_err(|_| {
            PasswordError::MalformedEncoding(format!("version is not numeric: `{}`", fields[2]))
        })?;

    let mut params = Vec::new();
    if !fields[3].is_empty() {
        for pair in fields[3].split(',') {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                PasswordError::MalformedEncoding(format!("parameter `{pair}` is not key=value"))
            })?;
            params.push((key.to_string(), value.to_string()));
        }
    }

    Ok(PhcHash {
        id: fields[1].to_string(),
        version,
        params,
        salt: fields[4].to_string(),
        hash: fields[5].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PhcHash {
        PhcHash {
            id: "argon2id".to_string(),
            version: 19,
            params: vec![
                ("m".to_string(), "65536".to_string()),
                ("t".to_string(), "16".to_string()),
                ("p".to_string(), "4".to_string()),
            ],
            salt: "8400b4e5f01f3009".to_string(),
            hash: "3fd77927d189".to_string(),
        }
    }

    #[test]
    fn test_serialize_field_order() {
        let encoded = serialize(&sample());
        assert_eq!(
            encoded,
            "$argon2id$v=19$m=65536,t=16,p=4$8400b4e5f01f3009$3fd77927d189"
        );
    }

    #[test]
    fn test_roundtrip() {
        let original = sample();
        let decoded = deserialize(&serialize(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_roundtrip_empty_params_and_salt() {
        let original = PhcHash {
            id: "bcrypt".to_string(),
            version: 0,
            params: vec![("r".to_string(), "10".to_string())],
            salt: String::new(),
            hash: "24326124".to_string(),
        };
        let encoded = serialize(&original);
        assert_eq!(encoded, "$bcrypt$v=0$r=10$$24326124");
        assert_eq!(deserialize(&encoded).unwrap(), original);
    }

    #[test]
    fn test_deserialize_rejects_wrong_field_count() {
        for bad in ["", "$argon2id", "$argon2id$v=19$m=1$salt", "no-dollars-at-all"] {
            let err = deserialize(bad).unwrap_err();
            assert!(
                matches!(err, PasswordError::MalformedEncoding(_)),
                "{bad:?} should be malformed, got {err:?}"
            );
        }
    }

    #[test]
    fn test_deserialize_rejects_bad_version() {
        let err = deserialize("$argon2id$version=19$m=1$aa$bb").unwrap_err();
        assert!(matches!(err, PasswordError::MalformedEncoding(_)));

        let err = deserialize("$argon2id$v=abc$m=1$aa$bb").unwrap_err();
        assert!(matches!(err, PasswordError::MalformedEncoding(_)));
    }

    #[test]
    fn test_deserialize_rejects_bad_param_pair() {
        let err = deserialize("$argon2id$v=19$m$aa$bb").unwrap_err();
        assert!(matches!(err, PasswordError::MalformedEncoding(_)));
    }

    #[test]
    fn test_numeric_param() {
        let phc = sample();
        assert_eq!(phc.numeric_param::<u32>("m").unwrap(), 65536);
        assert!(matches!(
            phc.numeric_param::<u32>("x"),
            Err(PasswordError::MalformedEncoding(_))
        ));

        let mut bad = sample();
        bad.params[0].1 = "lots".to_string();
        assert!(matches!(
            bad.numeric_param::<u32>("m"),
            Err(PasswordError::MalformedEncoding(_))
        ));
    }
}
