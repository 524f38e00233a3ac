//! Wire encoding of [`Params`]: query strings, url-encoded forms and
//! `multipart/form-data` bodies.
//!
//! Nested keys flatten the way Rails-style servers expect: `user[name]` for
//! mappings and `tags[]` for arrays.

use serde_json::Value;
use uuid::Uuid;

use crate::error::Error;
use crate::http::HttpMethod;
use crate::params::{ParamValue, Params, Part};

pub(crate) const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// One flattened form field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Field {
    Text(String),
    Part(Part),
}

/// The pieces of a request that depend on its parameters.
#[derive(Debug)]
pub(crate) struct Encoded {
    pub url: String,
    pub content_type: Option<String>,
    pub body: Option<Vec<u8>>,
}

/// Place `params` in the query string (GET) or the body (POST/PATCH).
pub(crate) fn encode(method: HttpMethod, url: &str, params: &Params) -> Result<Encoded, Error> {
    let fields = flatten(params);
    let first_part = fields
        .iter()
        .find(|(_, field)| matches!(field, Field::Part(_)))
        .map(|(name, _)| name.clone());

    if !method.has_body() {
        if let Some(name) = first_part {
            return Err(Error::Encode(format!(
                "{name} is a multipart part, which a {} request cannot carry",
                method.as_str()
            )));
        }
        return Ok(Encoded {
            url: append_query(url, &text_pairs(fields)),
            content_type: None,
            body: None,
        });
    }

    if fields.is_empty() {
        return Ok(Encoded {
            url: url.to_string(),
            content_type: None,
            body: None,
        });
    }

    if first_part.is_some() {
        let boundary = format!("happi-{}", Uuid::new_v4().simple());
        let body = multipart_body(&fields, &boundary);
        return Ok(Encoded {
            url: url.to_string(),
            content_type: Some(format!("multipart/form-data; boundary={boundary}")),
            body: Some(body),
        });
    }

    let body = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(text_pairs(fields))
        .finish();
    Ok(Encoded {
        url: url.to_string(),
        content_type: Some(FORM_URLENCODED.to_string()),
        body: Some(body.into_bytes()),
    })
}

/// The text fields of `fields`, in order; parts are skipped.
fn text_pairs(fields: Vec<(String, Field)>) -> Vec<(String, String)> {
    fields
        .into_iter()
        .filter_map(|(name, field)| match field {
            Field::Text(text) => Some((name, text)),
            Field::Part(_) => None,
        })
        .collect()
}

pub(crate) fn flatten(params: &Params) -> Vec<(String, Field)> {
    let mut out = Vec::new();
    for (key, value) in params.iter() {
        flatten_param(key.to_string(), value, &mut out);
    }
    out
}

fn flatten_param(name: String, value: &ParamValue, out: &mut Vec<(String, Field)>) {
    match value {
        ParamValue::Value(value) => flatten_value(name, value, out),
        ParamValue::Map(map) => {
            for (key, value) in map.iter() {
                flatten_param(format!("{name}[{key}]"), value, out);
            }
        }
        ParamValue::Upload(upload) => out.push((name, Field::Part(upload.multipart()))),
        ParamValue::Part(part) => out.push((name, Field::Part(part.clone()))),
    }
}

fn flatten_value(name: String, value: &Value, out: &mut Vec<(String, Field)>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_value(format!("{name}[{key}]"), value, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_value(format!("{name}[]"), item, out);
            }
        }
        Value::Null => out.push((name, Field::Text(String::new()))),
        Value::String(s) => out.push((name, Field::Text(s.clone()))),
        Value::Bool(_) | Value::Number(_) => out.push((name, Field::Text(value.to_string()))),
    }
}

fn append_query(url: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return url.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

fn multipart_body(fields: &[(String, Field)], boundary: &str) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, field) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        let name = quote(name);
        match field {
            Field::Text(text) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(text.as_bytes());
            }
            Field::Part(part) => {
                let disposition = match &part.filename {
                    Some(filename) => format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\n",
                        quote(filename)
                    ),
                    None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n"),
                };
                body.extend_from_slice(disposition.as_bytes());
                body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
                body.extend_from_slice(&part.data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn quote(s: &str) -> String {
    s.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn text_fields(params: &Params) -> Vec<(String, String)> {
        flatten(params)
            .into_iter()
            .map(|(name, field)| match field {
                Field::Text(text) => (name, text),
                Field::Part(_) => panic!("unexpected part at {name}"),
            })
            .collect()
    }

    #[test]
    fn nested_keys_use_brackets() {
        let params = Params::new()
            .with("user", Params::new().with("name", "ann").with("age", 30))
            .with("tags", json!(["a", "b"]))
            .with("active", true)
            .with("note", Value::Null);
        assert_eq!(
            text_fields(&params),
            vec![
                ("user[name]".to_string(), "ann".to_string()),
                ("user[age]".to_string(), "30".to_string()),
                ("tags[]".to_string(), "a".to_string()),
                ("tags[]".to_string(), "b".to_string()),
                ("active".to_string(), "true".to_string()),
                ("note".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn text_pairs_skip_parts_and_keep_order() {
        let params = Params::new()
            .with("a", 1)
            .with("file", Part::new("x", "text/plain"))
            .with("b", "y");
        assert_eq!(
            text_pairs(flatten(&params)),
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "y".to_string())]
        );
    }

    #[test]
    fn get_params_go_to_the_query_string() {
        let params = Params::new().with("q", "a b").with("page", 2);
        let encoded = encode(HttpMethod::Get, "http://h/api/v1/users", &params).unwrap();
        assert_eq!(encoded.url, "http://h/api/v1/users?q=a+b&page=2");
        assert!(encoded.body.is_none());
        assert!(encoded.content_type.is_none());
    }

    #[test]
    fn get_query_appends_to_existing_query() {
        let params = Params::new().with("page", 2);
        let encoded = encode(HttpMethod::Get, "http://h/api/v1/users?sort=name", &params).unwrap();
        assert_eq!(encoded.url, "http://h/api/v1/users?sort=name&page=2");
    }

    #[test]
    fn get_rejects_parts() {
        let params = Params::new().with("file", Part::new("x", "text/plain"));
        let err = encode(HttpMethod::Get, "http://h/x", &params).unwrap_err();
        assert!(matches!(err, Error::Encode(ref msg) if msg.contains("file")));
    }

    #[test]
    fn post_without_parts_is_urlencoded() {
        let params = Params::new().with("user", Params::new().with("name", "ann"));
        let encoded = encode(HttpMethod::Post, "http://h/x", &params).unwrap();
        assert_eq!(encoded.content_type.as_deref(), Some(FORM_URLENCODED));
        assert_eq!(encoded.body.unwrap(), b"user%5Bname%5D=ann");
        assert_eq!(encoded.url, "http://h/x");
    }

    #[test]
    fn post_without_params_has_no_body() {
        let encoded = encode(HttpMethod::Patch, "http://h/x", &Params::new()).unwrap();
        assert!(encoded.body.is_none());
        assert!(encoded.content_type.is_none());
    }

    #[test]
    fn post_with_part_is_multipart() {
        let params = Params::new()
            .with("title", "cat")
            .with("photo", Part::new(b"\x89PNG".to_vec(), "image/png").with_filename("cat.png"));
        let encoded = encode(HttpMethod::Post, "http://h/x", &params).unwrap();

        let content_type = encoded.content_type.unwrap();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap()
            .to_string();
        let mut expected = Vec::new();
        expected.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\ncat\r\n\
                 --{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"cat.png\"\r\n\
                 Content-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        expected.extend_from_slice(b"\x89PNG\r\n");
        expected.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        assert_eq!(encoded.body.unwrap(), expected);
    }
}
